//! SQL dialect facts and statement builders.
//!
//! Board tables are created per board, so every statement is built at
//! runtime from a validated [`TableName`]. Values always travel as bind
//! parameters; only identifiers are interpolated, and only after quoting.

use ladder_core::{TableName, TimeWindow};

/// The SQL dialect spoken by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// Embedded SQLite.
    Sqlite,
    /// Networked PostgreSQL.
    Postgres,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Quote an identifier.
    pub fn quote(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Column type of entity ids.
    pub fn id_type(&self) -> &'static str {
        match self {
            Self::Sqlite => "TEXT",
            Self::Postgres => "VARCHAR(36)",
        }
    }

    /// Column type of values, deltas and last totals.
    pub fn numeric_type(&self) -> &'static str {
        match self {
            Self::Sqlite => "NUMERIC",
            Self::Postgres => "DOUBLE PRECISION",
        }
    }

    /// Column type of reset anchors (milliseconds since the epoch).
    pub fn timestamp_type(&self) -> &'static str {
        match self {
            Self::Sqlite => "NUMERIC",
            Self::Postgres => "BIGINT",
        }
    }

    /// Bind placeholder for the `n`th (1-based) parameter.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Self::Sqlite => "?".to_string(),
            Self::Postgres => format!("${n}"),
        }
    }

    /// Whether tables are listed from a catalog table rather than information_schema.
    pub fn lists_tables_from_catalog(&self) -> bool {
        matches!(self, Self::Sqlite)
    }

    /// Query returning the names of all user tables, sorted.
    pub fn list_tables_sql(&self) -> &'static str {
        match self {
            Self::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Self::Postgres => {
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
                 ORDER BY table_name"
            }
        }
    }

    /// Query returning the column names of the table bound as parameter 1.
    pub fn list_columns_sql(&self) -> &'static str {
        match self {
            Self::Sqlite => "SELECT name FROM pragma_table_info(?)",
            Self::Postgres => {
                "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name::text = $1"
            }
        }
    }

    /// Read a numeric column as a float, NULL reading as 0.
    ///
    /// SQLite's NUMERIC affinity stores integral values as INTEGER, which
    /// sqlx refuses to decode as `f64`, hence the explicit cast.
    fn read_f64(&self, column: &str) -> String {
        match self {
            Self::Sqlite => format!("CAST(COALESCE({column}, 0) AS REAL)"),
            Self::Postgres => format!("COALESCE({column}, 0)::DOUBLE PRECISION"),
        }
    }

    /// Read a timestamp column as an integer, NULL reading as 0.
    fn read_i64(&self, column: &str) -> String {
        match self {
            Self::Sqlite => format!("CAST(COALESCE({column}, 0) AS INTEGER)"),
            Self::Postgres => format!("COALESCE({column}, 0)::BIGINT"),
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` for a board, in one statement.
    pub fn create_board_sql(&self, table: &TableName) -> String {
        let mut columns = vec![
            format!("id {} PRIMARY KEY", self.id_type()),
            format!("value {}", self.numeric_type()),
        ];
        columns.extend(self.window_columns().into_iter().map(|(name, ty)| format!("{name} {ty}")));
        columns.push("namecache TEXT".to_string());
        columns.push("prefixcache TEXT".to_string());
        columns.push("suffixcache TEXT".to_string());
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote(table.as_str()),
            columns.join(", ")
        )
    }

    /// Every rolling-window column with its type, in table order.
    pub fn window_columns(&self) -> Vec<(String, &'static str)> {
        TimeWindow::ROLLING
            .iter()
            .flat_map(|w| {
                [
                    (w.delta_column(), self.numeric_type()),
                    (w.last_total_column(), self.numeric_type()),
                    (w.timestamp_column(), self.timestamp_type()),
                ]
            })
            .collect()
    }

    pub fn add_column_sql(&self, table: &TableName, column: &str, ty: &str) -> String {
        let if_not_exists = match self {
            Self::Sqlite => "",
            Self::Postgres => "IF NOT EXISTS ",
        };
        format!(
            "ALTER TABLE {} ADD COLUMN {if_not_exists}{column} {ty}",
            self.quote(table.as_str())
        )
    }

    pub fn drop_board_sql(&self, table: &TableName) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote(table.as_str()))
    }

    /// Insert a fresh row; a conflicting id inserts nothing.
    ///
    /// Parameters: id, value, namecache, prefixcache, suffixcache, then
    /// (delta, lasttotal, timestamp) per rolling window.
    pub fn insert_stat_sql(&self, table: &TableName) -> String {
        let mut columns = vec![
            "id".to_string(),
            "value".to_string(),
            "namecache".to_string(),
            "prefixcache".to_string(),
            "suffixcache".to_string(),
        ];
        for w in TimeWindow::ROLLING {
            columns.push(w.delta_column());
            columns.push(w.last_total_column());
            columns.push(w.timestamp_column());
        }
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| self.placeholder(n)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (id) DO NOTHING",
            self.quote(table.as_str()),
            columns.join(", "),
            placeholders.join(", ")
        )
    }

    /// Update value, caches and every window delta of one row.
    ///
    /// Parameters: value, namecache, prefixcache, suffixcache, one delta per
    /// rolling window, then id.
    pub fn update_stat_sql(&self, table: &TableName) -> String {
        let mut n = 0;
        let mut next = || {
            n += 1;
            self.placeholder(n)
        };
        let mut assignments = vec![
            format!("value = {}", next()),
            format!("namecache = {}", next()),
            format!("prefixcache = {}", next()),
            format!("suffixcache = {}", next()),
        ];
        for w in TimeWindow::ROLLING {
            assignments.push(format!("{} = {}", w.delta_column(), next()));
        }
        let id = next();
        format!(
            "UPDATE {} SET {} WHERE id = {id}",
            self.quote(table.as_str()),
            assignments.join(", ")
        )
    }

    /// Point lookup of a full row by id (parameter 1).
    pub fn select_record_sql(&self, table: &TableName) -> String {
        let mut columns = vec![
            "id".to_string(),
            format!("{} AS value", self.read_f64("value")),
            "namecache".to_string(),
            "prefixcache".to_string(),
            "suffixcache".to_string(),
        ];
        for w in TimeWindow::ROLLING {
            let delta = w.delta_column();
            let last_total = w.last_total_column();
            let timestamp = w.timestamp_column();
            columns.push(format!("{} AS {delta}", self.read_f64(&delta)));
            columns.push(format!("{} AS {last_total}", self.read_f64(&last_total)));
            columns.push(format!("{} AS {timestamp}", self.read_i64(&timestamp)));
        }
        format!(
            "SELECT {} FROM {} WHERE id = {}",
            columns.join(", "),
            self.quote(table.as_str()),
            self.placeholder(1)
        )
    }

    /// Latest anchor of every rolling window, one column per window.
    pub fn select_anchors_sql(&self, table: &TableName) -> String {
        let columns: Vec<String> = TimeWindow::ROLLING
            .iter()
            .map(|w| {
                let column = w.timestamp_column();
                format!("{} AS {column}", self.read_i64(&format!("MAX({column})")))
            })
            .collect();
        format!(
            "SELECT {} FROM {}",
            columns.join(", "),
            self.quote(table.as_str())
        )
    }

    /// Rows ordered by the window's ranking key, best first.
    ///
    /// Ties are broken by id ascending. With `paged`, parameter 1 is the
    /// number of rows to skip and one row is returned.
    pub fn select_ranked_sql(&self, table: &TableName, window: TimeWindow, paged: bool) -> String {
        let mut sql = format!(
            "SELECT id, {} AS score, namecache, prefixcache, suffixcache FROM {} \
             ORDER BY score DESC, id ASC",
            self.read_f64(&window.ranking_column()),
            self.quote(table.as_str())
        );
        if paged {
            sql.push_str(&format!(" LIMIT 1 OFFSET {}", self.placeholder(1)));
        }
        sql
    }

    /// Every (id, value) pair of a board.
    pub fn select_values_sql(&self, table: &TableName) -> String {
        format!(
            "SELECT id, {} AS value FROM {}",
            self.read_f64("value"),
            self.quote(table.as_str())
        )
    }

    /// Re-anchor one row for a window. Parameters: value, anchor, id.
    pub fn reset_row_sql(&self, table: &TableName, window: TimeWindow) -> String {
        format!(
            "UPDATE {} SET {} = {}, {} = 0, {} = {} WHERE id = {}",
            self.quote(table.as_str()),
            window.last_total_column(),
            self.placeholder(1),
            window.delta_column(),
            window.timestamp_column(),
            self.placeholder(2),
            self.placeholder(3)
        )
    }

    pub fn delete_by_name_sql(&self, table: &TableName) -> String {
        format!(
            "DELETE FROM {} WHERE namecache = {}",
            self.quote(table.as_str()),
            self.placeholder(1)
        )
    }

    pub fn count_rows_sql(&self, table: &TableName) -> String {
        format!("SELECT COUNT(*) FROM {}", self.quote(table.as_str()))
    }
}

/// Number of bind parameters in [`Dialect::insert_stat_sql`].
pub const INSERT_PARAMS: usize = 5 + 3 * TimeWindow::ROLLING.len();
