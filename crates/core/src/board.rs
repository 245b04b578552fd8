//! Board and table identifiers.
//!
//! Board names end up interpolated into DDL and DML as table identifiers,
//! which no backend lets us bind as parameters. Both types here only admit
//! ASCII alphanumerics and `_`, so a validated name can never break out of
//! its quoted identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum board name length in bytes.
///
/// PostgreSQL truncates identifiers at 63 bytes; this leaves room for a prefix.
pub const MAX_BOARD_NAME_LEN: usize = 48;

/// Maximum table prefix length in bytes.
pub const MAX_TABLE_PREFIX_LEN: usize = 15;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Check a table prefix. The empty prefix is valid.
pub fn validate_table_prefix(prefix: &str) -> crate::Result<()> {
    if prefix.len() > MAX_TABLE_PREFIX_LEN {
        return Err(crate::Error::InvalidTablePrefix(format!(
            "prefix must be at most {MAX_TABLE_PREFIX_LEN} bytes, got {}",
            prefix.len()
        )));
    }
    if let Some(c) = prefix.chars().find(|c| !is_identifier_char(*c)) {
        return Err(crate::Error::InvalidTablePrefix(format!(
            "invalid character in prefix: {c:?}"
        )));
    }
    Ok(())
}

/// A validated, user-facing board name.
///
/// Stored lowercase. SQLite matches table names case-insensitively while
/// quoted PostgreSQL identifiers do not, so `Kills` and `kills` must name
/// the same board on both.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoardName(String);

impl BoardName {
    /// Create from a string, validating format and folding to lowercase.
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let mut name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidBoardName(
                "board name cannot be empty".to_string(),
            ));
        }
        if name.len() > MAX_BOARD_NAME_LEN {
            return Err(crate::Error::InvalidBoardName(format!(
                "board name must be at most {MAX_BOARD_NAME_LEN} bytes, got {}",
                name.len()
            )));
        }
        if let Some(c) = name.chars().find(|c| !is_identifier_char(*c)) {
            return Err(crate::Error::InvalidBoardName(format!(
                "invalid character in board name {name:?}: {c:?}"
            )));
        }
        name.make_ascii_lowercase();
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BoardName {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        Self::new(value)
    }
}

impl From<BoardName> for String {
    fn from(name: BoardName) -> Self {
        name.0
    }
}

impl fmt::Debug for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardName({self})")
    }
}

impl fmt::Display for BoardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The storage identifier of a board: table prefix followed by the board name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Build the table name for `board` under `prefix`.
    pub fn new(prefix: &str, board: &BoardName) -> crate::Result<Self> {
        validate_table_prefix(prefix)?;
        Ok(Self(format!("{prefix}{board}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableName({self})")
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_board_names() {
        for name in ["kills", "statistic_player_kills", "ajpk_stats_highscore", "Board2"] {
            assert!(BoardName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_board_names_fold_to_lowercase() {
        assert_eq!(BoardName::new("Board2").unwrap().as_str(), "board2");
        assert_eq!(BoardName::new("KILLS").unwrap(), BoardName::new("kills").unwrap());
        let board = BoardName::new("Kills").unwrap();
        assert_eq!(TableName::new("lb_", &board).unwrap().as_str(), "lb_kills");
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for name in [
            "kills; DROP TABLE users",
            "kills\"",
            "kills`",
            "kills'",
            "kills--",
            "a b",
            "",
        ] {
            assert!(BoardName::new(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_rejects_non_ascii_without_panicking() {
        let err = BoardName::new("k\u{00e9}lls").unwrap_err();
        assert!(err.to_string().contains("invalid character"));
    }

    #[test]
    fn test_rejects_overlong_name() {
        let name = "a".repeat(MAX_BOARD_NAME_LEN + 1);
        assert!(BoardName::new(name).is_err());
        assert!(BoardName::new("a".repeat(MAX_BOARD_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_table_name_applies_prefix() {
        let board = BoardName::new("kills").unwrap();
        assert_eq!(TableName::new("", &board).unwrap().as_str(), "kills");
        assert_eq!(TableName::new("lb_", &board).unwrap().as_str(), "lb_kills");
        assert!(TableName::new("lb-", &board).is_err());
    }

    #[test]
    fn test_board_name_deserialize_validates() {
        let ok: BoardName = serde_json::from_str("\"kills\"").unwrap();
        assert_eq!(ok.as_str(), "kills");
        assert!(serde_json::from_str::<BoardName>("\"bad name\"").is_err());
    }
}
