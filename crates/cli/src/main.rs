//! Operator CLI for the Ladder leaderboard cache.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use ladder_cache::Cache;
use ladder_core::config::CacheConfig;
use ladder_core::{DisplayMeta, Entry, TimeWindow};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "ladderctl")]
#[command(about = "Operator CLI for the Ladder leaderboard cache")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "LADDER_CONFIG",
        default_value = "config/ladder.toml"
    )]
    config: String,

    /// Print entries as JSON
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List boards
    Boards,
    /// List storage tables carrying the configured prefix
    Tables,
    /// Create a board, or add missing window columns to an existing one
    Create { board: String },
    /// Remove a board and all its rows
    Remove { board: String },
    /// Record the current raw value of an entity
    Record {
        board: String,
        entity: Uuid,
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Display name cached on the row
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value = "")]
        suffix: String,
    },
    /// Show the entry at a rank
    Top {
        board: String,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        rank: i64,
        #[arg(long, default_value = "alltime")]
        window: TimeWindow,
    },
    /// Show the rank of an entity
    Rank {
        board: String,
        entity: Uuid,
        #[arg(long, default_value = "alltime")]
        window: TimeWindow,
    },
    /// Reset a rolling window at the current grid point
    Reset { board: String, window: TimeWindow },
    /// Remove every row with the given cached display name
    RemovePlayer { board: String, name: String },
    /// Show last and next reset of every rolling window
    Schedule { board: String },
}

/// Load configuration from the optional TOML file, then `LADDER_` env vars.
fn load_config(path: &str) -> Result<CacheConfig> {
    let mut figment = Figment::new();
    if Path::new(path).exists() {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}, using defaults", path);
    }

    let config: CacheConfig = figment
        .merge(Env::prefixed("LADDER_").split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

/// Render epoch milliseconds as RFC 3339, falling back to the raw number.
fn format_ms(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| ms.to_string())
}

fn print_entry(entry: &Entry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(entry)?);
        return Ok(());
    }
    let rank = if entry.rank < 1 {
        "-".to_string()
    } else {
        format!("#{}", entry.rank)
    };
    match entry.entity {
        Some(id) => println!(
            "{rank} {} {} ({}, {})",
            entry.display_name(),
            entry.value,
            entry.window,
            id
        ),
        None => println!("{rank} {} ({})", entry.display_name(), entry.window),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli.config)?;
    let cache = Cache::from_config(&config)
        .await
        .context("failed to open leaderboard cache")?;

    match cli.command {
        Commands::Boards => {
            let boards = cache.list_boards().await;
            if boards.is_empty() {
                println!("No boards found.");
            }
            for board in boards {
                println!("{board}");
            }
        }
        Commands::Tables => {
            for table in cache.list_tables().await {
                println!("{table}");
            }
        }
        Commands::Create { board } => {
            if !cache.create_board(&board).await {
                anyhow::bail!("failed to create board '{board}'");
            }
            println!("Board ready: {board}");
        }
        Commands::Remove { board } => {
            if !cache.remove_board(&board).await {
                anyhow::bail!("failed to remove board '{board}'");
            }
            println!("Board removed: {board}");
        }
        Commands::Record {
            board,
            entity,
            value,
            name,
            prefix,
            suffix,
        } => {
            let meta = DisplayMeta {
                name,
                prefix,
                suffix,
            };
            let outcome = cache.ingest(&board, entity, value, &meta).await;
            println!("{outcome:?}");
        }
        Commands::Top {
            board,
            rank,
            window,
        } => {
            let entry = cache.get_by_rank(&board, rank, window).await;
            print_entry(&entry, cli.json)?;
        }
        Commands::Rank {
            board,
            entity,
            window,
        } => {
            let entry = cache.get_by_entity(&board, entity, window).await;
            print_entry(&entry, cli.json)?;
        }
        Commands::Reset { board, window } => {
            if !window.is_rolling() {
                anyhow::bail!("the {window} window has no reset");
            }
            if !cache.board_exists(&board).await {
                anyhow::bail!("board '{board}' does not exist");
            }
            let report = cache.reset_window(&board, window).await;
            println!(
                "Reset {} rows of {} ({}), {} failed, anchor {}",
                report.reset,
                report.board,
                report.window,
                report.failed,
                format_ms(report.anchor_ms)
            );
        }
        Commands::RemovePlayer { board, name } => {
            if !cache.remove_player(&board, &name).await {
                anyhow::bail!("failed to remove '{name}' from '{board}'");
            }
            println!("Removed '{name}' from {board}");
        }
        Commands::Schedule { board } => {
            if !cache.board_exists(&board).await {
                anyhow::bail!("board '{board}' does not exist");
            }
            println!("{:<10} {:<30} Next reset", "Window", "Last reset");
            println!("{}", "-".repeat(72));
            for window in TimeWindow::ROLLING {
                let last = cache.last_reset(&board, window).await;
                let last = if last == 0 {
                    "never".to_string()
                } else {
                    format_ms(last)
                };
                let next = cache
                    .next_reset(&board, window)
                    .await
                    .map(format_ms)
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<10} {:<30} {}", window, last, next);
            }
        }
    }

    Ok(())
}
