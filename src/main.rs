//! # Patchwatch CLI (`pwatch`)
//!
//! The `pwatch` binary is the primary interface for Patchwatch. It ingests
//! harvested changelog files, enriches them with classification, alert,
//! and innovation analysis, and synchronizes the results into a local
//! SQLite store.
//!
//! ## Usage
//!
//! ```bash
//! pwatch --config ./config/pwatch.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pwatch init` | Create the SQLite store and run schema migrations |
//! | `pwatch run <dir>` | Ingest harvester JSON files and sync new patches |
//! | `pwatch stats` | Print aggregated statistics across the store |
//! | `pwatch products` | List stored products with catalog metadata |
//! | `pwatch show <product>` | Per-release breakdown for one product |
//! | `pwatch check` | Verify store integrity (duplicate keys) |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the store
//! pwatch init --config ./config/pwatch.toml
//!
//! # Ingest a harvest directory
//! pwatch run ./sources --config ./config/pwatch.toml
//!
//! # Preview what a run would change
//! pwatch run ./sources --dry-run
//!
//! # Inspect one product
//! pwatch show Redis
//! ```

mod aggregate;
mod alerts;
mod catalog;
mod check;
mod classify;
mod config;
mod db;
mod error;
mod innovation;
mod migrate;
mod models;
mod normalize;
mod pipeline;
mod products;
mod sqlite_store;
mod stats;
mod store;
mod sync;
mod taxonomy;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Patchwatch CLI — a changelog classification and alerting pipeline for
/// tracked database products.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/pwatch.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "pwatch",
    about = "Patchwatch — changelog classification, alerting, and sync for database releases",
    version,
    long_about = "Patchwatch ingests harvested changelog JSON, classifies each change, derives \
    security and performance alerts, tags innovation themes, aggregates the results per version \
    hierarchy, and incrementally synchronizes new patches into a local SQLite store."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/pwatch.toml`. Store path, sync retry policy,
    /// taxonomy overrides, and product catalog entries are read from it.
    #[arg(long, global = true, default_value = "./config/pwatch.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (releases, products). This command is idempotent — running it
    /// multiple times is safe.
    Init,

    /// Ingest harvester files and sync new patches into the store.
    ///
    /// Reads every `*.json` file in the given directory, normalizes and
    /// enriches the records, and writes those whose `(product,
    /// patch_version)` key is not yet stored. Re-running over the same
    /// directory inserts nothing.
    Run {
        /// Directory containing harvester output files.
        dir: PathBuf,

        /// Analyze and plan without writing to the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of records to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print aggregated statistics across the whole store.
    Stats,

    /// List stored products with their catalog classification.
    Products,

    /// Per-release breakdown for one product.
    Show {
        /// Product name as stored (e.g., `Redis`).
        product: String,
    },

    /// Verify store integrity.
    ///
    /// Scans for duplicate `(product, patch_version)` keys. Exits
    /// non-zero when conflicts are found.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Store initialized successfully.");
        }
        Commands::Run {
            dir,
            dry_run,
            limit,
        } => {
            let pool = db::connect(&cfg).await?;
            let store = sqlite_store::SqliteStore::new(pool);
            let outcome = pipeline::run_pipeline(&dir, &store, &cfg, dry_run, limit).await?;
            store.close().await;

            if dry_run {
                println!("Dry run — nothing written.");
            }
            println!(
                "Files: {} parsed, {} skipped. Records: {} processed, {} dropped.",
                outcome.files, outcome.bad_files, outcome.processed, outcome.dropped
            );
            println!(
                "Sync: {} inserted, {} skipped, {} failed.",
                outcome.report.inserted, outcome.report.skipped, outcome.report.failed
            );
            if outcome.conflicts > 0 {
                eprintln!(
                    "Integrity: {} duplicate key(s) in store. Run `pwatch check` for details.",
                    outcome.conflicts
                );
            }
            if outcome.report.failed > 0 || outcome.conflicts > 0 {
                std::process::exit(1);
            }
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Products => {
            products::run_products(&cfg).await?;
        }
        Commands::Show { product } => {
            products::run_show(&cfg, &product).await?;
        }
        Commands::Check => {
            check::run_check(&cfg).await?;
        }
    }

    Ok(())
}
