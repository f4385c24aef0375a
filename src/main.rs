//! # Code Snapshot CLI (`snap`)
//!
//! ## Usage
//!
//! ```bash
//! snap --config ./config/snap.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `snap init` | Create the SQLite database and run schema migrations |
//! | `snap ingest` | Walk the root and store every non-excluded file once |
//! | `snap get <path>...` | Print stored contents for relative paths |
//! | `snap stats` | Summarize what is stored |
//! | `snap serve` | Start the HTTP retrieval server |
//!
//! Logs go to stderr (`RUST_LOG` or `--verbose`); reports and file contents
//! go to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use code_snapshot::config;
use code_snapshot::get;
use code_snapshot::ingest::{self, IngestArgs};
use code_snapshot::migrate;
use code_snapshot::progress::ProgressMode;
use code_snapshot::server;
use code_snapshot::stats;

/// Code Snapshot CLI: store a codebase's text by relative path and read it back.
#[derive(Parser)]
#[command(name = "snap", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/snap.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Snapshot a directory tree into the store.
    ///
    /// Files already stored are skipped without being read; files that
    /// cannot be read as text are reported and the run continues.
    Ingest {
        /// Root directory (overrides `[ingest].root`).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Walk and list candidate files without touching the store.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Print stored contents for one or more relative paths.
    Get {
        /// Relative paths, e.g. `src/main.py`.
        #[arg(required = true)]
        paths: Vec<String>,

        /// Print `{found, not_found}` as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show store statistics.
    Stats,

    /// Start the HTTP retrieval server on `[server].bind`.
    Serve,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest {
            root,
            dry_run,
            limit,
            json,
            progress,
        } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            let args = IngestArgs {
                root,
                dry_run,
                limit,
                json,
            };
            ingest::run_ingest(&cfg, &args, mode.reporter().as_ref()).await?;
        }
        Commands::Get { paths, json } => {
            get::run_get(&cfg, &paths, json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
