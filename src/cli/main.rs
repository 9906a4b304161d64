//! retail-etl: centralise retail extracts into the sales warehouse

mod commands;
mod error;
mod output;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::GlobalArgs;
use commands::run::RunArgs;

static LOG_ENV_VAR: &str = "RETAIL_ETL_LOG";

#[derive(Parser)]
#[command(name = "retail-etl", version, about = "Clean, load and type retail extracts")]
struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Warehouse database, overrides the configuration
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one entity, or `all` for every entity followed by foreign keys
    Run {
        /// user, card, store, product, date_event, order or all
        target: String,

        /// Extract file for a single entity
        #[arg(long)]
        extract: Option<PathBuf>,

        /// Clean and plan without writing to the warehouse
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the ordered schema statements for an entity
    Plan {
        entity: String,

        #[arg(long)]
        json: bool,
    },

    /// Prune orphans and install foreign keys on a loaded warehouse
    Constrain {
        #[arg(long)]
        dry_run: bool,
    },
}

/// Initialise the tracing subscriber once, filtered by `RETAIL_ETL_LOG`
fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    });
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    let global = GlobalArgs {
        config: cli.config,
        database: cli.database,
    };

    let result = match cli.command {
        Command::Run {
            target,
            extract,
            dry_run,
            json,
        } => commands::run::handle_run(
            &global,
            &RunArgs {
                target,
                extract,
                dry_run,
                json,
            },
        ),
        Command::Plan { entity, json } => commands::plan::handle_plan(&entity, json),
        Command::Constrain { dry_run } => commands::constrain::handle_constrain(&global, dry_run),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
