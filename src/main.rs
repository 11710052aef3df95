//! `nsrl`: look up file digests in an NSRL reference dataset.
//!
//! Results are printed to stdout as JSON; logs go to stderr.
//!
//! Usage:
//!   nsrl exists <DIGEST>
//!   nsrl details <DIGEST>
//!   nsrl summary <DIGEST> --max-results 10

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use exn::ResultExt;
use nsrl_config::Config;
use nsrl_dataset::error::{ErrorKind, Result};
use nsrl_dataset::{Database, Lookup};
use serde::Serialize;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Any failure that is neither a malformed digest nor an unknown file.
const EXIT_FAILURE: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "nsrl", version)]
#[command(about = "Look up file digests in an NSRL reference dataset")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Dataset to query, overriding `db.filepath`
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the hash triple of a known file
    Exists { digest: String },
    /// Print every record of the file along with its package provenance
    Details { digest: String },
    /// Print the records of the file collapsed per package
    Summary {
        digest: String,
        /// Upper bound on the package detail rows shown
        #[arg(long)]
        max_results: Option<NonZeroUsize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = ?err, "could not load configuration");
            return ExitCode::from(EXIT_FAILURE);
        },
    };
    if let Some(path) = cli.db {
        config.db.filepath = path;
    }
    debug!(?config, "configuration loaded");

    let db = match Database::connect(&config.db.filepath, Some(config.db.max_connections)).await {
        Ok(db) => db,
        Err(err) => {
            error!(error = ?err, path = %config.db.filepath.display(), "could not open dataset");
            return ExitCode::from(EXIT_FAILURE);
        },
    };
    let mut lookup = Lookup::from(&db);
    if let Some(max) = NonZeroUsize::new(config.ui.max_results) {
        lookup = lookup.with_max_results(max);
    }

    let code = match execute(&lookup, &cli.command).await {
        Ok(json) => {
            println!("{json}");
            0
        },
        Err(err) if err.is_client_error() => {
            eprintln!("{}", *err);
            exit_code(&err)
        },
        Err(err) => {
            error!(error = ?err, "lookup failed");
            exit_code(&err)
        },
    };
    db.close().await;
    ExitCode::from(code)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Run a single lookup and render its answer as JSON.
async fn execute(lookup: &Lookup, command: &Command) -> Result<String> {
    match command {
        Command::Exists { digest } => render(&lookup.existence(digest).await?),
        Command::Details { digest } => render(&lookup.details(digest).await?),
        Command::Summary { digest, max_results } => {
            let lookup = match max_results {
                Some(max) => lookup.clone().with_max_results(*max),
                None => lookup.clone(),
            };
            render(&lookup.summarize(digest).await?)
        },
    }
}

fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).or_raise(|| ErrorKind::InvalidData("json rendering"))
}

fn exit_code(kind: &ErrorKind) -> u8 {
    match kind {
        ErrorKind::NotFound(_) => 1,
        ErrorKind::InvalidDigestFormat(_) => 2,
        _ => EXIT_FAILURE,
    }
}
