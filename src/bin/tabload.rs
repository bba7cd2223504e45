use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use tabload::config::StoreConfig;
use tabload::execution::{ExecutionOptions, IngestionEngine, TracingExecutionObserver};
use tabload::ingestion::{
    load_files, CollisionPolicy, CompositeObserver, CsvOptions, FileObserver, IngestionObserver,
    IngestionOptions, TracingObserver,
};
use tabload::logging::{self, LogConfig};
use tabload::service::{to_json, ErrorResponse, TableService};
use tabload::store::{self, IdentifierPolicy};
use tabload::EngineResult;

/// Load delimited text files into a relational store and inspect what was loaded.
///
/// The store is chosen through DB_* environment variables (a `.env` file is honored).
#[derive(Parser, Debug)]
#[command(name = "tabload", version)]
struct Cli {
    /// Log level or EnvFilter directive; RUST_LOG takes precedence.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest files, directories or glob patterns; one target per file.
    Ingest(IngestArgs),
    /// List columns of comma-separated targets.
    Columns { targets: String },
    /// Infer column types of comma-separated targets from sampled values.
    Types { targets: String },
    /// Print up to ten raw values of one column.
    Sample { target: String, column: String },
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Files, directories or glob patterns.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Recognized file extensions (stripped from target names).
    #[arg(long = "ext", default_value = "csv", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Field delimiter (single ASCII character).
    #[arg(long, default_value = ",", value_parser = ascii_byte)]
    delimiter: u8,

    /// Only accept identifiers matching [A-Za-z_][A-Za-z0-9_]*.
    #[arg(long)]
    strict_identifiers: bool,

    /// Load into existing targets even when their columns differ from the file header.
    #[arg(long)]
    first_wins: bool,

    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    threads: Option<usize>,

    /// Files loading at once (defaults to DB_POOL_SIZE).
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Also append per-file outcomes to this file.
    #[arg(long)]
    outcome_log: Option<PathBuf>,
}

fn ascii_byte(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("expected a single ASCII character, got '{s}'")),
    }
}

fn main() -> Result<ExitCode> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        with_targets: false,
    })
    .context("install log subscriber")?;

    let config = StoreConfig::from_env().context("read store configuration")?;
    let store = store::open(&config).context("open store")?;
    info!(backend = ?config.backend, "store ready");

    match cli.command {
        Command::Ingest(args) => {
            let opts = ingestion_options(&args);
            let files = load_files(&args.inputs, &opts.extensions);
            let exec = ExecutionOptions {
                num_threads: args.threads,
                max_in_flight_files: args.max_in_flight.unwrap_or(config.pool_size),
            };
            let service = IngestionEngine::new(Arc::clone(&store), exec, opts).map(|engine| {
                TableService::new(engine.with_observer(Arc::new(TracingExecutionObserver)))
            });
            render(files.and_then(|files| service?.ingest(&files)))
        }
        Command::Columns { targets } => {
            render(TableService::with_defaults(store).and_then(|s| s.list_columns(&targets)))
        }
        Command::Types { targets } => {
            render(TableService::with_defaults(store).and_then(|s| s.infer_types(&targets)))
        }
        Command::Sample { target, column } => render(
            TableService::with_defaults(store).and_then(|s| s.sample_column(&target, &column)),
        ),
    }
}

fn ingestion_options(args: &IngestArgs) -> IngestionOptions {
    let mut observers: Vec<Arc<dyn IngestionObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = &args.outcome_log {
        observers.push(Arc::new(FileObserver::new(path)));
    }

    IngestionOptions {
        extensions: args.extensions.clone(),
        csv: CsvOptions {
            delimiter: args.delimiter,
            ..CsvOptions::default()
        },
        identifiers: if args.strict_identifiers {
            IdentifierPolicy::Strict
        } else {
            IdentifierPolicy::Quoted
        },
        collisions: if args.first_wins {
            CollisionPolicy::FirstWins
        } else {
            CollisionPolicy::Reject
        },
        observer: Some(Arc::new(CompositeObserver::new(observers))),
        ..IngestionOptions::default()
    }
}

/// Print the response body on stdout; engine errors become an error body and a failing exit.
fn render<T: Serialize>(result: EngineResult<T>) -> Result<ExitCode> {
    match result {
        Ok(body) => {
            println!("{}", to_json(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", to_json(&ErrorResponse::from(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}
