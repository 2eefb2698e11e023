mod config;
mod config_cmd;
mod insights_cmd;
mod metrics_cmd;
mod process_cmd;
mod transcript_cmd;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError, ConfigPaths};
use recap_core::store::FileStore;
use recap_core::{PipelineError, ProviderError, StoreError};
use serde::Serialize;
use std::io;
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "RECAP_LOG";
const DEFAULT_LOG_FILTER: &str = "recap=info";

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("extraction service error: {0}")]
    Provider(#[from] ProviderError),
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Args(String),
}

#[derive(Parser)]
#[command(name = "recap", version, about = "meeting transcript intelligence pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a transcript file for processing
    Ingest(transcript_cmd::IngestArgs),
    /// Chunk, extract and summarize transcripts, then file metric suggestions
    Process(process_cmd::ProcessArgs),
    /// Show the stored chunks of a transcript
    Chunks(transcript_cmd::ChunksArgs),
    /// List, dismiss or accept insights
    Insights(insights_cmd::InsightsArgs),
    /// Manage the tracked-metric catalog
    Metrics(metrics_cmd::MetricsArgs),
    /// Inspect or edit ~/.recap/config.toml
    Config(config_cmd::ConfigArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(config: &Config, paths: &ConfigPaths) -> Result<FileStore, CliError> {
    Ok(FileStore::open(config.data_dir(paths))?)
}

fn run(command: Command, config: &Config, paths: &ConfigPaths) -> Result<(), CliError> {
    match command {
        Command::Ingest(args) => {
            let store = open_store(config, paths)?;
            print_json(&transcript_cmd::ingest(&args, &store)?)
        }
        Command::Process(args) => {
            let store = open_store(config, paths)?;
            let reports = process_cmd::run(&args, config, &store)?;
            print_json(&reports)?;
            let failures = reports.iter().filter(|report| report.is_failed()).count();
            if failures > 0 {
                return Err(CliError::Args(format!(
                    "{failures} of {} transcripts failed",
                    reports.len()
                )));
            }
            Ok(())
        }
        Command::Chunks(args) => {
            let store = open_store(config, paths)?;
            print_json(&transcript_cmd::chunks(&args, &store)?)
        }
        Command::Insights(args) => {
            let store = open_store(config, paths)?;
            let output = insights_cmd::run(&args, &store)?;
            println!("{}", output.to_json()?);
            Ok(())
        }
        Command::Metrics(args) => {
            let store = open_store(config, paths)?;
            print_json(&metrics_cmd::run(&args, &store)?)
        }
        Command::Config(args) => Ok(config_cmd::run(&args, paths)?),
    }
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ingest(_) => "ingest",
        Command::Process(_) => "process",
        Command::Chunks(_) => "chunks",
        Command::Insights(_) => "insights",
        Command::Metrics(_) => "metrics",
        Command::Config(_) => "config",
    }
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let paths = match ConfigPaths::from_home() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("config paths error: {err}");
            std::process::exit(1);
        }
    };

    let config = match Config::load_or_create(&paths) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config load failed: {err}");
            std::process::exit(1);
        }
    };

    let label = command_label(&cli.command);
    if let Err(e) = run(cli.command, &config, &paths) {
        eprintln!("{label} failed: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_insight_dismiss() {
        let cli = Cli::try_parse_from(["recap", "insights", "dismiss", "abc", "--by", "ana"]).unwrap();
        assert_eq!(command_label(&cli.command), "insights");
    }

    #[test]
    fn process_requires_an_id() {
        assert!(Cli::try_parse_from(["recap", "process"]).is_err());
        let cli = Cli::try_parse_from(["recap", "process", "t1", "t2", "--extract", "cloud"]).unwrap();
        match cli.command {
            Command::Process(args) => {
                assert_eq!(args.ids, vec!["t1", "t2"]);
                assert_eq!(args.extract.as_deref(), Some("cloud"));
            }
            _ => panic!("expected process"),
        }
    }
}
