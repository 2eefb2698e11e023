use crate::CliError;
use clap::{Args, Subcommand};
use recap_core::store::{FileStore, Store};

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub command: MetricsCommand,
}

/// The tracked-metric catalog that suggestions are checked against.
#[derive(Subcommand, Debug, Clone)]
pub enum MetricsCommand {
    /// List tracked metric names
    List,
    /// Start tracking one or more metric names
    Track {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Stop tracking a metric name
    Untrack { name: String },
}

pub fn run(args: &MetricsArgs, store: &FileStore) -> Result<Vec<String>, CliError> {
    let mut names = store.existing_metric_names()?;
    match &args.command {
        MetricsCommand::List => {}
        MetricsCommand::Track { names: added } => {
            for name in added {
                let name = name.trim();
                if name.is_empty() {
                    return Err(CliError::Args("metric names must not be empty".into()));
                }
                names.insert(name.to_string());
            }
            store.write_metric_names(&names)?;
        }
        MetricsCommand::Untrack { name } => {
            if !names.remove(name.trim()) {
                return Err(CliError::Args(format!("metric {name:?} is not tracked")));
            }
            store.write_metric_names(&names)?;
        }
    }

    let mut sorted: Vec<String> = names.into_iter().collect();
    sorted.sort();
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: MetricsCommand) -> MetricsArgs {
        MetricsArgs { command }
    }

    #[test]
    fn track_and_untrack_update_catalog() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let listed = run(
            &args(MetricsCommand::Track {
                names: vec!["revenue growth".to_string(), " NPS score ".to_string()],
            }),
            &store,
        )
        .unwrap();
        assert_eq!(listed, vec!["NPS score", "revenue growth"]);

        run(
            &args(MetricsCommand::Untrack {
                name: "revenue growth".to_string(),
            }),
            &store,
        )
        .unwrap();
        assert_eq!(run(&args(MetricsCommand::List), &store).unwrap(), vec!["NPS score"]);
    }

    #[test]
    fn untracking_unknown_metric_fails() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        let err = run(
            &args(MetricsCommand::Untrack {
                name: "churn".to_string(),
            }),
            &store,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not tracked"));
    }
}
