use crate::CliError;
use clap::{Args, Subcommand};
use recap_core::insight::{self, MetricSuggestion};
use recap_core::store::Store;
use recap_core::types::Insight;

#[derive(Args, Debug, Clone)]
pub struct InsightsArgs {
    #[command(subcommand)]
    pub command: InsightsCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsightsCommand {
    /// List insights, newest last
    List {
        /// Only insights derived from this transcript
        #[arg(long, value_name = "id")]
        transcript: Option<String>,

        /// Include dismissed insights
        #[arg(long)]
        all: bool,
    },
    /// Dismiss a suggestion
    Dismiss {
        id: String,

        /// Who dismissed it
        #[arg(long, value_name = "actor")]
        by: String,
    },
    /// Print the metric prefill carried by a suggestion
    Accept { id: String },
}

#[derive(Debug)]
pub enum InsightsOutput {
    List(Vec<Insight>),
    Dismissed(Insight),
    Accepted(MetricSuggestion),
}

pub fn run<S: Store + ?Sized>(args: &InsightsArgs, store: &S) -> Result<InsightsOutput, CliError> {
    match &args.command {
        InsightsCommand::List { transcript, all } => {
            let insights = match transcript {
                Some(id) => store.insights_for_source(id)?,
                None => store.insights()?,
            };
            Ok(InsightsOutput::List(
                insights
                    .into_iter()
                    .filter(|insight| *all || !insight.acknowledged)
                    .collect(),
            ))
        }
        InsightsCommand::Dismiss { id, by } => {
            if by.trim().is_empty() {
                return Err(CliError::Args("--by must name who dismissed it".into()));
            }
            Ok(InsightsOutput::Dismissed(insight::dismiss(
                store,
                id,
                by.trim(),
            )?))
        }
        InsightsCommand::Accept { id } => Ok(InsightsOutput::Accepted(insight::accept(store, id)?)),
    }
}

impl InsightsOutput {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::List(insights) => serde_json::to_string_pretty(insights),
            Self::Dismissed(insight) => serde_json::to_string_pretty(insight),
            Self::Accepted(payload) => serde_json::to_string_pretty(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_core::store::MemoryStore;
    use recap_core::types::MetricCandidate;

    fn seeded() -> (MemoryStore, String) {
        let store = MemoryStore::new();
        let candidate = MetricCandidate {
            name: "Weekly demos".to_string(),
            ..MetricCandidate::default()
        };
        let ids = insight::suggest(&store, &[candidate], "t1", None).unwrap();
        (store, ids[0].clone())
    }

    fn list(transcript: Option<&str>, all: bool) -> InsightsArgs {
        InsightsArgs {
            command: InsightsCommand::List {
                transcript: transcript.map(str::to_string),
                all,
            },
        }
    }

    #[test]
    fn dismissed_insights_are_hidden_by_default() {
        let (store, id) = seeded();
        let dismiss = InsightsArgs {
            command: InsightsCommand::Dismiss {
                id: id.clone(),
                by: "ana".to_string(),
            },
        };
        run(&dismiss, &store).unwrap();

        match run(&list(None, false), &store).unwrap() {
            InsightsOutput::List(items) => assert!(items.is_empty()),
            other => panic!("unexpected output: {other:?}"),
        }
        match run(&list(Some("t1"), true), &store).unwrap() {
            InsightsOutput::List(items) => assert_eq!(items[0].id, id),
            other => panic!("unexpected output: {other:?}"),
        }
        match run(&list(Some("t2"), true), &store).unwrap() {
            InsightsOutput::List(items) => assert!(items.is_empty()),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn dismiss_requires_actor() {
        let (store, id) = seeded();
        let args = InsightsArgs {
            command: InsightsCommand::Dismiss {
                id,
                by: " ".to_string(),
            },
        };
        assert!(matches!(run(&args, &store), Err(CliError::Args(_))));
    }

    #[test]
    fn accept_prints_prefill() {
        let (store, id) = seeded();
        let args = InsightsArgs {
            command: InsightsCommand::Accept { id },
        };
        let output = run(&args, &store).unwrap();
        let json = output.to_json().unwrap();
        assert!(json.contains("\"name\": \"Weekly demos\""));
    }
}
