use crate::CliError;
use crate::config::{Config, ProviderConfig};
use clap::Args;
use recap_core::http::HttpConfig;
use recap_core::pipeline::{Pipeline, PipelineConfig, ProcessOutcome};
use recap_core::provider::{ExtractionProvider, create_provider};
use recap_core::store::Store;
use serde::Serialize;
use std::thread;
use tracing::{error, info};

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Transcript ids to process; each runs on its own thread
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Extraction mode: local or cloud
    #[arg(long)]
    pub extract: Option<String>,

    /// Extraction model override for the selected mode
    #[arg(long, value_name = "model")]
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeProfiles {
    pub active: String,
    pub local: ProviderConfig,
    pub cloud: ProviderConfig,
}

impl RuntimeProfiles {
    pub fn from_config(config: &Config) -> Self {
        Self {
            active: config.extract.active.clone(),
            local: config.extract.local.clone(),
            cloud: config.extract.cloud.clone(),
        }
    }

    pub fn active_profile(&self) -> &ProviderConfig {
        if self.active == "cloud" {
            &self.cloud
        } else {
            &self.local
        }
    }

    fn active_profile_mut(&mut self) -> &mut ProviderConfig {
        if self.active == "cloud" {
            &mut self.cloud
        } else {
            &mut self.local
        }
    }

    /// Apply environment overrides, the command-line mode selector and the model override.
    pub fn resolve(mut self, args: &ProcessArgs) -> Result<Self, CliError> {
        apply_env_overrides(&mut self);
        self.active = select_mode(self.active.as_str(), args.extract.as_deref())?;
        if let Some(model) = &args.model {
            self.active_profile_mut().model = model.clone();
        }
        Ok(self)
    }

    fn create_provider(&self, http: &HttpConfig) -> Result<Box<dyn ExtractionProvider>, CliError> {
        let profile = self.active_profile();
        Ok(create_provider(
            profile.provider.as_str(),
            non_empty_str(profile.model.as_str()),
            non_empty_str(profile.api_key.as_str()),
            http,
        )?)
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessReport {
    Processed(ProcessOutcome),
    Failed { transcript_id: String, error: String },
}

impl ProcessReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Process every requested transcript concurrently. Each run gets its own
/// provider; one failing run does not stop the others.
pub fn run<S: Store + ?Sized>(
    args: &ProcessArgs,
    config: &Config,
    store: &S,
) -> Result<Vec<ProcessReport>, CliError> {
    let profiles = RuntimeProfiles::from_config(config).resolve(args)?;
    let pipeline_config = config.pipeline_config()?;
    let http = config.http_config();

    // Fail fast on a bad profile before any thread starts.
    profiles.create_provider(&http)?;
    info!(
        mode = %profiles.active,
        provider = %profiles.active_profile().provider,
        model = %profiles.active_profile().model,
        transcripts = args.ids.len(),
        "processing transcripts"
    );

    let mut ids: Vec<&str> = Vec::with_capacity(args.ids.len());
    for id in &args.ids {
        if !ids.contains(&id.as_str()) {
            ids.push(id.as_str());
        }
    }

    let reports = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let profiles = &profiles;
                let http = &http;
                let handle = thread::Builder::new()
                    .name(format!("recap-process-{id}"))
                    .spawn_scoped(scope, move || {
                        process_one(id, profiles, http, pipeline_config, store)
                    });
                (*id, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(id, handle)| match handle {
                Ok(handle) => handle.join().unwrap_or_else(|_| failed(id, "worker panicked")),
                Err(err) => failed(id, &format!("worker spawn failed: {err}")),
            })
            .collect::<Vec<_>>()
    });

    Ok(reports)
}

fn process_one<S: Store + ?Sized>(
    id: &str,
    profiles: &RuntimeProfiles,
    http: &HttpConfig,
    pipeline_config: PipelineConfig,
    store: &S,
) -> ProcessReport {
    let provider = match profiles.create_provider(http) {
        Ok(provider) => provider,
        Err(err) => return failed(id, &err.to_string()),
    };
    let mut pipeline = Pipeline::new(store, provider, pipeline_config);
    match pipeline.process(id) {
        Ok(outcome) => ProcessReport::Processed(outcome),
        Err(err) => {
            error!(transcript = id, error = %err, "processing failed");
            failed(id, &err.to_string())
        }
    }
}

fn failed(id: &str, error: &str) -> ProcessReport {
    ProcessReport::Failed {
        transcript_id: id.to_string(),
        error: error.to_string(),
    }
}

fn select_mode(active: &str, selector: Option<&str>) -> Result<String, CliError> {
    match selector {
        None => Ok(if active == "cloud" {
            "cloud".to_string()
        } else {
            "local".to_string()
        }),
        Some("local") => Ok("local".to_string()),
        Some("cloud") => Ok("cloud".to_string()),
        Some(other) => Err(CliError::Args(format!(
            "extract must be local or cloud (got {other})"
        ))),
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn apply_env_overrides(profiles: &mut RuntimeProfiles) {
    if let Some(value) = env_override("RECAP_EXTRACT_LOCAL_MODEL") {
        profiles.local.model = value;
    }
    if let Some(value) = env_override("RECAP_EXTRACT_CLOUD_MODEL") {
        profiles.cloud.model = value;
    }
    if let Some(value) = env_override("RECAP_EXTRACT_CLOUD_API_KEY") {
        profiles.cloud.api_key = value;
    }
    if profiles.cloud.api_key.trim().is_empty() {
        if let Some(value) = env_override("OPENROUTER_API_KEY") {
            profiles.cloud.api_key = value;
        }
    }
}

fn non_empty_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
