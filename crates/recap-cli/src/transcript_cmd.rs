use crate::CliError;
use clap::Args;
use recap_core::PipelineError;
use recap_core::store::Store;
use recap_core::types::{Transcript, TranscriptChunk};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Plain-text transcript file
    pub file: PathBuf,

    /// Transcript title (defaults to the file stem)
    #[arg(long)]
    pub title: Option<String>,

    /// Meeting this transcript belongs to
    #[arg(long, value_name = "id")]
    pub meeting: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ChunksArgs {
    /// Transcript id
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub id: String,
    pub title: Option<String>,
    pub chars: usize,
}

pub fn ingest<S: Store + ?Sized>(args: &IngestArgs, store: &S) -> Result<IngestReport, CliError> {
    let text = fs::read_to_string(&args.file)?;
    if text.trim().is_empty() {
        return Err(CliError::Args(format!(
            "{} contains no transcript text",
            args.file.display()
        )));
    }

    let title = args.title.clone().or_else(|| {
        args.file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    });
    let transcript =
        Transcript::new(text, title, args.meeting.clone()).map_err(PipelineError::from)?;
    store.insert_transcript(&transcript)?;
    tracing::info!(transcript = %transcript.id, "transcript ingested");

    Ok(IngestReport {
        id: transcript.id,
        title: transcript.title,
        chars: transcript.text.chars().count(),
    })
}

pub fn chunks<S: Store + ?Sized>(
    args: &ChunksArgs,
    store: &S,
) -> Result<Vec<TranscriptChunk>, CliError> {
    if store.get_transcript(&args.id)?.is_none() {
        return Err(CliError::Args(format!("transcript {} not found", args.id)));
    }
    Ok(store.chunks(&args.id)?)
}
