use crate::chunk::{ChunkerConfig, chunk_transcript};
use crate::extract::{DEFAULT_CONTEXT_TAIL, extract_chunks};
use crate::insight;
use crate::merge::merge_extractions;
use crate::novelty::filter_novel;
use crate::provider::ExtractionProvider;
use crate::similarity::{SimilarityFn, similar};
use crate::store::Store;
use crate::types::{MergedExtraction, Transcript, TranscriptUpdate, now_rfc3339};
use crate::{PipelineError, ProviderError};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, info_span};

pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(900);

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub chunker: ChunkerConfig,
    /// Characters of the previous chunk handed to the next extraction call.
    pub context_tail: usize,
    /// Budget for a whole `process` call, checked before every provider call.
    pub run_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            context_tail: DEFAULT_CONTEXT_TAIL,
            run_timeout: Some(DEFAULT_RUN_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub transcript: Transcript,
    pub chunks_created: usize,
    pub extractions: MergedExtraction,
    /// Ids of the suggestion insights created by this run.
    pub suggestions: Vec<String>,
}

/// Transcript processing: chunk, extract, merge, summarize, suggest.
pub struct Pipeline<'a, S: Store + ?Sized> {
    store: &'a S,
    provider: Box<dyn ExtractionProvider>,
    config: PipelineConfig,
    similar: SimilarityFn,
}

impl<'a, S: Store + ?Sized> Pipeline<'a, S> {
    pub fn new(store: &'a S, provider: Box<dyn ExtractionProvider>, config: PipelineConfig) -> Self {
        Self {
            store,
            provider,
            config,
            similar,
        }
    }

    pub fn with_similarity(mut self, similar: SimilarityFn) -> Self {
        self.similar = similar;
        self
    }

    /// Process one transcript from scratch.
    ///
    /// Stored chunks are replaced before any provider call and are not rolled
    /// back if a later step fails. Suggestions are filed before the transcript
    /// is marked processed, so a failed run leaves it unprocessed and a retry
    /// does not duplicate suggestions.
    pub fn process(&mut self, transcript_id: &str) -> Result<ProcessOutcome, PipelineError> {
        let span = info_span!("process", transcript = transcript_id, provider = self.provider.name());
        let _guard = span.enter();
        let deadline = Deadline::start(self.config.run_timeout);

        let transcript = self
            .store
            .get_transcript(transcript_id)?
            .ok_or_else(|| PipelineError::Input(format!("transcript {transcript_id} not found")))?;

        let chunks = chunk_transcript(&transcript.text, &transcript.id, &self.config.chunker)?;
        self.store.replace_chunks(&transcript.id, &chunks)?;
        info!(chunks = chunks.len(), "transcript chunked");

        let provider = &mut self.provider;
        let results = extract_chunks(&chunks, self.config.context_tail, |chunk, context| {
            deadline.check()?;
            provider.extract(&chunk.content, context)
        })?;
        let extractions = merge_extractions(&results, self.similar);
        info!(
            issues = extractions.issues.len(),
            todos = extractions.todos.len(),
            metrics = extractions.metrics.len(),
            decisions = extractions.decisions.len(),
            "extractions merged"
        );

        deadline.check()?;
        let generated = self.provider.summarize(&transcript.text)?;
        let summary = if generated.trim().is_empty() {
            extractions.summary.clone()
        } else {
            Some(generated)
        };

        let existing = self.store.existing_metric_names()?;
        let novel = filter_novel(extractions.metrics.clone(), &existing, self.similar);
        let suggestions = insight::suggest(
            self.store,
            &novel,
            &transcript.id,
            transcript.title.as_deref(),
        )?;
        info!(
            candidates = extractions.metrics.len(),
            novel = novel.len(),
            created = suggestions.len(),
            "metric suggestions filed"
        );

        // Marking the transcript processed is the last write of a run.
        let update = TranscriptUpdate {
            processed: Some(true),
            processed_at: Some(now_rfc3339()?),
            summary,
        };
        let transcript = self
            .store
            .update_transcript(&transcript.id, update)?
            .ok_or_else(|| PipelineError::Input(format!("transcript {transcript_id} not found")))?;

        Ok(ProcessOutcome {
            transcript,
            chunks_created: chunks.len(),
            extractions,
            suggestions,
        })
    }
}

struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self) -> Result<(), ProviderError> {
        match self.limit {
            Some(limit) if self.started.elapsed() >= limit => {
                Err(ProviderError::DeadlineExceeded(limit.as_secs()))
            }
            _ => Ok(()),
        }
    }
}
