use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A meeting transcript as ingested, plus the fields the pipeline owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meeting_id: Option<String>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub created_at: String,
}

impl Transcript {
    pub fn new(
        text: impl Into<String>,
        title: Option<String>,
        meeting_id: Option<String>,
    ) -> Result<Self, time::error::Format> {
        Ok(Self {
            id: uuid::Uuid::now_v7().to_string(),
            text: text.into(),
            title,
            meeting_id,
            processed: false,
            processed_at: None,
            summary: None,
            created_at: now_rfc3339()?,
        })
    }
}

/// Fields the pipeline may change on a transcript. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TranscriptUpdate {
    pub processed: Option<bool>,
    pub processed_at: Option<String>,
    pub summary: Option<String>,
}

/// A bounded window over a transcript. `start`/`end` are character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    pub transcript_id: String,
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    pub title: String,
    pub owner: Option<String>,
    pub priority: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Todo {
    pub title: String,
    pub owner: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricCandidate {
    pub name: String,
    pub description: Option<String>,
    pub target: Option<String>,
    pub owner: Option<String>,
    pub frequency: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decision {
    pub quote: String,
    pub owner: Option<String>,
    pub context: Option<String>,
}

/// Structured items extracted from a single chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionResult {
    pub issues: Vec<Issue>,
    pub todos: Vec<Todo>,
    pub metrics: Vec<MetricCandidate>,
    pub decisions: Vec<Decision>,
    pub summary: Option<String>,
}

/// Extraction output for a whole transcript, deduplicated across chunks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedExtraction {
    pub issues: Vec<Issue>,
    pub todos: Vec<Todo>,
    pub metrics: Vec<MetricCandidate>,
    pub decisions: Vec<Decision>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Suggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Provenance entry pointing back at the record an insight was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightSource {
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A persisted, acknowledgeable recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub insight_type: InsightType,
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub sources: Vec<InsightSource>,
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub acknowledged_at: Option<String>,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct InsightUpdate {
    pub acknowledged: Option<bool>,
    pub acknowledged_at: Option<String>,
    pub acknowledged_by: Option<String>,
}

pub fn now_rfc3339() -> Result<String, time::error::Format> {
    OffsetDateTime::now_utc().format(&Rfc3339)
}

impl TranscriptUpdate {
    pub fn apply(self, transcript: &mut Transcript) {
        if let Some(processed) = self.processed {
            transcript.processed = processed;
        }
        if let Some(processed_at) = self.processed_at {
            transcript.processed_at = Some(processed_at);
        }
        if let Some(summary) = self.summary {
            transcript.summary = Some(summary);
        }
    }
}

impl InsightUpdate {
    pub fn apply(self, insight: &mut Insight) {
        if let Some(acknowledged) = self.acknowledged {
            insight.acknowledged = acknowledged;
        }
        if let Some(acknowledged_at) = self.acknowledged_at {
            insight.acknowledged_at = Some(acknowledged_at);
        }
        if let Some(acknowledged_by) = self.acknowledged_by {
            insight.acknowledged_by = Some(acknowledged_by);
        }
    }
}
