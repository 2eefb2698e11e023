use crate::PipelineError;
use crate::StoreError;
use crate::similarity::normalize;
use crate::store::Store;
use crate::types::{
    Insight, InsightSource, InsightType, InsightUpdate, MetricCandidate, Priority, now_rfc3339,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

pub const METRIC_SUGGESTION_KIND: &str = "metric_suggestion";
pub const METRIC_SUGGESTION_VERSION: u32 = 1;
pub const SUGGESTION_TITLE_PREFIX: &str = "Suggested metric: ";
const TRANSCRIPT_SOURCE: &str = "transcript";

/// Metric candidate payload stored in an insight's `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSuggestion {
    pub kind: String,
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl MetricSuggestion {
    pub fn from_candidate(candidate: &MetricCandidate) -> Self {
        Self {
            kind: METRIC_SUGGESTION_KIND.to_string(),
            version: METRIC_SUGGESTION_VERSION,
            name: candidate.name.trim().to_string(),
            description: candidate.description.clone(),
            target: candidate.target.clone(),
            owner: candidate.owner.clone(),
            frequency: candidate.frequency.clone(),
            context: candidate.context.clone(),
        }
    }

    pub fn encode(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(content: &str) -> Result<Self, PipelineError> {
        let payload: Self = serde_json::from_str(content)
            .map_err(|e| PipelineError::Parse(format!("metric suggestion payload: {e}")))?;
        if payload.kind != METRIC_SUGGESTION_KIND {
            return Err(PipelineError::Parse(format!(
                "expected a {METRIC_SUGGESTION_KIND} payload, got {}",
                payload.kind
            )));
        }
        if payload.version == 0 || payload.version > METRIC_SUGGESTION_VERSION {
            return Err(PipelineError::Parse(format!(
                "unsupported metric suggestion version {}",
                payload.version
            )));
        }
        if payload.name.trim().is_empty() {
            return Err(PipelineError::Parse(
                "metric suggestion has an empty name".into(),
            ));
        }
        Ok(payload)
    }
}

/// Lenient decode for form prefill: `None` when the content is not a metric suggestion.
pub fn parse_metric_suggestion(content: &str) -> Option<MetricSuggestion> {
    MetricSuggestion::decode(content).ok()
}

/// Persist each novel metric as an unacknowledged suggestion and return the new ids.
///
/// Metrics already suggested from the same transcript are skipped, so a re-run
/// does not duplicate suggestions.
pub fn suggest<S: Store + ?Sized>(
    store: &S,
    novel: &[MetricCandidate],
    transcript_id: &str,
    transcript_title: Option<&str>,
) -> Result<Vec<String>, PipelineError> {
    let mut suggested = already_suggested(store, transcript_id)?;
    let mut created = Vec::new();

    for candidate in novel {
        let payload = MetricSuggestion::from_candidate(candidate);
        if payload.name.is_empty() || !suggested.insert(normalize(&payload.name)) {
            continue;
        }

        let insight = Insight {
            id: uuid::Uuid::now_v7().to_string(),
            insight_type: InsightType::Suggestion,
            title: format!("{SUGGESTION_TITLE_PREFIX}{}", payload.name),
            content: payload.encode()?,
            priority: Priority::Medium,
            sources: vec![InsightSource {
                kind: TRANSCRIPT_SOURCE.to_string(),
                id: transcript_id.to_string(),
                title: transcript_title.map(str::to_string),
            }],
            acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
            created_at: now_rfc3339()?,
        };
        let insight = store.create_insight(insight)?;
        info!(insight = %insight.id, metric = %payload.name, "metric suggestion created");
        created.push(insight.id);
    }

    Ok(created)
}

/// Mark a suggestion as dismissed. Dismissing twice keeps the first timestamp and actor.
pub fn dismiss<S: Store + ?Sized>(
    store: &S,
    insight_id: &str,
    actor: &str,
) -> Result<Insight, PipelineError> {
    let insight = store
        .get_insight(insight_id)?
        .ok_or_else(|| PipelineError::NotFound(format!("insight {insight_id}")))?;
    if insight.acknowledged {
        return Ok(insight);
    }

    let update = InsightUpdate {
        acknowledged: Some(true),
        acknowledged_at: Some(now_rfc3339()?),
        acknowledged_by: Some(actor.to_string()),
    };
    let insight = store
        .update_insight(insight_id, update)?
        .ok_or_else(|| PipelineError::NotFound(format!("insight {insight_id}")))?;
    info!(insight = %insight.id, actor, "suggestion dismissed");
    Ok(insight)
}

/// Decode a suggestion for metric-creation prefill. Leaves the insight untouched.
pub fn accept<S: Store + ?Sized>(
    store: &S,
    insight_id: &str,
) -> Result<MetricSuggestion, PipelineError> {
    let insight = store
        .get_insight(insight_id)?
        .ok_or_else(|| PipelineError::NotFound(format!("insight {insight_id}")))?;
    MetricSuggestion::decode(&insight.content)
}

fn already_suggested<S: Store + ?Sized>(
    store: &S,
    transcript_id: &str,
) -> Result<HashSet<String>, PipelineError> {
    let mut names = HashSet::new();
    for insight in store.insights_for_source(transcript_id)? {
        if insight.insight_type != InsightType::Suggestion {
            continue;
        }
        match MetricSuggestion::decode(&insight.content) {
            Ok(payload) => {
                names.insert(normalize(&payload.name));
            }
            Err(err) => warn!(insight = %insight.id, error = %err, "skipping unreadable suggestion"),
        }
    }
    Ok(names)
}
