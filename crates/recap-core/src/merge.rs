use crate::similarity::SimilarityFn;
use crate::types::{Decision, ExtractionResult, Issue, MergedExtraction, MetricCandidate, Todo};
use tracing::debug;

/// The text an extracted item is compared on when deduplicating.
pub trait DedupKey {
    fn dedup_key(&self) -> &str;
}

impl DedupKey for Issue {
    fn dedup_key(&self) -> &str {
        &self.title
    }
}

impl DedupKey for Todo {
    fn dedup_key(&self) -> &str {
        &self.title
    }
}

impl DedupKey for MetricCandidate {
    fn dedup_key(&self) -> &str {
        &self.name
    }
}

impl DedupKey for Decision {
    fn dedup_key(&self) -> &str {
        &self.quote
    }
}

/// Fold per-chunk results into one deduplicated set per category.
///
/// Results are visited in chunk order and the first occurrence of a similar
/// item is the one kept.
pub fn merge_extractions(results: &[ExtractionResult], similar: SimilarityFn) -> MergedExtraction {
    let mut merged = MergedExtraction::default();
    for result in results {
        absorb(&mut merged.issues, &result.issues, similar);
        absorb(&mut merged.todos, &result.todos, similar);
        absorb(&mut merged.metrics, &result.metrics, similar);
        absorb(&mut merged.decisions, &result.decisions, similar);
    }

    merged.summary = match results {
        [only] => only.summary.clone().filter(|value| !value.trim().is_empty()),
        _ => None,
    };
    merged
}

fn absorb<T: DedupKey + Clone>(accepted: &mut Vec<T>, incoming: &[T], similar: SimilarityFn) {
    for item in incoming {
        let key = item.dedup_key();
        if key.trim().is_empty() {
            continue;
        }
        if accepted
            .iter()
            .any(|existing| similar(existing.dedup_key(), key))
        {
            debug!(item = key, "dropping duplicate extraction");
            continue;
        }
        accepted.push(item.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::similar;

    fn issue(title: &str) -> Issue {
        Issue {
            title: title.to_string(),
            ..Issue::default()
        }
    }

    fn todo(title: &str, owner: &str) -> Todo {
        Todo {
            title: title.to_string(),
            owner: Some(owner.to_string()),
            ..Todo::default()
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let results = vec![
            ExtractionResult {
                issues: vec![issue("Fix login bug")],
                ..ExtractionResult::default()
            },
            ExtractionResult {
                issues: vec![issue("fix login bug")],
                ..ExtractionResult::default()
            },
        ];
        let merged = merge_extractions(&results, similar);
        assert_eq!(merged.issues, vec![issue("Fix login bug")]);
    }

    #[test]
    fn categories_are_deduplicated_independently() {
        let results = vec![
            ExtractionResult {
                issues: vec![issue("Onboarding emails bounce")],
                todos: vec![todo("Onboarding emails bounce", "Sam")],
                ..ExtractionResult::default()
            },
            ExtractionResult {
                todos: vec![todo("Call the vendor about invoices", "Ana")],
                ..ExtractionResult::default()
            },
        ];
        let merged = merge_extractions(&results, similar);
        assert_eq!(merged.issues.len(), 1);
        assert_eq!(merged.todos.len(), 2);
        assert_eq!(merged.todos[0].owner.as_deref(), Some("Sam"));
    }

    #[test]
    fn duplicates_within_one_chunk_are_dropped() {
        let results = vec![ExtractionResult {
            decisions: vec![
                Decision {
                    quote: "We will hire two engineers".to_string(),
                    ..Decision::default()
                },
                Decision {
                    quote: "we will hire two engineers in Q3".to_string(),
                    ..Decision::default()
                },
            ],
            ..ExtractionResult::default()
        }];
        let merged = merge_extractions(&results, similar);
        assert_eq!(merged.decisions.len(), 1);
    }

    #[test]
    fn blank_keys_are_skipped() {
        let results = vec![ExtractionResult {
            issues: vec![issue("  "), issue("Churn is rising")],
            ..ExtractionResult::default()
        }];
        let merged = merge_extractions(&results, similar);
        assert_eq!(merged.issues, vec![issue("Churn is rising")]);
    }

    #[test]
    fn summary_fallback_only_for_single_chunk() {
        let single = vec![ExtractionResult {
            summary: Some("Short sync.".to_string()),
            ..ExtractionResult::default()
        }];
        assert_eq!(
            merge_extractions(&single, similar).summary.as_deref(),
            Some("Short sync.")
        );

        let many = vec![single[0].clone(), single[0].clone()];
        assert_eq!(merge_extractions(&many, similar).summary, None);
    }

    #[test]
    fn injected_predicate_is_used() {
        fn never(_: &str, _: &str) -> bool {
            false
        }
        let results = vec![ExtractionResult {
            issues: vec![issue("a"), issue("a")],
            ..ExtractionResult::default()
        }];
        assert_eq!(merge_extractions(&results, never).issues.len(), 2);
    }
}
