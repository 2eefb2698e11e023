use crate::similarity::SimilarityFn;
use crate::types::MetricCandidate;
use std::collections::HashSet;

/// Keep only candidates that resemble none of the existing metric names.
pub fn filter_novel(
    candidates: Vec<MetricCandidate>,
    existing_names: &HashSet<String>,
    similar: SimilarityFn,
) -> Vec<MetricCandidate> {
    candidates
        .into_iter()
        .filter(|candidate| {
            !existing_names
                .iter()
                .any(|existing| similar(&candidate.name, existing))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::similar;

    fn metric(name: &str) -> MetricCandidate {
        MetricCandidate {
            name: name.to_string(),
            ..MetricCandidate::default()
        }
    }

    fn names(values: &[&str]) -> HashSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn drops_tracked_metrics() {
        let existing = names(&["nps score", "revenue growth"]);
        let novel = filter_novel(
            vec![metric("NPS Score"), metric("Customer Churn Rate")],
            &existing,
            similar,
        );
        assert_eq!(novel, vec![metric("Customer Churn Rate")]);
    }

    #[test]
    fn empty_catalog_keeps_everything() {
        let novel = filter_novel(
            vec![metric("Weekly Sales Calls"), metric("Churn Rate")],
            &HashSet::new(),
            similar,
        );
        assert_eq!(novel.len(), 2);
    }

    #[test]
    fn resemblance_counts_as_tracked() {
        let existing = names(&["Weekly Support Calls"]);
        let novel = filter_novel(vec![metric("Weekly Sales Calls")], &existing, similar);
        assert!(novel.is_empty());
    }

    #[test]
    fn blank_candidate_resembles_any_tracked_metric() {
        let existing = names(&["nps score"]);
        let novel = filter_novel(vec![metric("  "), metric("Churn Rate")], &existing, similar);
        assert_eq!(novel, vec![metric("Churn Rate")]);
    }
}
