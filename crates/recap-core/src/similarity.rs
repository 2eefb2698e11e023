use std::collections::HashSet;

/// Signature shared by everything that needs an "is this the same item" test.
pub type SimilarityFn = fn(&str, &str) -> bool;

const MIN_TOKEN_CHARS: usize = 3;
const MIN_SHARED_TOKENS: usize = 2;

/// Loose equivalence between two item names. Symmetric.
///
/// Matches on normalized equality, on one name containing the other, or on at
/// least two shared words of three or more characters. A blank name is
/// contained in every name, so it matches everything.
pub fn similar(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    if na == nb {
        return true;
    }
    if na.contains(nb.as_str()) || nb.contains(na.as_str()) {
        return true;
    }
    let ta = tokens(&na);
    let tb = tokens(&nb);
    ta.intersection(&tb).count() >= MIN_SHARED_TOKENS
}

pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn tokens(normalized: &str) -> HashSet<&str> {
    normalized
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_after_normalizing() {
        assert!(similar("NPS Score", "  nps score "));
    }

    #[test]
    fn containment_matches() {
        assert!(similar("Sales Calls", "Weekly Sales Calls"));
    }

    #[test]
    fn unrelated_names_do_not_match() {
        assert!(!similar("Churn Rate", "Revenue Growth"));
    }

    #[test]
    fn two_shared_words_match() {
        assert!(similar("Weekly Sales Calls", "Weekly Support Calls"));
    }

    #[test]
    fn short_words_are_not_counted() {
        // "of" and "to" are below the token floor; only "time" is shared.
        assert!(!similar("time to hire", "time of day"));
    }

    #[test]
    fn one_shared_word_is_not_enough() {
        assert!(!similar("Customer Churn Rate", "Customer Acquisition Cost"));
    }

    #[test]
    fn blank_name_is_contained_in_any_name() {
        assert!(similar("", "   "));
        assert!(similar("", "revenue"));
        assert!(similar("revenue", " "));
    }

    #[test]
    fn symmetric_over_samples() {
        let samples = [
            "",
            "NPS Score",
            "nps",
            "Weekly Sales Calls",
            "Sales Calls",
            "Weekly Support Calls",
            "Churn Rate",
            "Revenue Growth",
            "Monthly Recurring Revenue Growth",
            "Fix login bug",
            "fix the login bug on mobile",
            "time to hire",
        ];
        for a in &samples {
            for b in &samples {
                assert_eq!(similar(a, b), similar(b, a), "asymmetric: {a:?} / {b:?}");
            }
        }
    }
}
