use crate::ProviderError;
use crate::types::ExtractionResult;

pub(crate) fn build_extract_prompt(chunk: &str, context_tail: &str) -> String {
    const JSON_SCHEMA_SAMPLE: &str = r#"
{
    "issues": [{"title": "...", "owner": "...", "priority": "high|medium|low", "context": "..."}],
    "todos": [{"title": "...", "owner": "...", "due_date": "YYYY-MM-DD", "priority": "...", "context": "..."}],
    "metrics": [{"name": "...", "description": "...", "target": "...", "owner": "...", "frequency": "weekly|monthly|quarterly", "context": "..."}],
    "decisions": [{"quote": "...", "owner": "...", "context": "..."}],
    "summary": "..."
}
"#;
    let context_block = if context_tail.trim().is_empty() {
        String::new()
    } else {
        format!(
            "The previous excerpt ended with the text below. Use it only to resolve references; do not extract items from it.\n{}\n",
            context_tail.trim()
        )
    };

    format!(
        r#"
<task>
You are reading one excerpt of a business meeting transcript. Extract the accountability records it contains.
</task>

<schema>
Output JSON matching this schema. Omit optional fields you cannot fill; use [] for empty lists:
{schema}
</schema>

<capture>
- issues: problems, blockers, risks or open questions someone raised
- todos: concrete action items; the owner is the person who committed to it
- metrics: numbers the team wants to track on a recurring basis (name them as a short noun phrase)
- decisions: things agreed, chosen or rejected; quote the words used where possible
- summary: 1-2 sentences on this excerpt
</capture>

<rules>
- One record per distinct item; do not repeat an item in two categories unless it is both
- Titles <=100 characters, concrete and specific
- Dates as YYYY-MM-DD when a date is stated; otherwise omit due_date
- Output only JSON
</rules>

<input_context>
{context_block}
</input_context>

<input_excerpt>
{chunk}
</input_excerpt>
"#,
        schema = JSON_SCHEMA_SAMPLE,
        context_block = context_block,
        chunk = chunk.trim(),
    )
}

pub(crate) fn build_summary_prompt(full_text: &str) -> String {
    format!(
        r#"
<task>
Summarize the business meeting transcript below in one paragraph of at most 120 words. Lead with decisions and commitments. Output plain text, no preamble.
</task>

<input_transcript>
{transcript}
</input_transcript>
"#,
        transcript = full_text.trim()
    )
}

pub(crate) fn parse_extraction(output: &str) -> Result<ExtractionResult, ProviderError> {
    if let Ok(result) = serde_json::from_str::<ExtractionResult>(output) {
        return Ok(result);
    }

    let json = extract_json_object(output)
        .ok_or_else(|| ProviderError::InvalidResponse("no json object found".into()))?;
    serde_json::from_str(json).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

pub(crate) fn clean_summary(output: &str) -> String {
    output
        .trim()
        .trim_start_matches("Summary:")
        .trim()
        .to_string()
}

fn extract_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&input[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_object_finds_bounds() {
        let input = "sure! {\"issues\": []} hope that helps";
        assert_eq!(extract_json_object(input), Some("{\"issues\": []}"));
        assert_eq!(extract_json_object("} nothing {"), None);
    }

    #[test]
    fn parse_extraction_reads_all_categories() {
        let output = r#"{
            "issues": [{"title": "Checkout errors on Safari", "priority": "high"}],
            "todos": [{"title": "Send revised quote", "owner": "Dana", "due_date": "2026-10-23"}],
            "metrics": [{"name": "Weekly demos booked", "target": "12", "frequency": "weekly"}],
            "decisions": [{"quote": "We're moving the launch to November"}]
        }"#;
        let result = parse_extraction(output).unwrap();
        assert_eq!(result.issues[0].priority.as_deref(), Some("high"));
        assert_eq!(result.todos[0].owner.as_deref(), Some("Dana"));
        assert_eq!(result.metrics[0].name, "Weekly demos booked");
        assert_eq!(result.decisions.len(), 1);
        assert_eq!(result.summary, None);
    }

    #[test]
    fn parse_extraction_tolerates_missing_lists_and_wrapping() {
        let output = "```json\n{\"todos\": [{\"title\": \"Book venue\"}]}\n```";
        let result = parse_extraction(output).unwrap();
        assert_eq!(result.todos.len(), 1);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn parse_extraction_rejects_prose() {
        assert!(matches!(
            parse_extraction("I could not find anything."),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn extract_prompt_includes_context_only_when_present() {
        let first = build_extract_prompt("hello team", "");
        assert!(first.contains("<input_excerpt>\nhello team"));
        assert!(!first.contains("previous excerpt ended"));

        let later = build_extract_prompt("next part", "tail of the last chunk");
        assert!(later.contains("previous excerpt ended"));
        assert!(later.contains("tail of the last chunk"));
    }

    #[test]
    fn clean_summary_strips_label_and_whitespace() {
        assert_eq!(clean_summary("  \n"), "");
        assert_eq!(clean_summary(" Summary: Ship it. \n"), "Ship it.");
    }
}
