use crate::ProviderError;
use crate::http::{HttpConfig, agent_for, post_json};
use crate::types::ExtractionResult;
use serde::Deserialize;
use serde_json::json;

use super::{ExtractionProvider, prompt};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
const EXTRACT_SYSTEM_PROMPT: &str =
    "You extract accountability records from meeting transcripts. Output only JSON.";
const SUMMARY_SYSTEM_PROMPT: &str = "You write concise business meeting summaries.";

pub struct OpenRouterProvider {
    model: String,
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
    max_retries: usize,
}

impl OpenRouterProvider {
    pub fn new(
        model: Option<&str>,
        api_key: Option<&str>,
        http: &HttpConfig,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ProviderError::Failed("cloud API key not set".into()))?
            .to_string();
        let base_url =
            std::env::var("OPENROUTER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Ok(Self {
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            base_url,
            api_key,
            agent: agent_for(http),
            max_retries: http.max_retries,
        })
    }

    fn build_request_body(&self, system: &str, prompt: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.2,
        })
    }

    fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(system, prompt);
        let raw = post_json(
            &self.agent,
            &url,
            Some(&self.api_key),
            &body,
            self.max_retries,
        )?;
        Self::parse_response(raw.trim())
    }

    fn parse_response(body: &str) -> Result<String, ProviderError> {
        let response: OpenRouterResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no choices".into()))?;
        Ok(choice.message.content)
    }
}

impl ExtractionProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn extract(
        &mut self,
        chunk: &str,
        context_tail: &str,
    ) -> Result<ExtractionResult, ProviderError> {
        let prompt = prompt::build_extract_prompt(chunk, context_tail);
        let content = self.complete(EXTRACT_SYSTEM_PROMPT, &prompt)?;
        prompt::parse_extraction(content.trim())
    }

    fn summarize(&mut self, full_text: &str) -> Result<String, ProviderError> {
        let prompt = prompt::build_summary_prompt(full_text);
        let content = self.complete(SUMMARY_SYSTEM_PROMPT, &prompt)?;
        Ok(prompt::clean_summary(&content))
    }
}

#[derive(Deserialize)]
struct OpenRouterResponse {
    choices: Vec<OpenRouterChoice>,
}

#[derive(Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Deserialize)]
struct OpenRouterMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenRouterProvider {
        OpenRouterProvider::new(Some("test-model"), Some("test-key"), &HttpConfig::default())
            .unwrap()
    }

    #[test]
    fn parse_response_extracts_content() {
        let body = r#"{"choices":[{"message":{"content":"{\"todos\": []}"}}]}"#;
        let content = OpenRouterProvider::parse_response(body).unwrap();
        assert!(content.contains("todos"));
    }

    #[test]
    fn parse_response_rejects_empty_choices() {
        assert!(OpenRouterProvider::parse_response(r#"{"choices":[]}"#).is_err());
    }

    #[test]
    fn build_request_body_uses_system_prompt_and_model() {
        let body = provider().build_request_body(EXTRACT_SYSTEM_PROMPT, "prompt");
        let model = body.get("model").and_then(|value| value.as_str());
        let system = body
            .get("messages")
            .and_then(|value| value.as_array())
            .and_then(|messages| messages.first())
            .and_then(|message| message.get("content"))
            .and_then(|value| value.as_str());
        assert_eq!(model, Some("test-model"));
        assert_eq!(system, Some(EXTRACT_SYSTEM_PROMPT));
    }
}
