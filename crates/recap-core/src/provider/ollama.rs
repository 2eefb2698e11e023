use crate::ProviderError;
use crate::http::{HttpConfig, agent_for, post_json};
use crate::types::ExtractionResult;
use serde::Deserialize;
use serde_json::json;

use super::{ExtractionProvider, prompt};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

pub struct OllamaProvider {
    model: String,
    base_url: String,
    agent: ureq::Agent,
    max_retries: usize,
}

impl OllamaProvider {
    pub fn new(model: &str, http: &HttpConfig) -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self {
            model: model.to_string(),
            base_url,
            agent: agent_for(http),
            max_retries: http.max_retries,
        }
    }

    fn build_request_body(&self, prompt: &str, json_output: bool) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {"temperature": 0.2},
        });
        if json_output {
            body["format"] = json!("json");
        }
        body
    }

    fn generate(&self, prompt: &str, json_output: bool) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.build_request_body(prompt, json_output);
        let raw = post_json(&self.agent, &url, None, &body, self.max_retries)?;
        Self::parse_response(raw.trim())
    }

    fn parse_response(body: &str) -> Result<String, ProviderError> {
        let response: OllamaResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        if let Some(error) = response.error {
            return Err(ProviderError::Failed(error));
        }
        response
            .response
            .ok_or_else(|| ProviderError::InvalidResponse("missing response field".into()))
    }
}

impl ExtractionProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn extract(
        &mut self,
        chunk: &str,
        context_tail: &str,
    ) -> Result<ExtractionResult, ProviderError> {
        let prompt = prompt::build_extract_prompt(chunk, context_tail);
        let content = self.generate(&prompt, true)?;
        prompt::parse_extraction(content.trim())
    }

    fn summarize(&mut self, full_text: &str) -> Result<String, ProviderError> {
        let prompt = prompt::build_summary_prompt(full_text);
        let content = self.generate(&prompt, false)?;
        Ok(prompt::clean_summary(&content))
    }
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_response_extracts_text() {
        let body = r#"{"model":"m","response":"{\"issues\": []}","done":true}"#;
        assert!(OllamaProvider::parse_response(body).unwrap().contains("issues"));
    }

    #[test]
    fn parse_response_surfaces_server_error() {
        let body = r#"{"error":"model not found"}"#;
        let err = OllamaProvider::parse_response(body).unwrap_err();
        assert!(matches!(err, ProviderError::Failed(message) if message == "model not found"));
    }

    #[test]
    fn json_format_only_for_extraction() {
        let provider = OllamaProvider::new("test-model", &HttpConfig::default());
        let extract = provider.build_request_body("p", true);
        let summary = provider.build_request_body("p", false);
        assert_eq!(extract["format"], "json");
        assert!(summary.get("format").is_none());
        assert_eq!(summary["model"], "test-model");
        assert_eq!(summary["stream"], false);
    }
}
