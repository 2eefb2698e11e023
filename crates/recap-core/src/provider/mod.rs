pub mod ollama;
pub mod openrouter;
mod prompt;

use crate::ProviderError;
use crate::http::HttpConfig;
use crate::types::ExtractionResult;

const DEFAULT_OLLAMA_MODEL: &str = "qwen3:30b-a3b";

/// External completion capability used by the pipeline.
pub trait ExtractionProvider: Send {
    fn name(&self) -> &'static str;

    /// Extract structured records from one chunk. `context_tail` is the raw end
    /// of the previous chunk and is empty for the first one.
    fn extract(
        &mut self,
        chunk: &str,
        context_tail: &str,
    ) -> Result<ExtractionResult, ProviderError>;

    fn summarize(&mut self, full_text: &str) -> Result<String, ProviderError>;
}

pub fn create_provider(
    provider: &str,
    model: Option<&str>,
    api_key: Option<&str>,
    http: &HttpConfig,
) -> Result<Box<dyn ExtractionProvider>, ProviderError> {
    match provider {
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            model.unwrap_or(DEFAULT_OLLAMA_MODEL),
            http,
        ))),
        "openrouter" => Ok(Box::new(openrouter::OpenRouterProvider::new(
            model, api_key, http,
        )?)),
        other => Err(ProviderError::Failed(format!(
            "unknown extraction provider: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        let err = create_provider("gpt-in-a-box", None, None, &HttpConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown extraction provider"));
    }

    #[test]
    fn openrouter_requires_key() {
        assert!(create_provider("openrouter", None, Some("  "), &HttpConfig::default()).is_err());
    }

    #[test]
    fn ollama_needs_no_key() {
        let provider = create_provider("ollama", None, None, &HttpConfig::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
    }
}
