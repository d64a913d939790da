//! Generative fallback for queries no structured intent recognised.

use std::sync::Arc;
use std::time::Duration;

use crate::error::QueryError;
use crate::llm::{GenerationConfig, LLMProvider};

pub const SYSTEM_INSTRUCTION: &str = "Please answer the question using any data you can find on the internet about natural disasters. If the question is about current weather then answer accordingly using sources from the internet as well. PLEASE DISPLAY THE INFORMATION YOU FOUND.";

pub fn build_prompt(system: &str, user_query: &str) -> String {
    format!("{}\n\nUSER: {}", system, user_query)
}

pub struct GenerativeFallback {
    provider: Arc<dyn LLMProvider>,
    generation: GenerationConfig,
    timeout: Duration,
}

impl GenerativeFallback {
    pub fn new(provider: Arc<dyn LLMProvider>, generation: GenerationConfig, timeout: Duration) -> Self {
        Self {
            provider,
            generation,
            timeout,
        }
    }

    /// Ask the model. Any provider failure, timeout or blank output becomes a
    /// [`QueryError::GenerativeError`]; nothing is retried.
    pub async fn answer(&self, query: &str) -> Result<String, QueryError> {
        let prompt = build_prompt(SYSTEM_INSTRUCTION, query);
        let info = self.provider.info();
        let started = std::time::Instant::now();

        let raw = tokio::time::timeout(self.timeout, self.provider.generate(&prompt, &self.generation))
            .await
            .map_err(|_| {
                QueryError::GenerativeError(format!("no response within {:?}", self.timeout))
            })?
            .map_err(|e| QueryError::GenerativeError(format!("{:#}", e)))?;

        let text = raw.trim();
        if text.is_empty() {
            return Err(QueryError::GenerativeError("empty response".to_string()));
        }

        tracing::info!(
            provider = %info.name,
            model = %info.model,
            latency_ms = started.elapsed().as_millis() as u64,
            chars = text.len(),
            "Generative fallback answered"
        );
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedProvider;

    fn fallback(provider: Arc<ScriptedProvider>) -> GenerativeFallback {
        GenerativeFallback::new(provider, GenerationConfig::default(), Duration::from_secs(5))
    }

    #[test]
    fn test_build_prompt_layout() {
        let prompt = build_prompt("SYS", "tell me about hurricanes");
        assert_eq!(prompt, "SYS\n\nUSER: tell me about hurricanes");
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let provider = Arc::new(ScriptedProvider::replying("  Hurricanes form over warm water.\n"));
        let answer = fallback(provider.clone()).answer("tell me about hurricanes").await.unwrap();
        assert_eq!(answer, "Hurricanes form over warm water.");
        assert_eq!(provider.calls(), 1);
        assert!(provider.last_prompt().unwrap().starts_with(SYSTEM_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_provider_error_is_wrapped() {
        let provider = Arc::new(ScriptedProvider::failing("Google API error (500): boom"));
        let err = fallback(provider).answer("q").await.unwrap_err();
        match err {
            QueryError::GenerativeError(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_output_is_error() {
        let provider = Arc::new(ScriptedProvider::replying("   \n "));
        let err = fallback(provider).answer("q").await.unwrap_err();
        assert_eq!(err, QueryError::GenerativeError("empty response".into()));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = Arc::new(ScriptedProvider::replying("late").with_delay(Duration::from_millis(500)));
        let fallback = GenerativeFallback::new(provider, GenerationConfig::default(), Duration::from_millis(50));
        let err = fallback.answer("q").await.unwrap_err();
        assert!(matches!(err, QueryError::GenerativeError(_)));
    }
}
