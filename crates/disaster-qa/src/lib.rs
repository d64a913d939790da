pub mod config;
pub mod dataset;
pub mod dispatcher;
pub mod error;
pub mod etl;
pub mod fallback;
pub mod intent;
pub mod llm;
pub mod weather;

// Re-export primary types for convenience
pub use config::AppConfig;
pub use dataset::{Dataset, DisasterRecord};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use error::{DatasetError, QueryError};
pub use intent::{Intent, IntentMatcher, Route};
pub use llm::{GeminiProvider, GenerationConfig, LLMProvider, ProviderInfo};

#[cfg(test)]
pub(crate) mod test_support {
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::llm::{GenerationConfig, LLMProvider, ProviderInfo};

    /// Serve `app` on an ephemeral local port and return its base URL.
    pub async fn spawn_stub(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Provider double that records prompts and replays a fixed result.
    pub struct ScriptedProvider {
        reply: Result<String, String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn replying(text: &str) -> Self {
            Self::with_result(Ok(text.to_string()))
        }

        pub fn failing(message: &str) -> Self {
            Self::with_result(Err(message.to_string()))
        }

        fn with_result(reply: Result<String, String>) -> Self {
            Self {
                reply,
                delay: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().last().cloned()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str, _config: &GenerationConfig) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().push(prompt.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply.clone().map_err(|e| anyhow!(e))
        }

        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                name: "Scripted".to_string(),
                model: "scripted".to_string(),
            }
        }
    }
}
