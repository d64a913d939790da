//! Query dispatcher: structured intents first, generative model last.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::error::QueryError;
use crate::fallback::GenerativeFallback;
use crate::intent::{default_matchers, match_intent, Intent, IntentMatcher, Route};
use crate::llm::{GeminiProvider, GenerationConfig, LLMProvider};
use crate::weather::WeatherClient;

/// An answer together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchOutcome {
    pub route: Route,
    pub answer: String,
}

/// Everything a query needs, built once at startup and shared by reference.
/// Holds no mutable state, so one instance serves any number of concurrent
/// requests.
pub struct Dispatcher {
    dataset: Arc<Dataset>,
    weather: WeatherClient,
    fallback: GenerativeFallback,
    matchers: Vec<IntentMatcher>,
}

impl Dispatcher {
    pub fn new(dataset: Arc<Dataset>, weather: WeatherClient, fallback: GenerativeFallback) -> Self {
        Self {
            dataset,
            weather,
            fallback,
            matchers: default_matchers(),
        }
    }

    /// Wire the production adapters from configuration.
    pub fn from_config(config: &AppConfig, dataset: Arc<Dataset>) -> Result<Self> {
        let provider: Arc<dyn LLMProvider> = Arc::new(GeminiProvider::new(&config.generative)?);
        let fallback = GenerativeFallback::new(
            provider,
            GenerationConfig::from(&config.generative),
            Duration::from_secs(config.generative.timeout_secs),
        );
        let weather = WeatherClient::new(&config.weather)?;
        Ok(Self::new(dataset, weather, fallback))
    }

    /// Replace the intent table. Order is priority.
    pub fn with_matchers(mut self, matchers: Vec<IntentMatcher>) -> Self {
        self.matchers = matchers;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub async fn answer(&self, query: &str) -> Result<String, QueryError> {
        self.dispatch(query).await.map(|outcome| outcome.answer)
    }

    pub async fn dispatch(&self, query: &str) -> Result<DispatchOutcome, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::MalformedQuery("query is empty".to_string()));
        }

        let outcome = match match_intent(query, &self.matchers) {
            Some(intent) => {
                let intent = intent?;
                let route = intent.route();
                self.execute(&intent)
                    .await
                    .map(|answer| DispatchOutcome { route, answer })
            }
            None => self.fallback.answer(query).await.map(|answer| DispatchOutcome {
                route: Route::Generative,
                answer,
            }),
        };

        match &outcome {
            Ok(o) => tracing::info!(route = ?o.route, "Query answered"),
            Err(e) => tracing::warn!(kind = e.kind(), error = %e, "Query failed"),
        }
        outcome
    }

    async fn execute(&self, intent: &Intent) -> Result<String, QueryError> {
        match intent {
            Intent::Deadliest { year } => self.dataset.deadliest_in_year(*year),
            Intent::CountEvents {
                kind,
                country,
                start,
                end,
            } => Ok(self.dataset.count_events(kind, country, *start, *end)),
            Intent::Weather { lat, lon } => self.weather.current_weather(*lat, *lon).await,
        }
    }
}
