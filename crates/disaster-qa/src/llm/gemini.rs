//! Google Gemini provider over the `generateContent` REST API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{GenerationConfig, LLMProvider, ProviderInfo};
use crate::config::GenerativeConfig;

pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: &GenerativeConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()?;

        tracing::info!(
            model = %config.model,
            timeout_secs = config.timeout_secs,
            "Creating GeminiProvider"
        );

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Turn a raw response body into text, rejecting HTML error pages
/// (CDNs/proxies sometimes return 200 with HTML) and empty candidates.
fn parse_generate_response(status: StatusCode, body: &str, endpoint: &str) -> Result<String> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        let preview: String = trimmed.chars().take(200).collect();
        return Err(anyhow!(
            "Endpoint {} returned HTML instead of JSON (HTTP {}). Response: {}",
            endpoint,
            status,
            preview
        ));
    }

    let parsed: GoogleResponse = serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(300).collect();
        anyhow!(
            "Failed to parse JSON from {} (HTTP {}): {}. Response body: {}",
            endpoint,
            status,
            e,
            preview
        )
    })?;

    let text: String = parsed
        .candidates
        .first()
        .map(|c| c.content.parts.iter().map(|p| p.text.as_str()).collect::<String>())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(anyhow!("No response from Google Gemini"));
    }
    Ok(text)
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let request = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": config.temperature,
                "topP": config.top_p,
                "topK": config.top_k,
                "maxOutputTokens": config.max_tokens,
            }
        });

        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;

        if !status.is_success() {
            return Err(anyhow!("Google API error ({}): {}", status, body));
        }

        parse_generate_response(status, &body, &endpoint)
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Google".to_string(),
            model: self.model.clone(),
        }
    }
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: GoogleContent,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    #[serde(default)]
    text: String,
}
