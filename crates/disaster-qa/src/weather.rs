//! Current-weather lookup against an Open-Meteo compatible forecast API.
//!
//! Every call is a single fresh GET. There is no retry and no cache; a failed
//! request is reported to the caller as [`QueryError::UpstreamError`].

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::WeatherConfig;
use crate::error::QueryError;

const CURRENT_FIELDS: &str = "temperature_2m,wind_speed_10m,precipitation";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Instantaneous readings taken from the `current` object of the response.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: f64,
    pub wind_speed_10m: f64,
    pub precipitation: f64,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

pub struct WeatherClient {
    base_url: String,
    client: Client,
}

impl WeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    /// Fetch current readings. Coordinates are forwarded as given; range
    /// checking is left to the provider.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentWeather, QueryError> {
        let started = std::time::Instant::now();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", format_number(lat)),
                ("longitude", format_number(lon)),
                ("current", CURRENT_FIELDS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| QueryError::UpstreamError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            tracing::warn!(%status, lat, lon, "Weather provider returned an error");
            return Err(QueryError::UpstreamError(format!("HTTP {}: {}", status, preview)));
        }

        let parsed: ForecastResponse = response
            .json()
            .await
            .map_err(|e| QueryError::UpstreamError(format!("unexpected response body: {}", e)))?;

        tracing::debug!(
            lat,
            lon,
            latency_ms = started.elapsed().as_millis() as u64,
            "Weather lookup complete"
        );
        Ok(parsed.current)
    }

    pub async fn current_weather(&self, lat: f64, lon: f64) -> Result<String, QueryError> {
        let current = self.current(lat, lon).await?;
        Ok(describe(lat, lon, &current))
    }
}

pub fn describe(lat: f64, lon: f64, current: &CurrentWeather) -> String {
    format!(
        "The current temperature at {}, {}: {} Celsius, wind speeds of {} m/s, and precipitation of {} mm/h.",
        format_number(lat),
        format_number(lon),
        format_number(current.temperature_2m),
        format_number(current.wind_speed_10m),
        format_number(current.precipitation),
    )
}

/// Integral values keep one decimal place (`-74.0`, `0.0`).
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
