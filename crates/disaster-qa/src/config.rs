use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub weather: WeatherConfig,
    pub generative: GenerativeConfig,
    pub server: ServerConfig,
}

/// The request timeout is fixed in [`crate::weather`] and cannot be configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    /// Base URL of the `generateContent` API, without the `/models/...` suffix.
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
        }
    }
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key: String::new(),
            timeout_secs: 60,
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data").join("DisastersCleaned.csv"),
            weather: WeatherConfig::default(),
            generative: GenerativeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.weather.base_url.trim().is_empty() {
            return Err("weather.base_url must not be empty".into());
        }
        if self.generative.api_key.trim().is_empty() {
            return Err("generative.api_key is required (set GEMINI_API_KEY)".into());
        }
        if self.generative.model.trim().is_empty() {
            return Err("generative.model must not be empty".into());
        }
        if self.generative.timeout_secs == 0 {
            return Err("generative.timeout_secs must be > 0".into());
        }
        if !(0.0..=2.0).contains(&self.generative.temperature) {
            return Err("generative.temperature must be in [0.0, 2.0]".into());
        }
        if self.generative.max_tokens == 0 {
            return Err("generative.max_tokens must be > 0".into());
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    /// Environment overrides are applied on top before validation.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides. `DISASTER_QA_CONFIG` points at an
    /// optional JSON file that is read first.
    pub fn from_env() -> Result<Self, String> {
        if let Ok(path) = std::env::var("DISASTER_QA_CONFIG") {
            return Self::from_file(Path::new(&path));
        }
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), String> {
        if let Some(path) = lookup("DATA_FILE") {
            self.data_file = PathBuf::from(path);
        }
        if let Some(url) = lookup("WEATHER_URL") {
            self.weather.base_url = url;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.generative.api_key = key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.generative.model = model;
        }
        if let Some(url) = lookup("GEMINI_URL") {
            self.generative.base_url = url;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| format!("Invalid PORT '{}': {}", port, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_requires_api_key() {
        let config = AppConfig::default();
        assert_eq!(config.weather.base_url, DEFAULT_WEATHER_URL);
        assert_eq!(config.server.port, 5000);
        assert!(config.validate().unwrap_err().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("GEMINI_API_KEY", "k"),
                ("PORT", "8080"),
                ("DATA_FILE", "/tmp/d.csv"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.data_file, PathBuf::from("/tmp/d.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut config = AppConfig::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(err.contains("Invalid PORT"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"generative": {"timeout_secs": 3}}"#).unwrap();
        assert_eq!(config.generative.timeout_secs, 3);
        assert_eq!(config.weather.base_url, DEFAULT_WEATHER_URL);
        assert_eq!(config.generative.model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let mut config = AppConfig::default();
        config.generative.api_key = "k".into();
        config.generative.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weather_timeout_is_not_configurable() {
        let parsed = serde_json::from_str::<AppConfig>(r#"{"weather": {"timeout_secs": 600}}"#);
        let err = parsed.unwrap_err().to_string();
        assert!(err.contains("timeout_secs"));
    }
}
