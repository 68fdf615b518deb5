//! Configuration types for stockflux
//!
//! Non-secret settings live in a TOML file; credentials come from the
//! environment (optionally via `.env`). Environment values always win over
//! the file so deployments can override without editing it.

use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub news: NewsConfig,
    pub ingest: IngestConfig,
    pub chart: ChartConfig,
    pub telemetry: TelemetryConfig,
}

/// Time-series store connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub url: String,
    /// API token; environment-only (`INFLUXDB_TOKEN`), never in the file
    #[serde(skip)]
    pub token: String,
    pub org: String,
    pub bucket: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8086".to_string(),
            token: String::new(),
            org: String::new(),
            bucket: "stocks".to_string(),
        }
    }
}

/// News provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// API key; environment-only (`FINNHUB_API_KEY`). Absent key disables
    /// news ingestion, it is not an error.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Minimum delay between provider calls
    pub min_call_interval_ms: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            min_call_interval_ms: 1100,
        }
    }
}

/// Default ingestion batch settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub symbols: Vec<String>,
    pub lookback_days: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["AAPL".to_string(), "MSFT".to_string(), "GOOG".to_string()],
            lookback_days: 60,
        }
    }
}

/// Chart output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("stock_visualization.svg"),
            width: 1280,
            height: 720,
            title: "Stock Data Visualization".to_string(),
        }
    }
}

impl ChartConfig {
    /// Appearance settings for the renderer.
    pub fn appearance(&self) -> crate::chart::ChartConfig {
        crate::chart::ChartConfig {
            width: self.width,
            height: self.height,
            title: self.title.clone(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment
    /// overrides. A missing file is not an error; defaults are used.
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut config: Config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides through a lookup function (injectable
    /// for tests).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("INFLUXDB_URL") {
            self.store.url = url;
        }
        if let Some(token) = lookup("INFLUXDB_TOKEN") {
            self.store.token = token;
        }
        if let Some(org) = lookup("INFLUXDB_ORG") {
            self.store.org = org;
        }
        if let Some(bucket) = lookup("INFLUXDB_BUCKET") {
            self.store.bucket = bucket;
        }
        if let Some(key) = lookup("FINNHUB_API_KEY") {
            if !key.is_empty() {
                self.news.api_key = Some(key);
            }
        }
    }

    /// Check that everything a run needs is present.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut missing = Vec::new();
        if self.store.url.is_empty() {
            missing.push("store.url / INFLUXDB_URL");
        }
        if self.store.token.is_empty() {
            missing.push("INFLUXDB_TOKEN");
        }
        if self.store.org.is_empty() {
            missing.push("store.org / INFLUXDB_ORG");
        }
        if self.store.bucket.is_empty() {
            missing.push("store.bucket / INFLUXDB_BUCKET");
        }
        if !missing.is_empty() {
            anyhow::bail!("missing required configuration: {}", missing.join(", "));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [store]
            url = "http://influx.internal:8086"
            org = "research"
            bucket = "stocks"

            [news]
            min_call_interval_ms = 1500

            [ingest]
            symbols = ["AAPL", "MSFT"]
            lookback_days = 30

            [chart]
            output_path = "out/chart.svg"
            title = "Prices"

            [telemetry]
            log_level = "debug"
            log_format = "json"
            metrics_port = 9090
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.store.url, "http://influx.internal:8086");
        assert_eq!(config.news.min_call_interval_ms, 1500);
        assert_eq!(config.ingest.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(config.chart.title, "Prices");
        assert_eq!(config.telemetry.metrics_port, Some(9090));
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.store.bucket, "stocks");
        assert_eq!(config.news.min_call_interval_ms, 1100);
        assert_eq!(config.ingest.lookback_days, 60);
        assert!(config.news.api_key.is_none());
        assert!(config.telemetry.metrics_port.is_none());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut env = HashMap::new();
        env.insert("INFLUXDB_URL", "http://other:8086");
        env.insert("INFLUXDB_TOKEN", "secret");
        env.insert("INFLUXDB_ORG", "ops");
        env.insert("INFLUXDB_BUCKET", "prod");
        env.insert("FINNHUB_API_KEY", "news-key");

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.store.url, "http://other:8086");
        assert_eq!(config.store.token, "secret");
        assert_eq!(config.store.org, "ops");
        assert_eq!(config.store.bucket, "prod");
        assert_eq!(config.news.api_key.as_deref(), Some("news-key"));
    }

    #[test]
    fn test_empty_news_key_stays_disabled() {
        let mut config = Config::default();
        config.apply_env(|key| (key == "FINNHUB_API_KEY").then(String::new));
        assert!(config.news.api_key.is_none());
    }

    #[test]
    fn test_validate_reports_missing_token() {
        let mut config = Config::default();
        config.store.org = "research".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("INFLUXDB_TOKEN"));
    }

    #[test]
    fn test_validate_passes_when_complete() {
        let mut config = Config::default();
        config.store.token = "t".to_string();
        config.store.org = "o".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("/nonexistent/config.toml").unwrap();
        assert_eq!(config.store.bucket, "stocks");
    }
}
