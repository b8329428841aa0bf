//! Configuration for the debt check workflow

use serde::{Deserialize, Serialize};

/// Workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Search controller configuration
    pub search: SearchConfig,

    /// Payment configuration
    pub payment: PaymentConfig,

    /// Simulated collaborators
    pub mock: MockConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "debt-check".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            search: SearchConfig::default(),
            payment: PaymentConfig::default(),
            mock: MockConfig::default(),
        }
    }
}

/// How responses to superseded lookups are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleResponsePolicy {
    /// Drop responses older than the newest dispatched lookup
    Discard,
    /// Display whichever response resolves last
    LastWriteWins,
}

/// Search controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke (milliseconds)
    pub debounce_ms: u64,

    /// Shortest trimmed query that may trigger a debounced lookup
    pub min_query_len: usize,

    /// Overlapping lookup policy
    pub stale_responses: StaleResponsePolicy,

    /// Controller mailbox capacity
    pub mailbox_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            min_query_len: 3,
            stale_responses: StaleResponsePolicy::Discard,
            mailbox_capacity: 64,
        }
    }
}

/// Registered payment channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel identifier submitted by the form
    pub id: String,

    /// Display name
    pub name: String,

    /// Display icon
    pub icon: String,
}

impl ChannelConfig {
    fn new(id: &str, name: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Payment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    /// Simulated gateway processing time (milliseconds)
    pub processing_delay_ms: u64,

    /// Share of simulated payments that complete (0.0 - 1.0)
    pub success_ratio: f64,

    /// Minimum contact phone length
    pub min_phone_len: usize,

    /// Registered channels
    pub channels: Vec<ChannelConfig>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: 3000,
            success_ratio: 0.7,
            min_phone_len: 9,
            channels: vec![
                ChannelConfig::new("payme", "Payme", "💳"),
                ChannelConfig::new("click", "Click", "📱"),
                ChannelConfig::new("uzumbank", "Uzum Bank", "🏦"),
                ChannelConfig::new("sqb", "SQB", "💰"),
            ],
        }
    }
}

/// Simulated registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Simulated registry latency (milliseconds)
    pub lookup_latency_ms: u64,

    /// Tax id that always yields "no data"
    pub not_found_sentinel: String,

    /// Queries that fail with a service error
    pub failing_queries: Vec<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            lookup_latency_ms: 1500,
            not_found_sentinel: "000000000".to_string(),
            failing_queries: Vec::new(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Some(ms) = env_parse("DEBT_CHECK_DEBOUNCE_MS")? {
            config.search.debounce_ms = ms;
        }

        if let Some(ms) = env_parse("DEBT_CHECK_PROCESSING_DELAY_MS")? {
            config.payment.processing_delay_ms = ms;
        }

        if let Some(ratio) = env_parse("DEBT_CHECK_SUCCESS_RATIO")? {
            config.payment.success_ratio = ratio;
        }

        if let Some(ms) = env_parse("DEBT_CHECK_LOOKUP_LATENCY_MS")? {
            config.mock.lookup_latency_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the workflow cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.payment.success_ratio) {
            return Err(crate::Error::Config(format!(
                "success_ratio must be within [0, 1], got {}",
                self.payment.success_ratio
            )));
        }

        if self.search.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be positive".to_string(),
            ));
        }

        if self.payment.channels.is_empty() {
            return Err(crate::Error::Config(
                "at least one payment channel is required".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> crate::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| crate::Error::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}
