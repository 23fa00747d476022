use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_DEPTH_LEVELS: u32 = 10;
pub const DEFAULT_TRADES_LIMIT: u32 = 500;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub symbol: String,
    pub depth_levels: u32,
    pub base_url: String,

    // no timeout unless configured
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            depth_levels: DEFAULT_DEPTH_LEVELS,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn depth_levels(mut self, depth_levels: u32) -> Self {
        self.depth_levels = depth_levels;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Checks the config and returns a copy with the symbol trimmed and uppercased.
    pub fn normalized(&self) -> Result<Self> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(Error::Configuration("symbol must not be empty".to_string()));
        }
        if self.depth_levels == 0 {
            return Err(Error::Configuration(
                "depth_levels must be a positive integer".to_string(),
            ));
        }

        let base_url = self.base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| {
            Error::Configuration(format!("invalid base_url \"{}\": {}", self.base_url, e))
        })?;

        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::Configuration("timeout must be greater than zero".to_string()));
        }

        Ok(Self {
            symbol,
            depth_levels: self.depth_levels,
            base_url,
            timeout: self.timeout,
        })
    }
}

pub fn load_config() -> ClientConfig {
    load_config_from("config.toml")
}

pub fn load_config_from(path: impl AsRef<Path>) -> ClientConfig {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                ClientConfig::default()
            }
        },
        Err(_) => ClientConfig::default(),
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
