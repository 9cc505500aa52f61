use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://a.windbornesystems.com/treasure";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Invalid source base url {0}: {1}")]
    InvalidBaseUrl(String, String),

    #[error("Source base url must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("Source timeout cannot be 0")]
    InvalidTimeout,

    #[error("Empty CORS origin")]
    EmptyOrigin,

    #[error("Wildcard CORS origin is not allowed with credentials, list origins explicitly")]
    WildcardOrigin,
}

/// Tracker configuration
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the public HTTP API
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Where the hourly snapshots are fetched from
    #[serde(default)]
    pub source: SourceConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.cors.validate()?;
        self.source.validate()?;
        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 8000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CorsConfig {
    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig {
            allowed_origins: vec!["http://localhost:3000".into()],
        }
    }
}

impl CorsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ValidationError::EmptyOrigin);
        }
        if self.allowed_origins.iter().any(|o| o.trim() == "*") {
            return Err(ValidationError::WildcardOrigin);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Base url of the hourly snapshots. `NN.json` is appended for each hour.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for a single snapshot request, covering connect and body read.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ValidationError::InvalidBaseUrl(self.base_url.clone(), e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}
