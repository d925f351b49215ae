//! Endpoint configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional JSON
//! file, `TREEQA_*` environment variables, then whatever the caller sets
//! explicitly (CLI flags).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use treeqa_sparql::DEFAULT_FILTER_BATCH_SIZE;
use url::Url;

pub const DEFAULT_ENDPOINT_URL: &str = "https://dbpedia.org/sparql";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENDPOINT_ENV: &str = "TREEQA_SPARQL_ENDPOINT";
pub const TIMEOUT_ENV: &str = "TREEQA_SPARQL_TIMEOUT_SECS";
pub const BATCH_SIZE_ENV: &str = "TREEQA_FILTER_BATCH_SIZE";
pub const DEFAULT_GRAPH_ENV: &str = "TREEQA_DEFAULT_GRAPH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    /// SPARQL protocol endpoint.
    pub url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Maximum values per `FILTER(?proj IN (...))` batch.
    pub batch_size: usize,
    pub default_graph_uri: Option<String>,
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENDPOINT_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            batch_size: DEFAULT_FILTER_BATCH_SIZE,
            default_graph_uri: None,
            user_agent: concat!("treeqa/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl EndpointConfig {
    /// Defaults overlaid with `TREEQA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = lookup(ENDPOINT_ENV) {
            self.url = url;
        }
        if let Some(value) = lookup(TIMEOUT_ENV) {
            self.timeout_secs = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: TIMEOUT_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(BATCH_SIZE_ENV) {
            self.batch_size = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: BATCH_SIZE_ENV,
                value: value.clone(),
            })?;
        }
        if let Some(graph) = lookup(DEFAULT_GRAPH_ENV) {
            self.default_graph_uri = Some(graph);
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::Invalid(format!("endpoint url {:?}: {e}", self.url)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "endpoint url {:?}: unsupported scheme `{other}`",
                self.url
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint_url()?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be > 0".to_string()));
        }
        if let Some(graph) = &self.default_graph_uri {
            Url::parse(graph)
                .map_err(|e| ConfigError::Invalid(format!("default graph {graph:?}: {e}")))?;
        }
        Ok(())
    }
}
