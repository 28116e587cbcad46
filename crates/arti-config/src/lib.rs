//! Ambient configuration consumed by the arti resolver.
//!
//! Mirrors the host package manager's `.artirc` JSON file: registry
//! selection, proxy endpoints, TLS strictness and network timeout. The
//! configuration is loaded once and treated as read-only afterwards.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use arti_core::{ArtiError, ArtiResult};

/// Registry the host uses when nothing else is configured
pub const DEFAULT_REGISTRY: &str = "https://registry.arti.dev";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Process-wide host configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Registry selection
    pub registry: RegistryConfig,

    /// Proxy for plain-HTTP requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Proxy for HTTPS requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,

    /// Verify TLS certificates (default true)
    pub strict_ssl: bool,

    /// Network timeout in milliseconds
    pub timeout: u64,
}

/// Registry override plus the ordered search list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Explicit registry, honored when distinct from [`DEFAULT_REGISTRY`]
    pub register: String,

    /// Registries scanned in order when no explicit override applies
    pub search: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            proxy: None,
            https_proxy: None,
            strict_ssl: true,
            timeout: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            register: DEFAULT_REGISTRY.to_string(),
            search: vec![DEFAULT_REGISTRY.to_string()],
        }
    }
}

impl Config {
    /// Network timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Parse a JSON configuration document
    pub fn parse(content: &str) -> ArtiResult<Self> {
        serde_json::from_str(content).map_err(|e| ArtiError::Config {
            message: format!("JSON parsing error: {e}"),
        })
    }

    /// Load and parse a configuration file
    pub async fn load_from_file(path: &Path) -> ArtiResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ArtiError::io(format!("failed to read {}", path.display()), e))?;

        Self::parse(&content).map_err(|e| match e {
            ArtiError::Config { message } => ArtiError::Config {
                message: format!("in file {}: {message}", path.display()),
            },
            other => other,
        })
    }
}
