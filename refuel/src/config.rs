//! Gas station configuration.
//!
//! Loads configuration from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}`
//! syntax.
//!
//! # Example Configuration
//!
//! ```toml
//! [chains.sepolia]
//! rpc_url = "https://rpc.example.com/sepolia"
//! explorer_api_key = "$ETHERSCAN_KEY"
//!
//! [gas]
//! cache_ttl_secs = 300
//!
//! [bridge]
//! init_timeout_secs = 15
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to configuration file (default: `refuel.toml`)
//! - API keys and endpoints referenced by `$VAR` in the config file

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chains::{ChainKey, ChainRegistry};

/// Top-level gas station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefuelConfig {
    /// Per-chain overrides keyed by chain key name (e.g. `"base-sepolia"`).
    #[serde(default)]
    pub chains: HashMap<ChainKey, ChainOverride>,

    /// Gas price service settings.
    #[serde(default)]
    pub gas: GasConfig,

    /// Bridge orchestration settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Network utility settings.
    #[serde(default)]
    pub net: NetConfig,
}

/// Per-chain configuration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainOverride {
    /// Replacement HTTP RPC endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// Block-explorer gas oracle API key. Supports `$VAR` expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_api_key: Option<String>,
}

/// Gas price service settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GasConfig {
    /// Cache freshness window in seconds (default: 300).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Bridge orchestration settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Provider initialization timeout in seconds (default: 15).
    #[serde(default = "default_init_timeout_secs")]
    pub init_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            init_timeout_secs: default_init_timeout_secs(),
        }
    }
}

/// Network utility settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetConfig {
    /// Per-request timeout for provider calls in seconds (default: 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

const fn default_init_timeout_secs() -> u64 {
    15
}

const fn default_request_timeout_secs() -> u64 {
    10
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid TOML for [`RefuelConfig`].
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl RefuelConfig {
    /// Loads configuration from the path given by the `CONFIG` environment
    /// variable, falling back to `refuel.toml` in the current directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG").unwrap_or_else(|_| "refuel.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path, expanding `$VAR` /
    /// `${VAR}` references from the process environment first.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };
        Self::from_toml(&content)
    }

    /// Parses configuration from a raw TOML string with env expansion.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let expanded = expand_vars(content, |name| std::env::var(name).ok());
        let config: Self = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Builds the chain registry with this config's RPC overrides applied.
    #[must_use]
    pub fn build_registry(&self) -> ChainRegistry {
        let mut registry = ChainRegistry::new();
        for (key, overrides) in &self.chains {
            if let Some(rpc_url) = &overrides.rpc_url {
                tracing::info!(chain = %key, rpc_url = %rpc_url, "applying RPC override");
                registry.override_rpc_url(*key, rpc_url.clone());
            }
        }
        registry
    }

    /// The explorer API key configured for a chain, if any.
    #[must_use]
    pub fn explorer_api_key(&self, key: ChainKey) -> Option<&str> {
        self.chains
            .get(&key)
            .and_then(|c| c.explorer_api_key.as_deref())
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string via `lookup`
/// (the process environment in production). Unresolved variables are left
/// as-is so the TOML parse error points at the literal reference.
fn expand_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let rest = &mut input.chars().peekable();

    while let Some(ch) = rest.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = rest.peek() == Some(&'{');
        if braced {
            rest.next();
        }

        let mut name = String::new();
        while let Some(&c) = rest.peek() {
            let take = if braced {
                if c == '}' {
                    rest.next();
                    break;
                }
                true
            } else {
                c.is_ascii_alphanumeric() || c == '_'
            };
            if !take {
                break;
            }
            name.push(c);
            rest.next();
        }

        match lookup(&name).filter(|_| !name.is_empty()) {
            Some(value) => result.push_str(&value),
            None => {
                // Reconstruct the reference exactly as written.
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if braced && !name.is_empty() {
                    result.push('}');
                }
            }
        }
    }

    result
}
