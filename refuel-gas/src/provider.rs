//! Multi-provider gas price resolution.
//!
//! Providers are a tagged-variant list evaluated in fixed priority order:
//! the chain's block-explorer gas oracle, then a generic `eth_gasPrice`
//! node RPC call, then a static per-chain fallback table. Each attempt is
//! independent; failures are logged and swallowed, and the static tail
//! guarantees the overall lookup never fails.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use refuel::chains::{ChainKey, ChainRegistry};
use refuel::net::{Retryable, RetryPolicy, retry_with_backoff};

use crate::cache::{CacheStats, DEFAULT_TTL, GasPriceCache};
use crate::quote::{GasPriceQuote, GasPriceResponse, QuoteSource};

/// A single gas price provider. Each variant is a pure
/// `chain_id -> Result<Quote, ProviderError>` step; the service composes
/// them in priority order.
#[derive(Debug, Clone)]
pub enum GasProvider {
    /// Etherscan-style `gastracker` oracle.
    ExplorerOracle {
        /// API base URL (e.g. `https://api-sepolia.etherscan.io/api`).
        endpoint: String,
        /// Optional API key appended to the query.
        api_key: Option<String>,
    },
    /// JSON-RPC `eth_gasPrice` against the chain's node endpoint.
    NodeRpc {
        /// Node RPC URL.
        endpoint: String,
    },
    /// Static per-chain table. Never fails.
    Static,
}

/// A failed provider attempt. Swallowed by the service, surfaced only in
/// logs.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level HTTP failure.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success HTTP status.
    #[error("provider returned status {0}")]
    Status(u16),
    /// Response did not match the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            // Client-class statuses will not improve on retry.
            Self::Status(code) => !matches!(code, 400 | 401 | 403 | 404),
            Self::Malformed(_) => false,
        }
    }
}

/// Static fallback prices (gwei) per chain. Chains absent from the table
/// use the primary chain's values.
fn static_quote(chain_id: u64) -> GasPriceQuote {
    let (slow, standard, fast, instant) = match chain_id {
        // Base Sepolia / Optimism Sepolia: sub-gwei L2 pricing.
        84_532 | 11_155_420 => (
            Decimal::new(5, 3),
            Decimal::new(1, 2),
            Decimal::new(5, 2),
            Decimal::new(1, 1),
        ),
        // Arbitrum Sepolia.
        421_614 => (
            Decimal::new(1, 1),
            Decimal::new(1, 0),
            Decimal::new(2, 0),
            Decimal::new(3, 0),
        ),
        // Polygon Amoy.
        80_002 => (
            Decimal::new(30, 0),
            Decimal::new(35, 0),
            Decimal::new(50, 0),
            Decimal::new(80, 0),
        ),
        // Monad Testnet.
        10_143 => (
            Decimal::new(50, 0),
            Decimal::new(52, 0),
            Decimal::new(60, 0),
            Decimal::new(70, 0),
        ),
        // Ethereum Sepolia, also the default for unknown chains.
        _ => (
            Decimal::new(15, 1),
            Decimal::new(3, 0),
            Decimal::new(8, 0),
            Decimal::new(15, 0),
        ),
    };
    GasPriceQuote {
        slow,
        standard,
        fast,
        instant,
    }
}

/// Builtin explorer gas oracle endpoints. Chains without an oracle skip
/// straight to the node RPC provider.
fn oracle_endpoint(key: ChainKey) -> Option<&'static str> {
    match key {
        ChainKey::Sepolia => Some("https://api-sepolia.etherscan.io/api"),
        ChainKey::BaseSepolia => Some("https://api-sepolia.basescan.org/api"),
        ChainKey::ArbitrumSepolia => Some("https://api-sepolia.arbiscan.io/api"),
        ChainKey::OptimismSepolia => Some("https://api-sepolia-optimistic.etherscan.io/api"),
        ChainKey::PolygonAmoy => Some("https://api-amoy.polygonscan.com/api"),
        ChainKey::MonadTestnet => None,
    }
}

#[derive(Debug, Deserialize)]
struct OracleEnvelope {
    status: String,
    result: Option<OracleResult>,
}

#[derive(Debug, Deserialize)]
struct OracleResult {
    #[serde(rename = "SafeGasPrice")]
    safe: String,
    #[serde(rename = "ProposeGasPrice")]
    propose: String,
    #[serde(rename = "FastGasPrice")]
    fast: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<String>,
}

/// Gas price resolution service with caching and provider fallback.
#[derive(Debug)]
pub struct GasPriceService {
    client: reqwest::Client,
    registry: ChainRegistry,
    cache: GasPriceCache,
    retry: RetryPolicy,
    api_keys: HashMap<u64, String>,
    provider_overrides: HashMap<u64, Vec<GasProvider>>,
}

impl GasPriceService {
    /// Creates a service over the given registry with default cache TTL and
    /// a 10-second per-request timeout.
    #[must_use]
    pub fn new(registry: ChainRegistry) -> Self {
        Self::with_ttl(registry, DEFAULT_TTL)
    }

    /// Creates a service with a custom cache TTL.
    #[must_use]
    pub fn with_ttl(registry: ChainRegistry, ttl: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            registry,
            cache: GasPriceCache::new(ttl),
            retry: RetryPolicy::default(),
            api_keys: HashMap::new(),
            provider_overrides: HashMap::new(),
        }
    }

    /// Sets the explorer API key for a chain.
    #[must_use]
    pub fn with_api_key(mut self, chain_id: u64, key: impl Into<String>) -> Self {
        self.api_keys.insert(chain_id, key.into());
        self
    }

    /// Replaces the provider chain for one chain ID. The static fallback is
    /// always appended after the given providers.
    #[must_use]
    pub fn with_providers(mut self, chain_id: u64, providers: Vec<GasProvider>) -> Self {
        self.provider_overrides.insert(chain_id, providers);
        self
    }

    /// Sets the retry policy for provider HTTP calls.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fallible providers for a chain, in priority order. The static tail
    /// is appended by [`gas_price`](Self::gas_price).
    fn provider_chain(&self, chain_id: u64) -> Vec<GasProvider> {
        if let Some(overridden) = self.provider_overrides.get(&chain_id) {
            return overridden.clone();
        }
        let mut providers = Vec::new();
        if let Some(chain) = self.registry.by_chain_id(chain_id) {
            if let Some(endpoint) = oracle_endpoint(chain.key) {
                providers.push(GasProvider::ExplorerOracle {
                    endpoint: endpoint.to_owned(),
                    api_key: self.api_keys.get(&chain_id).cloned(),
                });
            }
            providers.push(GasProvider::NodeRpc {
                endpoint: chain.rpc_url.clone(),
            });
        }
        providers
    }

    /// Resolves the gas price for a chain.
    ///
    /// Checks the cache first; otherwise walks the provider chain and falls
    /// back to the static table. Never fails; the result is tagged with its
    /// source.
    pub async fn gas_price(&self, chain_id: u64) -> GasPriceResponse {
        if let Some(quote) = self.cache.fresh(chain_id) {
            return GasPriceResponse {
                quote,
                source: QuoteSource::Cache,
            };
        }

        for provider in self.provider_chain(chain_id) {
            match self.try_provider(&provider, chain_id).await {
                Ok(quote) => {
                    self.cache.store(chain_id, quote.clone());
                    return GasPriceResponse {
                        quote,
                        source: QuoteSource::Api,
                    };
                }
                Err(e) => {
                    tracing::warn!(chain_id, provider = ?provider_label(&provider), error = %e, "gas provider failed, trying next");
                }
            }
        }

        let quote = static_quote(chain_id);
        tracing::debug!(chain_id, "using static gas price fallback");
        self.cache.store(chain_id, quote.clone());
        GasPriceResponse {
            quote,
            source: QuoteSource::Fallback,
        }
    }

    async fn try_provider(
        &self,
        provider: &GasProvider,
        chain_id: u64,
    ) -> Result<GasPriceQuote, ProviderError> {
        match provider {
            GasProvider::ExplorerOracle { endpoint, api_key } => {
                retry_with_backoff(self.retry, || {
                    self.fetch_oracle(endpoint, api_key.as_deref())
                })
                .await
                .map_err(refuel::net::RetryError::into_inner)
            }
            GasProvider::NodeRpc { endpoint } => {
                retry_with_backoff(self.retry, || self.fetch_node_price(endpoint))
                    .await
                    .map_err(refuel::net::RetryError::into_inner)
            }
            GasProvider::Static => Ok(static_quote(chain_id)),
        }
    }

    async fn fetch_oracle(
        &self,
        endpoint: &str,
        api_key: Option<&str>,
    ) -> Result<GasPriceQuote, ProviderError> {
        let mut query: Vec<(&str, &str)> =
            vec![("module", "gastracker"), ("action", "gasoracle")];
        if let Some(key) = api_key {
            query.push(("apikey", key));
        }

        let response = self.client.get(endpoint).query(&query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let envelope: OracleEnvelope = response.json().await?;
        if envelope.status != "1" {
            return Err(ProviderError::Malformed(format!(
                "oracle status {}",
                envelope.status
            )));
        }
        let result = envelope
            .result
            .ok_or_else(|| ProviderError::Malformed("missing result".to_owned()))?;

        let parse = |field: &str, value: &str| {
            Decimal::from_str(value)
                .map_err(|_| ProviderError::Malformed(format!("{field}: '{value}'")))
        };
        let slow = parse("SafeGasPrice", &result.safe)?;
        let standard = parse("ProposeGasPrice", &result.propose)?;
        let fast = parse("FastGasPrice", &result.fast)?;
        Ok(GasPriceQuote {
            slow,
            standard,
            fast,
            // The oracle has no instant tier; derive it from fast.
            instant: fast * Decimal::new(125, 2),
        })
    }

    async fn fetch_node_price(&self, endpoint: &str) -> Result<GasPriceQuote, ProviderError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_gasPrice",
            "params": [],
            "id": 1,
        });
        let response = self.client.post(endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let envelope: RpcEnvelope = response.json().await?;
        let hex = envelope
            .result
            .ok_or_else(|| ProviderError::Malformed("missing result".to_owned()))?;
        let wei = u128::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|_| ProviderError::Malformed(format!("eth_gasPrice: '{hex}'")))?;
        let gwei = wei_to_gwei(wei)?;
        Ok(GasPriceQuote::from_node_price(gwei))
    }

    /// Drops all cached quotes.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Cache size and key snapshot.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The registry this service resolves chains against.
    #[must_use]
    pub const fn registry(&self) -> &ChainRegistry {
        &self.registry
    }
}

fn wei_to_gwei(wei: u128) -> Result<Decimal, ProviderError> {
    let signed = i128::try_from(wei)
        .map_err(|_| ProviderError::Malformed(format!("gas price out of range: {wei}")))?;
    Decimal::try_from_i128_with_scale(signed, 9)
        .map_err(|_| ProviderError::Malformed(format!("gas price out of range: {wei}")))
}

fn provider_label(provider: &GasProvider) -> &'static str {
    match provider {
        GasProvider::ExplorerOracle { .. } => "explorer-oracle",
        GasProvider::NodeRpc { .. } => "node-rpc",
        GasProvider::Static => "static",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(chain_id: u64, providers: Vec<GasProvider>) -> GasPriceService {
        GasPriceService::new(ChainRegistry::new())
            .with_providers(chain_id, providers)
            .with_retry(RetryPolicy::no_retry())
    }

    fn oracle_body(safe: &str, propose: &str, fast: &str) -> serde_json::Value {
        serde_json::json!({
            "status": "1",
            "message": "OK",
            "result": {
                "SafeGasPrice": safe,
                "ProposeGasPrice": propose,
                "FastGasPrice": fast,
                "suggestBaseFee": "1.0",
            }
        })
    }

    #[tokio::test]
    async fn test_oracle_happy_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("module", "gastracker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(oracle_body("1", "2", "4")))
            .mount(&server)
            .await;

        let service = service_for(
            1,
            vec![GasProvider::ExplorerOracle {
                endpoint: server.uri(),
                api_key: None,
            }],
        );
        let response = service.gas_price(1).await;
        assert_eq!(response.source, QuoteSource::Api);
        assert_eq!(response.quote.slow, Decimal::new(1, 0));
        assert_eq!(response.quote.standard, Decimal::new(2, 0));
        assert_eq!(response.quote.fast, Decimal::new(4, 0));
        assert_eq!(response.quote.instant, Decimal::new(5, 0));
    }

    #[tokio::test]
    async fn test_oracle_failure_falls_back_to_rpc() {
        let oracle = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&oracle)
            .await;

        let node = MockServer::start().await;
        // 3 gwei in hex wei.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": "0xb2d05e00",
            })))
            .mount(&node)
            .await;

        let service = service_for(
            1,
            vec![
                GasProvider::ExplorerOracle {
                    endpoint: oracle.uri(),
                    api_key: None,
                },
                GasProvider::NodeRpc {
                    endpoint: node.uri(),
                },
            ],
        );
        let response = service.gas_price(1).await;
        assert_eq!(response.source, QuoteSource::Api);
        assert_eq!(response.quote.standard, Decimal::new(3, 0));
    }

    #[tokio::test]
    async fn test_all_providers_down_uses_static() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let service = service_for(
            84_532,
            vec![
                GasProvider::ExplorerOracle {
                    endpoint: server.uri(),
                    api_key: None,
                },
                GasProvider::NodeRpc {
                    endpoint: server.uri(),
                },
            ],
        );
        let response = service.gas_price(84_532).await;
        assert_eq!(response.source, QuoteSource::Fallback);
        assert_eq!(response.quote, static_quote(84_532));
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(oracle_body("1", "2", "4")))
            .expect(1)
            .mount(&server)
            .await;

        let service = service_for(
            1,
            vec![GasProvider::ExplorerOracle {
                endpoint: server.uri(),
                api_key: None,
            }],
        );
        let first = service.gas_price(1).await;
        let second = service.gas_price(1).await;
        assert_eq!(first.source, QuoteSource::Api);
        assert_eq!(second.source, QuoteSource::Cache);
        assert_eq!(first.quote, second.quote);
    }

    #[tokio::test]
    async fn test_clear_cache_requeries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(oracle_body("1", "2", "4")))
            .expect(2)
            .mount(&server)
            .await;

        let service = service_for(
            1,
            vec![GasProvider::ExplorerOracle {
                endpoint: server.uri(),
                api_key: None,
            }],
        );
        let first = service.gas_price(1).await;
        service.clear_cache();
        let second = service.gas_price(1).await;
        assert_eq!(first.source, QuoteSource::Api);
        assert_eq!(second.source, QuoteSource::Api);
    }

    #[tokio::test]
    async fn test_unknown_chain_static_defaults_to_primary() {
        let service = GasPriceService::new(ChainRegistry::new());
        let response = service.gas_price(999_999).await;
        assert_eq!(response.source, QuoteSource::Fallback);
        assert_eq!(response.quote, static_quote(11_155_111));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderError::Status(500).is_retryable());
        assert!(ProviderError::Status(429).is_retryable());
        for code in [400, 401, 403, 404] {
            assert!(!ProviderError::Status(code).is_retryable());
        }
        assert!(!ProviderError::Malformed("x".into()).is_retryable());
    }

    #[test]
    fn test_static_quote_tiers_ordered() {
        for chain_id in [11_155_111, 84_532, 421_614, 80_002, 10_143, 0] {
            let q = static_quote(chain_id);
            assert!(q.slow <= q.standard && q.standard <= q.fast && q.fast <= q.instant);
        }
    }
}
