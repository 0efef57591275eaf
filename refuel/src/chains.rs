//! Supported testnet chain directory.
//!
//! The gas station operates over a fixed set of testnet chains defined at
//! process start. [`ChainRegistry`] is the single source of truth for chain
//! metadata: numeric chain IDs, RPC endpoints, explorers, and native symbols.
//! It is read-only after construction; the only mutation point is applying
//! per-chain RPC overrides from configuration during startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Symbolic identifier for a supported chain.
///
/// Serializes to/from the kebab-case name (e.g. `"base-sepolia"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainKey {
    /// Ethereum Sepolia, the primary hub chain.
    Sepolia,
    /// Base Sepolia (layer-2).
    BaseSepolia,
    /// Arbitrum Sepolia (layer-2).
    ArbitrumSepolia,
    /// Optimism Sepolia (layer-2).
    OptimismSepolia,
    /// Polygon Amoy (POL-native sidechain).
    PolygonAmoy,
    /// Monad Testnet (experimental).
    MonadTestnet,
}

impl ChainKey {
    /// All chain keys, in registry order.
    pub const ALL: [Self; 6] = [
        Self::Sepolia,
        Self::BaseSepolia,
        Self::ArbitrumSepolia,
        Self::OptimismSepolia,
        Self::PolygonAmoy,
        Self::MonadTestnet,
    ];

    /// Returns the kebab-case name of this chain key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sepolia => "sepolia",
            Self::BaseSepolia => "base-sepolia",
            Self::ArbitrumSepolia => "arbitrum-sepolia",
            Self::OptimismSepolia => "optimism-sepolia",
            Self::PolygonAmoy => "polygon-amoy",
            Self::MonadTestnet => "monad-testnet",
        }
    }
}

impl fmt::Display for ChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown chain key name.
#[derive(Debug, thiserror::Error)]
#[error("unknown chain key '{0}'")]
pub struct UnknownChainKey(String);

impl FromStr for ChainKey {
    type Err = UnknownChainKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownChainKey(s.to_owned()))
    }
}

/// Broad classification of a chain, driving operation eligibility rules
/// and user-facing warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainClass {
    /// The hub chain used for staking integrations.
    Primary,
    /// An optimistic or ZK rollup with a distinct gas fee structure.
    Layer2,
    /// A sidechain with its own non-ETH native token.
    Sidechain,
    /// A chain with experimental support; operations may be unstable.
    Experimental,
}

/// Static metadata for one supported chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Symbolic identifier, unique within the registry.
    pub key: ChainKey,
    /// Numeric EVM chain ID, unique within the registry.
    pub chain_id: u64,
    /// Human-readable display name.
    pub display_name: &'static str,
    /// Native gas token symbol.
    pub native_symbol: &'static str,
    /// HTTP RPC endpoint.
    pub rpc_url: String,
    /// Block explorer base URL, without trailing slash.
    pub explorer_base_url: &'static str,
    /// Classification used by the compatibility validator.
    pub class: ChainClass,
    /// Static restriction notes surfaced in compatibility info.
    pub restriction_notes: &'static [&'static str],
}

fn builtin_chains() -> Vec<Chain> {
    vec![
        Chain {
            key: ChainKey::Sepolia,
            chain_id: 11_155_111,
            display_name: "Ethereum Sepolia",
            native_symbol: "ETH",
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_owned(),
            explorer_base_url: "https://sepolia.etherscan.io",
            class: ChainClass::Primary,
            restriction_notes: &[],
        },
        Chain {
            key: ChainKey::BaseSepolia,
            chain_id: 84_532,
            display_name: "Base Sepolia",
            native_symbol: "ETH",
            rpc_url: "https://sepolia.base.org".to_owned(),
            explorer_base_url: "https://sepolia.basescan.org",
            class: ChainClass::Layer2,
            restriction_notes: &["Deposits from L1 may take a few minutes to finalize"],
        },
        Chain {
            key: ChainKey::ArbitrumSepolia,
            chain_id: 421_614,
            display_name: "Arbitrum Sepolia",
            native_symbol: "ETH",
            rpc_url: "https://sepolia-rollup.arbitrum.io/rpc".to_owned(),
            explorer_base_url: "https://sepolia.arbiscan.io",
            class: ChainClass::Layer2,
            restriction_notes: &["Gas estimates include L1 calldata posting costs"],
        },
        Chain {
            key: ChainKey::OptimismSepolia,
            chain_id: 11_155_420,
            display_name: "Optimism Sepolia",
            native_symbol: "ETH",
            rpc_url: "https://sepolia.optimism.io".to_owned(),
            explorer_base_url: "https://sepolia-optimism.etherscan.io",
            class: ChainClass::Layer2,
            restriction_notes: &[],
        },
        Chain {
            key: ChainKey::PolygonAmoy,
            chain_id: 80_002,
            display_name: "Polygon Amoy",
            native_symbol: "POL",
            rpc_url: "https://rpc-amoy.polygon.technology".to_owned(),
            explorer_base_url: "https://amoy.polygonscan.com",
            class: ChainClass::Sidechain,
            restriction_notes: &["Swaps are not supported on Polygon Amoy"],
        },
        Chain {
            key: ChainKey::MonadTestnet,
            chain_id: 10_143,
            display_name: "Monad Testnet",
            native_symbol: "MON",
            rpc_url: "https://testnet-rpc.monad.xyz".to_owned(),
            explorer_base_url: "https://testnet.monadexplorer.com",
            class: ChainClass::Experimental,
            restriction_notes: &["Monad support is experimental"],
        },
    ]
}

/// Read-only directory of supported chains.
///
/// Built once at startup from the static chain set, optionally with RPC
/// endpoint overrides from [`RefuelConfig`](crate::config::RefuelConfig).
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<Chain>,
}

impl ChainRegistry {
    /// Builds the registry over the builtin chain set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: builtin_chains(),
        }
    }

    /// Returns all chains in registry order.
    #[must_use]
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// Looks up a chain by its symbolic key.
    #[must_use]
    pub fn by_key(&self, key: ChainKey) -> Option<&Chain> {
        self.chains.iter().find(|c| c.key == key)
    }

    /// Looks up a chain by its numeric chain ID.
    #[must_use]
    pub fn by_chain_id(&self, chain_id: u64) -> Option<&Chain> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Replaces the RPC endpoint for a chain. Used when applying
    /// configuration overrides at startup; silently ignores unknown keys.
    pub fn override_rpc_url(&mut self, key: ChainKey, rpc_url: impl Into<String>) {
        if let Some(chain) = self.chains.iter_mut().find(|c| c.key == key) {
            chain.rpc_url = rpc_url.into();
        }
    }

    /// Builds a transaction URL on the explorer of the given chain.
    ///
    /// Unknown chain IDs fall back to the primary chain's explorer so a
    /// result link is always presentable.
    #[must_use]
    pub fn explorer_tx_url(&self, chain_id: u64, tx_hash: &str) -> String {
        let base = self
            .by_chain_id(chain_id)
            .or_else(|| self.by_key(ChainKey::Sepolia))
            .map_or("https://sepolia.etherscan.io", |c| c.explorer_base_url);
        format!("{base}/tx/{tx_hash}")
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}
