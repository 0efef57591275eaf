//! Chain-pair and operation compatibility rules.
//!
//! Centralizes every rule about what is financially and technically valid
//! before a request ever reaches the bridge provider: chain-pair
//! compatibility, per-chain token support, per-operation eligibility, and
//! minimum-balance checks.
//!
//! The compatibility relation is **directed** and intentionally asymmetric:
//! the hub chain lists every satellite as a destination, while satellites
//! list the hub plus at most a couple of peers. Callers must not infer
//! symmetry.

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::chains::{Chain, ChainClass, ChainKey, ChainRegistry};

/// Operations a user can request through the gas station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Move native gas value to one recipient on the destination chain.
    Transfer,
    /// Swap into the destination chain's native token.
    Swap,
    /// Stake on the destination after bridging.
    Stake,
    /// Plain bridge without a follow-up action.
    Bridge,
}

impl OperationKind {
    /// Returns the operation name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Swap => "swap",
            Self::Stake => "stake",
            Self::Bridge => "bridge",
        }
    }

    /// Static cost estimate for this operation in native-token units.
    ///
    /// These are coarse, chain-independent figures used for display before a
    /// live gas quote is available.
    #[must_use]
    pub fn static_cost_estimate(self) -> GasCostEstimate {
        let (low, medium, high) = match self {
            Self::Transfer => (Decimal::new(2, 4), Decimal::new(5, 4), Decimal::new(1, 3)),
            Self::Swap => (Decimal::new(1, 3), Decimal::new(2, 3), Decimal::new(4, 3)),
            Self::Stake => (Decimal::new(8, 4), Decimal::new(15, 4), Decimal::new(3, 3)),
            Self::Bridge => (Decimal::new(5, 4), Decimal::new(1, 3), Decimal::new(2, 3)),
        };
        GasCostEstimate { low, medium, high }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Low/medium/high cost estimate triple, in native-token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCostEstimate {
    /// Optimistic estimate.
    pub low: Decimal,
    /// Typical estimate.
    pub medium: Decimal,
    /// Congested-network estimate.
    pub high: Decimal,
}

/// Validation failures produced by this module.
///
/// These are returned as values, never panicked, so one failed check cannot
/// take down a batch of otherwise-valid work.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CompatError {
    /// Source and destination are the same chain.
    #[error("source and destination are the same chain ({chain})")]
    SameChain {
        /// The offending chain.
        chain: ChainKey,
    },
    /// The destination is not in the source chain's compatibility set.
    #[error("{from} is not compatible with {to}")]
    IncompatiblePair {
        /// Source chain.
        from: ChainKey,
        /// Destination chain.
        to: ChainKey,
    },
    /// The token is not supported on the given chain.
    #[error("token {token} is not supported on {chain}")]
    UnsupportedToken {
        /// The requested token symbol, as given.
        token: String,
        /// The chain it was checked against.
        chain: ChainKey,
    },
    /// The operation kind is not allowed for this chain pair.
    #[error("{kind} not supported: {reason}")]
    OperationNotSupported {
        /// The rejected operation.
        kind: OperationKind,
        /// Human-readable reason.
        reason: String,
    },
    /// The balance is below the per-chain minimum for the operation.
    #[error("insufficient balance: minimum {minimum} {symbol} required for {kind}")]
    InsufficientBalance {
        /// Required minimum, in native-token units.
        minimum: Decimal,
        /// Native token symbol for user messaging.
        symbol: &'static str,
        /// The operation that was checked.
        kind: OperationKind,
    },
}

/// Directed compatibility set: destinations reachable from `from`.
///
/// The hub (Sepolia) reaches every satellite. Satellites reach the hub plus
/// a couple of peers. `OptimismSepolia` deliberately does not list
/// `BaseSepolia` even though the reverse edge exists.
fn compatible_destinations(from: ChainKey) -> &'static [ChainKey] {
    match from {
        ChainKey::Sepolia => &[
            ChainKey::BaseSepolia,
            ChainKey::ArbitrumSepolia,
            ChainKey::OptimismSepolia,
            ChainKey::PolygonAmoy,
            ChainKey::MonadTestnet,
        ],
        ChainKey::BaseSepolia => &[
            ChainKey::Sepolia,
            ChainKey::ArbitrumSepolia,
            ChainKey::OptimismSepolia,
        ],
        ChainKey::ArbitrumSepolia => &[ChainKey::Sepolia, ChainKey::BaseSepolia],
        ChainKey::OptimismSepolia => &[ChainKey::Sepolia],
        ChainKey::PolygonAmoy => &[ChainKey::Sepolia],
        ChainKey::MonadTestnet => &[ChainKey::Sepolia],
    }
}

/// Token symbols supported on each chain. Comparison is case-insensitive.
fn supported_tokens(chain: ChainKey) -> &'static [&'static str] {
    match chain {
        ChainKey::Sepolia => &["ETH", "WETH", "USDC", "LINK"],
        ChainKey::BaseSepolia | ChainKey::ArbitrumSepolia => &["ETH", "WETH", "USDC"],
        ChainKey::OptimismSepolia => &["ETH", "USDC"],
        ChainKey::PolygonAmoy => &["POL", "WETH", "USDC"],
        ChainKey::MonadTestnet => &["MON", "USDC"],
    }
}

/// Per-chain, per-operation minimum balance in native-token units.
/// Combinations absent from this table use [`DEFAULT_MINIMUM_BALANCE`].
fn minimum_balance(chain: ChainKey, kind: OperationKind) -> Decimal {
    match (chain, kind) {
        (ChainKey::Sepolia, OperationKind::Stake) => Decimal::new(1, 2), // 0.01
        (ChainKey::Sepolia, OperationKind::Swap) => Decimal::new(5, 3),  // 0.005
        (ChainKey::ArbitrumSepolia, OperationKind::Bridge) => Decimal::new(2, 3), // 0.002
        (ChainKey::PolygonAmoy, OperationKind::Bridge) => Decimal::new(1, 2), // 0.01
        _ => DEFAULT_MINIMUM_BALANCE,
    }
}

/// Fallback minimum balance (0.001 native units) for table misses.
pub const DEFAULT_MINIMUM_BALANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// Validates that a cross-chain operation from `from` to `to` is legal at
/// the chain-pair level.
pub fn validate_chain_pair(from: ChainKey, to: ChainKey) -> Result<(), CompatError> {
    if from == to {
        return Err(CompatError::SameChain { chain: from });
    }
    if !compatible_destinations(from).contains(&to) {
        return Err(CompatError::IncompatiblePair { from, to });
    }
    Ok(())
}

/// Validates that `token` is supported on `chain`. Case-insensitive.
pub fn validate_token_support(chain: ChainKey, token: &str) -> Result<(), CompatError> {
    let supported = supported_tokens(chain)
        .iter()
        .any(|t| t.eq_ignore_ascii_case(token));
    if supported {
        Ok(())
    } else {
        Err(CompatError::UnsupportedToken {
            token: token.to_owned(),
            chain,
        })
    }
}

/// Validates a full operation request: chain pair first, then kind-specific
/// rules.
pub fn validate_operation(
    registry: &ChainRegistry,
    from: ChainKey,
    to: ChainKey,
    kind: OperationKind,
) -> Result<(), CompatError> {
    validate_chain_pair(from, to)?;

    let class_of = |key: ChainKey| registry.by_key(key).map(|c| c.class);
    match kind {
        OperationKind::Swap => {
            if class_of(from) == Some(ChainClass::Sidechain)
                || class_of(to) == Some(ChainClass::Sidechain)
            {
                return Err(CompatError::OperationNotSupported {
                    kind,
                    reason: "swapping is unavailable on sidechain networks".to_owned(),
                });
            }
        }
        OperationKind::Stake => {
            if from != ChainKey::Sepolia {
                return Err(CompatError::OperationNotSupported {
                    kind,
                    reason: format!("staking must originate from {}", ChainKey::Sepolia),
                });
            }
        }
        OperationKind::Bridge | OperationKind::Transfer => {}
    }
    Ok(())
}

/// Validates that a smallest-unit balance meets the per-chain minimum for
/// the given operation.
///
/// The balance snapshot is caller-supplied; freshness is the caller's
/// concern.
pub fn validate_minimum_balance(
    registry: &ChainRegistry,
    chain: ChainKey,
    balance_wei: U256,
    kind: OperationKind,
) -> Result<(), CompatError> {
    let minimum = minimum_balance(chain, kind);
    let symbol = registry.by_key(chain).map_or("ETH", |c| c.native_symbol);
    if wei_to_native(balance_wei) < minimum {
        return Err(CompatError::InsufficientBalance {
            minimum,
            symbol,
            kind,
        });
    }
    Ok(())
}

/// Converts a smallest-unit (18-decimal) balance to native-token units.
///
/// Balances beyond `Decimal` range are saturated to [`Decimal::MAX`]; any
/// such balance trivially clears every minimum in the table.
#[must_use]
pub fn wei_to_native(wei: U256) -> Decimal {
    match u128::try_from(wei) {
        Ok(v) => match i128::try_from(v) {
            Ok(signed) => {
                Decimal::try_from_i128_with_scale(signed, 18).unwrap_or(Decimal::MAX)
            }
            Err(_) => Decimal::MAX,
        },
        Err(_) => Decimal::MAX,
    }
}

/// Result of a compatibility inquiry for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityInfo {
    /// Whether the pair passes [`validate_chain_pair`].
    pub is_compatible: bool,
    /// Hard restrictions. For an incompatible pair this holds exactly the
    /// rejection reason; otherwise the chains' static restriction notes
    /// (from-chain notes first).
    pub restrictions: Vec<String>,
    /// Advisory warnings, in fixed order: experimental chain, layer-2 gas
    /// structure, non-ETH native token.
    pub warnings: Vec<String>,
}

/// Gathers restrictions and warnings for a chain pair.
#[must_use]
pub fn compatibility_info(
    registry: &ChainRegistry,
    from: ChainKey,
    to: ChainKey,
) -> CompatibilityInfo {
    if let Err(e) = validate_chain_pair(from, to) {
        return CompatibilityInfo {
            is_compatible: false,
            restrictions: vec![e.to_string()],
            warnings: Vec::new(),
        };
    }

    let mut restrictions = Vec::new();
    for key in [from, to] {
        if let Some(chain) = registry.by_key(key) {
            restrictions.extend(chain.restriction_notes.iter().map(|n| (*n).to_owned()));
        }
    }

    let mut warnings = Vec::new();
    let from_chain = registry.by_key(from);
    let to_chain = registry.by_key(to);
    let is_experimental = |c: Option<&Chain>| c.is_some_and(|c| c.class == ChainClass::Experimental);
    if is_experimental(from_chain) || is_experimental(to_chain) {
        warnings.push("This route involves a chain with experimental support".to_owned());
    }
    if to_chain.is_some_and(|c| c.class == ChainClass::Layer2) {
        warnings.push("Destination is a layer-2 with a different gas fee structure".to_owned());
    }
    if to_chain.is_some_and(|c| c.native_symbol != "ETH") {
        if let Some(chain) = to_chain {
            warnings.push(format!(
                "Destination gas is paid in {}, not ETH",
                chain.native_symbol
            ));
        }
    }

    CompatibilityInfo {
        is_compatible: true,
        restrictions,
        warnings,
    }
}

/// Destination chains recommended for an operation, excluding `exclude`.
///
/// Staking always recommends exactly the primary chain. Swaps exclude
/// sidechains and experimental chains.
#[must_use]
pub fn recommended_chains(
    registry: &ChainRegistry,
    kind: OperationKind,
    exclude: ChainKey,
) -> Vec<ChainKey> {
    match kind {
        OperationKind::Stake => vec![ChainKey::Sepolia],
        OperationKind::Swap => registry
            .chains()
            .iter()
            .filter(|c| {
                c.key != exclude
                    && c.class != ChainClass::Sidechain
                    && c.class != ChainClass::Experimental
            })
            .map(|c| c.key)
            .collect(),
        OperationKind::Transfer | OperationKind::Bridge => registry
            .chains()
            .iter()
            .filter(|c| c.key != exclude)
            .map(|c| c.key)
            .collect(),
    }
}
