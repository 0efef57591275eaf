//! Gas price quote types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A four-tier gas price quote, in gwei.
///
/// Producers aim for `slow <= standard <= fast <= instant` but the ordering
/// is not enforced; consumers must tolerate violations from flaky oracles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPriceQuote {
    /// Cheapest tier; may wait several blocks.
    pub slow: Decimal,
    /// Typical next-block price.
    pub standard: Decimal,
    /// Priority inclusion.
    pub fast: Decimal,
    /// Immediate inclusion.
    pub instant: Decimal,
}

impl GasPriceQuote {
    /// A quote with the same price in every tier.
    #[must_use]
    pub const fn uniform(price: Decimal) -> Self {
        Self {
            slow: price,
            standard: price,
            fast: price,
            instant: price,
        }
    }

    /// Derives the four tiers from a single node-reported price using fixed
    /// multipliers (0.85 / 1.0 / 1.2 / 1.5).
    #[must_use]
    pub fn from_node_price(price: Decimal) -> Self {
        Self {
            slow: price * Decimal::new(85, 2),
            standard: price,
            fast: price * Decimal::new(12, 1),
            instant: price * Decimal::new(15, 1),
        }
    }

    /// Price for the requested speed tier.
    #[must_use]
    pub const fn for_speed(&self, speed: GasSpeed) -> Decimal {
        match speed {
            GasSpeed::Slow => self.slow,
            GasSpeed::Standard => self.standard,
            GasSpeed::Fast => self.fast,
            GasSpeed::Instant => self.instant,
        }
    }
}

/// Confirmation speed selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GasSpeed {
    /// Cheapest tier.
    Slow,
    /// Default tier.
    Standard,
    /// Priority tier.
    Fast,
    /// Immediate tier.
    Instant,
}

/// Where a returned quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteSource {
    /// A live provider (block-explorer oracle or node RPC).
    Api,
    /// The static per-chain fallback table.
    Fallback,
    /// A fresh cache entry.
    Cache,
}

/// Result of a gas price lookup.
///
/// The lookup is infallible by construction: the static fallback is the
/// last provider in the chain and has no failure mode, so there is no error
/// arm to represent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasPriceResponse {
    /// The resolved quote.
    pub quote: GasPriceQuote,
    /// Provenance of the quote.
    pub source: QuoteSource,
}
