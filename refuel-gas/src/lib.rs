//! Gas price resolution for the cross-chain gas station.
//!
//! Resolves four-tier gas price quotes per chain with a fixed provider
//! priority order (block-explorer oracle, node RPC, static fallback), a
//! TTL cache, and cost estimators for single and batch operations.
//!
//! The public lookup never fails: the static fallback table is the last
//! provider in the chain and has no failure mode.

pub mod cache;
pub mod estimate;
pub mod provider;
pub mod quote;

pub use cache::{CacheStats, GasPriceCache};
pub use estimate::{estimate_batch_cost, estimate_operation_cost};
pub use provider::{GasPriceService, GasProvider, ProviderError};
pub use quote::{GasPriceQuote, GasPriceResponse, GasSpeed, QuoteSource};
