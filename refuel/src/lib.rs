//! Core library for the cross-chain gas station.
//!
//! A "gas station" lets a user top up native gas balances on one testnet
//! chain from another. This crate holds everything that must be decided
//! before touching a bridge provider:
//!
//! - [`chains`] — the static directory of supported chains
//! - [`compat`] — chain-pair, token, operation, and balance validation
//! - [`batch`] — delimited-text recipient import for batch refuels
//! - [`net`] — retry/backoff/timeout wrappers for provider calls
//! - [`history`] — local append-only operation history
//! - [`config`] — TOML configuration with environment expansion
//!
//! Gas pricing lives in `refuel-gas`; bridge orchestration in
//! `refuel-bridge`.

pub mod batch;
pub mod chains;
pub mod compat;
pub mod config;
pub mod history;
pub mod net;

pub use batch::{BatchMode, ParsedBatch, Recipient, parse_batch, sanitize_address};
pub use chains::{Chain, ChainClass, ChainKey, ChainRegistry};
pub use compat::{CompatError, CompatibilityInfo, OperationKind};
pub use config::RefuelConfig;
