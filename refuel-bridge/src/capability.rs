//! The injected bridge provider boundary.
//!
//! The orchestrator treats the third-party bridging SDK as an opaque
//! capability: initialize, transfer, simulate, balances, deinit. Its wire
//! protocol is out of scope; tests and demos inject hand-rolled fakes.

use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque handle to the connected wallet provider.
///
/// Carries the one piece of information the orchestrator needs: the
/// connected wallet's own address, used as the default recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderHandle {
    /// Address of the connected wallet.
    pub wallet_address: Address,
}

/// Arguments for a provider transfer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    /// Token symbol to move.
    pub token: String,
    /// Amount in native-token units.
    pub amount: Decimal,
    /// Destination chain ID.
    pub to_chain_id: u64,
    /// Recipient on the destination chain.
    pub recipient: Address,
    /// Chains funds may be sourced from.
    pub source_chains: Vec<u64>,
}

/// Successful provider transfer outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTransfer {
    /// Transaction hash reported by the provider.
    pub tx_hash: String,
}

/// Dry-run transfer estimate from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSimulation {
    /// Estimated provider fee in native-token units.
    pub estimated_fee: Decimal,
    /// Estimated completion time in seconds.
    pub estimated_secs: u64,
}

/// One token balance aggregated across source chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedBalance {
    /// Token symbol.
    pub token: String,
    /// Total balance in native-token units, as a decimal string.
    pub amount: String,
    /// Chain IDs contributing to the total.
    pub chain_ids: Vec<u64>,
}

/// A provider-reported failure. The orchestrator classifies its message
/// with [`is_recoverable_provider_error`](crate::recoverable::is_recoverable_provider_error).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CapabilityError(pub String);

impl CapabilityError {
    /// Creates an error from a provider message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The bridging SDK surface consumed by the orchestrator.
///
/// All methods take `&mut self`: the capability owns a live provider
/// session and the orchestrator owns the capability.
pub trait BridgeCapability {
    /// Opens the provider session against the connected wallet.
    fn initialize(
        &mut self,
        handle: &ProviderHandle,
    ) -> impl Future<Output = Result<(), CapabilityError>>;

    /// Executes a cross-chain transfer.
    fn transfer(
        &mut self,
        args: TransferArgs,
    ) -> impl Future<Output = Result<ProviderTransfer, CapabilityError>>;

    /// Dry-runs a transfer without executing it.
    fn simulate_transfer(
        &mut self,
        args: TransferArgs,
    ) -> impl Future<Output = Result<TransferSimulation, CapabilityError>>;

    /// Fetches balances aggregated across all source chains.
    fn unified_balances(
        &mut self,
    ) -> impl Future<Output = Result<Vec<UnifiedBalance>, CapabilityError>>;

    /// Releases the provider session.
    fn deinit(&mut self) -> impl Future<Output = Result<(), CapabilityError>>;
}
