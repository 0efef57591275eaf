//! Bridge orchestration for the cross-chain gas station.
//!
//! Wraps an injected bridging provider ([`BridgeCapability`]) in a
//! caller-owned [`BridgeSession`] with an explicit lifecycle, bounded
//! initialization, and a demo-safe policy that converts recoverable
//! provider outages into explicitly-tagged mock results.

pub mod capability;
pub mod recoverable;
pub mod session;

pub use capability::{
    BridgeCapability, CapabilityError, ProviderHandle, ProviderTransfer, TransferArgs,
    TransferSimulation, UnifiedBalance,
};
pub use recoverable::is_recoverable_provider_error;
pub use session::{
    BridgeError, BridgeRequest, BridgeResult, BridgeSession, ExecuteAction, ExecuteOutcome,
    Provenance, SessionState,
};
