//! Bridge session lifecycle and operation orchestration.
//!
//! [`BridgeSession`] wraps the injected [`BridgeCapability`] with an
//! explicit, caller-owned lifecycle: `Uninitialized -> {Ready, Degraded}
//! -> Uninitialized`. The host application owns exactly one session and
//! passes it explicitly to call sites; there is no hidden global state.
//!
//! A degraded session initialized but could not reach the live backend.
//! It remains usable: bridge calls that fail with the recoverable network
//! signature are absorbed into explicitly-tagged mock results so the flow
//! completes during provider outages.
//!
//! Concurrent `bridge()` calls against one session are neither deduplicated
//! nor serialized here; a host needing at-most-one-in-flight semantics must
//! enforce it externally (e.g. by disabling the trigger control).

use std::time::Duration;

use alloy_primitives::Address;
use rust_decimal::Decimal;

use refuel::chains::ChainRegistry;
use refuel::history::UnixTimestamp;
use refuel::net::with_timeout;

use crate::capability::{
    BridgeCapability, CapabilityError, ProviderHandle, TransferArgs, TransferSimulation,
    UnifiedBalance,
};
use crate::recoverable::is_recoverable_provider_error;

/// Default bound on capability initialization.
pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(15);

/// Simulated delay for the post-bridge execute step.
const EXECUTE_SIMULATION_DELAY: Duration = Duration::from_millis(800);

/// Lifecycle state of a bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No provider session is open.
    Uninitialized,
    /// Live backend reachable; operations run for real.
    Ready,
    /// Initialized but the backend is unreachable; operations may complete
    /// as mocks.
    Degraded,
}

/// Whether a result came from the live provider or was synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The provider executed the operation.
    Live,
    /// The operation was mocked after a recoverable provider failure.
    Mock,
}

/// A bridge operation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    /// Token symbol to move.
    pub token: String,
    /// Amount in native-token units.
    pub amount: Decimal,
    /// Source chain ID.
    pub from_chain_id: u64,
    /// Destination chain ID.
    pub to_chain_id: u64,
    /// Recipient; defaults to the connected wallet's address.
    pub recipient: Option<Address>,
    /// Source chains to draw from; defaults to `[from_chain_id]`.
    pub source_chain_ids: Option<Vec<u64>>,
}

/// Post-bridge action simulated on the destination chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteAction {
    /// Stake the bridged amount.
    Stake,
    /// Swap into another asset.
    Swap,
    /// Supply to a lending market.
    Lend,
    /// Mint a position.
    Mint,
}

impl ExecuteAction {
    /// Action identifier used in results.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stake => "stake",
            Self::Swap => "swap",
            Self::Lend => "lend",
            Self::Mint => "mint",
        }
    }

    const fn simulated_gas_used(self) -> u64 {
        match self {
            Self::Stake => 95_000,
            Self::Swap => 150_000,
            Self::Lend => 180_000,
            Self::Mint => 120_000,
        }
    }
}

/// Outcome of the simulated post-bridge execute step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteOutcome {
    /// Action identifier (e.g. `"stake"`).
    pub action: &'static str,
    /// Simulated gas used by the destination action.
    pub gas_used: u64,
    /// When the simulation completed.
    pub timestamp: UnixTimestamp,
}

/// Result of a bridge (or bridge-and-execute) operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResult {
    /// Whether the operation completed (live or mocked).
    pub success: bool,
    /// Transaction hash, real or synthesized.
    pub tx_hash: Option<String>,
    /// Explorer link for the source-chain transaction.
    pub explorer_url: Option<String>,
    /// Additional user-facing context.
    pub message: Option<String>,
    /// Whether the provider executed this or it was mocked.
    pub provenance: Provenance,
    /// Post-bridge execute outcome, when requested.
    pub execute: Option<ExecuteOutcome>,
}

/// Orchestration failures surfaced to the caller.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BridgeError {
    /// An operation was attempted before `initialize`.
    #[error("bridge session is not initialized")]
    NotInitialized,
    /// Provider initialization failed with a non-recoverable error.
    #[error("bridge initialization failed: {0}")]
    InitializationFailed(String),
    /// Provider initialization exceeded its timeout.
    #[error("bridge initialization timed out after {0:?}")]
    InitializationTimeout(Duration),
    /// A bridge operation failed with a non-recoverable provider error.
    #[error("bridge operation failed: {0}")]
    OperationFailed(String),
}

/// Caller-owned bridge session over an injected capability.
#[derive(Debug)]
pub struct BridgeSession<C> {
    capability: C,
    registry: ChainRegistry,
    state: SessionState,
    wallet: Option<Address>,
    init_timeout: Duration,
}

impl<C: BridgeCapability> BridgeSession<C> {
    /// Creates an uninitialized session.
    #[must_use]
    pub fn new(capability: C, registry: ChainRegistry) -> Self {
        Self {
            capability,
            registry,
            state: SessionState::Uninitialized,
            wallet: None,
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }

    /// Overrides the initialization timeout.
    #[must_use]
    pub const fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Opens the provider session.
    ///
    /// Idempotent: calling while already initialized succeeds immediately
    /// without re-running the provider handshake. A recoverable provider
    /// failure degrades the session instead of propagating, keeping the
    /// flow usable while the backend is unreachable; any other failure is
    /// fatal and leaves the session uninitialized.
    pub async fn initialize(&mut self, handle: ProviderHandle) -> Result<(), BridgeError> {
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }

        let outcome = with_timeout(self.init_timeout, self.capability.initialize(&handle)).await;
        match outcome {
            Err(elapsed) => Err(BridgeError::InitializationTimeout(elapsed.0)),
            Ok(Ok(())) => {
                self.wallet = Some(handle.wallet_address);
                self.state = SessionState::Ready;
                tracing::info!(wallet = %handle.wallet_address, "bridge session ready");
                Ok(())
            }
            Ok(Err(CapabilityError(message))) => {
                if is_recoverable_provider_error(&message) {
                    self.wallet = Some(handle.wallet_address);
                    self.state = SessionState::Degraded;
                    tracing::warn!(error = %message, "bridge backend unreachable, session degraded");
                    Ok(())
                } else {
                    Err(BridgeError::InitializationFailed(message))
                }
            }
        }
    }

    /// Executes a bridge operation.
    ///
    /// A provider failure matching the recoverable signature is absorbed
    /// into a mock success tagged [`Provenance::Mock`]; any other failure
    /// propagates with the provider's message intact.
    pub async fn bridge(&mut self, request: BridgeRequest) -> Result<BridgeResult, BridgeError> {
        let args = self.transfer_args(&request)?;
        let from_chain_id = request.from_chain_id;

        match self.capability.transfer(args).await {
            Ok(transfer) => {
                let explorer_url = self.registry.explorer_tx_url(from_chain_id, &transfer.tx_hash);
                Ok(BridgeResult {
                    success: true,
                    tx_hash: Some(transfer.tx_hash),
                    explorer_url: Some(explorer_url),
                    message: None,
                    provenance: Provenance::Live,
                    execute: None,
                })
            }
            Err(CapabilityError(message)) if is_recoverable_provider_error(&message) => {
                tracing::warn!(error = %message, "bridge provider unreachable, returning mock result");
                Ok(self.mock_result(from_chain_id))
            }
            Err(CapabilityError(message)) => Err(BridgeError::OperationFailed(message)),
        }
    }

    /// Bridges and then runs a simulated destination-chain action.
    ///
    /// The bridge leg follows the same mock-substitution policy as
    /// [`bridge`](Self::bridge); the execute step is a fixed-delay
    /// simulation, not a real contract call.
    pub async fn bridge_and_execute(
        &mut self,
        request: BridgeRequest,
        action: ExecuteAction,
    ) -> Result<BridgeResult, BridgeError> {
        let mut result = self.bridge(request).await?;

        tokio::time::sleep(EXECUTE_SIMULATION_DELAY).await;
        let outcome = ExecuteOutcome {
            action: action.as_str(),
            gas_used: action.simulated_gas_used(),
            timestamp: UnixTimestamp::now(),
        };
        tracing::debug!(action = outcome.action, gas_used = outcome.gas_used, "simulated destination action");
        result.message = Some(match &result.message {
            Some(existing) => format!("{existing}; simulated {} on destination", outcome.action),
            None => format!("simulated {} on destination", outcome.action),
        });
        result.execute = Some(outcome);
        Ok(result)
    }

    /// Dry-runs a bridge operation via the provider.
    pub async fn simulate(
        &mut self,
        request: BridgeRequest,
    ) -> Result<TransferSimulation, BridgeError> {
        let args = self.transfer_args(&request)?;
        self.capability
            .simulate_transfer(args)
            .await
            .map_err(|CapabilityError(message)| BridgeError::OperationFailed(message))
    }

    /// Fetches unified balances.
    ///
    /// Requires a live session. A degraded session, or a recoverable
    /// network failure mid-call, yields an empty list rather than an error.
    pub async fn balances(&mut self) -> Result<Vec<UnifiedBalance>, BridgeError> {
        match self.state {
            SessionState::Uninitialized => Err(BridgeError::NotInitialized),
            SessionState::Degraded => Ok(Vec::new()),
            SessionState::Ready => match self.capability.unified_balances().await {
                Ok(balances) => Ok(balances),
                Err(CapabilityError(message)) if is_recoverable_provider_error(&message) => {
                    tracing::warn!(error = %message, "balance fetch failed, returning empty list");
                    Ok(Vec::new())
                }
                Err(CapabilityError(message)) => Err(BridgeError::OperationFailed(message)),
            },
        }
    }

    /// Releases the provider session. No-op when not initialized.
    pub async fn deinit(&mut self) -> Result<(), BridgeError> {
        if self.state == SessionState::Uninitialized {
            return Ok(());
        }
        if let Err(CapabilityError(message)) = self.capability.deinit().await {
            // Teardown failures are logged, not surfaced; the session is
            // considered released either way.
            tracing::warn!(error = %message, "bridge deinit reported an error");
        }
        self.state = SessionState::Uninitialized;
        self.wallet = None;
        Ok(())
    }

    fn transfer_args(&self, request: &BridgeRequest) -> Result<TransferArgs, BridgeError> {
        if self.state == SessionState::Uninitialized {
            return Err(BridgeError::NotInitialized);
        }
        let recipient = request
            .recipient
            .or(self.wallet)
            .ok_or(BridgeError::NotInitialized)?;
        Ok(TransferArgs {
            token: request.token.clone(),
            amount: request.amount,
            to_chain_id: request.to_chain_id,
            recipient,
            source_chains: request
                .source_chain_ids
                .clone()
                .unwrap_or_else(|| vec![request.from_chain_id]),
        })
    }

    fn mock_result(&self, from_chain_id: u64) -> BridgeResult {
        let hash_bytes: [u8; 32] = rand::random();
        let tx_hash = format!("0x{}", alloy_primitives::hex::encode(hash_bytes));
        let explorer_url = self.registry.explorer_tx_url(from_chain_id, &tx_hash);
        BridgeResult {
            success: true,
            tx_hash: Some(tx_hash),
            explorer_url: Some(explorer_url),
            message: Some(
                "Mock transaction: bridge backend unreachable, no funds moved".to_owned(),
            ),
            provenance: Provenance::Mock,
            execute: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ProviderTransfer;
    use std::str::FromStr;

    const WALLET: &str = "0xab5801a7d398351b8be11c439e05c5b3259aec9b";

    fn handle() -> ProviderHandle {
        ProviderHandle {
            wallet_address: Address::from_str(WALLET).unwrap(),
        }
    }

    fn request() -> BridgeRequest {
        BridgeRequest {
            token: "ETH".to_owned(),
            amount: Decimal::new(5, 2),
            from_chain_id: 11_155_111,
            to_chain_id: 84_532,
            recipient: None,
            source_chain_ids: None,
        }
    }

    /// Scripted fake provider: each call consumes the next scripted
    /// outcome, or succeeds once the script runs dry.
    #[derive(Debug, Default)]
    struct FakeCapability {
        init_error: Option<String>,
        transfer_error: Option<String>,
        balance_error: Option<String>,
        init_calls: u32,
        transfer_calls: u32,
        last_args: Option<TransferArgs>,
    }

    impl BridgeCapability for FakeCapability {
        async fn initialize(&mut self, _handle: &ProviderHandle) -> Result<(), CapabilityError> {
            self.init_calls += 1;
            match &self.init_error {
                Some(msg) => Err(CapabilityError::new(msg.clone())),
                None => Ok(()),
            }
        }

        async fn transfer(
            &mut self,
            args: TransferArgs,
        ) -> Result<ProviderTransfer, CapabilityError> {
            self.transfer_calls += 1;
            self.last_args = Some(args);
            match &self.transfer_error {
                Some(msg) => Err(CapabilityError::new(msg.clone())),
                None => Ok(ProviderTransfer {
                    tx_hash: "0xfeed".to_owned(),
                }),
            }
        }

        async fn simulate_transfer(
            &mut self,
            _args: TransferArgs,
        ) -> Result<TransferSimulation, CapabilityError> {
            Ok(TransferSimulation {
                estimated_fee: Decimal::new(1, 3),
                estimated_secs: 30,
            })
        }

        async fn unified_balances(&mut self) -> Result<Vec<UnifiedBalance>, CapabilityError> {
            match &self.balance_error {
                Some(msg) => Err(CapabilityError::new(msg.clone())),
                None => Ok(vec![UnifiedBalance {
                    token: "ETH".to_owned(),
                    amount: "1.5".to_owned(),
                    chain_ids: vec![11_155_111],
                }]),
            }
        }

        async fn deinit(&mut self) -> Result<(), CapabilityError> {
            Ok(())
        }
    }

    fn session(capability: FakeCapability) -> BridgeSession<FakeCapability> {
        BridgeSession::new(capability, ChainRegistry::new())
    }

    #[tokio::test]
    async fn test_bridge_before_initialize_fails() {
        let mut s = session(FakeCapability::default());
        let err = s.bridge(request()).await.unwrap_err();
        assert_eq!(err, BridgeError::NotInitialized);
    }

    #[tokio::test]
    async fn test_initialize_idempotent() {
        let mut s = session(FakeCapability::default());
        s.initialize(handle()).await.unwrap();
        s.initialize(handle()).await.unwrap();
        assert_eq!(s.state(), SessionState::Ready);
        assert_eq!(s.capability.init_calls, 1);
    }

    #[tokio::test]
    async fn test_recoverable_init_error_degrades() {
        let mut s = session(FakeCapability {
            init_error: Some("failed to set up fee grant".to_owned()),
            ..FakeCapability::default()
        });
        s.initialize(handle()).await.unwrap();
        assert_eq!(s.state(), SessionState::Degraded);
    }

    #[tokio::test]
    async fn test_fatal_init_error_stays_uninitialized() {
        let mut s = session(FakeCapability {
            init_error: Some("invalid signer".to_owned()),
            ..FakeCapability::default()
        });
        let err = s.initialize(handle()).await.unwrap_err();
        assert!(matches!(err, BridgeError::InitializationFailed(_)));
        assert_eq!(s.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_bridge_success_augments_explorer_url() {
        let mut s = session(FakeCapability::default());
        s.initialize(handle()).await.unwrap();
        let result = s.bridge(request()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.provenance, Provenance::Live);
        assert_eq!(
            result.explorer_url.as_deref(),
            Some("https://sepolia.etherscan.io/tx/0xfeed")
        );
        // Recipient defaulted to the wallet; source chains defaulted to
        // the from-chain.
        let args = s.capability.last_args.as_ref().unwrap();
        assert_eq!(args.recipient, Address::from_str(WALLET).unwrap());
        assert_eq!(args.source_chains, vec![11_155_111]);
    }

    #[tokio::test]
    async fn test_recoverable_bridge_error_yields_mock() {
        let mut s = session(FakeCapability {
            transfer_error: Some("network error: fetch failed".to_owned()),
            ..FakeCapability::default()
        });
        s.initialize(handle()).await.unwrap();
        let result = s.bridge(request()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.provenance, Provenance::Mock);
        let hash = result.tx_hash.unwrap();
        assert_eq!(hash.len(), 66);
        assert!(hash.starts_with("0x"));
        assert!(result.message.unwrap().contains("Mock"));
    }

    #[tokio::test]
    async fn test_fatal_bridge_error_propagates_message() {
        let mut s = session(FakeCapability {
            transfer_error: Some("user rejected the request".to_owned()),
            ..FakeCapability::default()
        });
        s.initialize(handle()).await.unwrap();
        let err = s.bridge(request()).await.unwrap_err();
        assert_eq!(
            err,
            BridgeError::OperationFailed("user rejected the request".to_owned())
        );
    }

    #[tokio::test]
    async fn test_explicit_recipient_and_sources_respected() {
        let mut s = session(FakeCapability::default());
        s.initialize(handle()).await.unwrap();
        let other = Address::from_str("0x2222222222222222222222222222222222222222").unwrap();
        let mut req = request();
        req.recipient = Some(other);
        req.source_chain_ids = Some(vec![1, 2]);
        s.bridge(req).await.unwrap();
        let args = s.capability.last_args.as_ref().unwrap();
        assert_eq!(args.recipient, other);
        assert_eq!(args.source_chains, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bridge_and_execute_combines_results() {
        let mut s = session(FakeCapability::default());
        s.initialize(handle()).await.unwrap();
        let result = s
            .bridge_and_execute(request(), ExecuteAction::Stake)
            .await
            .unwrap();
        assert!(result.success);
        let execute = result.execute.unwrap();
        assert_eq!(execute.action, "stake");
        assert_eq!(execute.gas_used, 95_000);
        assert!(result.message.unwrap().contains("simulated stake"));
    }

    #[tokio::test]
    async fn test_bridge_and_execute_mock_policy_applies() {
        let mut s = session(FakeCapability {
            transfer_error: Some("request timed out".to_owned()),
            ..FakeCapability::default()
        });
        s.initialize(handle()).await.unwrap();
        let result = s
            .bridge_and_execute(request(), ExecuteAction::Swap)
            .await
            .unwrap();
        assert_eq!(result.provenance, Provenance::Mock);
        assert!(result.execute.is_some());
    }

    #[tokio::test]
    async fn test_balances_degraded_returns_empty() {
        let mut s = session(FakeCapability {
            init_error: Some("network error".to_owned()),
            ..FakeCapability::default()
        });
        s.initialize(handle()).await.unwrap();
        assert_eq!(s.state(), SessionState::Degraded);
        assert!(s.balances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balances_recoverable_error_returns_empty() {
        let mut s = session(FakeCapability {
            balance_error: Some("connection refused".to_owned()),
            ..FakeCapability::default()
        });
        s.initialize(handle()).await.unwrap();
        assert!(s.balances().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balances_before_init_fails() {
        let mut s = session(FakeCapability::default());
        assert_eq!(s.balances().await.unwrap_err(), BridgeError::NotInitialized);
    }

    #[tokio::test]
    async fn test_deinit_resets_lifecycle() {
        let mut s = session(FakeCapability::default());
        s.deinit().await.unwrap(); // no-op when uninitialized
        s.initialize(handle()).await.unwrap();
        s.deinit().await.unwrap();
        assert_eq!(s.state(), SessionState::Uninitialized);
        // A fresh initialize runs the provider handshake again.
        s.initialize(handle()).await.unwrap();
        assert_eq!(s.capability.init_calls, 2);
    }

    #[tokio::test]
    async fn test_init_timeout_maps_to_typed_error() {
        #[derive(Debug)]
        struct HangingCapability;

        impl BridgeCapability for HangingCapability {
            async fn initialize(&mut self, _h: &ProviderHandle) -> Result<(), CapabilityError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            async fn transfer(
                &mut self,
                _a: TransferArgs,
            ) -> Result<ProviderTransfer, CapabilityError> {
                Err(CapabilityError::new("unused"))
            }
            async fn simulate_transfer(
                &mut self,
                _a: TransferArgs,
            ) -> Result<TransferSimulation, CapabilityError> {
                Err(CapabilityError::new("unused"))
            }
            async fn unified_balances(&mut self) -> Result<Vec<UnifiedBalance>, CapabilityError> {
                Err(CapabilityError::new("unused"))
            }
            async fn deinit(&mut self) -> Result<(), CapabilityError> {
                Ok(())
            }
        }

        let mut s = BridgeSession::new(HangingCapability, ChainRegistry::new())
            .with_init_timeout(Duration::from_millis(10));
        let err = s.initialize(handle()).await.unwrap_err();
        assert!(matches!(err, BridgeError::InitializationTimeout(_)));
        assert_eq!(s.state(), SessionState::Uninitialized);
    }
}
