//! Classification of recoverable provider failures.
//!
//! A fixed set of substrings identifies the fee-grant / network / timeout
//! error family that the orchestrator absorbs into degraded-mode or mock
//! results. This is the single shared predicate used by initialize,
//! bridge, and balance calls; do not fork per-call copies.

/// Error message fragments that mark a failure as recoverable.
const RECOVERABLE_MARKERS: [&str; 8] = [
    "fee grant",
    "feegrant",
    "network error",
    "fetch failed",
    "timeout",
    "timed out",
    "connection refused",
    "service unavailable",
];

/// Returns `true` if a provider error message matches the recoverable
/// network/fee-grant family. Matching is case-insensitive.
#[must_use]
pub fn is_recoverable_provider_error(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    RECOVERABLE_MARKERS.iter().any(|m| lowered.contains(m))
}
