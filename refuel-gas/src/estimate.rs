//! Operation cost estimation on top of gas price quotes.
//!
//! Converts gas units and gwei prices into native-token costs for display
//! and confirmation screens. Batch transfers carry a higher per-recipient
//! unit count than single transfers, reflecting calldata and storage
//! overhead of distribution contracts.

use rust_decimal::Decimal;

use refuel::compat::OperationKind;

use crate::quote::{GasPriceQuote, GasSpeed};

/// Gas units for a single-recipient native transfer on a chain.
///
/// L2 chains charge additional calldata-posting units on top of the flat
/// transfer cost.
#[must_use]
pub fn base_gas_units(chain_id: u64) -> u64 {
    match chain_id {
        // Arbitrum Sepolia: L1 posting dominates.
        421_614 => 120_000,
        // Base / Optimism Sepolia.
        84_532 | 11_155_420 => 50_000,
        _ => 21_000,
    }
}

/// Unit multiplier applied per operation kind.
const fn kind_multiplier(kind: OperationKind) -> u64 {
    match kind {
        OperationKind::Transfer => 1,
        OperationKind::Bridge => 2,
        OperationKind::Stake => 3,
        OperationKind::Swap => 4,
    }
}

/// Gas units charged per recipient in a batch distribution.
pub const BATCH_UNITS_PER_RECIPIENT: u64 = 30_000;

const GWEI_PER_NATIVE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn units_times_price(units: u64, price_gwei: Decimal) -> Decimal {
    let cost = Decimal::from(units) * price_gwei / GWEI_PER_NATIVE;
    cost.round_dp(6)
}

/// Estimated cost of one operation in native-token units, rounded to six
/// decimals.
#[must_use]
pub fn estimate_operation_cost(
    chain_id: u64,
    quote: &GasPriceQuote,
    kind: OperationKind,
    speed: GasSpeed,
) -> Decimal {
    let units = base_gas_units(chain_id) * kind_multiplier(kind);
    units_times_price(units, quote.for_speed(speed))
}

/// Estimated cost of a batch refuel to `recipient_count` recipients, in
/// native-token units, rounded to six decimals.
#[must_use]
pub fn estimate_batch_cost(
    chain_id: u64,
    quote: &GasPriceQuote,
    recipient_count: usize,
    speed: GasSpeed,
) -> Decimal {
    let units = base_gas_units(chain_id) + BATCH_UNITS_PER_RECIPIENT * recipient_count as u64;
    units_times_price(units, quote.for_speed(speed))
}
