//! Money helpers - fixed-point decimal arithmetic
//!
//! All monetary values are `rust_decimal::Decimal` end to end; binary floats
//! never enter a calculation. Amounts cross the gateway boundary as integer
//! minor units and only become display strings at the outermost edge.

use rust_decimal::prelude::*;

/// Monetary scale (2 decimal places)
pub const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed quantity on an edited line
pub const MAX_QUANTITY: u32 = 9999;

/// Round to monetary precision with half-to-even semantics
///
/// Half-to-even matches standard currency rounding and keeps repeated
/// re-computation of the same totals drift-free.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
}

/// Convert a rounded amount to integer minor units (e.g. pence) for the gateway
///
/// The input must already be at monetary precision; the scaled value is exact.
#[inline]
pub fn to_minor_units(value: Decimal) -> i64 {
    (round_money(value) * Decimal::ONE_HUNDRED)
        .to_i64()
        // 2dp Decimal * 100 is integral and far inside i64 for any order total
        .expect("monetary amount representable in minor units")
}

/// Format an amount as a two-decimal display string
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_money(value))
}
