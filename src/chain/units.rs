//! USDC fixed-point conversion.
//!
//! The contract stores amounts as integers scaled by 10^6. Pricing works in
//! decimal USDC; this is the only place the two meet.

use rust_decimal::prelude::*;

use crate::types::HouseError;

pub const USDC_DECIMALS: u32 = 6;
pub const USDC_SCALE: u128 = 1_000_000;

/// Fixed-point micro-USDC to decimal USDC (exact).
///
/// Saturates at `Decimal::MAX` above 2^96 micro-units.
pub fn from_fixed_point(raw: u128) -> Decimal {
    i128::try_from(raw)
        .ok()
        .and_then(|v| Decimal::try_from_i128_with_scale(v, USDC_DECIMALS).ok())
        .map(|d| d.normalize())
        .unwrap_or(Decimal::MAX)
}

/// Decimal USDC to fixed-point micro-USDC, flooring sub-micro remainders.
pub fn to_fixed_point(amount: Decimal) -> Result<u128, HouseError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(HouseError::InvalidAmount(format!(
            "negative amount cannot cross the chain boundary: {amount}"
        )));
    }
    let scaled = (amount * Decimal::from(USDC_SCALE)).floor();
    scaled
        .to_u128()
        .ok_or_else(|| HouseError::InvalidAmount(format!("amount out of range: {amount}")))
}

/// Two-decimal display string for a fixed-point amount.
pub fn format_usdc(raw: u128) -> String {
    format!("{:.2}", from_fixed_point(raw))
}
