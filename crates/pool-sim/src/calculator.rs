//! Pool Calculator
//!
//! Amount math shared by the reference pools and the fee planners.

use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

/// Calculate swap output using constant product formula
///
/// Formula: output = (reserves_out * input * fee_num) / (reserves_in * fee_denom + input * fee_num)
pub fn calculate_output(
    reserves_in: &BigUint,
    reserves_out: &BigUint,
    input_amount: &BigUint,
    fee_num: u32,
    fee_denom: u32,
) -> BigUint {
    if reserves_in.is_zero() || reserves_out.is_zero() || input_amount.is_zero() {
        return BigUint::zero();
    }

    let numerator = reserves_out * input_amount * BigUint::from(fee_num);
    let denominator =
        reserves_in * BigUint::from(fee_denom) + input_amount * BigUint::from(fee_num);

    if denominator.is_zero() {
        return BigUint::zero();
    }

    numerator / denominator
}

/// Multiply an amount by a float rate, truncating toward zero.
pub fn scale_by_rate(amount: &BigUint, rate: f64) -> BigUint {
    amount_from_f64(amount_to_f64(amount) * rate)
}

/// Nearest `f64` to an amount; saturates at infinity for absurdly large values.
pub fn amount_to_f64(amount: &BigUint) -> f64 {
    amount.to_f64().unwrap_or(f64::INFINITY)
}

/// Truncate a float to an amount. Negative and non-finite values map to zero.
pub fn amount_from_f64(value: f64) -> BigUint {
    if !value.is_finite() || value <= 0.0 {
        return BigUint::zero();
    }
    BigUint::from_f64(value.trunc()).unwrap_or_default()
}
