//! Alpha-Fee Calculator
//!
//! Pure math shared by the planners. Amounts stay `BigUint`; floats are only
//! used for rates and weights.

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::BASIS_POINT;

pub use pool_sim::calculator::{amount_from_f64, amount_to_f64, scale_by_rate};

pub(crate) const BASIS_POINT_F: f64 = BASIS_POINT as f64;

/// `amount * bps / 10000`, truncated.
pub fn mul_bps(amount: &BigUint, bps: u64) -> BigUint {
    amount * BigUint::from(bps) / BigUint::from(BASIS_POINT)
}

/// `a - b`, floored at zero.
pub fn saturating_sub(a: &BigUint, b: &BigUint) -> BigUint {
    if a > b {
        a - b
    } else {
        BigUint::zero()
    }
}

/// Largest reduction that still leaves at least one unit of `amount_out`.
pub fn clamp_reduction(reduce: BigUint, amount_out: &BigUint) -> BigUint {
    if amount_out.is_zero() {
        return BigUint::zero();
    }
    let ceiling = amount_out - 1u32;
    if reduce > ceiling {
        ceiling
    } else {
        reduce
    }
}

/// Output re-derived from a recorded swap ratio: `amount_in * recorded_out / recorded_in`.
pub fn ratio_amount_out(amount_in: &BigUint, recorded_in: &BigUint, recorded_out: &BigUint) -> BigUint {
    if recorded_in.is_zero() {
        return BigUint::zero();
    }
    amount_in * recorded_out / recorded_in
}

/// Per-swap keep rate `r` such that `r^k = 1 - reduce/path_out`.
pub fn path_keep_rate(reduce: &BigUint, path_out: &BigUint, alpha_swaps: usize) -> f64 {
    let path_out_f = amount_to_f64(path_out);
    if path_out_f <= 0.0 || alpha_swaps == 0 {
        return 1.0;
    }
    let fee_fraction = (amount_to_f64(reduce) / path_out_f).clamp(0.0, 1.0);
    (1.0 - fee_fraction).powf(1.0 / alpha_swaps as f64)
}

/// Keep rate of one alpha swap once its source only takes `source_factor_bps` of the fee.
///
/// `(1 - (1 - r^k) * factor / 10000)^(1/k)`
pub fn source_keep_rate(path_keep_rate: f64, alpha_swaps: usize, source_factor_bps: f64) -> f64 {
    if alpha_swaps == 0 {
        return 1.0;
    }
    let k = alpha_swaps as f64;
    let taken = (1.0 - path_keep_rate.powf(k)) * source_factor_bps / BASIS_POINT_F;
    (1.0 - taken).max(0.0).powf(1.0 / k)
}

/// Share of one swap's output owed to a path surplus, blended geometrically by weight.
///
/// `1 - exp(ln(1 - path_surplus_rate) * weight / total_weight)`
pub fn weighted_surplus_rate(path_surplus_rate: f64, weight: f64, total_weight: f64) -> f64 {
    if total_weight <= 0.0 {
        return 0.0;
    }
    let rate = path_surplus_rate.clamp(0.0, 1.0);
    1.0 - ((1.0 - rate).ln() * weight / total_weight).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_mul_bps() {
        assert_eq!(mul_bps(&big(1_000_000_000), 8000), big(800_000_000));
        assert_eq!(mul_bps(&big(3), 5000), big(1));
    }

    #[test]
    fn test_clamp_reduction() {
        assert_eq!(clamp_reduction(big(5), &big(10)), big(5));
        assert_eq!(clamp_reduction(big(10), &big(10)), big(9));
        assert_eq!(clamp_reduction(big(50), &big(10)), big(9));
        assert!(clamp_reduction(big(1), &big(0)).is_zero());
    }

    #[test]
    fn test_saturating_sub() {
        assert_eq!(saturating_sub(&big(10), &big(3)), big(7));
        assert!(saturating_sub(&big(3), &big(10)).is_zero());
    }

    #[test]
    fn test_ratio_amount_out() {
        assert_eq!(ratio_amount_out(&big(50), &big(100), &big(200)), big(100));
        assert!(ratio_amount_out(&big(50), &big(0), &big(200)).is_zero());
    }

    #[test]
    fn test_keep_rates_compose_to_path_fraction() {
        // two alpha swaps sharing a 10% path fee at full factor
        let r = path_keep_rate(&big(10), &big(100), 2);
        let s = source_keep_rate(r, 2, 10000.0);
        assert!((s * s - 0.9).abs() < 1e-12);

        // half factor takes half of the fee
        let s = source_keep_rate(r, 2, 5000.0);
        assert!((s * s - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_keep_rate_degenerate_inputs() {
        assert_eq!(path_keep_rate(&big(10), &big(0), 2), 1.0);
        assert_eq!(path_keep_rate(&big(10), &big(100), 0), 1.0);
        assert_eq!(path_keep_rate(&big(200), &big(100), 1), 0.0);
    }

    #[test]
    fn test_weighted_surplus_rate() {
        // equal weights split a 19% path surplus into two 10% cuts
        let rate = weighted_surplus_rate(0.19, 1.0, 2.0);
        assert!((rate - 0.1).abs() < 1e-12);
        assert_eq!(weighted_surplus_rate(0.19, 1.0, 0.0), 0.0);
        assert!((weighted_surplus_rate(0.19, 2.0, 2.0) - 0.19).abs() < 1e-12);
    }
}
