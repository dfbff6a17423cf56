//! Eligibility checks and the AMM reference amount.
//!
//! Every live planner runs the same gate before computing anything:
//! 1. the route has at least one alpha swap
//! 2. the best route is meaningfully better than the AMM-only route
//! 3. the AMM reference, floored at a share of the best output, is below the best output

use num_bigint::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};
use router_core::{ReductionConfig, BASIS_POINT};

use crate::calculator::mul_bps;
use crate::classifier::{path_has_alpha_source, AlphaSourceClassifier};
use crate::state::{AlphaFeeError, Route, SwapInfo};

/// Fails with `RouteHasNoAlphaFeeDex` unless some swap is an alpha source.
pub fn ensure_alpha_source(
    classifier: &dyn AlphaSourceClassifier,
    route_info: &[Vec<SwapInfo>],
) -> Result<(), AlphaFeeError> {
    if route_info
        .iter()
        .any(|path| path_has_alpha_source(classifier, path))
    {
        Ok(())
    } else {
        Err(AlphaFeeError::RouteHasNoAlphaFeeDex)
    }
}

/// Whether the best route is within the configured threshold of the AMM route.
///
/// USD prices (net of gas) are compared when either route has one, otherwise
/// the raw amount difference in basis points of the AMM amount.
pub fn not_much_better(config: &ReductionConfig, best: &Route, amm: &Route) -> bool {
    if best.amount_out_price != 0.0 || amm.amount_out_price != 0.0 {
        let best_price = best.amount_out_price - (best.gas_fee_price + best.l1_gas_fee_price);
        let amm_price = amm.amount_out_price - (amm.gas_fee_price + amm.l1_gas_fee_price);
        return best_price - amm_price <= config.min_different_threshold_usd;
    }

    if amm.amount_out.is_zero() {
        return false;
    }
    let diff = BigInt::from(best.amount_out.clone()) - BigInt::from(amm.amount_out.clone());
    let diff_bps = diff * BigInt::from(BASIS_POINT) / BigInt::from(amm.amount_out.clone());
    match diff_bps.to_i64() {
        Some(bps) => bps <= config.min_different_threshold_bps,
        None => diff_bps.is_zero(),
    }
}

/// AMM amount the reduced route must still deliver.
///
/// A missing or tiny AMM route is floored at
/// `best.amount_out * max_threshold_percentage_in_bps / 10000`.
pub fn amm_reference_amount(config: &ReductionConfig, best: &Route, amm: Option<&Route>) -> BigUint {
    let floor = mul_bps(&best.amount_out, config.max_threshold_percentage_in_bps as u64);
    match amm {
        Some(amm) if amm.amount_out > floor => amm.amount_out.clone(),
        _ => floor,
    }
}

/// `best - amm`, failing with `AlphaFeeNotExists` when not strictly positive.
pub fn reduction_delta(best_amount_out: &BigUint, amm_amount: &BigUint) -> Result<BigUint, AlphaFeeError> {
    if best_amount_out <= amm_amount {
        return Err(AlphaFeeError::not_exists(format!(
            "reduction delta is not positive, best amount {}, amm amount {}",
            best_amount_out, amm_amount
        )));
    }
    Ok(best_amount_out - amm_amount)
}

/// Runs the shared gate and returns `(amm_amount, reduction_delta)`.
pub fn check_route(
    config: &ReductionConfig,
    classifier: &dyn AlphaSourceClassifier,
    route_info: &[Vec<SwapInfo>],
    best: &Route,
    amm: Option<&Route>,
) -> Result<(BigUint, BigUint), AlphaFeeError> {
    ensure_alpha_source(classifier, route_info)?;

    if let Some(amm_route) = amm {
        if not_much_better(config, best, amm_route) {
            tracing::debug!(
                best = %best.amount_out,
                amm = %amm_route.amount_out,
                "amm route is almost equal with best route"
            );
            return Err(AlphaFeeError::not_exists(
                "amm route is almost equal with best route",
            ));
        }
    }

    let amm_amount = amm_reference_amount(config, best, amm);
    let delta = reduction_delta(&best.amount_out, &amm_amount)?;
    Ok((amm_amount, delta))
}

/// Final guard: the conceptually reduced route must still cover the AMM amount.
///
/// `slack` absorbs the per-swap truncation of float-derived reductions.
pub fn ensure_covers_amm(
    amount_out: &BigUint,
    slack: usize,
    amm_amount: &BigUint,
) -> Result<(), AlphaFeeError> {
    if amount_out + BigUint::from(slack) < *amm_amount {
        return Err(AlphaFeeError::FeeYieldsLessThanAmm {
            amount_out: amount_out.clone(),
            amm_amount: amm_amount.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_route(amount_out: u64, price: f64) -> Route {
        Route {
            token_in: "a".into(),
            token_out: "b".into(),
            amount_in: BigUint::from(amount_out),
            amount_out: BigUint::from(amount_out),
            amount_out_price: price,
            gas_fee_price: 0.0,
            l1_gas_fee_price: 0.0,
            paths: vec![],
        }
    }

    fn make_config() -> ReductionConfig {
        ReductionConfig {
            max_threshold_percentage_in_bps: 8000,
            min_different_threshold_bps: 10,
            min_different_threshold_usd: 0.5,
            ..ReductionConfig::default()
        }
    }

    #[test]
    fn test_not_much_better_by_price() {
        let config = make_config();
        assert!(not_much_better(&config, &make_route(1000, 10.3), &make_route(900, 10.0)));
        assert!(!not_much_better(&config, &make_route(1000, 11.0), &make_route(900, 10.0)));
    }

    #[test]
    fn test_not_much_better_nets_out_gas() {
        let config = make_config();
        let mut best = make_route(1000, 11.0);
        best.gas_fee_price = 0.4;
        best.l1_gas_fee_price = 0.2;
        assert!(not_much_better(&config, &best, &make_route(900, 10.0)));
    }

    #[test]
    fn test_not_much_better_by_bps() {
        let config = make_config();
        // 0.1% ahead
        assert!(not_much_better(&config, &make_route(10010, 0.0), &make_route(10000, 0.0)));
        // 1% ahead
        assert!(!not_much_better(&config, &make_route(10100, 0.0), &make_route(10000, 0.0)));
        // behind
        assert!(not_much_better(&config, &make_route(9000, 0.0), &make_route(10000, 0.0)));
        assert!(!not_much_better(&config, &make_route(9000, 0.0), &make_route(0, 0.0)));
    }

    #[test]
    fn test_amm_reference_floor() {
        let config = make_config();
        let best = make_route(1000, 0.0);
        assert_eq!(amm_reference_amount(&config, &best, None), BigUint::from(800u32));
        assert_eq!(
            amm_reference_amount(&config, &best, Some(&make_route(500, 0.0))),
            BigUint::from(800u32)
        );
        assert_eq!(
            amm_reference_amount(&config, &best, Some(&make_route(950, 0.0))),
            BigUint::from(950u32)
        );
    }

    #[test]
    fn test_reduction_delta_must_be_positive() {
        let delta = reduction_delta(&BigUint::from(10u32), &BigUint::from(4u32)).unwrap();
        assert_eq!(delta, BigUint::from(6u32));

        let err = reduction_delta(&BigUint::from(4u32), &BigUint::from(4u32)).unwrap_err();
        assert_eq!(err.error_code(), "alpha_fee_not_exists");
    }

    #[test]
    fn test_ensure_covers_amm() {
        let amm = BigUint::from(100u32);
        assert!(ensure_covers_amm(&BigUint::from(100u32), 0, &amm).is_ok());
        assert!(ensure_covers_amm(&BigUint::from(99u32), 1, &amm).is_ok());
        let err = ensure_covers_amm(&BigUint::from(98u32), 1, &amm).unwrap_err();
        assert_eq!(err.error_code(), "fee_yields_less_than_amm");
    }
}
