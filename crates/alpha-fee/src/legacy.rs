//! Legacy Planner
//!
//! Takes the whole fee from a single alpha swap: the one closest to the end of
//! its path, preferring shorter paths on ties. The fee is a share of the gap to
//! the AMM route, converted into the alpha swap's output token.
//!
//! Only the charged path is re-simulated. Other paths are left as the finder
//! quoted them, and no pool state carries over from them into the charged path.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::{AlphaFeeConfig, PriceBook, ReductionConfig, BASIS_POINT};

use crate::calculator::saturating_sub;
use crate::classifier::AlphaSourceClassifier;
use crate::eligibility::amm_reference_amount;
use crate::fair_price::{calc_amount_from_price, calc_amount_price};
use crate::resimulate::{project_route, walk_route, StepReduction, SwapReducer, SwapStep};
use crate::state::{
    AlphaFeeError, AlphaFeeParams, DefaultAlphaFeeParams, LegacyAlphaFee, Path, Route, SwapInfo,
};

/// Factors carry one decimal place: `factor * 10 / (10000 * 10)`.
const FACTOR_SCALE: u64 = 10;

/// Position of the swap carrying a legacy fee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapIndex {
    pub path_id: usize,
    pub swap_id: usize,
}

pub struct LegacyPlanner {
    config: AlphaFeeConfig,
    classifier: Arc<dyn AlphaSourceClassifier>,
}

impl LegacyPlanner {
    pub fn new(config: AlphaFeeConfig, classifier: Arc<dyn AlphaSourceClassifier>) -> Self {
        Self { config, classifier }
    }

    pub fn calculate(&self, params: AlphaFeeParams<'_>) -> Result<LegacyAlphaFee, AlphaFeeError> {
        let AlphaFeeParams {
            best_route,
            best_amm_route,
            prices,
            mut bucket,
        } = params;
        let rc = &self.config.reduction_config;
        let classifier = self.classifier.as_ref();

        let amm_route = best_amm_route.ok_or_else(|| AlphaFeeError::not_exists("amm route is missing"))?;
        if best_route.amount_out <= amm_route.amount_out {
            return Err(AlphaFeeError::not_exists(format!(
                "reduction delta is not positive, best amount {}, amm amount {}",
                best_route.amount_out, amm_route.amount_out
            )));
        }
        if almost_equal(rc, best_route, amm_route) {
            return Err(AlphaFeeError::not_exists(
                "amm route is almost equal with best route",
            ));
        }

        let amm_amount = amm_reference_amount(rc, best_route, Some(amm_route));
        let delta = saturating_sub(&best_route.amount_out, &amm_amount);

        let route_info = project_route(best_route, &bucket, classifier)?;
        let index = locate_alpha_swap(classifier, &route_info).ok_or(AlphaFeeError::RouteHasNoAlphaFeeDex)?;
        let path = &best_route.paths[index.path_id];
        let exchange = route_info[index.path_id][index.swap_id].exchange.as_str();
        let pool = path.pools_order[index.swap_id].as_str();

        let factor = rc.reduction_factor(pool, exchange);
        let fee = &delta * BigUint::from((factor * FACTOR_SCALE as f64).max(0.0) as u64)
            / BigUint::from(BASIS_POINT as u64 * FACTOR_SCALE);

        let charged_route = Route {
            token_in: path.tokens_order.first().cloned().unwrap_or_default(),
            token_out: path.tokens_order.last().cloned().unwrap_or_default(),
            amount_in: path.amount_in.clone(),
            amount_out: path.amount_out.clone(),
            amount_out_price: 0.0,
            gas_fee_price: 0.0,
            l1_gas_fee_price: 0.0,
            paths: vec![path.clone()],
        };
        let mut reducer = LegacyReducer {
            swap_id: index.swap_id,
            route_token_out: &best_route.token_out,
            path_amount_out: &path.amount_out,
            fee: &fee,
            prices,
            charged: None,
            insufficient: false,
        };
        let outcome = walk_route(&charged_route, &mut bucket, classifier, &mut reducer)?;
        let Some(charged) = reducer.charged else {
            return Err(AlphaFeeError::RouteHasNoAlphaFeeDex);
        };
        if reducer.insufficient {
            tracing::warn!(pool, amount_out = %charged.swap_amount_out, fee = %charged.amount, "alpha swap cannot cover fee");
            return Err(AlphaFeeError::AlphaSwapInsufficientForFee {
                pool: pool.to_string(),
                amount_out: charged.swap_amount_out,
                fee: charged.amount,
            });
        }

        // final output of the charged path, with the fee taken off when it sits on the last swap
        let last_out = outcome
            .route_info
            .first()
            .and_then(|swaps| swaps.last())
            .map(|swap| swap.amount_out.clone())
            .unwrap_or_default();
        let path_out = if index.swap_id + 1 == path.pools_order.len() {
            saturating_sub(&last_out, &charged.amount)
        } else {
            last_out
        };
        let amount_out = saturating_sub(
            &best_route.amount_out,
            &saturating_sub(&path.amount_out, &path_out),
        );
        if amount_out < amm_amount {
            return Err(AlphaFeeError::FeeYieldsLessThanAmm {
                amount_out,
                amm_amount,
            });
        }

        Ok(LegacyAlphaFee {
            token: charged.token,
            amount: charged.amount,
            amount_usd: charged.amount_usd,
            pool: pool.to_string(),
            amm_amount: Some(amm_amount),
            path_id: index.path_id,
            swap_id: index.swap_id,
            executed_id: executed_id(&route_info, index),
        })
    }

    /// Fixed share of the chosen swap's recorded output.
    pub fn calculate_default(&self, params: DefaultAlphaFeeParams<'_>) -> Result<LegacyAlphaFee, AlphaFeeError> {
        let route_info = params.route_summary.route_info();
        let index = locate_alpha_swap(self.classifier.as_ref(), &route_info)
            .ok_or(AlphaFeeError::RouteHasNoAlphaFeeDex)?;
        let swap = &route_info[index.path_id][index.swap_id];

        let bps = self.config.reduction_config.default_alpha_fee_percentage_bps.max(0.0);
        let amount = &swap.amount_out * BigUint::from((bps * FACTOR_SCALE as f64) as u64)
            / BigUint::from(BASIS_POINT as u64 * FACTOR_SCALE);
        let amount_usd = calc_amount_price(
            &amount,
            params.prices.decimals(&swap.token_out),
            params.prices.price(&swap.token_out),
        );

        Ok(LegacyAlphaFee {
            token: swap.token_out.clone(),
            amount,
            amount_usd,
            pool: swap.pool.clone(),
            amm_amount: None,
            path_id: index.path_id,
            swap_id: index.swap_id,
            executed_id: executed_id(&route_info, index),
        })
    }
}

/// Routes are almost equal when their gas-adjusted prices, or raw amounts, are
/// within the configured thresholds.
fn almost_equal(config: &ReductionConfig, best: &Route, amm: &Route) -> bool {
    if best.amount_out_price != 0.0 || amm.amount_out_price != 0.0 {
        let best_value = best.amount_out_price - best.l1_gas_fee_price;
        let amm_value = amm.amount_out_price - amm.l1_gas_fee_price;
        return (best_value - amm_value).abs() <= config.min_different_threshold_usd;
    }

    let diff = if best.amount_out > amm.amount_out {
        &best.amount_out - &amm.amount_out
    } else {
        &amm.amount_out - &best.amount_out
    };
    match u64::try_from(config.min_different_threshold_bps) {
        Ok(threshold) => diff < BigUint::from(threshold),
        Err(_) => false,
    }
}

/// Last alpha swap of each path; the one nearest its path's end wins, then the shorter path.
pub fn locate_alpha_swap(classifier: &dyn AlphaSourceClassifier, route_info: &[Vec<SwapInfo>]) -> Option<SwapIndex> {
    let mut best: Option<(usize, usize, SwapIndex)> = None;

    for (path_id, path) in route_info.iter().enumerate() {
        let Some(swap_id) = path
            .iter()
            .rposition(|swap| classifier.is_alpha_fee_source(&swap.exchange))
        else {
            continue;
        };
        let distance = path.len() - 1 - swap_id;
        let better = match best {
            None => true,
            Some((min_distance, min_len, _)) => {
                distance < min_distance || (distance == min_distance && path.len() < min_len)
            }
        };
        if better {
            best = Some((distance, path.len(), SwapIndex { path_id, swap_id }));
        }
    }

    best.map(|(_, _, index)| index)
}

fn executed_id(route_info: &[Vec<SwapInfo>], index: SwapIndex) -> usize {
    route_info[..index.path_id].iter().map(Vec::len).sum::<usize>() + index.swap_id
}

struct ChargedFee {
    token: String,
    amount: BigUint,
    amount_usd: f64,
    swap_amount_out: BigUint,
}

/// Charges the fee on a route holding only the charged path.
struct LegacyReducer<'a> {
    /// Position of the charged swap within its path
    swap_id: usize,
    route_token_out: &'a str,
    path_amount_out: &'a BigUint,
    /// Fee in the route's output token
    fee: &'a BigUint,
    prices: &'a PriceBook,
    charged: Option<ChargedFee>,
    insufficient: bool,
}

impl LegacyReducer<'_> {
    /// Fee expressed in `token`, through USD prices when both tokens are priced.
    fn convert_fee(&self, token: &str, swap_amount_out: &BigUint) -> (BigUint, f64) {
        let price_out = self.prices.price(self.route_token_out);
        let price_token = self.prices.price(token);

        if price_out > 0.0 && price_token > 0.0 {
            let fee_usd = calc_amount_price(self.fee, self.prices.decimals(self.route_token_out), price_out);
            let amount = calc_amount_from_price(fee_usd, self.prices.decimals(token), price_token);
            return (amount, fee_usd);
        }

        // same share of the swap as the fee is of the path
        if self.path_amount_out.is_zero() {
            return (BigUint::zero(), 0.0);
        }
        (self.fee * swap_amount_out / self.path_amount_out, 0.0)
    }
}

impl SwapReducer for LegacyReducer<'_> {
    fn enter_path(&mut self, path_idx: usize, _path: &Path) -> bool {
        path_idx == 0
    }

    fn reduce(&mut self, step: &SwapStep<'_>) -> StepReduction {
        if step.executed_id != self.swap_id || self.charged.is_some() {
            return StepReduction::default();
        }

        let (amount, amount_usd) = self.convert_fee(step.token_out, step.amount_out);
        // the swap must keep some output after the fee
        self.insufficient = amount >= *step.amount_out;
        self.charged = Some(ChargedFee {
            token: step.token_out.to_string(),
            amount: amount.clone(),
            amount_usd,
            swap_amount_out: step.amount_out.clone(),
        });
        StepReduction { amount, amount_usd }
    }
}
