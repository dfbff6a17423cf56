//! Surplus-Ranked Planner
//!
//! Alpha paths are ranked by realized rate. Sweeping from the best rate down,
//! the input routed so far earns the gap to the next rate as surplus; each
//! increment is shared back across the contributing paths by input, and the
//! running total never exceeds the gap to the AMM reference.
//!
//! Inside a path the surplus is split across alpha swaps by configured weight
//! with a geometric blend, so the swaps compose to the path surplus fraction.

use std::collections::HashMap;
use std::sync::Arc;

use num_bigint::BigUint;
use router_core::AlphaFeeConfig;

use crate::calculator::{amount_from_f64, amount_to_f64, weighted_surplus_rate, BASIS_POINT_F};
use crate::classifier::{path_has_alpha_source, AlphaSourceClassifier};
use crate::eligibility::{check_route, ensure_covers_amm};
use crate::fair_price::FairPriceOracle;
use crate::proportional::ProportionalPlanner;
use crate::resimulate::{project_route, walk_route, StepReduction, SwapReducer, SwapStep};
use crate::state::{
    AlphaFee, AlphaFeeError, AlphaFeeParams, DefaultAlphaFeeParams, Path, PathReduction, SwapInfo,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct PathRate {
    path_idx: usize,
    amount_in: f64,
    amount_out: f64,
}

impl PathRate {
    fn rate(&self) -> f64 {
        self.amount_out / self.amount_in
    }
}

/// Accumulated flow through one `pool-tokenIn-tokenOut` across alpha paths
#[derive(Debug, Default)]
struct SharedPoolFlow {
    amount_in: BigUint,
    amount_out: BigUint,
    count: usize,
}

pub struct SurplusPlanner {
    config: AlphaFeeConfig,
    classifier: Arc<dyn AlphaSourceClassifier>,
    /// Summary routes are priced the proportional way
    fallback: ProportionalPlanner,
}

impl SurplusPlanner {
    pub fn new(config: AlphaFeeConfig, classifier: Arc<dyn AlphaSourceClassifier>) -> Self {
        let fallback = ProportionalPlanner::new(config.clone(), Arc::clone(&classifier));
        Self {
            config,
            classifier,
            fallback,
        }
    }

    pub fn calculate(&self, params: AlphaFeeParams<'_>) -> Result<AlphaFee, AlphaFeeError> {
        let AlphaFeeParams {
            best_route,
            best_amm_route,
            prices,
            mut bucket,
        } = params;
        let classifier = self.classifier.as_ref();

        let route_info = project_route(best_route, &bucket, classifier)?;
        let (amm_amount, delta) = check_route(
            &self.config.reduction_config,
            classifier,
            &route_info,
            best_route,
            best_amm_route,
        )?;

        let path_reductions = self.reduction_per_path(&route_info, &delta);
        if path_reductions.is_empty() {
            return Err(AlphaFeeError::not_exists("empty path reductions"));
        }
        tracing::debug!(
            paths = path_reductions.len(),
            delta = %delta,
            "surplus path reductions"
        );

        let mut reducer = SurplusReducer {
            config: &self.config,
            classifier,
            route_info: &route_info,
            path_reductions: &path_reductions,
            oracle: FairPriceOracle::new(&self.config.whitelist_prices, prices),
            cursor: 0,
            path_surplus_rate: 0.0,
            total_weight: 0.0,
        };
        let outcome = walk_route(best_route, &mut bucket, classifier, &mut reducer)?;
        ensure_covers_amm(&outcome.amount_out, outcome.swap_reductions.len(), &amm_amount)?;

        Ok(AlphaFee {
            amm_amount,
            swap_reductions: outcome.swap_reductions,
        })
    }

    pub fn calculate_default(&self, params: DefaultAlphaFeeParams<'_>) -> Result<AlphaFee, AlphaFeeError> {
        self.fallback.calculate_default(params)
    }

    /// Merit-order surplus per alpha path, sorted by path index.
    ///
    /// Paths whose surplus truncates to zero are dropped.
    pub fn reduction_per_path(&self, route_info: &[Vec<SwapInfo>], delta: &BigUint) -> Vec<PathReduction> {
        let delta_f = amount_to_f64(delta);

        let mut rates = self.path_rates(route_info);
        // best rate first; ties keep route order
        rates.sort_by(|a, b| (b.amount_out * a.amount_in).total_cmp(&(a.amount_out * b.amount_in)));

        let mut surpluses: Vec<PathReduction> = Vec::with_capacity(rates.len());
        let mut cumulative_in = 0.0;
        let mut total_surplus = 0.0;

        for (idx, path) in rates.iter().enumerate() {
            let next_rate = rates.get(idx + 1).map(PathRate::rate).unwrap_or(0.0);

            cumulative_in += path.amount_in;
            let mut surplus = (cumulative_in * (path.rate() - next_rate)).max(0.0);
            if total_surplus + surplus > delta_f {
                surplus = delta_f - total_surplus;
            }
            total_surplus += surplus;

            surpluses.push(PathReduction {
                path_idx: path.path_idx,
                reduce_amount: amount_from_f64(surplus * path.amount_in / cumulative_in),
            });
            for (earlier, reduction) in rates[..idx].iter().zip(surpluses.iter_mut()) {
                reduction.reduce_amount += amount_from_f64(surplus * earlier.amount_in / cumulative_in);
            }
        }

        surpluses.retain(|s| s.reduce_amount > BigUint::default());
        surpluses.sort_by_key(|s| s.path_idx);
        surpluses
    }

    /// Realized `out/in` of every alpha path.
    ///
    /// With `calculate_surplus_merge_share_pools`, a path crossing a pool that
    /// other alpha paths also use is re-rated with each pool's pooled average,
    /// so slippage on the shared pool does not rank one path below another.
    fn path_rates(&self, route_info: &[Vec<SwapInfo>]) -> Vec<PathRate> {
        let classifier = self.classifier.as_ref();
        let merge_shared = self.config.reduction_config.calculate_surplus_merge_share_pools;

        let alpha_paths: Vec<(usize, &Vec<SwapInfo>)> = route_info
            .iter()
            .enumerate()
            .filter(|(_, path)| !path.is_empty() && path_has_alpha_source(classifier, path))
            .collect();

        let mut shared: HashMap<String, SharedPoolFlow> = HashMap::new();
        if merge_shared {
            for swap in alpha_paths.iter().flat_map(|(_, path)| path.iter()) {
                let flow = shared.entry(shared_pool_key(swap)).or_default();
                flow.amount_in += &swap.amount_in;
                flow.amount_out += &swap.amount_out;
                flow.count += 1;
            }
        }

        alpha_paths
            .into_iter()
            .filter_map(|(path_idx, path)| {
                let amount_in = amount_to_f64(&path.first()?.amount_in);
                let default_out = amount_to_f64(&path.last()?.amount_out);
                if amount_in <= 0.0 {
                    return None;
                }

                let crosses_shared = merge_shared
                    && path.iter().any(|swap| {
                        shared
                            .get(&shared_pool_key(swap))
                            .is_some_and(|flow| flow.count > 1)
                    });
                let amount_out = if crosses_shared {
                    pooled_path_output(&shared, path, amount_in).unwrap_or(default_out)
                } else {
                    default_out
                };

                Some(PathRate {
                    path_idx,
                    amount_in,
                    amount_out,
                })
            })
            .collect()
    }
}

fn shared_pool_key(swap: &SwapInfo) -> String {
    format!("{}-{}-{}", swap.pool, swap.token_in, swap.token_out)
}

fn pooled_path_output(
    shared: &HashMap<String, SharedPoolFlow>,
    path: &[SwapInfo],
    amount_in: f64,
) -> Option<f64> {
    let mut amount_out = amount_in;
    for swap in path {
        let key = shared_pool_key(swap);
        let Some(flow) = shared.get(&key) else {
            tracing::warn!(key = %key, "shared pool flow not found");
            return None;
        };
        let flow_out = amount_to_f64(&flow.amount_out);
        if flow_out.abs() < f64::EPSILON {
            tracing::warn!(key = %key, "shared pool flow has zero amount out");
            return None;
        }
        amount_out *= flow_out / amount_to_f64(&flow.amount_in);
    }
    Some(amount_out)
}

struct SurplusReducer<'a> {
    config: &'a AlphaFeeConfig,
    classifier: &'a dyn AlphaSourceClassifier,
    route_info: &'a [Vec<SwapInfo>],
    path_reductions: &'a [PathReduction],
    oracle: FairPriceOracle<'a>,
    cursor: usize,
    path_surplus_rate: f64,
    total_weight: f64,
}

impl SwapReducer for SurplusReducer<'_> {
    fn enter_path(&mut self, path_idx: usize, path: &Path) -> bool {
        let Some(info) = self.route_info.get(path_idx) else {
            return false;
        };
        if !path_has_alpha_source(self.classifier, info) {
            return false;
        }
        let Some(reduction) = self
            .path_reductions
            .get(self.cursor)
            .filter(|r| r.path_idx == path_idx)
        else {
            return false;
        };
        self.cursor += 1;

        self.path_surplus_rate = amount_to_f64(&reduction.reduce_amount) / amount_to_f64(&path.amount_out);
        self.total_weight = info
            .iter()
            .filter(|swap| self.classifier.is_alpha_fee_source(&swap.exchange))
            .map(|swap| {
                self.config
                    .weight_distribute(&swap.pool, &swap.token_in, &swap.token_out, &swap.exchange)
                    as f64
            })
            .sum();
        true
    }

    fn reduce(&mut self, step: &SwapStep<'_>) -> StepReduction {
        let rc = &self.config.reduction_config;
        let amount_out = amount_to_f64(step.amount_out);
        let amount_out_usd = self.oracle.usd_value(
            step.token_in,
            step.token_out,
            step.amount_in,
            step.amount_out,
            step.amount_out,
        );

        let weight = self
            .config
            .weight_distribute(step.pool_id, step.token_in, step.token_out, step.exchange);
        let surplus_rate = weighted_surplus_rate(self.path_surplus_rate, weight as f64, self.total_weight);

        let factor = rc.reduction_factor(step.pool_id, step.exchange);
        let mut reduce_amount = amount_out * surplus_rate * factor / BASIS_POINT_F;
        let mut reduce_amount_usd = amount_out_usd * reduce_amount / amount_out;

        // the pool keeps at most `allowance` USD of its surplus
        if let Some(allowance) = rc.surplus_allowance(step.pool_id, step.exchange) {
            if factor > 0.0 {
                let min_reduce_usd = reduce_amount_usd * BASIS_POINT_F / factor - allowance;
                if reduce_amount_usd < min_reduce_usd && amount_out_usd > 0.0 {
                    reduce_amount_usd = min_reduce_usd;
                    reduce_amount = amount_out * reduce_amount_usd / amount_out_usd;
                }
            }
        }

        StepReduction {
            amount: amount_from_f64(reduce_amount),
            amount_usd: reduce_amount_usd,
        }
    }
}
