//! Route Re-simulation
//!
//! Walks a route in execution order (paths, then swaps), quoting every swap
//! against the bucket and feeding each output into the next swap. Planners
//! plug in through [`SwapReducer`] to withhold part of an alpha swap's output;
//! downstream swaps then see the reduced amount.
//!
//! Every quote is followed by a balance update on the bucket so later swaps
//! through the same pool observe the new state. The update is the only
//! mutating step and runs behind a fault boundary: an error or a panic there
//! aborts the whole walk with `PanicRefreshPath`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use num_bigint::BigUint;
use num_traits::Zero;
use pool_sim::{SimulatorBucket, SwapEffect, TokenAmount};

use crate::calculator::{amount_to_f64, clamp_reduction, scale_by_rate};
use crate::classifier::AlphaSourceClassifier;
use crate::state::{AlphaFeeError, Path, Route, SwapInfo, SwapReduction};

/// One quoted alpha swap, as seen by a reducer
#[derive(Debug, Clone, Copy)]
pub struct SwapStep<'a> {
    pub path_idx: usize,
    pub executed_id: usize,
    pub pool_id: &'a str,
    pub exchange: &'a str,
    pub token_in: &'a str,
    pub token_out: &'a str,
    /// Actual input, already reduced by upstream alpha swaps
    pub amount_in: &'a BigUint,
    /// Quoted output before any reduction
    pub amount_out: &'a BigUint,
}

/// Amount a reducer wants withheld from one swap
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepReduction {
    pub amount: BigUint,
    pub amount_usd: f64,
}

/// Per-swap reduction policy driven by the walk.
pub trait SwapReducer {
    /// Called before the first swap of every path. Returning `false` leaves
    /// the path's alpha swaps untouched.
    fn enter_path(&mut self, path_idx: usize, path: &Path) -> bool;

    /// Reduction for an alpha swap on an entered path.
    fn reduce(&mut self, step: &SwapStep<'_>) -> StepReduction;
}

/// Walks without reducing anything.
pub struct NoReduction;

impl SwapReducer for NoReduction {
    fn enter_path(&mut self, _path_idx: usize, _path: &Path) -> bool {
        false
    }

    fn reduce(&mut self, _step: &SwapStep<'_>) -> StepReduction {
        StepReduction::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkOutcome {
    /// In execution order
    pub swap_reductions: Vec<SwapReduction>,
    /// Swaps as quoted during the walk, before reductions
    pub route_info: Vec<Vec<SwapInfo>>,
    /// Route output once every reduction is taken, in the route's own terms
    pub amount_out: BigUint,
}

/// Re-simulate `route` on `bucket`, taking reductions from alpha swaps.
///
/// The bucket is mutated; pass a private copy.
pub fn walk_route(
    route: &Route,
    bucket: &mut SimulatorBucket,
    classifier: &dyn AlphaSourceClassifier,
    reducer: &mut dyn SwapReducer,
) -> Result<WalkOutcome, AlphaFeeError> {
    let mut swap_reductions = Vec::new();
    let mut route_info = Vec::with_capacity(route.paths.len());
    let mut amount_out = BigUint::zero();
    let mut executed_id = 0;

    for (path_idx, path) in route.paths.iter().enumerate() {
        path.validate()?;
        let reduce_path = reducer.enter_path(path_idx, path);

        let mut path_info = Vec::with_capacity(path.pools_order.len());
        let mut amount_in = path.amount_in.clone();
        let mut keep_rate = 1.0;
        let mut reduced = false;

        for (i, pool_id) in path.pools_order.iter().enumerate() {
            let token_in = &path.tokens_order[i];
            let token_out = &path.tokens_order[i + 1];

            let pool = bucket.get(pool_id).ok_or_else(|| AlphaFeeError::InvalidSwap {
                pool: pool_id.clone(),
                reason: "pool not found in simulator bucket".to_string(),
            })?;
            let exchange = pool.exchange().to_string();

            let quote = pool
                .quote(
                    &TokenAmount::new(token_in.as_str(), amount_in.clone()),
                    token_out,
                    bucket.swap_limit(pool_id),
                )
                .map_err(|e| AlphaFeeError::InvalidSwap {
                    pool: pool_id.clone(),
                    reason: e.to_string(),
                })?;
            if !quote.is_valid(token_out) {
                return Err(AlphaFeeError::CalcAmountOutEmpty {
                    pool: pool_id.clone(),
                });
            }

            let quoted_out = quote.amount_out.amount.clone();
            let mut next_amount_in = quoted_out.clone();

            if reduce_path && classifier.is_alpha_fee_source(&exchange) {
                let step = SwapStep {
                    path_idx,
                    executed_id,
                    pool_id,
                    exchange: &exchange,
                    token_in,
                    token_out,
                    amount_in: &amount_in,
                    amount_out: &quoted_out,
                };
                let reduction = bound_reduction(reducer.reduce(&step), &quoted_out);

                next_amount_in = &quoted_out - &reduction.amount;
                keep_rate *= amount_to_f64(&next_amount_in) / amount_to_f64(&quoted_out);
                reduced = true;

                swap_reductions.push(SwapReduction {
                    executed_id,
                    pool_address: pool_id.clone(),
                    token_in: token_in.clone(),
                    token_out: token_out.clone(),
                    reduce_amount: reduction.amount,
                    reduce_amount_usd: reduction.amount_usd,
                });
            }

            apply_effect_guarded(bucket, pool_id, &exchange, &quote.effect)?;

            path_info.push(SwapInfo {
                pool: pool_id.clone(),
                token_in: token_in.clone(),
                token_out: token_out.clone(),
                amount_in,
                amount_out: quoted_out,
                exchange,
            });

            amount_in = next_amount_in;
            executed_id += 1;
        }

        amount_out += if reduced {
            scale_by_rate(&path.amount_out, keep_rate)
        } else {
            path.amount_out.clone()
        };
        route_info.push(path_info);
    }

    Ok(WalkOutcome {
        swap_reductions,
        route_info,
        amount_out,
    })
}

/// Project a live route onto swap infos without touching `bucket`.
///
/// Each path's last swap reports the path's recorded output, so projections
/// agree with the route the finder selected.
pub fn project_route(
    route: &Route,
    bucket: &SimulatorBucket,
    classifier: &dyn AlphaSourceClassifier,
) -> Result<Vec<Vec<SwapInfo>>, AlphaFeeError> {
    let mut scratch = bucket.clone();
    let outcome = walk_route(route, &mut scratch, classifier, &mut NoReduction)?;

    let mut route_info = outcome.route_info;
    for (path, infos) in route.paths.iter().zip(route_info.iter_mut()) {
        if let Some(last) = infos.last_mut() {
            last.amount_out = path.amount_out.clone();
        }
    }
    Ok(route_info)
}

/// Keep a reduction strictly below the swap output, scaling its USD value along.
fn bound_reduction(proposed: StepReduction, amount_out: &BigUint) -> StepReduction {
    let amount = clamp_reduction(proposed.amount.clone(), amount_out);
    if amount == proposed.amount {
        return proposed;
    }

    let proposed_f = amount_to_f64(&proposed.amount);
    let amount_usd = if proposed_f > 0.0 {
        proposed.amount_usd * amount_to_f64(&amount) / proposed_f
    } else {
        0.0
    };
    StepReduction { amount, amount_usd }
}

/// Apply a swap effect on private copies of the pool and its swap limit.
fn apply_effect_guarded(
    bucket: &mut SimulatorBucket,
    pool_id: &str,
    exchange: &str,
    effect: &SwapEffect,
) -> Result<(), AlphaFeeError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| bucket.update_balance(pool_id, effect)));

    let message = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => e.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    let pool = format!("{}/{}", exchange, pool_id);
    tracing::warn!(pool = %pool, error = %message, "refresh path failed");
    Err(AlphaFeeError::PanicRefreshPath { pool, message })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
