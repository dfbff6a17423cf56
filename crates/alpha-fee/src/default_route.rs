//! Default alpha fee over a cached route summary.
//!
//! No simulator is available here, so every swap is re-derived from its own
//! recorded ratio. The fee target is a flat share of the summary output.
//!
//! Routes whose paths all run from the route's input token to its output token
//! reuse the proportional split. Merge routes, where paths feed each other
//! through intermediate tokens, search for the largest uniform cut that still
//! leaves `amount_out - target`.

use std::collections::{HashMap, VecDeque};

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::BASIS_POINT;

use crate::calculator::{clamp_reduction, mul_bps, path_keep_rate, ratio_amount_out, saturating_sub};
use crate::classifier::{count_alpha_sources, AlphaSourceClassifier};
use crate::eligibility::ensure_alpha_source;
use crate::fair_price::FairPriceOracle;
use crate::proportional::ProportionalPlanner;
use crate::state::{AlphaFee, AlphaFeeError, DefaultAlphaFeeParams, SwapInfo, SwapReduction};

/// A swap re-derived by ratio, with the part withheld from its output
#[derive(Debug, Clone)]
struct RatioReduction {
    path_idx: usize,
    swap_idx: usize,
    executed_id: usize,
    amount_in: BigUint,
    amount_out: BigUint,
    reduce_amount: BigUint,
}

pub(crate) fn calculate(
    planner: &ProportionalPlanner,
    params: DefaultAlphaFeeParams<'_>,
) -> Result<AlphaFee, AlphaFeeError> {
    let DefaultAlphaFeeParams {
        route_summary,
        prices,
    } = params;
    let classifier = planner.classifier.as_ref();

    let route_info = route_summary.route_info();
    ensure_alpha_source(classifier, &route_info)?;

    let target = default_target(
        &route_summary.amount_out,
        planner.config.reduction_config.default_alpha_fee_percentage_bps,
    );
    if target.is_zero() {
        return Err(AlphaFeeError::not_exists("default alpha fee is zero"));
    }
    let amm_amount = &route_summary.amount_out - &target;

    let mut reductions = if route_summary.is_merge_route() {
        merge_route_reductions(classifier, &route_info, &route_summary.token_out, &amm_amount)?
    } else {
        proportional_reductions(planner, &route_info, &target)
    };
    if reductions.is_empty() {
        return Err(AlphaFeeError::not_exists("no alpha swap can carry the default fee"));
    }
    reductions.sort_by_key(|r| r.executed_id);

    let oracle = FairPriceOracle::new(&planner.config.whitelist_prices, prices);
    let swap_reductions = reductions
        .into_iter()
        .map(|r| {
            let swap = &route_info[r.path_idx][r.swap_idx];
            let kept = &r.amount_out - &r.reduce_amount;
            let reduce_amount_usd = oracle.usd_value(
                &swap.token_in,
                &swap.token_out,
                &r.amount_in,
                &kept,
                &r.reduce_amount,
            );
            SwapReduction {
                executed_id: r.executed_id,
                pool_address: swap.pool.clone(),
                token_in: swap.token_in.clone(),
                token_out: swap.token_out.clone(),
                reduce_amount: r.reduce_amount,
                reduce_amount_usd,
            }
        })
        .collect();

    Ok(AlphaFee {
        amm_amount,
        swap_reductions,
    })
}

/// `amount_out * trunc(bps) / 10000`
fn default_target(amount_out: &BigUint, percentage_bps: f64) -> BigUint {
    mul_bps(amount_out, percentage_bps.max(0.0).trunc() as u64)
}

/// Flat execution index of the first swap of every path.
fn executed_offsets(route_info: &[Vec<SwapInfo>]) -> Vec<usize> {
    route_info
        .iter()
        .scan(0, |next, path| {
            let offset = *next;
            *next += path.len();
            Some(offset)
        })
        .collect()
}

fn proportional_reductions(
    planner: &ProportionalPlanner,
    route_info: &[Vec<SwapInfo>],
    target: &BigUint,
) -> Vec<RatioReduction> {
    let classifier = planner.classifier.as_ref();
    let offsets = executed_offsets(route_info);
    let mut reductions = Vec::new();

    for path_reduction in planner.reduction_per_path(route_info, target) {
        let path_idx = path_reduction.path_idx;
        let path = &route_info[path_idx];
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            continue;
        };

        let alpha_swaps = count_alpha_sources(classifier, path);
        let keep_rate = path_keep_rate(&path_reduction.reduce_amount, &last.amount_out, alpha_swaps);
        let mut amount_in = first.amount_in.clone();

        for (swap_idx, swap) in path.iter().enumerate() {
            let amount_out = ratio_amount_out(&amount_in, &swap.amount_in, &swap.amount_out);
            let mut next_amount_in = amount_out.clone();

            if classifier.is_alpha_fee_source(&swap.exchange) {
                let kept = planner.reduced_output(&amount_out, keep_rate, alpha_swaps, &swap.exchange);
                let reduce_amount = clamp_reduction(saturating_sub(&amount_out, &kept), &amount_out);
                next_amount_in = &amount_out - &reduce_amount;
                reductions.push(RatioReduction {
                    path_idx,
                    swap_idx,
                    executed_id: offsets[path_idx] + swap_idx,
                    amount_in: amount_in.clone(),
                    amount_out,
                    reduce_amount,
                });
            }
            amount_in = next_amount_in;
        }
    }

    reductions
}

fn merge_route_reductions(
    classifier: &dyn AlphaSourceClassifier,
    route_info: &[Vec<SwapInfo>],
    token_out: &str,
    amm_amount: &BigUint,
) -> Result<Vec<RatioReduction>, AlphaFeeError> {
    let order = execution_order(route_info)?;
    let reduce_bps = search_reduce_bps(classifier, route_info, &order, token_out, amm_amount);
    if reduce_bps == 0 {
        return Err(AlphaFeeError::not_exists(
            "merge route cannot carry the default fee at any reduction",
        ));
    }
    tracing::debug!(reduce_bps, "merge route default reduction");

    Ok(simulate_merge(classifier, route_info, &order, token_out, reduce_bps).1)
}

/// Largest `reduce_bps` in `[0, 10000]` whose output still covers `amm_amount`.
///
/// Output only shrinks as `reduce_bps` grows, so a binary search is exact.
fn search_reduce_bps(
    classifier: &dyn AlphaSourceClassifier,
    route_info: &[Vec<SwapInfo>],
    order: &[usize],
    token_out: &str,
    amm_amount: &BigUint,
) -> u64 {
    let (mut lo, mut hi) = (0u64, BASIS_POINT as u64);
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        let (total, _) = simulate_merge(classifier, route_info, order, token_out, mid);
        if total >= *amm_amount {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Path order in which every token is fully produced before it is spent.
///
/// A path starting at token `T` runs after every path finishing in `T`.
/// Ready paths keep their route order.
fn execution_order(route_info: &[Vec<SwapInfo>]) -> Result<Vec<usize>, AlphaFeeError> {
    let mut ends = Vec::with_capacity(route_info.len());
    for path in route_info {
        match (path.first(), path.last()) {
            (Some(first), Some(last)) => ends.push((first.token_in.as_str(), last.token_out.as_str())),
            _ => {
                return Err(AlphaFeeError::InvalidSwap {
                    pool: String::new(),
                    reason: "empty path in merge route".to_string(),
                })
            }
        }
    }

    let mut pending: Vec<usize> = ends
        .iter()
        .enumerate()
        .map(|(idx, (start, _))| {
            ends.iter()
                .enumerate()
                .filter(|(other, (_, end))| *other != idx && end == start)
                .count()
        })
        .collect();

    let mut ready: VecDeque<usize> = (0..ends.len()).filter(|idx| pending[*idx] == 0).collect();
    let mut order = Vec::with_capacity(ends.len());
    while let Some(idx) = ready.pop_front() {
        order.push(idx);
        let produced = ends[idx].1;
        for (next, (start, _)) in ends.iter().enumerate() {
            if next != idx && *start == produced {
                pending[next] -= 1;
                if pending[next] == 0 {
                    ready.push_back(next);
                }
            }
        }
    }

    if order.len() != ends.len() {
        return Err(AlphaFeeError::InvalidSwap {
            pool: route_info
                .iter()
                .enumerate()
                .find(|(idx, _)| !order.contains(idx))
                .and_then(|(_, path)| path.first())
                .map(|swap| swap.pool.clone())
                .unwrap_or_default(),
            reason: "merge route paths form a cycle".to_string(),
        });
    }
    Ok(order)
}

/// Ratio-simulate the merge route with `reduce_bps` taken at every alpha swap.
///
/// Paths spending an intermediate token are scaled by how much of it the
/// upstream paths still produce. Returns the output in `token_out` and the
/// non-zero reductions.
fn simulate_merge(
    classifier: &dyn AlphaSourceClassifier,
    route_info: &[Vec<SwapInfo>],
    order: &[usize],
    token_out: &str,
    reduce_bps: u64,
) -> (BigUint, Vec<RatioReduction>) {
    let offsets = executed_offsets(route_info);
    let mut recorded: HashMap<&str, BigUint> = HashMap::new();
    let mut produced: HashMap<&str, BigUint> = HashMap::new();
    let mut reductions = Vec::new();

    for &path_idx in order {
        let path = &route_info[path_idx];
        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            continue;
        };

        let start = first.token_in.as_str();
        let mut amount_in = match (recorded.get(start), produced.get(start)) {
            (Some(rec), Some(new)) if !rec.is_zero() => &first.amount_in * new / rec,
            _ => first.amount_in.clone(),
        };

        for (swap_idx, swap) in path.iter().enumerate() {
            let amount_out = ratio_amount_out(&amount_in, &swap.amount_in, &swap.amount_out);
            let mut next_amount_in = amount_out.clone();

            if reduce_bps > 0 && classifier.is_alpha_fee_source(&swap.exchange) {
                let reduce_amount = clamp_reduction(mul_bps(&amount_out, reduce_bps), &amount_out);
                if !reduce_amount.is_zero() {
                    next_amount_in = &amount_out - &reduce_amount;
                    reductions.push(RatioReduction {
                        path_idx,
                        swap_idx,
                        executed_id: offsets[path_idx] + swap_idx,
                        amount_in: amount_in.clone(),
                        amount_out,
                        reduce_amount,
                    });
                }
            }
            amount_in = next_amount_in;
        }

        let end = last.token_out.as_str();
        *recorded.entry(end).or_default() += &last.amount_out;
        *produced.entry(end).or_default() += amount_in;
    }

    let total = produced.remove(token_out).unwrap_or_default();
    (total, reductions)
}
