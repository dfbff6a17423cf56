//! Proportional Planner
//!
//! The gap between the best route and the AMM reference is split across alpha
//! paths by their share of alpha-path output. Inside a path, every alpha swap
//! keeps the same multiplicative rate so that chaining them reproduces the
//! path reduction; sources configured with a smaller reduction factor give up
//! a correspondingly smaller part of it.

use std::sync::Arc;

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::AlphaFeeConfig;

use crate::calculator::{
    mul_bps, path_keep_rate, saturating_sub, scale_by_rate, source_keep_rate,
};
use crate::classifier::{count_alpha_sources, path_has_alpha_source, AlphaSourceClassifier};
use crate::default_route;
use crate::eligibility::{check_route, ensure_covers_amm};
use crate::fair_price::FairPriceOracle;
use crate::resimulate::{project_route, walk_route, StepReduction, SwapReducer, SwapStep};
use crate::state::{
    AlphaFee, AlphaFeeError, AlphaFeeParams, DefaultAlphaFeeParams, Path, PathReduction, SwapInfo,
};

pub struct ProportionalPlanner {
    pub(crate) config: AlphaFeeConfig,
    pub(crate) classifier: Arc<dyn AlphaSourceClassifier>,
    /// Cap factor for over-subscribed paths and fallback per-source factor
    pub(crate) primary_factor: f64,
}

impl ProportionalPlanner {
    pub fn new(config: AlphaFeeConfig, classifier: Arc<dyn AlphaSourceClassifier>) -> Self {
        let primary_factor = config.reduction_config.primary_reduction_factor();
        Self {
            config,
            classifier,
            primary_factor,
        }
    }

    /// Re-simulate the best route on `params.bucket`, reducing every alpha path.
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
        tracing::debug!(
            paths = path_reductions.len(),
            delta = %delta,
            "proportional path reductions"
        );

        let mut reducer = ProportionalReducer {
            planner: self,
            route_info: &route_info,
            path_reductions: &path_reductions,
            oracle: FairPriceOracle::new(&self.config.whitelist_prices, prices),
            cursor: 0,
            keep_rate: 1.0,
            alpha_swaps: 0,
        };
        let outcome = walk_route(best_route, &mut bucket, classifier, &mut reducer)?;
        ensure_covers_amm(&outcome.amount_out, outcome.swap_reductions.len(), &amm_amount)?;

        Ok(AlphaFee {
            amm_amount,
            swap_reductions: outcome.swap_reductions,
        })
    }

    /// Price a cached route summary without a live simulator.
    pub fn calculate_default(&self, params: DefaultAlphaFeeParams<'_>) -> Result<AlphaFee, AlphaFeeError> {
        default_route::calculate(self, params)
    }

    /// Split `delta` across alpha paths by output share.
    ///
    /// A share larger than the path's own output is capped at the primary
    /// reduction factor of that output.
    pub fn reduction_per_path(&self, route_info: &[Vec<SwapInfo>], delta: &BigUint) -> Vec<PathReduction> {
        let classifier = self.classifier.as_ref();
        let alpha_paths: Vec<(usize, &BigUint)> = route_info
            .iter()
            .enumerate()
            .filter(|(_, path)| path_has_alpha_source(classifier, path))
            .filter_map(|(idx, path)| path.last().map(|swap| (idx, &swap.amount_out)))
            .collect();

        let total: BigUint = alpha_paths.iter().map(|(_, out)| *out).sum();
        if total.is_zero() {
            return Vec::new();
        }

        // fractional bps are dropped, as for every integer cap
        let cap_bps = self.primary_factor.max(0.0) as u64;
        alpha_paths
            .into_iter()
            .map(|(path_idx, path_out)| {
                let mut reduce_amount = delta * path_out / &total;
                if reduce_amount > *path_out {
                    reduce_amount = mul_bps(path_out, cap_bps);
                }
                PathReduction {
                    path_idx,
                    reduce_amount,
                }
            })
            .collect()
    }

    /// Reduction factor of an alpha source, falling back to the primary factor.
    pub fn source_factor(&self, exchange: &str) -> f64 {
        self.config
            .reduction_config
            .reduction_factor_in_bps
            .get(exchange)
            .copied()
            .unwrap_or(self.primary_factor)
    }

    /// Output kept by one alpha swap of a path reduced at `path_keep_rate`.
    pub(crate) fn reduced_output(
        &self,
        amount_out: &BigUint,
        path_keep_rate: f64,
        alpha_swaps: usize,
        exchange: &str,
    ) -> BigUint {
        let rate = source_keep_rate(path_keep_rate, alpha_swaps, self.source_factor(exchange));
        scale_by_rate(amount_out, rate)
    }
}

struct ProportionalReducer<'a> {
    planner: &'a ProportionalPlanner,
    route_info: &'a [Vec<SwapInfo>],
    /// Sorted by path index
    path_reductions: &'a [PathReduction],
    oracle: FairPriceOracle<'a>,
    cursor: usize,
    keep_rate: f64,
    alpha_swaps: usize,
}

impl SwapReducer for ProportionalReducer<'_> {
    fn enter_path(&mut self, path_idx: usize, path: &Path) -> bool {
        let Some(info) = self.route_info.get(path_idx) else {
            return false;
        };
        self.alpha_swaps = count_alpha_sources(self.planner.classifier.as_ref(), info);
        if self.alpha_swaps == 0 {
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
        self.keep_rate = path_keep_rate(&reduction.reduce_amount, &path.amount_out, self.alpha_swaps);
        true
    }

    fn reduce(&mut self, step: &SwapStep<'_>) -> StepReduction {
        let new_out = self.planner.reduced_output(
            step.amount_out,
            self.keep_rate,
            self.alpha_swaps,
            step.exchange,
        );
        let amount = saturating_sub(step.amount_out, &new_out);
        let amount_usd = self
            .oracle
            .usd_value(step.token_in, step.token_out, step.amount_in, &new_out, &amount);
        StepReduction { amount, amount_usd }
    }
}
