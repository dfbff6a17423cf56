//! Alpha-Fee State Types
//!
//! Routes as produced by the path finder, per-swap projections, reduction
//! results and planner errors.

use num_bigint::BigUint;
use pool_sim::SimulatorBucket;
use router_core::{decimal, PriceBook};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::summary::RouteSummary;

/// One chain of swaps from the route's input token to its output token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Path {
    #[serde(with = "decimal")]
    pub amount_in: BigUint,
    #[serde(with = "decimal")]
    pub amount_out: BigUint,
    /// Pool ids in execution order
    pub pools_order: Vec<String>,
    /// `pools_order.len() + 1` tokens; pool `i` swaps token `i` into token `i + 1`
    pub tokens_order: Vec<String>,
}

impl Path {
    /// Reject paths whose token chain does not line up with their pools.
    pub fn validate(&self) -> Result<(), AlphaFeeError> {
        if self.pools_order.is_empty() || self.tokens_order.len() != self.pools_order.len() + 1 {
            return Err(AlphaFeeError::InvalidSwap {
                pool: self.pools_order.first().cloned().unwrap_or_default(),
                reason: format!(
                    "{} pools with {} tokens",
                    self.pools_order.len(),
                    self.tokens_order.len()
                ),
            });
        }
        Ok(())
    }
}

/// A multi-path route selected by the path finder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "decimal")]
    pub amount_in: BigUint,
    #[serde(with = "decimal")]
    pub amount_out: BigUint,
    /// USD value of `amount_out`; zero when unpriced
    #[serde(default)]
    pub amount_out_price: f64,
    #[serde(default)]
    pub gas_fee_price: f64,
    #[serde(default)]
    pub l1_gas_fee_price: f64,
    pub paths: Vec<Path>,
}

impl Route {
    /// Number of swaps across every path, i.e. the size of the execution order.
    pub fn swap_count(&self) -> usize {
        self.paths.iter().map(|p| p.pools_order.len()).sum()
    }
}

/// One swap leg projected from a live path or a cached route summary
#[derive(Debug, Clone, PartialEq)]
pub struct SwapInfo {
    pub pool: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: BigUint,
    pub amount_out: BigUint,
    pub exchange: String,
}

/// Amount to take from a whole path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReduction {
    pub path_idx: usize,
    pub reduce_amount: BigUint,
}

/// Amount withheld from one swap's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapReduction {
    /// Position of the swap in path-major, swap-minor execution order
    pub executed_id: usize,
    pub pool_address: String,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "decimal")]
    pub reduce_amount: BigUint,
    pub reduce_amount_usd: f64,
}

/// Per-swap alpha fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlphaFee {
    /// AMM reference the route must still beat
    #[serde(with = "decimal")]
    pub amm_amount: BigUint,
    pub swap_reductions: Vec<SwapReduction>,
}

/// Single-swap alpha fee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAlphaFee {
    pub token: String,
    #[serde(with = "decimal")]
    pub amount: BigUint,
    #[serde(default)]
    pub amount_usd: f64,
    pub pool: String,
    #[serde(with = "decimal::option", default)]
    pub amm_amount: Option<BigUint>,
    pub path_id: usize,
    pub swap_id: usize,
    pub executed_id: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AlphaFeeResult {
    Swaps(AlphaFee),
    Legacy(LegacyAlphaFee),
}

/// Input of a live planner run.
///
/// The bucket is moved in: the walk mutates it, so each call needs its own
/// (`SimulatorBucket::fresh` is cheap).
#[derive(Debug)]
pub struct AlphaFeeParams<'a> {
    pub best_route: &'a Route,
    pub best_amm_route: Option<&'a Route>,
    pub prices: &'a PriceBook,
    pub bucket: SimulatorBucket,
}

/// Input of a planner run over a cached route summary
#[derive(Debug, Clone, Copy)]
pub struct DefaultAlphaFeeParams<'a> {
    pub route_summary: &'a RouteSummary,
    pub prices: &'a PriceBook,
}

/// Alpha-fee planning errors
#[derive(Debug, Error)]
pub enum AlphaFeeError {
    #[error("Invalid swap at {pool}: {reason}")]
    InvalidSwap { pool: String, reason: String },

    #[error("Empty amount out from {pool}")]
    CalcAmountOutEmpty { pool: String },

    #[error("Alpha fee does not exist: {reason}")]
    AlphaFeeNotExists { reason: String },

    #[error("Route has no alpha fee source")]
    RouteHasNoAlphaFeeDex,

    #[error("Alpha swap at {pool} pays {amount_out}, not enough to cover fee {fee}")]
    AlphaSwapInsufficientForFee {
        pool: String,
        amount_out: BigUint,
        fee: BigUint,
    },

    #[error("Applying alpha fee yields {amount_out}, less than AMM amount {amm_amount}")]
    FeeYieldsLessThanAmm {
        amount_out: BigUint,
        amm_amount: BigUint,
    },

    #[error("Refreshing path panicked at {pool}: {message}")]
    PanicRefreshPath { pool: String, message: String },
}

impl AlphaFeeError {
    pub(crate) fn not_exists(reason: impl Into<String>) -> Self {
        Self::AlphaFeeNotExists {
            reason: reason.into(),
        }
    }

    /// Get a stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSwap { .. } => "invalid_swap",
            Self::CalcAmountOutEmpty { .. } => "calc_amount_out_empty",
            Self::AlphaFeeNotExists { .. } => "alpha_fee_not_exists",
            Self::RouteHasNoAlphaFeeDex => "route_has_no_alpha_fee_dex",
            Self::AlphaSwapInsufficientForFee { .. } => "alpha_swap_insufficient_for_fee",
            Self::FeeYieldsLessThanAmm { .. } => "fee_yields_less_than_amm",
            Self::PanicRefreshPath { .. } => "panic_refresh_path",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_path(pools: &[&str], tokens: &[&str]) -> Path {
        Path {
            amount_in: BigUint::from(100u32),
            amount_out: BigUint::from(90u32),
            pools_order: pools.iter().map(|s| s.to_string()).collect(),
            tokens_order: tokens.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_path_validation() {
        assert!(make_path(&["p1", "p2"], &["a", "b", "c"]).validate().is_ok());

        let err = make_path(&["p1", "p2"], &["a", "b"]).validate().unwrap_err();
        assert_eq!(err.error_code(), "invalid_swap");
        assert!(make_path(&[], &["a"]).validate().is_err());
    }

    #[test]
    fn test_route_swap_count() {
        let route = Route {
            token_in: "a".into(),
            token_out: "c".into(),
            amount_in: BigUint::from(200u32),
            amount_out: BigUint::from(180u32),
            amount_out_price: 0.0,
            gas_fee_price: 0.0,
            l1_gas_fee_price: 0.0,
            paths: vec![
                make_path(&["p1", "p2"], &["a", "b", "c"]),
                make_path(&["p3"], &["a", "c"]),
            ],
        };
        assert_eq!(route.swap_count(), 3);
    }

    #[test]
    fn test_route_json_shape() {
        let json = r#"{
            "tokenIn": "a",
            "tokenOut": "b",
            "amountIn": "1000",
            "amountOut": 900,
            "amountOutPrice": 0.9,
            "paths": [
                {"amountIn": "1000", "amountOut": "900", "poolsOrder": ["p"], "tokensOrder": ["a", "b"]}
            ]
        }"#;
        let route: Route = serde_json::from_str(json).unwrap();
        assert_eq!(route.amount_out, BigUint::from(900u32));
        assert_eq!(route.gas_fee_price, 0.0);
        assert_eq!(route.paths[0].pools_order, vec!["p".to_string()]);
    }

    #[test]
    fn test_result_serialization_tags_kind() {
        let result = AlphaFeeResult::Swaps(AlphaFee {
            amm_amount: BigUint::from(5u32),
            swap_reductions: vec![],
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["kind"], "swaps");
        assert_eq!(json["ammAmount"], "5");
    }
}
