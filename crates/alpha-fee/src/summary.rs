//! Serialized route summary, as stored and handed to route execution.
//!
//! Fields the planners don't read (prices, gas, pool extras) are carried
//! through untouched so a summary round-trips.

use std::collections::{BTreeMap, HashSet};

use num_bigint::BigUint;
use router_core::decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::{AlphaFee, SwapInfo};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySwap {
    pub pool: String,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "decimal")]
    pub swap_amount: BigUint,
    #[serde(with = "decimal")]
    pub amount_out: BigUint,
    pub exchange: String,
    #[serde(default)]
    pub pool_type: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummarySwapReduction {
    pub executed_id: usize,
    pub pool: String,
    /// Output token of the reduced swap
    pub token: String,
    #[serde(with = "decimal")]
    pub reduce_amount: BigUint,
    #[serde(default)]
    pub reduce_amount_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryAlphaFee {
    #[serde(with = "decimal")]
    pub amm_amount: BigUint,
    #[serde(default)]
    pub swap_reductions: Vec<SummarySwapReduction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub token_in: String,
    #[serde(with = "decimal")]
    pub amount_in: BigUint,
    pub token_out: String,
    #[serde(with = "decimal")]
    pub amount_out: BigUint,
    /// Paths in execution order; each path is a chain of swaps
    pub route: Vec<Vec<SummarySwap>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_fee: Option<SummaryAlphaFee>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RouteSummary {
    /// Project every recorded swap onto the uniform swap shape.
    pub fn route_info(&self) -> Vec<Vec<SwapInfo>> {
        self.route
            .iter()
            .map(|path| {
                path.iter()
                    .map(|swap| SwapInfo {
                        pool: swap.pool.clone(),
                        token_in: swap.token_in.clone(),
                        token_out: swap.token_out.clone(),
                        amount_in: swap.swap_amount.clone(),
                        amount_out: swap.amount_out.clone(),
                        exchange: swap.exchange.clone(),
                    })
                    .collect()
            })
            .collect()
    }

    /// Paths that start or end on different tokens feed into each other.
    pub fn is_merge_route(&self) -> bool {
        let starts: HashSet<&str> = self
            .route
            .iter()
            .filter_map(|path| path.first())
            .map(|swap| swap.token_in.as_str())
            .collect();
        let ends: HashSet<&str> = self
            .route
            .iter()
            .filter_map(|path| path.last())
            .map(|swap| swap.token_out.as_str())
            .collect();
        starts.len() > 1 || ends.len() > 1
    }

    pub fn swap_count(&self) -> usize {
        self.route.iter().map(Vec::len).sum()
    }

    /// Swap at a flat execution index.
    pub fn swap_at(&self, executed_id: usize) -> Option<&SummarySwap> {
        self.route.iter().flatten().nth(executed_id)
    }

    /// Copy of the summary carrying `alpha_fee` in wire form.
    pub fn with_alpha_fee(&self, alpha_fee: &AlphaFee) -> Self {
        let swap_reductions = alpha_fee
            .swap_reductions
            .iter()
            .map(|reduction| SummarySwapReduction {
                executed_id: reduction.executed_id,
                pool: reduction.pool_address.clone(),
                token: reduction.token_out.clone(),
                reduce_amount: reduction.reduce_amount.clone(),
                reduce_amount_usd: reduction.reduce_amount_usd,
            })
            .collect();

        Self {
            alpha_fee: Some(SummaryAlphaFee {
                amm_amount: alpha_fee.amm_amount.clone(),
                swap_reductions,
            }),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SwapReduction;

    const SUMMARY: &str = r#"{
        "tokenIn": "a",
        "amountIn": "100000000000000000000000",
        "tokenOut": "c",
        "amountOut": 180,
        "gasUsd": 0.88,
        "route": [
            [
                {"pool": "p1", "tokenIn": "a", "tokenOut": "b", "swapAmount": "100000000000000000000000",
                 "amountOut": "90", "exchange": "pmm-2", "poolType": "pmm-2", "extra": {"bAmt": "1"}},
                {"pool": "p2", "tokenIn": "b", "tokenOut": "c", "swapAmount": "90",
                 "amountOut": "180", "exchange": "uniswapv3"}
            ]
        ]
    }"#;

    #[test]
    fn test_summary_parses_large_amounts_and_keeps_extras() {
        let summary: RouteSummary = serde_json::from_str(SUMMARY).unwrap();
        assert_eq!(
            summary.amount_in,
            "100000000000000000000000".parse::<BigUint>().unwrap()
        );
        assert_eq!(summary.amount_out, BigUint::from(180u32));
        assert_eq!(summary.extra["gasUsd"], serde_json::json!(0.88));
        assert_eq!(summary.route[0][0].extra["extra"]["bAmt"], "1");
        assert_eq!(summary.route[0][1].pool_type, "");
        assert!(summary.alpha_fee.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["amountIn"], "100000000000000000000000");
        assert_eq!(json["gasUsd"], serde_json::json!(0.88));
        assert!(json.get("alphaFee").is_none());
    }

    #[test]
    fn test_route_info_projection() {
        let summary: RouteSummary = serde_json::from_str(SUMMARY).unwrap();
        let info = summary.route_info();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0][1].amount_in, BigUint::from(90u32));
        assert_eq!(info[0][0].exchange, "pmm-2");
        assert_eq!(summary.swap_count(), 2);
        assert_eq!(summary.swap_at(1).map(|s| s.pool.as_str()), Some("p2"));
        assert!(!summary.is_merge_route());
    }

    #[test]
    fn test_with_alpha_fee_writes_wire_shape() {
        let summary: RouteSummary = serde_json::from_str(SUMMARY).unwrap();
        let fee = AlphaFee {
            amm_amount: BigUint::from(170u32),
            swap_reductions: vec![SwapReduction {
                executed_id: 0,
                pool_address: "p1".into(),
                token_in: "a".into(),
                token_out: "b".into(),
                reduce_amount: BigUint::from(5u32),
                reduce_amount_usd: 0.5,
            }],
        };

        let with_fee = summary.with_alpha_fee(&fee);
        let json = serde_json::to_value(&with_fee).unwrap();
        assert_eq!(json["alphaFee"]["ammAmount"], "170");
        let reduction = &json["alphaFee"]["swapReductions"][0];
        assert_eq!(reduction["ExecutedId"], 0);
        assert_eq!(reduction["Pool"], "p1");
        assert_eq!(reduction["Token"], "b");
        assert_eq!(reduction["ReduceAmount"], "5");
        assert_eq!(reduction["ReduceAmountUsd"], 0.5);

        let back: RouteSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, with_fee);
    }
}
