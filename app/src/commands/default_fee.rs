use std::path::Path;

use alpha_fee::{
    AlphaFee, AlphaFeePlanner, AlphaFeeResult, DefaultAlphaFeeParams, LegacyAlphaFee,
    RouteSummary, SwapReduction,
};
use router_core::PriceBook;
use serde_json::Value;

use super::{load_config, read_json};

/// Fill `alphaFee` on a route summary; an ineligible summary is returned unchanged.
pub fn run(summary_path: &Path, config_path: &Path, prices_path: Option<&Path>) -> anyhow::Result<Value> {
    let config = load_config(config_path)?;
    let summary: RouteSummary = read_json(summary_path)?;
    tracing::info!(
        paths = summary.route.len(),
        swaps = summary.swap_count(),
        merge = summary.is_merge_route(),
        "pricing route summary"
    );
    let prices: PriceBook = match prices_path {
        Some(path) => read_json(path)?,
        None => PriceBook::new(),
    };

    let planner = AlphaFeePlanner::from_config(config);
    let result = planner.calculate_default(DefaultAlphaFeeParams {
        route_summary: &summary,
        prices: &prices,
    });

    let summary = match result {
        Ok(AlphaFeeResult::Swaps(fee)) => summary.with_alpha_fee(&fee),
        Ok(AlphaFeeResult::Legacy(fee)) => {
            let fee = legacy_as_swaps(&summary, fee);
            summary.with_alpha_fee(&fee)
        }
        Err(e) => {
            tracing::warn!(code = e.error_code(), error = %e, "summary left without alpha fee");
            summary
        }
    };
    Ok(serde_json::to_value(&summary)?)
}

/// A single-swap fee as a one-entry reduction list.
fn legacy_as_swaps(summary: &RouteSummary, fee: LegacyAlphaFee) -> AlphaFee {
    let token_in = summary
        .swap_at(fee.executed_id)
        .map(|swap| swap.token_in.clone())
        .unwrap_or_default();

    AlphaFee {
        amm_amount: fee.amm_amount.unwrap_or_default(),
        swap_reductions: vec![SwapReduction {
            executed_id: fee.executed_id,
            pool_address: fee.pool,
            token_in,
            token_out: fee.token,
            reduce_amount: fee.amount,
            reduce_amount_usd: fee.amount_usd,
        }],
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn demo(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos").join(name)
    }

    #[test]
    fn test_demo_summary_gets_alpha_fee() {
        let output = run(
            &demo("summary.json"),
            &demo("config.json"),
            Some(&demo("prices.json")),
        )
        .unwrap();

        assert_eq!(output["alphaFee"]["ammAmount"], "729000000");
        let reductions = output["alphaFee"]["swapReductions"].as_array().unwrap();
        assert_eq!(reductions.len(), 2);
        assert_eq!(reductions[0]["Pool"], "t1_a_b");
        assert_eq!(reductions[1]["Token"], "c");
        // unknown summary fields survive
        assert_eq!(output["gas"], "250000");
    }

    #[test]
    fn test_legacy_fee_maps_to_single_reduction() {
        let summary: RouteSummary = read_json(&demo("summary.json")).unwrap();
        let fee = LegacyAlphaFee {
            token: "c".into(),
            amount: 81_000_000u64.into(),
            amount_usd: 81.0,
            pool: "t1_b_c".into(),
            amm_amount: None,
            path_id: 0,
            swap_id: 1,
            executed_id: 1,
        };
        let fee = legacy_as_swaps(&summary, fee);
        assert_eq!(fee.swap_reductions.len(), 1);
        assert_eq!(fee.swap_reductions[0].token_in, "b");
        assert_eq!(fee.amm_amount, num_bigint::BigUint::default());
    }
}
