//! Shared fixtures: fixed-rate pools, routes and configs.

use std::collections::{BTreeMap, HashMap};

use num_bigint::BigUint;
use pool_sim::{FixedRatePool, PoolSimulator, SimulatorBucket};
use router_core::{AlphaFeeConfig, AlphaFeeVersion, PriceBook, ReductionConfig};

use crate::classifier::StaticAllowList;
use crate::state::{Path, Route};

pub const ALPHA_SOURCE: &str = "kyber-pmm";
pub const LIGHT_WEIGHT_SOURCE: &str = "uniswap-v4-fairflow";
pub const NON_ALPHA_SOURCE: &str = "uniswapv3";

pub fn big(v: u64) -> BigUint {
    BigUint::from(v)
}

pub fn make_fixture_bucket() -> SimulatorBucket {
    let specs = [
        ("tshared_rate_1-1_a_b", "a", "b", 1.0, ALPHA_SOURCE),
        ("t1_rate0.9_a_b", "a", "b", 0.9, ALPHA_SOURCE),
        ("t1_rate0.9_b_c", "b", "c", 0.9, ALPHA_SOURCE),
        ("t2_rate1-1_a_b", "a", "b", 1.0, ALPHA_SOURCE),
        ("t2_rate2-3_b_c", "b", "c", 1.5, ALPHA_SOURCE),
        ("t2_rate3-4_c_d", "c", "d", 1.33, ALPHA_SOURCE),
        ("t3_rate2-3_b_c", "b", "c", 1.5, NON_ALPHA_SOURCE),
        ("t4_rate1-1_a_b", "a", "b", 1.0, NON_ALPHA_SOURCE),
        ("t4_rate1-1_b_c", "b", "c", 1.0, ALPHA_SOURCE),
        ("t4_rate1-1_a_b#2", "a", "b", 1.0, ALPHA_SOURCE),
        ("t4_rate1-1_b_c#2", "b", "c", 1.0, NON_ALPHA_SOURCE),
        ("t1_rate0.9_a_b_light_weight", "a", "b", 0.9, LIGHT_WEIGHT_SOURCE),
        ("tamm_rate1-1_a_b", "a", "b", 1.0, NON_ALPHA_SOURCE),
    ];

    let pools: HashMap<String, Box<dyn PoolSimulator>> = specs
        .into_iter()
        .map(|(id, token_in, token_out, rate, exchange)| {
            let pool: Box<dyn PoolSimulator> =
                Box::new(FixedRatePool::new(id, exchange, token_in, token_out, rate));
            (id.to_string(), pool)
        })
        .collect();

    SimulatorBucket::new(pools, HashMap::new())
}

pub fn make_path(amount_in: u64, amount_out: u64, pools: &[&str], tokens: &[&str]) -> Path {
    Path {
        amount_in: big(amount_in),
        amount_out: big(amount_out),
        pools_order: pools.iter().map(|s| s.to_string()).collect(),
        tokens_order: tokens.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn make_route(amount_in: u64, amount_out: u64, price: f64, paths: Vec<Path>) -> Route {
    let token_in = paths
        .first()
        .and_then(|p| p.tokens_order.first().cloned())
        .unwrap_or_else(|| "a".to_string());
    let token_out = paths
        .first()
        .and_then(|p| p.tokens_order.last().cloned())
        .unwrap_or_else(|| "c".to_string());

    Route {
        token_in,
        token_out,
        amount_in: big(amount_in),
        amount_out: big(amount_out),
        amount_out_price: price,
        gas_fee_price: 0.0,
        l1_gas_fee_price: 0.0,
        paths,
    }
}

/// Tokens `a` to `d`, six decimals, one dollar each.
pub fn make_prices() -> PriceBook {
    ["a", "b", "c", "d"]
        .into_iter()
        .fold(PriceBook::new(), |book, token| book.with_token(token, 6, 1.0))
}

pub fn make_config(version: AlphaFeeVersion) -> AlphaFeeConfig {
    let mut reduction_factor_in_bps = BTreeMap::new();
    reduction_factor_in_bps.insert(ALPHA_SOURCE.to_string(), 10000.0);

    let mut reduction_config = ReductionConfig {
        reduction_factor_in_bps,
        max_threshold_percentage_in_bps: 8000,
        min_different_threshold_bps: 0,
        min_different_threshold_usd: 0.001,
        ..ReductionConfig::default()
    };

    if version == AlphaFeeVersion::V3 {
        reduction_config
            .reduction_factor_in_bps
            .insert(LIGHT_WEIGHT_SOURCE.to_string(), 10000.0);
        reduction_config
            .weight_distribute_by_source
            .insert(ALPHA_SOURCE.to_string(), 100);
        reduction_config
            .weight_distribute_by_source
            .insert(LIGHT_WEIGHT_SOURCE.to_string(), 10);
    }

    AlphaFeeConfig {
        version,
        reduction_config,
        ..AlphaFeeConfig::default()
    }
}

pub fn make_classifier() -> StaticAllowList {
    StaticAllowList::from_config(&AlphaFeeConfig::default())
}

/// AMM-only reference route: a single 1:1 non-alpha swap.
pub fn make_amm_route(amount_out: u64, price: f64) -> Route {
    make_route(
        amount_out,
        amount_out,
        price,
        vec![make_path(amount_out, amount_out, &["tamm_rate1-1_a_b"], &["a", "b"])],
    )
}
