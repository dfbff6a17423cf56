//! Live-route scenario file: reference pools, swap limits, routes and prices.

use std::collections::HashMap;

use alpha_fee::Route;
use pool_sim::{PoolSpec, SimulatorBucket, SwapLimit};
use router_core::PriceBook;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub pools: Vec<PoolSpec>,
    /// Keyed by exchange
    #[serde(default)]
    pub swap_limits: HashMap<String, SwapLimit>,
    pub best_route: Route,
    #[serde(default)]
    pub amm_route: Option<Route>,
    #[serde(default)]
    pub prices: PriceBook,
}

impl Scenario {
    /// Fresh bucket over the scenario's pools and limits.
    pub fn bucket(&self) -> SimulatorBucket {
        SimulatorBucket::from_specs(self.pools.clone(), self.swap_limits.clone())
    }
}
