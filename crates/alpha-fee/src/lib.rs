//! Alpha-Fee Planning
//!
//! Decides how much value can be taken from swaps routed through RFQ/PMM
//! ("alpha") liquidity without leaving the user worse off than an AMM-only
//! route, and where along the route to take it.
//!
//! Planners:
//! - [`LegacyPlanner`]: single fee on the alpha swap closest to its path end
//! - [`ProportionalPlanner`]: per-path share of the gap to the AMM route
//! - [`SurplusPlanner`]: merit-order surplus, weighted across alpha swaps
//!
//! Without a live simulator, [`ProportionalPlanner::calculate_default`]
//! prices a cached route summary by ratio approximation.

pub mod calculator;
pub mod classifier;
pub mod default_route;
pub mod eligibility;
pub mod fair_price;
pub mod legacy;
pub mod planner;
pub mod proportional;
pub mod resimulate;
pub mod state;
pub mod summary;
pub mod surplus;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports
pub use classifier::{AlphaSourceClassifier, StaticAllowList};
pub use fair_price::{calc_amount_price, FairPriceOracle};
pub use legacy::LegacyPlanner;
pub use planner::AlphaFeePlanner;
pub use proportional::ProportionalPlanner;
pub use state::{
    AlphaFee, AlphaFeeError, AlphaFeeParams, AlphaFeeResult, DefaultAlphaFeeParams,
    LegacyAlphaFee, Path, PathReduction, Route, SwapInfo, SwapReduction,
};
pub use summary::{RouteSummary, SummaryAlphaFee, SummarySwap, SummarySwapReduction};
pub use surplus::SurplusPlanner;
