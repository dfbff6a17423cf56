//! Pool Simulation
//!
//! The stateful quoting contract every liquidity source implements, the
//! per-request simulator bucket that owns pool state by id, and a few
//! reference pools (constant product, fixed rate, RFQ inventory).

pub mod bucket;
pub mod calculator;
pub mod constant_product;
pub mod fixed_rate;
pub mod rfq;
pub mod simulator;
pub mod state;

// Re-exports
pub use bucket::SimulatorBucket;
pub use calculator::{calculate_output, scale_by_rate};
pub use constant_product::ConstantProductPool;
pub use fixed_rate::FixedRatePool;
pub use rfq::RfqPool;
pub use simulator::PoolSimulator;
pub use state::{PoolError, PoolSpec, Quote, SwapEffect, SwapLimit, TokenAmount};
