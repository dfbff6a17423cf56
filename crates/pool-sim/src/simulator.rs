//! The stateful quoting contract implemented by every liquidity source.

use crate::state::{PoolError, Quote, SwapEffect, SwapLimit, TokenAmount};

/// A per-pool quoting engine.
///
/// `quote` must not mutate; the state change it implies is carried in the
/// returned effect and only takes hold through `apply_effect`. Routes reuse
/// pools across paths, so callers replay effects in execution order.
pub trait PoolSimulator: Send + Sync {
    /// Exchange (liquidity source) identifier, e.g. `uniswapv3` or `pmm-2`.
    fn exchange(&self) -> &str;

    fn quote(
        &self,
        amount_in: &TokenAmount,
        token_out: &str,
        limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError>;

    fn apply_effect(
        &mut self,
        effect: &SwapEffect,
        limit: Option<&mut SwapLimit>,
    ) -> Result<(), PoolError>;

    /// Independent deep copy; mutating it leaves `self` untouched.
    fn clone_state(&self) -> Box<dyn PoolSimulator>;
}
