//! Simulator Bucket
//!
//! Keyed registry of pool simulators and swap limits for one route
//! evaluation. Base state is shared behind `Arc`; the first mutation of an
//! entry copies it into the bucket's own layer, so clones of a bucket never
//! observe each other's swaps.

use std::collections::HashMap;
use std::sync::Arc;

use crate::simulator::PoolSimulator;
use crate::state::{PoolError, PoolSpec, SwapEffect, SwapLimit};

pub struct SimulatorBucket {
    pools: Arc<HashMap<String, Box<dyn PoolSimulator>>>,
    /// Keyed by exchange
    limits: Arc<HashMap<String, SwapLimit>>,
    changed_pools: HashMap<String, Box<dyn PoolSimulator>>,
    changed_limits: HashMap<String, SwapLimit>,
}

impl SimulatorBucket {
    pub fn new(
        pools: HashMap<String, Box<dyn PoolSimulator>>,
        limits: HashMap<String, SwapLimit>,
    ) -> Self {
        Self {
            pools: Arc::new(pools),
            limits: Arc::new(limits),
            changed_pools: HashMap::new(),
            changed_limits: HashMap::new(),
        }
    }

    /// Build a bucket from serialized reference pools.
    pub fn from_specs(specs: Vec<PoolSpec>, limits: HashMap<String, SwapLimit>) -> Self {
        let pools = specs
            .into_iter()
            .map(|spec| (spec.address().to_string(), spec.into_simulator()))
            .collect();
        Self::new(pools, limits)
    }

    /// A bucket over the same base state with every local change discarded.
    pub fn fresh(&self) -> Self {
        Self {
            pools: Arc::clone(&self.pools),
            limits: Arc::clone(&self.limits),
            changed_pools: HashMap::new(),
            changed_limits: HashMap::new(),
        }
    }

    pub fn get(&self, pool_id: &str) -> Option<&dyn PoolSimulator> {
        self.changed_pools
            .get(pool_id)
            .or_else(|| self.pools.get(pool_id))
            .map(|pool| &**pool)
    }

    /// Swap limit of the pool's exchange, if that exchange has one.
    pub fn swap_limit(&self, pool_id: &str) -> Option<&SwapLimit> {
        let exchange = self.get(pool_id)?.exchange();
        self.changed_limits
            .get(exchange)
            .or_else(|| self.limits.get(exchange))
    }

    /// Private, mutable copy of a pool. Later reads see the copy.
    pub fn clone_pool(&mut self, pool_id: &str) -> Option<&mut Box<dyn PoolSimulator>> {
        if !self.changed_pools.contains_key(pool_id) {
            let copy = self.pools.get(pool_id)?.clone_state();
            self.changed_pools.insert(pool_id.to_string(), copy);
        }
        self.changed_pools.get_mut(pool_id)
    }

    /// Private, mutable copy of the swap limit used by a pool.
    pub fn clone_swap_limit(&mut self, pool_id: &str) -> Option<&mut SwapLimit> {
        let exchange = self.get(pool_id)?.exchange().to_string();
        if !self.changed_limits.contains_key(&exchange) {
            let copy = self.limits.get(&exchange)?.clone();
            self.changed_limits.insert(exchange.clone(), copy);
        }
        self.changed_limits.get_mut(&exchange)
    }

    /// Copy the pool and its swap limit, then replay a swap effect on them.
    pub fn update_balance(&mut self, pool_id: &str, effect: &SwapEffect) -> Result<(), PoolError> {
        let exchange = self
            .get(pool_id)
            .ok_or_else(|| PoolError::PoolNotFound(pool_id.to_string()))?
            .exchange()
            .to_string();
        self.clone_pool(pool_id);
        self.clone_swap_limit(pool_id);

        let pool = self
            .changed_pools
            .get_mut(pool_id)
            .ok_or_else(|| PoolError::PoolNotFound(pool_id.to_string()))?;
        let limit = self.changed_limits.get_mut(&exchange);

        tracing::trace!(pool = pool_id, exchange = %exchange, "applying swap effect");
        pool.apply_effect(effect, limit)
    }

    pub fn is_modified(&self, pool_id: &str) -> bool {
        self.changed_pools.contains_key(pool_id)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl Clone for SimulatorBucket {
    fn clone(&self) -> Self {
        Self {
            pools: Arc::clone(&self.pools),
            limits: Arc::clone(&self.limits),
            changed_pools: self
                .changed_pools
                .iter()
                .map(|(id, pool)| (id.clone(), pool.clone_state()))
                .collect(),
            changed_limits: self.changed_limits.clone(),
        }
    }
}

impl std::fmt::Debug for SimulatorBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatorBucket")
            .field("pools", &self.pools.len())
            .field("changed_pools", &self.changed_pools.len())
            .field("changed_limits", &self.changed_limits.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use num_bigint::BigUint;

    use super::*;
    use crate::constant_product::ConstantProductPool;
    use crate::rfq::RfqPool;
    use crate::state::TokenAmount;

    fn make_bucket() -> SimulatorBucket {
        let mut pools: HashMap<String, Box<dyn PoolSimulator>> = HashMap::new();
        pools.insert(
            "cp".into(),
            Box::new(ConstantProductPool::new(
                "cp",
                "uniswap-v2",
                "weth",
                "usdc",
                BigUint::from(1_000u32),
                BigUint::from(1_000u32),
            )),
        );
        pools.insert(
            "rfq-a".into(),
            Box::new(RfqPool::new("rfq-a", "pmm-1", "weth", "usdc", 10.0)),
        );
        pools.insert(
            "rfq-b".into(),
            Box::new(RfqPool::new("rfq-b", "pmm-1", "weth", "usdc", 10.0)),
        );

        let mut inventory = BTreeMap::new();
        inventory.insert("usdc".to_string(), BigUint::from(100u32));
        let mut limits = HashMap::new();
        limits.insert("pmm-1".to_string(), SwapLimit::new(inventory));

        SimulatorBucket::new(pools, limits)
    }

    fn swap(bucket: &mut SimulatorBucket, pool_id: &str, amount: u32) -> Result<BigUint, PoolError> {
        let amount_in = TokenAmount::new("weth", BigUint::from(amount));
        let quote = bucket
            .get(pool_id)
            .ok_or_else(|| PoolError::PoolNotFound(pool_id.into()))?
            .quote(&amount_in, "usdc", bucket.swap_limit(pool_id))?;
        bucket.update_balance(pool_id, &quote.effect)?;
        Ok(quote.amount_out.amount)
    }

    #[test]
    fn test_copy_on_write_isolation() {
        let base = make_bucket();
        let mut a = base.fresh();
        let mut b = base.fresh();

        let first = swap(&mut a, "cp", 100).unwrap();
        let second = swap(&mut a, "cp", 100).unwrap();
        assert!(second < first);
        assert!(a.is_modified("cp"));

        // the sibling bucket still quotes against untouched reserves
        assert_eq!(swap(&mut b, "cp", 100).unwrap(), first);
        assert!(!base.is_modified("cp"));
    }

    #[test]
    fn test_clone_carries_local_changes() {
        let mut a = make_bucket();
        swap(&mut a, "cp", 100).unwrap();

        let mut copy = a.clone();
        let mut again = a.fresh();
        assert_eq!(swap(&mut copy, "cp", 100).unwrap(), swap(&mut a, "cp", 100).unwrap());
        assert_eq!(swap(&mut again, "cp", 100).unwrap(), BigUint::from(90u32));
    }

    #[test]
    fn test_swap_limit_shared_by_exchange() {
        let mut bucket = make_bucket();
        assert_eq!(swap(&mut bucket, "rfq-a", 6).unwrap(), BigUint::from(60u32));
        // rfq-b draws from the same maker inventory
        let err = swap(&mut bucket, "rfq-b", 6).unwrap_err();
        assert!(matches!(err, PoolError::InsufficientInventory { .. }));
        assert_eq!(
            bucket.swap_limit("rfq-b").unwrap().available("usdc"),
            BigUint::from(40u32)
        );
        assert!(bucket.swap_limit("cp").is_none());
    }

    #[test]
    fn test_unknown_pool() {
        let mut bucket = make_bucket();
        assert!(bucket.get("missing").is_none());
        assert!(bucket.clone_pool("missing").is_none());
        let err = swap(&mut bucket, "missing", 1).unwrap_err();
        assert!(matches!(err, PoolError::PoolNotFound(_)));
    }
}
