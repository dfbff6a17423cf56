//! Pool Simulation State Types
//!
//! Token amounts, quotes, swap effects, swap limits and pool specs.

use std::collections::BTreeMap;

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constant_product::ConstantProductPool;
use crate::fixed_rate::FixedRatePool;
use crate::rfq::RfqPool;
use crate::simulator::PoolSimulator;

/// Token amount in base units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: String,
    #[serde(with = "decimal")]
    pub amount: BigUint,
}

impl TokenAmount {
    pub fn new(token: impl Into<String>, amount: BigUint) -> Self {
        Self {
            token: token.into(),
            amount,
        }
    }

    pub fn zero(token: impl Into<String>) -> Self {
        Self::new(token, BigUint::zero())
    }
}

/// State change produced by a quote, replayed by `apply_effect`.
///
/// Callers treat it as opaque; `info` carries whatever the pool needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEffect {
    pub token_amount_in: TokenAmount,
    pub token_amount_out: TokenAmount,
    #[serde(default)]
    pub info: serde_json::Value,
}

/// Result of quoting one swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub amount_out: TokenAmount,
    pub fee: TokenAmount,
    pub effect: SwapEffect,
}

impl Quote {
    /// A quote is usable only when it pays a positive amount of the requested token.
    pub fn is_valid(&self, token_out: &str) -> bool {
        self.amount_out.token == token_out && !self.amount_out.amount.is_zero()
    }
}

/// Inventory shared by every pool of one market maker.
///
/// RFQ makers quote from a single balance sheet, so the bucket keys limits by
/// exchange rather than by pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapLimit {
    #[serde(with = "decimal::map", default)]
    pub inventory: BTreeMap<String, BigUint>,
}

impl SwapLimit {
    pub fn new(inventory: BTreeMap<String, BigUint>) -> Self {
        Self { inventory }
    }

    pub fn available(&self, token: &str) -> BigUint {
        self.inventory.get(token).cloned().unwrap_or_default()
    }

    /// Fail if the inventory cannot pay `amount` of `token`.
    pub fn check(&self, token: &str, amount: &BigUint) -> Result<(), PoolError> {
        let available = self.available(token);
        if &available < amount {
            return Err(PoolError::InsufficientInventory {
                token: token.to_string(),
                required: amount.to_string(),
                available: available.to_string(),
            });
        }
        Ok(())
    }

    /// Move inventory: the maker receives `token_in` and pays `token_out`.
    pub fn settle(&mut self, token_in: &TokenAmount, token_out: &TokenAmount) -> Result<(), PoolError> {
        self.check(&token_out.token, &token_out.amount)?;
        if let Some(balance) = self.inventory.get_mut(&token_out.token) {
            *balance -= &token_out.amount;
        }
        *self.inventory.entry(token_in.token.clone()).or_default() += &token_in.amount;
        Ok(())
    }
}

/// Serializable description of a reference pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PoolSpec {
    ConstantProduct(ConstantProductPool),
    FixedRate(FixedRatePool),
    Rfq(RfqPool),
}

impl PoolSpec {
    pub fn address(&self) -> &str {
        match self {
            Self::ConstantProduct(p) => &p.address,
            Self::FixedRate(p) => &p.address,
            Self::Rfq(p) => &p.address,
        }
    }

    pub fn into_simulator(self) -> Box<dyn PoolSimulator> {
        match self {
            Self::ConstantProduct(p) => Box::new(p),
            Self::FixedRate(p) => Box::new(p),
            Self::Rfq(p) => Box::new(p),
        }
    }
}

/// Pool simulation errors
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Pool not found: {0}")]
    PoolNotFound(String),

    #[error("Insufficient liquidity for swap")]
    InsufficientLiquidity,

    #[error("Invalid token for pool: {0}")]
    InvalidToken(String),

    #[error("Zero input amount")]
    ZeroAmount,

    #[error("Insufficient inventory ({token}): need {required}, have {available}")]
    InsufficientInventory {
        token: String,
        required: String,
        available: String,
    },

    #[error("Swap limit required by {0}")]
    MissingSwapLimit(String),

    #[error("Effect does not belong to this pool: {0}")]
    InvalidEffect(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(token: &str, v: u64) -> TokenAmount {
        TokenAmount::new(token, BigUint::from(v))
    }

    #[test]
    fn test_quote_validity() {
        let effect = SwapEffect {
            token_amount_in: amount("a", 10),
            token_amount_out: amount("b", 9),
            info: serde_json::Value::Null,
        };
        let quote = Quote {
            amount_out: amount("b", 9),
            fee: TokenAmount::zero("a"),
            effect: effect.clone(),
        };
        assert!(quote.is_valid("b"));
        assert!(!quote.is_valid("c"));

        let empty = Quote {
            amount_out: TokenAmount::zero("b"),
            fee: TokenAmount::zero("a"),
            effect,
        };
        assert!(!empty.is_valid("b"));
    }

    #[test]
    fn test_swap_limit_settle() {
        let mut limit = SwapLimit::default();
        limit.inventory.insert("usdc".into(), BigUint::from(1_000u32));

        limit.settle(&amount("weth", 1), &amount("usdc", 400)).unwrap();
        assert_eq!(limit.available("usdc"), BigUint::from(600u32));
        assert_eq!(limit.available("weth"), BigUint::from(1u32));

        let err = limit.settle(&amount("weth", 1), &amount("usdc", 601)).unwrap_err();
        assert!(matches!(err, PoolError::InsufficientInventory { .. }));
        // failed settle leaves inventory untouched
        assert_eq!(limit.available("usdc"), BigUint::from(600u32));
    }

    #[test]
    fn test_swap_limit_serde_uses_decimal_strings() {
        let json = r#"{"inventory":{"usdc":"5000000000000000000000"}}"#;
        let limit: SwapLimit = serde_json::from_str(json).unwrap();
        assert_eq!(
            limit.available("usdc").to_string(),
            "5000000000000000000000"
        );
        assert_eq!(serde_json::to_string(&limit).unwrap(), json);
    }

    #[test]
    fn test_pool_spec_from_json() {
        let json = r#"{
            "type": "fixedRate",
            "address": "p1",
            "exchange": "pmm-1",
            "tokenIn": "a",
            "tokenOut": "b",
            "rate": 0.9
        }"#;
        let spec: PoolSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.address(), "p1");
        let sim = spec.into_simulator();
        assert_eq!(sim.exchange(), "pmm-1");
    }
}
