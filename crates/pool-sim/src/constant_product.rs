//! Constant-product (x * y = k) pool with reserve updates.

use num_bigint::BigUint;
use num_traits::Zero;
use router_core::decimal;
use serde::{Deserialize, Serialize};

use crate::calculator::calculate_output;
use crate::simulator::PoolSimulator;
use crate::state::{PoolError, Quote, SwapEffect, SwapLimit, TokenAmount};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantProductPool {
    pub address: String,
    pub exchange: String,
    pub token0: String,
    pub token1: String,
    #[serde(with = "decimal")]
    pub reserve0: BigUint,
    #[serde(with = "decimal")]
    pub reserve1: BigUint,
    /// Fee numerator (e.g., 997)
    #[serde(default = "default_fee_num")]
    pub fee_num: u32,
    /// Fee denominator (e.g., 1000)
    #[serde(default = "default_fee_denom")]
    pub fee_denom: u32,
}

fn default_fee_num() -> u32 {
    997
}

fn default_fee_denom() -> u32 {
    1000
}

impl ConstantProductPool {
    pub fn new(
        address: impl Into<String>,
        exchange: impl Into<String>,
        token0: impl Into<String>,
        token1: impl Into<String>,
        reserve0: BigUint,
        reserve1: BigUint,
    ) -> Self {
        Self {
            address: address.into(),
            exchange: exchange.into(),
            token0: token0.into(),
            token1: token1.into(),
            reserve0,
            reserve1,
            fee_num: default_fee_num(),
            fee_denom: default_fee_denom(),
        }
    }

    /// (reserve_in, reserve_out, zero_for_one) for a direction
    fn orient(&self, token_in: &str, token_out: &str) -> Result<(&BigUint, &BigUint, bool), PoolError> {
        if token_in == self.token0 && token_out == self.token1 {
            Ok((&self.reserve0, &self.reserve1, true))
        } else if token_in == self.token1 && token_out == self.token0 {
            Ok((&self.reserve1, &self.reserve0, false))
        } else {
            Err(PoolError::InvalidToken(format!("{}->{}", token_in, token_out)))
        }
    }
}

impl PoolSimulator for ConstantProductPool {
    fn exchange(&self) -> &str {
        &self.exchange
    }

    fn quote(
        &self,
        amount_in: &TokenAmount,
        token_out: &str,
        _limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError> {
        if amount_in.amount.is_zero() {
            return Err(PoolError::ZeroAmount);
        }
        if self.fee_denom == 0 {
            return Err(PoolError::InsufficientLiquidity);
        }
        let (reserve_in, reserve_out, _) = self.orient(&amount_in.token, token_out)?;
        let output = calculate_output(
            reserve_in,
            reserve_out,
            &amount_in.amount,
            self.fee_num,
            self.fee_denom,
        );
        if output.is_zero() || &output >= reserve_out {
            return Err(PoolError::InsufficientLiquidity);
        }

        let fee = &amount_in.amount * BigUint::from(self.fee_denom.saturating_sub(self.fee_num))
            / BigUint::from(self.fee_denom);
        let out = TokenAmount::new(token_out, output);
        Ok(Quote {
            amount_out: out.clone(),
            fee: TokenAmount::new(amount_in.token.clone(), fee),
            effect: SwapEffect {
                token_amount_in: amount_in.clone(),
                token_amount_out: out,
                info: serde_json::Value::Null,
            },
        })
    }

    fn apply_effect(
        &mut self,
        effect: &SwapEffect,
        _limit: Option<&mut SwapLimit>,
    ) -> Result<(), PoolError> {
        let (_, reserve_out, zero_for_one) =
            self.orient(&effect.token_amount_in.token, &effect.token_amount_out.token)?;
        if &effect.token_amount_out.amount >= reserve_out {
            return Err(PoolError::InsufficientLiquidity);
        }

        let (r_in, r_out) = if zero_for_one {
            (&mut self.reserve0, &mut self.reserve1)
        } else {
            (&mut self.reserve1, &mut self.reserve0)
        };
        *r_in += &effect.token_amount_in.amount;
        *r_out -= &effect.token_amount_out.amount;
        Ok(())
    }

    fn clone_state(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pool() -> ConstantProductPool {
        ConstantProductPool::new(
            "cp1",
            "uniswap-v2",
            "weth",
            "usdc",
            BigUint::from(1_000u32),
            BigUint::from(1_000u32),
        )
    }

    #[test]
    fn test_quote_both_directions() {
        let pool = make_pool();
        let q = pool
            .quote(&TokenAmount::new("weth", BigUint::from(100u32)), "usdc", None)
            .unwrap();
        assert_eq!(q.amount_out.amount, BigUint::from(90u32));

        let q = pool
            .quote(&TokenAmount::new("usdc", BigUint::from(100u32)), "weth", None)
            .unwrap();
        assert_eq!(q.amount_out.amount, BigUint::from(90u32));
    }

    #[test]
    fn test_apply_effect_moves_price() {
        let mut pool = make_pool();
        let amount_in = TokenAmount::new("weth", BigUint::from(100u32));
        let first = pool.quote(&amount_in, "usdc", None).unwrap();
        pool.apply_effect(&first.effect, None).unwrap();

        assert_eq!(pool.reserve0, BigUint::from(1_100u32));
        assert_eq!(pool.reserve1, BigUint::from(910u32));

        let second = pool.quote(&amount_in, "usdc", None).unwrap();
        assert!(second.amount_out.amount < first.amount_out.amount);
    }

    #[test]
    fn test_quote_rejects_unknown_token() {
        let pool = make_pool();
        let err = pool
            .quote(&TokenAmount::new("dai", BigUint::from(1u32)), "usdc", None)
            .unwrap_err();
        assert!(matches!(err, PoolError::InvalidToken(_)));
    }

    #[test]
    fn test_quote_zero_input() {
        let pool = make_pool();
        let err = pool.quote(&TokenAmount::zero("weth"), "usdc", None).unwrap_err();
        assert!(matches!(err, PoolError::ZeroAmount));
    }
}
