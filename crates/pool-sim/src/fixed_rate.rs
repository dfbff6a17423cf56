//! Fixed-rate pool: pays `trunc(amount_in * rate)` in one direction, no state.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::calculator::scale_by_rate;
use crate::simulator::PoolSimulator;
use crate::state::{PoolError, Quote, SwapEffect, SwapLimit, TokenAmount};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedRatePool {
    pub address: String,
    pub exchange: String,
    pub token_in: String,
    pub token_out: String,
    pub rate: f64,
}

impl FixedRatePool {
    pub fn new(
        address: impl Into<String>,
        exchange: impl Into<String>,
        token_in: impl Into<String>,
        token_out: impl Into<String>,
        rate: f64,
    ) -> Self {
        Self {
            address: address.into(),
            exchange: exchange.into(),
            token_in: token_in.into(),
            token_out: token_out.into(),
            rate,
        }
    }
}

impl PoolSimulator for FixedRatePool {
    fn exchange(&self) -> &str {
        &self.exchange
    }

    fn quote(
        &self,
        amount_in: &TokenAmount,
        token_out: &str,
        _limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError> {
        if amount_in.token != self.token_in {
            return Err(PoolError::InvalidToken(amount_in.token.clone()));
        }
        if token_out != self.token_out {
            return Err(PoolError::InvalidToken(token_out.to_string()));
        }

        let out = TokenAmount::new(token_out, scale_by_rate(&amount_in.amount, self.rate));
        Ok(Quote {
            amount_out: out.clone(),
            fee: TokenAmount::new(&self.token_in, BigUint::default()),
            effect: SwapEffect {
                token_amount_in: amount_in.clone(),
                token_amount_out: out,
                info: serde_json::Value::Null,
            },
        })
    }

    fn apply_effect(
        &mut self,
        _effect: &SwapEffect,
        _limit: Option<&mut SwapLimit>,
    ) -> Result<(), PoolError> {
        Ok(())
    }

    fn clone_state(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }
}
