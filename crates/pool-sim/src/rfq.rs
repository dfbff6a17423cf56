//! RFQ market-maker pool.
//!
//! Quotes at a fixed maker rate and pays out of the maker's inventory, which
//! lives in the swap limit shared by every pool of the same exchange.

use serde::{Deserialize, Serialize};

use crate::calculator::scale_by_rate;
use crate::simulator::PoolSimulator;
use crate::state::{PoolError, Quote, SwapEffect, SwapLimit, TokenAmount};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfqPool {
    pub address: String,
    pub exchange: String,
    /// Token the taker sends
    pub taker_asset: String,
    /// Token the maker pays
    pub maker_asset: String,
    /// Maker asset paid per unit of taker asset
    pub rate: f64,
}

impl RfqPool {
    pub fn new(
        address: impl Into<String>,
        exchange: impl Into<String>,
        taker_asset: impl Into<String>,
        maker_asset: impl Into<String>,
        rate: f64,
    ) -> Self {
        Self {
            address: address.into(),
            exchange: exchange.into(),
            taker_asset: taker_asset.into(),
            maker_asset: maker_asset.into(),
            rate,
        }
    }
}

impl PoolSimulator for RfqPool {
    fn exchange(&self) -> &str {
        &self.exchange
    }

    fn quote(
        &self,
        amount_in: &TokenAmount,
        token_out: &str,
        limit: Option<&SwapLimit>,
    ) -> Result<Quote, PoolError> {
        if amount_in.token != self.taker_asset || token_out != self.maker_asset {
            return Err(PoolError::InvalidToken(format!(
                "{}->{}",
                amount_in.token, token_out
            )));
        }
        let limit = limit.ok_or_else(|| PoolError::MissingSwapLimit(self.exchange.clone()))?;

        let out = TokenAmount::new(token_out, scale_by_rate(&amount_in.amount, self.rate));
        limit.check(&out.token, &out.amount)?;

        Ok(Quote {
            amount_out: out.clone(),
            fee: TokenAmount::zero(&self.taker_asset),
            effect: SwapEffect {
                token_amount_in: amount_in.clone(),
                token_amount_out: out,
                info: serde_json::json!({ "maker": self.address }),
            },
        })
    }

    fn apply_effect(
        &mut self,
        effect: &SwapEffect,
        limit: Option<&mut SwapLimit>,
    ) -> Result<(), PoolError> {
        if effect.info.get("maker").and_then(|m| m.as_str()) != Some(self.address.as_str()) {
            return Err(PoolError::InvalidEffect(self.address.clone()));
        }
        let limit = limit.ok_or_else(|| PoolError::MissingSwapLimit(self.exchange.clone()))?;
        limit.settle(&effect.token_amount_in, &effect.token_amount_out)
    }

    fn clone_state(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }
}
