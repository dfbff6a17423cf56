//! USD valuation of swap amounts.
//!
//! A whitelisted output price is trusted as-is. Otherwise, when the input
//! token's price is trusted, the output is valued through the swap's own
//! exchange ratio.

use std::collections::BTreeSet;

use num_bigint::BigUint;
use router_core::PriceBook;

use crate::calculator::amount_to_f64;

/// `amount / 10^decimals * price`
pub fn calc_amount_price(amount: &BigUint, decimals: u8, price: f64) -> f64 {
    amount_to_f64(amount) / 10f64.powi(decimals as i32) * price
}

/// Inverse of [`calc_amount_price`], truncated to base units.
pub fn calc_amount_from_price(amount_usd: f64, decimals: u8, price: f64) -> BigUint {
    if price <= 0.0 {
        return BigUint::default();
    }
    crate::calculator::amount_from_f64(amount_usd / price * 10f64.powi(decimals as i32))
}

#[derive(Debug, Clone, Copy)]
pub struct FairPriceOracle<'a> {
    whitelist: &'a BTreeSet<String>,
    prices: &'a PriceBook,
}

impl<'a> FairPriceOracle<'a> {
    pub fn new(whitelist: &'a BTreeSet<String>, prices: &'a PriceBook) -> Self {
        Self { whitelist, prices }
    }

    /// USD value of `specified` units of `token_out`, for a swap that turned
    /// `amount_in` of `token_in` into `amount_out` of `token_out`.
    pub fn usd_value(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: &BigUint,
        amount_out: &BigUint,
        specified: &BigUint,
    ) -> f64 {
        let decimals_out = self.prices.decimals(token_out);
        let out_trusted = self.whitelist.contains(token_out);
        let in_trusted = self.whitelist.contains(token_in);

        if out_trusted || !in_trusted {
            return calc_amount_price(specified, decimals_out, self.prices.price(token_out));
        }

        let decimals_in = self.prices.decimals(token_in);
        let amount_in_f = amount_to_f64(amount_in) / 10f64.powi(decimals_in as i32);
        let amount_out_f = amount_to_f64(amount_out) / 10f64.powi(decimals_out as i32);
        if amount_out_f <= 0.0 {
            return 0.0;
        }
        let fair_price_out = self.prices.price(token_in) * amount_in_f / amount_out_f;

        calc_amount_price(specified, decimals_out, fair_price_out)
    }
}
