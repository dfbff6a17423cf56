//! Core type definitions for the router pricing layer

use std::collections::HashMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Denominator of every basis-point quantity.
pub const BASIS_POINT: u32 = 10_000;

/// Exchange identifier of the router's own PMM market maker.
pub const EXCHANGE_KYBER_PMM: &str = "kyber-pmm";

/// USD prices and decimals for the tokens of one request.
///
/// Missing entries read as zero: an unpriced token contributes no USD value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBook {
    #[serde(default)]
    pub prices: HashMap<String, f64>,
    #[serde(default)]
    pub decimals: HashMap<String, u8>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token with its USD price.
    pub fn with_token(mut self, token: impl Into<String>, decimals: u8, price: f64) -> Self {
        let token = token.into();
        self.decimals.insert(token.clone(), decimals);
        self.prices.insert(token, price);
        self
    }

    pub fn price(&self, token: &str) -> f64 {
        self.prices.get(token).copied().unwrap_or(0.0)
    }

    pub fn decimals(&self, token: &str) -> u8 {
        self.decimals.get(token).copied().unwrap_or(0)
    }
}

/// Serde helpers for `BigUint` amounts.
///
/// Amounts are written as decimal strings. On input both strings and bare
/// JSON integers are accepted.
pub mod decimal {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Int(u64),
    }

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Int(v) => Ok(BigUint::from(v)),
            Repr::Text(s) if s.is_empty() => Ok(BigUint::default()),
            Repr::Text(s) => super::parse_amount(&s).map_err(de::Error::custom),
        }
    }

    /// Same encoding for optional amounts; absent or null reads as `None`.
    pub mod option {
        use num_bigint::BigUint;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<BigUint>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<BigUint>, D::Error> {
            #[derive(Deserialize)]
            struct Wrap(#[serde(with = "super")] BigUint);
            Ok(Option::<Wrap>::deserialize(deserializer)?.map(|w| w.0))
        }
    }

    /// Same encoding for maps of amounts keyed by token.
    pub mod map {
        use std::collections::BTreeMap;

        use num_bigint::BigUint;
        use serde::ser::SerializeMap;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &BTreeMap<String, BigUint>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(value.len()))?;
            for (key, amount) in value {
                map.serialize_entry(key, &amount.to_str_radix(10))?;
            }
            map.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<String, BigUint>, D::Error> {
            #[derive(Deserialize)]
            struct Wrap(#[serde(with = "super")] BigUint);
            Ok(BTreeMap::<String, Wrap>::deserialize(deserializer)?
                .into_iter()
                .map(|(k, w)| (k, w.0))
                .collect())
        }
    }
}

/// Parse a decimal amount string.
pub fn parse_amount(s: &str) -> crate::Result<BigUint> {
    s.parse::<BigUint>()
        .map_err(|e| crate::Error::InvalidAmount(format!("{}: {}", s, e)))
}
