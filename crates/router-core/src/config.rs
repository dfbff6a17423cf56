//! Configuration types for alpha-fee pricing

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};
use crate::types::{BASIS_POINT, EXCHANGE_KYBER_PMM};

/// Fallback reduction factor (bps) when neither pool nor exchange is configured.
pub const DEFAULT_REDUCTION_FACTOR_BPS: f64 = 5000.0;

/// Fallback weight for distributing a path surplus across its alpha swaps.
pub const DEFAULT_WEIGHT_DISTRIBUTE: u32 = 1000;

/// Which planner computes the live alpha fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaFeeVersion {
    /// Single-swap fee on the alpha swap closest to its path end
    V1,
    /// Proportional per-path reduction
    V2,
    /// Surplus-ranked reduction
    #[default]
    V3,
}

/// Per-deployment reduction policy.
///
/// Every map is ordered so lookups that fall back to "the first configured
/// entry" are deterministic across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionConfig {
    /// Fraction (bps) of an alpha source's edge that is taken, by exchange
    #[serde(default)]
    pub reduction_factor_in_bps: BTreeMap<String, f64>,

    /// Same as above, keyed by pool address; wins over the exchange entry
    #[serde(default)]
    pub reduction_factor_by_pool: BTreeMap<String, f64>,

    /// Floor for the AMM reference, as bps of the best route output
    #[serde(default = "default_max_threshold_bps")]
    pub max_threshold_percentage_in_bps: u32,

    /// Skip threshold on the raw output difference (bps of the AMM output)
    #[serde(default)]
    pub min_different_threshold_bps: i64,

    /// Skip threshold on the gas-adjusted USD difference
    #[serde(default)]
    pub min_different_threshold_usd: f64,

    /// Fee (bps of route output) used when no live simulator is available
    #[serde(default)]
    pub default_alpha_fee_percentage_bps: f64,

    #[serde(default)]
    pub weight_distribute_by_pool: BTreeMap<String, u32>,

    #[serde(default)]
    pub weight_distribute_by_source: BTreeMap<String, u32>,

    #[serde(default)]
    pub weight_distribute_by_token_group: BTreeMap<String, u32>,

    /// USD surplus a user keeps at most per swap, by exchange. Non-positive means no limit.
    #[serde(default)]
    pub surplus_allowance_usd: BTreeMap<String, f64>,

    #[serde(default)]
    pub surplus_allowance_usd_by_pool: BTreeMap<String, f64>,

    /// Smooth path rates over pools shared by several alpha paths
    #[serde(default)]
    pub calculate_surplus_merge_share_pools: bool,
}

fn default_max_threshold_bps() -> u32 {
    BASIS_POINT
}

impl Default for ReductionConfig {
    fn default() -> Self {
        Self {
            reduction_factor_in_bps: BTreeMap::new(),
            reduction_factor_by_pool: BTreeMap::new(),
            max_threshold_percentage_in_bps: default_max_threshold_bps(),
            min_different_threshold_bps: 0,
            min_different_threshold_usd: 0.0,
            default_alpha_fee_percentage_bps: 0.0,
            weight_distribute_by_pool: BTreeMap::new(),
            weight_distribute_by_source: BTreeMap::new(),
            weight_distribute_by_token_group: BTreeMap::new(),
            surplus_allowance_usd: BTreeMap::new(),
            surplus_allowance_usd_by_pool: BTreeMap::new(),
            calculate_surplus_merge_share_pools: false,
        }
    }
}

impl ReductionConfig {
    /// Reduction factor for a swap: per-pool, then per-exchange, then the default.
    pub fn reduction_factor(&self, pool: &str, exchange: &str) -> f64 {
        self.reduction_factor_by_pool
            .get(pool)
            .or_else(|| self.reduction_factor_in_bps.get(exchange))
            .copied()
            .unwrap_or(DEFAULT_REDUCTION_FACTOR_BPS)
    }

    /// Factor applied when a path reduction has to be capped.
    ///
    /// Prefers the router's own PMM entry, then the first configured source.
    pub fn primary_reduction_factor(&self) -> f64 {
        self.reduction_factor_in_bps
            .get(EXCHANGE_KYBER_PMM)
            .or_else(|| self.reduction_factor_in_bps.values().next())
            .copied()
            .unwrap_or(DEFAULT_REDUCTION_FACTOR_BPS)
    }

    /// Surplus allowance for a pool; `None` when unlimited.
    pub fn surplus_allowance(&self, pool: &str, exchange: &str) -> Option<f64> {
        self.surplus_allowance_usd_by_pool
            .get(pool)
            .or_else(|| self.surplus_allowance_usd.get(exchange))
            .copied()
            .filter(|allowance| *allowance > 0.0)
    }
}

/// A named set of tokens, optionally restricted to some exchanges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGroup {
    pub tokens: BTreeSet<String>,
    #[serde(default)]
    pub exchanges: BTreeSet<String>,
}

/// Token groups used to resolve surplus weights by pair category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenGroupConfig {
    pub groups: BTreeMap<String, TokenGroup>,
}

impl TokenGroupConfig {
    /// First group (in key order) containing both tokens and allowing the exchange.
    pub fn group_type(&self, token_in: &str, token_out: &str, exchange: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, group)| {
                group.tokens.contains(token_in)
                    && group.tokens.contains(token_out)
                    && (group.exchanges.is_empty() || group.exchanges.contains(exchange))
            })
            .map(|(name, _)| name.as_str())
    }
}

/// Top-level alpha-fee configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlphaFeeConfig {
    #[serde(default)]
    pub version: AlphaFeeVersion,

    #[serde(default)]
    pub reduction_config: ReductionConfig,

    /// Tokens whose USD price is trusted as-is
    #[serde(default)]
    pub whitelist_prices: BTreeSet<String>,

    #[serde(default)]
    pub token_groups: TokenGroupConfig,

    /// Exchanges eligible for alpha-fee extraction
    #[serde(default = "default_alpha_fee_sources")]
    pub alpha_fee_sources: BTreeSet<String>,
}

fn default_alpha_fee_sources() -> BTreeSet<String> {
    [
        EXCHANGE_KYBER_PMM,
        "pmm-1",
        "pmm-2",
        "pmm-3",
        "bebop",
        "hashflow-v3",
        "native-v1",
        "uniswap-v4-fairflow",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for AlphaFeeConfig {
    fn default() -> Self {
        Self {
            version: AlphaFeeVersion::default(),
            reduction_config: ReductionConfig::default(),
            whitelist_prices: BTreeSet::new(),
            token_groups: TokenGroupConfig::default(),
            alpha_fee_sources: default_alpha_fee_sources(),
        }
    }
}

impl AlphaFeeConfig {
    /// Surplus weight of one swap: per-pool, then token group, then exchange, then the default.
    pub fn weight_distribute(&self, pool: &str, token_in: &str, token_out: &str, exchange: &str) -> u32 {
        let rc = &self.reduction_config;
        if let Some(weight) = rc.weight_distribute_by_pool.get(pool) {
            return *weight;
        }
        let by_group = self
            .token_groups
            .group_type(token_in, token_out, exchange)
            .and_then(|group| rc.weight_distribute_by_token_group.get(group));
        if let Some(weight) = by_group {
            return *weight;
        }
        rc.weight_distribute_by_source
            .get(exchange)
            .copied()
            .unwrap_or(DEFAULT_WEIGHT_DISTRIBUTE)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_json_str(&raw)?)
    }

    pub fn from_json_str(raw: &str) -> std::result::Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the planners cannot interpret.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let rc = &self.reduction_config;
        let max = BASIS_POINT as f64;

        if rc.max_threshold_percentage_in_bps > BASIS_POINT {
            return Err(ConfigError::OutOfRange {
                field: "maxThresholdPercentageInBps",
                value: rc.max_threshold_percentage_in_bps as f64,
                max,
            });
        }

        let factors = rc
            .reduction_factor_in_bps
            .iter()
            .chain(rc.reduction_factor_by_pool.iter());
        for (key, factor) in factors {
            if key.is_empty() {
                return Err(ConfigError::EmptyKey {
                    field: "reductionFactorInBps",
                });
            }
            if !(0.0..=max).contains(factor) {
                return Err(ConfigError::OutOfRange {
                    field: "reductionFactorInBps",
                    value: *factor,
                    max,
                });
            }
        }

        if rc.default_alpha_fee_percentage_bps < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "defaultAlphaFeePercentageBps",
                value: rc.default_alpha_fee_percentage_bps,
                max: f64::MAX,
            });
        }

        Ok(())
    }
}
