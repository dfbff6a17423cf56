//! Alpha-source classification: which exchanges a fee may be taken from.

use std::collections::BTreeSet;

use router_core::AlphaFeeConfig;

use crate::state::SwapInfo;

/// Pure predicate over an exchange identifier.
pub trait AlphaSourceClassifier: Send + Sync {
    fn is_alpha_fee_source(&self, exchange: &str) -> bool;
}

impl<F> AlphaSourceClassifier for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_alpha_fee_source(&self, exchange: &str) -> bool {
        self(exchange)
    }
}

/// Classifier backed by a fixed set of exchanges
#[derive(Debug, Clone, Default)]
pub struct StaticAllowList {
    sources: BTreeSet<String>,
}

impl StaticAllowList {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &AlphaFeeConfig) -> Self {
        Self {
            sources: config.alpha_fee_sources.clone(),
        }
    }
}

impl AlphaSourceClassifier for StaticAllowList {
    fn is_alpha_fee_source(&self, exchange: &str) -> bool {
        self.sources.contains(exchange)
    }
}

pub fn path_has_alpha_source(classifier: &dyn AlphaSourceClassifier, path: &[SwapInfo]) -> bool {
    path.iter()
        .any(|swap| classifier.is_alpha_fee_source(&swap.exchange))
}

pub fn count_alpha_sources(classifier: &dyn AlphaSourceClassifier, path: &[SwapInfo]) -> usize {
    path.iter()
        .filter(|swap| classifier.is_alpha_fee_source(&swap.exchange))
        .count()
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;

    use super::*;

    fn make_swap(exchange: &str) -> SwapInfo {
        SwapInfo {
            pool: format!("pool_{}", exchange),
            token_in: "a".into(),
            token_out: "b".into(),
            amount_in: BigUint::from(1u32),
            amount_out: BigUint::from(1u32),
            exchange: exchange.into(),
        }
    }

    #[test]
    fn test_static_allow_list() {
        let list = StaticAllowList::new(["pmm-1", "kyber-pmm"]);
        assert!(list.is_alpha_fee_source("pmm-1"));
        assert!(!list.is_alpha_fee_source("uniswapv3"));
    }

    #[test]
    fn test_from_config_uses_configured_sources() {
        let list = StaticAllowList::from_config(&AlphaFeeConfig::default());
        assert!(list.is_alpha_fee_source("kyber-pmm"));
        assert!(!list.is_alpha_fee_source("curve"));
    }

    #[test]
    fn test_closure_classifier_and_counts() {
        let classifier = |exchange: &str| exchange.starts_with("pmm");
        let path = vec![make_swap("pmm-1"), make_swap("uniswapv3"), make_swap("pmm-2")];
        assert!(path_has_alpha_source(&classifier, &path));
        assert_eq!(count_alpha_sources(&classifier, &path), 2);
        assert!(!path_has_alpha_source(&classifier, &path[1..2]));
    }
}
