//! Planner facade: picks the planner matching `config.version`.

use std::sync::Arc;

use router_core::{AlphaFeeConfig, AlphaFeeVersion};

use crate::classifier::{AlphaSourceClassifier, StaticAllowList};
use crate::legacy::LegacyPlanner;
use crate::proportional::ProportionalPlanner;
use crate::state::{AlphaFeeError, AlphaFeeParams, AlphaFeeResult, DefaultAlphaFeeParams};
use crate::surplus::SurplusPlanner;

enum Engine {
    Legacy(LegacyPlanner),
    Proportional(ProportionalPlanner),
    Surplus(SurplusPlanner),
}

pub struct AlphaFeePlanner {
    version: AlphaFeeVersion,
    engine: Engine,
}

impl AlphaFeePlanner {
    pub fn new(config: AlphaFeeConfig, classifier: Arc<dyn AlphaSourceClassifier>) -> Self {
        let version = config.version;
        let engine = match version {
            AlphaFeeVersion::V1 => Engine::Legacy(LegacyPlanner::new(config, classifier)),
            AlphaFeeVersion::V2 => Engine::Proportional(ProportionalPlanner::new(config, classifier)),
            AlphaFeeVersion::V3 => Engine::Surplus(SurplusPlanner::new(config, classifier)),
        };
        Self { version, engine }
    }

    /// Planner classifying alpha sources by the configured allow-list.
    pub fn from_config(config: AlphaFeeConfig) -> Self {
        let classifier = Arc::new(StaticAllowList::from_config(&config));
        Self::new(config, classifier)
    }

    pub fn version(&self) -> AlphaFeeVersion {
        self.version
    }

    pub fn calculate(&self, params: AlphaFeeParams<'_>) -> Result<AlphaFeeResult, AlphaFeeError> {
        let result = match &self.engine {
            Engine::Legacy(planner) => planner.calculate(params).map(AlphaFeeResult::Legacy),
            Engine::Proportional(planner) => planner.calculate(params).map(AlphaFeeResult::Swaps),
            Engine::Surplus(planner) => planner.calculate(params).map(AlphaFeeResult::Swaps),
        };
        self.trace_outcome("calculate", &result);
        result
    }

    pub fn calculate_default(&self, params: DefaultAlphaFeeParams<'_>) -> Result<AlphaFeeResult, AlphaFeeError> {
        let result = match &self.engine {
            Engine::Legacy(planner) => planner.calculate_default(params).map(AlphaFeeResult::Legacy),
            Engine::Proportional(planner) => planner.calculate_default(params).map(AlphaFeeResult::Swaps),
            Engine::Surplus(planner) => planner.calculate_default(params).map(AlphaFeeResult::Swaps),
        };
        self.trace_outcome("calculate_default", &result);
        result
    }

    fn trace_outcome(&self, operation: &str, result: &Result<AlphaFeeResult, AlphaFeeError>) {
        match result {
            Ok(_) => tracing::debug!(version = ?self.version, operation, "alpha fee computed"),
            Err(e) => tracing::debug!(
                version = ?self.version,
                operation,
                code = e.error_code(),
                error = %e,
                "no alpha fee"
            ),
        }
    }
}
