use std::path::Path;

use alpha_fee::{AlphaFeeParams, AlphaFeePlanner};
use serde_json::{json, Value};

use super::{load_config, read_json};
use crate::scenario::Scenario;

/// Run the configured planner on a live route; planner errors are reported in the output.
pub fn run(scenario_path: &Path, config_path: &Path) -> anyhow::Result<Value> {
    let config = load_config(config_path)?;
    let scenario: Scenario = read_json(scenario_path)?;
    tracing::info!(
        paths = scenario.best_route.paths.len(),
        swaps = scenario.best_route.swap_count(),
        "simulating best route"
    );

    let planner = AlphaFeePlanner::from_config(config);
    let result = planner.calculate(AlphaFeeParams {
        best_route: &scenario.best_route,
        best_amm_route: scenario.amm_route.as_ref(),
        prices: &scenario.prices,
        bucket: scenario.bucket(),
    });

    match result {
        Ok(fee) => Ok(serde_json::to_value(&fee)?),
        Err(e) => {
            tracing::warn!(code = e.error_code(), error = %e, "no alpha fee for scenario");
            Ok(json!({
                "error": {
                    "code": e.error_code(),
                    "message": e.to_string(),
                }
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn demo(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../demos").join(name)
    }

    #[test]
    fn test_demo_scenario_runs_proportional_planner() {
        let output = run(&demo("scenario.json"), &demo("config.json")).unwrap();
        assert_eq!(output["kind"], "swaps");
        assert_eq!(output["ammAmount"], "780000000");
        assert_eq!(output["swapReductions"][0]["reduceAmount"], "16823914");
        assert_eq!(output["swapReductions"][1]["reduceAmount"], "14858478");
    }

    #[test]
    fn test_missing_scenario_file() {
        let err = run(&demo("missing.json"), &demo("config.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
