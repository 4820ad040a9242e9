//! JSON request and response shapes (camelCase). Every float leaving the
//! core is rounded: magnitudes of one and above to a fixed number of
//! decimals, smaller ones to the same number of significant digits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fidelity::PredictionResult;
use crate::optimizer::{
    Algorithm, ConstraintSet, IterationRecord, MultiObjectiveMode, ObjectiveSpec, OptimizationRequest,
    OptimizationRun, ParameterSensitivity, ParetoPoint, Recommendation, RunOutcome,
};
use crate::types::{FidelityLevel, OperatingParameters, ReactorConfiguration};

fn default_fidelity() -> FidelityLevel {
    FidelityLevel::Basic
}

/// Either a catalog id or a full inline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_config: Option<ReactorConfiguration>,
    pub parameters: OperatingParameters,
    #[serde(default = "default_fidelity")]
    pub fidelity: FidelityLevel,
    /// Clamp out-of-range parameters instead of rejecting them
    #[serde(default)]
    pub clamp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationRequestWire {
    pub reactor_id: String,
    pub current_parameters: OperatingParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<ObjectiveSpec>,
    /// Multi-objective form; takes precedence over `objective`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<ObjectiveSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub pareto: bool,
    #[serde(default)]
    pub constraints: Option<ConstraintSet>,
    pub algorithm: Algorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fidelity: Option<FidelityLevel>,
}

impl OptimizationRequestWire {
    pub fn into_request(self) -> OptimizationRequest {
        let objectives = if self.objectives.is_empty() {
            self.objective.into_iter().collect()
        } else {
            self.objectives
        };
        OptimizationRequest {
            reactor_id: self.reactor_id,
            start: self.current_parameters,
            objectives,
            weights: self.weights,
            pareto: self.pareto,
            constraints: self.constraints.unwrap_or_default(),
            algorithm: self.algorithm,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            fidelity: self.fidelity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub score_before: f64,
    pub score_after: f64,
    /// Signed percentage, e.g. "12.34%"
    pub improvement: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResponse {
    pub run_id: String,
    pub reactor_id: String,
    pub algorithm: Algorithm,
    pub mode: MultiObjectiveMode,
    pub optimized_parameters: OperatingParameters,
    pub performance: Performance,
    pub objectives_before: Vec<f64>,
    pub objectives_after: Vec<f64>,
    pub iteration_log: Vec<IterationRecord>,
    pub recommendations: Vec<Recommendation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitivity: Vec<ParameterSensitivity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pareto_front: Vec<ParetoPoint>,
    pub converged: bool,
    pub outcome: RunOutcome,
    pub evaluations: usize,
    pub elapsed_ms: f64,
}

impl From<&OptimizationRun> for OptimizationResponse {
    fn from(run: &OptimizationRun) -> Self {
        Self {
            run_id: run.id.to_string(),
            reactor_id: run.reactor_id.clone(),
            algorithm: run.algorithm,
            mode: run.mode,
            optimized_parameters: run.best.params.clone(),
            performance: Performance {
                score_before: run.baseline.score,
                score_after: run.best.score,
                improvement: format!("{:.2}%", run.improvement_percent()),
            },
            objectives_before: run.baseline.objectives.clone(),
            objectives_after: run.best.objectives.clone(),
            iteration_log: run.history.clone(),
            recommendations: run.recommendations.clone(),
            sensitivity: run.sensitivity.clone(),
            pareto_front: run.pareto_front.clone(),
            converged: run.converged,
            outcome: run.outcome,
            evaluations: run.evaluations,
            elapsed_ms: run.elapsed_ms,
        }
    }
}

/// Rounds to `decimals` places, or to `decimals` significant digits below
/// one so flow rates and transfer coefficients in the 1e-5 range survive.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let magnitude = value.abs();
    if magnitude >= 1e15 {
        return value;
    }
    let places = if magnitude < 1.0 && magnitude > 0.0 {
        decimals.max(1) as i32 - 1 - magnitude.log10().floor() as i32
    } else {
        decimals as i32
    };
    let scale = 10f64.powi(places);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// Rounds every non-integer number in a JSON tree in place.
pub fn round_numbers(value: &mut Value, decimals: u32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n.as_f64().and_then(|v| serde_json::Number::from_f64(round_to(v, decimals))) {
                *n = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_numbers(v, decimals)),
        Value::Object(map) => map.values_mut().for_each(|v| round_numbers(v, decimals)),
        _ => {}
    }
}

/// Serializes `data` and rounds it for the wire.
pub fn to_wire<T: Serialize>(data: &T, decimals: u32) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(data)?;
    round_numbers(&mut value, decimals);
    Ok(value)
}

pub fn prediction_to_wire(result: &PredictionResult, decimals: u32) -> serde_json::Result<Value> {
    to_wire(result, decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 6), 1.234568);
        assert_eq!(round_to(1e300, 6), 1e300);
        assert_eq!(round_to(0.0, 6), 0.0);
        assert_eq!(round_to(0.25, 6), 0.25);
    }

    #[test]
    fn test_small_magnitudes_keep_significant_digits() {
        assert_eq!(round_to(-0.0000004, 6), -0.0000004);
        assert_eq!(round_to(5.23456789e-6, 6), 5.23457e-6);
        assert_eq!(round_to(1e-320, 6), 1e-320);

        let mut v = json!({
            "waterProductionMolS": 5.2e-6,
            "massTransferCoefficient": 1.234567891e-5,
            "transientCurrent": -3.3e-9
        });
        round_numbers(&mut v, 6);
        for (field, expected) in [
            ("waterProductionMolS", 5.2e-6),
            ("massTransferCoefficient", 1.23457e-5),
            ("transientCurrent", -3.3e-9),
        ] {
            let got = v[field].as_f64().unwrap();
            assert!(got != 0.0, "{} rounded to zero", field);
            assert!(((got - expected) / expected).abs() < 1e-9, "{}: {}", field, got);
        }
    }

    #[test]
    fn test_round_numbers_nested() {
        let mut v = json!({"a": 0.1234567, "b": [1, 2.9999999], "c": {"d": 3}});
        round_numbers(&mut v, 3);
        assert_eq!(v, json!({"a": 0.123, "b": [1, 3.0], "c": {"d": 3}}));
    }

    #[test]
    fn test_prediction_request_defaults() {
        let req: PredictionRequest = serde_json::from_str(
            r#"{"reactorId":"mfc-lab","parameters":{"temperature":30,"ph":7,"flowRate":10,"mixingSpeed":100,"voltage":0.5,"substrateConcentration":1}}"#,
        )
        .unwrap();
        assert_eq!(req.fidelity, FidelityLevel::Basic);
        assert!(!req.clamp);
        assert!(req.inline_config.is_none());
    }

    #[test]
    fn test_single_objective_request() {
        let wire: OptimizationRequestWire = serde_json::from_value(json!({
            "reactorId": "mfc-lab",
            "currentParameters": {"temperature":30,"ph":7,"flowRate":10,"mixingSpeed":100,"voltage":0.5,"substrateConcentration":1},
            "objective": "maximizePower",
            "algorithm": "bayesian",
            "maxIterations": 5,
            "constraints": {"bounds": {"temperature": {"min": 25.0, "max": 35.0}}, "derived": []}
        }))
        .unwrap();
        let request = wire.into_request();
        assert_eq!(request.objectives, vec![ObjectiveSpec::MaximizePower]);
        assert_eq!(request.algorithm, Algorithm::Bayesian);
        assert_eq!(request.max_iterations, Some(5));
        assert_eq!(request.constraints.bounds.len(), 1);
    }
}
