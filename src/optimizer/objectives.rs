//! # Objective Functions
//!
//! Every objective is expressed as "higher is better"; costs are negated.

use serde::{Deserialize, Serialize};

use super::constraints::Metric;
use crate::error::{EngineError, ValidationError};
use crate::fidelity::PredictionResult;
use crate::types::OperatingParameters;

/// Floor for baseline magnitudes used as normalizers
const MIN_NORMALIZER: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedTerm {
    pub metric: Metric,
    /// Negative weights minimize
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectiveSpec {
    MaximizePower,
    MaximizeEfficiency,
    MinimizeCost,
    WeightedCustom { terms: Vec<WeightedTerm> },
}

impl ObjectiveSpec {
    pub fn value(&self, result: &PredictionResult, params: &OperatingParameters, cost: f64) -> f64 {
        match self {
            ObjectiveSpec::MaximizePower => result.power_density,
            ObjectiveSpec::MaximizeEfficiency => result.efficiency,
            ObjectiveSpec::MinimizeCost => -cost,
            ObjectiveSpec::WeightedCustom { terms } => terms
                .iter()
                .map(|t| t.weight * t.metric.value(result, params, cost))
                .sum(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ObjectiveSpec::MaximizePower => "maximize power",
            ObjectiveSpec::MaximizeEfficiency => "maximize efficiency",
            ObjectiveSpec::MinimizeCost => "minimize cost",
            ObjectiveSpec::WeightedCustom { .. } => "weighted custom",
        }
    }

    /// True when the cost model must run for this objective
    pub fn needs_cost(&self) -> bool {
        match self {
            ObjectiveSpec::MinimizeCost => true,
            ObjectiveSpec::WeightedCustom { terms } => terms.iter().any(|t| t.metric == Metric::Cost),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiObjectiveMode {
    Single,
    WeightedSum,
    /// Weighted sum drives the search; the front is computed over every
    /// evaluated candidate
    Pareto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveSet {
    specs: Vec<ObjectiveSpec>,
    weights: Vec<f64>,
    mode: MultiObjectiveMode,
}

impl ObjectiveSet {
    pub fn single(spec: ObjectiveSpec) -> Self {
        Self {
            specs: vec![spec],
            weights: vec![1.0],
            mode: MultiObjectiveMode::Single,
        }
    }

    /// `weights = None` gives equal weights. A lone objective stays single.
    pub fn multi(
        specs: Vec<ObjectiveSpec>,
        weights: Option<Vec<f64>>,
        pareto: bool,
    ) -> Result<Self, EngineError> {
        match specs.as_slice() {
            [] => return Err(ValidationError::InvalidObjective("no objective given".to_string()).into()),
            [only] if !pareto => return Ok(Self::single(only.clone())),
            _ => {}
        }
        let n = specs.len();
        let weights = match weights {
            None => vec![1.0 / n as f64; n],
            Some(w) if w.len() == n && w.iter().all(|x| x.is_finite() && *x >= 0.0) && w.iter().sum::<f64>() > 0.0 => w,
            Some(_) => {
                return Err(ValidationError::InvalidObjective(format!(
                    "expected {} non-negative weights with a positive sum",
                    n
                ))
                .into())
            }
        };
        let mode = if pareto { MultiObjectiveMode::Pareto } else { MultiObjectiveMode::WeightedSum };
        Ok(Self { specs, weights, mode })
    }

    pub fn specs(&self) -> &[ObjectiveSpec] {
        &self.specs
    }

    pub fn mode(&self) -> MultiObjectiveMode {
        self.mode
    }

    pub fn needs_cost(&self) -> bool {
        self.specs.iter().any(ObjectiveSpec::needs_cost)
    }

    pub fn values(&self, result: &PredictionResult, params: &OperatingParameters, cost: f64) -> Vec<f64> {
        self.specs.iter().map(|s| s.value(result, params, cost)).collect()
    }

    /// Baseline magnitudes; each objective is divided by its own.
    pub fn normalizers(baseline: &[f64]) -> Vec<f64> {
        baseline.iter().map(|v| v.abs().max(MIN_NORMALIZER)).collect()
    }

    pub fn scalarize(&self, values: &[f64], normalizers: &[f64]) -> f64 {
        match self.mode {
            MultiObjectiveMode::Single => values.first().copied().unwrap_or(f64::NEG_INFINITY),
            _ => values
                .iter()
                .zip(&self.weights)
                .zip(normalizers)
                .map(|((v, w), n)| w * v / n)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_default_weights() {
        let set = ObjectiveSet::multi(
            vec![ObjectiveSpec::MaximizePower, ObjectiveSpec::MaximizeEfficiency],
            None,
            false,
        )
        .unwrap();
        assert_eq!(set.mode(), MultiObjectiveMode::WeightedSum);
        let norms = ObjectiveSet::normalizers(&[100.0, 50.0]);
        // baseline scalarizes to 1
        assert!((set.scalarize(&[100.0, 50.0], &norms) - 1.0).abs() < 1e-12);
        assert!(set.scalarize(&[120.0, 50.0], &norms) > 1.0);
    }

    #[test]
    fn test_single_spec_collapses() {
        let set = ObjectiveSet::multi(vec![ObjectiveSpec::MinimizeCost], None, false).unwrap();
        assert_eq!(set.mode(), MultiObjectiveMode::Single);
        assert!(set.needs_cost());
        assert_eq!(set.scalarize(&[-3.0], &[3.0]), -3.0);
    }

    #[test]
    fn test_bad_weights_rejected() {
        let specs = vec![ObjectiveSpec::MaximizePower, ObjectiveSpec::MinimizeCost];
        assert!(ObjectiveSet::multi(specs.clone(), Some(vec![1.0]), false).is_err());
        assert!(ObjectiveSet::multi(specs, Some(vec![-1.0, 2.0]), false).is_err());
        let err = ObjectiveSet::multi(Vec::new(), None, false).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_spec_wire_names() {
        let json = serde_json::to_string(&ObjectiveSpec::MaximizePower).unwrap();
        assert_eq!(json, "\"maximizePower\"");
        let custom: ObjectiveSpec = serde_json::from_str(
            r#"{"weightedCustom":{"terms":[{"metric":"efficiency","weight":1.0},{"metric":"cost","weight":-0.5}]}}"#,
        )
        .unwrap();
        assert!(custom.needs_cost());
    }
}
