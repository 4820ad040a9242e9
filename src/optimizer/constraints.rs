//! # Constraint Evaluator
//!
//! Hard per-parameter bounds and soft metric constraints.
//!
//! Hard bounds narrow the search space; candidates are clamped into it and
//! never evaluated outside. Soft constraints are scored after prediction:
//! each contributes its normalized violation magnitude to a penalty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ValidationError};
use crate::fidelity::PredictionResult;
use crate::types::{OperatingParameters, ParameterKind, ParameterSpace};

/// Closed interval on one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: f64,
    pub max: f64,
}

/// Quantity read from a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    PowerDensity,
    CurrentDensity,
    Efficiency,
    StackVoltage,
    TotalPower,
    /// Peak of the thermal profile, or the inlet temperature below
    /// Intermediate fidelity
    PeakTemperature,
    /// Hourly operating cost from the cost model
    Cost,
}

impl Metric {
    pub fn value(&self, result: &PredictionResult, params: &OperatingParameters, cost: f64) -> f64 {
        match self {
            Metric::PowerDensity => result.power_density,
            Metric::CurrentDensity => result.current_density,
            Metric::Efficiency => result.efficiency,
            Metric::StackVoltage => result.stack_voltage,
            Metric::TotalPower => result.total_power,
            Metric::PeakTemperature => result.peak_temperature().unwrap_or(params.temperature),
            Metric::Cost => cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    AtLeast,
    AtMost,
}

/// `metric (≥|≤) threshold`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedConstraint {
    pub metric: Metric,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl DerivedConstraint {
    /// Violation relative to the threshold magnitude; 0 when satisfied.
    pub fn violation(&self, value: f64) -> f64 {
        let scale = self.threshold.abs().max(1.0);
        let gap = match self.comparison {
            Comparison::AtLeast => self.threshold - value,
            Comparison::AtMost => value - self.threshold,
        };
        if value.is_finite() {
            gap.max(0.0) / scale
        } else {
            f64::INFINITY
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConstraintSet {
    pub bounds: BTreeMap<ParameterKind, Bound>,
    pub derived: Vec<DerivedConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bound(mut self, kind: ParameterKind, min: f64, max: f64) -> Self {
        self.bounds.insert(kind, Bound { min, max });
        self
    }

    pub fn at_least(mut self, metric: Metric, threshold: f64) -> Self {
        self.derived.push(DerivedConstraint { metric, comparison: Comparison::AtLeast, threshold });
        self
    }

    pub fn at_most(mut self, metric: Metric, threshold: f64) -> Self {
        self.derived.push(DerivedConstraint { metric, comparison: Comparison::AtMost, threshold });
        self
    }

    /// Rejects sets no candidate can satisfy. Runs before any evaluation.
    pub fn check(&self, space: &ParameterSpace) -> Result<(), EngineError> {
        for (kind, bound) in &self.bounds {
            if !bound.min.is_finite() || !bound.max.is_finite() {
                return Err(EngineError::Infeasible(format!("bound on {} is not finite", kind)));
            }
            if bound.min > bound.max {
                return Err(EngineError::Infeasible(format!(
                    "bound on {} has min {} > max {}",
                    kind, bound.min, bound.max
                )));
            }
            let def = space
                .get(*kind)
                .ok_or_else(|| ValidationError::UndeclaredParameter(kind.name().to_string()))?;
            if bound.min.max(def.min) > bound.max.min(def.max) {
                return Err(EngineError::Infeasible(format!(
                    "bound [{}, {}] on {} misses the declared range [{}, {}]",
                    bound.min, bound.max, kind, def.min, def.max
                )));
            }
        }
        if let Some(bad) = self.derived.iter().find(|c| !c.threshold.is_finite()) {
            return Err(EngineError::Infeasible(format!("threshold on {:?} is not finite", bad.metric)));
        }
        Ok(())
    }

    /// Effective [min, max] for `kind`: declared range ∩ hard bound
    pub fn effective_range(&self, kind: ParameterKind, declared_min: f64, declared_max: f64) -> (f64, f64) {
        match self.bounds.get(&kind) {
            Some(b) => (b.min.max(declared_min), b.max.min(declared_max)),
            None => (declared_min, declared_max),
        }
    }

    /// Sum of normalized soft-constraint violations
    pub fn violation(&self, result: &PredictionResult, params: &OperatingParameters, cost: f64) -> f64 {
        self.derived
            .iter()
            .map(|c| c.violation(c.metric.value(result, params, cost)))
            .sum()
    }

    /// True when `params` lie inside every hard bound
    pub fn within_bounds(&self, params: &OperatingParameters) -> bool {
        self.bounds.iter().all(|(kind, b)| {
            params.get(*kind).map_or(true, |v| v >= b.min - 1e-9 && v <= b.max + 1e-9)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_above_max_is_infeasible() {
        let set = ConstraintSet::new().with_bound(ParameterKind::Temperature, 60.0, 40.0);
        let err = set.check(&ParameterSpace::pem()).unwrap_err();
        assert!(matches!(err, EngineError::Infeasible(_)));
    }

    #[test]
    fn test_disjoint_bound_is_infeasible() {
        let set = ConstraintSet::new().with_bound(ParameterKind::Temperature, 200.0, 300.0);
        assert!(matches!(set.check(&ParameterSpace::pem()), Err(EngineError::Infeasible(_))));
    }

    #[test]
    fn test_undeclared_bound_is_validation_error() {
        let set = ConstraintSet::new().with_bound(ParameterKind::Humidity, 10.0, 20.0);
        let err = set.check(&ParameterSpace::microbial()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_effective_range() {
        let set = ConstraintSet::new().with_bound(ParameterKind::Temperature, 50.0, 120.0);
        assert_eq!(set.effective_range(ParameterKind::Temperature, 20.0, 95.0), (50.0, 95.0));
        assert_eq!(set.effective_range(ParameterKind::Ph, 0.0, 14.0), (0.0, 14.0));
    }

    #[test]
    fn test_derived_violation() {
        let c = DerivedConstraint { metric: Metric::Efficiency, comparison: Comparison::AtLeast, threshold: 50.0 };
        assert_eq!(c.violation(60.0), 0.0);
        assert!((c.violation(40.0) - 0.2).abs() < 1e-12);
        let c = DerivedConstraint { metric: Metric::PeakTemperature, comparison: Comparison::AtMost, threshold: 80.0 };
        assert_eq!(c.violation(70.0), 0.0);
        assert!(c.violation(90.0) > 0.0);
        assert!(c.violation(f64::NAN).is_infinite());
    }
}
