//! Normalized search space.
//!
//! Every optimizable parameter present in the starting point becomes one
//! dimension mapped onto [0, 1]. Decoding always clamps, so a decoded
//! candidate can never leave the declared range or a hard bound.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::constraints::ConstraintSet;
use crate::types::{OperatingParameters, ParameterKind, ParameterSpace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub kind: ParameterKind,
    pub min: f64,
    pub max: f64,
}

impl Dimension {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    fn encode(&self, value: f64) -> f64 {
        if self.span() <= 0.0 {
            0.5
        } else {
            ((value - self.min) / self.span()).clamp(0.0, 1.0)
        }
    }

    fn decode(&self, u: f64) -> f64 {
        let u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.5 };
        self.min + u * self.span()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpace {
    dimensions: Vec<Dimension>,
    /// Fixed entries and the template every candidate is built from
    template: OperatingParameters,
}

impl SearchSpace {
    /// Assumes `constraints.check(declared)` already passed.
    pub fn new(declared: &ParameterSpace, constraints: &ConstraintSet, start: &OperatingParameters) -> Self {
        let dimensions = declared
            .ranges
            .iter()
            .filter(|(kind, def)| def.is_optimizable && start.get(**kind).is_some())
            .map(|(kind, def)| {
                let (min, max) = constraints.effective_range(*kind, def.min, def.max);
                Dimension { kind: *kind, min, max }
            })
            .collect();
        let mut space = Self {
            dimensions,
            template: start.clone(),
        };
        // Non-optimizable entries still honour hard bounds
        for (kind, bound) in &constraints.bounds {
            if let Some(v) = start.get(*kind) {
                if !space.dimensions.iter().any(|d| d.kind == *kind) {
                    space.template = space.template.with_value(*kind, v.clamp(bound.min, bound.max));
                }
            }
        }
        space
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn encode(&self, params: &OperatingParameters) -> Vec<f64> {
        self.dimensions
            .iter()
            .map(|d| d.encode(params.get(d.kind).unwrap_or(d.min)))
            .collect()
    }

    /// Fresh parameter value for a normalized point
    pub fn decode(&self, x: &[f64]) -> OperatingParameters {
        self.dimensions
            .iter()
            .zip(x)
            .fold(self.template.clone(), |p, (d, u)| p.with_value(d.kind, d.decode(*u)))
    }

    pub fn clamp(x: &mut [f64]) {
        for u in x.iter_mut() {
            *u = if u.is_finite() { u.clamp(0.0, 1.0) } else { 0.5 };
        }
    }

    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.len()).map(|_| rng.gen::<f64>()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fixed_parameters_are_not_dimensions() {
        let declared = ParameterSpace::pem();
        let start = declared.defaults();
        let space = SearchSpace::new(&declared, &ConstraintSet::new(), &start);
        assert!(space.dimensions().iter().all(|d| d.kind != ParameterKind::MixingSpeed));
        assert!(space.dimensions().iter().any(|d| d.kind == ParameterKind::Pressure));
    }

    #[test]
    fn test_decode_respects_bounds() {
        let declared = ParameterSpace::microbial();
        let start = declared.defaults();
        let constraints = ConstraintSet::new().with_bound(ParameterKind::Temperature, 25.0, 35.0);
        let space = SearchSpace::new(&declared, &constraints, &start);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let mut x = space.random_point(&mut rng);
            x.iter_mut().for_each(|u| *u = *u * 3.0 - 1.0);
            let p = space.decode(&x);
            assert!(p.validate(&declared).is_ok());
            assert!(constraints.within_bounds(&p));
        }
    }

    #[test]
    fn test_encode_decode_start() {
        let declared = ParameterSpace::microbial();
        let start = declared.defaults();
        let space = SearchSpace::new(&declared, &ConstraintSet::new(), &start);
        let back = space.decode(&space.encode(&start));
        for (kind, v) in start.entries() {
            assert!((back.get(kind).unwrap() - v).abs() < 1e-9);
        }
    }
}
