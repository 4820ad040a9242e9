//! Human-readable parameter changes between two operating points.

use serde::{Deserialize, Serialize};

use crate::types::{OperatingParameters, ParameterKind};

/// Relative change (%) below which a parameter is reported as maintained
const MAINTAIN_THRESHOLD_PERCENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
    Maintain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub parameter: ParameterKind,
    pub direction: Direction,
    /// Signed relative change (%)
    pub percent_change: f64,
    pub rationale: String,
}

pub fn recommend(initial: &OperatingParameters, optimized: &OperatingParameters) -> Vec<Recommendation> {
    initial
        .entries()
        .into_iter()
        .filter_map(|(kind, before)| optimized.get(kind).map(|after| (kind, before, after)))
        .map(|(kind, before, after)| {
            let percent_change = if before.abs() > f64::EPSILON {
                (after - before) / before.abs() * 100.0
            } else if (after - before).abs() > f64::EPSILON {
                100.0 * (after - before).signum()
            } else {
                0.0
            };
            let direction = if percent_change.abs() < MAINTAIN_THRESHOLD_PERCENT {
                Direction::Maintain
            } else if percent_change > 0.0 {
                Direction::Increase
            } else {
                Direction::Decrease
            };
            let rationale = match direction {
                Direction::Maintain => format!("{} is already near its optimum at {:.3} {}", kind, before, kind.unit()),
                _ => format!(
                    "Move {} from {:.3} to {:.3} {} ({:+.1}%)",
                    kind,
                    before,
                    after,
                    kind.unit(),
                    percent_change
                ),
            };
            Recommendation { parameter: kind, direction, percent_change, rationale }
        })
        .collect()
}
