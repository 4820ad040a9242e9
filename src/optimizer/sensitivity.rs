//! Local sensitivity of the objective to each searched parameter at the
//! optimum, by central differences.

use serde::{Deserialize, Serialize};

use super::evaluator::{Evaluation, Evaluator};
use crate::types::ParameterKind;

/// Normalized half-width of the perturbation
const STEP: f64 = 0.02;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSensitivity {
    pub parameter: ParameterKind,
    /// Objective change per unit of the parameter
    pub gradient: f64,
    /// Relative objective change per relative parameter change
    pub elasticity: f64,
    /// 1 = most influential
    pub rank: usize,
}

pub fn analyze(evaluator: &Evaluator<'_>, best: &Evaluation) -> Vec<ParameterSensitivity> {
    let dims = evaluator.space().dimensions().to_vec();
    let mut samples = Vec::with_capacity(2 * dims.len());
    for i in 0..dims.len() {
        let mut plus = best.x.clone();
        plus[i] = (plus[i] + STEP).min(1.0);
        let mut minus = best.x.clone();
        minus[i] = (minus[i] - STEP).max(0.0);
        samples.push(plus);
        samples.push(minus);
    }
    let results = evaluator.evaluate_batch(samples);

    let mut out: Vec<ParameterSensitivity> = dims
        .iter()
        .enumerate()
        .filter_map(|(i, dim)| {
            let plus = results.get(2 * i)?;
            let minus = results.get(2 * i + 1)?;
            if !plus.score.is_finite() || !minus.score.is_finite() {
                return None;
            }
            let dv = plus.params.get(dim.kind)? - minus.params.get(dim.kind)?;
            let gradient = if dv.abs() > f64::EPSILON { (plus.score - minus.score) / dv } else { 0.0 };
            let value = best.params.get(dim.kind)?;
            let elasticity = if best.score.abs() > f64::EPSILON {
                gradient * value / best.score
            } else {
                0.0
            };
            Some(ParameterSensitivity { parameter: dim.kind, gradient, elasticity, rank: 0 })
        })
        .collect();

    out.sort_by(|a, b| b.elasticity.abs().total_cmp(&a.elasticity.abs()));
    for (i, s) in out.iter_mut().enumerate() {
        s.rank = i + 1;
    }
    out
}
