//! Pareto dominance and non-dominated sorting over objective vectors
//! (higher is better on every axis).

use serde::{Deserialize, Serialize};

use crate::types::OperatingParameters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoPoint {
    pub parameters: OperatingParameters,
    pub objectives: Vec<f64>,
}

/// `a` dominates `b`: ≥ on every objective and > on at least one
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    let mut strictly = false;
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return false;
        }
        if x > y {
            strictly = true;
        }
    }
    strictly
}

/// Fronts of indices, front 0 first
pub fn non_dominated_sort(points: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = points.len();
    let mut fronts: Vec<Vec<usize>> = vec![Vec::new()];
    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in 0..n {
            if i != j {
                if dominates(&points[i], &points[j]) {
                    dominated_by[i].push(j);
                } else if dominates(&points[j], &points[i]) {
                    domination_count[i] += 1;
                }
            }
        }
        if domination_count[i] == 0 {
            fronts[0].push(i);
        }
    }

    let mut current = 0;
    while !fronts[current].is_empty() {
        let mut next = Vec::new();
        for &i in &fronts[current] {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        current += 1;
        fronts.push(next);
    }

    fronts.pop();
    fronts
}

/// First front, duplicates (identical objective vectors) collapsed
pub fn front(candidates: &[(OperatingParameters, Vec<f64>)]) -> Vec<ParetoPoint> {
    let finite: Vec<&(OperatingParameters, Vec<f64>)> = candidates
        .iter()
        .filter(|(_, o)| !o.is_empty() && o.iter().all(|v| v.is_finite()))
        .collect();
    let points: Vec<Vec<f64>> = finite.iter().map(|(_, o)| o.clone()).collect();
    let mut out: Vec<ParetoPoint> = Vec::new();
    if let Some(first) = non_dominated_sort(&points).into_iter().next() {
        for i in first {
            let (params, objectives) = finite[i];
            if !out.iter().any(|p| &p.objectives == objectives) {
                out.push(ParetoPoint { parameters: params.clone(), objectives: objectives.clone() });
            }
        }
    }
    out
}
