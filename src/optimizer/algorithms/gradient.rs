//! Gradient ascent with central finite differences.
//!
//! Iterations alternate between a sampling generation (center plus ±h along
//! each axis) and a line-search generation (steps of lr, lr/2, lr/4 along the
//! estimated gradient). A failed line search halves the learning rate.

use rand::rngs::StdRng;

use super::{fitness_of, SearchStrategy};
use crate::optimizer::evaluator::Evaluation;
use crate::optimizer::run::IterationRecord;
use crate::optimizer::{Algorithm, OptimizationConfig};

const LINE_SEARCH_STEPS: usize = 3;
const MIN_LEARNING_RATE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Sample,
    LineSearch,
}

pub struct GradientSearch {
    dims: usize,
    learning_rate: f64,
    h: f64,
    phase: Phase,
    current: Option<(Vec<f64>, f64)>,
    direction: Vec<f64>,
}

impl GradientSearch {
    pub fn new(config: &OptimizationConfig, dims: usize) -> Self {
        Self {
            dims,
            learning_rate: config.learning_rate.max(MIN_LEARNING_RATE),
            h: config.perturbation.clamp(1e-9, 0.25),
            phase: Phase::Sample,
            current: None,
            direction: vec![0.0; dims],
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn samples(&self, x: &[f64]) -> Vec<Vec<f64>> {
        let mut out = Vec::with_capacity(2 * self.dims + 1);
        out.push(x.to_vec());
        for i in 0..self.dims {
            let mut plus = x.to_vec();
            plus[i] += self.h;
            let mut minus = x.to_vec();
            minus[i] -= self.h;
            out.push(plus);
            out.push(minus);
        }
        out
    }

    /// Gradient scaled so its largest component is 1.
    ///
    /// Differences are divided by the spacing of the points actually
    /// evaluated; a point pushed past a wall is clamped back onto it.
    fn estimate_direction(&mut self, evaluations: &[Evaluation]) {
        let f0 = evaluations.first().map(fitness_of).unwrap_or(f64::NEG_INFINITY);
        let scale = f0.abs().max(1e-12);
        let mut g: Vec<f64> = (0..self.dims)
            .map(|i| match (evaluations.get(1 + 2 * i), evaluations.get(2 + 2 * i)) {
                (Some(plus), Some(minus)) => {
                    let (p, m) = (fitness_of(plus), fitness_of(minus));
                    let spacing = match (plus.x.get(i), minus.x.get(i)) {
                        (Some(a), Some(b)) => a - b,
                        _ => 0.0,
                    };
                    if p.is_finite() && m.is_finite() && spacing > 0.0 {
                        (p - m) / spacing / scale
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            })
            .collect();
        let largest = g.iter().fold(0.0f64, |a, v| a.max(v.abs()));
        if largest > 0.0 {
            g.iter_mut().for_each(|v| *v /= largest);
        }
        self.direction = g;
    }
}

impl SearchStrategy for GradientSearch {
    fn algorithm(&self) -> Algorithm {
        Algorithm::GradientDescent
    }

    fn step(&mut self, best: &Evaluation, _rng: &mut StdRng) -> Vec<Vec<f64>> {
        let (x, _) = self
            .current
            .get_or_insert_with(|| (best.x.clone(), fitness_of(best)))
            .clone();
        match self.phase {
            Phase::Sample => self.samples(&x),
            Phase::LineSearch => (0..LINE_SEARCH_STEPS)
                .map(|k| {
                    let step = self.learning_rate / 2f64.powi(k as i32);
                    x.iter().zip(&self.direction).map(|(u, g)| u + step * g).collect()
                })
                .collect(),
        }
    }

    fn observe(&mut self, evaluations: &[Evaluation]) {
        match self.phase {
            Phase::Sample => {
                if let (Some(center), Some(current)) = (evaluations.first(), self.current.as_mut()) {
                    if center.fitness.is_finite() {
                        current.1 = center.fitness;
                    }
                }
                self.estimate_direction(evaluations);
                self.phase = Phase::LineSearch;
            }
            Phase::LineSearch => {
                let best = evaluations
                    .iter()
                    .filter(|e| e.fitness.is_finite())
                    .max_by(|a, b| a.fitness.total_cmp(&b.fitness));
                match (best, self.current.as_mut()) {
                    (Some(e), Some(current)) if e.fitness > current.1 => {
                        *current = (e.x.clone(), e.fitness);
                    }
                    _ => self.learning_rate *= 0.5,
                }
                self.phase = Phase::Sample;
            }
        }
    }

    fn has_converged(&self, _history: &[IterationRecord]) -> bool {
        self.learning_rate < MIN_LEARNING_RATE
            || (self.phase == Phase::LineSearch && self.direction.iter().all(|g| *g == 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_sample_layout() {
        let search = GradientSearch::new(&OptimizationConfig::default(), 2);
        let samples = search.samples(&[0.5, 0.5]);
        assert_eq!(samples.len(), 5);
        assert!(samples[1][0] > 0.5 && samples[2][0] < 0.5);
        assert_eq!(samples[3][0], 0.5);
    }

    #[test]
    fn test_climbs_toward_peak() {
        let mut search = GradientSearch::new(&OptimizationConfig::default(), 2);
        let best = drive(&mut search, vec![0.8, 0.8], 40);
        assert!(best > -0.01, "best {}", best);
    }

    #[test]
    fn test_difference_uses_clamped_spacing() {
        let config = OptimizationConfig { perturbation: 0.1, ..Default::default() };
        let mut search = GradientSearch::new(&config, 2);
        // Axis 0 sits on the lower wall, so its minus point lands on 0.0
        // and the spacing is h rather than 2h. Slope along axis 0 is 2,
        // along axis 1 it is 1.
        let line = |x: &[f64]| 10.0 + 2.0 * x[0] + x[1];
        let evals: Vec<_> = search
            .samples(&[0.0, 0.5])
            .into_iter()
            .map(|mut x| {
                crate::optimizer::SearchSpace::clamp(&mut x);
                let f = line(&x);
                evaluation(x, f)
            })
            .collect();
        search.observe(&evals);
        assert!((search.direction[0] - 1.0).abs() < 1e-9);
        assert!((search.direction[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_line_search_halves_rate() {
        let config = OptimizationConfig::default();
        let mut search = GradientSearch::new(&config, 1);
        let start = evaluation(vec![0.3], 0.0);
        let mut rng = rand::SeedableRng::seed_from_u64(1);
        let samples = search.step(&start, &mut rng);
        let evals: Vec<_> = samples.into_iter().map(|x| { let f = bowl(&x); evaluation(x, f) }).collect();
        search.observe(&evals);
        let steps = search.step(&start, &mut rng);
        let worse: Vec<_> = steps.into_iter().map(|x| evaluation(x, -1.0)).collect();
        search.observe(&worse);
        assert!((search.learning_rate() - config.learning_rate * 0.5).abs() < 1e-15);
    }
}
