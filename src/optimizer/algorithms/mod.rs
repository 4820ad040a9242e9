//! # Search Strategies
//!
//! Every strategy works in normalized coordinates and alternates between
//! proposing a generation and observing its evaluations. The run loop owns
//! evaluation, best-so-far tracking and plateau detection.

mod bayesian;
mod genetic;
mod gradient;
mod swarm;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::evaluator::Evaluation;
use super::run::IterationRecord;
use super::{Algorithm, OptimizationConfig};

pub use bayesian::BayesianSearch;
pub use genetic::GeneticSearch;
pub use gradient::GradientSearch;
pub use swarm::SwarmSearch;

/// Acquisition function for the Bayesian surrogate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acquisition {
    ExpectedImprovement,
    UpperConfidenceBound,
}

pub trait SearchStrategy: Send {
    fn algorithm(&self) -> Algorithm;

    /// Next generation of normalized candidates. `best` is the best-so-far
    /// evaluation of the run (the baseline on the first call).
    fn step(&mut self, best: &Evaluation, rng: &mut StdRng) -> Vec<Vec<f64>>;

    /// Results for the last proposal, in proposal order
    fn observe(&mut self, evaluations: &[Evaluation]);

    /// Strategy-specific stopping criterion
    fn has_converged(&self, _history: &[IterationRecord]) -> bool {
        false
    }
}

pub fn strategy_for(algorithm: Algorithm, config: &OptimizationConfig, dims: usize) -> Box<dyn SearchStrategy> {
    match algorithm {
        Algorithm::GradientDescent => Box::new(GradientSearch::new(config, dims)),
        Algorithm::GeneticAlgorithm => Box::new(GeneticSearch::new(config, dims)),
        Algorithm::Bayesian => Box::new(BayesianSearch::new(config, dims)),
        Algorithm::ParticleSwarm => Box::new(SwarmSearch::new(config, dims)),
    }
}

/// Fitness with NaN treated as the worst possible value
pub(crate) fn fitness_of(e: &Evaluation) -> f64 {
    if e.fitness.is_nan() {
        f64::NEG_INFINITY
    } else {
        e.fitness
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use rand::SeedableRng;

    use super::*;
    use crate::types::OperatingParameters;

    pub fn evaluation(x: Vec<f64>, fitness: f64) -> Evaluation {
        Evaluation {
            x,
            params: OperatingParameters::default(),
            result: None,
            objectives: vec![fitness],
            score: fitness,
            violation: 0.0,
            fitness,
            error: None,
        }
    }

    /// Concave bowl peaking at 0.3 in every coordinate
    pub fn bowl(x: &[f64]) -> f64 {
        -x.iter().map(|u| (u - 0.3).powi(2)).sum::<f64>()
    }

    /// Runs a strategy against `bowl` and returns the best fitness found.
    pub fn drive(strategy: &mut dyn SearchStrategy, start: Vec<f64>, iterations: usize) -> f64 {
        let mut rng = StdRng::seed_from_u64(11);
        let f0 = bowl(&start);
        let mut best = evaluation(start, f0);
        for _ in 0..iterations {
            let xs = strategy.step(&best, &mut rng);
            let evals: Vec<Evaluation> = xs
                .into_iter()
                .map(|mut x| {
                    crate::optimizer::SearchSpace::clamp(&mut x);
                    let f = bowl(&x);
                    evaluation(x, f)
                })
                .collect();
            for e in &evals {
                if e.fitness > best.fitness {
                    best = e.clone();
                }
            }
            strategy.observe(&evals);
            if strategy.has_converged(&[]) {
                break;
            }
        }
        best.fitness
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_every_strategy_improves_on_a_bowl() {
        let config = OptimizationConfig::default();
        for algorithm in Algorithm::ALL {
            let mut strategy = strategy_for(algorithm, &config, 3);
            assert_eq!(strategy.algorithm(), algorithm);
            let start = vec![0.9, 0.1, 0.8];
            let before = bowl(&start);
            let after = drive(strategy.as_mut(), start, 30);
            assert!(after > before, "{} did not improve: {} -> {}", algorithm, before, after);
        }
    }

    #[test]
    fn test_acquisition_wire_names() {
        let json = serde_json::to_string(&Acquisition::UpperConfidenceBound).unwrap();
        assert_eq!(json, "\"upper_confidence_bound\"");
    }
}
