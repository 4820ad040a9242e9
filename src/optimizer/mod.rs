//! # Operating-Point Optimizer
//!
//! Searches the optimizable operating parameters of one reactor, using the
//! prediction engine as a black-box objective.
//!
//! ## Pipeline
//!
//! ```text
//! request ─► ConstraintSet::check ─► SearchSpace (normalized [0,1]^d)
//!         ─► baseline evaluation
//!         ─► loop { strategy.step ─► parallel evaluation ─► strategy.observe }
//!         ─► best-so-far, sensitivity, Pareto front, recommendations
//! ```
//!
//! ## Algorithms
//!
//! - Gradient descent: central finite differences with backtracking
//! - Genetic algorithm: tournament + SBX + Gaussian mutation, elitist
//! - Bayesian: Gaussian-process surrogate with EI / UCB acquisition
//! - Particle swarm: inertia + personal + global pulls

pub mod algorithms;
pub mod constraints;
pub mod cost_model;
pub mod evaluator;
pub mod objectives;
pub mod pareto;
pub mod recommendations;
pub mod run;
pub mod sensitivity;
pub mod space;
pub mod utils;

use serde::{Deserialize, Serialize};

use crate::types::FidelityLevel;

pub use algorithms::{Acquisition, SearchStrategy};
pub use constraints::{Bound, Comparison, ConstraintSet, DerivedConstraint, Metric};
pub use cost_model::{CostBreakdown, CostModel};
pub use evaluator::{Evaluation, Evaluator};
pub use objectives::{MultiObjectiveMode, ObjectiveSet, ObjectiveSpec, WeightedTerm};
pub use pareto::{dominates, ParetoPoint};
pub use recommendations::{recommend, Direction, Recommendation};
pub use run::{
    CancellationToken, IterationRecord, OptimizationEngine, OptimizationRequest, OptimizationRun,
    RunOutcome,
};
pub use sensitivity::ParameterSensitivity;
pub use space::{Dimension, SearchSpace};

/// Search algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    GradientDescent,
    GeneticAlgorithm,
    Bayesian,
    ParticleSwarm,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::GradientDescent,
        Algorithm::GeneticAlgorithm,
        Algorithm::Bayesian,
        Algorithm::ParticleSwarm,
    ];
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Algorithm::GradientDescent => "gradient_descent",
            Algorithm::GeneticAlgorithm => "genetic_algorithm",
            Algorithm::Bayesian => "bayesian",
            Algorithm::ParticleSwarm => "particle_swarm",
        };
        write!(f, "{}", s)
    }
}

/// Optimizer defaults. Per-request overrides live on [`OptimizationRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    pub max_iterations: usize,
    /// Relative improvement below which a run counts as converged
    pub tolerance: f64,
    /// Iterations without improvement before a plateau is declared
    pub convergence_window: usize,
    /// Fixed seed for reproducible runs; `None` draws from entropy
    pub seed: Option<u64>,
    /// Fidelity used for every candidate evaluation
    pub fidelity: FidelityLevel,
    /// Wall-clock budget (s)
    pub timeout_secs: Option<u64>,
    pub compute_sensitivity: bool,
    /// Penalty per unit of normalized constraint violation, relative to the
    /// baseline score magnitude
    pub penalty_weight: f64,

    // Gradient descent
    /// Step size in normalized coordinates
    pub learning_rate: f64,
    /// Finite-difference half-width in normalized coordinates
    pub perturbation: f64,

    // Genetic algorithm
    pub population_size: usize,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    /// Mutation standard deviation in normalized coordinates
    pub mutation_sigma: f64,
    /// SBX distribution index
    pub sbx_eta: f64,

    // Bayesian
    pub acquisition: Acquisition,
    /// UCB exploration weight κ
    pub exploration: f64,
    /// RBF length scale in normalized coordinates
    pub length_scale: f64,
    /// Random points scored by the acquisition per iteration
    pub acquisition_samples: usize,

    // Particle swarm
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
    /// Largest per-dimension velocity in normalized coordinates
    pub max_velocity: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
            convergence_window: 10,
            seed: Some(42),
            fidelity: FidelityLevel::Basic,
            timeout_secs: None,
            compute_sensitivity: true,
            penalty_weight: 10.0,
            learning_rate: 0.1,
            perturbation: 1e-3,
            population_size: 20,
            crossover_prob: 0.9,
            mutation_prob: 0.2,
            mutation_sigma: 0.1,
            sbx_eta: 20.0,
            acquisition: Acquisition::ExpectedImprovement,
            exploration: 2.0,
            length_scale: 0.2,
            acquisition_samples: 256,
            inertia: 0.7,
            cognitive: 1.5,
            social: 1.5,
            max_velocity: 0.2,
        }
    }
}
