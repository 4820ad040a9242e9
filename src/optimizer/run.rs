//! # Optimization Runs
//!
//! Drives one search strategy against the prediction engine. Constraints are
//! checked before anything is evaluated, the starting point is evaluated as
//! the baseline, and the best-so-far candidate only ever improves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::algorithms::strategy_for;
use super::constraints::ConstraintSet;
use super::evaluator::{Evaluation, Evaluator};
use super::objectives::{MultiObjectiveMode, ObjectiveSet, ObjectiveSpec};
use super::pareto::{self, ParetoPoint};
use super::recommendations::{recommend, Recommendation};
use super::sensitivity::{self, ParameterSensitivity};
use super::space::SearchSpace;
use super::{Algorithm, OptimizationConfig};
use crate::error::{EngineError, NumericalError, Result};
use crate::prediction::PredictionEngine;
use crate::types::{FidelityLevel, OperatingParameters};

/// Cooperative stop flag, checked between iterations
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Converged,
    MaxIterations,
    Cancelled,
    TimedOut,
}

/// One generation of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationRecord {
    pub iteration: usize,
    /// Best candidate of this generation
    pub parameters: OperatingParameters,
    /// Its fitness
    pub objective_value: f64,
    /// Best fitness seen so far, baseline included
    pub best_so_far: f64,
    pub evaluations: usize,
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationRequest {
    pub reactor_id: String,
    pub start: OperatingParameters,
    pub objectives: Vec<ObjectiveSpec>,
    /// Equal weights when absent
    pub weights: Option<Vec<f64>>,
    pub pareto: bool,
    pub constraints: ConstraintSet,
    pub algorithm: Algorithm,
    pub max_iterations: Option<usize>,
    pub tolerance: Option<f64>,
    pub fidelity: Option<FidelityLevel>,
}

impl OptimizationRequest {
    pub fn new(reactor_id: &str, start: OperatingParameters, objective: ObjectiveSpec, algorithm: Algorithm) -> Self {
        Self {
            reactor_id: reactor_id.to_string(),
            start,
            objectives: vec![objective],
            weights: None,
            pareto: false,
            constraints: ConstraintSet::new(),
            algorithm,
            max_iterations: None,
            tolerance: None,
            fidelity: None,
        }
    }

    pub fn with_objectives(mut self, objectives: Vec<ObjectiveSpec>, weights: Option<Vec<f64>>, pareto: bool) -> Self {
        self.objectives = objectives;
        self.weights = weights;
        self.pareto = pareto;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_fidelity(mut self, fidelity: FidelityLevel) -> Self {
        self.fidelity = Some(fidelity);
        self
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationRun {
    pub id: Uuid,
    pub reactor_id: String,
    pub algorithm: Algorithm,
    pub mode: MultiObjectiveMode,
    pub baseline: Evaluation,
    pub best: Evaluation,
    pub history: Vec<IterationRecord>,
    pub converged: bool,
    pub outcome: RunOutcome,
    pub evaluations: usize,
    pub elapsed_ms: f64,
    pub sensitivity: Vec<ParameterSensitivity>,
    /// Filled in Pareto mode only
    pub pareto_front: Vec<ParetoPoint>,
    pub recommendations: Vec<Recommendation>,
}

impl OptimizationRun {
    /// Relative score change from baseline to best (%)
    pub fn improvement_percent(&self) -> f64 {
        let before = self.baseline.score;
        if before.abs() > f64::EPSILON {
            (self.best.score - before) / before.abs() * 100.0
        } else {
            0.0
        }
    }
}

/// True when best-so-far moved less than `tolerance` (relative) over the
/// last `window` iterations
fn plateau(history: &[IterationRecord], window: usize, tolerance: f64) -> bool {
    if window == 0 || history.len() <= window {
        return false;
    }
    let last = history[history.len() - 1].best_so_far;
    let earlier = history[history.len() - 1 - window].best_so_far;
    (last - earlier).abs() <= tolerance * last.abs().max(1e-12)
}

/// Fittest successful candidate of a generation. A generation in which
/// every candidate failed ends the run.
fn best_of_generation(evaluations: &[Evaluation], iteration: usize) -> Result<&Evaluation> {
    evaluations
        .iter()
        .filter(|e| e.is_ok())
        .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
        .ok_or_else(|| EngineError::numerical(NumericalError::GenerationFailed { iteration }))
}

pub struct OptimizationEngine {
    engine: Arc<PredictionEngine>,
    config: OptimizationConfig,
}

impl OptimizationEngine {
    pub fn new(engine: Arc<PredictionEngine>, config: OptimizationConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    pub fn optimize(&self, request: &OptimizationRequest, cancel: Option<&CancellationToken>) -> Result<OptimizationRun> {
        let started = Instant::now();
        let id = Uuid::new_v4();
        let config = self.engine.configuration(&request.reactor_id)?;

        request.constraints.check(&config.parameter_space)?;
        request.start.validate(&config.parameter_space)?;
        config.check_required(&request.start)?;
        let objectives = ObjectiveSet::multi(request.objectives.clone(), request.weights.clone(), request.pareto)?;
        let mode = objectives.mode();

        let max_iterations = request.max_iterations.unwrap_or(self.config.max_iterations);
        let tolerance = request.tolerance.unwrap_or(self.config.tolerance);
        let fidelity = request.fidelity.unwrap_or(self.config.fidelity);
        let timeout = self.config.timeout_secs.map(Duration::from_secs);

        let space = SearchSpace::new(&config.parameter_space, &request.constraints, &request.start);
        let mut evaluator = Evaluator::new(
            &self.engine,
            config.clone(),
            space,
            objectives,
            request.constraints.clone(),
            fidelity,
            self.config.penalty_weight,
        );
        let baseline = evaluator.baseline(&request.start)?;
        debug!(
            run = %id,
            objectives = ?request.objectives.iter().map(ObjectiveSpec::label).collect::<Vec<_>>(),
            fitness = baseline.fitness,
            "baseline evaluated"
        );

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let dims = evaluator.space().len();
        let mut strategy = strategy_for(request.algorithm, &self.config, dims);

        let track_front = mode == MultiObjectiveMode::Pareto;
        let mut explored: Vec<(OperatingParameters, Vec<f64>)> = Vec::new();
        if track_front {
            explored.push((baseline.params.clone(), baseline.objectives.clone()));
        }

        let mut best = baseline.clone();
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut outcome = RunOutcome::MaxIterations;

        for iteration in 1..=max_iterations {
            if cancel.map_or(false, CancellationToken::is_cancelled) {
                outcome = RunOutcome::Cancelled;
                break;
            }
            if timeout.map_or(false, |t| started.elapsed() >= t) {
                outcome = RunOutcome::TimedOut;
                break;
            }
            if dims == 0 {
                outcome = RunOutcome::Converged;
                break;
            }

            let candidates = strategy.step(&best, &mut rng);
            if candidates.is_empty() {
                outcome = RunOutcome::Converged;
                break;
            }
            let evaluations = evaluator.evaluate_batch(candidates);
            let failures = evaluations.iter().filter(|e| !e.is_ok()).count();
            let generation_best = best_of_generation(&evaluations, iteration)?;
            if generation_best.fitness > best.fitness {
                best = generation_best.clone();
            }
            history.push(IterationRecord {
                iteration,
                parameters: generation_best.params.clone(),
                objective_value: generation_best.fitness,
                best_so_far: best.fitness,
                evaluations: evaluations.len(),
                failures,
            });
            if track_front {
                explored.extend(
                    evaluations
                        .iter()
                        .filter(|e| e.is_ok())
                        .map(|e| (e.params.clone(), e.objectives.clone())),
                );
            }

            strategy.observe(&evaluations);
            debug!(run = %id, iteration, best = best.fitness, failures, "iteration complete");

            if strategy.has_converged(&history) || plateau(&history, self.config.convergence_window, tolerance) {
                outcome = RunOutcome::Converged;
                break;
            }
        }

        let sensitivity = if self.config.compute_sensitivity && outcome != RunOutcome::Cancelled && best.is_ok() {
            sensitivity::analyze(&evaluator, &best)
        } else {
            Vec::new()
        };
        let pareto_front = if track_front { pareto::front(&explored) } else { Vec::new() };
        let recommendations = recommend(&baseline.params, &best.params);

        let run = OptimizationRun {
            id,
            reactor_id: config.id.clone(),
            algorithm: request.algorithm,
            mode,
            converged: outcome == RunOutcome::Converged,
            outcome,
            evaluations: evaluator.evaluations(),
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
            sensitivity,
            pareto_front,
            recommendations,
            baseline,
            best,
            history,
        };
        info!(
            run = %run.id,
            reactor = %run.reactor_id,
            algorithm = %run.algorithm,
            iterations = run.history.len(),
            evaluations = run.evaluations,
            outcome = ?run.outcome,
            improvement = run.improvement_percent(),
            "optimization finished"
        );
        Ok(run)
    }
}
