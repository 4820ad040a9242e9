//! Candidate evaluation through the prediction engine.
//!
//! A generation is evaluated on a bounded rayon pool and collected in full
//! before the strategy sees it. A failing candidate scores −∞ and is logged;
//! it never aborts the generation on its own.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::warn;

use super::constraints::ConstraintSet;
use super::cost_model::CostModel;
use super::objectives::ObjectiveSet;
use super::space::SearchSpace;
use crate::error::Result;
use crate::fidelity::PredictionResult;
use crate::prediction::PredictionEngine;
use crate::types::{FidelityLevel, OperatingParameters, ReactorConfiguration};

/// One scored candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Normalized coordinates
    pub x: Vec<f64>,
    pub params: OperatingParameters,
    pub result: Option<PredictionResult>,
    /// Raw objective values, higher is better
    pub objectives: Vec<f64>,
    /// Scalarized objective without penalty
    pub score: f64,
    /// Normalized soft-constraint violation
    pub violation: f64,
    /// Score minus penalty; −∞ on failure
    pub fitness: f64,
    pub error: Option<String>,
}

impl Evaluation {
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.fitness.is_finite()
    }

    fn failed(x: Vec<f64>, params: OperatingParameters, error: String) -> Self {
        Self {
            x,
            params,
            result: None,
            objectives: Vec::new(),
            score: f64::NEG_INFINITY,
            violation: f64::INFINITY,
            fitness: f64::NEG_INFINITY,
            error: Some(error),
        }
    }
}

pub struct Evaluator<'a> {
    engine: &'a PredictionEngine,
    config: Arc<ReactorConfiguration>,
    space: SearchSpace,
    objectives: ObjectiveSet,
    constraints: ConstraintSet,
    cost_model: CostModel,
    fidelity: FidelityLevel,
    penalty_weight: f64,
    normalizers: Vec<f64>,
    penalty_scale: f64,
    pool: Option<rayon::ThreadPool>,
    count: AtomicUsize,
}

impl<'a> Evaluator<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: &'a PredictionEngine,
        config: Arc<ReactorConfiguration>,
        space: SearchSpace,
        objectives: ObjectiveSet,
        constraints: ConstraintSet,
        fidelity: FidelityLevel,
        penalty_weight: f64,
    ) -> Self {
        let threads = engine.engine_config().max_concurrency;
        let pool = if threads == 0 {
            None
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "could not build evaluation pool, using the global pool");
                    None
                }
            }
        };
        let n = objectives.specs().len();
        Self {
            engine,
            config,
            space,
            objectives,
            constraints,
            cost_model: CostModel::new(engine.constants().clone()),
            fidelity,
            penalty_weight,
            normalizers: vec![1.0; n],
            penalty_scale: 1.0,
            pool,
            count: AtomicUsize::new(0),
        }
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn objectives(&self) -> &ObjectiveSet {
        &self.objectives
    }

    pub fn config(&self) -> &ReactorConfiguration {
        &self.config
    }

    pub fn evaluations(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Evaluates the starting point and fixes the objective normalizers and
    /// penalty scale from it. A failure here is fatal to the run.
    pub fn baseline(&mut self, start: &OperatingParameters) -> Result<Evaluation> {
        let x = self.space.encode(start);
        let params = self.space.decode(&x);
        let result = self.engine.predict(&self.config.id, &params, self.fidelity)?;
        self.count.fetch_add(1, Ordering::Relaxed);

        let cost = self.cost(&params, &result);
        let values = self.objectives.values(&result, &params, cost);
        self.normalizers = ObjectiveSet::normalizers(&values);
        self.penalty_scale = self.objectives.scalarize(&values, &self.normalizers).abs().max(1e-9);
        Ok(self.score(x, params, result, cost))
    }

    pub fn evaluate(&self, x: Vec<f64>) -> Evaluation {
        let mut x = x;
        SearchSpace::clamp(&mut x);
        let params = self.space.decode(&x);
        self.count.fetch_add(1, Ordering::Relaxed);
        match self.engine.predict(&self.config.id, &params, self.fidelity) {
            Ok(result) => {
                let cost = self.cost(&params, &result);
                self.score(x, params, result, cost)
            }
            Err(e) => {
                warn!(reactor = %self.config.id, error = %e, "candidate evaluation failed");
                Evaluation::failed(x, params, e.to_string())
            }
        }
    }

    /// Evaluates a whole generation; returns only once every candidate is done.
    pub fn evaluate_batch(&self, xs: Vec<Vec<f64>>) -> Vec<Evaluation> {
        let run = || xs.into_par_iter().map(|x| self.evaluate(x)).collect::<Vec<_>>();
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    fn cost(&self, params: &OperatingParameters, result: &PredictionResult) -> f64 {
        let needs_cost = self.objectives.needs_cost()
            || self
                .constraints
                .derived
                .iter()
                .any(|c| c.metric == super::constraints::Metric::Cost);
        if needs_cost {
            self.cost_model
                .hourly(&self.config, self.engine.tables(), params, result)
                .total()
        } else {
            0.0
        }
    }

    fn score(&self, x: Vec<f64>, params: OperatingParameters, result: PredictionResult, cost: f64) -> Evaluation {
        let objectives = self.objectives.values(&result, &params, cost);
        let score = self.objectives.scalarize(&objectives, &self.normalizers);
        let violation = self.constraints.violation(&result, &params, cost);
        let fitness = score - self.penalty_weight * violation * self.penalty_scale;
        let fitness = if fitness.is_nan() { f64::NEG_INFINITY } else { fitness };
        Evaluation {
            x,
            params,
            result: Some(result),
            objectives,
            score,
            violation,
            fitness,
            error: None,
        }
    }
}
