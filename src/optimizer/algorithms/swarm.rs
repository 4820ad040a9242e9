//! Particle swarm with inertia, clamped velocities and reflecting walls.

use rand::rngs::StdRng;
use rand::Rng;

use super::{fitness_of, SearchStrategy};
use crate::optimizer::evaluator::Evaluation;
use crate::optimizer::run::IterationRecord;
use crate::optimizer::utils::statistics;
use crate::optimizer::{Algorithm, OptimizationConfig};

/// Mean per-axis position variance under which the swarm has collapsed
const COLLAPSE_VARIANCE: f64 = 1e-10;
/// Iterations without a new global best before the swarm counts as stalled
const STALL_ITERATIONS: usize = 15;

#[derive(Debug, Clone)]
struct Particle {
    position: Vec<f64>,
    velocity: Vec<f64>,
    best_position: Vec<f64>,
    best_fitness: f64,
}

pub struct SwarmSearch {
    dims: usize,
    size: usize,
    inertia: f64,
    cognitive: f64,
    social: f64,
    max_velocity: f64,
    particles: Vec<Particle>,
    global_best: Option<(Vec<f64>, f64)>,
}

impl SwarmSearch {
    pub fn new(config: &OptimizationConfig, dims: usize) -> Self {
        Self {
            dims,
            size: config.population_size.max(1),
            inertia: config.inertia,
            cognitive: config.cognitive,
            social: config.social,
            max_velocity: config.max_velocity.abs().max(1e-6),
            particles: Vec::new(),
            global_best: None,
        }
    }

    fn spawn(&mut self, start: &[f64], rng: &mut StdRng) {
        let vmax = self.max_velocity;
        self.particles = (0..self.size)
            .map(|i| {
                let position: Vec<f64> = if i == 0 {
                    start.to_vec()
                } else {
                    (0..self.dims).map(|_| rng.gen::<f64>()).collect()
                };
                let velocity = (0..self.dims).map(|_| rng.gen_range(-vmax..=vmax)).collect();
                Particle {
                    best_position: position.clone(),
                    position,
                    velocity,
                    best_fitness: f64::NEG_INFINITY,
                }
            })
            .collect();
    }

    fn advance(&mut self, rng: &mut StdRng) {
        let Some((global, _)) = self.global_best.clone() else { return };
        let vmax = self.max_velocity;
        for p in &mut self.particles {
            for d in 0..self.dims {
                let r1 = rng.gen::<f64>();
                let r2 = rng.gen::<f64>();
                let v = self.inertia * p.velocity[d]
                    + self.cognitive * r1 * (p.best_position[d] - p.position[d])
                    + self.social * r2 * (global[d] - p.position[d]);
                p.velocity[d] = v.clamp(-vmax, vmax);
                let mut x = p.position[d] + p.velocity[d];
                if !(0.0..=1.0).contains(&x) {
                    x = x.clamp(0.0, 1.0);
                    p.velocity[d] = -p.velocity[d];
                }
                p.position[d] = x;
            }
        }
    }
}

impl SearchStrategy for SwarmSearch {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ParticleSwarm
    }

    fn step(&mut self, best: &Evaluation, rng: &mut StdRng) -> Vec<Vec<f64>> {
        if self.particles.is_empty() {
            self.spawn(&best.x, rng);
        } else {
            self.advance(rng);
        }
        self.particles.iter().map(|p| p.position.clone()).collect()
    }

    fn observe(&mut self, evaluations: &[Evaluation]) {
        for (p, e) in self.particles.iter_mut().zip(evaluations) {
            let f = fitness_of(e);
            if f > p.best_fitness {
                p.best_fitness = f;
                p.best_position = e.x.clone();
            }
            if self.global_best.as_ref().map_or(f.is_finite(), |(_, g)| f > *g) {
                self.global_best = Some((e.x.clone(), f));
            }
        }
    }

    fn has_converged(&self, history: &[IterationRecord]) -> bool {
        if history.len() > STALL_ITERATIONS {
            let last = history[history.len() - 1].best_so_far;
            let earlier = history[history.len() - 1 - STALL_ITERATIONS].best_so_far;
            if last <= earlier {
                return true;
            }
        }
        if self.particles.len() < 2 || self.global_best.is_none() {
            return false;
        }
        let spread: Vec<f64> = (0..self.dims)
            .map(|d| {
                let axis: Vec<f64> = self.particles.iter().map(|p| p.position[d]).collect();
                statistics::variance(&axis)
            })
            .collect();
        statistics::mean(&spread) < COLLAPSE_VARIANCE
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_positions_stay_in_unit_cube() {
        let config = OptimizationConfig { max_velocity: 1.0, ..Default::default() };
        let mut swarm = SwarmSearch::new(&config, 3);
        let mut rng = StdRng::seed_from_u64(21);
        let mut best = evaluation(vec![0.9, 0.9, 0.9], bowl(&[0.9, 0.9, 0.9]));
        for _ in 0..20 {
            let xs = swarm.step(&best, &mut rng);
            assert!(xs.iter().flatten().all(|u| (0.0..=1.0).contains(u)));
            let evals: Vec<_> = xs.into_iter().map(|x| { let f = bowl(&x); evaluation(x, f) }).collect();
            for e in &evals {
                if e.fitness > best.fitness {
                    best = e.clone();
                }
            }
            swarm.observe(&evals);
        }
        assert!(best.fitness > -0.05);
    }

    #[test]
    fn test_first_particle_starts_at_best() {
        let mut swarm = SwarmSearch::new(&OptimizationConfig::default(), 2);
        let mut rng = StdRng::seed_from_u64(2);
        let xs = swarm.step(&evaluation(vec![0.2, 0.8], 0.0), &mut rng);
        assert_eq!(xs[0], vec![0.2, 0.8]);
        assert!(!swarm.has_converged(&[]));
    }
}
