//! Elitist genetic algorithm: binary tournament, simulated binary crossover
//! and Gaussian mutation in normalized coordinates.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{fitness_of, SearchStrategy};
use crate::optimizer::evaluator::Evaluation;
use crate::optimizer::run::IterationRecord;
use crate::optimizer::{Algorithm, OptimizationConfig};

pub struct GeneticSearch {
    dims: usize,
    population_size: usize,
    crossover_prob: f64,
    mutation_prob: f64,
    eta: f64,
    mutation: Option<Normal<f64>>,
    population: Vec<Evaluation>,
}

impl GeneticSearch {
    pub fn new(config: &OptimizationConfig, dims: usize) -> Self {
        Self {
            dims,
            population_size: config.population_size.max(1),
            crossover_prob: config.crossover_prob.clamp(0.0, 1.0),
            mutation_prob: config.mutation_prob.clamp(0.0, 1.0),
            eta: config.sbx_eta.max(0.0),
            mutation: Normal::new(0.0, config.mutation_sigma.abs()).ok(),
            population: Vec::new(),
        }
    }

    pub fn population(&self) -> &[Evaluation] {
        &self.population
    }

    fn tournament_select<'a>(&self, population: &'a [Evaluation], rng: &mut StdRng) -> &'a Evaluation {
        let p1 = &population[rng.gen_range(0..population.len())];
        let p2 = &population[rng.gen_range(0..population.len())];
        if fitness_of(p1) >= fitness_of(p2) {
            p1
        } else {
            p2
        }
    }

    fn crossover(&self, p1: &[f64], p2: &[f64], rng: &mut StdRng) -> Vec<f64> {
        p1.iter()
            .zip(p2)
            .map(|(a, b)| if rng.gen::<bool>() { Self::sbx_value(*a, *b, self.eta, rng) } else { *a })
            .collect()
    }

    fn sbx_value(p1: f64, p2: f64, eta: f64, rng: &mut StdRng) -> f64 {
        let u = rng.gen::<f64>();
        let beta = if u < 0.5 {
            (2.0 * u).powf(1.0 / (eta + 1.0))
        } else {
            (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
        };
        0.5 * ((1.0 + beta) * p1 + (1.0 - beta) * p2)
    }

    fn mutate(&self, child: &mut [f64], rng: &mut StdRng) {
        let Some(normal) = self.mutation else { return };
        for gene in child.iter_mut() {
            if rng.gen::<f64>() < self.mutation_prob {
                *gene += normal.sample(rng);
            }
        }
    }

    fn offspring(&self, rng: &mut StdRng) -> Vec<Vec<f64>> {
        (0..self.population_size)
            .map(|_| {
                let p1 = self.tournament_select(&self.population, rng);
                let p2 = self.tournament_select(&self.population, rng);
                let mut child = if rng.gen::<f64>() < self.crossover_prob {
                    self.crossover(&p1.x, &p2.x, rng)
                } else {
                    p1.x.clone()
                };
                self.mutate(&mut child, rng);
                child.iter_mut().for_each(|u| *u = u.clamp(0.0, 1.0));
                child
            })
            .collect()
    }
}

impl SearchStrategy for GeneticSearch {
    fn algorithm(&self) -> Algorithm {
        Algorithm::GeneticAlgorithm
    }

    fn step(&mut self, best: &Evaluation, rng: &mut StdRng) -> Vec<Vec<f64>> {
        if self.population.is_empty() {
            // Seeded with the best-so-far point; the rest is uniform
            std::iter::once(best.x.clone())
                .chain((1..self.population_size).map(|_| (0..self.dims).map(|_| rng.gen::<f64>()).collect()))
                .collect()
        } else {
            self.offspring(rng)
        }
    }

    /// Parents and offspring compete; the fittest `population_size` survive.
    fn observe(&mut self, evaluations: &[Evaluation]) {
        self.population.extend(evaluations.iter().cloned());
        self.population.sort_by(|a, b| fitness_of(b).total_cmp(&fitness_of(a)));
        self.population.truncate(self.population_size);
    }

    fn has_converged(&self, _history: &[IterationRecord]) -> bool {
        if self.population.len() < 2 {
            return false;
        }
        let top = fitness_of(&self.population[0]);
        let bottom = fitness_of(&self.population[self.population.len() - 1]);
        top.is_finite() && bottom.is_finite() && top - bottom <= 1e-12 * top.abs().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_first_generation_keeps_start() {
        let mut ga = GeneticSearch::new(&OptimizationConfig::default(), 2);
        let mut rng = StdRng::seed_from_u64(3);
        let start = evaluation(vec![0.25, 0.75], 1.0);
        let first = ga.step(&start, &mut rng);
        assert_eq!(first.len(), OptimizationConfig::default().population_size);
        assert_eq!(first[0], vec![0.25, 0.75]);
    }

    #[test]
    fn test_single_individual_population() {
        let config = OptimizationConfig { population_size: 1, ..Default::default() };
        let mut ga = GeneticSearch::new(&config, 3);
        let mut rng = StdRng::seed_from_u64(3);
        let start = evaluation(vec![0.1, 0.2, 0.3], 1.0);
        assert_eq!(ga.step(&start, &mut rng), vec![vec![0.1, 0.2, 0.3]]);
    }

    #[test]
    fn test_elitism_never_loses_the_best() {
        let mut ga = GeneticSearch::new(&OptimizationConfig { population_size: 4, ..Default::default() }, 1);
        ga.observe(&[evaluation(vec![0.3], 0.0), evaluation(vec![0.9], -0.36)]);
        ga.observe(&[evaluation(vec![0.5], -0.04), evaluation(vec![0.0], f64::NEG_INFINITY)]);
        ga.observe(&[evaluation(vec![0.6], -0.09)]);
        assert_eq!(ga.population().len(), 4);
        assert_eq!(ga.population()[0].fitness, 0.0);
        assert!(ga.population().iter().all(|e| e.fitness.is_finite()));
    }

    #[test]
    fn test_offspring_stay_in_unit_cube() {
        let config = OptimizationConfig { mutation_prob: 1.0, mutation_sigma: 2.0, ..Default::default() };
        let mut ga = GeneticSearch::new(&config, 4);
        let mut rng = StdRng::seed_from_u64(5);
        let start = evaluation(vec![0.5; 4], 0.0);
        let first = ga.step(&start, &mut rng);
        let evals: Vec<_> = first.into_iter().map(|x| { let f = bowl(&x); evaluation(x, f) }).collect();
        ga.observe(&evals);
        for child in ga.step(&start, &mut rng) {
            assert!(child.iter().all(|u| (0.0..=1.0).contains(u)));
        }
    }
}
