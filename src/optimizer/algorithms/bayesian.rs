//! Bayesian optimization with a Gaussian-process surrogate.
//!
//! RBF kernel on normalized coordinates, observations standardized before
//! fitting. Each iteration after the initial design proposes the single
//! point that maximizes the acquisition over a random candidate set.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{Acquisition, SearchStrategy};
use crate::optimizer::evaluator::Evaluation;
use crate::optimizer::utils::{normal, statistics};
use crate::optimizer::{Algorithm, OptimizationConfig};

/// Jitter added to the kernel diagonal
const NOISE: f64 = 1e-6;
/// EI exploration margin in standardized units
const EI_XI: f64 = 0.01;
/// Oldest observations are dropped beyond this many
const MAX_OBSERVATIONS: usize = 300;
/// Spread of the local candidates drawn around the incumbent
const LOCAL_SIGMA: f64 = 0.05;

pub struct BayesianSearch {
    dims: usize,
    acquisition: Acquisition,
    kappa: f64,
    length_scale: f64,
    samples: usize,
    initial_design: usize,
    started: bool,
    xs: Vec<Vec<f64>>,
    ys: Vec<f64>,
}

/// Fitted surrogate
struct GaussianProcess<'a> {
    xs: &'a [Vec<f64>],
    chol: Vec<Vec<f64>>,
    alpha: Vec<f64>,
    length_scale: f64,
}

impl<'a> GaussianProcess<'a> {
    fn fit(xs: &'a [Vec<f64>], ys: &[f64], length_scale: f64) -> Option<Self> {
        let n = xs.len();
        let mut k = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..=i {
                let v = rbf(&xs[i], &xs[j], length_scale);
                k[i][j] = v;
                k[j][i] = v;
            }
            k[i][i] += NOISE;
        }
        let chol = cholesky(&k)?;
        let z = forward_substitution(&chol, ys);
        let alpha = backward_substitution(&chol, &z);
        Some(Self { xs, chol, alpha, length_scale })
    }

    /// Posterior mean and standard deviation
    fn predict(&self, x: &[f64]) -> (f64, f64) {
        let k_star: Vec<f64> = self.xs.iter().map(|xi| rbf(xi, x, self.length_scale)).collect();
        let mean = k_star.iter().zip(&self.alpha).map(|(a, b)| a * b).sum();
        let v = forward_substitution(&self.chol, &k_star);
        let var = (1.0 - v.iter().map(|x| x * x).sum::<f64>()).max(1e-12);
        (mean, var.sqrt())
    }
}

fn rbf(a: &[f64], b: &[f64], length_scale: f64) -> f64 {
    let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    (-d2 / (2.0 * length_scale * length_scale)).exp()
}

/// Lower-triangular L with L·Lᵀ = A; `None` if A is not positive definite
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let s: f64 = (0..j).map(|k| l[i][k] * l[j][k]).sum();
            if i == j {
                let d = a[i][i] - s;
                if d <= 0.0 || !d.is_finite() {
                    return None;
                }
                l[i][j] = d.sqrt();
            } else {
                l[i][j] = (a[i][j] - s) / l[j][j];
            }
        }
    }
    Some(l)
}

/// Solves L·z = b
fn forward_substitution(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut z = vec![0.0; n];
    for i in 0..n {
        let s: f64 = (0..i).map(|k| l[i][k] * z[k]).sum();
        z[i] = (b[i] - s) / l[i][i];
    }
    z
}

/// Solves Lᵀ·x = z
fn backward_substitution(l: &[Vec<f64>], z: &[f64]) -> Vec<f64> {
    let n = z.len();
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let s: f64 = (i + 1..n).map(|k| l[k][i] * x[k]).sum();
        x[i] = (z[i] - s) / l[i][i];
    }
    x
}

impl BayesianSearch {
    pub fn new(config: &OptimizationConfig, dims: usize) -> Self {
        Self {
            dims,
            acquisition: config.acquisition,
            kappa: config.exploration.max(0.0),
            length_scale: config.length_scale.max(1e-3),
            samples: config.acquisition_samples.max(1),
            initial_design: (dims + 1).max(4),
            started: false,
            xs: Vec::new(),
            ys: Vec::new(),
        }
    }

    fn random_point(&self, rng: &mut StdRng) -> Vec<f64> {
        (0..self.dims).map(|_| rng.gen::<f64>()).collect()
    }

    fn score(&self, mean: f64, sd: f64, incumbent: f64) -> f64 {
        match self.acquisition {
            Acquisition::ExpectedImprovement => {
                let improvement = mean - incumbent - EI_XI;
                let z = improvement / sd;
                improvement * normal::cdf(z) + sd * normal::pdf(z)
            }
            Acquisition::UpperConfidenceBound => mean + self.kappa * sd,
        }
    }

    fn next_point(&self, rng: &mut StdRng) -> Vec<f64> {
        let mu = statistics::mean(&self.ys);
        let sd = statistics::std_dev(&self.ys).max(1e-12);
        let standardized: Vec<f64> = self.ys.iter().map(|y| (y - mu) / sd).collect();

        let Some(gp) = GaussianProcess::fit(&self.xs, &standardized, self.length_scale) else {
            return self.random_point(rng);
        };

        let (incumbent_index, incumbent) = standardized
            .iter()
            .cloned()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, v)| if v > acc.1 { (i, v) } else { acc });
        let local = Normal::new(0.0, LOCAL_SIGMA).ok();

        let mut best: Option<(Vec<f64>, f64)> = None;
        for s in 0..self.samples {
            let candidate = match local {
                Some(n) if s % 2 == 1 => self.xs[incumbent_index]
                    .iter()
                    .map(|u| (u + n.sample(rng)).clamp(0.0, 1.0))
                    .collect(),
                _ => self.random_point(rng),
            };
            let (mean, sd) = gp.predict(&candidate);
            let a = self.score(mean, sd, incumbent);
            if a.is_finite() && best.as_ref().map_or(true, |(_, b)| a > *b) {
                best = Some((candidate, a));
            }
        }
        best.map(|(x, _)| x).unwrap_or_else(|| self.random_point(rng))
    }
}

impl SearchStrategy for BayesianSearch {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Bayesian
    }

    fn step(&mut self, best: &Evaluation, rng: &mut StdRng) -> Vec<Vec<f64>> {
        if !self.started {
            self.started = true;
            return std::iter::once(best.x.clone())
                .chain((1..self.initial_design).map(|_| self.random_point(rng)))
                .collect();
        }
        if self.xs.len() < 2 {
            return vec![self.random_point(rng)];
        }
        vec![self.next_point(rng)]
    }

    fn observe(&mut self, evaluations: &[Evaluation]) {
        for e in evaluations.iter().filter(|e| e.fitness.is_finite()) {
            self.xs.push(e.x.clone());
            self.ys.push(e.fitness);
        }
        if self.xs.len() > MAX_OBSERVATIONS {
            let excess = self.xs.len() - MAX_OBSERVATIONS;
            self.xs.drain(..excess);
            self.ys.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_cholesky_reconstructs() {
        let a = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let l = cholesky(&a).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                let v: f64 = (0..2).map(|k| l[i][k] * l[j][k]).sum();
                assert!((v - a[i][j]).abs() < 1e-12);
            }
        }
        assert!(cholesky(&[vec![-1.0]]).is_none());
    }

    #[test]
    fn test_posterior_interpolates_observations() {
        let xs = vec![vec![0.1], vec![0.5], vec![0.9]];
        let ys = vec![-1.0, 1.0, 0.0];
        let gp = GaussianProcess::fit(&xs, &ys, 0.2).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            let (mean, sd) = gp.predict(x);
            assert!((mean - y).abs() < 1e-3);
            assert!(sd < 0.01);
        }
        let (_, far_sd) = gp.predict(&[0.3]);
        assert!(far_sd > 0.1);
    }

    #[test]
    fn test_initial_design_then_single_points() {
        let mut search = BayesianSearch::new(&OptimizationConfig::default(), 2);
        let mut rng = StdRng::seed_from_u64(9);
        let start = evaluation(vec![0.4, 0.6], 0.0);
        let design = search.step(&start, &mut rng);
        assert_eq!(design.len(), 4);
        assert_eq!(design[0], vec![0.4, 0.6]);
        let evals: Vec<_> = design.into_iter().map(|x| { let f = bowl(&x); evaluation(x, f) }).collect();
        search.observe(&evals);
        let next = search.step(&start, &mut rng);
        assert_eq!(next.len(), 1);
        assert!(next[0].iter().all(|u| (0.0..=1.0).contains(u)));
    }

    #[test]
    fn test_ucb_prefers_uncertainty() {
        let config = OptimizationConfig { acquisition: Acquisition::UpperConfidenceBound, ..Default::default() };
        let search = BayesianSearch::new(&config, 1);
        assert!(search.score(0.0, 1.0, 0.0) > search.score(0.0, 0.1, 0.0));
    }
}
