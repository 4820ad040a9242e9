//! # Optimizer Utilities
//!
//! Descriptive statistics and the normal distribution helpers used by the
//! acquisition functions.

/// Descriptive statistics
pub mod statistics {
    /// Arithmetic mean
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population variance
    pub fn variance(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let m = mean(values);
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
    }

    /// Sample standard deviation
    pub fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let m = mean(values);
        let variance = values.iter()
            .map(|v| (v - m).powi(2))
            .sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }
}

/// Normal distribution
pub mod normal {
    use std::f64::consts::PI;

    /// Error function (Abramowitz & Stegun 7.1.26, |ε| < 1.5e-7)
    pub fn erf(x: f64) -> f64 {
        let a1 = 0.254829592;
        let a2 = -0.284496736;
        let a3 = 1.421413741;
        let a4 = -1.453152027;
        let a5 = 1.061405429;
        let p = 0.3275911;

        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let x = x.abs();
        let t = 1.0 / (1.0 + p * x);
        let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();
        sign * y
    }

    /// Standard normal CDF Φ(z)
    pub fn cdf(z: f64) -> f64 {
        0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
    }

    /// Standard normal PDF φ(z)
    pub fn pdf(z: f64) -> f64 {
        (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((statistics::mean(&values) - 3.0).abs() < 1e-10);
        assert!((statistics::variance(&values) - 2.0).abs() < 1e-10);
        assert!(statistics::std_dev(&values) > 0.0);
    }

    #[test]
    fn test_normal() {
        assert!(normal::erf(0.0).abs() < 1e-7);
        assert!((normal::erf(1.0) - 0.842_700_79).abs() < 1e-6);
        assert!((normal::cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal::cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal::pdf(0.0) - 0.398_942_28).abs() < 1e-7);
    }
}
