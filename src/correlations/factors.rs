//! Empirical performance factors.
//!
//! Every factor is an additive fractional correction to a base quantity:
//! `0` means "no effect", negative values are penalties.

use super::{Correlations, MaterialSet};
use crate::constants::{EPSILON, REFERENCE_PRESSURE_BAR};

impl Correlations {
    /// Temperature factor in [severe, 0].
    ///
    /// Linear penalty with distance from `optimal` while `t <= max`; the
    /// fixed severe penalty once `t > max`.
    pub fn temperature_factor(&self, t: f64, optimal: f64, max: f64) -> f64 {
        let c = self.constants();
        if t > max {
            return c.severe_temperature_penalty;
        }
        let deviation = (t - optimal).abs();
        (-(deviation * c.temperature_penalty_per_degree)).max(c.severe_temperature_penalty)
    }

    /// pH factor in [-max_factor_penalty, 0]; `None` optimum = insensitive.
    pub fn ph_factor(&self, ph: f64, optimal: Option<f64>) -> f64 {
        let c = self.constants();
        match optimal {
            None => 0.0,
            Some(opt) => -((ph - opt).abs() * c.ph_penalty_per_unit).min(c.max_factor_penalty),
        }
    }

    /// Humidity factor; zero unless both the value and an optimum exist.
    pub fn humidity_factor(&self, humidity: Option<f64>, optimal: Option<f64>) -> f64 {
        let c = self.constants();
        match (humidity, optimal) {
            (Some(h), Some(opt)) => {
                -((h - opt).abs() * c.humidity_penalty_per_percent).min(c.max_factor_penalty)
            }
            _ => 0.0,
        }
    }

    /// Nernstian pressure gain `k·ln(P/P_ref)`, bounded both ways.
    pub fn pressure_factor(&self, pressure: Option<f64>) -> f64 {
        let c = self.constants();
        match pressure {
            None => 0.0,
            Some(p) => (c.pressure_gain * (p.max(EPSILON) / REFERENCE_PRESSURE_BAR).ln())
                .clamp(-c.max_pressure_gain, c.max_pressure_gain),
        }
    }

    /// Sum of the table performance factors. Missing or unknown names add 0.
    pub fn material_factor(&self, materials: &MaterialSet<'_>) -> f64 {
        let tables = self.tables();
        let electrodes: f64 = materials
            .electrodes()
            .filter_map(|name| tables.find_electrode(name))
            .map(|m| m.performance_factor)
            .sum();
        let membrane = materials
            .membrane
            .and_then(|name| tables.find_membrane(name))
            .map_or(0.0, |m| m.performance_factor);
        electrodes + membrane
    }
}
