//! # Configuration
//!
//! Engine settings and literature-derived empirical constants. Every section
//! has defaults and can be overridden from TOML:
//!
//! ```toml
//! [engine]
//! cache_capacity = 8192
//!
//! [constants]
//! severe_temperature_penalty = -0.5
//!
//! [optimizer]
//! max_iterations = 100
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::optimizer::OptimizationConfig;

/// Prediction engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum cached predictions (LRU eviction beyond this)
    pub cache_capacity: usize,
    /// Cache entry lifetime (s)
    pub cache_ttl_secs: u64,
    /// Clamp out-of-range parameters instead of rejecting them
    pub clamp_out_of_range: bool,
    /// Decimals kept when building cache keys
    pub key_decimals: u32,
    /// Decimals kept on the wire
    pub wire_decimals: u32,
    /// Worker threads for generation evaluation (0 = one per core)
    pub max_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 4096,
            cache_ttl_secs: 600,
            clamp_out_of_range: false,
            key_decimals: 6,
            wire_decimals: 6,
            max_concurrency: 0,
        }
    }
}

/// Empirical constants used by the correlation library and the models.
/// Heuristic values, not fitted uncertainty estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmpiricalConstants {
    // ---------------------------------------------------------------- factors
    /// Temperature penalty per °C away from optimum
    pub temperature_penalty_per_degree: f64,
    /// Penalty once T exceeds the species maximum
    pub severe_temperature_penalty: f64,
    /// pH penalty per unit away from optimum
    pub ph_penalty_per_unit: f64,
    /// Humidity penalty per % away from optimum
    pub humidity_penalty_per_percent: f64,
    /// Largest penalty any single soft factor may contribute
    pub max_factor_penalty: f64,
    /// Nernstian gain per ln(P / 1 bar)
    pub pressure_gain: f64,
    /// Upper bound on the pressure gain
    pub max_pressure_gain: f64,

    // ---------------------------------------------------------------- current
    /// Flow half-saturation, as a fraction of the declared default flow
    pub flow_half_saturation_fraction: f64,
    /// Upper bound on the flow factor
    pub max_flow_factor: f64,
    /// Extra current from mixing at saturation
    pub mixing_gain: f64,
    /// Mixing speed at half the mixing gain (rpm)
    pub mixing_half_speed_rpm: f64,

    // ------------------------------------------------------------- confidence
    /// Half-width of the heuristic confidence band (fraction of the point)
    pub confidence_fraction: f64,

    // ----------------------------------------------------------------- status
    pub status_optimal_ratio: f64,
    pub status_good_ratio: f64,
    pub status_warning_ratio: f64,

    // ---------------------------------------------------------------- thermal
    /// Temperature rise per watt of waste heat in one unit (K/W)
    pub thermal_resistance_k_per_w: f64,
    /// Units within this fraction of the peak rise are reported as hot spots
    pub hot_spot_fraction: f64,
    /// Minimum rise above inlet for a hot spot (K)
    pub hot_spot_min_rise: f64,

    // -------------------------------------------------------------------- gas
    /// Fuel stoichiometry assumed when no fuel flow is given
    pub default_fuel_stoichiometry: f64,
    /// Oxidant stoichiometry assumed when no oxidant flow is given
    pub default_oxidant_stoichiometry: f64,

    // ------------------------------------------------------------- controller
    /// Proportional gain of the thermal loop at unit heat load
    pub thermal_kp: f64,
    /// Integral time of the thermal loop (s)
    pub thermal_integral_time_s: f64,
    /// Derivative time of the thermal loop (s)
    pub thermal_derivative_time_s: f64,
    /// Inert accumulation triggering an anode purge (%)
    pub purge_inert_threshold_percent: f64,
    /// Nominal anode purge interval at 50 % utilization (s)
    pub purge_base_interval_s: f64,

    // ------------------------------------------------------------ degradation
    /// Fractional voltage loss per load cycle
    pub degradation_per_cycle: f64,
    /// Load cycles per 1000 h of operation
    pub cycles_per_1000h: f64,

    // ------------------------------------------------------------------- cost
    /// Heating/cooling cost ($ per °C·h away from ambient)
    pub heating_cost_per_degree_hour: f64,
    /// Pumping cost ($ per (mL/min)·h)
    pub pumping_cost_per_flow_hour: f64,
    /// Mixing cost ($ per rpm³·h)
    pub mixing_cost_per_rpm3_hour: f64,
    /// Electricity price ($/kWh)
    pub electricity_price_per_kwh: f64,
    /// Capital amortization horizon (h)
    pub amortization_hours: f64,
}

impl Default for EmpiricalConstants {
    fn default() -> Self {
        Self {
            temperature_penalty_per_degree: 0.01,
            severe_temperature_penalty: -0.5,
            ph_penalty_per_unit: 0.08,
            humidity_penalty_per_percent: 0.004,
            max_factor_penalty: 0.5,
            pressure_gain: 0.05,
            max_pressure_gain: 0.15,
            flow_half_saturation_fraction: 0.5,
            max_flow_factor: 1.5,
            mixing_gain: 0.1,
            mixing_half_speed_rpm: 100.0,
            confidence_fraction: 0.15,
            status_optimal_ratio: 0.95,
            status_good_ratio: 0.8,
            status_warning_ratio: 0.5,
            thermal_resistance_k_per_w: 0.02,
            hot_spot_fraction: 0.9,
            hot_spot_min_rise: 0.5,
            default_fuel_stoichiometry: 1.5,
            default_oxidant_stoichiometry: 2.0,
            thermal_kp: 2.0,
            thermal_integral_time_s: 120.0,
            thermal_derivative_time_s: 10.0,
            purge_inert_threshold_percent: 10.0,
            purge_base_interval_s: 30.0,
            degradation_per_cycle: 2.0e-5,
            cycles_per_1000h: 250.0,
            heating_cost_per_degree_hour: 0.002,
            pumping_cost_per_flow_hour: 1.0e-4,
            mixing_cost_per_rpm3_hour: 1.0e-9,
            electricity_price_per_kwh: 0.12,
            amortization_hours: 40_000.0,
        }
    }
}

/// Complete settings bundle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub engine: EngineConfig,
    pub constants: EmpiricalConstants,
    pub optimizer: OptimizationConfig,
}

impl SimConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ValidationError> {
        let cfg: SimConfig = toml::from_str(s).map_err(|e| ValidationError::MalformedConfig {
            id: "settings".to_string(),
            reason: e.to_string(),
        })?;
        cfg.check()?;
        Ok(cfg)
    }

    fn check(&self) -> Result<(), ValidationError> {
        let bad = |reason: &str| ValidationError::MalformedConfig {
            id: "settings".to_string(),
            reason: reason.to_string(),
        };
        if self.engine.cache_capacity == 0 {
            return Err(bad("engine.cache_capacity must be positive"));
        }
        if self.constants.severe_temperature_penalty > 0.0 {
            return Err(bad("constants.severe_temperature_penalty must be non-positive"));
        }
        if !(0.0..1.0).contains(&self.constants.confidence_fraction) {
            return Err(bad("constants.confidence_fraction must lie in [0, 1)"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = SimConfig::from_toml_str(
            r#"
            [engine]
            cache_capacity = 16

            [optimizer]
            max_iterations = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.engine.cache_capacity, 16);
        assert_eq!(cfg.engine.cache_ttl_secs, 600);
        assert_eq!(cfg.optimizer.max_iterations, 7);
        assert_eq!(cfg.constants, EmpiricalConstants::default());
    }

    #[test]
    fn test_rejects_positive_severe_penalty() {
        let r = SimConfig::from_toml_str("[constants]\nsevere_temperature_penalty = 0.5\n");
        assert!(matches!(r, Err(ValidationError::MalformedConfig { .. })));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(SimConfig::from_toml_str("engine = [").is_err());
    }
}
