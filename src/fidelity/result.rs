//! Prediction result and the per-fidelity blocks it carries.
//!
//! Every block above Basic is an `Option`; a model of level L fills exactly
//! the blocks L allows (see [`PredictionResult::populated_level`]).

use serde::{Deserialize, Serialize};

use crate::correlations::{FlowRegime, Impedance, Overpotentials};
use crate::types::{FidelityLevel, ParameterKind};

/// Operational status classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    Optimal,
    Good,
    Warning,
    Critical,
}

impl std::fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationalStatus::Optimal => "optimal",
            OperationalStatus::Good => "good",
            OperationalStatus::Warning => "warning",
            OperationalStatus::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Heuristic band around the predicted power density (W/m²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn around(point: f64, fraction: f64) -> Self {
        let half = point.abs() * fraction;
        Self {
            lower: point - half,
            upper: point + half,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

// ============================================================================
// INTERMEDIATE BLOCKS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotSpot {
    pub location: String,
    /// °C
    pub temperature: f64,
}

/// Per-unit temperature distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalProfile {
    /// °C, one entry per cell
    pub unit_temperatures: Vec<f64>,
    pub hot_spots: Vec<HotSpot>,
    pub peak_temperature: f64,
    pub mean_temperature: f64,
    /// Waste heat of the whole stack (W)
    pub heat_generation_w: f64,
}

/// Composition of one gas stream (mole percent)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasStream {
    pub gas: String,
    pub inlet_percent: f64,
    pub outlet_percent: f64,
    /// Consumed share of the stream, never above `inlet_percent`
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasDistribution {
    pub streams: Vec<GasStream>,
    /// mol/s
    pub water_production_mol_s: f64,
    /// Evolved product gas for electrolysis cells (mol/s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_gas_mol_s: Option<f64>,
}

// ============================================================================
// ADVANCED BLOCKS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluidDynamics {
    pub reynolds: f64,
    pub schmidt: f64,
    pub sherwood: f64,
    /// m/s
    pub mass_transfer_coefficient: f64,
    /// A/m²
    pub limiting_current_density: f64,
    pub regime: FlowRegime,
    /// Mean channel velocity (m/s)
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSetpoints {
    pub thermal_kp: f64,
    pub thermal_ki: f64,
    pub thermal_kd: f64,
    /// Target coolant or anolyte temperature (°C)
    pub temperature_setpoint: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_ratio: Option<f64>,
    /// Water to add to the reactant streams (mol/s)
    pub humidification_rate_mol_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge_threshold_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purge_interval_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSuggestion {
    pub parameter: ParameterKind,
    pub current_value: f64,
    pub suggested_value: f64,
    /// Expected power gain (%)
    pub expected_improvement: f64,
    /// [0, 1]
    pub confidence: f64,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Electrochemistry {
    /// Butler–Volmer current density at the voltage setpoint (A/m²)
    pub kinetic_current_density: f64,
    /// Cottrell current one second after a potential step (A)
    pub transient_current: f64,
    pub impedance: Impedance,
    pub reference_frequency_hz: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Degradation {
    /// Fractional voltage loss per 1000 h
    pub loss_fraction_per_1000h: f64,
    /// Stack voltage loss per 1000 h (V)
    pub voltage_loss_per_1000h: f64,
    /// Hours until 10 % voltage loss
    pub hours_to_10_percent: f64,
}

// ============================================================================
// RESULT
// ============================================================================

/// Outcome of one prediction. Immutable once returned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub reactor_id: String,

    // Basic
    /// W/m²
    pub power_density: f64,
    /// A/m²
    pub current_density: f64,
    /// %
    pub efficiency: f64,
    /// V
    pub stack_voltage: f64,
    /// A
    pub total_current: f64,
    /// W
    pub total_power: f64,
    pub status: OperationalStatus,
    pub confidence: ConfidenceInterval,

    // Intermediate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal: Option<ThermalProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<GasDistribution>,

    // Advanced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overpotentials: Option<Overpotentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluid_dynamics: Option<FluidDynamics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<ControllerSetpoints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<OptimizationSuggestion>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrochemistry: Option<Electrochemistry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,

    // Provenance
    pub fidelity: FidelityLevel,
    pub requested_fidelity: FidelityLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub execution_time_ms: f64,
    #[serde(default)]
    pub cache_hit: bool,
}

impl PredictionResult {
    /// Highest level whose blocks are all present
    pub fn populated_level(&self) -> FidelityLevel {
        let advanced = self.overpotentials.is_some()
            && self.fluid_dynamics.is_some()
            && self.controller.is_some()
            && self.suggestions.is_some()
            && self.electrochemistry.is_some()
            && self.degradation.is_some();
        let intermediate = self.thermal.is_some() && self.gas.is_some();
        match (intermediate, advanced) {
            (true, true) => FidelityLevel::Advanced,
            (true, false) => FidelityLevel::Intermediate,
            _ => FidelityLevel::Basic,
        }
    }

    /// True when no block beyond `level` is populated
    pub fn respects(&self, level: FidelityLevel) -> bool {
        let any_advanced = self.overpotentials.is_some()
            || self.fluid_dynamics.is_some()
            || self.controller.is_some()
            || self.suggestions.is_some()
            || self.electrochemistry.is_some()
            || self.degradation.is_some();
        let any_intermediate = self.thermal.is_some() || self.gas.is_some();
        match level {
            FidelityLevel::Basic => !any_intermediate && !any_advanced,
            FidelityLevel::Intermediate => !any_advanced,
            FidelityLevel::Advanced => true,
        }
    }

    /// Peak temperature when a thermal profile exists
    pub fn peak_temperature(&self) -> Option<f64> {
        self.thermal.as_ref().map(|t| t.peak_temperature)
    }

    /// Basic fields equal, provenance ignored
    pub fn same_basic(&self, other: &PredictionResult) -> bool {
        self.reactor_id == other.reactor_id
            && self.power_density == other.power_density
            && self.current_density == other.current_density
            && self.efficiency == other.efficiency
            && self.stack_voltage == other.stack_voltage
            && self.total_current == other.total_current
            && self.total_power == other.total_power
            && self.status == other.status
            && self.confidence == other.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_band_symmetric() {
        let ci = ConfidenceInterval::around(100.0, 0.15);
        assert_eq!(ci.lower, 85.0);
        assert_eq!(ci.upper, 115.0);
        assert!(ci.contains(100.0));
        assert!(!ci.contains(120.0));
    }

    #[test]
    fn test_status_ordering() {
        assert!(OperationalStatus::Optimal < OperationalStatus::Critical);
        assert_eq!(OperationalStatus::Warning.to_string(), "warning");
    }
}
