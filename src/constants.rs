//! # Physical Constants
//!
//! Electrochemical and transport constants in SI units.
//!
//! Empirical, literature-derived coefficients (penalty slopes, degradation
//! factors, cost rates) are NOT here: they are configuration data and live in
//! [`crate::config::EmpiricalConstants`].

use std::f64::consts::PI;

// ============================================================================
// FUNDAMENTAL CONSTANTS
// ============================================================================

/// Faraday constant F (C/mol)
pub const FARADAY: f64 = 96_485.0;

/// Universal gas constant R (J/(mol·K))
pub const GAS_CONSTANT: f64 = 8.314;

/// Electrons transferred in the rate-determining step used by the kinetic
/// correlations
pub const ELECTRONS_PER_REACTION: f64 = 1.0;

/// Electrons per water molecule formed at an oxygen-reducing cathode
pub const ELECTRONS_PER_WATER: f64 = 2.0;

/// Electrons per hydrogen molecule evolved in an electrolysis cell
pub const ELECTRONS_PER_HYDROGEN: f64 = 2.0;

/// 0 °C in kelvin
pub const ZERO_CELSIUS_K: f64 = 273.15;

/// Molar volume of an ideal gas at STP (L/mol)
pub const MOLAR_VOLUME_STP: f64 = 22.414;

/// Molar mass of water (g/mol)
pub const WATER_MOLAR_MASS: f64 = 18.015;

/// Reference pressure for Nernstian corrections (bar)
pub const REFERENCE_PRESSURE_BAR: f64 = 1.0;

/// Ambient temperature used by the thermal and cost models (°C)
pub const AMBIENT_TEMPERATURE_C: f64 = 25.0;

/// Thermoneutral voltage of the hydrogen/oxygen reaction (V, HHV basis)
pub const THERMONEUTRAL_VOLTAGE: f64 = 1.481;

// ============================================================================
// NUMERICAL GUARDS
// ============================================================================

/// Largest exponent fed to `exp` before the result is declared an overflow.
/// `f64::exp` overflows at ~709.78.
pub const MAX_EXP_ARGUMENT: f64 = 700.0;

/// Cottrell transients are evaluated no earlier than this (s)
pub const MIN_TRANSIENT_TIME_S: f64 = 1e-6;

/// Lowest frequency accepted by the impedance model (Hz)
pub const MIN_IMPEDANCE_FREQUENCY_HZ: f64 = 1e-3;

/// Concentration overpotential keeps i/i_L at or below this ratio
pub const MAX_LIMITING_CURRENT_RATIO: f64 = 0.99;

/// Generic floor for strictly-positive denominators
pub const EPSILON: f64 = 1e-12;

// ============================================================================
// WORKING FLUID (dilute aqueous electrolyte at 30 °C)
// ============================================================================

/// Electrolyte density ρ (kg/m³)
pub const ELECTROLYTE_DENSITY: f64 = 995.7;

/// Electrolyte dynamic viscosity μ (Pa·s)
pub const ELECTROLYTE_VISCOSITY: f64 = 7.97e-4;

/// Humidified reactant gas density (kg/m³)
pub const REACTANT_GAS_DENSITY: f64 = 1.0;

/// Humidified reactant gas dynamic viscosity (Pa·s)
pub const REACTANT_GAS_VISCOSITY: f64 = 2.0e-5;

/// Electrochemical double-layer capacitance per m² of geometric area (F/m²)
pub const DOUBLE_LAYER_CAPACITANCE: f64 = 0.2;

/// Laminar/transitional boundary on Re
pub const RE_LAMINAR_LIMIT: f64 = 2_300.0;

/// Transitional/turbulent boundary on Re
pub const RE_TURBULENT_LIMIT: f64 = 4_000.0;

/// Cross-section of a circular channel with hydraulic diameter `d` (m²)
pub fn channel_area(d: f64) -> f64 {
    PI * d * d / 4.0
}

/// °C → K
pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    t_c + ZERO_CELSIUS_K
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thermal_voltage() {
        // RT/F at 25 °C ≈ 25.7 mV
        let vt = GAS_CONSTANT * celsius_to_kelvin(25.0) / FARADAY;
        assert!((vt - 0.02569).abs() < 1e-4);
    }

    #[test]
    fn test_channel_area() {
        assert!((channel_area(2.0) - PI).abs() < 1e-12);
    }
}
