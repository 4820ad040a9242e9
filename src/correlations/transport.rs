//! Mass-transfer correlations. Callers validate denominators (> 0).

use serde::{Deserialize, Serialize};

use crate::constants::{ELECTRONS_PER_REACTION, FARADAY, RE_LAMINAR_LIMIT, RE_TURBULENT_LIMIT};

/// Re = ρvL/μ
pub fn reynolds_number(density: f64, velocity: f64, length: f64, viscosity: f64) -> f64 {
    density * velocity * length / viscosity
}

/// Sc = μ/(ρD)
pub fn schmidt_number(viscosity: f64, density: f64, diffusivity: f64) -> f64 {
    viscosity / (density * diffusivity)
}

/// Ranz–Marshall: Sh = 2 + 0.6·Re^½·Sc^⅓
pub fn sherwood_number(re: f64, sc: f64) -> f64 {
    2.0 + 0.6 * re.max(0.0).sqrt() * sc.max(0.0).cbrt()
}

/// k_m = Sh·D/L (m/s)
pub fn mass_transfer_coefficient(sh: f64, diffusivity: f64, length: f64) -> f64 {
    sh * diffusivity / length
}

/// i_L = nF·k_m·c_b (A/m²)
pub fn limiting_current_density(k_m: f64, bulk_concentration: f64) -> f64 {
    ELECTRONS_PER_REACTION * FARADAY * k_m * bulk_concentration
}

/// Flow regime from Re
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowRegime {
    Laminar,
    Transitional,
    Turbulent,
}

impl FlowRegime {
    pub fn from_reynolds(re: f64) -> Self {
        if re < RE_LAMINAR_LIMIT {
            FlowRegime::Laminar
        } else if re < RE_TURBULENT_LIMIT {
            FlowRegime::Transitional
        } else {
            FlowRegime::Turbulent
        }
    }
}
