//! # Operating Cost Model
//!
//! Hourly cost of running a reactor at an operating point:
//!
//! ```text
//! heating   |T − T_ambient| · c_T · cells
//! pumping   Q · c_Q
//! mixing    rpm³ · c_mix
//! bias      V · I · cells (electrolysis only) · price
//! capital   (anode + cathode + membrane) $/m² · A · cells / amortization
//! ```

use serde::{Deserialize, Serialize};

use crate::config::EmpiricalConstants;
use crate::constants::AMBIENT_TEMPERATURE_C;
use crate::fidelity::PredictionResult;
use crate::materials::PropertyTables;
use crate::types::{OperatingParameters, ReactorConfiguration};

/// $/h per cost source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub heating: f64,
    pub pumping: f64,
    pub mixing: f64,
    pub bias_energy: f64,
    pub capital: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.heating + self.pumping + self.mixing + self.bias_energy + self.capital
    }
}

#[derive(Debug, Clone)]
pub struct CostModel {
    constants: EmpiricalConstants,
}

impl CostModel {
    pub fn new(constants: EmpiricalConstants) -> Self {
        Self { constants }
    }

    pub fn hourly(
        &self,
        config: &ReactorConfiguration,
        tables: &PropertyTables,
        params: &OperatingParameters,
        result: &PredictionResult,
    ) -> CostBreakdown {
        let c = &self.constants;
        let cells = config.geometry.cell_count.max(1) as f64;
        let area = config.geometry.electrode_area_m2;

        let heating = (params.temperature - AMBIENT_TEMPERATURE_C).abs() * c.heating_cost_per_degree_hour * cells;
        let pumping = params.flow_rate.max(0.0) * c.pumping_cost_per_flow_hour;
        let mixing = params.mixing_speed.max(0.0).powi(3) * c.mixing_cost_per_rpm3_hour;

        let bias_energy = if config.reactor_type.is_electrolytic() {
            let kw = params.voltage.max(0.0) * result.total_current * cells / 1000.0;
            kw * c.electricity_price_per_kwh
        } else {
            0.0
        };

        let electrode_cost: f64 = [&config.anode, &config.cathode]
            .into_iter()
            .flatten()
            .filter_map(|name| tables.find_electrode(name))
            .map(|m| m.cost_per_m2)
            .sum();
        let membrane_cost = config
            .membrane
            .as_deref()
            .and_then(|name| tables.find_membrane(name))
            .map_or(0.0, |m| m.cost_per_m2);
        let capital = if c.amortization_hours > 0.0 {
            (electrode_cost + membrane_cost) * area * cells / c.amortization_hours
        } else {
            0.0
        };

        CostBreakdown { heating, pumping, mixing, bias_energy, capital }
    }
}
