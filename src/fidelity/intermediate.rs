//! Intermediate fidelity: Basic plus a per-cell thermal profile and the gas
//! composition along the flow path.

use super::basic::BasicModel;
use super::result::{GasDistribution, GasStream, HotSpot, PredictionResult, ThermalProfile};
use super::{FidelityModel, ModelInput};
use crate::constants::{
    ELECTRONS_PER_HYDROGEN, ELECTRONS_PER_WATER, MOLAR_VOLUME_STP, THERMONEUTRAL_VOLTAGE,
};
use crate::correlations::faraday_molar_rate;
use crate::error::{finite, NumericalError};
use crate::types::FidelityLevel;

/// Electrons per O₂ molecule reduced
const ELECTRONS_PER_OXYGEN: f64 = 4.0;

/// Inner cells run hotter than end cells; end cells see this share of the
/// peak rise.
const END_CELL_RISE_FRACTION: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct IntermediateModel {
    basic: BasicModel,
}

impl IntermediateModel {
    pub fn new(basic: BasicModel) -> Self {
        Self { basic }
    }

    pub fn basic(&self) -> &BasicModel {
        &self.basic
    }

    pub(crate) fn thermal_profile(
        &self,
        input: &ModelInput<'_>,
        base: &PredictionResult,
    ) -> Result<ThermalProfile, NumericalError> {
        let c = self.basic.correlations().constants();
        let cells = input.config.geometry.cell_count.max(1) as usize;
        let cell_voltage = base.stack_voltage / cells as f64;

        // Waste heat per cell: (E_tn − V)·I
        let heat_per_cell = (THERMONEUTRAL_VOLTAGE - cell_voltage).abs() * base.total_current;
        let peak_rise = finite(heat_per_cell * c.thermal_resistance_k_per_w, "thermal rise")?;
        let inlet = input.params.temperature;

        let unit_temperatures: Vec<f64> = (0..cells)
            .map(|k| {
                let x = (2.0 * k as f64 + 1.0) / cells as f64 - 1.0;
                let shape = 1.0 - (1.0 - END_CELL_RISE_FRACTION) * x * x;
                inlet + peak_rise * shape
            })
            .collect();

        let peak_temperature = unit_temperatures.iter().cloned().fold(f64::MIN, f64::max);
        let mean_temperature = unit_temperatures.iter().sum::<f64>() / cells as f64;
        let hot_spots = unit_temperatures
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                let rise = **t - inlet;
                rise >= c.hot_spot_min_rise && rise >= c.hot_spot_fraction * (peak_temperature - inlet)
            })
            .map(|(k, t)| HotSpot {
                location: format!("cell-{}", k + 1),
                temperature: *t,
            })
            .collect();

        Ok(ThermalProfile {
            unit_temperatures,
            hot_spots,
            peak_temperature,
            mean_temperature,
            heat_generation_w: heat_per_cell * cells as f64,
        })
    }

    pub(crate) fn gas_distribution(
        &self,
        input: &ModelInput<'_>,
        base: &PredictionResult,
    ) -> Result<GasDistribution, NumericalError> {
        let c = self.basic.correlations().constants();
        let cells = input.config.geometry.cell_count.max(1) as f64;
        // Series stack: every cell passes the same current
        let charge_rate = base.total_current * cells;

        let electrolytic = input.config.reactor_type.is_electrolytic();
        let water_production_mol_s = if electrolytic {
            0.0
        } else {
            faraday_molar_rate(charge_rate, ELECTRONS_PER_WATER)
        };
        let product_gas_mol_s =
            electrolytic.then(|| faraday_molar_rate(charge_rate, ELECTRONS_PER_HYDROGEN));

        let mut streams = Vec::new();
        if let Some(feed) = &input.species.gas_feed {
            let fuel_consumed = faraday_molar_rate(charge_rate, feed.electrons_per_fuel);
            let fuel_supplied = supply_rate(input.params.fuel_flow, feed.fuel_inlet_percent)
                .unwrap_or(fuel_consumed * c.default_fuel_stoichiometry);
            streams.push(stream(&feed.fuel, feed.fuel_inlet_percent, fuel_consumed, fuel_supplied));

            let o2_consumed = faraday_molar_rate(charge_rate, ELECTRONS_PER_OXYGEN);
            let o2_supplied = supply_rate(input.params.oxidant_flow, feed.oxidant_inlet_percent)
                .unwrap_or(o2_consumed * c.default_oxidant_stoichiometry);
            streams.push(stream("O2", feed.oxidant_inlet_percent, o2_consumed, o2_supplied));
        }

        Ok(GasDistribution {
            streams,
            water_production_mol_s: finite(water_production_mol_s, "water production")?,
            product_gas_mol_s: product_gas_mol_s.map(|r| finite(r, "product gas")).transpose()?,
        })
    }
}

/// Species molar supply from a volumetric flow (L/min at STP).
fn supply_rate(flow_l_min: Option<f64>, inlet_percent: f64) -> Option<f64> {
    flow_l_min
        .filter(|f| *f > 0.0)
        .map(|f| f / 60.0 / MOLAR_VOLUME_STP * inlet_percent / 100.0)
}

/// Inlet, outlet and consumed mole percentages of one reactant stream.
fn stream(gas: &str, inlet_percent: f64, consumed: f64, supplied: f64) -> GasStream {
    let inlet = inlet_percent.clamp(0.0, 100.0) / 100.0;
    let conversion = if supplied > 0.0 { (consumed / supplied).clamp(0.0, 1.0) } else { 1.0 };
    let used = inlet * conversion;
    let outlet = if used < 1.0 { (inlet - used) / (1.0 - used) } else { 0.0 };
    GasStream {
        gas: gas.to_string(),
        inlet_percent: inlet * 100.0,
        outlet_percent: (outlet * 100.0).clamp(0.0, 100.0),
        utilization_percent: used * 100.0,
    }
}

impl FidelityModel for IntermediateModel {
    fn level(&self) -> FidelityLevel {
        FidelityLevel::Intermediate
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Result<PredictionResult, NumericalError> {
        let mut result = self.basic.evaluate(input)?;
        let thermal = self.thermal_profile(input, &result)?;
        let gas = self.gas_distribution(input, &result)?;
        result.thermal = Some(thermal);
        result.gas = Some(gas);
        result.fidelity = FidelityLevel::Intermediate;
        result.requested_fidelity = FidelityLevel::Intermediate;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlations::Correlations;
    use crate::types::{Geometry, ReactorConfiguration, ReactorType};

    fn model() -> IntermediateModel {
        IntermediateModel::new(BasicModel::new(Correlations::standard()))
    }

    fn evaluate(config: &ReactorConfiguration) -> PredictionResult {
        let m = model();
        let species = m.basic().correlations().tables().species(&config.species).unwrap().clone();
        let params = config.parameter_space.defaults();
        m.evaluate(&ModelInput { config, params: &params, species: &species }).unwrap()
    }

    #[test]
    fn test_extends_basic() {
        let config = ReactorConfiguration::new("pem", "PEM", ReactorType::ProtonExchangeMembrane)
            .with_geometry(Geometry { cell_count: 10, ..Geometry::membrane_electrode_assembly() });
        let m = model();
        let species = m.basic().correlations().tables().species("pem").unwrap().clone();
        let params = config.parameter_space.defaults();
        let input = ModelInput { config: &config, params: &params, species: &species };

        let basic = m.basic().evaluate(&input).unwrap();
        let inter = m.evaluate(&input).unwrap();
        assert!(inter.same_basic(&basic));
        assert_eq!(inter.populated_level(), FidelityLevel::Intermediate);
        assert!(inter.respects(FidelityLevel::Intermediate));
    }

    #[test]
    fn test_thermal_profile_peaks_in_the_middle() {
        let config = ReactorConfiguration::new("pem", "PEM", ReactorType::ProtonExchangeMembrane)
            .with_geometry(Geometry {
                cell_count: 9,
                electrode_area_m2: 0.05,
                ..Geometry::membrane_electrode_assembly()
            });
        let thermal = evaluate(&config).thermal.unwrap();
        assert_eq!(thermal.unit_temperatures.len(), 9);
        assert_eq!(thermal.peak_temperature, thermal.unit_temperatures[4]);
        assert!(thermal.unit_temperatures[0] < thermal.peak_temperature);
        assert!(thermal.mean_temperature <= thermal.peak_temperature);
        assert!(thermal.hot_spots.iter().any(|h| h.location == "cell-5"));
    }

    #[test]
    fn test_gas_fractions_bounded() {
        let config = ReactorConfiguration::new("sofc", "SOFC", ReactorType::SolidOxide);
        let gas = evaluate(&config).gas.unwrap();
        assert_eq!(gas.streams.len(), 2);
        for s in &gas.streams {
            assert!(s.inlet_percent >= 0.0 && s.inlet_percent <= 100.0);
            assert!(s.outlet_percent >= 0.0 && s.outlet_percent <= 100.0);
            assert!(s.utilization_percent <= s.inlet_percent);
        }
        assert!(gas.water_production_mol_s > 0.0);
        assert!(gas.product_gas_mol_s.is_none());
    }

    #[test]
    fn test_electrolysis_reports_product_gas() {
        let config = ReactorConfiguration::new("mec", "MEC", ReactorType::MicrobialElectrolysisCell);
        let gas = evaluate(&config).gas.unwrap();
        assert!(gas.streams.is_empty());
        assert_eq!(gas.water_production_mol_s, 0.0);
        assert!(gas.product_gas_mol_s.unwrap() > 0.0);
    }

    #[test]
    fn test_stream_conversion_saturates() {
        let s = stream("H2", 99.97, 10.0, 1.0);
        assert!((s.utilization_percent - 99.97).abs() < 1e-9);
        assert_eq!(s.outlet_percent, 0.0);
    }
}
