//! Basic fidelity: closed-form stack performance.
//!
//! ```text
//! V_cell = V_base · (1 + f_T + f_P + f_RH + f_pH + f_mat)
//! i      = i_base · (1 + f_T + f_pH + f_mat) · g_flow · g_substrate · g_mix · g_bias
//! P      = V_cell · i
//! η      = η_base · (1 + f_T) · (1 + f_mat)        clipped to [0, 100] %
//! ```

use super::result::{ConfidenceInterval, OperationalStatus, PredictionResult};
use super::{FidelityModel, ModelInput};
use crate::correlations::{Correlations, MaterialSet};
use crate::error::{finite, NumericalError};
use crate::types::{FidelityLevel, ParameterKind};

/// Factor breakdown behind a Basic prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factors {
    pub temperature: f64,
    pub ph: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub material: f64,
}

impl Factors {
    pub fn voltage(&self) -> f64 {
        1.0 + self.temperature + self.pressure + self.humidity + self.ph + self.material
    }

    pub fn current(&self) -> f64 {
        1.0 + self.temperature + self.ph + self.material
    }
}

#[derive(Debug, Clone)]
pub struct BasicModel {
    correlations: Correlations,
}

impl BasicModel {
    pub fn new(correlations: Correlations) -> Self {
        Self { correlations }
    }

    pub fn correlations(&self) -> &Correlations {
        &self.correlations
    }

    pub fn factors(&self, input: &ModelInput<'_>) -> Factors {
        let lib = &self.correlations;
        let (p, s) = (input.params, input.species);
        Factors {
            temperature: lib.temperature_factor(p.temperature, s.optimal_temperature, s.max_temperature),
            ph: lib.ph_factor(p.ph, s.optimal_ph),
            humidity: lib.humidity_factor(p.humidity, s.optimal_humidity),
            pressure: lib.pressure_factor(p.pressure),
            material: lib.material_factor(&MaterialSet::of(input.config)),
        }
    }

    /// Saturating gain, 1 at `reference`, bounded by `max_flow_factor`.
    fn saturation(&self, value: f64, reference: f64) -> f64 {
        let c = self.correlations.constants();
        if reference <= 0.0 {
            return 1.0;
        }
        let k = c.flow_half_saturation_fraction * reference;
        let g = |x: f64| x.max(0.0) / (k + x.max(0.0));
        (g(value) / g(reference)).min(c.max_flow_factor)
    }

    fn declared_default(input: &ModelInput<'_>, kind: ParameterKind) -> Option<f64> {
        input.config.parameter_space.get(kind).map(|d| d.default)
    }

    fn classify(&self, power_density: f64, reference: f64, overheated: bool) -> OperationalStatus {
        let c = self.correlations.constants();
        if overheated || reference <= 0.0 {
            return OperationalStatus::Critical;
        }
        let ratio = power_density / reference;
        if ratio >= c.status_optimal_ratio {
            OperationalStatus::Optimal
        } else if ratio >= c.status_good_ratio {
            OperationalStatus::Good
        } else if ratio >= c.status_warning_ratio {
            OperationalStatus::Warning
        } else {
            OperationalStatus::Critical
        }
    }
}

impl FidelityModel for BasicModel {
    fn level(&self) -> FidelityLevel {
        FidelityLevel::Basic
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Result<PredictionResult, NumericalError> {
        let c = self.correlations.constants();
        let (config, p, s) = (input.config, input.params, input.species);
        let f = self.factors(input);

        let cell_voltage = (s.base_voltage * f.voltage()).max(0.0);
        let cells = config.geometry.cell_count as f64;
        let stack_voltage = cell_voltage * cells;

        let flow = Self::declared_default(input, ParameterKind::FlowRate)
            .map_or(1.0, |reference| self.saturation(p.flow_rate, reference));
        let substrate = match s.half_saturation {
            Some(ks) => {
                let conc = p.substrate_concentration.max(0.0);
                conc / (ks + conc)
            }
            None => 1.0,
        };
        let mixing = 1.0
            + c.mixing_gain * p.mixing_speed.max(0.0)
                / (c.mixing_half_speed_rpm + p.mixing_speed.max(0.0));
        let bias = if config.reactor_type.is_electrolytic() {
            Self::declared_default(input, ParameterKind::Voltage)
                .map_or(1.0, |reference| self.saturation(p.voltage, reference))
        } else {
            1.0
        };

        let current_density =
            (s.base_current_density * f.current() * flow * substrate * mixing * bias).max(0.0);
        let power_density = cell_voltage * current_density;
        let total_current = current_density * config.geometry.electrode_area_m2;
        let total_power = stack_voltage * total_current;
        let efficiency =
            (s.base_efficiency * (1.0 + f.temperature) * (1.0 + f.material)).clamp(0.0, 100.0);

        let reference = s.base_voltage * s.base_current_density;
        let status = self.classify(power_density, reference, p.temperature > s.max_temperature);

        Ok(PredictionResult {
            reactor_id: config.id.clone(),
            power_density: finite(power_density, "power density")?,
            current_density: finite(current_density, "current density")?,
            efficiency: finite(efficiency, "efficiency")?,
            stack_voltage: finite(stack_voltage, "stack voltage")?,
            total_current: finite(total_current, "total current")?,
            total_power: finite(total_power, "total power")?,
            status,
            confidence: ConfidenceInterval::around(power_density, c.confidence_fraction),
            thermal: None,
            gas: None,
            overpotentials: None,
            fluid_dynamics: None,
            controller: None,
            suggestions: None,
            electrochemistry: None,
            degradation: None,
            fidelity: FidelityLevel::Basic,
            requested_fidelity: FidelityLevel::Basic,
            warnings: Vec::new(),
            execution_time_ms: 0.0,
            cache_hit: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, ReactorConfiguration, ReactorType};

    fn run(config: &ReactorConfiguration, params: &crate::types::OperatingParameters) -> PredictionResult {
        let model = BasicModel::new(Correlations::standard());
        let species = model.correlations().tables().species(&config.species).unwrap().clone();
        let input = ModelInput { config, params, species: &species };
        model.evaluate(&input).unwrap()
    }

    #[test]
    fn test_pem_stack_voltage() {
        let config = ReactorConfiguration::new("pem-50", "PEM stack", ReactorType::ProtonExchangeMembrane)
            .with_electrodes("platinum_carbon", "platinum_carbon")
            .with_membrane("nafion_212")
            .with_geometry(Geometry { cell_count: 50, ..Geometry::membrane_electrode_assembly() });
        let params = config.parameter_space.defaults()
            .with_value(ParameterKind::Temperature, 70.0)
            .with_value(ParameterKind::Humidity, 90.0)
            .with_value(ParameterKind::Pressure, 1.5);

        let result = run(&config, &params);
        let lib = Correlations::standard();
        let pressure = lib.pressure_factor(Some(1.5));
        let material = 0.20 + 0.20 + 0.08;
        let expected = 0.70 * 50.0 * (1.0 + pressure + material);

        assert!(result.power_density > 0.0);
        assert!((result.stack_voltage - expected).abs() < 1e-9);
        assert!(result.respects(FidelityLevel::Basic));
    }

    #[test]
    fn test_efficiency_clipped() {
        let config = ReactorConfiguration::new("afc", "AFC", ReactorType::Alkaline)
            .with_electrodes("platinum_carbon", "platinum_carbon")
            .with_membrane("nafion_212");
        let params = config.parameter_space.defaults();
        let result = run(&config, &params);
        assert!(result.efficiency >= 0.0 && result.efficiency <= 100.0);
    }

    #[test]
    fn test_overheated_microbial_is_critical() {
        let config = ReactorConfiguration::new("mfc", "MFC", ReactorType::MicrobialFuelCell);
        let params = config.parameter_space.defaults().with_value(ParameterKind::Temperature, 50.0);
        let result = run(&config, &params);
        assert_eq!(result.status, OperationalStatus::Critical);
        assert!(result.confidence.contains(result.power_density));
    }

    #[test]
    fn test_substrate_limits_current() {
        let config = ReactorConfiguration::new("mfc", "MFC", ReactorType::MicrobialFuelCell);
        let base = config.parameter_space.defaults();
        let starved = run(&config, &base.with_value(ParameterKind::SubstrateConcentration, 0.05));
        let fed = run(&config, &base.with_value(ParameterKind::SubstrateConcentration, 10.0));
        assert!(fed.current_density > starved.current_density);
    }

    #[test]
    fn test_bias_drives_electrolysis_current() {
        let config = ReactorConfiguration::new("mec", "MEC", ReactorType::MicrobialElectrolysisCell);
        let base = config.parameter_space.defaults();
        let low = run(&config, &base.with_value(ParameterKind::Voltage, 0.2));
        let high = run(&config, &base.with_value(ParameterKind::Voltage, 1.0));
        assert!(high.current_density > low.current_density);
    }
}
