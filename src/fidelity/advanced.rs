//! Advanced fidelity: Intermediate plus loss breakdown, channel transport,
//! controller setpoints, improvement suggestions, impedance and degradation.

use super::basic::BasicModel;
use super::intermediate::IntermediateModel;
use super::result::{
    ControllerSetpoints, Degradation, Electrochemistry, FluidDynamics, GasDistribution,
    OptimizationSuggestion, PredictionResult, ThermalProfile,
};
use super::{FidelityModel, ModelInput};
use crate::constants::{
    celsius_to_kelvin, channel_area, DOUBLE_LAYER_CAPACITANCE, ELECTROLYTE_DENSITY,
    ELECTROLYTE_VISCOSITY, ELECTRONS_PER_REACTION, FARADAY, GAS_CONSTANT, REACTANT_GAS_DENSITY,
    REACTANT_GAS_VISCOSITY, REFERENCE_PRESSURE_BAR,
};
use crate::correlations::{
    butler_volmer_current, cottrell_current, limiting_current_density, mass_transfer_coefficient,
    randles_impedance, reynolds_number, schmidt_number, sherwood_number, FlowRegime, MaterialSet,
};
use crate::error::{finite, positive, NumericalError};
use crate::types::{FidelityLevel, ParameterKind};

/// Frequency at which the Randles impedance is reported (Hz)
const REFERENCE_FREQUENCY_HZ: f64 = 1.0;

/// Time after the potential step for the Cottrell transient (s)
const TRANSIENT_TIME_S: f64 = 1.0;

/// Suggestions gaining less than this (%) are dropped
const MIN_SUGGESTION_GAIN: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct AdvancedModel {
    intermediate: IntermediateModel,
}

impl AdvancedModel {
    pub fn new(intermediate: IntermediateModel) -> Self {
        Self { intermediate }
    }

    pub fn intermediate(&self) -> &IntermediateModel {
        &self.intermediate
    }

    fn basic(&self) -> &BasicModel {
        self.intermediate.basic()
    }

    fn fluid_dynamics(&self, input: &ModelInput<'_>) -> Result<FluidDynamics, NumericalError> {
        let (config, p, s) = (input.config, input.params, input.species);
        let g = &config.geometry;
        let d_h = positive(g.hydraulic_diameter_m, "hydraulic diameter")?;
        let area = channel_area(d_h);

        let (density, viscosity, velocity) = match (config.reactor_type.is_gas_fed(), p.fuel_flow) {
            (true, Some(fuel_l_min)) => {
                // Parallel channels with lands as wide as the channel
                let length = positive(g.channel_length_m, "channel length")?;
                let channels = (g.electrode_area_m2 / (2.0 * d_h * length)).floor().max(1.0);
                let per_channel = fuel_l_min / 60_000.0 / (g.cell_count.max(1) as f64 * channels);
                (REACTANT_GAS_DENSITY, REACTANT_GAS_VISCOSITY, per_channel / area)
            }
            _ => (ELECTROLYTE_DENSITY, ELECTROLYTE_VISCOSITY, p.flow_rate / 6.0e7 / area),
        };

        let diffusivity = positive(s.diffusivity, "diffusivity")?;
        let re = reynolds_number(density, velocity, d_h, viscosity);
        let sc = schmidt_number(viscosity, density, diffusivity);
        let sh = sherwood_number(re, sc);
        let k_m = mass_transfer_coefficient(sh, diffusivity, d_h);
        let i_l = limiting_current_density(k_m, s.reference_concentration);

        Ok(FluidDynamics {
            reynolds: finite(re, "reynolds number")?,
            schmidt: finite(sc, "schmidt number")?,
            sherwood: finite(sh, "sherwood number")?,
            mass_transfer_coefficient: finite(k_m, "mass transfer coefficient")?,
            limiting_current_density: finite(i_l, "limiting current density")?,
            regime: FlowRegime::from_reynolds(re),
            velocity,
        })
    }

    fn controller(
        &self,
        input: &ModelInput<'_>,
        thermal: &ThermalProfile,
        gas: &GasDistribution,
    ) -> ControllerSetpoints {
        let c = self.basic().correlations().constants();
        let (config, p, s) = (input.config, input.params, input.species);

        let peak_rise = (thermal.peak_temperature - p.temperature).max(0.0);
        let kp = c.thermal_kp * peak_rise.max(1.0);
        let ki = kp / c.thermal_integral_time_s;
        let kd = kp * c.thermal_derivative_time_s;
        let temperature_setpoint = config
            .parameter_space
            .get(ParameterKind::Temperature)
            .map_or(s.optimal_temperature, |d| d.clamp(s.optimal_temperature));

        let target_rh = s.optimal_humidity.or(p.humidity).unwrap_or(0.0);
        let humidification_rate_mol_s = gas.water_production_mol_s * target_rh / 100.0;

        let gas_fed = config.reactor_type.is_gas_fed();
        let pressure_ratio = if gas_fed {
            p.pressure.map(|bar| bar / REFERENCE_PRESSURE_BAR)
        } else {
            None
        };
        let (purge_threshold_percent, purge_interval_s) = match gas.streams.first() {
            Some(fuel) if gas_fed => {
                let conversion = if fuel.inlet_percent > 0.0 {
                    100.0 * fuel.utilization_percent / fuel.inlet_percent
                } else {
                    0.0
                };
                (
                    Some(c.purge_inert_threshold_percent),
                    Some(c.purge_base_interval_s * 50.0 / conversion.max(1.0)),
                )
            }
            _ => (None, None),
        };

        ControllerSetpoints {
            thermal_kp: kp,
            thermal_ki: ki,
            thermal_kd: kd,
            temperature_setpoint,
            pressure_ratio,
            humidification_rate_mol_s,
            purge_threshold_percent,
            purge_interval_s,
        }
    }

    /// Moves toward the species optimum, each scored by re-running Basic.
    fn suggestions(
        &self,
        input: &ModelInput<'_>,
        base: &PredictionResult,
    ) -> Result<Vec<OptimizationSuggestion>, NumericalError> {
        let c = self.basic().correlations().constants();
        let (p, s) = (input.params, input.species);

        let mut candidates: Vec<(ParameterKind, f64, f64, String)> = vec![(
            ParameterKind::Temperature,
            s.optimal_temperature,
            0.8,
            format!("Temperature optimum for {} is {:.1} °C", s.name, s.optimal_temperature),
        )];
        if let Some(opt) = s.optimal_ph {
            candidates.push((ParameterKind::Ph, opt, 0.7, format!("Species activity peaks near pH {:.1}", opt)));
        }
        if let Some(opt) = s.optimal_humidity {
            candidates.push((
                ParameterKind::Humidity,
                opt,
                0.6,
                format!("Membrane hydration is best near {:.0} % RH", opt),
            ));
        }
        if p.pressure.is_some() {
            let saturating = (c.max_pressure_gain / c.pressure_gain).exp() * REFERENCE_PRESSURE_BAR;
            candidates.push((
                ParameterKind::Pressure,
                saturating,
                0.5,
                "Higher reactant pressure raises the Nernst potential".to_string(),
            ));
        }
        candidates.push((
            ParameterKind::FlowRate,
            p.flow_rate * 2.0,
            0.5,
            "Faster flow thins the diffusion layer".to_string(),
        ));
        if let Some(ks) = s.half_saturation {
            candidates.push((
                ParameterKind::SubstrateConcentration,
                4.0 * ks,
                0.6,
                "Substrate below saturation limits microbial kinetics".to_string(),
            ));
        }

        let mut suggestions = Vec::new();
        for (kind, target, confidence, rationale) in candidates {
            let Some(def) = input.config.parameter_space.get(kind) else { continue };
            let Some(current) = p.get(kind) else { continue };
            if !def.is_optimizable {
                continue;
            }
            let suggested = def.clamp(target);
            if (suggested - current).abs() <= f64::EPSILON * current.abs().max(1.0) {
                continue;
            }
            let moved = p.with_value(kind, suggested);
            let trial = self.basic().evaluate(&ModelInput { params: &moved, ..*input })?;
            if base.power_density <= 0.0 {
                continue;
            }
            let gain = (trial.power_density / base.power_density - 1.0) * 100.0;
            if gain >= MIN_SUGGESTION_GAIN {
                suggestions.push(OptimizationSuggestion {
                    parameter: kind,
                    current_value: current,
                    suggested_value: suggested,
                    expected_improvement: gain,
                    confidence: confidence.clamp(0.0, 1.0),
                    rationale,
                });
            }
        }
        suggestions.sort_by(|a, b| b.expected_improvement.total_cmp(&a.expected_improvement));
        Ok(suggestions)
    }

    fn electrochemistry(
        &self,
        input: &ModelInput<'_>,
        base: &PredictionResult,
    ) -> Result<Electrochemistry, NumericalError> {
        let lib = self.basic().correlations();
        let (config, p, s) = (input.config, input.params, input.species);
        let materials = MaterialSet::of(config);
        let area = positive(config.geometry.electrode_area_m2, "electrode area")?;
        let t = celsius_to_kelvin(p.temperature);
        let i0 = positive(lib.exchange_current_density(s, &materials), "exchange current")?;

        let cell_voltage = base.stack_voltage / config.geometry.cell_count.max(1) as f64;
        let kinetic_current_density =
            butler_volmer_current(p.voltage, cell_voltage, i0, s.transfer_coefficient, t)?;
        let transient_current =
            cottrell_current(TRANSIENT_TIME_S, s.diffusivity, s.reference_concentration, area);

        // Randles elements for one cell
        let rt_nf = GAS_CONSTANT * t / (ELECTRONS_PER_REACTION * FARADAY);
        let kappa = positive(s.electrolyte_conductivity, "electrolyte conductivity")?;
        let rs = config.geometry.electrode_spacing_cm / 100.0 / kappa / area;
        let rct = rt_nf / (i0 * area);
        let surface = {
            let factors: Vec<f64> = materials
                .electrodes()
                .filter_map(|name| lib.tables().find_electrode(name))
                .map(|m| m.surface_factor)
                .collect();
            if factors.is_empty() { 1.0 } else { factors.iter().sum::<f64>() / factors.len() as f64 }
        };
        let cdl = DOUBLE_LAYER_CAPACITANCE * area * surface;
        let conc = positive(s.reference_concentration, "reference concentration")?;
        let sigma = rt_nf / (ELECTRONS_PER_REACTION * FARADAY * area * 2f64.sqrt())
            * (2.0 / (conc * s.diffusivity.max(0.0).sqrt().max(f64::MIN_POSITIVE)));
        let impedance = randles_impedance(REFERENCE_FREQUENCY_HZ, rs, rct, cdl, sigma);
        finite(impedance.magnitude, "randles impedance")?;

        Ok(Electrochemistry {
            kinetic_current_density,
            transient_current: finite(transient_current, "cottrell transient")?,
            impedance,
            reference_frequency_hz: REFERENCE_FREQUENCY_HZ,
        })
    }

    fn degradation(&self, input: &ModelInput<'_>, base: &PredictionResult) -> Degradation {
        let c = self.basic().correlations().constants();
        let (p, s) = (input.params, input.species);
        let window = (s.max_temperature - s.optimal_temperature).max(1.0);
        let thermal_stress = (p.temperature - s.optimal_temperature).max(0.0) / window;
        let fraction = c.degradation_per_cycle * c.cycles_per_1000h * (1.0 + thermal_stress);
        Degradation {
            loss_fraction_per_1000h: fraction,
            voltage_loss_per_1000h: fraction * base.stack_voltage,
            hours_to_10_percent: if fraction > 0.0 { 0.1 / fraction * 1000.0 } else { f64::MAX },
        }
    }
}

impl FidelityModel for AdvancedModel {
    fn level(&self) -> FidelityLevel {
        FidelityLevel::Advanced
    }

    fn evaluate(&self, input: &ModelInput<'_>) -> Result<PredictionResult, NumericalError> {
        let mut result = self.intermediate.evaluate(input)?;
        let (thermal, gas) = match (&result.thermal, &result.gas) {
            (Some(t), Some(g)) => (t, g),
            _ => return Err(NumericalError::NonConvergence("intermediate blocks missing")),
        };

        let overpotentials = self.basic().correlations().overpotentials(
            result.current_density,
            input.params,
            input.species,
            &input.config.geometry,
            &MaterialSet::of(input.config),
        )?;
        let fluid = self.fluid_dynamics(input)?;
        let controller = self.controller(input, thermal, gas);
        let suggestions = self.suggestions(input, &result)?;
        let electrochemistry = self.electrochemistry(input, &result)?;
        let degradation = self.degradation(input, &result);

        result.overpotentials = Some(overpotentials);
        result.fluid_dynamics = Some(fluid);
        result.controller = Some(controller);
        result.suggestions = Some(suggestions);
        result.electrochemistry = Some(electrochemistry);
        result.degradation = Some(degradation);
        result.fidelity = FidelityLevel::Advanced;
        result.requested_fidelity = FidelityLevel::Advanced;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlations::Correlations;
    use crate::types::{OperatingParameters, ReactorConfiguration, ReactorType};

    fn model() -> AdvancedModel {
        AdvancedModel::new(IntermediateModel::new(BasicModel::new(Correlations::standard())))
    }

    fn run(config: &ReactorConfiguration, params: &OperatingParameters) -> Result<PredictionResult, NumericalError> {
        let m = model();
        let species = m.basic().correlations().tables().species(&config.species).unwrap().clone();
        m.evaluate(&ModelInput { config, params, species: &species })
    }

    fn pem() -> ReactorConfiguration {
        ReactorConfiguration::new("pem", "PEM", ReactorType::ProtonExchangeMembrane)
            .with_electrodes("carbon_paper", "platinum_carbon")
            .with_membrane("nafion_212")
    }

    #[test]
    fn test_superset_of_intermediate() {
        let config = pem();
        let params = config.parameter_space.defaults();
        let m = model();
        let species = m.basic().correlations().tables().species("pem").unwrap().clone();
        let input = ModelInput { config: &config, params: &params, species: &species };

        let inter = m.intermediate().evaluate(&input).unwrap();
        let adv = m.evaluate(&input).unwrap();
        assert!(adv.same_basic(&inter));
        assert_eq!(adv.thermal, inter.thermal);
        assert_eq!(adv.gas, inter.gas);
        assert_eq!(adv.populated_level(), FidelityLevel::Advanced);
    }

    #[test]
    fn test_membrane_and_controller_for_pem() {
        let config = pem();
        let result = run(&config, &config.parameter_space.defaults()).unwrap();
        assert!(result.overpotentials.unwrap().membrane.is_some());
        let ctl = result.controller.unwrap();
        assert!(ctl.pressure_ratio.unwrap() > 1.0);
        assert!(ctl.purge_interval_s.is_some());
        assert!(ctl.thermal_kp > 0.0 && ctl.thermal_ki > 0.0 && ctl.thermal_kd > 0.0);
    }

    #[test]
    fn test_microbial_has_no_purge() {
        let config = ReactorConfiguration::new("mfc", "MFC", ReactorType::MicrobialFuelCell)
            .with_electrodes("carbon_felt", "carbon_cloth");
        let result = run(&config, &config.parameter_space.defaults()).unwrap();
        let ctl = result.controller.unwrap();
        assert!(ctl.purge_interval_s.is_none());
        assert!(ctl.pressure_ratio.is_none());
        assert!(result.overpotentials.unwrap().membrane.is_none());
        assert_eq!(result.fluid_dynamics.unwrap().regime, FlowRegime::Laminar);
    }

    #[test]
    fn test_suggestions_point_toward_optimum() {
        let config = ReactorConfiguration::new("mfc", "MFC", ReactorType::MicrobialFuelCell);
        let params = config.parameter_space.defaults().with_value(ParameterKind::Temperature, 20.0);
        let result = run(&config, &params).unwrap();
        let suggestions = result.suggestions.unwrap();
        let t = suggestions.iter().find(|s| s.parameter == ParameterKind::Temperature).unwrap();
        assert_eq!(t.suggested_value, 30.0);
        assert!(t.expected_improvement > 0.0);
        for s in &suggestions {
            assert!((0.0..=1.0).contains(&s.confidence));
        }
    }

    #[test]
    fn test_degradation_grows_with_thermal_stress() {
        let config = pem();
        let cool = run(&config, &config.parameter_space.defaults()).unwrap();
        let hot = run(&config, &config.parameter_space.defaults().with_value(ParameterKind::Temperature, 88.0)).unwrap();
        assert!(
            hot.degradation.unwrap().loss_fraction_per_1000h
                > cool.degradation.unwrap().loss_fraction_per_1000h
        );
    }
}
