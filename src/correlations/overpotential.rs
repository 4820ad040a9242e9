//! Voltage-loss breakdown.

use serde::{Deserialize, Serialize};

use super::{Correlations, MaterialSet};
use crate::constants::{
    celsius_to_kelvin, ELECTRONS_PER_REACTION, EPSILON, FARADAY, GAS_CONSTANT,
    MAX_LIMITING_CURRENT_RATIO,
};
use crate::error::{finite, positive, NumericalError};
use crate::materials::SpeciesProfile;
use crate::types::{Geometry, OperatingParameters};

/// Electrode thickness assumed for the electronic resistance term (m)
const ELECTRODE_THICKNESS_M: f64 = 1.0e-3;

/// Overpotentials (V)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overpotentials {
    pub activation: f64,
    pub concentration: f64,
    pub ohmic: f64,
    /// Present only when the reactor has a membrane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membrane: Option<f64>,
}

impl Overpotentials {
    pub fn total(&self) -> f64 {
        self.activation + self.concentration + self.ohmic + self.membrane.unwrap_or(0.0)
    }
}

impl Correlations {
    /// Species i₀ scaled by the mean multiplier of the known electrodes (A/m²)
    pub fn exchange_current_density(&self, species: &SpeciesProfile, materials: &MaterialSet<'_>) -> f64 {
        let multipliers: Vec<f64> = materials
            .electrodes()
            .filter_map(|name| self.tables().find_electrode(name))
            .map(|m| m.exchange_current_multiplier)
            .collect();
        if multipliers.is_empty() {
            species.exchange_current_density
        } else {
            species.exchange_current_density * multipliers.iter().sum::<f64>() / multipliers.len() as f64
        }
    }

    /// Overpotential breakdown at `current_density` (A/m²).
    ///
    /// - activation: η = (RT/αnF)·asinh(i/2i₀)
    /// - concentration: η = (RT/nF)·ln(1/(1 − i/i_L)), i/i_L ≤ 0.99
    /// - ohmic: i·(gap/κ + electrode electronic resistance)
    /// - membrane: i·ASR_membrane
    pub fn overpotentials(
        &self,
        current_density: f64,
        params: &OperatingParameters,
        species: &SpeciesProfile,
        geometry: &Geometry,
        materials: &MaterialSet<'_>,
    ) -> Result<Overpotentials, NumericalError> {
        let tables = self.tables();
        let i = current_density.max(0.0);
        let t = positive(celsius_to_kelvin(params.temperature), "overpotential temperature")?;
        let rt_nf = GAS_CONSTANT * t / (ELECTRONS_PER_REACTION * FARADAY);

        // Activation
        let i0 = positive(self.exchange_current_density(species, materials), "exchange current")?;
        let alpha = positive(species.transfer_coefficient, "transfer coefficient")?;
        let activation = rt_nf / alpha * (i / (2.0 * i0)).asinh();

        // Concentration
        let i_l = positive(species.limiting_current_density, "limiting current")?;
        let ratio = (i / i_l).clamp(0.0, MAX_LIMITING_CURRENT_RATIO);
        let concentration = rt_nf * (1.0 / (1.0 - ratio)).ln();

        // Ohmic
        let kappa = positive(species.electrolyte_conductivity, "electrolyte conductivity")?;
        let gap_m = geometry.electrode_spacing_cm / 100.0;
        let electronic: f64 = materials
            .electrodes()
            .filter_map(|name| tables.find_electrode(name))
            .map(|m| ELECTRODE_THICKNESS_M / m.conductivity.max(EPSILON))
            .sum();
        let ohmic = i * (gap_m / kappa + electronic);

        // Membrane
        let membrane = materials.membrane.map(|name| {
            let asr = tables.find_membrane(name).map_or(0.0, |m| m.area_resistance);
            i * asr
        });

        Ok(Overpotentials {
            activation: finite(activation, "activation overpotential")?,
            concentration: finite(concentration, "concentration overpotential")?,
            ohmic: finite(ohmic, "ohmic overpotential")?,
            membrane: membrane.map(|m| finite(m, "membrane overpotential")).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParameterSpace, ReactorConfiguration, ReactorType};

    fn pem() -> (Correlations, ReactorConfiguration) {
        let cfg = ReactorConfiguration::new("pem", "PEM", ReactorType::ProtonExchangeMembrane)
            .with_electrodes("platinum_carbon", "platinum_carbon");
        (Correlations::standard(), cfg)
    }

    #[test]
    fn test_membrane_term_only_with_membrane() {
        let (lib, cfg) = pem();
        let species = lib.tables().species("pem").unwrap().clone();
        let params = ParameterSpace::pem().defaults();

        let without = lib
            .overpotentials(5000.0, &params, &species, &cfg.geometry, &MaterialSet::of(&cfg))
            .unwrap();
        assert!(without.membrane.is_none());

        let cfg = cfg.with_membrane("nafion_212");
        let with = lib
            .overpotentials(5000.0, &params, &species, &cfg.geometry, &MaterialSet::of(&cfg))
            .unwrap();
        assert!(with.membrane.unwrap() > 0.0);
        assert!(with.total() > without.total());
    }

    #[test]
    fn test_concentration_bounded_beyond_limiting_current() {
        let (lib, cfg) = pem();
        let species = lib.tables().species("pem").unwrap().clone();
        let params = ParameterSpace::pem().defaults();
        let eta = lib
            .overpotentials(1e9, &params, &species, &cfg.geometry, &MaterialSet::of(&cfg))
            .unwrap();
        assert!(eta.concentration.is_finite());
        assert!(eta.concentration > 0.0);
    }

    #[test]
    fn test_zero_current_has_zero_losses() {
        let (lib, cfg) = pem();
        let species = lib.tables().species("pem").unwrap().clone();
        let params = ParameterSpace::pem().defaults();
        let eta = lib
            .overpotentials(0.0, &params, &species, &cfg.geometry, &MaterialSet::of(&cfg))
            .unwrap();
        assert_eq!(eta.total(), 0.0);
    }
}
