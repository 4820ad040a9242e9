//! # Materials Module
//!
//! Static property tables for electrode materials, membranes and the
//! organisms / cell chemistries that drive each reactor.
//!
//! ## Data Sources
//!
//! - Logan, B.E. "Microbial Fuel Cells", Wiley (2008), ch. 4–6
//! - Larminie, J. & Dicks, A. "Fuel Cell Systems Explained", 2nd ed. (2003)
//! - O'Hayre, R. et al. "Fuel Cell Fundamentals", 3rd ed. (2016)
//!
//! The tables are built once and shared as `Arc<PropertyTables>`; nothing in
//! the crate reads them as global state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Electrode material row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectrodeMaterial {
    pub name: String,
    /// Additive contribution to the material factor (dimensionless)
    pub performance_factor: f64,
    /// Multiplier on the species exchange current density
    pub exchange_current_multiplier: f64,
    /// Electronic conductivity (S/m)
    pub conductivity: f64,
    /// Specific surface relative to a flat plate
    pub surface_factor: f64,
    /// Cost ($/m²)
    pub cost_per_m2: f64,
}

/// Membrane / separator row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembraneMaterial {
    pub name: String,
    /// Area-specific resistance (Ω·m²)
    pub area_resistance: f64,
    /// Additive contribution to the material factor (dimensionless)
    pub performance_factor: f64,
    /// Cost ($/m²)
    pub cost_per_m2: f64,
}

/// Gas feed of a gas-fed chemistry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasFeed {
    /// Fuel gas name
    pub fuel: String,
    /// Fuel mole fraction at the inlet (%)
    pub fuel_inlet_percent: f64,
    /// Electrons per fuel molecule
    pub electrons_per_fuel: f64,
    /// Oxygen mole fraction of the oxidant stream (%)
    pub oxidant_inlet_percent: f64,
}

/// Organism or cell chemistry: kinetic constants and optimal ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub name: String,
    /// Open-circuit-ish base cell voltage at optimum (V)
    pub base_voltage: f64,
    /// Base current density at optimum (A/m²)
    pub base_current_density: f64,
    /// Base efficiency (%)
    pub base_efficiency: f64,
    /// Optimal temperature (°C)
    pub optimal_temperature: f64,
    /// Maximum tolerated temperature (°C)
    pub max_temperature: f64,
    /// Optimal pH; `None` marks pH-insensitive chemistries
    pub optimal_ph: Option<f64>,
    /// Optimal relative humidity (%); `None` when not humidified
    pub optimal_humidity: Option<f64>,
    /// Exchange current density i₀ (A/m²)
    pub exchange_current_density: f64,
    /// Charge transfer coefficient α
    pub transfer_coefficient: f64,
    /// Limiting current density i_L (A/m²)
    pub limiting_current_density: f64,
    /// Monod half-saturation constant K_s (g/L), microbial only
    pub half_saturation: Option<f64>,
    /// Ionic conductivity of the electrolyte between the electrodes (S/m)
    pub electrolyte_conductivity: f64,
    /// Reactant diffusion coefficient in the working medium (m²/s)
    pub diffusivity: f64,
    /// Bulk reactant concentration at reference conditions (mol/m³)
    pub reference_concentration: f64,
    /// Gas feed, gas-fed chemistries only
    pub gas_feed: Option<GasFeed>,
}

impl SpeciesProfile {
    pub fn is_ph_sensitive(&self) -> bool {
        self.optimal_ph.is_some()
    }
}

/// Immutable property database
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyTables {
    electrodes: HashMap<String, ElectrodeMaterial>,
    membranes: HashMap<String, MembraneMaterial>,
    species: HashMap<String, SpeciesProfile>,
}

impl PropertyTables {
    /// Empty tables, for fixtures
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_electrode(mut self, row: ElectrodeMaterial) -> Self {
        self.electrodes.insert(row.name.clone(), row);
        self
    }

    pub fn with_membrane(mut self, row: MembraneMaterial) -> Self {
        self.membranes.insert(row.name.clone(), row);
        self
    }

    pub fn with_species(mut self, row: SpeciesProfile) -> Self {
        self.species.insert(row.name.clone(), row);
        self
    }

    pub fn electrode(&self, name: &str) -> Result<&ElectrodeMaterial, ValidationError> {
        self.electrodes
            .get(name)
            .ok_or_else(|| ValidationError::UnknownMaterial(name.to_string()))
    }

    pub fn membrane(&self, name: &str) -> Result<&MembraneMaterial, ValidationError> {
        self.membranes
            .get(name)
            .ok_or_else(|| ValidationError::UnknownMaterial(name.to_string()))
    }

    pub fn species(&self, name: &str) -> Result<&SpeciesProfile, ValidationError> {
        self.species
            .get(name)
            .ok_or_else(|| ValidationError::UnknownSpecies(name.to_string()))
    }

    /// Lenient lookup used by the material factor: unknown names read as `None`
    pub fn find_electrode(&self, name: &str) -> Option<&ElectrodeMaterial> {
        self.electrodes.get(name)
    }

    pub fn find_membrane(&self, name: &str) -> Option<&MembraneMaterial> {
        self.membranes.get(name)
    }

    pub fn species_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.species.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Built-in literature tables
    pub fn standard() -> Self {
        let mut tables = Self::new();

        // ====================================================================
        // ELECTRODES
        // ====================================================================
        let electrodes = [
            // name, performance, i0 multiplier, σ (S/m), surface, $/m²
            ("carbon_cloth", 0.10, 1.0, 1.2e3, 3.0, 625.0),
            ("carbon_felt", 0.12, 1.2, 2.0e2, 8.0, 150.0),
            ("carbon_paper", 0.05, 0.9, 1.6e3, 1.5, 1000.0),
            ("graphite_brush", 0.15, 1.4, 2.5e3, 12.0, 400.0),
            ("graphite_plate", 0.00, 0.6, 2.5e4, 1.0, 300.0),
            ("stainless_steel_mesh", -0.05, 0.4, 1.4e6, 2.0, 60.0),
            ("platinum_carbon", 0.20, 3.0, 1.0e3, 20.0, 7500.0),
            ("nickel_foam", 0.08, 1.5, 1.4e6, 6.0, 180.0),
            ("lsm", 0.10, 1.3, 1.5e4, 4.0, 900.0),
            ("ni_ysz", 0.12, 1.6, 1.0e5, 5.0, 1100.0),
        ];
        for (name, perf, i0m, sigma, surface, cost) in electrodes {
            tables = tables.with_electrode(ElectrodeMaterial {
                name: name.to_string(),
                performance_factor: perf,
                exchange_current_multiplier: i0m,
                conductivity: sigma,
                surface_factor: surface,
                cost_per_m2: cost,
            });
        }

        // ====================================================================
        // MEMBRANES
        // ====================================================================
        let membranes = [
            // name, ASR (Ω·m²), performance, $/m²
            ("nafion_117", 1.8e-5, 0.05, 1400.0),
            ("nafion_212", 6.0e-6, 0.08, 900.0),
            ("cmi_7000", 3.0e-4, 0.02, 80.0),
            ("ami_7001", 4.0e-4, 0.01, 80.0),
            ("ysz", 1.5e-5, 0.06, 1200.0),
        ];
        for (name, asr, perf, cost) in membranes {
            tables = tables.with_membrane(MembraneMaterial {
                name: name.to_string(),
                area_resistance: asr,
                performance_factor: perf,
                cost_per_m2: cost,
            });
        }

        // ====================================================================
        // MICROBIAL SPECIES (liquid anolyte, substrate-limited)
        // ====================================================================
        let microbes = [
            // name, V, i (A/m²), η (%), T_opt, T_max, pH_opt, i0, α, i_L, K_s
            ("geobacter_sulfurreducens", 0.80, 4.5, 45.0, 30.0, 40.0, 7.0, 1.0e-3, 0.5, 10.0, 0.15),
            ("shewanella_oneidensis", 0.65, 2.5, 35.0, 30.0, 37.0, 7.0, 5.0e-4, 0.45, 6.0, 0.30),
            ("mixed_culture", 0.70, 3.5, 40.0, 32.0, 45.0, 7.0, 8.0e-4, 0.5, 8.0, 0.25),
            ("pseudomonas_aeruginosa", 0.55, 1.5, 30.0, 37.0, 42.0, 7.2, 3.0e-4, 0.4, 4.0, 0.40),
        ];
        for (name, v, i, eff, t_opt, t_max, ph, i0, alpha, il, ks) in microbes {
            tables = tables.with_species(SpeciesProfile {
                name: name.to_string(),
                base_voltage: v,
                base_current_density: i,
                base_efficiency: eff,
                optimal_temperature: t_opt,
                max_temperature: t_max,
                optimal_ph: Some(ph),
                optimal_humidity: None,
                exchange_current_density: i0,
                transfer_coefficient: alpha,
                limiting_current_density: il,
                half_saturation: Some(ks),
                electrolyte_conductivity: 1.0,
                // acetate in water
                diffusivity: 1.2e-9,
                reference_concentration: 12.0,
                gas_feed: None,
            });
        }

        // ====================================================================
        // FUEL-CELL CHEMISTRIES (gas-fed, pH-insensitive)
        // ====================================================================
        let chemistries = [
            // name, V, i (A/m²), η (%), T_opt, T_max, RH_opt, i0, α, i_L, κ (S/m)
            ("pem", 0.70, 6_000.0, 50.0, 70.0, 90.0, Some(90.0), 1.0e-1, 0.5, 15_000.0, 10.0),
            ("sofc", 0.80, 5_000.0, 55.0, 800.0, 950.0, None, 5.0e2, 0.5, 12_000.0, 5.0),
            ("pafc", 0.67, 2_500.0, 42.0, 200.0, 220.0, None, 1.0e-2, 0.5, 8_000.0, 8.0),
            ("afc", 0.75, 3_000.0, 60.0, 70.0, 90.0, Some(60.0), 5.0e-1, 0.5, 9_000.0, 50.0),
        ];
        for (name, v, i, eff, t_opt, t_max, rh, i0, alpha, il, kappa) in chemistries {
            tables = tables.with_species(SpeciesProfile {
                name: name.to_string(),
                base_voltage: v,
                base_current_density: i,
                base_efficiency: eff,
                optimal_temperature: t_opt,
                max_temperature: t_max,
                optimal_ph: None,
                optimal_humidity: rh,
                exchange_current_density: i0,
                transfer_coefficient: alpha,
                limiting_current_density: il,
                half_saturation: None,
                electrolyte_conductivity: kappa,
                // H₂ in N₂ / water vapour
                diffusivity: 7.0e-5,
                reference_concentration: 40.0,
                gas_feed: Some(GasFeed {
                    fuel: "H2".to_string(),
                    fuel_inlet_percent: 99.97,
                    electrons_per_fuel: 2.0,
                    oxidant_inlet_percent: 20.95,
                }),
            });
        }

        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tables_cover_defaults() {
        let tables = PropertyTables::standard();
        for rt in crate::types::ReactorType::ALL {
            assert!(tables.species(rt.default_species()).is_ok(), "{:?}", rt);
        }
    }

    #[test]
    fn test_unknown_lookups() {
        let tables = PropertyTables::standard();
        assert_eq!(
            tables.electrode("adamantium"),
            Err(ValidationError::UnknownMaterial("adamantium".into()))
        );
        assert!(tables.find_membrane("adamantium").is_none());
        assert!(matches!(tables.species("tardigrade"), Err(ValidationError::UnknownSpecies(_))));
    }

    #[test]
    fn test_fuel_cells_are_ph_insensitive() {
        let tables = PropertyTables::standard();
        assert!(!tables.species("pem").unwrap().is_ph_sensitive());
        assert!(tables.species("geobacter_sulfurreducens").unwrap().is_ph_sensitive());
    }

    #[test]
    fn test_temperature_windows_are_ordered() {
        let tables = PropertyTables::standard();
        for name in tables.species_names() {
            let s = tables.species(name).unwrap();
            assert!(s.optimal_temperature < s.max_temperature, "{}", name);
        }
    }
}
