//! # Correlation Library
//!
//! Pure, stateless functions: dimensionless numbers, kinetic currents,
//! overpotentials and the empirical performance factors.
//!
//! ```text
//! factors        temperature / pH / humidity / pressure / material
//! kinetics       Butler–Volmer, Cottrell, Randles, Faraday
//! transport      Re, Sc, Sh, k_m, i_L
//! overpotential  activation + concentration + ohmic (+ membrane)
//! ```
//!
//! Physical relations are free functions. The empirical factors and the
//! overpotential breakdown need the property tables and constants, which are
//! injected through [`Correlations`].

pub mod factors;
pub mod kinetics;
pub mod overpotential;
pub mod transport;

use std::sync::Arc;

use crate::config::EmpiricalConstants;
use crate::materials::PropertyTables;
use crate::types::ReactorConfiguration;

pub use kinetics::{butler_volmer_current, cottrell_current, faraday_molar_rate, randles_impedance, Impedance};
pub use overpotential::Overpotentials;
pub use transport::{
    limiting_current_density, mass_transfer_coefficient, reynolds_number, schmidt_number,
    sherwood_number, FlowRegime,
};

/// Names of the materials a reactor is built from
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialSet<'a> {
    pub anode: Option<&'a str>,
    pub cathode: Option<&'a str>,
    pub membrane: Option<&'a str>,
}

impl<'a> MaterialSet<'a> {
    pub fn of(config: &'a ReactorConfiguration) -> Self {
        Self {
            anode: config.anode.as_deref(),
            cathode: config.cathode.as_deref(),
            membrane: config.membrane.as_deref(),
        }
    }

    pub fn electrodes(&self) -> impl Iterator<Item = &'a str> {
        self.anode.into_iter().chain(self.cathode)
    }
}

/// Correlation library bound to a set of property tables and constants
#[derive(Debug, Clone)]
pub struct Correlations {
    tables: Arc<PropertyTables>,
    constants: Arc<EmpiricalConstants>,
}

impl Correlations {
    pub fn new(tables: Arc<PropertyTables>, constants: Arc<EmpiricalConstants>) -> Self {
        Self { tables, constants }
    }

    /// Standard tables with default constants
    pub fn standard() -> Self {
        Self::new(
            Arc::new(PropertyTables::standard()),
            Arc::new(EmpiricalConstants::default()),
        )
    }

    pub fn tables(&self) -> &PropertyTables {
        &self.tables
    }

    pub fn constants(&self) -> &EmpiricalConstants {
        &self.constants
    }
}
