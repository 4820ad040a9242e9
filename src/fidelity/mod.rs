//! # Fidelity Models
//!
//! Three tiers, each a composition of the one below:
//!
//! ```text
//! Basic         closed-form V, I, P, η, status, confidence
//!   └─ Intermediate   + thermal profile, gas distribution
//!        └─ Advanced  + overpotentials, fluid dynamics, controller,
//!                       suggestions, electrochemistry, degradation
//! ```
//!
//! A model returns either a complete result for its level or a
//! [`NumericalError`]; it never returns a partially filled one. Fallback to a
//! lower tier is the prediction engine's job.

pub mod advanced;
pub mod basic;
pub mod intermediate;
pub mod result;

use crate::correlations::Correlations;
use crate::error::NumericalError;
use crate::materials::SpeciesProfile;
use crate::types::{FidelityLevel, OperatingParameters, ReactorConfiguration};

pub use advanced::AdvancedModel;
pub use basic::BasicModel;
pub use intermediate::IntermediateModel;
pub use result::{
    ConfidenceInterval, ControllerSetpoints, Degradation, Electrochemistry, FluidDynamics,
    GasDistribution, GasStream, HotSpot, OperationalStatus, OptimizationSuggestion,
    PredictionResult, ThermalProfile,
};

/// Everything a model reads. Parameters are already validated.
#[derive(Debug, Clone, Copy)]
pub struct ModelInput<'a> {
    pub config: &'a ReactorConfiguration,
    pub params: &'a OperatingParameters,
    pub species: &'a SpeciesProfile,
}

/// One fidelity tier
pub trait FidelityModel: Send + Sync {
    fn level(&self) -> FidelityLevel;

    fn evaluate(&self, input: &ModelInput<'_>) -> Result<PredictionResult, NumericalError>;
}

/// The three tiers sharing one correlation library
#[derive(Debug, Clone)]
pub struct ModelSet {
    advanced: AdvancedModel,
}

impl ModelSet {
    pub fn new(correlations: Correlations) -> Self {
        Self {
            advanced: AdvancedModel::new(IntermediateModel::new(BasicModel::new(correlations))),
        }
    }

    pub fn model(&self, level: FidelityLevel) -> &dyn FidelityModel {
        match level {
            FidelityLevel::Basic => self.advanced.intermediate().basic(),
            FidelityLevel::Intermediate => self.advanced.intermediate(),
            FidelityLevel::Advanced => &self.advanced,
        }
    }

    pub fn correlations(&self) -> &Correlations {
        self.advanced.intermediate().basic().correlations()
    }
}
