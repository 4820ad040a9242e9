//! # FCSIM-RS
//!
//! Multi-fidelity performance prediction and operating-point optimization
//! for bioelectrochemical reactors (MFC, MEC, MDC) and fuel-cell stacks
//! (PEM, SOFC, PAFC, AFC).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                               FCSIM-RS                                      │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  api          JSON request/response shapes, error mapping                   │
//! │  optimizer    gradient / genetic / Bayesian / swarm search over predict()   │
//! │  prediction   validation, LRU+TTL cache, fidelity fallback                  │
//! │  fidelity     Basic ⊂ Intermediate ⊂ Advanced models                        │
//! │  correlations factors, Butler-Volmer, Cottrell, Randles, mass transfer      │
//! │  materials    immutable property tables                                     │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use fcsim_rs::{FidelityLevel, PredictionEngine, SimConfig};
//!
//! let engine = PredictionEngine::new(&SimConfig::default())?;
//! let params = engine.configuration("pem-stack")?.parameter_space.defaults();
//! let result = engine.predict("pem-stack", &params, FidelityLevel::Intermediate)?;
//! println!("{:.1} W/m² at {:.2} V", result.power_density, result.stack_voltage);
//! # Ok::<(), fcsim_rs::EngineError>(())
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod correlations;
pub mod error;
pub mod fidelity;
pub mod materials;
pub mod optimizer;
pub mod prediction;
pub mod types;

// Re-exports
pub use catalog::ReactorCatalog;
pub use config::{EmpiricalConstants, EngineConfig, SimConfig};
pub use error::{EngineError, NumericalError, Result, ValidationError};
pub use fidelity::PredictionResult;
pub use optimizer::{Algorithm, OptimizationEngine, OptimizationRequest, OptimizationRun, ObjectiveSpec};
pub use prediction::{PredictionEngine, RangePolicy};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One-paragraph description of the build
pub fn info() -> String {
    format!(
        "FCSIM-RS v{}\n\
         Multi-fidelity reactor performance prediction and optimization\n\
         Reactors: MFC, MEC, MDC, PEM, SOFC, PAFC, AFC\n\
         Fidelity: basic, intermediate, advanced",
        VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info() {
        let info = info();
        assert!(info.contains("FCSIM-RS"));
        assert!(info.contains(VERSION));
    }
}
