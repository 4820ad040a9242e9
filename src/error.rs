//! # Error Taxonomy
//!
//! Four families, matching how callers react to them:
//!
//! - [`ValidationError`]: bad input, surfaced immediately with field and range
//! - [`EngineError::UnsupportedOperation`]: the reactor type cannot do this
//! - [`NumericalError`]: the math broke; triggers fidelity fallback
//! - [`EngineError::Infeasible`]: no solution satisfies the constraints

use thiserror::Error;

use crate::types::FidelityLevel;

/// Input rejected before any model runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("parameter `{field}` = {value} outside valid range [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter `{field}` is not a finite number")]
    NotFinite { field: String },

    #[error("parameter `{0}` has no declared range for this reactor")]
    UndeclaredParameter(String),

    #[error("parameter `{field}` is required by reactor type {reactor_type}")]
    MissingParameter { field: String, reactor_type: String },

    #[error("unknown material `{0}`")]
    UnknownMaterial(String),

    #[error("unknown organism or cell chemistry `{0}`")]
    UnknownSpecies(String),

    #[error("unknown reactor configuration `{0}`")]
    UnknownReactor(String),

    #[error("malformed configuration `{id}`: {reason}")]
    MalformedConfig { id: String, reason: String },

    #[error("invalid objective: {0}")]
    InvalidObjective(String),
}

/// Arithmetic failures inside the correlation library or a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalError {
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    #[error("exponential overflow in {context}: exponent {exponent:.1}")]
    Overflow { context: &'static str, exponent: f64 },

    #[error("non-finite value produced by {0}")]
    NonFinite(&'static str),

    #[error("{0} did not converge")]
    NonConvergence(&'static str),

    #[error("every candidate in iteration {iteration} failed to evaluate")]
    GenerationFailed { iteration: usize },
}

/// Top-level error returned by the prediction and optimization engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{operation} is not supported for reactor type {reactor_type}")]
    UnsupportedOperation {
        operation: String,
        reactor_type: String,
    },

    #[error("numerical failure at {fidelity} fidelity: {source}")]
    Numerical {
        fidelity: FidelityLevel,
        #[source]
        source: NumericalError,
    },

    #[error("infeasible: {0}")]
    Infeasible(String),
}

impl EngineError {
    /// Numerical error attributed to the optimization loop (reported at Basic).
    pub fn numerical(source: NumericalError) -> Self {
        EngineError::Numerical {
            fidelity: FidelityLevel::Basic,
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, EngineError::Numerical { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Returns `value` when it is finite, otherwise a [`NumericalError::NonFinite`].
pub(crate) fn finite(value: f64, context: &'static str) -> std::result::Result<f64, NumericalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(NumericalError::NonFinite(context))
    }
}

/// Returns `value` when it is strictly positive and finite.
pub(crate) fn positive(value: f64, context: &'static str) -> std::result::Result<f64, NumericalError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(NumericalError::DivisionByZero(context))
    }
}
