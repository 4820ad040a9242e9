//! Request handling for the surrounding HTTP layer: parse, run, round, and
//! map engine errors onto client-facing ones.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use super::wire::{prediction_to_wire, to_wire, OptimizationRequestWire, OptimizationResponse, PredictionRequest};
use crate::config::SimConfig;
use crate::error::EngineError;
use crate::optimizer::{CancellationToken, OptimizationEngine};
use crate::prediction::{PredictionEngine, RangePolicy};

/// What a caller of the API sees. Internal failures only carry an id that
/// can be matched against the logs.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ApiError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("no solution: {message}")]
    NoSolution { message: String },

    #[error("internal error (correlation id {correlation_id})")]
    Internal {
        #[serde(rename = "correlationId")]
        correlation_id: String,
    },
}

impl ApiError {
    /// HTTP status the outer layer should answer with
    pub fn status(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::NoSolution { .. } => 422,
            ApiError::Internal { .. } => 500,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into() }
    }

    fn internal(detail: &dyn std::fmt::Display) -> Self {
        let correlation_id = Uuid::new_v4().to_string();
        error!(correlation_id = %correlation_id, error = %detail, "request failed");
        ApiError::Internal { correlation_id }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(v) => ApiError::bad_request(v.to_string()),
            EngineError::UnsupportedOperation { .. } => ApiError::bad_request(e.to_string()),
            EngineError::Infeasible(message) => ApiError::NoSolution { message },
            EngineError::Numerical { .. } => ApiError::internal(&e),
        }
    }
}

pub struct Service {
    engine: Arc<PredictionEngine>,
    optimizer: OptimizationEngine,
    decimals: u32,
}

impl Service {
    pub fn new(config: &SimConfig) -> Result<Self, EngineError> {
        let engine = Arc::new(PredictionEngine::new(config)?);
        Ok(Self::with_engine(engine, config))
    }

    pub fn with_engine(engine: Arc<PredictionEngine>, config: &SimConfig) -> Self {
        Self {
            optimizer: OptimizationEngine::new(engine.clone(), config.optimizer.clone()),
            decimals: engine.engine_config().wire_decimals,
            engine,
        }
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub fn predict(&self, request: PredictionRequest) -> Result<Value, ApiError> {
        let policy = if request.clamp { RangePolicy::Clamp } else { self.engine.default_policy() };
        let result = match (&request.reactor_id, &request.inline_config) {
            (Some(id), None) => self.engine.predict_with_policy(id, &request.parameters, request.fidelity, policy)?,
            (None, Some(config)) => self.engine.predict_inline(config, &request.parameters, request.fidelity, policy)?,
            (Some(_), Some(_)) => return Err(ApiError::bad_request("give either reactorId or inlineConfig, not both")),
            (None, None) => return Err(ApiError::bad_request("reactorId or inlineConfig is required")),
        };
        prediction_to_wire(&result, self.decimals).map_err(|e| ApiError::internal(&e))
    }

    pub fn optimize(&self, request: OptimizationRequestWire, cancel: Option<&CancellationToken>) -> Result<Value, ApiError> {
        let run = self.optimizer.optimize(&request.into_request(), cancel)?;
        to_wire(&OptimizationResponse::from(&run), self.decimals).map_err(|e| ApiError::internal(&e))
    }

    pub fn predict_json(&self, body: &str) -> Result<String, ApiError> {
        let request: PredictionRequest = parse(body)?;
        Ok(self.predict(request)?.to_string())
    }

    pub fn optimize_json(&self, body: &str) -> Result<String, ApiError> {
        let request: OptimizationRequestWire = parse(body)?;
        Ok(self.optimize(request, None)?.to_string())
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "malformed request body");
        ApiError::bad_request(format!("malformed request: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fidelity::PredictionResult;
    use crate::types::{FidelityLevel, ParameterKind, ReactorConfiguration, ReactorType};

    fn service() -> Service {
        Service::new(&SimConfig::default()).unwrap()
    }

    #[test]
    fn test_prediction_round_trip_within_precision() {
        let svc = service();
        let params = svc.engine().configuration("pem-stack").unwrap().parameter_space.defaults();
        let direct = svc.engine().predict("pem-stack", &params, FidelityLevel::Advanced).unwrap();
        let body = serde_json::to_string(&PredictionRequest {
            reactor_id: Some("pem-stack".into()),
            inline_config: None,
            parameters: params,
            fidelity: FidelityLevel::Advanced,
            clamp: false,
        })
        .unwrap();
        let back: PredictionResult = serde_json::from_str(&svc.predict_json(&body).unwrap()).unwrap();

        let close = |a: f64, b: f64| (a - b).abs() <= 1e-6 * a.abs().max(1.0);
        assert!(close(back.power_density, direct.power_density));
        assert!(close(back.stack_voltage, direct.stack_voltage));
        assert!(close(back.efficiency, direct.efficiency));
        assert_eq!(back.fidelity, direct.fidelity);
        assert!(back.thermal.is_some() && back.fluid_dynamics.is_some());
        let (a, b) = (back.thermal.unwrap(), direct.thermal.unwrap());
        assert!(close(a.peak_temperature, b.peak_temperature));
    }

    #[test]
    fn test_basic_response_omits_higher_tiers() {
        let svc = service();
        let params = svc.engine().configuration("mfc-lab").unwrap().parameter_space.defaults();
        let value = svc
            .predict(PredictionRequest {
                reactor_id: Some("mfc-lab".into()),
                inline_config: None,
                parameters: params,
                fidelity: FidelityLevel::Basic,
                clamp: false,
            })
            .unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("powerDensity"));
        assert!(!obj.contains_key("thermal"));
        assert!(!obj.contains_key("fluidDynamics"));
    }

    #[test]
    fn test_inline_configuration() {
        let svc = service();
        let config = ReactorConfiguration::new("bench-1", "Bench MFC", ReactorType::MicrobialFuelCell)
            .with_electrodes("carbon_felt", "carbon_cloth");
        let params = config.parameter_space.defaults();
        let value = svc
            .predict(PredictionRequest {
                reactor_id: None,
                inline_config: Some(config),
                parameters: params,
                fidelity: FidelityLevel::Basic,
                clamp: false,
            })
            .unwrap();
        assert!(value["powerDensity"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_error_mapping() {
        let svc = service();
        let params = svc
            .engine()
            .configuration("mfc-lab")
            .unwrap()
            .parameter_space
            .defaults()
            .with_value(ParameterKind::Temperature, 99.0);
        let err = svc
            .predict(PredictionRequest {
                reactor_id: Some("mfc-lab".into()),
                inline_config: None,
                parameters: params,
                fidelity: FidelityLevel::Basic,
                clamp: false,
            })
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("temperature"));

        assert_eq!(svc.predict_json("{not json").unwrap_err().status(), 400);

        let no_solution = ApiError::from(EngineError::Infeasible("empty".into()));
        assert_eq!(no_solution.status(), 422);

        let internal = ApiError::from(EngineError::numerical(crate::error::NumericalError::NonFinite("x")));
        match &internal {
            ApiError::Internal { correlation_id } => assert!(Uuid::parse_str(correlation_id).is_ok()),
            other => panic!("unexpected {:?}", other),
        }
        let json = serde_json::to_value(&internal).unwrap();
        assert_eq!(json["error"], "internal");
        assert!(json.get("correlationId").is_some());
    }

    #[test]
    fn test_optimization_response_shape() {
        let svc = service();
        let params = svc.engine().configuration("mfc-lab").unwrap().parameter_space.defaults();
        let body = serde_json::json!({
            "reactorId": "mfc-lab",
            "currentParameters": params,
            "objective": "maximizePower",
            "algorithm": "genetic_algorithm",
            "maxIterations": 2
        })
        .to_string();
        let out: serde_json::Value = serde_json::from_str(&svc.optimize_json(&body).unwrap()).unwrap();
        assert!(out["performance"]["improvement"].as_str().unwrap().ends_with('%'));
        assert!(out["iterationLog"].as_array().unwrap().len() <= 2);
        assert_eq!(out["mode"], "single");
        assert!(out["optimizedParameters"]["temperature"].is_number());
        assert!(out["recommendations"].is_array());
        assert!(out["converged"].is_boolean());
    }

    #[test]
    fn test_infeasible_constraints_map_to_no_solution() {
        let svc = service();
        let params = svc.engine().configuration("mfc-lab").unwrap().parameter_space.defaults();
        let body = serde_json::json!({
            "reactorId": "mfc-lab",
            "currentParameters": params,
            "objective": "maximizePower",
            "algorithm": "particle_swarm",
            "constraints": {"bounds": {"temperature": {"min": 40.0, "max": 30.0}}, "derived": []}
        })
        .to_string();
        assert_eq!(svc.optimize_json(&body).unwrap_err().status(), 422);
    }
}
