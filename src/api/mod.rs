//! # JSON Interface
//!
//! The two request shapes an HTTP layer round-trips: prediction and
//! optimization. Transport is out of scope; this module only parses,
//! dispatches, rounds, and maps errors.

pub mod service;
pub mod wire;

pub use service::{ApiError, Service};
pub use wire::{
    round_numbers, round_to, to_wire, OptimizationRequestWire, OptimizationResponse, Performance, PredictionRequest,
};
