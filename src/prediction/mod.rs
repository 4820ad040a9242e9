//! # Prediction Engine
//!
//! `predict(reactor, parameters, fidelity)`:
//!
//! 1. reject a fidelity above the reactor type's maximum
//! 2. validate (or clamp) parameters against the declared ranges
//! 3. serve from the LRU+TTL cache when possible
//! 4. evaluate the requested tier, falling back one tier per numerical failure
//!
//! The returned `fidelity` is always the tier actually computed.

pub mod cache;
pub mod engine;

pub use cache::{CacheKey, CacheStats, PredictionCache};
pub use engine::{PredictionEngine, RangePolicy};
