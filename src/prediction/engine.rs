//! Prediction façade: validation, dispatch, fallback, timing and caching.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, warn};

use super::cache::{CacheKey, CacheStats, PredictionCache};
use crate::catalog::ReactorCatalog;
use crate::config::{EmpiricalConstants, EngineConfig, SimConfig};
use crate::correlations::Correlations;
use crate::error::{EngineError, Result};
use crate::fidelity::{ModelInput, ModelSet, PredictionResult};
use crate::materials::PropertyTables;
use crate::types::{FidelityLevel, OperatingParameters, ReactorConfiguration};

/// What to do with parameters outside their declared range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangePolicy {
    #[default]
    Reject,
    Clamp,
}

pub struct PredictionEngine {
    models: ModelSet,
    catalog: RwLock<ReactorCatalog>,
    cache: PredictionCache,
    config: EngineConfig,
}

impl PredictionEngine {
    /// Standard tables and the built-in catalog
    pub fn new(settings: &SimConfig) -> Result<Self> {
        let tables = Arc::new(PropertyTables::standard());
        let catalog = ReactorCatalog::standard(&tables)?;
        Ok(Self::with_parts(
            tables,
            Arc::new(settings.constants.clone()),
            catalog,
            settings.engine.clone(),
        ))
    }

    pub fn with_parts(
        tables: Arc<PropertyTables>,
        constants: Arc<EmpiricalConstants>,
        catalog: ReactorCatalog,
        config: EngineConfig,
    ) -> Self {
        let cache = PredictionCache::new(config.cache_capacity, Duration::from_secs(config.cache_ttl_secs));
        Self {
            models: ModelSet::new(Correlations::new(tables, constants)),
            catalog: RwLock::new(catalog),
            cache,
            config,
        }
    }

    pub fn tables(&self) -> &PropertyTables {
        self.models.correlations().tables()
    }

    pub fn constants(&self) -> &EmpiricalConstants {
        self.models.correlations().constants()
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.config
    }

    /// Policy implied by `EngineConfig::clamp_out_of_range`
    pub fn default_policy(&self) -> RangePolicy {
        if self.config.clamp_out_of_range {
            RangePolicy::Clamp
        } else {
            RangePolicy::Reject
        }
    }

    // ------------------------------------------------------------------ catalog

    /// Adds or replaces a configuration. Results cached for a replaced
    /// configuration are dropped; they are also unreachable because cache
    /// keys carry the catalog revision.
    pub fn register(&self, config: ReactorConfiguration) -> Result<Arc<ReactorConfiguration>> {
        let mut catalog = self.catalog.write();
        let previous = catalog.get_with_revision(&config.id).ok().map(|(_, rev)| rev);
        let stored = catalog.register(config, self.tables())?;
        drop(catalog);

        let dropped = previous.map_or(0, |rev| self.cache.invalidate(&catalog_key(&stored.id, rev)));
        debug!(reactor = %stored.id, replaced = previous.is_some(), dropped, "registered reactor configuration");
        Ok(stored)
    }

    pub fn configuration(&self, id: &str) -> Result<Arc<ReactorConfiguration>> {
        Ok(self.catalog.read().get(id)?)
    }

    pub fn reactor_ids(&self) -> Vec<String> {
        self.catalog.read().ids().into_iter().map(str::to_string).collect()
    }

    // --------------------------------------------------------------- prediction

    pub fn predict(
        &self,
        reactor_id: &str,
        params: &OperatingParameters,
        fidelity: FidelityLevel,
    ) -> Result<PredictionResult> {
        self.predict_with_policy(reactor_id, params, fidelity, self.default_policy())
    }

    pub fn predict_with_policy(
        &self,
        reactor_id: &str,
        params: &OperatingParameters,
        fidelity: FidelityLevel,
        policy: RangePolicy,
    ) -> Result<PredictionResult> {
        let (config, revision) = self.catalog.read().get_with_revision(reactor_id)?;
        self.run(&config, catalog_key(&config.id, revision), params, fidelity, policy)
    }

    /// Prediction for a configuration that is not in the catalog.
    pub fn predict_inline(
        &self,
        config: &ReactorConfiguration,
        params: &OperatingParameters,
        fidelity: FidelityLevel,
        policy: RangePolicy,
    ) -> Result<PredictionResult> {
        config.validate(self.tables())?;
        let key = format!("inline:{}:{:016x}", config.id, fingerprint(config));
        self.run(config, key, params, fidelity, policy)
    }

    fn run(
        &self,
        config: &ReactorConfiguration,
        cache_id: String,
        params: &OperatingParameters,
        fidelity: FidelityLevel,
        policy: RangePolicy,
    ) -> Result<PredictionResult> {
        let start = Instant::now();

        if fidelity > config.reactor_type.max_fidelity() {
            return Err(EngineError::UnsupportedOperation {
                operation: format!("{} fidelity", fidelity),
                reactor_type: config.reactor_type.to_string(),
            });
        }

        let mut notes = Vec::new();
        let params = match policy {
            RangePolicy::Reject => {
                params.validate(&config.parameter_space)?;
                params.clone()
            }
            RangePolicy::Clamp => {
                let clamped = params.clamped(&config.parameter_space)?;
                for ((kind, before), (_, after)) in params.entries().iter().zip(clamped.entries()) {
                    if *before != after {
                        notes.push(format!("{} clamped from {} to {}", kind, before, after));
                    }
                }
                clamped
            }
        };
        config.check_required(&params)?;

        let key = CacheKey::new(&cache_id, &params, fidelity, self.config.key_decimals);
        if let Some(mut hit) = self.cache.get(&key) {
            hit.cache_hit = true;
            hit.execution_time_ms = elapsed_ms(start).min(hit.execution_time_ms);
            debug!(reactor = %config.id, %fidelity, "prediction served from cache");
            return Ok(hit);
        }

        let species = self.tables().species(&config.species)?;
        let input = ModelInput {
            config,
            params: &params,
            species,
        };

        let mut level = fidelity;
        let mut result = loop {
            match self.models.model(level).evaluate(&input) {
                Ok(result) => break result,
                Err(source) => match level.lower() {
                    Some(lower) => {
                        warn!(reactor = %config.id, failed = %level, fallback = %lower, error = %source,
                            "model failed, retrying at lower fidelity");
                        notes.push(format!(
                            "{} fidelity failed ({}); result computed at {}",
                            level, source, lower
                        ));
                        level = lower;
                    }
                    None => return Err(EngineError::Numerical { fidelity: level, source }),
                },
            }
        };

        result.fidelity = level;
        result.requested_fidelity = fidelity;
        result.warnings = notes;
        result.cache_hit = false;
        result.execution_time_ms = elapsed_ms(start);

        debug!(
            reactor = %config.id,
            requested = %fidelity,
            computed = %level,
            power_density = result.power_density,
            elapsed_ms = result.execution_time_ms,
            "prediction computed"
        );

        self.cache.insert(key, result.clone());
        Ok(result)
    }

    // -------------------------------------------------------------------- cache

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Cache namespace of a catalog entry
fn catalog_key(id: &str, revision: u64) -> String {
    format!("{}@{}", id, revision)
}

/// Content hash of an inline configuration, so two inline configurations
/// sharing an id never share cache entries.
fn fingerprint(config: &ReactorConfiguration) -> u64 {
    let mut hasher = DefaultHasher::new();
    match serde_json::to_string(config) {
        Ok(s) => s.hash(&mut hasher),
        Err(_) => config.id.hash(&mut hasher),
    }
    hasher.finish()
}
