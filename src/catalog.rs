//! Built-in reactor configurations and the id → configuration registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::materials::PropertyTables;
use crate::types::{Geometry, ReactorConfiguration, ReactorType};

#[derive(Debug, Clone)]
struct Entry {
    config: Arc<ReactorConfiguration>,
    revision: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ReactorCatalog {
    configs: HashMap<String, Entry>,
    // bumped on every registration
    revision: u64,
}

impl ReactorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates against `tables` before storing. Replaces an existing id
    /// under a new revision.
    pub fn register(
        &mut self,
        config: ReactorConfiguration,
        tables: &PropertyTables,
    ) -> Result<Arc<ReactorConfiguration>, ValidationError> {
        config.validate(tables)?;
        self.revision += 1;
        let config = Arc::new(config);
        self.configs.insert(
            config.id.clone(),
            Entry {
                config: Arc::clone(&config),
                revision: self.revision,
            },
        );
        Ok(config)
    }

    pub fn get(&self, id: &str) -> Result<Arc<ReactorConfiguration>, ValidationError> {
        self.get_with_revision(id).map(|(config, _)| config)
    }

    /// Configuration plus the revision it was registered under
    pub fn get_with_revision(&self, id: &str) -> Result<(Arc<ReactorConfiguration>, u64), ValidationError> {
        self.configs
            .get(id)
            .map(|e| (Arc::clone(&e.config), e.revision))
            .ok_or_else(|| ValidationError::UnknownReactor(id.to_string()))
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// One reference reactor per technology
    pub fn standard(tables: &PropertyTables) -> Result<Self, ValidationError> {
        let stack = |cells: u32, area: f64| Geometry {
            cell_count: cells,
            electrode_area_m2: area,
            ..Geometry::membrane_electrode_assembly()
        };

        let builtins = [
            ReactorConfiguration::new("mfc-lab", "Two-chamber MFC", ReactorType::MicrobialFuelCell)
                .with_electrodes("carbon_felt", "carbon_cloth")
                .with_membrane("nafion_117"),
            ReactorConfiguration::new(
                "mec-pilot",
                "Single-chamber MEC",
                ReactorType::MicrobialElectrolysisCell,
            )
            .with_electrodes("graphite_brush", "stainless_steel_mesh")
            .with_geometry(Geometry {
                electrode_area_m2: 0.1,
                volume_l: 4.0,
                electrode_spacing_cm: 1.0,
                ..Geometry::default()
            }),
            ReactorConfiguration::new(
                "mdc-bench",
                "Three-chamber MDC",
                ReactorType::MicrobialDesalinationCell,
            )
            .with_electrodes("carbon_felt", "carbon_cloth")
            .with_membrane("ami_7001"),
            ReactorConfiguration::new("pem-stack", "PEM stack", ReactorType::ProtonExchangeMembrane)
                .with_electrodes("carbon_paper", "platinum_carbon")
                .with_membrane("nafion_212")
                .with_geometry(stack(50, 0.005)),
            ReactorConfiguration::new("sofc-stack", "Planar SOFC stack", ReactorType::SolidOxide)
                .with_electrodes("ni_ysz", "lsm")
                .with_membrane("ysz")
                .with_geometry(stack(30, 0.01)),
            ReactorConfiguration::new("pafc-stack", "PAFC stack", ReactorType::PhosphoricAcid)
                .with_electrodes("platinum_carbon", "platinum_carbon")
                .with_geometry(stack(40, 0.02)),
            ReactorConfiguration::new("afc-stack", "Alkaline stack", ReactorType::Alkaline)
                .with_electrodes("nickel_foam", "nickel_foam")
                .with_geometry(stack(20, 0.01)),
        ];

        let mut catalog = Self::new();
        for config in builtins {
            catalog.register(config, tables)?;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_every_type() {
        let tables = PropertyTables::standard();
        let catalog = ReactorCatalog::standard(&tables).unwrap();
        assert_eq!(catalog.len(), ReactorType::ALL.len());
        for rt in ReactorType::ALL {
            assert!(catalog.ids().iter().any(|id| catalog.get(id).unwrap().reactor_type == rt));
        }
    }

    #[test]
    fn test_unknown_id() {
        let catalog = ReactorCatalog::new();
        assert_eq!(
            catalog.get("nope").unwrap_err(),
            ValidationError::UnknownReactor("nope".into())
        );
    }

    #[test]
    fn test_register_rejects_unknown_material() {
        let tables = PropertyTables::standard();
        let mut catalog = ReactorCatalog::new();
        let bad = ReactorConfiguration::new("x", "x", ReactorType::MicrobialFuelCell)
            .with_electrodes("unobtainium", "carbon_cloth");
        assert!(catalog.register(bad, &tables).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_reregistration_bumps_revision() {
        let tables = PropertyTables::standard();
        let mut catalog = ReactorCatalog::new();
        let config = ReactorConfiguration::new("x", "x", ReactorType::MicrobialFuelCell)
            .with_electrodes("carbon_felt", "carbon_cloth");
        catalog.register(config.clone(), &tables).unwrap();
        let (_, first) = catalog.get_with_revision("x").unwrap();
        catalog
            .register(config.with_electrodes("graphite_plate", "graphite_plate"), &tables)
            .unwrap();
        let (stored, second) = catalog.get_with_revision("x").unwrap();
        assert!(second > first);
        assert_eq!(stored.anode.as_deref(), Some("graphite_plate"));
        assert_eq!(catalog.len(), 1);
    }
}
