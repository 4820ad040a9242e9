//! # Core Types
//!
//! Reactor configurations, operating parameters and their declared ranges.
//!
//! ```text
//! ReactorConfiguration (immutable, Arc-shared)
//!   ├── ReactorType + species key ──→ PropertyTables
//!   ├── Geometry
//!   ├── anode / cathode / membrane ──→ PropertyTables
//!   └── ParameterSpace { ParameterKind → ParameterDef[min, max] }
//!
//! OperatingParameters (fresh value per candidate)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::materials::PropertyTables;

// ============================================================================
// FIDELITY
// ============================================================================

/// Modelling tier. Ordered: `Basic < Intermediate < Advanced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FidelityLevel {
    Basic,
    Intermediate,
    Advanced,
}

impl FidelityLevel {
    pub const ALL: [FidelityLevel; 3] = [
        FidelityLevel::Basic,
        FidelityLevel::Intermediate,
        FidelityLevel::Advanced,
    ];

    /// Next tier down, `None` at Basic.
    pub fn lower(self) -> Option<FidelityLevel> {
        match self {
            FidelityLevel::Basic => None,
            FidelityLevel::Intermediate => Some(FidelityLevel::Basic),
            FidelityLevel::Advanced => Some(FidelityLevel::Intermediate),
        }
    }
}

impl fmt::Display for FidelityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FidelityLevel::Basic => "basic",
            FidelityLevel::Intermediate => "intermediate",
            FidelityLevel::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

// ============================================================================
// REACTOR TYPE
// ============================================================================

/// Reactor technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactorType {
    /// Microbial fuel cell (MFC)
    MicrobialFuelCell,
    /// Microbial electrolysis cell (MEC), H₂ evolving
    MicrobialElectrolysisCell,
    /// Microbial desalination cell (MDC)
    MicrobialDesalinationCell,
    /// Proton exchange membrane fuel cell (PEMFC)
    ProtonExchangeMembrane,
    /// Solid oxide fuel cell (SOFC)
    SolidOxide,
    /// Phosphoric acid fuel cell (PAFC)
    PhosphoricAcid,
    /// Alkaline fuel cell (AFC)
    Alkaline,
}

impl ReactorType {
    pub fn is_microbial(&self) -> bool {
        matches!(
            self,
            ReactorType::MicrobialFuelCell
                | ReactorType::MicrobialElectrolysisCell
                | ReactorType::MicrobialDesalinationCell
        )
    }

    /// Gas-fed stacks: pressure is required, gas flows are meaningful
    pub fn is_gas_fed(&self) -> bool {
        !self.is_microbial()
    }

    /// Electrolysis cells consume the applied bias instead of producing power
    pub fn is_electrolytic(&self) -> bool {
        matches!(self, ReactorType::MicrobialElectrolysisCell)
    }

    /// Highest fidelity implemented for this technology
    pub fn max_fidelity(&self) -> FidelityLevel {
        match self {
            ReactorType::MicrobialDesalinationCell | ReactorType::Alkaline => {
                FidelityLevel::Intermediate
            }
            _ => FidelityLevel::Advanced,
        }
    }

    /// Default organism or chemistry key in the property tables
    pub fn default_species(&self) -> &'static str {
        match self {
            ReactorType::MicrobialFuelCell => "geobacter_sulfurreducens",
            ReactorType::MicrobialElectrolysisCell => "mixed_culture",
            ReactorType::MicrobialDesalinationCell => "mixed_culture",
            ReactorType::ProtonExchangeMembrane => "pem",
            ReactorType::SolidOxide => "sofc",
            ReactorType::PhosphoricAcid => "pafc",
            ReactorType::Alkaline => "afc",
        }
    }

    pub const ALL: [ReactorType; 7] = [
        ReactorType::MicrobialFuelCell,
        ReactorType::MicrobialElectrolysisCell,
        ReactorType::MicrobialDesalinationCell,
        ReactorType::ProtonExchangeMembrane,
        ReactorType::SolidOxide,
        ReactorType::PhosphoricAcid,
        ReactorType::Alkaline,
    ];
}

impl fmt::Display for ReactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReactorType::MicrobialFuelCell => "MFC",
            ReactorType::MicrobialElectrolysisCell => "MEC",
            ReactorType::MicrobialDesalinationCell => "MDC",
            ReactorType::ProtonExchangeMembrane => "PEM",
            ReactorType::SolidOxide => "SOFC",
            ReactorType::PhosphoricAcid => "PAFC",
            ReactorType::Alkaline => "AFC",
        };
        f.write_str(s)
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// One axis of the operating-parameter vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterKind {
    Temperature,
    Ph,
    FlowRate,
    MixingSpeed,
    Voltage,
    SubstrateConcentration,
    Pressure,
    Humidity,
    FuelFlow,
    OxidantFlow,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 10] = [
        ParameterKind::Temperature,
        ParameterKind::Ph,
        ParameterKind::FlowRate,
        ParameterKind::MixingSpeed,
        ParameterKind::Voltage,
        ParameterKind::SubstrateConcentration,
        ParameterKind::Pressure,
        ParameterKind::Humidity,
        ParameterKind::FuelFlow,
        ParameterKind::OxidantFlow,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParameterKind::Temperature => "temperature",
            ParameterKind::Ph => "ph",
            ParameterKind::FlowRate => "flowRate",
            ParameterKind::MixingSpeed => "mixingSpeed",
            ParameterKind::Voltage => "voltage",
            ParameterKind::SubstrateConcentration => "substrateConcentration",
            ParameterKind::Pressure => "pressure",
            ParameterKind::Humidity => "humidity",
            ParameterKind::FuelFlow => "fuelFlow",
            ParameterKind::OxidantFlow => "oxidantFlow",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ParameterKind::Temperature => "°C",
            ParameterKind::Ph => "",
            ParameterKind::FlowRate => "mL/min",
            ParameterKind::MixingSpeed => "rpm",
            ParameterKind::Voltage => "V",
            ParameterKind::SubstrateConcentration => "g/L",
            ParameterKind::Pressure => "bar",
            ParameterKind::Humidity => "%",
            ParameterKind::FuelFlow | ParameterKind::OxidantFlow => "L/min",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared range of an operating parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDef {
    /// Descriptive name
    pub name: String,
    /// Symbol
    pub symbol: String,
    /// Unit
    pub unit: String,
    /// Minimum allowed value
    pub min: f64,
    /// Maximum allowed value
    pub max: f64,
    /// Default value
    pub default: f64,
    /// Searchable by the optimizer
    pub is_optimizable: bool,
}

impl ParameterDef {
    pub fn new(name: &str, symbol: &str, unit: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            unit: unit.to_string(),
            min,
            max,
            default,
            is_optimizable: true,
        }
    }

    /// Marks the parameter as fixed for optimization
    pub fn fixed(mut self) -> Self {
        self.is_optimizable = false;
        self
    }

    pub fn validate(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Maps the value to [0, 1]
    pub fn normalize(&self, value: f64) -> f64 {
        if self.max == self.min {
            0.5
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    pub fn denormalize(&self, normalized: f64) -> f64 {
        self.min + normalized * (self.max - self.min)
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Declared valid ranges of a reactor's operating parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub ranges: BTreeMap<ParameterKind, ParameterDef>,
}

impl ParameterSpace {
    pub fn get(&self, kind: ParameterKind) -> Option<&ParameterDef> {
        self.ranges.get(&kind)
    }

    pub fn with(mut self, kind: ParameterKind, def: ParameterDef) -> Self {
        self.ranges.insert(kind, def);
        self
    }

    /// Shared liquid-side ranges of every reactor
    fn liquid_side(t: (f64, f64, f64), ph: (f64, f64, f64)) -> Self {
        Self::default()
            .with(
                ParameterKind::Temperature,
                ParameterDef::new("Temperature", "T", "°C", t.0, t.1, t.2),
            )
            .with(ParameterKind::Ph, ParameterDef::new("pH", "pH", "", ph.0, ph.1, ph.2))
    }

    /// Microbial reactors (MFC/MEC/MDC)
    pub fn microbial() -> Self {
        Self::liquid_side((10.0, 50.0, 30.0), (4.0, 10.0, 7.0))
            .with(
                ParameterKind::FlowRate,
                ParameterDef::new("Flow rate", "Q", "mL/min", 0.1, 100.0, 5.0),
            )
            .with(
                ParameterKind::MixingSpeed,
                ParameterDef::new("Mixing speed", "N", "rpm", 0.0, 500.0, 100.0),
            )
            .with(
                ParameterKind::Voltage,
                ParameterDef::new("Applied bias", "E_ap", "V", 0.0, 1.2, 0.6),
            )
            .with(
                ParameterKind::SubstrateConcentration,
                ParameterDef::new("Substrate", "S", "g/L", 0.05, 20.0, 1.0),
            )
    }

    /// Low-temperature PEM stacks
    pub fn pem() -> Self {
        Self::gas_fed((20.0, 95.0, 70.0))
            .with(
                ParameterKind::Humidity,
                ParameterDef::new("Relative humidity", "RH", "%", 0.0, 100.0, 90.0),
            )
    }

    /// Solid oxide stacks
    pub fn solid_oxide() -> Self {
        Self::gas_fed((600.0, 1000.0, 800.0))
    }

    /// Phosphoric acid stacks
    pub fn phosphoric_acid() -> Self {
        Self::gas_fed((150.0, 220.0, 200.0))
    }

    /// Alkaline stacks
    pub fn alkaline() -> Self {
        Self::gas_fed((40.0, 95.0, 70.0)).with(
            ParameterKind::Humidity,
            ParameterDef::new("Relative humidity", "RH", "%", 0.0, 100.0, 60.0),
        )
    }

    fn gas_fed(t: (f64, f64, f64)) -> Self {
        Self::liquid_side(t, (0.0, 14.0, 7.0))
            .with(
                ParameterKind::FlowRate,
                ParameterDef::new("Coolant flow", "Q_c", "mL/min", 1.0, 2000.0, 200.0),
            )
            .with(
                ParameterKind::MixingSpeed,
                ParameterDef::new("Recirculation", "N", "rpm", 0.0, 3000.0, 0.0).fixed(),
            )
            .with(
                ParameterKind::Voltage,
                ParameterDef::new("Cell voltage setpoint", "V_set", "V", 0.3, 1.2, 0.7),
            )
            .with(
                ParameterKind::SubstrateConcentration,
                ParameterDef::new("Electrolyte loading", "c_e", "g/L", 0.0, 20.0, 1.0).fixed(),
            )
            .with(
                ParameterKind::Pressure,
                ParameterDef::new("Pressure", "P", "bar", 1.0, 5.0, 1.5),
            )
            .with(
                ParameterKind::FuelFlow,
                ParameterDef::new("Fuel flow", "Q_f", "L/min", 0.1, 200.0, 20.0),
            )
            .with(
                ParameterKind::OxidantFlow,
                ParameterDef::new("Oxidant flow", "Q_ox", "L/min", 0.5, 1000.0, 100.0),
            )
    }

    /// Default ranges per technology
    pub fn for_reactor_type(reactor_type: ReactorType) -> Self {
        match reactor_type {
            ReactorType::MicrobialFuelCell
            | ReactorType::MicrobialElectrolysisCell
            | ReactorType::MicrobialDesalinationCell => Self::microbial(),
            ReactorType::ProtonExchangeMembrane => Self::pem(),
            ReactorType::SolidOxide => Self::solid_oxide(),
            ReactorType::PhosphoricAcid => Self::phosphoric_acid(),
            ReactorType::Alkaline => Self::alkaline(),
        }
    }

    /// Operating point at every declared default
    pub fn defaults(&self) -> OperatingParameters {
        self.ranges
            .iter()
            .fold(OperatingParameters::empty(), |p, (kind, def)| p.with_value(*kind, def.default))
    }
}

/// Operating parameter vector. Optional entries are absent unless the
/// reactor declares them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingParameters {
    /// °C
    pub temperature: f64,
    pub ph: f64,
    /// mL/min
    pub flow_rate: f64,
    /// rpm
    pub mixing_speed: f64,
    /// Applied bias or voltage setpoint (V)
    pub voltage: f64,
    /// g/L
    pub substrate_concentration: f64,
    /// bar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// %
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// L/min
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_flow: Option<f64>,
    /// L/min
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxidant_flow: Option<f64>,
}

impl OperatingParameters {
    fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ParameterKind) -> Option<f64> {
        match kind {
            ParameterKind::Temperature => Some(self.temperature),
            ParameterKind::Ph => Some(self.ph),
            ParameterKind::FlowRate => Some(self.flow_rate),
            ParameterKind::MixingSpeed => Some(self.mixing_speed),
            ParameterKind::Voltage => Some(self.voltage),
            ParameterKind::SubstrateConcentration => Some(self.substrate_concentration),
            ParameterKind::Pressure => self.pressure,
            ParameterKind::Humidity => self.humidity,
            ParameterKind::FuelFlow => self.fuel_flow,
            ParameterKind::OxidantFlow => self.oxidant_flow,
        }
    }

    /// Copy with one entry replaced
    pub fn with_value(&self, kind: ParameterKind, value: f64) -> Self {
        let mut next = self.clone();
        match kind {
            ParameterKind::Temperature => next.temperature = value,
            ParameterKind::Ph => next.ph = value,
            ParameterKind::FlowRate => next.flow_rate = value,
            ParameterKind::MixingSpeed => next.mixing_speed = value,
            ParameterKind::Voltage => next.voltage = value,
            ParameterKind::SubstrateConcentration => next.substrate_concentration = value,
            ParameterKind::Pressure => next.pressure = Some(value),
            ParameterKind::Humidity => next.humidity = Some(value),
            ParameterKind::FuelFlow => next.fuel_flow = Some(value),
            ParameterKind::OxidantFlow => next.oxidant_flow = Some(value),
        }
        next
    }

    /// Present entries in `ParameterKind` order
    pub fn entries(&self) -> Vec<(ParameterKind, f64)> {
        ParameterKind::ALL
            .iter()
            .filter_map(|k| self.get(*k).map(|v| (*k, v)))
            .collect()
    }

    /// Checks every present entry against the declared space.
    pub fn validate(&self, space: &ParameterSpace) -> Result<(), ValidationError> {
        for (kind, value) in self.entries() {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field: kind.name().to_string() });
            }
            let def = space
                .get(kind)
                .ok_or_else(|| ValidationError::UndeclaredParameter(kind.name().to_string()))?;
            if !def.validate(value) {
                return Err(ValidationError::OutOfRange {
                    field: kind.name().to_string(),
                    value,
                    min: def.min,
                    max: def.max,
                });
            }
        }
        Ok(())
    }

    /// Copy with every present entry clamped to the declared space.
    /// Non-finite and undeclared entries are still rejected.
    pub fn clamped(&self, space: &ParameterSpace) -> Result<Self, ValidationError> {
        let mut next = self.clone();
        for (kind, value) in self.entries() {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field: kind.name().to_string() });
            }
            let def = space
                .get(kind)
                .ok_or_else(|| ValidationError::UndeclaredParameter(kind.name().to_string()))?;
            next = next.with_value(kind, def.clamp(value));
        }
        Ok(next)
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Reactor geometry (lumped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    /// Active electrode area per cell (m²)
    pub electrode_area_m2: f64,
    /// Liquid or flow-field volume per cell (L)
    pub volume_l: f64,
    /// Anode–cathode spacing (cm)
    pub electrode_spacing_cm: f64,
    /// Flow channel hydraulic diameter (m)
    pub hydraulic_diameter_m: f64,
    /// Flow channel length (m)
    pub channel_length_m: f64,
    /// Cells in the stack
    pub cell_count: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            electrode_area_m2: 0.01,
            volume_l: 0.25,
            electrode_spacing_cm: 2.0,
            hydraulic_diameter_m: 0.005,
            channel_length_m: 0.1,
            cell_count: 1,
        }
    }
}

impl Geometry {
    /// Thin membrane-electrode assembly with serpentine channels
    pub fn membrane_electrode_assembly() -> Self {
        Self {
            electrode_area_m2: 0.005,
            volume_l: 0.01,
            electrode_spacing_cm: 0.005,
            hydraulic_diameter_m: 0.001,
            channel_length_m: 0.5,
            cell_count: 1,
        }
    }

    pub fn for_reactor_type(reactor_type: ReactorType) -> Self {
        if reactor_type.is_gas_fed() {
            Self::membrane_electrode_assembly()
        } else {
            Self::default()
        }
    }
}

/// Immutable reactor description. Optimization never edits one; it only
/// produces new [`OperatingParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactorConfiguration {
    pub id: String,
    pub name: String,
    pub reactor_type: ReactorType,
    /// Organism or cell chemistry key
    pub species: String,
    pub geometry: Geometry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cathode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membrane: Option<String>,
    pub parameter_space: ParameterSpace,
}

impl ReactorConfiguration {
    /// New configuration with the technology's default species and ranges
    pub fn new(id: &str, name: &str, reactor_type: ReactorType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            reactor_type,
            species: reactor_type.default_species().to_string(),
            geometry: Geometry::for_reactor_type(reactor_type),
            anode: None,
            cathode: None,
            membrane: None,
            parameter_space: ParameterSpace::for_reactor_type(reactor_type),
        }
    }

    pub fn with_species(mut self, species: &str) -> Self {
        self.species = species.to_string();
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_electrodes(mut self, anode: &str, cathode: &str) -> Self {
        self.anode = Some(anode.to_string());
        self.cathode = Some(cathode.to_string());
        self
    }

    pub fn with_membrane(mut self, membrane: &str) -> Self {
        self.membrane = Some(membrane.to_string());
        self
    }

    pub fn with_parameter_space(mut self, space: ParameterSpace) -> Self {
        self.parameter_space = space;
        self
    }

    /// Structural checks plus table lookups for every named entry.
    pub fn validate(&self, tables: &PropertyTables) -> Result<(), ValidationError> {
        let malformed = |reason: &str| ValidationError::MalformedConfig {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(malformed("empty id"));
        }
        let g = &self.geometry;
        let positive = [
            g.electrode_area_m2,
            g.volume_l,
            g.electrode_spacing_cm,
            g.hydraulic_diameter_m,
            g.channel_length_m,
        ];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(malformed("geometry dimensions must be positive"));
        }
        if g.cell_count == 0 {
            return Err(malformed("cell count must be at least 1"));
        }
        for (kind, def) in &self.parameter_space.ranges {
            if !(def.min <= def.max) || !def.validate(def.default) {
                return Err(malformed(&format!("invalid declared range for {}", kind)));
            }
        }
        if !self.parameter_space.ranges.contains_key(&ParameterKind::Temperature) {
            return Err(malformed("temperature range missing"));
        }
        if self.reactor_type.is_gas_fed()
            && !self.parameter_space.ranges.contains_key(&ParameterKind::Pressure)
        {
            return Err(malformed("gas-fed reactor without a pressure range"));
        }

        tables.species(&self.species)?;
        for name in [&self.anode, &self.cathode].into_iter().flatten() {
            tables.electrode(name)?;
        }
        if let Some(name) = &self.membrane {
            tables.membrane(name)?;
        }
        Ok(())
    }

    /// Rejects parameters a reactor of this type cannot run without.
    pub fn check_required(&self, params: &OperatingParameters) -> Result<(), ValidationError> {
        if self.reactor_type.is_gas_fed() && params.pressure.is_none() {
            return Err(ValidationError::MissingParameter {
                field: ParameterKind::Pressure.name().to_string(),
                reactor_type: self.reactor_type.to_string(),
            });
        }
        Ok(())
    }
}
