//! Project schema definitions.
//!
//! A project file carries the analysis configuration, the schematics as
//! extracted from drawings, and named operating points. Sizes, flows and
//! pressures are text with units (`1/2"`, `180 lpm`, `2600 psi`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub config: AnalysisConfigDef,
    #[serde(default)]
    pub schematics: Vec<SchematicDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operating_points: Vec<OperatingPointDef>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            config: AnalysisConfigDef::default(),
            schematics: Vec::new(),
            operating_points: Vec::new(),
        }
    }

    pub fn schematic(&self, id: &str) -> Option<&SchematicDef> {
        self.schematics.iter().find(|s| s.id == id)
    }

    pub fn operating_point(&self, id: &str) -> Option<&OperatingPointDef> {
        self.operating_points.iter().find(|p| p.id == id)
    }
}

/// Analysis configuration; every field defaults to the reference setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfigDef {
    #[serde(default)]
    pub fluid: FluidDef,
    #[serde(default)]
    pub k_factors: KFactorDef,
    #[serde(default)]
    pub thresholds: ThresholdsDef,
    /// Substituted when neither line nor port size is known.
    #[serde(default = "default_line_diameter")]
    pub default_line_diameter: String,
    #[serde(default)]
    pub cache: CacheDef,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub traverse_undirected: bool,
}

impl Default for AnalysisConfigDef {
    fn default() -> Self {
        Self {
            fluid: FluidDef::default(),
            k_factors: KFactorDef::default(),
            thresholds: ThresholdsDef::default(),
            default_line_diameter: default_line_diameter(),
            cache: CacheDef::default(),
            max_depth: default_max_depth(),
            traverse_undirected: false,
        }
    }
}

fn default_line_diameter() -> String {
    "1/2\"".to_string()
}

fn default_max_depth() -> usize {
    20
}

/// Hydraulic fluid properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidDef {
    #[serde(default = "default_fluid_name")]
    pub name: String,
    #[serde(default = "default_density")]
    pub density_kg_m3: f64,
    #[serde(default = "default_viscosity")]
    pub viscosity_pa_s: f64,
}

impl Default for FluidDef {
    fn default() -> Self {
        Self {
            name: default_fluid_name(),
            density_kg_m3: default_density(),
            viscosity_pa_s: default_viscosity(),
        }
    }
}

fn default_fluid_name() -> String {
    "ISO VG 46".to_string()
}

fn default_density() -> f64 {
    870.0
}

fn default_viscosity() -> f64 {
    0.046
}

/// K-factor overrides on top of the built-in table.
///
/// Type keys are component type labels (`VALVE`, `FILTER`, ...); sub-type and
/// fitting keys match the `valve_type` / `fitting` specifications.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KFactorDef {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_type: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub valve_subtypes: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fittings: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdsDef {
    #[serde(default = "default_max_velocity")]
    pub max_velocity_mps: f64,
    #[serde(default = "default_max_drop_fraction")]
    pub max_drop_fraction: f64,
    #[serde(default = "default_laminar_reynolds")]
    pub laminar_reynolds: f64,
    #[serde(default = "default_turbulent_reynolds")]
    pub turbulent_reynolds: f64,
    #[serde(default = "default_severe_multiplier")]
    pub severe_multiplier: f64,
    #[serde(default = "default_near_miss_band")]
    pub near_miss_band: f64,
}

impl Default for ThresholdsDef {
    fn default() -> Self {
        Self {
            max_velocity_mps: default_max_velocity(),
            max_drop_fraction: default_max_drop_fraction(),
            laminar_reynolds: default_laminar_reynolds(),
            turbulent_reynolds: default_turbulent_reynolds(),
            severe_multiplier: default_severe_multiplier(),
            near_miss_band: default_near_miss_band(),
        }
    }
}

fn default_max_velocity() -> f64 {
    5.0
}

fn default_max_drop_fraction() -> f64 {
    0.2
}

fn default_laminar_reynolds() -> f64 {
    2300.0
}

fn default_turbulent_reynolds() -> f64 {
    4000.0
}

fn default_severe_multiplier() -> f64 {
    2.0
}

fn default_near_miss_band() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheDef {
    #[serde(default = "default_ttl_s")]
    pub ttl_s: u64,
    #[serde(default = "default_capacity")]
    pub capacity: u64,
}

impl Default for CacheDef {
    fn default() -> Self {
        Self {
            ttl_s: default_ttl_s(),
            capacity: default_capacity(),
        }
    }
}

fn default_ttl_s() -> u64 {
    300
}

fn default_capacity() -> u64 {
    10_000
}

/// One machine's circuit as extracted from its drawing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchematicDef {
    pub id: String,
    pub machine_name: String,
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub id: String,
    /// Type label, possibly sub-typed (`VALVE_CHECK`).
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub specifications: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipDef {
    pub source_id: String,
    pub dest_id: String,
    pub connection_type: String,
    /// Line size text, e.g. `1/2"` or `DN25`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_size: Option<String>,
    /// `false` when the drawing does not show which way the line runs.
    #[serde(default = "default_directed")]
    pub directed: bool,
}

fn default_directed() -> bool {
    true
}

/// A named flow / system pressure pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperatingPointDef {
    pub id: String,
    pub flow: String,
    pub pressure: String,
}
