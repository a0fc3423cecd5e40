//! Compilation of project definitions into runtime settings and graphs.

use std::time::Duration;

use hf_analysis::{AnalysisSettings, OperatingPoint, Thresholds};
use hf_components::{KFactorTable, VALVE_TYPE_KEY};
use hf_core::units::constants::{M3PS_PER_LPM, PA_PER_BAR};
use hf_fluids::{FluidProfile, Quantity, RegimeThresholds, parse_quantity};
use hf_graph::{Component, ComponentType, ConnectionType, Relationship};
use hf_project::schema::{
    AnalysisConfigDef, ComponentDef, KFactorDef, OperatingPointDef, RelationshipDef, SchematicDef,
};

use crate::error::{AppError, AppResult};

/// Everything an [`crate::AnalysisEngine`] is constructed from.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub settings: AnalysisSettings,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings: AnalysisSettings::default(),
            cache_ttl: hf_results::cache::DEFAULT_TTL,
            cache_capacity: hf_results::cache::DEFAULT_CAPACITY,
        }
    }
}

/// Compile and validate a configuration block.
pub fn compile_config(def: &AnalysisConfigDef) -> AppResult<EngineConfig> {
    let fluid = FluidProfile::new(
        def.fluid.name.clone(),
        def.fluid.density_kg_m3,
        def.fluid.viscosity_pa_s,
    )
    .map_err(|e| AppError::Configuration(e.to_string()))?;

    let t = &def.thresholds;
    let settings = AnalysisSettings {
        fluid,
        k_factors: compile_k_factors(&def.k_factors)?,
        regimes: RegimeThresholds {
            laminar: t.laminar_reynolds,
            turbulent: t.turbulent_reynolds,
        },
        thresholds: Thresholds {
            max_velocity_mps: t.max_velocity_mps,
            max_drop_fraction: t.max_drop_fraction,
            severe_multiplier: t.severe_multiplier,
            near_miss_band: t.near_miss_band,
        },
        default_line_diameter_m: parse_quantity(&def.default_line_diameter, Quantity::Diameter)
            .map_err(|e| AppError::Configuration(format!("default_line_diameter: {e}")))?,
        max_depth: def.max_depth,
        traverse_undirected: def.traverse_undirected,
    };
    settings.validate()?;

    if def.cache.ttl_s == 0 || def.cache.capacity == 0 {
        return Err(AppError::Configuration(
            "cache TTL and capacity must be at least 1".to_string(),
        ));
    }

    Ok(EngineConfig {
        settings,
        cache_ttl: Duration::from_secs(def.cache.ttl_s),
        cache_capacity: def.cache.capacity,
    })
}

/// Built-in table with the project's overrides applied.
fn compile_k_factors(def: &KFactorDef) -> AppResult<KFactorTable> {
    let mut table = KFactorTable::default();
    for (label, k) in &def.by_type {
        let kind = ComponentType::parse(label);
        if kind.as_str() != label.trim().to_ascii_uppercase() {
            return Err(AppError::Configuration(format!(
                "unknown component type '{label}' in k_factors"
            )));
        }
        table.by_type.insert(kind, *k);
    }
    for (name, k) in &def.valve_subtypes {
        table.valve_subtypes.insert(name.trim().to_ascii_lowercase(), *k);
    }
    for (name, k) in &def.fittings {
        table.fittings.insert(name.trim().to_ascii_lowercase(), *k);
    }
    if let Some(fallback) = def.fallback {
        table.fallback = fallback;
    }
    Ok(table)
}

/// Schematic definition as graph input: components and relationships.
pub fn compile_schematic(def: &SchematicDef) -> AppResult<(Vec<Component>, Vec<Relationship>)> {
    let components = def.components.iter().map(compile_component).collect();
    let relationships = def
        .relationships
        .iter()
        .map(|r| compile_relationship(&def.id, r))
        .collect::<AppResult<Vec<_>>>()?;
    Ok((components, relationships))
}

/// Sub-typed valve labels (`VALVE_CHECK`) become a `valve_type` spec unless
/// one is given explicitly.
fn compile_component(def: &ComponentDef) -> Component {
    let kind = ComponentType::parse(&def.component_type);
    let mut component = Component::new(def.id.clone(), kind);
    component.grid_location = def.grid_location.clone();
    component.description = def.description.clone();
    component.specifications = def.specifications.clone();

    if kind == ComponentType::Valve
        && !component.specifications.contains_key(VALVE_TYPE_KEY)
        && let Some(subtype) = subtype_of(&def.component_type)
    {
        component
            .specifications
            .insert(VALVE_TYPE_KEY.to_string(), subtype);
    }
    component
}

fn subtype_of(label: &str) -> Option<String> {
    let (_, rest) = label.trim().split_once(['_', ' ', '-'])?;
    let rest = rest.trim();
    (!rest.is_empty()).then(|| rest.to_ascii_lowercase())
}

fn compile_relationship(schematic_id: &str, def: &RelationshipDef) -> AppResult<Relationship> {
    let connection_type = ConnectionType::parse(&def.connection_type).ok_or_else(|| {
        AppError::Validation(format!(
            "Relationship {} -> {} in schematic '{schematic_id}' has unknown connection type '{}'",
            def.source_id, def.dest_id, def.connection_type
        ))
    })?;
    let mut rel = Relationship::new(def.source_id.clone(), def.dest_id.clone(), connection_type);
    if let Some(text) = &def.line_size {
        let d = parse_quantity(text, Quantity::Diameter).map_err(|e| {
            AppError::Validation(format!(
                "Relationship {} -> {} in schematic '{schematic_id}' has invalid line size: {e}",
                def.source_id, def.dest_id
            ))
        })?;
        rel = rel.with_line_size(d);
    }
    if !def.directed {
        rel = rel.undirected();
    }
    Ok(rel)
}

/// Named operating point in caller units.
pub fn compile_operating_point(def: &OperatingPointDef) -> AppResult<OperatingPoint> {
    let parse = |text: &str, q: Quantity| {
        parse_quantity(text, q).map_err(|e| {
            AppError::Configuration(format!("operating point '{}': {e}", def.id))
        })
    };
    let flow_m3ps = parse(&def.flow, Quantity::FlowRate)?;
    let pressure_pa = parse(&def.pressure, Quantity::Pressure)?;
    Ok(OperatingPoint::new(
        flow_m3ps / M3PS_PER_LPM,
        pressure_pa / PA_PER_BAR,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn default_config_matches_reference_settings() {
        let cfg = compile_config(&AnalysisConfigDef::default()).unwrap();
        let reference = AnalysisSettings::default();
        assert_eq!(cfg.settings.fluid.density, reference.fluid.density);
        assert_eq!(cfg.settings.thresholds, reference.thresholds);
        assert_eq!(cfg.settings.k_factors, reference.k_factors);
        assert!((cfg.settings.default_line_diameter_m - 0.0127).abs() < 1e-12);
        assert_eq!(cfg.settings.max_depth, 20);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.cache_capacity, 10_000);
    }

    #[test]
    fn k_overrides_apply_on_top_of_defaults() {
        let mut def = AnalysisConfigDef::default();
        def.k_factors.by_type.insert("filter".into(), 7.5);
        def.k_factors.valve_subtypes.insert("Needle".into(), 4.0);
        def.k_factors.fallback = Some(1.0);
        let table = compile_config(&def).unwrap().settings.k_factors;
        assert_eq!(table.by_type[&ComponentType::Filter], 7.5);
        assert_eq!(table.by_type[&ComponentType::Valve], 3.0);
        assert_eq!(table.valve_subtypes["needle"], 4.0);
        assert_eq!(table.fallback, 1.0);
    }

    #[test]
    fn unknown_k_type_is_configuration_error() {
        let mut def = AnalysisConfigDef::default();
        def.k_factors.by_type.insert("VALVE_CHECK".into(), 2.0);
        assert!(matches!(
            compile_config(&def),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn inverted_cutoffs_are_configuration_error() {
        let mut def = AnalysisConfigDef::default();
        def.thresholds.laminar_reynolds = 4500.0;
        assert!(matches!(
            compile_config(&def),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn valve_subtype_label_becomes_spec() {
        let def = ComponentDef {
            id: "V14".into(),
            component_type: "VALVE_CHECK".into(),
            grid_location: None,
            description: None,
            specifications: BTreeMap::new(),
        };
        let c = compile_component(&def);
        assert_eq!(c.kind, ComponentType::Valve);
        assert_eq!(c.spec(VALVE_TYPE_KEY), Some("check"));

        let explicit = ComponentDef {
            specifications: BTreeMap::from([(VALVE_TYPE_KEY.to_string(), "ball".to_string())]),
            ..def
        };
        assert_eq!(compile_component(&explicit).spec(VALVE_TYPE_KEY), Some("ball"));
    }

    #[test]
    fn relationship_text_is_parsed() {
        let def = RelationshipDef {
            source_id: "P1".into(),
            dest_id: "V12".into(),
            connection_type: "supply".into(),
            line_size: Some("DN25".into()),
            directed: false,
        };
        let rel = compile_relationship("press", &def).unwrap();
        assert_eq!(rel.connection_type, ConnectionType::Supply);
        assert!((rel.line_size_m.unwrap() - 0.025).abs() < 1e-12);
        assert!(!rel.directed);

        let bad = RelationshipDef {
            connection_type: "HYDRAULIC".into(),
            ..def
        };
        assert!(matches!(
            compile_relationship("press", &bad),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn operating_point_units() {
        let op = compile_operating_point(&OperatingPointDef {
            id: "rated".into(),
            flow: "180 lpm".into(),
            pressure: "180 bar".into(),
        })
        .unwrap();
        assert!((op.flow_lpm() - 180.0).abs() < 1e-9);
        assert!((op.pressure_bar() - 180.0).abs() < 1e-9);
    }
}
