//! Project validation logic.
//!
//! File-level checks only: versions, unique schematic and operating point ids,
//! configuration numbers and every text quantity. Graph structure (dangling
//! endpoints, duplicate component ids) is checked when a schematic is built.

use std::collections::HashSet;

use hf_fluids::{Quantity, parse_quantity};

use crate::schema::{AnalysisConfigDef, LATEST_VERSION, Project, SchematicDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    validate_config(&project.config)?;

    let mut schematic_ids = HashSet::new();
    for schematic in &project.schematics {
        if !schematic_ids.insert(&schematic.id) {
            return Err(ValidationError::DuplicateId {
                id: schematic.id.clone(),
                context: "schematics".to_string(),
            });
        }
        validate_schematic(schematic)?;
    }

    let mut point_ids = HashSet::new();
    for point in &project.operating_points {
        if !point_ids.insert(&point.id) {
            return Err(ValidationError::DuplicateId {
                id: point.id.clone(),
                context: "operating_points".to_string(),
            });
        }
        let field = |name: &str| format!("operating point '{}' {name}", point.id);
        let flow = quantity(&field("flow"), &point.flow, Quantity::FlowRate)?;
        positive(&field("flow"), flow)?;
        let pressure = quantity(&field("pressure"), &point.pressure, Quantity::Pressure)?;
        positive(&field("pressure"), pressure)?;
    }

    Ok(())
}

fn validate_config(config: &AnalysisConfigDef) -> Result<(), ValidationError> {
    positive("fluid.density_kg_m3", config.fluid.density_kg_m3)?;
    positive("fluid.viscosity_pa_s", config.fluid.viscosity_pa_s)?;

    let t = &config.thresholds;
    positive("thresholds.max_velocity_mps", t.max_velocity_mps)?;
    positive("thresholds.max_drop_fraction", t.max_drop_fraction)?;
    positive("thresholds.laminar_reynolds", t.laminar_reynolds)?;
    positive("thresholds.turbulent_reynolds", t.turbulent_reynolds)?;
    if t.laminar_reynolds > t.turbulent_reynolds {
        return Err(ValidationError::InvalidValue {
            field: "thresholds.laminar_reynolds".to_string(),
            value: t.laminar_reynolds.to_string(),
            reason: format!("must not exceed turbulent_reynolds {}", t.turbulent_reynolds),
        });
    }
    if !(t.severe_multiplier.is_finite() && t.severe_multiplier >= 1.0) {
        return Err(invalid(
            "thresholds.severe_multiplier",
            t.severe_multiplier,
            "must be at least 1",
        ));
    }
    if !(t.near_miss_band.is_finite() && (0.0..1.0).contains(&t.near_miss_band)) {
        return Err(invalid(
            "thresholds.near_miss_band",
            t.near_miss_band,
            "must be in [0, 1)",
        ));
    }

    let k = &config.k_factors;
    let k_entries = k
        .by_type
        .iter()
        .chain(&k.valve_subtypes)
        .chain(&k.fittings)
        .map(|(name, v)| (format!("k_factors.{name}"), *v))
        .chain(k.fallback.map(|v| ("k_factors.fallback".to_string(), v)));
    for (field, v) in k_entries {
        if !(v.is_finite() && v >= 0.0) {
            return Err(invalid(&field, v, "K-factor must be finite and not negative"));
        }
    }

    quantity(
        "default_line_diameter",
        &config.default_line_diameter,
        Quantity::Diameter,
    )?;

    if config.max_depth == 0 {
        return Err(invalid("max_depth", 0, "must be at least 1"));
    }
    if config.cache.ttl_s == 0 {
        return Err(invalid("cache.ttl_s", 0, "must be at least 1 second"));
    }
    if config.cache.capacity == 0 {
        return Err(invalid("cache.capacity", 0, "must be at least 1"));
    }
    Ok(())
}

fn validate_schematic(schematic: &SchematicDef) -> Result<(), ValidationError> {
    if schematic.id.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "schematic id".to_string(),
            value: schematic.id.clone(),
            reason: "must not be empty".to_string(),
        });
    }
    for rel in &schematic.relationships {
        if let Some(size) = &rel.line_size {
            let field = format!(
                "schematic '{}' line {} -> {} line_size",
                schematic.id, rel.source_id, rel.dest_id
            );
            quantity(&field, size, Quantity::Diameter)?;
        }
    }
    Ok(())
}

fn quantity(field: &str, text: &str, q: Quantity) -> Result<f64, ValidationError> {
    parse_quantity(text, q).map_err(|e| ValidationError::InvalidValue {
        field: field.to_string(),
        value: text.to_string(),
        reason: e.to_string(),
    })
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be positive"))
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
