//! Project loading, validation, introspection and engine setup.

use std::path::Path;
use std::sync::Arc;

use hf_analysis::OperatingPoint;
use hf_graph::{SchematicBuilder, suggest};
use hf_project::schema::{Project, SchematicDef};
use hf_results::ResultStore;
use serde::Serialize;
use tracing::info;

use crate::compile::{compile_config, compile_operating_point, compile_schematic};
use crate::engine::{AnalysisEngine, SchematicHandle};
use crate::error::{AppError, AppResult};

/// Summary of a schematic definition for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchematicDefSummary {
    pub id: String,
    pub machine_name: String,
    pub component_count: usize,
    pub relationship_count: usize,
}

/// Load a project file (YAML or JSON by extension) and check its file-level
/// rules.
pub fn load_project(path: &Path) -> AppResult<Project> {
    let project = hf_project::load(path)?;
    hf_project::validate_project(&project)?;
    info!(
        path = %path.display(),
        schematics = project.schematics.len(),
        "project loaded"
    );
    Ok(project)
}

pub fn save_project(path: &Path, project: &Project) -> AppResult<()> {
    hf_project::save(path, project)?;
    Ok(())
}

/// Full validation: file-level rules, configuration compilation, and a trial
/// build of every schematic graph.
pub fn validate_project(project: &Project) -> AppResult<()> {
    hf_project::validate_project(project)?;
    compile_config(&project.config)?;
    for def in &project.schematics {
        let (components, relationships) = compile_schematic(def)?;
        let mut builder = SchematicBuilder::new(&def.id, &def.machine_name);
        builder
            .extend_components(components)
            .extend_relationships(relationships);
        builder.build()?;
    }
    for point in &project.operating_points {
        compile_operating_point(point)?;
    }
    Ok(())
}

pub fn list_schematics(project: &Project) -> Vec<SchematicDefSummary> {
    project
        .schematics
        .iter()
        .map(|s| SchematicDefSummary {
            id: s.id.clone(),
            machine_name: s.machine_name.clone(),
            component_count: s.components.len(),
            relationship_count: s.relationships.len(),
        })
        .collect()
}

pub fn get_schematic<'a>(project: &'a Project, schematic_id: &str) -> AppResult<&'a SchematicDef> {
    project.schematic(schematic_id).ok_or_else(|| AppError::NotFound {
        what: "Schematic",
        id: schematic_id.to_string(),
        suggestions: suggest(
            project.schematics.iter().map(|s| s.id.as_str()),
            schematic_id,
            3,
        ),
    })
}

/// Named operating point of the project.
pub fn operating_point(project: &Project, point_id: &str) -> AppResult<OperatingPoint> {
    let def = project.operating_point(point_id).ok_or_else(|| AppError::NotFound {
        what: "Operating point",
        id: point_id.to_string(),
        suggestions: suggest(
            project.operating_points.iter().map(|p| p.id.as_str()),
            point_id,
            3,
        ),
    })?;
    compile_operating_point(def)
}

/// Register (or re-register) one schematic definition with an engine.
pub fn load_into(engine: &AnalysisEngine, def: &SchematicDef) -> AppResult<SchematicHandle> {
    let (components, relationships) = compile_schematic(def)?;
    engine.load_schematic(&def.id, &def.machine_name, components, relationships)
}

/// Engine configured from the project with every schematic loaded.
pub fn engine_for_project(
    project: &Project,
    store: Option<Arc<dyn ResultStore>>,
) -> AppResult<AnalysisEngine> {
    let mut engine = AnalysisEngine::new(compile_config(&project.config)?)?;
    if let Some(store) = store {
        engine = engine.with_store(store);
    }
    for def in &project.schematics {
        load_into(&engine, def)?;
    }
    Ok(engine)
}
