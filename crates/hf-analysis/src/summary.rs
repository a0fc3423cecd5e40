//! Schematic overview.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hf_core::CompIdx;
use hf_graph::{ComponentType, ConnectionType, Diagnostic, SchematicGraph};
use serde::{Deserialize, Serialize};

/// Listing entry for a registered schematic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchematicInfo {
    pub schematic_id: String,
    pub machine_name: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub component_count: usize,
}

impl SchematicInfo {
    pub fn of(graph: &SchematicGraph) -> Self {
        Self {
            schematic_id: graph.schematic_id().to_string(),
            machine_name: graph.machine_name().to_string(),
            version: graph.version(),
            created_at: graph.created_at(),
            component_count: graph.components().len(),
        }
    }
}

/// Structural summary of one schematic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchematicSummary {
    #[serde(flatten)]
    pub info: SchematicInfo,
    pub relationship_count: usize,
    pub components_by_type: BTreeMap<ComponentType, usize>,
    pub connections_by_type: BTreeMap<ConnectionType, usize>,
    /// Components with outgoing but no incoming flow.
    pub sources: Vec<String>,
    /// Components with incoming but no outgoing flow.
    pub sinks: Vec<String>,
    /// Components with no relationships at all.
    pub isolated: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Count and classify the schematic's components and lines.
///
/// Undirected relationships do not count as flow for sources and sinks.
pub fn summarize(graph: &SchematicGraph) -> SchematicSummary {
    let mut components_by_type = BTreeMap::new();
    for c in graph.components() {
        *components_by_type.entry(c.kind).or_insert(0) += 1;
    }
    let mut connections_by_type = BTreeMap::new();
    for r in graph.relationships() {
        *connections_by_type.entry(r.connection_type).or_insert(0) += 1;
    }

    let mut sources = Vec::new();
    let mut sinks = Vec::new();
    for slot in 0..graph.components().len() {
        let Some(idx) = CompIdx::from_usize(slot) else {
            continue;
        };
        let has_in = graph.upstream_of(idx).iter().any(|s| !s.undirected);
        let has_out = graph.downstream_of(idx).iter().any(|s| !s.undirected);
        match (has_in, has_out) {
            (false, true) => sources.push(graph.id_of(idx).to_string()),
            (true, false) => sinks.push(graph.id_of(idx).to_string()),
            _ => {}
        }
    }
    sources.sort();
    sinks.sort();

    let isolated = graph
        .diagnostics()
        .iter()
        .filter_map(|d| match d {
            Diagnostic::IsolatedComponent { component_id } => Some(component_id.clone()),
            _ => None,
        })
        .collect();

    SchematicSummary {
        info: SchematicInfo::of(graph),
        relationship_count: graph.relationships().len(),
        components_by_type,
        connections_by_type,
        sources,
        sinks,
        isolated,
        diagnostics: graph.diagnostics().to_vec(),
    }
}
