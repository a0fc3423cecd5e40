//! Schematic graph builder.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{GraphError, GraphResult};
use crate::graph::{
    Component, Diagnostic, Edge, FlowOrientation, FlowStep, Relationship, SchematicGraph,
};
use crate::indexing::IdIndex;
use crate::validate;

/// Builder for one schematic version.
///
/// Collect components and relationships (typically the structured output of
/// schematic extraction), then call `build()` to validate and freeze them into
/// an immutable [`SchematicGraph`].
#[derive(Debug, Clone)]
pub struct SchematicBuilder {
    schematic_id: String,
    machine_name: String,
    version: u64,
    created_at: Option<DateTime<Utc>>,
    components: Vec<Component>,
    relationships: Vec<Relationship>,
}

impl SchematicBuilder {
    /// Create an empty builder for version 1 of a schematic.
    pub fn new(schematic_id: impl Into<String>, machine_name: impl Into<String>) -> Self {
        Self {
            schematic_id: schematic_id.into(),
            machine_name: machine_name.into(),
            version: 1,
            created_at: None,
            components: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Set the version this snapshot will carry.
    pub fn version(&mut self, version: u64) -> &mut Self {
        self.version = version;
        self
    }

    /// Pin the creation timestamp (defaults to the time of `build()`).
    pub fn created_at(&mut self, at: DateTime<Utc>) -> &mut Self {
        self.created_at = Some(at);
        self
    }

    pub fn add_component(&mut self, component: Component) -> &mut Self {
        self.components.push(component);
        self
    }

    pub fn add_relationship(&mut self, relationship: Relationship) -> &mut Self {
        self.relationships.push(relationship);
        self
    }

    pub fn extend_components(&mut self, components: impl IntoIterator<Item = Component>) -> &mut Self {
        self.components.extend(components);
        self
    }

    pub fn extend_relationships(
        &mut self,
        relationships: impl IntoIterator<Item = Relationship>,
    ) -> &mut Self {
        self.relationships.extend(relationships);
        self
    }

    /// Validate and freeze the schematic.
    ///
    /// Fails if a component id is blank or duplicated, or if a relationship
    /// references an unknown component or carries an invalid line size.
    pub fn build(self) -> GraphResult<SchematicGraph> {
        validate::validate_components(&self.schematic_id, &self.components)?;
        if hf_core::CompIdx::from_usize(self.components.len()).is_none() {
            return Err(GraphError::TooLarge {
                schematic_id: self.schematic_id,
                what: "components",
            });
        }

        let index = IdIndex::from_ids(self.components.iter().map(|c| c.id.as_str()));
        let edges =
            validate::resolve_relationships(&self.schematic_id, &index, &self.relationships)?;
        let diagnostics =
            validate::collect_diagnostics(&self.components, &self.relationships, &edges);

        let (downstream_offsets, downstream, upstream_offsets, upstream) =
            Self::build_flow_adjacency(self.components.len(), &self.relationships, &edges);

        for diag in &diagnostics {
            if matches!(diag, Diagnostic::UndirectedRelationship { .. }) {
                warn!(schematic = %self.schematic_id, "{diag}");
            }
        }
        debug!(
            schematic = %self.schematic_id,
            version = self.version,
            components = self.components.len(),
            relationships = self.relationships.len(),
            diagnostics = diagnostics.len(),
            "schematic graph built"
        );

        Ok(SchematicGraph {
            schematic_id: self.schematic_id,
            machine_name: self.machine_name,
            version: self.version,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            components: self.components,
            relationships: self.relationships,
            edges,
            index,
            downstream_offsets,
            downstream,
            upstream_offsets,
            upstream,
            diagnostics,
        })
    }

    /// Build compact flow adjacency in both directions.
    ///
    /// Each directed relationship contributes one downstream step at its flow
    /// origin and one upstream step at its flow target, oriented by its
    /// connection type. Undirected relationships contribute steps both ways,
    /// marked so tracing can skip them. Self loops are left out.
    #[allow(clippy::type_complexity)]
    fn build_flow_adjacency(
        n: usize,
        relationships: &[Relationship],
        edges: &[Edge],
    ) -> (Vec<usize>, Vec<FlowStep>, Vec<usize>, Vec<FlowStep>) {
        let mut down: Vec<Vec<FlowStep>> = vec![Vec::new(); n];
        let mut up: Vec<Vec<FlowStep>> = vec![Vec::new(); n];

        for (rel, edge) in relationships.iter().zip(edges) {
            if edge.source == edge.dest {
                continue;
            }
            let (from, to) = match rel.connection_type.flow_orientation() {
                FlowOrientation::Forward => (edge.source, edge.dest),
                FlowOrientation::Reverse => (edge.dest, edge.source),
            };
            let undirected = !rel.directed;

            down[from.slot()].push(FlowStep {
                edge: edge.id,
                neighbor: to,
                undirected,
            });
            up[to.slot()].push(FlowStep {
                edge: edge.id,
                neighbor: from,
                undirected,
            });

            if undirected {
                down[to.slot()].push(FlowStep {
                    edge: edge.id,
                    neighbor: from,
                    undirected,
                });
                up[from.slot()].push(FlowStep {
                    edge: edge.id,
                    neighbor: to,
                    undirected,
                });
            }
        }

        let (down_offsets, down_flat) = Self::flatten(down);
        let (up_offsets, up_flat) = Self::flatten(up);
        (down_offsets, down_flat, up_offsets, up_flat)
    }

    /// Offsets + flat list, each component's steps sorted by edge for determinism.
    fn flatten(lists: Vec<Vec<FlowStep>>) -> (Vec<usize>, Vec<FlowStep>) {
        let mut offsets = Vec::with_capacity(lists.len() + 1);
        let mut flat = Vec::new();
        offsets.push(0);
        for mut steps in lists {
            steps.sort_by_key(|s| (s.edge, s.neighbor));
            flat.extend(steps);
            offsets.push(flat.len());
        }
        (offsets, flat)
    }
}
