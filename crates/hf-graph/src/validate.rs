//! Schematic validation logic.

use std::collections::HashSet;

use crate::error::GraphError;
use crate::graph::{Component, Diagnostic, Edge, Relationship};
use crate::indexing::IdIndex;

/// Validate components: ids non-empty and unique.
pub(crate) fn validate_components(
    schematic_id: &str,
    components: &[Component],
) -> Result<(), GraphError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(components.len());
    for (position, comp) in components.iter().enumerate() {
        if comp.id.trim().is_empty() {
            return Err(GraphError::EmptyComponentId {
                schematic_id: schematic_id.to_string(),
                position,
            });
        }
        if !seen.insert(comp.id.as_str()) {
            return Err(GraphError::DuplicateComponent {
                schematic_id: schematic_id.to_string(),
                id: comp.id.clone(),
            });
        }
    }
    Ok(())
}

/// Validate relationships against the component index and resolve them to edges.
pub(crate) fn resolve_relationships(
    schematic_id: &str,
    index: &IdIndex,
    relationships: &[Relationship],
) -> Result<Vec<Edge>, GraphError> {
    let mut edges = Vec::with_capacity(relationships.len());
    for (position, rel) in relationships.iter().enumerate() {
        let source = index
            .get(&rel.source_id)
            .ok_or_else(|| GraphError::UnknownEndpoint {
                schematic_id: schematic_id.to_string(),
                position,
                end: "source",
                id: rel.source_id.clone(),
            })?;
        let dest = index
            .get(&rel.dest_id)
            .ok_or_else(|| GraphError::UnknownEndpoint {
                schematic_id: schematic_id.to_string(),
                position,
                end: "dest",
                id: rel.dest_id.clone(),
            })?;

        // Zero means "unknown" and falls back to the default diameter later
        if let Some(d) = rel.line_size_m
            && (!d.is_finite() || d < 0.0)
        {
            return Err(GraphError::InvalidLineSize {
                source_id: rel.source_id.clone(),
                dest_id: rel.dest_id.clone(),
                value: d,
            });
        }

        let id = hf_core::EdgeIdx::from_usize(position).ok_or_else(|| GraphError::TooLarge {
            schematic_id: schematic_id.to_string(),
            what: "relationships",
        })?;
        edges.push(Edge { id, source, dest });
    }
    Ok(edges)
}

/// Collect non-fatal findings: undirected lines, self loops, isolated components.
pub(crate) fn collect_diagnostics(
    components: &[Component],
    relationships: &[Relationship],
    edges: &[Edge],
) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut connected = vec![false; components.len()];

    for (rel, edge) in relationships.iter().zip(edges) {
        connected[edge.source.slot()] = true;
        connected[edge.dest.slot()] = true;

        if edge.source == edge.dest {
            diagnostics.push(Diagnostic::SelfLoop {
                component_id: rel.source_id.clone(),
            });
        } else if !rel.directed {
            diagnostics.push(Diagnostic::UndirectedRelationship {
                source_id: rel.source_id.clone(),
                dest_id: rel.dest_id.clone(),
                connection_type: rel.connection_type,
            });
        }
    }

    for (comp, linked) in components.iter().zip(connected) {
        if !linked {
            diagnostics.push(Diagnostic::IsolatedComponent {
                component_id: comp.id.clone(),
            });
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ComponentType, ConnectionType};

    fn comps(ids: &[&str]) -> Vec<Component> {
        ids.iter()
            .map(|id| Component::new(*id, ComponentType::Valve))
            .collect()
    }

    #[test]
    fn validate_empty_schematic() {
        assert!(validate_components("s", &[]).is_ok());
        let index = IdIndex::from_ids(std::iter::empty());
        assert!(resolve_relationships("s", &index, &[]).unwrap().is_empty());
    }

    #[test]
    fn duplicate_component_rejected() {
        let err = validate_components("s", &comps(&["V1", "V2", "V1"])).unwrap_err();
        assert_eq!(
            err,
            GraphError::DuplicateComponent {
                schematic_id: "s".into(),
                id: "V1".into()
            }
        );
    }

    #[test]
    fn blank_component_id_rejected() {
        let err = validate_components("s", &comps(&["V1", "  "])).unwrap_err();
        assert!(matches!(
            err,
            GraphError::EmptyComponentId { position: 1, .. }
        ));
    }

    #[test]
    fn dangling_endpoint_rejected() {
        let index = IdIndex::from_ids(["V1", "V2"].into_iter());
        let rels = vec![Relationship::new("V1", "V9", ConnectionType::Supply)];
        let err = resolve_relationships("s", &index, &rels).unwrap_err();
        assert!(matches!(
            err,
            GraphError::UnknownEndpoint { end: "dest", ref id, .. } if id == "V9"
        ));
    }

    #[test]
    fn negative_line_size_rejected() {
        let index = IdIndex::from_ids(["V1", "V2"].into_iter());
        let rels = vec![Relationship::new("V1", "V2", ConnectionType::Supply).with_line_size(-0.01)];
        assert!(matches!(
            resolve_relationships("s", &index, &rels),
            Err(GraphError::InvalidLineSize { .. })
        ));
    }

    #[test]
    fn diagnostics_flag_undirected_self_loop_and_isolated() {
        let components = comps(&["A", "B", "C", "D"]);
        let index = IdIndex::from_ids(components.iter().map(|c| c.id.as_str()));
        let rels = vec![
            Relationship::new("A", "B", ConnectionType::Drain).undirected(),
            Relationship::new("C", "C", ConnectionType::Supply),
        ];
        let edges = resolve_relationships("s", &index, &rels).unwrap();
        let diags = collect_diagnostics(&components, &rels, &edges);

        assert_eq!(diags.len(), 3);
        assert!(diags.contains(&Diagnostic::UndirectedRelationship {
            source_id: "A".into(),
            dest_id: "B".into(),
            connection_type: ConnectionType::Drain,
        }));
        assert!(diags.contains(&Diagnostic::SelfLoop {
            component_id: "C".into()
        }));
        assert!(diags.contains(&Diagnostic::IsolatedComponent {
            component_id: "D".into()
        }));
    }
}
