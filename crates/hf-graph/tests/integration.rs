//! Integration tests for hf-graph.

use std::collections::HashSet;

use hf_graph::{
    Component, ComponentType, ConnectionType, Diagnostic, FlowTracer, Relationship,
    SchematicBuilder, SchematicGraph, TraceError, TraceOptions,
};
use proptest::prelude::*;

fn k_of(c: &Component) -> f64 {
    match c.kind {
        ComponentType::Valve => 3.0,
        ComponentType::Filter => 5.0,
        ComponentType::Manifold => 2.0,
        _ => 0.5,
    }
}

/// P1 feeds H203 through either a filter or a manifold (same hop count).
fn diamond() -> SchematicGraph {
    let mut b = SchematicBuilder::new("diamond", "Test Rig");
    b.add_component(Component::new("P1", ComponentType::Pump))
        .add_component(Component::new("F1", ComponentType::Filter))
        .add_component(Component::new("M1", ComponentType::Manifold))
        .add_component(Component::new("H203", ComponentType::Cylinder))
        .add_relationship(Relationship::new("P1", "F1", ConnectionType::Supply))
        .add_relationship(Relationship::new("P1", "M1", ConnectionType::Supply))
        .add_relationship(Relationship::new("F1", "H203", ConnectionType::Supply))
        .add_relationship(Relationship::new("M1", "H203", ConnectionType::Supply));
    b.build().unwrap()
}

#[test]
fn equal_hop_paths_prefer_lower_resistance() {
    let g = diamond();
    let tracer = FlowTracer::new(&g, TraceOptions::default());
    let path = tracer.find_path("P1", "H203", k_of).unwrap();
    assert_eq!(path.ids(&g), vec!["P1", "M1", "H203"]);
    assert!((path.nominal_resistance - 3.0).abs() < 1e-12);
}

#[test]
fn equal_weights_tie_break_on_edge_order() {
    let g = diamond();
    let tracer = FlowTracer::new(&g, TraceOptions::default());
    let path = tracer.find_path("P1", "H203", |_| 1.0).unwrap();
    assert_eq!(path.ids(&g), vec!["P1", "F1", "H203"]);
}

#[test]
fn fewer_hops_beat_lower_resistance() {
    let mut b = SchematicBuilder::new("s", "m");
    b.add_component(Component::new("A", ComponentType::Pump))
        .add_component(Component::new("F", ComponentType::Filter))
        .add_component(Component::new("X", ComponentType::Other))
        .add_component(Component::new("Y", ComponentType::Other))
        .add_component(Component::new("Z", ComponentType::Cylinder))
        .add_relationship(Relationship::new("A", "F", ConnectionType::Supply))
        .add_relationship(Relationship::new("F", "Z", ConnectionType::Supply))
        .add_relationship(Relationship::new("A", "X", ConnectionType::Supply))
        .add_relationship(Relationship::new("X", "Y", ConnectionType::Supply))
        .add_relationship(Relationship::new("Y", "Z", ConnectionType::Supply));
    let g = b.build().unwrap();
    let path = FlowTracer::new(&g, TraceOptions::default())
        .find_path("A", "Z", k_of)
        .unwrap();
    assert_eq!(path.ids(&g), vec!["A", "F", "Z"]);
}

#[test]
fn disconnected_components_report_reachable_sets() {
    let mut b = SchematicBuilder::new("s", "m");
    b.add_component(Component::new("P1", ComponentType::Pump))
        .add_component(Component::new("V1", ComponentType::Valve))
        .add_component(Component::new("P2", ComponentType::Pump))
        .add_component(Component::new("C2", ComponentType::Cylinder))
        .add_relationship(Relationship::new("P1", "V1", ConnectionType::Supply))
        .add_relationship(Relationship::new("P2", "C2", ConnectionType::Supply));
    let g = b.build().unwrap();

    let err = FlowTracer::new(&g, TraceOptions::default())
        .find_path("P1", "C2", |_| 1.0)
        .unwrap_err();
    assert_eq!(
        err,
        TraceError::NoPath {
            start: "P1".into(),
            end: "C2".into(),
            forward_reachable: vec!["V1".into()],
            backward_reachable: vec!["P2".into()],
            depth_limited: false,
        }
    );
}

#[test]
fn undirected_lines_only_traced_when_enabled() {
    let mut b = SchematicBuilder::new("s", "m");
    b.add_component(Component::new("A", ComponentType::Valve))
        .add_component(Component::new("B", ComponentType::Valve))
        .add_relationship(Relationship::new("A", "B", ConnectionType::Pilot).undirected());
    let g = b.build().unwrap();
    assert!(matches!(
        g.diagnostics(),
        [Diagnostic::UndirectedRelationship { .. }]
    ));

    let strict = FlowTracer::new(&g, TraceOptions::default());
    assert!(strict.find_path("A", "B", |_| 1.0).is_err());
    assert!(strict.impact("A").unwrap().downstream.is_empty());

    let loose = FlowTracer::new(
        &g,
        TraceOptions {
            include_undirected: true,
            ..TraceOptions::default()
        },
    );
    assert_eq!(loose.find_path("B", "A", |_| 1.0).unwrap().hops(), 1);
}

#[test]
fn cycles_do_not_hang_and_exclude_self() {
    let mut b = SchematicBuilder::new("loop", "m");
    b.add_component(Component::new("A", ComponentType::Valve))
        .add_component(Component::new("B", ComponentType::Valve))
        .add_component(Component::new("C", ComponentType::Valve))
        .add_relationship(Relationship::new("A", "B", ConnectionType::Supply))
        .add_relationship(Relationship::new("B", "C", ConnectionType::Supply))
        .add_relationship(Relationship::new("C", "A", ConnectionType::Supply));
    let g = b.build().unwrap();

    let impact = FlowTracer::new(&g, TraceOptions::default())
        .impact("A")
        .unwrap();
    assert!(!impact.upstream.contains("A"));
    assert!(!impact.downstream.contains("A"));
    assert_eq!(impact.downstream.len(), 2);
    assert_eq!(impact.upstream.len(), 2);
}

#[test]
fn impact_of_unknown_component_suggests() {
    let g = diamond();
    let err = FlowTracer::new(&g, TraceOptions::default())
        .impact("h203")
        .unwrap_err();
    match err {
        TraceError::NotFound { suggestions, .. } => {
            assert_eq!(suggestions.first().map(String::as_str), Some("H203"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

/// Random directed schematics: (n, edge list over 0..n).
fn arb_schematic() -> impl Strategy<Value = SchematicGraph> {
    (2usize..10)
        .prop_flat_map(|n| {
            (
                Just(n),
                prop::collection::vec((0..n, 0..n, 0usize..5), 0..25),
            )
        })
        .prop_map(|(n, links)| {
            let mut b = SchematicBuilder::new("prop", "m");
            for i in 0..n {
                b.add_component(Component::new(format!("C{i}"), ComponentType::Valve));
            }
            for (s, d, t) in links {
                b.add_relationship(Relationship::new(
                    format!("C{s}"),
                    format!("C{d}"),
                    ConnectionType::ALL[t],
                ));
            }
            b.build().unwrap()
        })
}

proptest! {
    #[test]
    fn found_paths_are_simple_and_connected(g in arb_schematic(), s in 0usize..10, e in 0usize..10) {
        let n = g.components().len();
        let (start, end) = (format!("C{}", s % n), format!("C{}", e % n));
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        if let Ok(path) = tracer.find_path(&start, &end, |_| 1.0) {
            let ids = path.ids(&g);
            prop_assert_eq!(ids.first(), Some(&start));
            prop_assert_eq!(ids.last(), Some(&end));
            let unique: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());
            prop_assert_eq!(path.edges.len() + 1, path.components.len());
            for (w, edge) in path.components.windows(2).zip(&path.edges) {
                prop_assert!(g.downstream_of(w[0]).iter().any(|s| s.edge == *edge && s.neighbor == w[1]));
            }
        }
    }

    #[test]
    fn impact_sets_exclude_self_and_mirror_each_other(g in arb_schematic(), pick in 0usize..10) {
        let n = g.components().len();
        let id = format!("C{}", pick % n);
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        let impact = tracer.impact(&id).unwrap();
        prop_assert!(!impact.upstream.contains(&id));
        prop_assert!(!impact.downstream.contains(&id));
        for other in &impact.downstream {
            prop_assert!(tracer.impact(other).unwrap().upstream.contains(&id));
        }
    }
}
