//! End-to-end analysis scenarios over small schematics.

use std::f64::consts::PI;

use hf_analysis::{
    AnalysisError, AnalysisSettings, OperatingPoint, RestrictionDetector, RestrictionKind,
    RestrictionTarget, Severity, analyze_path, compare_paths, compare_schematics, flow_from_lpm,
};
use hf_components::ComputationWarning;
use hf_core::{Tolerances, nearly_equal};
use hf_graph::{
    Component, ComponentType, ConnectionType, Relationship, SchematicBuilder, SchematicGraph,
    TraceError,
};

/// P1(PUMP) -> V12(VALVE, 0.5in line) -> H203(CYLINDER)
fn press_circuit() -> SchematicGraph {
    let mut b = SchematicBuilder::new("press-1", "Press 1");
    b.add_component(Component::new("P1", ComponentType::Pump))
        .add_component(Component::new("V12", ComponentType::Valve))
        .add_component(Component::new("H203", ComponentType::Cylinder))
        .add_relationship(
            Relationship::new("P1", "V12", ConnectionType::Supply).with_line_size(0.5 * 0.0254),
        )
        .add_relationship(Relationship::new("V12", "H203", ConnectionType::Supply));
    b.build().unwrap()
}

/// Diameter giving velocity `v` at 60 LPM.
fn diameter_for(v: f64) -> f64 {
    (4.0 * 0.001 / (PI * v)).sqrt()
}

#[test]
fn valve_drop_follows_k_formula() {
    let g = press_circuit();
    let settings = AnalysisSettings::default();
    let op = OperatingPoint::new(180.0, 180.0).unwrap();
    let r = analyze_path(&g, &settings, "P1", "H203", &op).unwrap();

    assert_eq!(r.path, vec!["P1", "V12", "H203"]);

    let v12 = &r.component_drops[1];
    let d = 0.5 * 0.0254;
    let area = PI * d * d / 4.0;
    let v = (180.0 / 60_000.0) / area;
    let k_valve = settings.k_factors.by_type[&ComponentType::Valve];
    let expected = k_valve * (settings.fluid.density * v * v) / 2.0;

    let tol = Tolerances::default();
    assert!(nearly_equal(v12.velocity_mps, v, tol));
    assert!(nearly_equal(v12.pressure_drop_pa, expected, tol));
    assert!(nearly_equal(
        v12.reynolds,
        settings.fluid.density * v * d / settings.fluid.viscosity,
        tol
    ));

    // Exact summation, efficiency from the total
    let sum: f64 = r.component_drops.iter().map(|c| c.pressure_drop_pa).sum();
    assert_eq!(r.cumulative_drop_pa, sum);
    assert!(nearly_equal(r.efficiency, 1.0 - sum / 180e5, tol));

    // Pump has no K entry; H203's line has no size
    assert!(r.warnings.iter().any(|w| matches!(
        w,
        ComputationWarning::DefaultKFactor { component_id, .. } if component_id == "P1"
    )));
    assert!(r.warnings.iter().any(|w| matches!(
        w,
        ComputationWarning::DefaultLineDiameter { component_id, .. } if component_id == "H203"
    )));
}

#[test]
fn repeated_analysis_is_idempotent() {
    let g = press_circuit();
    let settings = AnalysisSettings::default();
    let op = OperatingPoint::new(120.0, 210.0).unwrap();
    let first = analyze_path(&g, &settings, "P1", "H203", &op).unwrap();
    let second = analyze_path(&g, &settings, "P1", "H203", &op).unwrap();
    assert_eq!(first, second);
}

#[test]
fn disconnected_pair_is_no_path_not_empty_success() {
    let mut b = SchematicBuilder::new("split", "Split");
    b.add_component(Component::new("P1", ComponentType::Pump))
        .add_component(Component::new("V1", ComponentType::Valve))
        .add_component(Component::new("P2", ComponentType::Pump))
        .add_component(Component::new("C2", ComponentType::Cylinder))
        .add_relationship(Relationship::new("P1", "V1", ConnectionType::Supply))
        .add_relationship(Relationship::new("P2", "C2", ConnectionType::Supply));
    let g = b.build().unwrap();

    let op = OperatingPoint::new(50.0, 100.0).unwrap();
    let err = analyze_path(&g, &AnalysisSettings::default(), "P1", "C2", &op).unwrap_err();
    match err {
        AnalysisError::Trace(TraceError::NoPath {
            forward_reachable,
            backward_reachable,
            ..
        }) => {
            assert_eq!(forward_reachable, vec!["V1"]);
            assert_eq!(backward_reachable, vec!["P2"]);
        }
        other => panic!("expected NoPath, got {other:?}"),
    }
}

#[test]
fn zero_flow_is_configuration_error() {
    assert!(matches!(
        OperatingPoint::new(0.0, 100.0),
        Err(AnalysisError::Configuration { .. })
    ));
    assert!(matches!(
        flow_from_lpm(-3.0),
        Err(AnalysisError::Configuration { .. })
    ));
}

#[test]
fn half_inch_at_180_lpm_is_flagged_high() {
    let g = press_circuit();
    let settings = AnalysisSettings::default();
    let op = OperatingPoint::new(180.0, 180.0).unwrap();
    let r = analyze_path(&g, &settings, "P1", "H203", &op).unwrap();

    // ~23.7 m/s everywhere: every component HIGH, one series over all three
    let series: Vec<_> = r
        .restrictions
        .iter()
        .filter(|x| x.kind == RestrictionKind::SeriesRestriction)
        .collect();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].severity, Severity::High);
    assert_eq!(
        series[0].target,
        RestrictionTarget::Series {
            component_ids: vec!["P1".into(), "V12".into(), "H203".into()]
        }
    );

    // The sized line is undersized too
    assert!(r.restrictions.iter().any(|x| x.kind == RestrictionKind::UndersizedLine
        && x.target.involves("V12")));

    // Sorted by severity, then by drop
    for pair in r.restrictions.windows(2) {
        assert!(pair[0].severity >= pair[1].severity);
        if pair[0].severity == pair[1].severity {
            assert!(pair[0].pressure_drop_pa >= pair[1].pressure_drop_pa);
        }
    }
}

/// F0 -> F1 -> F2 -> F3 -> F4 -> Va -> Vb -> F5 -> ... -> F9 at 60 LPM.
/// Filters sit on 4 m/s lines, the two valves on 6 m/s lines.
fn filter_bank() -> SchematicGraph {
    let big = diameter_for(4.0);
    let small = diameter_for(6.0);
    let ids: Vec<String> = (0..5)
        .map(|i| format!("F{i}"))
        .chain(["Va".to_string(), "Vb".to_string()])
        .chain((5..10).map(|i| format!("F{i}")))
        .collect();

    let mut b = SchematicBuilder::new("bank", "Filter Bank");
    for id in &ids {
        let kind = if id.starts_with('V') {
            ComponentType::Valve
        } else {
            ComponentType::Filter
        };
        b.add_component(Component::new(id.clone(), kind));
    }
    for pair in ids.windows(2) {
        let d = if pair[1].starts_with('V') { small } else { big };
        b.add_relationship(
            Relationship::new(pair[0].clone(), pair[1].clone(), ConnectionType::Supply)
                .with_line_size(d),
        );
    }
    b.build().unwrap()
}

#[test]
fn two_moderate_neighbours_form_medium_series() {
    let g = filter_bank();
    let settings = AnalysisSettings::default();
    let report = RestrictionDetector::new(&settings)
        .detect_schematic(&g, flow_from_lpm(60.0).unwrap())
        .unwrap();

    assert_eq!(report.evaluated_components, 12);
    assert_eq!(report.counts.high, 0);
    assert_eq!(report.counts.low, 0);
    // Va, Vb, their series, and the two 6 m/s lines
    assert_eq!(report.counts.medium, 5);

    let first = &report.restrictions[0];
    assert_eq!(first.kind, RestrictionKind::SeriesRestriction);
    assert_eq!(
        first.target,
        RestrictionTarget::Series {
            component_ids: vec!["Va".into(), "Vb".into()]
        }
    );
    assert_eq!(
        report
            .restrictions
            .iter()
            .filter(|r| r.kind == RestrictionKind::UndersizedLine)
            .count(),
        2
    );
    assert!(report.warnings.is_empty());
}

#[test]
fn path_mode_uses_path_share() {
    let g = filter_bank();
    let settings = AnalysisSettings::default();
    let op = OperatingPoint::new(60.0, 100.0).unwrap();

    // Only the two valves: each carries half the path drop
    let r = analyze_path(&g, &settings, "Va", "Vb", &op).unwrap();
    let va = r
        .restrictions
        .iter()
        .find(|x| x.target == RestrictionTarget::Component { component_id: "Va".into() })
        .unwrap();
    assert_eq!(va.severity, Severity::High);
    assert!((va.drop_fraction.unwrap() - 0.5).abs() < 1e-12);
}

#[test]
fn machine_with_extra_component() {
    let a = press_circuit();
    let mut b = SchematicBuilder::new("press-2", "Press 2");
    b.extend_components(a.components().iter().cloned())
        .extend_relationships(a.relationships().iter().cloned())
        .add_component(Component::new("X", ComponentType::Filter))
        .add_relationship(Relationship::new("V12", "X", ConnectionType::Supply));
    let b = b.build().unwrap();

    let settings = AnalysisSettings::default();
    let flow = flow_from_lpm(180.0).unwrap();
    let ab = compare_schematics(&a, &b, &settings, flow).unwrap();

    assert!(ab.only_in_a.is_empty());
    assert_eq!(ab.only_in_b.iter().collect::<Vec<_>>(), vec!["X"]);
    assert_eq!(ab.common.len(), 3);
    assert_eq!(ab.component_count_delta, 1);
    assert!(ab.type_mismatches.is_empty());

    let ba = compare_schematics(&b, &a, &settings, flow).unwrap();
    assert_eq!(ba.common, ab.common);
    assert_eq!(ba.only_in_a, ab.only_in_b);
    assert_eq!(ba.component_count_delta, -1);
    assert_eq!(ba.restriction_count_delta, -ab.restriction_count_delta);
}

#[test]
fn comparing_paths_names_the_better_one() {
    let g = filter_bank();
    let settings = AnalysisSettings::default();
    let op = OperatingPoint::new(60.0, 100.0).unwrap();
    let short = analyze_path(&g, &settings, "F3", "F4", &op).unwrap();
    let long = analyze_path(&g, &settings, "F0", "F9", &op).unwrap();

    let cmp = compare_paths(&short, &long);
    assert_eq!(cmp.better, hf_analysis::Better::First);
    assert!(cmp.cumulative_drop_bar.delta > 0.0);

    let same = compare_paths(&short, &short);
    assert_eq!(same.better, hf_analysis::Better::First);
}
