//! Machine-to-machine and path-to-path comparison.

use std::collections::{BTreeMap, BTreeSet};

use hf_core::units::VolumeRate;
use hf_core::units::to_lpm;
use hf_graph::{ComponentType, SchematicGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisResult;
use crate::path::FlowPathResult;
use crate::restriction::{RestrictionDetector, RestrictionKind, RestrictionReport, SeverityCounts};
use crate::settings::AnalysisSettings;

/// Restriction profile of one schematic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchematicProfile {
    pub schematic_id: String,
    pub machine_name: String,
    pub version: u64,
    pub component_count: usize,
    pub restriction_count: usize,
    pub by_severity: SeverityCounts,
    pub by_kind: BTreeMap<RestrictionKind, usize>,
}

impl SchematicProfile {
    fn new(graph: &SchematicGraph, report: &RestrictionReport) -> Self {
        let mut by_kind = BTreeMap::new();
        for r in &report.restrictions {
            *by_kind.entry(r.kind).or_insert(0) += 1;
        }
        Self {
            schematic_id: graph.schematic_id().to_string(),
            machine_name: graph.machine_name().to_string(),
            version: graph.version(),
            component_count: graph.components().len(),
            restriction_count: report.restrictions.len(),
            by_severity: report.counts,
            by_kind,
        }
    }
}

/// A component present in both schematics with different types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMismatch {
    pub component_id: String,
    pub type_a: ComponentType,
    pub type_b: ComponentType,
}

/// Difference between two schematics at one flow rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub flow_rate_lpm: f64,
    pub a: SchematicProfile,
    pub b: SchematicProfile,
    pub only_in_a: BTreeSet<String>,
    pub only_in_b: BTreeSet<String>,
    pub common: BTreeSet<String>,
    pub type_mismatches: Vec<TypeMismatch>,
    /// `b - a`
    pub component_count_delta: i64,
    /// `b - a`
    pub restriction_count_delta: i64,
}

/// Compare two schematics; detection runs on both in parallel.
///
/// Swapping the arguments swaps `a`/`b` and the only-in sets and negates the
/// deltas; the common set is unchanged.
pub fn compare_schematics(
    a: &SchematicGraph,
    b: &SchematicGraph,
    settings: &AnalysisSettings,
    flow: VolumeRate,
) -> AnalysisResult<ComparisonResult> {
    let detector = RestrictionDetector::new(settings);
    let (report_a, report_b) = rayon::join(
        || detector.detect_schematic(a, flow),
        || detector.detect_schematic(b, flow),
    );
    let (report_a, report_b) = (report_a?, report_b?);

    let ids_a: BTreeSet<String> = a.components().iter().map(|c| c.id.clone()).collect();
    let ids_b: BTreeSet<String> = b.components().iter().map(|c| c.id.clone()).collect();

    let common: BTreeSet<String> = ids_a.intersection(&ids_b).cloned().collect();
    let type_mismatches = common
        .iter()
        .filter_map(|id| {
            let type_a = a.component_by_id(id)?.kind;
            let type_b = b.component_by_id(id)?.kind;
            (type_a != type_b).then(|| TypeMismatch {
                component_id: id.clone(),
                type_a,
                type_b,
            })
        })
        .collect();

    let profile_a = SchematicProfile::new(a, &report_a);
    let profile_b = SchematicProfile::new(b, &report_b);

    debug!(
        a = %a.schematic_id(),
        b = %b.schematic_id(),
        common = common.len(),
        "schematics compared"
    );

    Ok(ComparisonResult {
        flow_rate_lpm: to_lpm(flow),
        only_in_a: ids_a.difference(&ids_b).cloned().collect(),
        only_in_b: ids_b.difference(&ids_a).cloned().collect(),
        common,
        type_mismatches,
        component_count_delta: delta(profile_a.component_count, profile_b.component_count),
        restriction_count_delta: delta(profile_a.restriction_count, profile_b.restriction_count),
        a: profile_a,
        b: profile_b,
    })
}

fn delta(a: usize, b: usize) -> i64 {
    b as i64 - a as i64
}

/// Which side of a comparison is preferable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Better {
    First,
    Second,
}

/// One metric on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub first: f64,
    pub second: f64,
    /// `second - first`
    pub delta: f64,
    pub better: Better,
}

impl MetricComparison {
    // Equal metrics go to the first path, the one the caller treats as current.
    fn lower_is_better(first: f64, second: f64) -> Self {
        Self {
            first,
            second,
            delta: second - first,
            better: if second < first {
                Better::Second
            } else {
                Better::First
            },
        }
    }

    fn higher_is_better(first: f64, second: f64) -> Self {
        Self {
            better: if second > first {
                Better::Second
            } else {
                Better::First
            },
            ..Self::lower_is_better(first, second)
        }
    }
}

/// Side-by-side comparison of two analysed paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathComparison {
    pub first_path: Vec<String>,
    pub second_path: Vec<String>,
    pub cumulative_drop_bar: MetricComparison,
    pub efficiency: MetricComparison,
    pub restriction_count: MetricComparison,
    /// Better on cumulative drop, the primary criterion.
    pub better: Better,
}

/// Compare two path results; ties favour the first.
pub fn compare_paths(first: &FlowPathResult, second: &FlowPathResult) -> PathComparison {
    let cumulative_drop_bar =
        MetricComparison::lower_is_better(first.cumulative_drop_bar, second.cumulative_drop_bar);
    PathComparison {
        first_path: first.path.clone(),
        second_path: second.path.clone(),
        efficiency: MetricComparison::higher_is_better(first.efficiency, second.efficiency),
        restriction_count: MetricComparison::lower_is_better(
            first.restrictions.len() as f64,
            second.restrictions.len() as f64,
        ),
        better: cumulative_drop_bar.better,
        cumulative_drop_bar,
    }
}
