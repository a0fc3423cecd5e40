//! Full flow path analysis: trace, pressure drop, restrictions.

use hf_components::ComputationWarning;
use hf_fluids::FlowRegime;
use hf_graph::{FlowTracer, SchematicGraph};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AnalysisResult;
use crate::pressure::{ComponentDrop, PressureDropCalculator};
use crate::restriction::{Restriction, RestrictionDetector};
use crate::settings::{AnalysisSettings, OperatingPoint};

/// Everything known about one flow path at one operating point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPathResult {
    pub schematic_id: String,
    pub version: u64,
    /// Component ids in flow order; no repeats.
    pub path: Vec<String>,
    pub flow_rate_lpm: f64,
    pub system_pressure_bar: f64,
    pub component_drops: Vec<ComponentDrop>,
    pub cumulative_drop_pa: f64,
    pub cumulative_drop_bar: f64,
    pub cumulative_drop_psi: f64,
    /// `1 - cumulative_drop / system_pressure`.
    pub efficiency: f64,
    pub worst_regime: FlowRegime,
    /// Component with the largest single drop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottleneck: Option<String>,
    /// Sum of K-factors along the path, the tie-break weight.
    pub nominal_resistance: f64,
    pub restrictions: Vec<Restriction>,
    pub warnings: Vec<ComputationWarning>,
}

impl FlowPathResult {
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    pub fn efficiency_percent(&self) -> f64 {
        self.efficiency * 100.0
    }
}

/// Trace `start → end` and analyse the winning path at `op`.
pub fn analyze_path(
    graph: &SchematicGraph,
    settings: &AnalysisSettings,
    start: &str,
    end: &str,
    op: &OperatingPoint,
) -> AnalysisResult<FlowPathResult> {
    let tracer = FlowTracer::new(graph, settings.trace_options());
    let path = tracer.find_path(start, end, |c| settings.k_factors.nominal_k(c))?;

    let eval = PressureDropCalculator::new(settings).evaluate_path(graph, &path, op)?;
    let restrictions = RestrictionDetector::new(settings).detect_path(graph, &path, &eval, op.flow)?;

    let ids = path.ids(graph);
    info!(
        schematic = %graph.schematic_id(),
        version = graph.version(),
        path = %ids.join(" -> "),
        cumulative_drop_bar = eval.cumulative_drop_bar(),
        restrictions = restrictions.len(),
        "flow path analysed"
    );

    Ok(FlowPathResult {
        schematic_id: graph.schematic_id().to_string(),
        version: graph.version(),
        path: ids,
        flow_rate_lpm: op.flow_lpm(),
        system_pressure_bar: op.pressure_bar(),
        cumulative_drop_bar: eval.cumulative_drop_bar(),
        cumulative_drop_psi: eval.cumulative_drop_psi(),
        worst_regime: eval.worst_regime().unwrap_or(FlowRegime::Laminar),
        bottleneck: eval.bottleneck().map(|d| d.component_id.clone()),
        nominal_resistance: path.nominal_resistance,
        cumulative_drop_pa: eval.cumulative_drop_pa,
        efficiency: eval.efficiency,
        component_drops: eval.drops,
        restrictions,
        warnings: eval.warnings,
    })
}
