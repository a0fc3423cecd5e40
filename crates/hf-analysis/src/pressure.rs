//! Pressure drop along a traced flow path.

use hf_components::{ComputationWarning, FlowElement, KLoss, KSource};
use hf_core::units::constants::{PA_PER_BAR, PA_PER_PSI};
use hf_core::units::{VolumeRate, m};
use hf_core::{CompIdx, EdgeIdx};
use hf_fluids::{FlowRegime, Quantity, parse_quantity};
use hf_graph::{Component, ComponentType, FlowPath, SchematicGraph};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::settings::{AnalysisSettings, OperatingPoint};

/// Component specification keys that carry a port size, in lookup order.
const PORT_SIZE_KEYS: [&str; 2] = ["size", "port_size"];

/// Where a component's hydraulic diameter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiameterSource {
    Line,
    PortSize,
    Default,
}

/// Loss through one component at the operating point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDrop {
    pub component_id: String,
    pub component_type: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub k_factor: f64,
    pub k_source: KSource,
    pub diameter_m: f64,
    pub diameter_source: DiameterSource,
    pub velocity_mps: f64,
    pub reynolds: f64,
    pub regime: FlowRegime,
    pub pressure_drop_pa: f64,
    pub pressure_drop_bar: f64,
    /// Share of the cumulative drop, in percent.
    pub percent_of_total: f64,
}

/// Per-component drops plus their totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEvaluation {
    pub drops: Vec<ComponentDrop>,
    pub cumulative_drop_pa: f64,
    /// `1 - cumulative / system`; negative when losses exceed supply.
    pub efficiency: f64,
    pub warnings: Vec<ComputationWarning>,
}

impl PathEvaluation {
    pub fn cumulative_drop_bar(&self) -> f64 {
        self.cumulative_drop_pa / PA_PER_BAR
    }

    pub fn cumulative_drop_psi(&self) -> f64 {
        self.cumulative_drop_pa / PA_PER_PSI
    }

    /// Component with the largest single drop (first wins ties).
    pub fn bottleneck(&self) -> Option<&ComponentDrop> {
        self.drops.iter().fold(None, |best: Option<&ComponentDrop>, d| match best {
            Some(b) if b.pressure_drop_pa >= d.pressure_drop_pa => Some(b),
            _ => Some(d),
        })
    }

    /// Most turbulent regime on the path.
    pub fn worst_regime(&self) -> Option<FlowRegime> {
        self.drops.iter().map(|d| d.regime).max()
    }
}

/// Evaluates K-factor losses with the configured fluid and tables.
#[derive(Debug, Clone, Copy)]
pub struct PressureDropCalculator<'a> {
    settings: &'a AnalysisSettings,
}

impl<'a> PressureDropCalculator<'a> {
    pub fn new(settings: &'a AnalysisSettings) -> Self {
        Self { settings }
    }

    /// Evaluate every component of `path` at `op`.
    ///
    /// Diameters come from the entering line (the first component uses the
    /// leaving line), then the component's port size, then the configured
    /// default. Defaults are reported as warnings, never as errors.
    pub fn evaluate_path(
        &self,
        graph: &SchematicGraph,
        path: &FlowPath,
        op: &OperatingPoint,
    ) -> AnalysisResult<PathEvaluation> {
        let mut warnings = Vec::new();
        let mut drops = Vec::with_capacity(path.components.len());

        for (i, &idx) in path.components.iter().enumerate() {
            let line = if i == 0 {
                path.edges.first()
            } else {
                path.edges.get(i - 1)
            };
            let drop = self.evaluate_component(graph, idx, line.copied(), op.flow, &mut warnings)?;
            drops.push(drop);
        }

        // Exact summation in path order
        let cumulative_drop_pa: f64 = drops.iter().map(|d| d.pressure_drop_pa).sum();
        if cumulative_drop_pa > 0.0 {
            for d in &mut drops {
                d.percent_of_total = d.pressure_drop_pa / cumulative_drop_pa * 100.0;
            }
        }

        let system_pa = op.system_pressure.value;
        let efficiency = 1.0 - cumulative_drop_pa / system_pa;
        if cumulative_drop_pa > system_pa {
            warnings.push(ComputationWarning::DropExceedsSystemPressure {
                cumulative_drop_pa,
                system_pressure_pa: system_pa,
            });
        }

        for w in &warnings {
            warn!(schematic = %graph.schematic_id(), "{w}");
        }
        debug!(
            schematic = %graph.schematic_id(),
            components = drops.len(),
            cumulative_drop_bar = cumulative_drop_pa / PA_PER_BAR,
            efficiency,
            "path pressure drop evaluated"
        );

        Ok(PathEvaluation {
            drops,
            cumulative_drop_pa,
            efficiency,
            warnings,
        })
    }

    /// Evaluate one component, sized by `line` when it carries a usable size.
    pub fn evaluate_component(
        &self,
        graph: &SchematicGraph,
        idx: CompIdx,
        line: Option<EdgeIdx>,
        flow: VolumeRate,
        warnings: &mut Vec<ComputationWarning>,
    ) -> AnalysisResult<ComponentDrop> {
        let Some(component) = graph.component(idx) else {
            return Err(AnalysisError::config(format!(
                "component index {} outside schematic '{}'",
                idx.index(),
                graph.schematic_id()
            )));
        };

        let line_size = line
            .and_then(|e| graph.relationship(e))
            .and_then(|r| r.usable_line_size());
        let (diameter_m, diameter_source) = self.resolve_diameter(component, line_size, warnings);

        let k = self.settings.k_factors.lookup(component);
        if let Some(w) = k.warning {
            warnings.push(w);
        }

        let state = KLoss::new(component.id.clone(), k.k, m(diameter_m)).evaluate(
            &self.settings.fluid,
            &self.settings.regimes,
            flow,
        )?;

        Ok(ComponentDrop {
            component_id: component.id.clone(),
            component_type: component.kind,
            description: component.description.clone(),
            k_factor: k.k,
            k_source: k.source,
            diameter_m,
            diameter_source,
            velocity_mps: state.velocity_mps,
            reynolds: state.reynolds,
            regime: state.regime,
            pressure_drop_pa: state.pressure_drop_pa,
            pressure_drop_bar: state.pressure_drop_pa / PA_PER_BAR,
            percent_of_total: 0.0,
        })
    }

    /// Line size, then port size specification, then the default.
    pub fn resolve_diameter(
        &self,
        component: &Component,
        line_size_m: Option<f64>,
        warnings: &mut Vec<ComputationWarning>,
    ) -> (f64, DiameterSource) {
        if let Some(d) = line_size_m.filter(|d| d.is_finite() && *d > 0.0) {
            return (d, DiameterSource::Line);
        }

        for key in PORT_SIZE_KEYS {
            let Some(text) = component.spec(key) else {
                continue;
            };
            match parse_quantity(text, Quantity::Diameter) {
                Ok(d) => return (d, DiameterSource::PortSize),
                Err(_) => warnings.push(ComputationWarning::UnparsedPortSize {
                    component_id: component.id.clone(),
                    value: text.to_string(),
                }),
            }
        }

        let d = self.settings.default_line_diameter_m;
        warnings.push(ComputationWarning::DefaultLineDiameter {
            component_id: component.id.clone(),
            diameter_m: d,
        });
        (d, DiameterSource::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hf_graph::{ConnectionType, FlowTracer, Relationship, SchematicBuilder};

    fn chain(line: Option<f64>) -> SchematicGraph {
        let mut b = SchematicBuilder::new("s", "m");
        b.add_component(Component::new("P1", ComponentType::Pump))
            .add_component(Component::new("V12", ComponentType::Valve))
            .add_component(Component::new("H203", ComponentType::Cylinder));
        let mut first = Relationship::new("P1", "V12", ConnectionType::Supply);
        if let Some(d) = line {
            first = first.with_line_size(d);
        }
        b.add_relationship(first)
            .add_relationship(Relationship::new("V12", "H203", ConnectionType::Supply));
        b.build().unwrap()
    }

    fn evaluate(g: &SchematicGraph, settings: &AnalysisSettings) -> PathEvaluation {
        let path = FlowTracer::new(g, settings.trace_options())
            .find_path("P1", "H203", |c| settings.k_factors.nominal_k(c))
            .unwrap();
        let op = OperatingPoint::new(180.0, 180.0).unwrap();
        PressureDropCalculator::new(settings)
            .evaluate_path(g, &path, &op)
            .unwrap()
    }

    #[test]
    fn cumulative_is_sum_and_percentages_add_up() {
        let settings = AnalysisSettings::default();
        let eval = evaluate(&chain(Some(0.019)), &settings);

        let sum: f64 = eval.drops.iter().map(|d| d.pressure_drop_pa).sum();
        assert_eq!(eval.cumulative_drop_pa, sum);
        let pct: f64 = eval.drops.iter().map(|d| d.percent_of_total).sum();
        assert!((pct - 100.0).abs() < 1e-9);
        assert!((eval.efficiency - (1.0 - sum / 180e5)).abs() < 1e-12);
    }

    #[test]
    fn first_component_uses_leaving_line() {
        let settings = AnalysisSettings::default();
        let eval = evaluate(&chain(Some(0.019)), &settings);
        assert_eq!(eval.drops[0].diameter_m, 0.019);
        assert_eq!(eval.drops[0].diameter_source, DiameterSource::Line);
        assert_eq!(eval.drops[1].diameter_m, 0.019);
        // V12 -> H203 has no size
        assert_eq!(eval.drops[2].diameter_source, DiameterSource::Default);
        assert!(eval.warnings.iter().any(|w| matches!(
            w,
            ComputationWarning::DefaultLineDiameter { component_id, .. } if component_id == "H203"
        )));
    }

    #[test]
    fn port_size_spec_beats_default() {
        let settings = AnalysisSettings::default();
        let mut warnings = Vec::new();
        let calc = PressureDropCalculator::new(&settings);

        let sized = Component::new("F1", ComponentType::Filter).with_spec("port_size", "3/4\"");
        let (d, src) = calc.resolve_diameter(&sized, None, &mut warnings);
        assert!((d - 0.01905).abs() < 1e-12);
        assert_eq!(src, DiameterSource::PortSize);
        assert!(warnings.is_empty());

        let garbled = Component::new("F2", ComponentType::Filter).with_spec("size", "big");
        let (d, src) = calc.resolve_diameter(&garbled, Some(0.0), &mut warnings);
        assert_eq!(d, 0.0127);
        assert_eq!(src, DiameterSource::Default);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn losses_beyond_supply_warn_and_go_negative() {
        let settings = AnalysisSettings::default();
        // 2 mm lines at 180 LPM lose far more than 1 bar
        let g = chain(Some(0.002));
        let path = FlowTracer::new(&g, settings.trace_options())
            .find_path("P1", "V12", |_| 1.0)
            .unwrap();
        let op = OperatingPoint::new(180.0, 1.0).unwrap();
        let eval = PressureDropCalculator::new(&settings)
            .evaluate_path(&g, &path, &op)
            .unwrap();
        assert!(eval.efficiency < 0.0);
        assert!(eval.warnings.iter().any(|w| matches!(
            w,
            ComputationWarning::DropExceedsSystemPressure { .. }
        )));
    }

    #[test]
    fn bottleneck_and_worst_regime() {
        let settings = AnalysisSettings::default();
        let eval = evaluate(&chain(None), &settings);
        // Same diameter everywhere: the pump's fallback K ties the valve, first wins
        assert_eq!(eval.bottleneck().map(|d| d.component_id.as_str()), Some("P1"));
        assert_eq!(eval.worst_regime(), Some(FlowRegime::Turbulent));
    }
}
