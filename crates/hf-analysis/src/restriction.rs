//! Restriction detection and severity ranking.
//!
//! Each component is measured against three thresholds (velocity, share of
//! the total pressure drop, Reynolds number) and each explicitly sized line
//! against the velocity threshold. Neighbouring flagged components are
//! escalated as series restrictions.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use hf_components::{ComputationWarning, FlowElement, LineSegment};
use hf_core::units::to_lpm;
use hf_core::units::{VolumeRate, m};
use hf_core::{CompIdx, EdgeIdx};
use hf_graph::{FlowPath, FlowStep, SchematicGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AnalysisResult;
use crate::pressure::{ComponentDrop, PathEvaluation, PressureDropCalculator};
use crate::settings::{AnalysisSettings, Thresholds};

/// What a restriction is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestrictionKind {
    HighPressureDrop,
    HighVelocity,
    TurbulentFlow,
    SeriesRestriction,
    UndersizedLine,
}

impl RestrictionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RestrictionKind::HighPressureDrop => "HIGH_PRESSURE_DROP",
            RestrictionKind::HighVelocity => "HIGH_VELOCITY",
            RestrictionKind::TurbulentFlow => "TURBULENT_FLOW",
            RestrictionKind::SeriesRestriction => "SERIES_RESTRICTION",
            RestrictionKind::UndersizedLine => "UNDERSIZED_LINE",
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered LOW < MEDIUM < HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
        })
    }
}

/// One measured value against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub kind: RestrictionKind,
    pub value: f64,
    pub threshold: f64,
}

impl Criterion {
    pub fn new(kind: RestrictionKind, value: f64, threshold: f64) -> Self {
        Self {
            kind,
            value,
            threshold,
        }
    }

    /// `value / threshold`; above 1 means exceeded.
    pub fn ratio(&self) -> f64 {
        self.value / self.threshold
    }

    fn describe(&self) -> String {
        let verb = if self.ratio() > 1.0 {
            "exceeds"
        } else {
            "is close to"
        };
        match self.kind {
            RestrictionKind::HighVelocity | RestrictionKind::UndersizedLine => format!(
                "velocity {:.2} m/s {verb} {:.2} m/s",
                self.value, self.threshold
            ),
            RestrictionKind::HighPressureDrop => format!(
                "{:.1}% of total pressure drop {verb} {:.1}%",
                self.value * 100.0,
                self.threshold * 100.0
            ),
            RestrictionKind::TurbulentFlow => format!(
                "Reynolds number {:.0} {verb} {:.0}",
                self.value, self.threshold
            ),
            RestrictionKind::SeriesRestriction => format!(
                "{} {verb} {}",
                self.value, self.threshold
            ),
        }
    }
}

/// Grade a set of measures.
///
/// HIGH when two or more thresholds are exceeded or any value exceeds
/// `severe_multiplier ×` its threshold; MEDIUM when exactly one is exceeded;
/// LOW when none is exceeded but one lies within the near-miss band below its
/// threshold. Returns the relevant criteria, largest ratio first.
pub fn classify(measures: &[Criterion], thresholds: &Thresholds) -> Option<(Severity, Vec<Criterion>)> {
    let by_ratio = |a: &Criterion, b: &Criterion| b.ratio().total_cmp(&a.ratio());

    let mut triggered: Vec<Criterion> = measures
        .iter()
        .filter(|c| c.ratio() > 1.0)
        .copied()
        .collect();
    if !triggered.is_empty() {
        triggered.sort_by(by_ratio);
        let severe = triggered.len() >= 2
            || triggered
                .iter()
                .any(|c| c.ratio() > thresholds.severe_multiplier);
        let severity = if severe {
            Severity::High
        } else {
            Severity::Medium
        };
        return Some((severity, triggered));
    }

    let mut near: Vec<Criterion> = measures
        .iter()
        .filter(|c| c.ratio() >= 1.0 - thresholds.near_miss_band)
        .copied()
        .collect();
    near.sort_by(by_ratio);
    (!near.is_empty()).then_some((Severity::Low, near))
}

/// The component, line or run of components a restriction refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum RestrictionTarget {
    Component { component_id: String },
    Line { source_id: String, dest_id: String },
    Series { component_ids: Vec<String> },
}

impl RestrictionTarget {
    /// Whether the target names `id`.
    pub fn involves(&self, id: &str) -> bool {
        match self {
            RestrictionTarget::Component { component_id } => component_id == id,
            RestrictionTarget::Line { source_id, dest_id } => source_id == id || dest_id == id,
            RestrictionTarget::Series { component_ids } => component_ids.iter().any(|c| c == id),
        }
    }
}

impl fmt::Display for RestrictionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestrictionTarget::Component { component_id } => f.write_str(component_id),
            RestrictionTarget::Line { source_id, dest_id } => {
                write!(f, "{source_id} -> {dest_id}")
            }
            RestrictionTarget::Series { component_ids } => {
                write!(f, "{}", component_ids.join(" -> "))
            }
        }
    }
}

/// A detected restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
    pub target: RestrictionTarget,
    /// Dominant kind: the criterion with the largest ratio.
    pub kind: RestrictionKind,
    pub severity: Severity,
    /// Every criterion that contributed, largest ratio first.
    pub criteria: Vec<Criterion>,
    /// Contribution to the total drop (sum of members for series).
    pub pressure_drop_pa: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_mps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reynolds: Option<f64>,
    pub detail: String,
}

/// Restriction counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn of(restrictions: &[Restriction]) -> Self {
        let mut counts = Self::default();
        for r in restrictions {
            match r.severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Schematic-wide detection outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestrictionReport {
    pub schematic_id: String,
    pub version: u64,
    pub flow_rate_lpm: f64,
    pub evaluated_components: usize,
    /// Sum of every component's drop, the base of each drop share.
    pub total_drop_pa: f64,
    /// Sorted by severity, then pressure-drop contribution.
    pub restrictions: Vec<Restriction>,
    pub counts: SeverityCounts,
    pub warnings: Vec<ComputationWarning>,
}

/// Threshold-based detector bound to one set of settings.
#[derive(Debug, Clone, Copy)]
pub struct RestrictionDetector<'a> {
    settings: &'a AnalysisSettings,
}

impl<'a> RestrictionDetector<'a> {
    pub fn new(settings: &'a AnalysisSettings) -> Self {
        Self { settings }
    }

    /// Restrictions along an evaluated path.
    ///
    /// Drop shares are relative to the path's cumulative drop; series are
    /// maximal runs of consecutive flagged components; only the path's own
    /// lines are checked for undersizing.
    pub fn detect_path(
        &self,
        graph: &SchematicGraph,
        path: &FlowPath,
        eval: &PathEvaluation,
        flow: VolumeRate,
    ) -> AnalysisResult<Vec<Restriction>> {
        let mut out = Vec::new();
        let mut flagged = Vec::with_capacity(eval.drops.len());

        for drop in &eval.drops {
            let r = self.component_restriction(drop, eval.cumulative_drop_pa);
            flagged.push(r.as_ref().is_some_and(|r| r.severity >= Severity::Medium));
            out.extend(r);
        }

        let mut run: Vec<usize> = Vec::new();
        for i in 0..=flagged.len() {
            if flagged.get(i).copied().unwrap_or(false) {
                run.push(i);
                continue;
            }
            if run.len() >= 2 {
                let members: Vec<&ComponentDrop> = run.iter().map(|&j| &eval.drops[j]).collect();
                let severities: Vec<Severity> = run
                    .iter()
                    .filter_map(|&j| severity_of(&out, &eval.drops[j].component_id))
                    .collect();
                out.push(series_restriction(&members, &severities));
            }
            run.clear();
        }

        for &edge in &path.edges {
            out.extend(self.line_restriction(graph, edge, flow)?);
        }

        sort_restrictions(&mut out);
        Ok(out)
    }

    /// Restrictions across a whole schematic at `flow`.
    ///
    /// Every component is evaluated, sized by its first sized incoming line,
    /// else its first sized outgoing line, else its port size or the default.
    /// Drop shares are relative to the sum over all components; series are
    /// connected groups of flagged components.
    pub fn detect_schematic(
        &self,
        graph: &SchematicGraph,
        flow: VolumeRate,
    ) -> AnalysisResult<RestrictionReport> {
        let calc = PressureDropCalculator::new(self.settings);
        let mut warnings = Vec::new();
        let mut drops = Vec::with_capacity(graph.components().len());

        for slot in 0..graph.components().len() {
            let Some(idx) = CompIdx::from_usize(slot) else {
                continue;
            };
            let line = self.sizing_line(graph, idx);
            drops.push(calc.evaluate_component(graph, idx, line, flow, &mut warnings)?);
        }

        let total_drop_pa: f64 = drops.iter().map(|d| d.pressure_drop_pa).sum();

        let mut out = Vec::new();
        let mut flagged = vec![false; drops.len()];
        for (slot, drop) in drops.iter().enumerate() {
            let r = self.component_restriction(drop, total_drop_pa);
            flagged[slot] = r.as_ref().is_some_and(|r| r.severity >= Severity::Medium);
            out.extend(r);
        }

        for group in self.flagged_groups(graph, &flagged) {
            let members: Vec<&ComponentDrop> = group.iter().map(|&s| &drops[s]).collect();
            let severities: Vec<Severity> = group
                .iter()
                .filter_map(|&s| severity_of(&out, &drops[s].component_id))
                .collect();
            out.push(series_restriction(&members, &severities));
        }

        for edge in graph.edges() {
            out.extend(self.line_restriction(graph, edge.id, flow)?);
        }

        sort_restrictions(&mut out);
        let counts = SeverityCounts::of(&out);
        debug!(
            schematic = %graph.schematic_id(),
            components = drops.len(),
            high = counts.high,
            medium = counts.medium,
            low = counts.low,
            "restrictions detected"
        );

        Ok(RestrictionReport {
            schematic_id: graph.schematic_id().to_string(),
            version: graph.version(),
            flow_rate_lpm: to_lpm(flow),
            evaluated_components: drops.len(),
            total_drop_pa,
            restrictions: out,
            counts,
            warnings,
        })
    }

    fn component_restriction(&self, drop: &ComponentDrop, total_drop_pa: f64) -> Option<Restriction> {
        let t = &self.settings.thresholds;
        let share = (total_drop_pa > 0.0).then(|| drop.pressure_drop_pa / total_drop_pa);

        let mut measures = vec![
            Criterion::new(RestrictionKind::HighVelocity, drop.velocity_mps, t.max_velocity_mps),
            Criterion::new(
                RestrictionKind::TurbulentFlow,
                drop.reynolds,
                self.settings.regimes.turbulent,
            ),
        ];
        if let Some(share) = share {
            measures.push(Criterion::new(
                RestrictionKind::HighPressureDrop,
                share,
                t.max_drop_fraction,
            ));
        }

        let (severity, criteria) = classify(&measures, t)?;
        let detail = criteria
            .iter()
            .map(Criterion::describe)
            .collect::<Vec<_>>()
            .join("; ");

        Some(Restriction {
            target: RestrictionTarget::Component {
                component_id: drop.component_id.clone(),
            },
            kind: criteria[0].kind,
            severity,
            criteria,
            pressure_drop_pa: drop.pressure_drop_pa,
            drop_fraction: share,
            velocity_mps: Some(drop.velocity_mps),
            reynolds: Some(drop.reynolds),
            detail,
        })
    }

    /// UNDERSIZED_LINE check for a relationship with an explicit size.
    fn line_restriction(
        &self,
        graph: &SchematicGraph,
        edge: EdgeIdx,
        flow: VolumeRate,
    ) -> AnalysisResult<Option<Restriction>> {
        let Some(rel) = graph.relationship(edge) else {
            return Ok(None);
        };
        let Some(d) = rel.usable_line_size() else {
            return Ok(None);
        };

        let name = format!("{} -> {}", rel.source_id, rel.dest_id);
        let state = LineSegment::new(name, m(d)).evaluate(
            &self.settings.fluid,
            &self.settings.regimes,
            flow,
        )?;
        let t = &self.settings.thresholds;
        let measures = [Criterion::new(
            RestrictionKind::UndersizedLine,
            state.velocity_mps,
            t.max_velocity_mps,
        )];

        let Some((severity, criteria)) = classify(&measures, t) else {
            return Ok(None);
        };
        let detail = format!(
            "{:.1} mm {} line: {}",
            d * 1000.0,
            rel.connection_type,
            criteria[0].describe()
        );

        Ok(Some(Restriction {
            target: RestrictionTarget::Line {
                source_id: rel.source_id.clone(),
                dest_id: rel.dest_id.clone(),
            },
            kind: RestrictionKind::UndersizedLine,
            severity,
            criteria,
            pressure_drop_pa: 0.0,
            drop_fraction: None,
            velocity_mps: Some(state.velocity_mps),
            reynolds: Some(state.reynolds),
            detail,
        }))
    }

    fn steps<'g>(&self, steps: &'g [FlowStep]) -> impl Iterator<Item = &'g FlowStep> + use<'g> {
        let include_undirected = self.settings.traverse_undirected;
        steps
            .iter()
            .filter(move |s| include_undirected || !s.undirected)
    }

    fn sizing_line(&self, graph: &SchematicGraph, idx: CompIdx) -> Option<EdgeIdx> {
        let sized = |s: &&FlowStep| {
            graph
                .relationship(s.edge)
                .and_then(|r| r.usable_line_size())
                .is_some()
        };
        self.steps(graph.upstream_of(idx))
            .find(sized)
            .or_else(|| self.steps(graph.downstream_of(idx)).find(sized))
            .map(|s| s.edge)
    }

    /// Weakly connected groups of two or more flagged components, in arena order.
    fn flagged_groups(&self, graph: &SchematicGraph, flagged: &[bool]) -> Vec<Vec<usize>> {
        let mut seen = vec![false; flagged.len()];
        let mut groups = Vec::new();

        for start in 0..flagged.len() {
            if !flagged[start] || seen[start] {
                continue;
            }
            seen[start] = true;
            let mut group = vec![start];
            let mut queue = VecDeque::from([start]);

            while let Some(u) = queue.pop_front() {
                let Some(idx) = CompIdx::from_usize(u) else {
                    continue;
                };
                let neighbours = self
                    .steps(graph.downstream_of(idx))
                    .chain(self.steps(graph.upstream_of(idx)));
                for step in neighbours {
                    let v = step.neighbor.slot();
                    if flagged[v] && !seen[v] {
                        seen[v] = true;
                        group.push(v);
                        queue.push_back(v);
                    }
                }
            }

            if group.len() >= 2 {
                group.sort_unstable();
                groups.push(group);
            }
        }
        groups
    }
}

fn severity_of(restrictions: &[Restriction], component_id: &str) -> Option<Severity> {
    restrictions.iter().find_map(|r| match &r.target {
        RestrictionTarget::Component { component_id: id } if id == component_id => {
            Some(r.severity)
        }
        _ => None,
    })
}

/// HIGH when any member is HIGH or three or more members are involved.
fn series_restriction(members: &[&ComponentDrop], severities: &[Severity]) -> Restriction {
    let severity = if members.len() >= 3 || severities.contains(&Severity::High) {
        Severity::High
    } else {
        Severity::Medium
    };
    let component_ids: Vec<String> = members.iter().map(|d| d.component_id.clone()).collect();
    let detail = format!(
        "{} restricted components in series: {}",
        members.len(),
        component_ids.join(" -> ")
    );

    Restriction {
        target: RestrictionTarget::Series { component_ids },
        kind: RestrictionKind::SeriesRestriction,
        severity,
        criteria: Vec::new(),
        pressure_drop_pa: members.iter().map(|d| d.pressure_drop_pa).sum(),
        drop_fraction: None,
        velocity_mps: None,
        reynolds: None,
        detail,
    }
}

/// Severity descending, then drop contribution descending; stable on ties.
fn sort_restrictions(restrictions: &mut [Restriction]) {
    restrictions.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| {
                b.pressure_drop_pa
                    .partial_cmp(&a.pressure_drop_pa)
                    .unwrap_or(Ordering::Equal)
            })
    });
}
