//! Core schematic data structures.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use hf_core::{CompIdx, EdgeIdx};
use serde::{Deserialize, Serialize};

use crate::indexing::IdIndex;

/// Kind of hydraulic component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    Valve,
    Cylinder,
    Pump,
    Motor,
    Filter,
    Transducer,
    Manifold,
    Other,
}

impl ComponentType {
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Valve,
        ComponentType::Cylinder,
        ComponentType::Pump,
        ComponentType::Motor,
        ComponentType::Filter,
        ComponentType::Transducer,
        ComponentType::Manifold,
        ComponentType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Valve => "VALVE",
            ComponentType::Cylinder => "CYLINDER",
            ComponentType::Pump => "PUMP",
            ComponentType::Motor => "MOTOR",
            ComponentType::Filter => "FILTER",
            ComponentType::Transducer => "TRANSDUCER",
            ComponentType::Manifold => "MANIFOLD",
            ComponentType::Other => "OTHER",
        }
    }

    /// Parse a type label as extracted from a schematic.
    ///
    /// Matching is case-insensitive and accepts sub-typed labels such as
    /// `VALVE_CHECK`; anything unrecognised maps to [`ComponentType::Other`].
    pub fn parse(label: &str) -> Self {
        let upper = label.trim().to_ascii_uppercase();
        let head = upper.split(['_', ' ', '-']).next().unwrap_or("");
        ComponentType::ALL
            .into_iter()
            .find(|t| t.as_str() == head)
            .unwrap_or(ComponentType::Other)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way fluid moves relative to a relationship's recorded direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowOrientation {
    /// Flow runs source → dest.
    Forward,
    /// Flow runs dest → source.
    Reverse,
}

/// Hydraulic line role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionType {
    Supply,
    Return,
    Pilot,
    Drain,
    Control,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 5] = [
        ConnectionType::Supply,
        ConnectionType::Return,
        ConnectionType::Pilot,
        ConnectionType::Drain,
        ConnectionType::Control,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionType::Supply => "SUPPLY",
            ConnectionType::Return => "RETURN",
            ConnectionType::Pilot => "PILOT",
            ConnectionType::Drain => "DRAIN",
            ConnectionType::Control => "CONTROL",
        }
    }

    /// Case-insensitive parse; `None` for labels outside the known set.
    pub fn parse(label: &str) -> Option<Self> {
        let upper = label.trim().to_ascii_uppercase();
        ConnectionType::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
    }

    /// Return and drain lines are recorded consumer → tank side, so flow
    /// traverses them against their recorded direction.
    pub fn flow_orientation(self) -> FlowOrientation {
        match self {
            ConnectionType::Supply | ConnectionType::Pilot | ConnectionType::Control => {
                FlowOrientation::Forward
            }
            ConnectionType::Return | ConnectionType::Drain => FlowOrientation::Reverse,
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hydraulic component extracted from a schematic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Schematic-local id, e.g. "V12".
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Open key → value map (rated flow, port size, valve type, ...).
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: ComponentType) -> Self {
        Self {
            id: id.into(),
            kind,
            grid_location: None,
            description: None,
            specifications: BTreeMap::new(),
        }
    }

    pub fn with_grid_location(mut self, location: impl Into<String>) -> Self {
        self.grid_location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_spec(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.specifications.insert(key.into(), value.into());
        self
    }

    /// Look up a specification value, ignoring key case.
    pub fn spec(&self, key: &str) -> Option<&str> {
        self.specifications
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// A line between two components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub dest_id: String,
    pub connection_type: ConnectionType,
    /// Line inner diameter in metres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_size_m: Option<f64>,
    /// Whether the recorded direction is known. Undirected lines are
    /// reported as diagnostics and skipped by flow tracing unless enabled.
    #[serde(default = "default_directed")]
    pub directed: bool,
}

fn default_directed() -> bool {
    true
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        dest_id: impl Into<String>,
        connection_type: ConnectionType,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            dest_id: dest_id.into(),
            connection_type,
            line_size_m: None,
            directed: true,
        }
    }

    pub fn with_line_size(mut self, diameter_m: f64) -> Self {
        self.line_size_m = Some(diameter_m);
        self
    }

    pub fn undirected(mut self) -> Self {
        self.directed = false;
        self
    }

    /// Line size if present and strictly positive.
    pub fn usable_line_size(&self) -> Option<f64> {
        self.line_size_m.filter(|d| *d > 0.0)
    }
}

/// A relationship resolved to arena indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeIdx,
    pub source: CompIdx,
    pub dest: CompIdx,
}

/// One hop of flow adjacency: follow `edge` to reach `neighbor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStep {
    pub edge: EdgeIdx,
    pub neighbor: CompIdx,
    /// The underlying relationship had no known direction.
    pub undirected: bool,
}

/// Load-time findings that don't prevent analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnostic {
    UndirectedRelationship {
        source_id: String,
        dest_id: String,
        connection_type: ConnectionType,
    },
    SelfLoop {
        component_id: String,
    },
    IsolatedComponent {
        component_id: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UndirectedRelationship {
                source_id,
                dest_id,
                connection_type,
            } => write!(
                f,
                "{connection_type} line {source_id} -- {dest_id} has no flow direction"
            ),
            Diagnostic::SelfLoop { component_id } => {
                write!(f, "Component {component_id} is connected to itself")
            }
            Diagnostic::IsolatedComponent { component_id } => {
                write!(f, "Component {component_id} has no connections")
            }
        }
    }
}

/// The schematic graph: a validated, immutable snapshot of one schematic version.
///
/// The graph stores:
/// - Components in an arena indexed by [`CompIdx`], relationships by [`EdgeIdx`].
/// - Compact flow adjacency in both directions: for each component, the
///   steps that move with the flow (downstream) and against it (upstream).
///
/// Re-analysis of a schematic produces a new graph with a higher version;
/// a graph is never modified after `build()`.
#[derive(Debug, Clone)]
pub struct SchematicGraph {
    pub(crate) schematic_id: String,
    pub(crate) machine_name: String,
    pub(crate) version: u64,
    pub(crate) created_at: DateTime<Utc>,

    pub(crate) components: Vec<Component>,
    pub(crate) relationships: Vec<Relationship>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) index: IdIndex,

    /// Component i's downstream steps are in downstream[downstream_offsets[i]..downstream_offsets[i+1]].
    pub(crate) downstream_offsets: Vec<usize>,
    pub(crate) downstream: Vec<FlowStep>,
    pub(crate) upstream_offsets: Vec<usize>,
    pub(crate) upstream: Vec<FlowStep>,

    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl SchematicGraph {
    pub fn schematic_id(&self) -> &str {
        &self.schematic_id
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Return all components in arena order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Return all relationships in input order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Return all edges (relationships resolved to indices).
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn index(&self) -> &IdIndex {
        &self.index
    }

    /// Get a component by index (None if out of bounds).
    pub fn component(&self, idx: CompIdx) -> Option<&Component> {
        self.components.get(idx.slot())
    }

    /// Get a relationship by edge index (None if out of bounds).
    pub fn relationship(&self, idx: EdgeIdx) -> Option<&Relationship> {
        self.relationships.get(idx.slot())
    }

    pub fn edge(&self, idx: EdgeIdx) -> Option<&Edge> {
        self.edges.get(idx.slot())
    }

    /// Resolve a schematic-local id to its arena index.
    pub fn idx_of(&self, id: &str) -> Option<CompIdx> {
        self.index.get(id)
    }

    pub fn component_by_id(&self, id: &str) -> Option<&Component> {
        self.idx_of(id).and_then(|idx| self.component(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.get(id).is_some()
    }

    /// The id string for an index; empty if out of bounds.
    pub fn id_of(&self, idx: CompIdx) -> &str {
        self.component(idx).map(|c| c.id.as_str()).unwrap_or("")
    }

    /// Steps that follow the flow out of a component.
    pub fn downstream_of(&self, idx: CompIdx) -> &[FlowStep] {
        Self::slice(&self.downstream_offsets, &self.downstream, idx)
    }

    /// Steps that go against the flow into a component.
    pub fn upstream_of(&self, idx: CompIdx) -> &[FlowStep] {
        Self::slice(&self.upstream_offsets, &self.upstream, idx)
    }

    /// The edge joining `from` to `to` in flow direction, if any.
    pub fn flow_edge_between(&self, from: CompIdx, to: CompIdx) -> Option<EdgeIdx> {
        self.downstream_of(from)
            .iter()
            .find(|s| s.neighbor == to)
            .map(|s| s.edge)
    }

    fn slice<'a>(offsets: &[usize], steps: &'a [FlowStep], idx: CompIdx) -> &'a [FlowStep] {
        let i = idx.slot();
        if i + 1 >= offsets.len() {
            return &[];
        }
        &steps[offsets[i]..offsets[i + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_parse_accepts_subtypes() {
        assert_eq!(ComponentType::parse("valve"), ComponentType::Valve);
        assert_eq!(ComponentType::parse("VALVE_CHECK"), ComponentType::Valve);
        assert_eq!(ComponentType::parse(" Pump "), ComponentType::Pump);
        assert_eq!(ComponentType::parse("ELBOW_90"), ComponentType::Other);
        assert_eq!(ComponentType::parse(""), ComponentType::Other);
    }

    #[test]
    fn connection_orientation() {
        assert_eq!(
            ConnectionType::Supply.flow_orientation(),
            FlowOrientation::Forward
        );
        assert_eq!(
            ConnectionType::Control.flow_orientation(),
            FlowOrientation::Forward
        );
        assert_eq!(
            ConnectionType::Return.flow_orientation(),
            FlowOrientation::Reverse
        );
        assert_eq!(ConnectionType::parse("drain"), Some(ConnectionType::Drain));
        assert_eq!(ConnectionType::parse("CONNECTS_TO"), None);
    }

    #[test]
    fn component_spec_lookup_ignores_case() {
        let comp = Component::new("V1", ComponentType::Valve).with_spec("Port_Size", "1/2\"");
        assert_eq!(comp.spec("port_size"), Some("1/2\""));
        assert_eq!(comp.spec("size"), None);
    }

    #[test]
    fn usable_line_size_filters_zero() {
        let r = Relationship::new("A", "B", ConnectionType::Supply).with_line_size(0.0);
        assert_eq!(r.usable_line_size(), None);
        let r = r.with_line_size(0.0127);
        assert_eq!(r.usable_line_size(), Some(0.0127));
        assert!(Relationship::new("A", "B", ConnectionType::Supply).directed);
    }
}
