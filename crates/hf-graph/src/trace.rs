//! Flow tracing over a schematic snapshot.
//!
//! Traversal follows flow direction: supply, pilot and control lines forward,
//! return and drain lines against their recorded direction. Every search is
//! bounded by a maximum hop depth.

use std::collections::{BTreeSet, VecDeque};

use hf_core::{CompIdx, EdgeIdx};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TraceError, TraceResult};
use crate::graph::{Component, ConnectionType, FlowStep, SchematicGraph};

/// Number of nearest-id suggestions attached to a not-found error.
const SUGGESTION_LIMIT: usize = 3;

/// Tolerance when comparing nominal resistances of equal-hop candidates.
const COST_EPS: f64 = 1e-12;

/// Traversal bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceOptions {
    /// Maximum number of hops explored from the origin.
    pub max_depth: usize,
    /// Follow relationships whose direction is unknown (both ways).
    pub include_undirected: bool,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            max_depth: 20,
            include_undirected: false,
        }
    }
}

/// Search direction relative to flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Downstream,
    Upstream,
}

/// A traced simple path, as arena indices.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPath {
    /// Components in flow order, no repeats.
    pub components: Vec<CompIdx>,
    /// `edges[i]` joins `components[i]` to `components[i + 1]`.
    pub edges: Vec<EdgeIdx>,
    /// Sum of the tie-break weights of every component on the path.
    pub nominal_resistance: f64,
}

impl FlowPath {
    pub fn hops(&self) -> usize {
        self.edges.len()
    }

    /// Component ids in flow order.
    pub fn ids(&self, graph: &SchematicGraph) -> Vec<String> {
        self.components
            .iter()
            .map(|idx| graph.id_of(*idx).to_string())
            .collect()
    }
}

/// Components reachable from an origin, excluding the origin itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reach {
    pub members: Vec<CompIdx>,
    /// Some component at the depth bound still had unexplored neighbours.
    pub truncated: bool,
}

/// A directly connected neighbour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub component_id: String,
    pub connection_type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_size_m: Option<f64>,
}

/// Upstream/downstream reachability of one component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub component_id: String,
    /// Everything that can feed this component.
    pub upstream: BTreeSet<String>,
    /// Everything this component can feed.
    pub downstream: BTreeSet<String>,
    pub immediate_upstream: Vec<Neighbor>,
    pub immediate_downstream: Vec<Neighbor>,
    /// Either set was cut off by the depth bound.
    pub truncated: bool,
}

/// Read-only tracer bound to one schematic snapshot.
#[derive(Debug, Clone, Copy)]
pub struct FlowTracer<'g> {
    graph: &'g SchematicGraph,
    options: TraceOptions,
}

impl<'g> FlowTracer<'g> {
    pub fn new(graph: &'g SchematicGraph, options: TraceOptions) -> Self {
        Self { graph, options }
    }

    pub fn options(&self) -> TraceOptions {
        self.options
    }

    /// Resolve an id or fail with nearest-match suggestions.
    pub fn resolve(&self, id: &str) -> TraceResult<CompIdx> {
        self.graph.idx_of(id).ok_or_else(|| TraceError::NotFound {
            id: id.to_string(),
            suggestions: self.graph.index().suggest(id, SUGGESTION_LIMIT),
        })
    }

    /// Find the flow path from `start` to `end`.
    ///
    /// Breadth-first search minimises hop count; among equal-hop candidates
    /// the path with the lowest sum of `weight` over its components wins
    /// (earlier edges win exact ties). The result is always a simple path.
    pub fn find_path<W>(&self, start: &str, end: &str, weight: W) -> TraceResult<FlowPath>
    where
        W: Fn(&Component) -> f64,
    {
        let start_idx = self.resolve(start)?;
        let end_idx = self.resolve(end)?;

        let n = self.graph.components().len();
        let weights: Vec<f64> = self.graph.components().iter().map(&weight).collect();

        let mut dist: Vec<Option<usize>> = vec![None; n];
        let mut cost = vec![f64::INFINITY; n];
        let mut pred: Vec<Option<(CompIdx, EdgeIdx)>> = vec![None; n];
        let mut queue = VecDeque::new();

        dist[start_idx.slot()] = Some(0);
        cost[start_idx.slot()] = weights[start_idx.slot()];
        queue.push_back(start_idx);

        // Layers are popped in order, so a node's cost is final before it is expanded
        while let Some(u) = queue.pop_front() {
            let du = dist[u.slot()].unwrap_or(0);
            if u == end_idx || du >= self.options.max_depth {
                continue;
            }
            if let Some(de) = dist[end_idx.slot()]
                && du >= de
            {
                continue;
            }

            for step in self.steps(u, Direction::Downstream) {
                let v = step.neighbor.slot();
                let candidate = cost[u.slot()] + weights[v];
                match dist[v] {
                    None => {
                        dist[v] = Some(du + 1);
                        cost[v] = candidate;
                        pred[v] = Some((u, step.edge));
                        queue.push_back(step.neighbor);
                    }
                    Some(dv) if dv == du + 1 && candidate + COST_EPS < cost[v] => {
                        cost[v] = candidate;
                        pred[v] = Some((u, step.edge));
                    }
                    _ => {}
                }
            }
        }

        if dist[end_idx.slot()].is_none() {
            let forward = self.reachable(start_idx, Direction::Downstream);
            let backward = self.reachable(end_idx, Direction::Upstream);
            return Err(TraceError::NoPath {
                start: start.to_string(),
                end: end.to_string(),
                forward_reachable: self.sorted_ids(&forward.members),
                backward_reachable: self.sorted_ids(&backward.members),
                depth_limited: forward.truncated || backward.truncated,
            });
        }

        let mut components = vec![end_idx];
        let mut edges = Vec::new();
        let mut cursor = end_idx;
        while let Some((prev, edge)) = pred[cursor.slot()] {
            components.push(prev);
            edges.push(edge);
            cursor = prev;
        }
        components.reverse();
        edges.reverse();

        let path = FlowPath {
            components,
            edges,
            nominal_resistance: cost[end_idx.slot()],
        };
        debug!(
            schematic = %self.graph.schematic_id(),
            start,
            end,
            hops = path.hops(),
            nominal_resistance = path.nominal_resistance,
            "flow path traced"
        );
        Ok(path)
    }

    /// Upstream and downstream sets of a component, excluding itself.
    pub fn impact(&self, id: &str) -> TraceResult<Impact> {
        let idx = self.resolve(id)?;
        let down = self.reachable(idx, Direction::Downstream);
        let up = self.reachable(idx, Direction::Upstream);

        Ok(Impact {
            component_id: id.to_string(),
            upstream: up.members.iter().map(|c| self.graph.id_of(*c).to_string()).collect(),
            downstream: down
                .members
                .iter()
                .map(|c| self.graph.id_of(*c).to_string())
                .collect(),
            immediate_upstream: self.neighbors(idx, Direction::Upstream),
            immediate_downstream: self.neighbors(idx, Direction::Downstream),
            truncated: up.truncated || down.truncated,
        })
    }

    /// Bounded breadth-first reachability from `origin`.
    pub fn reachable(&self, origin: CompIdx, direction: Direction) -> Reach {
        let n = self.graph.components().len();
        let mut depth: Vec<Option<usize>> = vec![None; n];
        let mut queue = VecDeque::new();
        let mut members = Vec::new();
        let mut truncated = false;

        depth[origin.slot()] = Some(0);
        queue.push_back(origin);

        while let Some(u) = queue.pop_front() {
            let du = depth[u.slot()].unwrap_or(0);
            for step in self.steps(u, direction) {
                let v = step.neighbor.slot();
                if depth[v].is_some() {
                    continue;
                }
                if du >= self.options.max_depth {
                    truncated = true;
                    continue;
                }
                depth[v] = Some(du + 1);
                members.push(step.neighbor);
                queue.push_back(step.neighbor);
            }
        }

        Reach { members, truncated }
    }

    fn neighbors(&self, idx: CompIdx, direction: Direction) -> Vec<Neighbor> {
        self.steps(idx, direction)
            .filter_map(|step| {
                let rel = self.graph.relationship(step.edge)?;
                Some(Neighbor {
                    component_id: self.graph.id_of(step.neighbor).to_string(),
                    connection_type: rel.connection_type,
                    line_size_m: rel.line_size_m,
                })
            })
            .collect()
    }

    fn steps(&self, idx: CompIdx, direction: Direction) -> impl Iterator<Item = &'g FlowStep> + '_ {
        let steps = match direction {
            Direction::Downstream => self.graph.downstream_of(idx),
            Direction::Upstream => self.graph.upstream_of(idx),
        };
        let include_undirected = self.options.include_undirected;
        steps
            .iter()
            .filter(move |s| include_undirected || !s.undirected)
    }

    fn sorted_ids(&self, members: &[CompIdx]) -> Vec<String> {
        let mut ids: Vec<String> = members
            .iter()
            .map(|c| self.graph.id_of(*c).to_string())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SchematicBuilder;
    use crate::graph::{Component, ComponentType, Relationship};

    fn chain() -> SchematicGraph {
        let mut b = SchematicBuilder::new("s", "m");
        for (id, kind) in [
            ("P1", ComponentType::Pump),
            ("V12", ComponentType::Valve),
            ("H203", ComponentType::Cylinder),
            ("T1", ComponentType::Other),
        ] {
            b.add_component(Component::new(id, kind));
        }
        b.add_relationship(Relationship::new("P1", "V12", ConnectionType::Supply))
            .add_relationship(Relationship::new("V12", "H203", ConnectionType::Supply))
            .add_relationship(Relationship::new("T1", "H203", ConnectionType::Return));
        b.build().unwrap()
    }

    #[test]
    fn finds_simple_chain() {
        let g = chain();
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        let path = tracer.find_path("P1", "T1", |_| 1.0).unwrap();
        assert_eq!(path.ids(&g), vec!["P1", "V12", "H203", "T1"]);
        assert_eq!(path.hops(), 3);
        assert_eq!(path.nominal_resistance, 4.0);
    }

    #[test]
    fn start_equals_end_is_single_component() {
        let g = chain();
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        let path = tracer.find_path("V12", "V12", |_| 2.0).unwrap();
        assert_eq!(path.ids(&g), vec!["V12"]);
        assert!(path.edges.is_empty());
    }

    #[test]
    fn against_flow_is_no_path() {
        let g = chain();
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        let err = tracer.find_path("H203", "P1", |_| 1.0).unwrap_err();
        match err {
            TraceError::NoPath {
                forward_reachable,
                backward_reachable,
                depth_limited,
                ..
            } => {
                assert_eq!(forward_reachable, vec!["T1"]);
                assert!(backward_reachable.is_empty());
                assert!(!depth_limited);
            }
            other => panic!("expected NoPath, got {other:?}"),
        }
    }

    #[test]
    fn unknown_id_suggests() {
        let g = chain();
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        let err = tracer.find_path("P1", "V21", |_| 1.0).unwrap_err();
        match err {
            TraceError::NotFound { id, suggestions } => {
                assert_eq!(id, "V21");
                assert!(suggestions.contains(&"V12".to_string()));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn depth_bound_limits_search() {
        let g = chain();
        let tracer = FlowTracer::new(
            &g,
            TraceOptions {
                max_depth: 1,
                include_undirected: false,
            },
        );
        let err = tracer.find_path("P1", "H203", |_| 1.0).unwrap_err();
        assert!(matches!(
            err,
            TraceError::NoPath {
                depth_limited: true,
                ..
            }
        ));
    }

    #[test]
    fn impact_excludes_self() {
        let g = chain();
        let tracer = FlowTracer::new(&g, TraceOptions::default());
        let impact = tracer.impact("V12").unwrap();
        assert_eq!(
            impact.upstream.iter().collect::<Vec<_>>(),
            vec!["P1"]
        );
        assert_eq!(
            impact.downstream.iter().collect::<Vec<_>>(),
            vec!["H203", "T1"]
        );
        assert_eq!(impact.immediate_downstream.len(), 1);
        assert_eq!(impact.immediate_downstream[0].component_id, "H203");
        assert!(!impact.truncated);
    }
}
