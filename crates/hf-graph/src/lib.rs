//! hf-graph: schematic graph layer for hydraflow.
//!
//! Provides:
//! - Schematic data structures (Component, Relationship, SchematicGraph)
//! - A builder that validates flat component/relationship lists and freezes
//!   them into an immutable, versioned graph
//! - Id indexing with nearest-match suggestions
//! - Flow tracing: shortest flow path and upstream/downstream impact
//!
//! # Example
//!
//! ```
//! use hf_graph::{Component, ComponentType, ConnectionType, Relationship, SchematicBuilder};
//!
//! let mut builder = SchematicBuilder::new("press-1", "Press 1");
//! builder
//!     .add_component(Component::new("P1", ComponentType::Pump))
//!     .add_component(Component::new("V12", ComponentType::Valve))
//!     .add_relationship(Relationship::new("P1", "V12", ConnectionType::Supply));
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.components().len(), 2);
//! assert_eq!(graph.relationships().len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod trace;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::SchematicBuilder;
pub use error::{GraphError, GraphResult, TraceError, TraceResult};
pub use graph::{
    Component, ComponentType, ConnectionType, Diagnostic, Edge, FlowOrientation, FlowStep,
    Relationship, SchematicGraph,
};
pub use indexing::{IdIndex, suggest};
pub use trace::{Direction, FlowPath, FlowTracer, Impact, Neighbor, Reach, TraceOptions};
