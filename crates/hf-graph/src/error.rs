//! Graph-specific error types.

use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;
pub type TraceResult<T> = Result<T, TraceError>;

/// Schematic construction and validation errors.
///
/// All of these are raised by [`crate::SchematicBuilder::build`], before any
/// analysis can run against the schematic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A component has an empty id.
    #[error("Component at position {position} in schematic '{schematic_id}' has an empty id")]
    EmptyComponentId {
        schematic_id: String,
        position: usize,
    },

    /// Two components share the same id.
    #[error("Duplicate component id '{id}' in schematic '{schematic_id}'")]
    DuplicateComponent { schematic_id: String, id: String },

    /// A relationship endpoint names a component that doesn't exist.
    #[error(
        "Relationship {position} in schematic '{schematic_id}' references unknown {end} component '{id}'"
    )]
    UnknownEndpoint {
        schematic_id: String,
        position: usize,
        end: &'static str,
        id: String,
    },

    /// A relationship carries a negative or non-finite line size.
    #[error("Relationship {source_id} -> {dest_id} has invalid line size {value}")]
    InvalidLineSize {
        source_id: String,
        dest_id: String,
        value: f64,
    },

    /// The schematic exceeds the arena's index range.
    #[error("Schematic '{schematic_id}' has too many {what}")]
    TooLarge {
        schematic_id: String,
        what: &'static str,
    },
}

/// Errors raised while tracing flow through a built schematic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraceError {
    /// The requested component id is not part of the schematic.
    #[error("Component '{id}' not found{}", format_suggestions(.suggestions))]
    NotFound { id: String, suggestions: Vec<String> },

    /// Both endpoints exist but no flow-compatible path joins them.
    #[error(
        "No flow path from '{start}' to '{end}' ({} reachable downstream of start, {} reachable upstream of end{})",
        count(.forward_reachable),
        count(.backward_reachable),
        depth_note(.depth_limited)
    )]
    NoPath {
        start: String,
        end: String,
        forward_reachable: Vec<String>,
        backward_reachable: Vec<String>,
        depth_limited: bool,
    },
}

fn count(ids: &[String]) -> usize {
    ids.len()
}

fn depth_note(limited: &bool) -> &'static str {
    if *limited {
        ", search was depth-limited"
    } else {
        ""
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}
