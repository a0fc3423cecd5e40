//! Error types for the hf-app service layer.

use hf_analysis::AnalysisError;
use hf_components::ComponentError;
use hf_graph::{GraphError, TraceError};
use hf_project::{ProjectError, ValidationError};
use hf_results::ResultsError;

/// Single error type of the public operation surface.
///
/// `Validation`, `NotFound`, `NoPath` and `Configuration` are the analysis
/// outcomes callers branch on; the rest come from the project and storage
/// layers around the engine.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed schematic or project input; nothing was analysed.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{what} '{id}' not found{}", format_suggestions(.suggestions))]
    NotFound {
        what: &'static str,
        id: String,
        suggestions: Vec<String>,
    },

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

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hf-app operations.
pub type AppResult<T> = Result<T, AppError>;

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

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<TraceError> for AppError {
    fn from(err: TraceError) -> Self {
        match err {
            TraceError::NotFound { id, suggestions } => AppError::NotFound {
                what: "Component",
                id,
                suggestions,
            },
            TraceError::NoPath {
                start,
                end,
                forward_reachable,
                backward_reachable,
                depth_limited,
            } => AppError::NoPath {
                start,
                end,
                forward_reachable,
                backward_reachable,
                depth_limited,
            },
        }
    }
}

impl From<ComponentError> for AppError {
    fn from(err: ComponentError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Configuration { what } => AppError::Configuration(what),
            AnalysisError::Trace(e) => e.into(),
            AnalysisError::Component(e) => e.into(),
        }
    }
}

impl From<ProjectError> for AppError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::Io(e) => AppError::Io(e),
            ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ResultsError> for AppError {
    fn from(err: ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
