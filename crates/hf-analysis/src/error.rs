//! Error types for analysis operations.

use hf_components::ComponentError;
use hf_graph::TraceError;
use thiserror::Error;

/// Errors that can occur during flow analysis.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid operating point or settings.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error("Component error: {0}")]
    Component(#[from] ComponentError),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        AnalysisError::Configuration { what: what.into() }
    }
}
