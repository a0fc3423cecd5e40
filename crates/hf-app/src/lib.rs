//! Shared application service layer for hydraflow.
//!
//! Fronts the analysis crates for the CLI and any other caller: compiles
//! project files into settings and graphs, keeps the registry of versioned
//! schematics, and serves the public operations through the result cache and
//! an optional persistence hook.

pub mod compile;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod project_service;

// Re-export key types for convenience
pub use compile::{EngineConfig, compile_config, compile_operating_point, compile_schematic};
pub use engine::{AnalysisEngine, SchematicHandle};
pub use error::{AppError, AppResult};
pub use metrics::MetricsSnapshot;
pub use project_service::{
    SchematicDefSummary, engine_for_project, get_schematic, list_schematics, load_into,
    load_project, operating_point, save_project, validate_project,
};
