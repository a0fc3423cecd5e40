//! Flow analysis over schematic graphs.
//!
//! This crate turns a traced flow path or a whole schematic into engineering
//! numbers: per-component pressure drop from K-factors, flow regime from the
//! Reynolds number, path efficiency, and a severity-ranked list of
//! restrictions. Two schematics can be compared on the same operating point.
//!
//! Everything here is a pure function of an immutable graph snapshot and the
//! analysis settings, so analyses may run in parallel.

pub mod compare;
pub mod error;
pub mod path;
pub mod pressure;
pub mod restriction;
pub mod settings;
pub mod summary;

pub use compare::{
    Better, ComparisonResult, MetricComparison, PathComparison, SchematicProfile, TypeMismatch,
    compare_paths, compare_schematics,
};
pub use error::{AnalysisError, AnalysisResult};
pub use path::{FlowPathResult, analyze_path};
pub use pressure::{ComponentDrop, DiameterSource, PathEvaluation, PressureDropCalculator};
pub use restriction::{
    Criterion, Restriction, RestrictionDetector, RestrictionKind, RestrictionReport,
    RestrictionTarget, Severity, SeverityCounts, classify,
};
pub use settings::{AnalysisSettings, OperatingPoint, Thresholds, flow_from_lpm};
pub use summary::{SchematicInfo, SchematicSummary, summarize};
