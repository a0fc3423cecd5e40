//! Cache key and cached value types.

use std::fmt;

use hf_analysis::{ComparisonResult, FlowPathResult, RestrictionReport, SchematicSummary};
use hf_graph::Impact;
use serde::{Deserialize, Serialize};

use crate::ResultsResult;
use crate::hash::params_digest;

/// Public operation a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    AnalyzeSchematic,
    FindFlowPath,
    AnalyzeRestrictions,
    ComponentImpact,
    CompareMachines,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::AnalyzeSchematic => "analyze_schematic",
            Operation::FindFlowPath => "find_flow_path",
            Operation::AnalyzeRestrictions => "analyze_restrictions",
            Operation::ComponentImpact => "component_impact",
            Operation::CompareMachines => "compare_machines",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(schematic, version, operation, parameters)` identity of a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub schematic_id: String,
    pub version: u64,
    pub operation: Operation,
    /// SHA-256 of the canonical JSON parameters.
    pub params_digest: String,
}

impl CacheKey {
    pub fn new<P: Serialize + ?Sized>(
        schematic_id: impl Into<String>,
        version: u64,
        operation: Operation,
        params: &P,
    ) -> ResultsResult<Self> {
        Ok(Self {
            schematic_id: schematic_id.into(),
            version,
            operation,
            params_digest: params_digest(params)?,
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.params_digest.get(..12).unwrap_or(&self.params_digest);
        write!(
            f,
            "{}@v{}/{}/{}",
            self.schematic_id, self.version, self.operation, short
        )
    }
}

/// Any memoised operation outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "result", rename_all = "snake_case")]
pub enum CachedResult {
    Summary(SchematicSummary),
    FlowPath(FlowPathResult),
    Restrictions(RestrictionReport),
    Impact(Impact),
    Comparison(ComparisonResult),
}

impl CachedResult {
    pub fn operation(&self) -> Operation {
        match self {
            CachedResult::Summary(_) => Operation::AnalyzeSchematic,
            CachedResult::FlowPath(_) => Operation::FindFlowPath,
            CachedResult::Restrictions(_) => Operation::AnalyzeRestrictions,
            CachedResult::Impact(_) => Operation::ComponentImpact,
            CachedResult::Comparison(_) => Operation::CompareMachines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_is_short() {
        let key = CacheKey::new("press", 3, Operation::FindFlowPath, &("P1", "H203")).unwrap();
        let shown = key.to_string();
        assert!(shown.starts_with("press@v3/find_flow_path/"));
        assert_eq!(shown.len(), "press@v3/find_flow_path/".len() + 12);
    }

    #[test]
    fn version_is_part_of_identity() {
        let v1 = CacheKey::new("press", 1, Operation::AnalyzeSchematic, &()).unwrap();
        let v2 = CacheKey::new("press", 2, Operation::AnalyzeSchematic, &()).unwrap();
        assert_ne!(v1, v2);
        assert_eq!(v1.params_digest, v2.params_digest);
    }
}
