//! Non-fatal computation warnings.

use std::fmt;

use hf_graph::ComponentType;
use serde::{Deserialize, Serialize};

/// A caveat attached to a successful result.
///
/// Raised whenever a default stands in for missing input, so the numbers stay
/// usable but are known to be approximate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputationWarning {
    /// No usable line or port size; the default diameter was used.
    DefaultLineDiameter { component_id: String, diameter_m: f64 },
    /// A `port_size`/`size` specification could not be parsed.
    UnparsedPortSize { component_id: String, value: String },
    /// The component type has no K-factor entry; the fallback was used.
    DefaultKFactor {
        component_id: String,
        component_type: ComponentType,
        k: f64,
    },
    /// Losses along the path exceed the supply pressure.
    DropExceedsSystemPressure {
        cumulative_drop_pa: f64,
        system_pressure_pa: f64,
    },
}

impl ComputationWarning {
    /// Component the warning concerns, if any.
    pub fn component_id(&self) -> Option<&str> {
        match self {
            ComputationWarning::DefaultLineDiameter { component_id, .. }
            | ComputationWarning::UnparsedPortSize { component_id, .. }
            | ComputationWarning::DefaultKFactor { component_id, .. } => Some(component_id),
            ComputationWarning::DropExceedsSystemPressure { .. } => None,
        }
    }
}

impl fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputationWarning::DefaultLineDiameter {
                component_id,
                diameter_m,
            } => write!(
                f,
                "{component_id}: no line size, assumed {:.1} mm",
                diameter_m * 1000.0
            ),
            ComputationWarning::UnparsedPortSize {
                component_id,
                value,
            } => write!(f, "{component_id}: could not parse port size '{value}'"),
            ComputationWarning::DefaultKFactor {
                component_id,
                component_type,
                k,
            } => write!(
                f,
                "{component_id}: no K-factor for {component_type}, assumed K = {k}"
            ),
            ComputationWarning::DropExceedsSystemPressure {
                cumulative_drop_pa,
                system_pressure_pa,
            } => write!(
                f,
                "cumulative drop {:.2} bar exceeds system pressure {:.2} bar",
                cumulative_drop_pa / 1e5,
                system_pressure_pa / 1e5
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_component() {
        let w = ComputationWarning::DefaultLineDiameter {
            component_id: "V12".into(),
            diameter_m: 0.0127,
        };
        assert_eq!(w.to_string(), "V12: no line size, assumed 12.7 mm");
        assert_eq!(w.component_id(), Some("V12"));
    }

    #[test]
    fn serializes_with_kind_tag() {
        let w = ComputationWarning::DefaultKFactor {
            component_id: "P1".into(),
            component_type: ComponentType::Pump,
            k: 3.0,
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["kind"], "DEFAULT_K_FACTOR");
        assert_eq!(json["component_type"], "PUMP");
    }
}
