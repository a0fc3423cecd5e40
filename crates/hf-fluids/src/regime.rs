//! Flow regime classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Flow regime from the Reynolds number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowRegime {
    Laminar,
    Transitional,
    Turbulent,
}

impl FlowRegime {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowRegime::Laminar => "LAMINAR",
            FlowRegime::Transitional => "TRANSITIONAL",
            FlowRegime::Turbulent => "TURBULENT",
        }
    }
}

impl fmt::Display for FlowRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reynolds cutoffs between regimes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    /// Below this the flow is laminar.
    pub laminar: f64,
    /// Above this the flow is turbulent.
    pub turbulent: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            laminar: 2300.0,
            turbulent: 4000.0,
        }
    }
}

impl RegimeThresholds {
    /// `Re < laminar` laminar, `Re > turbulent` turbulent, transitional between (inclusive).
    pub fn classify(&self, re: f64) -> FlowRegime {
        if re < self.laminar {
            FlowRegime::Laminar
        } else if re > self.turbulent {
            FlowRegime::Turbulent
        } else {
            FlowRegime::Transitional
        }
    }
}
