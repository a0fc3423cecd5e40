//! Resistance coefficients by component type.

use std::collections::BTreeMap;

use hf_graph::{Component, ComponentType};
use serde::{Deserialize, Serialize};

use crate::warning::ComputationWarning;

/// Specification key selecting a valve sub-type.
pub const VALVE_TYPE_KEY: &str = "valve_type";
/// Specification key selecting a fitting kind on OTHER components.
pub const FITTING_KEY: &str = "fitting";

/// Where a looked-up K-factor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KSource {
    ValveSubtype,
    Fitting,
    ComponentType,
    Fallback,
}

/// A K-factor together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct KLookup {
    pub k: f64,
    pub source: KSource,
    /// Set when the fallback was used.
    pub warning: Option<ComputationWarning>,
}

/// K-factor table: per component type, refined by valve sub-type and fitting kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KFactorTable {
    pub by_type: BTreeMap<ComponentType, f64>,
    /// Lower-case valve sub-type → K.
    pub valve_subtypes: BTreeMap<String, f64>,
    /// Lower-case fitting kind → K.
    pub fittings: BTreeMap<String, f64>,
    /// K for types with no entry.
    pub fallback: f64,
}

impl Default for KFactorTable {
    fn default() -> Self {
        let by_type = BTreeMap::from([
            (ComponentType::Valve, 3.0),
            (ComponentType::Filter, 5.0),
            (ComponentType::Cylinder, 0.5),
            (ComponentType::Manifold, 2.0),
        ]);
        let valve_subtypes = [
            ("ball", 0.1),
            ("check", 2.0),
            ("proportional", 1.5),
            ("directional", 3.0),
            ("relief", 0.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let fittings = [("elbow_90", 0.9), ("tee_branch", 1.8)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        Self {
            by_type,
            valve_subtypes,
            fittings,
            fallback: 3.0,
        }
    }
}

impl KFactorTable {
    /// Look up the K-factor for a component.
    ///
    /// Valves consult their `valve_type` specification first, OTHER components
    /// their `fitting` specification; then the per-type entry applies, then the
    /// fallback (with a [`ComputationWarning::DefaultKFactor`]).
    pub fn lookup(&self, component: &Component) -> KLookup {
        let refined = match component.kind {
            ComponentType::Valve => component
                .spec(VALVE_TYPE_KEY)
                .and_then(|v| match_label(&self.valve_subtypes, v))
                .map(|k| (k, KSource::ValveSubtype)),
            ComponentType::Other => component
                .spec(FITTING_KEY)
                .and_then(|v| match_label(&self.fittings, v))
                .map(|k| (k, KSource::Fitting)),
            _ => None,
        };
        if let Some((k, source)) = refined {
            return KLookup {
                k,
                source,
                warning: None,
            };
        }

        if let Some(k) = self.by_type.get(&component.kind) {
            return KLookup {
                k: *k,
                source: KSource::ComponentType,
                warning: None,
            };
        }

        KLookup {
            k: self.fallback,
            source: KSource::Fallback,
            warning: Some(ComputationWarning::DefaultKFactor {
                component_id: component.id.clone(),
                component_type: component.kind,
                k: self.fallback,
            }),
        }
    }

    /// K-factor only, for weighting path searches.
    pub fn nominal_k(&self, component: &Component) -> f64 {
        self.lookup(component).k
    }

    /// All values finite and not negative.
    pub fn is_valid(&self) -> bool {
        let ok = |k: &f64| k.is_finite() && *k >= 0.0;
        ok(&self.fallback)
            && self.by_type.values().all(ok)
            && self.valve_subtypes.values().all(ok)
            && self.fittings.values().all(ok)
    }
}

/// Exact match on the normalised label, else the first table key appearing as
/// a word of it ("Check Valve" → "check").
fn match_label(table: &BTreeMap<String, f64>, label: &str) -> Option<f64> {
    let norm = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    if let Some(k) = table.get(&norm) {
        return Some(*k);
    }
    norm.split('_')
        .find_map(|word| table.get(word))
        .copied()
}
