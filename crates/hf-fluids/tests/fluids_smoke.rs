//! Smoke tests for hf-fluids.

use hf_core::units::{lpm, m};
use hf_fluids::{FlowRegime, FluidProfile, Quantity, RegimeThresholds, parse_quantity, velocity};
use proptest::prelude::*;

#[test]
fn half_inch_line_at_180_lpm_is_turbulent() {
    let oil = FluidProfile::iso_vg46();
    let d = m(parse_quantity("1/2\"", Quantity::Diameter).unwrap());
    let v = velocity(lpm(180.0), d).unwrap();
    assert!(v.value > 23.0 && v.value < 24.0);
    let re = oil.reynolds(v, d);
    assert_eq!(RegimeThresholds::default().classify(re), FlowRegime::Turbulent);
}

#[test]
fn millimetre_and_inch_notations_agree() {
    let a = parse_quantity("12.7mm", Quantity::Diameter).unwrap();
    let b = parse_quantity("0.5in", Quantity::Diameter).unwrap();
    assert!((a - b).abs() < 1e-12);
}

proptest! {
    #[test]
    fn reynolds_grows_with_flow(q in 1.0f64..500.0, extra in 0.1f64..100.0, d_mm in 4.0f64..50.0) {
        let oil = FluidProfile::iso_vg46();
        let d = m(d_mm / 1000.0);
        let lo = oil.reynolds(velocity(lpm(q), d).unwrap(), d);
        let hi = oil.reynolds(velocity(lpm(q + extra), d).unwrap(), d);
        prop_assert!(hi > lo);
        prop_assert!(RegimeThresholds::default().classify(hi) >= RegimeThresholds::default().classify(lo));
    }

    #[test]
    fn millimetre_sizes_parse_exactly(d_mm in 0.5f64..500.0) {
        let parsed = parse_quantity(&format!("{d_mm}mm"), Quantity::Diameter).unwrap();
        prop_assert!((parsed - d_mm / 1000.0).abs() < 1e-12);
    }
}
