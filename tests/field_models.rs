//! Consistency of the field-strength models on analytic configurations.

use fluxkit::field::{FieldStrength, FieldStrengthModel};
use fluxkit::mesher::FieldPoint;
use std::f64::consts::PI;

fn filament(x: f64, y: f64, current: f64, length: f64) -> FieldPoint {
    let mut point = FieldPoint::at(x, y);
    point.value = current;
    point.turn_length = Some(length);
    point
}

#[test]
fn opposite_filaments_agree_across_models() {
    // two filaments of equal and opposite current; |H| at the point
    // sitting at distance d from both is I/(π·d)
    let current = 1.5;
    let distance = 3e-3;
    // a turn much longer than the spacing makes the finite-length
    // correction negligible
    let left = filament(-distance, 0.0, current, 10.0);
    let right = filament(distance, 0.0, -current, 10.0);
    let midpoint = FieldPoint::at(0.0, 0.0);
    let expected = current / (PI * distance);

    for key in ["binns_lawrenson", "lammeraner", "albach"] {
        let model = FieldStrengthModel::from_key(key).unwrap();
        let a = model.field_between(&left, &midpoint, None).unwrap();
        let b = model.field_between(&right, &midpoint, None).unwrap();
        let magnitude = (a.real + b.real).hypot(a.imaginary + b.imaginary);
        assert!(
            (magnitude - expected).abs() / expected < 0.01,
            "{key} gave {magnitude}, expected {expected}"
        );
    }
}

#[test]
fn field_decays_with_distance() {
    let source = filament(0.0, 0.0, 1.0, 10.0);
    let model = FieldStrengthModel::from_key("binns_lawrenson").unwrap();
    let near = model.field_between(&source, &FieldPoint::at(1e-3, 0.0), None).unwrap();
    let far = model.field_between(&source, &FieldPoint::at(4e-3, 0.0), None).unwrap();
    let near_magnitude = near.real.hypot(near.imaginary);
    let far_magnitude = far.real.hypot(far.imaginary);
    assert!((near_magnitude / far_magnitude - 4.0).abs() < 1e-9);
}

#[test]
fn unknown_model_keys_are_rejected() {
    assert!(FieldStrengthModel::from_key("dowell").is_err());
}
