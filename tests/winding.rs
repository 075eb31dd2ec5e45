//! Winding-loss seed scenarios and the properties of the loss stack.

use fluxkit::catalogue;
use fluxkit::coil::{Coil, IsolationSide, Winding};
use fluxkit::core::Core;
use fluxkit::magnetic::Magnetic;
use fluxkit::signal::{OperatingConditions, OperatingPoint, OperatingPointExcitation, SignalDescriptor};
use fluxkit::skin;
use fluxkit::winding_losses;
use fluxkit::wire::{RoundWire, Wire, WireCoating};

fn enamelled_round(diameter: f64) -> Wire {
    Wire::Round(RoundWire {
        conducting_diameter: diameter,
        material: "copper".to_owned(),
        coating: Some(WireCoating::enamelled(1)),
        ..RoundWire::default()
    })
}

fn wound_magnetic(turns: usize) -> Magnetic {
    let core = Core::new(
        catalogue::find_core_shape_by_name("ETD 34").unwrap(),
        catalogue::find_core_material_by_name("3C97").unwrap(),
        vec![],
        1,
    )
    .unwrap();
    let mut coil = Coil::new(
        vec![Winding {
            name: "primary".to_owned(),
            isolation_side: IsolationSide::Primary,
            number_turns: turns,
            number_parallels: 1,
            wire: enamelled_round(0.5e-3),
        }],
        &core,
    )
    .unwrap();
    coil.wind(&core).unwrap();
    Magnetic::new(core, coil)
}

fn triangular_operating_point() -> OperatingPoint {
    OperatingPoint {
        conditions: OperatingConditions::default(),
        excitations_per_winding: vec![OperatingPointExcitation {
            frequency: 100e3,
            voltage: None,
            current: Some(SignalDescriptor::triangular(2.0, 0.0, 100e3).unwrap()),
            magnetizing_current: None,
            magnetic_flux_density: None,
        }],
    }
}

#[test]
fn copper_skin_depth_at_123_khz() {
    let delta = skin::skin_depth_of_material("copper", 123e3, 20.0).unwrap();
    assert!((delta - 186.09e-6).abs() / 186.09e-6 < 0.01, "got {delta} m");
}

#[test]
fn one_meter_of_round_wire() {
    let wire = enamelled_round(321.14e-6);
    let resistance = winding_losses::dc_resistance_of_turn(1.0, &wire, 20.0).unwrap();
    assert!((resistance - 211.1e-3).abs() / 211.1e-3 < 0.05, "got {resistance} Ω");
}

#[test]
fn total_losses_never_fall_under_the_dc_losses() {
    let magnetic = wound_magnetic(12);
    let operating_point = triangular_operating_point();
    let output = winding_losses::winding_losses(&magnetic, &operating_point, 25.0).unwrap();

    let ohmic = output.ohmic_losses();
    assert!(ohmic > 0.0);
    assert!(output.winding_losses >= ohmic);

    for per_turn in &output.winding_losses_per_turn {
        assert!(per_turn.ohmic_losses >= 0.0);
        assert!(per_turn.skin_effect_losses.losses_per_harmonic.iter().all(|&l| l >= 0.0));
        assert!(
            per_turn
                .proximity_effect_losses
                .losses_per_harmonic
                .iter()
                .all(|&l| l >= 0.0)
        );
    }
}

#[test]
fn per_turn_breakdown_adds_up() {
    let magnetic = wound_magnetic(12);
    let operating_point = triangular_operating_point();
    let output = winding_losses::winding_losses(&magnetic, &operating_point, 25.0).unwrap();
    let recomposed: f64 = output
        .winding_losses_per_turn
        .iter()
        .map(|t| t.ohmic_losses + t.skin_effect_losses.total() + t.proximity_effect_losses.total())
        .sum();
    assert!((recomposed - output.winding_losses).abs() < output.winding_losses * 1e-9);
    assert!((output.losses_of_winding("primary") - output.winding_losses).abs() < output.winding_losses * 1e-9);
}

#[test]
fn lowering_the_harmonic_threshold_never_reduces_the_losses() {
    let wire = enamelled_round(0.5e-3);
    let current = SignalDescriptor::triangular(2.0, 0.0, 100e3).unwrap();
    // descending thresholds keep ever more harmonics, so the reported
    // losses may only grow
    let mut previous = 0.0;
    for threshold in [0.6, 0.3, 0.05, 0.0] {
        let (losses, _) =
            skin::skin_effect_losses_per_meter(&wire, &current, 25.0, 1.0, threshold).unwrap();
        assert!(losses >= 0.0);
        assert!(
            losses >= previous,
            "threshold {threshold} reported {losses}, less than {previous}"
        );
        previous = losses;
    }
}
