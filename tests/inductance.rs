//! Seed scenarios and properties of the magnetizing-inductance solvers.

use fluxkit::catalogue;
use fluxkit::coil::{Coil, IsolationSide, Winding};
use fluxkit::core::{Core, CoreGap};
use fluxkit::inputs::{DesignRequirements, DimensionWithTolerance, Inputs};
use fluxkit::magnetizing;
use fluxkit::signal::{OperatingConditions, OperatingPoint, OperatingPointExcitation, SignalDescriptor};
use fluxkit::wire::{RoundWire, Wire, WireCoating};

fn enamelled_round(diameter: f64) -> Wire {
    Wire::Round(RoundWire {
        conducting_diameter: diameter,
        material: "copper".to_owned(),
        coating: Some(WireCoating::enamelled(1)),
        ..RoundWire::default()
    })
}

fn coil_with_turns(core: &Core, turns: usize) -> Coil {
    Coil::new(
        vec![Winding {
            name: "primary".to_owned(),
            isolation_side: IsolationSide::Primary,
            number_turns: turns,
            number_parallels: 1,
            wire: enamelled_round(0.5e-3),
        }],
        core,
    )
    .unwrap()
}

fn sinusoidal_operating_point(frequency: f64, temperature: f64) -> OperatingPoint {
    OperatingPoint {
        conditions: OperatingConditions {
            ambient_temperature: temperature,
            cooling_air_speed: None,
        },
        excitations_per_winding: vec![OperatingPointExcitation {
            frequency,
            voltage: None,
            current: Some(SignalDescriptor::sinusoidal(1.0, 0.0, frequency).unwrap()),
            magnetizing_current: None,
            magnetic_flux_density: None,
        }],
    }
}

#[test]
fn etd49_3c97_with_42_turns_and_residual_gapping() {
    let core = Core::new(
        catalogue::find_core_shape_by_name("ETD 49").unwrap(),
        catalogue::find_core_material_by_name("3C97").unwrap(),
        vec![],
        1,
    )
    .unwrap();
    let coil = coil_with_turns(&core, 42);
    let operating_point = sinusoidal_operating_point(100e3, 25.0);

    let (output, flux_density) =
        magnetizing::inductance_from_turns_and_gap(&core, &coil, &operating_point).unwrap();
    let expected = 14.6e-3;
    assert!(
        (output.magnetizing_inductance - expected).abs() / expected < 0.05,
        "got {} H",
        output.magnetizing_inductance
    );
    assert!(flux_density.processed().unwrap().peak > 0.0);
}

#[test]
fn inductance_converges_for_every_catalogue_core() {
    let operating_point = sinusoidal_operating_point(100e3, 25.0);
    for core in catalogue::all_cores().unwrap() {
        let coil = coil_with_turns(&core, 10);
        let (output, _) = magnetizing::inductance_from_turns_and_gap(&core, &coil, &operating_point)
            .unwrap_or_else(|e| panic!("{} did not converge: {e}", core.shape.name));
        assert!(output.magnetizing_inductance > 0.0, "{}", core.shape.name);
        assert!(output.reluctance > 0.0, "{}", core.shape.name);
    }
}

#[test]
fn turns_solver_inverts_the_inductance_solver() {
    let operating_point = sinusoidal_operating_point(100e3, 25.0);
    for gapping in [vec![], vec![CoreGap::subtractive(0.7e-3)]] {
        let core = Core::new(
            catalogue::find_core_shape_by_name("ETD 49").unwrap(),
            catalogue::find_core_material_by_name("3C97").unwrap(),
            gapping,
            1,
        )
        .unwrap();
        let coil = coil_with_turns(&core, 30);
        let (forward, _) =
            magnetizing::inductance_from_turns_and_gap(&core, &coil, &operating_point).unwrap();

        let inputs = Inputs {
            design_requirements: DesignRequirements {
                magnetizing_inductance: DimensionWithTolerance::nominal(forward.magnetizing_inductance),
                ..DesignRequirements::default()
            },
            operating_points: vec![operating_point.clone()],
        };
        let turns = magnetizing::turns_from_gap_and_inductance(&core, &inputs).unwrap();
        let check_coil = coil_with_turns(&core, turns);
        let (check, _) =
            magnetizing::inductance_from_turns_and_gap(&core, &check_coil, &operating_point).unwrap();
        let error = (check.magnetizing_inductance - forward.magnetizing_inductance).abs()
            / forward.magnetizing_inductance;
        assert!(error < 0.05, "round trip drifted by {error}");
    }
}

#[test]
fn distributed_gapping_keeps_odd_gap_counts_and_bounded_fringing() {
    let core = Core::new(
        catalogue::find_core_shape_by_name("ETD 49").unwrap(),
        catalogue::find_core_material_by_name("3C97").unwrap(),
        vec![],
        1,
    )
    .unwrap();
    let coil = coil_with_turns(&core, 40);
    let inputs = Inputs {
        design_requirements: DesignRequirements {
            magnetizing_inductance: DimensionWithTolerance::nominal(300e-6),
            ..DesignRequirements::default()
        },
        operating_points: vec![sinusoidal_operating_point(100e3, 25.0)],
    };
    let gapping = magnetizing::gapping_from_turns_and_inductance(
        &core,
        &coil,
        &inputs,
        magnetizing::GappingType::Distributed,
    )
    .unwrap();
    let subtractive = gapping
        .iter()
        .filter(|g| g.gap_type == fluxkit::core::GapType::Subtractive)
        .count();
    assert!(subtractive >= 3);
    assert_eq!(subtractive % 2, 1, "distributed gaps come in odd counts");
}
