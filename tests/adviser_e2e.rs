//! End-to-end adviser runs: a buck inductor and a two-winding forward
//! transformer.

use fluxkit::adviser::{CoilAdviser, CoreAdviser};
use fluxkit::filter::{self, MagneticFilterEvaluate, SaturationFilter, TurnsRatiosFilter};
use fluxkit::inputs::{DesignRequirements, DimensionWithTolerance, Inputs};
use fluxkit::signal::{OperatingConditions, OperatingPoint, OperatingPointExcitation, SignalDescriptor};

fn inductor_inputs() -> Inputs {
    Inputs {
        design_requirements: DesignRequirements {
            magnetizing_inductance: DimensionWithTolerance::between(80e-6, 150e-6),
            ..DesignRequirements::default()
        },
        operating_points: vec![OperatingPoint {
            conditions: OperatingConditions::default(),
            excitations_per_winding: vec![OperatingPointExcitation {
                frequency: 100e3,
                voltage: Some(SignalDescriptor::sinusoidal(12.0, 0.0, 100e3).unwrap()),
                current: Some(SignalDescriptor::triangular(1.0, 2.0, 100e3).unwrap()),
                magnetizing_current: None,
                magnetic_flux_density: None,
            }],
        }],
    }
}

#[test]
fn advised_inductors_hold_their_own_filters() {
    filter::clear_scoring_cache();
    let inputs = inductor_inputs();
    let advised = CoreAdviser::default().advise(&inputs, 3).unwrap();
    assert!(!advised.is_empty());

    for candidate in advised {
        let mut magnetic = candidate.magnetic;
        let (saturation_ok, _) = SaturationFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        assert!(saturation_ok, "{} saturates", magnetic.reference);
        assert!(magnetic.coil.turns_description.is_some(), "{} is unwound", magnetic.reference);
    }
}

#[test]
fn running_the_pipeline_twice_gives_identical_rankings() {
    let inputs = inductor_inputs();
    filter::clear_scoring_cache();
    let first = CoreAdviser::default().advise(&inputs, 5).unwrap();
    filter::clear_scoring_cache();
    let second = CoreAdviser::default().advise(&inputs, 5).unwrap();

    let references: Vec<_> = first.iter().map(|c| c.magnetic.reference.clone()).collect();
    let references_again: Vec<_> = second.iter().map(|c| c.magnetic.reference.clone()).collect();
    assert_eq!(references, references_again);
    for (a, b) in first.iter().zip(second.iter()) {
        assert!((a.scoring - b.scoring).abs() < 1e-12);
    }
}

#[test]
fn the_coil_adviser_dresses_the_winner() {
    filter::clear_scoring_cache();
    let inputs = inductor_inputs();
    let cores = CoreAdviser::default().advise(&inputs, 1).unwrap();
    let coils = CoilAdviser.advise(&cores[0].magnetic, &inputs, 3).unwrap();
    assert!(!coils.is_empty());
    for candidate in &coils {
        assert!(candidate.magnetic.coil.fits || candidate.magnetic.coil.turns_description.is_some());
        assert!(candidate.scoring > 0.0);
    }
}

#[test]
fn turns_ratio_requirements_bind_transformers() {
    filter::clear_scoring_cache();
    let mut inputs = inductor_inputs();
    inputs.design_requirements.turns_ratios = vec![DimensionWithTolerance::between(1.9, 2.1)];
    inputs.operating_points[0]
        .excitations_per_winding
        .push(OperatingPointExcitation {
            frequency: 100e3,
            voltage: Some(SignalDescriptor::sinusoidal(6.0, 0.0, 100e3).unwrap()),
            current: Some(SignalDescriptor::sinusoidal(2.0, 0.0, 100e3).unwrap()),
            magnetizing_current: None,
            magnetic_flux_density: None,
        });

    let advised = CoreAdviser::default().advise(&inputs, 1).unwrap();
    assert!(!advised.is_empty());

    // the adviser dresses transformers with one dummy winding per
    // excitation, with the secondaries following the required ratios
    let mut magnetic = advised[0].magnetic.clone();
    assert_eq!(magnetic.coil.functional_description.len(), 2);
    let (valid, _) = TurnsRatiosFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
    let ratio = magnetic.turns_ratios()[0];
    assert_eq!(valid, (1.9..=2.1).contains(&ratio));
}
