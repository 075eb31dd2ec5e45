//! Wire catalogue round trips, monotonicity and equivalence seeds.

use fluxkit::catalogue;
use fluxkit::wire::{Wire, WireCoating, WireStandard, WireType};
use std::f64::consts::PI;

#[test]
fn every_catalogue_coating_survives_its_label() {
    for wire in catalogue::all_wires() {
        let Some(coating) = wire.coating() else {
            continue;
        };
        let decoded = WireCoating::decode_label(&coating.encode_label()).unwrap();
        assert_eq!(decoded.kind, coating.kind, "{:?}", wire.name());
        assert_eq!(decoded.grade, coating.grade, "{:?}", wire.name());
        assert_eq!(decoded.number_layers, coating.number_layers, "{:?}", wire.name());
        assert_eq!(decoded.thickness_layers, coating.thickness_layers, "{:?}", wire.name());
    }
}

#[test]
fn conducting_area_and_outer_diameter_grow_with_the_conductor() {
    let rounds: Vec<Wire> = catalogue::all_wires()
        .into_iter()
        .filter(|w| w.wire_type() == WireType::Round)
        .filter(|w| w.coating().and_then(|c| c.grade) == Some(1))
        .collect();
    assert!(rounds.len() >= 4);
    let mut sorted = rounds;
    sorted.sort_by(|a, b| a.minimum_conducting_dimension().total_cmp(&b.minimum_conducting_dimension()));
    for pair in sorted.windows(2) {
        assert!(pair[1].conducting_area() > pair[0].conducting_area());
        assert!(pair[1].maximum_outer_width() > pair[0].maximum_outer_width());
    }
}

#[test]
fn served_litz_equivalent_round_wire() {
    let litz = catalogue::find_wire_by_name("Litz 1000x0.050 - Grade 1 - Served").unwrap();
    let round = litz.equivalent(WireType::Round, 100e3, 25.0).unwrap();
    assert_eq!(round.number_conductors(), 1);
    let Wire::Round(round) = round else {
        panic!("expected a round wire");
    };
    assert!(
        (round.conducting_diameter - 1.6e-3).abs() / 1.6e-3 < 0.05,
        "got {} m",
        round.conducting_diameter
    );
}

#[test]
fn equivalents_preserve_the_conducting_area() {
    let source = catalogue::find_wire_by_name("Round 1.000 - Grade 1").unwrap();
    let area = source.conducting_area();
    for target in [WireType::Litz, WireType::Rectangular, WireType::Foil] {
        let equivalent = source.equivalent(target, 200e3, 25.0).unwrap();
        let ratio = equivalent.conducting_area() / area;
        // litz rounds the strand count up, everything else is exact
        assert!(
            (0.99..1.1).contains(&ratio),
            "{target:?} changed the area by {ratio}"
        );
    }
}

#[test]
fn wire_by_dimension_respects_the_type_filter() {
    let wire = catalogue::find_wire_by_dimension(0.09e-3, Some(WireType::Round), Some(WireStandard::Iec60317)).unwrap();
    assert_eq!(wire.wire_type(), WireType::Round);
    assert!((wire.minimum_conducting_dimension() - 0.1e-3).abs() < 1e-5);

    let litz = catalogue::find_wire_by_dimension(0.05e-3, Some(WireType::Litz), None).unwrap();
    assert_eq!(litz.wire_type(), WireType::Litz);
}

#[test]
fn filling_factor_matches_its_own_outer_diameter() {
    for diameter in [0.1e-3, 0.315e-3, 0.8e-3] {
        let outer = fluxkit::wire::outer_diameter_round(diameter, 1, WireStandard::Iec60317);
        let filling = fluxkit::wire::filling_factor_round(diameter, 1, WireStandard::Iec60317);
        let from_areas = (PI / 4.0 * diameter * diameter) / (PI / 4.0 * outer * outer);
        assert!((filling - from_areas).abs() < 1e-12);
    }
}
