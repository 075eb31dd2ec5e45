//! Core temperature seed scenario across the allowed models.

use fluxkit::catalogue;
use fluxkit::core::Core;
use fluxkit::temperature::{CoreTemperature, CoreTemperatureModel};

#[test]
fn etd49_3c97_at_one_and_a_half_watts() {
    let core = Core::new(
        catalogue::find_core_shape_by_name("ETD 49").unwrap(),
        catalogue::find_core_material_by_name("3C97").unwrap(),
        vec![],
        1,
    )
    .unwrap();

    // the empirical relations scatter widely, hence the broad band
    let expected = 59.0;
    for key in ["kazimierczuk", "maniktala", "tdk", "dixon", "amidon"] {
        let model = CoreTemperatureModel::from_key(key).unwrap();
        let result = model.core_temperature(&core, 1.44, 25.0).unwrap();
        assert!(
            (result.maximum_temperature - expected).abs() / expected < 0.6,
            "{key} gave {} °C",
            result.maximum_temperature
        );
        assert_eq!(result.method_used, key);
    }
}

#[test]
fn temperature_rise_scales_with_the_core_size() {
    let small = Core::new(
        catalogue::find_core_shape_by_name("E 25/13/7").unwrap(),
        catalogue::find_core_material_by_name("N87").unwrap(),
        vec![],
        1,
    )
    .unwrap();
    let large = Core::new(
        catalogue::find_core_shape_by_name("ETD 49").unwrap(),
        catalogue::find_core_material_by_name("N87").unwrap(),
        vec![],
        1,
    )
    .unwrap();
    let model = CoreTemperatureModel::from_key("maniktala").unwrap();
    let hot = model.core_temperature(&small, 1.0, 25.0).unwrap();
    let cool = model.core_temperature(&large, 1.0, 25.0).unwrap();
    assert!(hot.maximum_temperature > cool.maximum_temperature);
}
