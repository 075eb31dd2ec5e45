//! The newline-delimited JSON inventory loader.

use fluxkit::catalogue::{self, CatalogueSection};
use std::io::Write;

#[test]
fn bad_records_are_skipped_without_aborting_the_file() {
    let path = std::env::temp_dir().join("fluxkit_test_wire_materials.ndjson");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"{{"name":"silver","resistivity":1.59e-8,"reference_temperature":20.0,"temperature_coefficient":0.0038,"permeability":1.0,"density":10490.0}}"#
    )
    .unwrap();
    writeln!(file, "this is not json").unwrap();
    writeln!(
        file,
        r#"{{"name":"gold","resistivity":2.44e-8,"reference_temperature":20.0,"temperature_coefficient":0.0034,"permeability":1.0,"density":19300.0}}"#
    )
    .unwrap();
    drop(file);

    let loaded = catalogue::load_ndjson(&path, CatalogueSection::WireMaterials).unwrap();
    assert_eq!(loaded, 2);
    assert!(catalogue::find_wire_material_by_name("silver").is_ok());
    assert!(catalogue::find_wire_material_by_name("gold").is_ok());
    std::fs::remove_file(path).ok();
}

#[test]
fn missing_files_report_the_path() {
    let error = catalogue::load_ndjson(
        std::path::Path::new("/nonexistent/cores.ndjson"),
        CatalogueSection::Cores,
    )
    .unwrap_err();
    assert!(error.to_string().contains("cores.ndjson"));
}
