//! Catalogues of shapes, materials and wires: a compiled-in seed set plus
//! newline-delimited JSON inventories loaded at runtime.

use crate::core::{Core, CoreGap};
use crate::error::{Error, Result};
use crate::interpolation::LogLogSurface;
use crate::material::{CoreMaterial, CoreMaterialType, LossSurfaceAtTemperature, SteinmetzRange};
use crate::shape::{ColumnShape, CoreShape, CoreShapeFamily};
use crate::wire::{
    CoatingKind, FoilWire, LitzWire, RectangularWire, RoundWire, Wire, WireCoating, WireMaterial, WireStandard,
    WireType,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::io::BufRead;
use std::path::Path;
use std::sync::RwLock;

struct Catalogue {
    shapes: Vec<CoreShape>,
    materials: Vec<CoreMaterial>,
    wire_materials: Vec<WireMaterial>,
    wires: Vec<Wire>,
    cores: Vec<CoreRecord>,
}

/// A core product: a shape/material pairing as sold.
#[derive(Clone, Debug, Deserialize)]
pub struct CoreRecord {
    /// Shape name, resolved through the shape catalogue.
    pub shape: String,
    /// Material name, resolved through the material catalogue.
    pub material: String,
    /// Factory gapping, when the product ships gapped.
    #[serde(default)]
    pub gapping: Vec<CoreGap>,
}

static CATALOGUE: Lazy<RwLock<Catalogue>> = Lazy::new(|| RwLock::new(builtin()));

/// Finds a wire by catalogue name, case-insensitively.
///
/// # Errors
///
/// Returns [`Error::ResourceMissing`] when no wire matches.
pub fn find_wire_by_name(name: &str) -> Result<Wire> {
    let catalogue = CATALOGUE.read().unwrap();
    catalogue
        .wires
        .iter()
        .find(|w| w.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .cloned()
        .ok_or_else(|| Error::ResourceMissing(format!("wire {name}")))
}

/// Finds the catalogue wire whose conducting dimension is closest to
/// `dimension`, optionally restricted by type and standard.
///
/// # Errors
///
/// Returns [`Error::ResourceMissing`] when no wire survives the filters.
pub fn find_wire_by_dimension(
    dimension: f64,
    wire_type: Option<WireType>,
    standard: Option<WireStandard>,
) -> Result<Wire> {
    let catalogue = CATALOGUE.read().unwrap();
    catalogue
        .wires
        .iter()
        .filter(|w| wire_type.is_none_or(|t| w.wire_type() == t))
        .filter(|w| {
            standard.is_none_or(|s| match w {
                Wire::Round(r) => r.standard == s,
                Wire::Rectangular(r) | Wire::Planar(r) => r.standard == s,
                Wire::Litz(l) => l.strand.standard == s,
                Wire::Foil(_) => true,
            })
        })
        .min_by(|a, b| {
            let da = (a.minimum_conducting_dimension() - dimension).abs();
            let db = (b.minimum_conducting_dimension() - dimension).abs();
            da.total_cmp(&db)
        })
        .cloned()
        .ok_or_else(|| Error::ResourceMissing(format!("wire with dimension {dimension}")))
}

/// Finds a wire material by name, case-insensitively.
///
/// # Errors
///
/// Returns [`Error::ResourceMissing`] when no material matches.
pub fn find_wire_material_by_name(name: &str) -> Result<WireMaterial> {
    let catalogue = CATALOGUE.read().unwrap();
    catalogue
        .wire_materials
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| Error::ResourceMissing(format!("wire material {name}")))
}

/// Finds a core shape by name, case-insensitively.
///
/// # Errors
///
/// Returns [`Error::ResourceMissing`] when no shape matches.
pub fn find_core_shape_by_name(name: &str) -> Result<CoreShape> {
    let catalogue = CATALOGUE.read().unwrap();
    catalogue
        .shapes
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| Error::ResourceMissing(format!("core shape {name}")))
}

/// Finds a core material by name, case-insensitively.
///
/// # Errors
///
/// Returns [`Error::ResourceMissing`] when no material matches.
pub fn find_core_material_by_name(name: &str) -> Result<CoreMaterial> {
    let catalogue = CATALOGUE.read().unwrap();
    catalogue
        .materials
        .iter()
        .find(|m| m.name.eq_ignore_ascii_case(name))
        .cloned()
        .ok_or_else(|| Error::ResourceMissing(format!("core material {name}")))
}

/// All catalogue cores, resolved and processed, in catalogue order. The
/// order is what breaks scoring ties in the advisers.
///
/// # Errors
///
/// Propagates resolution failures of the first broken record.
pub fn all_cores() -> Result<Vec<Core>> {
    let records: Vec<CoreRecord> = CATALOGUE.read().unwrap().cores.clone();
    records
        .iter()
        .map(|record| {
            Core::new(
                find_core_shape_by_name(&record.shape)?,
                find_core_material_by_name(&record.material)?,
                record.gapping.clone(),
                1,
            )
        })
        .collect()
}

/// All catalogue wires, in catalogue order.
#[must_use]
pub fn all_wires() -> Vec<Wire> {
    CATALOGUE.read().unwrap().wires.clone()
}

/// Loads extra records from a newline-delimited JSON file into the given
/// section of the catalogue. A record that fails to parse is logged at WARN
/// and skipped; the rest of the file still loads. Returns how many records
/// were added.
///
/// # Errors
///
/// Returns [`Error::ResourceMissing`] when the file cannot be opened.
pub fn load_ndjson(path: &Path, section: CatalogueSection) -> Result<usize> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::ResourceMissing(format!("{}: {e}", path.display())))?;
    let reader = std::io::BufReader::new(file);
    let mut loaded = 0;
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::ResourceMissing(format!("{}: {e}", path.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        let outcome = {
            let mut catalogue = CATALOGUE.write().unwrap();
            match section {
                CatalogueSection::Cores => serde_json::from_str(&line).map(|r| catalogue.cores.push(r)),
                CatalogueSection::Shapes => serde_json::from_str(&line).map(|r| catalogue.shapes.push(r)),
                CatalogueSection::Materials => serde_json::from_str(&line).map(|r| catalogue.materials.push(r)),
                CatalogueSection::Wires => serde_json::from_str(&line).map(|r| catalogue.wires.push(r)),
                CatalogueSection::WireMaterials => {
                    serde_json::from_str(&line).map(|r| catalogue.wire_materials.push(r))
                }
            }
        };
        match outcome {
            Ok(()) => loaded += 1,
            Err(e) => log::warn!("{}:{}: skipping bad record: {e}", path.display(), line_number + 1),
        }
    }
    Ok(loaded)
}

/// Which catalogue a ndjson file extends.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CatalogueSection {
    /// `cores.ndjson`.
    Cores,
    /// `shapes.ndjson`.
    Shapes,
    /// `materials.ndjson`.
    Materials,
    /// `wires.ndjson`.
    Wires,
    /// `wire_materials.ndjson`.
    WireMaterials,
}

fn builtin() -> Catalogue {
    Catalogue {
        shapes: builtin_shapes(),
        materials: builtin_materials(),
        wire_materials: builtin_wire_materials(),
        wires: builtin_wires(),
        cores: builtin_cores(),
    }
}

fn builtin_shapes() -> Vec<CoreShape> {
    vec![
        CoreShape {
            name: "ETD 49".to_owned(),
            family: CoreShapeFamily::Etd,
            width: 49.8e-3,
            height: 33.4e-3,
            depth: 16.7e-3,
            central_column_width: 16.7e-3,
            central_column_shape: ColumnShape::Round,
            winding_window_width: 8.35e-3,
            winding_window_height: 27.0e-3,
            effective_area: 211e-6,
            effective_length: 114e-3,
            effective_volume: 24000e-9,
            minimum_area: 209e-6,
        },
        CoreShape {
            name: "ETD 34".to_owned(),
            family: CoreShapeFamily::Etd,
            width: 34.0e-3,
            height: 22.8e-3,
            depth: 11.1e-3,
            central_column_width: 11.1e-3,
            central_column_shape: ColumnShape::Round,
            winding_window_width: 5.85e-3,
            winding_window_height: 18.6e-3,
            effective_area: 97.1e-6,
            effective_length: 78.6e-3,
            effective_volume: 7640e-9,
            minimum_area: 91.6e-6,
        },
        CoreShape {
            name: "PQ 26/25".to_owned(),
            family: CoreShapeFamily::Pq,
            width: 26.5e-3,
            height: 24.8e-3,
            depth: 19.0e-3,
            central_column_width: 12.0e-3,
            central_column_shape: ColumnShape::Round,
            winding_window_width: 5.2e-3,
            winding_window_height: 16.0e-3,
            effective_area: 118e-6,
            effective_length: 54.3e-3,
            effective_volume: 6530e-9,
            minimum_area: 109e-6,
        },
        CoreShape {
            name: "E 25/13/7".to_owned(),
            family: CoreShapeFamily::E,
            width: 25.0e-3,
            height: 12.8e-3,
            depth: 7.0e-3,
            central_column_width: 7.5e-3,
            central_column_shape: ColumnShape::Rectangular,
            winding_window_width: 5.0e-3,
            winding_window_height: 8.7e-3,
            effective_area: 52.5e-6,
            effective_length: 58.0e-3,
            effective_volume: 3020e-9,
            minimum_area: 51.5e-6,
        },
        CoreShape {
            name: "T 25/15/10".to_owned(),
            family: CoreShapeFamily::T,
            width: 25.0e-3,
            height: 10.0e-3,
            depth: 10.0e-3,
            central_column_width: 5.0e-3,
            central_column_shape: ColumnShape::Round,
            winding_window_width: 7.5e-3,
            winding_window_height: 15.0e-3,
            effective_area: 48.8e-6,
            effective_length: 60.2e-3,
            effective_volume: 2940e-9,
            minimum_area: 48.8e-6,
        },
    ]
}

fn builtin_materials() -> Vec<CoreMaterial> {
    let surface = |scale: f64| {
        LogLogSurface::new(
            vec![25e3, 100e3, 400e3],
            vec![0.05, 0.1, 0.2],
            vec![
                741.0 * scale,
                5.5e3 * scale,
                41e3 * scale,
                5.3e3 * scale,
                39.6e3 * scale,
                295e3 * scale,
                38e3 * scale,
                283e3 * scale,
                2.12e6 * scale,
            ],
        )
        .unwrap_or_else(|_| unreachable!())
    };
    vec![
        CoreMaterial {
            name: "3C97".to_owned(),
            manufacturer: "Ferroxcube".to_owned(),
            material_type: CoreMaterialType::Ferrite,
            permeability_vs_temperature: vec![
                (-40.0, 2400.0),
                (25.0, 3600.0),
                (60.0, 4300.0),
                (100.0, 5500.0),
                (120.0, 4900.0),
                (140.0, 3600.0),
            ],
            permeability_vs_bias: vec![],
            permeability_vs_frequency: vec![(1e3, 1.0), (500e3, 1.0), (1e6, 0.9), (2e6, 0.6)],
            saturation_vs_temperature: vec![(25.0, 0.52), (100.0, 0.41), (140.0, 0.35)],
            steinmetz_ranges: vec![
                SteinmetzRange {
                    minimum_frequency: 10e3,
                    maximum_frequency: 300e3,
                    k: 2.5,
                    alpha: 1.42,
                    beta: 2.9,
                    temperature_coefficients: Some([1.55, 0.013, 6.5e-5]),
                },
                SteinmetzRange {
                    minimum_frequency: 300e3,
                    maximum_frequency: 1e6,
                    k: 0.058,
                    alpha: 1.72,
                    beta: 2.9,
                    temperature_coefficients: Some([1.55, 0.013, 6.5e-5]),
                },
            ],
            loss_factor_vs_frequency: vec![(10e3, 2e-6), (100e3, 5e-6), (300e3, 1.5e-5), (1e6, 1e-4)],
            loss_surfaces: vec![
                LossSurfaceAtTemperature {
                    temperature: 25.0,
                    surface: surface(1.0),
                },
                LossSurfaceAtTemperature {
                    temperature: 100.0,
                    surface: surface(0.7),
                },
            ],
            resistivity: 5.0,
        },
        CoreMaterial {
            name: "N87".to_owned(),
            manufacturer: "TDK".to_owned(),
            material_type: CoreMaterialType::Ferrite,
            permeability_vs_temperature: vec![
                (-40.0, 1500.0),
                (25.0, 2200.0),
                (60.0, 2700.0),
                (100.0, 3600.0),
                (140.0, 4000.0),
            ],
            permeability_vs_bias: vec![],
            permeability_vs_frequency: vec![(1e3, 1.0), (500e3, 1.0), (1e6, 0.85), (2e6, 0.5)],
            saturation_vs_temperature: vec![(25.0, 0.49), (100.0, 0.39), (140.0, 0.33)],
            steinmetz_ranges: vec![SteinmetzRange {
                minimum_frequency: 10e3,
                maximum_frequency: 500e3,
                k: 9.0,
                alpha: 1.25,
                beta: 2.45,
                temperature_coefficients: Some([2.08, 0.024, 1.27e-4]),
            }],
            loss_factor_vs_frequency: vec![(10e3, 3e-6), (100e3, 9e-6), (300e3, 3e-5), (1e6, 2e-4)],
            loss_surfaces: vec![],
            resistivity: 8.0,
        },
        CoreMaterial {
            name: "Kool Mu 60u".to_owned(),
            manufacturer: "Magnetics".to_owned(),
            material_type: CoreMaterialType::Powder,
            permeability_vs_temperature: vec![(-40.0, 60.0), (25.0, 60.0), (100.0, 59.0), (200.0, 58.0)],
            permeability_vs_bias: vec![
                (0.0, 1.0),
                (1000.0, 0.97),
                (3000.0, 0.86),
                (10000.0, 0.52),
                (30000.0, 0.22),
            ],
            permeability_vs_frequency: vec![],
            saturation_vs_temperature: vec![(25.0, 1.05), (100.0, 1.0), (200.0, 0.95)],
            steinmetz_ranges: vec![SteinmetzRange {
                minimum_frequency: 1e3,
                maximum_frequency: 1e6,
                k: 10.6,
                alpha: 1.29,
                beta: 2.01,
                temperature_coefficients: None,
            }],
            loss_factor_vs_frequency: vec![],
            loss_surfaces: vec![],
            resistivity: 1e4,
        },
    ]
}

fn builtin_wire_materials() -> Vec<WireMaterial> {
    vec![
        WireMaterial {
            name: "copper".to_owned(),
            resistivity: 1.678e-8,
            reference_temperature: 20.0,
            temperature_coefficient: 0.00393,
            permeability: 1.0,
            density: 8960.0,
        },
        WireMaterial {
            name: "aluminium".to_owned(),
            resistivity: 2.65e-8,
            reference_temperature: 20.0,
            temperature_coefficient: 0.0039,
            permeability: 1.0,
            density: 2700.0,
        },
    ]
}

fn builtin_wires() -> Vec<Wire> {
    let round = |diameter_mm: f64, grade: u32| {
        Wire::Round(RoundWire {
            name: Some(format!("Round {diameter_mm:.3} - Grade {grade}")),
            conducting_diameter: diameter_mm * 1e-3,
            outer_diameter: None,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(grade)),
            standard: WireStandard::Iec60317,
        })
    };
    let litz = |strands: usize, strand_mm: f64| {
        Wire::Litz(LitzWire {
            name: Some(format!("Litz {strands}x{strand_mm:.3} - Grade 1 - Served")),
            strand: RoundWire {
                name: None,
                conducting_diameter: strand_mm * 1e-3,
                outer_diameter: None,
                material: "copper".to_owned(),
                coating: Some(WireCoating::enamelled(1)),
                standard: WireStandard::Iec60317,
            },
            number_conductors: strands,
            outer_diameter: None,
            coating: Some(WireCoating {
                kind: CoatingKind::Served,
                number_layers: Some(1),
                ..WireCoating::default()
            }),
        })
    };
    let rectangular = |width_mm: f64, height_mm: f64| {
        Wire::Rectangular(RectangularWire {
            name: Some(format!("Rectangular {width_mm:.1}x{height_mm:.1} - Grade 1")),
            conducting_width: width_mm * 1e-3,
            conducting_height: height_mm * 1e-3,
            outer_width: None,
            outer_height: None,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            standard: WireStandard::Iec60317,
        })
    };
    let foil = |thickness_mm: f64| {
        Wire::Foil(FoilWire {
            name: Some(format!("Foil {thickness_mm:.2}")),
            conducting_width: thickness_mm * 1e-3,
            conducting_height: 20e-3,
            material: "copper".to_owned(),
            coating: None,
        })
    };
    vec![
        round(0.1, 1),
        round(0.2, 1),
        round(0.315, 1),
        round(0.5, 1),
        round(0.5, 2),
        round(0.8, 1),
        round(1.0, 1),
        round(1.5, 1),
        litz(100, 0.1),
        litz(400, 0.071),
        litz(1000, 0.05),
        rectangular(2.0, 1.0),
        rectangular(4.0, 1.5),
        foil(0.05),
        foil(0.1),
        foil(0.2),
    ]
}

fn builtin_cores() -> Vec<CoreRecord> {
    let ungapped = [
        ("ETD 49", "3C97"),
        ("ETD 49", "N87"),
        ("ETD 34", "3C97"),
        ("ETD 34", "N87"),
        ("PQ 26/25", "3C97"),
        ("PQ 26/25", "N87"),
        ("E 25/13/7", "N87"),
        ("E 25/13/7", "3C97"),
        ("T 25/15/10", "Kool Mu 60u"),
        ("T 25/15/10", "N87"),
    ]
    .into_iter()
    .map(|(shape, material)| CoreRecord {
        shape: shape.to_owned(),
        material: material.to_owned(),
        gapping: Vec::new(),
    });
    // factory-gapped variants for energy storage
    let gapped = [
        ("ETD 49", "3C97", 1.0e-3),
        ("ETD 49", "N87", 1.0e-3),
        ("ETD 34", "3C97", 0.5e-3),
        ("PQ 26/25", "3C97", 0.4e-3),
        ("E 25/13/7", "N87", 0.3e-3),
    ]
    .into_iter()
    .map(|(shape, material, gap)| CoreRecord {
        shape: shape.to_owned(),
        material: material.to_owned(),
        gapping: vec![CoreGap::subtractive(gap)],
    });
    ungapped.chain(gapped).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_are_case_insensitive() {
        assert!(find_core_shape_by_name("etd 49").is_ok());
        assert!(find_core_material_by_name("3c97").is_ok());
        assert!(find_wire_material_by_name("Copper").is_ok());
        assert!(find_core_shape_by_name("ETD 999").is_err());
    }

    #[test]
    fn wire_by_dimension_picks_the_closest() {
        let wire = find_wire_by_dimension(0.48e-3, Some(WireType::Round), None).unwrap();
        assert_eq!(wire.name().unwrap(), "Round 0.500 - Grade 1");
    }

    #[test]
    fn all_cores_resolve() {
        let cores = all_cores().unwrap();
        assert!(cores.len() >= 10);
        assert!(cores.iter().all(|c| c.processed.is_some()));
    }
}
