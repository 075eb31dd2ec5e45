//! Wires, wire materials and the coating standards that fix their outer
//! dimensions.

use crate::error::{Error, Result};
use crate::interpolation;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::RwLock;

/// Conductor material of a wire.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WireMaterial {
    /// Material name, e.g. "copper".
    pub name: String,
    /// Resistivity at [`Self::reference_temperature`], in Ω·m.
    pub resistivity: f64,
    /// Temperature the resistivity is quoted at, in °C.
    pub reference_temperature: f64,
    /// Linear temperature coefficient of the resistivity, in 1/K.
    pub temperature_coefficient: f64,
    /// Relative magnetic permeability.
    pub permeability: f64,
    /// Mass density, in kg/m³.
    pub density: f64,
}

impl WireMaterial {
    /// Resistivity at `temperature` °C, in Ω·m.
    #[must_use]
    pub fn resistivity_at(&self, temperature: f64) -> f64 {
        self.resistivity * (1.0 + self.temperature_coefficient * (temperature - self.reference_temperature))
    }
}

/// Wire construction standard governing the enamel build tables.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireStandard {
    /// IEC 60317, the default.
    #[default]
    Iec60317,
    /// NEMA MW 1000 C.
    NemaMw1000C,
}

/// Kind of insulation around the conductor.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoatingKind {
    /// No coating at all.
    Bare,
    /// Enamel of a standard grade.
    #[default]
    Enamelled,
    /// Textile serving, for litz bundles.
    Served,
    /// Extruded insulation layers.
    Insulated,
}

/// Insulation around a conductor or bundle.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WireCoating {
    /// What the coating is made of.
    pub kind: CoatingKind,
    /// Enamel grade, 1 to 3.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<u32>,
    /// Number of insulation or serving layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_layers: Option<u32>,
    /// Thickness of each insulation layer, in m.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness_layers: Option<f64>,
    /// Guaranteed breakdown voltage of the coating, in V.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown_voltage: Option<f64>,
    /// Thermal class, in °C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_rating: Option<f64>,
    /// Dielectric strength of the coating material, in V/m.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dielectric_strength: Option<f64>,
    /// Relative permittivity of the coating material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_permittivity: Option<f64>,
}

impl WireCoating {
    /// Encodes the coating as a stable label that survives
    /// [`Self::decode_label`].
    #[must_use]
    pub fn encode_label(&self) -> String {
        match self.kind {
            CoatingKind::Bare => "bare".to_owned(),
            CoatingKind::Enamelled => format!("enamelled/g{}", self.grade.unwrap_or(1)),
            CoatingKind::Served => format!("served/l{}", self.number_layers.unwrap_or(1)),
            CoatingKind::Insulated => format!(
                "insulated/l{}/t{}",
                self.number_layers.unwrap_or(1),
                self.thickness_layers.unwrap_or(0.0)
            ),
        }
    }

    /// Decodes a label produced by [`Self::encode_label`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on a malformed label.
    pub fn decode_label(label: &str) -> Result<Self> {
        let mut parts = label.split('/');
        let kind = parts.next().unwrap_or_default();
        let mut coating = Self::default();
        match kind {
            "bare" => coating.kind = CoatingKind::Bare,
            "enamelled" => {
                coating.kind = CoatingKind::Enamelled;
                let grade = parts
                    .next()
                    .and_then(|p| p.strip_prefix('g'))
                    .and_then(|g| g.parse().ok())
                    .ok_or_else(|| Error::InvalidInput(format!("bad coating label: {label}")))?;
                coating.grade = Some(grade);
            }
            "served" => {
                coating.kind = CoatingKind::Served;
                let layers = parts
                    .next()
                    .and_then(|p| p.strip_prefix('l'))
                    .and_then(|l| l.parse().ok())
                    .ok_or_else(|| Error::InvalidInput(format!("bad coating label: {label}")))?;
                coating.number_layers = Some(layers);
            }
            "insulated" => {
                coating.kind = CoatingKind::Insulated;
                let layers = parts
                    .next()
                    .and_then(|p| p.strip_prefix('l'))
                    .and_then(|l| l.parse().ok())
                    .ok_or_else(|| Error::InvalidInput(format!("bad coating label: {label}")))?;
                let thickness = parts
                    .next()
                    .and_then(|p| p.strip_prefix('t'))
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| Error::InvalidInput(format!("bad coating label: {label}")))?;
                coating.number_layers = Some(layers);
                coating.thickness_layers = Some(thickness);
            }
            _ => return Err(Error::InvalidInput(format!("bad coating label: {label}"))),
        }
        Ok(coating)
    }

    /// Quick enamelled coating of the given grade.
    #[must_use]
    pub fn enamelled(grade: u32) -> Self {
        Self {
            kind: CoatingKind::Enamelled,
            grade: Some(grade),
            breakdown_voltage: Some(f64::from(grade) * 1350.0),
            ..Self::default()
        }
    }
}

/// A single round conductor. Doubles as the strand record of a litz bundle,
/// which keeps the wire type acyclic.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RoundWire {
    /// Catalogue name, when the wire comes from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Bare conductor diameter, in m.
    pub conducting_diameter: f64,
    /// Diameter over the coating, in m. Derived from the standard build
    /// tables when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_diameter: Option<f64>,
    /// Conductor material name.
    pub material: String,
    /// Insulation around the conductor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coating: Option<WireCoating>,
    /// Standard governing the build tables.
    #[serde(default)]
    pub standard: WireStandard,
}

/// A bundle of identical round strands.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LitzWire {
    /// Catalogue name, when the wire comes from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The strand the bundle is twisted from.
    pub strand: RoundWire,
    /// Number of strands.
    pub number_conductors: usize,
    /// Diameter over the serving, in m. Derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_diameter: Option<f64>,
    /// Serving or insulation around the bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coating: Option<WireCoating>,
}

/// A rectangular conductor, also used for planar traces.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RectangularWire {
    /// Catalogue name, when the wire comes from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Bare conductor width, in m.
    pub conducting_width: f64,
    /// Bare conductor height, in m.
    pub conducting_height: f64,
    /// Width over the coating, in m. Derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_width: Option<f64>,
    /// Height over the coating, in m. Derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outer_height: Option<f64>,
    /// Conductor material name.
    pub material: String,
    /// Insulation around the conductor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coating: Option<WireCoating>,
    /// Standard governing the build tables.
    #[serde(default)]
    pub standard: WireStandard,
}

/// A foil conductor. The height is cut to the section it is wound into.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FoilWire {
    /// Catalogue name, when the wire comes from one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Foil thickness, in m.
    pub conducting_width: f64,
    /// Foil height as manufactured, in m; cuttable down to the section.
    pub conducting_height: f64,
    /// Conductor material name.
    pub material: String,
    /// Insulation around the foil.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coating: Option<WireCoating>,
}

/// Any wire the engine can wind.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Wire {
    /// Single round conductor.
    Round(RoundWire),
    /// Twisted bundle of round strands.
    Litz(LitzWire),
    /// Rectangular conductor.
    Rectangular(RectangularWire),
    /// Foil conductor.
    Foil(FoilWire),
    /// Printed-circuit trace.
    Planar(RectangularWire),
}

impl Wire {
    /// Catalogue name of the wire, when it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Round(w) => w.name.as_deref(),
            Self::Litz(w) => w.name.as_deref(),
            Self::Rectangular(w) | Self::Planar(w) => w.name.as_deref(),
            Self::Foil(w) => w.name.as_deref(),
        }
    }

    /// Conductor material name.
    #[must_use]
    pub fn material_name(&self) -> &str {
        match self {
            Self::Round(w) => &w.material,
            Self::Litz(w) => &w.strand.material,
            Self::Rectangular(w) | Self::Planar(w) => &w.material,
            Self::Foil(w) => &w.material,
        }
    }

    /// Coating of the wire (the bundle coating for litz).
    #[must_use]
    pub fn coating(&self) -> Option<&WireCoating> {
        match self {
            Self::Round(w) => w.coating.as_ref(),
            Self::Litz(w) => w.coating.as_ref(),
            Self::Rectangular(w) | Self::Planar(w) => w.coating.as_ref(),
            Self::Foil(w) => w.coating.as_ref(),
        }
    }

    /// Number of parallel conductors inside the wire: strands for litz,
    /// one otherwise.
    #[must_use]
    pub fn number_conductors(&self) -> usize {
        match self {
            Self::Litz(w) => w.number_conductors,
            _ => 1,
        }
    }

    /// The strand of a litz bundle.
    #[must_use]
    pub fn strand(&self) -> Option<&RoundWire> {
        match self {
            Self::Litz(w) => Some(&w.strand),
            _ => None,
        }
    }

    /// Total conducting cross section, in m².
    #[must_use]
    pub fn conducting_area(&self) -> f64 {
        match self {
            Self::Round(w) => PI / 4.0 * w.conducting_diameter.powi(2),
            Self::Litz(w) => {
                PI / 4.0 * w.strand.conducting_diameter.powi(2) * crate::convert::f64_from_usize(w.number_conductors)
            }
            Self::Rectangular(w) | Self::Planar(w) => w.conducting_width * w.conducting_height,
            Self::Foil(w) => w.conducting_width * w.conducting_height,
        }
    }

    /// Width over the coating, in m.
    #[must_use]
    pub fn maximum_outer_width(&self) -> f64 {
        match self {
            Self::Round(w) => w.outer_diameter.unwrap_or_else(|| round_outer_diameter(w)),
            Self::Litz(w) => w.outer_diameter.unwrap_or_else(|| litz_outer_diameter(w)),
            Self::Rectangular(w) | Self::Planar(w) => {
                w.outer_width.unwrap_or_else(|| rectangular_outer_dimension(w.conducting_width, w))
            }
            Self::Foil(w) => w.conducting_width + 2.0 * coating_thickness(w.coating.as_ref()),
        }
    }

    /// Height over the coating, in m.
    #[must_use]
    pub fn maximum_outer_height(&self) -> f64 {
        match self {
            Self::Round(_) | Self::Litz(_) => self.maximum_outer_width(),
            Self::Rectangular(w) | Self::Planar(w) => {
                w.outer_height.unwrap_or_else(|| rectangular_outer_dimension(w.conducting_height, w))
            }
            Self::Foil(w) => w.conducting_height + 2.0 * coating_thickness(w.coating.as_ref()),
        }
    }

    /// Largest of the outer dimensions, in m.
    #[must_use]
    pub fn maximum_outer_dimension(&self) -> f64 {
        self.maximum_outer_width().max(self.maximum_outer_height())
    }

    /// Bare conducting width, in m.
    #[must_use]
    pub fn maximum_conducting_width(&self) -> f64 {
        match self {
            Self::Round(w) => w.conducting_diameter,
            Self::Litz(w) => self.maximum_outer_width().min(
                w.strand.conducting_diameter * crate::convert::f64_from_usize(w.number_conductors).sqrt(),
            ),
            Self::Rectangular(w) | Self::Planar(w) => w.conducting_width,
            Self::Foil(w) => w.conducting_width,
        }
    }

    /// Bare conducting height, in m.
    #[must_use]
    pub fn maximum_conducting_height(&self) -> f64 {
        match self {
            Self::Round(_) | Self::Litz(_) => self.maximum_conducting_width(),
            Self::Rectangular(w) | Self::Planar(w) => w.conducting_height,
            Self::Foil(w) => w.conducting_height,
        }
    }

    /// Smallest bare conducting dimension, in m. This is the dimension skin
    /// depth competes against.
    #[must_use]
    pub fn minimum_conducting_dimension(&self) -> f64 {
        match self {
            Self::Round(w) => w.conducting_diameter,
            Self::Litz(w) => w.strand.conducting_diameter,
            Self::Rectangular(w) | Self::Planar(w) => w.conducting_width.min(w.conducting_height),
            Self::Foil(w) => w.conducting_width,
        }
    }

    /// A stable hash of the wire identity, used as cache key by the loss
    /// factor caches.
    #[must_use]
    pub fn identity_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = rustc_hash::FxHasher::default();
        if let Some(name) = self.name() {
            name.hash(&mut hasher);
        } else {
            self.maximum_outer_width().to_bits().hash(&mut hasher);
            self.maximum_outer_height().to_bits().hash(&mut hasher);
            self.number_conductors().hash(&mut hasher);
        }
        hasher.finish()
    }

    /// DC current density for an RMS current, per parallel, in A/m².
    #[must_use]
    pub fn dc_current_density(&self, current_rms: f64) -> f64 {
        current_rms / self.conducting_area()
    }

    /// Effective current density accounting for the skin-depth annulus at
    /// `frequency`, in A/m².
    ///
    /// # Errors
    ///
    /// Propagates material lookup failures.
    pub fn effective_current_density(&self, current_rms: f64, frequency: f64, temperature: f64) -> Result<f64> {
        Ok(current_rms / self.effective_conducting_area(frequency, temperature)?)
    }

    /// Conducting area reduced to the skin-depth shell at `frequency`,
    /// in m².
    ///
    /// # Errors
    ///
    /// Propagates material lookup failures.
    pub fn effective_conducting_area(&self, frequency: f64, temperature: f64) -> Result<f64> {
        let skin_depth = crate::skin::skin_depth_of_material(self.material_name(), frequency, temperature)?;
        let annulus = |diameter: f64| {
            let radius = diameter / 2.0;
            let core = (radius - skin_depth).max(0.0);
            PI * (radius * radius - core * core)
        };
        Ok(match self {
            Self::Round(w) => annulus(w.conducting_diameter),
            Self::Litz(w) => annulus(w.strand.conducting_diameter) * crate::convert::f64_from_usize(w.number_conductors),
            Self::Rectangular(w) | Self::Planar(w) => {
                let w_eff = w.conducting_width.min(2.0 * skin_depth);
                let h_eff = w.conducting_height.min(2.0 * skin_depth);
                (w.conducting_width * w.conducting_height
                    - (w.conducting_width - w_eff) * (w.conducting_height - h_eff))
                    .max(0.0)
            }
            Self::Foil(w) => w.conducting_width.min(2.0 * skin_depth) * w.conducting_height,
        })
    }

    /// Number of parallels needed to keep the effective current density
    /// under `maximum_density`.
    ///
    /// # Errors
    ///
    /// Propagates material lookup failures.
    pub fn number_parallels_needed(
        &self,
        current_rms: f64,
        frequency: f64,
        temperature: f64,
        maximum_density: f64,
    ) -> Result<usize> {
        let density = self.effective_current_density(current_rms, frequency, temperature)?;
        Ok((density / maximum_density).ceil().max(1.0) as usize)
    }

    /// Converts this wire into an equivalent one of `target` type with the
    /// same conducting area. Frequency guides the strand choice when the
    /// target is litz.
    ///
    /// # Errors
    ///
    /// Propagates material lookup failures.
    pub fn equivalent(&self, target: WireType, frequency: f64, temperature: f64) -> Result<Self> {
        let area = self.conducting_area();
        let material = self.material_name().to_owned();
        Ok(match target {
            WireType::Round => Self::Round(RoundWire {
                conducting_diameter: (4.0 * area / PI).sqrt(),
                material,
                coating: Some(WireCoating::enamelled(1)),
                ..RoundWire::default()
            }),
            WireType::Litz => {
                let skin_depth = crate::skin::skin_depth_of_material(&material, frequency, temperature)?;
                let strand_diameter = (2.0 * skin_depth).min((4.0 * area / PI).sqrt());
                let strand_area = PI / 4.0 * strand_diameter.powi(2);
                let number_conductors = (area / strand_area).ceil().max(1.0) as usize;
                Self::Litz(LitzWire {
                    name: None,
                    strand: RoundWire {
                        conducting_diameter: strand_diameter,
                        material,
                        coating: Some(WireCoating::enamelled(1)),
                        ..RoundWire::default()
                    },
                    number_conductors,
                    outer_diameter: None,
                    coating: Some(WireCoating {
                        kind: CoatingKind::Served,
                        number_layers: Some(1),
                        ..WireCoating::default()
                    }),
                })
            }
            WireType::Rectangular | WireType::Planar => {
                // keep a 2:1 aspect ratio unless the source already has one
                let (width, height) = match self {
                    Self::Rectangular(w) | Self::Planar(w) => (w.conducting_width, w.conducting_height),
                    _ => ((area * 2.0).sqrt(), (area / 2.0).sqrt()),
                };
                let scale = (area / (width * height)).sqrt();
                let wire = RectangularWire {
                    conducting_width: width * scale,
                    conducting_height: height * scale,
                    material,
                    coating: Some(WireCoating::enamelled(1)),
                    ..RectangularWire::default()
                };
                if target == WireType::Planar { Self::Planar(wire) } else { Self::Rectangular(wire) }
            }
            WireType::Foil => {
                let skin_depth = crate::skin::skin_depth_of_material(&material, frequency, temperature)?;
                let thickness = 2.0 * skin_depth;
                Self::Foil(FoilWire {
                    name: None,
                    conducting_width: thickness,
                    conducting_height: area / thickness,
                    material,
                    coating: None,
                })
            }
        })
    }
}

/// Discriminant of [`Wire`], for requesting conversions and filtering
/// adviser candidates.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    /// See [`Wire::Round`].
    Round,
    /// See [`Wire::Litz`].
    Litz,
    /// See [`Wire::Rectangular`].
    Rectangular,
    /// See [`Wire::Foil`].
    Foil,
    /// See [`Wire::Planar`].
    Planar,
}

impl Wire {
    /// Discriminant of this wire.
    #[must_use]
    pub const fn wire_type(&self) -> WireType {
        match self {
            Self::Round(_) => WireType::Round,
            Self::Litz(_) => WireType::Litz,
            Self::Rectangular(_) => WireType::Rectangular,
            Self::Foil(_) => WireType::Foil,
            Self::Planar(_) => WireType::Planar,
        }
    }

    /// Quick round enamelled wire sized so its diameter equals twice the
    /// skin depth at `frequency`, the adviser's dummy-turn construction.
    ///
    /// # Errors
    ///
    /// Propagates material lookup failures.
    pub fn for_frequency(frequency: f64, temperature: f64) -> Result<Self> {
        let skin_depth = crate::skin::skin_depth_of_material("copper", frequency, temperature)?;
        Ok(Self::Round(RoundWire {
            conducting_diameter: 2.0 * skin_depth,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        }))
    }
}

// Enamel build tables: nominal conducting diameter (m) against overall
// diameter (m), grade 1 to 3. Values follow the IEC 60317-0-1 and
// NEMA MW 1000 C maximum-overall-diameter columns.
const IEC_BUILD: [(f64, [f64; 3]); 8] = [
    (20e-6, [27e-6, 32e-6, 36e-6]),
    (50e-6, [62e-6, 69e-6, 78e-6]),
    (100e-6, [117e-6, 129e-6, 140e-6]),
    (200e-6, [226e-6, 245e-6, 263e-6]),
    (500e-6, [544e-6, 574e-6, 602e-6]),
    (1000e-6, [1062e-6, 1111e-6, 1155e-6]),
    (2000e-6, [2092e-6, 2156e-6, 2212e-6]),
    (5000e-6, [5177e-6, 5244e-6, 5305e-6]),
];

const NEMA_BUILD: [(f64, [f64; 3]); 8] = [
    (20e-6, [28e-6, 33e-6, 38e-6]),
    (50e-6, [64e-6, 71e-6, 80e-6]),
    (100e-6, [119e-6, 132e-6, 144e-6]),
    (200e-6, [229e-6, 249e-6, 268e-6]),
    (500e-6, [548e-6, 579e-6, 608e-6]),
    (1000e-6, [1067e-6, 1118e-6, 1163e-6]),
    (2000e-6, [2098e-6, 2164e-6, 2221e-6]),
    (5000e-6, [5186e-6, 5255e-6, 5318e-6]),
];

static BUILD_INTERPOLATORS: Lazy<RwLock<FxHashMap<(WireStandard, u32), interpolation::CubicSpline>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Overall diameter of an enamelled round conductor per the standard build
/// tables, in m.
#[must_use]
pub fn outer_diameter_round(conducting_diameter: f64, grade: u32, standard: WireStandard) -> f64 {
    let key = (standard, grade.clamp(1, 3));
    if let Some(interpolator) = BUILD_INTERPOLATORS.read().unwrap().get(&key) {
        return interpolator.evaluate(conducting_diameter).max(conducting_diameter);
    }
    let table = match standard {
        WireStandard::Iec60317 => &IEC_BUILD,
        WireStandard::NemaMw1000C => &NEMA_BUILD,
    };
    let column = (key.1 - 1) as usize;
    let (xs, ys): (Vec<_>, Vec<_>) = table.iter().map(|(d, outer)| (*d, outer[column])).unzip();
    let interpolator = interpolation::CubicSpline::new(xs, ys).unwrap_or_else(|_| unreachable!());
    let value = interpolator.evaluate(conducting_diameter).max(conducting_diameter);
    BUILD_INTERPOLATORS.write().unwrap().entry(key).or_insert(interpolator);
    value
}

/// Fraction of the outer cell actually filled with conductor for an
/// enamelled round wire.
#[must_use]
pub fn filling_factor_round(conducting_diameter: f64, grade: u32, standard: WireStandard) -> f64 {
    let outer = outer_diameter_round(conducting_diameter, grade, standard);
    (conducting_diameter / outer).powi(2)
}

fn round_outer_diameter(wire: &RoundWire) -> f64 {
    match wire.coating.as_ref() {
        None => wire.conducting_diameter,
        Some(coating) => match coating.kind {
            CoatingKind::Bare => wire.conducting_diameter,
            CoatingKind::Enamelled | CoatingKind::Served => {
                outer_diameter_round(wire.conducting_diameter, coating.grade.unwrap_or(1), wire.standard)
            }
            CoatingKind::Insulated => {
                wire.conducting_diameter
                    + 2.0 * f64::from(coating.number_layers.unwrap_or(1)) * coating.thickness_layers.unwrap_or(0.0)
            }
        },
    }
}

/// Serving thickness added per layer around a litz bundle, in m.
#[must_use]
pub fn serving_thickness_per_layer(bare_diameter: f64) -> f64 {
    if bare_diameter < 1e-3 { 40e-6 } else { 60e-6 }
}

fn litz_outer_diameter(wire: &LitzWire) -> f64 {
    // hexagonal packing of the strands, then the serving build
    let strand_outer = round_outer_diameter(&wire.strand);
    let packing_factor: f64 = 0.78;
    let bare = strand_outer * (crate::convert::f64_from_usize(wire.number_conductors) / packing_factor).sqrt();
    match wire.coating.as_ref() {
        Some(coating) if coating.kind == CoatingKind::Served => {
            bare + 2.0 * f64::from(coating.number_layers.unwrap_or(1)) * serving_thickness_per_layer(bare)
        }
        Some(coating) if coating.kind == CoatingKind::Insulated => {
            bare + 2.0 * f64::from(coating.number_layers.unwrap_or(1)) * coating.thickness_layers.unwrap_or(0.0)
        }
        _ => bare,
    }
}

fn rectangular_outer_dimension(conducting: f64, wire: &RectangularWire) -> f64 {
    match wire.coating.as_ref() {
        None => conducting,
        Some(coating) => match coating.kind {
            CoatingKind::Bare => conducting,
            // grade-1 build on rectangular wire adds roughly half the round build
            CoatingKind::Enamelled | CoatingKind::Served => {
                let grade = coating.grade.unwrap_or(1);
                let round_growth = outer_diameter_round(conducting, grade, wire.standard) - conducting;
                conducting + round_growth / 2.0
            }
            CoatingKind::Insulated => {
                conducting
                    + 2.0 * f64::from(coating.number_layers.unwrap_or(1)) * coating.thickness_layers.unwrap_or(0.0)
            }
        },
    }
}

fn coating_thickness(coating: Option<&WireCoating>) -> f64 {
    coating.map_or(0.0, |c| {
        f64::from(c.number_layers.unwrap_or(1)) * c.thickness_layers.unwrap_or(0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn coating_label_round_trip() {
        for coating in [
            WireCoating::enamelled(2),
            WireCoating {
                kind: CoatingKind::Served,
                number_layers: Some(1),
                ..WireCoating::default()
            },
            WireCoating {
                kind: CoatingKind::Insulated,
                number_layers: Some(3),
                thickness_layers: Some(4e-5),
                ..WireCoating::default()
            },
            WireCoating {
                kind: CoatingKind::Bare,
                ..WireCoating::default()
            },
        ] {
            let decoded = WireCoating::decode_label(&coating.encode_label()).unwrap();
            assert_eq!(decoded.kind, coating.kind);
            assert_eq!(decoded.grade, coating.grade);
            assert_eq!(decoded.number_layers, coating.number_layers);
            assert_eq!(decoded.thickness_layers, coating.thickness_layers);
        }
    }

    #[test]
    fn build_tables_are_monotone() {
        let mut previous_outer = 0.0;
        let mut previous_area = 0.0;
        for diameter in [30e-6, 80e-6, 150e-6, 400e-6, 900e-6, 3e-3] {
            let outer = outer_diameter_round(diameter, 1, WireStandard::Iec60317);
            assert!(outer > diameter);
            assert!(outer > previous_outer);
            let area = PI / 4.0 * diameter * diameter;
            assert!(area > previous_area);
            previous_outer = outer;
            previous_area = area;
        }
    }

    #[test]
    fn higher_grades_grow_the_outer_diameter() {
        let g1 = outer_diameter_round(0.5e-3, 1, WireStandard::Iec60317);
        let g2 = outer_diameter_round(0.5e-3, 2, WireStandard::Iec60317);
        let g3 = outer_diameter_round(0.5e-3, 3, WireStandard::Iec60317);
        assert!(g1 < g2 && g2 < g3);
        assert!(filling_factor_round(0.5e-3, 1, WireStandard::Iec60317) > filling_factor_round(0.5e-3, 3, WireStandard::Iec60317));
    }

    #[test]
    fn litz_to_round_equivalent_preserves_area() {
        let litz = Wire::Litz(LitzWire {
            name: None,
            strand: RoundWire {
                conducting_diameter: 0.05e-3,
                material: "copper".to_owned(),
                coating: Some(WireCoating::enamelled(1)),
                ..RoundWire::default()
            },
            number_conductors: 1000,
            outer_diameter: None,
            coating: Some(WireCoating {
                kind: CoatingKind::Served,
                number_layers: Some(1),
                ..WireCoating::default()
            }),
        });
        let round = litz.equivalent(WireType::Round, 100e3, 25.0).unwrap();
        assert_eq!(round.number_conductors(), 1);
        let Wire::Round(round) = &round else { panic!("expected a round wire") };
        // 1000 strands of 0.05 mm collapse to roughly 1.6 mm
        assert_approx_eq!(f64, round.conducting_diameter, 1.5811e-3, epsilon = 1.6e-3 * 0.05);
        assert_approx_eq!(f64, litz.conducting_area(), PI / 4.0 * round.conducting_diameter.powi(2), epsilon = 1e-12);
    }
}
