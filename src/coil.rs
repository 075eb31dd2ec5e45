//! Coils: windings, the bobbin they are wound on, and the turn placement
//! the physics core consumes.

use crate::core::{Core, WindingWindow, WindingWindowShape};
use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::shape::{ColumnShape, CoreShapeFamily};
use crate::wire::Wire;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Isolation side a winding belongs to.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationSide {
    /// Primary side.
    #[default]
    Primary,
    /// Secondary side.
    Secondary,
    /// Tertiary side.
    Tertiary,
    /// Quaternary side.
    Quaternary,
}

/// Functional description of one winding.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Winding {
    /// Winding name, unique within the coil.
    pub name: String,
    /// Isolation side.
    #[serde(default)]
    pub isolation_side: IsolationSide,
    /// Number of series turns.
    pub number_turns: usize,
    /// Number of parallel conductors per turn.
    pub number_parallels: usize,
    /// Wire the winding is made of.
    pub wire: Wire,
}

/// Bobbin: the winding window reduced to its usable area.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Bobbin {
    /// Usable winding windows.
    pub winding_windows: Vec<WindingWindow>,
    /// Shape of the windows.
    pub winding_window_shape: WindingWindowShape,
}

impl Bobbin {
    /// Derives a quick bobbin from the core: the first winding window
    /// shrunk by a wall allowance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoreNotProcessed`] on an unprocessed core.
    pub fn quick_from_core(core: &Core) -> Result<Self> {
        let processed = core.processed()?;
        let window = processed
            .winding_windows
            .first()
            .ok_or_else(|| Error::CoreNotProcessed("core has no winding window".to_owned()))?;
        let mut usable = window.clone();
        if window.shape == WindingWindowShape::Rectangular {
            let wall = (window.width.unwrap_or(0.0) * 0.1).min(1e-3);
            let width = (window.width.unwrap_or(0.0) - wall).max(0.0);
            let height = (window.height.unwrap_or(0.0) - 2.0 * wall).max(0.0);
            usable.width = Some(width);
            usable.height = Some(height);
            usable.area = width * height;
            usable.coordinates = [window.coordinates[0] + wall / 2.0, window.coordinates[1]];
        }
        Ok(Self {
            winding_windows: vec![usable],
            winding_window_shape: window.shape,
        })
    }
}

/// Conduction or insulation region.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectricalType {
    /// Carries current.
    #[default]
    Conduction,
    /// Separates windings.
    Insulation,
}

/// A radial slice of the winding window holding one winding's layers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Section {
    /// Section name.
    pub name: String,
    /// Winding wound in the section, when conducting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winding: Option<String>,
    /// Section dimensions `[width, height]`, in m.
    pub dimensions: [f64; 2],
    /// Section center `[x, y]`, in m.
    pub coordinates: [f64; 2],
    /// Conduction or insulation.
    pub electrical_type: ElectricalType,
}

/// One layer of turns inside a section.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Layer {
    /// Layer name.
    pub name: String,
    /// Section the layer belongs to.
    pub section: String,
    /// Winding wound in the layer, when conducting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winding: Option<String>,
    /// Layer dimensions `[width, height]`, in m.
    pub dimensions: [f64; 2],
    /// Layer center `[x, y]`, in m.
    pub coordinates: [f64; 2],
    /// Conduction or insulation.
    pub electrical_type: ElectricalType,
    /// Turns placed in the layer.
    pub number_turns: usize,
}

/// Cross-sectional shape of a placed turn.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnCrossSection {
    /// Round conductor.
    #[default]
    Round,
    /// Rectangular conductor.
    Rectangular,
}

/// One physical loop of conductor.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Turn {
    /// Winding the turn belongs to.
    pub winding: String,
    /// Parallel index within the winding.
    pub parallel: usize,
    /// Turn center `[x, y]` in the window plane, in m.
    pub coordinates: [f64; 2],
    /// Mean length of the loop, in m.
    pub length: f64,
    /// Conductor outline `[width, height]`, in m.
    pub dimensions: [f64; 2],
    /// Conductor cross-sectional shape.
    pub cross_sectional_shape: TurnCrossSection,
    /// Rotation of the turn in degrees; toroids only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Section the turn was placed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A full coil: windings, bobbin and the derived turn placement.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Coil {
    /// Windings, primary first.
    pub functional_description: Vec<Winding>,
    /// Bobbin the coil is wound on.
    pub bobbin: Bobbin,
    /// Placed turns; populated by [`Self::wind`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turns_description: Option<Vec<Turn>>,
    /// Sections; populated by [`Self::wind`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_description: Option<Vec<Section>>,
    /// Layers; populated by [`Self::wind`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers_description: Option<Vec<Layer>>,
    /// Whether the turns geometrically fit the bobbin.
    #[serde(default)]
    pub fits: bool,
}

impl Coil {
    /// Builds an unwound coil on a quick bobbin derived from `core`.
    ///
    /// # Errors
    ///
    /// Propagates bobbin derivation failures.
    pub fn new(windings: Vec<Winding>, core: &Core) -> Result<Self> {
        Ok(Self {
            functional_description: windings,
            bobbin: Bobbin::quick_from_core(core)?,
            turns_description: None,
            sections_description: None,
            layers_description: None,
            fits: false,
        })
    }

    /// Index of the winding called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceMissing`] when no winding matches.
    pub fn winding_index_by_name(&self, name: &str) -> Result<usize> {
        self.functional_description
            .iter()
            .position(|w| w.name == name)
            .ok_or_else(|| Error::ResourceMissing(format!("winding {name}")))
    }

    /// Wire of winding `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the index is out of range.
    pub fn wire(&self, index: usize) -> Result<&Wire> {
        self.functional_description
            .get(index)
            .map(|w| &w.wire)
            .ok_or_else(|| Error::InvalidInput(format!("winding {index} does not exist")))
    }

    /// Wires of all windings, in winding order.
    #[must_use]
    pub fn wires(&self) -> Vec<&Wire> {
        self.functional_description.iter().map(|w| &w.wire).collect()
    }

    /// Number of physical turns (series turns times parallels) summed over
    /// the windings.
    #[must_use]
    pub fn number_physical_turns(&self) -> usize {
        self.functional_description
            .iter()
            .map(|w| w.number_turns * w.number_parallels)
            .sum()
    }

    /// Turns accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoilNotWound`] before [`Self::wind`].
    pub fn turns(&self) -> Result<&[Turn]> {
        self.turns_description
            .as_deref()
            .ok_or_else(|| Error::CoilNotWound("coil has no turns description".to_owned()))
    }

    /// Winds the coil with one section per winding, in winding order.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::wind_with_pattern`] failures.
    pub fn wind(&mut self, core: &Core) -> Result<()> {
        let pattern: Vec<usize> = (0..self.functional_description.len()).collect();
        self.wind_with_pattern(core, &pattern)
    }

    /// Winds the coil with sections ordered by `pattern` (winding indexes,
    /// possibly repeated for interleaving). Each winding's turns are split
    /// evenly across its sections and placed on a grid of the wire's outer
    /// dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on an empty or out-of-range pattern
    /// and [`Error::CoilNotWound`] when the turns do not fit and settings
    /// do not allow overflowing the window.
    pub fn wind_with_pattern(&mut self, core: &Core, pattern: &[usize]) -> Result<()> {
        if pattern.is_empty() || pattern.iter().any(|&i| i >= self.functional_description.len()) {
            return Err(Error::InvalidInput("bad interleaving pattern".to_owned()));
        }
        if core.shape.family == CoreShapeFamily::T {
            return self.wind_toroidal(core);
        }

        let window = self.bobbin.winding_windows[0].clone();
        let window_width = window.width.unwrap_or(0.0);
        let window_height = window.height.unwrap_or(0.0);
        let window_left = window.coordinates[0] - window_width / 2.0;

        // split the window radially, one slice per pattern entry, sized by
        // the share of copper each slice holds
        let share = |index: usize| -> f64 {
            let winding = &self.functional_description[index];
            let wire_area = winding.wire.maximum_outer_width() * winding.wire.maximum_outer_height();
            wire_area * crate::convert::f64_from_usize(winding.number_turns * winding.number_parallels)
        };
        let pattern_count = |index: usize| pattern.iter().filter(|&&p| p == index).count();
        let total_share: f64 = pattern.iter().map(|&i| share(i) / crate::convert::f64_from_usize(pattern_count(i))).sum();

        let mut sections = Vec::new();
        let mut layers = Vec::new();
        let mut turns = Vec::new();
        let mut fits = true;
        let mut cursor = window_left;
        let mut turns_placed_per_winding = vec![0_usize; self.functional_description.len()];
        let mut slots_seen_per_winding = vec![0_usize; self.functional_description.len()];

        for (slot, &winding_index) in pattern.iter().enumerate() {
            let winding = &self.functional_description[winding_index];
            let slice_share = share(winding_index) / crate::convert::f64_from_usize(pattern_count(winding_index));
            let section_width = if total_share > 0.0 { window_width * slice_share / total_share } else { 0.0 };
            let section_name = format!("section {slot} ({})", winding.name);
            sections.push(Section {
                name: section_name.clone(),
                winding: Some(winding.name.clone()),
                dimensions: [section_width, window_height],
                coordinates: [cursor + section_width / 2.0, window.coordinates[1]],
                electrical_type: ElectricalType::Conduction,
            });

            let wire_width = winding.wire.maximum_outer_width();
            let wire_height = winding.wire.maximum_outer_height();
            let physical_turns = winding.number_turns * winding.number_parallels;
            let winding_slot = slots_seen_per_winding[winding_index];
            slots_seen_per_winding[winding_index] += 1;
            let turns_this_section = physical_turns / pattern_count(winding_index)
                + usize::from(winding_slot < physical_turns % pattern_count(winding_index));
            let turns_per_layer = ((window_height / wire_height).floor() as usize).max(1);
            let layers_needed = turns_this_section.div_ceil(turns_per_layer);
            let layers_available = ((section_width / wire_width).floor() as usize).max(1);
            if layers_needed > layers_available {
                fits = false;
            }

            let cross_section = match winding.wire {
                Wire::Round(_) | Wire::Litz(_) => TurnCrossSection::Round,
                _ => TurnCrossSection::Rectangular,
            };
            let column = &core.processed()?.columns[0];
            for layer_index in 0..layers_needed {
                let layer_x = cursor + wire_width * (crate::convert::f64_from_usize(layer_index) + 0.5);
                let turns_in_layer = turns_per_layer.min(turns_this_section - layer_index * turns_per_layer);
                layers.push(Layer {
                    name: format!("{section_name} layer {layer_index}"),
                    section: section_name.clone(),
                    winding: Some(winding.name.clone()),
                    dimensions: [wire_width, window_height],
                    coordinates: [layer_x, window.coordinates[1]],
                    electrical_type: ElectricalType::Conduction,
                    number_turns: turns_in_layer,
                });
                for row in 0..turns_in_layer {
                    let y = window.coordinates[1] - window_height / 2.0
                        + wire_height * (crate::convert::f64_from_usize(row) + 0.5);
                    let radial_build = layer_x - column.width / 2.0;
                    let length = match column.shape {
                        ColumnShape::Round => PI * 2.0_f64.mul_add(radial_build, column.width),
                        ColumnShape::Rectangular => {
                            2.0 * (column.width + column.depth) + 2.0 * PI * radial_build
                        }
                    };
                    let placed = turns_placed_per_winding[winding_index];
                    turns.push(Turn {
                        winding: winding.name.clone(),
                        parallel: placed % winding.number_parallels,
                        coordinates: [layer_x, y],
                        length,
                        dimensions: [wire_width, wire_height],
                        cross_sectional_shape: cross_section,
                        rotation: None,
                        section: Some(section_name.clone()),
                    });
                    turns_placed_per_winding[winding_index] += 1;
                }
            }
            cursor += section_width;
        }

        if !fits && !Settings::snapshot().coil_wind_even_if_not_fit {
            self.fits = false;
            return Err(Error::CoilNotWound(
                "turns do not fit the winding window".to_owned(),
            ));
        }
        self.fits = fits;
        self.sections_description = Some(sections);
        self.layers_description = Some(layers);
        self.turns_description = Some(turns);
        Ok(())
    }

    fn wind_toroidal(&mut self, core: &Core) -> Result<()> {
        let processed = core.processed()?;
        let window = &processed.winding_windows[0];
        let bore_radius = window.radial_height.unwrap_or(0.0);
        let mut turns = Vec::new();
        let total_physical: usize = self.number_physical_turns();
        let mut angle: f64 = 0.0;
        for winding in &self.functional_description {
            let wire_width = winding.wire.maximum_outer_width();
            let radius = bore_radius - wire_width / 2.0;
            let physical = winding.number_turns * winding.number_parallels;
            let step = 360.0 / crate::convert::f64_from_usize(total_physical);
            let mean_length = 2.0 * (winding.wire.maximum_outer_width() + processed.columns[0].width)
                + 2.0 * processed.columns[0].depth;
            for index in 0..physical {
                let radians = angle.to_radians();
                turns.push(Turn {
                    winding: winding.name.clone(),
                    parallel: index % winding.number_parallels,
                    coordinates: [radius * radians.cos(), radius * radians.sin()],
                    length: mean_length,
                    dimensions: [wire_width, winding.wire.maximum_outer_height()],
                    cross_sectional_shape: TurnCrossSection::Round,
                    rotation: Some(angle),
                    section: None,
                });
                angle += step;
            }
        }
        self.fits = true;
        self.turns_description = Some(turns);
        self.sections_description = None;
        self.layers_description = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::wire::{RoundWire, WireCoating};

    fn coil_on_etd49(turns: usize) -> (Core, Coil) {
        let shape = catalogue::find_core_shape_by_name("ETD 49").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let core = Core::new(shape, material, vec![], 1).unwrap();
        let winding = Winding {
            name: "primary".to_owned(),
            isolation_side: IsolationSide::Primary,
            number_turns: turns,
            number_parallels: 1,
            wire: Wire::Round(RoundWire {
                conducting_diameter: 0.5e-3,
                material: "copper".to_owned(),
                coating: Some(WireCoating::enamelled(1)),
                ..RoundWire::default()
            }),
        };
        let coil = Coil::new(vec![winding], &core).unwrap();
        (core, coil)
    }

    #[test]
    fn every_turn_maps_to_its_winding() {
        let (core, mut coil) = coil_on_etd49(42);
        coil.wind(&core).unwrap();
        let turns = coil.turns().unwrap();
        assert_eq!(turns.len(), 42);
        assert!(turns.iter().all(|t| t.winding == "primary"));
        assert!(coil.fits);
    }

    #[test]
    fn turns_sit_inside_the_window() {
        let (core, mut coil) = coil_on_etd49(42);
        coil.wind(&core).unwrap();
        let window = &coil.bobbin.winding_windows[0];
        let half_width = window.width.unwrap() / 2.0;
        let half_height = window.height.unwrap() / 2.0;
        for turn in coil.turns().unwrap() {
            assert!((turn.coordinates[0] - window.coordinates[0]).abs() <= half_width + 1e-9);
            assert!((turn.coordinates[1] - window.coordinates[1]).abs() <= half_height + 1e-9);
            assert!(turn.length > 0.0);
        }
    }
}
