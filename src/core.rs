//! Cores: shape + material + gapping, and the processed geometry derived
//! from them.

use crate::constants;
use crate::error::{Error, Result};
use crate::material::CoreMaterial;
use crate::shape::{ColumnShape, CoreShape, CoreShapeFamily};
use serde::{Deserialize, Serialize};

/// How an air gap is realized.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    /// Ground into a column.
    Subtractive,
    /// Spacer between the half sets.
    Additive,
    /// The grinding tolerance every mated surface keeps.
    Residual,
}

/// An air gap in the magnetic path.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CoreGap {
    /// How the gap is realized.
    #[serde(rename = "type")]
    pub gap_type: GapType,
    /// Gap length along the flux path, in m.
    pub length: f64,
    /// Cross section of the gapped column `[width, depth]`, in m. Filled by
    /// gap processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_dimensions: Option<[f64; 2]>,
    /// Position of the gap center `[x, y]`, in m. Filled by gap processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<[f64; 2]>,
    /// Cross-sectional area of the gapped column, in m². Filled by gap
    /// processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    /// Shape of the gapped column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ColumnShape>,
}

impl CoreGap {
    /// A subtractive gap of the given length, to be placed by gap
    /// processing.
    #[must_use]
    pub const fn subtractive(length: f64) -> Self {
        Self {
            gap_type: GapType::Subtractive,
            length,
            section_dimensions: None,
            coordinates: None,
            area: None,
            shape: None,
        }
    }

    /// An additive (spacer) gap of the given length.
    #[must_use]
    pub const fn additive(length: f64) -> Self {
        Self {
            gap_type: GapType::Additive,
            length,
            section_dimensions: None,
            coordinates: None,
            area: None,
            shape: None,
        }
    }

    /// The residual gap every mated surface keeps.
    #[must_use]
    pub const fn residual() -> Self {
        Self {
            gap_type: GapType::Residual,
            length: constants::RESIDUAL_GAP,
            section_dimensions: None,
            coordinates: None,
            area: None,
            shape: None,
        }
    }
}

/// A column of the processed core geometry.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Column {
    /// Position of the column center `[x, y]`, in m.
    pub coordinates: [f64; 2],
    /// Column width (or diameter), in m.
    pub width: f64,
    /// Column depth, in m.
    pub depth: f64,
    /// Column height, in m.
    pub height: f64,
    /// Cross-sectional area, in m².
    pub area: f64,
    /// Cross-sectional shape.
    pub shape: ColumnShape,
}

/// Shape of a winding window.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindingWindowShape {
    /// Rectangular window beside the central column.
    Rectangular,
    /// Circular bore of a toroid.
    Round,
}

/// A winding window of the processed core geometry.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WindingWindow {
    /// Window shape.
    pub shape: WindingWindowShape,
    /// Position of the window center `[x, y]`, in m.
    pub coordinates: [f64; 2],
    /// Radial width of the window, in m. Absent for round windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Axial height of the window, in m. Absent for round windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Radial build available in a round window, in m.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radial_height: Option<f64>,
    /// Window area, in m².
    pub area: f64,
}

/// Effective magnetic parameters of the processed core.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct EffectiveParameters {
    /// Effective cross section `A_e`, in m².
    pub effective_area: f64,
    /// Effective path length `l_e`, in m.
    pub effective_length: f64,
    /// Effective volume `V_e`, in m³.
    pub effective_volume: f64,
    /// Minimum cross section along the path, in m².
    pub minimum_area: f64,
}

/// Processed geometry derived from the functional description.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProcessedCore {
    /// Columns, the central one first.
    pub columns: Vec<Column>,
    /// Winding windows.
    pub winding_windows: Vec<WindingWindow>,
    /// Effective magnetic parameters, already scaled by the stack count.
    pub effective_parameters: EffectiveParameters,
    /// Envelope width, in m.
    pub width: f64,
    /// Envelope height, in m.
    pub height: f64,
    /// Envelope depth (stack included), in m.
    pub depth: f64,
}

/// A magnetic core.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Core {
    /// Shape descriptor.
    pub shape: CoreShape,
    /// Material record.
    pub material: CoreMaterial,
    /// Air gaps along the path. Completed with residual gaps by
    /// [`Self::process_gapping`].
    #[serde(default)]
    pub gapping: Vec<CoreGap>,
    /// Number of stacked core sets.
    #[serde(default = "default_stacks")]
    pub number_stacks: usize,
    /// Derived geometry; populated by [`Self::process`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<ProcessedCore>,
}

const fn default_stacks() -> usize {
    1
}

impl Core {
    /// Builds a core and processes its geometry and gapping.
    ///
    /// # Errors
    ///
    /// Propagates processing failures.
    pub fn new(shape: CoreShape, material: CoreMaterial, gapping: Vec<CoreGap>, number_stacks: usize) -> Result<Self> {
        let mut core = Self {
            shape,
            material,
            gapping,
            number_stacks: number_stacks.max(1),
            processed: None,
        };
        core.process()?;
        Ok(core)
    }

    /// Recomputes the processed geometry and gap placement. Deterministic:
    /// reprocessing an already processed core yields the same result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on non-physical shape dimensions.
    pub fn process(&mut self) -> Result<()> {
        if self.shape.effective_area <= 0.0 || self.shape.effective_length <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "shape {} has no effective parameters",
                self.shape.name
            )));
        }
        let stacks = crate::convert::f64_from_usize(self.number_stacks);
        let shape = &self.shape;

        let (columns, winding_windows, depth) = if shape.family == CoreShapeFamily::T {
            let column = Column {
                coordinates: [shape.width / 2.0 - shape.central_column_width / 2.0, 0.0],
                width: shape.central_column_width,
                depth: shape.depth * stacks,
                height: shape.height * stacks,
                area: shape.central_column_width * shape.depth * stacks,
                shape: ColumnShape::Round,
            };
            let window = WindingWindow {
                shape: WindingWindowShape::Round,
                coordinates: [0.0, 0.0],
                width: None,
                height: None,
                radial_height: Some(shape.winding_window_height / 2.0),
                area: shape.winding_window_area(),
            };
            (vec![column], vec![window], shape.depth * stacks)
        } else {
            let window_height = shape.winding_window_height;
            let central = Column {
                coordinates: [0.0, 0.0],
                width: shape.central_column_width,
                depth: shape.depth * stacks,
                height: window_height,
                area: shape.effective_area * stacks,
                shape: shape.central_column_shape,
            };
            let lateral_width = (shape.width - shape.central_column_width - 2.0 * shape.winding_window_width) / 2.0;
            let lateral_offset = shape.width / 2.0 - lateral_width / 2.0;
            let lateral = |x: f64| Column {
                coordinates: [x, 0.0],
                width: lateral_width.max(shape.central_column_width / 4.0),
                depth: shape.depth * stacks,
                height: window_height,
                area: shape.effective_area * stacks / 2.0,
                shape: ColumnShape::Rectangular,
            };
            let window = |x: f64| WindingWindow {
                shape: WindingWindowShape::Rectangular,
                coordinates: [x, 0.0],
                width: Some(shape.winding_window_width),
                height: Some(window_height),
                radial_height: None,
                area: shape.winding_window_area(),
            };
            let window_x = shape.central_column_width / 2.0 + shape.winding_window_width / 2.0;
            (
                vec![central, lateral(lateral_offset), lateral(-lateral_offset)],
                vec![window(window_x), window(-window_x)],
                shape.depth * stacks,
            )
        };

        self.processed = Some(ProcessedCore {
            columns,
            winding_windows,
            effective_parameters: EffectiveParameters {
                effective_area: shape.effective_area * stacks,
                effective_length: shape.effective_length,
                effective_volume: shape.effective_volume * stacks,
                minimum_area: shape.minimum_area * stacks,
            },
            width: shape.width,
            height: shape.height,
            depth,
        });
        self.process_gapping()
    }

    /// Places the functional gapping onto the processed columns and
    /// completes it with residual gaps where a column has none.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoreNotProcessed`] before [`Self::process`] and
    /// [`Error::Gap`] on non-physical gap lengths.
    pub fn process_gapping(&mut self) -> Result<()> {
        let processed = self
            .processed
            .as_ref()
            .ok_or_else(|| Error::CoreNotProcessed("process the core before its gapping".to_owned()))?;
        let columns = processed.columns.clone();

        for gap in &self.gapping {
            if gap.length < 0.0 || !gap.length.is_finite() {
                return Err(Error::Gap(format!("gap length {} is not physical", gap.length)));
            }
        }

        // explicit subtractive/additive gaps go on the central column;
        // every column without an explicit gap gets a residual one
        let mut placed: Vec<CoreGap> = Vec::new();
        let mut lateral_covered = false;
        for gap in &self.gapping {
            let column = match gap.gap_type {
                GapType::Subtractive | GapType::Residual => &columns[0],
                GapType::Additive => {
                    lateral_covered = true;
                    &columns[0]
                }
            };
            let mut gap = gap.clone();
            gap.length = gap.length.max(constants::RESIDUAL_GAP);
            gap.section_dimensions = Some([column.width, column.depth]);
            gap.coordinates = Some([column.coordinates[0], 0.0]);
            gap.area = Some(column.area);
            gap.shape = Some(column.shape);
            placed.push(gap);
        }
        if self.gapping.iter().all(|g| g.gap_type != GapType::Subtractive)
            && self.gapping.iter().all(|g| g.gap_type != GapType::Additive)
            && placed.is_empty()
        {
            let column = &columns[0];
            let mut gap = CoreGap::residual();
            gap.section_dimensions = Some([column.width, column.depth]);
            gap.coordinates = Some([column.coordinates[0], 0.0]);
            gap.area = Some(column.area);
            gap.shape = Some(column.shape);
            placed.push(gap);
        }
        if !lateral_covered {
            for column in columns.iter().skip(1) {
                let mut gap = CoreGap::residual();
                gap.section_dimensions = Some([column.width, column.depth]);
                gap.coordinates = Some([column.coordinates[0], 0.0]);
                gap.area = Some(column.area);
                gap.shape = Some(column.shape);
                placed.push(gap);
            }
        } else {
            for column in columns.iter().skip(1) {
                let mut gap = CoreGap::additive(
                    self.gapping
                        .iter()
                        .find(|g| g.gap_type == GapType::Additive)
                        .map_or(constants::RESIDUAL_GAP, |g| g.length),
                );
                gap.section_dimensions = Some([column.width, column.depth]);
                gap.coordinates = Some([column.coordinates[0], 0.0]);
                gap.area = Some(column.area);
                gap.shape = Some(column.shape);
                placed.push(gap);
            }
        }
        self.gapping = placed;
        Ok(())
    }

    /// Processed geometry accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoreNotProcessed`] when [`Self::process`] has not
    /// run.
    pub fn processed(&self) -> Result<&ProcessedCore> {
        self.processed
            .as_ref()
            .ok_or_else(|| Error::CoreNotProcessed(format!("core on shape {}", self.shape.name)))
    }

    /// Whether the core carries any non-residual gap.
    #[must_use]
    pub fn is_gapped(&self) -> bool {
        self.gapping.iter().any(|g| g.gap_type != GapType::Residual)
    }

    /// Initial permeability of the material at the given conditions.
    ///
    /// # Errors
    ///
    /// Propagates material curve failures.
    pub fn initial_permeability(&self, temperature: f64, h_dc: Option<f64>, frequency: Option<f64>) -> Result<f64> {
        self.material.initial_permeability(temperature, h_dc, frequency)
    }

    /// Saturation flux density of the material at `temperature` °C, in T.
    ///
    /// # Errors
    ///
    /// Propagates material curve failures.
    pub fn saturation_magnetic_flux_density(&self, temperature: f64) -> Result<f64> {
        self.material.saturation_magnetic_flux_density(temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use float_cmp::assert_approx_eq;

    #[test]
    fn processing_is_deterministic() {
        let shape = catalogue::find_core_shape_by_name("ETD 49").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let mut core = Core::new(shape, material, vec![], 1).unwrap();
        let first = core.processed.clone().unwrap();
        core.process().unwrap();
        assert_eq!(first, core.processed.unwrap());
    }

    #[test]
    fn residual_gaps_cover_every_column() {
        let shape = catalogue::find_core_shape_by_name("ETD 49").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let core = Core::new(shape, material, vec![], 1).unwrap();
        assert_eq!(core.gapping.len(), core.processed().unwrap().columns.len());
        assert!(core.gapping.iter().all(|g| g.gap_type == GapType::Residual));
        assert!(!core.is_gapped());
    }

    #[test]
    fn stacking_scales_the_effective_area() {
        let shape = catalogue::find_core_shape_by_name("E 25/13/7").unwrap();
        let material = catalogue::find_core_material_by_name("N87").unwrap();
        let single = Core::new(shape.clone(), material.clone(), vec![], 1).unwrap();
        let double = Core::new(shape, material, vec![], 2).unwrap();
        assert_approx_eq!(
            f64,
            double.processed().unwrap().effective_parameters.effective_area,
            2.0 * single.processed().unwrap().effective_parameters.effective_area,
            epsilon = 1e-12
        );
    }
}
