//! Core shape descriptors.

use serde::{Deserialize, Serialize};

/// Standard shape family of a core.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreShapeFamily {
    /// Classic E core.
    E,
    /// EQ core.
    Eq,
    /// ETD core.
    Etd,
    /// PQ core.
    Pq,
    /// U core.
    U,
    /// UI core.
    Ui,
    /// PQI core.
    Pqi,
    /// Toroid.
    T,
}

impl CoreShapeFamily {
    /// Whether cores of this family can be stacked side by side.
    #[must_use]
    pub const fn stackable(self) -> bool {
        matches!(self, Self::E | Self::T | Self::U)
    }
}

/// Cross-sectional shape of a column.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnShape {
    /// Rectangular cross section.
    #[default]
    Rectangular,
    /// Round cross section (ETD/PQ central columns, toroids).
    Round,
}

/// Geometric descriptor of a standard core shape.
///
/// Outline and window dimensions parameterize the processed geometry; the
/// effective parameters carry the values published by the shape standard,
/// which the reluctance path uses directly.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CoreShape {
    /// Catalogue name, e.g. "ETD 49".
    pub name: String,
    /// Shape family.
    pub family: CoreShapeFamily,
    /// Overall width, in m. Outer diameter for toroids.
    pub width: f64,
    /// Overall height of the assembled core set, in m.
    pub height: f64,
    /// Overall depth, in m. Equals the height for toroids.
    pub depth: f64,
    /// Width (or diameter) of the central column, in m. Radial thickness of
    /// the ring for toroids.
    pub central_column_width: f64,
    /// Cross-sectional shape of the central column.
    #[serde(default)]
    pub central_column_shape: ColumnShape,
    /// Winding window width (radial build), in m.
    pub winding_window_width: f64,
    /// Winding window height (axial), in m. Inner diameter for toroids.
    pub winding_window_height: f64,
    /// Effective magnetic cross section `A_e`, in m².
    pub effective_area: f64,
    /// Effective magnetic path length `l_e`, in m.
    pub effective_length: f64,
    /// Effective magnetic volume `V_e`, in m³.
    pub effective_volume: f64,
    /// Minimum magnetic cross section, in m².
    pub minimum_area: f64,
}

impl CoreShape {
    /// Area of one winding window, in m².
    #[must_use]
    pub fn winding_window_area(&self) -> f64 {
        if self.family == CoreShapeFamily::T {
            // the full bore of the toroid
            std::f64::consts::PI / 4.0 * self.winding_window_height.powi(2)
        } else {
            self.winding_window_width * self.winding_window_height
        }
    }

    /// Rough mean turn length around the central column, in m.
    #[must_use]
    pub fn mean_turn_length(&self) -> f64 {
        match self.central_column_shape {
            ColumnShape::Round => std::f64::consts::PI * (self.central_column_width + self.winding_window_width),
            ColumnShape::Rectangular => {
                2.0 * (self.central_column_width + self.depth) + std::f64::consts::PI * self.winding_window_width
            }
        }
    }
}
