//! Design requirements and the full input record the advisers consume.

use crate::error::{Error, Result};
use crate::signal::OperatingPoint;
use serde::{Deserialize, Serialize};

/// A dimension with an optional tolerance window.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DimensionWithTolerance {
    /// Lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    /// Nominal value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,
    /// Upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl DimensionWithTolerance {
    /// An exact requirement with no tolerance.
    #[must_use]
    pub const fn nominal(value: f64) -> Self {
        Self {
            minimum: None,
            nominal: Some(value),
            maximum: None,
        }
    }

    /// A requirement spanning `[minimum, maximum]`.
    #[must_use]
    pub const fn between(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum: Some(minimum),
            nominal: None,
            maximum: Some(maximum),
        }
    }

    /// The single value the requirement resolves to: nominal when present,
    /// otherwise the mean of the bounds.
    #[must_use]
    pub fn resolve(&self) -> f64 {
        if let Some(nominal) = self.nominal {
            return nominal;
        }
        match (self.minimum, self.maximum) {
            (Some(lo), Some(hi)) => (lo + hi) / 2.0,
            (Some(lo), None) => lo,
            (None, Some(hi)) => hi,
            (None, None) => 0.0,
        }
    }

    /// The largest admissible value.
    #[must_use]
    pub fn resolve_maximum(&self) -> f64 {
        self.maximum.unwrap_or_else(|| self.resolve())
    }

    /// The smallest admissible value.
    #[must_use]
    pub fn resolve_minimum(&self) -> f64 {
        self.minimum.unwrap_or_else(|| self.resolve())
    }

    /// Whether `value` satisfies the requirement. A bare nominal admits a
    /// ±10% band, the tolerance the advisers grant by default.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match (self.minimum, self.maximum) {
            (Some(lo), Some(hi)) => value >= lo && value <= hi,
            (Some(lo), None) => value >= lo,
            (None, Some(hi)) => value <= hi,
            (None, None) => self
                .nominal
                .is_none_or(|nominal| (value - nominal).abs() <= nominal.abs() * 0.1),
        }
    }
}

/// Insulation coordination standards the engine knows about.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulationStandard {
    /// IEC 60335-1.
    Iec603351,
    /// IEC 60664-1 (with the -4 and -5 parts).
    Iec606641,
    /// IEC 61558-1.
    Iec615581,
    /// IEC 62368-1.
    Iec623681,
}

/// Insulation class required between windings.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulationType {
    /// Functional only.
    Functional,
    /// Basic.
    Basic,
    /// Supplementary.
    Supplementary,
    /// Double.
    Double,
    /// Reinforced.
    Reinforced,
}

impl InsulationType {
    /// Whether the class demands the reinforced/double margins.
    #[must_use]
    pub const fn is_reinforced(self) -> bool {
        matches!(self, Self::Reinforced | Self::Double)
    }
}

/// Pollution degree of the installation environment.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PollutionDegree {
    /// No pollution or only dry pollution.
    P1,
    /// Only non-conductive pollution with occasional condensation.
    P2,
    /// Conductive pollution expected.
    P3,
}

/// Comparative tracking index group of the insulating surfaces.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cti {
    /// CTI ≥ 600.
    GroupI,
    /// 400 ≤ CTI < 600.
    GroupII,
    /// 175 ≤ CTI < 400.
    GroupIiia,
    /// 100 ≤ CTI < 175.
    GroupIiib,
}

/// Overvoltage category of the mains connection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OvervoltageCategory {
    /// OVC-I.
    Ovc1,
    /// OVC-II.
    Ovc2,
    /// OVC-III.
    Ovc3,
    /// OVC-IV.
    Ovc4,
}

/// Winding construction technology.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WiringTechnology {
    /// Wound conductors.
    #[default]
    Wound,
    /// Printed-circuit windings.
    Printed,
}

/// Insulation coordination requirements.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct InsulationRequirements {
    /// Standards whose worst case binds.
    pub standards: Vec<InsulationStandard>,
    /// Required insulation class.
    pub insulation_type: InsulationType,
    /// Pollution degree.
    pub pollution_degree: PollutionDegree,
    /// CTI group of the insulating surfaces.
    pub cti: Cti,
    /// Overvoltage category.
    pub overvoltage_category: OvervoltageCategory,
    /// Operating altitude, in m.
    pub altitude: DimensionWithTolerance,
    /// RMS voltage of the supplying mains, in V.
    pub main_supply_voltage: DimensionWithTolerance,
}

/// A minimum-impedance point of the requirement curve.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct ImpedanceAtFrequency {
    /// Frequency of the point, in Hz.
    pub frequency: f64,
    /// Minimum impedance magnitude at that frequency, in Ω.
    pub impedance: f64,
}

/// Envelope the finished magnetic must fit, in m.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MaximumDimensions {
    /// Width bound.
    pub width: f64,
    /// Height bound.
    pub height: f64,
    /// Depth bound.
    pub depth: f64,
}

/// What the design has to achieve.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DesignRequirements {
    /// Magnetizing inductance seen from the primary.
    pub magnetizing_inductance: DimensionWithTolerance,
    /// Required turns ratios `N_1/N_{k+1}`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub turns_ratios: Vec<DimensionWithTolerance>,
    /// Required leakage inductance per secondary, referred to the primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leakage_inductance: Option<Vec<DimensionWithTolerance>>,
    /// Minimum impedance magnitude over frequency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_impedance: Option<Vec<ImpedanceAtFrequency>>,
    /// Insulation coordination requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulation: Option<InsulationRequirements>,
    /// Envelope bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_dimensions: Option<MaximumDimensions>,
    /// Winding technology.
    #[serde(default)]
    pub wiring_technology: WiringTechnology,
}

/// Everything an adviser call needs.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Inputs {
    /// Requirements of the design.
    pub design_requirements: DesignRequirements,
    /// Operating points the design must survive.
    pub operating_points: Vec<OperatingPoint>,
}

impl Inputs {
    /// Operating point accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the index is out of range.
    pub fn operating_point(&self, index: usize) -> Result<&OperatingPoint> {
        self.operating_points
            .get(index)
            .ok_or_else(|| Error::InvalidInput(format!("operating point {index} does not exist")))
    }

    /// Largest primary RMS voltage across the operating points.
    #[must_use]
    pub fn maximum_voltage_rms(&self) -> f64 {
        self.fold_primary(|e| e.voltage.as_ref().and_then(|v| v.processed.as_ref()).map(|p| p.rms))
    }

    /// Largest primary peak voltage across the operating points.
    #[must_use]
    pub fn maximum_voltage_peak(&self) -> f64 {
        self.fold_primary(|e| e.voltage.as_ref().and_then(|v| v.processed.as_ref()).map(|p| p.peak))
    }

    /// Largest primary switching frequency across the operating points.
    #[must_use]
    pub fn maximum_frequency(&self) -> f64 {
        self.fold_primary(|e| Some(e.frequency))
    }

    /// Largest ambient temperature across the operating points.
    #[must_use]
    pub fn maximum_temperature(&self) -> f64 {
        self.operating_points
            .iter()
            .map(|op| op.conditions.ambient_temperature)
            .fold(crate::constants::AMBIENT_TEMPERATURE, f64::max)
    }

    fn fold_primary(&self, map: impl Fn(&crate::signal::OperatingPointExcitation) -> Option<f64>) -> f64 {
        self.operating_points
            .iter()
            .filter_map(|op| op.excitations_per_winding.first().and_then(&map))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::DimensionWithTolerance;

    #[test]
    fn tolerance_windows() {
        let exact = DimensionWithTolerance::nominal(10.0);
        assert!(exact.contains(10.5));
        assert!(!exact.contains(12.0));
        let window = DimensionWithTolerance::between(8.0, 12.0);
        assert!(window.contains(11.9));
        assert!(!window.contains(12.1));
        assert!((window.resolve() - 10.0).abs() < 1e-12);
    }
}
