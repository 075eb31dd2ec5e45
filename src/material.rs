//! Core material records: permeability, saturation and loss data.

use crate::error::Result;
use crate::interpolation::{self, LogLogSurface};
use serde::{Deserialize, Serialize};

/// Magnetic material technology.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreMaterialType {
    /// Sintered ferrite.
    Ferrite,
    /// Distributed-gap powder.
    Powder,
}

/// One frequency range of Steinmetz coefficients, `P_v = k · f^α · B̂^β` in
/// W/m³ with `f` in Hz and `B̂` in T.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SteinmetzRange {
    /// Lower frequency bound of the range, in Hz.
    pub minimum_frequency: f64,
    /// Upper frequency bound of the range, in Hz.
    pub maximum_frequency: f64,
    /// Steinmetz `k`.
    pub k: f64,
    /// Steinmetz frequency exponent `α`.
    pub alpha: f64,
    /// Steinmetz flux exponent `β`.
    pub beta: f64,
    /// Temperature polynomial `ct0 − ct1·T + ct2·T²` scaling the losses;
    /// the identity when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_coefficients: Option<[f64; 3]>,
}

impl SteinmetzRange {
    /// Temperature scaling factor at `temperature` °C.
    #[must_use]
    pub fn temperature_factor(&self, temperature: f64) -> f64 {
        self.temperature_coefficients
            .map_or(1.0, |[ct0, ct1, ct2]| (ct2 * temperature).mul_add(temperature, ct0 - ct1 * temperature))
            .max(0.1)
    }
}

/// A volumetric-loss surface measured at one temperature.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct LossSurfaceAtTemperature {
    /// Temperature the surface was measured at, in °C.
    pub temperature: f64,
    /// Losses over (frequency, flux density), in W/m³.
    pub surface: LogLogSurface,
}

/// A magnetic core material.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CoreMaterial {
    /// Catalogue name, e.g. "3C97".
    pub name: String,
    /// Manufacturer name.
    pub manufacturer: String,
    /// Material technology.
    #[serde(rename = "type")]
    pub material_type: CoreMaterialType,
    /// Initial permeability against temperature, in (°C, µ_r) points.
    pub permeability_vs_temperature: Vec<(f64, f64)>,
    /// Permeability knock-down against DC bias field, in (A/m, factor)
    /// points. Mostly relevant for powders; the identity when absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permeability_vs_bias: Vec<(f64, f64)>,
    /// Permeability knock-down against frequency, in (Hz, factor) points.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permeability_vs_frequency: Vec<(f64, f64)>,
    /// Saturation flux density against temperature, in (°C, T) points.
    pub saturation_vs_temperature: Vec<(f64, f64)>,
    /// Steinmetz coefficient ranges, ordered by frequency.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steinmetz_ranges: Vec<SteinmetzRange>,
    /// Loss factor `tan δ / µ_r` against frequency, for the loss-factor
    /// model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loss_factor_vs_frequency: Vec<(f64, f64)>,
    /// Manufacturer volumetric-loss surfaces, one per temperature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loss_surfaces: Vec<LossSurfaceAtTemperature>,
    /// Bulk resistivity, in Ω·m.
    pub resistivity: f64,
}

impl CoreMaterial {
    /// Initial permeability at the given conditions.
    ///
    /// The base curve is interpolated on temperature and multiplied by the
    /// bias and frequency knock-down curves when those conditions are
    /// supplied.
    ///
    /// # Errors
    ///
    /// Returns an error when the permeability table is empty.
    pub fn initial_permeability(
        &self,
        temperature: f64,
        h_dc_bias: Option<f64>,
        frequency: Option<f64>,
    ) -> Result<f64> {
        let mut permeability = interpolation::interpolate_table(&self.permeability_vs_temperature, temperature)?;
        if let Some(h_dc) = h_dc_bias
            && !self.permeability_vs_bias.is_empty()
        {
            permeability *= interpolation::interpolate_table(&self.permeability_vs_bias, h_dc.abs())?.clamp(0.01, 1.0);
        }
        if let Some(f) = frequency
            && !self.permeability_vs_frequency.is_empty()
        {
            permeability *= interpolation::interpolate_table(&self.permeability_vs_frequency, f)?.clamp(0.01, 1.0);
        }
        Ok(permeability.max(1.0))
    }

    /// Saturation flux density at `temperature` °C, in T.
    ///
    /// # Errors
    ///
    /// Returns an error when the saturation table is empty.
    pub fn saturation_magnetic_flux_density(&self, temperature: f64) -> Result<f64> {
        interpolation::interpolate_table(&self.saturation_vs_temperature, temperature)
    }

    /// The Steinmetz range covering `frequency`, falling back to the
    /// closest range at the spectrum edges.
    #[must_use]
    pub fn steinmetz_range(&self, frequency: f64) -> Option<&SteinmetzRange> {
        self.steinmetz_ranges
            .iter()
            .find(|r| frequency >= r.minimum_frequency && frequency <= r.maximum_frequency)
            .or_else(|| self.steinmetz_ranges.last())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> CoreMaterial {
        CoreMaterial {
            name: "test".to_owned(),
            manufacturer: "nobody".to_owned(),
            material_type: CoreMaterialType::Powder,
            permeability_vs_temperature: vec![(25.0, 60.0), (100.0, 55.0)],
            permeability_vs_bias: vec![(0.0, 1.0), (3000.0, 0.8), (10000.0, 0.4)],
            permeability_vs_frequency: vec![],
            saturation_vs_temperature: vec![(25.0, 1.0), (100.0, 0.9)],
            steinmetz_ranges: vec![],
            loss_factor_vs_frequency: vec![],
            loss_surfaces: vec![],
            resistivity: 1.0,
        }
    }

    #[test]
    fn bias_field_rolls_the_permeability_off() {
        let material = material();
        let unbiased = material.initial_permeability(25.0, None, None).unwrap();
        let biased = material.initial_permeability(25.0, Some(5000.0), None).unwrap();
        assert!(biased < unbiased);
    }
}
