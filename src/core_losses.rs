//! Volumetric core losses: Steinmetz/iGSE, loss factor, Roshen and the
//! manufacturer loss surfaces, plus the inverse flux-from-loss solve.

use crate::constants::VACUUM_PERMEABILITY;
use crate::core::Core;
use crate::error::{Error, Result};
use crate::harmonics::WaveformLabel;
use crate::interpolation;
use crate::material::{CoreMaterial, CoreMaterialType};
use crate::outputs::CoreLossesOutput;
use crate::signal::SignalDescriptor;
use enum_dispatch::enum_dispatch;
use std::f64::consts::PI;

/// Interface every core-loss model implements.
#[enum_dispatch]
pub trait CoreLosses {
    /// Whether the material carries the data this model needs.
    fn is_applicable(&self, material: &CoreMaterial) -> bool;

    /// Volumetric losses under the given flux-density signal, in W/m³.
    ///
    /// # Errors
    ///
    /// Propagates missing signal data and interpolation failures.
    fn volumetric_losses(
        &self,
        core: &Core,
        flux_density: &SignalDescriptor,
        frequency: f64,
        temperature: f64,
    ) -> Result<f64>;

    /// Name of the model, for result records.
    fn name(&self) -> &'static str;
}

/// Steinmetz with the iGSE extension for non-sinusoidal flux.
#[derive(Clone, Copy, Debug, Default)]
pub struct SteinmetzModel;

impl SteinmetzModel {
    fn igse_ki(k: f64, alpha: f64, beta: f64) -> f64 {
        k / (2.0_f64.powf(beta + 1.0)
            * PI.powf(alpha - 1.0)
            * (0.2761 + 1.7061 / (alpha + 1.354)))
    }
}

impl CoreLosses for SteinmetzModel {
    fn is_applicable(&self, material: &CoreMaterial) -> bool {
        !material.steinmetz_ranges.is_empty()
    }

    fn volumetric_losses(
        &self,
        core: &Core,
        flux_density: &SignalDescriptor,
        frequency: f64,
        temperature: f64,
    ) -> Result<f64> {
        let range = core
            .material
            .steinmetz_range(frequency)
            .ok_or_else(|| Error::ResourceMissing(format!("Steinmetz data of {}", core.material.name)))?;
        let processed = flux_density.processed()?;
        let peak = processed.peak_to_peak / 2.0;
        let temperature_factor = range.temperature_factor(temperature);

        if processed.label == WaveformLabel::Sinusoidal {
            return Ok(range.k * frequency.powf(range.alpha) * peak.powf(range.beta) * temperature_factor);
        }

        // iGSE integration of |dB/dt|^alpha over one period
        let waveform = flux_density.waveform()?;
        let n = waveform.data.len();
        if n < 2 {
            return Err(Error::InvalidInput("flux waveform is too short".to_owned()));
        }
        let dt = 1.0 / (frequency * crate::convert::f64_from_usize(n));
        let ki = Self::igse_ki(range.k, range.alpha, range.beta);
        let mut integral = 0.0;
        for i in 0..n {
            let db = waveform.data[(i + 1) % n] - waveform.data[i];
            integral += (db / dt).abs().powf(range.alpha) * dt;
        }
        let losses =
            ki * frequency * processed.peak_to_peak.powf(range.beta - range.alpha) * integral * temperature_factor;
        Error::check_finite(losses, "iGSE core losses")
    }

    fn name(&self) -> &'static str {
        "steinmetz"
    }
}

/// Loss-factor model: `P_v = f · (tan δ / µ_r) · B̂² / µ₀`, for low-flux
/// excitation of ferrites.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossFactorModel;

impl CoreLosses for LossFactorModel {
    fn is_applicable(&self, material: &CoreMaterial) -> bool {
        !material.loss_factor_vs_frequency.is_empty()
    }

    fn volumetric_losses(
        &self,
        core: &Core,
        flux_density: &SignalDescriptor,
        frequency: f64,
        _temperature: f64,
    ) -> Result<f64> {
        let loss_factor = interpolation::interpolate_table(&core.material.loss_factor_vs_frequency, frequency)?;
        let peak = flux_density.processed()?.peak_to_peak / 2.0;
        Ok(frequency * loss_factor * peak * peak / VACUUM_PERMEABILITY)
    }

    fn name(&self) -> &'static str {
        "loss_factor"
    }
}

/// Roshen: hysteresis losses from the Steinmetz fit plus the bulk eddy
/// losses of the core cross section.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoshenModel;

impl CoreLosses for RoshenModel {
    fn is_applicable(&self, material: &CoreMaterial) -> bool {
        !material.steinmetz_ranges.is_empty()
            && material.resistivity > 0.0
            && material.material_type == CoreMaterialType::Ferrite
    }

    fn volumetric_losses(
        &self,
        core: &Core,
        flux_density: &SignalDescriptor,
        frequency: f64,
        temperature: f64,
    ) -> Result<f64> {
        let hysteresis = SteinmetzModel.volumetric_losses(core, flux_density, frequency, temperature)?;
        let peak = flux_density.processed()?.peak_to_peak / 2.0;
        let thickness = core.processed()?.effective_parameters.effective_area.sqrt();
        let eddy = (PI * frequency * peak * thickness).powi(2) / (6.0 * core.material.resistivity);
        Ok(hysteresis + eddy)
    }

    fn name(&self) -> &'static str {
        "roshen"
    }
}

/// Manufacturer loss surfaces, interpolated bilinearly in log-log over
/// frequency and flux density and linearly over temperature.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProprietaryModel;

impl CoreLosses for ProprietaryModel {
    fn is_applicable(&self, material: &CoreMaterial) -> bool {
        !material.loss_surfaces.is_empty()
    }

    fn volumetric_losses(
        &self,
        core: &Core,
        flux_density: &SignalDescriptor,
        frequency: f64,
        temperature: f64,
    ) -> Result<f64> {
        let peak = flux_density.processed()?.peak_to_peak / 2.0;
        let surfaces = &core.material.loss_surfaces;
        let mut below: Option<&crate::material::LossSurfaceAtTemperature> = None;
        let mut above: Option<&crate::material::LossSurfaceAtTemperature> = None;
        for surface in surfaces {
            if surface.temperature <= temperature
                && below.is_none_or(|b| surface.temperature > b.temperature)
            {
                below = Some(surface);
            }
            if surface.temperature >= temperature
                && above.is_none_or(|a| surface.temperature < a.temperature)
            {
                above = Some(surface);
            }
        }
        let losses = match (below, above) {
            (Some(b), Some(a)) if (a.temperature - b.temperature).abs() > 1e-9 => {
                let t = (temperature - b.temperature) / (a.temperature - b.temperature);
                let low = b.surface.evaluate(frequency, peak);
                let high = a.surface.evaluate(frequency, peak);
                t.mul_add(high - low, low)
            }
            (Some(s), _) | (None, Some(s)) => s.surface.evaluate(frequency, peak),
            (None, None) => {
                return Err(Error::ResourceMissing(format!(
                    "loss surfaces of {}",
                    core.material.name
                )));
            }
        };
        Error::check_finite(losses, "tabulated core losses")
    }

    fn name(&self) -> &'static str {
        "proprietary"
    }
}

/// All core-loss models, closed.
#[enum_dispatch(CoreLosses)]
#[derive(Clone, Copy, Debug)]
pub enum CoreLossesModel {
    /// See [`SteinmetzModel`].
    SteinmetzModel,
    /// See [`LossFactorModel`].
    LossFactorModel,
    /// See [`RoshenModel`].
    RoshenModel,
    /// See [`ProprietaryModel`].
    ProprietaryModel,
}

impl CoreLossesModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "steinmetz" => Ok(SteinmetzModel.into()),
            "loss_factor" => Ok(LossFactorModel.into()),
            "roshen" => Ok(RoshenModel.into()),
            "proprietary" => Ok(ProprietaryModel.into()),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown core losses model {key}, options are steinmetz, loss_factor, roshen, proprietary"
            ))),
        }
    }

    /// The first applicable model from the settings priority list, with
    /// Steinmetz as the guaranteed fallback.
    ///
    /// # Errors
    ///
    /// Propagates key failures from the settings list.
    pub fn for_material(material: &CoreMaterial) -> Result<Self> {
        for key in crate::settings::Settings::snapshot().core_losses_model_names {
            let model = Self::from_key(&key)?;
            if model.is_applicable(material) {
                return Ok(model);
            }
        }
        Ok(SteinmetzModel.into())
    }
}

/// Core losses of `core` under the given flux-density signal.
///
/// # Errors
///
/// Propagates model failures.
pub fn core_losses(
    core: &Core,
    flux_density: &SignalDescriptor,
    frequency: f64,
    temperature: f64,
) -> Result<CoreLossesOutput> {
    let model = CoreLossesModel::for_material(&core.material)?;
    let volumetric = model.volumetric_losses(core, flux_density, frequency, temperature)?;
    let volume = core.processed()?.effective_parameters.effective_volume;
    Ok(CoreLossesOutput {
        core_losses: volumetric * volume,
        volumetric_losses: volumetric,
        magnetic_flux_density_peak: flux_density.processed()?.peak_to_peak / 2.0,
        method_used: model.name().to_owned(),
        ..CoreLossesOutput::default()
    })
}

/// Inverse solve: the peak sinusoidal flux density that produces
/// `target_losses` (total, in W) at `frequency` and `temperature`.
/// Monotone bisection over `B̂ ∈ [1 mT, 1 T]`.
///
/// # Errors
///
/// Returns [`Error::Diverged`] when the bisection does not close within its
/// budget.
pub fn magnetic_flux_density_from_core_losses(
    core: &Core,
    frequency: f64,
    temperature: f64,
    target_losses: f64,
) -> Result<f64> {
    let model = CoreLossesModel::for_material(&core.material)?;
    let volume = core.processed()?.effective_parameters.effective_volume;
    let target_volumetric = target_losses / volume;

    let losses_at = |peak: f64| -> Result<f64> {
        let descriptor = SignalDescriptor::sinusoidal(peak, 0.0, frequency)?;
        model.volumetric_losses(core, &descriptor, frequency, temperature)
    };

    let mut low: f64 = 1e-3;
    let mut high: f64 = 1.0;
    for _ in 0..100 {
        let mid = (low * high).sqrt();
        if losses_at(mid)? < target_volumetric {
            low = mid;
        } else {
            high = mid;
        }
        if (high - low) / high < 1e-3 {
            return Ok((low * high).sqrt());
        }
    }
    Err(Error::Diverged("flux-from-loss bisection did not close".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use float_cmp::assert_approx_eq;

    fn etd49_3c97() -> Core {
        Core::new(
            catalogue::find_core_shape_by_name("ETD 49").unwrap(),
            catalogue::find_core_material_by_name("3C97").unwrap(),
            vec![],
            1,
        )
        .unwrap()
    }

    #[test]
    fn loss_computation_and_its_inverse_agree() {
        let core = etd49_3c97();
        let peak = 0.1;
        let descriptor = SignalDescriptor::sinusoidal(peak, 0.0, 100e3).unwrap();
        let forward = core_losses(&core, &descriptor, 100e3, 25.0).unwrap();
        let recovered =
            magnetic_flux_density_from_core_losses(&core, 100e3, 25.0, forward.core_losses).unwrap();
        assert_approx_eq!(f64, recovered, peak, epsilon = peak * 0.01);
    }

    #[test]
    fn losses_grow_with_flux_and_frequency() {
        let core = etd49_3c97();
        let low_b = SignalDescriptor::sinusoidal(0.05, 0.0, 100e3).unwrap();
        let high_b = SignalDescriptor::sinusoidal(0.2, 0.0, 100e3).unwrap();
        let low = SteinmetzModel.volumetric_losses(&core, &low_b, 100e3, 25.0).unwrap();
        let high = SteinmetzModel.volumetric_losses(&core, &high_b, 100e3, 25.0).unwrap();
        assert!(high > low);
        let faster = SteinmetzModel.volumetric_losses(&core, &low_b, 300e3, 25.0).unwrap();
        assert!(faster > low);
    }

    #[test]
    fn the_priority_list_picks_the_surfaces_for_3c97() {
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let model = CoreLossesModel::for_material(&material).unwrap();
        assert_eq!(model.name(), "proprietary");
    }
}
