//! Skin-effect losses: skin depth and the per-wire-type AC resistance
//! factor models.

use crate::catalogue;
use crate::constants::VACUUM_PERMEABILITY;
use crate::error::{Error, Result};
use crate::signal::SignalDescriptor;
use crate::specfun;
use crate::wire::Wire;
use enum_dispatch::enum_dispatch;
use num_complex::Complex64;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::f64::consts::PI;
use std::sync::RwLock;

/// Skin depth of a material at `frequency` and `temperature`, in m.
#[must_use]
pub fn skin_depth(resistivity: f64, frequency: f64, permeability: f64) -> f64 {
    (resistivity / (PI * frequency * VACUUM_PERMEABILITY * permeability)).sqrt()
}

/// Skin depth of a catalogue wire material, in m.
///
/// # Errors
///
/// Propagates catalogue lookup failures.
pub fn skin_depth_of_material(material: &str, frequency: f64, temperature: f64) -> Result<f64> {
    let material = catalogue::find_wire_material_by_name(material)?;
    Ok(skin_depth(material.resistivity_at(temperature), frequency, material.permeability))
}

/// Skin depth of the conductor a wire is made of, in m.
///
/// # Errors
///
/// Propagates catalogue lookup failures.
pub fn skin_depth_of_wire(wire: &Wire, frequency: f64, temperature: f64) -> Result<f64> {
    skin_depth_of_material(wire.material_name(), frequency, temperature)
}

static SKIN_FACTOR_CACHE: Lazy<RwLock<FxHashMap<(&'static str, u64, u64, u64), f64>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

fn cached_factor(
    model: &'static str,
    wire: &Wire,
    frequency: f64,
    temperature: f64,
    compute: impl FnOnce() -> Result<f64>,
) -> Result<f64> {
    let key = (model, wire.identity_hash(), frequency.to_bits(), temperature.to_bits());
    if let Some(&factor) = SKIN_FACTOR_CACHE.read().unwrap().get(&key) {
        return Ok(factor);
    }
    let factor = compute()?;
    SKIN_FACTOR_CACHE.write().unwrap().insert(key, factor);
    Ok(factor)
}

/// Interface every skin-effect model implements.
#[enum_dispatch]
pub trait SkinEffect {
    /// Additional loss of one turn for one harmonic, on top of the DC loss
    /// of that harmonic slice, in W (per meter when `dc_loss` is per
    /// meter).
    ///
    /// # Errors
    ///
    /// Propagates material lookups and non-finite intermediates.
    fn turn_losses(
        &self,
        wire: &Wire,
        dc_loss: f64,
        frequency: f64,
        temperature: f64,
        current_rms: f64,
    ) -> Result<f64>;

    /// Name of the model, for result records.
    fn name(&self) -> &'static str;
}

/// Wojda: one-dimensional Dowell-style factor on the penetration ratio.
#[derive(Clone, Copy, Debug, Default)]
pub struct WojdaSkinModel;

impl WojdaSkinModel {
    fn penetration_ratio(wire: &Wire, frequency: f64, temperature: f64) -> Result<f64> {
        let delta = skin_depth_of_wire(wire, frequency, temperature)?;
        Ok(match wire {
            Wire::Round(w) => {
                let outer = wire.maximum_outer_width();
                (PI / 4.0).powf(0.75) * w.conducting_diameter / delta * (w.conducting_diameter / outer).sqrt()
            }
            Wire::Litz(w) => {
                let strand_outer = Wire::Round(w.strand.clone()).maximum_outer_width();
                (PI / 4.0).powf(0.75) * w.strand.conducting_diameter / delta
                    * (w.strand.conducting_diameter / strand_outer).sqrt()
            }
            Wire::Rectangular(_) | Wire::Planar(_) => wire.minimum_conducting_dimension() / delta,
            Wire::Foil(w) => w.conducting_width / delta,
        })
    }
}

impl SkinEffect for WojdaSkinModel {
    fn turn_losses(&self, wire: &Wire, dc_loss: f64, frequency: f64, temperature: f64, _current_rms: f64) -> Result<f64> {
        let factor = cached_factor("wojda", wire, frequency, temperature, || {
            let xi = Self::penetration_ratio(wire, frequency, temperature)?;
            Ok(xi / 2.0 * (xi.sinh() + xi.sin()) / (xi.cosh() - xi.cos()))
        })?;
        Ok(dc_loss * (factor - 1.0))
    }

    fn name(&self) -> &'static str {
        "wojda"
    }
}

/// Albach: Bessel-ratio factor on the complex penetration argument, with
/// the strand-count correction for litz bundles. The default for round and
/// litz wires.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlbachSkinModel;

impl SkinEffect for AlbachSkinModel {
    fn turn_losses(&self, wire: &Wire, dc_loss: f64, frequency: f64, temperature: f64, _current_rms: f64) -> Result<f64> {
        let factor = cached_factor("albach", wire, frequency, temperature, || {
            let delta = skin_depth_of_wire(wire, frequency, temperature)?;
            let (radius, outer_radius) = match wire {
                Wire::Round(w) => (w.conducting_diameter / 2.0, wire.maximum_outer_width() / 2.0),
                Wire::Litz(w) => (
                    w.strand.conducting_diameter / 2.0,
                    Wire::Round(w.strand.clone()).maximum_outer_width() / 2.0,
                ),
                Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => (
                    wire.minimum_conducting_dimension() / 2.0,
                    wire.maximum_outer_width().min(wire.maximum_outer_height()) / 2.0,
                ),
            };
            let n = crate::convert::f64_from_usize(wire.number_conductors());
            let alpha = Complex64::new(1.0, 1.0) * (radius / delta);
            let i1_over_i0 = specfun::modified_bessel_ratio(0, alpha);
            let i0_over_i1 = 1.0 / i1_over_i0;
            let bundle_term = n * (n - 1.0) * (radius / outer_radius).powi(2) * i1_over_i0;
            let factor = 0.5 * (alpha * (i0_over_i1 + bundle_term)).re;
            Error::check_finite(factor, "Albach skin factor")
        })?;
        Ok(dc_loss * (factor - 1.0))
    }

    fn name(&self) -> &'static str {
        "albach"
    }
}

/// Payne: empirical factor for rectangular bars.
#[derive(Clone, Copy, Debug, Default)]
pub struct PayneSkinModel;

impl SkinEffect for PayneSkinModel {
    fn turn_losses(&self, wire: &Wire, dc_loss: f64, frequency: f64, temperature: f64, _current_rms: f64) -> Result<f64> {
        let delta = skin_depth_of_wire(wire, frequency, temperature)?;
        let width = wire.maximum_conducting_width();
        let height = wire.maximum_conducting_height();
        let (thin, thick) = if height > width { (width, height) } else { (height, width) };
        // Payne quotes the conductor area in mm²
        let area_mm2 = width * height * 1e6;
        let p = area_mm2.sqrt() / (1.26 * delta * 1e3);
        let ff = 1.0 - (-0.026 * p).exp();
        let kc = 1.0 + ff * (1.2 / (2.1 * thick / thin).exp() + 1.2 / (2.1 * thin / thick).exp());
        let x = (2.0 * delta / thick * (1.0 + thick / thin) + 8.0 * (delta / thick).powi(3) / (thin / thick))
            / ((thin / thick).powf(0.33) * (-3.5 * thick / delta).exp() + 1.0);
        let factor = kc / (1.0 - (-x).exp());
        Error::check_finite(dc_loss * factor, "Payne skin losses")
    }

    fn name(&self) -> &'static str {
        "payne"
    }
}

/// Ferreira: one-dimensional factor on the conductor height.
#[derive(Clone, Copy, Debug, Default)]
pub struct FerreiraSkinModel;

impl SkinEffect for FerreiraSkinModel {
    fn turn_losses(&self, wire: &Wire, dc_loss: f64, frequency: f64, temperature: f64, _current_rms: f64) -> Result<f64> {
        let factor = cached_factor("ferreira", wire, frequency, temperature, || {
            let delta = skin_depth_of_wire(wire, frequency, temperature)?;
            let height = match wire {
                Wire::Round(w) => w.conducting_diameter,
                Wire::Litz(w) => w.strand.conducting_diameter,
                _ => wire.minimum_conducting_dimension(),
            };
            let xi = height / delta;
            Ok(xi / 4.0 * (xi.sinh() + xi.sin()) / (xi.cosh() - xi.cos()))
        })?;
        Ok(dc_loss * factor)
    }

    fn name(&self) -> &'static str {
        "ferreira"
    }
}

/// Lotfi: elliptic-integral AC resistance of an equivalent elliptic
/// conductor.
#[derive(Clone, Copy, Debug, Default)]
pub struct LotfiSkinModel;

impl SkinEffect for LotfiSkinModel {
    fn turn_losses(&self, wire: &Wire, _dc_loss: f64, frequency: f64, temperature: f64, current_rms: f64) -> Result<f64> {
        let delta = skin_depth_of_wire(wire, frequency, temperature)?;
        let (a, b) = match wire {
            Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => {
                let b_prima = wire.maximum_conducting_width().max(wire.maximum_conducting_height()) / 2.0;
                let a_prima = wire.maximum_conducting_width().min(wire.maximum_conducting_height()) / 2.0;
                let b = 2.0 * b_prima / PI.sqrt();
                (a_prima * b / b_prima, b)
            }
            _ => {
                let radius = wire.minimum_conducting_dimension() / 2.0;
                (radius, radius)
            }
        };
        let material = catalogue::find_wire_material_by_name(wire.material_name())?;
        let resistivity = material.resistivity_at(temperature);
        let modulus = if b > a { (b * b - a * a).sqrt() / b } else { 0.0 };
        let ac_resistance = resistivity / (PI * PI * delta * b)
            * specfun::complete_elliptic_integral_first_kind(modulus)
            * (1.0 - (-2.0 * a / delta).exp());
        Error::check_finite(ac_resistance * (current_rms / 2.0_f64.sqrt()).powi(2), "Lotfi skin losses")
    }

    fn name(&self) -> &'static str {
        "lotfi"
    }
}

/// Kutkut: two-corner-frequency blend for rectangular and foil conductors.
/// The default for those wire types.
#[derive(Clone, Copy, Debug, Default)]
pub struct KutkutSkinModel;

impl SkinEffect for KutkutSkinModel {
    fn turn_losses(&self, wire: &Wire, dc_loss: f64, frequency: f64, temperature: f64, _current_rms: f64) -> Result<f64> {
        let factor = cached_factor("kutkut", wire, frequency, temperature, || {
            let b_prima = wire.maximum_conducting_width().max(wire.maximum_conducting_height()) / 2.0;
            let a_prima = wire.maximum_conducting_width().min(wire.maximum_conducting_height()) / 2.0;
            let material = catalogue::find_wire_material_by_name(wire.material_name())?;
            let resistivity = material.resistivity_at(temperature);

            let f_low = 3.22 * resistivity / (8.0 * VACUUM_PERMEABILITY * b_prima * a_prima);
            let modulus = (1.0 - a_prima * a_prima / (b_prima * b_prima)).max(0.0).sqrt();
            let f_high = PI * PI * resistivity / (4.0 * VACUUM_PERMEABILITY * a_prima * a_prima)
                * specfun::complete_elliptic_integral_first_kind(modulus.min(0.999999)).powi(-2);
            let (alpha, beta, gamma) = (2.0, 5.5, 11.0);
            Ok((1.0 + (frequency / f_low).powf(alpha) + (frequency / f_high).powf(beta)).powf(1.0 / gamma))
        })?;
        Ok((factor - 1.0) * dc_loss)
    }

    fn name(&self) -> &'static str {
        "kutkut"
    }
}

/// All skin-effect models, closed.
#[enum_dispatch(SkinEffect)]
#[derive(Clone, Copy, Debug)]
pub enum SkinEffectModel {
    /// See [`WojdaSkinModel`].
    WojdaSkinModel,
    /// See [`AlbachSkinModel`].
    AlbachSkinModel,
    /// See [`PayneSkinModel`].
    PayneSkinModel,
    /// See [`FerreiraSkinModel`].
    FerreiraSkinModel,
    /// See [`LotfiSkinModel`].
    LotfiSkinModel,
    /// See [`KutkutSkinModel`].
    KutkutSkinModel,
}

impl SkinEffectModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "wojda" => Ok(WojdaSkinModel.into()),
            "albach" => Ok(AlbachSkinModel.into()),
            "payne" => Ok(PayneSkinModel.into()),
            "ferreira" => Ok(FerreiraSkinModel.into()),
            "lotfi" => Ok(LotfiSkinModel.into()),
            "kutkut" => Ok(KutkutSkinModel.into()),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown skin effect model {key}, options are wojda, albach, payne, ferreira, lotfi, kutkut"
            ))),
        }
    }

    /// The default model for a wire type.
    #[must_use]
    pub fn for_wire(wire: &Wire) -> Self {
        match wire {
            Wire::Round(_) | Wire::Litz(_) => AlbachSkinModel.into(),
            Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => KutkutSkinModel.into(),
        }
    }
}

/// Skin-effect losses of one meter of `wire` carrying `current`, split per
/// harmonic. `current_divider` is the fraction of the winding current in
/// this conductor. Harmonics whose `amplitude · √frequency` falls under
/// `threshold` times the maximum are skipped.
///
/// Returns the total and the `(loss, frequency)` pairs per kept harmonic.
///
/// # Errors
///
/// Propagates missing harmonics and model failures.
pub fn skin_effect_losses_per_meter(
    wire: &Wire,
    current: &SignalDescriptor,
    temperature: f64,
    current_divider: f64,
    threshold: f64,
) -> Result<(f64, Vec<(f64, f64)>)> {
    let dc_resistance_per_meter = crate::winding_losses::dc_resistance_per_meter(wire, temperature)?;
    let model = SkinEffectModel::for_wire(wire);
    let harmonics = current.harmonics()?;
    let ceiling = harmonics.maximum_amplitude_times_root_frequency();

    let mut total = 0.0;
    let mut per_harmonic = Vec::new();
    for (amplitude, frequency) in harmonics
        .amplitudes
        .iter()
        .zip(harmonics.frequencies.iter())
        .skip(1)
    {
        if amplitude * frequency.sqrt() < ceiling * threshold {
            continue;
        }
        // a harmonic is always sinusoidal
        let harmonic_rms_in_turn = amplitude / 2.0_f64.sqrt() * current_divider;
        let dc_loss_this_harmonic = harmonic_rms_in_turn * harmonic_rms_in_turn * dc_resistance_per_meter;
        let losses = model.turn_losses(wire, dc_loss_this_harmonic, *frequency, temperature, harmonic_rms_in_turn)?;
        per_harmonic.push((losses, *frequency));
        total += losses;
    }
    Ok((total, per_harmonic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{RoundWire, WireCoating};
    use float_cmp::assert_approx_eq;

    #[test]
    fn copper_skin_depth_reference() {
        // copper at 123 kHz and 20 °C
        let delta = skin_depth_of_material("copper", 123e3, 20.0).unwrap();
        assert_approx_eq!(f64, delta, 186.09e-6, epsilon = 186.09e-6 * 0.01);
    }

    #[test]
    fn skin_losses_are_non_negative_and_grow_with_frequency() {
        let wire = Wire::Round(RoundWire {
            conducting_diameter: 1e-3,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        });
        let model = SkinEffectModel::for_wire(&wire);
        let low = model.turn_losses(&wire, 1.0, 50e3, 25.0, 1.0).unwrap();
        let high = model.turn_losses(&wire, 1.0, 500e3, 25.0, 1.0).unwrap();
        assert!(low >= 0.0);
        assert!(high > low);
    }

    #[test]
    fn factor_cache_round_trip() {
        let wire = Wire::Round(RoundWire {
            name: Some("cache probe".to_owned()),
            conducting_diameter: 0.8e-3,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        });
        let model = SkinEffectModel::for_wire(&wire);
        let first = model.turn_losses(&wire, 1.0, 100e3, 25.0, 1.0).unwrap();
        let second = model.turn_losses(&wire, 1.0, 100e3, 25.0, 1.0).unwrap();
        assert_approx_eq!(f64, first, second, epsilon = 0.0);
    }
}
