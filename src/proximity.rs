//! Proximity-effect losses: eddy losses induced in a conductor by the
//! field of its neighbours, per harmonic and per turn.

use crate::catalogue;
use crate::error::{Error, Result};
use crate::outputs::ComplexFieldPoint;
use crate::skin::skin_depth_of_wire;
use crate::specfun;
use crate::wire::Wire;
use enum_dispatch::enum_dispatch;
use num_complex::Complex64;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::f64::consts::PI;
use std::sync::RwLock;

static PROXIMITY_FACTOR_CACHE: Lazy<RwLock<FxHashMap<(&'static str, u64, u64, u64), f64>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

fn cached_factor(
    model: &'static str,
    wire: &Wire,
    frequency: f64,
    temperature: f64,
    compute: impl FnOnce() -> Result<f64>,
) -> Result<f64> {
    let key = (model, wire.identity_hash(), frequency.to_bits(), temperature.to_bits());
    if let Some(&factor) = PROXIMITY_FACTOR_CACHE.read().unwrap().get(&key) {
        return Ok(factor);
    }
    let factor = compute()?;
    PROXIMITY_FACTOR_CACHE.write().unwrap().insert(key, factor);
    Ok(factor)
}

fn resistivity_of(wire: &Wire, temperature: f64) -> Result<f64> {
    Ok(catalogue::find_wire_material_by_name(wire.material_name())?.resistivity_at(temperature))
}

/// Interface every proximity-effect model implements.
#[enum_dispatch]
pub trait ProximityEffect {
    /// Proximity loss of one meter of one turn for one harmonic, given the
    /// complex field samples gathered at that turn, in W/m.
    ///
    /// # Errors
    ///
    /// Propagates material lookups; raises [`Error::NaNResult`] on
    /// non-finite results.
    fn turn_losses(
        &self,
        wire: &Wire,
        frequency: f64,
        field: &[ComplexFieldPoint],
        temperature: f64,
    ) -> Result<f64>;

    /// Name of the model, for result records.
    fn name(&self) -> &'static str;
}

fn mean_field_magnitude(field: &[ComplexFieldPoint]) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    field.iter().map(|p| p.real.hypot(p.imaginary)).sum::<f64>() / crate::convert::f64_from_usize(field.len())
}

/// Rossmanith: Bessel-ratio factor on the mean field.
#[derive(Clone, Copy, Debug, Default)]
pub struct RossmanithProximityModel;

impl ProximityEffect for RossmanithProximityModel {
    fn turn_losses(&self, wire: &Wire, frequency: f64, field: &[ComplexFieldPoint], temperature: f64) -> Result<f64> {
        let factor = cached_factor("rossmanith", wire, frequency, temperature, || {
            let delta = skin_depth_of_wire(wire, frequency, temperature)?;
            match wire {
                Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => {
                    let width = wire.maximum_conducting_width();
                    let height = wire.maximum_conducting_height();
                    let xi = width / delta;
                    Ok(height * width / delta * (xi.sinh() - xi.sin()) / (xi.cosh() + xi.cos()))
                }
                Wire::Round(_) | Wire::Litz(_) => {
                    let radius = wire.minimum_conducting_dimension() / 2.0;
                    let alpha = Complex64::new(1.0, 1.0) * (radius / delta);
                    let ratio = specfun::modified_bessel_ratio(0, alpha);
                    Ok(2.0 * PI * (alpha * ratio).re)
                }
            }
        })?;
        let resistivity = resistivity_of(wire, temperature)?;
        let mean = mean_field_magnitude(field);
        let losses =
            resistivity * mean * mean * factor * crate::convert::f64_from_usize(wire.number_conductors());
        Error::check_finite(losses, "Rossmanith proximity losses")
    }

    fn name(&self) -> &'static str {
        "rossmanith"
    }
}

/// Wang: per-edge field split for rectangular, planar and foil conductors,
/// with a Ferreira fallback for the field component the edge model does not
/// cover. The default for those wire types.
#[derive(Clone, Copy, Debug, Default)]
pub struct WangProximityModel;

impl ProximityEffect for WangProximityModel {
    fn turn_losses(&self, wire: &Wire, frequency: f64, field: &[ComplexFieldPoint], temperature: f64) -> Result<f64> {
        let (c, h) = match wire {
            Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => {
                (wire.maximum_conducting_width(), wire.maximum_conducting_height())
            }
            _ => {
                return Err(Error::InvalidInput(
                    "the Wang proximity model only covers rectangular, planar and foil wires".to_owned(),
                ));
            }
        };
        let resistivity = resistivity_of(wire, temperature)?;
        let delta = skin_depth_of_wire(wire, frequency, temperature)?;

        let mut hx1 = 0.0;
        let mut hx2 = 0.0;
        let mut hy1 = 0.0;
        let mut hy2 = 0.0;
        let mut off_plane = 0.0;
        for point in field {
            match point.label.as_deref() {
                Some("top") => {
                    off_plane += point.imaginary;
                    hx2 += point.real;
                }
                Some("bottom") => {
                    off_plane += point.imaginary;
                    hx1 += point.real;
                }
                Some("right") => {
                    off_plane += point.real;
                    hy2 += point.imaginary;
                }
                Some("left") => {
                    off_plane += point.real;
                    hy1 += point.imaginary;
                }
                _ => {
                    return Err(Error::InvalidInput(
                        "the Wang proximity model needs labeled induced points".to_owned(),
                    ));
                }
            }
        }

        let xi_h = h / delta;
        let xi_c = c / delta;
        let mut losses = c * h * resistivity / delta
            * ((hx2 + hx1) / 2.0).powi(2)
            * (xi_h.sinh() - xi_h.sin())
            / (xi_h.cosh() + xi_h.cos());
        losses += h * c * resistivity / delta
            * ((hy2 + hy1) / 2.0).powi(2)
            * (xi_c.sinh() - xi_c.sin())
            / (xi_c.cosh() + xi_c.cos());

        if off_plane != 0.0 {
            let factor = FerreiraProximityModel::factor(wire, frequency, temperature)?;
            losses += factor * off_plane * off_plane;
        }
        losses *= crate::convert::f64_from_usize(wire.number_conductors());
        Error::check_finite(losses, "Wang proximity losses")
    }

    fn name(&self) -> &'static str {
        "wang"
    }
}

/// Ferreira: Kelvin-function factor on the peak field. The default for
/// round and litz wires.
#[derive(Clone, Copy, Debug, Default)]
pub struct FerreiraProximityModel;

impl FerreiraProximityModel {
    fn factor(wire: &Wire, frequency: f64, temperature: f64) -> Result<f64> {
        cached_factor("ferreira", wire, frequency, temperature, || {
            let resistivity = resistivity_of(wire, temperature)?;
            let delta = skin_depth_of_wire(wire, frequency, temperature)?;
            match wire {
                Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => {
                    let w = wire.maximum_conducting_width();
                    let h = wire.maximum_conducting_height();
                    let xi = w.min(h) / delta;
                    let factor = w * xi * resistivity * (xi.sinh() - xi.sin()) / (xi.cosh() + xi.cos());
                    Error::check_finite(factor, "Ferreira proximity factor")
                }
                Wire::Round(_) | Wire::Litz(_) => {
                    let diameter = wire.minimum_conducting_dimension();
                    let gamma = diameter / (delta * 2.0_f64.sqrt());
                    let ber = specfun::kelvin_real(0, gamma);
                    let bei = specfun::kelvin_imaginary(0, gamma);
                    let factor = -2.0 * gamma * resistivity
                        * (specfun::kelvin_real(2, gamma) * specfun::kelvin_derivative_real(0, gamma)
                            + specfun::kelvin_imaginary(2, gamma) * specfun::kelvin_derivative_imaginary(0, gamma))
                        / bei.mul_add(bei, ber * ber);
                    Error::check_finite(factor, "Ferreira proximity factor")
                }
            }
        })
    }
}

impl ProximityEffect for FerreiraProximityModel {
    fn turn_losses(&self, wire: &Wire, frequency: f64, field: &[ComplexFieldPoint], temperature: f64) -> Result<f64> {
        let factor = Self::factor(wire, frequency, temperature)?;
        let peak = field
            .iter()
            .map(|p| p.real.hypot(p.imaginary))
            .fold(0.0, f64::max);
        let losses = factor * peak * peak * crate::convert::f64_from_usize(wire.number_conductors());
        Error::check_finite(losses, "Ferreira proximity losses")
    }

    fn name(&self) -> &'static str {
        "ferreira"
    }
}

/// Albach: complex tanh factor on the mean field.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlbachProximityModel;

impl ProximityEffect for AlbachProximityModel {
    fn turn_losses(&self, wire: &Wire, frequency: f64, field: &[ComplexFieldPoint], temperature: f64) -> Result<f64> {
        let resistivity = resistivity_of(wire, temperature)?;
        let delta = skin_depth_of_wire(wire, frequency, temperature)?;
        let (d, c) = match wire {
            Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => {
                (wire.maximum_conducting_width(), wire.maximum_conducting_height())
            }
            _ => (wire.minimum_conducting_dimension(), wire.minimum_conducting_dimension()),
        };
        let alpha = Complex64::new(1.0, 1.0) / delta;
        let mean = mean_field_magnitude(field);
        let losses = c * resistivity * mean * mean * (alpha * d * (alpha * d / 2.0).tanh()).re
            * crate::convert::f64_from_usize(wire.number_conductors());
        Error::check_finite(losses, "Albach proximity losses")
    }

    fn name(&self) -> &'static str {
        "albach"
    }
}

/// Lammeraner: fourth-power penetration factor on the mean field vector.
#[derive(Clone, Copy, Debug, Default)]
pub struct LammeranerProximityModel;

impl ProximityEffect for LammeranerProximityModel {
    fn turn_losses(&self, wire: &Wire, frequency: f64, field: &[ComplexFieldPoint], temperature: f64) -> Result<f64> {
        let factor = cached_factor("lammeraner", wire, frequency, temperature, || {
            let delta = skin_depth_of_wire(wire, frequency, temperature)?;
            let dimension = match wire {
                Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => wire.minimum_conducting_dimension(),
                Wire::Round(_) => wire.minimum_conducting_dimension() / 2.0,
                Wire::Litz(_) => wire.minimum_conducting_dimension() / 2.0,
            };
            let resistivity = resistivity_of(wire, temperature)?;
            Ok(2.0 * PI * resistivity * (dimension / 2.0 / delta).powi(4) / 4.0)
        })?;
        if field.is_empty() {
            return Ok(0.0);
        }
        let n = crate::convert::f64_from_usize(field.len());
        let hx = field.iter().map(|p| p.real).sum::<f64>() / n;
        let hy = field.iter().map(|p| p.imaginary).sum::<f64>() / n;
        let losses =
            hx.mul_add(hx, hy * hy) * factor * crate::convert::f64_from_usize(wire.number_conductors());
        Error::check_finite(losses, "Lammeraner proximity losses")
    }

    fn name(&self) -> &'static str {
        "lammeraner"
    }
}

/// All proximity-effect models, closed.
#[enum_dispatch(ProximityEffect)]
#[derive(Clone, Copy, Debug)]
pub enum ProximityEffectModel {
    /// See [`RossmanithProximityModel`].
    RossmanithProximityModel,
    /// See [`WangProximityModel`].
    WangProximityModel,
    /// See [`FerreiraProximityModel`].
    FerreiraProximityModel,
    /// See [`AlbachProximityModel`].
    AlbachProximityModel,
    /// See [`LammeranerProximityModel`].
    LammeranerProximityModel,
}

impl ProximityEffectModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "rossmanith" => Ok(RossmanithProximityModel.into()),
            "wang" => Ok(WangProximityModel.into()),
            "ferreira" => Ok(FerreiraProximityModel.into()),
            "albach" => Ok(AlbachProximityModel.into()),
            "lammeraner" => Ok(LammeranerProximityModel.into()),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown proximity effect model {key}, options are rossmanith, wang, ferreira, albach, lammeraner"
            ))),
        }
    }

    /// The default model for a wire type.
    #[must_use]
    pub fn for_wire(wire: &Wire) -> Self {
        match wire {
            Wire::Round(_) | Wire::Litz(_) => FerreiraProximityModel.into(),
            Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => WangProximityModel.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{RoundWire, WireCoating};

    fn round_wire(diameter: f64) -> Wire {
        Wire::Round(RoundWire {
            conducting_diameter: diameter,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        })
    }

    fn uniform_field(magnitude: f64) -> Vec<ComplexFieldPoint> {
        vec![ComplexFieldPoint {
            point: [0.0, 0.0],
            real: magnitude,
            imaginary: 0.0,
            turn_index: Some(0),
            label: Some("center".to_owned()),
        }]
    }

    #[test]
    fn proximity_losses_are_non_negative() {
        let wire = round_wire(0.5e-3);
        for key in ["rossmanith", "ferreira", "albach", "lammeraner"] {
            let model = ProximityEffectModel::from_key(key).unwrap();
            let losses = model.turn_losses(&wire, 100e3, &uniform_field(100.0), 25.0).unwrap();
            assert!(losses >= 0.0, "{key} gave {losses}");
        }
    }

    #[test]
    fn losses_scale_with_the_field_squared() {
        let wire = round_wire(0.5e-3);
        let model = ProximityEffectModel::for_wire(&wire);
        let small = model.turn_losses(&wire, 100e3, &uniform_field(10.0), 25.0).unwrap();
        let large = model.turn_losses(&wire, 100e3, &uniform_field(20.0), 25.0).unwrap();
        assert!((large / small - 4.0).abs() < 1e-6);
    }
}
