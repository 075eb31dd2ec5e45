//! Signal descriptors and operating points.

use crate::error::{Error, Result};
use crate::harmonics::{self, Harmonics, Processed, Waveform};
use serde::{Deserialize, Serialize};

/// A periodic electrical or magnetic signal.
///
/// A descriptor may carry any subset of waveform, harmonics and processed
/// scalars; [`SignalDescriptor::standardize`] derives the missing pieces
/// so the invariants between them hold.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SignalDescriptor {
    /// One sampled period.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Waveform>,
    /// Harmonic decomposition, DC at index 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonics: Option<Harmonics>,
    /// Scalar statistics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<Processed>,
}

impl SignalDescriptor {
    /// Wraps a sampled waveform.
    #[must_use]
    pub const fn from_waveform(waveform: Waveform) -> Self {
        Self {
            waveform: Some(waveform),
            harmonics: None,
            processed: None,
        }
    }

    /// A pure sinusoid of the given peak and offset.
    ///
    /// # Errors
    ///
    /// Propagates synthesis failures.
    pub fn sinusoidal(peak: f64, offset: f64, frequency: f64) -> Result<Self> {
        let waveform = harmonics::synthesize(harmonics::WaveformLabel::Sinusoidal, 2.0 * peak, offset, 0.5, 128)?;
        let mut descriptor = Self::from_waveform(waveform);
        descriptor.standardize(frequency)?;
        Ok(descriptor)
    }

    /// A symmetric triangular signal of the given peak-to-peak and offset.
    ///
    /// # Errors
    ///
    /// Propagates synthesis failures.
    pub fn triangular(peak_to_peak: f64, offset: f64, frequency: f64) -> Result<Self> {
        let waveform = harmonics::synthesize(harmonics::WaveformLabel::Triangular, peak_to_peak, offset, 0.5, 128)?;
        let mut descriptor = Self::from_waveform(waveform);
        descriptor.standardize(frequency)?;
        Ok(descriptor)
    }

    /// Derives harmonics and processed scalars from whichever piece is
    /// present. When only processed data exists, the waveform is rebuilt
    /// from its label and parameters first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the descriptor is empty.
    pub fn standardize(&mut self, frequency: f64) -> Result<()> {
        if self.waveform.is_none() {
            if let Some(harmonics) = self.harmonics.as_ref() {
                self.waveform = Some(harmonics::reconstruct_waveform(harmonics, 0.0, 128));
            } else if let Some(processed) = self.processed.as_ref() {
                self.waveform = Some(harmonics::synthesize(
                    processed.label,
                    processed.peak_to_peak,
                    processed.offset,
                    processed.duty_cycle.unwrap_or(0.5),
                    128,
                )?);
            } else {
                return Err(Error::InvalidInput("signal descriptor is empty".to_owned()));
            }
        }
        let waveform = self.waveform.as_ref().unwrap_or_else(|| unreachable!());
        let computed = harmonics::compute_harmonics(waveform, frequency)?;
        let processed = harmonics::process(waveform, &computed);
        self.harmonics = Some(computed);
        self.processed = Some(processed);
        Ok(())
    }

    /// Harmonics accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotProcessed`] before [`Self::standardize`].
    pub fn harmonics(&self) -> Result<&Harmonics> {
        self.harmonics
            .as_ref()
            .ok_or_else(|| Error::NotProcessed("signal has no harmonics".to_owned()))
    }

    /// Processed scalars accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotProcessed`] before [`Self::standardize`].
    pub fn processed(&self) -> Result<&Processed> {
        self.processed
            .as_ref()
            .ok_or_else(|| Error::NotProcessed("signal has no processed data".to_owned()))
    }

    /// Waveform accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotProcessed`] when no waveform is present.
    pub fn waveform(&self) -> Result<&Waveform> {
        self.waveform
            .as_ref()
            .ok_or_else(|| Error::NotProcessed("signal has no waveform".to_owned()))
    }
}

/// Per-winding excitation of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct OperatingPointExcitation {
    /// Switching frequency, in Hz.
    pub frequency: f64,
    /// Winding voltage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<SignalDescriptor>,
    /// Winding current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<SignalDescriptor>,
    /// Magnetizing current. Derived from the primary when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetizing_current: Option<SignalDescriptor>,
    /// Flux density in the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_flux_density: Option<SignalDescriptor>,
}

impl OperatingPointExcitation {
    /// Current accessor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the excitation has no current.
    pub fn current(&self) -> Result<&SignalDescriptor> {
        self.current
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("excitation is missing its current".to_owned()))
    }
}

/// Ambient conditions of an operating point.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OperatingConditions {
    /// Ambient temperature, in °C.
    pub ambient_temperature: f64,
    /// Forced-cooling air speed, in m/s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooling_air_speed: Option<f64>,
}

impl Default for OperatingConditions {
    fn default() -> Self {
        Self {
            ambient_temperature: crate::constants::AMBIENT_TEMPERATURE,
            cooling_air_speed: None,
        }
    }
}

/// One operating point of the magnetic.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct OperatingPoint {
    /// Ambient conditions.
    #[serde(default)]
    pub conditions: OperatingConditions,
    /// Excitation of each winding, primary first.
    pub excitations_per_winding: Vec<OperatingPointExcitation>,
}

impl OperatingPoint {
    /// The primary excitation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when there are no excitations.
    pub fn primary_excitation(&self) -> Result<&OperatingPointExcitation> {
        self.excitations_per_winding
            .first()
            .ok_or_else(|| Error::InvalidInput("operating point has no excitations".to_owned()))
    }

    /// Fills the primary magnetizing current when it is missing: the
    /// integral of the primary voltage over the magnetizing inductance, or
    /// the primary current itself when no voltage is available.
    ///
    /// # Errors
    ///
    /// Propagates signal standardization failures.
    pub fn process_magnetizing_current(&mut self, magnetizing_inductance: f64) -> Result<()> {
        let frequency = self.primary_excitation()?.frequency;
        let primary = self
            .excitations_per_winding
            .first_mut()
            .ok_or_else(|| Error::InvalidInput("operating point has no excitations".to_owned()))?;
        if primary.magnetizing_current.is_some() {
            return Ok(());
        }

        let mut magnetizing = if let Some(voltage) = primary.voltage.as_ref().and_then(|v| v.waveform.as_ref()) {
            let n = voltage.data.len();
            let dt = 1.0 / (frequency * crate::convert::f64_from_usize(n));
            let mut integral = Vec::with_capacity(n);
            let mut accumulator = 0.0;
            for sample in &voltage.data {
                accumulator += sample * dt / magnetizing_inductance;
                integral.push(accumulator);
            }
            // detrend so one period closes on itself and center on the
            // current DC component
            let mean = integral.iter().sum::<f64>() / crate::convert::f64_from_usize(n);
            let offset = primary
                .current
                .as_ref()
                .and_then(|c| c.processed.as_ref())
                .map_or(0.0, |p| p.offset);
            for value in &mut integral {
                *value += offset - mean;
            }
            SignalDescriptor::from_waveform(Waveform::new(integral))
        } else if let Some(current) = primary.current.clone() {
            current
        } else {
            return Err(Error::InvalidInput(
                "cannot derive a magnetizing current without voltage or current".to_owned(),
            ));
        };
        magnetizing.standardize(frequency)?;
        primary.magnetizing_current = Some(magnetizing);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn magnetizing_current_from_a_square_voltage() {
        let voltage = SignalDescriptor::from_waveform(
            harmonics::synthesize(harmonics::WaveformLabel::Square, 20.0, 0.0, 0.5, 128).unwrap(),
        );
        let mut operating_point = OperatingPoint {
            conditions: OperatingConditions::default(),
            excitations_per_winding: vec![OperatingPointExcitation {
                frequency: 100e3,
                voltage: Some(voltage),
                current: None,
                magnetizing_current: None,
                magnetic_flux_density: None,
            }],
        };
        operating_point.process_magnetizing_current(10e-6).unwrap();
        let magnetizing = operating_point.excitations_per_winding[0]
            .magnetizing_current
            .as_ref()
            .unwrap();
        // a ±10 V square across 10 µH at 100 kHz ramps ±2.5 A
        let processed = magnetizing.processed.as_ref().unwrap();
        assert_approx_eq!(f64, processed.peak_to_peak, 5.0, epsilon = 0.2);
        assert!(processed.offset.abs() < 0.1);
    }
}
