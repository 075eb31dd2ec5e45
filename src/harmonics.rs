//! Sampled waveforms, their harmonic decomposition and the scalar
//! statistics derived from them.

use crate::convert;
use crate::error::{Error, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Shape classification of a periodic signal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformLabel {
    /// Pure tone.
    Sinusoidal,
    /// Symmetric or asymmetric triangle.
    Triangular,
    /// 50% duty square wave.
    Square,
    /// Square wave with a duty cycle other than 50%.
    Rectangular,
    /// Anything else.
    Custom,
}

/// One period of a uniformly or explicitly sampled signal.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Waveform {
    /// Sample values.
    pub data: Vec<f64>,
    /// Sample instants in seconds. Uniform sampling over one period is
    /// assumed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<f64>>,
}

impl Waveform {
    /// Builds a uniformly sampled waveform.
    #[must_use]
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data, time: None }
    }

    /// Resamples the waveform to `points` uniform samples over one period,
    /// interpolating linearly between the original samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on fewer than two samples.
    pub fn resample(&self, points: usize) -> Result<Self> {
        if self.data.len() < 2 {
            return Err(Error::InvalidInput("waveform needs at least two samples".to_owned()));
        }
        let position = |i: usize| -> f64 {
            self.time.as_ref().map_or_else(
                || convert::f64_from_usize(i) / convert::f64_from_usize(self.data.len()),
                |time| (time[i] - time[0]) / (time[time.len() - 1] - time[0]),
            )
        };
        let mut data = Vec::with_capacity(points);
        let mut source = 0;
        for target in 0..points {
            let t = convert::f64_from_usize(target) / convert::f64_from_usize(points);
            while source + 2 < self.data.len() && position(source + 1) <= t {
                source += 1;
            }
            let t0 = position(source);
            let t1 = position(source + 1);
            let fraction = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
            data.push(self.data[source] + fraction * (self.data[source + 1] - self.data[source]));
        }
        Ok(Self::new(data))
    }
}

/// Harmonic content of a periodic signal. Index 0 is the DC component.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Harmonics {
    /// Peak amplitude per harmonic; the DC entry keeps its sign.
    pub amplitudes: Vec<f64>,
    /// Frequency of each harmonic in Hz.
    pub frequencies: Vec<f64>,
    /// Phase of each harmonic in radians, for reconstruction.
    #[serde(default)]
    pub phases: Vec<f64>,
}

impl Harmonics {
    /// Largest `amplitude · √frequency` product over the AC harmonics, the
    /// quantity the loss stack prunes against.
    #[must_use]
    pub fn maximum_amplitude_times_root_frequency(&self) -> f64 {
        self.amplitudes
            .iter()
            .zip(self.frequencies.iter())
            .skip(1)
            .map(|(a, f)| a * f.sqrt())
            .fold(0.0, f64::max)
    }

    /// Indexes of the AC harmonics worth keeping: those whose
    /// `amplitude · √frequency` reaches `threshold` times the maximum.
    #[must_use]
    pub fn significant_indexes(&self, threshold: f64) -> Vec<usize> {
        let ceiling = self.maximum_amplitude_times_root_frequency();
        self.amplitudes
            .iter()
            .zip(self.frequencies.iter())
            .enumerate()
            .skip(1)
            .filter(|(_, (a, f))| *a * f.sqrt() >= ceiling * threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Scalar statistics of a periodic signal.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Processed {
    /// Shape classification.
    pub label: WaveformLabel,
    /// Maximum absolute excursion.
    pub peak: f64,
    /// Difference between maximum and minimum.
    pub peak_to_peak: f64,
    /// Root mean square over one period.
    pub rms: f64,
    /// DC component.
    pub offset: f64,
    /// Amplitude-weighted RMS frequency of the harmonic content, in Hz.
    pub effective_frequency: f64,
    /// Total harmonic distortion relative to the fundamental.
    pub thd: f64,
    /// Fraction of the period above the offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_cycle: Option<f64>,
}

impl Default for WaveformLabel {
    fn default() -> Self {
        Self::Custom
    }
}

/// Computes the harmonic decomposition of one period sampled in `waveform`,
/// with the fundamental at `frequency`.
///
/// The input is resampled to the next power of two before the transform;
/// the amplitude of bin `k` is `|X_k| · 2/N` for `k > 0` and the signed
/// `X_0 / N` for the DC bin.
///
/// # Errors
///
/// Propagates resampling failures.
pub fn compute_harmonics(waveform: &Waveform, frequency: f64) -> Result<Harmonics> {
    let points = waveform.data.len().next_power_of_two().max(
        crate::settings::Settings::snapshot()
            .number_points_sampled_waveforms
            .next_power_of_two(),
    );
    let sampled = waveform.resample(points)?;
    let n = sampled.data.len();
    let nf = convert::f64_from_usize(n);

    let spectrum = dft(&sampled.data);
    let bins = n / 2;
    let mut amplitudes = Vec::with_capacity(bins);
    let mut frequencies = Vec::with_capacity(bins);
    let mut phases = Vec::with_capacity(bins);
    for (k, bin) in spectrum.iter().take(bins).enumerate() {
        if k == 0 {
            amplitudes.push(bin.re / nf);
            phases.push(0.0);
        } else {
            amplitudes.push(bin.norm() * 2.0 / nf);
            phases.push(bin.arg());
        }
        frequencies.push(convert::f64_from_usize(k) * frequency);
    }

    Ok(Harmonics {
        amplitudes,
        frequencies,
        phases,
    })
}

/// Rebuilds one period from the harmonics whose amplitude reaches
/// `threshold` times the largest AC amplitude.
#[must_use]
pub fn reconstruct_waveform(harmonics: &Harmonics, threshold: f64, points: usize) -> Waveform {
    let ceiling = harmonics
        .amplitudes
        .iter()
        .skip(1)
        .fold(0.0_f64, |m, a| m.max(a.abs()));
    let fundamental = harmonics.frequencies.get(1).copied().unwrap_or(1.0);
    let mut data = vec![harmonics.amplitudes.first().copied().unwrap_or(0.0); points];
    for ((amplitude, frequency), phase) in harmonics
        .amplitudes
        .iter()
        .zip(harmonics.frequencies.iter())
        .zip(harmonics.phases.iter())
        .skip(1)
    {
        if amplitude.abs() < ceiling * threshold {
            continue;
        }
        let cycles = frequency / fundamental;
        for (i, sample) in data.iter_mut().enumerate() {
            let angle = 2.0 * PI * cycles * convert::f64_from_usize(i) / convert::f64_from_usize(points);
            *sample += amplitude * (angle + phase).cos();
        }
    }
    Waveform::new(data)
}

/// Computes the scalar statistics of `waveform` given its `harmonics`.
#[must_use]
pub fn process(waveform: &Waveform, harmonics: &Harmonics) -> Processed {
    let n = convert::f64_from_usize(waveform.data.len().max(1));
    let maximum = waveform.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let minimum = waveform.data.iter().copied().fold(f64::INFINITY, f64::min);
    let offset = waveform.data.iter().sum::<f64>() / n;
    let rms = (waveform.data.iter().map(|v| v * v).sum::<f64>() / n).sqrt();

    let mut amplitude_squared_sum = 0.0;
    let mut weighted_sum = 0.0;
    for (a, f) in harmonics.amplitudes.iter().zip(harmonics.frequencies.iter()) {
        amplitude_squared_sum += a * a;
        weighted_sum += (a * f) * (a * f);
    }
    let effective_frequency = if amplitude_squared_sum > 0.0 {
        (weighted_sum / amplitude_squared_sum).sqrt()
    } else {
        0.0
    };

    let fundamental = harmonics.amplitudes.get(1).copied().unwrap_or(0.0);
    let distortion: f64 = harmonics.amplitudes.iter().skip(2).map(|a| a * a).sum();
    let thd = if fundamental > 0.0 { distortion.sqrt() / fundamental } else { 0.0 };

    let above = waveform.data.iter().filter(|&&v| v > offset).count();
    let duty_cycle = convert::f64_from_usize(above) / n;

    Processed {
        label: classify(harmonics, thd, duty_cycle),
        peak: maximum.abs().max(minimum.abs()),
        peak_to_peak: maximum - minimum,
        rms,
        offset,
        effective_frequency,
        thd,
        duty_cycle: Some(duty_cycle),
    }
}

fn classify(harmonics: &Harmonics, thd: f64, duty_cycle: f64) -> WaveformLabel {
    if thd < 0.05 {
        return WaveformLabel::Sinusoidal;
    }
    let fundamental = harmonics.amplitudes.get(1).copied().unwrap_or(0.0);
    if fundamental <= 0.0 {
        return WaveformLabel::Custom;
    }
    let third = harmonics.amplitudes.get(3).copied().unwrap_or(0.0) / fundamental;
    let second = harmonics.amplitudes.get(2).copied().unwrap_or(0.0) / fundamental;
    if second < 0.05 {
        // odd-only spectra: 1/9 third harmonic for triangles, 1/3 for squares
        if (third - 1.0 / 9.0).abs() < 0.04 {
            return WaveformLabel::Triangular;
        }
        if (third - 1.0 / 3.0).abs() < 0.07 {
            return WaveformLabel::Square;
        }
    } else if (duty_cycle - 0.5).abs() > 0.02 && third > 0.05 {
        return WaveformLabel::Rectangular;
    }
    WaveformLabel::Custom
}

/// Synthesizes one period of a standard waveform from its label and
/// parameters, the inverse of [`process`].
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for [`WaveformLabel::Custom`], which has
/// no parametric form.
pub fn synthesize(
    label: WaveformLabel,
    peak_to_peak: f64,
    offset: f64,
    duty_cycle: f64,
    points: usize,
) -> Result<Waveform> {
    let amplitude = peak_to_peak / 2.0;
    let data = (0..points)
        .map(|i| {
            let t = convert::f64_from_usize(i) / convert::f64_from_usize(points);
            match label {
                WaveformLabel::Sinusoidal => offset + amplitude * (2.0 * PI * t).sin(),
                WaveformLabel::Triangular => {
                    let rising = t < duty_cycle;
                    if rising {
                        offset - amplitude + peak_to_peak * t / duty_cycle
                    } else {
                        offset + amplitude - peak_to_peak * (t - duty_cycle) / (1.0 - duty_cycle)
                    }
                }
                WaveformLabel::Square | WaveformLabel::Rectangular => {
                    if t < duty_cycle {
                        offset + amplitude
                    } else {
                        offset - amplitude
                    }
                }
                WaveformLabel::Custom => f64::NAN,
            }
        })
        .collect::<Vec<_>>();
    if data.iter().any(|v| v.is_nan()) {
        return Err(Error::InvalidInput(
            "custom waveforms cannot be synthesized from parameters".to_owned(),
        ));
    }
    Ok(Waveform::new(data))
}

/// 1-D "valid" convolution of `data` with `window`, used for
/// rolling-window smoothing. The output has `data.len() - window.len() + 1`
/// samples.
#[must_use]
pub fn convolve_valid(data: &[f64], window: &[f64]) -> Vec<f64> {
    if window.is_empty() || data.len() < window.len() {
        return Vec::new();
    }
    data.windows(window.len())
        .map(|chunk| chunk.iter().zip(window.iter().rev()).map(|(a, b)| a * b).sum())
        .collect()
}

fn dft(data: &[f64]) -> Vec<Complex64> {
    let n = data.len();
    let nf = convert::f64_from_usize(n);
    (0..n)
        .map(|k| {
            let mut sum = Complex64::new(0.0, 0.0);
            for (i, &sample) in data.iter().enumerate() {
                let angle = -2.0 * PI * convert::f64_from_usize(k) * convert::f64_from_usize(i) / nf;
                sum += sample * Complex64::new(angle.cos(), angle.sin());
            }
            sum
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn sine(points: usize, amplitude: f64, offset: f64) -> Waveform {
        Waveform::new(
            (0..points)
                .map(|i| offset + amplitude * (2.0 * PI * convert::f64_from_usize(i) / convert::f64_from_usize(points)).sin())
                .collect(),
        )
    }

    #[test]
    fn sine_harmonics() {
        let harmonics = compute_harmonics(&sine(128, 2.0, 0.5), 100e3).unwrap();
        assert_approx_eq!(f64, harmonics.amplitudes[0], 0.5, epsilon = 1e-9);
        assert_approx_eq!(f64, harmonics.amplitudes[1], 2.0, epsilon = 1e-9);
        assert_approx_eq!(f64, harmonics.frequencies[1], 100e3, epsilon = 1e-6);
        assert!(harmonics.amplitudes[2].abs() < 1e-9);
    }

    #[test]
    fn processed_statistics_of_a_sine() {
        let waveform = sine(128, 1.0, 0.0);
        let harmonics = compute_harmonics(&waveform, 50e3).unwrap();
        let processed = process(&waveform, &harmonics);
        assert_eq!(processed.label, WaveformLabel::Sinusoidal);
        assert_approx_eq!(f64, processed.rms, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_approx_eq!(f64, processed.peak, 1.0, epsilon = 1e-9);
        assert_approx_eq!(f64, processed.effective_frequency, 50e3, epsilon = 1.0);
    }

    #[test]
    fn triangular_classification() {
        let waveform = synthesize(WaveformLabel::Triangular, 2.0, 0.0, 0.5, 128).unwrap();
        let harmonics = compute_harmonics(&waveform, 100e3).unwrap();
        let processed = process(&waveform, &harmonics);
        assert_eq!(processed.label, WaveformLabel::Triangular);
    }

    #[test]
    fn reconstruction_round_trip() {
        let original = synthesize(WaveformLabel::Square, 2.0, 0.0, 0.5, 128).unwrap();
        let harmonics = compute_harmonics(&original, 100e3).unwrap();
        let rebuilt = reconstruct_waveform(&harmonics, 0.0, 128);
        let reharmonics = compute_harmonics(&rebuilt, 100e3).unwrap();
        assert_approx_eq!(f64, harmonics.amplitudes[1], reharmonics.amplitudes[1], epsilon = 1e-6);
        assert_approx_eq!(f64, harmonics.amplitudes[3], reharmonics.amplitudes[3], epsilon = 1e-6);
    }

    #[test]
    fn valid_convolution_length_and_values() {
        let smoothed = convolve_valid(&[1.0, 2.0, 3.0, 4.0], &[0.5, 0.5]);
        assert_eq!(smoothed, vec![1.5, 2.5, 3.5]);
    }
}
