//! Property tests of the harmonic decomposition on randomized waveforms.

use fluxkit::harmonics::{self, Waveform};
use rand::{RngExt, SeedableRng};
use rand_pcg::Pcg32;

fn random_band_limited_waveform(rng: &mut Pcg32, points: usize, harmonics: usize) -> Waveform {
    let amplitudes: Vec<f64> = (0..harmonics).map(|_| rng.random_range(0.0..1.0)).collect();
    let phases: Vec<f64> = (0..harmonics)
        .map(|_| rng.random_range(0.0..std::f64::consts::TAU))
        .collect();
    let data = (0..points)
        .map(|i| {
            let t = i as f64 / points as f64;
            amplitudes
                .iter()
                .zip(phases.iter())
                .enumerate()
                .map(|(k, (a, p))| a * ((k + 1) as f64 * std::f64::consts::TAU * t + p).cos())
                .sum()
        })
        .collect();
    Waveform::new(data)
}

#[test]
fn decomposition_recovers_band_limited_content() {
    let mut rng = Pcg32::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let waveform = random_band_limited_waveform(&mut rng, 128, 6);
        let harmonics = harmonics::compute_harmonics(&waveform, 100e3).unwrap();
        let rebuilt = harmonics::reconstruct_waveform(&harmonics, 0.0, 128);
        for (original, recovered) in waveform.data.iter().zip(rebuilt.data.iter()) {
            assert!(
                (original - recovered).abs() < 1e-6,
                "reconstruction drifted: {original} vs {recovered}"
            );
        }
    }
}

#[test]
fn parsevals_identity_holds() {
    let mut rng = Pcg32::seed_from_u64(0xf1a4);
    for _ in 0..20 {
        let waveform = random_band_limited_waveform(&mut rng, 128, 10);
        let harmonics = harmonics::compute_harmonics(&waveform, 50e3).unwrap();
        let processed = harmonics::process(&waveform, &harmonics);
        // RMS² equals the DC² plus half the squared AC amplitudes
        let from_spectrum: f64 = harmonics.amplitudes[0].powi(2)
            + harmonics.amplitudes.iter().skip(1).map(|a| a * a / 2.0).sum::<f64>();
        assert!(
            (processed.rms.powi(2) - from_spectrum).abs() < 1e-9,
            "Parseval drifted: {} vs {from_spectrum}",
            processed.rms.powi(2)
        );
    }
}
