//! Process-wide settings registry.
//!
//! The registry is a single [`Settings`] value behind a read-write lock.
//! Long computations take a [`Settings::snapshot`] once and read from the
//! copy, so the lock is never held across a calculation.

use once_cell::sync::Lazy;
use std::sync::RwLock;

static SETTINGS: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::default()));

/// Tunable knobs shared by every subsystem.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Emit INFO-level progress records from the advisers.
    pub verbose: bool,
    /// Number of points waveforms are resampled to before the DFT.
    pub number_points_sampled_waveforms: usize,
    /// Fraction of the maximum `amplitude · √frequency` below which a
    /// harmonic is skipped by the loss stack.
    pub harmonic_amplitude_threshold: f64,
    /// Double the harmonic threshold for coils with many physical turns.
    pub harmonic_amplitude_threshold_quick_mode: bool,
    /// Mirror-image order used to approximate the core as magnetic mirrors.
    pub magnetic_field_mirroring_dimension: i32,
    /// Add the gap fringing field to the mapped winding-window field.
    pub magnetic_field_include_fringing: bool,
    /// Grid density of the winding-window field map, x direction.
    pub magnetic_field_number_points_x: usize,
    /// Grid density of the winding-window field map, y direction.
    pub magnetic_field_number_points_y: usize,
    /// Multiplier applied to turn dimensions when excluding grid points
    /// inside conductors.
    pub coil_mesher_inside_turns_factor: f64,
    /// Densify the leakage grid near conductors.
    pub leakage_inductance_grid_auto_scaling: bool,
    /// Leakage grid densification for planar magnetics.
    pub leakage_inductance_grid_precision_level_planar: usize,
    /// Leakage grid densification for wound magnetics.
    pub leakage_inductance_grid_precision_level_wound: usize,
    /// Default gap-reluctance model key.
    pub reluctance_model: String,
    /// Core-loss model keys in priority order; the first applicable wins.
    pub core_losses_model_names: Vec<String>,
    /// Default core-temperature model key.
    pub core_temperature_model: String,
    /// Candidates kept after the core adviser's first filter.
    pub core_adviser_maximum_magnetics_after_filtering: usize,
    /// Expand E/T/U cores into stacked variants.
    pub core_adviser_include_stacks: bool,
    /// Try distributed gapping when solving for a gap length.
    pub core_adviser_include_distributed_gaps: bool,
    /// Subtract creepage margins from the usable winding window.
    pub core_adviser_include_margin: bool,
    /// Consider toroidal cores at all.
    pub use_toroidal_cores: bool,
    /// Ceiling on wires tried per winding by the coil adviser.
    pub coil_adviser_maximum_number_wires: usize,
    /// Ceiling on parallels tried per wire by the coil adviser.
    pub coil_adviser_maximum_number_parallels: usize,
    /// Wire types the coil adviser is allowed to pick.
    pub wire_adviser_include_round: bool,
    /// See [`Self::wire_adviser_include_round`].
    pub wire_adviser_include_litz: bool,
    /// See [`Self::wire_adviser_include_round`].
    pub wire_adviser_include_rectangular: bool,
    /// See [`Self::wire_adviser_include_round`].
    pub wire_adviser_include_foil: bool,
    /// Keep winding a coil even when the turns do not fit the window.
    pub coil_wind_even_if_not_fit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verbose: false,
            number_points_sampled_waveforms: 128,
            harmonic_amplitude_threshold: 0.05,
            harmonic_amplitude_threshold_quick_mode: true,
            magnetic_field_mirroring_dimension: 1,
            magnetic_field_include_fringing: true,
            magnetic_field_number_points_x: 25,
            magnetic_field_number_points_y: 50,
            coil_mesher_inside_turns_factor: 1.05,
            leakage_inductance_grid_auto_scaling: true,
            leakage_inductance_grid_precision_level_planar: 3,
            leakage_inductance_grid_precision_level_wound: 1,
            reluctance_model: "zhang".to_owned(),
            core_losses_model_names: vec![
                "proprietary".to_owned(),
                "loss_factor".to_owned(),
                "steinmetz".to_owned(),
                "roshen".to_owned(),
            ],
            core_temperature_model: "maniktala".to_owned(),
            core_adviser_maximum_magnetics_after_filtering: 50,
            core_adviser_include_stacks: true,
            core_adviser_include_distributed_gaps: true,
            core_adviser_include_margin: false,
            use_toroidal_cores: true,
            coil_adviser_maximum_number_wires: 100,
            coil_adviser_maximum_number_parallels: 4,
            wire_adviser_include_round: true,
            wire_adviser_include_litz: true,
            wire_adviser_include_rectangular: true,
            wire_adviser_include_foil: false,
            coil_wind_even_if_not_fit: false,
        }
    }
}

impl Settings {
    /// Returns a copy of the current settings.
    ///
    /// # Panics
    ///
    /// Panics if the settings lock is poisoned.
    #[must_use]
    pub fn snapshot() -> Self {
        SETTINGS.read().unwrap().clone()
    }

    /// Applies `mutate` to the shared settings.
    ///
    /// # Panics
    ///
    /// Panics if the settings lock is poisoned.
    pub fn update(mutate: impl FnOnce(&mut Self)) {
        let mut settings = SETTINGS.write().unwrap();
        mutate(&mut settings);
    }

    /// Restores every setting to its default value.
    ///
    /// # Panics
    ///
    /// Panics if the settings lock is poisoned.
    pub fn reset_to_defaults() {
        *SETTINGS.write().unwrap() = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn update_and_reset() {
        Settings::update(|s| s.harmonic_amplitude_threshold = 0.2);
        assert!((Settings::snapshot().harmonic_amplitude_threshold - 0.2).abs() < 1e-12);
        Settings::reset_to_defaults();
        assert!((Settings::snapshot().harmonic_amplitude_threshold - 0.05).abs() < 1e-12);
    }
}
