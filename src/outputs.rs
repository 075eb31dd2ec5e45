//! Result records populated by the physics stack and the filters.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Where a result came from.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    /// Computed by this engine.
    #[default]
    Simulation,
    /// Measured on hardware.
    Measurement,
    /// Declared by a manufacturer.
    Manufacturer,
}

/// Losses of one physical effect on one turn, split per harmonic.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WindingLossElement {
    /// Harmonic frequencies, DC first.
    pub harmonic_frequencies: Vec<f64>,
    /// Loss of each harmonic, in W.
    pub losses_per_harmonic: Vec<f64>,
    /// Name of the model that produced the numbers.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

impl WindingLossElement {
    /// Total loss across the harmonics, in W.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.losses_per_harmonic.iter().sum()
    }
}

/// Loss breakdown of one physical turn.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WindingLossesPerTurn {
    /// Winding the turn belongs to.
    pub winding: String,
    /// Ohmic (DC) loss, in W.
    pub ohmic_losses: f64,
    /// Skin-effect losses per harmonic.
    pub skin_effect_losses: WindingLossElement,
    /// Proximity-effect losses per harmonic.
    pub proximity_effect_losses: WindingLossElement,
}

/// Winding losses of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct WindingLossesOutput {
    /// Total winding losses, in W.
    pub winding_losses: f64,
    /// Per-turn breakdown.
    pub winding_losses_per_turn: Vec<WindingLossesPerTurn>,
    /// Fraction of the winding current carried by each physical turn.
    pub current_divider_per_turn: Vec<f64>,
    /// DC resistance of each winding, in Ω.
    pub dc_resistance_per_winding: Vec<f64>,
    /// Name of the model stack that produced the numbers.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

impl WindingLossesOutput {
    /// Total loss attributed to `winding`, in W.
    #[must_use]
    pub fn losses_of_winding(&self, winding: &str) -> f64 {
        self.winding_losses_per_turn
            .iter()
            .filter(|t| t.winding == winding)
            .map(|t| t.ohmic_losses + t.skin_effect_losses.total() + t.proximity_effect_losses.total())
            .sum()
    }

    /// Total ohmic loss, in W.
    #[must_use]
    pub fn ohmic_losses(&self) -> f64 {
        self.winding_losses_per_turn.iter().map(|t| t.ohmic_losses).sum()
    }
}

/// Core losses of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct CoreLossesOutput {
    /// Total core losses, in W.
    pub core_losses: f64,
    /// Volumetric losses, in W/m³.
    pub volumetric_losses: f64,
    /// Peak flux density reached, in T.
    pub magnetic_flux_density_peak: f64,
    /// Name of the model that produced the numbers.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

/// Magnetizing inductance of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MagnetizingInductanceOutput {
    /// Magnetizing inductance seen from the primary, in H.
    pub magnetizing_inductance: f64,
    /// Total reluctance of the magnetic circuit, in A/Wb.
    pub reluctance: f64,
    /// Fringing factor of each gap.
    pub fringing_factor_per_gap: Vec<f64>,
    /// Largest magnetic energy the core can store, in J.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_magnetic_energy_core: Option<f64>,
    /// Name of the reluctance model used.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

/// Leakage inductance referred to the primary.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct LeakageInductanceOutput {
    /// Leakage inductance per secondary winding, in H.
    pub leakage_inductance_per_winding: Vec<f64>,
    /// Name of the model used.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

/// Impedance at one frequency.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct ImpedancePoint {
    /// Frequency, in Hz.
    pub frequency: f64,
    /// Complex impedance, in Ω.
    pub impedance: Complex64,
}

/// Impedance results of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ImpedanceOutput {
    /// Impedance at the frequencies that were requested.
    pub impedance_per_frequency: Vec<ImpedancePoint>,
    /// Estimated self-resonant frequency, in Hz.
    pub self_resonant_frequency: f64,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

/// Core temperature results of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TemperatureOutput {
    /// Starting (ambient) temperature, in °C.
    pub initial_temperature: f64,
    /// Peak temperature reached, in °C.
    pub maximum_temperature: f64,
    /// Bulk thermal resistance inferred, in K/W divided by the envelope
    /// volume.
    pub bulk_thermal_resistance: f64,
    /// Name of the model that produced the numbers.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

/// One complex field sample.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ComplexFieldPoint {
    /// Position of the sample `[x, y]`, in m.
    pub point: [f64; 2],
    /// Horizontal field component, in A/m.
    pub real: f64,
    /// Vertical field component, in A/m.
    pub imaginary: f64,
    /// Turn the sample belongs to, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<usize>,
    /// Edge label for labeled (Wang) evaluation points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// The complex field of one harmonic.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ComplexField {
    /// Harmonic frequency, in Hz.
    pub frequency: f64,
    /// Field samples.
    pub data: Vec<ComplexFieldPoint>,
}

/// Winding-window field snapshot of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MagneticFieldOutput {
    /// One complex field per retained harmonic, ascending in frequency.
    pub field_per_frequency: Vec<ComplexField>,
    /// Name of the field model used.
    pub method_used: String,
    /// Provenance.
    #[serde(default)]
    pub origin: ResultOrigin,
}

/// All results of one operating point.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Outputs {
    /// Core losses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_losses: Option<CoreLossesOutput>,
    /// Winding losses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winding_losses: Option<WindingLossesOutput>,
    /// Magnetizing inductance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetizing_inductance: Option<MagnetizingInductanceOutput>,
    /// Leakage inductance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leakage_inductance: Option<LeakageInductanceOutput>,
    /// Impedance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impedance: Option<ImpedanceOutput>,
    /// Core temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TemperatureOutput>,
    /// Winding-window field snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnetic_field: Option<MagneticFieldOutput>,
}
