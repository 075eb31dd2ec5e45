//! Physical constants and model defaults shared across the crate.

/// Vacuum magnetic permeability, in H/m.
pub const VACUUM_PERMEABILITY: f64 = 4.0 * std::f64::consts::PI * 1e-7;

/// Length of the air gap left by grinding tolerances even on "ungapped"
/// cores, in m.
pub const RESIDUAL_GAP: f64 = 5e-6;

/// Starting step for the gap-length search, in m.
pub const INITIAL_GAP_LENGTH_STEP: f64 = 1e-3;

/// Fringing-factor band kept by the distributed-gap search.
pub const DISTRIBUTED_FRINGING_FACTOR_BOUNDS: (f64, f64) = (1.02, 1.35);

/// Ambient temperature assumed when the operating point does not carry one,
/// in °C.
pub const AMBIENT_TEMPERATURE: f64 = 25.0;

/// Conservative ceiling on winding DC current density, in A/m².
pub const MAXIMUM_CURRENT_DENSITY: f64 = 5e6;

/// Current-density ceiling for printed (planar) windings, in A/m².
pub const MAXIMUM_CURRENT_DENSITY_PLANAR: f64 = 30e6;

/// Effective (AC) current-density ceiling, in A/m².
pub const MAXIMUM_EFFECTIVE_CURRENT_DENSITY: f64 = 8e6;

/// Validity margin applied by the area-product and energy filters.
pub const ADVISER_THRESHOLD_VALIDITY: f64 = 0.8;

/// Ceiling on the per-gap fringing factor accepted by the fringing filter.
pub const FRINGING_FACTOR_LIMIT: f64 = 1.35;

/// Largest number of stacked cores tried by the core adviser.
pub const MAXIMUM_NUMBER_STACKS: usize = 3;

/// Physical-turn count past which the quick harmonic threshold kicks in.
pub const QUICK_MODE_TURNS_THRESHOLD: usize = 1000;

/// Frequency used by impedance checks when no operating point supplies one,
/// in Hz.
pub const MEASUREMENT_FREQUENCY: f64 = 10e3;

/// Peak flux density of the reference loss point used to scale materials in
/// the area-product filter, in T.
pub const REFERENCE_MAGNETIC_FLUX_DENSITY: f64 = 0.18;

/// Frequency of the reference loss point, in Hz.
pub const REFERENCE_FREQUENCY: f64 = 100e3;

#[cfg(test)]
mod tests {
    use super::VACUUM_PERMEABILITY;

    #[test]
    fn vacuum_permeability_value() {
        assert!((VACUUM_PERMEABILITY - 1.2566370614359173e-6).abs() < 1e-18);
    }
}
