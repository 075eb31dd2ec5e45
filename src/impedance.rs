//! Small-signal impedance of the magnetizing branch over frequency.

use crate::error::{Error, Result};
use crate::magnetic::Magnetic;
use crate::reluctance::{self, ReluctanceModel};
use num_complex::Complex64;
use std::f64::consts::PI;

const VACUUM_PERMITTIVITY: f64 = 8.8541878128e-12;

/// Magnetizing inductance of the primary at small signal, in H.
///
/// # Errors
///
/// Propagates reluctance failures.
pub fn small_signal_inductance(magnetic: &Magnetic, frequency: f64, temperature: f64) -> Result<f64> {
    let model = ReluctanceModel::from_settings()?;
    let permeability = magnetic.core.initial_permeability(temperature, None, Some(frequency))?;
    let reluctance = reluctance::core_reluctance(&model, &magnetic.core, permeability)?.total_reluctance;
    let turns = crate::convert::f64_from_usize(
        magnetic
            .coil
            .functional_description
            .first()
            .map(|w| w.number_turns)
            .ok_or_else(|| Error::InvalidInput("coil has no windings".to_owned()))?,
    );
    Ok(turns * turns / reluctance)
}

/// Stray capacitance of the primary winding: layer-to-layer parallel
/// plates through the wire coating.
///
/// # Errors
///
/// Propagates unwound-coil failures.
pub fn stray_capacitance(magnetic: &Magnetic) -> Result<f64> {
    let coil = &magnetic.coil;
    let turns = coil.turns()?;
    let Some(primary) = coil.functional_description.first() else {
        return Err(Error::InvalidInput("coil has no windings".to_owned()));
    };
    let mean_turn_length =
        turns.iter().map(|t| t.length).sum::<f64>() / crate::convert::f64_from_usize(turns.len().max(1));
    let wire_pitch = primary.wire.maximum_outer_dimension();
    let separation = (wire_pitch - primary.wire.minimum_conducting_dimension()).max(10e-6);
    let relative_permittivity = primary
        .wire
        .coating()
        .and_then(|c| c.relative_permittivity)
        .unwrap_or(3.5);

    let layers = coil.layers_description.as_ref().map_or(1, Vec::len).max(1);
    let facing_area = mean_turn_length * wire_pitch;
    let layer_capacitance = VACUUM_PERMITTIVITY * relative_permittivity * facing_area / separation;
    // adjacent layers in series across the winding
    Ok(layer_capacitance / crate::convert::f64_from_usize(layers))
}

/// Self-resonant frequency of the magnetizing branch, in Hz.
///
/// # Errors
///
/// Propagates inductance and capacitance failures.
pub fn self_resonant_frequency(magnetic: &Magnetic, temperature: f64) -> Result<f64> {
    let inductance = small_signal_inductance(magnetic, crate::constants::MEASUREMENT_FREQUENCY, temperature)?;
    let capacitance = stray_capacitance(magnetic)?;
    Ok(1.0 / (2.0 * PI * (inductance * capacitance).sqrt()))
}

/// Complex impedance of the primary at `frequency`: series DC and
/// skin-effect resistance with the magnetizing inductance, in parallel
/// with the stray capacitance. Callers must treat frequencies above a
/// quarter of the self-resonant frequency as outside the model's validity.
///
/// # Errors
///
/// Propagates resistance, inductance and capacitance failures.
pub fn impedance(magnetic: &Magnetic, frequency: f64, temperature: f64) -> Result<Complex64> {
    let coil = &magnetic.coil;
    let resistance_dc = crate::winding_losses::dc_resistance_per_winding(coil, temperature)?
        .first()
        .copied()
        .unwrap_or(0.0);
    let Some(primary) = coil.functional_description.first() else {
        return Err(Error::InvalidInput("coil has no windings".to_owned()));
    };
    let turns = coil.turns()?;
    let primary_length: f64 = turns
        .iter()
        .filter(|t| t.winding == primary.name)
        .map(|t| t.length)
        .sum();
    let ac_resistance = crate::winding_losses::effective_resistance_per_meter(&primary.wire, frequency, temperature)?
        * primary_length
        / crate::convert::f64_from_usize(primary.number_parallels);
    let resistance = resistance_dc.max(ac_resistance);

    let inductance = small_signal_inductance(magnetic, frequency, temperature)?;
    let capacitance = stray_capacitance(magnetic)?;

    let omega = 2.0 * PI * frequency;
    let series = Complex64::new(resistance, omega * inductance);
    let shunt = Complex64::new(0.0, -1.0 / (omega * capacitance));
    let parallel = series * shunt / (series + shunt);
    if !parallel.re.is_finite() || !parallel.im.is_finite() {
        return Err(Error::NaNResult("impedance".to_owned()));
    }
    Ok(parallel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::coil::{Coil, IsolationSide, Winding};
    use crate::core::Core;
    use crate::wire::{RoundWire, Wire, WireCoating};

    fn magnetic() -> Magnetic {
        let shape = catalogue::find_core_shape_by_name("ETD 34").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let core = Core::new(shape, material, vec![], 1).unwrap();
        let winding = Winding {
            name: "primary".to_owned(),
            isolation_side: IsolationSide::Primary,
            number_turns: 20,
            number_parallels: 1,
            wire: Wire::Round(RoundWire {
                conducting_diameter: 0.5e-3,
                material: "copper".to_owned(),
                coating: Some(WireCoating::enamelled(1)),
                ..RoundWire::default()
            }),
        };
        let mut coil = Coil::new(vec![winding], &core).unwrap();
        coil.wind(&core).unwrap();
        Magnetic::new(core, coil)
    }

    #[test]
    fn impedance_is_inductive_below_resonance() {
        let magnetic = magnetic();
        let srf = self_resonant_frequency(&magnetic, 25.0).unwrap();
        let z_low = impedance(&magnetic, srf / 100.0, 25.0).unwrap();
        let z_mid = impedance(&magnetic, srf / 10.0, 25.0).unwrap();
        assert!(z_low.im > 0.0);
        assert!(z_mid.norm() > z_low.norm());
    }

    #[test]
    fn resonance_sits_above_the_working_band() {
        let magnetic = magnetic();
        let srf = self_resonant_frequency(&magnetic, 25.0).unwrap();
        assert!(srf > 100e3);
    }
}
