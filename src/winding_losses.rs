//! Winding losses: DC resistance, the current divider across parallels,
//! and the aggregation of ohmic, skin and proximity losses per operating
//! point.

use crate::catalogue;
use crate::coil::Coil;
use crate::error::{Error, Result};
use crate::field::{self, FieldStrengthModel, FringingModel};
use crate::magnetic::Magnetic;
use crate::outputs::{
    ComplexField, MagneticFieldOutput, WindingLossElement, WindingLossesOutput, WindingLossesPerTurn,
};
use crate::proximity::{ProximityEffect, ProximityEffectModel};
use crate::settings::Settings;
use crate::signal::OperatingPoint;
use crate::skin::{self, SkinEffect, SkinEffectModel};
use crate::wire::Wire;

/// DC resistance of one meter of `wire` at `temperature`, in Ω/m.
///
/// # Errors
///
/// Propagates material lookup failures.
pub fn dc_resistance_per_meter(wire: &Wire, temperature: f64) -> Result<f64> {
    let material = catalogue::find_wire_material_by_name(wire.material_name())?;
    Ok(material.resistivity_at(temperature) / wire.conducting_area())
}

/// DC resistance of one placed turn, in Ω.
///
/// # Errors
///
/// Propagates material lookup failures.
pub fn dc_resistance_of_turn(turn_length: f64, wire: &Wire, temperature: f64) -> Result<f64> {
    Ok(dc_resistance_per_meter(wire, temperature)? * turn_length)
}

/// Fraction of the winding current carried by each physical turn: equal
/// shares among the parallels of the winding the turn belongs to.
#[must_use]
pub fn current_divider_per_turn(coil: &Coil) -> Vec<f64> {
    coil.turns_description.as_ref().map_or_else(Vec::new, |turns| {
        turns
            .iter()
            .map(|turn| {
                coil.functional_description
                    .iter()
                    .find(|w| w.name == turn.winding)
                    .map_or(1.0, |w| 1.0 / crate::convert::f64_from_usize(w.number_parallels))
            })
            .collect()
    })
}

/// DC resistance of each winding: series turns over parallel conductors,
/// in Ω.
///
/// # Errors
///
/// Propagates unwound-coil and material failures.
pub fn dc_resistance_per_winding(coil: &Coil, temperature: f64) -> Result<Vec<f64>> {
    let turns = coil.turns()?;
    let mut resistance = vec![0.0; coil.functional_description.len()];
    for turn in turns {
        let winding_index = coil.winding_index_by_name(&turn.winding)?;
        let winding = &coil.functional_description[winding_index];
        let parallels = crate::convert::f64_from_usize(winding.number_parallels);
        // parallels divide both the per-turn resistance and the current
        resistance[winding_index] +=
            dc_resistance_of_turn(turn.length, &winding.wire, temperature)? / (parallels * parallels);
    }
    Ok(resistance)
}

/// Ohmic (DC) losses of the coil at `operating_point`, with the per-turn
/// breakdown and the current divider the rest of the loss stack reuses.
///
/// # Errors
///
/// Propagates unwound-coil and signal failures.
pub fn ohmic_losses(coil: &Coil, operating_point: &OperatingPoint, temperature: f64) -> Result<WindingLossesOutput> {
    let turns = coil.turns()?;
    if operating_point.excitations_per_winding.len() != coil.functional_description.len() {
        return Err(Error::InvalidInput(format!(
            "{} excitations for {} windings",
            operating_point.excitations_per_winding.len(),
            coil.functional_description.len()
        )));
    }
    let divider = current_divider_per_turn(coil);

    let mut winding_losses_per_turn = Vec::with_capacity(turns.len());
    let mut total = 0.0;
    for (turn, divider) in turns.iter().zip(divider.iter()) {
        let winding_index = coil.winding_index_by_name(&turn.winding)?;
        let winding = &coil.functional_description[winding_index];
        let current_rms = operating_point.excitations_per_winding[winding_index]
            .current()?
            .processed()?
            .rms;
        let resistance = dc_resistance_of_turn(turn.length, &winding.wire, temperature)?;
        let losses = resistance * (current_rms * divider).powi(2);
        total += losses;
        winding_losses_per_turn.push(WindingLossesPerTurn {
            winding: turn.winding.clone(),
            ohmic_losses: losses,
            skin_effect_losses: WindingLossElement::default(),
            proximity_effect_losses: WindingLossElement::default(),
        });
    }

    Ok(WindingLossesOutput {
        winding_losses: total,
        winding_losses_per_turn,
        current_divider_per_turn: divider,
        dc_resistance_per_winding: dc_resistance_per_winding(coil, temperature)?,
        method_used: "ohmic".to_owned(),
        ..WindingLossesOutput::default()
    })
}

/// Adds the skin-effect losses of every turn to `output`.
///
/// # Errors
///
/// Propagates unwound-coil, signal and model failures.
pub fn add_skin_effect_losses(
    coil: &Coil,
    operating_point: &OperatingPoint,
    temperature: f64,
    mut output: WindingLossesOutput,
    threshold: f64,
) -> Result<WindingLossesOutput> {
    let turns = coil.turns()?;
    let mut total = 0.0;
    for (turn_index, turn) in turns.iter().enumerate() {
        let winding_index = coil.winding_index_by_name(&turn.winding)?;
        let wire = coil.wire(winding_index)?;
        let current = operating_point.excitations_per_winding[winding_index].current()?;
        let (_, per_harmonic) = skin::skin_effect_losses_per_meter(
            wire,
            current,
            temperature,
            output.current_divider_per_turn[turn_index],
            threshold,
        )?;

        let mut element = WindingLossElement {
            harmonic_frequencies: vec![0.0],
            losses_per_harmonic: vec![0.0],
            method_used: SkinEffectModel::for_wire(wire).name().to_owned(),
            ..WindingLossElement::default()
        };
        for (losses_per_meter, frequency) in per_harmonic {
            let losses = losses_per_meter * turn.length;
            element.harmonic_frequencies.push(frequency);
            element.losses_per_harmonic.push(losses);
            total += losses;
        }
        output.winding_losses_per_turn[turn_index].skin_effect_losses = element;
    }
    output.winding_losses += total;
    output.method_used = "analytical".to_owned();
    Ok(output)
}

/// Adds the proximity-effect losses of every turn to `output`, using the
/// complex field map computed by the field engine.
///
/// # Errors
///
/// Propagates model failures; raises [`Error::NaNResult`] on non-finite
/// losses.
pub fn add_proximity_effect_losses(
    coil: &Coil,
    temperature: f64,
    mut output: WindingLossesOutput,
    field_output: &MagneticFieldOutput,
) -> Result<WindingLossesOutput> {
    let turns = coil.turns()?;
    let mut total = 0.0;
    for (turn_index, turn) in turns.iter().enumerate() {
        let winding_index = coil.winding_index_by_name(&turn.winding)?;
        let wire = coil.wire(winding_index)?;
        let model = ProximityEffectModel::for_wire(wire);

        let mut element = WindingLossElement {
            harmonic_frequencies: vec![0.0],
            losses_per_harmonic: vec![0.0],
            method_used: model.name().to_owned(),
            ..WindingLossElement::default()
        };
        for field in &field_output.field_per_frequency {
            let samples: Vec<_> = field
                .data
                .iter()
                .filter(|p| p.turn_index == Some(turn_index))
                .cloned()
                .collect();
            let losses_per_meter = model.turn_losses(wire, field.frequency, &samples, temperature)?;
            let losses = losses_per_meter * turn.length;
            Error::check_finite(losses, "proximity losses of a turn")?;
            element.harmonic_frequencies.push(field.frequency);
            element.losses_per_harmonic.push(losses);
            total += losses;
        }
        output.winding_losses_per_turn[turn_index].proximity_effect_losses = element;
    }
    output.winding_losses += total;
    output.method_used = "analytical".to_owned();
    Ok(output)
}

/// Full winding losses of one operating point: ohmic, then skin, then the
/// field map feeding proximity. Coils with more than the quick-mode turn
/// count get a doubled harmonic threshold.
///
/// # Errors
///
/// Propagates every stage's failures.
pub fn winding_losses(magnetic: &Magnetic, operating_point: &OperatingPoint, temperature: f64) -> Result<WindingLossesOutput> {
    let settings = Settings::snapshot();
    let mut threshold = settings.harmonic_amplitude_threshold;
    if settings.harmonic_amplitude_threshold_quick_mode
        && magnetic.coil.number_physical_turns() > crate::constants::QUICK_MODE_TURNS_THRESHOLD
    {
        threshold *= 2.0;
    }

    let output = ohmic_losses(&magnetic.coil, operating_point, temperature)?;
    let output = add_skin_effect_losses(&magnetic.coil, operating_point, temperature, output, threshold)?;

    let field_output = field::magnetic_field_strength_field(
        operating_point,
        magnetic,
        FieldStrengthModel::from_key("binns_lawrenson")?,
        FringingModel::Roshen,
        None,
        None,
        None,
    )?;

    add_proximity_effect_losses(&magnetic.coil, temperature, output, &field_output)
}

/// Effective (AC) resistance of one meter of `wire` at `frequency`: DC
/// resistance over the skin-depth-limited conducting area.
///
/// # Errors
///
/// Propagates material lookup failures.
pub fn effective_resistance_per_meter(wire: &Wire, frequency: f64, temperature: f64) -> Result<f64> {
    let material = catalogue::find_wire_material_by_name(wire.material_name())?;
    Ok(material.resistivity_at(temperature) / wire.effective_conducting_area(frequency, temperature)?)
}

/// Skin-effect resistance of one meter of `wire` under `current`: the
/// per-meter skin losses referred to the RMS current squared.
///
/// # Errors
///
/// Propagates signal and model failures.
pub fn skin_effect_resistance_per_meter(
    wire: &Wire,
    current: &crate::signal::SignalDescriptor,
    temperature: f64,
) -> Result<f64> {
    let rms = current.processed()?.rms;
    if rms <= 0.0 {
        return Ok(0.0);
    }
    let (total, _) = skin::skin_effect_losses_per_meter(wire, current, temperature, 1.0, 0.0)?;
    Ok(total / (rms * rms))
}

/// Restricts a field snapshot to the samples of one turn, the shape the
/// per-turn proximity models consume.
#[must_use]
pub fn field_of_turn(field: &ComplexField, turn_index: usize) -> Vec<crate::outputs::ComplexFieldPoint> {
    field
        .data
        .iter()
        .filter(|p| p.turn_index == Some(turn_index))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{RoundWire, WireCoating};
    use float_cmp::assert_approx_eq;

    #[test]
    fn one_meter_of_round_wire_at_twenty_degrees() {
        // conducting diameter 321.14 µm over one meter
        let wire = Wire::Round(RoundWire {
            conducting_diameter: 321.14e-6,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        });
        let resistance = dc_resistance_of_turn(1.0, &wire, 20.0).unwrap();
        assert_approx_eq!(f64, resistance, 211.1e-3, epsilon = 211.1e-3 * 0.05);
    }

    #[test]
    fn resistance_rises_with_temperature() {
        let wire = Wire::Round(RoundWire {
            conducting_diameter: 0.5e-3,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        });
        let cold = dc_resistance_per_meter(&wire, 20.0).unwrap();
        let hot = dc_resistance_per_meter(&wire, 100.0).unwrap();
        assert!(hot > cold * 1.25 && hot < cold * 1.40);
    }
}
