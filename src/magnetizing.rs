//! Magnetizing inductance: forward and inverse solvers tying turns, gap
//! and inductance together.

use crate::coil::Coil;
use crate::constants::{self, VACUUM_PERMEABILITY};
use crate::core::{Core, CoreGap};
use crate::error::{Error, Result};
use crate::harmonics::Waveform;
use crate::inputs::Inputs;
use crate::outputs::MagnetizingInductanceOutput;
use crate::reluctance::{self, Reluctance, ReluctanceModel};
use crate::signal::{OperatingPoint, SignalDescriptor};

/// How a solved gap is realized on the core.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GappingType {
    /// Central column ground down, residual gaps on the laterals.
    Grinded,
    /// Spacer lifting every column by the same length.
    Spacer,
    /// Only the grinding tolerance; cannot be solved for.
    Residual,
    /// Several sub-gaps distributed along the central column.
    Distributed,
}

/// Forward solve: magnetizing inductance of `core` with `coil` at
/// `operating_point`, iterating the permeability against the DC bias field
/// until both settle.
///
/// Returns the inductance output and the core flux-density signal.
///
/// # Errors
///
/// Propagates reluctance and signal failures; returns [`Error::Diverged`]
/// when the fixed point does not settle.
pub fn inductance_from_turns_and_gap(
    core: &Core,
    coil: &Coil,
    operating_point: &OperatingPoint,
) -> Result<(MagnetizingInductanceOutput, SignalDescriptor)> {
    let model = ReluctanceModel::from_settings()?;
    let turns = coil
        .functional_description
        .first()
        .map(|w| crate::convert::f64_from_usize(w.number_turns))
        .ok_or_else(|| Error::InvalidInput("coil has no windings".to_owned()))?;
    let temperature = operating_point.conditions.ambient_temperature;
    let frequency = operating_point.primary_excitation()?.frequency;
    let effective_area = core.processed()?.effective_parameters.effective_area;

    let mut operating_point = operating_point.clone();
    let mut permeability = core.initial_permeability(temperature, None, Some(frequency))?;
    let mut inductance = 5e-3;
    let mut reluctance_output = reluctance::core_reluctance(&model, core, permeability)?;
    let mut flux_density = SignalDescriptor::default();

    let mut outer_budget = 10;
    loop {
        let current_inductance = inductance;
        operating_point.process_magnetizing_current(current_inductance)?;

        let mut inner_budget = 10;
        loop {
            let current_permeability = permeability;
            reluctance_output = reluctance::core_reluctance(&model, core, current_permeability)?;

            flux_density = flux_density_in_core(
                &operating_point,
                reluctance_output.total_reluctance,
                turns,
                effective_area,
                frequency,
            )?;
            let field_offset = flux_density.processed()?.offset / (VACUUM_PERMEABILITY * current_permeability);
            permeability = core.initial_permeability(temperature, Some(field_offset), Some(frequency))?;

            inner_budget -= 1;
            if (current_permeability - permeability).abs() < 1.0 || inner_budget == 0 {
                break;
            }
        }

        inductance = turns * turns / reluctance_output.total_reluctance;
        outer_budget -= 1;
        if (current_inductance - inductance).abs() / inductance < 0.01 {
            break;
        }
        if outer_budget == 0 {
            return Err(Error::Diverged(
                "magnetizing inductance did not settle in 10 refinements".to_owned(),
            ));
        }
    }

    Error::check_finite(inductance, "magnetizing inductance")?;
    Ok((
        MagnetizingInductanceOutput {
            magnetizing_inductance: inductance,
            reluctance: reluctance_output.total_reluctance,
            fringing_factor_per_gap: reluctance_output.gaps.iter().map(|g| g.fringing_factor).collect(),
            maximum_magnetic_energy_core: None,
            method_used: model.name().to_owned(),
            ..MagnetizingInductanceOutput::default()
        },
        flux_density,
    ))
}

/// Inverse solve: the integer primary turn count that realizes the required
/// magnetizing inductance on `core` with its present gapping.
///
/// # Errors
///
/// Propagates reluctance and signal failures.
pub fn turns_from_gap_and_inductance(core: &Core, inputs: &Inputs) -> Result<usize> {
    let model = ReluctanceModel::from_settings()?;
    let required = inputs.design_requirements.magnetizing_inductance.resolve();
    if required <= 0.0 {
        return Err(Error::InvalidInput("required inductance must be positive".to_owned()));
    }
    let mut operating_point = inputs.operating_point(0)?.clone();
    operating_point.process_magnetizing_current(required)?;
    let temperature = operating_point.conditions.ambient_temperature;
    let frequency = operating_point.primary_excitation()?.frequency;
    let effective_area = core.processed()?.effective_parameters.effective_area;

    let mut permeability = core.initial_permeability(temperature, None, Some(frequency))?;
    let mut turns = 1_usize;
    let mut budget = 10;
    loop {
        let reluctance_output = reluctance::core_reluctance(&model, core, permeability)?;
        turns = ((required * reluctance_output.total_reluctance).sqrt().round() as usize).max(1);

        let flux_density = flux_density_in_core(
            &operating_point,
            reluctance_output.total_reluctance,
            crate::convert::f64_from_usize(turns),
            effective_area,
            frequency,
        )?;
        let field_offset = flux_density.processed()?.offset / (VACUUM_PERMEABILITY * permeability);
        let refined = core.initial_permeability(temperature, Some(field_offset), Some(frequency))?;

        budget -= 1;
        if (permeability - refined).abs() < 1.0 || budget == 0 {
            break;
        }
        permeability = refined;
    }
    Ok(turns)
}

/// Inverse solve: the gapping that realizes the required magnetizing
/// inductance for a fixed turn count. Bisection on the gap length with a
/// step that halves on every overshoot.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for [`GappingType::Residual`] and
/// propagates reluctance failures.
pub fn gapping_from_turns_and_inductance(
    core: &Core,
    coil: &Coil,
    inputs: &Inputs,
    gapping_type: GappingType,
) -> Result<Vec<CoreGap>> {
    if gapping_type == GappingType::Residual {
        return Err(Error::InvalidInput(
            "residual gapping cannot be solved for; it is what is left when nothing is".to_owned(),
        ));
    }
    let model = ReluctanceModel::from_settings()?;
    let turns = coil
        .functional_description
        .first()
        .map(|w| crate::convert::f64_from_usize(w.number_turns))
        .ok_or_else(|| Error::InvalidInput("coil has no windings".to_owned()))?;
    let required = inputs.design_requirements.magnetizing_inductance.resolve();
    let needed_reluctance = turns * turns / required;
    let temperature = inputs.operating_point(0)?.conditions.ambient_temperature;
    let frequency = inputs.operating_point(0)?.primary_excitation()?.frequency;
    let permeability = core.initial_permeability(temperature, None, Some(frequency))?;

    let (minimum, maximum) = constants::DISTRIBUTED_FRINGING_FACTOR_BOUNDS;
    let mut gap_length = constants::RESIDUAL_GAP;
    let mut step = constants::INITIAL_GAP_LENGTH_STEP;
    let mut increasing = true;
    let mut number_distributed_gaps = 3_usize;
    let mut budget = 100;

    loop {
        let mut candidate = regap(core, gapping_type, gap_length, number_distributed_gaps)?;
        if gapping_type == GappingType::Distributed {
            // keep each sub-gap's fringing factor inside the band by
            // moving copper between fewer or more sub-gaps, odd counts only
            loop {
                let fringing = model.gap_reluctance(&candidate.gapping[0])?.fringing_factor;
                if fringing < minimum && number_distributed_gaps > 3 {
                    gap_length *= crate::convert::f64_from_usize(number_distributed_gaps);
                    number_distributed_gaps -= 2;
                    gap_length /= crate::convert::f64_from_usize(number_distributed_gaps);
                } else if fringing > maximum {
                    gap_length *= crate::convert::f64_from_usize(number_distributed_gaps);
                    number_distributed_gaps += 2;
                    gap_length /= crate::convert::f64_from_usize(number_distributed_gaps);
                } else {
                    break;
                }
                candidate = regap(core, gapping_type, gap_length, number_distributed_gaps)?;
            }
        }

        let reluctance_output = reluctance::core_reluctance(&model, &candidate, permeability)?;
        let achieved = reluctance_output.total_reluctance;
        if (needed_reluctance - achieved).abs() / needed_reluctance < 0.001 {
            break;
        }
        budget -= 1;
        if budget == 0 {
            return Err(Error::Diverged("gap length search ran out of iterations".to_owned()));
        }

        if needed_reluctance < achieved && increasing {
            increasing = false;
            step = (step / 2.0).max(constants::RESIDUAL_GAP);
        }
        if needed_reluctance > achieved && !increasing {
            increasing = true;
            step = (step / 2.0).max(constants::RESIDUAL_GAP);
        }
        if increasing {
            gap_length += step;
        } else {
            gap_length = (gap_length - step).max(constants::RESIDUAL_GAP);
        }
    }

    // manufacturable resolution
    gap_length = (gap_length * 1e5).round() / 1e5;
    Ok(regap(core, gapping_type, gap_length.max(constants::RESIDUAL_GAP), number_distributed_gaps)?.gapping)
}

fn regap(core: &Core, gapping_type: GappingType, gap_length: f64, distributed: usize) -> Result<Core> {
    let gapping = match gapping_type {
        GappingType::Grinded => vec![CoreGap::subtractive(gap_length)],
        GappingType::Spacer => vec![CoreGap::additive(gap_length)],
        GappingType::Distributed => (0..distributed).map(|_| CoreGap::subtractive(gap_length)).collect(),
        GappingType::Residual => vec![],
    };
    let mut candidate = core.clone();
    candidate.gapping = gapping;
    candidate.process()?;
    Ok(candidate)
}

fn flux_density_in_core(
    operating_point: &OperatingPoint,
    total_reluctance: f64,
    turns: f64,
    effective_area: f64,
    frequency: f64,
) -> Result<SignalDescriptor> {
    let magnetizing = operating_point
        .primary_excitation()?
        .magnetizing_current
        .as_ref()
        .ok_or_else(|| Error::InvalidInput("magnetizing current is missing".to_owned()))?;
    let current_waveform = magnetizing.waveform()?;
    let data: Vec<f64> = current_waveform
        .data
        .iter()
        .map(|i| i * turns / total_reluctance / effective_area)
        .collect();
    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::NaNResult("flux density waveform".to_owned()));
    }
    let mut descriptor = SignalDescriptor::from_waveform(Waveform {
        data,
        time: current_waveform.time.clone(),
    });
    descriptor.standardize(frequency)?;
    Ok(descriptor)
}

/// Magnetic energy the design must store: `½ L I̅²` with the peak
/// magnetizing current of the worst operating point.
///
/// # Errors
///
/// Propagates signal failures.
pub fn required_magnetic_energy(inputs: &Inputs) -> Result<f64> {
    let inductance = inputs.design_requirements.magnetizing_inductance.resolve();
    let mut worst = 0.0_f64;
    for operating_point in &inputs.operating_points {
        let mut operating_point = operating_point.clone();
        operating_point.process_magnetizing_current(inductance)?;
        let peak = operating_point
            .primary_excitation()?
            .magnetizing_current
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("magnetizing current is missing".to_owned()))?
            .processed()?
            .peak;
        worst = worst.max(0.5 * inductance * peak * peak);
    }
    Ok(worst)
}

/// Largest magnetic energy `core` can store before saturating: the core
/// volume at its working permeability plus the air of its gaps.
///
/// # Errors
///
/// Propagates material curve failures.
pub fn core_maximum_magnetic_energy(core: &Core, operating_point: Option<&OperatingPoint>) -> Result<f64> {
    let temperature = operating_point
        .map_or(constants::AMBIENT_TEMPERATURE, |op| op.conditions.ambient_temperature);
    let frequency = operating_point.and_then(|op| op.excitations_per_winding.first().map(|e| e.frequency));
    let saturation = core.saturation_magnetic_flux_density(temperature)?;
    let permeability = core.initial_permeability(temperature, None, frequency)?;
    let effective = core.processed()?.effective_parameters;

    let mut energy =
        saturation * saturation / (2.0 * VACUUM_PERMEABILITY * permeability) * effective.effective_volume;
    for gap in &core.gapping {
        if let Some(area) = gap.area {
            energy += saturation * saturation / (2.0 * VACUUM_PERMEABILITY) * area * gap.length;
        }
    }
    Ok(energy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::coil::{IsolationSide, Winding};
    use crate::inputs::{DesignRequirements, DimensionWithTolerance};
    use crate::signal::{OperatingConditions, OperatingPointExcitation};
    use crate::wire::{RoundWire, Wire, WireCoating};

    fn fixture(turns: usize) -> (Core, Coil, OperatingPoint) {
        let shape = catalogue::find_core_shape_by_name("ETD 49").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let core = Core::new(shape, material, vec![], 1).unwrap();
        let winding = Winding {
            name: "primary".to_owned(),
            isolation_side: IsolationSide::Primary,
            number_turns: turns,
            number_parallels: 1,
            wire: Wire::Round(RoundWire {
                conducting_diameter: 0.5e-3,
                material: "copper".to_owned(),
                coating: Some(WireCoating::enamelled(1)),
                ..RoundWire::default()
            }),
        };
        let coil = Coil::new(vec![winding], &core).unwrap();
        let operating_point = OperatingPoint {
            conditions: OperatingConditions::default(),
            excitations_per_winding: vec![OperatingPointExcitation {
                frequency: 100e3,
                voltage: None,
                current: Some(SignalDescriptor::sinusoidal(1.0, 0.0, 100e3).unwrap()),
                magnetizing_current: None,
                magnetic_flux_density: None,
            }],
        };
        (core, coil, operating_point)
    }

    #[test]
    fn turns_and_inductance_are_inverse_of_each_other() {
        let (core, coil, operating_point) = fixture(42);
        let (output, _) = inductance_from_turns_and_gap(&core, &coil, &operating_point).unwrap();
        let inputs = Inputs {
            design_requirements: DesignRequirements {
                magnetizing_inductance: DimensionWithTolerance::nominal(output.magnetizing_inductance),
                ..DesignRequirements::default()
            },
            operating_points: vec![operating_point],
        };
        let turns = turns_from_gap_and_inductance(&core, &inputs).unwrap();
        assert_eq!(turns, 42);
    }

    #[test]
    fn grinded_gap_solves_the_required_inductance() {
        let (core, coil, operating_point) = fixture(42);
        let target = 2e-3;
        let inputs = Inputs {
            design_requirements: DesignRequirements {
                magnetizing_inductance: DimensionWithTolerance::nominal(target),
                ..DesignRequirements::default()
            },
            operating_points: vec![operating_point.clone()],
        };
        let gapping = gapping_from_turns_and_inductance(&core, &coil, &inputs, GappingType::Grinded).unwrap();
        let mut gapped = core.clone();
        gapped.gapping = gapping;
        gapped.process().unwrap();
        let (output, _) = inductance_from_turns_and_gap(&gapped, &coil, &operating_point).unwrap();
        assert!(
            (output.magnetizing_inductance - target).abs() / target < 0.12,
            "solved {} for target {target}",
            output.magnetizing_inductance
        );
    }

    #[test]
    fn residual_gapping_is_rejected() {
        let (core, coil, operating_point) = fixture(42);
        let inputs = Inputs {
            design_requirements: DesignRequirements {
                magnetizing_inductance: DimensionWithTolerance::nominal(1e-3),
                ..DesignRequirements::default()
            },
            operating_points: vec![operating_point],
        };
        assert!(gapping_from_turns_and_inductance(&core, &coil, &inputs, GappingType::Residual).is_err());
    }
}
