//! Magnetic filters: uniform scoring predicates over candidate magnetics.
//!
//! Every filter answers `(valid, scoring)` with smaller scorings being
//! better unless the adviser inverts them. A filter may write results into
//! the per-operating-point outputs, and scorings are cached per magnetic
//! reference so composite filters can reuse them.

use crate::constants;
use crate::core_losses;
use crate::error::{Error, Result};
use crate::inputs::{Inputs, WiringTechnology};
use crate::insulation::InsulationCoordinator;
use crate::magnetic::Magnetic;
use crate::magnetizing;
use crate::outputs::Outputs;
use crate::proximity::ProximityEffectModel;
use crate::reluctance::{self, ReluctanceModel};
use crate::settings::Settings;
use crate::shape::CoreShapeFamily;
use crate::skin;
use crate::temperature::{CoreTemperature, CoreTemperatureModel};
use crate::winding_losses;
use crate::wire::{self, Wire, WireStandard};
use enum_dispatch::enum_dispatch;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::RwLock;

static SCORING_CACHE: Lazy<RwLock<FxHashMap<(String, &'static str), f64>>> =
    Lazy::new(|| RwLock::new(FxHashMap::default()));

/// Cached scoring of `filter_name` for the magnetic with `reference`.
#[must_use]
pub fn cached_scoring(reference: &str, filter_name: &'static str) -> Option<f64> {
    SCORING_CACHE.read().unwrap().get(&(reference.to_owned(), filter_name)).copied()
}

fn remember_scoring(reference: &str, filter_name: &'static str, scoring: f64) {
    SCORING_CACHE
        .write()
        .unwrap()
        .insert((reference.to_owned(), filter_name), scoring);
}

/// Drops every cached scoring, for fresh adviser runs in tests.
pub fn clear_scoring_cache() {
    SCORING_CACHE.write().unwrap().clear();
}

/// Interface every magnetic filter implements.
#[enum_dispatch]
pub trait MagneticFilterEvaluate {
    /// Evaluates `magnetic` against `inputs`: whether it stays in the
    /// running and how it scores. May populate `outputs`, one entry per
    /// operating point.
    ///
    /// # Errors
    ///
    /// Propagates physics failures; adviser pipelines catch these and drop
    /// the candidate.
    fn evaluate(
        &self,
        magnetic: &mut Magnetic,
        inputs: &Inputs,
        outputs: Option<&mut Vec<Outputs>>,
    ) -> Result<(bool, f64)>;

    /// Name of the filter, for logs and the scoring cache.
    fn name(&self) -> &'static str;
}

fn ensure_outputs(outputs: &mut Vec<Outputs>, index: usize) -> &mut Outputs {
    while outputs.len() <= index {
        outputs.push(Outputs::default());
    }
    &mut outputs[index]
}

fn mean_input_power(inputs: &Inputs) -> Result<f64> {
    let mut total = 0.0;
    for operating_point in &inputs.operating_points {
        let excitation = operating_point.primary_excitation()?;
        let voltage = excitation
            .voltage
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("primary excitation has no voltage".to_owned()))?
            .waveform()?;
        let current = excitation.current()?.waveform()?;
        if voltage.data.len() != current.data.len() {
            return Err(Error::InvalidInput(
                "voltage and current waveforms have incompatible lengths".to_owned(),
            ));
        }
        let power: f64 = voltage
            .data
            .iter()
            .zip(current.data.iter())
            .map(|(v, i)| (v * i).abs())
            .sum::<f64>()
            / crate::convert::f64_from_usize(voltage.data.len());
        total += power;
    }
    Ok(total / crate::convert::f64_from_usize(inputs.operating_points.len().max(1)))
}

fn flux_density_of(magnetic: &Magnetic, operating_point: &crate::signal::OperatingPoint) -> Result<crate::signal::SignalDescriptor> {
    let (_, flux_density) =
        magnetizing::inductance_from_turns_and_gap(&magnetic.core, &magnetic.coil, operating_point)?;
    Ok(flux_density)
}

fn total_losses(
    magnetic: &mut Magnetic,
    inputs: &Inputs,
    include_skin: bool,
    include_proximity: bool,
) -> Result<f64> {
    let mut total = 0.0;
    for operating_point in &inputs.operating_points {
        let temperature = operating_point.conditions.ambient_temperature;
        let frequency = operating_point.primary_excitation()?.frequency;
        let flux_density = flux_density_of(magnetic, operating_point)?;
        total += core_losses::core_losses(&magnetic.core, &flux_density, frequency, temperature)?.core_losses;

        if include_proximity {
            total += winding_losses::winding_losses(magnetic, operating_point, temperature)?.winding_losses;
        } else {
            let output = winding_losses::ohmic_losses(&magnetic.coil, operating_point, temperature)?;
            let output = if include_skin {
                winding_losses::add_skin_effect_losses(
                    &magnetic.coil,
                    operating_point,
                    temperature,
                    output,
                    Settings::snapshot().harmonic_amplitude_threshold,
                )?
            } else {
                output
            };
            total += output.winding_losses;
        }
    }
    Ok(total / crate::convert::f64_from_usize(inputs.operating_points.len().max(1)))
}

fn bobbin_filling_factor(window_width: f64, window_height: f64) -> f64 {
    let wall = (window_width * 0.1).min(1e-3);
    ((window_width - wall) * (window_height - 2.0 * wall) / (window_width * window_height)).clamp(0.1, 1.0)
}

/// Area-product sizing check against the scaled reference flux density.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaProductFilter;

impl MagneticFilterEvaluate for AreaProductFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let processed = magnetic.core.processed()?;
        let Some(window) = processed.winding_windows.first() else {
            return Ok((false, 0.0));
        };
        let window_area = window.area;
        let column_area = processed.columns[0].area;
        let filling = if inputs.design_requirements.wiring_technology == WiringTechnology::Printed {
            1.0
        } else if magnetic.core.shape.family == CoreShapeFamily::T {
            0.6
        } else {
            bobbin_filling_factor(window.width.unwrap_or(1e-3), window.height.unwrap_or(1e-3))
        };
        let primary_area_factor = if inputs.design_requirements.turns_ratios.is_empty() { 1.0 } else { 0.5 };
        let maximum_current_density = if inputs.design_requirements.wiring_technology == WiringTechnology::Printed {
            constants::MAXIMUM_CURRENT_DENSITY_PLANAR
        } else {
            constants::MAXIMUM_CURRENT_DENSITY
        };

        let area_product_core = window_area * column_area;
        let mut maximum_required: f64 = 0.0;
        for operating_point in &inputs.operating_points {
            let temperature = operating_point.conditions.ambient_temperature;
            let frequency = operating_point.primary_excitation()?.frequency;
            let power = mean_input_power(inputs)?;

            // scale the reference flux density to where this material loses
            // what it loses at the reference point
            let reference = crate::signal::SignalDescriptor::sinusoidal(
                constants::REFERENCE_MAGNETIC_FLUX_DENSITY,
                0.0,
                constants::REFERENCE_FREQUENCY,
            )?;
            let scaled_flux_density = core_losses::core_losses(
                &magnetic.core,
                &reference,
                constants::REFERENCE_FREQUENCY,
                temperature,
            )
            .and_then(|reference_losses| {
                core_losses::magnetic_flux_density_from_core_losses(
                    &magnetic.core,
                    frequency,
                    temperature,
                    reference_losses.core_losses,
                )
            })
            .unwrap_or(constants::REFERENCE_MAGNETIC_FLUX_DENSITY);

            let skin_depth = skin::skin_depth_of_material("copper", frequency, temperature)?;
            let wire_filling = wire::filling_factor_round(2.0 * skin_depth, 1, WireStandard::Iec60317);
            let utilization = wire_filling * filling;
            let required =
                power / (primary_area_factor * 2.0 * frequency * maximum_current_density * utilization * scaled_flux_density);
            Error::check_finite(required, "required area product")?;
            maximum_required = maximum_required.max(required);
        }

        let valid = area_product_core >= maximum_required * constants::ADVISER_THRESHOLD_VALIDITY;
        Ok((valid, (area_product_core - maximum_required).abs()))
    }

    fn name(&self) -> &'static str {
        "area_product"
    }
}

/// Core storable energy against the required magnetic energy.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnergyStoredFilter;

impl MagneticFilterEvaluate for EnergyStoredFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let required = magnetizing::required_magnetic_energy(inputs)?;
        let mut storable: f64 = 0.0;
        let mut valid = true;
        let mut outputs = outputs;
        for (index, operating_point) in inputs.operating_points.iter().enumerate() {
            let energy = magnetizing::core_maximum_magnetic_energy(&magnetic.core, Some(operating_point))?;
            storable = storable.max(energy);
            if energy >= required * constants::ADVISER_THRESHOLD_VALIDITY {
                if let Some(outputs) = outputs.as_deref_mut() {
                    let slot = ensure_outputs(outputs, index);
                    let mut inductance_output =
                        slot.magnetizing_inductance.clone().unwrap_or_default();
                    inductance_output.maximum_magnetic_energy_core = Some(energy);
                    slot.magnetizing_inductance = Some(inductance_output);
                }
            } else {
                valid = false;
            }
        }
        Ok((valid, storable))
    }

    fn name(&self) -> &'static str {
        "energy_stored"
    }
}

/// Estimated manufacturability cost: copper fits the window and how many
/// layers it takes.
#[derive(Clone, Copy, Debug, Default)]
pub struct EstimatedCostFilter;

impl MagneticFilterEvaluate for EstimatedCostFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let processed = magnetic.core.processed()?;
        let window = &processed.winding_windows[0];
        let operating_point = inputs.operating_point(0)?;
        let frequency = operating_point.primary_excitation()?.frequency;
        let temperature = operating_point.conditions.ambient_temperature;
        let current_rms = operating_point.primary_excitation()?.current()?.processed()?.rms;

        let skin_depth = skin::skin_depth_of_material("copper", frequency, temperature)?;
        let wire_filling = wire::filling_factor_round(2.0 * skin_depth, 1, WireStandard::Iec60317);
        let wire_conducting_area = std::f64::consts::PI * skin_depth * skin_depth;
        let wire_total_area = wire_conducting_area / wire_filling;
        let parallels = (current_rms / constants::MAXIMUM_CURRENT_DENSITY / wire_conducting_area).ceil().max(1.0);
        let primary_turns = crate::convert::f64_from_usize(
            magnetic
                .coil
                .functional_description
                .first()
                .map_or(1, |w| w.number_turns),
        );

        let needed_area = primary_turns * parallels * wire_total_area;
        if window.area < needed_area * constants::ADVISER_THRESHOLD_VALIDITY {
            return Ok((false, 0.0));
        }

        let mut cost = if magnetic.core.shape.family == CoreShapeFamily::T {
            let layer_length = 2.0 * std::f64::consts::PI * (window.radial_height.unwrap_or(1e-3) - skin_depth);
            let layers = primary_turns * parallels * (2.0 * skin_depth / wire_filling) / layer_length;
            if layers > 1.0 { layers * 2.0 } else { layers }
        } else {
            primary_turns * parallels * (2.0 * skin_depth / wire_filling) / window.height.unwrap_or(1e-3)
        };
        if magnetic.core.number_stacks > 1 {
            // stacked sets need a custom bobbin
            cost *= 2.0;
        }
        Ok((true, cost))
    }

    fn name(&self) -> &'static str {
        "estimated_cost"
    }
}

/// Core plus DC winding losses against the input power budget.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreAndDcLossesFilter;

impl MagneticFilterEvaluate for CoreAndDcLossesFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let losses = total_losses(magnetic, inputs, false, false)?;
        remember_scoring(&magnetic.reference, self.name(), losses);
        let power = mean_input_power(inputs)?;
        Ok((losses < power * 0.1, losses))
    }

    fn name(&self) -> &'static str {
        "core_and_dc_losses"
    }
}

/// Core, DC and skin losses against the input power budget.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreDcAndSkinLossesFilter;

impl MagneticFilterEvaluate for CoreDcAndSkinLossesFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let losses = total_losses(magnetic, inputs, true, false)?;
        remember_scoring(&magnetic.reference, self.name(), losses);
        let power = mean_input_power(inputs)?;
        Ok((losses < power * 0.1, losses))
    }

    fn name(&self) -> &'static str {
        "core_dc_and_skin_losses"
    }
}

/// Full losses, proximity included.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossesFilter;

impl MagneticFilterEvaluate for LossesFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let mut total = 0.0;
        let mut outputs = outputs;
        for (index, operating_point) in inputs.operating_points.iter().enumerate() {
            let temperature = operating_point.conditions.ambient_temperature;
            let frequency = operating_point.primary_excitation()?.frequency;
            let flux_density = flux_density_of(magnetic, operating_point)?;
            let core = core_losses::core_losses(&magnetic.core, &flux_density, frequency, temperature)?;
            let winding = winding_losses::winding_losses(magnetic, operating_point, temperature)?;
            total += core.core_losses + winding.winding_losses;
            if let Some(outputs) = outputs.as_deref_mut() {
                let slot = ensure_outputs(outputs, index);
                slot.core_losses = Some(core);
                slot.winding_losses = Some(winding);
            }
        }
        let losses = total / crate::convert::f64_from_usize(inputs.operating_points.len().max(1));
        remember_scoring(&magnetic.reference, self.name(), losses);
        let power = mean_input_power(inputs)?;
        Ok((losses < power * 0.1, losses))
    }

    fn name(&self) -> &'static str {
        "losses"
    }
}

/// Losses without the proximity stage, the cheap variant.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossesNoProximityFilter;

impl MagneticFilterEvaluate for LossesNoProximityFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let losses = total_losses(magnetic, inputs, true, false)?;
        remember_scoring(&magnetic.reference, self.name(), losses);
        let power = mean_input_power(inputs)?;
        Ok((losses < power * 0.1, losses))
    }

    fn name(&self) -> &'static str {
        "losses_no_proximity"
    }
}

/// Impedance magnitude against the minimum-impedance requirement, with the
/// turns chosen to satisfy it.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreMinimumImpedanceFilter;

impl MagneticFilterEvaluate for CoreMinimumImpedanceFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let Some(requirement) = inputs.design_requirements.minimum_impedance.as_ref() else {
            return Ok((true, 0.0));
        };
        let temperature = inputs.maximum_temperature();

        // impedance goes with the turns squared; bump the turns until every
        // requirement point is met or the window cannot take more copper
        for _ in 0..10 {
            let mut needed_scale = 1.0_f64;
            for point in requirement {
                let impedance = crate::impedance::impedance(magnetic, point.frequency, temperature)?.norm();
                if impedance < point.impedance {
                    needed_scale = needed_scale.max((point.impedance / impedance).sqrt());
                }
            }
            if needed_scale <= 1.0 {
                break;
            }
            let Some(primary) = magnetic.coil.functional_description.first_mut() else {
                return Ok((false, 0.0));
            };
            primary.number_turns =
                ((crate::convert::f64_from_usize(primary.number_turns) * needed_scale).ceil() as usize).max(1);
        }

        let resonance = crate::impedance::self_resonant_frequency(magnetic, temperature)?;
        let mut scoring = 0.0;
        for point in requirement {
            if point.frequency > 0.25 * resonance {
                return Ok((false, 0.0));
            }
            let impedance = crate::impedance::impedance(magnetic, point.frequency, temperature)?.norm();
            scoring += (point.impedance - impedance).abs();
            if impedance < point.impedance {
                return Ok((false, 0.0));
            }
        }
        Ok((true, scoring / crate::convert::f64_from_usize(requirement.len().max(1))))
    }

    fn name(&self) -> &'static str {
        "core_minimum_impedance"
    }
}

/// Wire outline fits the section it is assigned to.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaNoParallelsFilter;

impl AreaNoParallelsFilter {
    /// The per-section check the wire adviser reuses directly.
    #[must_use]
    pub fn wire_fits_section(wire: &Wire, section_dimensions: [f64; 2]) -> bool {
        wire.maximum_outer_width() < section_dimensions[0] && wire.maximum_outer_height() < section_dimensions[1]
    }
}

impl MagneticFilterEvaluate for AreaNoParallelsFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, _inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let Some(sections) = magnetic.coil.sections_description.as_ref() else {
            return Err(Error::CoilNotWound("sections are needed for the area filter".to_owned()));
        };
        for section in sections {
            let Some(winding_name) = section.winding.as_ref() else {
                continue;
            };
            let index = magnetic.coil.winding_index_by_name(winding_name)?;
            if !Self::wire_fits_section(magnetic.coil.wire(index)?, section.dimensions) {
                return Ok((false, 0.0));
            }
        }
        Ok((true, 0.0))
    }

    fn name(&self) -> &'static str {
        "area_no_parallels"
    }
}

/// All parallels of every winding fit their section, with a bounded
/// overflow allowance.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaWithParallelsFilter {
    /// Accept candidates that overflow the section by up to 50%.
    pub allow_not_fit: bool,
}

impl AreaWithParallelsFilter {
    /// The per-section check the wire adviser reuses directly. Returns the
    /// relative overflow as scoring, zero when it fits.
    #[must_use]
    pub fn needed_over_available(
        wire: &Wire,
        turns_and_parallels: f64,
        section_dimensions: [f64; 2],
        number_sections: f64,
    ) -> f64 {
        let needed = wire.maximum_outer_width() * wire.maximum_outer_height() * turns_and_parallels / number_sections;
        let available = section_dimensions[0] * section_dimensions[1];
        (needed - available) / available
    }
}

impl MagneticFilterEvaluate for AreaWithParallelsFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, _inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let Some(sections) = magnetic.coil.sections_description.as_ref() else {
            return Err(Error::CoilNotWound("sections are needed for the area filter".to_owned()));
        };
        let mut worst: f64 = 0.0;
        for section in sections {
            let Some(winding_name) = section.winding.as_ref() else {
                continue;
            };
            let index = magnetic.coil.winding_index_by_name(winding_name)?;
            let winding = &magnetic.coil.functional_description[index];
            let sections_of_winding = sections
                .iter()
                .filter(|s| s.winding.as_deref() == Some(winding_name.as_str()))
                .count();
            let overflow = Self::needed_over_available(
                &winding.wire,
                crate::convert::f64_from_usize(winding.number_turns * winding.number_parallels),
                section.dimensions,
                crate::convert::f64_from_usize(sections_of_winding.max(1)),
            );
            worst = worst.max(overflow);
        }
        if worst <= 0.0 {
            return Ok((true, 0.0));
        }
        if self.allow_not_fit && worst < 0.5 {
            return Ok((true, worst));
        }
        Ok((false, 0.0))
    }

    fn name(&self) -> &'static str {
        "area_with_parallels"
    }
}

/// Per-winding effective AC resistance at the worst effective frequency.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectiveResistanceFilter;

impl MagneticFilterEvaluate for EffectiveResistanceFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let temperature = inputs.maximum_temperature();
        let mut scoring = 0.0;
        for (index, winding) in magnetic.coil.functional_description.iter().enumerate() {
            let mut effective_frequency: f64 = 0.0;
            for operating_point in &inputs.operating_points {
                if let Some(excitation) = operating_point.excitations_per_winding.get(index) {
                    effective_frequency =
                        effective_frequency.max(excitation.current()?.processed()?.effective_frequency);
                }
            }
            scoring += winding_losses::effective_resistance_per_meter(
                &winding.wire,
                effective_frequency.max(1.0),
                temperature,
            )?;
        }
        Ok((true, scoring))
    }

    fn name(&self) -> &'static str {
        "effective_resistance"
    }
}

/// Per-winding proximity factor at the worst effective frequency.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProximityFactorFilter;

impl MagneticFilterEvaluate for ProximityFactorFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        use crate::proximity::ProximityEffect;
        let temperature = inputs.maximum_temperature();
        let probe = |wire: &Wire| crate::outputs::ComplexFieldPoint {
            point: [0.0, 0.0],
            real: 1.0,
            imaginary: 0.0,
            turn_index: Some(0),
            // the edge models want labeled samples
            label: Some(
                match wire {
                    Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => "top",
                    Wire::Round(_) | Wire::Litz(_) => "center",
                }
                .to_owned(),
            ),
        };
        let mut scoring = 0.0;
        for (index, winding) in magnetic.coil.functional_description.iter().enumerate() {
            let mut effective_frequency: f64 = 0.0;
            for operating_point in &inputs.operating_points {
                if let Some(excitation) = operating_point.excitations_per_winding.get(index) {
                    effective_frequency =
                        effective_frequency.max(excitation.current()?.processed()?.effective_frequency);
                }
            }
            let model = ProximityEffectModel::for_wire(&winding.wire);
            // unit field: the loss is the proximity factor itself
            let sample = probe(&winding.wire);
            scoring += model.turn_losses(
                &winding.wire,
                effective_frequency.max(1.0),
                std::slice::from_ref(&sample),
                temperature,
            )?;
        }
        Ok((true, scoring))
    }

    fn name(&self) -> &'static str {
        "proximity_factor"
    }
}

/// Per-winding skin losses per meter, a cheap loss surrogate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkinLossesDensityFilter;

impl MagneticFilterEvaluate for SkinLossesDensityFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let temperature = inputs.maximum_temperature();
        let mut scoring = 0.0;
        for operating_point in &inputs.operating_points {
            for (index, winding) in magnetic.coil.functional_description.iter().enumerate() {
                let Some(excitation) = operating_point.excitations_per_winding.get(index) else {
                    return Ok((false, 0.0));
                };
                let (losses, _) =
                    skin::skin_effect_losses_per_meter(&winding.wire, excitation.current()?, temperature, 1.0, 0.0)?;
                scoring += losses;
            }
        }
        Ok((true, scoring / crate::convert::f64_from_usize(inputs.operating_points.len().max(1))))
    }

    fn name(&self) -> &'static str {
        "skin_losses_density"
    }
}

/// Wire coatings withstand the voltage the insulation coordinator asks of
/// them.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolidInsulationRequirementsFilter;

impl MagneticFilterEvaluate for SolidInsulationRequirementsFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        if inputs.design_requirements.insulation.is_none() {
            return Ok((true, 0.0));
        }
        let withstand = InsulationCoordinator.solid_insulation_voltage(inputs)?;
        let mut scoring = 0.0;
        for winding in &magnetic.coil.functional_description {
            let breakdown = winding.wire.coating().and_then(|c| c.breakdown_voltage).unwrap_or(0.0);
            // both coatings in the path share the requirement
            if breakdown < withstand / 2.0 {
                return Ok((false, 0.0));
            }
            scoring += breakdown - withstand / 2.0;
        }
        Ok((true, scoring))
    }

    fn name(&self) -> &'static str {
        "solid_insulation_requirements"
    }
}

/// Every required turns ratio holds within its tolerance.
#[derive(Clone, Copy, Debug, Default)]
pub struct TurnsRatiosFilter;

impl MagneticFilterEvaluate for TurnsRatiosFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let requirements = &inputs.design_requirements.turns_ratios;
        if requirements.is_empty() {
            return Ok((true, 0.0));
        }
        let ratios = magnetic.turns_ratios();
        if ratios.len() != requirements.len() {
            return Ok((false, 0.0));
        }
        let mut scoring = 0.0;
        for (requirement, ratio) in requirements.iter().zip(ratios.iter()) {
            if !requirement.contains(*ratio) {
                return Ok((false, 0.0));
            }
            scoring += (requirement.resolve() - ratio).abs();
        }
        Ok((true, scoring))
    }

    fn name(&self) -> &'static str {
        "turns_ratios"
    }
}

/// Envelope of the magnetic against the requirement.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaximumDimensionsFilter;

impl MagneticFilterEvaluate for MaximumDimensionsFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let Some(bounds) = inputs.design_requirements.maximum_dimensions.as_ref() else {
            return Ok((true, 0.0));
        };
        let dimensions = magnetic.maximum_dimensions()?;
        let scoring = ((bounds.width - dimensions[0]).powi(2)
            + (bounds.height - dimensions[1]).powi(2)
            + (bounds.depth - dimensions[2]).powi(2))
        .sqrt();
        Ok((magnetic.fits(bounds, true)?, scoring))
    }

    fn name(&self) -> &'static str {
        "maximum_dimensions"
    }
}

/// Peak flux density stays under saturation at every operating point.
#[derive(Clone, Copy, Debug, Default)]
pub struct SaturationFilter;

impl MagneticFilterEvaluate for SaturationFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let mut scoring = 0.0;
        for operating_point in &inputs.operating_points {
            let flux_density = flux_density_of(magnetic, operating_point)?;
            let peak = flux_density.processed()?.peak;
            let saturation = magnetic
                .core
                .saturation_magnetic_flux_density(operating_point.conditions.ambient_temperature)?;
            if peak > saturation {
                return Ok((false, 0.0));
            }
            scoring += (saturation - peak).abs();
        }
        Ok((true, scoring / crate::convert::f64_from_usize(inputs.operating_points.len().max(1))))
    }

    fn name(&self) -> &'static str {
        "saturation"
    }
}

/// DC current density per winding under the conservative ceiling.
#[derive(Clone, Copy, Debug, Default)]
pub struct DcCurrentDensityFilter;

impl MagneticFilterEvaluate for DcCurrentDensityFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let mut scoring = 0.0;
        for operating_point in &inputs.operating_points {
            if operating_point.excitations_per_winding.len() != magnetic.coil.functional_description.len() {
                return Ok((false, 0.0));
            }
            for (winding, excitation) in magnetic
                .coil
                .functional_description
                .iter()
                .zip(operating_point.excitations_per_winding.iter())
            {
                let rms = excitation.current()?.processed()?.rms;
                let density = winding.wire.dc_current_density(rms)
                    / crate::convert::f64_from_usize(winding.number_parallels);
                if density > constants::MAXIMUM_CURRENT_DENSITY {
                    return Ok((false, 0.0));
                }
                scoring += (constants::MAXIMUM_CURRENT_DENSITY - density).abs();
            }
        }
        Ok((true, scoring / crate::convert::f64_from_usize(inputs.operating_points.len().max(1))))
    }

    fn name(&self) -> &'static str {
        "dc_current_density"
    }
}

/// Effective current density per winding under its ceiling.
#[derive(Clone, Copy, Debug, Default)]
pub struct EffectiveCurrentDensityFilter;

impl MagneticFilterEvaluate for EffectiveCurrentDensityFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let mut scoring = 0.0;
        for operating_point in &inputs.operating_points {
            if operating_point.excitations_per_winding.len() != magnetic.coil.functional_description.len() {
                return Ok((false, 0.0));
            }
            let temperature = operating_point.conditions.ambient_temperature;
            for (winding, excitation) in magnetic
                .coil
                .functional_description
                .iter()
                .zip(operating_point.excitations_per_winding.iter())
            {
                let processed = excitation.current()?.processed()?;
                let density = winding.wire.effective_current_density(
                    processed.rms,
                    processed.effective_frequency.max(1.0),
                    temperature,
                )? / crate::convert::f64_from_usize(winding.number_parallels);
                if density > constants::MAXIMUM_EFFECTIVE_CURRENT_DENSITY {
                    return Ok((false, 0.0));
                }
                scoring += (constants::MAXIMUM_EFFECTIVE_CURRENT_DENSITY - density).abs();
            }
        }
        Ok((true, scoring / crate::convert::f64_from_usize(inputs.operating_points.len().max(1))))
    }

    fn name(&self) -> &'static str {
        "effective_current_density"
    }
}

/// Impedance against the requirement curve, with the results recorded.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImpedanceFilter;

impl MagneticFilterEvaluate for ImpedanceFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let temperature = inputs.maximum_temperature();
        let mut valid = true;
        let mut scoring = 0.0;
        if let Some(requirement) = inputs.design_requirements.minimum_impedance.as_ref() {
            for point in requirement {
                let impedance = crate::impedance::impedance(magnetic, point.frequency, temperature)?.norm();
                scoring += (point.impedance - impedance).abs();
                if impedance < point.impedance {
                    valid = false;
                }
            }
            scoring /= crate::convert::f64_from_usize(requirement.len().max(1));
        }

        let mut outputs = outputs;
        if inputs.operating_points.is_empty() {
            let impedance =
                crate::impedance::impedance(magnetic, constants::MEASUREMENT_FREQUENCY, temperature)?.norm();
            scoring += 1.0 / impedance;
        } else {
            for (index, operating_point) in inputs.operating_points.iter().enumerate() {
                let frequency = operating_point.primary_excitation()?.frequency;
                let impedance = crate::impedance::impedance(magnetic, frequency, temperature)?;
                scoring += 1.0 / impedance.norm();
                if let Some(outputs) = outputs.as_deref_mut() {
                    let slot = ensure_outputs(outputs, index);
                    let mut impedance_output = slot.impedance.clone().unwrap_or_default();
                    impedance_output
                        .impedance_per_frequency
                        .push(crate::outputs::ImpedancePoint { frequency, impedance });
                    impedance_output.self_resonant_frequency =
                        crate::impedance::self_resonant_frequency(magnetic, temperature)?;
                    slot.impedance = Some(impedance_output);
                }
            }
        }
        Ok((valid, scoring))
    }

    fn name(&self) -> &'static str {
        "impedance"
    }
}

/// Magnetizing inductance within its tolerance at every operating point.
#[derive(Clone, Copy, Debug, Default)]
pub struct MagnetizingInductanceFilter;

impl MagneticFilterEvaluate for MagnetizingInductanceFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let requirement = inputs.design_requirements.magnetizing_inductance;
        let mut valid = true;
        let mut scoring = 0.0;
        let mut outputs = outputs;
        for (index, operating_point) in inputs.operating_points.iter().enumerate() {
            let (output, _) =
                magnetizing::inductance_from_turns_and_gap(&magnetic.core, &magnetic.coil, operating_point)?;
            scoring += (requirement.resolve() - output.magnetizing_inductance).abs();
            if requirement.contains(output.magnetizing_inductance) {
                if let Some(outputs) = outputs.as_deref_mut() {
                    ensure_outputs(outputs, index).magnetizing_inductance = Some(output);
                }
            } else {
                valid = false;
            }
        }
        Ok((valid, scoring / crate::convert::f64_from_usize(inputs.operating_points.len().max(1))))
    }

    fn name(&self) -> &'static str {
        "magnetizing_inductance"
    }
}

/// Gap length keeps the fringing factor under its ceiling.
#[derive(Clone, Copy, Debug, Default)]
pub struct FringingFactorFilter;

impl MagneticFilterEvaluate for FringingFactorFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, _inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        if magnetic.core.shape.family == CoreShapeFamily::T || !magnetic.core.is_gapped() {
            return Ok((true, 1.0));
        }
        let model = ReluctanceModel::from_settings()?;
        let maximum_gap =
            reluctance::gap_length_for_fringing_factor(&model, &magnetic.core, constants::FRINGING_FACTOR_LIMIT)?;
        let gap_length = magnetic.core.gapping.first().map_or(0.0, |g| g.length);
        Ok((gap_length <= maximum_gap, 1.0))
    }

    fn name(&self) -> &'static str {
        "fringing_factor"
    }
}

/// Envelope volume.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeFilter;

impl MagneticFilterEvaluate for VolumeFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, _inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let [width, height, depth] = magnetic.maximum_dimensions()?;
        Ok((true, width * height * depth))
    }

    fn name(&self) -> &'static str {
        "volume"
    }
}

/// Envelope footprint.
#[derive(Clone, Copy, Debug, Default)]
pub struct AreaFilter;

impl MagneticFilterEvaluate for AreaFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, _inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let [width, _, depth] = magnetic.maximum_dimensions()?;
        Ok((true, width * depth))
    }

    fn name(&self) -> &'static str {
        "area"
    }
}

/// Envelope height.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeightFilter;

impl MagneticFilterEvaluate for HeightFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, _inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let [_, height, _] = magnetic.maximum_dimensions()?;
        Ok((true, height))
    }

    fn name(&self) -> &'static str {
        "height"
    }
}

/// Core temperature reached with the no-proximity losses.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemperatureRiseFilter;

impl MagneticFilterEvaluate for TemperatureRiseFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let losses = match cached_scoring(&magnetic.reference, "losses_no_proximity") {
            Some(losses) => losses,
            None => LossesNoProximityFilter.evaluate(magnetic, inputs, outputs)?.1,
        };
        let model = CoreTemperatureModel::from_settings()?;
        let result = model.core_temperature(&magnetic.core, losses, constants::AMBIENT_TEMPERATURE)?;
        remember_scoring(&magnetic.reference, self.name(), result.maximum_temperature);
        Ok((true, result.maximum_temperature))
    }

    fn name(&self) -> &'static str {
        "temperature_rise"
    }
}

/// Composite of losses and envelope volume.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossesTimesVolumeFilter;

impl MagneticFilterEvaluate for LossesTimesVolumeFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let losses = match cached_scoring(&magnetic.reference, "losses") {
            Some(losses) => losses,
            None => LossesFilter.evaluate(magnetic, inputs, outputs)?.1,
        };
        let (_, volume) = VolumeFilter.evaluate(magnetic, inputs, None)?;
        Ok((true, losses * volume))
    }

    fn name(&self) -> &'static str {
        "losses_times_volume"
    }
}

/// Composite of envelope volume and temperature rise.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeTimesTemperatureRiseFilter;

impl MagneticFilterEvaluate for VolumeTimesTemperatureRiseFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let temperature = match cached_scoring(&magnetic.reference, "temperature_rise") {
            Some(temperature) => temperature,
            None => TemperatureRiseFilter.evaluate(magnetic, inputs, outputs)?.1,
        };
        let (_, volume) = VolumeFilter.evaluate(magnetic, inputs, None)?;
        Ok((true, volume * temperature))
    }

    fn name(&self) -> &'static str {
        "volume_times_temperature_rise"
    }
}

/// Composite of losses, envelope volume and temperature rise.
#[derive(Clone, Copy, Debug, Default)]
pub struct LossesTimesVolumeTimesTemperatureRiseFilter;

impl MagneticFilterEvaluate for LossesTimesVolumeTimesTemperatureRiseFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let mut outputs = outputs;
        let losses = match cached_scoring(&magnetic.reference, "losses") {
            Some(losses) => losses,
            None => LossesFilter.evaluate(magnetic, inputs, outputs.as_deref_mut())?.1,
        };
        let temperature = match cached_scoring(&magnetic.reference, "temperature_rise") {
            Some(temperature) => temperature,
            None => TemperatureRiseFilter.evaluate(magnetic, inputs, outputs)?.1,
        };
        let (_, volume) = VolumeFilter.evaluate(magnetic, inputs, None)?;
        Ok((true, losses * volume * temperature))
    }

    fn name(&self) -> &'static str {
        "losses_times_volume_times_temperature_rise"
    }
}

/// Largest running magnetomotive force across the layer boundaries, the
/// quantity interleaving minimizes.
#[derive(Clone, Copy, Debug, Default)]
pub struct MagnetomotiveForceFilter;

impl MagneticFilterEvaluate for MagnetomotiveForceFilter {
    fn evaluate(&self, magnetic: &mut Magnetic, inputs: &Inputs, _outputs: Option<&mut Vec<Outputs>>) -> Result<(bool, f64)> {
        let Some(layers) = magnetic.coil.layers_description.as_ref() else {
            return Err(Error::CoilNotWound("layers are needed for the MMF filter".to_owned()));
        };
        let mut worst: f64 = 0.0;
        for operating_point in &inputs.operating_points {
            if operating_point.excitations_per_winding.len() != magnetic.coil.functional_description.len() {
                return Ok((false, 0.0));
            }
            let mut running = 0.0_f64;
            for layer in layers {
                if layer.electrical_type != crate::coil::ElectricalType::Conduction {
                    continue;
                }
                let Some(winding_name) = layer.winding.as_ref() else {
                    continue;
                };
                let index = magnetic.coil.winding_index_by_name(winding_name)?;
                let winding = &magnetic.coil.functional_description[index];
                let rms = operating_point.excitations_per_winding[index].current()?.processed()?.rms
                    / crate::convert::f64_from_usize(winding.number_parallels);
                let direction = if index == 0 { 1.0 } else { -1.0 };
                running += direction * rms * crate::convert::f64_from_usize(layer.number_turns);
                worst = worst.max(running.abs());
            }
        }
        Ok((true, worst))
    }

    fn name(&self) -> &'static str {
        "magnetomotive_force"
    }
}

/// All magnetic filters, closed.
#[enum_dispatch(MagneticFilterEvaluate)]
#[derive(Clone, Copy, Debug)]
pub enum MagneticFilter {
    /// See [`AreaProductFilter`].
    AreaProductFilter,
    /// See [`EnergyStoredFilter`].
    EnergyStoredFilter,
    /// See [`EstimatedCostFilter`].
    EstimatedCostFilter,
    /// See [`CoreAndDcLossesFilter`].
    CoreAndDcLossesFilter,
    /// See [`CoreDcAndSkinLossesFilter`].
    CoreDcAndSkinLossesFilter,
    /// See [`LossesFilter`].
    LossesFilter,
    /// See [`LossesNoProximityFilter`].
    LossesNoProximityFilter,
    /// See [`CoreMinimumImpedanceFilter`].
    CoreMinimumImpedanceFilter,
    /// See [`AreaNoParallelsFilter`].
    AreaNoParallelsFilter,
    /// See [`AreaWithParallelsFilter`].
    AreaWithParallelsFilter,
    /// See [`EffectiveResistanceFilter`].
    EffectiveResistanceFilter,
    /// See [`ProximityFactorFilter`].
    ProximityFactorFilter,
    /// See [`SkinLossesDensityFilter`].
    SkinLossesDensityFilter,
    /// See [`SolidInsulationRequirementsFilter`].
    SolidInsulationRequirementsFilter,
    /// See [`TurnsRatiosFilter`].
    TurnsRatiosFilter,
    /// See [`MaximumDimensionsFilter`].
    MaximumDimensionsFilter,
    /// See [`SaturationFilter`].
    SaturationFilter,
    /// See [`DcCurrentDensityFilter`].
    DcCurrentDensityFilter,
    /// See [`EffectiveCurrentDensityFilter`].
    EffectiveCurrentDensityFilter,
    /// See [`ImpedanceFilter`].
    ImpedanceFilter,
    /// See [`MagnetizingInductanceFilter`].
    MagnetizingInductanceFilter,
    /// See [`FringingFactorFilter`].
    FringingFactorFilter,
    /// See [`VolumeFilter`].
    VolumeFilter,
    /// See [`AreaFilter`].
    AreaFilter,
    /// See [`HeightFilter`].
    HeightFilter,
    /// See [`TemperatureRiseFilter`].
    TemperatureRiseFilter,
    /// See [`LossesTimesVolumeFilter`].
    LossesTimesVolumeFilter,
    /// See [`VolumeTimesTemperatureRiseFilter`].
    VolumeTimesTemperatureRiseFilter,
    /// See [`LossesTimesVolumeTimesTemperatureRiseFilter`].
    LossesTimesVolumeTimesTemperatureRiseFilter,
    /// See [`MagnetomotiveForceFilter`].
    MagnetomotiveForceFilter,
}

impl MagneticFilter {
    /// Builds a filter from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        Ok(match key.to_ascii_lowercase().as_str() {
            "area_product" => AreaProductFilter.into(),
            "energy_stored" => EnergyStoredFilter.into(),
            "estimated_cost" => EstimatedCostFilter.into(),
            "core_and_dc_losses" => CoreAndDcLossesFilter.into(),
            "core_dc_and_skin_losses" => CoreDcAndSkinLossesFilter.into(),
            "losses" => LossesFilter.into(),
            "losses_no_proximity" => LossesNoProximityFilter.into(),
            "core_minimum_impedance" => CoreMinimumImpedanceFilter.into(),
            "area_no_parallels" => AreaNoParallelsFilter.into(),
            "area_with_parallels" => AreaWithParallelsFilter::default().into(),
            "effective_resistance" => EffectiveResistanceFilter.into(),
            "proximity_factor" => ProximityFactorFilter.into(),
            "skin_losses_density" => SkinLossesDensityFilter.into(),
            "solid_insulation_requirements" => SolidInsulationRequirementsFilter.into(),
            "turns_ratios" => TurnsRatiosFilter.into(),
            "maximum_dimensions" => MaximumDimensionsFilter.into(),
            "saturation" => SaturationFilter.into(),
            "dc_current_density" => DcCurrentDensityFilter.into(),
            "effective_current_density" => EffectiveCurrentDensityFilter.into(),
            "impedance" => ImpedanceFilter.into(),
            "magnetizing_inductance" => MagnetizingInductanceFilter.into(),
            "fringing_factor" => FringingFactorFilter.into(),
            "volume" => VolumeFilter.into(),
            "area" => AreaFilter.into(),
            "height" => HeightFilter.into(),
            "temperature_rise" => TemperatureRiseFilter.into(),
            "losses_times_volume" => LossesTimesVolumeFilter.into(),
            "volume_times_temperature_rise" => VolumeTimesTemperatureRiseFilter.into(),
            "losses_times_volume_times_temperature_rise" => {
                LossesTimesVolumeTimesTemperatureRiseFilter.into()
            }
            "magnetomotive_force" => MagnetomotiveForceFilter.into(),
            _ => return Err(Error::ModelNotAvailable(format!("unknown magnetic filter {key}"))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::coil::{Coil, IsolationSide, Winding};
    use crate::core::Core;
    use crate::inputs::{DesignRequirements, DimensionWithTolerance, MaximumDimensions};
    use crate::signal::{OperatingConditions, OperatingPoint, OperatingPointExcitation, SignalDescriptor};
    use crate::wire::{RoundWire, WireCoating};

    fn fixture() -> (Magnetic, Inputs) {
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
        let magnetic = Magnetic::new(core, coil);
        let operating_point = OperatingPoint {
            conditions: OperatingConditions::default(),
            excitations_per_winding: vec![OperatingPointExcitation {
                frequency: 100e3,
                voltage: Some(SignalDescriptor::sinusoidal(20.0, 0.0, 100e3).unwrap()),
                current: Some(SignalDescriptor::sinusoidal(0.5, 0.0, 100e3).unwrap()),
                magnetizing_current: None,
                magnetic_flux_density: None,
            }],
        };
        let inputs = Inputs {
            design_requirements: DesignRequirements {
                magnetizing_inductance: DimensionWithTolerance::nominal(1e-3),
                ..DesignRequirements::default()
            },
            operating_points: vec![operating_point],
        };
        (magnetic, inputs)
    }

    #[test]
    fn saturation_filter_accepts_a_small_excitation() {
        let (mut magnetic, inputs) = fixture();
        let (valid, scoring) = SaturationFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        assert!(valid);
        assert!(scoring > 0.0);
    }

    #[test]
    fn dimension_filters_are_consistent() {
        let (mut magnetic, mut inputs) = fixture();
        let (_, volume) = VolumeFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        let (_, area) = AreaFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        let (_, height) = HeightFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        assert!((volume - area * height).abs() < volume * 1e-9);

        inputs.design_requirements.maximum_dimensions = Some(MaximumDimensions {
            width: 1e-3,
            height: 1e-3,
            depth: 1e-3,
        });
        let (valid, _) = MaximumDimensionsFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        assert!(!valid);
    }

    #[test]
    fn magnetizing_inductance_filter_writes_outputs() {
        let (mut magnetic, mut inputs) = fixture();
        let mut outputs = Vec::new();
        // first with an impossible requirement, then with the actual value
        let (valid, _) = MagnetizingInductanceFilter
            .evaluate(&mut magnetic, &inputs, Some(&mut outputs))
            .unwrap();
        assert!(!valid);

        let (output, _) = magnetizing::inductance_from_turns_and_gap(
            &magnetic.core,
            &magnetic.coil,
            &inputs.operating_points[0],
        )
        .unwrap();
        inputs.design_requirements.magnetizing_inductance =
            DimensionWithTolerance::nominal(output.magnetizing_inductance);
        let (valid, _) = MagnetizingInductanceFilter
            .evaluate(&mut magnetic, &inputs, Some(&mut outputs))
            .unwrap();
        assert!(valid);
        assert!(outputs[0].magnetizing_inductance.is_some());
    }

    #[test]
    fn turns_ratio_filter_checks_the_tolerance() {
        let (mut magnetic, mut inputs) = fixture();
        inputs.design_requirements.turns_ratios = vec![DimensionWithTolerance::nominal(2.0)];
        // single winding cannot offer any ratio
        let (valid, _) = TurnsRatiosFilter.evaluate(&mut magnetic, &inputs, None).unwrap();
        assert!(!valid);
    }
}
