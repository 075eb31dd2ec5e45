//! Advisers: pipelines that enumerate candidate magnetics, run the filter
//! stack in weighted order and return the top candidates.

use crate::catalogue;
use crate::coil::{Coil, IsolationSide, Winding};
use crate::constants;
use crate::core::Core;
use crate::error::{Error, Result};
use crate::filter::{
    AreaWithParallelsFilter, MagneticFilter, MagneticFilterEvaluate, SolidInsulationRequirementsFilter,
};
use crate::inputs::Inputs;
use crate::magnetic::Magnetic;
use crate::magnetizing;
use crate::outputs::Outputs;
use crate::settings::Settings;
use crate::wire::{Wire, WireType};
use itertools::Itertools;
use rayon::prelude::*;

/// The filters a core adviser weights, in tie-breaking order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CoreAdviserFilter {
    /// Area-product sizing.
    AreaProduct,
    /// Storable magnetic energy.
    EnergyStored,
    /// Window area and manufacturability.
    WindingWindowArea,
    /// Core and DC losses.
    CoreLosses,
    /// Core temperature.
    CoreTemperature,
    /// Envelope dimensions.
    Dimensions,
}

impl CoreAdviserFilter {
    const ALL: [Self; 6] = [
        Self::AreaProduct,
        Self::EnergyStored,
        Self::WindingWindowArea,
        Self::CoreLosses,
        Self::CoreTemperature,
        Self::Dimensions,
    ];

    fn filter(self) -> MagneticFilter {
        match self {
            Self::AreaProduct => crate::filter::AreaProductFilter.into(),
            Self::EnergyStored => crate::filter::EnergyStoredFilter.into(),
            Self::WindingWindowArea => crate::filter::EstimatedCostFilter.into(),
            Self::CoreLosses => crate::filter::CoreAndDcLossesFilter.into(),
            Self::CoreTemperature => crate::filter::TemperatureRiseFilter.into(),
            Self::Dimensions => crate::filter::VolumeFilter.into(),
        }
    }

    const fn is_losses_based(self) -> bool {
        matches!(self, Self::CoreLosses | Self::CoreTemperature)
    }
}

/// A candidate magnetic, its running score and its outputs so far.
#[derive(Clone, Debug)]
pub struct AdvisedMagnetic {
    /// The candidate, frozen after ranking.
    pub magnetic: Magnetic,
    /// Outputs populated by the filters, one per operating point.
    pub outputs: Vec<Outputs>,
    /// Accumulated weighted scoring; larger is better.
    pub scoring: f64,
}

/// Searches the core catalogue for the cores that best carry the required
/// magnetizing behavior.
#[derive(Clone, Debug)]
pub struct CoreAdviser {
    /// Weight of each filter in the scoring.
    pub weights: Vec<(CoreAdviserFilter, f64)>,
}

impl Default for CoreAdviser {
    fn default() -> Self {
        Self {
            weights: CoreAdviserFilter::ALL.iter().map(|&f| (f, 1.0)).collect(),
        }
    }
}

struct Candidate {
    magnetic: Magnetic,
    outputs: Vec<Outputs>,
    scoring: f64,
}

impl CoreAdviser {
    /// Runs the pipeline and returns up to `maximum_results` candidates,
    /// best first. Deterministic: scoring depends only on the inputs and
    /// the candidate, and ties keep catalogue order.
    ///
    /// # Errors
    ///
    /// Propagates catalogue failures; per-candidate physics failures are
    /// logged at DEBUG and drop only that candidate.
    pub fn advise(&self, inputs: &Inputs, maximum_results: usize) -> Result<Vec<AdvisedMagnetic>> {
        let settings = Settings::snapshot();
        let cores: Vec<Core> = catalogue::all_cores()?
            .into_iter()
            .filter(|core| settings.use_toroidal_cores || core.shape.family != crate::shape::CoreShapeFamily::T)
            .collect();

        let operating_point = inputs.operating_point(0)?;
        let frequency = operating_point.primary_excitation()?.frequency;
        let dummy_wire = Wire::for_frequency(frequency, operating_point.conditions.ambient_temperature)?;

        // one dummy winding per excitation, so the loss filters see the
        // same winding count the operating points describe
        let dummy_windings: Vec<Winding> = (0..operating_point.excitations_per_winding.len().max(1))
            .map(|index| Winding {
                name: if index == 0 {
                    "primary".to_owned()
                } else {
                    format!("secondary {index}")
                },
                isolation_side: if index == 0 { IsolationSide::Primary } else { IsolationSide::Secondary },
                number_turns: 1,
                number_parallels: 1,
                wire: dummy_wire.clone(),
            })
            .collect();

        let mut without_stacks = Vec::new();
        let mut with_stacks = Vec::new();
        for core in &cores {
            let stacks = if settings.core_adviser_include_stacks && core.shape.family.stackable() {
                constants::MAXIMUM_NUMBER_STACKS
            } else {
                1
            };
            for stack in 1..=stacks {
                let mut stacked = core.clone();
                stacked.number_stacks = stack;
                stacked.process()?;
                let coil = Coil::new(dummy_windings.clone(), &stacked)?;
                let candidate = Candidate {
                    magnetic: Magnetic::new(stacked, coil),
                    outputs: Vec::new(),
                    scoring: 0.0,
                };
                if stack == 1 {
                    without_stacks.push(clone_candidate(&candidate));
                }
                with_stacks.push(candidate);
            }
        }

        let first_filter = self.first_filter();
        log::info!(
            "starting the search with {} magnetics ({} including stacks), first filter {:?}",
            without_stacks.len(),
            with_stacks.len(),
            first_filter
        );

        let pool = if first_filter.is_losses_based() {
            log::info!("stacked cores join from the start because the leading filter is losses-based");
            clone_candidates(&with_stacks)
        } else {
            without_stacks
        };

        let mut survivors = self.apply_filters(pool, inputs, settings.core_adviser_maximum_magnetics_after_filtering)?;
        if survivors.len() < maximum_results {
            log::info!(
                "only {} survivors; searching again with stacked cores included",
                survivors.len()
            );
            survivors = self.apply_filters(with_stacks, inputs, usize::MAX)?;
        }

        survivors.truncate(maximum_results);
        Ok(survivors
            .into_iter()
            .map(|c| AdvisedMagnetic {
                magnetic: c.magnetic,
                outputs: c.outputs,
                scoring: c.scoring,
            })
            .collect())
    }

    fn first_filter(&self) -> CoreAdviserFilter {
        self.weights
            .iter()
            .max_by(|(fa, wa), (fb, wb)| wa.total_cmp(wb).then_with(|| fb.cmp(fa)))
            .map_or(CoreAdviserFilter::AreaProduct, |(f, _)| *f)
    }

    fn weight_of(&self, filter: CoreAdviserFilter) -> f64 {
        self.weights
            .iter()
            .find(|(f, _)| *f == filter)
            .map_or(0.0, |(_, w)| *w)
    }

    fn apply_filters(
        &self,
        mut candidates: Vec<Candidate>,
        inputs: &Inputs,
        maximum_after_filtering: usize,
    ) -> Result<Vec<Candidate>> {
        let first_filter = self.first_filter();

        if first_filter.is_losses_based() {
            assign_initial_turns(&mut candidates, inputs);
        }
        candidates = run_filter(candidates, first_filter.filter(), inputs, self.weight_of(first_filter));
        log::info!(
            "{} magnetics left after the first filter, {:?}",
            candidates.len(),
            first_filter
        );
        if candidates.len() > maximum_after_filtering {
            candidates.truncate(maximum_after_filtering);
            log::info!("culled to {} magnetics on the first filter's score", candidates.len());
        }
        if !first_filter.is_losses_based() {
            assign_initial_turns(&mut candidates, inputs);
        }

        for filter in CoreAdviserFilter::ALL {
            if filter == first_filter {
                continue;
            }
            candidates = run_filter(candidates, filter.filter(), inputs, self.weight_of(filter));
            log::info!("{} magnetics left after {:?}", candidates.len(), filter);
        }
        Ok(candidates)
    }
}

fn clone_candidate(candidate: &Candidate) -> Candidate {
    Candidate {
        magnetic: candidate.magnetic.clone(),
        outputs: candidate.outputs.clone(),
        scoring: candidate.scoring,
    }
}

fn clone_candidates(candidates: &[Candidate]) -> Vec<Candidate> {
    candidates.iter().map(clone_candidate).collect()
}

/// Assigns the turn count that realizes the required inductance, and winds
/// the dummy coil with it. Candidates whose turns cannot be computed or
/// wound are dropped.
fn assign_initial_turns(candidates: &mut Vec<Candidate>, inputs: &Inputs) {
    candidates.retain_mut(|candidate| {
        let turns = match magnetizing::turns_from_gap_and_inductance(&candidate.magnetic.core, inputs) {
            Ok(turns) => turns,
            Err(e) => {
                log::debug!("dropping {}: {e}", candidate.magnetic.reference);
                return false;
            }
        };
        candidate.magnetic.coil.functional_description[0].number_turns = turns;
        // secondaries follow the required turns ratios
        for (index, ratio) in inputs.design_requirements.turns_ratios.iter().enumerate() {
            if let Some(winding) = candidate.magnetic.coil.functional_description.get_mut(index + 1) {
                winding.number_turns =
                    ((crate::convert::f64_from_usize(turns) / ratio.resolve()).round() as usize).max(1);
            }
        }
        let core = candidate.magnetic.core.clone();
        if let Err(e) = candidate.magnetic.coil.wind(&core) {
            log::debug!("dropping {}: {e}", candidate.magnetic.reference);
            return false;
        }
        true
    });
}

/// Runs one filter over all candidates in parallel, drops the invalid
/// ones and folds the normalized score into the running total:
/// `score' = score + w · (1 − (s − s_min)/(s_max − s_min))`.
fn run_filter(candidates: Vec<Candidate>, filter: MagneticFilter, inputs: &Inputs, weight: f64) -> Vec<Candidate> {
    if weight <= 0.0 {
        return candidates;
    }
    let mut evaluated: Vec<(Candidate, f64)> = candidates
        .into_par_iter()
        .filter_map(|mut candidate| {
            let mut outputs = std::mem::take(&mut candidate.outputs);
            match filter.evaluate(&mut candidate.magnetic, inputs, Some(&mut outputs)) {
                Ok((true, scoring)) => {
                    candidate.outputs = outputs;
                    Some((candidate, scoring))
                }
                Ok((false, _)) => None,
                Err(e) => {
                    log::debug!("dropping {}: {e}", candidate.magnetic.reference);
                    None
                }
            }
        })
        .collect();

    if evaluated.is_empty() {
        return Vec::new();
    }
    let (minimum, maximum) = evaluated
        .iter()
        .map(|(_, s)| *s)
        .minmax()
        .into_option()
        .unwrap_or((0.0, 0.0));
    for (candidate, scoring) in &mut evaluated {
        if maximum > minimum {
            candidate.scoring += weight * (1.0 - (*scoring - minimum) / (maximum - minimum));
        } else {
            candidate.scoring += 1.0;
        }
    }
    // stable sort keeps catalogue order on ties, which makes reruns
    // reproducible
    evaluated.sort_by(|(a, _), (b, _)| b.scoring.total_cmp(&a.scoring));
    evaluated.into_iter().map(|(c, _)| c).collect()
}

/// Searches wires and parallels for each winding of an already chosen
/// core.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoilAdviser;

impl CoilAdviser {
    /// Replaces the windings of `magnetic` with the best wire choices that
    /// fit its winding window, trying interleaving patterns when the plain
    /// order does not wind. Returns up to `maximum_results` candidates,
    /// best first.
    ///
    /// # Errors
    ///
    /// Propagates structural failures of the inputs; candidates that fail
    /// to wind are dropped silently at DEBUG level.
    pub fn advise(&self, magnetic: &Magnetic, inputs: &Inputs, maximum_results: usize) -> Result<Vec<AdvisedMagnetic>> {
        let settings = Settings::snapshot();
        let operating_point = inputs.operating_point(0)?;
        let temperature = operating_point.conditions.ambient_temperature;
        let windings = magnetic.coil.functional_description.clone();
        if operating_point.excitations_per_winding.len() != windings.len() {
            return Err(Error::InvalidInput(format!(
                "{} excitations for {} windings",
                operating_point.excitations_per_winding.len(),
                windings.len()
            )));
        }

        let window = &magnetic.coil.bobbin.winding_windows[0];
        let section_dimensions = if window.shape == crate::core::WindingWindowShape::Round {
            // a toroidal "section" is an angular slice of the bore annulus
            let bore_radius = window.radial_height.unwrap_or(0.0);
            [
                bore_radius / crate::convert::f64_from_usize(windings.len()),
                2.0 * std::f64::consts::PI * bore_radius * 0.8,
            ]
        } else {
            [
                window.width.unwrap_or(0.0) / crate::convert::f64_from_usize(windings.len()),
                window.height.unwrap_or(0.0),
            ]
        };

        let wires: Vec<Wire> = catalogue::all_wires()
            .into_iter()
            .filter(|wire| match wire.wire_type() {
                WireType::Round => settings.wire_adviser_include_round,
                WireType::Litz => settings.wire_adviser_include_litz,
                WireType::Rectangular => settings.wire_adviser_include_rectangular,
                WireType::Foil => settings.wire_adviser_include_foil,
                WireType::Planar => false,
            })
            .take(settings.coil_adviser_maximum_number_wires)
            .collect();
        log::info!("coil adviser considering {} wires per winding", wires.len());

        // rank (wire, parallels) per winding by the surrogate losses
        let mut choices_per_winding: Vec<Vec<(Wire, usize, f64)>> = Vec::with_capacity(windings.len());
        for (winding_index, winding) in windings.iter().enumerate() {
            let excitation = &operating_point.excitations_per_winding[winding_index];
            let current = excitation.current()?;
            let processed = current.processed()?;
            let effective_frequency = processed.effective_frequency.max(1.0);

            let mut choices = Vec::new();
            for wire in &wires {
                for parallels in 1..=settings.coil_adviser_maximum_number_parallels {
                    let physical = crate::convert::f64_from_usize(winding.number_turns * parallels);
                    let overflow = AreaWithParallelsFilter::needed_over_available(
                        wire,
                        physical,
                        section_dimensions,
                        1.0,
                    );
                    if overflow > 0.0 {
                        continue;
                    }
                    let density = wire.effective_current_density(
                        processed.rms,
                        effective_frequency,
                        temperature,
                    )? / crate::convert::f64_from_usize(parallels);
                    if density > constants::MAXIMUM_EFFECTIVE_CURRENT_DENSITY {
                        continue;
                    }
                    let resistance =
                        crate::winding_losses::effective_resistance_per_meter(wire, effective_frequency, temperature)?
                            / crate::convert::f64_from_usize(parallels);
                    choices.push((wire.clone(), parallels, resistance));
                    break;
                }
            }
            choices.sort_by(|(_, _, a), (_, _, b)| a.total_cmp(b));
            log::info!(
                "winding {} has {} feasible wire choices",
                winding.name,
                choices.len()
            );
            if choices.is_empty() {
                return Ok(Vec::new());
            }
            choices_per_winding.push(choices);
        }

        // try the best choices first, with plain and interleaved patterns
        let mut results = Vec::new();
        let patterns: Vec<Vec<usize>> = if windings.len() > 1 {
            let plain: Vec<usize> = (0..windings.len()).collect();
            let mut doubled = plain.clone();
            doubled.extend(plain.iter().copied());
            vec![plain, doubled]
        } else {
            vec![vec![0]]
        };

        for rank in 0..choices_per_winding.iter().map(Vec::len).max().unwrap_or(0) {
            let mut candidate_windings = windings.clone();
            for (winding, choices) in candidate_windings.iter_mut().zip(choices_per_winding.iter()) {
                let (wire, parallels, _) = &choices[rank.min(choices.len() - 1)];
                winding.wire = wire.clone();
                winding.number_parallels = *parallels;
            }

            for pattern in &patterns {
                let mut coil = Coil::new(candidate_windings.clone(), &magnetic.core)?;
                if let Err(e) = coil.wind_with_pattern(&magnetic.core, pattern) {
                    log::debug!("pattern {pattern:?} did not wind: {e}");
                    continue;
                }
                let mut candidate = Magnetic::new(magnetic.core.clone(), coil);
                candidate.reference = format!("{}/{rank}/{}", magnetic.reference, pattern.len());
                let mut outputs = Vec::new();
                let insulation_ok = SolidInsulationRequirementsFilter
                    .evaluate(&mut candidate, inputs, Some(&mut outputs))
                    .map(|(valid, _)| valid)
                    .unwrap_or(false);
                if !insulation_ok {
                    continue;
                }
                let scoring = 1.0 / (1.0 + crate::convert::f64_from_usize(rank + pattern.len()));
                results.push(AdvisedMagnetic {
                    magnetic: candidate,
                    outputs,
                    scoring,
                });
                if results.len() >= maximum_results {
                    log::info!("coil adviser kept {} candidates", results.len());
                    return Ok(results);
                }
            }
        }
        log::info!("coil adviser kept {} candidates", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{DesignRequirements, DimensionWithTolerance};
    use crate::signal::{OperatingConditions, OperatingPoint, OperatingPointExcitation, SignalDescriptor};

    fn buck_inductor_inputs() -> Inputs {
        Inputs {
            design_requirements: DesignRequirements {
                magnetizing_inductance: DimensionWithTolerance::between(80e-6, 120e-6),
                ..DesignRequirements::default()
            },
            operating_points: vec![OperatingPoint {
                conditions: OperatingConditions::default(),
                excitations_per_winding: vec![OperatingPointExcitation {
                    frequency: 100e3,
                    voltage: Some(SignalDescriptor::sinusoidal(12.0, 0.0, 100e3).unwrap()),
                    current: Some(SignalDescriptor::triangular(1.0, 2.0, 100e3).unwrap()),
                    magnetizing_current: None,
                    magnetic_flux_density: None,
                }],
            }],
        }
    }

    #[test]
    fn core_adviser_returns_ranked_candidates() {
        crate::filter::clear_scoring_cache();
        let results = CoreAdviser::default().advise(&buck_inductor_inputs(), 3).unwrap();
        assert!(!results.is_empty());
        assert!(results.windows(2).all(|w| w[0].scoring >= w[1].scoring));
        for advised in &results {
            assert!(advised.magnetic.coil.functional_description[0].number_turns >= 1);
        }
    }

    #[test]
    fn core_adviser_is_deterministic() {
        let inputs = buck_inductor_inputs();
        crate::filter::clear_scoring_cache();
        let first = CoreAdviser::default().advise(&inputs, 3).unwrap();
        crate::filter::clear_scoring_cache();
        let second = CoreAdviser::default().advise(&inputs, 3).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.magnetic.reference, b.magnetic.reference);
            assert!((a.scoring - b.scoring).abs() < 1e-12);
        }
    }

    #[test]
    fn coil_adviser_dresses_a_chosen_core() {
        crate::filter::clear_scoring_cache();
        let inputs = buck_inductor_inputs();
        let cores = CoreAdviser::default().advise(&inputs, 1).unwrap();
        let advised = CoilAdviser.advise(&cores[0].magnetic, &inputs, 2).unwrap();
        assert!(!advised.is_empty());
        for candidate in &advised {
            assert!(candidate.magnetic.coil.turns_description.is_some());
        }
    }
}
