//! Field mesher: turns one coil into clouds of inducing and induced field
//! points, one pair of clouds per significant harmonic.

use crate::coil::Turn;
use crate::core::Core;
use crate::error::{Error, Result};
use crate::magnetic::Magnetic;
use crate::settings::Settings;
use crate::shape::CoreShapeFamily;
use crate::signal::OperatingPoint;
use crate::wire::Wire;
use arrayvec::ArrayVec;

/// One source or evaluation point of the field map.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldPoint {
    /// Position `[x, y]`, in m.
    pub point: [f64; 2],
    /// Current carried (inducing points) or zero (induced points), in A.
    pub value: f64,
    /// Turn the point belongs to, when any.
    pub turn_index: Option<usize>,
    /// Mean length of that turn, in m.
    pub turn_length: Option<f64>,
    /// Edge label for the Wang model.
    pub label: Option<&'static str>,
    /// Rotation of the turn in degrees; toroids only.
    pub rotation: Option<f64>,
}

impl FieldPoint {
    /// A bare point at `[x, y]`.
    #[must_use]
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            point: [x, y],
            value: 0.0,
            turn_index: None,
            turn_length: None,
            label: None,
            rotation: None,
        }
    }
}

/// All field points of one harmonic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Field {
    /// Harmonic frequency, in Hz.
    pub frequency: f64,
    /// Points of the cloud.
    pub data: Vec<FieldPoint>,
}

/// How turns are broken into field points.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoilMesherModel {
    /// One point at the turn center; round and litz wires.
    Center,
    /// Labeled edge points; rectangular, planar and foil wires.
    Wang,
}

impl CoilMesherModel {
    /// The mesher the wire type calls for.
    #[must_use]
    pub const fn for_wire(wire: &Wire) -> Self {
        match wire {
            Wire::Round(_) | Wire::Litz(_) => Self::Center,
            Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_) => Self::Wang,
        }
    }

    /// Inducing points of one turn: the turn center with its core mirror
    /// images (center model) or the edge concentration points (Wang).
    /// Every point's `value` is a multiplier to be scaled by the harmonic
    /// current later.
    ///
    /// # Errors
    ///
    /// Propagates unprocessed-core failures; toroidal turns must carry a
    /// rotation.
    pub fn inducing_points(
        &self,
        turn: &Turn,
        wire: &Wire,
        turn_index: usize,
        core: &Core,
    ) -> Result<Vec<FieldPoint>> {
        let processed = core.processed()?;
        if core.shape.family == CoreShapeFamily::T {
            if turn.rotation.is_none() {
                return Err(Error::InvalidInput(
                    "toroidal turns must carry a rotation, even if it is zero".to_owned(),
                ));
            }
            let mut point = FieldPoint::at(turn.coordinates[0], turn.coordinates[1]);
            point.value = 1.0;
            point.turn_index = Some(turn_index);
            point.turn_length = Some(turn.length);
            point.rotation = turn.rotation;
            return Ok(vec![point]);
        }

        match self {
            Self::Center => {
                let mirroring = Settings::snapshot().magnetic_field_mirroring_dimension;
                let permeability =
                    core.initial_permeability(crate::constants::AMBIENT_TEMPERATURE, None, None)?;
                let window = &processed.winding_windows[0];
                let window_width = window.width.unwrap_or(0.0);
                let window_height = window.height.unwrap_or(0.0);
                let column_half_width = processed.columns[0].width / 2.0;

                // window-frame coordinates of the turn; images fold with the
                // parity of the mirror index
                let turn_a = turn.coordinates[0] - column_half_width;
                let turn_b = turn.coordinates[1] + window_height / 2.0;

                let mut points = Vec::new();
                for m in -mirroring..=mirroring {
                    for n in -mirroring..=mirroring {
                        let order = f64::from(m.abs().max(n.abs()));
                        let multiplier = (permeability - order) / (permeability + order);
                        let a = if m % 2 == 0 {
                            f64::from(m).mul_add(window_width, turn_a)
                        } else {
                            f64::from(m).mul_add(window_width, window_width - turn_a)
                        };
                        let b = if n % 2 == 0 {
                            f64::from(n).mul_add(window_height, turn_b)
                        } else {
                            f64::from(n).mul_add(window_height, window_height - turn_b)
                        };
                        let mut point = FieldPoint::at(a + column_half_width, b - window_height / 2.0);
                        point.value = multiplier;
                        point.turn_index = Some(turn_index);
                        point.turn_length = Some(turn.length);
                        points.push(point);
                    }
                }
                Ok(points)
            }
            Self::Wang => {
                // the current concentrates at two edges, at distance λ·h
                // from the conductor surface
                let (c, h) = wang_dimensions(wire);
                let lambda = 0.01_f64.mul_add(c / h, 0.66).min(0.99);
                let w = lambda * h;
                let mut template = FieldPoint::at(0.0, 0.0);
                template.value = 1.0;
                template.turn_index = Some(turn_index);
                template.turn_length = Some(turn.length);

                let mut points: ArrayVec<FieldPoint, 4> = ArrayVec::new();
                match wire {
                    Wire::Foil(_) => {
                        let half = wire.maximum_conducting_height() / 2.0;
                        for (label, y) in [("top", half - w), ("bottom", w - half)] {
                            let mut point = template.clone();
                            point.point = [turn.coordinates[0], turn.coordinates[1] + y];
                            point.label = Some(label);
                            points.push(point);
                        }
                    }
                    Wire::Rectangular(_) | Wire::Planar(_) => {
                        let half = wire.maximum_conducting_width() / 2.0;
                        for (label, x) in [("right", half - w), ("left", w - half)] {
                            let mut point = template.clone();
                            point.point = [turn.coordinates[0] + x, turn.coordinates[1]];
                            point.label = Some(label);
                            points.push(point);
                        }
                    }
                    Wire::Round(_) | Wire::Litz(_) => {
                        let half_w = wire.maximum_conducting_width() / 2.0;
                        let half_h = wire.maximum_conducting_height() / 2.0;
                        for [dx, dy] in [[0.0, half_h - w], [0.0, w - half_h], [half_w - w, 0.0], [w - half_w, 0.0]] {
                            let mut point = template.clone();
                            point.point = [turn.coordinates[0] + dx, turn.coordinates[1] + dy];
                            points.push(point);
                        }
                    }
                }
                Ok(points.into_iter().collect())
            }
        }
    }

    /// Induced (evaluation) points of one turn: its center, or the four
    /// labeled edge midpoints for the Wang model.
    #[must_use]
    pub fn induced_points(&self, turn: &Turn, wire: &Wire, turn_index: usize) -> Vec<FieldPoint> {
        match self {
            Self::Center => {
                let mut point = FieldPoint::at(turn.coordinates[0], turn.coordinates[1]);
                point.turn_index = Some(turn_index);
                point.label = Some("center");
                vec![point]
            }
            Self::Wang => {
                let half_w = wire.maximum_conducting_width() / 2.0;
                let half_h = wire.maximum_conducting_height() / 2.0;
                [
                    ("right", [half_w, 0.0]),
                    ("left", [-half_w, 0.0]),
                    ("top", [0.0, half_h]),
                    ("bottom", [0.0, -half_h]),
                ]
                .into_iter()
                .map(|(label, [dx, dy])| {
                    let mut point = FieldPoint::at(turn.coordinates[0] + dx, turn.coordinates[1] + dy);
                    point.turn_index = Some(turn_index);
                    point.label = Some(label);
                    point
                })
                .collect()
            }
        }
    }
}

fn wang_dimensions(wire: &Wire) -> (f64, f64) {
    match wire {
        Wire::Foil(_) => (wire.maximum_conducting_height(), wire.maximum_conducting_width()),
        _ => (wire.maximum_conducting_width(), wire.maximum_conducting_height()),
    }
}

/// Indexes of the harmonics the field map keeps: the significant ones, with
/// the threshold tripled while they still exceed 20% of the harmonic table
/// (the quick path for waveforms with dense spectra).
///
/// # Errors
///
/// Propagates missing-harmonics failures.
pub fn common_harmonic_indexes(operating_point: &OperatingPoint, threshold: f64) -> Result<Vec<usize>> {
    let harmonics = operating_point.primary_excitation()?.current()?.harmonics()?;
    let mut threshold = threshold;
    loop {
        let indexes = harmonics.significant_indexes(threshold);
        if indexes.len() > harmonics.amplitudes.len() / 5 {
            threshold *= 3.0;
        } else {
            return Ok(indexes);
        }
    }
}

/// Inducing clouds of the whole coil, one per retained harmonic, ascending.
/// Point values are the peak harmonic current through the turn, signed by
/// the winding's current direction.
///
/// # Errors
///
/// Propagates unwound-coil and signal failures.
pub fn generate_mesh_inducing_coil(
    magnetic: &Magnetic,
    operating_point: &OperatingPoint,
    threshold: f64,
    current_direction_per_winding: &[i8],
    model_override: Option<CoilMesherModel>,
) -> Result<Vec<Field>> {
    let coil = &magnetic.coil;
    let turns = coil.turns()?;
    let divider = crate::winding_losses::current_divider_per_turn(coil);
    let indexes = common_harmonic_indexes(operating_point, threshold)?;

    let mut fields: Vec<Field> = Vec::with_capacity(indexes.len());
    for &harmonic_index in &indexes {
        let mut frequency = 0.0;
        for excitation in &operating_point.excitations_per_winding {
            if let Ok(harmonics) = excitation.current()?.harmonics()
                && harmonic_index < harmonics.frequencies.len()
            {
                frequency = harmonics.frequencies[harmonic_index];
                break;
            }
        }
        if frequency == 0.0 {
            return Err(Error::InvalidInput("zero frequency in the field mesh".to_owned()));
        }
        fields.push(Field {
            frequency,
            data: Vec::new(),
        });
    }

    for (turn_index, turn) in turns.iter().enumerate() {
        let winding_index = coil.winding_index_by_name(&turn.winding)?;
        let wire = coil.wire(winding_index)?;
        let model = model_override.unwrap_or_else(|| CoilMesherModel::for_wire(wire));
        let points = model.inducing_points(turn, wire, turn_index, &magnetic.core)?;
        let harmonics = operating_point.excitations_per_winding[winding_index]
            .current()?
            .harmonics()?;
        let direction = f64::from(current_direction_per_winding.get(winding_index).copied().unwrap_or(1));

        for (slot, &harmonic_index) in indexes.iter().enumerate() {
            let amplitude = harmonics.amplitudes.get(harmonic_index).copied().unwrap_or(0.0);
            let current = amplitude * divider[turn_index] * direction;
            Error::check_finite(current, "harmonic current in turn")?;
            for point in &points {
                let mut scaled = point.clone();
                scaled.value = point.value * current;
                fields[slot].data.push(scaled);
            }
        }
    }

    Ok(fields)
}

/// Induced clouds of the whole coil, matching
/// [`generate_mesh_inducing_coil`] harmonic for harmonic.
///
/// # Errors
///
/// Propagates unwound-coil and signal failures.
pub fn generate_mesh_induced_coil(
    magnetic: &Magnetic,
    operating_point: &OperatingPoint,
    threshold: f64,
) -> Result<Vec<Field>> {
    let coil = &magnetic.coil;
    let turns = coil.turns()?;
    let indexes = common_harmonic_indexes(operating_point, threshold)?;
    let harmonics = operating_point.primary_excitation()?.current()?.harmonics()?;

    let mut points = Vec::new();
    for (turn_index, turn) in turns.iter().enumerate() {
        let winding_index = coil.winding_index_by_name(&turn.winding)?;
        let wire = coil.wire(winding_index)?;
        let model = CoilMesherModel::for_wire(wire);
        points.extend(model.induced_points(turn, wire, turn_index));
    }

    Ok(indexes
        .iter()
        .map(|&harmonic_index| Field {
            frequency: harmonics.frequencies[harmonic_index],
            data: points.clone(),
        })
        .collect())
}

/// Rectangular evaluation grid over the winding window, for the leakage
/// energy integration. Returns the cloud and the area `dA` of one cell.
/// Points inside conductors are excluded unless `include_inside_turns`;
/// points far from every conductor are excluded when the grid auto-scales.
///
/// # Errors
///
/// Propagates unwound-coil failures.
pub fn generate_mesh_induced_grid(
    magnetic: &Magnetic,
    frequency: f64,
    number_points_x: usize,
    number_points_y: usize,
    ignore_turns: bool,
    include_inside_turns: bool,
) -> Result<(Field, f64)> {
    let settings = Settings::snapshot();
    let processed = magnetic.core.processed()?;
    let window = &processed.winding_windows[0];
    let turns = magnetic.coil.turns()?;

    let (x0, x1, y0, y1) = if window.shape == crate::core::WindingWindowShape::Rectangular {
        let width = window.width.unwrap_or(0.0);
        let height = window.height.unwrap_or(0.0);
        (
            window.coordinates[0] - width / 2.0,
            window.coordinates[0] + width / 2.0,
            window.coordinates[1] - height / 2.0,
            window.coordinates[1] + height / 2.0,
        )
    } else {
        let radius = window.radial_height.unwrap_or(0.0);
        (-radius, radius, -radius, radius)
    };
    let dx = (x1 - x0) / crate::convert::f64_from_usize(number_points_x);
    let dy = (y1 - y0) / crate::convert::f64_from_usize(number_points_y);

    let inside_factor = settings.coil_mesher_inside_turns_factor;
    let mut points = Vec::new();
    for j in 0..number_points_y {
        let y = (crate::convert::f64_from_usize(j) + 0.5).mul_add(dy, y0);
        for i in 0..number_points_x {
            let x = (crate::convert::f64_from_usize(i) + 0.5).mul_add(dx, x0);
            if !ignore_turns {
                if settings.leakage_inductance_grid_auto_scaling && is_far_from_turns(turns, x, y) {
                    continue;
                }
                if !include_inside_turns && is_inside_turns(turns, x, y, inside_factor) {
                    continue;
                }
            }
            points.push(FieldPoint::at(x, y));
        }
    }

    Ok((
        Field {
            frequency,
            data: points,
        },
        dx * dy,
    ))
}

fn is_inside_turns(turns: &[Turn], x: f64, y: f64, factor: f64) -> bool {
    turns.iter().any(|turn| {
        let dx = (turn.coordinates[0] - x).abs() * factor;
        let dy = (turn.coordinates[1] - y).abs() * factor;
        match turn.cross_sectional_shape {
            crate::coil::TurnCrossSection::Round => dx.hypot(dy) < turn.dimensions[0] / 2.0,
            crate::coil::TurnCrossSection::Rectangular => {
                dx < turn.dimensions[0] / 2.0 && dy < turn.dimensions[1] / 2.0
            }
        }
    })
}

fn is_far_from_turns(turns: &[Turn], x: f64, y: f64) -> bool {
    turns.iter().all(|turn| {
        let dx = (turn.coordinates[0] - x).abs();
        let dy = (turn.coordinates[1] - y).abs();
        dx.hypot(dy) >= turn.dimensions[0].max(turn.dimensions[1]) * 2.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::coil::{Coil, IsolationSide, Winding};
    use crate::signal::{OperatingConditions, OperatingPointExcitation, SignalDescriptor};
    use crate::wire::{RoundWire, WireCoating};

    fn magnetic_and_operating_point() -> (Magnetic, OperatingPoint) {
        let shape = catalogue::find_core_shape_by_name("ETD 34").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let core = Core::new(shape, material, vec![], 1).unwrap();
        let winding = Winding {
            name: "primary".to_owned(),
            isolation_side: IsolationSide::Primary,
            number_turns: 8,
            number_parallels: 2,
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
                voltage: None,
                current: Some(SignalDescriptor::triangular(2.0, 0.0, 100e3).unwrap()),
                magnetizing_current: None,
                magnetic_flux_density: None,
            }],
        };
        (magnetic, operating_point)
    }

    #[test]
    fn harmonics_come_out_ascending() {
        let (magnetic, operating_point) = magnetic_and_operating_point();
        let fields =
            generate_mesh_inducing_coil(&magnetic, &operating_point, 0.05, &[1], None).unwrap();
        assert!(!fields.is_empty());
        assert!(fields.windows(2).all(|w| w[0].frequency < w[1].frequency));
    }

    #[test]
    fn mirrors_multiply_the_inducing_points() {
        let (magnetic, operating_point) = magnetic_and_operating_point();
        let fields =
            generate_mesh_inducing_coil(&magnetic, &operating_point, 0.05, &[1], None).unwrap();
        let turns = magnetic.coil.turns().unwrap().len();
        // mirroring dimension 1 puts a 3x3 image grid behind every turn
        assert_eq!(fields[0].data.len(), turns * 9);
    }

    #[test]
    fn induced_and_inducing_harmonics_match() {
        let (magnetic, operating_point) = magnetic_and_operating_point();
        let inducing =
            generate_mesh_inducing_coil(&magnetic, &operating_point, 0.05, &[1], None).unwrap();
        let induced = generate_mesh_induced_coil(&magnetic, &operating_point, 0.05).unwrap();
        assert_eq!(inducing.len(), induced.len());
        for (a, b) in inducing.iter().zip(induced.iter()) {
            assert!((a.frequency - b.frequency).abs() < 1e-9);
        }
    }
}
