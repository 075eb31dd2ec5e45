//! Magnetic-field strength engine: the analytic models that turn inducing
//! field points into the complex H-field at the induced points, and the
//! gap-fringing field added on top.

use crate::constants::VACUUM_PERMEABILITY;
use crate::core::CoreGap;
use crate::error::{Error, Result};
use crate::magnetic::Magnetic;
use crate::mesher::{self, CoilMesherModel, Field, FieldPoint};
use crate::outputs::{ComplexField, ComplexFieldPoint, MagneticFieldOutput};
use crate::reluctance::{self, ReluctanceModel};
use crate::settings::Settings;
use crate::shape::CoreShapeFamily;
use crate::signal::OperatingPoint;
use crate::wire::Wire;
use enum_dispatch::enum_dispatch;
use std::f64::consts::PI;

/// Interface every field-strength model implements: the field one inducing
/// point produces at one induced point.
#[enum_dispatch]
pub trait FieldStrength {
    /// Complex H-field contribution of `inducing` at `induced`; the wire
    /// of the inducing turn refines the shape of the source when known.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NaNResult`] on non-finite intermediates.
    fn field_between(
        &self,
        inducing: &FieldPoint,
        induced: &FieldPoint,
        inducing_wire: Option<&Wire>,
    ) -> Result<ComplexFieldPoint>;

    /// Name of the model, for result records.
    fn name(&self) -> &'static str;
}

fn complex_point(induced: &FieldPoint, hx: f64, hy: f64) -> Result<ComplexFieldPoint> {
    if !hx.is_finite() || !hy.is_finite() {
        return Err(Error::NaNResult("magnetic field component".to_owned()));
    }
    Ok(ComplexFieldPoint {
        point: induced.point,
        real: hx,
        imaginary: hy,
        turn_index: induced.turn_index,
        label: induced.label.map(str::to_owned),
    })
}

/// Binns–Lawrenson: filament field for round conductors, closed-form bar
/// field for rectangular ones. The default analytic model.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinnsLawrensonModel;

impl BinnsLawrensonModel {
    fn filament(inducing: &FieldPoint, induced: &FieldPoint, dead_radius: f64) -> (f64, f64) {
        let dx = inducing.point[0] - induced.point[0];
        let dy = inducing.point[1] - induced.point[1];
        if dx.hypot(dy) < dead_radius {
            return (0.0, 0.0);
        }
        let divisor = 2.0 * PI * dy.mul_add(dy, dx * dx);
        (-inducing.value * dy / divisor, inducing.value * dx / divisor)
    }

    #[allow(clippy::many_single_char_names)]
    fn bar(inducing: &FieldPoint, induced: &FieldPoint, half_width: f64, half_height: f64) -> (f64, f64) {
        let a = half_width;
        let b = half_height;
        let mut x = induced.point[0] - inducing.point[0];
        let mut y = induced.point[1] - inducing.point[1];

        if let Some(rotation) = inducing.rotation {
            // evaluate in the turn frame, rotate the result back afterwards
            let modulus = x.hypot(y);
            let mut angle = y.atan2(x);
            if angle < 0.0 {
                angle += 2.0 * PI;
            }
            let turn_angle = rotation.to_radians();
            x = modulus * (angle - turn_angle).cos();
            y = modulus * (angle - turn_angle).sin();
        }

        if x.abs() < a && y.abs() < b {
            return (0.0, 0.0);
        }

        let r1 = (y + b).hypot(x - a);
        let r2 = (y + b).hypot(x + a);
        let r3 = (y - b).hypot(x + a);
        let r4 = (y - b).hypot(x - a);

        let mut tetha1 = ((y + b) / (x - a)).atan();
        let mut tetha2 = ((y + b) / (x + a)).atan();
        let mut tetha3 = ((y - b) / (x + a)).atan();
        let mut tetha4 = ((y - b) / (x - a)).atan();
        if tetha1.is_nan() || tetha2.is_nan() || tetha3.is_nan() || tetha4.is_nan() {
            return (0.0, 0.0);
        }

        if x == a {
            tetha1 = if y + b > 0.0 { PI / 2.0 } else { -PI / 2.0 };
            tetha4 = if y - b > 0.0 { PI / 2.0 } else { -PI / 2.0 };
        }

        // unwrap the corner angles into one continuous sweep around the bar
        if !(x > a && -b < y && y < b) {
            if x > a && y < -b {
                tetha1 += 2.0 * PI;
            } else if x < a || y < -b {
                tetha1 += PI;
            }
            if x > -a && y < -b {
                tetha2 += 2.0 * PI;
            } else if x < -a || y < -b {
                tetha2 += PI;
            }
            if x > -a && y < b {
                tetha3 += 2.0 * PI;
            } else if x < -a || y < b {
                tetha3 += PI;
            }
            if x > a && y < b {
                tetha4 += 2.0 * PI;
            } else if x < a || y < b {
                tetha4 += PI;
            }
        }

        let common = inducing.value / (8.0 * PI * a * b);
        let hx = common
            * ((y + b) * (tetha1 - tetha2) - (y - b) * (tetha4 - tetha3) + (x + a) * (r2 / r3).ln()
                - (x - a) * (r1 / r4).ln());
        let hy = -common
            * ((x + a) * (tetha2 - tetha3) - (x - a) * (tetha1 - tetha4) + (y + b) * (r2 / r1).ln()
                - (y - b) * (r3 / r4).ln());

        if let Some(rotation) = inducing.rotation {
            let modulus = hx.hypot(hy);
            let mut angle = hy.atan2(hx);
            if angle < 0.0 {
                angle += 2.0 * PI;
            }
            let total = angle + rotation.to_radians();
            return (modulus * total.cos(), modulus * total.sin());
        }
        (hx, hy)
    }
}

impl FieldStrength for BinnsLawrensonModel {
    fn field_between(
        &self,
        inducing: &FieldPoint,
        induced: &FieldPoint,
        inducing_wire: Option<&Wire>,
    ) -> Result<ComplexFieldPoint> {
        let (hx, hy) = match inducing_wire {
            Some(wire @ (Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_))) => Self::bar(
                inducing,
                induced,
                wire.maximum_conducting_width() / 2.0,
                wire.maximum_conducting_height() / 2.0,
            ),
            Some(wire) => Self::filament(inducing, induced, wire.maximum_outer_width() / 2.0),
            None => Self::filament(inducing, induced, 0.0),
        };
        complex_point(induced, hx, hy)
    }

    fn name(&self) -> &'static str {
        "binns_lawrenson"
    }
}

/// Lammeraner: filament field corrected for the finite length of the turn.
#[derive(Clone, Copy, Debug, Default)]
pub struct LammeranerModel;

impl FieldStrength for LammeranerModel {
    fn field_between(
        &self,
        inducing: &FieldPoint,
        induced: &FieldPoint,
        inducing_wire: Option<&Wire>,
    ) -> Result<ComplexFieldPoint> {
        if let Some(wire @ (Wire::Rectangular(_) | Wire::Planar(_) | Wire::Foil(_))) = inducing_wire {
            return BinnsLawrensonModel.field_between(inducing, induced, Some(wire));
        }
        let turn_length = inducing.turn_length.unwrap_or(1.0);
        let distance = (induced.point[1] - inducing.point[1]).hypot(induced.point[0] - inducing.point[0]);
        let dead_radius = inducing_wire.map_or(0.0, |w| w.maximum_outer_width() / 2.0);
        let (hx, hy) = if distance < dead_radius {
            (0.0, 0.0)
        } else {
            let angle = (induced.point[0] - inducing.point[0]).atan2(induced.point[1] - inducing.point[1]);
            let ex = (angle - PI / 2.0).cos();
            let ey = (angle - PI / 2.0).sin();
            let modulus = -inducing.value / (2.0 * PI * distance) * turn_length / turn_length.hypot(distance);
            (modulus * ex, modulus * ey)
        };
        complex_point(induced, hx, hy)
    }

    fn name(&self) -> &'static str {
        "lammeraner"
    }
}

/// Wang: edge-concentration model for rectangular, planar and foil wires
/// whose mesher labeled the induced points.
#[derive(Clone, Copy, Debug, Default)]
pub struct WangModel;

impl FieldStrength for WangModel {
    fn field_between(
        &self,
        inducing: &FieldPoint,
        induced: &FieldPoint,
        inducing_wire: Option<&Wire>,
    ) -> Result<ComplexFieldPoint> {
        let Some(wire) = inducing_wire else {
            return LammeranerModel.field_between(inducing, induced, None);
        };
        let (Some(inducing_label), Some(induced_label)) = (inducing.label, induced.label) else {
            return Err(Error::InvalidInput(
                "the Wang field model needs the Wang mesher's labeled points".to_owned(),
            ));
        };

        let (c, h) = match wire {
            Wire::Foil(_) => (wire.maximum_conducting_width(), wire.maximum_conducting_height()),
            _ => (wire.maximum_conducting_height(), wire.maximum_conducting_width()),
        };
        let lambda = 0.01_f64.mul_add(c / h, 0.66);
        let current = inducing.value;
        let dx = inducing.point[0] - induced.point[0];
        let dy = inducing.point[1] - induced.point[1];
        let distance = dx.hypot(dy);

        let opposite = |label: &str| match label {
            "left" => "right",
            "right" => "left",
            "top" => "bottom",
            _ => "top",
        };

        let mut hx = 0.0;
        let mut hy = 0.0;
        if induced_label == inducing_label {
            let tetha = if distance > 0.0 { (dy.abs() / distance).asin() } else { 0.0 };
            hy = 0.5 * current / (2.0 * PI * lambda * h)
                + 0.5 * current * tetha.cos() / (2.0 * PI * (lambda * h).hypot(dy));
        } else if induced_label == opposite(inducing_label) {
            let tetha = if distance > 0.0 { (dy.abs() / distance).asin() } else { 0.0 };
            hy = -0.5 * current / (2.0 * PI * (c - lambda * h))
                - 0.5 * current * tetha.cos() / (2.0 * PI * (c - lambda * h).hypot(dy));
        } else {
            // orthogonal face: the uniform tangential component closes the
            // Ampère loop on the side the current passes by; which side is
            // shadowed flips between the two edges of each inducing pair
            let shadowed = match (inducing_label, induced_label) {
                ("left", "top") | ("right", "bottom") | ("bottom", "right") | ("top", "left") => dy <= 0.0,
                ("left", "bottom") | ("right", "top") | ("bottom", "left") | ("top", "right") => dy > 0.0,
                _ => false,
            };
            if shadowed {
                hx = 2.0_f64.mul_add(-(hy * h), current) / (2.0 * c);
            }
        }
        complex_point(induced, hx, hy)
    }

    fn name(&self) -> &'static str {
        "wang"
    }
}

/// Albach: the batch 2-D air-coil path. Per inducing/induced pair it
/// reduces to the filament/bar field, with the current redistributed to an
/// effective radius when the skin depth is thinner than the conductor.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlbachModel {
    /// Skin depth at the harmonic being evaluated, in m. Zero disables the
    /// redistribution.
    pub skin_depth: f64,
}

impl FieldStrength for AlbachModel {
    fn field_between(
        &self,
        inducing: &FieldPoint,
        induced: &FieldPoint,
        inducing_wire: Option<&Wire>,
    ) -> Result<ComplexFieldPoint> {
        // at high frequency the current rides the conductor surface, which
        // moves the effective source closer to the evaluation point
        let mut source = inducing.clone();
        if self.skin_depth > 0.0
            && let Some(wire @ (Wire::Round(_) | Wire::Litz(_))) = inducing_wire
        {
            let radius = wire.maximum_conducting_width() / 2.0;
            if self.skin_depth < radius {
                let shift = radius - self.skin_depth;
                let dx = induced.point[0] - inducing.point[0];
                let dy = induced.point[1] - inducing.point[1];
                let distance = dx.hypot(dy);
                if distance > radius {
                    source.point[0] += shift * dx / distance;
                    source.point[1] += shift * dy / distance;
                }
            }
        }
        BinnsLawrensonModel.field_between(&source, induced, inducing_wire)
    }

    fn name(&self) -> &'static str {
        "albach"
    }
}

/// All field-strength models, closed.
#[enum_dispatch(FieldStrength)]
#[derive(Clone, Copy, Debug)]
pub enum FieldStrengthModel {
    /// See [`BinnsLawrensonModel`].
    BinnsLawrensonModel,
    /// See [`LammeranerModel`].
    LammeranerModel,
    /// See [`WangModel`].
    WangModel,
    /// See [`AlbachModel`].
    AlbachModel,
}

impl FieldStrengthModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "binns_lawrenson" => Ok(BinnsLawrensonModel.into()),
            "lammeraner" => Ok(LammeranerModel.into()),
            "wang" => Ok(WangModel.into()),
            "albach" => Ok(AlbachModel::default().into()),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown field strength model {key}, options are binns_lawrenson, lammeraner, wang, albach"
            ))),
        }
    }
}

/// Gap-fringing field models.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FringingModel {
    /// Equivalent current loop at a reduced radius inside the column.
    Albach,
    /// Direct closed-form field of the gap edge.
    Roshen,
    /// Tabulated normalized fringing field.
    Sullivan,
}

impl FringingModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "albach" => Ok(Self::Albach),
            "roshen" => Ok(Self::Roshen),
            "sullivan" => Ok(Self::Sullivan),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown fringing model {key}, options are albach, roshen, sullivan"
            ))),
        }
    }

    /// The equivalent line current standing in for `gap`, for models that
    /// inject sources (Albach).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gap`] on an unplaced gap and [`Error::Calculation`]
    /// when the placement polynomial leaves the column.
    pub fn equivalent_inducing_point(&self, gap: &CoreGap, field_strength_gap: f64) -> Result<FieldPoint> {
        let [section_width, _] = gap
            .section_dimensions
            .ok_or_else(|| Error::Gap("gap has no section dimensions".to_owned()))?;
        let [gap_x, gap_y] = gap
            .coordinates
            .ok_or_else(|| Error::Gap("gap has no coordinates".to_owned()))?;
        let column_radius = section_width / 2.0;
        let xi = gap.length / (2.0 * column_radius);
        let x = 8.8_f64.mul_add(-xi.powi(3), 2.88_f64.mul_add(-xi.powi(2), 1.05_f64.mul_add(-xi, 1.0)));
        if x < 0.0 {
            return Err(Error::Calculation("fringing placement polynomial went negative".to_owned()));
        }
        let current = field_strength_gap * gap.length
            / 7.042_f64.mul_add(-xi.powi(3), 4.34_f64.mul_add(xi.powi(2), 1.569_f64.mul_add(-xi, 0.25)));
        let eta = x * column_radius;
        if eta > column_radius {
            return Err(Error::Calculation("fringing wire placed outside the column".to_owned()));
        }
        let x_position = if gap_x > 0.0 {
            gap_x - eta
        } else if gap_x < 0.0 {
            gap_x + eta
        } else {
            eta
        };
        let mut point = FieldPoint::at(x_position, gap_y);
        point.value = current;
        Ok(point)
    }

    /// The fringing field of `gap` at `induced`, for models that evaluate
    /// directly (Roshen, Sullivan).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gap`] on an unplaced gap.
    pub fn field_between_gap_and_point(
        &self,
        gap: &CoreGap,
        field_strength_gap: f64,
        induced: &FieldPoint,
    ) -> Result<ComplexFieldPoint> {
        let [section_width, _] = gap
            .section_dimensions
            .ok_or_else(|| Error::Gap("gap has no section dimensions".to_owned()))?;
        let [gap_x, gap_y] = gap
            .coordinates
            .ok_or_else(|| Error::Gap("gap has no coordinates".to_owned()))?;
        // distance from the gap edge on the winding-window side
        let edge_x = if gap_x == 0.0 {
            gap_x + section_width / 2.0
        } else {
            gap_x - section_width / 2.0
        };
        let dx = induced.point[0] - edge_x;
        let dy = induced.point[1] - gap_y;
        let half_gap = gap.length / 2.0;

        match self {
            Self::Roshen | Self::Albach => {
                let dividend = dx.mul_add(dx, (dy - half_gap).powi(2));
                let divisor = dx.mul_add(dx, (dy + half_gap).powi(2));
                let hx = -0.9 * field_strength_gap / (2.0 * PI) * (dividend / divisor).ln();
                let inside_bubble = dx.mul_add(dx, dy * dy) <= half_gap * half_gap;
                let m: f64 = if inside_bubble { 1.0 } else { 0.0 };
                let x = dx * half_gap / (dy.mul_add(dy, dx * dx) - half_gap * half_gap);
                let hy = -0.9 * field_strength_gap / PI * m.mul_add(PI, x.atan());
                complex_point(induced, hx, hy)
            }
            Self::Sullivan => {
                // normalized decay of |H| with distance in gap lengths
                const DECAY: [(f64, f64); 6] =
                    [(0.0, 0.9), (0.5, 0.62), (1.0, 0.37), (2.0, 0.16), (4.0, 0.05), (8.0, 0.01)];
                let distance = dx.hypot(dy) / gap.length.max(crate::constants::RESIDUAL_GAP);
                let factor = crate::interpolation::interpolate_table(&DECAY, distance)?.clamp(0.0, 1.0);
                let modulus = field_strength_gap * factor;
                let angle = dy.atan2(dx);
                complex_point(induced, modulus * angle.cos(), modulus * angle.sin())
            }
        }
    }
}

/// Peak H-field across the gap: the peak core flux density over µ₀, with
/// the flux derived from the magnetizing current.
///
/// # Errors
///
/// Propagates signal and reluctance failures.
pub fn magnetic_field_strength_gap(
    operating_point: &OperatingPoint,
    magnetic: &Magnetic,
    frequency: f64,
) -> Result<f64> {
    let model = ReluctanceModel::from_settings()?;
    let turns = crate::convert::f64_from_usize(
        magnetic
            .coil
            .functional_description
            .first()
            .map(|w| w.number_turns)
            .unwrap_or(1),
    );
    let permeability =
        magnetic
            .core
            .initial_permeability(operating_point.conditions.ambient_temperature, None, Some(frequency))?;
    let total_reluctance = reluctance::core_reluctance(&model, &magnetic.core, permeability)?.total_reluctance;

    let mut operating_point = operating_point.clone();
    let seed_inductance = turns * turns / total_reluctance;
    operating_point.process_magnetizing_current(seed_inductance)?;
    let peak_current = operating_point
        .primary_excitation()?
        .magnetizing_current
        .as_ref()
        .ok_or_else(|| Error::InvalidInput("magnetizing current is missing".to_owned()))?
        .processed()?
        .peak;

    let effective_area = magnetic.core.processed()?.effective_parameters.effective_area;
    let peak_flux_density = peak_current * turns / total_reluctance / effective_area;
    Ok(peak_flux_density / VACUUM_PERMEABILITY)
}

/// Computes the complex H-field over the winding window: for every retained
/// harmonic, sums the contribution of every inducing point at every induced
/// point, skipping a turn's own sources, and adds the gap fringing field on
/// the fundamental.
///
/// # Errors
///
/// Propagates mesher, signal and model failures; any non-finite field value
/// raises [`Error::NaNResult`].
pub fn magnetic_field_strength_field(
    operating_point: &OperatingPoint,
    magnetic: &Magnetic,
    model: FieldStrengthModel,
    fringing_model: FringingModel,
    external_induced_field: Option<&Field>,
    custom_current_directions: Option<&[i8]>,
    mesher_model: Option<CoilMesherModel>,
) -> Result<MagneticFieldOutput> {
    let settings = Settings::snapshot();
    let include_fringing = settings.magnetic_field_include_fringing;
    let core = &magnetic.core;
    let processed = core.processed()?;
    let core_width = processed.width;
    let column_width = processed.columns[0].width;
    let is_toroidal = core.shape.family == CoreShapeFamily::T;

    let directions: Vec<i8> = custom_current_directions.map_or_else(
        || {
            let mut directions = vec![-1; magnetic.coil.functional_description.len()];
            if let Some(first) = directions.first_mut() {
                *first = 1;
            }
            directions
        },
        <[i8]>::to_vec,
    );

    let mut inducing_fields = mesher::generate_mesh_inducing_coil(
        magnetic,
        operating_point,
        settings.harmonic_amplitude_threshold,
        &directions,
        mesher_model,
    )?;
    let induced_fields: Vec<Field> = if let Some(external) = external_induced_field {
        inducing_fields.retain(|f| (f.frequency - external.frequency).abs() < 1e-9);
        vec![external.clone()]
    } else {
        mesher::generate_mesh_induced_coil(magnetic, operating_point, settings.harmonic_amplitude_threshold)?
    };
    if inducing_fields.is_empty() {
        return Err(Error::Calculation("no harmonics retained for the field map".to_owned()));
    }

    let fundamental = operating_point.primary_excitation()?.frequency;
    let wires = magnetic.coil.wires();
    let turns = magnetic.coil.turns()?;

    // fringing sources are only added on the fundamental harmonic
    let mut fringing_sources: Vec<FieldPoint> = Vec::new();
    let mut gap_field_strength = 0.0;
    if include_fringing && !is_toroidal && core.is_gapped() {
        gap_field_strength = magnetic_field_strength_gap(operating_point, magnetic, fundamental)?;
        if fringing_model == FringingModel::Albach {
            for gap in &core.gapping {
                if gap.coordinates.is_some_and(|[x, _]| x < 0.0) {
                    continue;
                }
                fringing_sources.push(fringing_model.equivalent_inducing_point(gap, gap_field_strength)?);
            }
        }
    }

    let mut field_per_frequency = Vec::with_capacity(inducing_fields.len());
    for (inducing, induced) in inducing_fields.iter().zip(induced_fields.iter()) {
        if induced.data.is_empty() {
            return Err(Error::Calculation("empty induced field".to_owned()));
        }
        let on_fundamental = (inducing.frequency - fundamental).abs() < 1e-9;
        let mut points = Vec::with_capacity(induced.data.len());

        for induced_point in &induced.data {
            if is_toroidal && is_inside_core(induced_point, column_width, core_width) {
                continue;
            }
            let mut hx = 0.0;
            let mut hy = 0.0;

            if include_fringing && on_fundamental && !is_toroidal && core.is_gapped() {
                match fringing_model {
                    FringingModel::Albach => {
                        for source in &fringing_sources {
                            let contribution =
                                BinnsLawrensonModel.field_between(source, induced_point, None)?;
                            hx += contribution.real;
                            hy += contribution.imaginary;
                        }
                    }
                    FringingModel::Roshen | FringingModel::Sullivan => {
                        for gap in &core.gapping {
                            if gap.coordinates.is_some_and(|[x, _]| x < 0.0) {
                                continue;
                            }
                            let contribution = fringing_model.field_between_gap_and_point(
                                gap,
                                gap_field_strength,
                                induced_point,
                            )?;
                            hx += contribution.real;
                            hy += contribution.imaginary;
                        }
                    }
                }
            }

            for inducing_point in &inducing.data {
                if let (Some(inducing_turn), Some(induced_turn)) = (inducing_point.turn_index, induced_point.turn_index)
                    && inducing_turn == induced_turn
                {
                    continue;
                }
                let wire = inducing_point
                    .turn_index
                    .and_then(|i| turns.get(i))
                    .and_then(|t| magnetic.coil.winding_index_by_name(&t.winding).ok())
                    .and_then(|i| wires.get(i).copied());
                let contribution = model.field_between(inducing_point, induced_point, wire)?;
                hx += contribution.real;
                hy += contribution.imaginary;
            }

            points.push(complex_point(induced_point, hx, hy)?);
        }
        field_per_frequency.push(ComplexField {
            frequency: inducing.frequency,
            data: points,
        });
    }

    Ok(MagneticFieldOutput {
        field_per_frequency,
        method_used: model.name().to_owned(),
        ..MagneticFieldOutput::default()
    })
}

fn is_inside_core(induced: &FieldPoint, column_width: f64, core_width: f64) -> bool {
    let radius = induced.point[0].hypot(induced.point[1]);
    if radius * 1.05 > core_width / 2.0 {
        return false;
    }
    radius * 0.95 >= core_width / 2.0 - column_width
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn filament(x: f64, y: f64, current: f64) -> FieldPoint {
        let mut point = FieldPoint::at(x, y);
        point.value = current;
        point
    }

    #[test]
    fn two_opposite_filaments_at_midpoint() {
        // |H| at the midpoint sitting at distance d from each of two
        // opposite filaments is I/(π·d)
        let current = 2.0;
        let distance = 2e-3;
        let left = filament(-distance, 0.0, current);
        let right = filament(distance, 0.0, -current);
        let midpoint = FieldPoint::at(0.0, 0.0);
        let expected = current / (PI * distance);

        for model in [
            FieldStrengthModel::from_key("binns_lawrenson").unwrap(),
            FieldStrengthModel::from_key("albach").unwrap(),
        ] {
            let a = model.field_between(&left, &midpoint, None).unwrap();
            let b = model.field_between(&right, &midpoint, None).unwrap();
            let magnitude = (a.real + b.real).hypot(a.imaginary + b.imaginary);
            assert_approx_eq!(f64, magnitude, expected, epsilon = expected * 0.01);
        }
    }

    #[test]
    fn lammeraner_converges_to_the_filament_for_long_turns() {
        let mut inducing = filament(0.0, 0.0, 1.0);
        inducing.turn_length = Some(1e3);
        let induced = FieldPoint::at(2e-3, 0.0);
        let result = LammeranerModel.field_between(&inducing, &induced, None).unwrap();
        let magnitude = result.real.hypot(result.imaginary);
        let expected = 1.0 / (2.0 * PI * 2e-3);
        assert_approx_eq!(f64, magnitude, expected, epsilon = expected * 1e-4);
    }

    #[test]
    fn bar_field_matches_the_filament_far_away() {
        // far from the bar its field converges to a filament's
        let inducing = filament(0.0, 0.0, 1.5);
        let induced = FieldPoint::at(50e-3, 30e-3);
        let wire = Wire::Rectangular(crate::wire::RectangularWire {
            conducting_width: 2e-3,
            conducting_height: 1e-3,
            material: "copper".to_owned(),
            ..crate::wire::RectangularWire::default()
        });
        let bar = BinnsLawrensonModel.field_between(&inducing, &induced, Some(&wire)).unwrap();
        let filament = BinnsLawrensonModel.field_between(&inducing, &induced, None).unwrap();
        let bar_magnitude = bar.real.hypot(bar.imaginary);
        let filament_magnitude = filament.real.hypot(filament.imaginary);
        assert_approx_eq!(f64, bar_magnitude, filament_magnitude, epsilon = filament_magnitude * 0.02);
    }

    #[test]
    fn field_inside_the_inducing_bar_is_zero() {
        let inducing = filament(0.0, 0.0, 1.0);
        let induced = FieldPoint::at(0.2e-3, 0.1e-3);
        let wire = Wire::Rectangular(crate::wire::RectangularWire {
            conducting_width: 2e-3,
            conducting_height: 1e-3,
            material: "copper".to_owned(),
            ..crate::wire::RectangularWire::default()
        });
        let result = BinnsLawrensonModel.field_between(&inducing, &induced, Some(&wire)).unwrap();
        assert_approx_eq!(f64, result.real, 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, result.imaginary, 0.0, epsilon = 1e-12);
    }
}
