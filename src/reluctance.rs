//! Core and gap reluctance models.

use crate::constants::VACUUM_PERMEABILITY;
use crate::core::{Core, CoreGap};
use crate::error::{Error, Result};
use enum_dispatch::enum_dispatch;

/// Reluctance and fringing factor of one gap.
#[derive(Clone, Copy, Debug)]
pub struct GapReluctance {
    /// Gap reluctance, in A/Wb.
    pub reluctance: f64,
    /// Fringing factor relating the ideal gap reluctance to the actual one.
    pub fringing_factor: f64,
}

/// Interface every gap-reluctance model implements.
#[enum_dispatch]
pub trait Reluctance {
    /// Reluctance and fringing factor of `gap`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Gap`] on an unplaced gap.
    fn gap_reluctance(&self, gap: &CoreGap) -> Result<GapReluctance>;

    /// Name of the model, for result records.
    fn name(&self) -> &'static str;
}

fn gap_geometry(gap: &CoreGap) -> Result<(f64, f64, f64, f64)> {
    let [width, depth] = gap
        .section_dimensions
        .ok_or_else(|| Error::Gap("gap has no section dimensions".to_owned()))?;
    let area = gap.area.ok_or_else(|| Error::Gap("gap has no area".to_owned()))?;
    Ok((gap.length, width, depth, area))
}

fn ideal_reluctance(length: f64, area: f64) -> f64 {
    length / (VACUUM_PERMEABILITY * area)
}

/// Zhang's fringing model, the default: annular fringing shell around the
/// gapped column.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZhangModel;

impl Reluctance for ZhangModel {
    fn gap_reluctance(&self, gap: &CoreGap) -> Result<GapReluctance> {
        let (length, width, _, area) = gap_geometry(gap)?;
        let radius = width / 2.0;
        let fringing_factor = if length > 0.0 {
            1.0 + length / (std::f64::consts::PI * radius)
                * (1.0 + (std::f64::consts::PI * radius / length).ln())
        } else {
            1.0
        };
        Ok(GapReluctance {
            reluctance: ideal_reluctance(length, area) / fringing_factor,
            fringing_factor,
        })
    }

    fn name(&self) -> &'static str {
        "zhang"
    }
}

/// Partridge's classic logarithmic correction on the window height.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartridgeModel {
    /// Height of the winding window facing the gap, in m.
    pub window_height: f64,
}

impl Reluctance for PartridgeModel {
    fn gap_reluctance(&self, gap: &CoreGap) -> Result<GapReluctance> {
        let (length, _, _, area) = gap_geometry(gap)?;
        let window_height = if self.window_height > 0.0 { self.window_height } else { 20.0 * length };
        let fringing_factor = if length > 0.0 {
            1.0 + length / area.sqrt() * (2.0 * window_height / length).ln()
        } else {
            1.0
        };
        Ok(GapReluctance {
            reluctance: ideal_reluctance(length, area) / fringing_factor,
            fringing_factor,
        })
    }

    fn name(&self) -> &'static str {
        "partridge"
    }
}

/// Balakrishnan's conformal-mapping gap permeance: the ideal permeance in
/// parallel with the fringing path around the column perimeter.
#[derive(Clone, Copy, Debug, Default)]
pub struct BalakrishnanModel;

impl Reluctance for BalakrishnanModel {
    fn gap_reluctance(&self, gap: &CoreGap) -> Result<GapReluctance> {
        let (length, width, depth, area) = gap_geometry(gap)?;
        if length <= 0.0 {
            return Ok(GapReluctance {
                reluctance: 0.0,
                fringing_factor: 1.0,
            });
        }
        let perimeter = 2.0 * (width + depth);
        let ideal_permeance = VACUUM_PERMEABILITY * area / length;
        let fringing_permeance =
            VACUUM_PERMEABILITY * perimeter / std::f64::consts::PI * (1.0 + 2.0 * width / length).ln() / 2.0;
        let permeance = ideal_permeance + fringing_permeance;
        Ok(GapReluctance {
            reluctance: 1.0 / permeance,
            fringing_factor: permeance / ideal_permeance,
        })
    }

    fn name(&self) -> &'static str {
        "balakrishnan"
    }
}

/// McLyman's handbook correction on the column height.
#[derive(Clone, Copy, Debug, Default)]
pub struct McLymanModel {
    /// Height of the gapped column, in m.
    pub column_height: f64,
}

impl Reluctance for McLymanModel {
    fn gap_reluctance(&self, gap: &CoreGap) -> Result<GapReluctance> {
        let (length, _, _, area) = gap_geometry(gap)?;
        let column_height = if self.column_height > 0.0 { self.column_height } else { 10.0 * length };
        let fringing_factor = if length > 0.0 {
            1.0 + length / area.sqrt() * (2.0 * column_height / length).ln().max(0.0)
        } else {
            1.0
        };
        Ok(GapReluctance {
            reluctance: ideal_reluctance(length, area) / fringing_factor,
            fringing_factor,
        })
    }

    fn name(&self) -> &'static str {
        "mclyman"
    }
}

/// All gap-reluctance models, closed.
#[enum_dispatch(Reluctance)]
#[derive(Clone, Copy, Debug)]
pub enum ReluctanceModel {
    /// See [`ZhangModel`].
    ZhangModel,
    /// See [`PartridgeModel`].
    PartridgeModel,
    /// See [`BalakrishnanModel`].
    BalakrishnanModel,
    /// See [`McLymanModel`].
    McLymanModel,
}

impl ReluctanceModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "zhang" => Ok(ZhangModel.into()),
            "partridge" => Ok(PartridgeModel::default().into()),
            "balakrishnan" => Ok(BalakrishnanModel.into()),
            "mclyman" => Ok(McLymanModel::default().into()),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown reluctance model {key}, options are zhang, partridge, balakrishnan, mclyman"
            ))),
        }
    }

    /// The model selected by the settings registry.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::from_key`] failures.
    pub fn from_settings() -> Result<Self> {
        Self::from_key(&crate::settings::Settings::snapshot().reluctance_model)
    }
}

/// Total reluctance of a core's magnetic circuit.
#[derive(Clone, Debug)]
pub struct CoreReluctanceOutput {
    /// Total reluctance, in A/Wb.
    pub total_reluctance: f64,
    /// Reluctance of the ungapped core path, in A/Wb.
    pub core_path_reluctance: f64,
    /// Per-gap results, in core gapping order.
    pub gaps: Vec<GapReluctance>,
}

/// Computes the reluctance of `core` at permeability `permeability`.
///
/// Residual-only cores follow the ungapped effective-length/area path;
/// explicit gaps add the model's gap reluctance, with gaps on the lateral
/// columns combined in parallel.
///
/// # Errors
///
/// Propagates unprocessed-core and gap failures.
pub fn core_reluctance(model: &ReluctanceModel, core: &Core, permeability: f64) -> Result<CoreReluctanceOutput> {
    let processed = core.processed()?;
    let effective = processed.effective_parameters;
    let core_path_reluctance =
        effective.effective_length / (VACUUM_PERMEABILITY * permeability * effective.effective_area);

    if !core.is_gapped() {
        return Ok(CoreReluctanceOutput {
            total_reluctance: core_path_reluctance,
            core_path_reluctance,
            gaps: Vec::new(),
        });
    }

    let central_x = processed.columns[0].coordinates[0];
    let mut central_gap_reluctance = 0.0;
    let mut lateral_gap_permeance = 0.0;
    let mut gaps = Vec::with_capacity(core.gapping.len());
    for gap in &core.gapping {
        let result = model.gap_reluctance(gap)?;
        let on_central = gap
            .coordinates
            .is_some_and(|[x, _]| (x - central_x).abs() < 1e-9);
        if on_central {
            central_gap_reluctance += result.reluctance;
        } else if result.reluctance > 0.0 {
            lateral_gap_permeance += 1.0 / result.reluctance;
        }
        gaps.push(result);
    }
    let lateral_gap_reluctance = if lateral_gap_permeance > 0.0 { 1.0 / lateral_gap_permeance } else { 0.0 };

    Ok(CoreReluctanceOutput {
        total_reluctance: core_path_reluctance + central_gap_reluctance + lateral_gap_reluctance,
        core_path_reluctance,
        gaps,
    })
}

/// Longest gap whose fringing factor stays at or below `limit` under
/// `model`, for the first gap of `core`. Bisection over the gap length.
///
/// # Errors
///
/// Propagates gap evaluation failures.
pub fn gap_length_for_fringing_factor(model: &ReluctanceModel, core: &Core, limit: f64) -> Result<f64> {
    let Some(template) = core.gapping.first() else {
        return Ok(0.0);
    };
    let mut low = crate::constants::RESIDUAL_GAP;
    let mut high = 0.01;
    for _ in 0..100 {
        let mid = (low + high) / 2.0;
        let mut gap = template.clone();
        gap.length = mid;
        if model.gap_reluctance(&gap)?.fringing_factor > limit {
            high = mid;
        } else {
            low = mid;
        }
        if (high - low) / high < 1e-4 {
            break;
        }
    }
    Ok(low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::core::CoreGap;

    fn gapped_core(length: f64) -> Core {
        let shape = catalogue::find_core_shape_by_name("ETD 49").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        Core::new(shape, material, vec![CoreGap::subtractive(length)], 1).unwrap()
    }

    #[test]
    fn fringing_factors_are_at_least_one() {
        let core = gapped_core(1e-3);
        for key in ["zhang", "partridge", "balakrishnan", "mclyman"] {
            let model = ReluctanceModel::from_key(key).unwrap();
            let output = core_reluctance(&model, &core, 3000.0).unwrap();
            assert!(output.gaps.iter().all(|g| g.fringing_factor >= 1.0), "{key}");
            assert!(output.total_reluctance > output.core_path_reluctance, "{key}");
        }
    }

    #[test]
    fn longer_gaps_raise_the_reluctance() {
        let model = ReluctanceModel::from_key("zhang").unwrap();
        let short = core_reluctance(&model, &gapped_core(0.2e-3), 3000.0).unwrap();
        let long = core_reluctance(&model, &gapped_core(1e-3), 3000.0).unwrap();
        assert!(long.total_reluctance > short.total_reluctance);
    }

    #[test]
    fn unknown_model_keys_are_rejected() {
        assert!(ReluctanceModel::from_key("dowell").is_err());
    }
}
