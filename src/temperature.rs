//! Core temperature rise from total losses, through empirical thermal
//! resistance relations.

use crate::core::Core;
use crate::error::{Error, Result};
use crate::outputs::TemperatureOutput;
use enum_dispatch::enum_dispatch;

/// Interface every core-temperature model implements.
#[enum_dispatch]
pub trait CoreTemperature {
    /// Peak core temperature from the total losses and ambient, in °C.
    ///
    /// # Errors
    ///
    /// Propagates unprocessed-core failures.
    fn core_temperature(&self, core: &Core, core_losses: f64, ambient_temperature: f64) -> Result<TemperatureOutput>;

    /// Name of the model, for result records.
    fn name(&self) -> &'static str;
}

fn envelope(core: &Core) -> Result<(f64, f64)> {
    let processed = core.processed()?;
    let (w, h, d) = (processed.width, processed.height, processed.depth);
    let box_volume = w * h * d;
    let box_surface = 2.0 * (d * h + h * w + w * d);
    Ok((box_volume, box_surface))
}

fn output(model: &'static str, box_volume: f64, temperature_rise: f64, ambient: f64) -> TemperatureOutput {
    TemperatureOutput {
        initial_temperature: ambient,
        maximum_temperature: ambient + temperature_rise,
        bulk_thermal_resistance: temperature_rise / box_volume,
        method_used: model.to_owned(),
        ..TemperatureOutput::default()
    }
}

/// Maniktala: thermal resistance from the effective volume in cm³.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManiktalaModel;

impl CoreTemperature for ManiktalaModel {
    fn core_temperature(&self, core: &Core, core_losses: f64, ambient_temperature: f64) -> Result<TemperatureOutput> {
        let (box_volume, _) = envelope(core)?;
        let effective_volume = core.processed()?.effective_parameters.effective_volume;
        let thermal_resistance = 53.0 * (effective_volume * 1e6).powf(-0.54);
        Ok(output("maniktala", box_volume, core_losses * thermal_resistance, ambient_temperature))
    }

    fn name(&self) -> &'static str {
        "maniktala"
    }
}

/// Kazimierczuk: temperature rise from the surface loss density.
#[derive(Clone, Copy, Debug, Default)]
pub struct KazimierczukModel;

impl CoreTemperature for KazimierczukModel {
    fn core_temperature(&self, core: &Core, core_losses: f64, ambient_temperature: f64) -> Result<TemperatureOutput> {
        let (box_volume, box_surface) = envelope(core)?;
        let temperature_rise = (0.1 * core_losses / box_surface).powf(0.826);
        Ok(output("kazimierczuk", box_volume, temperature_rise, ambient_temperature))
    }

    fn name(&self) -> &'static str {
        "kazimierczuk"
    }
}

/// TDK: thermal resistance as the inverse square root of the effective
/// volume in cm³.
#[derive(Clone, Copy, Debug, Default)]
pub struct TdkModel;

impl CoreTemperature for TdkModel {
    fn core_temperature(&self, core: &Core, core_losses: f64, ambient_temperature: f64) -> Result<TemperatureOutput> {
        let (box_volume, _) = envelope(core)?;
        let effective_volume = core.processed()?.effective_parameters.effective_volume;
        let thermal_resistance = 1.0 / (effective_volume * 1e6).sqrt();
        Ok(output("tdk", box_volume, core_losses * thermal_resistance, ambient_temperature))
    }

    fn name(&self) -> &'static str {
        "tdk"
    }
}

/// Dixon: thermal resistance from the area product in cm⁴.
#[derive(Clone, Copy, Debug, Default)]
pub struct DixonModel;

impl CoreTemperature for DixonModel {
    fn core_temperature(&self, core: &Core, core_losses: f64, ambient_temperature: f64) -> Result<TemperatureOutput> {
        let processed = core.processed()?;
        let (box_volume, _) = envelope(core)?;
        let column_area = processed.columns[0].area;
        let window_area = processed.winding_windows[0].area;
        let area_product = column_area * window_area * 1e8;
        let thermal_resistance = 23.0 * area_product.powf(-0.37);
        Ok(output("dixon", box_volume, core_losses * thermal_resistance, ambient_temperature))
    }

    fn name(&self) -> &'static str {
        "dixon"
    }
}

/// Amidon: temperature rise from the surface loss density in mW/cm².
#[derive(Clone, Copy, Debug, Default)]
pub struct AmidonModel;

impl CoreTemperature for AmidonModel {
    fn core_temperature(&self, core: &Core, core_losses: f64, ambient_temperature: f64) -> Result<TemperatureOutput> {
        let (box_volume, box_surface) = envelope(core)?;
        let temperature_rise = (core_losses * 1e3 / (box_surface * 1e4)).powf(0.833);
        Ok(output("amidon", box_volume, temperature_rise, ambient_temperature))
    }

    fn name(&self) -> &'static str {
        "amidon"
    }
}

/// All core-temperature models, closed.
#[enum_dispatch(CoreTemperature)]
#[derive(Clone, Copy, Debug)]
pub enum CoreTemperatureModel {
    /// See [`ManiktalaModel`].
    ManiktalaModel,
    /// See [`KazimierczukModel`].
    KazimierczukModel,
    /// See [`TdkModel`].
    TdkModel,
    /// See [`DixonModel`].
    DixonModel,
    /// See [`AmidonModel`].
    AmidonModel,
}

impl CoreTemperatureModel {
    /// Builds a model from its key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelNotAvailable`] on an unknown key.
    pub fn from_key(key: &str) -> Result<Self> {
        match key.to_ascii_lowercase().as_str() {
            "maniktala" => Ok(ManiktalaModel.into()),
            "kazimierczuk" => Ok(KazimierczukModel.into()),
            "tdk" => Ok(TdkModel.into()),
            "dixon" => Ok(DixonModel.into()),
            "amidon" => Ok(AmidonModel.into()),
            _ => Err(Error::ModelNotAvailable(format!(
                "unknown core temperature model {key}, options are kazimierczuk, maniktala, tdk, dixon, amidon"
            ))),
        }
    }

    /// The model selected by the settings registry.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::from_key`] failures.
    pub fn from_settings() -> Result<Self> {
        Self::from_key(&crate::settings::Settings::snapshot().core_temperature_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::core::Core;

    fn etd49() -> Core {
        Core::new(
            catalogue::find_core_shape_by_name("ETD 49").unwrap(),
            catalogue::find_core_material_by_name("3C97").unwrap(),
            vec![],
            1,
        )
        .unwrap()
    }

    #[test]
    fn every_model_heats_the_core_above_ambient() {
        let core = etd49();
        for key in ["maniktala", "kazimierczuk", "tdk", "dixon", "amidon"] {
            let model = CoreTemperatureModel::from_key(key).unwrap();
            let result = model.core_temperature(&core, 1.44, 25.0).unwrap();
            assert!(result.maximum_temperature > 25.0, "{key}");
            assert_eq!(result.initial_temperature, 25.0);
        }
    }

    #[test]
    fn more_losses_mean_more_heat() {
        let core = etd49();
        let model = CoreTemperatureModel::from_key("maniktala").unwrap();
        let one_watt = model.core_temperature(&core, 1.0, 25.0).unwrap();
        let three_watts = model.core_temperature(&core, 3.0, 25.0).unwrap();
        assert!(three_watts.maximum_temperature > one_watt.maximum_temperature);
    }
}
