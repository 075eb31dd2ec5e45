//! Leakage inductance by energy integration of the winding-window field.

use crate::constants::VACUUM_PERMEABILITY;
use crate::error::{Error, Result};
use crate::field::{self, FieldStrengthModel, FringingModel};
use crate::magnetic::Magnetic;
use crate::mesher;
use crate::outputs::LeakageInductanceOutput;
use crate::settings::Settings;
use crate::signal::OperatingPoint;
use crate::wire::Wire;

/// Leakage inductance of every non-primary winding referred to the
/// primary: the primary drives +1, the measured winding −1, the rest are
/// left open, and the energy of the resulting field over the winding
/// window divides twice by the peak primary current.
///
/// # Errors
///
/// Propagates field-map and signal failures.
pub fn leakage_inductance(magnetic: &Magnetic, operating_point: &OperatingPoint) -> Result<LeakageInductanceOutput> {
    let settings = Settings::snapshot();
    let windings = magnetic.coil.functional_description.len();
    if windings < 2 {
        return Ok(LeakageInductanceOutput {
            leakage_inductance_per_winding: Vec::new(),
            method_used: "energy".to_owned(),
            ..LeakageInductanceOutput::default()
        });
    }

    let is_planar = magnetic
        .coil
        .functional_description
        .first()
        .is_some_and(|w| matches!(w.wire, Wire::Planar(_)));
    let precision = if is_planar {
        settings.leakage_inductance_grid_precision_level_planar
    } else {
        settings.leakage_inductance_grid_precision_level_wound
    };
    let number_points_x = settings.magnetic_field_number_points_x * precision;
    let number_points_y = settings.magnetic_field_number_points_y * precision;

    let frequency = operating_point.primary_excitation()?.frequency;
    let peak_current = operating_point.primary_excitation()?.current()?.processed()?.peak;
    if peak_current <= 0.0 {
        return Err(Error::InvalidInput("leakage needs a non-zero primary current".to_owned()));
    }
    let (grid, cell_area) = mesher::generate_mesh_induced_grid(
        magnetic,
        frequency,
        number_points_x,
        number_points_y,
        false,
        false,
    )?;

    let turns = magnetic.coil.turns()?;
    let mean_turn_length =
        turns.iter().map(|t| t.length).sum::<f64>() / crate::convert::f64_from_usize(turns.len().max(1));

    let mut leakage_per_winding = Vec::with_capacity(windings - 1);
    for secondary in 1..windings {
        let mut directions = vec![0_i8; windings];
        directions[0] = 1;
        directions[secondary] = -1;

        let field_output = field::magnetic_field_strength_field(
            operating_point,
            magnetic,
            FieldStrengthModel::from_key("binns_lawrenson")?,
            FringingModel::Roshen,
            Some(&grid),
            Some(&directions),
            None,
        )?;
        let field = field_output
            .field_per_frequency
            .first()
            .ok_or_else(|| Error::Calculation("leakage field map came back empty".to_owned()))?;

        let mut energy = 0.0;
        for point in &field.data {
            let magnitude_squared = point.real.mul_add(point.real, point.imaginary * point.imaginary);
            energy += VACUUM_PERMEABILITY / 2.0 * magnitude_squared * cell_area * mean_turn_length;
        }
        Error::check_finite(energy, "leakage field energy")?;
        leakage_per_winding.push(2.0 * energy / (peak_current * peak_current));
    }

    Ok(LeakageInductanceOutput {
        leakage_inductance_per_winding: leakage_per_winding,
        method_used: "energy".to_owned(),
        ..LeakageInductanceOutput::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::coil::{Coil, IsolationSide, Winding};
    use crate::core::Core;
    use crate::signal::{OperatingConditions, OperatingPointExcitation, SignalDescriptor};
    use crate::wire::{RoundWire, WireCoating};

    #[test]
    fn two_winding_transformer_has_positive_leakage() {
        let shape = catalogue::find_core_shape_by_name("ETD 34").unwrap();
        let material = catalogue::find_core_material_by_name("3C97").unwrap();
        let core = Core::new(shape, material, vec![], 1).unwrap();
        let wire = Wire::Round(RoundWire {
            conducting_diameter: 0.5e-3,
            material: "copper".to_owned(),
            coating: Some(WireCoating::enamelled(1)),
            ..RoundWire::default()
        });
        let windings = vec![
            Winding {
                name: "primary".to_owned(),
                isolation_side: IsolationSide::Primary,
                number_turns: 12,
                number_parallels: 1,
                wire: wire.clone(),
            },
            Winding {
                name: "secondary".to_owned(),
                isolation_side: IsolationSide::Secondary,
                number_turns: 12,
                number_parallels: 1,
                wire,
            },
        ];
        let mut coil = Coil::new(windings, &core).unwrap();
        coil.wind(&core).unwrap();
        let magnetic = Magnetic::new(core, coil);

        let excitation = |sign: f64| OperatingPointExcitation {
            frequency: 100e3,
            voltage: None,
            current: Some(SignalDescriptor::sinusoidal(sign, 0.0, 100e3).unwrap()),
            magnetizing_current: None,
            magnetic_flux_density: None,
        };
        let operating_point = OperatingPoint {
            conditions: OperatingConditions::default(),
            excitations_per_winding: vec![excitation(1.0), excitation(1.0)],
        };
        let output = leakage_inductance(&magnetic, &operating_point).unwrap();
        assert_eq!(output.leakage_inductance_per_winding.len(), 1);
        let leakage = output.leakage_inductance_per_winding[0];
        assert!(leakage > 0.0);
        // leakage of a small transformer sits far under a millihenry
        assert!(leakage < 1e-3);
    }
}
