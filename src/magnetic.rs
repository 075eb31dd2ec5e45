//! The magnetic: one core plus one coil.

use crate::coil::Coil;
use crate::core::Core;
use crate::error::Result;
use crate::inputs::MaximumDimensions;
use serde::{Deserialize, Serialize};

/// Optional provenance metadata of a magnetic.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ManufacturerInfo {
    /// Manufacturer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Manufacturer reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// A complete magnetic component.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Magnetic {
    /// The core.
    pub core: Core,
    /// The coil.
    pub coil: Coil,
    /// Provenance metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_info: Option<ManufacturerInfo>,
    /// Internal reference used by scoring caches.
    #[serde(default)]
    pub reference: String,
}

impl Magnetic {
    /// Composes a magnetic and stamps its cache reference.
    #[must_use]
    pub fn new(core: Core, coil: Coil) -> Self {
        let gap = core
            .gapping
            .iter()
            .map(|g| g.length)
            .fold(0.0, f64::max);
        let reference = format!(
            "{}/{}/{}x/g{:.0}um",
            core.shape.name,
            core.material.name,
            core.number_stacks,
            gap * 1e6
        );
        Self {
            core,
            coil,
            manufacturer_info: None,
            reference,
        }
    }

    /// Turns ratios `N_1 / N_{k+1}` for every non-primary winding.
    #[must_use]
    pub fn turns_ratios(&self) -> Vec<f64> {
        let windings = &self.coil.functional_description;
        let Some(primary) = windings.first() else {
            return Vec::new();
        };
        windings
            .iter()
            .skip(1)
            .map(|w| crate::convert::f64_from_usize(primary.number_turns) / crate::convert::f64_from_usize(w.number_turns))
            .collect()
    }

    /// Envelope `[width, height, depth]` of the magnetic, in m.
    ///
    /// # Errors
    ///
    /// Propagates unprocessed-core failures.
    pub fn maximum_dimensions(&self) -> Result<[f64; 3]> {
        let processed = self.core.processed()?;
        // windings may bulge past the core on both window sides
        let bulge = self
            .coil
            .turns_description
            .as_ref()
            .map_or(0.0, |turns| {
                turns
                    .iter()
                    .map(|t| t.coordinates[0].abs() + t.dimensions[0] / 2.0 - processed.width / 2.0)
                    .fold(0.0, f64::max)
            })
            .max(0.0);
        Ok([
            2.0_f64.mul_add(bulge, processed.width),
            processed.height,
            2.0_f64.mul_add(bulge, processed.depth),
        ])
    }

    /// Whether the magnetic fits inside `bounds`, optionally allowing the
    /// envelope to be rotated.
    ///
    /// # Errors
    ///
    /// Propagates unprocessed-core failures.
    pub fn fits(&self, bounds: &MaximumDimensions, allow_rotation: bool) -> Result<bool> {
        let dimensions = self.maximum_dimensions()?;
        let mut limits = [bounds.width, bounds.height, bounds.depth];
        if allow_rotation {
            let mut sorted = dimensions;
            sorted.sort_by(f64::total_cmp);
            limits.sort_by(f64::total_cmp);
            Ok(sorted.iter().zip(limits.iter()).all(|(d, l)| d <= l))
        } else {
            Ok(dimensions.iter().zip(limits.iter()).all(|(d, l)| d <= l))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue;
    use crate::coil::{IsolationSide, Winding};
    use crate::wire::{RoundWire, Wire, WireCoating};

    #[test]
    fn turns_ratios_follow_the_winding_order() {
        let shape = catalogue::find_core_shape_by_name("ETD 49").unwrap();
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
                number_turns: 24,
                number_parallels: 1,
                wire: wire.clone(),
            },
            Winding {
                name: "secondary".to_owned(),
                isolation_side: IsolationSide::Secondary,
                number_turns: 6,
                number_parallels: 2,
                wire,
            },
        ];
        let coil = Coil::new(windings, &core).unwrap();
        let magnetic = Magnetic::new(core, coil);
        assert_eq!(magnetic.turns_ratios(), vec![4.0]);
    }
}
