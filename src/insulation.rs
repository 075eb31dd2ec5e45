//! Insulation coordination per IEC 60664-1/-4/-5 and IEC 62368-1: solid
//! insulation voltage, clearance and creepage distance.
//!
//! Distances are in meters, voltages in volts. Tabulated rows follow the
//! published standard tables; row selection is inclusive on the voltage
//! bound, so a requirement sitting exactly on a row reproduces that row's
//! value.

use crate::error::{Error, Result};
use crate::inputs::{
    Cti, Inputs, InsulationRequirements, InsulationStandard, InsulationType, OvervoltageCategory, PollutionDegree,
    WiringTechnology,
};
use crate::interpolation;

/// Worst-case insulation distances and voltages across the requested
/// standards.
#[derive(Clone, Copy, Debug, Default)]
pub struct InsulationCoordinator;

impl InsulationCoordinator {
    /// Voltage the solid insulation must withstand, in V: the worst of the
    /// transient, temporary, recurring-peak and steady-state requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] without insulation requirements and
    /// [`Error::ModelNotAvailable`] for standards this engine does not
    /// implement.
    pub fn solid_insulation_voltage(&self, inputs: &Inputs) -> Result<f64> {
        let requirements = requirements(inputs)?;
        let mut worst: f64 = 0.0;
        for standard in &requirements.standards {
            let value = match standard {
                InsulationStandard::Iec606641 => iec60664::solid_insulation_voltage(inputs, requirements)?,
                InsulationStandard::Iec623681 => iec62368::solid_insulation_voltage(inputs, requirements)?,
                InsulationStandard::Iec603351 | InsulationStandard::Iec615581 => {
                    return Err(Error::ModelNotAvailable(format!("{standard:?} is not implemented")));
                }
            };
            worst = worst.max(value);
        }
        Ok(worst)
    }

    /// Required clearance, in m.
    ///
    /// # Errors
    ///
    /// As [`Self::solid_insulation_voltage`].
    pub fn clearance(&self, inputs: &Inputs) -> Result<f64> {
        let requirements = requirements(inputs)?;
        let mut worst: f64 = 0.0;
        for standard in &requirements.standards {
            let value = match standard {
                InsulationStandard::Iec606641 => iec60664::clearance(inputs, requirements)?,
                InsulationStandard::Iec623681 => iec62368::clearance(inputs, requirements)?,
                InsulationStandard::Iec603351 | InsulationStandard::Iec615581 => {
                    return Err(Error::ModelNotAvailable(format!("{standard:?} is not implemented")));
                }
            };
            worst = worst.max(value);
        }
        Ok(worst)
    }

    /// Required creepage distance, in m. `include_clearance` enforces
    /// creepage ≥ clearance where the standard demands it.
    ///
    /// # Errors
    ///
    /// As [`Self::solid_insulation_voltage`].
    pub fn creepage_distance(&self, inputs: &Inputs, include_clearance: bool) -> Result<f64> {
        let requirements = requirements(inputs)?;
        let mut worst: f64 = 0.0;
        for standard in &requirements.standards {
            let value = match standard {
                InsulationStandard::Iec606641 => iec60664::creepage_distance(inputs, requirements, include_clearance)?,
                InsulationStandard::Iec623681 => iec62368::creepage_distance(inputs, requirements, include_clearance)?,
                InsulationStandard::Iec603351 | InsulationStandard::Iec615581 => {
                    return Err(Error::ModelNotAvailable(format!("{standard:?} is not implemented")));
                }
            };
            worst = worst.max(value);
        }
        Ok(worst)
    }
}

fn requirements(inputs: &Inputs) -> Result<&InsulationRequirements> {
    inputs
        .design_requirements
        .insulation
        .as_ref()
        .ok_or_else(|| Error::InvalidInput("inputs carry no insulation requirements".to_owned()))
}

fn lookup_row(table: &[(f64, f64)], voltage: f64, context: &str) -> Result<f64> {
    table
        .iter()
        .find(|(bound, _)| voltage <= *bound)
        .map(|(_, value)| *value)
        .ok_or_else(|| Error::InvalidInput(format!("{voltage} V is beyond the {context} table")))
}

mod iec60664 {
    use super::{Cti, Error, InsulationRequirements, Inputs, OvervoltageCategory, PollutionDegree, Result, WiringTechnology, interpolation, lookup_row};

    /// Part 1 is specified up to this frequency; part 4 takes over above.
    pub const PART1_MAXIMUM_FREQUENCY: f64 = 30e3;

    // Table F.1: rated impulse withstand voltage (V) per overvoltage
    // category, rows keyed by phase-to-neutral voltage.
    const TABLE_F1_VOLTAGES: [f64; 6] = [50.0, 100.0, 150.0, 300.0, 600.0, 1000.0];
    const TABLE_F1: [(OvervoltageCategory, [f64; 6]); 4] = [
        (OvervoltageCategory::Ovc1, [330.0, 500.0, 800.0, 1500.0, 2500.0, 4000.0]),
        (OvervoltageCategory::Ovc2, [500.0, 800.0, 1500.0, 2500.0, 4000.0, 6000.0]),
        (OvervoltageCategory::Ovc3, [800.0, 1500.0, 2500.0, 4000.0, 6000.0, 8000.0]),
        (OvervoltageCategory::Ovc4, [1500.0, 2500.0, 4000.0, 6000.0, 8000.0, 12000.0]),
    ];

    // Table F.2, case A (inhomogeneous field): clearance (m) against the
    // rated impulse withstand voltage, per pollution degree.
    const TABLE_F2: [(f64, [f64; 3]); 9] = [
        (330.0, [0.01e-3, 0.2e-3, 0.8e-3]),
        (500.0, [0.04e-3, 0.2e-3, 0.8e-3]),
        (800.0, [0.1e-3, 0.2e-3, 0.8e-3]),
        (1500.0, [0.5e-3, 0.5e-3, 0.8e-3]),
        (2500.0, [1.5e-3, 1.5e-3, 1.5e-3]),
        (4000.0, [3.0e-3, 3.0e-3, 3.0e-3]),
        (6000.0, [5.5e-3, 5.5e-3, 5.5e-3]),
        (8000.0, [8.0e-3, 8.0e-3, 8.0e-3]),
        (12000.0, [14.0e-3, 14.0e-3, 14.0e-3]),
    ];

    // Table F.8, case A: clearance (m) to withstand steady-state peak
    // voltages.
    const TABLE_F8: [(f64, f64); 22] = [
        (40.0, 0.001e-3),
        (60.0, 0.002e-3),
        (100.0, 0.003e-3),
        (150.0, 0.005e-3),
        (200.0, 0.006e-3),
        (250.0, 0.008e-3),
        (330.0, 0.01e-3),
        (400.0, 0.02e-3),
        (500.0, 0.04e-3),
        (600.0, 0.06e-3),
        (800.0, 0.13e-3),
        (1000.0, 0.26e-3),
        (1200.0, 0.42e-3),
        (1500.0, 0.76e-3),
        (2000.0, 1.27e-3),
        (2500.0, 1.8e-3),
        (3000.0, 2.4e-3),
        (4000.0, 3.8e-3),
        (5000.0, 5.7e-3),
        (6000.0, 7.9e-3),
        (8000.0, 11.0e-3),
        (10000.0, 15.2e-3),
    ];

    // Table F.3: rated insulation voltage from the nominal mains voltage.
    const TABLE_F3: [(f64, f64); 9] = [
        (50.0, 50.0),
        (100.0, 100.0),
        (150.0, 150.0),
        (200.0, 200.0),
        (250.0, 250.0),
        (300.0, 300.0),
        (400.0, 400.0),
        (600.0, 600.0),
        (1000.0, 1000.0),
    ];

    // Table F.5: creepage distance (m) for wound components, keyed by RMS
    // voltage, pollution degree and material group.
    const TABLE_F5_VOLTAGES: [f64; 21] = [
        10.0, 12.5, 16.0, 20.0, 25.0, 32.0, 40.0, 50.0, 63.0, 80.0, 100.0, 125.0, 160.0, 200.0, 250.0, 320.0,
        400.0, 500.0, 630.0, 800.0, 1000.0,
    ];
    const TABLE_F5_P1: [f64; 21] = [
        0.025e-3, 0.025e-3, 0.025e-3, 0.025e-3, 0.025e-3, 0.025e-3, 0.025e-3, 0.025e-3, 0.04e-3, 0.063e-3,
        0.1e-3, 0.16e-3, 0.25e-3, 0.4e-3, 0.56e-3, 0.75e-3, 1.0e-3, 1.3e-3, 1.8e-3, 2.4e-3, 3.2e-3,
    ];
    const TABLE_F5_P2: [[f64; 21]; 3] = [
        [
            0.4e-3, 0.42e-3, 0.45e-3, 0.48e-3, 0.5e-3, 0.53e-3, 0.56e-3, 0.6e-3, 0.63e-3, 0.67e-3, 0.71e-3,
            0.75e-3, 0.8e-3, 1.0e-3, 1.25e-3, 1.6e-3, 2.0e-3, 2.5e-3, 3.2e-3, 4.0e-3, 5.0e-3,
        ],
        [
            0.4e-3, 0.42e-3, 0.45e-3, 0.48e-3, 0.5e-3, 0.53e-3, 0.8e-3, 0.85e-3, 0.9e-3, 0.95e-3, 1.0e-3,
            1.05e-3, 1.1e-3, 1.4e-3, 1.8e-3, 2.2e-3, 2.8e-3, 3.6e-3, 4.5e-3, 5.6e-3, 7.1e-3,
        ],
        [
            0.4e-3, 0.42e-3, 0.45e-3, 0.48e-3, 0.5e-3, 0.53e-3, 1.1e-3, 1.2e-3, 1.25e-3, 1.3e-3, 1.4e-3,
            1.5e-3, 1.6e-3, 2.0e-3, 2.5e-3, 3.2e-3, 4.0e-3, 5.0e-3, 6.3e-3, 8.0e-3, 10.0e-3,
        ],
    ];
    const TABLE_F5_P3: [[f64; 21]; 3] = [
        [
            1.0e-3, 1.05e-3, 1.1e-3, 1.2e-3, 1.25e-3, 1.3e-3, 1.4e-3, 1.5e-3, 1.6e-3, 1.7e-3, 1.8e-3, 1.9e-3,
            2.0e-3, 2.5e-3, 3.2e-3, 4.0e-3, 5.0e-3, 6.3e-3, 8.0e-3, 10.0e-3, 12.5e-3,
        ],
        [
            1.0e-3, 1.05e-3, 1.1e-3, 1.2e-3, 1.25e-3, 1.3e-3, 1.6e-3, 1.7e-3, 1.8e-3, 1.9e-3, 2.0e-3, 2.1e-3,
            2.2e-3, 2.8e-3, 3.6e-3, 4.5e-3, 5.6e-3, 7.1e-3, 9.0e-3, 11.0e-3, 14.0e-3,
        ],
        [
            1.0e-3, 1.05e-3, 1.1e-3, 1.2e-3, 1.25e-3, 1.3e-3, 2.0e-3, 2.1e-3, 2.2e-3, 2.4e-3, 2.5e-3, 2.6e-3,
            2.8e-3, 3.6e-3, 4.5e-3, 5.6e-3, 7.1e-3, 9.0e-3, 11.2e-3, 14.0e-3, 18.0e-3,
        ],
    ];

    // Table A.2: clearance multiplier above 2000 m of altitude.
    const TABLE_A2: [(f64, f64); 11] = [
        (2000.0, 1.0),
        (3000.0, 1.14),
        (4000.0, 1.29),
        (5000.0, 1.48),
        (6000.0, 1.7),
        (7000.0, 1.95),
        (8000.0, 2.25),
        (9000.0, 2.62),
        (10000.0, 3.02),
        (15000.0, 6.67),
        (20000.0, 14.5),
    ];

    // Part 4 table 1: clearance (m) against the peak voltage when the
    // field is inhomogeneous above 30 kHz.
    const PART4_TABLE1: [(f64, f64); 11] = [
        (600.0, 0.065e-3),
        (800.0, 0.18e-3),
        (1000.0, 0.5e-3),
        (1200.0, 1.0e-3),
        (1500.0, 1.6e-3),
        (2000.0, 2.5e-3),
        (2500.0, 3.5e-3),
        (3000.0, 4.5e-3),
        (4000.0, 6.5e-3),
        (5000.0, 9.0e-3),
        (6000.0, 12.0e-3),
    ];

    // Part 4 table 2: creepage (m) against RMS voltage per frequency band.
    const PART4_TABLE2: [(f64, [(f64, f64); 7]); 5] = [
        (100e3, [(63.0, 0.15e-3), (125.0, 0.25e-3), (250.0, 0.56e-3), (400.0, 1.0e-3), (500.0, 1.3e-3), (800.0, 2.4e-3), (1000.0, 3.2e-3)]),
        (200e3, [(63.0, 0.2e-3), (125.0, 0.32e-3), (250.0, 0.75e-3), (400.0, 1.3e-3), (500.0, 1.7e-3), (800.0, 3.0e-3), (1000.0, 4.0e-3)]),
        (400e3, [(63.0, 0.25e-3), (125.0, 0.4e-3), (250.0, 1.0e-3), (400.0, 1.8e-3), (500.0, 2.2e-3), (800.0, 4.0e-3), (1000.0, 5.0e-3)]),
        (700e3, [(63.0, 0.32e-3), (125.0, 0.5e-3), (250.0, 1.3e-3), (400.0, 2.2e-3), (500.0, 2.8e-3), (800.0, 5.0e-3), (1000.0, 6.3e-3)]),
        (1e6, [(63.0, 0.4e-3), (125.0, 0.63e-3), (250.0, 1.6e-3), (400.0, 2.8e-3), (500.0, 3.5e-3), (800.0, 6.3e-3), (1000.0, 8.0e-3)]),
    ];

    // Part 5 tables 2 and 3: clearance (m) for printed boards, at and
    // above 2000 m. The tables stop early; part 1 takes over beyond them.
    const PART5_TABLE2: [(f64, f64); 6] = [
        (330.0, 0.01e-3),
        (500.0, 0.04e-3),
        (800.0, 0.1e-3),
        (1500.0, 0.5e-3),
        (2500.0, 1.5e-3),
        (4000.0, 3.0e-3),
    ];
    const PART5_TABLE3: [(f64, f64); 6] = [
        (330.0, 0.0125e-3),
        (500.0, 0.05e-3),
        (800.0, 0.125e-3),
        (1500.0, 0.625e-3),
        (2500.0, 1.875e-3),
        (4000.0, 3.75e-3),
    ];

    // Part 5 table 4: creepage (m) for printed boards.
    const PART5_TABLE4_VOLTAGES: [f64; 6] = [50.0, 100.0, 200.0, 400.0, 630.0, 1000.0];
    const PART5_TABLE4_P1: [f64; 6] = [0.025e-3, 0.08e-3, 0.2e-3, 0.56e-3, 1.0e-3, 2.0e-3];
    const PART5_TABLE4_P2: [[f64; 6]; 3] = [
        [0.11e-3, 0.16e-3, 0.56e-3, 1.6e-3, 2.5e-3, 4.0e-3],
        [0.15e-3, 0.22e-3, 0.78e-3, 2.2e-3, 3.5e-3, 5.6e-3],
        [0.2e-3, 0.29e-3, 1.0e-3, 2.9e-3, 4.5e-3, 7.2e-3],
    ];

    fn group_index(cti: Cti) -> usize {
        match cti {
            Cti::GroupI => 0,
            Cti::GroupII => 1,
            Cti::GroupIiia | Cti::GroupIiib => 2,
        }
    }

    pub fn rated_impulse_withstand_voltage(category: OvervoltageCategory, rated_voltage: f64) -> Result<f64> {
        let column = TABLE_F1
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| v)
            .unwrap_or_else(|| unreachable!());
        TABLE_F1_VOLTAGES
            .iter()
            .position(|&bound| rated_voltage <= bound)
            .map(|i| column[i])
            .ok_or_else(|| Error::InvalidInput(format!("{rated_voltage} V is beyond IEC 60664-1 F.1")))
    }

    fn clearance_table_f2(
        pollution_degree: PollutionDegree,
        reinforced: bool,
        impulse_voltage: f64,
    ) -> Result<f64> {
        let column = match pollution_degree {
            PollutionDegree::P1 => 0,
            PollutionDegree::P2 => 1,
            PollutionDegree::P3 => 2,
        };
        let row = TABLE_F2
            .iter()
            .position(|(bound, _)| impulse_voltage <= *bound)
            .ok_or_else(|| Error::InvalidInput(format!("{impulse_voltage} V is beyond IEC 60664-1 F.2")))?;
        if reinforced {
            // reinforced insulation takes the next impulse step; past the
            // table it scales the last row
            return Ok(TABLE_F2
                .get(row + 1)
                .map_or(TABLE_F2[row].1[column] * 1.6, |(_, values)| values[column]));
        }
        Ok(TABLE_F2[row].1[column])
    }

    fn creepage_table_f5(pollution_degree: PollutionDegree, cti: Cti, voltage_rms: f64) -> Result<f64> {
        let row = TABLE_F5_VOLTAGES
            .iter()
            .position(|&bound| voltage_rms <= bound)
            .ok_or_else(|| Error::InvalidInput(format!("{voltage_rms} V is beyond IEC 60664-1 F.5")))?;
        Ok(match pollution_degree {
            PollutionDegree::P1 => TABLE_F5_P1[row],
            PollutionDegree::P2 => TABLE_F5_P2[group_index(cti)][row],
            PollutionDegree::P3 => TABLE_F5_P3[group_index(cti)][row],
        })
    }

    fn clearance_over_30khz(peak_voltage: f64, frequency: f64, current_clearance: f64) -> Result<f64> {
        let curvature = crate::skin::skin_depth_of_material("copper", frequency, 20.0)?;
        let homogeneous = curvature >= current_clearance * 0.2;
        if homogeneous {
            let critical_mhz = 0.2e-3 / current_clearance;
            let frequency_mhz = frequency / 1e6;
            if frequency_mhz < critical_mhz {
                Ok(current_clearance)
            } else if frequency_mhz > 3.0 {
                Ok(current_clearance * 1.25)
            } else {
                Ok(current_clearance * (1.0 + (frequency_mhz - critical_mhz) / (3.0 - critical_mhz) * 0.25))
            }
        } else {
            interpolation::interpolate_table(&PART4_TABLE1, peak_voltage)
        }
    }

    fn creepage_over_30khz(voltage_rms: f64, frequency: f64) -> Result<f64> {
        let mut previous = PART1_MAXIMUM_FREQUENCY;
        for (band, table) in PART4_TABLE2 {
            if frequency >= previous && frequency <= band {
                return interpolation::interpolate_table(&table, voltage_rms);
            }
            previous = band;
        }
        Err(Error::InvalidInput(format!("{frequency} Hz is beyond IEC 60664-4")))
    }

    pub fn solid_insulation_voltage(inputs: &Inputs, requirements: &InsulationRequirements) -> Result<f64> {
        let voltage_rms = inputs.maximum_voltage_rms();
        let reinforced = requirements.insulation_type.is_reinforced();

        let transient = rated_impulse_withstand_voltage(requirements.overvoltage_category, voltage_rms)?;
        let mut temporary = voltage_rms + 1200.0;
        if reinforced {
            temporary *= 2.0;
        }
        // recurring-peak factors of section 6.4.6.1
        let (f1, f3, f4) = (1.2, 1.25, 1.1);
        let mut recurring = f1 * f4 * 2.0_f64.sqrt() * voltage_rms;
        if reinforced {
            recurring *= f3;
        }
        let steady_state = inputs.maximum_voltage_peak();
        Ok(transient.max(temporary).max(recurring).max(steady_state))
    }

    pub fn clearance(inputs: &Inputs, requirements: &InsulationRequirements) -> Result<f64> {
        let printed = inputs.design_requirements.wiring_technology == WiringTechnology::Printed;
        let voltage_rms = inputs.maximum_voltage_rms();
        let frequency = inputs.maximum_frequency();
        let altitude = requirements.altitude.resolve_maximum();
        let reinforced = requirements.insulation_type.is_reinforced();
        let impulse = rated_impulse_withstand_voltage(requirements.overvoltage_category, voltage_rms)?;
        let mut steady_peak = inputs.maximum_voltage_peak();
        if reinforced {
            steady_peak *= 1.6;
        }

        let planar_table: &[(f64, f64)] = if altitude <= 2000.0 { &PART5_TABLE2 } else { &PART5_TABLE3 };
        let transient_clearance = if printed && impulse <= planar_table[planar_table.len() - 1].0 {
            interpolation::interpolate_table(planar_table, impulse)?
        } else {
            clearance_table_f2(requirements.pollution_degree, reinforced, impulse)?
        };

        let steady_clearance = if printed && steady_peak <= planar_table[planar_table.len() - 1].0 {
            interpolation::interpolate_table(planar_table, steady_peak)?
        } else {
            let mut value = lookup_row(&TABLE_F8, steady_peak, "IEC 60664-1 F.8")?;
            if frequency > PART1_MAXIMUM_FREQUENCY {
                value = clearance_over_30khz(steady_peak, frequency, value)?;
            }
            value
        };

        let mut clearance = transient_clearance.max(steady_clearance);
        if altitude > 2000.0 {
            clearance *= interpolation::interpolate_table(&TABLE_A2, altitude)?;
        }
        Ok(clearance)
    }

    pub fn creepage_distance(
        inputs: &Inputs,
        requirements: &InsulationRequirements,
        include_clearance: bool,
    ) -> Result<f64> {
        let printed = inputs.design_requirements.wiring_technology == WiringTechnology::Printed;
        let frequency = inputs.maximum_frequency();
        let rated_insulation_voltage =
            lookup_row(&TABLE_F3, requirements.main_supply_voltage.resolve(), "IEC 60664-1 F.3")?;
        let voltage_rms = inputs.maximum_voltage_rms().max(rated_insulation_voltage);

        let mut creepage = if printed
            && voltage_rms <= PART5_TABLE4_VOLTAGES[PART5_TABLE4_VOLTAGES.len() - 1]
        {
            let row = PART5_TABLE4_VOLTAGES
                .iter()
                .position(|&bound| voltage_rms <= bound)
                .unwrap_or_else(|| unreachable!());
            match requirements.pollution_degree {
                PollutionDegree::P1 => PART5_TABLE4_P1[row],
                PollutionDegree::P2 | PollutionDegree::P3 => PART5_TABLE4_P2[group_index(requirements.cti)][row],
            }
        } else {
            let mut value = creepage_table_f5(requirements.pollution_degree, requirements.cti, voltage_rms)?;
            if frequency > PART1_MAXIMUM_FREQUENCY {
                let hf = creepage_over_30khz(voltage_rms, frequency)?
                    * match requirements.pollution_degree {
                        PollutionDegree::P1 => 1.0,
                        PollutionDegree::P2 => 1.2,
                        PollutionDegree::P3 => 1.4,
                    };
                value = value.max(hf);
            }
            value
        };

        if requirements.insulation_type.is_reinforced() {
            creepage *= 2.0;
        }

        // P1/P2 may keep a creepage under the clearance when the transient
        // clearance is already the smaller of the two
        let mut allow_smaller_than_clearance = false;
        if matches!(requirements.pollution_degree, PollutionDegree::P1 | PollutionDegree::P2) {
            let impulse =
                rated_impulse_withstand_voltage(requirements.overvoltage_category, inputs.maximum_voltage_rms())?;
            let transient_clearance = clearance_table_f2(
                requirements.pollution_degree,
                requirements.insulation_type.is_reinforced(),
                impulse,
            )?;
            if transient_clearance < creepage {
                allow_smaller_than_clearance = true;
            }
        }
        if include_clearance && !allow_smaller_than_clearance {
            creepage = creepage.max(clearance(inputs, requirements)?);
        }
        Ok(creepage)
    }
}

mod iec62368 {
    use super::{Cti, Error, InsulationRequirements, Inputs, OvervoltageCategory, PollutionDegree, Result, WiringTechnology, interpolation, lookup_row};

    // Table 12: mains transient voltage (V) per overvoltage category.
    const TABLE_12_VOLTAGES: [f64; 4] = [100.0, 150.0, 300.0, 600.0];
    const TABLE_12: [(OvervoltageCategory, [f64; 4]); 4] = [
        (OvervoltageCategory::Ovc1, [330.0, 500.0, 800.0, 1500.0]),
        (OvervoltageCategory::Ovc2, [500.0, 800.0, 1500.0, 2500.0]),
        (OvervoltageCategory::Ovc3, [800.0, 1500.0, 2500.0, 4000.0]),
        (OvervoltageCategory::Ovc4, [1500.0, 2500.0, 4000.0, 6000.0]),
    ];

    // Table 10: clearance (m) against the procedure-1 voltage, pollution
    // degree 2, basic insulation.
    const TABLE_10: [(f64, f64); 12] = [
        (330.0, 0.1e-3),
        (400.0, 0.2e-3),
        (500.0, 0.25e-3),
        (600.0, 0.32e-3),
        (800.0, 0.6e-3),
        (1000.0, 1.0e-3),
        (1200.0, 1.4e-3),
        (1500.0, 1.9e-3),
        (2000.0, 2.5e-3),
        (2500.0, 3.2e-3),
        (4000.0, 5.5e-3),
        (6000.0, 8.0e-3),
    ];

    // Table 11: clearance (m) above 30 kHz, pollution degree 2, basic.
    const TABLE_11: [(f64, f64); 6] = [
        (330.0, 0.02e-3),
        (500.0, 0.04e-3),
        (800.0, 0.1e-3),
        (1500.0, 0.5e-3),
        (2500.0, 1.5e-3),
        (4000.0, 3.0e-3),
    ];

    // Table 16: altitude multiplier.
    const TABLE_16: [(f64, f64); 5] = [(0.0, 1.0), (2000.0, 1.0), (3000.0, 1.14), (4000.0, 1.29), (5000.0, 1.48)];

    // Table 17: creepage (m) against the working RMS voltage, pollution
    // degree 2, per material group; basic insulation.
    const TABLE_17_VOLTAGES: [f64; 10] =
        [50.0, 100.0, 125.0, 250.0, 400.0, 500.0, 800.0, 1000.0, 1500.0, 2000.0];
    const TABLE_17_P2: [[f64; 10]; 3] = [
        [0.6e-3, 0.71e-3, 0.75e-3, 1.25e-3, 2.0e-3, 2.5e-3, 4.0e-3, 5.0e-3, 7.5e-3, 10.0e-3],
        [0.85e-3, 1.0e-3, 1.05e-3, 1.8e-3, 2.8e-3, 3.6e-3, 5.6e-3, 7.1e-3, 10.6e-3, 14.0e-3],
        [1.2e-3, 1.4e-3, 1.5e-3, 2.5e-3, 4.0e-3, 5.0e-3, 8.0e-3, 10.0e-3, 15.0e-3, 20.0e-3],
    ];

    // Table 18: creepage (m) above 30 kHz per frequency band, pollution
    // degree 1.
    const TABLE_18: [(f64, [(f64, f64); 5]); 4] = [
        (100e3, [(63.0, 0.13e-3), (125.0, 0.21e-3), (250.0, 0.47e-3), (500.0, 1.1e-3), (1000.0, 2.7e-3)]),
        (200e3, [(63.0, 0.17e-3), (125.0, 0.27e-3), (250.0, 0.63e-3), (500.0, 1.4e-3), (1000.0, 3.3e-3)]),
        (400e3, [(63.0, 0.21e-3), (125.0, 0.33e-3), (250.0, 0.83e-3), (500.0, 1.8e-3), (1000.0, 4.2e-3)]),
        (700e3, [(63.0, 0.27e-3), (125.0, 0.42e-3), (250.0, 1.1e-3), (500.0, 2.3e-3), (1000.0, 5.3e-3)]),
    ];

    // Table 22: insulation reduction factor per frequency band for thin
    // foil materials.
    const TABLE_22: [(f64, f64); 5] = [(100e3, 0.8), (200e3, 0.7), (400e3, 0.6), (700e3, 0.5), (1e6, 0.4)];

    // Tables 25/26/27: solid insulation withstand voltages (V), basic
    // insulation; reinforced takes the doubled requirement.
    const TABLE_25: [(f64, f64); 6] =
        [(210.0, 1500.0), (420.0, 2500.0), (840.0, 4000.0), (1400.0, 6000.0), (2800.0, 8000.0), (7000.0, 12000.0)];
    const TABLE_26: [(f64, f64); 6] =
        [(71.0, 500.0), (210.0, 1500.0), (420.0, 2500.0), (840.0, 4000.0), (1400.0, 6000.0), (2800.0, 8000.0)];
    const TABLE_27: [(f64, f64); 4] = [(250.0, 2000.0), (600.0, 2500.0), (1000.0, 3000.0), (2000.0, 4000.0)];

    // Table G.13: distances through printed boards (m), basic insulation.
    const TABLE_G13: [(f64, f64); 6] = [
        (71.0, 0.2e-3),
        (220.0, 0.3e-3),
        (390.0, 0.6e-3),
        (600.0, 1.0e-3),
        (1000.0, 1.7e-3),
        (2000.0, 3.0e-3),
    ];

    fn group_index(cti: Cti) -> usize {
        match cti {
            Cti::GroupI => 0,
            Cti::GroupII => 1,
            Cti::GroupIiia | Cti::GroupIiib => 2,
        }
    }

    fn pollution_factor(pollution_degree: PollutionDegree) -> f64 {
        match pollution_degree {
            PollutionDegree::P1 => 0.8,
            PollutionDegree::P2 => 1.0,
            PollutionDegree::P3 => 1.4,
        }
    }

    fn reinforced_factor(requirements: &InsulationRequirements) -> f64 {
        if requirements.insulation_type.is_reinforced() { 2.0 } else { 1.0 }
    }

    fn mains_transient_voltage(category: OvervoltageCategory, supply_voltage: f64) -> Result<f64> {
        let column = TABLE_12
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| v)
            .unwrap_or_else(|| unreachable!());
        TABLE_12_VOLTAGES
            .iter()
            .position(|&bound| supply_voltage <= bound)
            .map(|i| column[i])
            .ok_or_else(|| Error::InvalidInput(format!("{supply_voltage} V is beyond IEC 62368-1 table 12")))
    }

    fn reduction_factor(frequency: f64) -> Result<f64> {
        let mut previous = 30e3;
        for (band, factor) in TABLE_22 {
            if frequency >= previous && frequency <= band {
                return Ok(factor);
            }
            previous = band;
        }
        Err(Error::InvalidInput(format!("{frequency} Hz is beyond IEC 62368-1 table 22")))
    }

    pub fn solid_insulation_voltage(inputs: &Inputs, requirements: &InsulationRequirements) -> Result<f64> {
        let frequency = inputs.maximum_frequency();
        let working_voltage = inputs.maximum_voltage_peak();
        let reinforced = requirements.insulation_type.is_reinforced();
        let mut supply_voltage = requirements.main_supply_voltage.resolve();
        if frequency > 30e3 {
            let factor = reduction_factor(frequency)?;
            supply_voltage = if reinforced { 1.2 * 2.0 * supply_voltage / factor } else { 1.2 * supply_voltage / factor };
        }

        let scale = if reinforced { 2.0 } else { 1.0 };
        let transient = lookup_row(&TABLE_25, working_voltage, "IEC 62368-1 table 25")? * scale;
        let recurring = lookup_row(&TABLE_26, working_voltage, "IEC 62368-1 table 26")? * scale;
        let temporary = lookup_row(&TABLE_27, supply_voltage, "IEC 62368-1 table 27")? * scale;
        Ok(transient.max(recurring).max(temporary))
    }

    pub fn clearance(inputs: &Inputs, requirements: &InsulationRequirements) -> Result<f64> {
        let printed = inputs.design_requirements.wiring_technology == WiringTechnology::Printed;
        let frequency = inputs.maximum_frequency();
        let peak_voltage = inputs.maximum_voltage_peak();
        let supply_voltage = requirements.main_supply_voltage.resolve();
        let reinforced = reinforced_factor(requirements);

        if printed {
            return Ok(interpolation::interpolate_table(&TABLE_G13, peak_voltage)? * reinforced);
        }

        let temporary = (supply_voltage + 1200.0).max(if supply_voltage <= 250.0 { 2000.0 } else { 2500.0 });
        let procedure1_voltage = peak_voltage.max(temporary);
        let procedure1 = if frequency <= 30e3 {
            interpolation::interpolate_table(&TABLE_10, procedure1_voltage)?
        } else {
            interpolation::interpolate_table(&TABLE_11, peak_voltage)?
        } * pollution_factor(requirements.pollution_degree);

        let transient = mains_transient_voltage(requirements.overvoltage_category, supply_voltage)?;
        let procedure2 = interpolation::interpolate_table(&TABLE_10, peak_voltage.max(transient))?
            * 1.1
            * pollution_factor(requirements.pollution_degree);

        let altitude_factor =
            interpolation::interpolate_table(&TABLE_16, requirements.altitude.resolve_maximum())?;
        Ok(procedure1.max(procedure2) * reinforced * altitude_factor)
    }

    pub fn creepage_distance(
        inputs: &Inputs,
        requirements: &InsulationRequirements,
        include_clearance: bool,
    ) -> Result<f64> {
        let printed = inputs.design_requirements.wiring_technology == WiringTechnology::Printed;
        let frequency = inputs.maximum_frequency();
        let working_voltage_rms = inputs.maximum_voltage_rms();
        let reinforced = reinforced_factor(requirements);

        if printed {
            return Ok(interpolation::interpolate_table(&TABLE_G13, inputs.maximum_voltage_peak())? * reinforced);
        }

        let row = TABLE_17_VOLTAGES
            .iter()
            .position(|&bound| working_voltage_rms <= bound)
            .ok_or_else(|| {
                Error::InvalidInput(format!("{working_voltage_rms} V is beyond IEC 62368-1 table 17"))
            })?;
        let mut creepage = TABLE_17_P2[group_index(requirements.cti)][row]
            * match requirements.pollution_degree {
                PollutionDegree::P1 => 0.8,
                PollutionDegree::P2 => 1.0,
                PollutionDegree::P3 => 1.4,
            };

        if frequency > 30e3 {
            let mut previous = 30e3;
            for (band, table) in TABLE_18 {
                if frequency >= previous && frequency <= band {
                    let hf = interpolation::interpolate_table(&table, working_voltage_rms)?
                        * match requirements.pollution_degree {
                            PollutionDegree::P1 => 1.0,
                            PollutionDegree::P2 => 1.2,
                            PollutionDegree::P3 => 1.4,
                        };
                    creepage = creepage.max(hf);
                    break;
                }
                previous = band;
            }
        }

        creepage *= reinforced;
        if include_clearance {
            creepage = creepage.max(clearance(inputs, requirements)?);
        }
        Ok(creepage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::{DesignRequirements, DimensionWithTolerance};
    use crate::signal::{OperatingConditions, OperatingPoint, OperatingPointExcitation, SignalDescriptor};
    use float_cmp::assert_approx_eq;

    fn inputs(
        insulation_type: InsulationType,
        voltage_rms: f64,
        frequency: f64,
        altitude: f64,
        pollution_degree: PollutionDegree,
    ) -> Inputs {
        let voltage = SignalDescriptor::sinusoidal(voltage_rms * 2.0_f64.sqrt(), 0.0, frequency).unwrap();
        Inputs {
            design_requirements: DesignRequirements {
                insulation: Some(InsulationRequirements {
                    standards: vec![InsulationStandard::Iec606641],
                    insulation_type,
                    pollution_degree,
                    cti: Cti::GroupII,
                    overvoltage_category: OvervoltageCategory::Ovc3,
                    altitude: DimensionWithTolerance::nominal(altitude),
                    main_supply_voltage: DimensionWithTolerance::nominal(voltage_rms),
                }),
                ..DesignRequirements::default()
            },
            operating_points: vec![OperatingPoint {
                conditions: OperatingConditions::default(),
                excitations_per_winding: vec![OperatingPointExcitation {
                    frequency,
                    voltage: Some(voltage),
                    current: None,
                    magnetizing_current: None,
                    magnetic_flux_density: None,
                }],
            }],
        }
    }

    #[test]
    fn mains_230v_basic_case() {
        // IEC 60664-1, basic, OVC III, P2, CTI group II, 230 Vrms, 2000 m
        let inputs = inputs(InsulationType::Basic, 230.0, 50.0, 2000.0, PollutionDegree::P2);
        let coordinator = InsulationCoordinator;
        assert!(coordinator.clearance(&inputs).unwrap() >= 1.4e-3);
        assert!(coordinator.creepage_distance(&inputs, true).unwrap() >= 1.8e-3);
        // without the clearance floor, the F.5 row is reproduced exactly
        assert_approx_eq!(
            f64,
            coordinator.creepage_distance(&inputs, false).unwrap(),
            1.8e-3,
            epsilon = 1e-12
        );
    }

    #[test]
    fn reinforced_doubles_the_creepage() {
        let basic = inputs(InsulationType::Basic, 230.0, 50.0, 2000.0, PollutionDegree::P2);
        let reinforced = inputs(InsulationType::Reinforced, 230.0, 50.0, 2000.0, PollutionDegree::P2);
        let coordinator = InsulationCoordinator;
        let basic_creepage = coordinator.creepage_distance(&basic, false).unwrap();
        let reinforced_creepage = coordinator.creepage_distance(&reinforced, false).unwrap();
        assert!(reinforced_creepage >= 2.0 * basic_creepage);
    }

    #[test]
    fn clearance_grows_with_voltage_altitude_and_pollution() {
        let coordinator = InsulationCoordinator;
        let low = coordinator
            .clearance(&inputs(InsulationType::Basic, 115.0, 50.0, 2000.0, PollutionDegree::P2))
            .unwrap();
        let high = coordinator
            .clearance(&inputs(InsulationType::Basic, 400.0, 50.0, 2000.0, PollutionDegree::P2))
            .unwrap();
        assert!(high >= low);

        let sea_level = coordinator
            .clearance(&inputs(InsulationType::Basic, 230.0, 50.0, 1000.0, PollutionDegree::P2))
            .unwrap();
        let mountain = coordinator
            .clearance(&inputs(InsulationType::Basic, 230.0, 50.0, 5000.0, PollutionDegree::P2))
            .unwrap();
        assert!(mountain > sea_level);

        let p1 = coordinator
            .clearance(&inputs(InsulationType::Basic, 48.0, 50.0, 2000.0, PollutionDegree::P1))
            .unwrap();
        let p3 = coordinator
            .clearance(&inputs(InsulationType::Basic, 48.0, 50.0, 2000.0, PollutionDegree::P3))
            .unwrap();
        assert!(p3 >= p1);
    }

    #[test]
    fn unimplemented_standards_are_reported() {
        let mut unsupported = inputs(InsulationType::Basic, 230.0, 50.0, 2000.0, PollutionDegree::P2);
        unsupported
            .design_requirements
            .insulation
            .as_mut()
            .unwrap()
            .standards = vec![InsulationStandard::Iec603351];
        assert!(matches!(
            InsulationCoordinator.clearance(&unsupported),
            Err(Error::ModelNotAvailable(_))
        ));
    }
}
