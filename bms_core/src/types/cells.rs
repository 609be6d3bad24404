use libm::roundf;

use super::CellLocation;
use crate::config::{NUM_CELLS, NUM_CELLS_PER_SEGMENT, NUM_SEGMENTS};
use crate::ltc_management::ltc6813::CellVoltageCodes;

/// LTC6813 cell code resolution.
pub const VOLTS_PER_LSB: f32 = 100e-6;

/// Last known cell voltages of the whole accumulator. Aggregates are recomputed
/// whenever a complete reading is committed.
#[derive(Debug, Copy, Clone)]
pub struct CellVoltages {
    cell_volts: CellVoltageCodes,
    valid: bool,
    tot_volt: u32,
    max_volt: u16,
    min_volt: u16,
    avg_volt: u16,
    min_location: CellLocation,
    max_location: CellLocation,
}

impl Default for CellVoltages {
    fn default() -> Self {
        Self::new()
    }
}

impl CellVoltages {
    pub const fn new() -> Self {
        CellVoltages {
            cell_volts: [[0; NUM_CELLS_PER_SEGMENT]; NUM_SEGMENTS],
            valid: false,
            tot_volt: 0,
            max_volt: 0,
            min_volt: 0,
            avg_volt: 0,
            min_location: CellLocation::new(0, 0),
            max_location: CellLocation::new(0, 0),
        }
    }

    pub fn update(&mut self, codes: &CellVoltageCodes) {
        self.cell_volts = *codes;
        self.valid = true;

        self.tot_volt = 0;
        self.max_volt = 0;
        self.min_volt = u16::MAX;

        // strict comparisons keep the first occurrence in scan order
        for (segment, cells) in self.cell_volts.iter().enumerate() {
            for (index, &volt) in cells.iter().enumerate() {
                self.tot_volt = self.tot_volt.wrapping_add(volt as u32);
                if volt < self.min_volt {
                    self.min_volt = volt;
                    self.min_location = CellLocation::new(segment as u8, index as u8);
                }
                if volt > self.max_volt {
                    self.max_volt = volt;
                    self.max_location = CellLocation::new(segment as u8, index as u8);
                }
            }
        }

        let v_float = (self.tot_volt as f32) / (NUM_CELLS as f32);
        self.avg_volt = roundf(v_float).max(0.0) as u16;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn cell_code(&self, segment: usize, index: usize) -> u16 {
        self.cell_volts[segment][index]
    }

    pub fn pack_voltage(&self) -> f32 {
        (self.tot_volt as f32) * VOLTS_PER_LSB
    }

    pub fn min_cell_location(&self) -> Option<CellLocation> {
        self.valid.then_some(self.min_location)
    }

    pub fn max_cell_location(&self) -> Option<CellLocation> {
        self.valid.then_some(self.max_location)
    }

    pub fn min_voltage(&self) -> f32 {
        if self.valid {
            code_to_volts(self.min_volt)
        } else {
            0.0
        }
    }

    pub fn max_voltage(&self) -> f32 {
        code_to_volts(self.max_volt)
    }

    pub fn avg_voltage(&self) -> f32 {
        code_to_volts(self.avg_volt)
    }
}

fn code_to_volts(code: u16) -> f32 {
    (code as f32) * VOLTS_PER_LSB
}
