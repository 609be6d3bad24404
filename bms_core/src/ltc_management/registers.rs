use super::pec15::pec15_bytes;
use crate::config::{NUM_SEGMENTS, VOV, VUV};
use crate::types::CellLocation;

/// Write Configuration Register Group A
pub const WRCFGA: u16 = 0x0001;

/// Write Configuration Register Group B
pub const WRCFGB: u16 = 0x0024;

/// Read Cell Voltage Register Groups A-F (cells 1-3, 4-6, ..., 16-18)
pub const RDCVA: u16 = 0x0004;
pub const RDCVB: u16 = 0x0006;
pub const RDCVC: u16 = 0x0008;
pub const RDCVD: u16 = 0x000A;
pub const RDCVE: u16 = 0x0009;
pub const RDCVF: u16 = 0x000B;

pub const RDCV: [u16; 6] = [RDCVA, RDCVB, RDCVC, RDCVD, RDCVE, RDCVF];

/// Read Status Register Group A (SC, ITMP, VA)
pub const RDSTATA: u16 = 0x0010;

/// Cell conversion, 3 kHz mode (MD = 10 with ADCOPT set), discharge off, all cells.
pub const ADCV: u16 = 0x0360;

/// Status conversion of the internal die temperature only, same ADC mode as ADCV.
pub const ADSTAT_ITMP: u16 = 0x056A;

/// Poll ADC conversion status.
pub const PLADC: u16 = 0x0714;

/// Status byte clocked back by PLADC while any chip is still converting.
pub const ADC_CONV_INCOMPLETE: u8 = 0xFF;

/// Discharge control command codes, kept as the existing accumulator firmware
/// sends them around the configuration writes.
pub const ENABLE_DISCHARGE: u16 = 0x0028;
pub const DISABLE_DISCHARGE: u16 = 0x0029;

pub const REG_GROUP_DATA_SIZE: usize = 6;
pub const REG_GROUP_SIZE: usize = REG_GROUP_DATA_SIZE + 2;
pub const CMD_SIZE: usize = 4;

/// One register group as it travels on the wire: 6 data bytes then PEC15 (big endian).
pub type RegisterGroup = [u8; REG_GROUP_SIZE];

/// Both configuration register groups for every segment, indexed by
/// `[ConfigRegister as usize][segment]`.
pub type ConfigurationRegisters = [[RegisterGroup; NUM_SEGMENTS]; NUM_CONFIG_REGISTERS];

// CFGRA0: GPIO1-5 pull-downs off | REFON | DTEN | ADCOPT
const ENABLE_ALL_CFGRA_GPIO: u8 = 0x1F << 3;
const REFON: u8 = 0 << 2;
const DTEN: u8 = 0 << 1;
const ADCOPT: u8 = 1;

// CFGRB0: GPIO6-9 pull-downs off
const ENABLE_ALL_CFGRB_GPIO: u8 = 0x0F;

pub const DEFAULT_CFGRA: [u8; REG_GROUP_DATA_SIZE] = [
    ENABLE_ALL_CFGRA_GPIO | REFON | DTEN | ADCOPT,
    VUV as u8,
    (((VOV & 0xF) << 4) as u8).wrapping_add((VUV >> 8) as u8),
    (VOV >> 4) as u8,
    0x00,
    0x00,
];

pub const DEFAULT_CFGRB: [u8; REG_GROUP_DATA_SIZE] = [ENABLE_ALL_CFGRB_GPIO, 0x00, 0x00, 0x00, 0x00, 0x00];

const ALL_DCC_BITS: u16 = 0xFFFF;

pub const NUM_CONFIG_REGISTERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigRegister {
    A = 0,
    B = 1,
}

impl ConfigRegister {
    pub const ALL: [ConfigRegister; NUM_CONFIG_REGISTERS] = [ConfigRegister::A, ConfigRegister::B];

    pub fn write_command(self) -> u16 {
        match self {
            ConfigRegister::A => WRCFGA,
            ConfigRegister::B => WRCFGB,
        }
    }

    pub fn defaults(self) -> [u8; REG_GROUP_DATA_SIZE] {
        match self {
            ConfigRegister::A => DEFAULT_CFGRA,
            ConfigRegister::B => DEFAULT_CFGRB,
        }
    }

    /// ORs the DCC bits this group carries into `data`.
    /// CFGRA4 holds DCC1-8, the low nibble of CFGRA5 DCC9-12, the high nibble of
    /// CFGRB0 DCC13-16.
    fn apply_dcc_bits(self, data: &mut [u8; REG_GROUP_DATA_SIZE], dcc_bits: u16) {
        match self {
            ConfigRegister::A => {
                data[4] |= (dcc_bits & 0xFF) as u8;
                data[5] |= ((dcc_bits >> 8) as u8) & 0x0F;
            }
            ConfigRegister::B => {
                data[0] |= ((dcc_bits >> 8) as u8) & 0xF0;
            }
        }
    }
}

/// Every cell discharges except the lowest one. Without a known minimum nothing
/// is marked for discharge.
fn dcc_bits_for_segment(segment: usize, min_cell: Option<CellLocation>) -> u16 {
    match min_cell {
        Some(min) if min.segment as usize == segment => {
            !1u16.checked_shl(min.index as u32).unwrap_or(0)
        }
        Some(_) => ALL_DCC_BITS,
        None => 0,
    }
}

/// Builds the configuration register bytes for one register group of every
/// segment, PEC included. The result is indexed by segment.
pub fn prepare_config_register_bytes(
    register: ConfigRegister,
    min_cell: Option<CellLocation>,
) -> [RegisterGroup; NUM_SEGMENTS] {
    let mut groups = [[0u8; REG_GROUP_SIZE]; NUM_SEGMENTS];

    for (segment, group) in groups.iter_mut().enumerate() {
        let mut data = register.defaults();
        register.apply_dcc_bits(&mut data, dcc_bits_for_segment(segment, min_cell));

        group[..REG_GROUP_DATA_SIZE].copy_from_slice(&data);
        group[REG_GROUP_DATA_SIZE..].copy_from_slice(&pec15_bytes(&data));
    }

    groups
}

/// Balancing plan for both configuration register groups.
pub fn prepare_balancing_registers(min_cell: Option<CellLocation>) -> ConfigurationRegisters {
    ConfigRegister::ALL.map(|register| prepare_config_register_bytes(register, min_cell))
}

/// Command word followed by its PEC, both big endian.
pub fn prepare_command(cmd: u16) -> [u8; CMD_SIZE] {
    let cmd = cmd.to_be_bytes();
    let pec = pec15_bytes(&cmd);
    [cmd[0], cmd[1], pec[0], pec[1]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NUM_CELLS_PER_SEGMENT;
    use crate::ltc_management::pec15::pec15;

    fn dcc_bits(registers: &ConfigurationRegisters, segment: usize) -> u16 {
        let a = &registers[ConfigRegister::A as usize][segment];
        let b = &registers[ConfigRegister::B as usize][segment];
        (a[4] as u16) | (((a[5] & 0x0F) as u16) << 8) | (((b[0] & 0xF0) as u16) << 8)
    }

    #[test]
    fn default_bytes_match_chip_settings() {
        assert_eq!(DEFAULT_CFGRA, [0xF9, 0xE1, 0xA4, 0x8C, 0x00, 0x00]);
        assert_eq!(DEFAULT_CFGRB, [0x0F, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn commands_carry_pec() {
        assert_eq!(prepare_command(WRCFGA), [0x00, 0x01, 0x3D, 0x6E]);
        assert_eq!(prepare_command(PLADC), [0x07, 0x14, 0xF3, 0x6C]);
    }

    #[test]
    fn only_the_lowest_cell_is_left_charging() {
        for segment in 0..NUM_SEGMENTS {
            for index in 0..NUM_CELLS_PER_SEGMENT {
                let min = CellLocation::new(segment as u8, index as u8);
                let registers = prepare_balancing_registers(Some(min));

                for s in 0..NUM_SEGMENTS {
                    let bits = dcc_bits(&registers, s);
                    if s == segment {
                        assert_eq!(bits, !(1u16 << index), "segment {s} index {index}");
                    } else {
                        assert_eq!(bits, 0xFFFF, "segment {s}");
                    }
                }
            }
        }
    }

    #[test]
    fn dcc_bits_land_in_the_documented_bytes() {
        let registers = prepare_balancing_registers(Some(CellLocation::new(0, 13)));
        let a = registers[ConfigRegister::A as usize][0];
        let b = registers[ConfigRegister::B as usize][0];

        assert_eq!(a[4], 0xFF);
        assert_eq!(a[5], 0x0F);
        assert_eq!(b[0], 0xDF);
        // non DCC bytes keep their defaults
        assert_eq!(a[..4], DEFAULT_CFGRA[..4]);
        assert_eq!(b[1..6], DEFAULT_CFGRB[1..6]);
    }

    #[test]
    fn every_group_carries_a_fresh_pec() {
        let registers = prepare_balancing_registers(Some(CellLocation::new(3, 7)));
        for groups in registers.iter() {
            for group in groups.iter() {
                let pec = pec15(&group[..6]).to_be_bytes();
                assert_eq!(group[6..], pec);
            }
        }
        assert_eq!(
            registers[ConfigRegister::A as usize][0],
            [0xF9, 0xE1, 0xA4, 0x8C, 0xFF, 0x0F, 0xD7, 0xD0]
        );
    }

    #[test]
    fn unknown_minimum_leaves_discharge_off() {
        let registers = prepare_balancing_registers(None);
        for segment in 0..NUM_SEGMENTS {
            assert_eq!(dcc_bits(&registers, segment), 0);
        }
        assert_eq!(
            registers[ConfigRegister::A as usize][2],
            [0xF9, 0xE1, 0xA4, 0x8C, 0x00, 0x00, 0x39, 0x16]
        );
    }

    #[test]
    fn preparing_twice_is_byte_identical() {
        let min = Some(CellLocation::new(5, 15));
        assert_eq!(prepare_balancing_registers(min), prepare_balancing_registers(min));
    }
}
