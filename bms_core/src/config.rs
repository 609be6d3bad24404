//! Static configuration of the accumulator and the precharge circuit.

/// Cell monitors on the isoSPI daisy chain, one per accumulator segment.
pub const NUM_SEGMENTS: usize = 6;

/// Cells wired to each LTC6813 (the chip has 18 inputs, C17 and C18 are unused).
pub const NUM_CELLS_PER_SEGMENT: usize = 16;

pub const NUM_CELLS: usize = NUM_SEGMENTS * NUM_CELLS_PER_SEGMENT;

/// Undervoltage comparison code written to CFGRA (VUV).
pub const VUV: u16 = 0x4E1;

/// Overvoltage comparison code written to CFGRA (VOV).
pub const VOV: u16 = 0x8CA;

/// PLADC commands sent before giving up on an ADC conversion.
pub const MAX_ADC_POLL_ATTEMPTS: u8 = 10;

/// Upper bound on a single isoSPI transaction.
pub const SPI_TIMEOUT_US: u32 = 400;

pub const TICK_100HZ_PERIOD_US: u32 = 10_000;

// Polling must leave most of a 100 Hz tick for the rest of the state machine.
const _: () = assert!(MAX_ADC_POLL_ATTEMPTS as u32 * SPI_TIMEOUT_US < TICK_100HZ_PERIOD_US / 2);

pub const PRECHARGE_RESISTANCE_OHMS: f32 = 1000.0;
pub const NUM_INVERTERS: usize = 2;
pub const INVERTER_CAPACITANCE_F: f32 = 0.280e-3;
pub const TOTAL_PRECHARGE_CAPACITANCE_F: f32 = INVERTER_CAPACITANCE_F * NUM_INVERTERS as f32;

/// Time constants allowed for the tractive system to charge.
pub const PRECHARGE_RC_MULTIPLE: f32 = 4.0;
pub const PRECHARGE_LOWER_BOUND_FACTOR: f32 = 0.10;
pub const PRECHARGE_UPPER_BOUND_FACTOR: f32 = 2.0;

/// Fraction of pack voltage the tractive system must reach before AIR+ closes (EV.6.6.1).
pub const PRECHARGE_THRESHOLD_FACTOR: f32 = 0.90;

pub const MIN_DIE_TEMP_DEGC: f32 = -20.0;
pub const MAX_DIE_TEMP_DEGC: f32 = 115.0;
