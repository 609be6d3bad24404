pub mod can_controller;
pub mod frame;

use bms_core::config::NUM_SEGMENTS;
use bms_core::types::InRangeCheck;
use bms_core::{State, TelemetrySnapshot};
use defmt::{info, warn};
use heapless::Vec;
use libm::roundf;

pub use can_controller::CanController;
pub use frame::CanFrame;

#[derive(Debug, Copy, Clone, Eq, PartialEq, defmt::Format)]
pub enum CanError {
    Timeout,
    InvalidFrame,
}

#[repr(u16)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CanMsg {
    StatusId = 0x300,
    CellVoltagesId = 0x301,
    DieTemperaturesId = 0x302,
}

impl CanMsg {
    pub fn as_raw(&self) -> u16 {
        *self as u16
    }
}

#[macro_export]
macro_rules! get_byte {
    ($value:expr, $byte_num:expr) => {
        (($value >> ($byte_num * 8)) & 0xFF) as u8
    };
}

const NUM_TELEMETRY_FRAMES: usize = 3;

// die temperature frame: one byte per chip plus a u16 of range bits
const _: () = assert!(NUM_SEGMENTS <= 6);

fn state_id(state: State) -> u8 {
    match state {
        State::Init => 0,
        State::PreCharge => 1,
        State::Charge => 2,
        State::Drive => 3,
        State::Fault => 4,
    }
}

fn range_code(status: InRangeCheck) -> u16 {
    match status {
        InRangeCheck::Ok => 0,
        InRangeCheck::Underflow => 1,
        InRangeCheck::Overflow => 2,
    }
}

fn scaled(value: f32, factor: f32) -> u16 {
    roundf(value * factor).clamp(0.0, u16::MAX as f32) as u16
}

/// Packs the snapshot into the periodic BMS frames.
pub fn telemetry_frames(t: &TelemetrySnapshot) -> Result<Vec<CanFrame, NUM_TELEMETRY_FRAMES>, CanError> {
    let mut frames = Vec::new();

    let flags = (t.air_negative_closed as u8)
        | ((t.air_positive_closed as u8) << 1)
        | ((t.charger_connected as u8) << 2);
    let pack_dv = scaled(t.pack_voltage, 10.0);
    let ts_dv = scaled(t.ts_voltage, 10.0);
    let status = [
        state_id(t.state),
        flags,
        get_byte!(pack_dv, 0),
        get_byte!(pack_dv, 1),
        get_byte!(ts_dv, 0),
        get_byte!(ts_dv, 1),
    ];

    let min_mv = scaled(t.min_cell_voltage, 1000.0);
    let max_mv = scaled(t.max_cell_voltage, 1000.0);
    let avg_mv = scaled(t.avg_cell_voltage, 1000.0);
    let cells = [
        get_byte!(min_mv, 0),
        get_byte!(min_mv, 1),
        get_byte!(max_mv, 0),
        get_byte!(max_mv, 1),
        get_byte!(avg_mv, 0),
        get_byte!(avg_mv, 1),
    ];

    // one signed degC byte per chip, then 2 range bits per chip
    let mut temps = [0u8; 8];
    let mut range_bits: u16 = 0;
    for chip in 0..NUM_SEGMENTS {
        temps[chip] = roundf(t.die_temperatures[chip]).clamp(i8::MIN as f32, i8::MAX as f32) as i8 as u8;
        range_bits |= range_code(t.die_temp_out_of_range[chip]) << (2 * chip);
    }
    temps[6] = get_byte!(range_bits, 0);
    temps[7] = get_byte!(range_bits, 1);

    for (id, data) in [
        (CanMsg::StatusId, &status[..]),
        (CanMsg::CellVoltagesId, &cells[..]),
        (CanMsg::DieTemperaturesId, &temps[..]),
    ] {
        let frame = CanFrame::new(id.as_raw(), data)?;
        frames.push(frame).map_err(|_| CanError::InvalidFrame)?;
    }

    Ok(frames)
}

pub async fn can_operation(t: &TelemetrySnapshot, can: &mut CanController<'_>) -> Result<(), CanError> {
    for frame in telemetry_frames(t)?.iter() {
        match can.write(frame).await {
            Ok(_) => info!("Message sent! {:x} {:x}", frame.id(), frame.bytes()),
            Err(e) => {
                warn!("Can write error: {}", e);
                return Err(e);
            }
        }
    }
    Ok(())
}
