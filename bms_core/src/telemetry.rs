use crate::config::NUM_SEGMENTS;
use crate::state_machine::State;
use crate::types::InRangeCheck;

/// Periodic signals the BMS publishes. The bit layout on the bus belongs to the
/// implementor.
pub trait Telemetry {
    fn set_state(&mut self, state: State);

    fn set_air_negative_closed(&mut self, closed: bool);

    fn set_air_positive_closed(&mut self, closed: bool);

    fn set_charger_connected(&mut self, connected: bool);

    fn set_pack_voltage(&mut self, volts: f32);

    fn set_ts_voltage(&mut self, volts: f32);

    fn set_cell_voltage_extremes(&mut self, min_volts: f32, max_volts: f32);

    fn set_average_cell_voltage(&mut self, volts: f32);

    fn set_cell_monitor_die_temperature(&mut self, chip: u8, degc: f32);

    fn set_cell_monitor_die_temp_out_of_range(&mut self, chip: u8, status: InRangeCheck);
}

/// Latest value of every signal, ready to be packed into frames.
#[derive(Debug, Clone, Copy)]
pub struct TelemetrySnapshot {
    pub state: State,
    pub air_negative_closed: bool,
    pub air_positive_closed: bool,
    pub charger_connected: bool,
    pub pack_voltage: f32,
    pub ts_voltage: f32,
    pub min_cell_voltage: f32,
    pub max_cell_voltage: f32,
    pub avg_cell_voltage: f32,
    pub die_temperatures: [f32; NUM_SEGMENTS],
    pub die_temp_out_of_range: [InRangeCheck; NUM_SEGMENTS],
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        TelemetrySnapshot {
            state: State::Init,
            air_negative_closed: false,
            air_positive_closed: false,
            charger_connected: false,
            pack_voltage: 0.0,
            ts_voltage: 0.0,
            min_cell_voltage: 0.0,
            max_cell_voltage: 0.0,
            avg_cell_voltage: 0.0,
            die_temperatures: [0.0; NUM_SEGMENTS],
            die_temp_out_of_range: [InRangeCheck::Ok; NUM_SEGMENTS],
        }
    }
}

impl Telemetry for TelemetrySnapshot {
    fn set_state(&mut self, state: State) {
        self.state = state;
    }

    fn set_air_negative_closed(&mut self, closed: bool) {
        self.air_negative_closed = closed;
    }

    fn set_air_positive_closed(&mut self, closed: bool) {
        self.air_positive_closed = closed;
    }

    fn set_charger_connected(&mut self, connected: bool) {
        self.charger_connected = connected;
    }

    fn set_pack_voltage(&mut self, volts: f32) {
        self.pack_voltage = volts;
    }

    fn set_ts_voltage(&mut self, volts: f32) {
        self.ts_voltage = volts;
    }

    fn set_cell_voltage_extremes(&mut self, min_volts: f32, max_volts: f32) {
        self.min_cell_voltage = min_volts;
        self.max_cell_voltage = max_volts;
    }

    fn set_average_cell_voltage(&mut self, volts: f32) {
        self.avg_cell_voltage = volts;
    }

    fn set_cell_monitor_die_temperature(&mut self, chip: u8, degc: f32) {
        if let Some(t) = self.die_temperatures.get_mut(chip as usize) {
            *t = degc;
        }
    }

    fn set_cell_monitor_die_temp_out_of_range(&mut self, chip: u8, status: InRangeCheck) {
        if let Some(s) = self.die_temp_out_of_range.get_mut(chip as usize) {
            *s = status;
        }
    }
}
