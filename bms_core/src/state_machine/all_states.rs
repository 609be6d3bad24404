use super::{State, StateMachine};
use crate::io::Board;
use crate::ltc_management::IsoSpi;
use crate::telemetry::Telemetry;

pub(super) async fn run_on_tick_1hz<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    let world = sm.world_mut();

    if let Err(e) = world.accumulator.refresh_die_temperatures().await {
        warn!("die temperature refresh failed: {}", e);
    }

    let connected = world.board.is_charger_connected();
    world.telemetry.set_charger_connected(connected);
}

pub(super) async fn run_on_tick_100hz<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    let world = sm.world_mut();

    // keep the last good reading on failure
    if let Err(e) = world.accumulator.refresh_cell_voltages().await {
        warn!("cell voltage refresh failed: {}", e);
    }

    world.accumulator.all_states_100hz(&mut world.telemetry, &mut world.errors);

    let air_negative = world.board.is_air_negative_closed();
    let air_positive = world.board.is_air_positive_closed();
    let ts_voltage = world.board.ts_voltage();
    world.telemetry.set_air_negative_closed(air_negative);
    world.telemetry.set_air_positive_closed(air_positive);
    world.telemetry.set_ts_voltage(ts_voltage);

    if world.errors.has_any_critical_error_set() {
        sm.set_next_state(State::Fault);
    }
}
