//! Charging with the charger connected. Balancing follows the lowest cell,
//! refreshed once per second.

use super::{all_states, State, StateMachine};
use crate::fault::ErrorId;
use crate::io::Board;
use crate::ltc_management::IsoSpi;
use crate::telemetry::Telemetry;

pub(super) async fn run_on_entry<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    let world = sm.world_mut();
    world.telemetry.set_state(State::Charge);

    if let Err(e) = world.accumulator.resume_balancing().await {
        warn!("failed to enable cell discharge: {}", e);
    }
}

pub(super) async fn run_on_tick_1hz<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    all_states::run_on_tick_1hz(sm).await;

    if let Err(e) = sm.world_mut().accumulator.update_balancing().await {
        warn!("balancing update failed: {}", e);
    }
}

pub(super) async fn run_on_tick_100hz<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    all_states::run_on_tick_100hz(sm).await;

    let world = sm.world_mut();
    if !world.board.is_air_negative_closed() {
        world.errors.set_error(ErrorId::AirNegativeOpen, true);
        sm.set_next_state(State::Fault);
    }
}

pub(super) async fn run_on_exit<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    if let Err(e) = sm.world_mut().accumulator.stop_balancing().await {
        error!("failed to stop cell discharge: {}", e);
    }
}
