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
    sm.world_mut().telemetry.set_state(State::Drive);
}

pub(super) async fn run_on_tick_1hz<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    all_states::run_on_tick_1hz(sm).await;
}

pub(super) async fn run_on_tick_100hz<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    all_states::run_on_tick_100hz(sm).await;

    // AIR+ is opened by the fault state
    let world = sm.world_mut();
    if !world.board.is_air_negative_closed() {
        world.errors.set_error(ErrorId::AirNegativeOpen, true);
        sm.set_next_state(State::Fault);
    }
}
