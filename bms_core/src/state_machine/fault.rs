//! Terminal state. The accumulator stays isolated until the board is reset.

use super::{all_states, State, StateMachine};
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
    world.board.open_air_positive();
    world.board.disable_precharge();
    world.telemetry.set_state(State::Fault);
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
}
