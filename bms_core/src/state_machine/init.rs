use super::{all_states, State, StateMachine};
use crate::io::Board;
use crate::ltc_management::IsoSpi;
use crate::telemetry::Telemetry;

/// Wakes the cell monitor chain and loads its default configuration.
pub(super) async fn run_on_entry<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    let world = sm.world_mut();
    world.telemetry.set_state(State::Init);

    if let Err(e) = world.accumulator.set_defaults_and_enable_balancing().await {
        error!("cell monitor configuration failed: {}", e);
    }
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

    if sm.world_mut().board.is_air_negative_closed() {
        sm.set_next_state(State::PreCharge);
    }
}
