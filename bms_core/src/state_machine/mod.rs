//! Board state machine. States are dispatched by value; every state runs the
//! shared "all states" behavior before its own.

mod all_states;
mod charge;
mod drive;
mod fault;
mod init;
pub mod precharge;

use crate::io::Board;
use crate::ltc_management::IsoSpi;
use crate::telemetry::Telemetry;
use crate::world::BmsWorld;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Init,
    PreCharge,
    Charge,
    Drive,
    Fault,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Init => "INIT",
            State::PreCharge => "PRE_CHARGE",
            State::Charge => "CHARGE",
            State::Drive => "DRIVE",
            State::Fault => "FAULT",
        }
    }
}

pub struct StateMachine<S, B, T> {
    world: BmsWorld<S, B, T>,
    current: State,
    next: Option<State>,
}

impl<S, B, T> StateMachine<S, B, T>
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    pub fn new(world: BmsWorld<S, B, T>) -> Self {
        StateMachine {
            world,
            current: State::Init,
            next: None,
        }
    }

    /// Runs the entry action of the initial state.
    pub async fn start(&mut self) {
        info!("state machine starting in {}", self.current.name());
        self.run_on_entry(self.current).await;
    }

    pub fn current_state(&self) -> State {
        self.current
    }

    pub fn world(&self) -> &BmsWorld<S, B, T> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut BmsWorld<S, B, T> {
        &mut self.world
    }

    /// Requests a transition at the end of the current tick. Once Fault has been
    /// requested nothing else replaces it.
    pub fn set_next_state(&mut self, state: State) {
        if self.next != Some(State::Fault) {
            self.next = Some(state);
        }
    }

    pub async fn tick_1hz(&mut self) {
        match self.current {
            State::Init => init::run_on_tick_1hz(self).await,
            State::PreCharge => precharge::run_on_tick_1hz(self).await,
            State::Charge => charge::run_on_tick_1hz(self).await,
            State::Drive => drive::run_on_tick_1hz(self).await,
            State::Fault => fault::run_on_tick_1hz(self).await,
        }
        self.transition().await;
    }

    pub async fn tick_100hz(&mut self) {
        match self.current {
            State::Init => init::run_on_tick_100hz(self).await,
            State::PreCharge => precharge::run_on_tick_100hz(self).await,
            State::Charge => charge::run_on_tick_100hz(self).await,
            State::Drive => drive::run_on_tick_100hz(self).await,
            State::Fault => fault::run_on_tick_100hz(self).await,
        }
        self.transition().await;
    }

    async fn run_on_entry(&mut self, state: State) {
        match state {
            State::Init => init::run_on_entry(self).await,
            State::PreCharge => precharge::run_on_entry(self).await,
            State::Charge => charge::run_on_entry(self).await,
            State::Drive => drive::run_on_entry(self).await,
            State::Fault => fault::run_on_entry(self).await,
        }
    }

    async fn run_on_exit(&mut self, state: State) {
        match state {
            State::PreCharge => precharge::run_on_exit(self).await,
            State::Charge => charge::run_on_exit(self).await,
            State::Init | State::Drive | State::Fault => {}
        }
    }

    async fn transition(&mut self) {
        let Some(next) = self.next.take() else {
            return;
        };
        if next == self.current {
            return;
        }

        info!("{} -> {}", self.current.name(), next.name());
        self.run_on_exit(self.current).await;
        self.current = next;
        self.run_on_entry(next).await;
    }
}
