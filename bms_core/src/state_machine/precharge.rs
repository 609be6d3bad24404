//! Tractive system precharge.
//!
//! AIR- is already closed when this state is entered. The precharge relay charges
//! the inverter DC link through the precharge resistor; once the tractive system
//! reaches the threshold AIR+ closes. Charging faster or slower than the RC
//! window allows points at a wiring or sensing fault.

use libm::roundf;

use super::{all_states, State, StateMachine};
use crate::config::{
    PRECHARGE_LOWER_BOUND_FACTOR, PRECHARGE_RC_MULTIPLE, PRECHARGE_RESISTANCE_OHMS,
    PRECHARGE_THRESHOLD_FACTOR, PRECHARGE_UPPER_BOUND_FACTOR, TOTAL_PRECHARGE_CAPACITANCE_F,
};
use crate::fault::ErrorId;
use crate::io::Board;
use crate::ltc_management::IsoSpi;
use crate::telemetry::Telemetry;

/// Expected precharge duration and the bounds outside of which it is a fault.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrechargeWindow {
    pub expected_ms: u32,
    pub lower_ms: u32,
    pub upper_ms: u32,
}

impl PrechargeWindow {
    pub fn from_rc(resistance_ohms: f32, capacitance_f: f32) -> Self {
        let expected = roundf(PRECHARGE_RC_MULTIPLE * resistance_ohms * capacitance_f * 1000.0);
        PrechargeWindow {
            expected_ms: expected as u32,
            lower_ms: roundf(expected * PRECHARGE_LOWER_BOUND_FACTOR) as u32,
            upper_ms: roundf(expected * PRECHARGE_UPPER_BOUND_FACTOR) as u32,
        }
    }
}

impl Default for PrechargeWindow {
    fn default() -> Self {
        Self::from_rc(PRECHARGE_RESISTANCE_OHMS, TOTAL_PRECHARGE_CAPACITANCE_F)
    }
}

/// Time of entry into PreCharge. Only set while the state is active.
#[derive(Debug, Default, Copy, Clone)]
pub struct PrechargeTimer {
    entry_ms: Option<u64>,
}

impl PrechargeTimer {
    pub const fn new() -> Self {
        PrechargeTimer { entry_ms: None }
    }

    pub fn start(&mut self, now_ms: u64) {
        self.entry_ms = Some(now_ms);
    }

    pub fn stop(&mut self) {
        self.entry_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.entry_ms.is_some()
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.entry_ms.map(|entry| now_ms.saturating_sub(entry))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VoltageSample {
    pub ts_voltage: f32,
    /// `None` until the cell monitors delivered a complete reading.
    pub pack_voltage: Option<f32>,
}

impl VoltageSample {
    pub fn threshold(&self) -> Option<f32> {
        self.pack_voltage.map(|pack| pack * PRECHARGE_THRESHOLD_FACTOR)
    }

    fn reached_threshold(&self) -> bool {
        self.threshold().is_some_and(|threshold| self.ts_voltage >= threshold)
    }

    fn above_threshold(&self) -> bool {
        self.threshold().is_some_and(|threshold| self.ts_voltage > threshold)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PrechargeDecision {
    Remain,
    Fault(ErrorId),
    /// Close AIR+ and move on.
    Complete(State),
}

pub fn evaluate_precharge(
    sample: &VoltageSample,
    elapsed_ms: u64,
    window: &PrechargeWindow,
    charger_connected: bool,
    air_negative_closed: bool,
) -> PrechargeDecision {
    if !air_negative_closed {
        return PrechargeDecision::Fault(ErrorId::AirNegativeOpen);
    }

    let too_slow = !sample.reached_threshold() && elapsed_ms >= window.upper_ms as u64;
    if too_slow {
        return PrechargeDecision::Fault(ErrorId::PrechargeTooSlow);
    }

    // A charger may legitimately bring the link up quickly, so only drive checks
    // the lower bound.
    if charger_connected {
        if sample.reached_threshold() {
            return PrechargeDecision::Complete(State::Charge);
        }
    } else {
        let too_fast = sample.above_threshold() && elapsed_ms <= window.lower_ms as u64;
        if too_fast {
            return PrechargeDecision::Fault(ErrorId::PrechargeTooFast);
        }
        if sample.reached_threshold() {
            return PrechargeDecision::Complete(State::Drive);
        }
    }

    PrechargeDecision::Remain
}

pub(super) async fn run_on_entry<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    let world = sm.world_mut();
    world.telemetry.set_state(State::PreCharge);
    world.board.enable_precharge();
    let now = world.board.now_ms();
    world.precharge_timer.start(now);
    debug!("precharge started at {} ms", now);
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

    let world = sm.world_mut();
    let cells_valid = world.accumulator.cells().is_valid();
    let sample = VoltageSample {
        ts_voltage: world.board.ts_voltage(),
        pack_voltage: cells_valid.then(|| world.accumulator.pack_voltage()),
    };
    let now = world.board.now_ms();
    let elapsed = world.precharge_timer.elapsed_ms(now).unwrap_or(0);

    let decision = evaluate_precharge(
        &sample,
        elapsed,
        &world.precharge_window,
        world.board.is_charger_connected(),
        world.board.is_air_negative_closed(),
    );

    match decision {
        PrechargeDecision::Remain => {}
        PrechargeDecision::Fault(id) => {
            error!("precharge failed after {} ms: {}", elapsed, id);
            world.errors.set_error(id, true);
            sm.set_next_state(State::Fault);
        }
        PrechargeDecision::Complete(next) => {
            if world.errors.has_any_critical_error_set() {
                sm.set_next_state(State::Fault);
            } else {
                info!("precharge complete after {} ms", elapsed);
                world.board.close_air_positive();
                sm.set_next_state(next);
            }
        }
    }
}

pub(super) async fn run_on_exit<S, B, T>(sm: &mut StateMachine<S, B, T>)
where
    S: IsoSpi,
    B: Board,
    T: Telemetry,
{
    let world = sm.world_mut();
    world.board.disable_precharge();
    world.precharge_timer.stop();
}
