//! Sensing and actuation the state machine needs from the board.

/// Monotonic millisecond time base.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Accumulator isolation relays. AIR- is only sensed, AIR+ only commanded.
pub trait Airs {
    fn is_air_negative_closed(&mut self) -> bool;

    fn close_air_positive(&mut self);

    fn open_air_positive(&mut self);

    fn is_air_positive_closed(&self) -> bool;
}

pub trait PrechargeRelay {
    fn enable_precharge(&mut self);

    fn disable_precharge(&mut self);
}

pub trait Charger {
    fn is_charger_connected(&mut self) -> bool;
}

/// Tractive system voltage downstream of the AIRs, in volts.
pub trait TractiveSystem {
    fn ts_voltage(&mut self) -> f32;
}

pub trait Board: Clock + Airs + PrechargeRelay + Charger + TractiveSystem {}

impl<T> Board for T where T: Clock + Airs + PrechargeRelay + Charger + TractiveSystem {}
