//! Hardware independent core of the HV accumulator BMS: LTC6813 chain driver,
//! accumulator monitoring and the precharge state machine.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod accumulator;
pub mod config;
pub mod fault;
pub mod io;
pub mod ltc_management;
pub mod state_machine;
pub mod telemetry;
pub mod types;
pub mod world;

#[cfg(test)]
mod testing;

pub use accumulator::Accumulator;
pub use fault::{ErrorId, ErrorTable};
pub use state_machine::{State, StateMachine};
pub use telemetry::{Telemetry, TelemetrySnapshot};
pub use world::BmsWorld;
