use crate::accumulator::Accumulator;
use crate::fault::ErrorTable;
use crate::state_machine::precharge::{PrechargeTimer, PrechargeWindow};

/// Everything the states operate on.
pub struct BmsWorld<S, B, T> {
    pub accumulator: Accumulator<S>,
    pub board: B,
    pub telemetry: T,
    pub errors: ErrorTable,
    pub precharge_window: PrechargeWindow,
    pub precharge_timer: PrechargeTimer,
}

impl<S, B, T> BmsWorld<S, B, T> {
    pub fn new(accumulator: Accumulator<S>, board: B, telemetry: T) -> Self {
        BmsWorld {
            accumulator,
            board,
            telemetry,
            errors: ErrorTable::new(),
            precharge_window: PrechargeWindow::default(),
            precharge_timer: PrechargeTimer::new(),
        }
    }
}
