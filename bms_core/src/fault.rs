//! Error table shared by every state. Critical entries latch until the board is
//! reset; non-critical entries follow the condition that set them.

use crate::config::NUM_SEGMENTS;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultClass {
    Critical,
    NonCritical,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorId {
    AirNegativeOpen,
    PrechargeTooSlow,
    PrechargeTooFast,
    CellMonitorDieTempOutOfRange(u8),
}

const NUM_CRITICAL_ERRORS: u32 = 3;

impl ErrorId {
    pub fn class(&self) -> FaultClass {
        match self {
            ErrorId::AirNegativeOpen | ErrorId::PrechargeTooSlow | ErrorId::PrechargeTooFast => {
                FaultClass::Critical
            }
            ErrorId::CellMonitorDieTempOutOfRange(_) => FaultClass::NonCritical,
        }
    }

    /// `None` for a chip that is not part of the chain.
    fn bit(&self) -> Option<u32> {
        let position = match self {
            ErrorId::AirNegativeOpen => 0,
            ErrorId::PrechargeTooSlow => 1,
            ErrorId::PrechargeTooFast => 2,
            ErrorId::CellMonitorDieTempOutOfRange(chip) if (*chip as usize) < NUM_SEGMENTS => {
                NUM_CRITICAL_ERRORS + *chip as u32
            }
            ErrorId::CellMonitorDieTempOutOfRange(_) => return None,
        };
        Some(1u32 << position)
    }
}

const CRITICAL_MASK: u32 = (1 << NUM_CRITICAL_ERRORS) - 1;

#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorTable {
    set: u32,
}

impl ErrorTable {
    pub const fn new() -> Self {
        ErrorTable { set: 0 }
    }

    /// Clearing a critical error is ignored, and so is an id with no slot.
    pub fn set_error(&mut self, id: ErrorId, is_set: bool) {
        let Some(bit) = id.bit() else {
            warn!("unknown error id: {}", id);
            return;
        };

        if is_set {
            if self.set & bit == 0 {
                warn!("error set: {}", id);
            }
            self.set |= bit;
        } else if id.class() == FaultClass::NonCritical {
            self.set &= !bit;
        }
    }

    pub fn is_error_set(&self, id: ErrorId) -> bool {
        id.bit().is_some_and(|bit| self.set & bit != 0)
    }

    pub fn has_any_critical_error_set(&self) -> bool {
        self.set & CRITICAL_MASK != 0
    }

    pub fn has_any_non_critical_error_set(&self) -> bool {
        self.set & !CRITICAL_MASK != 0
    }
}
