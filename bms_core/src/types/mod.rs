pub mod cells;
pub use cells::CellVoltages;

/// Position of a cell on the daisy chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CellLocation {
    pub segment: u8,
    pub index: u8,
}

impl CellLocation {
    pub const fn new(segment: u8, index: u8) -> Self {
        CellLocation { segment, index }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InRangeCheck {
    Ok,
    Underflow,
    Overflow,
}

impl InRangeCheck {
    pub fn classify(value: f32, min: f32, max: f32) -> Self {
        if value < min {
            InRangeCheck::Underflow
        } else if value > max {
            InRangeCheck::Overflow
        } else {
            InRangeCheck::Ok
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == InRangeCheck::Ok
    }
}
