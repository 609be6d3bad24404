#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LtcError {
    #[error("isoSPI transfer failed")]
    Bus,
    #[error("isoSPI transfer timed out")]
    Timeout,
    #[error("chip select line could not be driven")]
    ChipSelect,
    #[error("ADC conversion still running after {0} polls")]
    ConversionIncomplete(u8),
    #[error("PEC mismatch in register group read back from segment {0}")]
    Pec(u8),
}
