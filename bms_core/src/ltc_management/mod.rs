pub mod error;
pub mod ltc6813;
pub mod pec15;
pub mod registers;
pub mod spi_device;

pub use error::LtcError;
pub use ltc6813::Ltc6813;
pub use spi_device::{IsoSpi, SpiDevice};
