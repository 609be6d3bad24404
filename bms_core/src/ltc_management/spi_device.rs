use embassy_futures::select::{select, Either};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiBus;

use super::LtcError;

/// Byte-level access to the isoSPI daisy chain.
///
/// Implementors only provide the raw primitives. The provided methods keep chip
/// select asserted across a whole transaction and always release it, including on
/// the error paths.
#[allow(async_fn_in_trait)]
pub trait IsoSpi {
    fn set_cs_low(&mut self) -> Result<(), LtcError>;

    fn set_cs_high(&mut self) -> Result<(), LtcError>;

    async fn write_without_cs_toggle(&mut self, data: &[u8]) -> Result<(), LtcError>;

    async fn read_without_cs_toggle(&mut self, buffer: &mut [u8]) -> Result<(), LtcError>;

    async fn write(&mut self, data: &[u8]) -> Result<(), LtcError> {
        self.set_cs_low()?;
        let result = self.write_without_cs_toggle(data).await;
        let released = self.set_cs_high();
        result.and(released)
    }

    async fn cmd_read(&mut self, cmd: &[u8], buffer: &mut [u8]) -> Result<(), LtcError> {
        self.set_cs_low()?;
        let mut result = self.write_without_cs_toggle(cmd).await;
        if result.is_ok() {
            result = self.read_without_cs_toggle(buffer).await;
        }
        let released = self.set_cs_high();
        result.and(released)
    }
}

/// SPI bus plus a manually driven chip select. Every bus operation is raced
/// against `timeout_us` on the supplied delay.
pub struct SpiDevice<SPI, CS, D> {
    spi: SPI,
    cs: CS,
    delay: D,
    timeout_us: u32,
}

impl<SPI, CS, D> SpiDevice<SPI, CS, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, mut cs: CS, delay: D, timeout_us: u32) -> Self {
        // idle high so the chain is not addressed until the first transaction
        let _ = cs.set_high();
        SpiDevice {
            spi,
            cs,
            delay,
            timeout_us,
        }
    }
}

async fn with_timeout<F, E>(delay: &mut impl DelayNs, timeout_us: u32, op: F) -> Result<(), LtcError>
where
    F: core::future::Future<Output = Result<(), E>>,
{
    match select(op, delay.delay_us(timeout_us)).await {
        Either::First(Ok(())) => Ok(()),
        Either::First(Err(_)) => {
            error!("SPI transfer failed");
            Err(LtcError::Bus)
        }
        Either::Second(()) => {
            error!("SPI transfer timed out after {} us", timeout_us);
            Err(LtcError::Timeout)
        }
    }
}

impl<SPI, CS, D> IsoSpi for SpiDevice<SPI, CS, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn set_cs_low(&mut self) -> Result<(), LtcError> {
        self.cs.set_low().map_err(|_| LtcError::ChipSelect)
    }

    fn set_cs_high(&mut self) -> Result<(), LtcError> {
        self.cs.set_high().map_err(|_| LtcError::ChipSelect)
    }

    async fn write_without_cs_toggle(&mut self, data: &[u8]) -> Result<(), LtcError> {
        let spi = &mut self.spi;
        with_timeout(&mut self.delay, self.timeout_us, async move {
            spi.write(data).await?;
            spi.flush().await
        })
        .await
    }

    async fn read_without_cs_toggle(&mut self, buffer: &mut [u8]) -> Result<(), LtcError> {
        let spi = &mut self.spi;
        with_timeout(&mut self.delay, self.timeout_us, async move {
            spi.read(buffer).await?;
            spi.flush().await
        })
        .await
    }
}
