use embassy_stm32::can::filter::Mask32;
use embassy_stm32::can::{Can, Fifo};
use embassy_stm32::peripherals::{CAN1, PA11, PA12};
use embassy_time::{with_timeout, Duration};

use super::{CanError, CanFrame};
use crate::Irqs;

const WRITE_TIMEOUT: Duration = Duration::from_millis(10);

pub struct CanController<'d> {
    can: Can<'d>,
}

impl<'d> CanController<'d> {
    pub async fn new_can1(peri: CAN1, rx: PA11, tx: PA12, bitrate: u32) -> Self {
        let mut can = Can::new(peri, rx, tx, Irqs);

        can.modify_filters().enable_bank(0, Fifo::Fifo0, Mask32::accept_all());
        can.modify_config()
            .set_loopback(false)
            .set_silent(false)
            .set_bitrate(bitrate);
        can.enable().await;

        CanController { can }
    }

    pub async fn write(&mut self, frame: &CanFrame) -> Result<(), CanError> {
        with_timeout(WRITE_TIMEOUT, self.can.write(frame.frame()))
            .await
            .map(|_| ())
            .map_err(|_| CanError::Timeout)
    }
}
