use embassy_stm32::can::{Frame, StandardId};

use super::CanError;

#[derive(Clone)]
pub struct CanFrame {
    id: u16,
    data: [u8; 8],
    len: usize,
    frame: Frame,
}

impl CanFrame {
    pub fn new(id: u16, data: &[u8]) -> Result<Self, CanError> {
        let mut frame_data = [0u8; 8];
        let len = data.len().min(8);

        frame_data[..len].copy_from_slice(&data[..len]);

        let std_id = StandardId::new(id).ok_or(CanError::InvalidFrame)?;
        let tx_frame = Frame::new_data(std_id, &frame_data[..len]).map_err(|_| CanError::InvalidFrame)?;

        Ok(CanFrame {
            id,
            data: frame_data,
            len,
            frame: tx_frame,
        })
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn id(&self) -> u16 {
        self.id
    }
}
