use super::registers::*;
use super::spi_device::IsoSpi;
use super::LtcError;
use crate::config::{NUM_CELLS_PER_SEGMENT, NUM_SEGMENTS};
use crate::ltc_management::pec15::pec15_bytes;
use crate::types::CellLocation;

/// Cell voltage codes as read from the chain, 100 uV per LSB.
pub type CellVoltageCodes = [[u16; NUM_CELLS_PER_SEGMENT]; NUM_SEGMENTS];

const CELLS_PER_REG_GROUP: usize = 3;

// ITMP: 100 uV per LSB, 7.6 mV/K slope, 276 degC offset
const ITMP_VOLTS_PER_LSB: f32 = 100e-6;
const ITMP_VOLTS_PER_DEGC: f32 = 7.6e-3;
const ITMP_OFFSET_DEGC: f32 = 276.0;

pub fn die_temperature_from_code(code: u16) -> f32 {
    (code as f32) * ITMP_VOLTS_PER_LSB / ITMP_VOLTS_PER_DEGC - ITMP_OFFSET_DEGC
}

/// Driver for a daisy chain of LTC6813 cell monitors sharing one isoSPI port.
pub struct Ltc6813<S> {
    spi: S,
    min_cell: Option<CellLocation>,
}

impl<S: IsoSpi> Ltc6813<S> {
    pub fn new(spi: S) -> Self {
        Ltc6813 { spi, min_cell: None }
    }

    pub fn release(self) -> S {
        self.spi
    }

    /// Cell left out of discharge by the next configuration write.
    pub fn set_balancing_target(&mut self, min_cell: Option<CellLocation>) {
        self.min_cell = min_cell;
    }

    pub async fn send_command(&mut self, cmd: u16) -> Result<(), LtcError> {
        self.spi.write(&prepare_command(cmd)).await
    }

    /// Sends PLADC until every chip reports its conversion finished. Each attempt is
    /// bounded by the bus timeout, so this never waits longer than
    /// `max_attempts` bus timeouts.
    pub async fn poll_adc_conversion_complete(&mut self, max_attempts: u8) -> Result<(), LtcError> {
        let cmd = prepare_command(PLADC);

        for attempt in 0..max_attempts {
            let mut status = [ADC_CONV_INCOMPLETE];
            self.spi.cmd_read(&cmd, &mut status).await?;

            if status[0] != ADC_CONV_INCOMPLETE {
                trace!("ADC conversion complete after {} polls", attempt + 1);
                return Ok(());
            }
        }

        warn!("ADC conversion still running after {} polls", max_attempts);
        Err(LtcError::ConversionIncomplete(max_attempts))
    }

    /// Writes CFGRA then CFGRB to every chip using the current balancing target.
    pub async fn write_configuration_registers(&mut self) -> Result<(), LtcError> {
        let registers = prepare_balancing_registers(self.min_cell);

        for register in ConfigRegister::ALL {
            let cmd = prepare_command(register.write_command());

            // Data shifts through the chain, so the last segment's bytes go out first.
            let mut payload = [0u8; REG_GROUP_SIZE * NUM_SEGMENTS];
            for (slot, chunk) in payload.chunks_exact_mut(REG_GROUP_SIZE).enumerate() {
                let segment = NUM_SEGMENTS - 1 - slot;
                chunk.copy_from_slice(&registers[register as usize][segment]);
            }

            self.spi.set_cs_low()?;
            let mut result = self.spi.write_without_cs_toggle(&cmd).await;
            if result.is_ok() {
                result = self.spi.write_without_cs_toggle(&payload).await;
            }
            let released = self.spi.set_cs_high();

            if let Err(e) = result.and(released) {
                error!("Failed to write configuration register {}", register);
                return Err(e);
            }
        }

        Ok(())
    }

    /// The first write also wakes the chain from sleep. The discharge command and
    /// the second write are attempted even if it failed.
    pub async fn set_defaults_and_enable_balancing(&mut self) -> Result<(), LtcError> {
        let wake = self.write_configuration_registers().await;
        self.enable_discharge().await?;
        self.write_configuration_registers().await?;
        wake
    }

    pub async fn enable_discharge(&mut self) -> Result<(), LtcError> {
        self.send_command(ENABLE_DISCHARGE).await
    }

    pub async fn disable_discharge(&mut self) -> Result<(), LtcError> {
        self.send_command(DISABLE_DISCHARGE).await
    }

    /// Reads one register group from every chip and checks each PEC.
    /// Segment 0 (closest to the host) answers first.
    pub async fn read_register_groups(
        &mut self,
        cmd: u16,
    ) -> Result<[[u8; REG_GROUP_DATA_SIZE]; NUM_SEGMENTS], LtcError> {
        let mut rx = [0u8; REG_GROUP_SIZE * NUM_SEGMENTS];
        self.spi.cmd_read(&prepare_command(cmd), &mut rx).await?;

        let mut groups = [[0u8; REG_GROUP_DATA_SIZE]; NUM_SEGMENTS];
        for (segment, chunk) in rx.chunks_exact(REG_GROUP_SIZE).enumerate() {
            let (data, pec) = chunk.split_at(REG_GROUP_DATA_SIZE);
            if pec != pec15_bytes(data).as_slice() {
                error!("PEC mismatch reading {} from segment {}", cmd, segment);
                return Err(LtcError::Pec(segment as u8));
            }
            groups[segment].copy_from_slice(data);
        }

        Ok(groups)
    }

    pub async fn start_cell_conversion(&mut self) -> Result<(), LtcError> {
        self.send_command(ADCV).await
    }

    /// Converts and reads back every cell. Nothing is returned unless all six
    /// register groups arrive intact.
    pub async fn read_cell_voltages(&mut self, max_attempts: u8) -> Result<CellVoltageCodes, LtcError> {
        self.start_cell_conversion().await?;
        self.poll_adc_conversion_complete(max_attempts).await?;

        let mut cells: CellVoltageCodes = [[0; NUM_CELLS_PER_SEGMENT]; NUM_SEGMENTS];

        for (group_index, cmd) in RDCV.iter().enumerate() {
            let groups = self.read_register_groups(*cmd).await?;

            for (segment, data) in groups.iter().enumerate() {
                for (i, code) in data.chunks_exact(2).enumerate() {
                    let cell = group_index * CELLS_PER_REG_GROUP + i;
                    if cell < NUM_CELLS_PER_SEGMENT {
                        cells[segment][cell] = u16::from_le_bytes([code[0], code[1]]);
                    }
                }
            }
        }

        Ok(cells)
    }

    pub async fn read_die_temperatures(&mut self, max_attempts: u8) -> Result<[f32; NUM_SEGMENTS], LtcError> {
        self.send_command(ADSTAT_ITMP).await?;
        self.poll_adc_conversion_complete(max_attempts).await?;

        let groups = self.read_register_groups(RDSTATA).await?;
        Ok(groups.map(|data| die_temperature_from_code(u16::from_le_bytes([data[2], data[3]]))))
    }
}
