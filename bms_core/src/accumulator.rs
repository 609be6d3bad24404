//! Cached view of the accumulator built on top of the LTC6813 chain.

use crate::config::{MAX_ADC_POLL_ATTEMPTS, MAX_DIE_TEMP_DEGC, MIN_DIE_TEMP_DEGC, NUM_SEGMENTS};
use crate::fault::{ErrorId, ErrorTable};
use crate::ltc_management::{IsoSpi, Ltc6813, LtcError};
use crate::telemetry::Telemetry;
use crate::types::{CellLocation, CellVoltages, InRangeCheck};

fn classify_die_temperature(degc: f32) -> InRangeCheck {
    InRangeCheck::classify(degc, MIN_DIE_TEMP_DEGC, MAX_DIE_TEMP_DEGC)
}

pub struct Accumulator<S> {
    ltc: Ltc6813<S>,
    cells: CellVoltages,
    die_temperatures: [f32; NUM_SEGMENTS],
}

impl<S: IsoSpi> Accumulator<S> {
    pub fn new(ltc: Ltc6813<S>) -> Self {
        Accumulator {
            ltc,
            cells: CellVoltages::new(),
            die_temperatures: [0.0; NUM_SEGMENTS],
        }
    }

    pub fn release(self) -> Ltc6813<S> {
        self.ltc
    }

    /// Reads every cell. On failure the previous reading stays in place.
    pub async fn refresh_cell_voltages(&mut self) -> Result<(), LtcError> {
        let codes = self.ltc.read_cell_voltages(MAX_ADC_POLL_ATTEMPTS).await?;
        self.cells.update(&codes);
        self.ltc.set_balancing_target(self.cells.min_cell_location());
        Ok(())
    }

    pub async fn refresh_die_temperatures(&mut self) -> Result<(), LtcError> {
        self.die_temperatures = self.ltc.read_die_temperatures(MAX_ADC_POLL_ATTEMPTS).await?;
        Ok(())
    }

    pub fn cells(&self) -> &CellVoltages {
        &self.cells
    }

    pub fn pack_voltage(&self) -> f32 {
        self.cells.pack_voltage()
    }

    pub fn min_cell_location(&self) -> Option<CellLocation> {
        self.cells.min_cell_location()
    }

    /// `None` for a chip that is not part of the chain.
    pub fn die_temperature_in_range_check(&self, chip: usize) -> Option<InRangeCheck> {
        self.die_temperatures
            .get(chip)
            .map(|&degc| classify_die_temperature(degc))
    }

    /// Range checks and telemetry shared by every state. Out of range die
    /// temperatures are reported but never open a contactor.
    pub fn all_states_100hz(&self, telemetry: &mut impl Telemetry, errors: &mut ErrorTable) {
        for (chip, &degc) in self.die_temperatures.iter().enumerate() {
            let status = classify_die_temperature(degc);
            errors.set_error(ErrorId::CellMonitorDieTempOutOfRange(chip as u8), !status.is_ok());

            telemetry.set_cell_monitor_die_temperature(chip as u8, degc);
            telemetry.set_cell_monitor_die_temp_out_of_range(chip as u8, status);
        }

        telemetry.set_pack_voltage(self.pack_voltage());
        telemetry.set_cell_voltage_extremes(self.cells.min_voltage(), self.cells.max_voltage());
        telemetry.set_average_cell_voltage(self.cells.avg_voltage());
    }

    /// Rewrites the configuration registers so only the lowest cell keeps charging.
    pub async fn update_balancing(&mut self) -> Result<(), LtcError> {
        self.ltc.write_configuration_registers().await
    }

    pub async fn set_defaults_and_enable_balancing(&mut self) -> Result<(), LtcError> {
        self.ltc.set_defaults_and_enable_balancing().await
    }

    pub async fn resume_balancing(&mut self) -> Result<(), LtcError> {
        self.ltc.enable_discharge().await
    }

    pub async fn stop_balancing(&mut self) -> Result<(), LtcError> {
        self.ltc.disable_discharge().await
    }
}
