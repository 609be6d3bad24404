use bms_core::io::{Airs, Charger, Clock, PrechargeRelay, TractiveSystem};
use embassy_stm32::adc::{Adc, Resolution};
use embassy_stm32::gpio::{Input, Output};
use embassy_stm32::peripherals::{ADC1, PA3};

const ADC_REF_MV: f32 = 3300.0;
const ADC_FULL_SCALE: f32 = 4095.0;

/// Tractive system divider: volts on the HV bus per volt at the ADC pin.
const TS_SENSE_GAIN: f32 = 200.0;

/// GPIO and ADC wiring of the BMS board.
pub struct BmsBoard {
    air_negative_sense: Input<'static>,
    air_positive: Output<'static>,
    precharge_relay: Output<'static>,
    charger_sense: Input<'static>,
    adc: Adc<'static, ADC1>,
    ts_sense_pin: PA3,
}

impl BmsBoard {
    pub fn new(
        air_negative_sense: Input<'static>,
        air_positive: Output<'static>,
        precharge_relay: Output<'static>,
        charger_sense: Input<'static>,
        mut adc: Adc<'static, ADC1>,
        ts_sense_pin: PA3,
    ) -> Self {
        adc.set_resolution(Resolution::BITS12);
        BmsBoard {
            air_negative_sense,
            air_positive,
            precharge_relay,
            charger_sense,
            adc,
            ts_sense_pin,
        }
    }
}

impl Clock for BmsBoard {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }
}

impl Airs for BmsBoard {
    fn is_air_negative_closed(&mut self) -> bool {
        self.air_negative_sense.is_high()
    }

    fn close_air_positive(&mut self) {
        self.air_positive.set_high();
    }

    fn open_air_positive(&mut self) {
        self.air_positive.set_low();
    }

    fn is_air_positive_closed(&self) -> bool {
        self.air_positive.is_set_high()
    }
}

impl PrechargeRelay for BmsBoard {
    fn enable_precharge(&mut self) {
        self.precharge_relay.set_high();
    }

    fn disable_precharge(&mut self) {
        self.precharge_relay.set_low();
    }
}

impl Charger for BmsBoard {
    fn is_charger_connected(&mut self) -> bool {
        self.charger_sense.is_high()
    }
}

impl TractiveSystem for BmsBoard {
    fn ts_voltage(&mut self) -> f32 {
        let code = self.adc.blocking_read(&mut self.ts_sense_pin);
        let pin_mv = (code as f32) * ADC_REF_MV / ADC_FULL_SCALE;
        pin_mv / 1000.0 * TS_SENSE_GAIN
    }
}
