#![no_std]
#![no_main]

use bms_core::config::{NUM_SEGMENTS, SPI_TIMEOUT_US};
use bms_core::ltc_management::{Ltc6813, SpiDevice};
use bms_core::{Accumulator, BmsWorld, StateMachine, TelemetrySnapshot};
use embassy_executor::Spawner;
use embassy_stm32::adc::Adc;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals::CAN1;
use embassy_stm32::spi::{BitOrder, Config as SpiConfig, Spi, MODE_3};
use embassy_stm32::time::Hertz;
use embassy_stm32::{bind_interrupts, can, Config};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Delay, Duration, Ticker};
use static_cell::StaticCell;

use defmt::{error, info};
use {defmt_rtt as _, panic_probe as _};

mod board;
mod can_management;

use board::BmsBoard;
use can_management::{can_operation, CanController};

bind_interrupts!(pub struct Irqs {
    CAN1_RX0 => can::Rx0InterruptHandler<CAN1>;
    CAN1_RX1 => can::Rx1InterruptHandler<CAN1>;
    CAN1_SCE => can::SceInterruptHandler<CAN1>;
    CAN1_TX => can::TxInterruptHandler<CAN1>;
});

type ChainSpi = SpiDevice<Spi<'static, Async>, Output<'static>, Delay>;
type Bms = StateMachine<ChainSpi, BmsBoard, TelemetrySnapshot>;

static BMS: StaticCell<Mutex<CriticalSectionRawMutex, Bms>> = StaticCell::new();
static CAN: StaticCell<Mutex<CriticalSectionRawMutex, CanController<'static>>> = StaticCell::new();

const CAN_BITRATE: u32 = 500_000;

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let p = embassy_stm32::init(prepare_config());

    let mut spi_config = SpiConfig::default();
    spi_config.mode = MODE_3;
    spi_config.bit_order = BitOrder::MsbFirst;
    spi_config.frequency = Hertz(1_000_000);

    let spi = Spi::new(p.SPI1, p.PA5, p.PA7, p.PA6, p.DMA2_CH3, p.DMA2_CH0, spi_config);
    let cs = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let chain = SpiDevice::new(spi, cs, Delay, SPI_TIMEOUT_US);
    info!("isoSPI chain of {} LTC6813 ready", NUM_SEGMENTS);

    let board = BmsBoard::new(
        Input::new(p.PB0, Pull::Down),
        Output::new(p.PB1, Level::Low, Speed::Low),
        Output::new(p.PB2, Level::Low, Speed::Low),
        Input::new(p.PB5, Pull::Down),
        Adc::new(p.ADC1),
        p.PA3,
    );

    let world = BmsWorld::new(
        Accumulator::new(Ltc6813::new(chain)),
        board,
        TelemetrySnapshot::default(),
    );
    let mut bms = StateMachine::new(world);
    bms.start().await;
    let bms = BMS.init(Mutex::new(bms));

    let can = CanController::new_can1(p.CAN1, p.PA11, p.PA12, CAN_BITRATE).await;
    let can = CAN.init(Mutex::new(can));

    spawner.spawn(tick_100hz(bms)).unwrap();
    spawner.spawn(tick_1hz(bms)).unwrap();
    spawner.spawn(send_can(bms, can)).unwrap();

    loop {
        embassy_time::Timer::after_millis(10000).await;
    }
}

pub fn prepare_config() -> Config {
    let mut config = Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(12_000_000),
            mode: HseMode::Oscillator,
        });

        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV6,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2),
            divq: Some(PllQDiv::DIV7),
            divr: None,
        });

        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        config.rcc.sys = Sysclk::PLL1_P;
    }
    config
}

#[embassy_executor::task]
async fn tick_100hz(bms: &'static Mutex<CriticalSectionRawMutex, Bms>) {
    let mut ticker = Ticker::every(Duration::from_millis(10));
    loop {
        ticker.next().await;
        bms.lock().await.tick_100hz().await;
    }
}

#[embassy_executor::task]
async fn tick_1hz(bms: &'static Mutex<CriticalSectionRawMutex, Bms>) {
    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;
        bms.lock().await.tick_1hz().await;
    }
}

#[embassy_executor::task]
async fn send_can(
    bms: &'static Mutex<CriticalSectionRawMutex, Bms>,
    can: &'static Mutex<CriticalSectionRawMutex, CanController<'static>>,
) {
    let mut ticker = Ticker::every(Duration::from_millis(100));
    loop {
        ticker.next().await;

        let snapshot = bms.lock().await.world().telemetry;
        let mut can_data = can.lock().await;
        if let Err(e) = can_operation(&snapshot, &mut can_data).await {
            error!("Telemetry not sent: {}", e);
        }
        drop(can_data);
    }
}
