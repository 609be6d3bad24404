//! Host-side stand-ins for the isoSPI chain and the board.
//!
//! Both fakes hand out cheap clones sharing one state, so a test can keep a
//! handle while the driver or state machine owns the other.

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use crate::config::{NUM_CELLS_PER_SEGMENT, NUM_SEGMENTS};
use crate::io::{Airs, Charger, Clock, PrechargeRelay, TractiveSystem};
use crate::ltc_management::pec15::{pec15, pec15_bytes};
use crate::ltc_management::registers::*;
use crate::ltc_management::{IsoSpi, LtcError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFault {
    /// The n-th (1 based) transmission of this command fails.
    Command(u16, usize),
    /// The data following this command fails.
    Payload(u16),
}

struct ChainState {
    cs_high: bool,
    open: Option<Vec<u8>>,
    current_cmd: Option<u16>,
    transactions: Vec<Vec<u8>>,
    commands: Vec<u16>,
    faults: Vec<ChainFault>,
    poll_status: Vec<u8>,
    cells: [[u16; NUM_CELLS_PER_SEGMENT]; NUM_SEGMENTS],
    die_temperature_codes: [u16; NUM_SEGMENTS],
    corrupt_segments: Vec<usize>,
    config_a: [[u8; REG_GROUP_DATA_SIZE]; NUM_SEGMENTS],
    config_b: [[u8; REG_GROUP_DATA_SIZE]; NUM_SEGMENTS],
}

/// Simulated daisy chain of LTC6813s. Commands and register writes are checked
/// for a valid PEC the way a real chip would.
#[derive(Clone)]
pub struct FakeChain {
    state: Rc<RefCell<ChainState>>,
}

impl FakeChain {
    pub const DEFAULT_CELL_CODE: u16 = 41_667;
    pub const DEFAULT_DIE_TEMPERATURE_CODE: u16 = 22_876;

    pub fn new() -> Self {
        FakeChain {
            state: Rc::new(RefCell::new(ChainState {
                cs_high: true,
                open: None,
                current_cmd: None,
                transactions: Vec::new(),
                commands: Vec::new(),
                faults: Vec::new(),
                poll_status: Vec::new(),
                cells: [[Self::DEFAULT_CELL_CODE; NUM_CELLS_PER_SEGMENT]; NUM_SEGMENTS],
                die_temperature_codes: [Self::DEFAULT_DIE_TEMPERATURE_CODE; NUM_SEGMENTS],
                corrupt_segments: Vec::new(),
                config_a: [[0; REG_GROUP_DATA_SIZE]; NUM_SEGMENTS],
                config_b: [[0; REG_GROUP_DATA_SIZE]; NUM_SEGMENTS],
            })),
        }
    }

    /// Status bytes answered to PLADC, in order. Once drained every poll reports
    /// the conversion as done.
    pub fn queue_poll_status(&mut self, status: &[u8]) {
        self.state.borrow_mut().poll_status.extend_from_slice(status);
    }

    pub fn fail_on(&mut self, fault: ChainFault) {
        self.state.borrow_mut().faults.push(fault);
    }

    pub fn set_cell(&mut self, segment: usize, index: usize, code: u16) {
        self.state.borrow_mut().cells[segment][index] = code;
    }

    pub fn set_die_temperature_code(&mut self, segment: usize, code: u16) {
        self.state.borrow_mut().die_temperature_codes[segment] = code;
    }

    pub fn corrupt_pec_of_segment(&mut self, segment: usize) {
        self.state.borrow_mut().corrupt_segments.push(segment);
    }

    /// Bytes written during each completed chip select window.
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        self.state.borrow().transactions.clone()
    }

    pub fn cs_released(&self) -> bool {
        self.state.borrow().cs_high
    }

    /// Every command put on the bus, including the ones that failed.
    pub fn command_log(&self) -> Vec<u16> {
        self.state.borrow().commands.clone()
    }

    pub fn commands_sent(&self, cmd: u16) -> usize {
        self.state.borrow().commands.iter().filter(|&&c| c == cmd).count()
    }

    /// CFGRA as last latched by `segment`.
    pub fn config_a(&self, segment: usize) -> [u8; REG_GROUP_DATA_SIZE] {
        self.state.borrow().config_a[segment]
    }

    pub fn config_b(&self, segment: usize) -> [u8; REG_GROUP_DATA_SIZE] {
        self.state.borrow().config_b[segment]
    }

    /// DCC bits latched by `segment`, bit n set when cell n discharges.
    pub fn discharge_bits(&self, segment: usize) -> u16 {
        let a = self.config_a(segment);
        let b = self.config_b(segment);
        (a[4] as u16) | (((a[5] & 0x0F) as u16) << 8) | (((b[0] & 0xF0) as u16) << 8)
    }
}

impl ChainState {
    fn receive_command(&mut self, data: &[u8]) -> Result<(), LtcError> {
        assert_eq!(data.len(), CMD_SIZE, "command frame must be {CMD_SIZE} bytes");
        assert_eq!(data[2..], pec15_bytes(&data[..2]), "bad command PEC");

        let cmd = u16::from_be_bytes([data[0], data[1]]);
        self.commands.push(cmd);
        self.current_cmd = Some(cmd);

        let sent = self.commands.iter().filter(|&&c| c == cmd).count();
        if self.faults.contains(&ChainFault::Command(cmd, sent)) {
            return Err(LtcError::Bus);
        }
        Ok(())
    }

    fn receive_payload(&mut self, data: &[u8]) -> Result<(), LtcError> {
        let cmd = self.current_cmd.unwrap_or(0);
        if self.faults.contains(&ChainFault::Payload(cmd)) {
            return Err(LtcError::Bus);
        }

        let target = match cmd {
            WRCFGA => &mut self.config_a,
            WRCFGB => &mut self.config_b,
            _ => panic!("unexpected payload after command {cmd:#06x}"),
        };
        assert_eq!(data.len(), REG_GROUP_SIZE * NUM_SEGMENTS);

        // the first group shifted in ends up in the chip furthest down the chain
        for (slot, group) in data.chunks_exact(REG_GROUP_SIZE).enumerate() {
            let (payload, pec) = group.split_at(REG_GROUP_DATA_SIZE);
            assert_eq!(pec, pec15_bytes(payload), "bad register PEC in slot {slot}");
            target[NUM_SEGMENTS - 1 - slot].copy_from_slice(payload);
        }
        Ok(())
    }

    fn register_group(&self, cmd: u16, segment: usize) -> [u8; REG_GROUP_DATA_SIZE] {
        let mut data = [0u8; REG_GROUP_DATA_SIZE];

        if let Some(group) = RDCV.iter().position(|&c| c == cmd) {
            for i in 0..3 {
                let cell = group * 3 + i;
                let code = self.cells[segment].get(cell).copied().unwrap_or(0xFFFF);
                data[2 * i..2 * i + 2].copy_from_slice(&code.to_le_bytes());
            }
        } else if cmd == RDSTATA {
            data[2..4].copy_from_slice(&self.die_temperature_codes[segment].to_le_bytes());
        } else {
            panic!("unexpected read after command {cmd:#06x}");
        }

        data
    }

    fn respond(&mut self, buffer: &mut [u8]) {
        let cmd = self.current_cmd.unwrap_or(0);

        if cmd == PLADC {
            let status = if self.poll_status.is_empty() {
                0x00
            } else {
                self.poll_status.remove(0)
            };
            buffer.fill(status);
            return;
        }

        assert_eq!(buffer.len(), REG_GROUP_SIZE * NUM_SEGMENTS);
        for (segment, chunk) in buffer.chunks_exact_mut(REG_GROUP_SIZE).enumerate() {
            let data = self.register_group(cmd, segment);
            let mut pec = pec15(&data);
            if self.corrupt_segments.contains(&segment) {
                pec ^= 0x0002;
            }
            chunk[..REG_GROUP_DATA_SIZE].copy_from_slice(&data);
            chunk[REG_GROUP_DATA_SIZE..].copy_from_slice(&pec.to_be_bytes());
        }
    }
}

impl IsoSpi for FakeChain {
    fn set_cs_low(&mut self) -> Result<(), LtcError> {
        let mut state = self.state.borrow_mut();
        assert!(state.cs_high, "chip select asserted twice");
        state.cs_high = false;
        state.open = Some(Vec::new());
        state.current_cmd = None;
        Ok(())
    }

    fn set_cs_high(&mut self) -> Result<(), LtcError> {
        let mut state = self.state.borrow_mut();
        state.cs_high = true;
        if let Some(transaction) = state.open.take() {
            state.transactions.push(transaction);
        }
        Ok(())
    }

    async fn write_without_cs_toggle(&mut self, data: &[u8]) -> Result<(), LtcError> {
        let mut state = self.state.borrow_mut();
        assert!(!state.cs_high, "write outside a chip select window");

        let first = state.open.as_ref().is_some_and(|t| t.is_empty());
        if let Some(transaction) = state.open.as_mut() {
            transaction.extend_from_slice(data);
        }

        if first {
            state.receive_command(data)
        } else {
            state.receive_payload(data)
        }
    }

    async fn read_without_cs_toggle(&mut self, buffer: &mut [u8]) -> Result<(), LtcError> {
        let mut state = self.state.borrow_mut();
        assert!(!state.cs_high, "read outside a chip select window");
        state.respond(buffer);
        Ok(())
    }
}

struct BoardState {
    now_ms: u64,
    air_negative_closed: bool,
    air_positive_closed: bool,
    air_positive_closures: usize,
    precharge_enabled: bool,
    charger_connected: bool,
    ts_voltage: f32,
}

/// Board with every input settable from the test.
#[derive(Clone)]
pub struct FakeBoard {
    state: Rc<RefCell<BoardState>>,
}

impl FakeBoard {
    pub fn new() -> Self {
        FakeBoard {
            state: Rc::new(RefCell::new(BoardState {
                now_ms: 0,
                air_negative_closed: false,
                air_positive_closed: false,
                air_positive_closures: 0,
                precharge_enabled: false,
                charger_connected: false,
                ts_voltage: 0.0,
            })),
        }
    }

    pub fn set_time_ms(&mut self, now_ms: u64) {
        self.state.borrow_mut().now_ms = now_ms;
    }

    pub fn set_air_negative_closed(&mut self, closed: bool) {
        self.state.borrow_mut().air_negative_closed = closed;
    }

    pub fn set_charger_connected(&mut self, connected: bool) {
        self.state.borrow_mut().charger_connected = connected;
    }

    pub fn set_ts_voltage(&mut self, volts: f32) {
        self.state.borrow_mut().ts_voltage = volts;
    }

    pub fn air_positive_closed(&self) -> bool {
        self.state.borrow().air_positive_closed
    }

    /// Number of times AIR+ was commanded closed.
    pub fn air_positive_closures(&self) -> usize {
        self.state.borrow().air_positive_closures
    }

    pub fn precharge_enabled(&self) -> bool {
        self.state.borrow().precharge_enabled
    }
}

impl Clock for FakeBoard {
    fn now_ms(&self) -> u64 {
        self.state.borrow().now_ms
    }
}

impl Airs for FakeBoard {
    fn is_air_negative_closed(&mut self) -> bool {
        self.state.borrow().air_negative_closed
    }

    fn close_air_positive(&mut self) {
        let mut state = self.state.borrow_mut();
        state.air_positive_closed = true;
        state.air_positive_closures += 1;
    }

    fn open_air_positive(&mut self) {
        self.state.borrow_mut().air_positive_closed = false;
    }

    fn is_air_positive_closed(&self) -> bool {
        self.state.borrow().air_positive_closed
    }
}

impl PrechargeRelay for FakeBoard {
    fn enable_precharge(&mut self) {
        self.state.borrow_mut().precharge_enabled = true;
    }

    fn disable_precharge(&mut self) {
        self.state.borrow_mut().precharge_enabled = false;
    }
}

impl Charger for FakeBoard {
    fn is_charger_connected(&mut self) -> bool {
        self.state.borrow().charger_connected
    }
}

impl TractiveSystem for FakeBoard {
    fn ts_voltage(&mut self) -> f32 {
        self.state.borrow().ts_voltage
    }
}
