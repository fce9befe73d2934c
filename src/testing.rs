//! In-memory Pinnacle used by the driver tests.
//!
//! The fake keeps a 256-byte register file and the 64 KiB ERA memory behind a
//! shared handle, so a test can poke registers while the driver owns the
//! transport, pin and delay. Time only advances through [`FakeDelay`].

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::defs::*;
use crate::transport::{Transport, TransportError};
use crate::{DataReady, NoPin, Pinnacle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError;

pub type FakeDriver<P = NoPin> = Pinnacle<FakeTransport, P, FakeDelay>;

const STATUS_CC: u8 = 0x08;
const SYS_ANYMEAS_START: u8 = 0x10;
const WAIT_LIMIT: usize = 1_000_000;

struct State {
  regs: [u8; 256],
  era: Vec<u8>,
  writes: Vec<(u8, u8)>,
  commands: Vec<Vec<u8>>,
  command_reply: Vec<u8>,
  now_ns: u64,
  adc_result: i16,
  anymeas_latency_ns: u64,
  anymeas_completes: bool,
  calibration_completes: bool,
  pending_adc: Option<u64>,
  pending_ready: Option<(u64, u8)>,
  era_stall: bool,
  fail_reads: bool,
  fail_pin: bool,
}

impl State {
  fn new() -> Self {
    let mut regs = [0u8; 256];
    regs[Reg::FirmwareId as usize] = FIRMWARE_ID;
    regs[Reg::FirmwareVersion as usize] = FIRMWARE_VERSION;
    Self {
      regs,
      era: vec![0; 0x1_0000],
      writes: Vec::new(),
      commands: Vec::new(),
      command_reply: Vec::new(),
      now_ns: 0,
      adc_result: 0,
      anymeas_latency_ns: 0,
      anymeas_completes: true,
      calibration_completes: true,
      pending_adc: None,
      pending_ready: None,
      era_stall: false,
      fail_reads: false,
      fail_pin: false,
    }
  }

  fn reg(&mut self, reg: Reg) -> &mut u8 {
    &mut self.regs[reg as usize]
  }

  fn write(&mut self, reg: u8, value: u8) {
    self.writes.push((reg, value));
    self.regs[reg as usize] = value;

    if reg == Reg::EraControl as u8 && value != 0 && !self.era_stall {
      self.era_access(value);
    } else if reg == Reg::CalConfig as u8 && value & 0x01 != 0 {
      // the ASIC drops the request bit once calibration starts
      *self.reg(Reg::CalConfig) = value & !0x01;
      if self.calibration_completes {
        *self.reg(Reg::Status) |= STATUS_CC;
      }
    } else if reg == Reg::SysConfig as u8 && value & SYS_ANYMEAS_START != 0 && self.anymeas_completes {
      self.pending_adc = Some(self.now_ns + self.anymeas_latency_ns);
      self.fire_events();
    }
  }

  fn era_access(&mut self, control: u8) {
    let addr_reg = Reg::EraAddr as usize;
    let addr = u16::from_be_bytes([self.regs[addr_reg], self.regs[addr_reg + 1]]);
    let value = self.regs[Reg::EraValue as usize];
    let next = match control {
      ERA_READ => {
        self.regs[Reg::EraValue as usize] = self.era[addr as usize];
        addr
      }
      ERA_READ_AUTO_INC => {
        self.regs[Reg::EraValue as usize] = self.era[addr as usize];
        addr.wrapping_add(1)
      }
      ERA_WRITE => {
        self.era[addr as usize] = value;
        addr
      }
      // only ever used to fill a two-byte slot
      ERA_WRITE_AUTO_INC => {
        self.era[addr as usize] = value;
        self.era[addr.wrapping_add(1) as usize] = value;
        addr.wrapping_add(2)
      }
      other => panic!("unexpected ERA control {:#x}", other),
    };
    let [hi, lo] = next.to_be_bytes();
    self.regs[addr_reg] = hi;
    self.regs[addr_reg + 1] = lo;
    *self.reg(Reg::EraControl) = 0;
    *self.reg(Reg::Status) |= STATUS_CC;
  }

  fn advance(&mut self, ns: u64) {
    self.now_ns += ns;
    self.fire_events();
  }

  fn fire_events(&mut self) {
    if let Some(due) = self.pending_adc {
      if self.now_ns >= due {
        self.pending_adc = None;
        let [hi, lo] = self.adc_result.to_be_bytes();
        self.regs[Reg::AdcResult as usize] = hi;
        self.regs[Reg::AdcResult as usize + 1] = lo;
        *self.reg(Reg::Status) |= STATUS_CC;
      }
    }
    if let Some((due, flags)) = self.pending_ready {
      if self.now_ns >= due {
        self.pending_ready = None;
        *self.reg(Reg::Status) |= flags;
      }
    }
  }

  fn data_ready(&self) -> bool {
    Status::from_bits(self.regs[Reg::Status as usize]).is_set()
  }
}

pub struct FakeTransport(Rc<RefCell<State>>);

impl Transport for FakeTransport {
  type Error = BusError;

  fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError<Self::Error>> {
    self.0.borrow_mut().write(reg, value);
    Ok(())
  }

  fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError<Self::Error>> {
    let state = self.0.borrow();
    if state.fail_reads {
      return Err(TransportError::BusFault(BusError));
    }
    for (i, byte) in buf.iter_mut().enumerate() {
      *byte = state.regs[reg.wrapping_add(i as u8) as usize];
    }
    Ok(())
  }

  fn write_command(&mut self, sequence: &[u8]) -> Result<(), TransportError<Self::Error>> {
    let mut state = self.0.borrow_mut();
    state.commands.push(sequence.to_vec());
    let reply = state.command_reply.clone();
    for (i, byte) in reply.into_iter().enumerate() {
      state.regs[INTELLIMOUSE_REPLY as usize + i] = byte;
    }
    Ok(())
  }
}

/// DR pin wired to the fake's STATUS flags.
pub struct FakePin(Rc<RefCell<State>>);

impl ErrorType for FakePin {
  type Error = ErrorKind;
}

impl InputPin for FakePin {
  fn is_high(&mut self) -> Result<bool, Self::Error> {
    let state = self.0.borrow();
    if state.fail_pin {
      return Err(ErrorKind::Other);
    }
    Ok(state.data_ready())
  }

  fn is_low(&mut self) -> Result<bool, Self::Error> {
    self.is_high().map(|high| !high)
  }
}

impl FakePin {
  // Simulated time moves on while the pin is awaited.
  fn wait_for_level(&mut self, high: bool) -> Result<(), ErrorKind> {
    for _ in 0..WAIT_LIMIT {
      if self.is_high()? == high {
        return Ok(());
      }
      self.0.borrow_mut().advance(1_000);
    }
    panic!("data-ready never reached the awaited level");
  }
}

impl embedded_hal_async::digital::Wait for FakePin {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    self.wait_for_level(true)
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    self.wait_for_level(false)
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    self.wait_for_level(false)?;
    self.wait_for_level(true)
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    self.wait_for_level(true)?;
    self.wait_for_level(false)
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    let level = self.is_high()?;
    self.wait_for_level(!level)
  }
}

pub struct FakeDelay(Rc<RefCell<State>>);

impl embedded_hal::delay::DelayNs for FakeDelay {
  fn delay_ns(&mut self, ns: u32) {
    self.0.borrow_mut().advance(ns as u64);
  }

  fn delay_us(&mut self, us: u32) {
    self.0.borrow_mut().advance(us as u64 * 1_000);
  }

  fn delay_ms(&mut self, ms: u32) {
    self.0.borrow_mut().advance(ms as u64 * 1_000_000);
  }
}

impl embedded_hal_async::delay::DelayNs for FakeDelay {
  async fn delay_ns(&mut self, ns: u32) {
    self.0.borrow_mut().advance(ns as u64);
  }
}

/// Test-side handle onto the fake's registers, memory and clock.
#[derive(Clone)]
pub struct FakeRegs(Rc<RefCell<State>>);

impl FakeRegs {
  pub fn get(&self, reg: Reg) -> u8 {
    self.0.borrow().regs[reg as usize]
  }

  pub fn set(&self, reg: Reg, value: u8) {
    self.0.borrow_mut().regs[reg as usize] = value;
  }

  /// Fill consecutive registers starting at `reg` without logging writes.
  pub fn load(&self, reg: Reg, values: &[u8]) {
    let start = reg as usize;
    self.0.borrow_mut().regs[start..start + values.len()].copy_from_slice(values);
  }

  pub fn range(&self, start: u8, len: usize) -> Vec<u8> {
    let start = start as usize;
    self.0.borrow().regs[start..start + len].to_vec()
  }

  pub fn snapshot(&self) -> Vec<u8> {
    self.0.borrow().regs.to_vec()
  }

  pub fn era(&self, addr: u16) -> u8 {
    self.0.borrow().era[addr as usize]
  }

  pub fn set_era(&self, addr: u16, value: u8) {
    self.0.borrow_mut().era[addr as usize] = value;
  }

  pub fn set_identity(&self, id: u8, version: u8) {
    self.set(Reg::FirmwareId, id);
    self.set(Reg::FirmwareVersion, version);
  }

  /// Bytes the ASIC returns at 0xF2 after a PS/2 command sequence.
  pub fn set_command_reply(&self, reply: &[u8]) {
    self.0.borrow_mut().command_reply = reply.to_vec();
  }

  pub fn set_adc_result(&self, value: i16) {
    let mut state = self.0.borrow_mut();
    state.adc_result = value;
    let [hi, lo] = value.to_be_bytes();
    state.regs[Reg::AdcResult as usize] = hi;
    state.regs[Reg::AdcResult as usize + 1] = lo;
  }

  pub fn set_anymeas_latency_us(&self, us: u64) {
    self.0.borrow_mut().anymeas_latency_ns = us * 1_000;
  }

  pub fn anymeas_completes(&self, completes: bool) {
    self.0.borrow_mut().anymeas_completes = completes;
  }

  pub fn calibration_completes(&self, completes: bool) {
    self.0.borrow_mut().calibration_completes = completes;
  }

  /// Raise STATUS `flags` once the simulated clock has advanced by `us`.
  pub fn raise_after_us(&self, us: u64, flags: u8) {
    let mut state = self.0.borrow_mut();
    let due = state.now_ns + us * 1_000;
    state.pending_ready = Some((due, flags));
  }

  /// Leave ERA_CONTROL non-zero forever, as a wedged ASIC would.
  pub fn stall_era(&self, stall: bool) {
    self.0.borrow_mut().era_stall = stall;
  }

  pub fn fail_reads(&self, fail: bool) {
    self.0.borrow_mut().fail_reads = fail;
  }

  pub fn fail_pin(&self, fail: bool) {
    self.0.borrow_mut().fail_pin = fail;
  }

  pub fn writes(&self) -> Vec<(u8, u8)> {
    self.0.borrow().writes.clone()
  }

  pub fn write_count(&self) -> usize {
    self.0.borrow().writes.len()
  }

  pub fn commands(&self) -> Vec<Vec<u8>> {
    self.0.borrow().commands.clone()
  }

  pub fn clear_log(&self) {
    let mut state = self.0.borrow_mut();
    state.writes.clear();
    state.commands.clear();
  }

  pub fn elapsed_us(&self) -> u64 {
    self.0.borrow().now_ns / 1_000
  }

  pub fn reset_clock(&self) {
    let mut state = self.0.borrow_mut();
    state.now_ns = 0;
    state.pending_adc = None;
    state.pending_ready = None;
  }
}

/// Driver polling STATUS for data-ready.
pub fn fake_driver() -> (FakeDriver, FakeRegs) {
  let state = Rc::new(RefCell::new(State::new()));
  let dev = Pinnacle::new(FakeTransport(state.clone()), DataReady::Software, FakeDelay(state.clone()));
  (dev, FakeRegs(state))
}

/// Driver with a DR pin, required for AnyMeas.
pub fn fake_driver_with_pin() -> (FakeDriver<FakePin>, FakeRegs) {
  let state = Rc::new(RefCell::new(State::new()));
  let pin = FakePin(state.clone());
  let dev = Pinnacle::new(FakeTransport(state.clone()), DataReady::Pin(pin), FakeDelay(state.clone()));
  (dev, FakeRegs(state))
}
