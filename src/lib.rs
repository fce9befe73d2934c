#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `no_std` driver for the Cirque Pinnacle 1CA027 capacitive touch ASIC.
//!
//! The Pinnacle powers Cirque's circular and rectangular trackpads. It speaks a
//! small register protocol (RAP) over either SPI or I²C and reports touch data in
//! one of three modes:
//!
//! - **Relative**: mouse-style deltas, button state and an optional scroll wheel
//! - **Absolute**: 12-bit X/Y coordinates plus a Z (proximity) magnitude
//! - **AnyMeas**: raw ADC readings for caller-selected sense-line vectors
//!
//! The driver is built on the `embedded-hal` 1.0 traits so it runs on any MCU
//! family with a HAL. Data-ready can come from the ASIC's DR pin or from polling
//! the STATUS register; see [`DataReady`].
//!
//! ```no_run
//! use embedded_hal::{delay::DelayNs, digital::InputPin, spi::SpiDevice};
//! use cirque_pinnacle::{DataMode, DataReady, Pinnacle, Report};
//!
//! fn example<SPI, DR, D>(spi: SPI, dr: DR, delay: D) -> Result<(), cirque_pinnacle::Error<SPI::Error>>
//! where
//!   SPI: SpiDevice,
//!   DR: InputPin,
//!   D: DelayNs,
//! {
//!   let mut trackpad = Pinnacle::new_spi(spi, DataReady::Pin(dr), delay);
//!   trackpad.begin()?;
//!   trackpad.set_mode(DataMode::Absolute)?;
//!
//!   loop {
//!     if trackpad.available()? {
//!       if let Report::Absolute(report) = trackpad.read()? {
//!         let _ = (report.x, report.y, report.z);
//!       }
//!     }
//!   }
//! }
//! ```
#[macro_use]
mod fmt;

mod anymeas;
mod config;
mod control;
mod data_ready;
mod defs;
mod report;
#[cfg(test)]
mod testing;
pub mod transport;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, InputPin};
use embedded_hal::i2c::{I2c, SevenBitAddress};
use embedded_hal::spi::SpiDevice;

pub use config::*;
pub use control::{DataMode, SAMPLE_RATES};
pub use data_ready::{DataReady, NoPin};
use defs::*;
pub use defs::{CalConfig, CAL_MATRIX_LEN, I2C_ADDR};
pub use report::*;
use transport::{I2cTransport, SpiTransport, Transport, TransportError};

/// Errors that can occur while interacting with the ASIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// Exchanging bytes with the ASIC failed.
  Transport(TransportError<E>),
  /// The firmware identity check during [`Pinnacle::begin`] failed.
  NotResponding,
  /// A parameter was outside the range the ASIC accepts. Nothing was written.
  InvalidArgument,
  /// The operation does not apply to the current [`DataMode`].
  ModeMismatch,
  /// A bounded wait on the ASIC expired.
  Timeout,
  /// An AnyMeas measurement was started and has not been collected yet.
  MeasurementInProgress,
  /// Sampling the data-ready pin failed.
  Pin(ErrorKind),
}

impl<E> From<TransportError<E>> for Error<E> {
  fn from(e: TransportError<E>) -> Self {
    Error::Transport(e)
  }
}

/// Settle time after clearing the STATUS flags.
const CLEAR_SETTLE_US: u32 = 50;
/// Power-on delay before the ASIC answers register reads.
const POWER_UP_MS: u32 = 100;
/// Upper bound on the flag drain performed by [`Pinnacle::begin`].
const BEGIN_DRAIN_LIMIT: usize = 255;
/// Default bound for [`Pinnacle::measure_adc`].
pub const DEFAULT_MEASURE_TIMEOUT_US: u32 = 10_000;

/// Driver for one Pinnacle ASIC.
///
/// The driver owns the transport, the data-ready source and a blocking delay.
/// It starts in [`DataMode::Relative`], matching the ASIC's power-on state, but
/// nothing is configured until [`Pinnacle::begin`] runs.
pub struct Pinnacle<T, DR, D> {
  transport: T,
  data_ready: DataReady<DR>,
  delay: D,
  mode: DataMode,
  intellimouse: bool,
  anymeas: AnyMeasConfig,
  measuring: bool,
  measure_timeout_us: u32,
}

impl<T, DR, D> Pinnacle<T, DR, D> {
  /// Wrap an existing [`Transport`].
  pub fn new(transport: T, data_ready: DataReady<DR>, delay: D) -> Self {
    Self {
      transport,
      data_ready,
      delay,
      mode: DataMode::Relative,
      intellimouse: false,
      anymeas: AnyMeasConfig::new(),
      measuring: false,
      measure_timeout_us: DEFAULT_MEASURE_TIMEOUT_US,
    }
  }

  /// Tear the driver down and hand back its resources.
  pub fn release(self) -> (T, DataReady<DR>, D) {
    (self.transport, self.data_ready, self.delay)
  }
}

impl<SPI: SpiDevice, DR, D> Pinnacle<SpiTransport<SPI>, DR, D> {
  /// Talk to the ASIC over SPI.
  ///
  /// The device must be configured for [`transport::SPI_MODE`]; chip select is
  /// owned by the `SpiDevice`.
  pub fn new_spi(spi: SPI, data_ready: DataReady<DR>, delay: D) -> Self {
    Self::new(SpiTransport::new(spi), data_ready, delay)
  }
}

impl<I2C: I2c<SevenBitAddress>, DR, D> Pinnacle<I2cTransport<I2C>, DR, D> {
  /// Talk to the ASIC over I²C at its fixed address.
  pub fn new_i2c(i2c: I2C, data_ready: DataReady<DR>, delay: D) -> Self {
    Self::new(I2cTransport::new(i2c), data_ready, delay)
  }
}

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
  D: DelayNs,
{
  /// Bring the ASIC up in relative mode.
  ///
  /// This verifies the firmware identity, restores the power-on defaults,
  /// enables finger and stylus detection at 100 Hz and runs a full
  /// calibration. Returns `true` once calibration completed and the data feed
  /// is enabled. `false` means calibration did not finish in time; the ASIC is
  /// configured but its feed stays off.
  pub fn begin(&mut self) -> Result<bool, Error<T::Error>> {
    self.delay.delay_ms(POWER_UP_MS);

    let mut id = [0u8; 2];
    if self.transport.read_block(Reg::FirmwareId.into(), &mut id).is_err() {
      warn!("identity read failed");
      return Err(Error::NotResponding);
    }
    if id[0] != FIRMWARE_ID && id[1] != FIRMWARE_VERSION {
      warn!("unexpected firmware id {:#x} version {:#x}", id[0], id[1]);
      return Err(Error::NotResponding);
    }
    debug!("pinnacle firmware id {:#x} version {:#x}", id[0], id[1]);

    self.mode = DataMode::Relative;
    self.intellimouse = false;
    self.measuring = false;

    // SYS_CONFIG, FEED_CONFIG_1 (feed off), FEED_CONFIG_2 (relative defaults)
    self.transport.write_block(Reg::SysConfig.into(), &[0, 0, 0])?;
    self.detect_finger_stylus(true, true, 100)?;
    self.write_reg(Reg::ZIdle, DEFAULT_Z_IDLE)?;
    self.set_adc_gain(0)?;
    self.tune_edge_sensitivity(0x04, 0x03)?;

    for _ in 0..BEGIN_DRAIN_LIMIT {
      if !self.available()? {
        break;
      }
      self.clear_status_flags()?;
    }

    if self.calibrate(CalConfig::full())? {
      self.feed_enabled(true)?;
      Ok(true)
    } else {
      warn!("calibration did not complete; data feed left disabled");
      Ok(false)
    }
  }

  /// Discard whatever report or measurement is pending.
  ///
  /// Writing STATUS also de-asserts the DR pin; the ASIC needs a short settle
  /// time before the next packet.
  pub fn clear_status_flags(&mut self) -> Result<(), Error<T::Error>> {
    self.write_reg(Reg::Status, 0)?;
    self.delay.delay_us(CLEAR_SETTLE_US);
    Ok(())
  }

  // Register helpers
  pub(crate) fn read_reg(&mut self, reg: Reg) -> Result<u8, Error<T::Error>> {
    Ok(self.transport.read_register(reg.into())?)
  }

  pub(crate) fn write_reg(&mut self, reg: Reg, value: u8) -> Result<(), Error<T::Error>> {
    Ok(self.transport.write_register(reg.into(), value)?)
  }

  pub(crate) fn modify_reg<F: FnOnce(u8) -> u8>(&mut self, reg: Reg, f: F) -> Result<(), Error<T::Error>> {
    let value = self.read_reg(reg)?;
    self.write_reg(reg, f(value))
  }

  /// Block read that always ends with a flag clear; the read error wins.
  pub(crate) fn read_and_clear(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Error<T::Error>> {
    let read = self.transport.read_block(reg, buf);
    let clear = self.clear_status_flags();
    read?;
    clear
  }
}
