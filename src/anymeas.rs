//! AnyMeas: raw ADC measurements of caller-selected sense-line vectors.
//!
//! Each 32-bit mask maps bits 0..15 to the X electrodes, bits 16..27 to the Y
//! electrodes and bits 28..29 to the two internal reference capacitors. The
//! `toggle` mask picks which lines are driven and `polarity` picks the
//! direction each one is driven in.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::defs::{Reg, ANYMEAS_TRIGGER};
use crate::transport::Transport;
use crate::{DataMode, Error, Pinnacle};

const MEASURE_POLL_US: u32 = 10;

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
  D: DelayNs,
{
  /// Take one measurement, blocking until it completes or the measure timeout
  /// (see [`Pinnacle::set_measure_timeout_us`]) expires.
  ///
  /// On [`Error::Timeout`] the measurement stays pending: collect it later with
  /// [`Pinnacle::get_measure_adc`] or drop it with [`Pinnacle::set_mode`].
  pub fn measure_adc(&mut self, toggle: u32, polarity: u32) -> Result<i32, Error<T::Error>> {
    self.start_measure_adc(toggle, polarity)?;

    let mut waited = 0;
    while !self.available()? {
      if waited >= self.measure_timeout_us {
        warn!("measurement timed out after {} us", waited);
        return Err(Error::Timeout);
      }
      self.delay.delay_us(MEASURE_POLL_US);
      waited = waited.saturating_add(MEASURE_POLL_US);
    }
    self.get_measure_adc()
  }

  /// Trigger a measurement without waiting for it.
  ///
  /// Only one measurement can be in flight; a second start fails with
  /// [`Error::MeasurementInProgress`] and does not touch the bus.
  pub fn start_measure_adc(&mut self, toggle: u32, polarity: u32) -> Result<(), Error<T::Error>> {
    if self.mode != DataMode::AnyMeas {
      return Err(Error::ModeMismatch);
    }
    if self.measuring {
      return Err(Error::MeasurementInProgress);
    }

    let mut masks = [0u8; 8];
    masks[..4].copy_from_slice(&toggle.to_be_bytes());
    masks[4..].copy_from_slice(&polarity.to_be_bytes());
    self.transport.write_block(Reg::PacketByte1.into(), &masks)?;
    // STATUS <- 0 clears stale flags, SYS_CONFIG <- 0x18 starts the conversion
    self.transport.write_block(Reg::Status.into(), &[0x00, ANYMEAS_TRIGGER])?;
    self.measuring = true;
    trace!("measurement started: toggle {:#x} polarity {:#x}", toggle, polarity);
    Ok(())
  }

  /// Collect the result of the last [`Pinnacle::start_measure_adc`].
  ///
  /// Call once data-ready asserts. The pending state is released even if the
  /// read fails.
  pub fn get_measure_adc(&mut self) -> Result<i32, Error<T::Error>> {
    if self.mode != DataMode::AnyMeas {
      return Err(Error::ModeMismatch);
    }
    self.measuring = false;
    let mut raw = [0u8; 2];
    self.read_and_clear(Reg::AdcResult.into(), &mut raw)?;
    Ok(i16::from_be_bytes(raw) as i32)
  }

  pub fn is_measuring(&self) -> bool {
    self.measuring
  }

  /// Bound for [`Pinnacle::measure_adc`]. Sleep-enabled configurations need
  /// around 300 ms to wake.
  pub fn set_measure_timeout_us(&mut self, timeout_us: u32) {
    self.measure_timeout_us = timeout_us;
  }

  pub fn measure_timeout_us(&self) -> u32 {
    self.measure_timeout_us
  }
}
