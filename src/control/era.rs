//! Extended Register Access (ERA): the ASIC's 16-bit addressed memory, reached
//! through the ERA_VALUE / ERA_ADDR / ERA_CONTROL window.
//!
//! The data feed is suspended around every access; the ASIC otherwise keeps
//! producing packets while the host is polling ERA_CONTROL.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::defs::*;
use crate::transport::Transport;
use crate::{Error, Pinnacle};

/// Polls of ERA_CONTROL before giving up on an access.
pub(crate) const ERA_POLL_LIMIT: usize = 1000;
const ERA_POLL_INTERVAL_US: u32 = 10;

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
  D: DelayNs,
{
  pub(crate) fn era_read(&mut self, addr: u16) -> Result<u8, Error<T::Error>> {
    self.with_feed_suspended(|dev| {
      dev.era_address(addr)?;
      dev.write_reg(Reg::EraControl, ERA_READ)?;
      dev.era_wait()?;
      let value = dev.read_reg(Reg::EraValue)?;
      dev.clear_status_flags()?;
      Ok(value)
    })
  }

  /// Sequential read starting at `addr`; the ASIC advances the address.
  pub(crate) fn era_read_bytes(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), Error<T::Error>> {
    self.with_feed_suspended(|dev| {
      dev.era_address(addr)?;
      for byte in buf.iter_mut() {
        dev.write_reg(Reg::EraControl, ERA_READ_AUTO_INC)?;
        dev.era_wait()?;
        *byte = dev.read_reg(Reg::EraValue)?;
        dev.clear_status_flags()?;
      }
      Ok(())
    })
  }

  pub(crate) fn era_write(&mut self, addr: u16, value: u8) -> Result<(), Error<T::Error>> {
    self.with_feed_suspended(|dev| {
      dev.write_reg(Reg::EraValue, value)?;
      dev.era_address(addr)?;
      dev.write_reg(Reg::EraControl, ERA_WRITE)?;
      dev.era_wait()?;
      dev.clear_status_flags()
    })
  }

  /// Write `value` to `count` consecutive locations starting at `addr`.
  pub(crate) fn era_write_repeat(&mut self, addr: u16, value: u8, count: usize) -> Result<(), Error<T::Error>> {
    self.with_feed_suspended(|dev| {
      dev.write_reg(Reg::EraValue, value)?;
      dev.era_address(addr)?;
      dev.write_reg(Reg::EraControl, ERA_WRITE_AUTO_INC)?;
      for _ in 0..count {
        dev.era_wait()?;
        dev.clear_status_flags()?;
      }
      Ok(())
    })
  }

  pub(crate) fn era_modify<F: FnOnce(u8) -> u8>(&mut self, addr: u16, f: F) -> Result<(), Error<T::Error>> {
    self.with_feed_suspended(|dev| {
      let value = dev.era_read(addr)?;
      dev.era_write(addr, f(value))
    })
  }

  /// Run `f` with the data feed off, restoring it afterwards even if `f` fails.
  pub(crate) fn with_feed_suspended<R, F>(&mut self, f: F) -> Result<R, Error<T::Error>>
  where
    F: FnOnce(&mut Self) -> Result<R, Error<T::Error>>,
  {
    let suspended = self.is_feed_enabled()?;
    if suspended {
      self.feed_enabled(false)?;
    }
    let result = f(self);
    if suspended {
      self.feed_enabled(true)?;
    }
    result
  }

  fn era_address(&mut self, addr: u16) -> Result<(), Error<T::Error>> {
    Ok(self.transport.write_block(Reg::EraAddr.into(), &addr.to_be_bytes())?)
  }

  fn era_wait(&mut self) -> Result<(), Error<T::Error>> {
    for _ in 0..ERA_POLL_LIMIT {
      if self.read_reg(Reg::EraControl)? == 0 {
        return Ok(());
      }
      self.delay.delay_us(ERA_POLL_INTERVAL_US);
    }
    warn!("ERA access did not complete");
    Err(Error::Timeout)
  }
}
