use core::convert::Infallible;

use embedded_hal::digital::{Error as _, ErrorType, InputPin};
use embedded_hal_async::digital::Wait;

use crate::defs::{Reg, Status};
use crate::transport::Transport;
use crate::{Error, Pinnacle};

/// STATUS polling interval while awaiting data in software mode.
const SOFTWARE_POLL_US: u32 = 100;

/// How the driver learns that a report or measurement is waiting.
///
/// Checking readiness never consumes it. Only the read and measure
/// operations clear the ASIC's flags.
#[derive(Debug)]
pub enum DataReady<P> {
  /// Sample the ASIC's DR output on a GPIO input (active high).
  Pin(P),
  /// Poll the SW_DR / SW_CC flags in the STATUS register.
  Software,
}

impl<P> DataReady<P> {
  pub const fn is_pin(&self) -> bool {
    matches!(self, DataReady::Pin(_))
  }
}

impl DataReady<NoPin> {
  /// Software polling without naming a pin type.
  pub const fn software() -> Self {
    DataReady::Software
  }
}

/// Placeholder pin type for drivers that only use [`DataReady::Software`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
  type Error = Infallible;
}

impl InputPin for NoPin {
  fn is_high(&mut self) -> Result<bool, Self::Error> {
    Ok(false)
  }

  fn is_low(&mut self) -> Result<bool, Self::Error> {
    Ok(true)
  }
}

impl Wait for NoPin {
  async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }

  async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
    core::future::pending().await
  }
}

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
{
  /// Returns `true` when a report (or AnyMeas result) is waiting to be read.
  ///
  /// Non-blocking and side-effect free: calling it repeatedly yields the same
  /// answer until [`Pinnacle::read`] or a measurement consumes the data.
  pub fn available(&mut self) -> Result<bool, Error<T::Error>> {
    match &mut self.data_ready {
      DataReady::Pin(pin) => pin.is_high().map_err(|e| Error::Pin(e.kind())),
      DataReady::Software => {
        let status = Status::from_bits(self.transport.read_register(Reg::Status.into())?);
        Ok(status.is_set())
      }
    }
  }

  /// Whether readiness is taken from a GPIO rather than the STATUS register.
  pub fn uses_data_ready_pin(&self) -> bool {
    self.data_ready.is_pin()
  }

  /// Swap the readiness source.
  ///
  /// This does not touch the ASIC's data feed. AnyMeas mode needs the DR pin,
  /// so selecting [`DataReady::Software`] there is rejected.
  pub fn set_data_ready(&mut self, data_ready: DataReady<DR>) -> Result<DataReady<DR>, Error<T::Error>> {
    if !data_ready.is_pin() && self.mode == crate::DataMode::AnyMeas {
      return Err(Error::InvalidArgument);
    }
    Ok(core::mem::replace(&mut self.data_ready, data_ready))
  }
}

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin + Wait,
  D: embedded_hal_async::delay::DelayNs,
{
  /// Suspend until [`Pinnacle::available`] would return `true`.
  ///
  /// With a DR pin this awaits the high level; in software mode it polls
  /// STATUS every 100 µs. There is no built-in bound: drop the future (or race
  /// it against a timer) to give up.
  pub async fn wait_for_data_ready(&mut self) -> Result<(), Error<T::Error>> {
    if let DataReady::Pin(pin) = &mut self.data_ready {
      return pin.wait_for_high().await.map_err(|e| Error::Pin(e.kind()));
    }
    while !self.available()? {
      embedded_hal_async::delay::DelayNs::delay_us(&mut self.delay, SOFTWARE_POLL_US).await;
    }
    Ok(())
  }
}
