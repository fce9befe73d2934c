//! Byte-level access to the Pinnacle's Register Access Protocol (RAP).
//!
//! The ASIC speaks the same register protocol over both buses; only the framing
//! differs. [`Transport`] hides that framing so the rest of the driver works with
//! plain register addresses. Two implementations ship with the crate:
//! [`SpiTransport`] and [`I2cTransport`].

use core::fmt::Debug;

mod i2c;
mod spi;

pub use i2c::*;
pub use spi::*;

/// Largest frame either transport assembles on the stack.
pub(crate) const MAX_FRAME: usize = 32;

/// Failure while exchanging bytes with the ASIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError<E> {
  /// The underlying bus reported an error (NACK, timeout, contention...).
  BusFault(E),
  /// The request does not fit in a single transport frame.
  BufferOverflow,
}

/// Register-level access to the ASIC.
///
/// Multi-byte reads rely on the ASIC's address auto-increment. Nothing here
/// retries; a failed exchange is reported once and left to the caller.
pub trait Transport {
  /// Error type of the underlying bus.
  type Error: Debug;

  /// Write a single register.
  fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError<Self::Error>>;

  /// Write consecutive registers starting at `reg`.
  fn write_block(&mut self, reg: u8, values: &[u8]) -> Result<(), TransportError<Self::Error>> {
    for (i, value) in values.iter().enumerate() {
      self.write_register(reg.wrapping_add(i as u8), *value)?;
    }
    Ok(())
  }

  /// Read a single register.
  fn read_register(&mut self, reg: u8) -> Result<u8, TransportError<Self::Error>> {
    let mut buf = [0u8; 1];
    self.read_block(reg, &mut buf)?;
    Ok(buf[0])
  }

  /// Fill `buf` with consecutive registers starting at `reg`.
  fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError<Self::Error>>;

  /// Send a raw byte sequence without RAP framing (PS/2 style commands).
  fn write_command(&mut self, sequence: &[u8]) -> Result<(), TransportError<Self::Error>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
  type Error = T::Error;

  fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError<Self::Error>> {
    T::write_register(self, reg, value)
  }

  fn write_block(&mut self, reg: u8, values: &[u8]) -> Result<(), TransportError<Self::Error>> {
    T::write_block(self, reg, values)
  }

  fn read_register(&mut self, reg: u8) -> Result<u8, TransportError<Self::Error>> {
    T::read_register(self, reg)
  }

  fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError<Self::Error>> {
    T::read_block(self, reg, buf)
  }

  fn write_command(&mut self, sequence: &[u8]) -> Result<(), TransportError<Self::Error>> {
    T::write_command(self, sequence)
  }
}
