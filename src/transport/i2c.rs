use embedded_hal::i2c::{I2c, SevenBitAddress};

use super::{Transport, TransportError, MAX_FRAME};
use crate::defs::{I2C_ADDR, RAP_READ, RAP_WRITE};

/// RAP over I²C.
///
/// Reads are split into an address write terminated by STOP and a separate
/// read, which is the sequence the ASIC acknowledges reliably.
pub struct I2cTransport<I2C> {
  i2c: I2C,
  address: SevenBitAddress,
}

impl<I2C: I2c<SevenBitAddress>> I2cTransport<I2C> {
  /// Use the ASIC's fixed address (`0x2A`).
  pub fn new(i2c: I2C) -> Self {
    Self::with_address(i2c, I2C_ADDR)
  }

  /// Use a non-default 7-bit address.
  pub fn with_address(i2c: I2C, address: SevenBitAddress) -> Self {
    Self { i2c, address }
  }

  pub fn address(&self) -> SevenBitAddress {
    self.address
  }

  /// Give back the wrapped bus.
  pub fn release(self) -> I2C {
    self.i2c
  }
}

impl<I2C: I2c<SevenBitAddress>> Transport for I2cTransport<I2C> {
  type Error = I2C::Error;

  fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError<Self::Error>> {
    self.i2c.write(self.address, &[RAP_WRITE | reg, value]).map_err(TransportError::BusFault)
  }

  // Every data byte is preceded by its own write command, all in one transfer.
  fn write_block(&mut self, reg: u8, values: &[u8]) -> Result<(), TransportError<Self::Error>> {
    let len = values.len() * 2;
    if len > MAX_FRAME {
      return Err(TransportError::BufferOverflow);
    }

    let mut frame = [0u8; MAX_FRAME];
    for (i, value) in values.iter().enumerate() {
      frame[i * 2] = RAP_WRITE | reg.wrapping_add(i as u8);
      frame[i * 2 + 1] = *value;
    }
    self.i2c.write(self.address, &frame[..len]).map_err(TransportError::BusFault)
  }

  fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError<Self::Error>> {
    if buf.len() > MAX_FRAME {
      return Err(TransportError::BufferOverflow);
    }
    self.i2c.write(self.address, &[RAP_READ | reg]).map_err(TransportError::BusFault)?;
    self.i2c.read(self.address, buf).map_err(TransportError::BusFault)
  }

  fn write_command(&mut self, sequence: &[u8]) -> Result<(), TransportError<Self::Error>> {
    self.i2c.write(self.address, sequence).map_err(TransportError::BusFault)
  }
}
