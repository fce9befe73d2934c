use embedded_hal::spi::{Mode, SpiDevice, MODE_1};

use super::{Transport, TransportError, MAX_FRAME};
use crate::defs::{RAP_READ, RAP_WRITE, SPI_FILLER};

/// SPI mode the ASIC expects (CPOL = 0, CPHA = 1).
pub const SPI_MODE: Mode = MODE_1;

/// Recommended SPI clock. The ASIC tolerates up to 13 MHz.
pub const SPI_FREQUENCY_HZ: u32 = 6_000_000;

/// Read command plus two filler bytes precede the first data byte.
const READ_PREAMBLE: usize = 3;

/// RAP over SPI.
///
/// Chip select is handled by the [`SpiDevice`] implementation, so one
/// `SpiTransport` maps to exactly one ASIC on the bus.
pub struct SpiTransport<SPI> {
  spi: SPI,
}

impl<SPI: SpiDevice> SpiTransport<SPI> {
  pub fn new(spi: SPI) -> Self {
    Self { spi }
  }

  /// Give back the wrapped device.
  pub fn release(self) -> SPI {
    self.spi
  }
}

impl<SPI: SpiDevice> Transport for SpiTransport<SPI> {
  type Error = SPI::Error;

  fn write_register(&mut self, reg: u8, value: u8) -> Result<(), TransportError<Self::Error>> {
    self.spi.write(&[RAP_WRITE | reg, value]).map_err(TransportError::BusFault)
  }

  fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), TransportError<Self::Error>> {
    let len = READ_PREAMBLE + buf.len();
    if len > MAX_FRAME {
      return Err(TransportError::BufferOverflow);
    }

    let mut frame = [SPI_FILLER; MAX_FRAME];
    frame[0] = RAP_READ | reg;
    self.spi.transfer_in_place(&mut frame[..len]).map_err(TransportError::BusFault)?;
    buf.copy_from_slice(&frame[READ_PREAMBLE..len]);
    Ok(())
  }

  fn write_command(&mut self, sequence: &[u8]) -> Result<(), TransportError<Self::Error>> {
    self.spi.write(sequence).map_err(TransportError::BusFault)
  }
}
