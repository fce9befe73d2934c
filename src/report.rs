use bitfield_struct::bitfield;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::defs::Reg;
use crate::transport::Transport;
use crate::{DataMode, Error, Pinnacle};

/// Recommended usable range of absolute X. The sensor's outer edge reports
/// values outside it that jitter badly.
pub const ABS_X_MIN: u16 = 128;
pub const ABS_X_MAX: u16 = 1920;
/// Recommended usable range of absolute Y.
pub const ABS_Y_MIN: u16 = 64;
pub const ABS_Y_MAX: u16 = 1472;

/// Button state carried in packet byte 0.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons {
  pub primary: bool,
  pub secondary: bool,
  pub middle: bool,
  /// Additional switch inputs, absolute mode only.
  #[bits(3)]
  pub extended: u8,
  #[bits(2)]
  __: u8,
}

/// One relative-mode packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelativeReport {
  pub buttons: Buttons,
  pub x: i8,
  pub y: i8,
  /// Scroll-wheel delta; always 0 unless Intellimouse was negotiated.
  pub scroll: i8,
}

impl From<[u8; 4]> for RelativeReport {
  fn from(b: [u8; 4]) -> Self {
    Self { buttons: Buttons::from_bits(b[0] & 0x07), x: b[1] as i8, y: b[2] as i8, scroll: b[3] as i8 }
  }
}

/// One absolute-mode packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AbsoluteReport {
  pub buttons: Buttons,
  /// 12-bit position, raw from the ASIC.
  pub x: u16,
  /// 12-bit position, raw from the ASIC.
  pub y: u16,
  /// Touch magnitude in `0..=31`; 0 once the finger has left the sensor.
  pub z: u8,
}

impl AbsoluteReport {
  pub const fn is_touching(&self) -> bool {
    self.z != 0
  }

  /// Clamp X and Y to the recommended range. Idle packets (`z == 0`) are left
  /// alone so they keep reading as 0, 0.
  pub fn clamped(self) -> Self {
    if !self.is_touching() {
      return self;
    }
    Self { x: self.x.clamp(ABS_X_MIN, ABS_X_MAX), y: self.y.clamp(ABS_Y_MIN, ABS_Y_MAX), ..self }
  }
}

impl From<[u8; 6]> for AbsoluteReport {
  fn from(b: [u8; 6]) -> Self {
    Self {
      buttons: Buttons::from_bits(b[0] & 0x3F),
      x: ((b[4] as u16 & 0x0F) << 8) | b[2] as u16,
      y: ((b[4] as u16 & 0xF0) << 4) | b[3] as u16,
      z: b[5] & 0x1F,
    }
  }
}

/// Decoded data, tagged with the mode it was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
  Relative(RelativeReport),
  Absolute(AbsoluteReport),
  AnyMeas(i32),
}

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
  D: DelayNs,
{
  /// Read and acknowledge the pending packet in whatever mode is active.
  ///
  /// Call after [`Pinnacle::available`] returns `true`; reading without data
  /// returns the previous packet. In AnyMeas mode that includes the result
  /// registers: with no measurement started this decodes whatever conversion
  /// ran last, so pair it with [`Pinnacle::start_measure_adc`]. The ASIC's ready flags are cleared even if
  /// the read fails, so a broken packet is dropped rather than re-read.
  pub fn read(&mut self) -> Result<Report, Error<T::Error>> {
    match self.mode {
      DataMode::Relative => self.read_relative().map(Report::Relative),
      DataMode::Absolute => self.read_absolute().map(Report::Absolute),
      DataMode::AnyMeas => self.get_measure_adc().map(Report::AnyMeas),
    }
  }

  pub fn read_relative(&mut self) -> Result<RelativeReport, Error<T::Error>> {
    if self.mode != DataMode::Relative {
      return Err(Error::ModeMismatch);
    }
    let mut b = [0u8; 4];
    let len = if self.intellimouse { 4 } else { 3 };
    self.read_and_clear(Reg::PacketByte0.into(), &mut b[..len])?;
    Ok(b.into())
  }

  pub fn read_absolute(&mut self) -> Result<AbsoluteReport, Error<T::Error>> {
    if self.mode != DataMode::Absolute {
      return Err(Error::ModeMismatch);
    }
    let mut b = [0u8; 6];
    self.read_and_clear(Reg::PacketByte0.into(), &mut b)?;
    Ok(b.into())
  }
}
