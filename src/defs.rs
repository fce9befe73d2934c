/******************************************************************************
 * Refer to the Pinnacle 1CA027 datasheet and application notes, available at  *
 * - https://www.cirque.com/gen4-dev-kits                                       *
 * ========================================================================== *
 *                    Pinnacle 1CA027 - Registers & Memory Map                *
*******************************************************************************/

use bitfield_struct::bitfield;

/// Fixed 7-bit I²C address of the ASIC.
pub const I2C_ADDR: u8 = 0x2A;

/// Register Access Protocol (RAP) command prefixes.
pub(crate) const RAP_READ: u8 = 0xA0;
pub(crate) const RAP_WRITE: u8 = 0x80;
/// Filler clocked out while the ASIC shifts register data back over SPI.
pub(crate) const SPI_FILLER: u8 = 0xFC;

/// Values reported by [`Reg::FirmwareId`] / [`Reg::FirmwareVersion`] on a healthy 1CA027.
pub(crate) const FIRMWARE_ID: u8 = 0x07;
pub(crate) const FIRMWARE_VERSION: u8 = 0x3A;

#[allow(dead_code)]
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reg {
  // Identification (0x00..0x01)
  FirmwareId = 0x00,
  FirmwareVersion = 0x01,

  // Status and configuration (0x02..0x0D)
  Status = 0x02,
  SysConfig = 0x03,
  FeedConfig1 = 0x04,
  FeedConfig2 = 0x05,
  FeedConfig3 = 0x06,
  CalConfig = 0x07,
  Ps2AuxControl = 0x08,
  SampleRate = 0x09,
  ZIdle = 0x0A,
  ZScaler = 0x0B,
  SleepInterval = 0x0C,
  SleepTimer = 0x0D,

  // Report packet (0x11..0x17); AnyMeas reuses 0x11..0x1A
  AdcResult = 0x11,
  PacketByte0 = 0x12,
  PacketByte1 = 0x13,

  // Extended register access (0x1B..0x1E)
  EraValue = 0x1B,
  EraAddr = 0x1C,
  EraControl = 0x1E,

  // Hardware configuration (0x1F)
  HcoId = 0x1F,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

// Extended (16-bit addressed) memory locations
pub(crate) const ERA_FINGER_STYLUS: u16 = 0x00EB;
pub(crate) const ERA_X_WIDE_Z_MIN: u16 = 0x0149;
pub(crate) const ERA_Y_WIDE_Z_MIN: u16 = 0x0168;
pub(crate) const ERA_ADC_GAIN: u16 = 0x0187;
pub(crate) const ERA_SAMPLE_RELOAD: u16 = 0x019E;
pub(crate) const ERA_CAL_MATRIX: u16 = 0x01DF;

/// Number of compensation entries in the ASIC's calibration matrix.
pub const CAL_MATRIX_LEN: usize = 46;

// ERA_FINGER_STYLUS bits
pub(crate) const FINGER_ENABLE: u8 = 0x01;
pub(crate) const STYLUS_ENABLE: u8 = 0x04;

// ERA_CONTROL commands
pub(crate) const ERA_READ: u8 = 0x01;
pub(crate) const ERA_READ_AUTO_INC: u8 = 0x05;
pub(crate) const ERA_WRITE: u8 = 0x02;
pub(crate) const ERA_WRITE_AUTO_INC: u8 = 0x0A;

/// SYS_CONFIG value that starts an AnyMeas conversion.
pub(crate) const ANYMEAS_TRIGGER: u8 = 0x18;

/// HCO_ID bit set when the ASIC was configured in hardware at the factory.
pub(crate) const HARD_CONFIGURED: u8 = 0x80;

/// PS/2 "set sample rate" sequence (200, 100, 80) that unlocks the Intellimouse
/// scroll-wheel packet, and the register holding the ASIC's reply.
pub(crate) const INTELLIMOUSE_SEQUENCE: [u8; 6] = [0xF3, 0xC8, 0xF3, 0x64, 0xF3, 0x50];
pub(crate) const INTELLIMOUSE_REPLY: u8 = 0xF2;

/// Z-idle packet count written on bring-up and when leaving AnyMeas mode.
pub(crate) const DEFAULT_Z_IDLE: u8 = 30;

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct Status {
  #[bits(2)]
  __: u8,
  pub(crate) data_ready: bool,
  pub(crate) command_complete: bool,
  #[bits(4)]
  ___: u8,
}

impl Status {
  /// Either flag asserts the DR line, so both count as "ready".
  pub(crate) const fn is_set(&self) -> bool {
    self.data_ready() || self.command_complete()
  }
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct SysConfig {
  pub(crate) reset: bool,
  pub(crate) shutdown: bool,
  pub(crate) sleep_enable: bool,
  pub(crate) track_disable: bool,
  pub(crate) anymeas_start: bool,
  #[bits(3)]
  __: u8,
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct FeedConfig1 {
  pub(crate) feed_enable: bool,
  pub(crate) absolute: bool,
  pub(crate) filter_disable: bool,
  pub(crate) x_disable: bool,
  pub(crate) y_disable: bool,
  __: bool,
  pub(crate) x_invert: bool,
  pub(crate) y_invert: bool,
}

#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct FeedConfig2 {
  pub(crate) intellimouse: bool,
  pub(crate) taps_disable: bool,
  pub(crate) secondary_tap_disable: bool,
  pub(crate) scroll_disable: bool,
  pub(crate) glide_extend_disable: bool,
  #[bits(2)]
  __: u8,
  pub(crate) swap_xy: bool,
}

/// Calibration request and compensation switches (CAL_CONFIG register).
///
/// `calibrate` starts a one-shot calibration; the remaining flags choose which
/// compensation algorithms stay active afterwards.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalConfig {
  pub calibrate: bool,
  pub background_comp: bool,
  pub nerd_comp: bool,
  pub track_error_comp: bool,
  pub tap_comp: bool,
  #[bits(3)]
  __: u8,
}

impl CalConfig {
  /// All compensations enabled without requesting a calibration run (0x1E).
  pub const fn compensations() -> Self {
    Self::new()
      .with_background_comp(true)
      .with_nerd_comp(true)
      .with_track_error_comp(true)
      .with_tap_comp(true)
  }

  /// Run a calibration with all compensations enabled (0x1F).
  pub const fn full() -> Self {
    Self::compensations().with_calibrate(true)
  }
}
