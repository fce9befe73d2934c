use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::defs::*;
use crate::transport::Transport;
use crate::{AbsoluteConfig, AnyMeasConfig, Error, Pinnacle, RelativeConfig};

mod era;
mod system;

pub use system::SAMPLE_RATES;

/// Time for in-flight tracking scans to finish once tracking is disabled.
const TRACKING_SETTLE_MS: u32 = 10;

/// How the ASIC reports data, and therefore how the driver decodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataMode {
  /// Mouse-style deltas. The ASIC's power-on mode.
  #[default]
  Relative,
  /// 12-bit X/Y positions with a Z magnitude.
  Absolute,
  /// Raw ADC measurements of caller-chosen sense-line vectors.
  AnyMeas,
}

impl DataMode {
  pub(crate) const fn is_tracking(self) -> bool {
    matches!(self, DataMode::Relative | DataMode::Absolute)
  }
}

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
  D: DelayNs,
{
  pub fn mode(&self) -> DataMode {
    self.mode
  }

  /// Switch the data mode.
  ///
  /// Switching between relative and absolute rewrites SYS_CONFIG and
  /// FEED_CONFIG_1 (which also resets the axis inversion). Leaving AnyMeas, or
  /// finding its bits still set in SYS_CONFIG, restores the sample rate,
  /// compensation, z-idle and feed registers it repurposed. The driver only
  /// takes on the new mode once every write succeeded. Entering AnyMeas
  /// needs a data-ready pin and applies the stored [`AnyMeasConfig`].
  ///
  /// Pending flags and any in-flight measurement are discarded in every case.
  pub fn set_mode(&mut self, mode: DataMode) -> Result<(), Error<T::Error>> {
    if mode == DataMode::AnyMeas && !self.data_ready.is_pin() {
      return Err(Error::InvalidArgument);
    }

    let current = SysConfig::from_bits(self.read_reg(Reg::SysConfig)?);
    // AnyMeas bits left in SYS_CONFIG mean the repurposed registers need restoring too
    let restore = self.mode == DataMode::AnyMeas || current.track_disable() || current.anymeas_start();
    let sys = current.with_track_disable(false).with_anymeas_start(false);
    let feed = FeedConfig1::new().with_feed_enable(true).with_absolute(mode == DataMode::Absolute);

    match mode {
      DataMode::Relative | DataMode::Absolute if restore => {
        self.write_sample_rate(100)?;
        self.write_reg(Reg::CalConfig, CalConfig::compensations().into_bits())?;
        self.write_reg(Reg::ZIdle, DEFAULT_Z_IDLE)?;
        self.transport.write_block(Reg::SysConfig.into(), &[sys.into_bits(), feed.into_bits(), 0])?;
        self.intellimouse = false;
      }
      DataMode::Relative | DataMode::Absolute => {
        self.transport.write_block(Reg::SysConfig.into(), &[sys.into_bits(), feed.into_bits()])?;
      }
      DataMode::AnyMeas => {
        self.write_reg(Reg::SysConfig, sys.with_track_disable(true).into_bits())?;
        self.delay.delay_ms(TRACKING_SETTLE_MS);
        self.write_anymeas_config()?;
        self.intellimouse = false;
      }
    }
    self.mode = mode;
    debug!("data mode {:?}", mode);

    self.measuring = false;
    self.clear_status_flags()
  }

  /// Tune absolute mode. Fails with [`Error::ModeMismatch`] in any other mode.
  pub fn absolute_mode_config(&mut self, config: AbsoluteConfig) -> Result<(), Error<T::Error>> {
    if self.mode != DataMode::Absolute {
      return Err(Error::ModeMismatch);
    }
    self.write_reg(Reg::ZIdle, config.z_idle_count)?;
    self.modify_reg(Reg::FeedConfig1, |v| config.apply(FeedConfig1::from_bits(v)).into_bits())
  }

  /// Current z-idle packet count.
  pub fn z_idle_count(&mut self) -> Result<u8, Error<T::Error>> {
    self.read_reg(Reg::ZIdle)
  }

  /// Tune relative mode. Fails with [`Error::ModeMismatch`] in any other mode.
  ///
  /// Requesting Intellimouse runs the PS/2 unlock handshake; the scroll byte is
  /// only decoded when the ASIC acknowledges it (see
  /// [`Pinnacle::is_intellimouse`]).
  pub fn relative_mode_config(&mut self, config: RelativeConfig) -> Result<(), Error<T::Error>> {
    if self.mode != DataMode::Relative {
      return Err(Error::ModeMismatch);
    }
    self.write_reg(Reg::FeedConfig2, config.feed_config().into_bits())?;
    self.intellimouse = false;

    if config.intellimouse {
      self.transport.write_command(&INTELLIMOUSE_SEQUENCE)?;
      let mut reply = [0u8; 3];
      self.transport.read_block(INTELLIMOUSE_REPLY, &mut reply)?;
      self.intellimouse = reply[0] == 0xFA && reply[1] == 0x03;
      if !self.intellimouse {
        warn!("intellimouse not acknowledged: {:#x} {:#x}", reply[0], reply[1]);
      }
    }
    Ok(())
  }

  /// Whether relative reports carry a scroll-wheel byte.
  pub fn is_intellimouse(&self) -> bool {
    self.intellimouse
  }

  /// Configure AnyMeas measurements.
  ///
  /// The config is validated and remembered. Outside AnyMeas mode nothing is
  /// written and [`Error::ModeMismatch`] is returned; the stored config is
  /// applied on the next switch to AnyMeas.
  pub fn anymeas_mode_config(&mut self, config: AnyMeasConfig) -> Result<(), Error<T::Error>> {
    if !config.is_valid() {
      return Err(Error::InvalidArgument);
    }
    self.anymeas = config;
    if self.mode != DataMode::AnyMeas {
      return Err(Error::ModeMismatch);
    }
    self.write_anymeas_config()
  }

  pub fn anymeas_config(&self) -> AnyMeasConfig {
    self.anymeas
  }

  fn write_anymeas_config(&mut self) -> Result<(), Error<T::Error>> {
    self.transport.write_block(Reg::PacketByte1.into(), &[0u8; 8])?;
    self.transport.write_block(Reg::FeedConfig2.into(), &self.anymeas.registers())?;
    self.measuring = false;
    self.clear_status_flags()
  }

  /// Start or stop the data feed. Tracking modes only.
  pub fn feed_enabled(&mut self, enabled: bool) -> Result<(), Error<T::Error>> {
    if !self.mode.is_tracking() {
      return Err(Error::ModeMismatch);
    }
    let feed = FeedConfig1::from_bits(self.read_reg(Reg::FeedConfig1)?);
    if feed.feed_enable() != enabled {
      self.write_reg(Reg::FeedConfig1, feed.with_feed_enable(enabled).into_bits())?;
    }
    Ok(())
  }

  /// Always `false` in AnyMeas mode, where measurements are triggered explicitly.
  pub fn is_feed_enabled(&mut self) -> Result<bool, Error<T::Error>> {
    if !self.mode.is_tracking() {
      return Ok(false);
    }
    Ok(FeedConfig1::from_bits(self.read_reg(Reg::FeedConfig1)?).feed_enable())
  }
}
