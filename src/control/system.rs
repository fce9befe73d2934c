use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::defs::*;
use crate::transport::Transport;
use crate::{Error, Pinnacle};

/// Report rates (in Hz) the ASIC supports in the tracking modes.
pub const SAMPLE_RATES: [u16; 8] = [10, 20, 40, 60, 80, 100, 200, 300];

/// FEED_CONFIG_3 value that turns off palm and noise compensation, which the
/// ASIC cannot keep up with above 100 Hz.
const FAST_RATE_COMPENSATION_OFF: u8 = 10;
const SAMPLE_RELOAD_DEFAULT: u8 = 0x13;
const SAMPLE_RELOAD_200HZ: u8 = 9;
const SAMPLE_RELOAD_300HZ: u8 = 6;
const CALIBRATION_TIMEOUT_MS: u32 = 100;

impl<T, DR, D> Pinnacle<T, DR, D>
where
  T: Transport,
  DR: InputPin,
  D: DelayNs,
{
  /// Power the ASIC down (`true`) or back up. The transport stays usable.
  pub fn shutdown(&mut self, off: bool) -> Result<(), Error<T::Error>> {
    self.modify_reg(Reg::SysConfig, |v| SysConfig::from_bits(v).with_shutdown(off).into_bits())
  }

  pub fn is_shutdown(&mut self) -> Result<bool, Error<T::Error>> {
    Ok(SysConfig::from_bits(self.read_reg(Reg::SysConfig)?).shutdown())
  }

  /// Let the ASIC drop into its low-power sleep after a period without touches.
  pub fn allow_sleep(&mut self, enabled: bool) -> Result<(), Error<T::Error>> {
    self.modify_reg(Reg::SysConfig, |v| SysConfig::from_bits(v).with_sleep_enable(enabled).into_bits())
  }

  pub fn is_allow_sleep(&mut self) -> Result<bool, Error<T::Error>> {
    Ok(SysConfig::from_bits(self.read_reg(Reg::SysConfig)?).sleep_enable())
  }

  /// Whether the module was configured at the factory through its HCO straps.
  pub fn is_hard_configured(&mut self) -> Result<bool, Error<T::Error>> {
    Ok(self.read_reg(Reg::HcoId)? & HARD_CONFIGURED != 0)
  }

  /// Set the report rate in Hz. Must be one of [`SAMPLE_RATES`].
  ///
  /// 200 and 300 Hz are reached by shortening the ASIC's reload timer and
  /// disabling palm/noise compensation.
  pub fn set_sample_rate(&mut self, rate: u16) -> Result<(), Error<T::Error>> {
    if !self.mode.is_tracking() {
      return Err(Error::ModeMismatch);
    }
    if !SAMPLE_RATES.contains(&rate) {
      return Err(Error::InvalidArgument);
    }
    self.write_sample_rate(rate)
  }

  /// Rate registers only; callers have validated `rate` and the mode.
  pub(crate) fn write_sample_rate(&mut self, rate: u16) -> Result<(), Error<T::Error>> {
    if rate > 100 {
      let reload = if rate == 300 { SAMPLE_RELOAD_300HZ } else { SAMPLE_RELOAD_200HZ };
      self.write_reg(Reg::FeedConfig3, FAST_RATE_COMPENSATION_OFF)?;
      self.era_write_repeat(ERA_SAMPLE_RELOAD, reload, 2)?;
      self.write_reg(Reg::SampleRate, 0)
    } else {
      self.write_reg(Reg::FeedConfig3, 0)?;
      self.era_write_repeat(ERA_SAMPLE_RELOAD, SAMPLE_RELOAD_DEFAULT, 2)?;
      self.write_reg(Reg::SampleRate, rate as u8)
    }
  }

  /// Current report rate in Hz. Unsupported register values read back as 100,
  /// which is how the ASIC treats them.
  pub fn sample_rate(&mut self) -> Result<u16, Error<T::Error>> {
    if !self.mode.is_tracking() {
      return Err(Error::ModeMismatch);
    }
    match self.read_reg(Reg::SampleRate)? {
      0 => match self.era_read(ERA_SAMPLE_RELOAD)? {
        SAMPLE_RELOAD_300HZ => Ok(300),
        _ => Ok(200),
      },
      rate @ (10 | 20 | 40 | 60 | 80 | 100) => Ok(rate as u16),
      _ => Ok(100),
    }
  }

  /// Choose which objects the ASIC tracks and at what report rate.
  ///
  /// Detecting a stylus costs sensitivity for fingers; disable what the
  /// product does not need.
  pub fn detect_finger_stylus(&mut self, finger: bool, stylus: bool, sample_rate: u16) -> Result<(), Error<T::Error>> {
    self.set_sample_rate(sample_rate)?;
    self.era_modify(ERA_FINGER_STYLUS, |v| {
      let v = if finger { v | FINGER_ENABLE } else { v & !FINGER_ENABLE };
      if stylus { v | STYLUS_ENABLE } else { v & !STYLUS_ENABLE }
    })
  }

  /// Write the compensation settings and optionally run a calibration.
  ///
  /// With [`CalConfig::calibrate`] set this waits up to 100 ms for the ASIC to
  /// signal completion and returns whether it did. Keep the sensor untouched
  /// while it runs. Without it, only the compensation flags change and the
  /// result is always `true`.
  pub fn calibrate(&mut self, config: CalConfig) -> Result<bool, Error<T::Error>> {
    if !self.mode.is_tracking() {
      return Err(Error::ModeMismatch);
    }
    self.write_reg(Reg::CalConfig, config.into_bits())?;
    if !config.calibrate() {
      return Ok(true);
    }

    for _ in 0..CALIBRATION_TIMEOUT_MS {
      if self.available()? {
        self.clear_status_flags()?;
        debug!("calibration complete");
        return Ok(true);
      }
      self.delay.delay_ms(1);
    }
    warn!("calibration timed out");
    Ok(false)
  }

  /// ADC attenuation for tracking: 0 is the most sensitive, 3 the least.
  pub fn set_adc_gain(&mut self, gain: u8) -> Result<(), Error<T::Error>> {
    if gain > 3 {
      return Err(Error::InvalidArgument);
    }
    self.era_modify(ERA_ADC_GAIN, |v| (v & 0x3F) | (gain << 6))
  }

  /// Minimum Z for touches on the wide outer edge of each axis. Lower values
  /// make the edges more sensitive, which helps behind thick overlays.
  pub fn tune_edge_sensitivity(&mut self, x_wide_z_min: u8, y_wide_z_min: u8) -> Result<(), Error<T::Error>> {
    self.era_write(ERA_X_WIDE_Z_MIN, x_wide_z_min)?;
    self.era_write(ERA_Y_WIDE_Z_MIN, y_wide_z_min)
  }

  /// Load a compensation matrix, as captured by
  /// [`Pinnacle::calibration_matrix`]. Missing trailing entries are zeroed.
  pub fn set_calibration_matrix(&mut self, matrix: &[i16]) -> Result<(), Error<T::Error>> {
    if matrix.len() > CAL_MATRIX_LEN {
      return Err(Error::InvalidArgument);
    }
    self.with_feed_suspended(|dev| {
      for i in 0..CAL_MATRIX_LEN {
        let addr = ERA_CAL_MATRIX + (i as u16) * 2;
        match matrix.get(i) {
          Some(entry) => {
            let [hi, lo] = entry.to_be_bytes();
            dev.era_write(addr, hi)?;
            dev.era_write(addr + 1, lo)?;
          }
          None => dev.era_write_repeat(addr, 0, 2)?,
        }
      }
      Ok(())
    })
  }

  /// The matrix the last calibration produced.
  pub fn calibration_matrix(&mut self) -> Result<[i16; CAL_MATRIX_LEN], Error<T::Error>> {
    // single-entry reads return stale data; the whole block must be read in one go
    let mut raw = [0u8; CAL_MATRIX_LEN * 2];
    self.era_read_bytes(ERA_CAL_MATRIX, &mut raw)?;

    let mut matrix = [0i16; CAL_MATRIX_LEN];
    for (entry, bytes) in matrix.iter_mut().zip(raw.chunks_exact(2)) {
      *entry = i16::from_be_bytes([bytes[0], bytes[1]]);
    }
    Ok(matrix)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{fake_driver, fake_driver_with_pin};
  use crate::DataMode;

  #[test]
  fn power_flags() {
    let (mut dev, regs) = fake_driver();

    dev.shutdown(true).unwrap();
    assert_eq!(regs.get(Reg::SysConfig), 0x02);
    assert!(dev.is_shutdown().unwrap());

    dev.allow_sleep(true).unwrap();
    assert_eq!(regs.get(Reg::SysConfig), 0x06);
    assert!(dev.is_allow_sleep().unwrap());

    dev.shutdown(false).unwrap();
    assert_eq!(regs.get(Reg::SysConfig), 0x04);
  }

  #[test]
  fn hard_configured_bit() {
    let (mut dev, regs) = fake_driver();
    assert!(!dev.is_hard_configured().unwrap());
    regs.set(Reg::HcoId, 0x80);
    assert!(dev.is_hard_configured().unwrap());
  }

  #[test]
  fn normal_sample_rates() {
    let (mut dev, regs) = fake_driver();
    for rate in [10, 20, 40, 60, 80, 100] {
      dev.set_sample_rate(rate).unwrap();
      assert_eq!(regs.get(Reg::SampleRate), rate as u8);
      assert_eq!(regs.get(Reg::FeedConfig3), 0);
      assert_eq!(regs.era(ERA_SAMPLE_RELOAD), 0x13);
      assert_eq!(regs.era(ERA_SAMPLE_RELOAD + 1), 0x13);
      assert_eq!(dev.sample_rate().unwrap(), rate);
    }
  }

  #[test]
  fn fast_sample_rates_use_reload_timer() {
    let (mut dev, regs) = fake_driver();

    dev.set_sample_rate(300).unwrap();
    assert_eq!(regs.get(Reg::SampleRate), 0);
    assert_eq!(regs.get(Reg::FeedConfig3), 10);
    assert_eq!(regs.era(ERA_SAMPLE_RELOAD), 6);
    assert_eq!(dev.sample_rate().unwrap(), 300);

    dev.set_sample_rate(200).unwrap();
    assert_eq!(regs.era(ERA_SAMPLE_RELOAD), 9);
    assert_eq!(dev.sample_rate().unwrap(), 200);
  }

  #[test]
  fn unsupported_sample_rate_is_rejected() {
    let (mut dev, regs) = fake_driver();
    for rate in [0, 50, 150, 1000] {
      assert_eq!(dev.set_sample_rate(rate), Err(Error::InvalidArgument));
    }
    assert_eq!(regs.write_count(), 0);
  }

  #[test]
  fn unknown_rate_register_reads_as_default() {
    let (mut dev, regs) = fake_driver();
    regs.set(Reg::SampleRate, 55);
    assert_eq!(dev.sample_rate().unwrap(), 100);
  }

  #[test]
  fn sample_rate_needs_tracking_mode() {
    let (mut dev, _regs) = fake_driver_with_pin();
    dev.set_mode(DataMode::AnyMeas).unwrap();
    assert_eq!(dev.set_sample_rate(100), Err(Error::ModeMismatch));
    assert_eq!(dev.sample_rate(), Err(Error::ModeMismatch));
  }

  #[test]
  fn finger_stylus_bits_are_set_and_cleared() {
    let (mut dev, regs) = fake_driver();
    regs.set_era(ERA_FINGER_STYLUS, 0xF0);

    dev.detect_finger_stylus(true, true, 100).unwrap();
    assert_eq!(regs.era(ERA_FINGER_STYLUS), 0xF5);

    dev.detect_finger_stylus(true, false, 80).unwrap();
    assert_eq!(regs.era(ERA_FINGER_STYLUS), 0xF1);
    assert_eq!(regs.get(Reg::SampleRate), 80);
  }

  #[test]
  fn calibration_without_run_only_writes_flags() {
    let (mut dev, regs) = fake_driver();
    assert!(dev.calibrate(CalConfig::compensations()).unwrap());
    assert_eq!(regs.get(Reg::CalConfig), 0x1E);
    assert_eq!(regs.elapsed_us(), 0);
  }

  #[test]
  fn calibration_completes() {
    let (mut dev, regs) = fake_driver();
    assert!(dev.calibrate(CalConfig::full()).unwrap());
    assert_eq!(regs.get(Reg::Status), 0x00);
  }

  #[test]
  fn calibration_times_out_after_100ms() {
    let (mut dev, regs) = fake_driver();
    regs.calibration_completes(false);

    assert!(!dev.calibrate(CalConfig::full()).unwrap());
    assert_eq!(regs.elapsed_us(), 100_000);
  }

  #[test]
  fn adc_gain_preserves_low_bits() {
    let (mut dev, regs) = fake_driver();
    regs.set_era(ERA_ADC_GAIN, 0x15);

    dev.set_adc_gain(3).unwrap();
    assert_eq!(regs.era(ERA_ADC_GAIN), 0xD5);
    dev.set_adc_gain(1).unwrap();
    assert_eq!(regs.era(ERA_ADC_GAIN), 0x55);
  }

  #[test]
  fn adc_gain_out_of_range() {
    let (mut dev, regs) = fake_driver();
    assert_eq!(dev.set_adc_gain(4), Err(Error::InvalidArgument));
    assert_eq!(regs.write_count(), 0);
  }

  #[test]
  fn edge_sensitivity() {
    let (mut dev, regs) = fake_driver();
    dev.tune_edge_sensitivity(2, 1).unwrap();
    assert_eq!(regs.era(ERA_X_WIDE_Z_MIN), 2);
    assert_eq!(regs.era(ERA_Y_WIDE_Z_MIN), 1);
  }

  #[test]
  fn calibration_matrix_round_trip_and_padding() {
    let (mut dev, regs) = fake_driver();
    for i in 0..(CAL_MATRIX_LEN as u16 * 2) {
      regs.set_era(ERA_CAL_MATRIX + i, 0xAA);
    }

    dev.set_calibration_matrix(&[0x0102, -2, 300]).unwrap();
    assert_eq!(regs.era(ERA_CAL_MATRIX), 0x01);
    assert_eq!(regs.era(ERA_CAL_MATRIX + 1), 0x02);
    assert_eq!(regs.era(ERA_CAL_MATRIX + 2), 0xFF);
    assert_eq!(regs.era(ERA_CAL_MATRIX + 3), 0xFE);

    let matrix = dev.calibration_matrix().unwrap();
    assert_eq!(&matrix[..3], &[0x0102, -2, 300]);
    assert!(matrix[3..].iter().all(|&v| v == 0));
  }

  #[test]
  fn oversized_calibration_matrix_is_rejected() {
    let (mut dev, regs) = fake_driver();
    assert_eq!(dev.set_calibration_matrix(&[0; CAL_MATRIX_LEN + 1]), Err(Error::InvalidArgument));
    assert_eq!(regs.write_count(), 0);
  }
}
