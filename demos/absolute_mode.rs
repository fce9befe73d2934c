//! Absolute coordinates over I²C, polling STATUS instead of a DR pin.
#![allow(unused)]
use cirque_pinnacle::{AbsoluteConfig, DataMode, DataReady, Pinnacle, Report, ABS_X_MAX, ABS_X_MIN};
use embedded_hal::{
  delay::DelayNs,
  i2c::{I2c, SevenBitAddress},
};

#[allow(dead_code)]
fn run<I2C, D, E>(i2c: I2C, delay: D) -> Result<(), cirque_pinnacle::Error<E>>
where
  I2C: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  let mut trackpad = Pinnacle::new_i2c(i2c, DataReady::software(), delay);
  trackpad.begin()?;
  trackpad.set_mode(DataMode::Absolute)?;
  trackpad.absolute_mode_config(AbsoluteConfig::new().with_z_idle_count(5).with_invert(false, true))?;

  loop {
    if !trackpad.available()? {
      continue;
    }
    if let Report::Absolute(report) = trackpad.read()? {
      if !report.is_touching() {
        continue;
      }
      let report = report.clamped();
      let _percent = (report.x - ABS_X_MIN) as u32 * 100 / (ABS_X_MAX - ABS_X_MIN) as u32;
    }
  }
}

fn main() {}
