//! Relative (mouse-style) reports over SPI with the data-ready pin.
#![allow(unused)]
use cirque_pinnacle::{DataReady, Pinnacle, RelativeConfig, Report};
use embedded_hal::{delay::DelayNs, digital::InputPin, spi::SpiDevice};

#[allow(dead_code)]
fn run<SPI, DR, D>(spi: SPI, dr: DR, delay: D) -> Result<(), cirque_pinnacle::Error<SPI::Error>>
where
  SPI: SpiDevice,
  DR: InputPin,
  D: DelayNs,
{
  let mut trackpad = Pinnacle::new_spi(spi, DataReady::Pin(dr), delay);
  if !trackpad.begin()? {
    // still usable, just uncalibrated and with the feed off
    trackpad.feed_enabled(true)?;
  }
  trackpad.relative_mode_config(RelativeConfig::new().with_intellimouse(true))?;

  loop {
    if !trackpad.available()? {
      continue;
    }
    if let Report::Relative(report) = trackpad.read()? {
      let _left = report.buttons.primary();
      let _motion = (report.x, report.y, report.scroll);
      // forward to the host
    }
  }
}

fn main() {}
