//! Raw ADC measurements over a few sense-line vectors, with an async wait on
//! the data-ready pin.
#![allow(unused)]
use cirque_pinnacle::{AdcGain, AnyMeasConfig, DataMode, DataReady, Pinnacle};
use embedded_hal::{delay::DelayNs, spi::SpiDevice};
use embedded_hal_async::{delay::DelayNs as AsyncDelayNs, digital::Wait};

/// (toggle, polarity) pairs to sample.
const VECTORS: [(u32, u32); 4] = [
  (0x0000_FFFF, 0x0000_0000),
  (0x0FFF_0000, 0x0000_0000),
  (0x00FF_00FF, 0x0000_00FF),
  (0x00FF_00FF, 0x00FF_0000),
];

#[allow(dead_code)]
async fn main_async<SPI, DR, D>(spi: SPI, dr: DR, delay: D) -> Result<(), cirque_pinnacle::Error<SPI::Error>>
where
  SPI: SpiDevice,
  DR: embedded_hal::digital::InputPin + Wait,
  D: DelayNs + AsyncDelayNs,
{
  let mut trackpad = Pinnacle::new_spi(spi, DataReady::Pin(dr), delay);
  trackpad.begin()?;
  trackpad.set_mode(DataMode::AnyMeas)?;
  trackpad.anymeas_mode_config(AnyMeasConfig::new().with_gain(AdcGain::Gain166))?;

  let mut compensation = [0i32; VECTORS.len()];
  for (slot, &(toggle, polarity)) in compensation.iter_mut().zip(VECTORS.iter()) {
    *slot = trackpad.measure_adc(toggle, polarity)?;
  }

  loop {
    for (i, &(toggle, polarity)) in VECTORS.iter().enumerate() {
      trackpad.start_measure_adc(toggle, polarity)?;
      trackpad.wait_for_data_ready().await?;
      let _delta = trackpad.get_measure_adc()? - compensation[i];
    }
  }
}

fn main() {}
