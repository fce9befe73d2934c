use bitfield_struct::bitfield;

use crate::defs::Reg;

/// ADC attenuation for AnyMeas measurements.
///
/// Lower attenuation (higher gain) gives more resolution but saturates sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdcGain {
  /// 1x, least sensitive.
  Gain100 = 0xC0,
  /// 1.33x
  Gain133 = 0x80,
  /// 1.66x
  Gain166 = 0x40,
  /// 2x, most sensitive.
  #[default]
  Gain200 = 0x00,
}

/// Sense-line drive frequency.
///
/// The listed frequencies assume a 500 ns aperture; shorter apertures raise
/// them proportionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Frequency {
  /// ~500 kHz
  #[default]
  Freq0 = 0x02,
  /// ~444 kHz
  Freq1 = 0x03,
  /// ~400 kHz
  Freq2 = 0x04,
  /// ~364 kHz
  Freq3 = 0x05,
  /// ~333 kHz
  Freq4 = 0x06,
  /// ~308 kHz
  Freq5 = 0x07,
  /// ~267 kHz
  Freq6 = 0x09,
  /// ~235 kHz
  Freq7 = 0x0B,
}

/// Number of ADC samples accumulated per measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SampleLength {
  Samples128 = 1,
  Samples256 = 2,
  #[default]
  Samples512 = 3,
}

/// Sense-line multiplexer selection.
///
/// The reference capacitors only take part when their bits are also set in
/// both the toggle and polarity masks of a measurement.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mux {
  pub npn: bool,
  __: bool,
  pub pnp: bool,
  pub ref0: bool,
  pub ref1: bool,
  #[bits(3)]
  ___: u8,
}

/// Measurement repetition and power behaviour.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnyMeasControl {
  /// Measurements taken per trigger.
  #[bits(6)]
  pub power_count: u8,
  /// Let the ASIC sleep once the measurements are done. Waking takes ~300 ms.
  pub power_idle: bool,
  /// Repeat measurements while `power_count` is above one.
  pub repeat: bool,
}

/// Shortest and longest ADC aperture, in nanoseconds.
pub const APERTURE_MIN_NS: u16 = 250;
pub const APERTURE_MAX_NS: u16 = 1875;
const APERTURE_STEP_NS: u16 = 125;

/// Raw measurement configuration applied by
/// [`crate::Pinnacle::anymeas_mode_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnyMeasConfig {
  pub gain: AdcGain,
  pub frequency: Frequency,
  pub sample_length: SampleLength,
  pub mux: Mux,
  /// ADC window; a multiple of 125 in `250..=1875`.
  pub aperture_ns: u16,
  pub control: AnyMeasControl,
}

impl AnyMeasConfig {
  pub const fn new() -> Self {
    Self {
      gain: AdcGain::Gain200,
      frequency: Frequency::Freq0,
      sample_length: SampleLength::Samples512,
      mux: Mux::new().with_pnp(true),
      aperture_ns: 500,
      control: AnyMeasControl::new().with_power_count(1),
    }
  }

  pub const fn with_gain(mut self, gain: AdcGain) -> Self {
    self.gain = gain;
    self
  }

  pub const fn with_frequency(mut self, frequency: Frequency) -> Self {
    self.frequency = frequency;
    self
  }

  pub const fn with_sample_length(mut self, sample_length: SampleLength) -> Self {
    self.sample_length = sample_length;
    self
  }

  pub const fn with_mux(mut self, mux: Mux) -> Self {
    self.mux = mux;
    self
  }

  pub const fn with_aperture_ns(mut self, aperture_ns: u16) -> Self {
    self.aperture_ns = aperture_ns;
    self
  }

  pub const fn with_control(mut self, control: AnyMeasControl) -> Self {
    self.control = control;
    self
  }

  pub const fn is_valid(&self) -> bool {
    self.aperture_ns >= APERTURE_MIN_NS
      && self.aperture_ns <= APERTURE_MAX_NS
      && self.aperture_ns % APERTURE_STEP_NS == 0
  }

  /// Register image for FEED_CONFIG_2 through the AnyMeas control register.
  pub(crate) const fn registers(&self) -> [u8; 10] {
    [
      self.gain as u8 | self.frequency as u8,
      self.sample_length as u8,
      self.mux.into_bits(),
      0,
      (self.aperture_ns / APERTURE_STEP_NS) as u8,
      0,
      // result pointer: toggle/polarity masks start here
      Reg::PacketByte1 as u8,
      0,
      0,
      self.control.into_bits(),
    ]
  }
}

impl Default for AnyMeasConfig {
  fn default() -> Self {
    Self::new()
  }
}
