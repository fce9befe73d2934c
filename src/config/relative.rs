use crate::defs::FeedConfig2;

/// Relative-mode gesture options applied by
/// [`crate::Pinnacle::relative_mode_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RelativeConfig {
  /// Report single taps as primary button presses.
  pub taps: bool,
  /// Swap the X and Y axes (rotate the sensor by 90°).
  pub rotate90: bool,
  /// Report taps in the top-right corner as secondary button presses.
  pub secondary_tap: bool,
  /// Negotiate the Intellimouse extension, which adds a scroll-wheel byte.
  pub intellimouse: bool,
  /// Keep reporting motion briefly after a fast swipe lifts off.
  pub glide_extend: bool,
}

impl RelativeConfig {
  pub const fn new() -> Self {
    Self { taps: true, rotate90: false, secondary_tap: true, intellimouse: false, glide_extend: true }
  }

  pub const fn with_taps(mut self, taps: bool) -> Self {
    self.taps = taps;
    self
  }

  pub const fn with_rotate90(mut self, rotate90: bool) -> Self {
    self.rotate90 = rotate90;
    self
  }

  pub const fn with_secondary_tap(mut self, secondary_tap: bool) -> Self {
    self.secondary_tap = secondary_tap;
    self
  }

  pub const fn with_intellimouse(mut self, intellimouse: bool) -> Self {
    self.intellimouse = intellimouse;
    self
  }

  pub const fn with_glide_extend(mut self, glide_extend: bool) -> Self {
    self.glide_extend = glide_extend;
    self
  }

  /// The register stores "disable" bits, so most flags are inverted.
  pub(crate) const fn feed_config(&self) -> FeedConfig2 {
    FeedConfig2::new()
      .with_intellimouse(self.intellimouse)
      .with_taps_disable(!self.taps)
      .with_secondary_tap_disable(!self.secondary_tap)
      .with_glide_extend_disable(!self.glide_extend)
      .with_swap_xy(self.rotate90)
  }
}

impl Default for RelativeConfig {
  fn default() -> Self {
    Self::new()
  }
}
