use crate::defs::{FeedConfig1, DEFAULT_Z_IDLE};

/// Absolute-mode tuning applied by [`crate::Pinnacle::absolute_mode_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AbsoluteConfig {
  /// Number of Z = 0 packets sent once a finger leaves the sensor. Every packet
  /// asserts data-ready, so large values keep the host busy after lift-off.
  pub z_idle_count: u8,
  pub invert_x: bool,
  pub invert_y: bool,
}

impl AbsoluteConfig {
  pub const fn new() -> Self {
    Self { z_idle_count: DEFAULT_Z_IDLE, invert_x: false, invert_y: false }
  }

  pub const fn with_z_idle_count(mut self, count: u8) -> Self {
    self.z_idle_count = count;
    self
  }

  pub const fn with_invert(mut self, x: bool, y: bool) -> Self {
    self.invert_x = x;
    self.invert_y = y;
    self
  }

  /// Merge the inversion flags into an existing FEED_CONFIG_1 value.
  pub(crate) const fn apply(&self, feed: FeedConfig1) -> FeedConfig1 {
    feed.with_x_invert(self.invert_x).with_y_invert(self.invert_y)
  }
}

impl Default for AbsoluteConfig {
  fn default() -> Self {
    Self::new()
  }
}
