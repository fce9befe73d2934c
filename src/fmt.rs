//! Logging shims. Forwards to `defmt` or `log` depending on the enabled feature
//! and compiles to nothing when neither is enabled.
#![allow(unused_macros)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("features `defmt` and `log` are mutually exclusive");

macro_rules! trace {
  ($s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    ::defmt::trace!($s $(, $x)*);
    #[cfg(feature = "log")]
    ::log::trace!($s $(, $x)*);
    #[cfg(not(any(feature = "defmt", feature = "log")))]
    let _ = ($( &$x, )*);
  }};
}

macro_rules! debug {
  ($s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    ::defmt::debug!($s $(, $x)*);
    #[cfg(feature = "log")]
    ::log::debug!($s $(, $x)*);
    #[cfg(not(any(feature = "defmt", feature = "log")))]
    let _ = ($( &$x, )*);
  }};
}

macro_rules! warn {
  ($s:literal $(, $x:expr)* $(,)?) => {{
    #[cfg(feature = "defmt")]
    ::defmt::warn!($s $(, $x)*);
    #[cfg(feature = "log")]
    ::log::warn!($s $(, $x)*);
    #[cfg(not(any(feature = "defmt", feature = "log")))]
    let _ = ($( &$x, )*);
  }};
}
