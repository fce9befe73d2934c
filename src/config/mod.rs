//! Typed configuration for each data mode.
//!
//! Every struct is a plain value with `const` builders and datasheet defaults;
//! nothing reaches the ASIC until it is handed to the matching `*_mode_config`
//! call on [`crate::Pinnacle`].

mod absolute;
mod anymeas;
mod relative;

pub use absolute::*;
pub use anymeas::*;
pub use relative::*;
