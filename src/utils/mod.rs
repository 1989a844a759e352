//! Utility functions and helpers
//!
//! This module contains timestamp utilities and the tracing setup.

pub mod logging;
pub mod time;

pub use logging::init_subscriber;
pub use time::{days_to_duration, format_utc, is_valid_format, unix_millis};
