//! Presentation-facing API.
//!
//! This module provides the result bundle types and the log stream a
//! dashboard or terminal consumes.

pub mod types;
pub mod logs;

pub use types::*;
pub use logs::*;
