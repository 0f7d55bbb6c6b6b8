//! Tempora Runtime - host loops and collaborators around the engines
//!
//! This crate drives the engines the way a display host would:
//! - a re-arming frame loop for the clock face
//! - a fixed-period poll for the stopwatch readout
//! - a date caption refresh
//! - an audio pump feeding the ambient engine's output
//! - insight requests with a single-flight guard and fallbacks
//!
//! plus configuration and logging setup.

pub mod config;
pub mod logging;
pub mod insight;
pub mod loops;
pub mod widget;

pub use config::*;
pub use logging::*;
pub use insight::*;
pub use loops::*;
pub use widget::*;
