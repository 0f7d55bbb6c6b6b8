//! Tempora Time Engine - clock face and stopwatch
//!
//! This crate implements:
//! - Continuous hand angles for an analog clock face
//! - "H:MM AM/PM" formatting, emitted once per whole-second change
//! - Date captions and per-field time decomposition
//! - A millisecond stopwatch that stays drift-free across pause/resume

pub mod clock;
pub mod engine;
pub mod stopwatch;

pub use clock::*;
pub use engine::*;
pub use stopwatch::*;
