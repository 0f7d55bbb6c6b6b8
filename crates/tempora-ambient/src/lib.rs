//! Tempora Ambient - procedural low-frequency noise
//!
//! A looped white-noise buffer is shaped by a low-pass filter into a deep,
//! brown-ish rumble and played through a gain envelope:
//! - exponential fade in on start, fade out on stop
//! - the voice is released only after its fade-out has fully rendered
//! - volume changes glide with a first-order approach
//!
//! The audio context is created on first use, so hosts that need a user
//! gesture before touching audio hardware can construct the engine early.

pub mod noise;
pub mod filter;
pub mod param;
pub mod context;
pub mod engine;

pub use noise::*;
pub use filter::*;
pub use param::*;
pub use context::*;
pub use engine::*;
