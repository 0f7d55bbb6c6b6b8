//! Tempora Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout Tempora:
//! - Time primitives (WallTime, EpochMillis)
//! - Clock sources (system and manual)
//! - Error types

pub mod time;
pub mod error;

pub use time::*;
pub use error::*;
