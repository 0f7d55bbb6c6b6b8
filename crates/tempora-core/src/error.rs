//! Error types for Tempora

use thiserror::Error;

/// Core Tempora errors
///
/// The clock, stopwatch and noise engines never fail on their own; these
/// variants cover the collaborators around them.
#[derive(Error, Debug)]
pub enum TemporaError {
    // Audio errors
    #[error("Audio backend unavailable: {0}")]
    AudioUnavailable(String),

    #[error("Audio sink write failed: {0}")]
    SinkWrite(String),

    // Insight errors
    #[error("Insight request failed: {0}")]
    InsightFailed(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for Tempora operations
pub type TemporaResult<T> = Result<T, TemporaError>;
