//! Insight requests - a short caption for the current time from an external source
//!
//! The source is opaque: given a time string it eventually yields a caption
//! or fails. Failures never reach the engines; they only change what the
//! caption area shows.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempora_core::{TemporaError, TemporaResult};
use tempora_time::FormattedTime;
use tracing::{debug, warn};

/// Caption shown when the source answers with nothing
pub const EMPTY_CAPTION: &str = "Time flows endlessly.";

/// Error text shown when the source fails
pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the stars.";

/// Caption for hosts that prefer a quiet fallback over an error
pub const SOFT_FAILURE_CAPTION: &str = "The moment is now.";

/// Something that writes a caption for a time of day
pub trait InsightSource: Send + Sync + 'static {
    fn caption(&self, time: &FormattedTime) -> impl Future<Output = TemporaResult<String>> + Send;
}

/// What the caption area shows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsightState {
    pub text: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Serializes requests to one `InsightSource`
///
/// At most one request is in flight; asking again while loading returns the
/// current state untouched.
pub struct InsightDesk<S> {
    source: Arc<S>,
    state: Arc<Mutex<InsightState>>,
    timeout: Duration,
    /// Caption shown instead of an error when the source fails
    failure_caption: Option<String>,
}

impl<S> Clone for InsightDesk<S> {
    fn clone(&self) -> Self {
        InsightDesk {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            timeout: self.timeout,
            failure_caption: self.failure_caption.clone(),
        }
    }
}

/// Clears `loading` if a request is dropped before it completes
struct InFlight<'a> {
    state: &'a Mutex<InsightState>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().loading = false;
            debug!("insight request abandoned");
        }
    }
}

impl<S: InsightSource> InsightDesk<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        InsightDesk {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(InsightState::default())),
            timeout,
            failure_caption: None,
        }
    }

    /// Show `caption` as the text on failure, with no error
    pub fn with_failure_caption(mut self, caption: impl Into<String>) -> Self {
        self.failure_caption = Some(caption.into());
        self
    }

    pub fn state(&self) -> InsightState {
        self.state.lock().clone()
    }

    /// Ask for a caption for `time` and return the resulting state
    pub async fn request(&self, time: &FormattedTime) -> InsightState {
        {
            let mut state = self.state.lock();
            if state.loading {
                return state.clone();
            }
            state.loading = true;
            state.error = None;
        }
        let mut in_flight = InFlight {
            state: &self.state,
            armed: true,
        };

        let outcome = match tokio::time::timeout(self.timeout, self.source.caption(time)).await {
            Ok(result) => result,
            Err(_) => Err(TemporaError::InsightFailed(format!(
                "no answer within {}",
                humantime::format_duration(self.timeout)
            ))),
        };

        let mut state = self.state.lock();
        *state = match outcome {
            Ok(text) => {
                let text = text.trim();
                let text = if text.is_empty() { EMPTY_CAPTION } else { text };
                debug!(time = %time, "insight received");
                InsightState {
                    text: Some(text.to_string()),
                    loading: false,
                    error: None,
                }
            }
            Err(e) => {
                warn!("insight request failed: {}", e);
                match &self.failure_caption {
                    Some(caption) => InsightState {
                        text: Some(caption.clone()),
                        loading: false,
                        error: None,
                    },
                    None => InsightState {
                        text: None,
                        loading: false,
                        error: Some(UNREACHABLE_MESSAGE.to_string()),
                    },
                }
            }
        };
        in_flight.armed = false;
        state.clone()
    }
}
