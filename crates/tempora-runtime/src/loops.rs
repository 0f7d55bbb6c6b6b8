//! Re-arming host loops
//!
//! Every loop does its work, then sleeps for its period, then runs again.
//! The next iteration is only armed after the current one returns, so no
//! two iterations of a loop ever overlap and each observes a `now` at least
//! as late as the previous one. All loops stop when the shutdown signal
//! flips or its sender is dropped.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempora_ambient::AmbientEngine;
use tempora_core::Clock;
use tempora_time::{
    ClockAngles, DateCaption, FormattedTime, Stopwatch, StopwatchReadout, StopwatchState,
    TimeEngine,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Counters shared by all loops
#[derive(Clone, Debug, Default)]
pub struct RuntimeStats {
    pub frame_ticks: u64,
    pub time_changes: u64,
    pub stopwatch_polls: u64,
    pub date_refreshes: u64,
    pub audio_blocks: u64,
    pub audio_errors: u64,
}

pub type SharedStats = Arc<Mutex<RuntimeStats>>;

/// Latest stopwatch value as seen by the poll loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopwatchReading {
    pub state: StopwatchState,
    pub elapsed_ms: u64,
    pub readout: StopwatchReadout,
}

impl StopwatchReading {
    fn of(stopwatch: &Stopwatch, elapsed_ms: u64) -> Self {
        StopwatchReading {
            state: stopwatch.state(),
            elapsed_ms,
            readout: StopwatchReadout::from_millis(elapsed_ms),
        }
    }
}

impl Default for StopwatchReading {
    fn default() -> Self {
        StopwatchReading {
            state: StopwatchState::Idle,
            elapsed_ms: 0,
            readout: StopwatchReadout::from_millis(0),
        }
    }
}

/// Sleep for `period`; true if shutdown was requested meanwhile
async fn rearm(period: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(period) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

/// Clock-face refresh loop
///
/// Angles are published every frame. The formatted time is published only
/// when the whole second changes, so `changed()` on that receiver fires at
/// most once per second.
pub fn start_frame_loop(
    clock: Arc<dyn Clock>,
    interval: Duration,
    stats: SharedStats,
    mut shutdown: watch::Receiver<bool>,
) -> (
    watch::Receiver<ClockAngles>,
    watch::Receiver<Option<FormattedTime>>,
    JoinHandle<()>,
) {
    let mut engine = TimeEngine::new();
    let first = engine.tick(clock.as_ref());
    let (angles_tx, angles_rx) = watch::channel(first.angles);
    let (time_tx, time_rx) = watch::channel(first.formatted);

    let handle = tokio::spawn(async move {
        debug!(?interval, "frame loop started");
        loop {
            if rearm(interval, &mut shutdown).await {
                break;
            }

            let tick = engine.tick(clock.as_ref());
            angles_tx.send_replace(tick.angles);

            let mut counters = stats.lock();
            counters.frame_ticks += 1;
            if let Some(formatted) = tick.formatted {
                counters.time_changes += 1;
                time_tx.send_replace(Some(formatted));
            }
        }
        debug!("frame loop stopped");
    });

    (angles_rx, time_rx, handle)
}

/// Stopwatch display poll
///
/// Publishes only when the reading differs from the last one.
pub fn start_stopwatch_poll(
    stopwatch: Arc<Mutex<Stopwatch>>,
    clock: Arc<dyn Clock>,
    period: Duration,
    stats: SharedStats,
    mut shutdown: watch::Receiver<bool>,
) -> (watch::Receiver<StopwatchReading>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(StopwatchReading::default());

    let handle = tokio::spawn(async move {
        debug!(?period, "stopwatch poll started");
        loop {
            let reading = {
                let sw = stopwatch.lock();
                StopwatchReading::of(&sw, sw.sample(clock.epoch_millis()))
            };
            tx.send_if_modified(|current| {
                if *current == reading {
                    false
                } else {
                    *current = reading;
                    true
                }
            });
            stats.lock().stopwatch_polls += 1;

            if rearm(period, &mut shutdown).await {
                break;
            }
        }
        debug!("stopwatch poll stopped");
    });

    (rx, handle)
}

/// Date caption refresh
pub fn start_date_refresh(
    clock: Arc<dyn Clock>,
    period: Duration,
    stats: SharedStats,
    mut shutdown: watch::Receiver<bool>,
) -> (watch::Receiver<DateCaption>, JoinHandle<()>) {
    let (tx, rx) = watch::channel(DateCaption::from_wall(&clock.wall_time()));

    let handle = tokio::spawn(async move {
        loop {
            if rearm(period, &mut shutdown).await {
                break;
            }
            let caption = DateCaption::from_wall(&clock.wall_time());
            tx.send_if_modified(|current| {
                if *current == caption {
                    false
                } else {
                    *current = caption;
                    true
                }
            });
            stats.lock().date_refreshes += 1;
        }
    });

    (rx, handle)
}

/// Feed rendered audio to the context's sink, one block per period
///
/// Does nothing until the engine has created its context. Sink errors are
/// counted and the loop carries on.
pub fn start_audio_pump(
    ambient: Arc<Mutex<AmbientEngine>>,
    block_frames: usize,
    period: Duration,
    stats: SharedStats,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(block_frames, ?period, "audio pump started");
        loop {
            let context = ambient.lock().context();
            if let Some(context) = context {
                let result = context.lock().pump(block_frames);
                let mut counters = stats.lock();
                counters.audio_blocks += 1;
                if result.is_err() {
                    counters.audio_errors += 1;
                }
            }

            if rearm(period, &mut shutdown).await {
                break;
            }
        }
        debug!("audio pump stopped");
    })
}
