//! Widget runtime - wires the engines to their host loops
//!
//! The widget owns the stopwatch, the ambient engine and the insight desk,
//! and hands the display side a set of watch receivers. Button and slider
//! handlers call straight into the widget; the loops only read.

use std::sync::Arc;

use parking_lot::Mutex;
use tempora_ambient::{software_engine, AmbientEngine, NoiseSession};
use tempora_core::{Clock, SystemClock};
use tempora_time::{ClockAngles, DateCaption, FormattedTime, Stopwatch};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    start_audio_pump, start_date_refresh, start_frame_loop, start_stopwatch_poll, InsightDesk,
    InsightSource, InsightState, RuntimeConfig, RuntimeStats, SharedStats, StopwatchReading,
};

/// Receivers for everything the display shows
pub struct WidgetDisplay {
    /// Hand rotations, refreshed every frame
    pub angles: watch::Receiver<ClockAngles>,
    /// "H:MM AM/PM", changes at most once per second
    pub time_text: watch::Receiver<Option<FormattedTime>>,
    pub stopwatch: watch::Receiver<StopwatchReading>,
    pub date: watch::Receiver<DateCaption>,
    tasks: Vec<JoinHandle<()>>,
}

impl WidgetDisplay {
    /// Wait for every loop to exit (after `Widget::shutdown`)
    ///
    /// Returns how many loops ended abnormally (panicked or were aborted).
    pub async fn join(self) -> usize {
        let mut failed = 0;
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("widget loop ended abnormally: {}", e);
                failed += 1;
            }
        }
        failed
    }
}

/// Clock, stopwatch and ambient sound behind one host-facing handle
pub struct Widget<S> {
    config: RuntimeConfig,
    clock: Arc<dyn Clock>,
    stopwatch: Arc<Mutex<Stopwatch>>,
    ambient: Arc<Mutex<AmbientEngine>>,
    insight: InsightDesk<S>,
    stats: SharedStats,
    shutdown: watch::Sender<bool>,
    time_text: Option<watch::Receiver<Option<FormattedTime>>>,
}

impl<S: InsightSource> Widget<S> {
    pub fn new(
        config: RuntimeConfig,
        clock: Arc<dyn Clock>,
        ambient: AmbientEngine,
        insight: S,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let insight = InsightDesk::new(insight, config.insight_timeout);
        Widget {
            config,
            clock,
            stopwatch: Arc::new(Mutex::new(Stopwatch::new())),
            ambient: Arc::new(Mutex::new(ambient)),
            insight,
            stats: SharedStats::default(),
            shutdown,
            time_text: None,
        }
    }

    /// System clock and a software audio context
    pub fn with_defaults(config: RuntimeConfig, insight: S) -> Self {
        let ambient = software_engine(config.noise.clone());
        Self::new(config, Arc::new(SystemClock), ambient, insight)
    }

    /// Show `caption` instead of the error message when an insight fails
    pub fn with_insight_failure_caption(mut self, caption: impl Into<String>) -> Self {
        self.insight = self.insight.with_failure_caption(caption);
        self
    }

    /// Start all host loops; must be called inside a tokio runtime
    pub fn spawn(&mut self) -> WidgetDisplay {
        let cfg = &self.config;

        let (angles, time_text, frame_task) = start_frame_loop(
            Arc::clone(&self.clock),
            cfg.frame_interval,
            Arc::clone(&self.stats),
            self.shutdown.subscribe(),
        );
        let (stopwatch, poll_task) = start_stopwatch_poll(
            Arc::clone(&self.stopwatch),
            Arc::clone(&self.clock),
            cfg.stopwatch_poll,
            Arc::clone(&self.stats),
            self.shutdown.subscribe(),
        );
        let (date, date_task) = start_date_refresh(
            Arc::clone(&self.clock),
            cfg.date_refresh,
            Arc::clone(&self.stats),
            self.shutdown.subscribe(),
        );
        let pump_task = start_audio_pump(
            Arc::clone(&self.ambient),
            cfg.audio_block_frames,
            cfg.audio_block_period(),
            Arc::clone(&self.stats),
            self.shutdown.subscribe(),
        );

        info!(
            frame_interval = ?cfg.frame_interval,
            stopwatch_poll = ?cfg.stopwatch_poll,
            "widget loops started"
        );

        self.time_text = Some(time_text.clone());
        WidgetDisplay {
            angles,
            time_text,
            stopwatch,
            date,
            tasks: vec![frame_task, poll_task, date_task, pump_task],
        }
    }

    /// Ask every loop to stop after its current iteration
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
        info!("widget loops stopping");
    }

    // Stopwatch controls

    pub fn stopwatch_start(&self) {
        self.stopwatch.lock().start(self.clock.epoch_millis());
    }

    pub fn stopwatch_pause(&self) {
        self.stopwatch.lock().pause(self.clock.epoch_millis());
    }

    pub fn stopwatch_toggle(&self) {
        self.stopwatch.lock().toggle(self.clock.epoch_millis());
    }

    pub fn stopwatch_reset(&self) {
        self.stopwatch.lock().reset();
    }

    pub fn stopwatch_elapsed(&self) -> u64 {
        self.stopwatch.lock().sample(self.clock.epoch_millis())
    }

    // Ambient controls

    pub fn ambient_start(&self, volume: f32) {
        self.ambient.lock().start(volume);
    }

    pub fn ambient_stop(&self) {
        self.ambient.lock().stop();
    }

    pub fn ambient_toggle(&self) {
        self.ambient.lock().toggle();
    }

    pub fn ambient_set_volume(&self, volume: f32) {
        self.ambient.lock().set_volume(volume);
    }

    pub fn ambient_session(&self) -> NoiseSession {
        self.ambient.lock().session()
    }

    pub fn ambient(&self) -> Arc<Mutex<AmbientEngine>> {
        Arc::clone(&self.ambient)
    }

    // Insight

    /// Request a caption for the time currently on the clock face
    pub async fn request_insight(&self) -> InsightState {
        let current = self
            .time_text
            .as_ref()
            .and_then(|rx| rx.borrow().clone())
            .unwrap_or_else(|| FormattedTime::from_wall(&self.clock.wall_time()));
        self.insight.request(&current).await
    }

    pub fn insight_state(&self) -> InsightState {
        self.insight.state()
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats.lock().clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempora_core::ManualClock;
    use tempora_time::TimeEngine;

    fn display_with(tasks: Vec<JoinHandle<()>>) -> WidgetDisplay {
        let clock = ManualClock::new(tempora_core::EpochMillis::ZERO);
        let tick = TimeEngine::new().tick(&clock);
        WidgetDisplay {
            angles: watch::channel(tick.angles).1,
            time_text: watch::channel(tick.formatted).1,
            stopwatch: watch::channel(StopwatchReading::default()).1,
            date: watch::channel(DateCaption::from_wall(&clock.wall_time())).1,
            tasks,
        }
    }

    #[tokio::test]
    async fn test_join_reports_failed_loops() {
        let ok = tokio::spawn(async {});
        let crashed = tokio::spawn(async { panic!("render loop fault") });

        assert_eq!(display_with(vec![ok, crashed]).join().await, 1);
    }

    #[tokio::test]
    async fn test_join_clean_exit() {
        let tasks = (0..3).map(|_| tokio::spawn(async {})).collect();
        assert_eq!(display_with(tasks).join().await, 0);
    }
}
