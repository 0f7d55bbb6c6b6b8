//! Runtime configuration

use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tempora_ambient::NoiseConfig;
use tempora_core::{TemporaError, TemporaResult};

/// Logging setup
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".into(),
            json: false,
        }
    }
}

/// Host runtime configuration
///
/// Durations are written as humantime strings ("16ms", "1m") in JSON.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Delay between clock-face refreshes
    #[serde(deserialize_with = "human_duration")]
    pub frame_interval: Duration,
    /// Stopwatch display poll period
    #[serde(deserialize_with = "human_duration")]
    pub stopwatch_poll: Duration,
    /// Date caption refresh period
    #[serde(deserialize_with = "human_duration")]
    pub date_refresh: Duration,
    /// Upper bound on one insight request
    #[serde(deserialize_with = "human_duration")]
    pub insight_timeout: Duration,
    /// Frames rendered per audio pump iteration
    pub audio_block_frames: usize,
    pub noise: NoiseConfig,
    pub logging: LoggingConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            frame_interval: Duration::from_millis(16),
            stopwatch_poll: Duration::from_millis(10),
            date_refresh: Duration::from_secs(60),
            insight_timeout: Duration::from_secs(10),
            audio_block_frames: 512,
            noise: NoiseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Configuration for battery-constrained hosts
    pub fn low_power() -> Self {
        RuntimeConfig {
            frame_interval: Duration::from_millis(33),
            stopwatch_poll: Duration::from_millis(50),
            audio_block_frames: 2048,
            ..Self::default()
        }
    }

    /// Parse from JSON; absent fields take their defaults
    pub fn from_json_str(json: &str) -> TemporaResult<Self> {
        let config: RuntimeConfig =
            serde_json::from_str(json).map_err(|e| TemporaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TemporaResult<()> {
        let periods = [
            ("frame_interval", self.frame_interval),
            ("stopwatch_poll", self.stopwatch_poll),
            ("date_refresh", self.date_refresh),
            ("insight_timeout", self.insight_timeout),
        ];
        for (name, period) in periods {
            if period.is_zero() {
                return Err(TemporaError::InvalidConfig(format!("{} must be positive", name)));
            }
        }
        if self.audio_block_frames == 0 {
            return Err(TemporaError::InvalidConfig(
                "audio_block_frames must be positive".into(),
            ));
        }
        self.validate_noise()
    }

    fn validate_noise(&self) -> TemporaResult<()> {
        let noise = &self.noise;
        let positive = [
            ("noise.buffer_seconds", noise.buffer_seconds),
            ("noise.cutoff_hz", noise.cutoff_hz),
            ("noise.fade_in_secs", noise.fade_in_secs),
            ("noise.fade_out_secs", noise.fade_out_secs),
            ("noise.volume_time_constant", noise.volume_time_constant),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TemporaError::InvalidConfig(format!(
                    "{} must be finite and positive",
                    name
                )));
            }
        }
        if !noise.q_db.is_finite() {
            return Err(TemporaError::InvalidConfig("noise.q_db must be finite".into()));
        }
        if !(noise.gain_floor > 0.0 && noise.gain_floor < 1.0) {
            return Err(TemporaError::InvalidConfig(
                "noise.gain_floor must lie in (0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&noise.default_volume) {
            return Err(TemporaError::InvalidConfig(
                "noise.default_volume must lie in [0, 1]".into(),
            ));
        }
        if (noise.sample_rate as f64) <= 2.0 * noise.cutoff_hz {
            return Err(TemporaError::InvalidConfig(format!(
                "noise.sample_rate {} puts cutoff {} Hz above Nyquist",
                noise.sample_rate, noise.cutoff_hz
            )));
        }
        Ok(())
    }

    /// Wall-clock length of one audio block
    pub fn audio_block_period(&self) -> Duration {
        let rate = self.noise.sample_rate.max(1) as f64;
        Duration::from_secs_f64(self.audio_block_frames as f64 / rate)
    }
}

fn human_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}
