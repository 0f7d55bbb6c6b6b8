//! Ambient Noise Engine - one looping noise session with fade envelopes

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tempora_core::TemporaResult;
use tracing::{debug, info, warn};

use crate::{
    AudioContext, BiquadLowpass, ContextFactory, ContextState, GainParam, LoopingNoise,
    NoiseBuffer, NullSink, SharedContext, VoiceId,
};

/// Noise engine configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Sample rate of a context created by the default factory
    pub sample_rate: u32,
    /// Length of the looped white-noise buffer
    pub buffer_seconds: f64,
    /// Low-pass cutoff
    pub cutoff_hz: f64,
    /// Low-pass resonance, in dB
    pub q_db: f64,
    /// Near-zero gain that exponential ramps start from and end at
    pub gain_floor: f32,
    /// Fade-in duration on start
    pub fade_in_secs: f64,
    /// Fade-out duration on stop; the voice is released after this
    pub fade_out_secs: f64,
    /// Time constant of the smoothed volume approach
    pub volume_time_constant: f64,
    /// Volume used until the host sets one
    pub default_volume: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            sample_rate: 44_100,
            buffer_seconds: 5.0,
            cutoff_hz: 400.0,
            q_db: 1.0,
            gain_floor: 1e-3,
            fade_in_secs: 1.0,
            fade_out_secs: 0.5,
            volume_time_constant: 0.1,
            default_volume: 0.5,
        }
    }
}

impl NoiseConfig {
    /// Deeper rumble for small speakers that cannot reproduce the default
    pub fn deep() -> Self {
        NoiseConfig {
            cutoff_hz: 250.0,
            fade_in_secs: 2.0,
            ..Self::default()
        }
    }
}

/// Control-side state of the one noise session
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseSession {
    pub playing: bool,
    /// Last requested volume in [0, 1]
    pub volume: f32,
    /// Voice currently owned by the session
    pub voice: Option<VoiceId>,
}

/// Ambient noise engine
///
/// The audio context is created on the first `start()` and lives for the
/// rest of the engine's life. If it cannot be created the engine stays
/// silent and not playing.
pub struct AmbientEngine {
    config: NoiseConfig,
    factory: Box<dyn ContextFactory>,
    context: Option<SharedContext>,
    session: NoiseSession,
    rng: StdRng,
}

impl AmbientEngine {
    pub fn new(config: NoiseConfig, factory: Box<dyn ContextFactory>) -> Self {
        Self::with_rng(config, factory, StdRng::from_entropy())
    }

    /// Engine with a deterministic noise generator
    pub fn with_seed(config: NoiseConfig, factory: Box<dyn ContextFactory>, seed: u64) -> Self {
        Self::with_rng(config, factory, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: NoiseConfig, factory: Box<dyn ContextFactory>, rng: StdRng) -> Self {
        let volume = clamp_volume(config.default_volume);
        AmbientEngine {
            config,
            factory,
            context: None,
            session: NoiseSession {
                playing: false,
                volume,
                voice: None,
            },
            rng,
        }
    }

    /// Start playing at `volume`
    ///
    /// While already playing no second voice is created; a suspended
    /// context is still resumed.
    pub fn start(&mut self, volume: f32) {
        if self.session.playing {
            self.resume();
            return;
        }
        self.session.volume = clamp_volume(volume);

        let Some(context) = self.ensure_context() else {
            return;
        };
        let mut ctx = context.lock();
        ctx.resume();

        let now = ctx.current_time();
        let sample_rate = ctx.sample_rate();
        let buffer =
            NoiseBuffer::with_duration(sample_rate, self.config.buffer_seconds, &mut self.rng);
        let filter = BiquadLowpass::new(sample_rate, self.config.cutoff_hz, self.config.q_db);

        let floor = self.config.gain_floor;
        let mut gain = GainParam::new(floor, floor);
        gain.exponential_ramp_to(self.session.volume, now, now + self.config.fade_in_secs);

        let id = ctx.add_voice(LoopingNoise::new(buffer), filter, gain);
        self.session.voice = Some(id);
        self.session.playing = true;

        info!(volume = self.session.volume, voice = id.0, "ambient noise started");
    }

    /// Start with the last stored volume
    pub fn play(&mut self) {
        self.start(self.session.volume);
    }

    /// Fade out and release the voice after the fade; no-op unless playing
    ///
    /// Starting again before the fade ends does not cancel it: the old voice
    /// finishes fading on its own and the new voice is the session's only
    /// active one.
    pub fn stop(&mut self) {
        if !self.session.playing {
            return;
        }
        self.session.playing = false;

        let (Some(context), Some(id)) = (&self.context, self.session.voice.take()) else {
            return;
        };
        let mut ctx = context.lock();
        let now = ctx.current_time();
        let release_at = now + self.config.fade_out_secs;

        if let Some(voice) = ctx.voice_mut(id) {
            voice
                .gain_mut()
                .exponential_ramp_to(self.config.gain_floor, now, release_at);
        }
        ctx.schedule_stop(id, release_at);

        info!(voice = id.0, release_at, "ambient noise stopping");
    }

    /// Single-button play/stop
    pub fn toggle(&mut self) {
        if self.session.playing {
            self.stop();
        } else {
            self.play();
        }
    }

    /// Store a new volume; while playing, glide toward it
    pub fn set_volume(&mut self, volume: f32) {
        let volume = clamp_volume(volume);
        self.session.volume = volume;

        if !self.session.playing {
            return;
        }
        let (Some(context), Some(id)) = (&self.context, self.session.voice) else {
            return;
        };
        let mut ctx = context.lock();
        let now = ctx.current_time();
        if let Some(voice) = ctx.voice_mut(id) {
            voice
                .gain_mut()
                .set_target(volume, now, self.config.volume_time_constant);
            debug!(volume, "ambient volume target set");
        }
    }

    /// Freeze audio output (e.g. host went to background); next start resumes it
    pub fn suspend(&mut self) {
        if let Some(context) = &self.context {
            context.lock().suspend();
        }
    }

    pub fn resume(&mut self) {
        if let Some(context) = &self.context {
            context.lock().resume();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.playing
    }

    pub fn volume(&self) -> f32 {
        self.session.volume
    }

    pub fn session(&self) -> NoiseSession {
        self.session
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    /// The audio context, if one has been created
    pub fn context(&self) -> Option<SharedContext> {
        self.context.clone()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(|c| c.lock().state())
    }

    /// Create the context on first use
    fn ensure_context(&mut self) -> Option<SharedContext> {
        if let Some(context) = &self.context {
            return Some(context.clone());
        }

        match self.factory.create() {
            Ok(ctx) => {
                info!(sample_rate = ctx.sample_rate(), "audio context created");
                let context: SharedContext = Arc::new(Mutex::new(ctx));
                self.context = Some(context.clone());
                Some(context)
            }
            Err(e) => {
                warn!("ambient noise unavailable: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for AmbientEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmbientEngine")
            .field("session", &self.session)
            .field("context", &self.context.as_ref().map(|c| format!("{:?}", c.lock())))
            .finish()
    }
}

/// Volume limited to [0, 1]; NaN and infinities read as silence
fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Build an engine that renders through a context of its own sample rate
pub fn software_engine(config: NoiseConfig) -> AmbientEngine {
    let sample_rate = config.sample_rate;
    AmbientEngine::new(
        config,
        Box::new(move || -> TemporaResult<AudioContext> {
            Ok(AudioContext::new(sample_rate, Box::new(NullSink)))
        }),
    )
}
