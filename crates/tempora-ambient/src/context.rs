//! Audio context - software render graph feeding an output sink
//!
//! The context owns every sounding voice and an audio clock that advances
//! only as samples are rendered. Voices scheduled to stop are released
//! once rendering reaches their stop time, never earlier.

use std::sync::Arc;

use parking_lot::Mutex;
use tempora_core::{TemporaError, TemporaResult};
use tracing::{debug, warn};

use crate::{BiquadLowpass, GainParam, LoopingNoise};

/// Whether the context is producing audio
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextState {
    /// Clock frozen, output silent (e.g. awaiting a user gesture)
    Suspended,
    /// Rendering
    Running,
}

/// Identifier of a voice within one context
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// One signal chain: looping noise -> low-pass -> gain
#[derive(Debug)]
pub struct Voice {
    id: VoiceId,
    source: LoopingNoise,
    filter: BiquadLowpass,
    gain: GainParam,
    /// Audio-clock time after which the voice is released
    stop_at: Option<f64>,
}

impl Voice {
    pub fn new(id: VoiceId, source: LoopingNoise, filter: BiquadLowpass, gain: GainParam) -> Self {
        Voice {
            id,
            source,
            filter,
            gain,
            stop_at: None,
        }
    }

    #[inline]
    fn next_sample(&mut self, t: f64) -> f32 {
        let shaped = self.filter.process(self.source.next_sample());
        shaped * self.gain.value_at(t)
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn gain(&self) -> &GainParam {
        &self.gain
    }

    pub fn gain_mut(&mut self) -> &mut GainParam {
        &mut self.gain
    }

    pub fn stop_at(&self) -> Option<f64> {
        self.stop_at
    }

    pub fn is_releasing(&self) -> bool {
        self.stop_at.is_some()
    }
}

/// Destination for rendered mono blocks
pub trait AudioSink: Send {
    fn write(&mut self, block: &[f32]) -> TemporaResult<()>;
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn write(&mut self, _block: &[f32]) -> TemporaResult<()> {
        Ok(())
    }
}

/// Keeps every rendered sample; clones share the same buffer
#[derive(Clone, Debug, Default)]
pub struct CaptureSink {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<f32> {
        self.samples.lock().clone()
    }

    pub fn take(&self) -> Vec<f32> {
        std::mem::take(&mut *self.samples.lock())
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

impl AudioSink for CaptureSink {
    fn write(&mut self, block: &[f32]) -> TemporaResult<()> {
        self.samples.lock().extend_from_slice(block);
        Ok(())
    }
}

/// Mixing graph with its own sample clock
pub struct AudioContext {
    sample_rate: u32,
    /// Frames rendered while running
    frames: u64,
    state: ContextState,
    voices: Vec<Voice>,
    next_voice: u64,
    sink: Box<dyn AudioSink>,
    scratch: Vec<f32>,
}

impl AudioContext {
    /// A new context starts suspended, like one created before any user gesture
    pub fn new(sample_rate: u32, sink: Box<dyn AudioSink>) -> Self {
        AudioContext {
            sample_rate: sample_rate.max(1),
            frames: 0,
            state: ContextState::Suspended,
            voices: Vec::new(),
            next_voice: 0,
            sink,
            scratch: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Audio clock in seconds
    pub fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn resume(&mut self) {
        if self.state == ContextState::Suspended {
            debug!(time = self.current_time(), "audio context resumed");
            self.state = ContextState::Running;
        }
    }

    pub fn suspend(&mut self) {
        if self.state == ContextState::Running {
            debug!(time = self.current_time(), "audio context suspended");
            self.state = ContextState::Suspended;
        }
    }

    /// Connect a new voice to the output
    pub fn add_voice(
        &mut self,
        source: LoopingNoise,
        filter: BiquadLowpass,
        gain: GainParam,
    ) -> VoiceId {
        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.push(Voice::new(id, source, filter, gain));
        id
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == id)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.iter_mut().find(|v| v.id == id)
    }

    /// Release `id` once the audio clock reaches `at`
    ///
    /// A later call can only bring the stop time forward.
    pub fn schedule_stop(&mut self, id: VoiceId, at: f64) {
        if let Some(voice) = self.voice_mut(id) {
            voice.stop_at = Some(match voice.stop_at {
                Some(existing) => existing.min(at),
                None => at,
            });
        }
    }

    /// Voices still connected, including ones fading out
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Voices with no stop scheduled
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_releasing()).count()
    }

    pub fn releasing_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_releasing()).count()
    }

    /// Fill `out` with the mix; silence without advancing the clock when suspended
    pub fn render(&mut self, out: &mut [f32]) {
        if self.state == ContextState::Suspended {
            out.fill(0.0);
            return;
        }

        for frame in out.iter_mut() {
            let t = self.current_time();
            let mut mix = 0.0;
            for voice in self.voices.iter_mut() {
                if voice.stop_at.map_or(true, |stop| t < stop) {
                    mix += voice.next_sample(t);
                }
            }
            *frame = mix;
            self.frames += 1;
        }

        self.reap();
    }

    /// Render `frames` samples and hand them to the sink
    pub fn pump(&mut self, frames: usize) -> TemporaResult<()> {
        let mut block = std::mem::take(&mut self.scratch);
        block.resize(frames, 0.0);
        self.render(&mut block);
        let result = self.sink.write(&block);
        self.scratch = block;
        if let Err(e) = &result {
            warn!("audio sink write failed: {}", e);
        }
        result
    }

    fn reap(&mut self) {
        let now = self.current_time();
        let before = self.voices.len();
        self.voices
            .retain(|v| v.stop_at.map_or(true, |stop| now < stop));
        let released = before - self.voices.len();
        if released > 0 {
            debug!(released, time = now, "released faded voices");
        }
    }
}

impl std::fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioContext")
            .field("sample_rate", &self.sample_rate)
            .field("time", &self.current_time())
            .field("state", &self.state)
            .field("voices", &self.voices.len())
            .finish()
    }
}

/// Context shared between the control side and the render pump
pub type SharedContext = Arc<Mutex<AudioContext>>;

/// Creates the audio context on first use
pub trait ContextFactory: Send + Sync {
    fn create(&self) -> TemporaResult<AudioContext>;
}

impl<F> ContextFactory for F
where
    F: Fn() -> TemporaResult<AudioContext> + Send + Sync,
{
    fn create(&self) -> TemporaResult<AudioContext> {
        self()
    }
}

/// Factory for a software context writing to a `NullSink`
#[derive(Clone, Copy, Debug)]
pub struct SoftwareContextFactory {
    pub sample_rate: u32,
}

impl ContextFactory for SoftwareContextFactory {
    fn create(&self) -> TemporaResult<AudioContext> {
        Ok(AudioContext::new(self.sample_rate, Box::new(NullSink)))
    }
}

/// Factory that always reports no audio hardware
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableFactory;

impl ContextFactory for UnavailableFactory {
    fn create(&self) -> TemporaResult<AudioContext> {
        Err(TemporaError::AudioUnavailable("no audio device".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoiseBuffer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const SR: u32 = 8_000;

    fn noise_voice(ctx: &mut AudioContext, gain: f32) -> VoiceId {
        let mut rng = StdRng::seed_from_u64(42);
        let source = LoopingNoise::new(NoiseBuffer::with_duration(SR, 0.5, &mut rng));
        let filter = BiquadLowpass::new(SR, 400.0, 1.0);
        ctx.add_voice(source, filter, GainParam::new(gain, 1e-3))
    }

    fn energy(block: &[f32]) -> f32 {
        block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32
    }

    #[test]
    fn test_suspended_is_silent_and_frozen() {
        let mut ctx = AudioContext::new(SR, Box::new(NullSink));
        noise_voice(&mut ctx, 1.0);

        let mut block = vec![1.0; 256];
        ctx.render(&mut block);

        assert!(block.iter().all(|s| *s == 0.0));
        assert_eq!(ctx.current_time(), 0.0);
    }

    #[test]
    fn test_running_renders_and_advances() {
        let mut ctx = AudioContext::new(SR, Box::new(NullSink));
        ctx.resume();
        noise_voice(&mut ctx, 1.0);

        let mut block = vec![0.0; 800];
        ctx.render(&mut block);

        assert!(energy(&block) > 0.0);
        assert!((ctx.current_time() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_voice_released_only_after_stop_time() {
        let mut ctx = AudioContext::new(SR, Box::new(NullSink));
        ctx.resume();
        let id = noise_voice(&mut ctx, 1.0);
        ctx.schedule_stop(id, 0.5);

        let mut block = vec![0.0; 3_992];
        ctx.render(&mut block);
        assert_eq!(ctx.voice_count(), 1);
        assert_eq!(ctx.releasing_voice_count(), 1);

        let mut block = vec![0.0; 8];
        ctx.render(&mut block);
        assert_eq!(ctx.voice_count(), 0);
    }

    #[test]
    fn test_schedule_stop_only_moves_earlier() {
        let mut ctx = AudioContext::new(SR, Box::new(NullSink));
        let id = noise_voice(&mut ctx, 1.0);

        ctx.schedule_stop(id, 1.0);
        ctx.schedule_stop(id, 2.0);
        assert_eq!(ctx.voice(id).and_then(|v| v.stop_at()), Some(1.0));
    }

    #[test]
    fn test_pump_writes_to_sink() {
        let sink = CaptureSink::new();
        let mut ctx = AudioContext::new(SR, Box::new(sink.clone()));
        ctx.resume();
        noise_voice(&mut ctx, 0.5);

        ctx.pump(128).unwrap();
        ctx.pump(128).unwrap();

        assert_eq!(sink.len(), 256);
        assert!(energy(&sink.samples()) > 0.0);
    }

    #[test]
    fn test_closure_factory() {
        let factory = || -> TemporaResult<AudioContext> { Ok(AudioContext::new(SR, Box::new(NullSink))) };
        let ctx = ContextFactory::create(&factory).unwrap();
        assert_eq!(ctx.sample_rate(), SR);

        assert!(UnavailableFactory.create().is_err());
    }
}
