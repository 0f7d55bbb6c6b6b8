//! Noise source - a fixed white-noise buffer played on a hard loop

use std::sync::Arc;

use rand::Rng;

/// Block of independent uniform samples in [-1, 1]
#[derive(Clone, Debug)]
pub struct NoiseBuffer {
    samples: Arc<[f32]>,
}

impl NoiseBuffer {
    /// Fill `len` samples from `rng`
    pub fn generate<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let samples: Vec<f32> = (0..len.max(1))
            .map(|_| rng.gen_range(-1.0f32..=1.0))
            .collect();
        NoiseBuffer {
            samples: samples.into(),
        }
    }

    /// Buffer long enough for `seconds` of audio at `sample_rate`
    pub fn with_duration<R: Rng + ?Sized>(sample_rate: u32, seconds: f64, rng: &mut R) -> Self {
        let len = (sample_rate as f64 * seconds).round() as usize;
        Self::generate(len, rng)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Playback cursor over a `NoiseBuffer` that wraps at the end
///
/// The loop point gets no crossfade; the seam is a plain jump from the last
/// sample back to the first.
#[derive(Clone, Debug)]
pub struct LoopingNoise {
    buffer: NoiseBuffer,
    position: usize,
    loops: u64,
}

impl LoopingNoise {
    pub fn new(buffer: NoiseBuffer) -> Self {
        LoopingNoise {
            buffer,
            position: 0,
            loops: 0,
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let sample = self.buffer.samples[self.position];
        self.position += 1;
        if self.position == self.buffer.len() {
            self.position = 0;
            self.loops += 1;
        }
        sample
    }

    /// Completed passes over the buffer
    pub fn loops(&self) -> u64 {
        self.loops
    }

    pub fn buffer(&self) -> &NoiseBuffer {
        &self.buffer
    }
}
