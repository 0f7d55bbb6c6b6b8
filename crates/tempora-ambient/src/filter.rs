//! Biquad low-pass filter
//!
//! Coefficients follow the RBJ audio-EQ cookbook. Q is given in decibels
//! and converted with `10^(q_db / 20)`, the way browser audio graphs
//! interpret the low-pass Q.

use std::f64::consts::PI;

/// Second-order low-pass section, transposed direct form II
#[derive(Clone, Debug)]
pub struct BiquadLowpass {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
    cutoff_hz: f64,
}

impl BiquadLowpass {
    pub fn new(sample_rate: u32, cutoff_hz: f64, q_db: f64) -> Self {
        let sample_rate = sample_rate.max(1) as f64;
        let nyquist = sample_rate / 2.0;
        let cutoff = cutoff_hz.clamp(1.0, (nyquist * 0.999).max(1.0));
        let q = 10f64.powf(q_db / 20.0).max(1e-4);

        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let a0 = 1.0 + alpha;
        let b0 = (1.0 - cos_w0) / 2.0 / a0;
        let b1 = (1.0 - cos_w0) / a0;
        let a1 = -2.0 * cos_w0 / a0;
        let a2 = (1.0 - alpha) / a0;

        BiquadLowpass {
            b0: b0 as f32,
            b1: b1 as f32,
            b2: b0 as f32,
            a1: a1 as f32,
            a2: a2 as f32,
            z1: 0.0,
            z2: 0.0,
            cutoff_hz: cutoff,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}
