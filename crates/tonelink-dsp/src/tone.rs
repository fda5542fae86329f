//! Phase-continuous tone generation.
//!
//! The AFSK modulator switches between the mark and space frequencies at
//! bit boundaries. If the sinusoid's phase jumped at the switch, the
//! discontinuity would splatter energy across the spectrum and leak into
//! the other tone's filter. [`ToneGenerator`] therefore keeps a running
//! phase accumulator: changing frequency only changes the increment, never
//! the phase itself.

use core::f32::consts::TAU;
use libm::sinf;

/// Phase-continuous sinusoid source.
///
/// # Example
///
/// ```rust
/// use tonelink_dsp::ToneGenerator;
///
/// let mut tone = ToneGenerator::new(48000.0);
/// tone.set_frequency(1200.0);
/// let sample = tone.next_sample();
/// ```
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Frequency in Hz
    frequency: f32,
}

impl ToneGenerator {
    /// Create a new generator with the given sample rate, initially silent
    /// at 0 Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 0.0,
            sample_rate,
            frequency: 0.0,
        }
    }

    /// Set frequency in Hz. The phase accumulator is untouched, so the
    /// output waveform stays continuous across the switch.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.max(0.0);
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Get current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set sample rate and recalculate the phase increment.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Get current phase in [0.0, 1.0).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Produce the next sample and advance the phase accumulator.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let sample = sinf(TAU * self.phase);
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        sample
    }
}
