//! Envelope detector for tracking tone amplitude.
//!
//! The AFSK demodulator runs one of these behind each tone filter: the
//! rectified filter output is smoothed with a one-pole lowpass whose time
//! constant is a fraction of a bit interval, yielding a per-sample energy
//! estimate the bit slicer can compare.

use libm::expf;

/// Rectify-and-smooth envelope detector.
///
/// Exponential smoothing of the absolute input value:
///
/// ```text
/// y[n] = coeff * y[n-1] + (1 - coeff) * |x[n]|
/// ```
///
/// where `coeff = exp(-1 / (tau_seconds * sample_rate))`.
///
/// The single symmetric time constant (rather than separate attack and
/// release) keeps the detector's group delay identical on rising and falling
/// edges, which matters for bit-timing recovery: an asymmetric detector
/// would skew mark-to-space transitions relative to space-to-mark ones.
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    /// Current envelope level (linear)
    envelope: f32,
    /// Smoothing coefficient
    coeff: f32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Time constant in seconds (for recalculation)
    tau: f32,
}

impl EnvelopeDetector {
    /// Create a detector with the given smoothing time constant in seconds.
    ///
    /// For AFSK demodulation the time constant should be a fraction of a bit
    /// interval: long enough to suppress ripple at twice the tone frequency,
    /// short enough that the envelope settles well inside one bit.
    pub fn new(sample_rate: f32, tau_seconds: f32) -> Self {
        let mut detector = Self {
            envelope: 0.0,
            coeff: 0.0,
            sample_rate,
            tau: tau_seconds,
        };
        detector.recalculate_coeff();
        detector
    }

    /// Set the smoothing time constant in seconds.
    pub fn set_time_constant(&mut self, tau_seconds: f32) {
        self.tau = tau_seconds.max(1e-6);
        self.recalculate_coeff();
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Process a sample and return the current envelope level.
    ///
    /// Returns the envelope amplitude (always non-negative).
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let rectified = input.abs();
        self.envelope = self.coeff * self.envelope + (1.0 - self.coeff) * rectified;
        self.envelope
    }

    /// Get current envelope level without processing new input.
    pub fn level(&self) -> f32 {
        self.envelope
    }

    /// Reset the envelope to zero.
    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }

    fn recalculate_coeff(&mut self) {
        self.coeff = expf(-1.0 / (self.tau * self.sample_rate));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rises_toward_input() {
        let mut env = EnvelopeDetector::new(48000.0, 0.001);
        let mut level = 0.0;
        for _ in 0..500 {
            level = env.process(1.0);
        }
        assert!(level > 0.9, "envelope should rise, got {level}");
    }

    #[test]
    fn decays_on_silence() {
        let mut env = EnvelopeDetector::new(48000.0, 0.001);
        for _ in 0..500 {
            env.process(1.0);
        }
        let mut level = 0.0;
        for _ in 0..500 {
            level = env.process(0.0);
        }
        assert!(level < 0.01, "envelope should decay, got {level}");
    }

    #[test]
    fn rectifies_negative_input() {
        let mut env = EnvelopeDetector::new(48000.0, 0.001);
        let level = env.process(-0.5);
        assert!(level > 0.0);
    }

    #[test]
    fn reset_clears_level() {
        let mut env = EnvelopeDetector::new(48000.0, 0.001);
        for _ in 0..100 {
            env.process(1.0);
        }
        env.reset();
        assert_eq!(env.level(), 0.0);
    }

    /// Symmetry: rise to a level and decay from it take the same time.
    #[test]
    fn symmetric_time_constant() {
        let mut env = EnvelopeDetector::new(48000.0, 0.001);

        let mut rise_samples = 0;
        while env.level() < 0.5 {
            env.process(1.0);
            rise_samples += 1;
        }

        let mut fall_samples = 0;
        while env.level() > 0.5 * 0.5 {
            env.process(0.0);
            fall_samples += 1;
        }

        let ratio = rise_samples as f32 / fall_samples as f32;
        assert!(
            (0.8..=1.2).contains(&ratio),
            "rise {rise_samples} and fall {fall_samples} should be comparable"
        );
    }
}
