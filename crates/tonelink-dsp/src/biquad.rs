//! Biquad (bi-quadratic) filter structure.
//!
//! Provides a second-order IIR filter configured as a narrow band-pass,
//! the shape the AFSK demodulator uses to separate the mark and space
//! tones before envelope detection.
//!
//! Coefficient calculation uses the RBJ Audio EQ Cookbook formulas.

use core::f32::consts::PI;
use libm::{cosf, sinf};

/// Generic biquad filter coefficients and state.
///
/// Implements the Direct Form I biquad structure:
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    /// Feedforward coefficients
    b0: f32,
    b1: f32,
    b2: f32,

    /// Feedback coefficients (normalized by a0)
    a1: f32,
    a2: f32,

    /// Input delay line: x[n-1], x[n-2]
    x1: f32,
    x2: f32,

    /// Output delay line: y[n-1], y[n-2]
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Creates a new biquad with passthrough coefficients.
    ///
    /// Initial state: `y[n] = x[n]` (no filtering)
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a band-pass biquad centered on `frequency` with the given
    /// passband `bandwidth` (both in Hz).
    ///
    /// The Q factor is derived as `frequency / bandwidth`. For the modem's
    /// tone filters this is the only configuration ever used, so it gets a
    /// dedicated constructor.
    pub fn bandpass(frequency: f32, bandwidth: f32, sample_rate: f32) -> Self {
        let q = frequency / bandwidth;
        let (b0, b1, b2, a0, a1, a2) = bandpass_coefficients(frequency, q, sample_rate);
        let mut filter = Self::new();
        filter.set_coefficients(b0, b1, b2, a0, a1, a2);
        filter
    }

    /// Sets the biquad coefficients.
    ///
    /// Note: This function normalizes by a0 internally.
    pub fn set_coefficients(&mut self, b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Processes a single sample through the biquad filter.
    ///
    /// Uses Direct Form I structure for numerical stability.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter state (delay lines) without changing coefficients.
    ///
    /// The demodulator resets its filter bank before every receive buffer so
    /// consecutive frames do not smear into each other.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates band-pass filter coefficients using the RBJ cookbook formula.
///
/// This version has constant 0dB peak gain.
///
/// # Arguments
///
/// * `frequency` - Center frequency in Hz
/// * `q` - Q factor (bandwidth = frequency / Q)
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
///
/// (b0, b1, b2, a0, a1, a2) coefficients
pub fn bandpass_coefficients(
    frequency: f32,
    q: f32,
    sample_rate: f32,
) -> (f32, f32, f32, f32, f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    let cos_omega = cosf(omega);
    let sin_omega = sinf(omega);
    let alpha = sin_omega / (2.0 * q);

    let b0 = alpha;
    let b1 = 0.0;
    let b2 = -alpha;
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_omega;
    let a2 = 1.0 - alpha;

    (b0, b1, b2, a0, a1, a2)
}
