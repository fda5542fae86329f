//! Linear-interpolation sample-rate conversion.
//!
//! The modem's tones top out at 2.4 kHz while any plausible audio device
//! runs at 44.1 kHz or above, so the signal sits far below Nyquist at
//! either rate and linear interpolation error stays well under the
//! channel noise floor. That makes the classic polyphase FIR machinery
//! unnecessary here.

/// One-shot linear resampling of a complete buffer.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let step = f64::from(from_rate) / f64::from(to_rate);
    let out_len = (samples.len() as f64 / step) as usize;
    let mut out = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let pos = i as f64 * step;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = samples[idx];
        let b = samples.get(idx + 1).copied().unwrap_or(a);
        out.push(a + (b - a) * frac);
    }
    out
}

/// Streaming linear resampler for the capture path.
///
/// Keeps the fractional read position and the last input sample across
/// chunk boundaries, so chunked capture converts without seams.
#[derive(Debug)]
pub struct LinearResampler {
    /// Input samples consumed per output sample.
    step: f64,
    /// Fractional read position relative to the virtual input stream
    /// `[last, chunk...]`.
    pos: f64,
    /// Final sample of the previous chunk.
    last: f32,
}

impl LinearResampler {
    /// Create a resampler converting `from_rate` to `to_rate`.
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        Self {
            step: f64::from(from_rate) / f64::from(to_rate),
            // Virtual index 0 holds the previous chunk's final sample, so
            // the stream proper begins at index 1.
            pos: 1.0,
            last: 0.0,
        }
    }

    /// Whether the conversion is an identity (equal rates).
    pub fn is_identity(&self) -> bool {
        self.step == 1.0
    }

    /// Convert one chunk, carrying state across calls.
    pub fn process(&mut self, chunk: &[f32]) -> Vec<f32> {
        if self.is_identity() {
            return chunk.to_vec();
        }
        if chunk.is_empty() {
            return Vec::new();
        }

        // Virtual input: previous chunk's last sample, then this chunk.
        let mut out = Vec::with_capacity((chunk.len() as f64 / self.step) as usize + 2);
        let last_index = chunk.len() as f64; // index of chunk's final sample in virtual stream
        while self.pos < last_index {
            let idx = self.pos as usize;
            let frac = (self.pos - idx as f64) as f32;
            let a = if idx == 0 { self.last } else { chunk[idx - 1] };
            let b = chunk[idx];
            out.push(a + (b - a) * frac);
            self.pos += self.step;
        }
        self.pos -= last_index;
        self.last = chunk[chunk.len() - 1];
        out
    }

    /// Reset position and history.
    pub fn reset(&mut self) {
        self.pos = 1.0;
        self.last = 0.0;
    }
}
