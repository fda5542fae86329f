//! AFSK demodulator: audio samples to bits.
//!
//! Receive chain per buffer:
//!
//! ```text
//! samples ──┬─> bandpass(mark)  ─> envelope ─┐
//!           │                                ├─> diff = mark − space
//!           └─> bandpass(space) ─> envelope ─┘    total = mark + space
//! ```
//!
//! The total energy locates the signal region inside the buffer; the
//! timing estimator ([`crate::timing`]) locks sampling phase and clock
//! skew on the diff metric; the bit slicer then reads the sign of the
//! diff at each sampling instant. Whichever envelope is greater wins.

use crate::params::AfskParams;
use crate::timing::estimate_timing;
use tonelink_dsp::{Biquad, EnvelopeDetector};

/// Fraction of the peak total energy that counts as "signal present".
const SIGNAL_THRESHOLD: f32 = 0.25;

/// Absolute energy floor below which a buffer is treated as silence.
const ENERGY_FLOOR: f32 = 1e-5;

/// Envelope smoothing time constant as a fraction of one bit interval.
/// Long enough to suppress ripple at twice the tone frequency, short
/// enough that the envelope settles well inside one bit.
const ENVELOPE_TAU_BITS: f32 = 0.4;

/// Turns captured audio back into bits.
///
/// Stateless across calls: the filter bank is rebuilt per buffer so that
/// consecutive receive windows cannot smear into each other.
#[derive(Debug, Clone)]
pub struct Demodulator {
    params: AfskParams,
}

impl Demodulator {
    /// Create a demodulator for the given parameter set.
    pub fn new(params: AfskParams) -> Self {
        Self { params }
    }

    /// The parameter set this demodulator was built with.
    pub fn params(&self) -> &AfskParams {
        &self.params
    }

    /// Demodulate a capture buffer into bits.
    ///
    /// Total but lossy: silence yields no bits, noise yields garbage bits,
    /// and the framing layer's CRC decides what survives.
    pub fn demodulate_bits(&self, samples: &[f32]) -> Vec<bool> {
        let spb = self.params.samples_per_bit();
        if samples.len() < spb {
            return Vec::new();
        }

        let sr = self.params.sample_rate as f32;
        let bw = self.params.filter_bandwidth_hz;
        let tau = ENVELOPE_TAU_BITS * self.params.bit_duration();

        let mut mark_filter = Biquad::bandpass(self.params.mark_hz, bw, sr);
        let mut space_filter = Biquad::bandpass(self.params.space_hz, bw, sr);
        let mut mark_env = EnvelopeDetector::new(sr, tau);
        let mut space_env = EnvelopeDetector::new(sr, tau);

        let mut diff = Vec::with_capacity(samples.len());
        let mut total = Vec::with_capacity(samples.len());
        for &s in samples {
            let mark = mark_env.process(mark_filter.process(s));
            let space = space_env.process(space_filter.process(s));
            diff.push(mark - space);
            total.push(mark + space);
        }

        // Locate the signal region: everything above a fraction of the
        // peak energy. Ambient noise before the frame and the decay tail
        // after it fall below the threshold.
        let peak = total.iter().fold(0.0f32, |a, &t| a.max(t));
        if peak < ENERGY_FLOOR {
            return Vec::new();
        }
        let threshold = SIGNAL_THRESHOLD * peak;
        let Some(start) = total.iter().position(|&t| t >= threshold) else {
            return Vec::new();
        };
        let Some(end) = total.iter().rposition(|&t| t >= threshold) else {
            return Vec::new();
        };
        if end <= start {
            return Vec::new();
        }
        let region = &diff[start..=end];

        let estimate = estimate_timing(region, spb as f32);
        tracing::trace!(
            start,
            end,
            offset = estimate.offset,
            skew = estimate.skew,
            "bit clock locked"
        );

        let step = spb as f64 * (1.0 + f64::from(estimate.skew));
        let mut bits = Vec::with_capacity(region.len() / spb + 1);
        let mut pos = estimate.offset as f64;
        while (pos as usize) < region.len() {
            bits.push(region[pos as usize] >= 0.0);
            pos += step;
        }
        bits
    }

    /// Demodulate a capture buffer into bytes (LSB-first grouping, with a
    /// trailing partial byte dropped).
    ///
    /// This is the byte-stream contract used when the buffer is known to
    /// begin at a byte boundary — in particular the noise-free loopback
    /// round-trip `demodulate(modulate(bytes)) == bytes`. The framing path
    /// uses [`Self::demodulate_bits`] instead and lets the sync word
    /// establish byte alignment.
    pub fn demodulate(&self, samples: &[f32]) -> Vec<u8> {
        let bits = self.demodulate_bits(samples);
        bits.chunks_exact(8)
            .map(|chunk| {
                let mut byte = 0u8;
                for (i, &bit) in chunk.iter().enumerate() {
                    if bit {
                        byte |= 1 << i;
                    }
                }
                byte
            })
            .collect()
    }
}
