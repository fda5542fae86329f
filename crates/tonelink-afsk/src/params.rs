//! Physical-layer parameters.

/// The coupled physical-layer constants, kept together because they are
/// tuned as a set: the tone spacing must exceed the filter bandwidth, the
/// bandwidth must cover the baud rate plus expected clock drift, and the
/// frame size limit upstream is chosen so a frame's wire time fits the
/// transport's ACK timeout. Changing one of these means re-deriving the
/// others.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfskParams {
    /// Nominal sample rate in Hz. The audio layer resamples if the device
    /// runs at a different rate.
    pub sample_rate: u32,
    /// Symbol rate in bits per second.
    pub baud: u32,
    /// Mark tone (binary 1) frequency in Hz.
    pub mark_hz: f32,
    /// Space tone (binary 0) frequency in Hz.
    pub space_hz: f32,
    /// Passband width of each receive tone filter in Hz. Too narrow
    /// rejects off-center energy under clock drift; too wide lets the two
    /// bands overlap.
    pub filter_bandwidth_hz: f32,
    /// Transmit amplitude scale in [0.0, 1.0]. Kept low by default to
    /// avoid clipping in consumer speaker/microphone chains.
    pub tx_volume: f32,
}

impl Default for AfskParams {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            baud: 300,
            mark_hz: 1200.0,
            space_hz: 2200.0,
            filter_bandwidth_hz: 400.0,
            tx_volume: 0.08,
        }
    }
}

impl AfskParams {
    /// Samples per bit at the nominal rate (160 at 48 kHz / 300 baud).
    pub fn samples_per_bit(&self) -> usize {
        (self.sample_rate / self.baud) as usize
    }

    /// Duration of one bit in seconds.
    pub fn bit_duration(&self) -> f32 {
        1.0 / self.baud as f32
    }

    /// Wire time in seconds for `n` bytes of modulated data.
    pub fn byte_duration(&self, n: usize) -> f32 {
        n as f32 * 8.0 * self.bit_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bit_geometry() {
        let p = AfskParams::default();
        assert_eq!(p.samples_per_bit(), 160);
        assert!((p.bit_duration() - 1.0 / 300.0).abs() < 1e-9);
    }

    #[test]
    fn wire_time_for_a_full_payload() {
        let p = AfskParams::default();
        // 64 bytes is a little over 1.7 s of wire time at 300 baud.
        let t = p.byte_duration(64);
        assert!((1.6..1.8).contains(&t), "got {t}");
    }
}
