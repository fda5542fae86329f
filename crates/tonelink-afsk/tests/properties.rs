//! Property-based round-trip tests for the AFSK codec.

use proptest::prelude::*;
use tonelink_afsk::{AfskParams, Demodulator, Modulator};

proptest! {
    // The codec runs ~130k samples per 100-byte case, so keep the case
    // count moderate.
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// For every byte stream, `demodulate(modulate(B)) == B` over a
    /// noise-free channel.
    #[test]
    fn noise_free_roundtrip(payload in prop::collection::vec(any::<u8>(), 1..=100)) {
        let params = AfskParams::default();
        let mut modulator = Modulator::new(params);
        let demodulator = Demodulator::new(params);
        let samples = modulator.modulate(&payload);
        prop_assert_eq!(demodulator.demodulate(&samples), payload);
    }

    /// Modulated output length is exact and amplitude stays inside the
    /// configured volume.
    #[test]
    fn modulator_output_shape(
        payload in prop::collection::vec(any::<u8>(), 1..=64),
        volume in 0.01f32..=1.0,
    ) {
        let params = AfskParams { tx_volume: volume, ..AfskParams::default() };
        let mut modulator = Modulator::new(params);
        let samples = modulator.modulate(&payload);

        let spb = params.samples_per_bit();
        prop_assert_eq!(samples.len(), (payload.len() * 8 + 1) * spb);
        for &s in &samples {
            prop_assert!(s.abs() <= volume + 1e-6);
        }
    }
}
