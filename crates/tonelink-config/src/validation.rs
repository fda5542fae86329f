//! Cross-parameter validation.
//!
//! The modem's constants form one coherent tuning: the tone spacing must
//! clear the filter bandwidth or the two receive bands overlap; the
//! bandwidth must cover the baud rate or bit transitions smear; the ACK
//! timeout must exceed a full frame round trip or every send times out.
//! Each rule below rejects a configuration that is individually plausible
//! but incoherent as a set.

use crate::ModemConfig;
use thiserror::Error;

/// A configuration that fails cross-parameter coherence checks.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// `tx_volume` outside (0.0, 1.0].
    #[error("tx_volume {0} must be in (0.0, 1.0]")]
    VolumeOutOfRange(f32),

    /// Mark/space separation below the filter bandwidth.
    #[error(
        "tone separation {separation} Hz is below the filter bandwidth \
         {bandwidth} Hz; the receive bands would overlap"
    )]
    BandsOverlap {
        /// Distance between mark and space tones in Hz.
        separation: f32,
        /// Configured filter bandwidth in Hz.
        bandwidth: f32,
    },

    /// Filter bandwidth narrower than the symbol rate.
    #[error(
        "filter bandwidth {bandwidth} Hz is below the baud rate {baud}; \
         bit transitions would be filtered out"
    )]
    BandwidthBelowBaud {
        /// Configured filter bandwidth in Hz.
        bandwidth: f32,
        /// Configured baud rate.
        baud: u32,
    },

    /// Sample rate not an integer multiple of the baud rate.
    #[error("sample rate {sample_rate} is not a multiple of baud {baud}")]
    FractionalBitPeriod {
        /// Configured sample rate in Hz.
        sample_rate: u32,
        /// Configured baud rate.
        baud: u32,
    },

    /// A tone band extends past Nyquist.
    #[error("tone at {tone} Hz (+{half_bandwidth} Hz) exceeds Nyquist {nyquist} Hz")]
    ToneAboveNyquist {
        /// Tone center frequency in Hz.
        tone: f32,
        /// Half the filter bandwidth in Hz.
        half_bandwidth: f32,
        /// Half the sample rate in Hz.
        nyquist: f32,
    },

    /// ACK timeout shorter than a frame round trip.
    #[error(
        "ack timeout {timeout_ms} ms does not cover a frame round trip \
         (~{round_trip_ms} ms); every send would time out"
    )]
    TimeoutBelowRoundTrip {
        /// Configured ACK timeout in ms.
        timeout_ms: u64,
        /// Estimated round-trip time in ms.
        round_trip_ms: u64,
    },

    /// Zero retries, zero baud, or other degenerate numeric.
    #[error("{0} must be non-zero")]
    Zero(&'static str),
}

/// Maximum frame wire size in bytes: preamble, sync, header, payload, CRC.
const MAX_FRAME_BYTES: u64 = 16 + 2 + 3 + 64 + 2;

/// Validate a configuration as a coherent set.
pub fn validate(config: &ModemConfig) -> Result<(), ValidationError> {
    if config.afsk.baud == 0 {
        return Err(ValidationError::Zero("baud"));
    }
    if config.afsk.sample_rate == 0 {
        return Err(ValidationError::Zero("sample_rate"));
    }
    if config.link.max_retries == 0 {
        return Err(ValidationError::Zero("max_retries"));
    }

    if !(config.tx_volume > 0.0 && config.tx_volume <= 1.0) {
        return Err(ValidationError::VolumeOutOfRange(config.tx_volume));
    }

    let separation = (config.afsk.space_hz - config.afsk.mark_hz).abs();
    if separation < config.afsk.filter_bandwidth_hz {
        return Err(ValidationError::BandsOverlap {
            separation,
            bandwidth: config.afsk.filter_bandwidth_hz,
        });
    }

    if config.afsk.filter_bandwidth_hz < config.afsk.baud as f32 {
        return Err(ValidationError::BandwidthBelowBaud {
            bandwidth: config.afsk.filter_bandwidth_hz,
            baud: config.afsk.baud,
        });
    }

    if config.afsk.sample_rate % config.afsk.baud != 0 {
        return Err(ValidationError::FractionalBitPeriod {
            sample_rate: config.afsk.sample_rate,
            baud: config.afsk.baud,
        });
    }

    let nyquist = config.afsk.sample_rate as f32 / 2.0;
    let half_bandwidth = config.afsk.filter_bandwidth_hz / 2.0;
    for tone in [config.afsk.mark_hz, config.afsk.space_hz] {
        if tone + half_bandwidth >= nyquist {
            return Err(ValidationError::ToneAboveNyquist {
                tone,
                half_bandwidth,
                nyquist,
            });
        }
    }

    // A round trip is one max-size frame, the peer's turnaround, an ACK
    // frame, and our own turnaround.
    let frame_ms = MAX_FRAME_BYTES * 8 * 1000 / u64::from(config.afsk.baud);
    let ack_ms = (16 + 2 + 3 + 2) * 8 * 1000 / u64::from(config.afsk.baud);
    let round_trip_ms = frame_ms + ack_ms + 2 * config.link.turnaround_guard_ms;
    if config.link.ack_timeout_ms <= round_trip_ms {
        return Err(ValidationError::TimeoutBelowRoundTrip {
            timeout_ms: config.link.ack_timeout_ms,
            round_trip_ms,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        assert!(validate(&ModemConfig::default()).is_ok());
    }

    #[test]
    fn rejects_silly_volume() {
        let mut config = ModemConfig::default();
        config.tx_volume = 0.0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::VolumeOutOfRange(_))
        ));
        config.tx_volume = 1.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn rejects_overlapping_bands() {
        let mut config = ModemConfig::default();
        config.afsk.space_hz = 1500.0; // only 300 Hz from mark, bandwidth 400
        assert!(matches!(
            validate(&config),
            Err(ValidationError::BandsOverlap { .. })
        ));
    }

    #[test]
    fn rejects_bandwidth_below_baud() {
        let mut config = ModemConfig::default();
        config.afsk.filter_bandwidth_hz = 200.0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::BandwidthBelowBaud { .. })
        ));
    }

    #[test]
    fn rejects_fractional_bit_period() {
        let mut config = ModemConfig::default();
        config.afsk.baud = 441;
        config.afsk.filter_bandwidth_hz = 500.0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::FractionalBitPeriod { .. })
        ));
    }

    #[test]
    fn rejects_tone_above_nyquist() {
        let mut config = ModemConfig::default();
        config.afsk.sample_rate = 4_800;
        config.afsk.baud = 300;
        // space at 2200 Hz with 200 Hz half-band hits the 2400 Hz Nyquist
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ToneAboveNyquist { .. })
        ));
    }

    #[test]
    fn rejects_timeout_below_round_trip() {
        let mut config = ModemConfig::default();
        config.link.ack_timeout_ms = 1_000;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::TimeoutBelowRoundTrip { .. })
        ));
    }

    #[test]
    fn default_round_trip_estimate_is_sane() {
        // The spec-level arithmetic: a 64-byte frame is ~2.3 s of wire
        // time including overhead, an ACK ~0.6 s, so the default 5 s
        // timeout clears the round trip with one transient's headroom.
        let config = ModemConfig::default();
        let frame_ms = (16 + 2 + 3 + 64 + 2) * 8 * 1000 / 300;
        assert!(frame_ms < 2_500);
        assert!(config.link.ack_timeout_ms > frame_ms);
    }
}
