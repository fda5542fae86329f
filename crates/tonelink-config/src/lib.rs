//! Configuration for the tonelink acoustic modem.
//!
//! The modem's constants are tightly coupled — the payload limit, ACK
//! timeout, filter bandwidth, and baud rate are tuned as a set — so the
//! whole parameter surface lives in one [`ModemConfig`] record, loaded
//! from TOML and cross-checked by [`validation::validate`] before any
//! hardware is opened.
//!
//! ```toml
//! loopback = false
//! tx_volume = 0.08
//!
//! [afsk]
//! baud = 300
//! mark_hz = 1200.0
//! space_hz = 2200.0
//! ```

pub mod error;
pub mod paths;
pub mod validation;

pub use error::ConfigError;
pub use paths::default_config_path;
pub use validation::{ValidationError, validate};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full configuration surface of one modem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Route TX samples into the capture buffer instead of the device.
    pub loopback: bool,
    /// In loopback, also emit the samples on the real output device.
    pub audible: bool,
    /// Input device index (enumeration order), or the system default.
    pub input_device: Option<usize>,
    /// Output device index (enumeration order), or the system default.
    pub output_device: Option<usize>,
    /// Playback amplitude scale in (0.0, 1.0].
    pub tx_volume: f32,
    /// Physical-layer tone and rate parameters.
    pub afsk: AfskSection,
    /// Reliable-transport timing parameters.
    pub link: LinkSection,
    /// Half-duplex channel timing parameters.
    pub channel: ChannelSection,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            loopback: false,
            audible: false,
            input_device: None,
            output_device: None,
            tx_volume: 0.08,
            afsk: AfskSection::default(),
            link: LinkSection::default(),
            channel: ChannelSection::default(),
        }
    }
}

/// `[afsk]` — physical-layer constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AfskSection {
    /// Nominal sample rate in Hz.
    pub sample_rate: u32,
    /// Symbol rate in bits per second.
    pub baud: u32,
    /// Mark tone (binary 1) in Hz.
    pub mark_hz: f32,
    /// Space tone (binary 0) in Hz.
    pub space_hz: f32,
    /// Per-tone receive filter passband in Hz.
    pub filter_bandwidth_hz: f32,
}

impl Default for AfskSection {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            baud: 300,
            mark_hz: 1200.0,
            space_hz: 2200.0,
            filter_bandwidth_hz: 400.0,
        }
    }
}

/// `[link]` — reliable-transport timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSection {
    /// How long the sender waits for an ACK before retransmitting, ms.
    pub ack_timeout_ms: u64,
    /// Retransmissions before a send fails with a link failure.
    pub max_retries: u32,
    /// Pause before listening after sending a frame that expects a
    /// response, giving the peer time to pivot to transmit, ms.
    pub turnaround_guard_ms: u64,
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            ack_timeout_ms: 5_000,
            max_retries: 5,
            turnaround_guard_ms: 50,
        }
    }
}

/// `[channel]` — half-duplex audio discipline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSection {
    /// Post-transmit window during which capture is discarded, ms.
    pub echo_guard_ms: u64,
    /// Quiet time that terminates a receive, ms. Longer than any
    /// intra-frame gap, shorter than any inter-frame gap.
    pub silence_duration_ms: u64,
    /// Minimum captured samples before a receive may return.
    pub min_samples: usize,
    /// RMS level below which the capture tail counts as silent.
    pub silence_threshold: f32,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            echo_guard_ms: 80,
            silence_duration_ms: 300,
            min_samples: 10_000,
            silence_threshold: 0.02,
        }
    }
}

impl ModemConfig {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::read_file(path, e))?;
        let config: ModemConfig = toml::from_str(&text)?;
        validate(&config)?;
        Ok(config)
    }

    /// Load a configuration file if it exists, falling back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize and write the configuration, creating parent directories
    /// as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|e| ConfigError::write_file(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_valid() {
        let config = ModemConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn roundtrip_through_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = ModemConfig::default();
        config.loopback = true;
        config.tx_volume = 0.2;
        config.link.ack_timeout_ms = 8_000;
        config.save(&path).unwrap();

        let loaded = ModemConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tx_volume = 0.5\n").unwrap();

        let loaded = ModemConfig::load(&path).unwrap();
        assert_eq!(loaded.tx_volume, 0.5);
        assert_eq!(loaded.afsk.baud, 300);
        assert!(!loaded.loopback);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let loaded = ModemConfig::load_or_default(dir.path().join("nope.toml")).unwrap();
        assert_eq!(loaded, ModemConfig::default());
    }

    #[test]
    fn invalid_file_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tx_volume = 3.0\n").unwrap();

        assert!(matches!(
            ModemConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }
}
