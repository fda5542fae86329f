//! Shared helpers for subcommands.

use clap::Args;
use std::path::PathBuf;
use tonelink_config::{ModemConfig, default_config_path};

/// Configuration options shared by every command that runs a modem.
#[derive(Args, Debug)]
pub struct ModemOpts {
    /// Configuration file (defaults to the per-user config path)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run against the software loopback instead of real hardware
    #[arg(long)]
    pub loopback: bool,

    /// In loopback, also play the tones on the output device
    #[arg(long)]
    pub audible: bool,

    /// Input device index (see `tonelink devices`)
    #[arg(long)]
    pub input_device: Option<usize>,

    /// Output device index (see `tonelink devices`)
    #[arg(long)]
    pub output_device: Option<usize>,

    /// Transmit volume, 0.0-1.0
    #[arg(long)]
    pub tx_volume: Option<f32>,
}

impl ModemOpts {
    /// Load the configuration file and fold the command-line overrides in.
    pub fn resolve(&self) -> anyhow::Result<ModemConfig> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(default_config_path);
        let mut config = ModemConfig::load_or_default(&path)?;

        if self.loopback {
            config.loopback = true;
        }
        if self.audible {
            config.audible = true;
        }
        if let Some(index) = self.input_device {
            config.input_device = Some(index);
        }
        if let Some(index) = self.output_device {
            config.output_device = Some(index);
        }
        if let Some(volume) = self.tx_volume {
            config.tx_volume = volume;
        }

        tonelink_config::validate(&config)?;
        Ok(config)
    }
}
