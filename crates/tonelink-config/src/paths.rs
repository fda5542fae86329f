//! Default configuration file location.

use std::path::PathBuf;

/// The default configuration file path:
/// `<platform config dir>/tonelink/config.toml`, or a path relative to
/// the working directory when the platform offers no config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tonelink")
        .join("config.toml")
}
