//! Audio I/O layer for the tonelink acoustic modem.
//!
//! This crate owns the physical channel:
//!
//! - [`Channel`] - the single owner of the audio device, implementing
//!   transmit gating, the post-transmit echo guard, and silence-terminated
//!   receive — the half-duplex discipline every layer above relies on
//! - [`AudioBackend`] - pluggable backend trait with a cpal default
//!   ([`CpalBackend`]) so the whole stack runs against real hardware or,
//!   in loopback mode, against no hardware at all
//! - [`list_devices`] - device enumeration for index-based selection
//! - [`read_wav`] / [`write_wav`] / [`WavTap`] - mono WAV helpers and an
//!   optional diagnostic tap that records everything sent and received
//!
//! Audio glitches (underruns, overruns, dropped capture chunks) are
//! counted and logged but never fatal: they corrupt samples, corrupted
//! samples fail frame CRCs, and the transport retransmits. The only fatal
//! errors here are failures to open the device in the first place.

pub mod backend;
pub mod channel;
pub mod cpal_backend;
pub mod devices;
pub mod resample;
pub mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle};
pub use channel::{Channel, ChannelConfig, ChannelParams};
pub use cpal_backend::CpalBackend;
pub use devices::{AudioDevice, default_devices, list_devices};
pub use resample::{LinearResampler, resample_linear};
pub use wav::{WavTap, read_wav, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("no audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
