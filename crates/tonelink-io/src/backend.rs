//! Pluggable audio backend abstraction.
//!
//! [`AudioBackend`] decouples the modem from any specific platform audio
//! API. The default implementation wraps [cpal](https://crates.io/crates/cpal);
//! the trait exists so the channel logic can also run against test
//! doubles and so other platform APIs can be slotted in later.
//!
//! The trait deals exclusively in **mono** f32 samples: the modem treats
//! the device as a mono sample stream, and backends adapt whatever
//! channel count the hardware actually exposes (the cpal backend
//! downmixes capture and duplicates playback across channels).
//!
//! Callbacks are boxed closures rather than generic parameters, keeping
//! the trait object-safe so backends can be selected at runtime. Stream
//! handles are returned as [`StreamHandle`], a type-erased wrapper that
//! stops the stream on drop.

use crate::Result;

/// Configuration for building an audio stream.
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz. Backends may run the device at its
    /// native rate instead; query [`AudioBackend::actual_input_rate`] /
    /// [`AudioBackend::actual_output_rate`] for what you will really get.
    pub sample_rate: u32,
    /// Preferred buffer size in frames (a hint; backends may ignore it).
    pub buffer_size: u32,
    /// Device index into the backend's enumeration order, or `None` for
    /// the system default.
    pub device_index: Option<usize>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_size: 1024,
            device_index: None,
        }
    }
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback/capture regardless of which backend produced it.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, keeping it alive until this
    /// handle is dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback: fill the buffer with mono f32 samples.
///
/// Runs on the real-time audio thread. Implementations must not block,
/// lock contended mutexes, or perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Audio input callback: receives captured mono f32 samples.
///
/// Runs on the real-time audio thread; the same restrictions apply. In
/// particular this callback must never call into protocol layers — it
/// only hands samples off to a queue.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Error callback: receives a human-readable message when the backend
/// hits a streaming error.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable audio backend trait.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal").
    fn name(&self) -> &str;

    /// Build an output-only stream. The callback is invoked on the audio
    /// thread with a mono buffer to fill. Dropping the handle stops
    /// playback.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build an input-only stream. The callback is invoked on the audio
    /// thread with captured mono samples. Dropping the handle stops
    /// capture.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// The sample rate the output device will actually run at for this
    /// config. Defaults to the requested rate.
    fn actual_output_rate(&self, config: &BackendStreamConfig) -> Result<u32> {
        Ok(config.sample_rate)
    }

    /// The sample rate the input device will actually run at for this
    /// config. Defaults to the requested rate.
    fn actual_input_rate(&self, config: &BackendStreamConfig) -> Result<u32> {
        Ok(config.sample_rate)
    }
}
