//! cpal-based audio backend implementation.
//!
//! Wraps [cpal](https://crates.io/crates/cpal) for cross-platform audio
//! I/O (ALSA on Linux, CoreAudio on macOS, WASAPI on Windows). Streams
//! run at the device's native rate and channel count; capture is downmixed
//! to mono and playback duplicated across channels, so the rest of the
//! modem only ever sees mono samples. Rate mismatches against the modem's
//! nominal 48 kHz are resolved by the channel's resampler.

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::{Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// cpal-based audio backend.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        tracing::info!(
            host = cpal::default_host().id().name(),
            "cpal backend initialized"
        );
        Self {
            host: cpal::default_host(),
        }
    }

    /// Find an output device by enumeration index, or the default.
    fn find_output_device(&self, index: Option<usize>) -> Result<cpal::Device> {
        match index {
            Some(i) => self
                .host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .nth(i)
                .ok_or_else(|| Error::DeviceNotFound(format!("output device index {i}"))),
            None => self.host.default_output_device().ok_or(Error::NoDevice),
        }
    }

    /// Find an input device by enumeration index, or the default.
    fn find_input_device(&self, index: Option<usize>) -> Result<cpal::Device> {
        match index {
            Some(i) => self
                .host
                .input_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .nth(i)
                .ok_or_else(|| Error::DeviceNotFound(format!("input device index {i}"))),
            None => self.host.default_input_device().ok_or(Error::NoDevice),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_output_device(config.device_index)?;
        let default = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let channels = default.channels() as usize;

        let stream_config = cpal::StreamConfig {
            channels: default.channels(),
            sample_rate: default.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut mono = Vec::new();
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels;
                    mono.resize(frames, 0.0);
                    callback(&mut mono);
                    for (frame, &sample) in data.chunks_exact_mut(channels).zip(mono.iter()) {
                        frame.fill(sample);
                    }
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels,
            sample_rate = stream_config.sample_rate,
            "output stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_input_device(config.device_index)?;
        let default = device
            .default_input_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let channels = default.channels() as usize;

        let stream_config = cpal::StreamConfig {
            channels: default.channels(),
            sample_rate: default.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut mono = Vec::new();
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if channels == 1 {
                        callback(data);
                    } else {
                        mono.clear();
                        mono.extend(
                            data.chunks_exact(channels)
                                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                        );
                        callback(&mono);
                    }
                },
                move |err| {
                    error_callback(&err.to_string());
                },
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            channels,
            sample_rate = stream_config.sample_rate,
            "input stream started"
        );

        Ok(StreamHandle::new(stream))
    }

    fn actual_output_rate(&self, config: &BackendStreamConfig) -> Result<u32> {
        let device = self.find_output_device(config.device_index)?;
        let default = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        Ok(default.sample_rate())
    }

    fn actual_input_rate(&self, config: &BackendStreamConfig) -> Result<u32> {
        let device = self.find_input_device(config.device_index)?;
        let default = device
            .default_input_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        Ok(default.sample_rate())
    }
}
