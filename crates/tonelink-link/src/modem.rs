//! The modem facade: parameter plumbing from configuration to a running
//! stack, plus the unreliable datagram path used for loopback testing.

use crate::frame_link::{AcousticLink, FrameLink};
use crate::params::LinkParams;
use crate::session::Connection;
use crate::LinkError;
use std::time::{Duration, Instant};
use tonelink_afsk::AfskParams;
use tonelink_config::ModemConfig;
use tonelink_io::{Channel, ChannelConfig, ChannelParams, CpalBackend, WavTap};
use tonelink_proto::{Frame, FrameType, MAX_PAYLOAD};

/// One modem instance: an assembled five-layer stack awaiting a session.
///
/// At most one session exists per modem; [`Modem::connect`] and
/// [`Modem::accept`] consume the modem and return the session's
/// [`Connection`].
#[derive(Debug)]
pub struct Modem {
    link: AcousticLink,
    params: LinkParams,
    /// Wire sequence counter for the unreliable datagram path.
    raw_seq: u8,
}

impl Modem {
    /// Assemble a modem from a validated configuration.
    ///
    /// Opens the audio device unless `loopback` is set; device failures
    /// surface here and nowhere else.
    pub fn from_config(config: &ModemConfig) -> Result<Self, LinkError> {
        tonelink_config::validate(config).map_err(tonelink_config::ConfigError::from)?;

        let afsk = AfskParams {
            sample_rate: config.afsk.sample_rate,
            baud: config.afsk.baud,
            mark_hz: config.afsk.mark_hz,
            space_hz: config.afsk.space_hz,
            filter_bandwidth_hz: config.afsk.filter_bandwidth_hz,
            tx_volume: config.tx_volume,
        };
        let channel_params = ChannelParams {
            echo_guard: Duration::from_millis(config.channel.echo_guard_ms),
            silence_duration: Duration::from_millis(config.channel.silence_duration_ms),
            min_samples: config.channel.min_samples,
            silence_threshold: config.channel.silence_threshold,
        };
        let channel_config = ChannelConfig {
            params: channel_params,
            input_device: config.input_device,
            output_device: config.output_device,
        };

        let channel = if config.loopback {
            if config.audible {
                Channel::loopback_audible(&CpalBackend::new(), &channel_config, afsk.sample_rate)?
            } else {
                Channel::loopback(channel_params, afsk.sample_rate)
            }
        } else {
            Channel::open(&CpalBackend::new(), &channel_config, afsk.sample_rate)?
        };

        let params = LinkParams {
            ack_timeout: Duration::from_millis(config.link.ack_timeout_ms),
            max_retries: config.link.max_retries,
            turnaround_guard: Duration::from_millis(config.link.turnaround_guard_ms),
        };

        Ok(Self::new(channel, afsk, params))
    }

    /// Assemble a modem from explicit parts (the loopback harness and
    /// tests use this directly).
    pub fn new(channel: Channel, afsk: AfskParams, params: LinkParams) -> Self {
        Self {
            link: AcousticLink::new(channel, afsk),
            params,
            raw_seq: 0,
        }
    }

    /// A software-loopback modem with default parameters.
    pub fn loopback() -> Self {
        let afsk = AfskParams::default();
        let channel = Channel::loopback(ChannelParams::default(), afsk.sample_rate);
        Self::new(channel, afsk, LinkParams::default())
    }

    /// Attach a diagnostic WAV tap to the channel.
    pub fn set_tap(&mut self, tap: WavTap) {
        self.link.channel_mut().set_tap(tap);
    }

    /// The underlying channel.
    pub fn channel(&self) -> &Channel {
        self.link.channel()
    }

    /// Initiate a session, consuming the modem.
    pub fn connect(self) -> Result<Connection<AcousticLink>, LinkError> {
        Connection::connect(self.link, self.params)
    }

    /// Listen for and accept one session, consuming the modem.
    pub fn accept(self, timeout: Duration) -> Result<Connection<AcousticLink>, LinkError> {
        Connection::accept(self.link, self.params, timeout)
    }

    /// Transmit bytes as unacknowledged DATA frames — the datagram path.
    ///
    /// No retransmission and no session: this is what a self-loopback
    /// ping exercises, since a modem cannot acknowledge its own frames.
    pub fn transmit(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        for chunk in payload.chunks(MAX_PAYLOAD) {
            let frame = Frame::data(self.raw_seq, chunk.to_vec())?;
            self.link.send_frame(&frame)?;
            self.raw_seq = self.raw_seq.wrapping_add(1);
        }
        Ok(())
    }

    /// Receive the concatenated payloads of all DATA frames arriving
    /// within `timeout` — the datagram path's other half.
    pub fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, LinkError> {
        let deadline = Instant::now() + timeout;
        let mut out = Vec::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            // Once something has arrived, only drain what is already
            // queued rather than waiting out the full deadline.
            let window = if out.is_empty() {
                remaining
            } else {
                Duration::from_millis(1).min(remaining)
            };
            match self.link.recv_frame(window)? {
                Some(frame) if frame.frame_type == FrameType::Data => {
                    out.extend_from_slice(&frame.payload);
                }
                Some(other) => {
                    tracing::trace!(frame_type = ?other.frame_type, "non-data frame on datagram path");
                }
                None if out.is_empty() => continue,
                None => break,
            }
        }

        if out.is_empty() {
            Err(LinkError::Timeout)
        } else {
            Ok(out)
        }
    }
}
