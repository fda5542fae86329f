//! The frame transport seam and its acoustic implementation.

use crate::LinkError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tonelink_afsk::{AfskParams, Demodulator, Modulator};
use tonelink_io::Channel;
use tonelink_proto::{Frame, scan_bits};

/// Sends and receives whole frames over an unreliable path.
///
/// This is the seam between the transport logic and the physical world:
/// the ARQ and session layers are generic over it, so they run unchanged
/// over [`AcousticLink`] in production and over in-memory fault-injecting
/// links in tests.
pub trait FrameLink: Send {
    /// Transmit one frame. Blocks until the frame has left the link.
    fn send_frame(&mut self, frame: &Frame) -> Result<(), LinkError>;

    /// Receive the next frame, waiting up to `timeout`. `Ok(None)` means
    /// the link stayed quiet (or produced only noise) for the whole
    /// window.
    fn recv_frame(&mut self, timeout: Duration) -> Result<Option<Frame>, LinkError>;
}

/// The production frame link: frames ride tones on the half-duplex
/// audio channel.
///
/// Transmit: frame → wire bytes → AFSK samples → `Channel::play`.
/// Receive: `Channel::receive_until_silence` → bits → frame scan. A
/// single receive window can carry several frames; extras are queued for
/// subsequent calls.
#[derive(Debug)]
pub struct AcousticLink {
    channel: Channel,
    modulator: Modulator,
    demodulator: Demodulator,
    pending: VecDeque<Frame>,
}

impl AcousticLink {
    /// Bind an AFSK codec to a channel.
    pub fn new(channel: Channel, params: AfskParams) -> Self {
        Self {
            channel,
            modulator: Modulator::new(params),
            demodulator: Demodulator::new(params),
            pending: VecDeque::new(),
        }
    }

    /// The underlying channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Mutable access to the underlying channel (tap attachment, buffer
    /// clearing).
    pub fn channel_mut(&mut self) -> &mut Channel {
        &mut self.channel
    }
}

impl FrameLink for AcousticLink {
    fn send_frame(&mut self, frame: &Frame) -> Result<(), LinkError> {
        let wire = frame.to_wire_bytes()?;
        let samples = self.modulator.modulate(&wire);
        tracing::debug!(
            frame_type = ?frame.frame_type,
            seq = frame.seq,
            payload_len = frame.payload.len(),
            wire_time_ms = (samples.len() * 1000) / self.modulator.params().sample_rate as usize,
            "transmitting frame"
        );
        self.channel.play(&samples)?;
        Ok(())
    }

    fn recv_frame(&mut self, timeout: Duration) -> Result<Option<Frame>, LinkError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let samples = self.channel.receive_until_silence(remaining)?;
            if samples.is_empty() {
                continue;
            }

            let bits = self.demodulator.demodulate_bits(&samples);
            let frames = scan_bits(&bits);
            tracing::debug!(
                samples = samples.len(),
                bits = bits.len(),
                frames = frames.len(),
                "receive window demodulated"
            );
            self.pending.extend(frames);
        }
    }
}
