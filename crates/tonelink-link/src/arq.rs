//! Stop-and-Wait ARQ.
//!
//! One frame in flight at a time: send, await the matching ACK, flip the
//! sequence bit, advance. The wider wire sequence field leaves room for
//! future extension, but this algorithm uses only the low bit — with a
//! single outstanding frame, one bit fully disambiguates new data from a
//! retransmission.
//!
//! NAK policy: this layer never emits NAK. CRC failures are silent drops
//! at the framer, recovered by the sender's timeout. A received NAK is
//! honored as an immediate-retransmit hint.

use crate::frame_link::FrameLink;
use crate::params::LinkParams;
use crate::LinkError;
use std::time::Instant;
use tonelink_proto::{Frame, FrameType};

/// Events the receive side surfaces to the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// In-sequence application data, already acknowledged.
    Data(Vec<u8>),
    /// Connection request from a peer.
    Syn,
    /// Connection accept from a peer.
    SynAck,
    /// Graceful close request, already acknowledged.
    Fin,
    /// Hard reset.
    Reset,
}

/// Stop-and-Wait engine over a frame link.
#[derive(Debug)]
pub struct Arq<L: FrameLink> {
    link: L,
    params: LinkParams,
    /// Sequence bit of the next frame we send.
    tx_seq: u8,
    /// Sequence bit we expect on the next in-order DATA from the peer.
    rx_seq: u8,
}

impl<L: FrameLink> Arq<L> {
    /// Wrap a frame link. Both sequence expectations start at 0.
    pub fn new(link: L, params: LinkParams) -> Self {
        Self {
            link,
            params,
            tx_seq: 0,
            rx_seq: 0,
        }
    }

    /// The transport parameters in force.
    pub fn params(&self) -> &LinkParams {
        &self.params
    }

    /// The underlying link.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Send one frame with no retry and no expected response (the
    /// handshake's third leg, RST).
    pub fn send_raw(&mut self, frame: &Frame) -> Result<(), LinkError> {
        self.link.send_frame(frame)
    }

    /// Send `frame` and await a response satisfying `accept`, retrying on
    /// timeout up to the configured retry budget.
    ///
    /// Unexpected frames seen while waiting are treated as channel noise
    /// and ignored, with two exceptions: RST aborts with
    /// [`LinkError::PeerReset`], and NAK triggers an immediate
    /// retransmission.
    pub fn request(
        &mut self,
        frame: &Frame,
        accept: impl Fn(&Frame) -> bool,
    ) -> Result<Frame, LinkError> {
        for attempt in 0..=self.params.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    attempt,
                    frame_type = ?frame.frame_type,
                    seq = frame.seq,
                    "retransmitting"
                );
            }
            self.link.send_frame(frame)?;

            // Give the peer time to pivot from receive to transmit before
            // we start listening.
            std::thread::sleep(self.params.turnaround_guard);

            let deadline = Instant::now() + self.params.ack_timeout;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                match self.link.recv_frame(remaining)? {
                    Some(reply) if accept(&reply) => return Ok(reply),
                    Some(reply) => match reply.frame_type {
                        FrameType::Rst => return Err(LinkError::PeerReset),
                        FrameType::Nak => break,
                        _ => {
                            tracing::trace!(
                                frame_type = ?reply.frame_type,
                                "unexpected frame while awaiting response, ignoring"
                            );
                        }
                    },
                    None => break,
                }
            }
        }
        Err(LinkError::LinkFailure)
    }

    /// Reliably send one data segment (at most
    /// [`tonelink_proto::MAX_PAYLOAD`] bytes).
    pub fn send_data(&mut self, payload: &[u8]) -> Result<(), LinkError> {
        let seq = self.tx_seq;
        let frame = Frame::data(seq, payload.to_vec())?;
        self.request(&frame, |f| {
            f.frame_type == FrameType::Ack && f.seq & 1 == seq & 1
        })?;
        self.tx_seq ^= 1;
        Ok(())
    }

    /// Open a connection: send SYN, await SYN-ACK (retried by the same
    /// ARQ loop).
    pub fn send_syn(&mut self) -> Result<Frame, LinkError> {
        let frame = Frame::control(FrameType::Syn, 0);
        self.request(&frame, |f| f.frame_type == FrameType::SynAck)
    }

    /// Accept a connection: send SYN-ACK, await the completing ACK.
    ///
    /// In-sequence DATA also completes the handshake — if the peer's ACK
    /// was lost but its first data segment arrives, the handshake
    /// evidently succeeded. The accepted frame is returned so the caller
    /// can absorb such early data.
    pub fn send_syn_ack(&mut self) -> Result<Frame, LinkError> {
        let frame = Frame::control(FrameType::SynAck, 0);
        self.request(&frame, |f| {
            matches!(f.frame_type, FrameType::Ack | FrameType::Data)
        })
    }

    /// Close: send FIN, await its ACK.
    pub fn send_fin(&mut self) -> Result<(), LinkError> {
        let seq = self.tx_seq;
        let frame = Frame::control(FrameType::Fin, seq);
        self.request(&frame, |f| {
            f.frame_type == FrameType::Ack && f.seq & 1 == seq & 1
        })?;
        self.tx_seq ^= 1;
        Ok(())
    }

    /// Process a received DATA frame: acknowledge it, and return its
    /// payload if it is in sequence.
    ///
    /// Duplicates (sequence bit mismatched) are re-acknowledged but not
    /// re-delivered — a lost ACK must not wedge the sender — so the layer
    /// above observes each payload exactly once.
    pub fn absorb_data(&mut self, frame: &Frame) -> Result<Option<Vec<u8>>, LinkError> {
        if frame.seq & 1 == self.rx_seq & 1 {
            self.link.send_frame(&Frame::ack(frame.seq))?;
            self.rx_seq ^= 1;
            Ok(Some(frame.payload.clone()))
        } else {
            tracing::debug!(seq = frame.seq, "duplicate DATA, re-acknowledging");
            self.link.send_frame(&Frame::ack(frame.seq))?;
            Ok(None)
        }
    }

    /// Wait for the next protocol event, acknowledging DATA and FIN as
    /// they arrive. `Ok(None)` on timeout.
    pub fn next_event(&mut self, timeout: std::time::Duration) -> Result<Option<Event>, LinkError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            let Some(frame) = self.link.recv_frame(remaining)? else {
                return Ok(None);
            };
            match frame.frame_type {
                FrameType::Data => {
                    if let Some(payload) = self.absorb_data(&frame)? {
                        return Ok(Some(Event::Data(payload)));
                    }
                }
                FrameType::Fin => {
                    self.link.send_frame(&Frame::ack(frame.seq))?;
                    return Ok(Some(Event::Fin));
                }
                FrameType::Syn => return Ok(Some(Event::Syn)),
                FrameType::SynAck => return Ok(Some(Event::SynAck)),
                FrameType::Rst => return Ok(Some(Event::Reset)),
                // Stray ACKs and NAKs outside a request window are noise.
                FrameType::Ack | FrameType::Nak => {
                    tracing::trace!(frame_type = ?frame.frame_type, "stray frame, ignoring");
                }
            }
        }
    }
}
