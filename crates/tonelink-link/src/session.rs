//! Session lifecycle: three-way handshake, reliable byte exchange,
//! graceful close, reset.
//!
//! State machine (per side):
//!
//! ```text
//! initiator: CLOSED ─SYN→ SYN-SENT ─SYN-ACK/ACK→ ESTABLISHED
//! responder: CLOSED ─listen→ LISTEN ─SYN/SYN-ACK→ SYN-RECEIVED ─ACK→ ESTABLISHED
//! either:    ESTABLISHED ─FIN→ FIN-WAIT ─ACK→ CLOSED
//!            any state ─RST→ CLOSED
//! ```
//!
//! Every transition's control frame rides the same ARQ retry loop as
//! data, so a lost SYN, SYN-ACK, or FIN is retransmitted on timeout. A
//! responder whose handshake stalls falls back to LISTEN; a closer whose
//! FIN is never acknowledged closes anyway (best effort).

use crate::arq::{Arq, Event};
use crate::frame_link::FrameLink;
use crate::params::LinkParams;
use crate::LinkError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tonelink_proto::{Frame, FrameType, MAX_PAYLOAD};

/// Which side initiated the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sent the first SYN.
    Initiator,
    /// Accepted it.
    Responder,
}

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session (initial and final state).
    Closed,
    /// Both sides have completed the handshake.
    Established,
    /// FIN sent, awaiting its ACK.
    FinWait,
}

/// One established session: a logically bidirectional, in-order,
/// lossless byte channel between an initiator and a responder.
#[derive(Debug)]
pub struct Connection<L: FrameLink> {
    arq: Arq<L>,
    state: SessionState,
    role: Role,
    established_at: Instant,
    /// Segments absorbed out of band (early data during the handshake)
    /// awaiting delivery through `recv`.
    queued: VecDeque<Vec<u8>>,
}

impl<L: FrameLink> Connection<L> {
    /// Initiate a session: SYN, await SYN-ACK, answer with ACK.
    ///
    /// Fails with [`LinkError::LinkFailure`] when the handshake retries
    /// are exhausted and [`LinkError::PeerReset`] on RST.
    pub fn connect(link: L, params: LinkParams) -> Result<Self, LinkError> {
        let mut arq = Arq::new(link, params);
        tracing::info!("initiating handshake");
        arq.send_syn()?;
        arq.send_raw(&Frame::ack(0))?;
        tracing::info!("session established (initiator)");
        Ok(Self {
            arq,
            state: SessionState::Established,
            role: Role::Initiator,
            established_at: Instant::now(),
            queued: VecDeque::new(),
        })
    }

    /// Accept a session: listen for SYN, answer SYN-ACK, await the ACK.
    ///
    /// A handshake that stalls mid-way drops back to listening; the call
    /// fails with [`LinkError::Timeout`] only when `timeout` elapses with
    /// no session established.
    pub fn accept(link: L, params: LinkParams, timeout: Duration) -> Result<Self, LinkError> {
        let mut arq = Arq::new(link, params);
        let deadline = Instant::now() + timeout;
        tracing::info!("listening for a peer");

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(LinkError::Timeout);
            }

            match arq.next_event(remaining)? {
                Some(Event::Syn) => {
                    // SYN-RECEIVED: answer and await the completing ACK.
                    match arq.send_syn_ack() {
                        Ok(reply) => {
                            let mut connection = Self {
                                arq,
                                state: SessionState::Established,
                                role: Role::Responder,
                                established_at: Instant::now(),
                                queued: VecDeque::new(),
                            };
                            if reply.frame_type == FrameType::Data {
                                // The ACK leg was lost but data arrived:
                                // the handshake succeeded. Absorb the
                                // segment so nothing is dropped.
                                if let Some(payload) =
                                    connection.arq.absorb_data(&reply)?
                                {
                                    connection.queued.push_back(payload);
                                }
                            }
                            tracing::info!("session established (responder)");
                            return Ok(connection);
                        }
                        Err(LinkError::LinkFailure) => {
                            tracing::debug!("handshake stalled, back to listening");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Some(Event::Reset) => {
                    tracing::debug!("RST while listening, ignoring");
                }
                Some(other) => {
                    tracing::trace!(event = ?other, "ignoring while listening");
                }
                None => {}
            }
        }
    }

    /// Which side of the handshake this connection is.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the handshake completed.
    pub fn established_at(&self) -> Instant {
        self.established_at
    }

    /// Reliably send bytes, split into maximum-payload segments, each
    /// acknowledged before the next departs.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.send_with_progress(bytes, |_, _| {})
    }

    /// [`Self::send`] with a progress callback `(bytes_sent, total)`
    /// invoked after each acknowledged segment.
    pub fn send_with_progress(
        &mut self,
        bytes: &[u8],
        mut progress: impl FnMut(usize, usize),
    ) -> Result<(), LinkError> {
        if self.state != SessionState::Established {
            return Err(LinkError::Closed);
        }
        let total = bytes.len();
        let mut sent = 0;
        for chunk in bytes.chunks(MAX_PAYLOAD) {
            match self.arq.send_data(chunk) {
                Ok(()) => {
                    sent += chunk.len();
                    progress(sent, total);
                }
                Err(LinkError::PeerReset) => {
                    self.state = SessionState::Closed;
                    return Err(LinkError::PeerReset);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Receive the next in-order segment of bytes.
    ///
    /// Returns [`LinkError::Timeout`] if the peer stays quiet,
    /// [`LinkError::Closed`] once the peer's FIN arrives (after
    /// acknowledging it), and [`LinkError::PeerReset`] on RST.
    pub fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>, LinkError> {
        if self.state == SessionState::Closed {
            return Err(LinkError::Closed);
        }
        if let Some(queued) = self.queued.pop_front() {
            return Ok(queued);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(LinkError::Timeout);
            }
            match self.arq.next_event(remaining)? {
                Some(Event::Data(payload)) => return Ok(payload),
                Some(Event::Fin) => {
                    tracing::info!("peer closed the session");
                    self.state = SessionState::Closed;
                    return Err(LinkError::Closed);
                }
                Some(Event::Reset) => {
                    self.state = SessionState::Closed;
                    return Err(LinkError::PeerReset);
                }
                Some(Event::SynAck) if self.role == Role::Initiator => {
                    // The peer never saw our handshake ACK and is
                    // retrying; answer again.
                    tracing::debug!("re-acknowledging retransmitted SYN-ACK");
                    self.arq.send_raw(&Frame::ack(0))?;
                }
                Some(other) => {
                    tracing::trace!(event = ?other, "ignoring out-of-place event");
                }
                None => return Err(LinkError::Timeout),
            }
        }
    }

    /// Gracefully close: FIN, await its ACK, then CLOSED.
    ///
    /// Idempotent — closing a closed connection is a no-op. A FIN whose
    /// acknowledgment never arrives still closes the session (best
    /// effort), mirroring the peer's own FIN-WAIT timeout.
    pub fn close(&mut self) -> Result<(), LinkError> {
        match self.state {
            SessionState::Closed => Ok(()),
            _ => {
                self.state = SessionState::FinWait;
                match self.arq.send_fin() {
                    Ok(()) => tracing::info!("session closed"),
                    Err(LinkError::LinkFailure) => {
                        tracing::debug!("FIN unacknowledged, closing anyway");
                    }
                    Err(LinkError::PeerReset) => {
                        tracing::debug!("RST during close");
                    }
                    Err(e) => {
                        self.state = SessionState::Closed;
                        return Err(e);
                    }
                }
                self.state = SessionState::Closed;
                Ok(())
            }
        }
    }

    /// Hard abort: send a single RST (no retry, no reply expected) and
    /// drop to CLOSED.
    pub fn abort(&mut self) -> Result<(), LinkError> {
        if self.state != SessionState::Closed {
            self.arq.send_raw(&Frame::control(FrameType::Rst, 0))?;
            self.state = SessionState::Closed;
        }
        Ok(())
    }

    /// The underlying link, for teardown and diagnostics.
    pub fn link_mut(&mut self) -> &mut L {
        self.arq.link_mut()
    }
}
