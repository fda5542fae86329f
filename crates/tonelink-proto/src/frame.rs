//! Frame model and wire encoding.

use crate::crc::crc16;
use thiserror::Error;

/// Number of preamble bytes preceding every frame.
pub const PREAMBLE_LEN: usize = 16;

/// The preamble byte: alternating bits, so the receiver sees a pure
/// alternating tone pattern to lock its bit clock onto.
pub const PREAMBLE_BYTE: u8 = 0xAA;

/// Frame-start delimiter, transmitted after the preamble.
pub const SYNC: [u8; 2] = [0x7E, 0x7E];

/// Maximum payload length in bytes.
pub const MAX_PAYLOAD: usize = 64;

/// Errors from frame construction and encoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Payload exceeds [`MAX_PAYLOAD`] bytes.
    #[error("payload of {0} bytes exceeds the {MAX_PAYLOAD}-byte frame limit")]
    PayloadTooLong(usize),
}

/// The typed frame kinds carried on the wire.
///
/// `Nak` stays in the wire format for interoperability, but this
/// implementation never emits it: CRC failures are silent drops recovered
/// by the sender's timeout. A received `Nak` is honored as an immediate
/// retransmit hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    /// Application data segment.
    Data = 0x01,
    /// Positive acknowledgment of a DATA, SYN-ACK, or FIN frame.
    Ack = 0x02,
    /// Negative acknowledgment (retransmit hint; never emitted here).
    Nak = 0x03,
    /// Connection request (first leg of the three-way handshake).
    Syn = 0x04,
    /// Connection accept (second leg of the handshake).
    SynAck = 0x05,
    /// Graceful close request.
    Fin = 0x06,
    /// Hard reset; receiver drops to CLOSED immediately.
    Rst = 0x07,
}

impl FrameType {
    /// Decode a wire type byte. Returns `None` for unknown values, which
    /// the scanner treats as channel noise.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FrameType::Data),
            0x02 => Some(FrameType::Ack),
            0x03 => Some(FrameType::Nak),
            0x04 => Some(FrameType::Syn),
            0x05 => Some(FrameType::SynAck),
            0x06 => Some(FrameType::Fin),
            0x07 => Some(FrameType::Rst),
            _ => None,
        }
    }
}

/// One frame: the atomic unit the AFSK layer carries.
///
/// Frames exist only in transit — they are built to send and consumed on
/// receive. The sequence field is a full byte on the wire, but the
/// Stop-and-Wait transport uses only its low bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame kind.
    pub frame_type: FrameType,
    /// Sequence number (mod 256; the ARQ uses the low bit).
    pub seq: u8,
    /// Opaque payload, at most [`MAX_PAYLOAD`] bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Build a DATA frame. Fails if the payload exceeds [`MAX_PAYLOAD`].
    pub fn data(seq: u8, payload: impl Into<Vec<u8>>) -> Result<Self, FrameError> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLong(payload.len()));
        }
        Ok(Self {
            frame_type: FrameType::Data,
            seq,
            payload,
        })
    }

    /// Build a zero-payload control frame of the given type.
    pub fn control(frame_type: FrameType, seq: u8) -> Self {
        Self {
            frame_type,
            seq,
            payload: Vec::new(),
        }
    }

    /// Build an ACK for the given sequence number.
    pub fn ack(seq: u8) -> Self {
        Self::control(FrameType::Ack, seq)
    }

    /// The bytes the CRC covers: type, sequence, length, payload.
    fn checked_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(3 + self.payload.len());
        bytes.push(self.frame_type as u8);
        bytes.push(self.seq);
        bytes.push(self.payload.len() as u8);
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Encode the frame into its full wire byte sequence:
    /// preamble, sync, header, payload, CRC (big-endian).
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, FrameError> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLong(self.payload.len()));
        }

        let checked = self.checked_bytes();
        let crc = crc16(&checked);

        let mut wire = Vec::with_capacity(PREAMBLE_LEN + SYNC.len() + checked.len() + 2);
        wire.extend_from_slice(&[PREAMBLE_BYTE; PREAMBLE_LEN]);
        wire.extend_from_slice(&SYNC);
        wire.extend_from_slice(&checked);
        wire.extend_from_slice(&crc.to_be_bytes());
        Ok(wire)
    }

    /// Total wire length in bytes for a payload of `payload_len` bytes.
    pub fn wire_len(payload_len: usize) -> usize {
        PREAMBLE_LEN + SYNC.len() + 3 + payload_len + 2
    }
}
