//! Framing layer for the tonelink acoustic modem.
//!
//! This crate defines the atomic unit on the wire — the frame — and the
//! machinery to turn payloads into wire bytes and demodulated bit streams
//! back into frames:
//!
//! - [`Frame`] / [`FrameType`] - the typed frame model
//! - [`crc16`] - CRC-16-CCITT over header and payload
//! - [`FrameScanner`] - lazy scanner that extracts frames from a bit
//!   sequence, using the sync word for byte alignment
//!
//! ## Wire layout
//!
//! ```text
//! ┌──────────────┬───────────┬──────┬─────┬────────┬─────────┬───────┐
//! │ preamble     │ sync      │ type │ seq │ length │ payload │ CRC   │
//! │ 16 x 0xAA    │ 0x7E 0x7E │ 1 B  │ 1 B │ 1 B    │ 0-64 B  │ 2 B   │
//! └──────────────┴───────────┴──────┴─────┴────────┴─────────┴───────┘
//! ```
//!
//! The CRC covers type, sequence, length, and payload — not the preamble
//! or sync. The length field is a single byte: payloads are capped at
//! [`MAX_PAYLOAD`] bytes, so one octet is sufficient and is the documented
//! wire format.
//!
//! All multi-bit fields are serialized LSB-first at the bit level, matching
//! the AFSK layer's bit ordering. The CRC rides the wire big-endian.

pub mod bits;
pub mod crc;
pub mod frame;
pub mod scan;

pub use bits::{bits_to_bytes, bytes_to_bits};
pub use crc::crc16;
pub use frame::{Frame, FrameError, FrameType, MAX_PAYLOAD, PREAMBLE_BYTE, PREAMBLE_LEN, SYNC};
pub use scan::{FrameScanner, scan_bits, scan_bytes};
