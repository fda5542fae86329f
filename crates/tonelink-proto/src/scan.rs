//! Frame extraction from demodulated bit streams.
//!
//! The demodulator hands this module raw bits with no byte alignment; the
//! sync word establishes alignment. [`FrameScanner`] is a lazy iterator
//! over an explicit scan position — no recursion, one pass, and on a CRC
//! failure it resumes one byte past the failed sync so noise can never
//! cause a re-parse loop.

use crate::bits::{byte_at, bytes_to_bits};
use crate::crc::crc16;
use crate::frame::{Frame, FrameType, MAX_PAYLOAD, SYNC};

/// Bits in the sync word.
const SYNC_BITS: usize = SYNC.len() * 8;

/// Bits in the type/seq/length header.
const HEADER_BITS: usize = 3 * 8;

/// Bits in the CRC trailer.
const CRC_BITS: usize = 2 * 8;

/// Lazy frame scanner over a bit sequence.
///
/// Yields each CRC-valid frame found in the input. Candidates that fail
/// the CRC, carry an illegal length, or carry an unknown type byte are
/// logged at debug level and skipped; candidates truncated by the end of
/// the buffer are dropped silently.
#[derive(Debug)]
pub struct FrameScanner<'a> {
    bits: &'a [bool],
    pos: usize,
}

/// Outcome of attempting to parse a frame candidate at a sync match.
enum Candidate {
    /// Valid frame; second field is the bit index just past the frame.
    Parsed(Frame, usize),
    /// CRC mismatch, illegal length, or unknown type — resume scanning
    /// one byte after the sync match.
    Rejected,
    /// Not enough bits left to complete the frame. Dropped silently, but
    /// scanning continues: the length field of a noise candidate can claim
    /// more bits than the buffer holds while a real frame still follows.
    Truncated,
}

impl<'a> FrameScanner<'a> {
    /// Create a scanner over the given bit sequence.
    pub fn new(bits: &'a [bool]) -> Self {
        Self { bits, pos: 0 }
    }

    /// Check for the sync bit pattern at bit index `i`.
    fn sync_at(&self, i: usize) -> bool {
        (0..SYNC_BITS).all(|k| self.bits[i + k] == ((SYNC[k / 8] >> (k % 8)) & 1 == 1))
    }

    /// Try to parse a frame whose sync word starts at bit index `sync_pos`.
    fn parse_at(&self, sync_pos: usize) -> Candidate {
        let body = sync_pos + SYNC_BITS;
        if body + HEADER_BITS > self.bits.len() {
            return Candidate::Truncated;
        }

        let type_byte = byte_at(&self.bits[body..]);
        let seq = byte_at(&self.bits[body + 8..]);
        let length = byte_at(&self.bits[body + 16..]) as usize;

        if length > MAX_PAYLOAD {
            tracing::debug!(length, "frame candidate with illegal length, skipping");
            return Candidate::Rejected;
        }

        let total_bits = HEADER_BITS + length * 8 + CRC_BITS;
        if body + total_bits > self.bits.len() {
            return Candidate::Truncated;
        }

        let mut checked = Vec::with_capacity(3 + length);
        checked.push(type_byte);
        checked.push(seq);
        checked.push(length as u8);
        for k in 0..length {
            checked.push(byte_at(&self.bits[body + HEADER_BITS + k * 8..]));
        }

        let crc_pos = body + HEADER_BITS + length * 8;
        let received =
            (u16::from(byte_at(&self.bits[crc_pos..])) << 8) | u16::from(byte_at(&self.bits[crc_pos + 8..]));
        let computed = crc16(&checked);

        if received != computed {
            tracing::debug!(
                received,
                computed,
                length,
                head = ?&checked[3..checked.len().min(11)],
                "CRC mismatch, dropping frame candidate"
            );
            return Candidate::Rejected;
        }

        let Some(frame_type) = FrameType::from_wire(type_byte) else {
            tracing::debug!(type_byte, "valid CRC but unknown frame type, ignoring");
            return Candidate::Rejected;
        };

        let frame = Frame {
            frame_type,
            seq,
            payload: checked.split_off(3),
        };
        Candidate::Parsed(frame, body + total_bits)
    }
}

impl Iterator for FrameScanner<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while self.pos + SYNC_BITS <= self.bits.len() {
            if !self.sync_at(self.pos) {
                self.pos += 1;
                continue;
            }

            match self.parse_at(self.pos) {
                Candidate::Parsed(frame, end) => {
                    self.pos = end;
                    return Some(frame);
                }
                // Resume one byte past the failed sync; rewinding into the
                // candidate's payload could re-parse the same noise forever.
                Candidate::Rejected | Candidate::Truncated => self.pos += 8,
            }
        }
        None
    }
}

/// Extract every valid frame from a bit sequence.
pub fn scan_bits(bits: &[bool]) -> Vec<Frame> {
    FrameScanner::new(bits).collect()
}

/// Extract every valid frame from a byte stream (the byte-level contract;
/// bytes are expanded LSB-first and scanned identically).
pub fn scan_bytes(bytes: &[u8]) -> Vec<Frame> {
    scan_bits(&bytes_to_bits(bytes))
}
