//! AFSK physical layer for the tonelink acoustic modem.
//!
//! Converts byte streams to audio samples and back using Bell-202-style
//! audio frequency-shift keying: a mark tone (1200 Hz) for binary 1 and a
//! space tone (2200 Hz) for binary 0, at 300 baud.
//!
//! - [`Modulator`] - bytes → phase-continuous tone samples
//! - [`Demodulator`] - samples → bits (or bytes), via a two-filter
//!   envelope detector and non-data-aided bit-timing recovery
//! - [`AfskParams`] - the coherent record of the coupled physical-layer
//!   constants
//!
//! `modulate` is total. `demodulate` is total but lossy under noise — it
//! always produces its best guess, and the framing layer's CRC decides
//! what survives.

pub mod demodulator;
pub mod modulator;
pub mod params;
pub mod timing;

pub use demodulator::Demodulator;
pub use modulator::Modulator;
pub use params::AfskParams;
pub use timing::{TimingEstimate, estimate_timing};
