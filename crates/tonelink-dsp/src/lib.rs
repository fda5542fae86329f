//! Tonelink DSP - signal-processing primitives for the acoustic modem
//!
//! This crate provides the small set of DSP building blocks the AFSK
//! physical layer is built from, designed for block processing with zero
//! allocation in the sample path.
//!
//! # Building Blocks
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook band-pass
//!   coefficients, used for the mark/space tone filter bank
//! - [`EnvelopeDetector`] - Rectify-and-smooth amplitude detection, used to
//!   turn filter output into per-bit decision energy
//! - [`ToneGenerator`] - Phase-continuous sinusoid source whose frequency can
//!   switch at arbitrary sample boundaries without phase jumps
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! tonelink-dsp = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in sample-processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Deterministic**: Identical input always produces identical output,
//!   which the modem's loopback tests rely on

#![cfg_attr(not(feature = "std"), no_std)]

pub mod biquad;
pub mod envelope;
pub mod tone;

pub use biquad::{Biquad, bandpass_coefficients};
pub use envelope::EnvelopeDetector;
pub use tone::ToneGenerator;
