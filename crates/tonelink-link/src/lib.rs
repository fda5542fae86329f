//! Reliable transport and session management for the tonelink acoustic
//! modem.
//!
//! This crate turns the lossy frame channel underneath into an in-order
//! lossless byte stream:
//!
//! - [`FrameLink`] - the seam between transport logic and the physical
//!   path, so the ARQ and session machinery test against an in-memory
//!   link as readily as they run over sound
//! - [`AcousticLink`] - the production [`FrameLink`]: channel + AFSK
//!   codec + frame scanner
//! - [`Arq`] - Stop-and-Wait with an alternating sequence bit,
//!   duplicate suppression, and re-acknowledgment
//! - [`Connection`] - the session state machine (three-way handshake,
//!   graceful close, reset) running every control exchange through the
//!   same ARQ retry loop
//! - [`Modem`] - the facade that assembles a full stack from a
//!   [`tonelink_config::ModemConfig`]
//!
//! Error taxonomy: transient corruption never surfaces (the framer eats
//! it and the ARQ retransmits); [`LinkError::LinkFailure`] means retries
//! were exhausted, [`LinkError::PeerReset`] that an RST arrived,
//! [`LinkError::Timeout`] that the peer went quiet, and
//! [`LinkError::Closed`] that the session is over.

pub mod arq;
pub mod error;
pub mod frame_link;
pub mod modem;
pub mod params;
pub mod session;

pub use arq::{Arq, Event};
pub use error::LinkError;
pub use frame_link::{AcousticLink, FrameLink};
pub use modem::Modem;
pub use params::LinkParams;
pub use session::{Connection, Role, SessionState};
