//! Reliable-transport timing parameters.

use std::time::Duration;

/// Timing knobs of the Stop-and-Wait transport.
///
/// The defaults assume the default physical profile: at 300 baud a
/// 64-byte payload is ~1.8 s of wire time and a full round trip
/// (frame, turnaround, ACK, turnaround) ~2.5 s, so 5 s tolerates one
/// transient silence event and five retries give ~25 s of recovery
/// headroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkParams {
    /// How long to await an ACK before retransmitting.
    pub ack_timeout: Duration,
    /// Retransmissions before a send fails with
    /// [`crate::LinkError::LinkFailure`].
    pub max_retries: u32,
    /// Pause before listening after sending a frame that expects a
    /// response, giving the peer time to pivot from receive to transmit.
    /// The echo guard at the audio layer handles the inverse transition.
    pub turnaround_guard: Duration,
}

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(5),
            max_retries: 5,
            turnaround_guard: Duration::from_millis(50),
        }
    }
}
