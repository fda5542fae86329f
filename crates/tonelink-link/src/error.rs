//! Transport error taxonomy.

use thiserror::Error;

/// Errors surfaced by the reliable transport and session layers.
///
/// Recovery happens at the lowest layer able to handle it; these are the
/// outcomes left when recovery is exhausted.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Retries exhausted without an acknowledgment. Terminal for the
    /// current send.
    #[error("link failure: retries exhausted without acknowledgment")]
    LinkFailure,

    /// The peer sent RST; the session is gone.
    #[error("connection reset by peer")]
    PeerReset,

    /// The peer went quiet past the allowed window.
    #[error("timed out waiting for the peer")]
    Timeout,

    /// The session is closed (locally or by a received FIN).
    #[error("session closed")]
    Closed,

    /// Frame construction failed (oversized payload).
    #[error(transparent)]
    Frame(#[from] tonelink_proto::FrameError),

    /// Audio device failure. Fatal; only surfaced when opening or running
    /// the physical channel.
    #[error(transparent)]
    Audio(#[from] tonelink_io::Error),

    /// Configuration rejected by validation.
    #[error(transparent)]
    Config(#[from] tonelink_config::ConfigError),
}
