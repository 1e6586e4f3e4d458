//! Capture session: command parsing and the request/response loop.

mod controller;
mod parser;

pub use controller::{
    CaptureSession, Iteration, SessionConfig, SessionState, SessionStats, DEFAULT_IDLE_INTERVAL,
};
pub use parser::{CommandParser, Poll, MAX_LINE_LEN};

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading from or writing to the host failed; the link is unusable.
    #[error("Transport failure: {0}")]
    Transport(#[source] std::io::Error),
}
