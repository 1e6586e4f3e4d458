//! Serial wire protocol: host commands and device responses.
//!
//! - Host → device: one ASCII line per command, see [`Command`]
//! - Device → host: framed [`Response`] with a `u32` little-endian length

mod command;
mod frame;

pub use command::{Command, CAPTURE_TOKEN};
pub use frame::{read_response, EncodedPayload, Response, STATUS_ERR, STATUS_OK};

/// Errors raised while framing or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("payload of {0} bytes does not fit a 32-bit length prefix")]
    PayloadTooLarge(usize),

    #[error("unexpected status line: {0:?}")]
    UnexpectedStatus(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
