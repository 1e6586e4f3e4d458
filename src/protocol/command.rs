//! Host command tokens.

use std::fmt;

/// Token the host sends to request a single frame.
pub const CAPTURE_TOKEN: &str = "CAPTURE";

/// A command decoded from one line of host input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Capture, encode and send one frame.
    Capture,
    /// Any other non-empty line. Ignored by the session.
    Unknown(String),
}

impl Command {
    /// Decode a line of host input.
    ///
    /// Surrounding whitespace is trimmed first; the comparison itself is an
    /// exact, case-sensitive match. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let text = line.trim();
        if text.is_empty() {
            return None;
        }
        Some(match text {
            CAPTURE_TOKEN => Command::Capture,
            other => Command::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Capture => write!(f, "{}", CAPTURE_TOKEN),
            Command::Unknown(text) => write!(f, "unknown({:?})", text),
        }
    }
}
