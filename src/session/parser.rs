//! Non-blocking line reader that turns host input into [`Command`]s.

use std::io;

use crate::protocol::Command;
use crate::transport::Transport;

/// Longest accepted command line, newline excluded.
pub const MAX_LINE_LEN: usize = 256;

const READ_CHUNK: usize = 64;

/// What one poll of the parser produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// No complete line is available.
    Pending,
    /// A complete line was read and decoded.
    Command(Command),
    /// A complete line was read but was blank.
    Blank,
    /// A line was discarded (invalid UTF-8 or over-long).
    Malformed,
}

/// Accumulates transport bytes and yields at most one line per poll.
#[derive(Debug, Default)]
pub struct CommandParser {
    buffer: Vec<u8>,
    /// Set after an over-long line; bytes are dropped until the next newline.
    discarding: bool,
}

impl CommandParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check for a command without blocking.
    ///
    /// A line already buffered from an earlier read is returned before the
    /// transport is touched again.
    pub fn poll<T: Transport + ?Sized>(&mut self, transport: &mut T) -> io::Result<Poll> {
        if let Some(poll) = self.next_line() {
            return Ok(poll);
        }
        if !transport.input_pending()? {
            return Ok(Poll::Pending);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let n = match transport.read(&mut chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "transport closed by host",
                ))
            }
            Ok(n) => n,
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                return Ok(Poll::Pending)
            }
            Err(e) => return Err(e),
        };
        self.ingest(&chunk[..n]);

        Ok(self.next_line().unwrap_or(Poll::Pending))
    }

    /// Bytes held for a line that has not been terminated yet.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn ingest(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.discarding {
                if byte == b'\n' {
                    self.discarding = false;
                }
                continue;
            }
            self.buffer.push(byte);
        }
    }

    fn next_line(&mut self) -> Option<Poll> {
        match self.buffer.iter().position(|&b| b == b'\n') {
            Some(end) => {
                let line: Vec<u8> = self.buffer.drain(..=end).collect();
                Some(decode(&line))
            }
            None if self.buffer.len() > MAX_LINE_LEN => {
                log::debug!(
                    "Discarding {} bytes of unterminated input",
                    self.buffer.len()
                );
                self.buffer.clear();
                self.discarding = true;
                Some(Poll::Malformed)
            }
            None => None,
        }
    }
}

fn decode(line: &[u8]) -> Poll {
    if line.len() > MAX_LINE_LEN + 1 {
        log::debug!("Discarding over-long line ({} bytes)", line.len());
        return Poll::Malformed;
    }
    match std::str::from_utf8(line) {
        Ok(text) => match Command::parse(text) {
            Some(command) => Poll::Command(command),
            None => Poll::Blank,
        },
        Err(e) => {
            log::debug!("Discarding undecodable line: {}", e);
            Poll::Malformed
        }
    }
}
