//! The capture session: poll for commands, serve capture cycles, idle.

use std::convert::Infallible;
use std::thread;
use std::time::{Duration, Instant};

use super::parser::{CommandParser, Poll};
use super::SessionError;
use crate::camera::{Encoder, FrameSource, Quality};
use crate::protocol::{Command, EncodedPayload, Response};
use crate::transport::Transport;

/// Default pause between polls.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(50);

/// Runtime settings for a [`CaptureSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pause after every poll, whether or not a command was served
    pub idle_interval: Duration,
    /// Encoder quality for every capture
    pub quality: Quality,
    /// Send an `ERR` frame when capture or encoding fails; stay silent otherwise
    pub report_errors: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_interval: DEFAULT_IDLE_INTERVAL,
            quality: Quality::DEFAULT,
            report_errors: true,
        }
    }
}

/// Protocol state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for input.
    Idle,
    /// Acquiring, encoding and writing one frame.
    Capturing,
}

/// What a single loop iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iteration {
    /// No command was pending (or the line was blank).
    Idle,
    /// A line was read and deliberately not answered.
    Ignored,
    /// A frame was sent; `bytes` is the payload length.
    Captured { bytes: u32 },
    /// Capture or encoding failed. `reported` says whether an `ERR` frame went out.
    Failed { reason: String, reported: bool },
}

/// Counters kept across the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub captures: u64,
    pub failures: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Drives the request/response protocol over one transport.
///
/// Single-threaded: the transport is owned exclusively, commands are read
/// only between cycles, and each cycle's writes complete before the next
/// poll.
pub struct CaptureSession<T, S, E> {
    transport: T,
    parser: CommandParser,
    source: S,
    encoder: E,
    config: SessionConfig,
    state: SessionState,
    stats: SessionStats,
}

impl<T, S, E> std::fmt::Debug for CaptureSession<T, S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<T, S, E> CaptureSession<T, S, E>
where
    T: Transport,
    S: FrameSource,
    E: Encoder,
{
    pub fn new(transport: T, source: S, encoder: E, config: SessionConfig) -> Self {
        Self {
            transport,
            parser: CommandParser::new(),
            source,
            encoder,
            config,
            state: SessionState::Idle,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Poll and serve forever. Returns only on a transport failure.
    pub fn run_forever(&mut self) -> Result<Infallible, SessionError> {
        log::info!(
            "Serving captures (quality {}, idle {:?})",
            self.config.quality.get(),
            self.config.idle_interval
        );
        loop {
            self.poll_once().inspect_err(log_fatal)?;
            thread::sleep(self.config.idle_interval);
        }
    }

    /// Like [`run_forever`](Self::run_forever), but checks `should_stop`
    /// before every poll and returns `Ok` once it reports true.
    pub fn run_until<F>(&mut self, mut should_stop: F) -> Result<(), SessionError>
    where
        F: FnMut() -> bool,
    {
        log::info!(
            "Serving captures (quality {}, idle {:?})",
            self.config.quality.get(),
            self.config.idle_interval
        );
        while !should_stop() {
            self.poll_once().inspect_err(log_fatal)?;
            thread::sleep(self.config.idle_interval);
        }
        log::info!(
            "Session stopped: {} captures, {} failures, {} ignored, {} malformed",
            self.stats.captures,
            self.stats.failures,
            self.stats.ignored,
            self.stats.malformed
        );
        Ok(())
    }

    /// One loop iteration without the idle sleep.
    pub fn poll_once(&mut self) -> Result<Iteration, SessionError> {
        let poll = self
            .parser
            .poll(&mut self.transport)
            .map_err(SessionError::Transport)?;

        match poll {
            Poll::Pending | Poll::Blank => Ok(Iteration::Idle),
            Poll::Malformed => {
                self.stats.malformed += 1;
                Ok(Iteration::Ignored)
            }
            Poll::Command(Command::Capture) => self.capture_cycle(),
            Poll::Command(Command::Unknown(text)) => {
                log::debug!("Ignoring unknown command {:?}", text);
                self.stats.ignored += 1;
                Ok(Iteration::Ignored)
            }
        }
    }

    fn capture_cycle(&mut self) -> Result<Iteration, SessionError> {
        self.state = SessionState::Capturing;
        let result = self.serve_capture();
        self.state = SessionState::Idle;
        result
    }

    fn serve_capture(&mut self) -> Result<Iteration, SessionError> {
        let started = Instant::now();

        let payload = match self.acquire() {
            Ok(payload) => payload,
            Err(reason) => return self.report_failure(reason),
        };

        let len = payload.len();
        Response::Ok(payload)
            .write_to(&mut self.transport)
            .map_err(SessionError::Transport)?;

        self.stats.captures += 1;
        log::info!("Sent frame: {} bytes in {:?}", len, started.elapsed());
        Ok(Iteration::Captured { bytes: len })
    }

    /// Capture and encode one frame. Nothing is written until this succeeds.
    fn acquire(&mut self) -> Result<EncodedPayload, String> {
        let frame = self.source.capture().map_err(|e| e.to_string())?;
        log::debug!("Captured {}x{} frame", frame.width, frame.height);
        let bytes = self
            .encoder
            .encode(&frame, self.config.quality)
            .map_err(|e| e.to_string())?;
        EncodedPayload::new(bytes).map_err(|e| e.to_string())
    }

    fn report_failure(&mut self, reason: String) -> Result<Iteration, SessionError> {
        self.stats.failures += 1;
        log::warn!("Capture failed: {}", reason);

        if self.config.report_errors {
            Response::error(reason.as_str())
                .write_to(&mut self.transport)
                .map_err(SessionError::Transport)?;
        }
        Ok(Iteration::Failed {
            reason,
            reported: self.config.report_errors,
        })
    }
}

fn log_fatal(err: &SessionError) {
    log::error!("Session ended: {}", err);
}
