//! Byte-stream channels between the device and the host.
//!
//! This module provides:
//! - The [`Transport`] trait consumed by the command parser and session
//! - [`MemoryTransport`] for tests and local simulation
//! - [`TtyTransport`] for serial/USB-CDC devices (Unix only)

mod memory;
#[cfg(unix)]
mod tty;

use std::io::{Read, Write};

pub use memory::MemoryTransport;
#[cfg(unix)]
pub use tty::TtyTransport;

/// A full-duplex byte channel.
///
/// Reads and writes go through [`Read`] and [`Write`]. `input_pending` must
/// never block; the session relies on it to keep its idle cadence.
pub trait Transport: Read + Write {
    /// Whether at least one byte can be read without blocking.
    fn input_pending(&mut self) -> std::io::Result<bool>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn input_pending(&mut self) -> std::io::Result<bool> {
        (**self).input_pending()
    }
}
