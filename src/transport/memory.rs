//! In-memory transport backed by shared buffers.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use super::Transport;

#[derive(Debug, Default)]
struct Buffers {
    /// Bytes sent by the host, waiting to be read by the device.
    inbound: VecDeque<u8>,
    /// Bytes written by the device.
    outbound: Vec<u8>,
    /// Fail every write with `BrokenPipe` while set.
    fail_writes: bool,
}

/// Loopback transport for tests and simulation.
///
/// Clones share the same buffers, so a test can keep one handle to play the
/// host while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    buffers: Arc<Mutex<Buffers>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Buffers> {
        // A poisoned lock only means a test thread panicked mid-write; the
        // buffers are still usable.
        self.buffers.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue bytes as if the host had sent them.
    pub fn push_input(&self, bytes: &[u8]) {
        self.lock().inbound.extend(bytes);
    }

    /// Take everything the device has written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.lock().outbound)
    }

    /// Number of written bytes not yet taken.
    pub fn output_len(&self) -> usize {
        self.lock().outbound.len()
    }

    /// Number of host bytes not yet consumed by the device.
    pub fn pending_input(&self) -> usize {
        self.lock().inbound.len()
    }

    /// Make subsequent writes fail, simulating a disconnected host.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }
}

impl Read for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut buffers = self.lock();
        if buffers.inbound.is_empty() {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        let n = buf.len().min(buffers.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(buffers.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffers = self.lock();
        if buffers.fail_writes {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        buffers.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn input_pending(&mut self) -> io::Result<bool> {
        Ok(!self.lock().inbound.is_empty())
    }
}
