//! Serial device transport (tty / USB-CDC gadget).

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use super::Transport;

/// A serial device opened in raw mode.
///
/// Reads block until at least one byte arrives; callers that must not block
/// check [`Transport::input_pending`] first.
#[derive(Debug)]
pub struct TtyTransport {
    file: File,
    path: PathBuf,
}

impl TtyTransport {
    /// Open `path` for reading and writing and configure it for raw 8N1 at
    /// `baud`. Non-tty paths (pipes, FIFOs) are opened as-is.
    pub fn open(path: impl AsRef<Path>, baud: u32) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)?;

        let fd = file.as_raw_fd();
        // SAFETY: fd is a valid descriptor owned by `file`.
        if unsafe { libc::isatty(fd) } == 1 {
            configure_raw(fd, baud)?;
            log::debug!("Configured {} as raw tty at {} baud", path.display(), baud);
        } else {
            log::debug!("{} is not a tty, skipping line settings", path.display());
        }

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn configure_raw(fd: libc::c_int, baud: u32) -> io::Result<()> {
    let speed = baud_constant(baud)?;
    // SAFETY: termios is plain old data; tcgetattr fills it before use.
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };
    if unsafe { libc::tcgetattr(fd, &mut termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    unsafe { libc::cfmakeraw(&mut termios) };
    termios.c_cflag |= libc::CLOCAL | libc::CREAD;
    termios.c_cc[libc::VMIN] = 1;
    termios.c_cc[libc::VTIME] = 0;
    if unsafe { libc::cfsetspeed(&mut termios, speed) } != 0 {
        return Err(io::Error::last_os_error());
    }
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn baud_constant(baud: u32) -> io::Result<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        230_400 => libc::B230400,
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported baud rate {}", other),
            ))
        }
    };
    Ok(speed)
}

impl Read for TtyTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for TtyTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Transport for TtyTransport {
    fn input_pending(&mut self) -> io::Result<bool> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: one valid pollfd, zero timeout.
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        // A hangup is reported as readable so the next read surfaces the EOF.
        Ok(ready > 0 && pfd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
    }
}
