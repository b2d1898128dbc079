//! termios-backed serial port for the scope's USB-serial adapter.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::channel::{ScopeChannel, drain_until_quiet};
use super::error::{AcquireError, Result};

/// Serial line configured 8N1, raw, receiver enabled, modem lines ignored.
pub struct SerialPort {
    file: File,
    path: String,
}

impl SerialPort {
    /// Open and configure the serial device at `path`.
    ///
    /// # Errors
    /// Returns `AcquireError::ChannelOpen` if the device cannot be opened,
    /// is not a terminal, or rejects the line settings.
    pub fn open(path: &str, baud: u32) -> Result<Self> {
        let open_error = |source| AcquireError::ChannelOpen {
            path: path.to_string(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(open_error)?;

        configure_line(file.as_raw_fd(), baud).map_err(open_error)?;

        info!("Opened serial device {path} at {baud} baud (8N1)");
        Ok(Self {
            file,
            path: path.to_string(),
        })
    }
}

impl ScopeChannel for SerialPort {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        debug!("TX ({} bytes): {:02X?}", bytes.len(), bytes);
        self.file.write_all(bytes)?;
        self.file.flush()
    }

    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let millis = remaining.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;

            // SAFETY: `pfd` is a valid pollfd and we pass a count of exactly one.
            let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            if rc == 0 {
                return Ok(false);
            }
            if pfd.revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
                return Err(io::Error::other(format!(
                    "poll reported an error condition on {} (revents={:#06x})",
                    self.path, pfd.revents
                )));
            }
            // POLLHUP surfaces as a zero-length read.
            return Ok(true);
        }
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.file.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn discard_input(&mut self, quiet: Duration) -> io::Result<usize> {
        // SAFETY: the descriptor is owned by `self.file` and still open.
        if unsafe { libc::tcflush(self.file.as_raw_fd(), libc::TCIFLUSH) } != 0 {
            return Err(io::Error::last_os_error());
        }
        drain_until_quiet(self, quiet)
    }
}

/// Map a numeric baud rate onto a termios speed constant.
fn speed_for(baud: u32) -> io::Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported baud rate {other}"),
            ));
        }
    };
    Ok(speed)
}

/// Put the line into raw 8N1 mode at `baud`.
fn configure_line(fd: RawFd, baud: u32) -> io::Result<()> {
    let speed = speed_for(baud)?;

    // SAFETY: termios is plain data; an all-zero value is valid.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // Fails with ENOTTY when the path is not a terminal.
    // SAFETY: `tio` is a valid, writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // Raw mode with VMIN = VTIME = 0; reads are gated by poll().
    // SAFETY: as above.
    tio = unsafe { std::mem::zeroed() };
    tio.c_cflag = libc::CS8 | libc::CREAD | libc::CLOCAL;

    // SAFETY: `tio` is a valid termios and `speed` a valid speed constant.
    unsafe {
        if libc::cfsetospeed(&mut tio, speed) != 0 || libc::cfsetispeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tio) != 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(())
}
