//! Byte channel abstraction used by the acquisition loop.

use std::io;
use std::time::Duration;

/// A bidirectional byte channel to the scope.
///
/// Implemented by [`SerialPort`](super::SerialPort) for real hardware and by
/// scripted channels in tests.
pub trait ScopeChannel {
    /// Write the whole buffer to the device.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Block until data is readable or `timeout` elapses.
    ///
    /// Returns `Ok(false)` on timeout.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read whatever is available, up to `buf.len()` bytes.
    ///
    /// Returns `Ok(0)` when the device hung up.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Throw away pending input until the line stays quiet for `quiet`.
    ///
    /// Returns the number of bytes discarded.
    fn discard_input(&mut self, quiet: Duration) -> io::Result<usize> {
        drain_until_quiet(self, quiet)
    }
}

/// Read and drop bytes until no data arrives for `quiet`.
pub(crate) fn drain_until_quiet<C: ScopeChannel + ?Sized>(channel: &mut C, quiet: Duration) -> io::Result<usize> {
    let mut scratch = [0u8; 256];
    let mut discarded = 0;
    while channel.wait_readable(quiet)? {
        let n = channel.read_chunk(&mut scratch)?;
        if n == 0 {
            break;
        }
        discarded += n;
    }
    Ok(discarded)
}
