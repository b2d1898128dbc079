//! Frame acquisition: request a screen dump and assemble exactly one frame.

use std::io;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::channel::ScopeChannel;
use super::error::{AcquireError, Result};
use super::types::{CAPTURE_REQUEST, FRAME_SIZE, READ_CHUNK, RX_TIMEOUT};
use crate::raster::RawFrame;

/// What to do when the line goes quiet part way through a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeoutPolicy {
    /// Abandon the capture; the next poll starts over.
    #[default]
    Strict,
    /// Re-send the request and restart accumulation, a bounded number of times.
    Rearm,
}

/// Acquisition settings: per-wait timeout and partial-frame policy.
#[derive(Debug, Clone, Copy)]
pub struct Acquirer {
    rx_timeout: Duration,
    policy: TimeoutPolicy,
    max_rearms: u32,
}

impl Default for Acquirer {
    fn default() -> Self {
        Self {
            rx_timeout: RX_TIMEOUT,
            policy: TimeoutPolicy::Strict,
            max_rearms: 0,
        }
    }
}

impl Acquirer {
    /// Create an acquirer with the given per-wait timeout and strict policy.
    pub fn new(rx_timeout: Duration) -> Self {
        Self {
            rx_timeout,
            ..Self::default()
        }
    }

    /// Select the partial-frame timeout policy.
    ///
    /// `max_rearms` only matters for [`TimeoutPolicy::Rearm`].
    pub fn with_policy(mut self, policy: TimeoutPolicy, max_rearms: u32) -> Self {
        self.policy = policy;
        self.max_rearms = max_rearms;
        self
    }

    pub fn rx_timeout(&self) -> Duration {
        self.rx_timeout
    }

    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    /// Request one screen dump and read it into a frame.
    ///
    /// # Errors
    /// - `Channel` if writing or waiting fails, or the device hangs up.
    /// - `Timeout` if the line stays quiet for the per-wait timeout.
    /// - `Overflow` if more than `FRAME_SIZE` bytes arrive.
    pub fn acquire<C: ScopeChannel + ?Sized>(&self, channel: &mut C) -> Result<RawFrame> {
        let started = Instant::now();
        let mut frame = RawFrame::zeroed();
        let mut chunk = [0u8; READ_CHUNK];
        let mut total = 0usize;
        let mut rearms = 0u32;

        channel.send(&CAPTURE_REQUEST)?;

        loop {
            let readable = channel.wait_readable(self.rx_timeout).map_err(|e| {
                error!("Wait for scope data failed: {e}");
                AcquireError::Channel(e)
            })?;

            if !readable {
                if total > 0 && self.policy == TimeoutPolicy::Rearm && rearms < self.max_rearms {
                    rearms += 1;
                    warn!(
                        "Stalled after {total} of {FRAME_SIZE} bytes, re-sending request ({rearms}/{})",
                        self.max_rearms
                    );
                    total = 0;
                    channel.send(&CAPTURE_REQUEST)?;
                    continue;
                }
                debug!("RX timeout after {total} bytes ({:?})", self.rx_timeout);
                return Err(AcquireError::Timeout {
                    received: total,
                    expected: FRAME_SIZE,
                });
            }

            let n = channel.read_chunk(&mut chunk)?;
            if n == 0 {
                error!("Scope hung up after {total} bytes");
                return Err(AcquireError::Channel(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "device hung up",
                )));
            }

            if total + n > FRAME_SIZE {
                warn!("Overflow: last read={n}, bytes total={}", total + n);
                return Err(AcquireError::Overflow {
                    received: total + n,
                    expected: FRAME_SIZE,
                });
            }

            frame.as_mut_bytes()[total..total + n].copy_from_slice(&chunk[..n]);
            total += n;

            if total == FRAME_SIZE {
                // Bytes already queued behind a complete frame mean the
                // stream is not aligned with frame boundaries.
                if channel.wait_readable(Duration::ZERO)? {
                    let extra = channel.read_chunk(&mut chunk)?;
                    if extra > 0 {
                        warn!("Overflow: {extra} trailing bytes after a full frame");
                        return Err(AcquireError::Overflow {
                            received: total + extra,
                            expected: FRAME_SIZE,
                        });
                    }
                }
                debug!("Frame complete: {total} bytes in {:?}", started.elapsed());
                return Ok(frame);
            }
        }
    }

    /// Flush whatever is left on the line after a failed capture.
    ///
    /// Returns the number of bytes discarded.
    pub fn resync<C: ScopeChannel + ?Sized>(&self, channel: &mut C) -> Result<usize> {
        let discarded = channel.discard_input(self.rx_timeout)?;
        debug!("Resync discarded {discarded} bytes");
        Ok(discarded)
    }
}

/// Capture one frame with the default timeout and strict policy.
pub fn acquire_frame<C: ScopeChannel + ?Sized>(channel: &mut C) -> Result<RawFrame> {
    Acquirer::default().acquire(channel)
}
