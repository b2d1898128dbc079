//! Scope protocol constants.

use std::time::Duration;

/// Screen capture request, sent verbatim.
pub const CAPTURE_REQUEST: [u8; 4] = [0x57, 0x00, 0x00, 0x0A];

/// Size of one complete screen dump in bytes.
pub const FRAME_SIZE: usize = 40960;

/// Maximum bytes taken from the channel per readable event.
pub const READ_CHUNK: usize = 64;

/// Per-wait readability timeout.
pub const RX_TIMEOUT: Duration = Duration::from_millis(200);

/// Line rate configured on the scope's serial interface.
pub const BAUD_RATE: u32 = 1200;
