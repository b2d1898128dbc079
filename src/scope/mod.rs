//! GDS-820C screen capture protocol over a serial link.
//!
//! The host sends a fixed 4-byte request and the scope answers with exactly
//! `FRAME_SIZE` bytes of packed 4-bit pixel data. There is no header, trailer
//! or checksum: reception is complete only when the agreed size is reached.

mod acquire;
mod channel;
mod error;
mod serial;
mod types;


// Re-export public API
pub use acquire::{Acquirer, TimeoutPolicy, acquire_frame};
pub use channel::ScopeChannel;
pub use error::{AcquireError, Result};
pub use serial::SerialPort;
pub use types::{BAUD_RATE, CAPTURE_REQUEST, FRAME_SIZE, READ_CHUNK, RX_TIMEOUT};
