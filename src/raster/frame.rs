//! Raw screen dump and decoded RGB raster buffers.

use thiserror::Error;

use super::palette::Rgb;
use crate::scope::FRAME_SIZE;

/// Device scan-lines per frame; each becomes one output column.
pub const INPUT_WIDTH: usize = 320;
/// Raw bytes per device scan-line, padding included.
pub const PITCH: usize = 128;
/// Raw bytes per scan-line that carry pixels (two per byte).
pub const ROWS_PER_LINE: usize = 120;

pub const OUT_W: usize = 320;
pub const OUT_H: usize = 240;

const RASTER_LEN: usize = OUT_W * OUT_H * 3;

/// Raised when a byte buffer is not exactly one frame long.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("screen dump must be {expected} bytes, got {len}")]
pub struct FrameLengthError {
    pub len: usize,
    pub expected: usize,
}

/// One complete screen dump, always exactly `FRAME_SIZE` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RawFrame {
    data: Box<[u8]>,
}

impl RawFrame {
    /// Zero-filled frame used as the acquisition target.
    pub(crate) fn zeroed() -> Self {
        Self {
            data: vec![0u8; FRAME_SIZE].into_boxed_slice(),
        }
    }

    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<Vec<u8>> for RawFrame {
    type Error = FrameLengthError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() != FRAME_SIZE {
            return Err(FrameLengthError {
                len: bytes.len(),
                expected: FRAME_SIZE,
            });
        }
        Ok(Self {
            data: bytes.into_boxed_slice(),
        })
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame").field("len", &self.data.len()).finish()
    }
}

/// Row-major 320x240 RGB image, 3 bytes per pixel.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    data: Box<[u8]>,
}

impl Raster {
    /// A raster with every pixel set to `color`.
    pub fn filled(color: Rgb) -> Self {
        let data = color
            .to_array()
            .iter()
            .copied()
            .cycle()
            .take(RASTER_LEN)
            .collect::<Vec<u8>>()
            .into_boxed_slice();
        Self { data }
    }

    pub fn width(&self) -> usize {
        OUT_W
    }

    pub fn height(&self) -> usize {
        OUT_H
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: Rgb) {
        let base = y * 3 * OUT_W + x * 3;
        self.data[base..base + 3].copy_from_slice(&rgb.to_array());
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let base = y * 3 * OUT_W + x * 3;
        Rgb::new(self.data[base], self.data[base + 1], self.data[base + 2])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Default for Raster {
    fn default() -> Self {
        Self::filled(Rgb::new(0, 0, 0))
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &OUT_W)
            .field("height", &OUT_H)
            .finish()
    }
}
