//! Screen dump decoding: rotated 4-bit indexed pixels to row-major RGB.

mod decode;
mod frame;
mod palette;

pub use decode::decode;
pub use frame::{FrameLengthError, INPUT_WIDTH, OUT_H, OUT_W, PITCH, ROWS_PER_LINE, RawFrame, Raster};
pub use palette::{Palette, Rgb, Theme};
