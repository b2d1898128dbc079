//! Writing decoded rasters and raw dumps to disk.

use chrono::Local;
use image::RgbImage;
use image::error::{ImageError, ParameterError, ParameterErrorKind};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::raster::{RawFrame, Raster};

/// Save a decoded raster as a PNG file.
pub fn save_png(raster: &Raster, path: &Path) -> Result<()> {
    let image = RgbImage::from_raw(
        raster.width() as u32,
        raster.height() as u32,
        raster.as_bytes().to_vec(),
    )
    .ok_or_else(|| ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::DimensionMismatch)))?;
    image.save(path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Save a raw screen dump exactly as received.
pub fn save_raw(frame: &RawFrame, path: &Path) -> Result<()> {
    std::fs::write(path, frame.as_bytes())?;
    debug!("Wrote raw dump {}", path.display());
    Ok(())
}

/// Load a raw screen dump previously written by [`save_raw`].
pub fn load_raw(path: &Path) -> Result<RawFrame> {
    let bytes = std::fs::read(path)?;
    Ok(RawFrame::try_from(bytes)?)
}

/// Timestamped file name for a snapshot, e.g. `scope-20260119-101502.123.png`.
pub fn snapshot_path(dir: &Path, extension: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
    dir.join(format!("scope-{stamp}.{extension}"))
}
