pub mod config;
pub mod error;
pub mod export;
pub mod poller;
pub mod raster;
pub mod scope;

pub use error::{AppError, Result};
