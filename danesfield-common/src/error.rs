//! Common error types for Danesfield

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for Danesfield operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error conditions raised by the geodetic and configuration layer
#[derive(Error, Debug)]
pub enum Error {
    /// Raster has neither an affine transform nor usable ground-control points
    #[error("Georeference missing: {0}")]
    GeoreferenceMissing(String),

    /// Coordinates fall outside the latitude band where UTM is defined
    #[error("Invalid UTM: (lon, lat)=({longitude}, {latitude})")]
    InvalidUtm { longitude: f64, latitude: f64 },

    /// Coordinate reference definition or point transformation failed
    #[error("Reprojection error: {0}")]
    Reprojection(String),

    /// A raster or vector dataset could not be opened
    #[error("Unable to open {path:?}: {reason}")]
    ResourceOpenFailure { path: PathBuf, reason: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `ResourceOpenFailure` for `path`
    pub fn open_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::ResourceOpenFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
