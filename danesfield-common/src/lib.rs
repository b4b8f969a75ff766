//! # Danesfield Common Library
//!
//! Shared code for the Danesfield reconstruction pipeline including:
//! - Error types for the geodetic layer
//! - Configuration loading (TOML run files)
//! - Geodetic utilities (bounding boxes, reprojection, UTM zones)
//! - Coordinate offsets embedded in file headers
//! - Raster access interface consumed by the geodetic utilities

pub mod config;
pub mod error;
pub mod geodesy;
pub mod offset;
pub mod raster;

pub use error::{Error, Result};
pub use geodesy::{BoundingBox, Crs, GeoTransform, Hemisphere, UtmZone};
pub use offset::CoordinateOffset;
pub use raster::{GroundControlPoint, Raster, RasterInfo, RasterOpener};
