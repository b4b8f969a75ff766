//! Raster access interface
//!
//! Raster I/O is owned by an external driver (GDAL in production). The
//! geodetic utilities only need the georeferencing facts of a dataset, so they
//! consume this narrow trait instead of a driver handle.

use crate::geodesy::{Crs, GeoTransform};
use crate::Result;
use std::collections::HashMap;
use std::path::Path;

/// Correspondence between an image position and a ground position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundControlPoint {
    /// Column in image space
    pub pixel: f64,
    /// Row in image space
    pub line: f64,
    /// Ground X (easting or longitude)
    pub x: f64,
    /// Ground Y (northing or latitude)
    pub y: f64,
    /// Ground elevation
    pub z: f64,
}

impl GroundControlPoint {
    pub fn new(pixel: f64, line: f64, x: f64, y: f64) -> Self {
        Self {
            pixel,
            line,
            x,
            y,
            z: 0.0,
        }
    }
}

/// Georeferencing view of an opened raster dataset
pub trait Raster {
    /// Raster size as (width, height) in pixels
    fn size(&self) -> (usize, usize);

    /// Native coordinate reference of the affine transform, if any
    fn projection(&self) -> Option<Crs>;

    /// Affine transform stored with the dataset, if any
    fn geo_transform(&self) -> Option<GeoTransform>;

    /// Ground-control points stored with the dataset
    fn gcps(&self) -> &[GroundControlPoint];

    /// Coordinate reference of the ground-control points, if any
    fn gcp_projection(&self) -> Option<Crs>;

    /// Dataset-level metadata item from the default domain
    fn metadata_item(&self, key: &str) -> Option<&str>;
}

/// Opens raster datasets by path
///
/// Implementations fail with `Error::ResourceOpenFailure` naming the path.
pub trait RasterOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Raster + Send>>;
}

/// Plain description of a raster's georeferencing
#[derive(Debug, Clone, Default)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub projection: Option<Crs>,
    pub geo_transform: Option<GeoTransform>,
    pub gcps: Vec<GroundControlPoint>,
    pub gcp_projection: Option<Crs>,
    pub metadata: HashMap<String, String>,
}

impl RasterInfo {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: GeoTransform, projection: Option<Crs>) -> Self {
        self.geo_transform = Some(transform);
        self.projection = projection;
        self
    }

    pub fn with_gcps(mut self, gcps: Vec<GroundControlPoint>, projection: Option<Crs>) -> Self {
        self.gcps = gcps;
        self.gcp_projection = projection;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Raster for RasterInfo {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn projection(&self) -> Option<Crs> {
        self.projection.clone()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn gcps(&self) -> &[GroundControlPoint] {
        &self.gcps
    }

    fn gcp_projection(&self) -> Option<Crs> {
        self.gcp_projection.clone()
    }

    fn metadata_item(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}
