//! Geodetic utilities
//!
//! Pure functions over raster georeferencing: affine transforms (stored or
//! derived from ground-control points), corner bounding boxes with optional
//! reprojection, and UTM zone determination including the Norway and Svalbard
//! exception regions.

mod bbox;
mod crs;
mod transform;
mod utm;

pub use bbox::{bounding_box, BoundingBox};
pub use crs::{Crs, Reprojector};
pub use transform::{geo_transform_from_gcps, GeoTransform};
pub use utm::{utm_zone, utm_zone_for_raster, Hemisphere, UtmZone};
