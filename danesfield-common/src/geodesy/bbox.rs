//! Raster bounding boxes

use super::crs::{Crs, Reprojector};
use super::transform::geo_transform_from_gcps;
use crate::raster::Raster;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Axis-aligned envelope `[minX, minY, maxX, maxY]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Envelope of a set of points (`None` when empty)
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self::new(x, y, x, y),
                Some(b) => Self::new(b.min_x.min(x), b.min_y.min(y), b.max_x.max(x), b.max_y.max(y)),
            })
        })
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Bounding box of a raster, optionally in another coordinate reference
///
/// Uses the stored geotransform, or one fitted to the ground-control points
/// when none is stored. With `target`, the four corners are reprojected and
/// the envelope is taken over the reprojected corners (not a geodesic
/// envelope of the edges).
pub fn bounding_box<R>(raster: &R, target: Option<&Crs>) -> Result<BoundingBox>
where
    R: Raster + ?Sized,
{
    let (transform, projection) = match raster.geo_transform() {
        Some(transform) => (transform, raster.projection()),
        None => {
            let transform = geo_transform_from_gcps(raster.gcps()).ok_or_else(|| {
                Error::GeoreferenceMissing("Unable to extract a geotransform from GCPs".to_string())
            })?;
            (transform, raster.gcp_projection())
        }
    };

    let (width, height) = raster.size();
    let mut corners = transform.corners(width, height);

    if let Some(target) = target {
        let source = projection.ok_or_else(|| {
            Error::Reprojection("raster has no coordinate reference to reproject from".to_string())
        })?;
        let reprojector = Reprojector::new(&source, target)?;
        for corner in corners.iter_mut() {
            *corner = reprojector.transform(corner.0, corner.1)?;
        }
    }

    BoundingBox::from_points(corners)
        .ok_or_else(|| Error::GeoreferenceMissing("raster has no corners".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::GeoTransform;
    use crate::raster::{GroundControlPoint, RasterInfo};

    #[test]
    fn test_identity_like_transform_box() {
        let raster = RasterInfo::new(10, 10).with_transform(GeoTransform::north_up(0.0, 0.0, 1.0, -1.0), None);
        let bbox = bounding_box(&raster, None).unwrap();
        assert_eq!(bbox.to_array(), [0.0, -10.0, 10.0, 0.0]);
    }

    #[test]
    fn test_rotated_transform_takes_corner_envelope() {
        let raster = RasterInfo::new(4, 2).with_transform(GeoTransform::new([0.0, 1.0, 1.0, 0.0, 1.0, -1.0]), None);
        // Corners: (0,0) (4,4) (6,2) (2,-2)
        let bbox = bounding_box(&raster, None).unwrap();
        assert_eq!(bbox.to_array(), [0.0, -2.0, 6.0, 4.0]);
    }

    #[test]
    fn test_falls_back_to_gcps() {
        let gcps = vec![
            GroundControlPoint::new(0.0, 0.0, 100.0, 200.0),
            GroundControlPoint::new(10.0, 0.0, 110.0, 200.0),
            GroundControlPoint::new(0.0, 10.0, 100.0, 190.0),
        ];
        let raster = RasterInfo::new(10, 10).with_gcps(gcps, None);
        let bbox = bounding_box(&raster, None).unwrap();
        let expected = [100.0, 190.0, 110.0, 200.0];
        for (a, b) in bbox.to_array().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_georeference() {
        let raster = RasterInfo::new(10, 10);
        let err = bounding_box(&raster, None).unwrap_err();
        assert!(matches!(err, Error::GeoreferenceMissing(_)));
    }

    #[test]
    fn test_reprojection_requires_source_crs() {
        let raster = RasterInfo::new(10, 10).with_transform(GeoTransform::north_up(0.0, 0.0, 1.0, -1.0), None);
        let err = bounding_box(&raster, Some(&Crs::wgs84())).unwrap_err();
        assert!(matches!(err, Error::Reprojection(_)));
    }

    #[test]
    fn test_reprojected_box_is_geographic() {
        let utm = Crs::from_proj4("+proj=utm +zone=16 +datum=WGS84 +units=m +no_defs");
        let raster = RasterInfo::new(1000, 1000)
            .with_transform(GeoTransform::north_up(747285.0, 4407640.0, 0.5, -0.5), Some(utm));
        let bbox = bounding_box(&raster, Some(&Crs::wgs84())).unwrap();
        assert!(bbox.min_x < bbox.max_x && bbox.min_y < bbox.max_y);
        assert!(bbox.min_x > -85.0 && bbox.max_x < -84.0, "{:?}", bbox);
        assert!(bbox.min_y > 39.0 && bbox.max_y < 40.5, "{:?}", bbox);
    }
}
