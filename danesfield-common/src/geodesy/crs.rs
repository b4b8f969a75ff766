//! Coordinate reference definitions and point reprojection

use crate::{Error, Result};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference system as a PROJ.4 definition string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs {
    definition: String,
}

impl Crs {
    pub fn from_proj4(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into().trim().to_string(),
        }
    }

    /// Geographic longitude/latitude on the WGS84 datum
    pub fn wgs84() -> Self {
        Self::from_proj4("+proj=longlat +datum=WGS84 +no_defs")
    }

    pub fn as_str(&self) -> &str {
        &self.definition
    }

    /// True when coordinates are angular (exchanged in degrees)
    pub fn is_geographic(&self) -> bool {
        self.definition.split_whitespace().any(|token| {
            matches!(
                token,
                "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon"
            )
        })
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.definition)
    }
}

/// Reusable point transformation between two coordinate references
pub struct Reprojector {
    source: Proj,
    target: Proj,
    source_is_geographic: bool,
    target_is_geographic: bool,
    identity: bool,
}

impl fmt::Debug for Reprojector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reprojector")
            .field("source_is_geographic", &self.source_is_geographic)
            .field("target_is_geographic", &self.target_is_geographic)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Reprojector {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        let source_proj = Proj::from_proj_string(source.as_str())
            .map_err(|e| Error::Reprojection(format!("invalid source CRS '{}': {:?}", source, e)))?;
        let target_proj = Proj::from_proj_string(target.as_str())
            .map_err(|e| Error::Reprojection(format!("invalid target CRS '{}': {:?}", target, e)))?;

        Ok(Self {
            source: source_proj,
            target: target_proj,
            source_is_geographic: source.is_geographic(),
            target_is_geographic: target.is_geographic(),
            identity: source == target,
        })
    }

    /// Transform one point; geographic coordinates are in degrees
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if self.identity {
            return Ok((x, y));
        }

        let mut point = if self.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.source, &self.target, &mut point)
            .map_err(|e| Error::Reprojection(format!("transform of ({}, {}) failed: {:?}", x, y, e)))?;

        if self.target_is_geographic {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok((point.0, point.1))
        }
    }
}
