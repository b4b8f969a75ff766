//! Raster inspection through the `gdalinfo` command-line tool
//!
//! Runs `gdalinfo -json -proj4 <path>` and decodes the georeferencing facts
//! the geodetic utilities need. Pixel data is never read.

use danesfield_common::geodesy::GeoTransform;
use danesfield_common::{Crs, Error, GroundControlPoint, Raster, RasterInfo, RasterOpener};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

/// `gdalinfo -json` document (subset)
#[derive(Debug, Clone, Deserialize)]
pub struct GdalInfoOutput {
    pub size: [usize; 2],
    #[serde(rename = "coordinateSystem")]
    pub coordinate_system: Option<GdalCoordinateSystem>,
    #[serde(rename = "geoTransform")]
    pub geo_transform: Option<[f64; 6]>,
    pub gcps: Option<GdalGcps>,
    /// Metadata domains; the default domain is keyed by `""`
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Coordinate system block
#[derive(Debug, Clone, Deserialize)]
pub struct GdalCoordinateSystem {
    pub wkt: Option<String>,
    pub proj4: Option<String>,
}

/// Ground-control point block
#[derive(Debug, Clone, Deserialize)]
pub struct GdalGcps {
    #[serde(rename = "coordinateSystem")]
    pub coordinate_system: Option<GdalCoordinateSystem>,
    #[serde(rename = "gcpList", default)]
    pub gcp_list: Vec<GdalGcp>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GdalGcp {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl GdalCoordinateSystem {
    /// PROJ.4 definition when reported, else WGS84 recognized from WKT
    pub fn to_crs(&self) -> Option<Crs> {
        if let Some(proj4) = self.proj4.as_deref().filter(|p| !p.trim().is_empty()) {
            return Some(Crs::from_proj4(proj4));
        }

        let wkt = self.wkt.as_deref()?.trim();
        let geographic = wkt.starts_with("GEOGCS[") || wkt.starts_with("GEOGCRS[");
        if geographic && (wkt.contains("\"WGS 84\"") || wkt.contains("WGS_1984")) {
            return Some(Crs::wgs84());
        }
        if !wkt.is_empty() {
            tracing::debug!(wkt, "Coordinate system not convertible to PROJ.4");
        }
        None
    }
}

impl GdalInfoOutput {
    pub fn into_raster_info(self) -> RasterInfo {
        let [width, height] = self.size;
        let mut info = RasterInfo::new(width, height);

        if let Some(coefficients) = self.geo_transform {
            let projection = self.coordinate_system.as_ref().and_then(|cs| cs.to_crs());
            info = info.with_transform(GeoTransform::new(coefficients), projection);
        } else {
            info.projection = self.coordinate_system.as_ref().and_then(|cs| cs.to_crs());
        }

        if let Some(gcps) = self.gcps {
            let projection = gcps.coordinate_system.as_ref().and_then(|cs| cs.to_crs());
            let points = gcps
                .gcp_list
                .iter()
                .map(|g| GroundControlPoint {
                    pixel: g.pixel,
                    line: g.line,
                    x: g.x,
                    y: g.y,
                    z: g.z,
                })
                .collect();
            info = info.with_gcps(points, projection);
        }

        if let Some(serde_json::Value::Object(items)) = self.metadata.get("") {
            for (key, value) in items {
                if let Some(text) = value.as_str() {
                    info = info.with_metadata(key.clone(), text);
                }
            }
        }

        info
    }
}

/// Decode a `gdalinfo -json` document
pub fn parse_gdalinfo_json(json: &str) -> serde_json::Result<RasterInfo> {
    let output: GdalInfoOutput = serde_json::from_str(json)?;
    Ok(output.into_raster_info())
}

/// Opens rasters by invoking `gdalinfo`
#[derive(Debug, Clone)]
pub struct GdalInfoOpener {
    program: String,
}

impl GdalInfoOpener {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GdalInfoOpener {
    fn default() -> Self {
        Self::new("gdalinfo")
    }
}

impl RasterOpener for GdalInfoOpener {
    fn open(&self, path: &Path) -> danesfield_common::Result<Box<dyn Raster + Send>> {
        tracing::debug!(program = %self.program, path = %path.display(), "Inspecting raster");

        let output = Command::new(&self.program)
            .arg("-json")
            .arg("-proj4")
            .arg(path)
            .output()
            .map_err(|e| Error::open_failure(path, format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::open_failure(path, stderr.trim().to_string()));
        }

        let output: GdalInfoOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::open_failure(path, format!("unreadable {} output: {}", self.program, e)))?;

        Ok(Box::new(output.into_raster_info()))
    }
}
