//! On-disk imagery trees and run configurations

use danesfield_common::config::PipelineConfig;
use danesfield_common::{Crs, GeoTransform, RasterInfo};
use danesfield_pipeline::services::OBLIQUITY_METADATA_KEY;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const AOI_NAME: &str = "D1";

/// File name of one WorldView product, e.g.
/// `01MAY15WV031100015MAY01160000-P1BS-500647760030_01_P001.NTF`
pub fn product_name(collection_id: &str, marker: &str, extension: &str) -> String {
    format!("01MAY15WV0311000{}{}500647760030_01_P001.{}", collection_id, marker, extension)
}

pub fn pan_image(collection_id: &str) -> String {
    product_name(collection_id, "-P1BS-", "NTF")
}

/// Imagery tree inside a scratch directory
pub struct ImageryTree {
    pub root: TempDir,
}

impl ImageryTree {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("imagery")).unwrap();
        Self { root }
    }

    pub fn imagery_dir(&self) -> PathBuf {
        self.root.path().join("imagery")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// Write one product file of a collection
    pub fn add(&self, collection_id: &str, marker: &str, extension: &str) -> &Self {
        let path = self.imagery_dir().join(product_name(collection_id, marker, extension));
        fs::write(path, b"").unwrap();
        self
    }

    /// Image, metadata archive and RPC for pan and msi
    pub fn add_complete(&self, collection_id: &str) -> &Self {
        for marker in ["-P1BS-", "-M1BS-"] {
            for extension in ["NTF", "tar", "rpc"] {
                self.add(collection_id, marker, extension);
            }
        }
        self
    }

    pub fn config_toml(&self) -> String {
        format!(
            r#"
[paths]
imagery_dir = "{imagery}"
p3d_fpath = "{root}/D1.las"

[aoi]
name = "{aoi}"
bounds = "747285 4407065 747908 4407640"

[params]
gsd = 0.5

[semantic]
config_fpath = "/models/semantic.yaml"
model_fpath = "/models/semantic.pth"

[building]
model_fpath_prefix = "/models/building/dayton"

[material]
model_fpath = "/models/material.pth"

[roof]
model_dir = "/models/roof"
model_prefix = "dayton_geon"
"#,
            imagery = self.imagery_dir().display(),
            root = self.root.path().display(),
            aoi = AOI_NAME,
        )
    }

    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::from_toml_str(&self.config_toml()).unwrap()
    }
}

/// NITF stand-in carrying only the obliquity metadata
pub fn nitf_with_obliquity(angle: f64) -> RasterInfo {
    RasterInfo::new(2048, 2048).with_metadata(OBLIQUITY_METADATA_KEY, format!("{:.4}", angle))
}

/// Geographic DSM over Dayton, Ohio (UTM zone 16N)
pub fn dayton_dsm() -> RasterInfo {
    RasterInfo::new(400, 400).with_transform(
        GeoTransform::north_up(-84.12, 39.78, 0.0001, -0.0001),
        Some(Crs::wgs84()),
    )
}

pub fn dsm_file_name() -> String {
    format!("{}_P3D_DSM.tif", AOI_NAME)
}

pub fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
