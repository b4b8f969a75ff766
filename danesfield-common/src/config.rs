//! Run configuration loading and working directory resolution
//!
//! A run is described by a TOML file with `paths`, `aoi`, `params` and one
//! section per model-backed stage:
//!
//! ```toml
//! [paths]
//! imagery_dir = "/data/D1/imagery"
//! rpc_dir = "/data/D1/rpc"
//! p3d_fpath = "/data/D1/D1.las"
//!
//! [aoi]
//! name = "D1"
//! bounds = "747285 4407065 747908 4407640"
//!
//! [params]
//! gsd = 0.25
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding `paths.work_dir`
pub const WORK_DIR_ENV: &str = "DANESFIELD_WORK_DIR";

/// Default ground sample distance in meters
pub const DEFAULT_GSD: f64 = 0.25;

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub aoi: AoiConfig,
    #[serde(default)]
    pub params: ParamsConfig,
    pub semantic: SemanticConfig,
    pub building: BuildingConfig,
    pub material: MaterialConfig,
    pub roof: RoofConfig,
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[paths]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    pub imagery_dir: PathBuf,
    /// Camera calibration files; defaults to `imagery_dir`
    #[serde(default)]
    pub rpc_dir: Option<PathBuf>,
    /// Point cloud rendered into the DSM
    pub p3d_fpath: PathBuf,
    #[serde(default)]
    pub osm_roads_shapefiles_dir: Option<PathBuf>,
    #[serde(default)]
    pub osm_roads_shapefiles_prefix: Option<String>,
}

/// `[aoi]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AoiConfig {
    pub name: String,
    /// Four whitespace-separated integers: `minX minY maxX maxY`
    pub bounds: String,
}

/// Integer AOI bounds in the projected reference of the point cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AoiBounds {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl AoiBounds {
    pub fn to_array(&self) -> [i64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

impl AoiConfig {
    /// Parse `bounds` into four integers
    pub fn parse_bounds(&self) -> Result<AoiBounds> {
        let values = self
            .bounds
            .split_whitespace()
            .map(|v| {
                v.parse::<i64>().map_err(|_| {
                    Error::Config(format!("aoi.bounds: '{}' is not an integer", v))
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        match values.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(AoiBounds {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
            }),
            _ => Err(Error::Config(format!(
                "aoi.bounds: expected 4 integers, found {}",
                values.len()
            ))),
        }
    }
}

/// `[params]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsConfig {
    #[serde(default = "default_gsd")]
    pub gsd: f64,
}

fn default_gsd() -> f64 {
    DEFAULT_GSD
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self { gsd: DEFAULT_GSD }
    }
}

/// `[semantic]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    pub config_fpath: PathBuf,
    pub model_fpath: PathBuf,
}

/// `[building]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingConfig {
    pub model_fpath_prefix: PathBuf,
}

/// `[material]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialConfig {
    pub model_fpath: PathBuf,
    #[serde(default)]
    pub batch_size: Option<u32>,
    #[serde(default)]
    pub cuda: bool,
}

/// `[roof]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoofConfig {
    pub model_dir: PathBuf,
    pub model_prefix: String,
}

/// `[stages]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesConfig {
    /// Concurrent per-collection invocations (1 = sequential)
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Stage name → executable override
    #[serde(default)]
    pub programs: BTreeMap<String, String>,
}

fn default_parallelism() -> usize {
    1
}

impl Default for StagesConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            programs: BTreeMap::new(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: Option<String>,
}

impl PipelineConfig {
    /// Load and validate a run configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), strip_prefix(e))))
    }

    /// Parse and validate TOML content
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.aoi.name.trim().is_empty() {
            return Err(Error::Config("aoi.name must not be empty".to_string()));
        }
        self.aoi.parse_bounds()?;
        if !(self.params.gsd.is_finite() && self.params.gsd > 0.0) {
            return Err(Error::Config(format!(
                "params.gsd must be positive, got {}",
                self.params.gsd
            )));
        }
        if self.stages.parallelism == 0 {
            return Err(Error::Config("stages.parallelism must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Parsed AOI bounds (validated at load time)
    pub fn aoi_bounds(&self) -> Result<AoiBounds> {
        self.aoi.parse_bounds()
    }

    /// Directory holding camera calibration files
    pub fn rpc_dir(&self) -> &Path {
        self.paths
            .rpc_dir
            .as_deref()
            .unwrap_or(self.paths.imagery_dir.as_path())
    }

    /// OSM road shapefile set, only when both directory and prefix are given
    pub fn osm_roads(&self) -> Option<(&Path, &str)> {
        match (
            self.paths.osm_roads_shapefiles_dir.as_deref(),
            self.paths.osm_roads_shapefiles_prefix.as_deref(),
        ) {
            (Some(dir), Some(prefix)) if !prefix.is_empty() => Some((dir, prefix)),
            _ => None,
        }
    }

    /// Working directory resolution following priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable
    /// 3. TOML config file
    ///
    /// `None` means the caller synthesizes a fresh directory.
    pub fn resolve_work_dir(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(WORK_DIR_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        self.paths.work_dir.clone()
    }
}

fn strip_prefix(e: Error) -> String {
    match e {
        Error::Config(msg) => msg,
        other => other.to_string(),
    }
}
