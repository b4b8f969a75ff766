//! Registry of artifacts produced by stages

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Pipeline-wide artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlobalArtifact {
    Dsm,
    Dtm,
    Ndvi,
    HeightCls,
    RoadRasterized,
    RoadRasterizedBridge,
    SemanticProbability,
    SemanticCls,
    BuildingCls,
    BuildingModels,
    BuildingsDsm,
    BuildingsCls,
}

impl GlobalArtifact {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalArtifact::Dsm => "dsm",
            GlobalArtifact::Dtm => "dtm",
            GlobalArtifact::Ndvi => "ndvi",
            GlobalArtifact::HeightCls => "height-cls",
            GlobalArtifact::RoadRasterized => "road-rasterized",
            GlobalArtifact::RoadRasterizedBridge => "road-rasterized-bridge",
            GlobalArtifact::SemanticProbability => "semantic-probability",
            GlobalArtifact::SemanticCls => "semantic-cls",
            GlobalArtifact::BuildingCls => "building-cls",
            GlobalArtifact::BuildingModels => "building-models",
            GlobalArtifact::BuildingsDsm => "buildings-dsm",
            GlobalArtifact::BuildingsCls => "buildings-cls",
        }
    }
}

/// Artifacts produced once per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionArtifact {
    PanOrtho,
    MsiOrtho,
    Pansharpened,
    Rgb,
}

impl CollectionArtifact {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionArtifact::PanOrtho => "pan-ortho",
            CollectionArtifact::MsiOrtho => "msi-ortho",
            CollectionArtifact::Pansharpened => "pansharpened",
            CollectionArtifact::Rgb => "rgb",
        }
    }
}

/// Lookup key of a tracked artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKey {
    Global(GlobalArtifact),
    Collection {
        id: String,
        artifact: CollectionArtifact,
    },
}

impl ArtifactKey {
    pub fn collection(id: impl Into<String>, artifact: CollectionArtifact) -> Self {
        ArtifactKey::Collection {
            id: id.into(),
            artifact,
        }
    }
}

impl From<GlobalArtifact> for ArtifactKey {
    fn from(artifact: GlobalArtifact) -> Self {
        ArtifactKey::Global(artifact)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKey::Global(artifact) => f.write_str(artifact.as_str()),
            ArtifactKey::Collection { id, artifact } => write!(f, "{}/{}", id, artifact.as_str()),
        }
    }
}

/// Paths registered per artifact key
///
/// A key holds one path for single-file artifacts or a list for discovered
/// sets (building models). A registered empty list is distinct from an
/// unregistered key.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    entries: BTreeMap<ArtifactKey, Vec<PathBuf>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single path, replacing any previous registration
    pub fn put(&mut self, key: impl Into<ArtifactKey>, path: impl Into<PathBuf>) {
        self.entries.insert(key.into(), vec![path.into()]);
    }

    /// Register a list of paths, replacing any previous registration
    pub fn put_many(&mut self, key: impl Into<ArtifactKey>, paths: Vec<PathBuf>) {
        self.entries.insert(key.into(), paths);
    }

    /// First registered path
    pub fn get(&self, key: &ArtifactKey) -> Option<&Path> {
        self.entries
            .get(key)
            .and_then(|paths| paths.first())
            .map(PathBuf::as_path)
    }

    /// All registered paths, `None` when the key was never registered
    pub fn get_all(&self, key: &ArtifactKey) -> Option<&[PathBuf]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &ArtifactKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered paths across all keys
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArtifactKey, &[PathBuf])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }
}
