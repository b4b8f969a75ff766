//! Per-collection imagery records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Sensor modality of an image within a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Panchromatic
    Pan,
    /// Multispectral
    Msi,
    /// Short-wave infrared
    Swir,
}

impl Modality {
    pub const ALL: [Modality; 3] = [Modality::Pan, Modality::Msi, Modality::Swir];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Pan => "pan",
            Modality::Msi => "msi",
            Modality::Swir => "swir",
        }
    }

    /// Filename substring identifying the modality
    pub fn marker(&self) -> &'static str {
        match self {
            Modality::Pan => "-P1BS-",
            Modality::Msi => "-M1BS-",
            Modality::Swir => "-A1BS-",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a raw input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Primary imagery container (`.ntf`)
    Image,
    /// Metadata archive (`.tar`)
    Info,
    /// Rational polynomial camera file (`.rpc`)
    Rpc,
}

impl FileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Image => "ntf",
            FileKind::Info => "tar",
            FileKind::Rpc => "rpc",
        }
    }

    /// Kind from a path's extension, case-insensitive
    pub fn from_path(path: &Path) -> Option<FileKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        [FileKind::Image, FileKind::Info, FileKind::Rpc]
            .into_iter()
            .find(|kind| kind.extension() == ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Info => "info",
            FileKind::Rpc => "rpc",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files of one modality within a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityFiles {
    pub image: Option<PathBuf>,
    pub info: Option<PathBuf>,
    pub rpc: Option<PathBuf>,
    /// Orthorectified image, once produced
    pub ortho: Option<PathBuf>,
}

impl ModalityFiles {
    pub fn get(&self, kind: FileKind) -> Option<&Path> {
        match kind {
            FileKind::Image => self.image.as_deref(),
            FileKind::Info => self.info.as_deref(),
            FileKind::Rpc => self.rpc.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, kind: FileKind) -> &mut Option<PathBuf> {
        match kind {
            FileKind::Image => &mut self.image,
            FileKind::Info => &mut self.info,
            FileKind::Rpc => &mut self.rpc,
        }
    }

    /// Required kinds that are absent
    pub fn missing(&self, require_rpc: bool) -> Vec<FileKind> {
        let mut required = vec![FileKind::Image, FileKind::Info];
        if require_rpc {
            required.push(FileKind::Rpc);
        }
        required
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }

    /// `image` and `info` present, plus `rpc` when required
    pub fn is_complete(&self, require_rpc: bool) -> bool {
        self.missing(require_rpc).is_empty()
    }
}

/// One image collection and the artifacts derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub id: String,
    pub pan: ModalityFiles,
    pub msi: ModalityFiles,
    pub swir: ModalityFiles,
    pub pansharpened_path: Option<PathBuf>,
    pub rgb_path: Option<PathBuf>,
    pub obliquity_angle: Option<f64>,
}

impl CollectionRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pan: ModalityFiles::default(),
            msi: ModalityFiles::default(),
            swir: ModalityFiles::default(),
            pansharpened_path: None,
            rgb_path: None,
            obliquity_angle: None,
        }
    }

    pub fn modality(&self, modality: Modality) -> &ModalityFiles {
        match modality {
            Modality::Pan => &self.pan,
            Modality::Msi => &self.msi,
            Modality::Swir => &self.swir,
        }
    }

    pub fn modality_mut(&mut self, modality: Modality) -> &mut ModalityFiles {
        match modality {
            Modality::Pan => &mut self.pan,
            Modality::Msi => &mut self.msi,
            Modality::Swir => &mut self.swir,
        }
    }
}
