//! Imagery discovery and grouping into collections
//!
//! Identifiers are harvested from imagery file names; metadata archives and
//! camera files then attach to the identifiers that were found. Traversal is
//! sorted so the result does not depend on directory listing order.

use crate::models::{CollectionRecord, FileKind, Modality};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

static COLLECTION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{2}[A-Z]{3}[0-9]{8}-").expect("Invalid collection ID regex"));

/// Imagery traversal errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Naming convention that ties files to collections
pub trait FilenameRule: Send + Sync {
    /// Collection identifier embedded in a file name
    fn collection_id(&self, file_name: &str) -> Option<String>;

    /// Modality encoded in a file name
    fn modality(&self, file_name: &str) -> Option<Modality>;

    /// Role of a file, by extension
    fn file_kind(&self, path: &Path) -> Option<FileKind> {
        FileKind::from_path(path)
    }
}

/// WorldView product naming: `01MAY15WV031100015MAY01160000-P1BS-...` (identifier `15MAY01160000`)
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldViewRule;

impl FilenameRule for WorldViewRule {
    fn collection_id(&self, file_name: &str) -> Option<String> {
        COLLECTION_ID_PATTERN
            .find(file_name)
            .map(|m| m.as_str().trim_end_matches('-').to_string())
    }

    fn modality(&self, file_name: &str) -> Option<Modality> {
        Modality::ALL
            .into_iter()
            .find(|modality| file_name.contains(modality.marker()))
    }
}

/// Groups raw imagery files by collection and modality
pub struct CollectionClassifier<R: FilenameRule = WorldViewRule> {
    rule: R,
}

impl CollectionClassifier<WorldViewRule> {
    pub fn new() -> Self {
        Self {
            rule: WorldViewRule,
        }
    }
}

impl Default for CollectionClassifier<WorldViewRule> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: FilenameRule> CollectionClassifier<R> {
    pub fn with_rule(rule: R) -> Self {
        Self { rule }
    }

    /// Classify images and metadata under `imagery_dir` and camera files
    /// under `rpc_dir`
    pub fn classify(
        &self,
        imagery_dir: &Path,
        rpc_dir: &Path,
    ) -> Result<BTreeMap<String, CollectionRecord>, ScanError> {
        let imagery_files = self.scan(imagery_dir)?;
        let rpc_files = if rpc_dir == imagery_dir {
            imagery_files.clone()
        } else {
            self.scan(rpc_dir)?
        };

        let by_kind = |files: &[PathBuf], kind: FileKind| -> Vec<PathBuf> {
            files
                .iter()
                .filter(|path| self.rule.file_kind(path) == Some(kind))
                .cloned()
                .collect()
        };
        let images = by_kind(&imagery_files, FileKind::Image);
        let infos = by_kind(&imagery_files, FileKind::Info);
        let rpcs = by_kind(&rpc_files, FileKind::Rpc);

        let mut records = BTreeMap::new();
        for image in &images {
            if let Some(id) = file_name(image).and_then(|name| self.rule.collection_id(name)) {
                records
                    .entry(id.clone())
                    .or_insert_with(|| CollectionRecord::new(id));
            }
        }

        self.attach(&mut records, &images, FileKind::Image);
        self.attach(&mut records, &rpcs, FileKind::Rpc);
        self.attach(&mut records, &infos, FileKind::Info);

        tracing::info!(
            collections = records.len(),
            images = images.len(),
            infos = infos.len(),
            rpcs = rpcs.len(),
            "Classified imagery"
        );

        Ok(records)
    }

    fn attach(&self, records: &mut BTreeMap<String, CollectionRecord>, files: &[PathBuf], kind: FileKind) {
        for path in files {
            let Some(name) = file_name(path) else {
                continue;
            };
            let Some(id) = self.rule.collection_id(name) else {
                continue;
            };
            let Some(record) = records.get_mut(&id) else {
                tracing::debug!(path = %path.display(), "No collection for file");
                continue;
            };
            let Some(modality) = self.rule.modality(name) else {
                tracing::debug!(path = %path.display(), "No modality marker in file name");
                continue;
            };

            let slot = record.modality_mut(modality).slot_mut(kind);
            match slot.as_ref() {
                Some(existing) => {
                    tracing::warn!(
                        collection_id = %id,
                        modality = %modality,
                        kind = %kind,
                        kept = %existing.display(),
                        ignored = %path.display(),
                        "Duplicate file for collection slot"
                    );
                }
                None => *slot = Some(path.clone()),
            }
        }
    }

    /// Sorted list of regular files below `root`
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            match entry {
                Ok(entry) => {
                    if entry.path().is_file() {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(root = %root.display(), files = files.len(), "Scanned directory");
        Ok(files)
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}
