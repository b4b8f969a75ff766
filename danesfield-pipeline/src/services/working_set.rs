//! Working directory allocation and artifact tracking
//!
//! Every file the pipeline writes lands in the working directory. It may not
//! sit inside the imagery tree, otherwise a later run would classify the
//! previous run's outputs as inputs.

use super::artifact_store::ArtifactStore;
use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};

/// Working directory name used when none is configured
pub fn default_work_dir_name(now: DateTime<Utc>) -> String {
    format!("danesfield-{}", now.timestamp())
}

/// Working directory of a run plus the artifacts written into it
#[derive(Debug)]
pub struct WorkingSet {
    dir: PathBuf,
    artifacts: ArtifactStore,
}

impl WorkingSet {
    /// Wrap an existing directory without conflict checks
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            artifacts: ArtifactStore::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a file inside the working directory
    pub fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn artifacts_mut(&mut self) -> &mut ArtifactStore {
        &mut self.artifacts
    }
}

/// Validates and creates working directories for one imagery tree
#[derive(Debug, Clone)]
pub struct WorkingSetManager {
    imagery_dir: PathBuf,
}

impl WorkingSetManager {
    pub fn new(imagery_dir: impl Into<PathBuf>) -> Self {
        Self {
            imagery_dir: imagery_dir.into(),
        }
    }

    /// Resolve, check and create the working directory
    ///
    /// `None` synthesizes `danesfield-<unix seconds>` in the current directory.
    pub fn prepare(&self, requested: Option<PathBuf>) -> Result<WorkingSet> {
        let requested =
            requested.unwrap_or_else(|| PathBuf::from(default_work_dir_name(Utc::now())));

        let work_dir = self.check_conflict(&requested)?;

        if !work_dir.is_dir() {
            std::fs::create_dir_all(&work_dir)?;
            tracing::info!(work_dir = %work_dir.display(), "Created working directory");
        } else {
            tracing::info!(work_dir = %work_dir.display(), "Using existing working directory");
        }

        Ok(WorkingSet::new(work_dir))
    }

    /// Fail when `work_dir` equals or lies below the imagery directory
    ///
    /// Both paths are compared component-wise after resolving symbolic links
    /// on their existing prefixes. Returns the resolved working directory.
    pub fn check_conflict(&self, work_dir: &Path) -> Result<PathBuf> {
        let resolved_work = resolve_path(work_dir)?;
        let resolved_imagery = resolve_path(&self.imagery_dir)?;

        if resolved_work.starts_with(&resolved_imagery) {
            return Err(PipelineError::WorkingDirConflict {
                work_dir: work_dir.to_path_buf(),
                imagery_dir: self.imagery_dir.clone(),
            });
        }

        Ok(resolved_work)
    }
}

/// Absolute path with links resolved on the longest existing prefix
fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(mut resolved) => {
                for component in tail.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        tail.push(name.to_os_string());
                        existing = parent;
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}
