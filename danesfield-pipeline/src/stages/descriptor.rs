//! Declarative stage descriptors

use super::StageKind;
use crate::error::{PipelineError, Result};
use crate::services::{ArtifactKey, ArtifactStore};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One element of a stage command line
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Literal text (flags, parameter values)
    Lit(String),
    /// Path taken from configuration or classification
    Path(PathBuf),
    /// Artifact produced by an earlier stage
    Input(ArtifactKey),
    /// Every path registered under an artifact key
    Inputs(ArtifactKey),
    /// File this stage writes, registered under the key on success
    Output(ArtifactKey, PathBuf),
}

/// Files a stage leaves in a directory, collected after it completes
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub key: ArtifactKey,
    pub dir: PathBuf,
    pub extension: String,
}

/// Declaration of one stage invocation
#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub kind: StageKind,
    /// Collection the invocation belongs to, if any
    pub collection_id: Option<String>,
    /// Shown in logs in place of the stage name
    pub label: Option<String>,
    pub args: Vec<Arg>,
    /// Outputs written without appearing on the command line
    pub implicit_outputs: Vec<(ArtifactKey, PathBuf)>,
    pub discoveries: Vec<Discovery>,
}

impl StageSpec {
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            collection_id: None,
            label: None,
            args: Vec::new(),
            implicit_outputs: Vec::new(),
            discoveries: Vec::new(),
        }
    }

    pub fn for_collection(mut self, id: impl Into<String>) -> Self {
        self.collection_id = Some(id.into());
        self
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn lit(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg::Lit(value.into()));
        self
    }

    /// Flag followed by its value
    pub fn param(self, flag: &str, value: impl ToString) -> Self {
        self.lit(flag).lit(value.to_string())
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.args.push(Arg::Path(path.into()));
        self
    }

    pub fn input(mut self, key: impl Into<ArtifactKey>) -> Self {
        self.args.push(Arg::Input(key.into()));
        self
    }

    pub fn inputs(mut self, key: impl Into<ArtifactKey>) -> Self {
        self.args.push(Arg::Inputs(key.into()));
        self
    }

    pub fn output(mut self, key: impl Into<ArtifactKey>, path: impl Into<PathBuf>) -> Self {
        self.args.push(Arg::Output(key.into(), path.into()));
        self
    }

    pub fn produces(mut self, key: impl Into<ArtifactKey>, path: impl Into<PathBuf>) -> Self {
        self.implicit_outputs.push((key.into(), path.into()));
        self
    }

    /// Register every `*.<extension>` file of `dir` under `key` afterwards
    pub fn discovers(mut self, key: impl Into<ArtifactKey>, dir: impl Into<PathBuf>, extension: &str) -> Self {
        self.discoveries.push(Discovery {
            key: key.into(),
            dir: dir.into(),
            extension: extension.to_string(),
        });
        self
    }

    /// Name shown in log lines
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.kind.name())
    }

    /// Collection ID or `pipeline` for global stages
    pub fn scope(&self) -> String {
        self.collection_id
            .clone()
            .unwrap_or_else(|| "pipeline".to_string())
    }

    /// Artifact keys this stage reads
    pub fn required_inputs(&self) -> Vec<&ArtifactKey> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                Arg::Input(key) | Arg::Inputs(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    /// Declared output artifacts with their paths
    pub fn outputs(&self) -> Vec<(&ArtifactKey, &Path)> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                Arg::Output(key, path) => Some((key, path.as_path())),
                _ => None,
            })
            .chain(self.implicit_outputs.iter().map(|(k, p)| (k, p.as_path())))
            .collect()
    }

    /// Resolve inputs into a concrete command line
    pub fn resolve(&self, program: &str, store: &ArtifactStore) -> Result<Invocation> {
        let mut args = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                Arg::Lit(value) => args.push(OsString::from(value)),
                Arg::Path(path) | Arg::Output(_, path) => args.push(path.clone().into_os_string()),
                Arg::Input(key) => {
                    let path = store.get(key).ok_or_else(|| self.missing(key))?;
                    args.push(path.as_os_str().to_os_string());
                }
                Arg::Inputs(key) => {
                    let paths = store.get_all(key).ok_or_else(|| self.missing(key))?;
                    args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
                }
            }
        }

        Ok(Invocation {
            stage: self.kind,
            collection_id: self.collection_id.clone(),
            program: program.to_string(),
            args,
        })
    }

    /// Register declared and discovered outputs after a successful run
    pub fn register_outputs(&self, store: &mut ArtifactStore) -> std::io::Result<()> {
        for (key, path) in self.outputs() {
            store.put(key.clone(), path);
        }

        for discovery in &self.discoveries {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(&discovery.dir)? {
                let path = entry?.path();
                let matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case(&discovery.extension))
                    .unwrap_or(false);
                if matches && path.is_file() {
                    found.push(path);
                }
            }
            found.sort();

            if found.is_empty() {
                tracing::warn!(
                    stage = %self.kind,
                    dir = %discovery.dir.display(),
                    "No *.{} files produced",
                    discovery.extension
                );
            } else {
                tracing::info!(stage = %self.kind, count = found.len(), artifact = %discovery.key, "Discovered outputs");
            }
            store.put_many(discovery.key.clone(), found);
        }

        Ok(())
    }

    fn missing(&self, key: &ArtifactKey) -> PipelineError {
        PipelineError::MissingArtifact {
            stage: self.kind,
            artifact: key.to_string(),
        }
    }
}

/// Fully resolved command line of one stage run
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub stage: StageKind,
    pub collection_id: Option<String>,
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Arguments as text, for logs and assertions
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}
