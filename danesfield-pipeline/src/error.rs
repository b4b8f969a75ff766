//! Error types for danesfield-pipeline

use crate::models::Modality;
use crate::services::ScanError;
use crate::stages::StageKind;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline run error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Working directory resolves to the imagery directory or below it
    #[error(
        "The working directory ({}) is a subdirectory of the imagery directory ({})",
        .work_dir.display(),
        .imagery_dir.display()
    )]
    WorkingDirConflict {
        work_dir: PathBuf,
        imagery_dir: PathBuf,
    },

    /// A collection lacks files required for one modality
    #[error("Don't have complete modality for collection ID '{collection_id}': {modality} is missing {missing}")]
    IncompleteModality {
        collection_id: String,
        modality: Modality,
        missing: String,
    },

    /// Validation left no collection to process
    #[error("No usable collections ({skipped} skipped as incomplete)")]
    NoUsableCollections { skipped: usize },

    /// Selection was asked to choose from an empty set
    #[error("No collections available")]
    NoCollectionsAvailable,

    /// A stage input has not been produced by an earlier stage
    #[error("Stage {stage} requires {artifact}, which no earlier stage produced")]
    MissingArtifact { stage: StageKind, artifact: String },

    /// An external stage collaborator reported failure
    #[error("Stage {stage} failed ({scope}): {source}")]
    StageFailure {
        stage: StageKind,
        scope: String,
        source: StageError,
    },

    /// Required dataset metadata item is absent or unparseable
    #[error("Metadata item {key} missing or unparseable in {}", .path.display())]
    MissingMetadata { path: PathBuf, key: String },

    /// Imagery traversal error
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Geodetic or configuration error
    #[error("Common error: {0}")]
    Common(#[from] danesfield_common::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one external stage invocation
#[derive(Debug, Error)]
pub enum StageError {
    /// Program could not be started
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Program exited with a non-zero status
    #[error("{program} exited with status {code}")]
    Exited { program: String, code: i32 },

    /// Program was terminated by a signal
    #[error("{program} was terminated by a signal")]
    Signaled { program: String },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
