//! Data models for danesfield-pipeline

pub mod collection;
pub mod context;

pub use collection::{CollectionRecord, FileKind, Modality, ModalityFiles};
pub use context::{PipelineContext, RunSummary};
