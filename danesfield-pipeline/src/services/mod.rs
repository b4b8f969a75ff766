//! Pipeline services

pub mod artifact_store;
pub mod collection_classifier;
pub mod gdalinfo;
pub mod modality_validator;
pub mod nadir_selector;
pub mod stage_sequencer;
pub mod working_set;

pub use artifact_store::{ArtifactKey, ArtifactStore, CollectionArtifact, GlobalArtifact};
pub use collection_classifier::{CollectionClassifier, FilenameRule, ScanError, WorldViewRule};
pub use gdalinfo::GdalInfoOpener;
pub use modality_validator::{ModalityValidator, SkippedCollection, ValidationReport};
pub use nadir_selector::{NadirSelector, OBLIQUITY_METADATA_KEY};
pub use stage_sequencer::StageSequencer;
pub use working_set::{WorkingSet, WorkingSetManager};
