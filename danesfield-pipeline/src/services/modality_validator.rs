//! Completeness gate for classified collections
//!
//! Panchromatic and multispectral images must each carry an image, a
//! metadata archive and a camera file. Short-wave infrared is not checked.
//! Incomplete collections are dropped with a warning; only an empty result
//! is an error.

use crate::error::{PipelineError, Result};
use crate::models::{CollectionRecord, FileKind, Modality};
use std::collections::BTreeMap;

/// A collection dropped by validation
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCollection {
    pub collection_id: String,
    pub modality: Modality,
    pub missing: Vec<FileKind>,
}

impl SkippedCollection {
    pub fn to_error(&self) -> PipelineError {
        PipelineError::IncompleteModality {
            collection_id: self.collection_id.clone(),
            modality: self.modality,
            missing: self
                .missing
                .iter()
                .map(FileKind::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Validation outcome
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub usable: BTreeMap<String, CollectionRecord>,
    pub skipped: Vec<SkippedCollection>,
}

/// Requirement applied to one modality
#[derive(Debug, Clone, Copy)]
struct Requirement {
    modality: Modality,
    require_rpc: bool,
}

/// Filters collections down to those complete enough to process
#[derive(Debug, Clone)]
pub struct ModalityValidator {
    requirements: Vec<Requirement>,
}

impl ModalityValidator {
    /// Pan and MSI with camera files required
    pub fn new() -> Self {
        Self {
            requirements: vec![
                Requirement {
                    modality: Modality::Pan,
                    require_rpc: true,
                },
                Requirement {
                    modality: Modality::Msi,
                    require_rpc: true,
                },
            ],
        }
    }

    /// First failing requirement of a record
    pub fn check(&self, record: &CollectionRecord) -> std::result::Result<(), SkippedCollection> {
        for req in &self.requirements {
            let missing = record.modality(req.modality).missing(req.require_rpc);
            if !missing.is_empty() {
                return Err(SkippedCollection {
                    collection_id: record.id.clone(),
                    modality: req.modality,
                    missing,
                });
            }
        }
        Ok(())
    }

    /// Split records into usable and skipped; fails when none are usable
    pub fn validate(&self, records: BTreeMap<String, CollectionRecord>) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();

        for (id, record) in records {
            match self.check(&record) {
                Ok(()) => {
                    report.usable.insert(id, record);
                }
                Err(skipped) => {
                    tracing::warn!(
                        collection_id = %skipped.collection_id,
                        "{}, skipping!",
                        skipped.to_error()
                    );
                    report.skipped.push(skipped);
                }
            }
        }

        if report.usable.is_empty() {
            return Err(PipelineError::NoUsableCollections {
                skipped: report.skipped.len(),
            });
        }

        tracing::info!(
            usable = report.usable.len(),
            skipped = report.skipped.len(),
            "Validated collections"
        );
        Ok(report)
    }
}

impl Default for ModalityValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn complete(id: &str) -> CollectionRecord {
        let mut record = CollectionRecord::new(id);
        for modality in [Modality::Pan, Modality::Msi] {
            let files = record.modality_mut(modality);
            files.image = Some(PathBuf::from(format!("{}-{}.ntf", id, modality)));
            files.info = Some(PathBuf::from(format!("{}-{}.tar", id, modality)));
            files.rpc = Some(PathBuf::from(format!("{}-{}.rpc", id, modality)));
        }
        record
    }

    fn records(list: Vec<CollectionRecord>) -> BTreeMap<String, CollectionRecord> {
        list.into_iter().map(|r| (r.id.clone(), r)).collect()
    }

    #[test]
    fn test_complete_collection_passes() {
        assert!(ModalityValidator::new().check(&complete("A")).is_ok());
    }

    #[test]
    fn test_each_missing_file_excludes() {
        let validator = ModalityValidator::new();
        for modality in [Modality::Pan, Modality::Msi] {
            for kind in [FileKind::Image, FileKind::Info, FileKind::Rpc] {
                let mut record = complete("A");
                *record.modality_mut(modality).slot_mut(kind) = None;
                let skipped = validator.check(&record).unwrap_err();
                assert_eq!(skipped.modality, modality);
                assert_eq!(skipped.missing, vec![kind]);
            }
        }
    }

    #[test]
    fn test_swir_never_excludes() {
        let mut record = complete("A");
        record.swir.image = Some(PathBuf::from("A-swir.ntf"));
        assert!(ModalityValidator::new().check(&record).is_ok());
    }

    #[test]
    fn test_validate_drops_incomplete_and_keeps_rest() {
        let mut broken = complete("B");
        broken.msi.info = None;

        let report = ModalityValidator::new()
            .validate(records(vec![complete("A"), broken, complete("C")]))
            .unwrap();

        assert_eq!(report.usable.keys().collect::<Vec<_>>(), vec!["A", "C"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].collection_id, "B");
        let message = report.skipped[0].to_error().to_string();
        assert!(message.contains("msi is missing info"), "{}", message);
    }

    #[test]
    fn test_validate_fails_when_nothing_usable() {
        let mut broken = complete("B");
        broken.pan.rpc = None;

        let err = ModalityValidator::new()
            .validate(records(vec![broken]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoUsableCollections { skipped: 1 }));

        let err = ModalityValidator::new().validate(BTreeMap::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoUsableCollections { skipped: 0 }));
    }
}
