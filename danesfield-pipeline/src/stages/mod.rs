//! External processing stages
//!
//! Each stage is an external program. A [`StageSpec`] declares the artifacts
//! a stage consumes and produces; the sequencer resolves it against the
//! artifact store into an [`Invocation`] and hands that to a
//! [`StageExecutor`].

pub mod catalog;
pub mod descriptor;
pub mod executor;

pub use catalog::StageCatalog;
pub use descriptor::{Arg, Invocation, StageSpec};
pub use executor::{CommandExecutor, DryRunExecutor, StageExecutor};

use serde::Serialize;
use std::fmt;

/// Stages of the reconstruction pipeline, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    GenerateDsm,
    FitDtm,
    Orthorectify,
    Pansharpen,
    MsiToRgb,
    SegmentByHeight,
    SemanticSegment,
    BuildingSegmentation,
    MaterialClassifier,
    RoofGeonExtraction,
    BuildingsToDsm,
}

impl StageKind {
    pub const ALL: [StageKind; 11] = [
        StageKind::GenerateDsm,
        StageKind::FitDtm,
        StageKind::Orthorectify,
        StageKind::Pansharpen,
        StageKind::MsiToRgb,
        StageKind::SegmentByHeight,
        StageKind::SemanticSegment,
        StageKind::BuildingSegmentation,
        StageKind::MaterialClassifier,
        StageKind::RoofGeonExtraction,
        StageKind::BuildingsToDsm,
    ];

    /// Name used in logs and as the `[stages.programs]` key
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::GenerateDsm => "generate-dsm",
            StageKind::FitDtm => "fit-dtm",
            StageKind::Orthorectify => "orthorectify",
            StageKind::Pansharpen => "pansharpen",
            StageKind::MsiToRgb => "msi-to-rgb",
            StageKind::SegmentByHeight => "segment-by-height",
            StageKind::SemanticSegment => "semantic-segment",
            StageKind::BuildingSegmentation => "building-segmentation",
            StageKind::MaterialClassifier => "material-classifier",
            StageKind::RoofGeonExtraction => "roof-geon-extraction",
            StageKind::BuildingsToDsm => "buildings-to-dsm",
        }
    }

    /// Executable run when no override is configured
    pub fn default_program(&self) -> &'static str {
        match self {
            StageKind::GenerateDsm => "generate_dsm.py",
            StageKind::FitDtm => "fit_dtm.py",
            StageKind::Orthorectify => "orthorectify.py",
            StageKind::Pansharpen => "gdal_pansharpen.py",
            StageKind::MsiToRgb => "msi_to_rgb.py",
            StageKind::SegmentByHeight => "segment_by_height.py",
            StageKind::SemanticSegment => "kwsemantic_segment.py",
            StageKind::BuildingSegmentation => "building_segmentation.py",
            StageKind::MaterialClassifier => "material_classifier.py",
            StageKind::RoofGeonExtraction => "roof_geon_extraction.py",
            StageKind::BuildingsToDsm => "buildings_to_dsm.py",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
