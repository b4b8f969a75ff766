//! Run-scoped pipeline state

use super::CollectionRecord;
use crate::services::{ValidationReport, WorkingSet};
use danesfield_common::config::{AoiBounds, PipelineConfig};
use danesfield_common::{CoordinateOffset, UtmZone};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mutable state of one pipeline run, owned by the sequencer
#[derive(Debug)]
pub struct PipelineContext {
    pub working_set: WorkingSet,
    pub aoi_name: String,
    pub aoi_bounds: AoiBounds,
    pub gsd: f64,
    /// Usable collections keyed by identifier
    pub collections: BTreeMap<String, CollectionRecord>,
    /// Identifiers dropped as incomplete
    pub skipped: Vec<String>,
    /// Most-nadir collection, once selected
    pub nadir_id: Option<String>,
    /// UTM zone of the rendered DSM, when it could be derived
    pub utm_zone: Option<UtmZone>,
    /// Header offset of each extracted building model
    pub building_offsets: BTreeMap<PathBuf, CoordinateOffset>,
}

impl PipelineContext {
    pub fn new(
        working_set: WorkingSet,
        config: &PipelineConfig,
        report: ValidationReport,
    ) -> danesfield_common::Result<Self> {
        Ok(Self {
            working_set,
            aoi_name: config.aoi.name.clone(),
            aoi_bounds: config.aoi_bounds()?,
            gsd: config.params.gsd,
            collections: report.usable,
            skipped: report.skipped.into_iter().map(|s| s.collection_id).collect(),
            nadir_id: None,
            utm_zone: None,
            building_offsets: BTreeMap::new(),
        })
    }

    pub fn work_dir(&self) -> &Path {
        self.working_set.dir()
    }

    /// Record of the selected most-nadir collection
    pub fn nadir(&self) -> Option<&CollectionRecord> {
        self.nadir_id.as_ref().and_then(|id| self.collections.get(id))
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub work_dir: PathBuf,
    pub collections: Vec<String>,
    pub skipped: Vec<String>,
    pub nadir_id: Option<String>,
    pub utm_zone: Option<UtmZone>,
    pub building_offsets: BTreeMap<PathBuf, CoordinateOffset>,
    pub artifact_count: usize,
    pub elapsed: Duration,
}
