//! End-to-end run: working set, classification, validation, stages

use crate::error::Result;
use crate::models::{PipelineContext, RunSummary};
use crate::services::{CollectionClassifier, ModalityValidator, StageSequencer, WorkingSetManager};
use crate::stages::StageExecutor;
use danesfield_common::config::PipelineConfig;
use danesfield_common::RasterOpener;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line overrides of a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Highest-priority working directory
    pub work_dir: Option<PathBuf>,
    /// Overrides `stages.parallelism`
    pub parallelism: Option<usize>,
}

/// Run the whole pipeline for one configuration
pub async fn run_pipeline(
    config: PipelineConfig,
    options: RunOptions,
    executor: Arc<dyn StageExecutor>,
    raster_opener: Arc<dyn RasterOpener>,
) -> Result<RunSummary> {
    let manager = WorkingSetManager::new(&config.paths.imagery_dir);
    let working_set = manager.prepare(config.resolve_work_dir(options.work_dir.as_deref()))?;

    let records = CollectionClassifier::new().classify(&config.paths.imagery_dir, config.rpc_dir())?;
    let report = ModalityValidator::new().validate(records)?;

    let mut ctx = PipelineContext::new(working_set, &config, report)?;

    let mut sequencer = StageSequencer::new(Arc::new(config), executor, raster_opener);
    if let Some(parallelism) = options.parallelism {
        sequencer = sequencer.with_parallelism(parallelism);
    }

    sequencer.run(&mut ctx).await
}
