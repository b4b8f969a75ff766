//! Pipeline stage sequencer
//!
//! # Stage order
//! DSM → DTM → ORTHORECTIFY → PANSHARPEN → RGB → HEIGHT SEGMENTATION →
//! SEMANTIC SEGMENTATION → BUILDING SEGMENTATION → MATERIALS → ROOF GEONS →
//! BUILDINGS TO DSM (elevation, then classes)
//!
//! Each group lives in a `phase_*` module:
//!
//! - **terrain**: point cloud rendering, terrain fitting, UTM zone of the DSM
//! - **imagery**: per-collection orthorectification, pansharpening, nadir
//!   selection, RGB conversion
//! - **segmentation**: height, semantic, building and material stages
//! - **buildings**: roof geon extraction, model header offsets and
//!   buildings-to-DSM rendering
//!
//! Stages run strictly one after another. Per-collection sub-stages may run up
//! to `parallelism` invocations at once; all of them finish before their
//! outputs are registered and the next stage starts. The first failure aborts
//! the run.

use crate::error::{PipelineError, Result};
use crate::models::{PipelineContext, RunSummary};
use crate::stages::{StageCatalog, StageExecutor, StageSpec};
use danesfield_common::config::PipelineConfig;
use danesfield_common::RasterOpener;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;

mod phase_buildings;
mod phase_imagery;
mod phase_segmentation;
mod phase_terrain;

/// Drives the fixed stage order over one pipeline context
pub struct StageSequencer {
    config: Arc<PipelineConfig>,
    executor: Arc<dyn StageExecutor>,
    raster_opener: Arc<dyn RasterOpener>,
    parallelism: usize,
}

impl StageSequencer {
    pub fn new(
        config: Arc<PipelineConfig>,
        executor: Arc<dyn StageExecutor>,
        raster_opener: Arc<dyn RasterOpener>,
    ) -> Self {
        let parallelism = config.stages.parallelism.max(1);
        Self {
            config,
            executor,
            raster_opener,
            parallelism,
        }
    }

    /// Override the per-collection concurrency limit (minimum 1)
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Run every stage in order
    pub async fn run(&self, ctx: &mut PipelineContext) -> Result<RunSummary> {
        let start_time = Instant::now();
        tracing::info!(
            work_dir = %ctx.work_dir().display(),
            aoi = %ctx.aoi_name,
            collections = ctx.collections.len(),
            parallelism = self.parallelism,
            "Starting pipeline"
        );

        self.phase_terrain(ctx).await?;
        self.phase_imagery(ctx).await?;
        self.phase_segmentation(ctx).await?;
        self.phase_buildings(ctx).await?;

        let summary = RunSummary {
            work_dir: ctx.work_dir().to_path_buf(),
            collections: ctx.collections.keys().cloned().collect(),
            skipped: ctx.skipped.clone(),
            nadir_id: ctx.nadir_id.clone(),
            utm_zone: ctx.utm_zone,
            building_offsets: ctx.building_offsets.clone(),
            artifact_count: ctx.working_set.artifacts().len(),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            work_dir = %summary.work_dir.display(),
            nadir_id = summary.nadir_id.as_deref().unwrap_or("-"),
            artifacts = summary.artifact_count,
            skipped = summary.skipped.len(),
            elapsed_secs = summary.elapsed.as_secs_f64(),
            "Pipeline complete"
        );
        Ok(summary)
    }

    fn catalog<'a>(&'a self, ctx: &'a PipelineContext) -> StageCatalog<'a> {
        StageCatalog::new(&self.config, ctx)
    }

    fn program(&self, spec: &StageSpec) -> String {
        StageCatalog::program(&self.config, spec.kind)
    }

    /// Run one pipeline-wide stage and register its outputs
    async fn run_stage(&self, ctx: &mut PipelineContext, spec: StageSpec) -> Result<()> {
        tracing::info!("---- Running {} ----", spec.display_name());

        let invocation = spec.resolve(&self.program(&spec), ctx.working_set.artifacts())?;
        tracing::debug!(stage = %spec.kind, args = ?invocation.args, "Resolved command");

        self.executor
            .execute(&invocation)
            .await
            .map_err(|source| PipelineError::StageFailure {
                stage: spec.kind,
                scope: spec.scope(),
                source,
            })?;

        spec.register_outputs(ctx.working_set.artifacts_mut())?;
        Ok(())
    }

    /// Run independent per-collection invocations of one sub-stage
    ///
    /// Inputs are resolved up front; outputs are registered only once every
    /// invocation has succeeded.
    async fn run_collection_stage(&self, ctx: &mut PipelineContext, specs: Vec<StageSpec>) -> Result<()> {
        let Some(first) = specs.first() else {
            return Ok(());
        };
        tracing::info!(
            invocations = specs.len(),
            "---- Running {} ----",
            first.kind
        );

        let mut invocations = Vec::with_capacity(specs.len());
        for spec in &specs {
            let invocation = spec.resolve(&self.program(spec), ctx.working_set.artifacts())?;
            tracing::debug!(
                stage = %spec.display_name(),
                collection_id = spec.collection_id.as_deref().unwrap_or("-"),
                args = ?invocation.args,
                "Resolved command"
            );
            invocations.push((spec, invocation));
        }

        let executor = &self.executor;
        stream::iter(invocations)
            .map(|(spec, invocation)| async move {
                tracing::info!(
                    stage = %spec.display_name(),
                    collection_id = spec.collection_id.as_deref().unwrap_or("-"),
                    "Running"
                );
                executor
                    .execute(&invocation)
                    .await
                    .map_err(|source| PipelineError::StageFailure {
                        stage: spec.kind,
                        scope: spec.scope(),
                        source,
                    })
            })
            .buffer_unordered(self.parallelism)
            .try_collect::<Vec<()>>()
            .await?;

        for spec in &specs {
            spec.register_outputs(ctx.working_set.artifacts_mut())?;
        }
        Ok(())
    }

    /// Open a raster off the async runtime and extract a value from it
    async fn inspect_raster<T, F>(&self, path: std::path::PathBuf, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RasterOpener, &std::path::Path) -> Result<T> + Send + 'static,
    {
        let opener = Arc::clone(&self.raster_opener);
        tokio::task::spawn_blocking(move || f(opener.as_ref(), &path))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?
    }
}
