//! Buildings phase: roof geon extraction, then rendering the extracted
//! building models to an elevation raster and a class raster

use super::StageSequencer;
use crate::error::{PipelineError, Result};
use crate::models::PipelineContext;
use crate::services::GlobalArtifact;
use danesfield_common::offset::read_offset;
use danesfield_common::CoordinateOffset;
use std::collections::BTreeMap;
use std::path::PathBuf;

impl StageSequencer {
    pub(super) async fn phase_buildings(&self, ctx: &mut PipelineContext) -> Result<()> {
        let spec = self.catalog(ctx).roof_geon_extraction();
        self.run_stage(ctx, spec).await?;

        self.read_model_offsets(ctx).await?;

        for render_cls in [false, true] {
            let spec = self.catalog(ctx).buildings_to_dsm(render_cls);
            self.run_stage(ctx, spec).await?;
        }
        Ok(())
    }

    /// Record the header offset of every extracted building model
    ///
    /// Unreadable models are skipped with a warning.
    async fn read_model_offsets(&self, ctx: &mut PipelineContext) -> Result<()> {
        let models: Vec<PathBuf> = ctx
            .working_set
            .artifacts()
            .get_all(&GlobalArtifact::BuildingModels.into())
            .map(<[PathBuf]>::to_vec)
            .unwrap_or_default();
        if models.is_empty() {
            return Ok(());
        }

        let offsets = tokio::task::spawn_blocking(move || {
            let mut offsets = BTreeMap::new();
            for model in models {
                match read_offset(&model) {
                    Ok(offset) => {
                        tracing::debug!(model = %model.display(), x = offset.x, y = offset.y, z = offset.z, "Model offset");
                        offsets.insert(model, offset);
                    }
                    Err(e) => {
                        tracing::warn!(model = %model.display(), "Unable to read model offset: {}", e);
                    }
                }
            }
            offsets
        })
        .await
        .map_err(|e| PipelineError::Io(std::io::Error::other(e)))?;

        if let Some(offset) = common_offset(&offsets) {
            tracing::info!(models = offsets.len(), x = offset.x, y = offset.y, z = offset.z, "Building model offset");
        } else if !offsets.is_empty() {
            tracing::warn!(models = offsets.len(), "Building models carry different offsets");
        }

        ctx.building_offsets = offsets;
        Ok(())
    }
}

/// The offset shared by every model, if they all agree
fn common_offset(offsets: &BTreeMap<PathBuf, CoordinateOffset>) -> Option<CoordinateOffset> {
    let mut values = offsets.values();
    let first = *values.next()?;
    values.all(|offset| *offset == first).then_some(first)
}
