//! Segmentation phase: height/vegetation, semantic, building and material
//! classification

use super::StageSequencer;
use crate::error::Result;
use crate::models::PipelineContext;

impl StageSequencer {
    pub(super) async fn phase_segmentation(&self, ctx: &mut PipelineContext) -> Result<()> {
        let spec = self.catalog(ctx).segment_by_height()?;
        self.run_stage(ctx, spec).await?;

        let spec = self.catalog(ctx).semantic_segment()?;
        self.run_stage(ctx, spec).await?;

        let spec = self.catalog(ctx).building_segmentation()?;
        self.run_stage(ctx, spec).await?;

        let spec = self.catalog(ctx).material_classifier()?;
        self.run_stage(ctx, spec).await?;

        Ok(())
    }
}
