//! Imagery phase: per-collection orthorectification, pansharpening and RGB
//! conversion, plus most-nadir selection

use super::StageSequencer;
use crate::error::Result;
use crate::models::{Modality, PipelineContext};
use crate::services::nadir_selector::read_obliquity_angle;
use crate::services::{ArtifactKey, CollectionArtifact, NadirSelector};
use crate::stages::StageSpec;

impl StageSequencer {
    pub(super) async fn phase_imagery(&self, ctx: &mut PipelineContext) -> Result<()> {
        self.orthorectify_all(ctx).await?;
        self.pansharpen_all(ctx).await?;
        self.select_nadir(ctx).await?;
        self.convert_rgb_all(ctx).await?;
        Ok(())
    }

    async fn orthorectify_all(&self, ctx: &mut PipelineContext) -> Result<()> {
        let specs = {
            let catalog = self.catalog(ctx);
            let mut specs = Vec::with_capacity(ctx.collections.len() * 2);
            for record in ctx.collections.values() {
                for modality in [Modality::Pan, Modality::Msi] {
                    specs.push(catalog.orthorectify(record, modality)?);
                }
            }
            specs
        };
        self.run_collection_stage(ctx, specs).await?;

        for record in ctx.collections.values_mut() {
            for (modality, artifact) in [
                (Modality::Pan, CollectionArtifact::PanOrtho),
                (Modality::Msi, CollectionArtifact::MsiOrtho),
            ] {
                let key = ArtifactKey::collection(&record.id, artifact);
                record.modality_mut(modality).ortho =
                    ctx.working_set.artifacts().get(&key).map(|p| p.to_path_buf());
            }
        }
        Ok(())
    }

    async fn pansharpen_all(&self, ctx: &mut PipelineContext) -> Result<()> {
        let specs: Vec<StageSpec> = {
            let catalog = self.catalog(ctx);
            ctx.collections.keys().map(|id| catalog.pansharpen(id)).collect()
        };
        self.run_collection_stage(ctx, specs).await?;

        for record in ctx.collections.values_mut() {
            let key = ArtifactKey::collection(&record.id, CollectionArtifact::Pansharpened);
            record.pansharpened_path = ctx.working_set.artifacts().get(&key).map(|p| p.to_path_buf());
        }
        Ok(())
    }

    /// Read each collection's obliquity angle and pick the most nadir one
    async fn select_nadir(&self, ctx: &mut PipelineContext) -> Result<()> {
        let ids: Vec<String> = ctx.collections.keys().cloned().collect();
        for id in ids {
            let Some(image) = ctx
                .collections
                .get(&id)
                .and_then(|record| record.pan.image.clone())
            else {
                continue;
            };

            let angle = self
                .inspect_raster(image, |opener, path| read_obliquity_angle(opener, path))
                .await?;
            tracing::debug!(collection_id = %id, obliquity_angle = angle, "Obliquity angle");

            if let Some(record) = ctx.collections.get_mut(&id) {
                record.obliquity_angle = Some(angle);
            }
        }

        let nadir = NadirSelector::new()
            .select_collection(&ctx.collections)?
            .to_string();
        tracing::info!(
            collection_id = %nadir,
            obliquity_angle = ctx.collections[&nadir].obliquity_angle.unwrap_or(f64::NAN),
            "Selected most nadir collection"
        );
        ctx.nadir_id = Some(nadir);
        Ok(())
    }

    async fn convert_rgb_all(&self, ctx: &mut PipelineContext) -> Result<()> {
        let specs: Vec<StageSpec> = {
            let catalog = self.catalog(ctx);
            ctx.collections.keys().map(|id| catalog.msi_to_rgb(id)).collect()
        };
        self.run_collection_stage(ctx, specs).await?;

        for record in ctx.collections.values_mut() {
            let key = ArtifactKey::collection(&record.id, CollectionArtifact::Rgb);
            record.rgb_path = ctx.working_set.artifacts().get(&key).map(|p| p.to_path_buf());
        }
        Ok(())
    }
}
