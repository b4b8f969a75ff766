//! Terrain phase: DSM rendering, DTM fitting, UTM zone of the DSM

use super::StageSequencer;
use crate::error::Result;
use crate::models::PipelineContext;
use crate::services::GlobalArtifact;
use danesfield_common::geodesy::utm_zone_for_raster;

impl StageSequencer {
    pub(super) async fn phase_terrain(&self, ctx: &mut PipelineContext) -> Result<()> {
        let spec = self.catalog(ctx).generate_dsm();
        self.run_stage(ctx, spec).await?;

        let spec = self.catalog(ctx).fit_dtm();
        self.run_stage(ctx, spec).await?;

        self.derive_utm_zone(ctx).await;
        Ok(())
    }

    /// UTM zone at the DSM center; failures are logged, not fatal
    async fn derive_utm_zone(&self, ctx: &mut PipelineContext) {
        let Some(dsm) = ctx
            .working_set
            .artifacts()
            .get(&GlobalArtifact::Dsm.into())
            .map(|p| p.to_path_buf())
        else {
            return;
        };

        let result = self
            .inspect_raster(dsm.clone(), |opener, path| {
                let raster = opener.open(path)?;
                Ok(utm_zone_for_raster(raster.as_ref())?)
            })
            .await;

        match result {
            Ok(zone) => {
                tracing::info!(dsm = %dsm.display(), utm_zone = %zone, epsg = zone.epsg(), "DSM UTM zone");
                ctx.utm_zone = Some(zone);
            }
            Err(e) => {
                tracing::warn!(dsm = %dsm.display(), "Unable to determine UTM zone of DSM: {}", e);
            }
        }
    }
}
