//! Command-line contracts of the pipeline stages
//!
//! Output file names are consumed by downstream tools and must not change.

use super::{StageKind, StageSpec};
use crate::error::{PipelineError, Result};
use crate::models::{CollectionRecord, FileKind, Modality, PipelineContext};
use crate::services::{ArtifactKey, CollectionArtifact, GlobalArtifact};
use danesfield_common::config::PipelineConfig;
use std::path::{Path, PathBuf};

pub const NDVI_FILE: &str = "ndvi.tif";
pub const HEIGHT_CLS_FILE: &str = "threshold_CLS.tif";
pub const ROAD_RASTERIZED_FILE: &str = "road_rasterized.tif";
pub const ROAD_RASTERIZED_BRIDGE_FILE: &str = "road_rasterized_bridge.tif";
pub const SEMANTIC_OUTPUT_PREFIX: &str = "semantic";
pub const BUILDING_CLS_FILE: &str = "CU_CLS_Float.tif";
pub const BUILDINGS_DSM_FILE: &str = "buildings_to_dsm_DSM.tif";
pub const BUILDINGS_CLS_FILE: &str = "buildings_to_dsm_CLS.tif";

pub fn dsm_file_name(aoi: &str) -> String {
    format!("{}_P3D_DSM.tif", aoi)
}

pub fn dtm_file_name(aoi: &str) -> String {
    format!("{}_DTM.tif", aoi)
}

/// `<image stem>_ortho.tif`
pub fn ortho_file_name(image: &Path) -> String {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_ortho.tif", stem)
}

pub fn pansharpened_file_name(collection_id: &str) -> String {
    format!("{}_ortho_pansharpened.tif", collection_id)
}

pub fn rgb_file_name(collection_id: &str) -> String {
    format!("{}_rgb_byte_image.tif", collection_id)
}

pub fn semantic_probability_file_name(prefix: &str) -> String {
    format!("{}_prob.tif", prefix)
}

pub fn semantic_cls_file_name(prefix: &str) -> String {
    format!("{}_semantic_CLS.tif", prefix)
}

fn ortho_artifact(modality: Modality) -> Option<CollectionArtifact> {
    match modality {
        Modality::Pan => Some(CollectionArtifact::PanOrtho),
        Modality::Msi => Some(CollectionArtifact::MsiOrtho),
        Modality::Swir => None,
    }
}

/// Builds stage descriptors from the run configuration and current context
pub struct StageCatalog<'a> {
    config: &'a PipelineConfig,
    ctx: &'a PipelineContext,
}

impl<'a> StageCatalog<'a> {
    pub fn new(config: &'a PipelineConfig, ctx: &'a PipelineContext) -> Self {
        Self { config, ctx }
    }

    /// Executable for a stage, honoring `[stages.programs]`
    pub fn program(config: &PipelineConfig, kind: StageKind) -> String {
        config
            .stages
            .programs
            .get(kind.name())
            .cloned()
            .unwrap_or_else(|| kind.default_program().to_string())
    }

    fn work_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.ctx.working_set.file(name)
    }

    fn nadir_id(&self, kind: StageKind) -> Result<&'a str> {
        self.ctx.nadir_id.as_deref().ok_or(PipelineError::MissingArtifact {
            stage: kind,
            artifact: "most-nadir collection".to_string(),
        })
    }

    /// Render the point cloud into a DSM over the AOI
    pub fn generate_dsm(&self) -> StageSpec {
        let bounds = self.ctx.aoi_bounds.to_array();
        let mut spec = StageSpec::new(StageKind::GenerateDsm)
            .output(GlobalArtifact::Dsm, self.work_file(dsm_file_name(&self.ctx.aoi_name)))
            .lit("-s")
            .path(&self.config.paths.p3d_fpath)
            .lit("--bounds");
        for value in bounds {
            spec = spec.lit(value.to_string());
        }
        spec.param("--gsd", format!("{:?}", self.ctx.gsd))
    }

    /// Fit a terrain model to the DSM
    pub fn fit_dtm(&self) -> StageSpec {
        StageSpec::new(StageKind::FitDtm)
            .input(GlobalArtifact::Dsm)
            .output(GlobalArtifact::Dtm, self.work_file(dtm_file_name(&self.ctx.aoi_name)))
    }

    /// Orthorectify the pan or msi image of a collection
    pub fn orthorectify(&self, record: &CollectionRecord, modality: Modality) -> Result<StageSpec> {
        let files = record.modality(modality);
        let artifact = ortho_artifact(modality).ok_or_else(|| PipelineError::IncompleteModality {
            collection_id: record.id.clone(),
            modality,
            missing: "orthorectification support".to_string(),
        })?;
        let image = files.get(FileKind::Image).ok_or_else(|| PipelineError::IncompleteModality {
            collection_id: record.id.clone(),
            modality,
            missing: FileKind::Image.to_string(),
        })?;

        let mut spec = StageSpec::new(StageKind::Orthorectify)
            .for_collection(&record.id)
            .labeled(format!("orthorectify ({})", modality))
            .path(image)
            .input(GlobalArtifact::Dsm)
            .output(
                ArtifactKey::collection(&record.id, artifact),
                self.work_file(ortho_file_name(image)),
            )
            .lit("--dtm")
            .input(GlobalArtifact::Dtm);
        if let Some(rpc) = files.get(FileKind::Rpc) {
            spec = spec.lit("--raytheon-rpc").path(rpc);
        }
        Ok(spec)
    }

    /// Fuse the pan and msi orthos of a collection
    pub fn pansharpen(&self, collection_id: &str) -> StageSpec {
        StageSpec::new(StageKind::Pansharpen)
            .for_collection(collection_id)
            .input(ArtifactKey::collection(collection_id, CollectionArtifact::PanOrtho))
            .input(ArtifactKey::collection(collection_id, CollectionArtifact::MsiOrtho))
            .output(
                ArtifactKey::collection(collection_id, CollectionArtifact::Pansharpened),
                self.work_file(pansharpened_file_name(collection_id)),
            )
    }

    /// Convert a pansharpened image to 8-bit RGB
    pub fn msi_to_rgb(&self, collection_id: &str) -> StageSpec {
        StageSpec::new(StageKind::MsiToRgb)
            .for_collection(collection_id)
            .input(ArtifactKey::collection(collection_id, CollectionArtifact::Pansharpened))
            .output(
                ArtifactKey::collection(collection_id, CollectionArtifact::Rgb),
                self.work_file(rgb_file_name(collection_id)),
            )
            .lit("-b")
    }

    /// Height and vegetation segmentation on the most-nadir image
    pub fn segment_by_height(&self) -> Result<StageSpec> {
        let nadir = self.nadir_id(StageKind::SegmentByHeight)?;
        let mut spec = StageSpec::new(StageKind::SegmentByHeight)
            .input(GlobalArtifact::Dsm)
            .input(GlobalArtifact::Dtm)
            .output(GlobalArtifact::HeightCls, self.work_file(HEIGHT_CLS_FILE))
            .lit("--msi")
            .input(ArtifactKey::collection(nadir, CollectionArtifact::Pansharpened))
            .lit("--ndvi")
            .output(GlobalArtifact::Ndvi, self.work_file(NDVI_FILE));

        if let Some((dir, prefix)) = self.config.osm_roads() {
            spec = spec
                .lit("--road-vector")
                .path(dir.join(format!("{}.shx", prefix)))
                .lit("--road-rasterized")
                .output(GlobalArtifact::RoadRasterized, self.work_file(ROAD_RASTERIZED_FILE))
                .lit("--road-rasterized-bridge")
                .output(
                    GlobalArtifact::RoadRasterizedBridge,
                    self.work_file(ROAD_RASTERIZED_BRIDGE_FILE),
                );
        }
        Ok(spec)
    }

    /// UNet semantic segmentation on the most-nadir image
    pub fn semantic_segment(&self) -> Result<StageSpec> {
        let nadir = self.nadir_id(StageKind::SemanticSegment)?;
        let semantic = &self.config.semantic;
        Ok(StageSpec::new(StageKind::SemanticSegment)
            .path(&semantic.config_fpath)
            .path(&semantic.model_fpath)
            .input(ArtifactKey::collection(nadir, CollectionArtifact::Rgb))
            .input(GlobalArtifact::Dsm)
            .input(GlobalArtifact::Dtm)
            .input(ArtifactKey::collection(nadir, CollectionArtifact::Pansharpened))
            .path(self.ctx.work_dir())
            .lit(SEMANTIC_OUTPUT_PREFIX)
            .produces(
                GlobalArtifact::SemanticProbability,
                self.work_file(semantic_probability_file_name(SEMANTIC_OUTPUT_PREFIX)),
            )
            .produces(
                GlobalArtifact::SemanticCls,
                self.work_file(semantic_cls_file_name(SEMANTIC_OUTPUT_PREFIX)),
            ))
    }

    /// Building segmentation on the most-nadir image
    pub fn building_segmentation(&self) -> Result<StageSpec> {
        let nadir = self.nadir_id(StageKind::BuildingSegmentation)?;
        Ok(StageSpec::new(StageKind::BuildingSegmentation)
            .lit("--rgb_image")
            .input(ArtifactKey::collection(nadir, CollectionArtifact::Rgb))
            .lit("--msi_image")
            .input(ArtifactKey::collection(nadir, CollectionArtifact::Pansharpened))
            .lit("--dsm")
            .input(GlobalArtifact::Dsm)
            .lit("--dtm")
            .input(GlobalArtifact::Dtm)
            .lit("--model_path")
            .path(&self.config.building.model_fpath_prefix)
            .lit("--save_dir")
            .path(self.ctx.work_dir())
            .lit("--output_tif")
            .produces(GlobalArtifact::BuildingCls, self.work_file(BUILDING_CLS_FILE)))
    }

    /// Material classification over every collection
    ///
    /// Image and info lists pair up positionally, in collection order.
    pub fn material_classifier(&self) -> Result<StageSpec> {
        let material = &self.config.material;
        let mut spec = StageSpec::new(StageKind::MaterialClassifier).lit("--image_paths");
        for id in self.ctx.collections.keys() {
            spec = spec.input(ArtifactKey::collection(id, CollectionArtifact::MsiOrtho));
        }

        spec = spec.lit("--info_paths");
        for record in self.ctx.collections.values() {
            let info = record.msi.info.as_ref().ok_or_else(|| PipelineError::IncompleteModality {
                collection_id: record.id.clone(),
                modality: Modality::Msi,
                missing: FileKind::Info.to_string(),
            })?;
            spec = spec.path(info);
        }

        spec = spec
            .lit("--output_dir")
            .path(self.ctx.work_dir())
            .lit("--model_path")
            .path(&material.model_fpath)
            .lit("--outfile_prefix")
            .lit(&self.ctx.aoi_name);
        if let Some(batch_size) = material.batch_size {
            spec = spec.param("--batch_size", batch_size);
        }
        if material.cuda {
            spec = spec.lit("--cuda");
        }
        Ok(spec)
    }

    /// Roof segmentation and geon extraction; yields `building_<N>.obj`
    pub fn roof_geon_extraction(&self) -> StageSpec {
        let roof = &self.config.roof;
        StageSpec::new(StageKind::RoofGeonExtraction)
            .lit("--las")
            .path(&self.config.paths.p3d_fpath)
            .lit("--cls")
            .input(GlobalArtifact::HeightCls)
            .lit("--dtm")
            .input(GlobalArtifact::Dtm)
            .lit("--model_dir")
            .path(&roof.model_dir)
            .lit("--model_prefix")
            .lit(&roof.model_prefix)
            .lit("--output_dir")
            .path(self.ctx.work_dir())
            .discovers(GlobalArtifact::BuildingModels, self.ctx.work_dir(), "obj")
    }

    /// Render building models to an elevation or class raster
    pub fn buildings_to_dsm(&self, render_cls: bool) -> StageSpec {
        let spec = StageSpec::new(StageKind::BuildingsToDsm).input(GlobalArtifact::Dtm);
        let spec = if render_cls {
            spec.labeled("buildings-to-dsm (CLS)")
                .output(GlobalArtifact::BuildingsCls, self.work_file(BUILDINGS_CLS_FILE))
                .lit("--render_cls")
        } else {
            spec.labeled("buildings-to-dsm (DSM)")
                .output(GlobalArtifact::BuildingsDsm, self.work_file(BUILDINGS_DSM_FILE))
        };
        spec.lit("--input_obj_paths")
            .inputs(GlobalArtifact::BuildingModels)
    }
}
