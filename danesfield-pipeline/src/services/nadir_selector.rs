//! Most-nadir collection selection

use crate::error::{PipelineError, Result};
use crate::models::CollectionRecord;
use danesfield_common::RasterOpener;
use std::collections::BTreeMap;
use std::path::Path;

/// Dataset metadata item carrying the sensor obliquity angle of a NITF image
pub const OBLIQUITY_METADATA_KEY: &str = "NITF_CSEXRA_OBLIQUITY_ANGLE";

/// Picks the collection viewed most directly from overhead
#[derive(Debug, Clone, Copy, Default)]
pub struct NadirSelector;

impl NadirSelector {
    pub fn new() -> Self {
        Self
    }

    /// Identifier with the minimal angle; the first one wins a tie
    pub fn select<'a, I>(&self, candidates: I) -> Result<&'a str>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut best: Option<(&'a str, f64)> = None;
        for (id, angle) in candidates {
            if angle.is_nan() {
                tracing::warn!(collection_id = id, "Obliquity angle is NaN, ignoring");
                continue;
            }
            match best {
                Some((_, lowest)) if angle >= lowest => {}
                _ => best = Some((id, angle)),
            }
        }

        best.map(|(id, _)| id)
            .ok_or(PipelineError::NoCollectionsAvailable)
    }

    /// Select among records that carry an obliquity angle, in key order
    pub fn select_collection<'a>(
        &self,
        collections: &'a BTreeMap<String, CollectionRecord>,
    ) -> Result<&'a str> {
        self.select(
            collections
                .values()
                .filter_map(|record| record.obliquity_angle.map(|angle| (record.id.as_str(), angle))),
        )
    }
}

/// Read the obliquity angle from an image's dataset metadata
pub fn read_obliquity_angle(opener: &dyn RasterOpener, image: &Path) -> Result<f64> {
    let raster = opener.open(image)?;
    raster
        .metadata_item(OBLIQUITY_METADATA_KEY)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .ok_or_else(|| PipelineError::MissingMetadata {
            path: image.to_path_buf(),
            key: OBLIQUITY_METADATA_KEY.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use danesfield_common::{Raster, RasterInfo};
    use std::path::PathBuf;

    #[test]
    fn test_selects_minimum() {
        let selector = NadirSelector::new();
        let id = selector
            .select(vec![("A", 21.5), ("B", 3.25), ("C", 17.0)])
            .unwrap();
        assert_eq!(id, "B");
    }

    #[test]
    fn test_tie_goes_to_first() {
        let selector = NadirSelector::new();
        assert_eq!(selector.select(vec![("A", 5.0), ("B", 5.0)]).unwrap(), "A");
        assert_eq!(selector.select(vec![("B", 5.0), ("A", 5.0)]).unwrap(), "B");
    }

    #[test]
    fn test_empty_fails() {
        let err = NadirSelector::new().select(Vec::new()).unwrap_err();
        assert!(matches!(err, PipelineError::NoCollectionsAvailable));
    }

    #[test]
    fn test_select_collection_uses_key_order() {
        let mut collections = BTreeMap::new();
        for (id, angle) in [("B", Some(7.0)), ("A", Some(7.0)), ("C", None)] {
            let mut record = CollectionRecord::new(id);
            record.obliquity_angle = angle;
            collections.insert(id.to_string(), record);
        }
        assert_eq!(NadirSelector::new().select_collection(&collections).unwrap(), "A");
    }

    struct SingleRaster(RasterInfo);

    impl RasterOpener for SingleRaster {
        fn open(&self, _path: &Path) -> danesfield_common::Result<Box<dyn Raster + Send>> {
            Ok(Box::new(self.0.clone()))
        }
    }

    #[test]
    fn test_read_obliquity_angle() {
        let image = PathBuf::from("pan.ntf");
        let opener = SingleRaster(RasterInfo::new(10, 10).with_metadata(OBLIQUITY_METADATA_KEY, " 12.5 "));
        assert_eq!(read_obliquity_angle(&opener, &image).unwrap(), 12.5);

        let opener = SingleRaster(RasterInfo::new(10, 10).with_metadata(OBLIQUITY_METADATA_KEY, "n/a"));
        let err = read_obliquity_angle(&opener, &image).unwrap_err();
        assert!(matches!(err, PipelineError::MissingMetadata { .. }));

        let opener = SingleRaster(RasterInfo::new(10, 10));
        let err = read_obliquity_angle(&opener, &image).unwrap_err();
        assert!(err.to_string().contains(OBLIQUITY_METADATA_KEY));
    }
}
