//! Test helper utilities
//!
//! Shared fixtures and fakes for danesfield-pipeline integration tests

#![allow(dead_code)]

pub mod fakes;
pub mod fixtures;

pub use fakes::{MemoryRasterOpener, RecordingExecutor};
pub use fixtures::{
    dayton_dsm, dsm_file_name, file_name, nitf_with_obliquity, pan_image, product_name, ImageryTree, AOI_NAME,
};
