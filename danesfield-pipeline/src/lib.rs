//! danesfield-pipeline library
//!
//! Orchestration of the Danesfield reconstruction pipeline: imagery
//! classification and validation, working directory management, and the
//! sequencing of external processing stages.

pub mod error;
pub mod logging;
pub mod models;
pub mod runner;
pub mod services;
pub mod stages;

pub use error::{PipelineError, Result, StageError};
pub use runner::{run_pipeline, RunOptions};
