//! In-process stand-ins for stage programs and raster inspection

use async_trait::async_trait;
use danesfield_common::{CoordinateOffset, Error as CommonError, Raster, RasterInfo, RasterOpener};
use danesfield_pipeline::stages::{Invocation, StageExecutor, StageKind};
use danesfield_pipeline::StageError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Records every invocation instead of spawning it
///
/// Roof geon extraction writes one `building_<n>.obj` per model offset into
/// its `--output_dir`, each headed by `# x/y/z offset:` lines, so later
/// stages see real discovered models.
#[derive(Default)]
pub struct RecordingExecutor {
    invocations: Mutex<Vec<Invocation>>,
    fail_on: Option<StageKind>,
    delay: Option<Duration>,
    model_offsets: Vec<CoordinateOffset>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        let offset = CoordinateOffset::new(747594.5, 4407371.25, 225.0);
        Self {
            model_offsets: vec![offset, offset],
            ..Default::default()
        }
    }

    /// Exit with code 1 on the first invocation of `kind`
    pub fn failing_on(kind: StageKind) -> Self {
        Self {
            fail_on: Some(kind),
            ..Self::new()
        }
    }

    /// Offsets written into the generated building models, one model each
    pub fn with_model_offsets(mut self, offsets: Vec<CoordinateOffset>) -> Self {
        self.model_offsets = offsets;
        self
    }

    /// Hold each invocation open for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.invocations().iter().map(|i| i.stage).collect()
    }

    pub fn of_kind(&self, kind: StageKind) -> Vec<Invocation> {
        self.invocations().into_iter().filter(|i| i.stage == kind).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn write_building_models(&self, invocation: &Invocation) {
        let args = invocation.args_lossy();
        let Some(pos) = args.iter().position(|a| a == "--output_dir") else {
            return;
        };
        let dir = PathBuf::from(&args[pos + 1]);
        for (n, offset) in self.model_offsets.iter().enumerate() {
            let content = format!(
                "# x offset: {}\n# y offset: {}\n# z offset: {}\no building\nv 0 0 0\n",
                offset.x, offset.y, offset.z
            );
            std::fs::write(dir.join(format!("building_{}.obj", n)), content).unwrap();
        }
    }
}

#[async_trait]
impl StageExecutor for RecordingExecutor {
    async fn execute(&self, invocation: &Invocation) -> Result<(), StageError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.invocations.lock().unwrap().push(invocation.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on == Some(invocation.stage) {
            return Err(StageError::Exited {
                program: invocation.program.clone(),
                code: 1,
            });
        }
        if invocation.stage == StageKind::RoofGeonExtraction {
            self.write_building_models(invocation);
        }
        Ok(())
    }
}

/// Serves raster descriptions keyed by file name
#[derive(Default)]
pub struct MemoryRasterOpener {
    rasters: HashMap<String, RasterInfo>,
}

impl MemoryRasterOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: impl Into<String>, raster: RasterInfo) -> Self {
        self.rasters.insert(file_name.into(), raster);
        self
    }
}

impl RasterOpener for MemoryRasterOpener {
    fn open(&self, path: &Path) -> danesfield_common::Result<Box<dyn Raster + Send>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.rasters
            .get(&name)
            .cloned()
            .map(|raster| Box::new(raster) as Box<dyn Raster + Send>)
            .ok_or_else(|| CommonError::open_failure(path, "no such raster"))
    }
}
