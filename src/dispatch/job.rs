use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::core::{ColorParams, JobId, ScanlineRange};
use crate::foundation::error::{FleetError, FleetResult};
use crate::module::ModuleFactory;
use crate::surface::sink::{RgbaSurface, RowSink, SurfaceConfig};
use crate::worker::handle::WorkerHandle;
use crate::worker::protocol::RowResult;

/// One requested image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderJob {
    pub id: JobId,
    /// Forwarded verbatim to the computational module.
    pub params: ColorParams,
    /// Rows this job's worker produces.
    pub range: ScanlineRange,
    /// Image width and height in pixels.
    pub size: u32,
}

impl RenderJob {
    /// A job covering the full image `[0, size)`.
    pub fn new(id: JobId, params: ColorParams, size: u32) -> Self {
        Self {
            id,
            params,
            range: ScanlineRange::full(size),
            size,
        }
    }

    pub fn with_range(mut self, range: ScanlineRange) -> Self {
        self.range = range;
        self
    }

    pub fn validate(&self) -> FleetResult<()> {
        if self.size == 0 {
            return Err(FleetError::validation(format!(
                "{}: image size must be > 0",
                self.id
            )));
        }
        self.range.validate_for(self.size)
    }
}

/// Cooperative cancel signal, checked by the dispatcher between pulls.
///
/// Clones share the same flag. Once set it stays set.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-job counters. Kept up to date while the job runs, so they stay meaningful on failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobStats {
    /// The worker accepted its init request.
    pub initialized: bool,
    /// Produce-next-row requests issued, including the one answered with exhaustion.
    pub pulls: u32,
    /// Rows written into the job's surface.
    pub rows_composited: u32,
}

#[derive(Debug)]
pub enum JobStatus {
    Completed,
    Cancelled,
    Failed(FleetError),
}

/// Final state of one job.
#[derive(Debug)]
pub struct JobOutcome {
    pub id: JobId,
    pub params: ColorParams,
    pub status: JobStatus,
    /// `None` when the job never got past initialization. Otherwise holds every row composited
    /// before the job ended, complete or not.
    pub surface: Option<RgbaSurface>,
    pub stats: JobStats,
}

impl JobOutcome {
    pub(crate) fn failed(job: &RenderJob, err: FleetError) -> Self {
        Self {
            id: job.id,
            params: job.params,
            status: JobStatus::Failed(err),
            surface: None,
            stats: JobStats::default(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, JobStatus::Completed)
    }

    pub fn error(&self) -> Option<&FleetError> {
        match &self.status {
            JobStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Drives jobs end to end: spawn a worker, init it, pull rows until exhaustion, composite each
/// row as it arrives, release the worker.
#[derive(Clone)]
pub struct Dispatcher {
    factory: Arc<dyn ModuleFactory>,
    display_scale: f32,
}

impl Dispatcher {
    pub fn new(factory: Arc<dyn ModuleFactory>) -> Self {
        Self {
            factory,
            display_scale: 1.0,
        }
    }

    /// Presentation scale stored on every surface this dispatcher allocates.
    pub fn with_display_scale(mut self, display_scale: f32) -> Self {
        self.display_scale = display_scale;
        self
    }

    /// Run one job into a freshly allocated [`RgbaSurface`].
    ///
    /// Never returns early: every failure is folded into the returned [`JobOutcome`] so sibling
    /// jobs are unaffected.
    #[tracing::instrument(level = "debug", skip_all, fields(job = %job.id, size = job.size))]
    pub fn run_job(&self, job: &RenderJob, cancel: &CancelToken) -> JobOutcome {
        let surface = job
            .validate()
            .and_then(|()| RgbaSurface::new(SurfaceConfig::square(job.size, self.display_scale)));
        let mut surface = match surface {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "job rejected");
                return JobOutcome::failed(job, e);
            }
        };

        let mut stats = JobStats::default();
        let result = self.drive_job(job, &mut surface, cancel, &mut stats);
        let (status, surface) = match result {
            Ok(()) => {
                tracing::debug!(rows = stats.rows_composited, pulls = stats.pulls, "job completed");
                (JobStatus::Completed, Some(surface))
            }
            Err(FleetError::Cancelled) => {
                tracing::info!(rows = stats.rows_composited, "job cancelled");
                (JobStatus::Cancelled, Some(surface))
            }
            Err(e) => {
                tracing::warn!(error = %e, rows = stats.rows_composited, "job failed");
                let surface = stats.initialized.then_some(surface);
                (JobStatus::Failed(e), surface)
            }
        };

        JobOutcome {
            id: job.id,
            params: job.params,
            status,
            surface,
            stats,
        }
    }

    /// Run one job into any [`RowSink`].
    ///
    /// `stats` is updated as the job progresses. On error, rows already written to `sink` are
    /// left in place. The worker is always released before this returns.
    pub fn drive_job(
        &self,
        job: &RenderJob,
        sink: &mut dyn RowSink,
        cancel: &CancelToken,
        stats: &mut JobStats,
    ) -> FleetResult<()> {
        job.validate()?;
        if cancel.is_cancelled() {
            return Err(FleetError::Cancelled);
        }

        let mut worker = WorkerHandle::spawn(job.id, self.factory.clone())?;
        worker.init(job.size, job.range, job.params)?;
        stats.initialized = true;

        let result = pull_rows(&mut worker, job.range, sink, cancel, stats);
        worker.release();
        result
    }
}

fn pull_rows(
    worker: &mut WorkerHandle,
    range: ScanlineRange,
    sink: &mut dyn RowSink,
    cancel: &CancelToken,
    stats: &mut JobStats,
) -> FleetResult<()> {
    let mut expected = range.start;
    loop {
        if cancel.is_cancelled() {
            return Err(FleetError::Cancelled);
        }

        stats.pulls += 1;
        match worker.render_next()? {
            RowResult::Row(row) => {
                if row.y != expected || !range.contains(row.y) {
                    return Err(FleetError::protocol(format!(
                        "{}: worker produced row {}, expected {expected}",
                        worker.job(),
                        row.y
                    )));
                }
                sink.write_row(row.y, &row.data)?;
                stats.rows_composited += 1;
                expected += 1;
            }
            RowResult::Exhausted => return Ok(()),
        }
    }
}
