use std::sync::Arc;
use std::thread::JoinHandle;

use rayon::prelude::*;

use crate::dispatch::job::{CancelToken, Dispatcher, JobOutcome, JobStatus, RenderJob};
use crate::foundation::error::{FleetError, FleetResult};
use crate::module::ModuleFactory;

/// Fan-out controls for a fleet run.
#[derive(Clone, Debug)]
pub struct FleetOpts {
    /// Maximum jobs alive at once. `None` launches every job immediately, one dispatcher thread
    /// (plus its worker thread) per job. `Some(n)` runs dispatchers on an `n`-thread pool.
    pub max_in_flight: Option<usize>,
    /// Presentation scale recorded on each job surface.
    pub display_scale: f32,
}

impl Default for FleetOpts {
    fn default() -> Self {
        Self {
            max_in_flight: None,
            display_scale: 0.5,
        }
    }
}

/// Aggregated fleet counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FleetStats {
    pub jobs_total: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub rows_composited: u64,
}

/// Outcomes of a fleet run, in the order the jobs were submitted.
#[derive(Debug, Default)]
pub struct FleetReport {
    pub outcomes: Vec<JobOutcome>,
    pub stats: FleetStats,
}

impl FleetReport {
    pub fn from_outcomes(outcomes: Vec<JobOutcome>) -> Self {
        let mut stats = FleetStats {
            jobs_total: outcomes.len() as u64,
            ..FleetStats::default()
        };
        for o in &outcomes {
            match o.status {
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
                JobStatus::Failed(_) => stats.failed += 1,
            }
            stats.rows_composited += u64::from(o.stats.rows_composited);
        }
        Self { outcomes, stats }
    }

    pub fn all_completed(&self) -> bool {
        self.stats.completed == self.stats.jobs_total
    }
}

/// Launches many independent jobs concurrently.
///
/// Jobs share nothing but the module factory and the fleet cancel token: each gets its own
/// dispatcher loop, worker thread, module instance and surface. A cancelled fleet stays
/// cancelled.
#[derive(Clone)]
pub struct Fleet {
    dispatcher: Dispatcher,
    opts: FleetOpts,
    cancel: CancelToken,
}

impl Fleet {
    pub fn new(factory: Arc<dyn ModuleFactory>, opts: FleetOpts) -> FleetResult<Self> {
        if opts.max_in_flight == Some(0) {
            return Err(FleetError::validation(
                "fleet max_in_flight must be >= 1 when set",
            ));
        }
        Ok(Self {
            dispatcher: Dispatcher::new(factory).with_display_scale(opts.display_scale),
            opts,
            cancel: CancelToken::new(),
        })
    }

    pub fn opts(&self) -> &FleetOpts {
        &self.opts
    }

    /// Token that stops every job of this fleet at its next pull.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every job to its end and collect the outcomes. Blocks the calling thread.
    pub fn run(&self, jobs: &[RenderJob]) -> FleetResult<FleetReport> {
        let outcomes = match self.opts.max_in_flight {
            None => self.run_unbounded(jobs),
            Some(n) => self.run_bounded(jobs, n)?,
        };
        let report = FleetReport::from_outcomes(outcomes);
        tracing::info!(
            jobs = report.stats.jobs_total,
            completed = report.stats.completed,
            failed = report.stats.failed,
            cancelled = report.stats.cancelled,
            rows = report.stats.rows_composited,
            "fleet finished"
        );
        Ok(report)
    }

    /// Run the fleet on a background thread and return immediately.
    pub fn launch(&self, jobs: Vec<RenderJob>) -> FleetResult<FleetRun> {
        let fleet = self.clone();
        let handle = std::thread::Builder::new()
            .name("scanfleet-fleet".to_string())
            .spawn(move || fleet.run(&jobs))
            .map_err(|e| FleetError::Other(anyhow::anyhow!("spawn fleet thread: {e}")))?;
        Ok(FleetRun {
            cancel: self.cancel.clone(),
            handle,
        })
    }

    fn run_unbounded(&self, jobs: &[RenderJob]) -> Vec<JobOutcome> {
        tracing::debug!(jobs = jobs.len(), "launching unbounded fleet");
        let dispatcher = &self.dispatcher;
        let cancel = &self.cancel;

        std::thread::scope(|scope| {
            let handles = jobs
                .iter()
                .map(|job| {
                    let spawned = std::thread::Builder::new()
                        .name(format!("scanfleet-dispatch-{}", job.id.0))
                        .spawn_scoped(scope, move || dispatcher.run_job(job, cancel));
                    (job, spawned)
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|(job, spawned)| match spawned {
                    Ok(h) => h.join().unwrap_or_else(|_| {
                        JobOutcome::failed(job, FleetError::transport("dispatcher thread panicked"))
                    }),
                    Err(e) => JobOutcome::failed(
                        job,
                        FleetError::initialization(format!("spawn dispatcher thread: {e}")),
                    ),
                })
                .collect()
        })
    }

    fn run_bounded(&self, jobs: &[RenderJob], max_in_flight: usize) -> FleetResult<Vec<JobOutcome>> {
        tracing::debug!(jobs = jobs.len(), max_in_flight, "launching bounded fleet");
        let pool = build_thread_pool(max_in_flight)?;
        let dispatcher = &self.dispatcher;
        let cancel = &self.cancel;
        Ok(pool.install(|| {
            jobs.par_iter()
                .map(|job| dispatcher.run_job(job, cancel))
                .collect::<Vec<_>>()
        }))
    }
}

/// A fleet running in the background.
pub struct FleetRun {
    cancel: CancelToken,
    handle: JoinHandle<FleetResult<FleetReport>>,
}

impl FleetRun {
    /// Stop issuing pulls for every job; in-flight rows still finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn wait(self) -> FleetResult<FleetReport> {
        self.handle
            .join()
            .map_err(|_| FleetError::transport("fleet thread panicked"))?
    }
}

fn build_thread_pool(threads: usize) -> FleetResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("scanfleet-pool-{i}"))
        .build()
        .map_err(|e| FleetError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}
