use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use crate::foundation::core::{ColorParams, JobId, ScanlineRange};
use crate::foundation::error::{FleetError, FleetResult};
use crate::module::ModuleFactory;
use crate::worker::protocol::{RowResult, WorkerRequest, WorkerResponse};
use crate::worker::state::RenderWorker;

/// Dispatcher-side end of one render worker running on its own thread.
///
/// Requests are strictly sequential: every call blocks until the worker answers. The worker owns
/// its module instance; nothing is shared with the dispatcher except the two channels.
pub struct WorkerHandle {
    job: JobId,
    tx: Option<mpsc::Sender<WorkerRequest>>,
    rx: mpsc::Receiver<WorkerResponse>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Start a worker thread bound to `factory`. The worker stays uninitialized until
    /// [`WorkerHandle::init`].
    pub fn spawn(job: JobId, factory: Arc<dyn ModuleFactory>) -> FleetResult<Self> {
        let (req_tx, req_rx) = mpsc::channel::<WorkerRequest>();
        // One request in flight at a time, so one slot is enough.
        let (resp_tx, resp_rx) = mpsc::sync_channel::<WorkerResponse>(1);

        let thread = std::thread::Builder::new()
            .name(format!("scanfleet-worker-{}", job.0))
            .spawn(move || worker_main(RenderWorker::new(factory), req_rx, resp_tx))
            .map_err(|e| {
                FleetError::initialization(format!("failed to spawn worker thread for {job}: {e}"))
            })?;

        tracing::debug!(%job, "worker spawned");
        Ok(Self {
            job,
            tx: Some(req_tx),
            rx: resp_rx,
            thread: Some(thread),
        })
    }

    pub fn job(&self) -> JobId {
        self.job
    }

    pub fn is_released(&self) -> bool {
        self.tx.is_none()
    }

    /// Bind the worker to one job. A worker that dies while constructing its module is reported
    /// as an initialization failure, not a transport one.
    pub fn init(&mut self, size: u32, range: ScanlineRange, params: ColorParams) -> FleetResult<()> {
        let resp = self
            .request(WorkerRequest::Init {
                size,
                range,
                params,
            })
            .map_err(|e| match e {
                FleetError::Transport(msg) => FleetError::initialization(format!(
                    "{}: worker died during module construction ({msg})",
                    self.job
                )),
                other => other,
            })?;
        match resp {
            WorkerResponse::Ready => Ok(()),
            WorkerResponse::Failed(e) => Err(e),
            WorkerResponse::Next(_) => Err(FleetError::protocol(format!(
                "{}: worker answered init with a row",
                self.job
            ))),
        }
    }

    /// Pull the next row. Blocks until the worker answers.
    pub fn render_next(&mut self) -> FleetResult<RowResult> {
        match self.request(WorkerRequest::RenderNext)? {
            WorkerResponse::Next(result) => Ok(result),
            WorkerResponse::Failed(e) => Err(e),
            WorkerResponse::Ready => Err(FleetError::protocol(format!(
                "{}: worker answered render_next with ready",
                self.job
            ))),
        }
    }

    /// Tear down the worker thread. Safe to call any number of times.
    pub fn release(&mut self) {
        // Dropping the request sender ends the worker loop.
        if self.tx.take().is_none() {
            return;
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            tracing::warn!(job = %self.job, "worker thread panicked before release");
        }
        tracing::debug!(job = %self.job, "worker released");
    }

    fn request(&mut self, req: WorkerRequest) -> FleetResult<WorkerResponse> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(FleetError::protocol(format!(
                "{}: request sent to a released worker",
                self.job
            )));
        };
        tx.send(req).map_err(|_| {
            FleetError::transport(format!("{}: worker channel closed", self.job))
        })?;
        self.rx.recv().map_err(|_| {
            FleetError::transport(format!(
                "{}: worker exited without answering",
                self.job
            ))
        })
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.release();
    }
}

fn worker_main(
    mut worker: RenderWorker,
    rx: mpsc::Receiver<WorkerRequest>,
    tx: mpsc::SyncSender<WorkerResponse>,
) {
    while let Ok(req) = rx.recv() {
        let resp = match req {
            WorkerRequest::Init {
                size,
                range,
                params,
            } => worker.init(size, range, params).map(|()| WorkerResponse::Ready),
            WorkerRequest::RenderNext => worker.render_next().map(WorkerResponse::Next),
        };
        let resp = resp.unwrap_or_else(WorkerResponse::Failed);
        if tx.send(resp).is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/handle.rs"]
mod tests;
