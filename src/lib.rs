//! Scanfleet coordinates a fleet of independent render workers.
//!
//! Each job owns one worker thread bound to one computational-module instance. The job's
//! dispatcher initializes the worker, then pulls scanlines one at a time until the worker reports
//! exhaustion, compositing every row into the job's surface as it arrives.
//!
//! - Describe jobs with [`RenderJob`] (or build many from a [`FleetConfig`])
//! - Run one with [`Dispatcher::run_job`], or many concurrently with [`Fleet`]
//! - Present results with [`RgbaSurface`] and [`contact_sheet`]
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod dispatch;
pub mod module;
pub mod surface;
pub mod worker;

pub use crate::config::FleetConfig;
pub use crate::dispatch::fleet::{Fleet, FleetOpts, FleetReport, FleetRun, FleetStats};
pub use crate::dispatch::job::{CancelToken, Dispatcher, JobOutcome, JobStats, JobStatus, RenderJob};
pub use crate::foundation::core::{
    ColorParams, DEFAULT_JOB_COUNT, DEFAULT_SIZE, JobId, PIXEL_CHANNELS, ScanlineRange,
    row_byte_len,
};
pub use crate::foundation::error::{ErrorKind, FleetError, FleetResult};
pub use crate::module::sphere::{Phong, SphereModule};
pub use crate::module::{ModuleFactory, RowRenderer};
pub use crate::surface::sheet::contact_sheet;
pub use crate::surface::sink::{RgbaSurface, RowSink, SurfaceConfig};
pub use crate::worker::handle::WorkerHandle;
pub use crate::worker::protocol::{RenderedRow, RowResult};
pub use crate::worker::state::RenderWorker;
