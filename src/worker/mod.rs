//! Render workers.
//!
//! A worker owns one module instance and one scanline range, and answers two requests: init and
//! produce-next-row. [`state::RenderWorker`] is the state machine; [`handle::WorkerHandle`] runs
//! it on a dedicated thread behind a pair of channels.

/// Thread-backed worker handle used by the dispatcher.
pub mod handle;
/// Request/response messages and the row result type.
pub mod protocol;
/// The worker state machine.
pub mod state;
