//! Job dispatch: one dispatcher loop per job, many jobs per fleet.

/// Fan-out of many jobs with optional admission limit.
pub mod fleet;
/// Single-job lifecycle.
pub mod job;
