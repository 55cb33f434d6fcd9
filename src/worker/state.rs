use std::sync::Arc;

use crate::foundation::core::{ColorParams, ScanlineRange, row_byte_len};
use crate::foundation::error::{FleetError, FleetResult};
use crate::module::{ModuleFactory, RowRenderer};
use crate::worker::protocol::{RenderedRow, RowResult};

/// Render worker state machine: `Uninitialized --init--> Ready`.
///
/// A worker is bound to one module instance for its whole life. After `init` the row cursor is
/// the only state that changes, and it only ever moves forward by one per produced row.
pub struct RenderWorker {
    factory: Arc<dyn ModuleFactory>,
    state: WorkerState,
}

enum WorkerState {
    Uninitialized,
    Ready(ReadyWorker),
}

struct ReadyWorker {
    module: Box<dyn RowRenderer>,
    size: u32,
    range: ScanlineRange,
    cursor: u32,
}

impl RenderWorker {
    pub fn new(factory: Arc<dyn ModuleFactory>) -> Self {
        Self {
            factory,
            state: WorkerState::Uninitialized,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, WorkerState::Ready(_))
    }

    /// Next row to produce, once initialized.
    pub fn cursor(&self) -> Option<u32> {
        match &self.state {
            WorkerState::Uninitialized => None,
            WorkerState::Ready(r) => Some(r.cursor),
        }
    }

    /// Construct the module instance and arm the row cursor at `range.start`.
    ///
    /// Valid exactly once. A failed init leaves the worker uninitialized.
    pub fn init(&mut self, size: u32, range: ScanlineRange, params: ColorParams) -> FleetResult<()> {
        if self.is_ready() {
            return Err(FleetError::protocol("worker initialized twice"));
        }
        if size == 0 {
            return Err(FleetError::validation("image size must be > 0"));
        }
        range.validate_for(size)?;

        let module = self.factory.construct(size, params).map_err(|e| match e {
            FleetError::Initialization(_) => e,
            other => FleetError::initialization(other.to_string()),
        })?;

        self.state = WorkerState::Ready(ReadyWorker {
            module,
            size,
            range,
            cursor: range.start,
        });
        Ok(())
    }

    /// Produce the row at the cursor, or `Exhausted` once the cursor reached `range.end`.
    ///
    /// Exhaustion is sticky: every later call returns `Exhausted` again. A module error leaves
    /// the cursor where it was.
    pub fn render_next(&mut self) -> FleetResult<RowResult> {
        let WorkerState::Ready(ready) = &mut self.state else {
            return Err(FleetError::protocol("render_next called before init"));
        };
        if ready.cursor >= ready.range.end {
            return Ok(RowResult::Exhausted);
        }

        let y = ready.cursor;
        let data = ready.module.render_row(y)?;
        let expected = row_byte_len(ready.size);
        if data.len() != expected {
            return Err(FleetError::render(format!(
                "row {y}: module returned {} bytes, expected {expected}",
                data.len()
            )));
        }

        ready.cursor += 1;
        Ok(RowResult::Row(RenderedRow { y, data }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/worker/state.rs"]
mod tests;
