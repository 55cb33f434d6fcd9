use crate::foundation::core::{ColorParams, ScanlineRange};
use crate::foundation::error::FleetError;

/// One scanline handed from a worker to its dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedRow {
    /// Row index inside the image.
    pub y: u32,
    /// `width * 4` RGBA8 samples.
    pub data: Vec<u8>,
}

/// Response to a produce-next-row request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowResult {
    Row(RenderedRow),
    /// The row cursor has reached the end of the assigned range.
    Exhausted,
}

impl RowResult {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Dispatcher -> worker messages.
#[derive(Clone, Debug)]
pub(crate) enum WorkerRequest {
    Init {
        size: u32,
        range: ScanlineRange,
        params: ColorParams,
    },
    RenderNext,
}

/// Worker -> dispatcher messages. Exactly one per request.
#[derive(Debug)]
pub(crate) enum WorkerResponse {
    Ready,
    Next(RowResult),
    Failed(FleetError),
}
