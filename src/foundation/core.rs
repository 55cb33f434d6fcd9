use crate::foundation::error::{FleetError, FleetResult};

/// Samples per pixel in every row buffer (RGBA8).
pub const PIXEL_CHANNELS: usize = 4;

/// Default image dimension (width = height) for a job.
pub const DEFAULT_SIZE: u32 = 128;

/// Default number of jobs launched by a fleet (8 rows of 20).
pub const DEFAULT_JOB_COUNT: u32 = 8 * 20;

/// Stable identifier of one job inside a fleet.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct JobId(pub u32);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// Half-open scanline range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScanlineRange {
    /// Inclusive first row.
    pub start: u32,
    /// Exclusive end row.
    pub end: u32,
}

impl ScanlineRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: u32, end: u32) -> FleetResult<Self> {
        if start > end {
            return Err(FleetError::validation(format!(
                "scanline range start ({start}) must be <= end ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// The full range `[0, size)`.
    pub fn full(size: u32) -> Self {
        Self {
            start: 0,
            end: size,
        }
    }

    pub fn len_rows(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    pub fn contains(self, row: u32) -> bool {
        self.start <= row && row < self.end
    }

    /// Check the range against an image dimension: `start <= end <= size`.
    ///
    /// Ranges deserialized from config bypass [`ScanlineRange::new`], so `start <= end` is
    /// re-checked here.
    pub fn validate_for(self, size: u32) -> FleetResult<()> {
        if self.start > self.end {
            return Err(FleetError::validation(format!(
                "scanline range start ({}) must be <= end ({})",
                self.start, self.end
            )));
        }
        if self.end > size {
            return Err(FleetError::validation(format!(
                "scanline range end ({}) exceeds image size ({size})",
                self.end
            )));
        }
        Ok(())
    }
}

/// Per-job color payload forwarded verbatim to the computational module.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColorParams {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ColorParams {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Return `true` when every channel is finite and inside `[0, 1]`.
    pub fn is_unit(self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

/// Byte length of one row buffer for an image `width` pixels wide.
pub fn row_byte_len(width: u32) -> usize {
    (width as usize).saturating_mul(PIXEL_CHANNELS)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
