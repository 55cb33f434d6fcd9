use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::dispatch::fleet::FleetOpts;
use crate::dispatch::job::RenderJob;
use crate::foundation::core::{
    ColorParams, DEFAULT_JOB_COUNT, DEFAULT_SIZE, JobId, ScanlineRange,
};
use crate::foundation::error::{FleetError, FleetResult};

/// Fleet configuration. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Number of independent jobs to launch.
    pub job_count: u32,
    /// Image width and height of every job.
    pub size: u32,
    /// Presentation-only scale of each job's tile on the contact sheet.
    pub display_scale: f32,
    /// Contact-sheet tiles per row.
    pub columns: u32,
    /// Admission limit. `None` launches all jobs at once.
    pub max_in_flight: Option<usize>,
    /// Seed for per-job color parameters.
    pub seed: u64,
    /// Scanline range rendered by each job. `None` means `[0, size)`.
    pub range: Option<ScanlineRange>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            job_count: DEFAULT_JOB_COUNT,
            size: DEFAULT_SIZE,
            display_scale: 0.5,
            columns: 20,
            max_in_flight: None,
            seed: 0,
            range: None,
        }
    }
}

impl FleetConfig {
    pub fn from_path(path: impl AsRef<Path>) -> FleetResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FleetError::validation(format!("open fleet config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_reader(r: impl Read) -> FleetResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| FleetError::serde(format!("parse fleet config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_pretty(&self) -> FleetResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FleetError::serde(e.to_string()))
    }

    pub fn validate(&self) -> FleetResult<()> {
        if self.size == 0 {
            return Err(FleetError::validation("config size must be > 0"));
        }
        if !self.display_scale.is_finite() || self.display_scale <= 0.0 {
            return Err(FleetError::validation(
                "config display_scale must be finite and > 0",
            ));
        }
        if self.columns == 0 {
            return Err(FleetError::validation("config columns must be >= 1"));
        }
        if self.max_in_flight == Some(0) {
            return Err(FleetError::validation(
                "config max_in_flight must be >= 1 when set",
            ));
        }
        self.effective_range().validate_for(self.size)
    }

    pub fn effective_range(&self) -> ScanlineRange {
        self.range.unwrap_or(ScanlineRange::full(self.size))
    }

    pub fn fleet_opts(&self) -> FleetOpts {
        FleetOpts {
            max_in_flight: self.max_in_flight,
            display_scale: self.display_scale,
        }
    }

    /// Build `job_count` jobs with color channels drawn from `seed`, each in `[0, 1)`.
    ///
    /// The same seed always yields the same jobs.
    pub fn jobs(&self) -> FleetResult<Vec<RenderJob>> {
        self.validate()?;
        let range = self.effective_range();
        let mut rng = SplitMix64::new(self.seed);
        Ok((0..self.job_count)
            .map(|i| {
                let params = ColorParams::new(rng.next_unit(), rng.next_unit(), rng.next_unit());
                RenderJob::new(JobId(i), params, self.size).with_range(range)
            })
            .collect())
    }
}

struct SplitMix64(u64);

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)` with 53 bits of precision.
    fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
