//! Computational module contract.
//!
//! The worker core never looks inside a module: it constructs one instance per job through a
//! [`ModuleFactory`] and then asks the resulting [`RowRenderer`] for one scanline at a time.

use crate::foundation::core::ColorParams;
use crate::foundation::error::FleetResult;

/// Built-in Phong-shaded sphere module.
pub mod sphere;

/// One constructed module instance, exclusively owned by a single render worker.
pub trait RowRenderer: Send {
    /// Produce scanline `row` as `size * 4` RGBA8 samples.
    ///
    /// Called with strictly increasing `row` values in `[0, size)`. Implementations are expected
    /// to be deterministic for a given construction.
    fn render_row(&mut self, row: u32) -> FleetResult<Vec<u8>>;
}

/// Constructs module instances. Shared by every worker in a fleet.
pub trait ModuleFactory: Send + Sync {
    /// Construct an instance rendering a `size x size` image tinted by `params`.
    ///
    /// Failure here is an initialization failure for the owning job only.
    fn construct(&self, size: u32, params: ColorParams) -> FleetResult<Box<dyn RowRenderer>>;
}

impl<F> ModuleFactory for F
where
    F: Fn(u32, ColorParams) -> FleetResult<Box<dyn RowRenderer>> + Send + Sync,
{
    fn construct(&self, size: u32, params: ColorParams) -> FleetResult<Box<dyn RowRenderer>> {
        self(size, params)
    }
}
