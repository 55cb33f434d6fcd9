//! Output surfaces and presentation.

/// Contact-sheet presentation of many job surfaces.
pub mod sheet;
/// Row sink contract and the owned RGBA surface.
pub mod sink;
