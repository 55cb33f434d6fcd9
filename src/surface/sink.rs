use std::path::Path;

use sha2::Digest as _;

use crate::foundation::core::row_byte_len;
use crate::foundation::error::{FleetError, FleetResult};

/// Geometry of one output surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    /// Scale applied only when presenting (contact sheets). Pixel buffers are always
    /// `width x height`.
    pub display_scale: f32,
}

impl SurfaceConfig {
    pub fn square(size: u32, display_scale: f32) -> Self {
        Self {
            width: size,
            height: size,
            display_scale,
        }
    }
}

/// Destination for composited scanlines.
///
/// Ordering contract: for a single sink, `write_row` is called with strictly increasing `y`.
/// Different sinks may be written concurrently from different threads.
pub trait RowSink: Send {
    /// Write one scanline of `width * 4` RGBA8 samples at row `y`.
    fn write_row(&mut self, y: u32, pixels: &[u8]) -> FleetResult<()>;
}

/// Owned straight-alpha RGBA8 surface, row-major and tightly packed.
///
/// Rows never written stay fully transparent.
#[derive(Clone, Debug)]
pub struct RgbaSurface {
    cfg: SurfaceConfig,
    data: Vec<u8>,
    last_row: Option<u32>,
    rows_written: u32,
}

impl RgbaSurface {
    pub fn new(cfg: SurfaceConfig) -> FleetResult<Self> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(FleetError::validation(
                "surface width/height must be non-zero",
            ));
        }
        if !cfg.display_scale.is_finite() || cfg.display_scale <= 0.0 {
            return Err(FleetError::validation(
                "surface display_scale must be finite and > 0",
            ));
        }
        let len = row_byte_len(cfg.width).saturating_mul(cfg.height as usize);
        Ok(Self {
            cfg,
            data: vec![0; len],
            last_row: None,
            rows_written: 0,
        })
    }

    pub fn config(&self) -> SurfaceConfig {
        self.cfg
    }

    pub fn width(&self) -> u32 {
        self.cfg.width
    }

    pub fn height(&self) -> u32 {
        self.cfg.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Borrow row `y`, or `None` past the bottom edge.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.cfg.height {
            return None;
        }
        let stride = row_byte_len(self.cfg.width);
        let start = y as usize * stride;
        self.data.get(start..start + stride)
    }

    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }

    /// SHA-256 of the pixel bytes, lowercase hex.
    pub fn digest(&self) -> String {
        sha2::Sha256::digest(&self.data)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    pub fn to_image(&self) -> FleetResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.cfg.width, self.cfg.height, self.data.clone())
            .ok_or_else(|| FleetError::validation("surface buffer does not match its dimensions"))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> FleetResult<()> {
        let path = path.as_ref();
        image::save_buffer_with_format(
            path,
            &self.data,
            self.cfg.width,
            self.cfg.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| FleetError::Other(anyhow::anyhow!("write png '{}': {e}", path.display())))
    }
}

impl RowSink for RgbaSurface {
    fn write_row(&mut self, y: u32, pixels: &[u8]) -> FleetResult<()> {
        if y >= self.cfg.height {
            return Err(FleetError::validation(format!(
                "row {y} is outside surface of height {}",
                self.cfg.height
            )));
        }
        if let Some(last) = self.last_row
            && y <= last
        {
            return Err(FleetError::validation(format!(
                "row {y} written after row {last}; rows must be strictly increasing"
            )));
        }
        let stride = row_byte_len(self.cfg.width);
        if pixels.len() != stride {
            return Err(FleetError::validation(format!(
                "row {y} has {} bytes, expected {stride}",
                pixels.len()
            )));
        }

        let start = y as usize * stride;
        self.data[start..start + stride].copy_from_slice(pixels);
        self.last_row = Some(y);
        self.rows_written += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/sink.rs"]
mod tests;
