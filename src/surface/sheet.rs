use image::{Rgba, RgbaImage, imageops};

use crate::foundation::error::{FleetError, FleetResult};
use crate::surface::sink::RgbaSurface;

/// Background of the sheet and of tiles whose job produced no surface.
const SHEET_BG: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Tile job surfaces into one image, `columns` per row, each scaled by its display scale.
///
/// `tiles` is in job order; `None` entries (failed initialization) leave a blank tile. Every
/// tile slot is `tile_size * display_scale` pixels square.
pub fn contact_sheet(
    tiles: &[Option<&RgbaSurface>],
    columns: u32,
    tile_size: u32,
    display_scale: f32,
) -> FleetResult<RgbaImage> {
    if columns == 0 {
        return Err(FleetError::validation("contact sheet columns must be >= 1"));
    }
    if !display_scale.is_finite() || display_scale <= 0.0 {
        return Err(FleetError::validation(
            "contact sheet display_scale must be finite and > 0",
        ));
    }
    if tiles.is_empty() {
        return Err(FleetError::validation("contact sheet needs at least one tile"));
    }

    let slot = scaled(tile_size, display_scale);
    let count = tiles.len() as u32;
    let cols = columns.min(count);
    let rows = count.div_ceil(cols);
    let mut sheet = RgbaImage::from_pixel(cols * slot, rows * slot, SHEET_BG);

    for (i, tile) in tiles.iter().enumerate() {
        let Some(surface) = tile else {
            continue;
        };
        let img = surface.to_image()?;
        let w = scaled(surface.width(), display_scale).min(slot);
        let h = scaled(surface.height(), display_scale).min(slot);
        let tile_img = if (w, h) == (surface.width(), surface.height()) {
            img
        } else {
            imageops::resize(&img, w, h, imageops::FilterType::Triangle)
        };

        let i = i as u32;
        let x = (i % cols) * slot;
        let y = (i / cols) * slot;
        imageops::replace(&mut sheet, &tile_img, i64::from(x), i64::from(y));
    }

    Ok(sheet)
}

fn scaled(px: u32, scale: f32) -> u32 {
    ((px as f32 * scale).round() as u32).max(1)
}
