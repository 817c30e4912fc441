//! Module grid → grayscale raster → PNG.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use crate::error::CodeGenerationError;
use crate::symbol::QrSymbol;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

pub(crate) fn rasterize(symbol: &QrSymbol, module_size: u32, quiet_zone: u32) -> GrayImage {
    let modules = symbol.width() as u32;
    let side = (modules + 2 * quiet_zone) * module_size;
    GrayImage::from_fn(side, side, |px, py| {
        let mx = (px / module_size).checked_sub(quiet_zone);
        let my = (py / module_size).checked_sub(quiet_zone);
        match (mx, my) {
            (Some(x), Some(y)) if x < modules && y < modules => {
                if symbol.is_dark(x as usize, y as usize) {
                    DARK
                } else {
                    LIGHT
                }
            }
            _ => LIGHT,
        }
    })
}

pub(crate) fn png(image: &GrayImage) -> Result<Vec<u8>, CodeGenerationError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image.clone())
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CodeGenerationError::Render(e.to_string()))?;
    Ok(out.into_inner())
}
