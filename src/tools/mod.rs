//! Image file helpers for the command line tool, tests and benches
//!
//! Everything here goes through the `image` crate; the codec itself only ever sees
//! [`PixelBuffer`]s and [`ImageView`](crate::ImageView)s.

use crate::decoder::config;
use crate::encoder::EncodedSymbol;
use crate::error::{DmtxError, Result};
use crate::models::ModuleGrid;
use crate::utils::image::{PackOrder, PixelBuffer, PixelLayout};
use anyhow::{Context, bail};
use image::{GenericImageView, ImageFormat, RgbImage};
use std::path::Path;

/// Load an image file as an RGB24 buffer.
///
/// When `DMTX_MAX_DIM` is set and the longer side exceeds it, the image is downscaled first.
pub fn load_image<P: AsRef<Path>>(path: P) -> anyhow::Result<PixelBuffer> {
    let path = path.as_ref();
    let img = image::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let max_dim = config::max_dim();
    let (width, height) = img.dimensions();
    let rgb = if max_dim > 0 && width.max(height) > max_dim {
        tracing::debug!(width, height, max_dim, "downscaling input image");
        img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_rgb8()
    } else {
        img.to_rgb8()
    };

    let (width, height) = rgb.dimensions();
    let layout = PixelLayout::new(width as usize, height as usize, PackOrder::Rgb24);
    // Stored rows are top first, which is what the bottom-up addressing expects
    let buffer = PixelBuffer::from_raw(rgb.into_raw(), layout)?;
    Ok(buffer)
}

/// Convert any RGB-like or grayscale buffer into an `image` crate RGB image
pub fn to_rgb_image(buffer: &PixelBuffer) -> Result<RgbImage> {
    let pack = buffer.layout().pack;
    let (width, height) = (buffer.width(), buffer.height());
    let mut out = RgbImage::new(width as u32, height as u32);

    for row in 0..height {
        // y == 0 is the bottom row of the picture
        let y = (height - 1 - row) as i32;
        for x in 0..width {
            let pixel = match pack.channel_count() {
                1 => {
                    let v = buffer.get_channel(x as i32, y, 0)? as u8;
                    [v, v, v]
                }
                _ if pack.is_rgb_like() => {
                    let c0 = buffer.get_channel(x as i32, y, 0)? as u8;
                    let c1 = buffer.get_channel(x as i32, y, 1)? as u8;
                    let c2 = buffer.get_channel(x as i32, y, 2)? as u8;
                    if pack.is_bgr() { [c2, c1, c0] } else { [c0, c1, c2] }
                }
                _ => {
                    return Err(DmtxError::InvalidImage(format!(
                        "{pack:?} buffers cannot be converted to RGB"
                    )));
                }
            };
            out.put_pixel(x as u32, row as u32, image::Rgb(pixel));
        }
    }

    Ok(out)
}

/// Write a rendered symbol as PNG or BMP, chosen by the file extension
pub fn save_image<P: AsRef<Path>>(symbol: &EncodedSymbol, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("cannot tell the image format of {}", path.display()))?;
    if !matches!(format, ImageFormat::Png | ImageFormat::Bmp) {
        bail!("unsupported output format {format:?}; use .png or .bmp");
    }

    let rgb = to_rgb_image(&symbol.image)?;
    rgb.save_with_format(path, format)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Terminal dump of a module grid, top row first: `#` for dark modules, `.` for light
pub fn module_grid_ascii(grid: &ModuleGrid) -> String {
    let mut out = String::with_capacity((grid.cols() + 1) * grid.rows());
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            out.push(if grid.get(col, row) { '#' } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{EncodeOptions, encode};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(ext: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before UNIX epoch")
            .as_nanos();
        let sequence = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("rust_dmtx_{nanos}_{sequence}.{ext}"))
    }

    #[test]
    fn test_module_grid_ascii() {
        let mut grid = ModuleGrid::new(3, 2);
        grid.set(0, 0, true);
        grid.set(2, 1, true);
        assert_eq!(module_grid_ascii(&grid), "#..\n..#\n");
    }

    #[test]
    fn test_to_rgb_image_flips_rows() {
        // Stored top row dark, bottom row light
        let data = vec![0u8, 0, 200, 200];
        let buffer = PixelBuffer::from_raw(data, PixelLayout::new(2, 2, PackOrder::K8)).unwrap();
        let rgb = to_rgb_image(&buffer).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(rgb.get_pixel(1, 1).0, [200, 200, 200]);
    }

    #[test]
    fn test_to_rgb_image_swaps_bgr() {
        let data = vec![1u8, 2, 3];
        let buffer = PixelBuffer::from_raw(data, PixelLayout::new(1, 1, PackOrder::Bgr24)).unwrap();
        let rgb = to_rgb_image(&buffer).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [3, 2, 1]);
    }

    #[test]
    fn test_save_and_load_png() {
        let symbol = encode(b"tools", &EncodeOptions::default()).unwrap();
        let path = temp_path("png");
        save_image(&symbol, &path).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.width(), symbol.image.width());
        assert_eq!(loaded.height(), symbol.image.height());
        assert_eq!(loaded.as_bytes(), symbol.image.as_bytes());
    }

    #[test]
    fn test_save_rejects_unknown_extension() {
        let symbol = encode(b"tools", &EncodeOptions::default()).unwrap();
        assert!(save_image(&symbol, temp_path("gif")).is_err());
    }
}
