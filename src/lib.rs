//! rust_dmtx - Data Matrix (ECC200) encoding and decoding
//!
//! Decoding finds symbols in raw pixel buffers by following image gradients along the solid
//! finder edges, so no binarisation pass is needed. Encoding produces codewords, a module
//! grid or a rendered pixel buffer.
//!
//! ```no_run
//! use rust_dmtx::{DecodeOptions, EncodeOptions, decode, encode};
//!
//! let symbol = encode(b"Hello", &EncodeOptions::default()).unwrap();
//! let found = decode(&symbol.image.view(), &DecodeOptions::default()).unwrap();
//! assert_eq!(found, vec![b"Hello".to_vec()]);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

mod debug;
/// Codeword-level decoding: module placement, Reed-Solomon and compaction schemes
pub mod decoder;
/// Symbol region detection (edge following, orientation, calibration, size)
pub mod detector;
/// Encoding: compaction, symbol completion and rendering
pub mod encoder;
/// Error type
pub mod error;
/// Core data structures (symbol sizes, regions, messages, module grids)
pub mod models;
/// Decode orchestration over one image
pub mod pipeline;
/// Image file helpers shared by the command line tool and tests
pub mod tools;
/// Pixel access, geometry and scratch buffer pooling
pub mod utils;

pub use encoder::{
    EncodeOptions, EncodedSymbol, Scheme, encode, encode_codewords, encode_modules, encode_mosaic,
};
pub use error::{DmtxError, Result};
pub use models::{ModuleGrid, Region, SizeRequest, SymbolShape, SymbolSize};
pub use pipeline::{DecodeOptions, DecodeSession, Roi};
pub use utils::image::{ImageView, PackOrder, PixelBuffer, PixelLayout, Rgb};

use pipeline::DecodeMode;
use rayon::prelude::*;
use utils::memory_pool::CachePool;

/// Decode every Data Matrix symbol in `image`.
///
/// Messages come back in the order their symbols were found, without duplicates. Symbols
/// whose codewords cannot be corrected are skipped.
pub fn decode(image: &ImageView<'_>, options: &DecodeOptions) -> Result<Vec<Vec<u8>>> {
    run_decode(image, options, DecodeMode::Matrix, None)
}

/// Decode every Data Mosaic symbol in `image`; each message is the red, green and blue
/// layers concatenated.
pub fn decode_mosaic(image: &ImageView<'_>, options: &DecodeOptions) -> Result<Vec<Vec<u8>>> {
    run_decode(image, options, DecodeMode::Mosaic, None)
}

fn run_decode(
    image: &ImageView<'_>,
    options: &DecodeOptions,
    mode: DecodeMode,
    mut pool: Option<&mut CachePool>,
) -> Result<Vec<Vec<u8>>> {
    let _span = tracing::info_span!(
        "decode",
        width = image.width(),
        height = image.height(),
        mosaic = mode == DecodeMode::Mosaic
    )
    .entered();

    let scale = options.scale.max(1) as usize;
    let cells = (image.width() / scale) * (image.height() / scale);
    let buffer = pool
        .as_deref_mut()
        .map(|pool| pool.take(cells))
        .unwrap_or_default();

    let mut session = DecodeSession::with_cells(*image, options, buffer)?;
    let results = session.decode_all(mode);
    if let Some(pool) = pool {
        pool.give_back(session.into_cells());
    }

    let results = results?;
    tracing::debug!(found = results.len(), "decode finished");
    Ok(results)
}

/// Decoder with fixed settings and an optional scratch buffer pool
pub struct Detector {
    /// Optional scratch cache pool for repeated decodes
    pool: Option<CachePool>,
    options: DecodeOptions,
}

impl Detector {
    /// Create a detector with default settings
    pub fn new() -> Self {
        Self {
            pool: None,
            options: DecodeOptions::default(),
        }
    }

    /// Create a detector that reuses its scratch cache between decodes
    pub fn with_pool() -> Self {
        Self {
            pool: Some(CachePool::new()),
            options: DecodeOptions::default(),
        }
    }

    /// Replace the decode settings
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Settings used by every decode
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode Data Matrix symbols in `image`
    pub fn decode(&mut self, image: &ImageView<'_>) -> Result<Vec<Vec<u8>>> {
        run_decode(image, &self.options, DecodeMode::Matrix, self.pool.as_mut())
    }

    /// Decode Data Mosaic symbols in `image`
    pub fn decode_mosaic(&mut self, image: &ImageView<'_>) -> Result<Vec<Vec<u8>>> {
        run_decode(image, &self.options, DecodeMode::Mosaic, self.pool.as_mut())
    }

    /// Decode independent images in parallel, one session per image
    pub fn decode_batch(&self, images: &[ImageView<'_>]) -> Vec<Result<Vec<Vec<u8>>>> {
        images
            .par_iter()
            .map_init(
                || CachePool::with_capacity(0),
                |pool, image| run_decode(image, &self.options, DecodeMode::Matrix, Some(pool)),
            )
            .collect()
    }

    /// Drop idle buffers held by the pool
    pub fn clear_pool(&mut self) {
        if let Some(pool) = &mut self.pool {
            pool.clear();
        }
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_blank_image() {
        let data = vec![255u8; 40 * 40 * 3];
        let image = ImageView::new(&data, PixelLayout::new(40, 40, PackOrder::Rgb24)).unwrap();
        assert!(decode(&image, &DecodeOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_detector_pool_reused() {
        let data = vec![255u8; 40 * 40];
        let image = ImageView::new(&data, PixelLayout::new(40, 40, PackOrder::K8)).unwrap();
        let mut detector = Detector::with_pool();
        assert!(detector.decode(&image).unwrap().is_empty());
        assert!(detector.decode(&image).unwrap().is_empty());
        detector.clear_pool();
    }

    #[test]
    fn test_invalid_options_surface() {
        let data = vec![255u8; 40 * 40];
        let image = ImageView::new(&data, PixelLayout::new(40, 40, PackOrder::K8)).unwrap();
        let options = DecodeOptions::default().with_edge_threshold(0);
        assert!(matches!(
            decode(&image, &options),
            Err(DmtxError::InvalidSettings(_))
        ));
    }
}
