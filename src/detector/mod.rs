//! Data Matrix region detection
//!
//! Locating a symbol runs in stages, each rejecting most candidates cheaply:
//! - Edge seeding: seed pixels from the scan grid with a strong, consistent gradient
//! - Trail blazing: follow the edge through the gradient field to trace the finder L
//! - Orientation: Hough-fit the two finder legs and decide polarity
//! - Calibration: trace the dashed top and right edges and refine the transform
//! - Size: pick the symbol size whose calibration pattern matches best

/// Scratch cache cells shared by the trail walkers
pub mod cache;
/// Top and right calibration edge alignment
pub mod calibration;
/// Gradient flow measurement and neighbour selection
pub mod flow;
/// Hough line fitting and travel limits along a trail
pub mod hough;
/// Finder L orientation from a continuous trail
pub mod orientation;
/// Shrinking cross enumerator of seed pixels
pub mod scan_grid;
/// Symbol size resolution and module colour sampling
pub mod size;
/// Continuous and gapped trail blazing, follow cursor
pub mod trail;
/// Corner intersection and raw/fitted transforms
pub mod transform;

use crate::error::Result;
use crate::utils::image::ImageView;
use crate::models::{PixelLoc, Region, SizeRequest, SymbolShape};
use cache::{Cache, CacheCell};
use calibration::Edge;

/// Geometric settings of one region search
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScanSettings {
    pub edge_min: Option<i32>,
    pub edge_max: Option<i32>,
    /// Cosine of the allowed deviation from a right angle
    pub square_devn: f64,
    pub size_request: SizeRequest,
    pub edge_threshold: i32,
}

/// Region search state over one (scaled) image
pub struct RegionScanner<'a> {
    image: ImageView<'a>,
    scale: i32,
    width: i32,
    height: i32,
    pub(crate) cache: Cache,
    pub(crate) settings: ScanSettings,
}

impl<'a> RegionScanner<'a> {
    pub(crate) fn new(
        image: ImageView<'a>,
        scale: i32,
        settings: ScanSettings,
        cells: Vec<CacheCell>,
    ) -> Self {
        let width = image.width() as i32 / scale;
        let height = image.height() as i32 / scale;
        Self {
            image,
            scale,
            width,
            height,
            cache: Cache::from_cells(cells, width, height),
            settings,
        }
    }

    /// Scaled width
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Scaled height
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of colour planes in the source image
    pub fn channel_count(&self) -> usize {
        self.image.channel_count()
    }

    /// Whether the source image stores blue first
    pub(crate) fn is_bgr(&self) -> bool {
        self.image.layout().pack.is_bgr()
    }

    /// Release the scratch cache buffer
    pub(crate) fn into_cells(self) -> Vec<CacheCell> {
        self.cache.into_cells()
    }

    /// Channel value at scaled coordinates, `None` outside the image
    pub(crate) fn pixel(&self, x: i32, y: i32, plane: usize) -> Option<i32> {
        self.image
            .get_channel(x * self.scale, y * self.scale, plane)
            .ok()
    }

    pub(crate) fn symbol_shape(&self) -> SymbolShape {
        self.settings.size_request.shape()
    }

    /// Try to grow a complete symbol region from the seed at `loc`.
    ///
    /// Geometric rejections return `Ok(None)`; only broken trail bookkeeping is an error.
    pub fn scan_pixel(&mut self, loc: PixelLoc) -> Result<Option<Region>> {
        match self.cache.get(loc) {
            Some(cell) if cell.is_empty() => {}
            _ => return Ok(None),
        }

        let flow_begin = self.seek_edge(loc);
        if flow_begin.mag < (self.settings.edge_threshold as f64 * 7.65 + 0.5) as i32 {
            return Ok(None);
        }

        let mut reg = Region::default();
        if !self.orientation(&mut reg, flow_begin)? {
            return Ok(None);
        }
        if !self.update_xfrms(&mut reg) {
            return Ok(None);
        }

        for edge in [Edge::Top, Edge::Right] {
            if !self.align_calib_edge(&mut reg, edge)? {
                return Ok(None);
            }
            if !self.update_xfrms(&mut reg) {
                return Ok(None);
            }
        }

        if !self.find_size(&mut reg) {
            return Ok(None);
        }

        tracing::debug!(
            x = loc.x,
            y = loc.y,
            size = ?reg.size,
            polarity = reg.polarity,
            "region located"
        );
        Ok(Some(reg))
    }
}
