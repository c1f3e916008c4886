//! Decode orchestration: seed enumeration, region search and message extraction

use std::time::{Duration, Instant};

use crate::decoder::config;
use crate::decoder::message::decode_data_stream;
use crate::decoder::placement::module_placement;
use crate::decoder::reed_solomon::decode_check_errors;
use crate::detector::cache::CacheCell;
use crate::detector::scan_grid::ScanGrid;
use crate::detector::{RegionScanner, ScanSettings};
use crate::error::{DmtxError, Result};
use crate::models::message::MODULE_ON_RGB;
use crate::models::{Message, PixelLoc, Region, SizeRequest, Vector2};
use crate::utils::image::ImageView;

/// Search window in scaled pixel coordinates (inclusive, bottom-up)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    /// Leftmost column
    pub x_min: i32,
    /// Rightmost column
    pub x_max: i32,
    /// Bottom row
    pub y_min: i32,
    /// Top row
    pub y_max: i32,
}

/// Decoder settings
///
/// `Default` picks up the `DMTX_*` environment overrides; the builder methods take precedence
/// over them.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Pixel decimation factor (at least 1)
    pub scale: i32,
    /// Sizes to consider during size resolution
    pub size_request: SizeRequest,
    /// Smallest expected finder edge in scaled pixels
    pub edge_min: Option<i32>,
    /// Largest expected finder edge in scaled pixels
    pub edge_max: Option<i32>,
    /// Smallest seed cross extent visited (at least 1)
    pub scan_gap: i32,
    /// Allowed deviation from a right angle at the corners, in degrees
    pub square_devn_degrees: f64,
    /// Minimum seed edge strength, 1..=100
    pub edge_threshold: i32,
    /// Restrict the seed search to this window
    pub roi: Option<Roi>,
    /// Stop after this many distinct messages
    pub max_results: Option<usize>,
    /// Stop searching after this long
    pub timeout: Option<Duration>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        let timeout_ms = config::timeout_ms();
        let max_results = config::max_results();
        Self {
            scale: 1,
            size_request: SizeRequest::ShapeAuto,
            edge_min: None,
            edge_max: None,
            scan_gap: config::scan_gap() as i32,
            square_devn_degrees: config::square_devn_degrees(),
            edge_threshold: config::edge_threshold() as i32,
            roi: None,
            max_results: (max_results > 0).then_some(max_results),
            timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        }
    }
}

impl DecodeOptions {
    /// Set the decimation factor
    pub fn with_scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the size request
    pub fn with_size_request(mut self, size_request: SizeRequest) -> Self {
        self.size_request = size_request;
        self
    }

    /// Bound the expected finder edge length
    pub fn with_edge_range(mut self, edge_min: Option<i32>, edge_max: Option<i32>) -> Self {
        self.edge_min = edge_min;
        self.edge_max = edge_max;
        self
    }

    /// Set the scan gap
    pub fn with_scan_gap(mut self, scan_gap: i32) -> Self {
        self.scan_gap = scan_gap;
        self
    }

    /// Set the corner squareness tolerance
    pub fn with_square_devn_degrees(mut self, degrees: f64) -> Self {
        self.square_devn_degrees = degrees;
        self
    }

    /// Set the seed edge threshold
    pub fn with_edge_threshold(mut self, threshold: i32) -> Self {
        self.edge_threshold = threshold;
        self
    }

    /// Restrict the search window
    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = Some(roi);
        self
    }

    /// Cap the number of results
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Set the time budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.scale < 1 {
            return Err(DmtxError::InvalidSettings("scale must be at least 1"));
        }
        if self.scan_gap < 1 {
            return Err(DmtxError::InvalidSettings("scan gap must be at least 1"));
        }
        if !(1..=100).contains(&self.edge_threshold) {
            return Err(DmtxError::InvalidSettings("edge threshold must be within 1..=100"));
        }
        // The cosine of the tolerance must lie strictly inside (0, 1)
        if !(self.square_devn_degrees > 0.0 && self.square_devn_degrees < 90.0) {
            return Err(DmtxError::InvalidSettings(
                "square deviation must lie strictly between 0 and 90 degrees",
            ));
        }
        if self.edge_min.is_some_and(|e| e < 0) || self.edge_max.is_some_and(|e| e < 1) {
            return Err(DmtxError::InvalidSettings("edge bounds must be positive"));
        }
        if let (Some(min), Some(max)) = (self.edge_min, self.edge_max) {
            if min > max {
                return Err(DmtxError::InvalidSettings("edge minimum exceeds edge maximum"));
            }
        }
        if self.max_results == Some(0) {
            return Err(DmtxError::InvalidSettings("max results must be at least 1"));
        }
        Ok(())
    }

    fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            edge_min: self.edge_min,
            edge_max: self.edge_max,
            square_devn: self.square_devn_degrees.to_radians().cos(),
            size_request: self.size_request,
            edge_threshold: self.edge_threshold,
        }
    }
}

/// Which decoder runs on each located region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeMode {
    Matrix,
    Mosaic,
}

/// One pass over one image: yields regions and decodes them.
///
/// The session owns a scratch cache with one cell per scaled pixel. Decoded symbols are
/// blanked out of the cache so later seeds inside them are skipped.
pub struct DecodeSession<'a> {
    scanner: RegionScanner<'a>,
    grid: ScanGrid,
    options: DecodeOptions,
}

impl<'a> DecodeSession<'a> {
    /// Validate `options` against `image` and prepare the seed grid
    pub fn new(image: ImageView<'a>, options: &DecodeOptions) -> Result<Self> {
        Self::with_cells(image, options, Vec::new())
    }

    pub(crate) fn with_cells(
        image: ImageView<'a>,
        options: &DecodeOptions,
        cells: Vec<CacheCell>,
    ) -> Result<Self> {
        options.validate()?;

        let scanner = RegionScanner::new(image, options.scale, options.scan_settings(), cells);
        let (width, height) = (scanner.width(), scanner.height());
        if width < 2 || height < 2 {
            return Err(DmtxError::InvalidSettings("scaled image is too small to search"));
        }

        let roi = options.roi.unwrap_or(Roi {
            x_min: 0,
            x_max: width - 1,
            y_min: 0,
            y_max: height - 1,
        });
        if roi.x_min < 0 || roi.y_min < 0 || roi.x_max >= width || roi.y_max >= height {
            return Err(DmtxError::InvalidSettings("search window exceeds the scaled image"));
        }
        if roi.x_min > roi.x_max || roi.y_min > roi.y_max {
            return Err(DmtxError::InvalidSettings("search window is inverted"));
        }
        let grid = ScanGrid::new(roi.x_min, roi.x_max, roi.y_min, roi.y_max, options.scan_gap)?;

        tracing::debug!(
            width,
            height,
            scale = options.scale,
            scan_gap = options.scan_gap,
            "decode session ready"
        );
        Ok(Self {
            scanner,
            grid,
            options: options.clone(),
        })
    }

    /// Settings this session runs with
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Advance through the seed grid until a region is located, the grid is exhausted or
    /// `deadline` passes
    pub fn find_next_region(&mut self, deadline: Option<Instant>) -> Result<Option<Region>> {
        for loc in self.grid.by_ref() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::debug!("decode deadline reached");
                return Ok(None);
            }
            if let Some(reg) = self.scanner.scan_pixel(loc)? {
                return Ok(Some(reg));
            }
        }
        Ok(None)
    }

    /// Decode `reg` as a single symbol from colour plane 0.
    ///
    /// Returns `None` when the codewords are beyond repair or the data stream is malformed.
    pub fn matrix_region(&mut self, reg: &Region) -> Result<Option<Vec<u8>>> {
        self.decode_planes(reg, &[0])
    }

    /// Decode `reg` as a colour mosaic, concatenating the red, green and blue layers
    pub fn mosaic_region(&mut self, reg: &Region) -> Result<Option<Vec<u8>>> {
        if self.scanner.channel_count() < 3 {
            return Err(DmtxError::InvalidSettings(
                "mosaic decoding needs a three channel image",
            ));
        }
        let planes = if self.scanner.is_bgr() {
            [2, 1, 0]
        } else {
            [0, 1, 2]
        };
        self.decode_planes(reg, &planes)
    }

    /// Locate and decode every symbol, in seed order, without duplicates
    pub(crate) fn decode_all(&mut self, mode: DecodeMode) -> Result<Vec<Vec<u8>>> {
        let deadline = self.options.timeout.map(|t| Instant::now() + t);
        let max_results = self.options.max_results.unwrap_or(usize::MAX);
        let mut results: Vec<Vec<u8>> = Vec::new();

        while let Some(reg) = self.find_next_region(deadline)? {
            let decoded = match mode {
                DecodeMode::Matrix => self.matrix_region(&reg)?,
                DecodeMode::Mosaic => self.mosaic_region(&reg)?,
            };
            let Some(bytes) = decoded else {
                continue;
            };
            if results.contains(&bytes) {
                tracing::trace!("duplicate message dropped");
                continue;
            }
            results.push(bytes);
            if results.len() >= max_results {
                break;
            }
        }

        Ok(results)
    }

    /// Release the scratch cache for reuse
    pub(crate) fn into_cells(self) -> Vec<CacheCell> {
        self.scanner.into_cells()
    }

    fn decode_planes(&mut self, reg: &Region, planes: &[usize]) -> Result<Option<Vec<u8>>> {
        let size = reg
            .size
            .ok_or_else(|| DmtxError::internal("region reached decoding without a size"))?;

        let mut output = Vec::new();
        for (layer, &plane) in planes.iter().enumerate() {
            let mut msg = Message::new(size);
            self.scanner.populate_array(reg, plane, &mut msg)?;
            module_placement(&mut msg.array, &mut msg.code, size, MODULE_ON_RGB)?;

            match decode_check_errors(&mut msg.code, size) {
                Ok(_) => {}
                Err(DmtxError::Uncorrectable) => {
                    tracing::warn!(%size, plane, "region skipped: codewords beyond repair");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }

            if layer == 0 {
                self.blank_region(reg)?;
            }

            if !decode_data_stream(&mut msg) {
                tracing::warn!(%size, plane, "region skipped: malformed data stream");
                return Ok(None);
            }
            output.extend_from_slice(&msg.output);
        }

        Ok(Some(output))
    }

    /// Mark the symbol area (with a tenth of a symbol of slack) as visited
    fn blank_region(&mut self, reg: &Region) -> Result<()> {
        let mut quad = [PixelLoc::default(); 4];
        let corners = [(-0.1, -0.1), (1.1, -0.1), (1.1, 1.1), (-0.1, 1.1)];
        for (slot, (x, y)) in quad.iter_mut().zip(corners) {
            match reg.fit2raw.apply(Vector2::new(x, y)) {
                Some(p) => *slot = p.to_pixel(),
                None => return Ok(()),
            }
        }
        self.scanner.cache.fill_quad(quad)
    }
}
