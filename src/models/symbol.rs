//! ECC200 symbol size attribute table.
//!
//! Every geometric and codeword dimension of a symbol derives from its size index through the
//! static tables below. Indices 0..24 are square sizes, 24..30 rectangular.

use crate::error::DmtxError;
use std::fmt;
use std::str::FromStr;

const SYMBOL_ROWS: [u16; 30] = [
    10, 12, 14, 16, 18, 20, 22, 24, 26, 32, 36, 40, 44, 48, 52, 64, 72, 80, 88, 96, 104, 120, 132,
    144, 8, 8, 12, 12, 16, 16,
];

const SYMBOL_COLS: [u16; 30] = [
    10, 12, 14, 16, 18, 20, 22, 24, 26, 32, 36, 40, 44, 48, 52, 64, 72, 80, 88, 96, 104, 120, 132,
    144, 18, 32, 26, 36, 36, 48,
];

const DATA_REGION_ROWS: [u16; 30] = [
    8, 10, 12, 14, 16, 18, 20, 22, 24, 14, 16, 18, 20, 22, 24, 14, 16, 18, 20, 22, 24, 18, 20, 22,
    6, 6, 10, 10, 14, 14,
];

const DATA_REGION_COLS: [u16; 30] = [
    8, 10, 12, 14, 16, 18, 20, 22, 24, 14, 16, 18, 20, 22, 24, 14, 16, 18, 20, 22, 24, 18, 20, 22,
    16, 14, 24, 16, 16, 22,
];

const HORIZ_DATA_REGIONS: [u16; 30] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 4, 4, 4, 4, 4, 4, 6, 6, 6, 1, 2, 1, 2, 2, 2,
];

const INTERLEAVED_BLOCKS: [u16; 30] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 4, 4, 4, 4, 6, 6, 8, 10, 1, 1, 1, 1, 1, 1,
];

const SYMBOL_DATA_WORDS: [u16; 30] = [
    3, 5, 8, 12, 18, 22, 30, 36, 44, 62, 86, 114, 144, 174, 204, 280, 368, 456, 576, 696, 816,
    1050, 1304, 1558, 5, 10, 16, 22, 32, 49,
];

const BLOCK_ERROR_WORDS: [u16; 30] = [
    5, 7, 10, 12, 14, 18, 20, 24, 28, 36, 42, 48, 56, 68, 42, 56, 36, 48, 56, 68, 56, 68, 62, 62,
    7, 11, 14, 18, 24, 28,
];

const BLOCK_MAX_CORRECTABLE: [u16; 30] = [
    2, 3, 5, 6, 7, 9, 10, 12, 14, 18, 21, 24, 28, 34, 21, 28, 18, 24, 28, 34, 28, 34, 31, 31, 3,
    5, 7, 9, 12, 14,
];

/// Number of square sizes at the start of the table.
const SQUARE_COUNT: u8 = 24;

/// One of the 30 standard ECC200 symbol sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolSize(u8);

impl SymbolSize {
    /// Total number of sizes.
    pub const COUNT: usize = 30;
    /// Smallest square symbol.
    pub const SQUARE_10X10: SymbolSize = SymbolSize(0);
    /// Largest square symbol.
    pub const SQUARE_144X144: SymbolSize = SymbolSize(23);
    /// Smallest rectangular symbol.
    pub const RECT_8X18: SymbolSize = SymbolSize(24);
    /// Largest rectangular symbol.
    pub const RECT_16X48: SymbolSize = SymbolSize(29);

    /// Size from its table index.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::COUNT).then_some(SymbolSize(index as u8))
    }

    /// Size from symbol dimensions, e.g. `(16, 48)`.
    pub fn from_dimensions(rows: usize, cols: usize) -> Option<Self> {
        Self::all().find(|s| s.rows() == rows && s.cols() == cols)
    }

    /// All sizes in table order.
    pub fn all() -> impl Iterator<Item = SymbolSize> {
        (0..Self::COUNT as u8).map(SymbolSize)
    }

    /// Square sizes in ascending capacity.
    pub fn squares() -> impl Iterator<Item = SymbolSize> {
        (0..SQUARE_COUNT).map(SymbolSize)
    }

    /// Rectangular sizes in ascending capacity.
    pub fn rectangles() -> impl Iterator<Item = SymbolSize> {
        (SQUARE_COUNT..Self::COUNT as u8).map(SymbolSize)
    }

    /// Table index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// True for the 24 square sizes.
    pub fn is_square(self) -> bool {
        self.0 < SQUARE_COUNT
    }

    /// Module rows including the finder and calibration border.
    pub fn rows(self) -> usize {
        SYMBOL_ROWS[self.index()] as usize
    }

    /// Module columns including the finder and calibration border.
    pub fn cols(self) -> usize {
        SYMBOL_COLS[self.index()] as usize
    }

    /// Rows of one data region.
    pub fn data_region_rows(self) -> usize {
        DATA_REGION_ROWS[self.index()] as usize
    }

    /// Columns of one data region.
    pub fn data_region_cols(self) -> usize {
        DATA_REGION_COLS[self.index()] as usize
    }

    /// Data regions across the symbol.
    pub fn horiz_data_regions(self) -> usize {
        HORIZ_DATA_REGIONS[self.index()] as usize
    }

    /// Data regions down the symbol. Rectangles always have one.
    pub fn vert_data_regions(self) -> usize {
        if self.is_square() {
            self.horiz_data_regions()
        } else {
            1
        }
    }

    /// Rows of the mapping matrix (data modules only).
    pub fn mapping_rows(self) -> usize {
        self.data_region_rows() * self.vert_data_regions()
    }

    /// Columns of the mapping matrix (data modules only).
    pub fn mapping_cols(self) -> usize {
        self.data_region_cols() * self.horiz_data_regions()
    }

    /// Number of interleaved Reed-Solomon blocks.
    pub fn interleaved_blocks(self) -> usize {
        INTERLEAVED_BLOCKS[self.index()] as usize
    }

    /// Data codewords of the whole symbol.
    pub fn data_words(self) -> usize {
        SYMBOL_DATA_WORDS[self.index()] as usize
    }

    /// Error codewords per interleaved block.
    pub fn block_error_words(self) -> usize {
        BLOCK_ERROR_WORDS[self.index()] as usize
    }

    /// Error codewords of the whole symbol.
    pub fn error_words(self) -> usize {
        self.block_error_words() * self.interleaved_blocks()
    }

    /// Codewords a single block can repair.
    pub fn block_max_correctable(self) -> usize {
        BLOCK_MAX_CORRECTABLE[self.index()] as usize
    }

    /// Data codewords carried by one interleaved block.
    ///
    /// The 144x144 symbol splits 1558 words over 10 blocks, so its first eight blocks carry
    /// one extra word.
    pub fn block_data_words(self, block: usize) -> usize {
        let base = self.data_words() / self.interleaved_blocks();
        if self == SymbolSize::SQUARE_144X144 && block < 8 {
            base + 1
        } else {
            base
        }
    }

    /// Data plus error codewords.
    pub fn total_words(self) -> usize {
        self.data_words() + self.error_words()
    }
}

impl fmt::Display for SymbolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows(), self.cols())
    }
}

/// Requested symbol size: a fixed size or an automatic choice within a shape class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum SizeRequest {
    /// Any shape (decode default).
    ShapeAuto,
    /// Smallest square size that fits (encode default).
    #[default]
    SquareAuto,
    /// Smallest rectangular size that fits.
    RectAuto,
    /// Exactly this size.
    Fixed(SymbolSize),
}

impl SizeRequest {
    /// Candidate sizes for this request, in ascending capacity.
    pub fn candidates(self) -> Vec<SymbolSize> {
        match self {
            SizeRequest::ShapeAuto => SymbolSize::all().collect(),
            SizeRequest::SquareAuto => SymbolSize::squares().collect(),
            SizeRequest::RectAuto => SymbolSize::rectangles().collect(),
            SizeRequest::Fixed(size) => vec![size],
        }
    }

    /// Shape class implied by the request.
    pub fn shape(self) -> SymbolShape {
        match self {
            SizeRequest::ShapeAuto => SymbolShape::Any,
            SizeRequest::SquareAuto => SymbolShape::Square,
            SizeRequest::RectAuto => SymbolShape::Rect,
            SizeRequest::Fixed(size) if size.is_square() => SymbolShape::Square,
            SizeRequest::Fixed(_) => SymbolShape::Rect,
        }
    }
}

/// Parses `auto`, `square`, `rect` or a fixed `ROWSxCOLS` such as `16x48`
impl FromStr for SizeRequest {
    type Err = DmtxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "auto" | "shape" => return Ok(SizeRequest::ShapeAuto),
            "square" | "s" => return Ok(SizeRequest::SquareAuto),
            "rect" | "r" => return Ok(SizeRequest::RectAuto),
            _ => {}
        }
        let (rows, cols) = s
            .split_once('x')
            .ok_or(DmtxError::InvalidSettings("unknown symbol size"))?;
        let rows = rows.parse::<usize>();
        let cols = cols.parse::<usize>();
        match (rows, cols) {
            (Ok(rows), Ok(cols)) => SymbolSize::from_dimensions(rows, cols)
                .map(SizeRequest::Fixed)
                .ok_or(DmtxError::InvalidSettings("unknown symbol size")),
            _ => Err(DmtxError::InvalidSettings("unknown symbol size")),
        }
    }
}

/// Shape class of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolShape {
    /// Square or rectangular
    Any,
    /// Square only
    Square,
    /// Rectangular only
    Rect,
}

/// Smallest size satisfying `request` that holds `data_words` codewords.
///
/// Returns `None` (the "shape auto" answer) when no permitted size is large enough, including
/// a fixed size that is too small. `ShapeAuto` searches squares first, matching encoder
/// behaviour where the square class is the default.
pub fn find_correct_symbol_size(data_words: usize, request: SizeRequest) -> Option<SymbolSize> {
    if data_words == 0 {
        return None;
    }
    match request {
        SizeRequest::Fixed(size) => (size.data_words() >= data_words).then_some(size),
        SizeRequest::ShapeAuto => find_correct_symbol_size(data_words, SizeRequest::SquareAuto)
            .or_else(|| find_correct_symbol_size(data_words, SizeRequest::RectAuto)),
        _ => request
            .candidates()
            .into_iter()
            .find(|s| s.data_words() >= data_words),
    }
}
