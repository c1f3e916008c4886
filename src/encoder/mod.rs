//! Data Matrix encoder
//!
//! Encoding runs in three stages:
//! 1. Compaction: input bytes become data codewords in one scheme (or the shortest mix of
//!    schemes for [`Scheme::AutoBest`]), see [`channel`]
//! 2. Symbol completion: size selection, pad codewords and Reed-Solomon error words
//! 3. Layout: module placement into the mapping matrix and rendering into a pixel buffer

mod ascii;
mod auto;
mod base256;
pub mod channel;
mod edifact;
mod triplet;

use std::fmt;
use std::str::FromStr;

use crate::decoder::modes::{
    LATCH_BASE256, LATCH_C40, LATCH_EDIFACT, LATCH_TEXT, LATCH_X12, PAD,
};
use crate::decoder::placement::module_placement;
use crate::decoder::reed_solomon::generate_ecc;
use crate::error::{DmtxError, Result};
use crate::models::message::{
    MODULE_ASSIGNED, MODULE_ON_BLUE, MODULE_ON_GREEN, MODULE_ON_RED, MODULE_ON_RGB,
    MODULE_VISITED,
};
use crate::models::{Message, ModuleGrid, SizeRequest, SymbolSize, find_correct_symbol_size};
use crate::utils::image::{PackOrder, PixelBuffer, PixelLayout, Rgb};
use channel::{Channel, ChannelStatus};

/// Codeword compaction scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// One byte per codeword, digit pairs packed into one
    #[default]
    Ascii,
    /// Upper case and digits, three values per two codewords
    C40,
    /// Lower case and digits, three values per two codewords
    Text,
    /// ANSI X12 EDI subset, three values per two codewords
    X12,
    /// ASCII 32..=94, four values per three codewords
    Edifact,
    /// Raw bytes with a length prefix
    Base256,
    /// Shortest mix of all schemes (encoder only)
    AutoBest,
    /// ASCII with a leading FNC1; GS in the input becomes FNC1 (encoder only)
    AsciiGs1,
}

impl Scheme {
    /// Schemes a channel can be in while compacting
    pub(crate) const CONCRETE: [Scheme; 6] = [
        Scheme::Ascii,
        Scheme::C40,
        Scheme::Text,
        Scheme::X12,
        Scheme::Edifact,
        Scheme::Base256,
    ];

    /// Scheme selected by a latch codeword, `Ascii` for anything that is not a latch
    pub fn from_latch(codeword: u8) -> Scheme {
        match codeword {
            LATCH_C40 => Scheme::C40,
            LATCH_BASE256 => Scheme::Base256,
            LATCH_EDIFACT => Scheme::Edifact,
            LATCH_TEXT => Scheme::Text,
            LATCH_X12 => Scheme::X12,
            _ => Scheme::Ascii,
        }
    }

    /// Latch codeword switching from ASCII into this scheme
    pub fn latch(self) -> Option<u8> {
        match self {
            Scheme::C40 => Some(LATCH_C40),
            Scheme::Text => Some(LATCH_TEXT),
            Scheme::X12 => Some(LATCH_X12),
            Scheme::Edifact => Some(LATCH_EDIFACT),
            Scheme::Base256 => Some(LATCH_BASE256),
            _ => None,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scheme::Ascii => "ascii",
            Scheme::C40 => "c40",
            Scheme::Text => "text",
            Scheme::X12 => "x12",
            Scheme::Edifact => "edifact",
            Scheme::Base256 => "base256",
            Scheme::AutoBest => "auto",
            Scheme::AsciiGs1 => "gs1",
        };
        f.write_str(name)
    }
}

impl FromStr for Scheme {
    type Err = DmtxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" | "a" => Ok(Scheme::Ascii),
            "c40" | "c" => Ok(Scheme::C40),
            "text" | "t" => Ok(Scheme::Text),
            "x12" | "x" => Ok(Scheme::X12),
            "edifact" | "e" => Ok(Scheme::Edifact),
            "base256" | "8" => Ok(Scheme::Base256),
            "auto" | "b" => Ok(Scheme::AutoBest),
            "gs1" | "f" => Ok(Scheme::AsciiGs1),
            _ => Err(DmtxError::InvalidSettings("unknown compaction scheme")),
        }
    }
}

/// Encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Compaction scheme
    pub scheme: Scheme,
    /// Symbol size or shape class
    pub size_request: SizeRequest,
    /// Pixels per module edge (at least 1)
    pub module_size: usize,
    /// Quiet zone in pixels around the symbol
    pub margin: usize,
    /// Pixel packing of the output buffer
    pub pack: PackOrder,
    /// Foreground and background colours; black on white when `None`
    pub colors: Option<(Rgb, Rgb)>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            scheme: Scheme::Ascii,
            size_request: SizeRequest::SquareAuto,
            module_size: 5,
            margin: 10,
            pack: PackOrder::Rgb24,
            colors: None,
        }
    }
}

impl EncodeOptions {
    /// Set the compaction scheme
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Set the symbol size request
    pub fn with_size_request(mut self, size_request: SizeRequest) -> Self {
        self.size_request = size_request;
        self
    }

    /// Set the module size and quiet zone, both in pixels
    pub fn with_module_size(mut self, module_size: usize, margin: usize) -> Self {
        self.module_size = module_size;
        self.margin = margin;
        self
    }

    /// Set the output pixel packing
    pub fn with_pack(mut self, pack: PackOrder) -> Self {
        self.pack = pack;
        self
    }

    /// Set foreground and background colours
    pub fn with_colors(mut self, foreground: Rgb, background: Rgb) -> Self {
        self.colors = Some((foreground, background));
        self
    }

    fn validate(&self) -> Result<()> {
        if self.module_size == 0 {
            return Err(DmtxError::InvalidSettings("module size must be at least 1"));
        }
        if !self.pack.is_rgb_like() {
            return Err(DmtxError::InvalidSettings(
                "encoder cannot paint YCbCr or CMYK buffers",
            ));
        }
        Ok(())
    }
}

/// A rendered symbol
#[derive(Debug, Clone)]
pub struct EncodedSymbol {
    /// Symbol size chosen
    pub size: SymbolSize,
    /// Module rows including finder and calibration patterns
    pub rows: usize,
    /// Module columns including finder and calibration patterns
    pub cols: usize,
    /// Complete codeword sequence (data, pads, error words). Mosaic symbols hold the red,
    /// green and blue layers back to back.
    pub codewords: Vec<u8>,
    /// Rendered pixels, `2 * margin + cols * module_size` wide
    pub image: PixelBuffer,
}

/// Encode `data` into a rendered symbol.
pub fn encode(data: &[u8], options: &EncodeOptions) -> Result<EncodedSymbol> {
    options.validate()?;
    let _span = tracing::info_span!("encode", bytes = data.len(), scheme = %options.scheme)
        .entered();

    let (size, codewords) = encode_codewords(data, options.scheme, options.size_request)?;
    let msg = place_layers(size, &[(codewords.as_slice(), MODULE_ON_RGB)])?;
    let image = render(&msg, options)?;

    tracing::debug!(%size, codewords = codewords.len(), "symbol encoded");
    Ok(EncodedSymbol {
        size,
        rows: size.rows(),
        cols: size.cols(),
        codewords,
        image,
    })
}

/// Encode `data` into a colour mosaic: the input is split in three and each third is placed
/// in its own colour plane of one symbol.
pub fn encode_mosaic(data: &[u8], options: &EncodeOptions) -> Result<EncodedSymbol> {
    options.validate()?;
    if options.pack.channel_count() < 3 {
        return Err(DmtxError::InvalidSettings(
            "mosaic needs a three channel pixel packing",
        ));
    }
    if data.is_empty() {
        return Err(DmtxError::InvalidSettings("nothing to encode"));
    }
    let _span = tracing::info_span!("encode_mosaic", bytes = data.len()).entered();

    let third = data.len().div_ceil(3);
    let (red, rest) = data.split_at(third);
    let (green, blue) = rest.split_at(third.min(rest.len()));

    let first = find_correct_symbol_size(third, options.size_request)
        .ok_or(DmtxError::CapacityExceeded { words: third })?;
    let candidates: Vec<SymbolSize> = options
        .size_request
        .candidates()
        .into_iter()
        .skip_while(|&size| size != first)
        .collect();

    for size in candidates {
        let request = SizeRequest::Fixed(size);
        let layers = [red, green, blue]
            .into_iter()
            .map(|layer| complete_symbol(layer, options.scheme, request))
            .collect::<Result<Vec<_>>>();
        let layers = match layers {
            Ok(layers) => layers,
            Err(DmtxError::CapacityExceeded { .. }) => continue,
            Err(e) => return Err(e),
        };
        let msg = place_layers(
            size,
            &[
                (layers[0].1.as_slice(), MODULE_ON_RED),
                (layers[1].1.as_slice(), MODULE_ON_GREEN),
                (layers[2].1.as_slice(), MODULE_ON_BLUE),
            ],
        )?;
        let image = render(&msg, options)?;
        let codewords = layers.into_iter().flat_map(|(_, words)| words).collect();

        tracing::debug!(%size, "mosaic encoded");
        return Ok(EncodedSymbol {
            size,
            rows: size.rows(),
            cols: size.cols(),
            codewords,
            image,
        });
    }

    Err(DmtxError::CapacityExceeded { words: third })
}

/// Encode `data` and return its modules, row 0 at the top. No pixels are rendered.
pub fn encode_modules(data: &[u8], options: &EncodeOptions) -> Result<ModuleGrid> {
    let (size, codewords) = encode_codewords(data, options.scheme, options.size_request)?;
    let msg = place_layers(size, &[(codewords.as_slice(), MODULE_ON_RGB)])?;

    let rows = size.rows();
    let cols = size.cols();
    let mut grid = ModuleGrid::new(cols, rows);
    for symbol_row in 0..rows {
        for col in 0..cols {
            let on = msg.symbol_module_status(symbol_row, col) & MODULE_ON_RGB != 0;
            grid.set(col, rows - 1 - symbol_row, on);
        }
    }
    Ok(grid)
}

/// Compact `data`, choose the symbol size and append pads and error words.
///
/// Returns the size and all `size.total_words()` codewords.
pub fn encode_codewords(
    data: &[u8],
    scheme: Scheme,
    size_request: SizeRequest,
) -> Result<(SymbolSize, Vec<u8>)> {
    if data.is_empty() {
        return Err(DmtxError::InvalidSettings("nothing to encode"));
    }
    complete_symbol(data, scheme, size_request)
}

/// Compaction plus symbol completion; empty input yields a symbol of pads only
fn complete_symbol(
    data: &[u8],
    scheme: Scheme,
    size_request: SizeRequest,
) -> Result<(SymbolSize, Vec<u8>)> {
    let mut words = compact(data, scheme, size_request)?;
    let size = find_correct_symbol_size(words.len().max(1), size_request)
        .ok_or(DmtxError::CapacityExceeded { words: words.len() })?;

    add_pad_chars(&mut words, size.data_words());
    words.resize(size.total_words(), 0);
    generate_ecc(&mut words, size)?;
    Ok((size, words))
}

/// Data codewords for `data`, without pads
fn compact(data: &[u8], scheme: Scheme, size_request: SizeRequest) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(match scheme {
            Scheme::AsciiGs1 => vec![crate::decoder::modes::FNC1],
            _ => Vec::new(),
        });
    }
    let words = match scheme {
        Scheme::AutoBest => auto::encode_auto_best(data, size_request)?,
        _ => encode_single_scheme(data, scheme, size_request)?,
    };
    tracing::trace!(%scheme, input = data.len(), words = words.len(), "compacted");
    Ok(words)
}

/// Compact all of `data` in one scheme, failing on the first byte it cannot represent
fn encode_single_scheme(
    data: &[u8],
    scheme: Scheme,
    size_request: SizeRequest,
) -> Result<Vec<u8>> {
    let (target, mut channel) = match scheme {
        Scheme::AsciiGs1 => (Scheme::Ascii, Channel::new_gs1(data, size_request)?),
        _ => (scheme, Channel::new(data, size_request)),
    };

    while !channel.is_complete() {
        channel.encode_next_word(target)?;
        match channel.status {
            ChannelStatus::Valid => {}
            ChannelStatus::UnsupportedChar => {
                return Err(DmtxError::UnsupportedChar {
                    scheme,
                    value: channel.rejected.unwrap_or_default(),
                });
            }
            ChannelStatus::CannotUnlatch => return Err(DmtxError::CannotUnlatch),
        }
    }

    Ok(channel.codewords().to_vec())
}

/// Pseudo-random pad value for 1-based codeword position `position`
fn randomize_253_state(value: u8, position: usize) -> u8 {
    let tmp = value as usize + (149 * position) % 253 + 1;
    (if tmp <= 254 { tmp } else { tmp - 254 }) as u8
}

/// Fill `words` up to `data_words` with one plain pad followed by randomised pads
fn add_pad_chars(words: &mut Vec<u8>, data_words: usize) {
    if words.len() < data_words {
        words.push(PAD);
    }
    while words.len() < data_words {
        let position = words.len() + 1;
        words.push(randomize_253_state(PAD, position));
    }
}

/// Place one or more complete codeword layers into a shared module array
fn place_layers(size: SymbolSize, layers: &[(&[u8], u8)]) -> Result<Message> {
    let mut msg = Message::new(size);
    for &(codewords, on_color) in layers {
        msg.code.copy_from_slice(codewords);
        module_placement(&mut msg.array, &mut msg.code, size, on_color)?;
        for module in &mut msg.array {
            *module &= !(MODULE_ASSIGNED | MODULE_VISITED);
        }
    }
    Ok(msg)
}

/// Paint `msg` into a new buffer; symbol row 0 lands at the bottom of the image
fn render(msg: &Message, options: &EncodeOptions) -> Result<PixelBuffer> {
    let size = msg.size;
    let module = options.module_size;
    let margin = options.margin;
    let width = 2 * margin + size.cols() * module;
    let height = 2 * margin + size.rows() * module;
    let (fg, bg) = options.colors.unwrap_or((Rgb::BLACK, Rgb::WHITE));
    let pack = options.pack;

    let mut image = PixelBuffer::filled(PixelLayout::new(width, height, pack), 0xff)?;
    let channels = pack.channel_count();
    let mut paint = |x0: usize, y0: usize, w: usize, h: usize, color: Rgb| -> Result<()> {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                for ch in 0..channels {
                    image.set_channel(x as i32, y as i32, ch, color.channel_value(pack, ch))?;
                }
            }
        }
        Ok(())
    };

    if bg != Rgb::WHITE {
        paint(0, 0, width, height, bg)?;
    }

    let pick = |status: u8, plane: u8, fg: u8, bg: u8| if status & plane != 0 { fg } else { bg };
    for row in 0..size.rows() {
        for col in 0..size.cols() {
            let status = msg.symbol_module_status(row, col);
            let color = Rgb::new(
                pick(status, MODULE_ON_RED, fg.r, bg.r),
                pick(status, MODULE_ON_GREEN, fg.g, bg.g),
                pick(status, MODULE_ON_BLUE, fg.b, bg.b),
            );
            if color == Rgb::WHITE && bg == Rgb::WHITE {
                continue;
            }
            paint(margin + col * module, margin + row * module, module, module, color)?;
        }
    }

    Ok(image)
}
