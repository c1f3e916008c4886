//! Channel-addressable access to packed raster buffers
//!
//! Pixel coordinates are bottom-up: `y == 0` addresses the last row stored in the buffer.
//! Channel values are always returned on an 8-bit scale regardless of the packing.

use crate::error::{DmtxError, Result};

/// Pixel packing of a raster buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackOrder {
    /// 1 bit per pixel, black/white
    K1,
    /// 8-bit grayscale
    K8,
    /// 5-5-5 RGB in 16 bits
    Rgb16,
    /// 5-5-5 BGR in 16 bits
    Bgr16,
    /// 5-5-5 YCbCr in 16 bits
    YCbCr16,
    /// 5-5-5 RGB followed by one padding bit
    Rgbx16,
    /// 5-5-5 BGR followed by one padding bit
    Bgrx16,
    /// One padding bit followed by 5-5-5 RGB
    Xrgb16,
    /// One padding bit followed by 5-5-5 BGR
    Xbgr16,
    /// 8-8-8 RGB
    #[default]
    Rgb24,
    /// 8-8-8 BGR
    Bgr24,
    /// 8-8-8 YCbCr
    YCbCr24,
    /// RGB followed by a padding byte
    Rgbx32,
    /// BGR followed by a padding byte
    Bgrx32,
    /// Padding byte followed by RGB
    Xrgb32,
    /// Padding byte followed by BGR
    Xbgr32,
    /// 8-8-8-8 CMYK
    Cmyk32,
}

impl PackOrder {
    /// Bits per pixel
    pub fn bits_per_pixel(self) -> usize {
        match self {
            PackOrder::K1 => 1,
            PackOrder::K8 => 8,
            PackOrder::Rgb16
            | PackOrder::Bgr16
            | PackOrder::YCbCr16
            | PackOrder::Rgbx16
            | PackOrder::Bgrx16
            | PackOrder::Xrgb16
            | PackOrder::Xbgr16 => 16,
            PackOrder::Rgb24 | PackOrder::Bgr24 | PackOrder::YCbCr24 => 24,
            PackOrder::Rgbx32
            | PackOrder::Bgrx32
            | PackOrder::Xrgb32
            | PackOrder::Xbgr32
            | PackOrder::Cmyk32 => 32,
        }
    }

    /// Channels as (bit offset from the pixel's most significant bit, bit width)
    pub fn channels(self) -> &'static [(usize, usize)] {
        match self {
            PackOrder::K1 => &[(0, 1)],
            PackOrder::K8 => &[(0, 8)],
            PackOrder::Rgb16
            | PackOrder::Bgr16
            | PackOrder::YCbCr16
            | PackOrder::Rgbx16
            | PackOrder::Bgrx16 => &[(0, 5), (5, 5), (10, 5)],
            PackOrder::Xrgb16 | PackOrder::Xbgr16 => &[(1, 5), (6, 5), (11, 5)],
            PackOrder::Rgb24
            | PackOrder::Bgr24
            | PackOrder::YCbCr24
            | PackOrder::Rgbx32
            | PackOrder::Bgrx32 => &[(0, 8), (8, 8), (16, 8)],
            PackOrder::Xrgb32 | PackOrder::Xbgr32 => &[(8, 8), (16, 8), (24, 8)],
            PackOrder::Cmyk32 => &[(0, 8), (8, 8), (16, 8), (24, 8)],
        }
    }

    /// Number of addressable channels
    pub fn channel_count(self) -> usize {
        self.channels().len()
    }

    /// Whether channels are stored blue first
    pub fn is_bgr(self) -> bool {
        matches!(
            self,
            PackOrder::Bgr16
                | PackOrder::Bgrx16
                | PackOrder::Xbgr16
                | PackOrder::Bgr24
                | PackOrder::Bgrx32
                | PackOrder::Xbgr32
        )
    }

    /// Whether the channels hold RGB (or BGR) intensities the encoder can paint
    pub fn is_rgb_like(self) -> bool {
        !matches!(
            self,
            PackOrder::YCbCr16 | PackOrder::YCbCr24 | PackOrder::Cmyk32
        )
    }
}

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// Black
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    /// White
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };

    /// Create a colour
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mean of the three components
    pub fn luma(self) -> u8 {
        ((self.r as u16 + self.g as u16 + self.b as u16) / 3) as u8
    }

    /// Value written to `channel` of a buffer packed as `pack`
    pub fn channel_value(self, pack: PackOrder, channel: usize) -> u8 {
        if pack.channel_count() == 1 {
            return self.luma();
        }
        let ordered = if pack.is_bgr() {
            [self.b, self.g, self.r]
        } else {
            [self.r, self.g, self.b]
        };
        ordered.get(channel).copied().unwrap_or(0)
    }
}

/// Geometry and packing of a raster buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelLayout {
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Pixel packing
    pub pack: PackOrder,
    /// Extra bytes at the end of every row
    pub row_padding: usize,
}

impl PixelLayout {
    /// Layout without row padding
    pub fn new(width: usize, height: usize, pack: PackOrder) -> Self {
        Self {
            width,
            height,
            pack,
            row_padding: 0,
        }
    }

    /// Same layout with `row_padding` bytes appended to every row
    pub fn with_row_padding(mut self, row_padding: usize) -> Self {
        self.row_padding = row_padding;
        self
    }

    /// Bytes per stored row
    pub fn row_size_bytes(&self) -> usize {
        (self.width * self.pack.bits_per_pixel()).div_ceil(8) + self.row_padding
    }

    /// Minimum buffer length for this layout
    pub fn buffer_len(&self) -> usize {
        self.row_size_bytes() * self.height
    }

    fn validate(&self, len: usize) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DmtxError::InvalidImage(format!(
                "zero-sized image {}x{}",
                self.width, self.height
            )));
        }
        if len < self.buffer_len() {
            return Err(DmtxError::InvalidImage(format!(
                "buffer holds {} bytes, layout needs {}",
                len,
                self.buffer_len()
            )));
        }
        Ok(())
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Bit position of the first bit of `channel` at (x, y), counted from the buffer start
    fn bit_position(&self, x: i32, y: i32, channel: usize) -> Result<(usize, usize)> {
        if !self.contains(x, y) {
            return Err(DmtxError::OutOfBounds { x, y });
        }
        let &(offset, width) = self
            .pack
            .channels()
            .get(channel)
            .ok_or(DmtxError::OutOfBounds { x, y })?;
        let stored_row = self.height - 1 - y as usize;
        let row_start = stored_row * self.row_size_bytes() * 8;
        Ok((
            row_start + x as usize * self.pack.bits_per_pixel() + offset,
            width,
        ))
    }
}

fn read_bits(data: &[u8], pos: usize, width: usize) -> u32 {
    if width == 8 && pos % 8 == 0 {
        return data[pos / 8] as u32;
    }
    (0..width).fold(0u32, |acc, i| {
        let bit = pos + i;
        (acc << 1) | ((data[bit / 8] >> (7 - bit % 8)) & 1) as u32
    })
}

fn write_bits(data: &mut [u8], pos: usize, width: usize, value: u32) {
    if width == 8 && pos % 8 == 0 {
        data[pos / 8] = value as u8;
        return;
    }
    for i in 0..width {
        let bit = pos + i;
        let mask = 1u8 << (7 - bit % 8);
        if (value >> (width - 1 - i)) & 1 == 1 {
            data[bit / 8] |= mask;
        } else {
            data[bit / 8] &= !mask;
        }
    }
}

fn normalize(raw: u32, width: usize) -> i32 {
    match width {
        1 => {
            if raw != 0 {
                255
            } else {
                0
            }
        }
        5 => ((raw << 3) | (raw >> 2)) as i32,
        _ => raw as i32,
    }
}

fn denormalize(value: u8, width: usize) -> u32 {
    match width {
        1 => (value >= 128) as u32,
        5 => (value >> 3) as u32,
        _ => value as u32,
    }
}

/// Borrowed raster buffer
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    layout: PixelLayout,
}

impl<'a> ImageView<'a> {
    /// Wrap `data`, failing when it is shorter than the layout requires
    pub fn new(data: &'a [u8], layout: PixelLayout) -> Result<Self> {
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Buffer layout
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Number of colour channels
    pub fn channel_count(&self) -> usize {
        self.layout.pack.channel_count()
    }

    /// Whether (x, y) lies inside the image
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.layout.contains(x, y)
    }

    /// Channel value at (x, y) on an 8-bit scale
    pub fn get_channel(&self, x: i32, y: i32, channel: usize) -> Result<i32> {
        let (pos, width) = self.layout.bit_position(x, y, channel)?;
        Ok(normalize(read_bits(self.data, pos, width), width))
    }
}

/// Owned raster buffer, used as the encoder's render target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    data: Vec<u8>,
    layout: PixelLayout,
}

impl PixelBuffer {
    /// Buffer with every byte set to `fill`
    pub fn filled(layout: PixelLayout, fill: u8) -> Result<Self> {
        let data = vec![fill; layout.buffer_len()];
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Take ownership of an existing buffer
    pub fn from_raw(data: Vec<u8>, layout: PixelLayout) -> Result<Self> {
        layout.validate(data.len())?;
        Ok(Self { data, layout })
    }

    /// Borrow as an image view
    pub fn view(&self) -> ImageView<'_> {
        ImageView {
            data: &self.data,
            layout: self.layout,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Buffer layout
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Raw bytes, first stored row first
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume into the raw bytes
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Channel value at (x, y) on an 8-bit scale
    pub fn get_channel(&self, x: i32, y: i32, channel: usize) -> Result<i32> {
        self.view().get_channel(x, y, channel)
    }

    /// Write an 8-bit scale value into `channel` at (x, y)
    pub fn set_channel(&mut self, x: i32, y: i32, channel: usize, value: u8) -> Result<()> {
        let (pos, width) = self.layout.bit_position(x, y, channel)?;
        write_bits(&mut self.data, pos, width, denormalize(value, width));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_up_addressing() {
        // 2x2 grayscale: stored rows are top first, y = 0 is the bottom row
        let data = [10u8, 20, 30, 40];
        let view = ImageView::new(&data, PixelLayout::new(2, 2, PackOrder::K8)).unwrap();
        assert_eq!(view.get_channel(0, 0, 0).unwrap(), 30);
        assert_eq!(view.get_channel(1, 1, 0).unwrap(), 20);
        assert_eq!(
            view.get_channel(2, 0, 0),
            Err(DmtxError::OutOfBounds { x: 2, y: 0 })
        );
        assert!(view.get_channel(0, 0, 1).is_err());
    }

    #[test]
    fn test_short_buffer_rejected() {
        let data = [0u8; 5];
        let err = ImageView::new(&data, PixelLayout::new(2, 1, PackOrder::Rgb24)).unwrap_err();
        assert!(matches!(err, DmtxError::InvalidImage(_)));
        assert!(ImageView::new(&data, PixelLayout::new(0, 1, PackOrder::K8)).is_err());
    }

    #[test]
    fn test_row_padding() {
        let layout = PixelLayout::new(3, 2, PackOrder::Rgb24).with_row_padding(3);
        assert_eq!(layout.row_size_bytes(), 12);
        let mut buf = PixelBuffer::filled(layout, 0).unwrap();
        buf.set_channel(2, 0, 2, 99).unwrap();
        // Bottom row is the second stored row
        assert_eq!(buf.as_bytes()[12 + 8], 99);
    }

    #[test]
    fn test_five_bit_channels() {
        let layout = PixelLayout::new(1, 1, PackOrder::Xrgb16);
        let mut buf = PixelBuffer::filled(layout, 0).unwrap();
        buf.set_channel(0, 0, 0, 255).unwrap();
        buf.set_channel(0, 0, 2, 0x80).unwrap();
        assert_eq!(buf.get_channel(0, 0, 0).unwrap(), 255);
        assert_eq!(buf.get_channel(0, 0, 1).unwrap(), 0);
        assert_eq!(buf.get_channel(0, 0, 2).unwrap(), 0x84);
        // Leading padding bit untouched
        assert_eq!(buf.as_bytes()[0] & 0x80, 0);
    }

    #[test]
    fn test_one_bit_channel() {
        let layout = PixelLayout::new(10, 1, PackOrder::K1);
        assert_eq!(layout.row_size_bytes(), 2);
        let mut buf = PixelBuffer::filled(layout, 0).unwrap();
        buf.set_channel(9, 0, 0, 200).unwrap();
        assert_eq!(buf.get_channel(9, 0, 0).unwrap(), 255);
        assert_eq!(buf.get_channel(8, 0, 0).unwrap(), 0);
        assert_eq!(buf.as_bytes()[1], 0x40);
    }

    #[test]
    fn test_xrgb32_offsets() {
        let data = [1u8, 2, 3, 4];
        let view = ImageView::new(&data, PixelLayout::new(1, 1, PackOrder::Xrgb32)).unwrap();
        assert_eq!(view.get_channel(0, 0, 0).unwrap(), 2);
        assert_eq!(view.get_channel(0, 0, 2).unwrap(), 4);
    }

    #[test]
    fn test_rgb_channel_value() {
        let c = Rgb::new(10, 20, 30);
        assert_eq!(c.channel_value(PackOrder::Rgb24, 0), 10);
        assert_eq!(c.channel_value(PackOrder::Bgr24, 0), 30);
        assert_eq!(c.channel_value(PackOrder::K8, 0), 20);
    }
}
