//! Low-level helpers shared by the encoder and the region detector
//!
//! - Pixel buffers and packing orders
//! - Bresenham line stepping for edge following
//! - 3x3 homogeneous transforms and rays
//! - Scratch cache pooling between decodes

pub mod bresenham;
pub mod geometry;
pub mod image;
pub mod memory_pool;
