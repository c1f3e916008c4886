//! Error type shared by the encoder, the decoder and the pixel sampler.

use crate::encoder::Scheme;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, DmtxError>;

/// Everything that can go wrong while encoding or decoding a Data Matrix symbol.
///
/// Geometric rejections during region search are not errors: the scan simply moves on to the
/// next seed. Only conditions the caller must act on surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DmtxError {
    /// Pixel access outside the image bounds.
    #[error("pixel ({x}, {y}) lies outside the image")]
    OutOfBounds {
        /// Requested column
        x: i32,
        /// Requested row (bottom-up)
        y: i32,
    },
    /// A decode or encode option is out of its valid range.
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),
    /// The pixel buffer does not match its declared layout.
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// An input byte cannot be represented in the forced compaction scheme.
    #[error("byte {value:#04x} is not encodable in {scheme:?}")]
    UnsupportedChar {
        /// Scheme that rejected the byte
        scheme: Scheme,
        /// Offending input byte
        value: u8,
    },
    /// The forced scheme could not return to ASCII at the required point.
    #[error("compaction scheme cannot unlatch at this position")]
    CannotUnlatch,
    /// No symbol size (or not the requested one) can hold the data.
    #[error("{words} data codewords exceed the symbol capacity")]
    CapacityExceeded {
        /// Data codewords required so far
        words: usize,
    },
    /// A Reed-Solomon block holds more errors than it can correct.
    #[error("uncorrectable Reed-Solomon block")]
    Uncorrectable,
    /// A bookkeeping invariant was broken. Indicates a defect, never bad input.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl DmtxError {
    /// Build an internal error and log it at error level.
    pub(crate) fn internal(what: &'static str) -> Self {
        tracing::error!(what, "internal invariant violated");
        DmtxError::Internal(what)
    }
}
