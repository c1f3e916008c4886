//! Data Matrix codeword decoding
//!
//! Everything that happens once a region has been located:
//! - Module classification by weighted neighbour voting
//! - Module placement (grid to codewords and back)
//! - Reed-Solomon error correction over interleaved blocks
//! - Compaction scheme decoding into output bytes

/// Environment overrides for decode defaults
pub mod config;
/// Codeword stream to output bytes
pub mod message;
/// Compaction scheme decoders (ASCII, C40, Text, X12, EDIFACT, Base256)
pub mod modes;
/// ECC200 utah-shape module placement
pub mod placement;
/// Reed-Solomon error correction
pub mod reed_solomon;
/// Module on/off votes over a located region
pub mod tally;
