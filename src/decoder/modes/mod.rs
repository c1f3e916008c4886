//! Compaction scheme decoders
//!
//! Each decoder consumes codewords of one scheme starting right after its latch and returns
//! the index of the first codeword it did not consume:
//! - ASCII: single and double-digit characters, upper shift, pad detection
//! - C40 / Text / X12: three values packed per codeword pair
//! - EDIFACT: four 6-bit values packed per three codewords
//! - Base256: length-prefixed raw bytes with 255-state randomisation

/// ASCII codewords
pub mod ascii;
/// Base256 byte segments
pub mod base256;
/// EDIFACT segments
pub mod edifact;
/// C40, Text and X12 segments
pub mod triplet;

/// Latch to C40
pub const LATCH_C40: u8 = 230;
/// Latch to Base256
pub const LATCH_BASE256: u8 = 231;
/// FNC1 (GS1 flag in first position, group separator elsewhere)
pub const FNC1: u8 = 232;
/// Structured append
pub const STRUCTURED_APPEND: u8 = 233;
/// Reader programming
pub const READER_PROGRAMMING: u8 = 234;
/// ASCII upper shift: next codeword is an extended ASCII character
pub const UPPER_SHIFT: u8 = 235;
/// `[)>RS05GS` macro
pub const MACRO_05: u8 = 236;
/// `[)>RS06GS` macro
pub const MACRO_06: u8 = 237;
/// Latch to X12
pub const LATCH_X12: u8 = 238;
/// Latch to Text
pub const LATCH_TEXT: u8 = 239;
/// Latch to EDIFACT
pub const LATCH_EDIFACT: u8 = 240;
/// Extended channel interpretation
pub const ECI: u8 = 241;
/// Return to ASCII from C40, Text or X12
pub const TRIPLET_UNLATCH: u8 = 254;
/// First pad codeword
pub const PAD: u8 = 129;
/// EDIFACT 6-bit unlatch value
pub const EDIFACT_UNLATCH: u8 = 31;
/// ASCII group separator emitted for FNC1
pub const GS: u8 = 0x1d;
