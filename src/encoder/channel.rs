//! Compaction channel: one candidate encoding of the input in progress
//!
//! Lengths are tracked in twelfths of a codeword so every scheme advances by whole units:
//! ASCII and Base256 by 12 per codeword, C40/Text/X12 by 8 per value (three values per two
//! codewords) and EDIFACT by 9 per value (four values per three codewords).

use std::collections::VecDeque;

use super::Scheme;
use crate::decoder::modes::base256::randomize_255_offset;
use crate::decoder::modes::{EDIFACT_UNLATCH, FNC1, TRIPLET_UNLATCH};
use crate::error::{DmtxError, Result};
use crate::models::SizeRequest;

/// Progress units per full codeword
pub(crate) const WORD: usize = 12;
/// Progress units per EDIFACT value
pub(crate) const EDIFACT_VALUE: usize = 9;
/// Progress units per C40/Text/X12 value
pub(crate) const TRIPLET_VALUE: usize = 8;
/// Data codewords of the largest symbol
pub(crate) const MAX_DATA_WORDS: usize = 1558;

/// Whether a channel can still be extended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Encoding so far is valid
    Valid,
    /// The current scheme cannot represent the next input byte
    UnsupportedChar,
    /// A triplet scheme was asked to switch in the middle of a codeword pair
    CannotUnlatch,
}

/// How to return to ASCII
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unlatch {
    /// Emit the scheme's unlatch value
    Explicit,
    /// The symbol ends or the remaining words are read as ASCII without a marker
    Implicit,
}

/// Partial encoding of `input` in one scheme
#[derive(Debug, Clone)]
pub struct Channel<'a> {
    pub(crate) input: &'a [u8],
    pub(crate) scheme: Scheme,
    pub(crate) status: ChannelStatus,
    /// Byte that made the channel invalid, when it was an unsupported character
    pub(crate) rejected: Option<u8>,
    pub(crate) input_index: usize,
    /// Units written to `words`, including values not yet attributed to an input byte
    pub(crate) encoded_length: usize,
    /// Units attributed to consumed input bytes
    pub(crate) current_length: usize,
    /// Start of the current scheme's first codeword (the latch, or the Base256 length header)
    pub(crate) first_codeword: usize,
    pub(crate) words: Vec<u8>,
    pub(crate) size_request: SizeRequest,
    pub(crate) gs1: bool,
    /// Triplet values generated per pending input byte, oldest first
    pub(crate) value_counts: VecDeque<usize>,
}

impl<'a> Channel<'a> {
    /// Fresh channel in ASCII at the start of `input`
    pub fn new(input: &'a [u8], size_request: SizeRequest) -> Self {
        Self {
            input,
            scheme: Scheme::Ascii,
            status: ChannelStatus::Valid,
            rejected: None,
            input_index: 0,
            encoded_length: 0,
            current_length: 0,
            first_codeword: 0,
            words: Vec::with_capacity(input.len() + 8),
            size_request,
            gs1: false,
            value_counts: VecDeque::new(),
        }
    }

    /// ASCII channel flagged as GS1: FNC1 first, and GS bytes in the input become FNC1
    pub fn new_gs1(input: &'a [u8], size_request: SizeRequest) -> Result<Self> {
        let mut channel = Self::new(input, size_request);
        channel.gs1 = true;
        channel.push_input_word(FNC1)?;
        channel.increment_progress(WORD);
        channel.first_codeword = channel.current_length;
        Ok(channel)
    }

    /// Scheme the channel is currently in
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Whether every input byte has been consumed
    pub fn is_complete(&self) -> bool {
        self.input_index >= self.input.len()
    }

    /// Whether the channel can still be extended
    pub fn is_valid(&self) -> bool {
        self.status == ChannelStatus::Valid
    }

    /// Completed codewords
    pub fn codewords(&self) -> &[u8] {
        let end = (self.encoded_length / WORD).min(self.words.len());
        &self.words[..end]
    }

    pub(crate) fn word(&self, index: usize) -> u8 {
        self.words.get(index).copied().unwrap_or(0)
    }

    pub(crate) fn set_word(&mut self, index: usize, value: u8) {
        if index >= self.words.len() {
            self.words.resize(index + 1, 0);
        }
        self.words[index] = value;
    }

    pub(crate) fn current_input(&self) -> Result<u8> {
        self.input
            .get(self.input_index)
            .copied()
            .ok_or_else(|| DmtxError::internal("channel read past the end of its input"))
    }

    pub(crate) fn reject(&mut self, value: u8) {
        self.status = ChannelStatus::UnsupportedChar;
        self.rejected = Some(value);
    }

    /// Append one value in the current scheme's packing
    pub(crate) fn push_input_word(&mut self, value: u8) -> Result<()> {
        let words = self.encoded_length / WORD;
        if words >= MAX_DATA_WORDS {
            return Err(DmtxError::CapacityExceeded { words: words + 1 });
        }

        match self.scheme {
            Scheme::C40 | Scheme::Text | Scheme::X12 => {
                self.set_word(words, value);
                self.encoded_length += WORD;
            }
            Scheme::Edifact => {
                // Four 6-bit values share three bytes; rewrite the bytes this value touches
                let pos = self.current_length % 4;
                let start = (self.current_length + EDIFACT_VALUE) / WORD - pos;
                let mut quad = super::edifact::unpack(
                    self.word(start),
                    self.word(start + 1),
                    self.word(start + 2),
                );
                quad[pos] = value;
                quad[pos + 1..].fill(0);
                let packed = super::edifact::pack(quad);
                for (i, &byte) in packed.iter().enumerate().take(pos.min(2) + 1) {
                    self.set_word(start + i, byte);
                }
                self.encoded_length += EDIFACT_VALUE;
            }
            _ => {
                self.set_word(self.current_length / WORD, value);
                self.encoded_length += WORD;
            }
        }
        Ok(())
    }

    pub(crate) fn increment_progress(&mut self, units: usize) {
        self.current_length += units;
    }

    /// Leave the current scheme for ASCII and latch into `target`
    pub(crate) fn change_scheme(&mut self, target: Scheme, unlatch: Unlatch) -> Result<()> {
        if self.scheme == target {
            return Err(DmtxError::internal("channel is already in the target scheme"));
        }

        match self.scheme {
            Scheme::Ascii => {
                if self.current_length % WORD != 0 {
                    return Err(DmtxError::internal("ascii channel off a codeword boundary"));
                }
            }
            Scheme::C40 | Scheme::Text | Scheme::X12 => {
                if self.current_length % WORD != 0 || self.current_length != self.encoded_length
                {
                    self.status = ChannelStatus::CannotUnlatch;
                    return Ok(());
                }
                if unlatch == Unlatch::Explicit {
                    self.push_input_word(TRIPLET_UNLATCH)?;
                    self.increment_progress(WORD);
                }
                self.value_counts.clear();
            }
            Scheme::Edifact => {
                if self.current_length % 3 != 0 {
                    return Err(DmtxError::internal("edifact channel off a value boundary"));
                }
                if unlatch == Unlatch::Explicit {
                    self.push_input_word(EDIFACT_UNLATCH)?;
                    self.increment_progress(EDIFACT_VALUE);
                }
                // Round up to the next codeword boundary
                let advance = (self.current_length % 4) * 3;
                self.current_length += advance;
                self.encoded_length += advance;
            }
            // The length header already delimits the segment
            _ => {}
        }
        self.scheme = Scheme::Ascii;

        match target.latch() {
            Some(latch) => {
                self.push_input_word(latch)?;
                self.increment_progress(WORD);
                if target == Scheme::Base256 {
                    let position = self.current_length / WORD + 1;
                    self.push_input_word(randomize_255_state(0, position))?;
                    self.increment_progress(WORD);
                }
                self.first_codeword = self.current_length - WORD;
            }
            None => self.first_codeword = self.current_length,
        }
        self.scheme = target;
        Ok(())
    }

    /// Consume input by emitting the next codeword(s) in `target`, switching scheme first if
    /// needed. On an invalid status the channel is left untouched for the caller to inspect.
    pub fn encode_next_word(&mut self, target: Scheme) -> Result<()> {
        if self.scheme != target {
            self.change_scheme(target, Unlatch::Explicit)?;
            if !self.is_valid() {
                return Ok(());
            }
        }

        match self.scheme {
            Scheme::C40 | Scheme::Text | Scheme::X12 => self.encode_triplet_codeword(),
            Scheme::Edifact => self.encode_edifact_codeword(),
            Scheme::Base256 => self.encode_base256_codeword(),
            _ => self.encode_ascii_codeword(),
        }
    }
}

/// Add the 255-state pseudo-random offset for 1-based codeword position `position`
pub(crate) fn randomize_255_state(value: u8, position: usize) -> u8 {
    value.wrapping_add(randomize_255_offset(position))
}
