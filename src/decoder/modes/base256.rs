/// Pseudo-random offset added to the Base256 codeword at 1-based position `position`
pub fn randomize_255_offset(position: usize) -> u8 {
    ((149 * position) % 255 + 1) as u8
}

/// Undo the 255-state randomisation of a Base256 codeword
pub fn unrandomize_255_state(value: u8, position: usize) -> u8 {
    value.wrapping_sub(randomize_255_offset(position))
}

/// Base256 decoder
pub struct Base256Decoder;

impl Base256Decoder {
    /// Decode from `start` (just past the latch).
    ///
    /// A zero length field means the segment runs to the end of the data codewords. Returns
    /// `None` when the declared length overruns the symbol.
    pub fn decode(code: &[u8], start: usize, output: &mut Vec<u8>) -> Option<usize> {
        let end = code.len();
        let mut index = start;

        let d0 = unrandomize_255_state(*code.get(index)?, index + 1) as usize;
        index += 1;

        let segment_end = match d0 {
            0 => end,
            1..=249 => index + d0,
            _ => {
                let d1 = unrandomize_255_state(*code.get(index)?, index + 1) as usize;
                index += 1;
                index + (d0 - 249) * 250 + d1
            }
        };

        if segment_end > end {
            tracing::debug!(segment_end, end, "base256 length overruns symbol");
            return None;
        }

        output.extend(
            code[index..segment_end]
                .iter()
                .enumerate()
                .map(|(i, &cw)| unrandomize_255_state(cw, index + i + 1)),
        );

        Some(segment_end)
    }
}
