use super::channel::{Channel, WORD, randomize_255_state};
use crate::decoder::modes::base256::unrandomize_255_state;
use crate::error::{DmtxError, Result};

/// Longest Base256 segment a symbol can carry
const MAX_SEGMENT_LEN: usize = 1555;

impl Channel<'_> {
    /// Append one raw byte and rewrite the segment length header in front of it.
    ///
    /// The header grows from one to two codewords at 250 bytes, which shifts every byte
    /// already written one position up (and re-randomises it for its new position).
    pub(crate) fn encode_base256_codeword(&mut self) -> Result<()> {
        let value = self.current_input()?;
        let header = self.first_codeword / WORD;

        let h0 = unrandomize_255_state(self.word(header), header + 1) as usize;
        let mut len = if h0 <= 249 {
            h0
        } else {
            250 * (h0 - 249) + unrandomize_255_state(self.word(header + 1), header + 2) as usize
        };
        len += 1;
        if len > MAX_SEGMENT_LEN {
            return Err(DmtxError::CapacityExceeded { words: len });
        }

        if len == 250 {
            for i in (header + 1..self.current_length / WORD).rev() {
                let byte = unrandomize_255_state(self.word(i), i + 1);
                self.set_word(i + 1, randomize_255_state(byte, i + 2));
            }
            self.increment_progress(WORD);
            self.encoded_length += WORD;
        }

        let header_bytes = if len <= 249 {
            vec![len as u8]
        } else {
            vec![(len / 250 + 249) as u8, (len % 250) as u8]
        };
        for (i, byte) in header_bytes.into_iter().enumerate() {
            self.set_word(header + i, randomize_255_state(byte, header + i + 1));
        }

        let position = self.current_length / WORD + 1;
        self.push_input_word(randomize_255_state(value, position))?;
        self.increment_progress(WORD);
        self.input_index += 1;
        Ok(())
    }
}
