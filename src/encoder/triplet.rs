use super::Scheme;
use super::channel::{Channel, TRIPLET_VALUE, Unlatch, WORD};
use crate::error::{DmtxError, Result};
use crate::models::find_correct_symbol_size;

/// C40/Text/X12 values for one input byte; empty when the scheme cannot represent it
pub(crate) fn triplet_values(byte: u8, scheme: Scheme) -> Vec<u8> {
    let mut values = Vec::with_capacity(4);
    let mut v = byte;

    if v > 127 {
        if scheme == Scheme::X12 {
            return values;
        }
        // Shift 2, upper shift
        values.extend_from_slice(&[1, 30]);
        v -= 128;
    }

    if scheme == Scheme::X12 {
        let value = match v {
            13 => 0,
            b'*' => 1,
            b'>' => 2,
            b' ' => 3,
            b'0'..=b'9' => v - 44,
            b'A'..=b'Z' => v - 51,
            _ => return Vec::new(),
        };
        values.push(value);
        return values;
    }

    let text = scheme == Scheme::Text;
    match v {
        0..=31 => values.extend_from_slice(&[0, v]),
        32 => values.push(3),
        33..=47 => values.extend_from_slice(&[1, v - 33]),
        48..=57 => values.push(v - 44),
        58..=64 => values.extend_from_slice(&[1, v - 43]),
        65..=90 if text => values.extend_from_slice(&[2, v - 64]),
        65..=90 => values.push(v - 51),
        91..=95 => values.extend_from_slice(&[1, v - 69]),
        96 if text => values.extend_from_slice(&[2, 0]),
        97..=122 if text => values.push(v - 83),
        _ => values.extend_from_slice(&[2, v - 96]),
    }
    values
}

/// How a triplet segment ends once the input runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TripletEnd {
    /// One ASCII byte fills the last word; no unlatch needed
    AsciiImplicit,
    /// Pad the buffered values to a final triplet that fills the symbol
    PackFinal,
    /// Triplets end exactly at the symbol end
    Done,
    /// Unlatch and finish in ASCII
    AsciiExplicit,
}

/// X12 has no filler value, so a short final triplet is never padded there
fn triplet_end(
    scheme: Scheme,
    buffered: usize,
    inputs: usize,
    words_left: usize,
    single_ascii: bool,
) -> TripletEnd {
    match (buffered, inputs, words_left) {
        (_, 1, 1) if single_ascii => TripletEnd::AsciiImplicit,
        (2 | 3, _, 2) if scheme != Scheme::X12 => TripletEnd::PackFinal,
        (_, 0, 0) => TripletEnd::Done,
        _ => TripletEnd::AsciiExplicit,
    }
}

impl Channel<'_> {
    fn push_triplet(&mut self, [v0, v1, v2]: [u8; 3]) -> Result<()> {
        let packed = 1600 * v0 as u16 + 40 * v1 as u16 + v2 as u16 + 1;
        let [hi, lo] = packed.to_be_bytes();
        self.push_input_word(hi)?;
        self.push_input_word(lo)
    }

    /// Credit the oldest input byte whose values are all written; false when none is
    fn consume_written_byte(&mut self) -> bool {
        match self.value_counts.front() {
            Some(&count) if self.current_length + TRIPLET_VALUE * count <= self.encoded_length => {
                self.value_counts.pop_front();
                self.current_length += TRIPLET_VALUE * count;
                self.input_index += 1;
                true
            }
            _ => false,
        }
    }

    /// Consume one input byte. Values are written a triplet at a time, so a call may write
    /// ahead of the input it credits; later calls then only credit already written bytes.
    pub(crate) fn encode_triplet_codeword(&mut self) -> Result<()> {
        if self.current_length > self.encoded_length {
            return Err(DmtxError::internal("triplet channel credited unwritten values"));
        }

        if self.current_length == self.encoded_length {
            if self.current_length % WORD != 0 {
                return Err(DmtxError::internal("triplet channel off a codeword boundary"));
            }

            let mut next = self.input_index;
            let mut buffer: Vec<u8> = Vec::with_capacity(6);
            loop {
                while buffer.len() < 3 && next < self.input.len() {
                    let byte = self.input[next];
                    let values = triplet_values(byte, self.scheme);
                    if values.is_empty() {
                        self.reject(byte);
                        return Ok(());
                    }
                    self.value_counts.push_back(values.len());
                    buffer.extend_from_slice(&values);
                    next += 1;
                }

                if buffer.len() >= 3 {
                    self.push_triplet([buffer[0], buffer[1], buffer[2]])?;
                    buffer.drain(..3);
                    continue;
                }

                if next == self.input.len() {
                    while self.consume_written_byte() {}
                    self.current_length = self.encoded_length;
                    return self.end_of_symbol_triplet(&buffer);
                }

                if buffer.is_empty() {
                    break;
                }
            }
        }

        if !self.consume_written_byte() {
            return Err(DmtxError::internal("triplet channel lost track of its input"));
        }
        Ok(())
    }

    /// Undo a latch that no triplet followed, so the segment is not a bare latch and unlatch
    fn drop_empty_latch(&mut self) -> bool {
        if self.encoded_length != self.first_codeword + WORD {
            return false;
        }
        self.words.truncate(self.first_codeword / WORD);
        self.encoded_length = self.first_codeword;
        self.current_length = self.first_codeword;
        self.value_counts.clear();
        self.scheme = Scheme::Ascii;
        true
    }

    /// Finish a triplet segment at the end of the input. `buffered` holds the values that did
    /// not make up a full triplet.
    fn end_of_symbol_triplet(&mut self, buffered: &[u8]) -> Result<()> {
        if self.current_length % WORD != 0 {
            return Err(DmtxError::internal("triplet segment ends off a codeword boundary"));
        }

        let inputs = self.input.len() - self.input_index;
        let current_byte = self.current_length / WORD;
        let needed = current_byte + if inputs == 3 { 2 } else { inputs };
        let size = find_correct_symbol_size(needed, self.size_request)
            .ok_or(DmtxError::CapacityExceeded { words: needed })?;
        let words_left = size.data_words().saturating_sub(current_byte);
        let single_ascii = inputs == 1 && self.input[self.input_index] < 128;

        let end = triplet_end(self.scheme, buffered.len(), inputs, words_left, single_ascii);
        if end != TripletEnd::PackFinal && self.drop_empty_latch() {
            while !self.is_complete() {
                self.encode_next_word(Scheme::Ascii)?;
            }
            return Ok(());
        }

        match end {
            TripletEnd::AsciiImplicit => {
                self.change_scheme(Scheme::Ascii, Unlatch::Implicit)?;
                self.encode_next_word(Scheme::Ascii)?;
            }
            TripletEnd::PackFinal => {
                let mut last = [0u8; 3];
                last[..buffered.len()].copy_from_slice(buffered);
                self.push_triplet(last)?;
                self.increment_progress(2 * WORD);
                self.value_counts.clear();
                self.input_index = self.input.len();
                self.scheme = Scheme::Ascii;
                self.first_codeword = self.current_length;
            }
            TripletEnd::Done => {}
            TripletEnd::AsciiExplicit => {
                self.change_scheme(Scheme::Ascii, Unlatch::Explicit)?;
                while !self.is_complete() {
                    self.encode_next_word(Scheme::Ascii)?;
                }
            }
        }

        if !self.is_complete() {
            return Err(DmtxError::internal("triplet segment ended with input left"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SizeRequest;

    fn encode_all(input: &[u8], scheme: Scheme) -> Channel<'_> {
        encode_sized(input, scheme, SizeRequest::SquareAuto)
    }

    fn encode_sized(input: &[u8], scheme: Scheme, size_request: SizeRequest) -> Channel<'_> {
        let mut channel = Channel::new(input, size_request);
        while !channel.is_complete() && channel.is_valid() {
            channel.encode_next_word(scheme).unwrap();
        }
        channel
    }

    fn packed(v0: u16, v1: u16, v2: u16) -> [u8; 2] {
        (1600 * v0 + 40 * v1 + v2 + 1).to_be_bytes()
    }

    #[test]
    fn test_values() {
        assert_eq!(triplet_values(b'A', Scheme::C40), vec![14]);
        assert_eq!(triplet_values(b'a', Scheme::C40), vec![2, 1]);
        assert_eq!(triplet_values(b'a', Scheme::Text), vec![14]);
        assert_eq!(triplet_values(b'A', Scheme::Text), vec![2, 1]);
        assert_eq!(triplet_values(b'!', Scheme::C40), vec![1, 0]);
        assert_eq!(triplet_values(0xc1, Scheme::C40), vec![1, 30, 14]);
        assert_eq!(triplet_values(b'>', Scheme::X12), vec![2]);
        assert!(triplet_values(b'a', Scheme::X12).is_empty());
        assert!(triplet_values(0xc1, Scheme::X12).is_empty());
    }

    #[test]
    fn test_triplets_fill_symbol_exactly() {
        // latch + two triplets = 5 words, a full 12x12 symbol; no unlatch fits or is needed
        let channel = encode_all(b"ABCDEF", Scheme::C40);
        let mut expected = vec![230];
        expected.extend_from_slice(&packed(14, 15, 16));
        expected.extend_from_slice(&packed(17, 18, 19));
        assert_eq!(channel.codewords(), expected.as_slice());
    }

    #[test]
    fn test_unlatch_when_words_remain() {
        // latch + three triplets = 7 words in a 14x14 symbol (8 words)
        let channel = encode_all(b"ABCDEFGHI", Scheme::C40);
        let words = channel.codewords();
        assert_eq!(words.len(), 8);
        assert_eq!(words[7], 254);
        assert_eq!(channel.scheme(), Scheme::Ascii);
    }

    #[test]
    fn test_trailing_byte_in_ascii_without_unlatch() {
        // 7 words of triplets leave exactly one word of a 14x14 symbol for "J"
        let channel = encode_all(b"ABCDEFGHIJ", Scheme::C40);
        let words = channel.codewords();
        assert_eq!(words.len(), 8);
        assert_eq!(words[7], b'J' + 1);
    }

    #[test]
    fn test_trailing_byte_after_unlatch() {
        // 3 words of triplets plus "D" need a 12x12 symbol, leaving room for the unlatch
        let channel = encode_all(b"ABCD", Scheme::C40);
        let mut expected = vec![230];
        expected.extend_from_slice(&packed(14, 15, 16));
        expected.extend_from_slice(&[254, b'D' + 1]);
        assert_eq!(channel.codewords(), expected.as_slice());
    }

    #[test]
    fn test_final_pair_padded_with_shift() {
        // "DE" are packed with a shift 1 filler into the last two words of a 12x12 symbol
        let channel = encode_all(b"ABCDE", Scheme::C40);
        let mut expected = vec![230];
        expected.extend_from_slice(&packed(14, 15, 16));
        expected.extend_from_slice(&packed(17, 18, 0));
        assert_eq!(channel.codewords(), expected.as_slice());
        assert!(channel.is_complete());
    }

    #[test]
    fn test_lone_byte_drops_empty_latch() {
        let channel = encode_all(b"C", Scheme::C40);
        assert_eq!(channel.codewords(), &[b'C' + 1]);
        assert_eq!(channel.scheme(), Scheme::Ascii);

        // Two shifted values, but the rectangle leaves too many words for a padded pair
        let channel = encode_sized(b"p", Scheme::C40, SizeRequest::RectAuto);
        assert_eq!(channel.codewords(), &[b'p' + 1]);
    }

    #[test]
    fn test_x12_pair_finishes_in_ascii() {
        let channel = encode_all(b"J9", Scheme::X12);
        assert_eq!(channel.codewords(), &[b'J' + 1, b'9' + 1]);

        let channel = encode_all(b"ABCDE", Scheme::X12);
        let mut expected = vec![238];
        expected.extend_from_slice(&packed(14, 15, 16));
        expected.extend_from_slice(&[254, b'D' + 1, b'E' + 1]);
        assert_eq!(channel.codewords(), expected.as_slice());
        assert!(channel.is_complete());
    }

    #[test]
    fn test_x12_never_packs_final_pair() {
        assert_eq!(
            triplet_end(Scheme::X12, 2, 2, 2, false),
            TripletEnd::AsciiExplicit
        );
        assert_eq!(
            triplet_end(Scheme::Text, 2, 2, 2, false),
            TripletEnd::PackFinal
        );
    }

    #[test]
    fn test_unsupported_byte_rejected() {
        let channel = encode_all(b"AB#", Scheme::X12);
        assert!(!channel.is_valid());
        assert_eq!(channel.rejected, Some(b'#'));
    }
}
