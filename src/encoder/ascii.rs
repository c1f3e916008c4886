use super::channel::{Channel, WORD};
use crate::decoder::modes::{FNC1, GS, UPPER_SHIFT};
use crate::error::Result;

impl Channel<'_> {
    /// Encode one input byte, or fold a digit into the previous codeword when both form a
    /// digit pair.
    pub(crate) fn encode_ascii_codeword(&mut self) -> Result<()> {
        let mut value = self.current_input()?;

        if value.is_ascii_digit() && self.current_length >= self.first_codeword + WORD {
            let prev_index = (self.current_length - WORD) / WORD;
            let prev_value = self.word(prev_index).wrapping_sub(1);
            let prev_prev = if prev_index > self.first_codeword / WORD {
                self.word(prev_index - 1)
            } else {
                0
            };

            // A shifted byte that happens to look like a digit is not one
            if prev_prev != UPPER_SHIFT && prev_value.is_ascii_digit() {
                let pair = 10 * (prev_value - b'0') + (value - b'0') + 130;
                self.set_word(prev_index, pair);
                self.input_index += 1;
                return Ok(());
            }
        }

        if self.gs1 && value == GS {
            self.push_input_word(FNC1)?;
            self.increment_progress(WORD);
            self.input_index += 1;
            return Ok(());
        }

        if value >= 128 {
            self.push_input_word(UPPER_SHIFT)?;
            self.increment_progress(WORD);
            value -= 128;
        }

        self.push_input_word(value + 1)?;
        self.increment_progress(WORD);
        self.input_index += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::encoder::Scheme;
    use crate::encoder::channel::Channel;
    use crate::models::SizeRequest;

    fn ascii(input: &[u8]) -> Vec<u8> {
        let mut channel = Channel::new(input, SizeRequest::SquareAuto);
        while !channel.is_complete() {
            channel.encode_next_word(Scheme::Ascii).unwrap();
        }
        channel.codewords().to_vec()
    }

    #[test]
    fn test_digit_pairs() {
        assert_eq!(ascii(b"123456"), vec![142, 164, 186]);
        assert_eq!(ascii(b"12345"), vec![142, 164, 54]);
        assert_eq!(ascii(b"A12"), vec![66, 142]);
    }

    #[test]
    fn test_extended_bytes_use_upper_shift() {
        assert_eq!(ascii(&[0xc1]), vec![235, 66]);
        // Shifted 0xb1 decodes as '1' plus 128 and must not pair with the next digit
        assert_eq!(ascii(&[0xb1, b'2']), vec![235, 50, 51]);
    }

    #[test]
    fn test_gs1_group_separator_becomes_fnc1() {
        let mut channel = Channel::new_gs1(b"10A\x1d12", SizeRequest::SquareAuto).unwrap();
        while !channel.is_complete() {
            channel.encode_next_word(Scheme::Ascii).unwrap();
        }
        assert_eq!(channel.codewords(), &[232, 140, 66, 232, 142]);
    }
}
