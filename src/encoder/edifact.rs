use super::Scheme;
use super::channel::{Channel, EDIFACT_VALUE, Unlatch, WORD};
use crate::error::Result;
use crate::models::find_correct_symbol_size;

/// Pack four 6-bit values into three bytes
pub(crate) fn pack(values: [u8; 4]) -> [u8; 3] {
    [
        values[0] << 2 | (values[1] & 0x30) >> 4,
        (values[1] & 0x0f) << 4 | (values[2] & 0x3c) >> 2,
        (values[2] & 0x03) << 6 | (values[3] & 0x3f),
    ]
}

pub(crate) fn unpack(b0: u8, b1: u8, b2: u8) -> [u8; 4] {
    [
        b0 >> 2,
        (b0 & 0x03) << 4 | (b1 & 0xf0) >> 4,
        (b1 & 0x0f) << 2 | (b2 & 0xc0) >> 6,
        b2 & 0x3f,
    ]
}

impl Channel<'_> {
    pub(crate) fn encode_edifact_codeword(&mut self) -> Result<()> {
        let value = self.current_input()?;
        if !(32..=94).contains(&value) {
            self.reject(value);
            return Ok(());
        }

        self.push_input_word(value & 0x3f)?;
        self.increment_progress(EDIFACT_VALUE);
        self.input_index += 1;

        self.check_end_of_symbol_edifact()
    }

    /// Close the segment when the input runs out, or hand the last bytes to ASCII when they
    /// fit in the words left in the symbol without an unlatch.
    fn check_end_of_symbol_edifact(&mut self) -> Result<()> {
        let remaining_values = self.input.len() - self.input_index;
        if remaining_values > 4 {
            return Ok(());
        }

        let current_byte = self.current_length / WORD;
        let Some(size) = find_correct_symbol_size(current_byte, self.size_request) else {
            return Ok(());
        };
        let words_left = size.data_words().saturating_sub(current_byte);

        if self.current_length % WORD == 0
            && (1..=2).contains(&words_left)
            && remaining_values <= words_left
            && self.input[self.input_index..].iter().all(|&b| b < 128)
        {
            self.change_scheme(Scheme::Ascii, Unlatch::Implicit)?;
            while !self.is_complete() {
                self.encode_next_word(Scheme::Ascii)?;
            }
            return Ok(());
        }

        if remaining_values == 0 {
            self.change_scheme(Scheme::Ascii, Unlatch::Explicit)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SizeRequest;

    #[test]
    fn test_pack_unpack() {
        let values = [1, 49, 2, 50];
        let [b0, b1, b2] = pack(values);
        assert_eq!(unpack(b0, b1, b2), values);
    }

    #[test]
    fn test_explicit_unlatch_completes_group() {
        let mut channel = Channel::new(b"A1B", SizeRequest::SquareAuto);
        while !channel.is_complete() {
            channel.encode_next_word(Scheme::Edifact).unwrap();
        }
        assert_eq!(channel.scheme(), Scheme::Ascii);
        let mut expected = vec![240];
        expected.extend_from_slice(&pack([1, 49, 2, 31]));
        assert_eq!(channel.codewords(), expected.as_slice());
    }

    #[test]
    fn test_last_byte_falls_back_to_ascii() {
        // After one group a 12x12 symbol has a single word left, enough for "C" in ASCII
        let mut channel = Channel::new(b"A1B2C", SizeRequest::SquareAuto);
        while !channel.is_complete() {
            channel.encode_next_word(Scheme::Edifact).unwrap();
        }
        let mut expected = vec![240];
        expected.extend_from_slice(&pack([1, 49, 2, 50]));
        expected.push(b'C' + 1);
        assert_eq!(channel.codewords(), expected.as_slice());
    }

    #[test]
    fn test_lower_case_rejected() {
        let mut channel = Channel::new(b"a", SizeRequest::SquareAuto);
        channel.encode_next_word(Scheme::Edifact).unwrap();
        assert!(!channel.is_valid());
        assert_eq!(channel.rejected, Some(b'a'));
    }
}
