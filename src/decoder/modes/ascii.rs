use super::{FNC1, GS, PAD, UPPER_SHIFT};
use crate::encoder::Scheme;

/// Where an ASCII segment stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsciiEnd {
    /// A latch codeword sits at this index
    Latch(usize),
    /// Pad codeword found; this many pads follow it
    Pad(usize),
    /// All data codewords consumed
    Exhausted,
}

/// ASCII scheme decoder (the default scheme)
pub struct AsciiDecoder;

impl AsciiDecoder {
    /// Decode from `start` until a latch, the first pad or the end of `code`.
    pub fn decode(code: &[u8], start: usize, output: &mut Vec<u8>) -> AsciiEnd {
        let mut upper_shift = false;
        let mut index = start;

        while index < code.len() {
            let cw = code[index];
            if Scheme::from_latch(cw) != Scheme::Ascii {
                return AsciiEnd::Latch(index);
            }
            index += 1;

            if upper_shift {
                output.push(cw.wrapping_add(127));
                upper_shift = false;
            } else if cw == UPPER_SHIFT {
                upper_shift = true;
            } else if cw == PAD {
                return AsciiEnd::Pad(code.len() - index);
            } else if cw <= 128 {
                output.push(cw.wrapping_sub(1));
            } else if cw <= 229 {
                let digits = cw - 130;
                output.push(b'0' + digits / 10);
                output.push(b'0' + digits % 10);
            } else if cw == FNC1 {
                output.push(GS);
            }
            // Structured append, reader programming, macros past the first position and ECI
            // carry no output
        }

        AsciiEnd::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_characters_and_digits() {
        // "A" "12" "34" "b"
        let code = [66, 142, 164, 99];
        let mut out = Vec::new();
        assert_eq!(AsciiDecoder::decode(&code, 0, &mut out), AsciiEnd::Exhausted);
        assert_eq!(out, b"A1234b");
    }

    #[test]
    fn test_upper_shift() {
        let code = [UPPER_SHIFT, 66];
        let mut out = Vec::new();
        AsciiDecoder::decode(&code, 0, &mut out);
        assert_eq!(out, vec![0xc1]);
    }

    #[test]
    fn test_stops_at_pad() {
        let code = [66, PAD, 175, 70];
        let mut out = Vec::new();
        assert_eq!(AsciiDecoder::decode(&code, 0, &mut out), AsciiEnd::Pad(2));
        assert_eq!(out, b"A");
    }

    #[test]
    fn test_stops_at_latch() {
        let code = [66, 230, 1, 2];
        let mut out = Vec::new();
        assert_eq!(AsciiDecoder::decode(&code, 0, &mut out), AsciiEnd::Latch(1));
        assert_eq!(out, b"A");
    }

    #[test]
    fn test_fnc1_inside_data_is_group_separator() {
        let code = [142, FNC1, 164];
        let mut out = Vec::new();
        AsciiDecoder::decode(&code, 0, &mut out);
        assert_eq!(out, b"12\x1d34");
    }
}
