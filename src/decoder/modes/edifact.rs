use super::EDIFACT_UNLATCH;

/// EDIFACT decoder: four 6-bit values in every three codewords
pub struct EdifactDecoder;

impl EdifactDecoder {
    /// Decode from `start` (just past the latch).
    ///
    /// Stops at the unlatch value (resuming on the next byte boundary) or when fewer than
    /// three codewords remain after a complete group.
    pub fn decode(code: &[u8], start: usize, output: &mut Vec<u8>) -> usize {
        let end = code.len();
        let mut index = start;
        let byte = |i: usize| code.get(i).copied().unwrap_or(0);

        while index < end {
            let (b0, b1, b2) = (byte(index), byte(index + 1), byte(index + 2));
            let unpacked = [
                b0 >> 2,
                (b0 & 0x03) << 4 | (b1 & 0xf0) >> 4,
                (b1 & 0x0f) << 2 | (b2 & 0xc0) >> 6,
                b2 & 0x3f,
            ];

            for (i, &value) in unpacked.iter().enumerate() {
                if i < 3 {
                    index += 1;
                }
                if value == EDIFACT_UNLATCH {
                    return index.min(end);
                }
                if index > end {
                    return end;
                }
                // Values 0..31 stand for 64..95, 32..63 for themselves
                output.push(value ^ (((value & 0x20) ^ 0x20) << 1));
            }

            if end - index < 3 {
                return index;
            }
        }

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(values: [u8; 4]) -> [u8; 3] {
        [
            values[0] << 2 | values[1] >> 4,
            (values[1] & 0x0f) << 4 | values[2] >> 2,
            (values[2] & 0x03) << 6 | values[3],
        ]
    }

    #[test]
    fn test_full_group() {
        // "A1B2": A=1, '1'=49, B=2, '2'=50
        let code = pack([1, 49, 2, 50]);
        let mut out = Vec::new();
        let next = EdifactDecoder::decode(&code, 0, &mut out);
        assert_eq!(out, b"A1B2");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_unlatch_mid_group() {
        // "AB" then unlatch; the remainder of the third byte is padding
        let mut code = pack([1, 2, EDIFACT_UNLATCH, 0]).to_vec();
        code.push(66);
        let mut out = Vec::new();
        let next = EdifactDecoder::decode(&code, 0, &mut out);
        assert_eq!(out, b"AB");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_unlatch_first_value() {
        let mut code = pack([EDIFACT_UNLATCH, 0, 0, 0]).to_vec();
        code.truncate(1);
        code.push(66);
        let mut out = Vec::new();
        assert_eq!(EdifactDecoder::decode(&code, 0, &mut out), 1);
        assert!(out.is_empty());
    }
}
