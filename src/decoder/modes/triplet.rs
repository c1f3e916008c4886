use super::{GS, TRIPLET_UNLATCH};

/// Character set selected by the previous C40/Text value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Basic,
    Shift1,
    Shift2,
    Shift3,
}

/// Decoder state shared across codeword pairs
struct C40TextState {
    shift: Shift,
    upper_shift: bool,
}

impl C40TextState {
    fn push(&mut self, output: &mut Vec<u8>, value: u8) {
        output.push(if self.upper_shift {
            value.wrapping_add(128)
        } else {
            value
        });
        self.shift = Shift::Basic;
        self.upper_shift = false;
    }
}

/// Walk codeword pairs from `start`, handing each unpacked value to `emit`.
///
/// Stops after an explicit unlatch (which is consumed) or when a single codeword remains
/// (implicit unlatch, left for ASCII). The unlatch may directly follow the latch.
fn walk_triplets(code: &[u8], start: usize, mut emit: impl FnMut(u8)) -> usize {
    let end = code.len();
    let mut index = start;

    while index < end {
        if code[index] == TRIPLET_UNLATCH {
            return index + 1;
        }
        if end - index < 2 {
            break;
        }

        let packed = u16::from_be_bytes([code[index], code[index + 1]]).saturating_sub(1);
        index += 2;

        emit((packed / 1600) as u8);
        emit((packed / 40 % 40) as u8);
        emit((packed % 40) as u8);
    }

    index
}

/// C40 and Text decoder; the two differ only in which case the basic set holds
pub struct C40TextDecoder;

impl C40TextDecoder {
    /// Decode from `start` (just past the latch); `text` selects the Text scheme.
    pub fn decode(code: &[u8], start: usize, text: bool, output: &mut Vec<u8>) -> usize {
        let mut state = C40TextState {
            shift: Shift::Basic,
            upper_shift: false,
        };

        walk_triplets(code, start, |v| {
            let shift = state.shift;
            match shift {
                Shift::Basic => match v {
                    0..=2 => {
                        state.shift = match v {
                            0 => Shift::Shift1,
                            1 => Shift::Shift2,
                            _ => Shift::Shift3,
                        }
                    }
                    3 => state.push(output, b' '),
                    4..=13 => state.push(output, v - 4 + b'0'),
                    14..=39 if text => state.push(output, v - 14 + b'a'),
                    14..=39 => state.push(output, v - 14 + b'A'),
                    _ => {}
                },
                Shift::Shift1 => state.push(output, v),
                Shift::Shift2 => match v {
                    0..=14 => state.push(output, v + 33),
                    15..=21 => state.push(output, v + 43),
                    22..=26 => state.push(output, v + 69),
                    27 => state.push(output, GS),
                    30 => {
                        state.upper_shift = true;
                        state.shift = Shift::Basic;
                    }
                    // Unassigned values leave the shift pending
                    _ => {}
                },
                Shift::Shift3 if !text => state.push(output, v + 96),
                Shift::Shift3 => match v {
                    0 => state.push(output, 96),
                    1..=26 => state.push(output, v - 1 + b'A'),
                    _ => state.push(output, v + 96),
                },
            }
        })
    }
}

/// X12 decoder
pub struct X12Decoder;

impl X12Decoder {
    /// Decode from `start` (just past the latch).
    pub fn decode(code: &[u8], start: usize, output: &mut Vec<u8>) -> usize {
        walk_triplets(code, start, |v| match v {
            0 => output.push(13),
            1 => output.push(b'*'),
            2 => output.push(b'>'),
            3 => output.push(b' '),
            4..=13 => output.push(v + 44),
            14..=90 => output.push(v + 51),
            _ => {}
        })
    }
}
