//! Codeword stream to output bytes

use crate::decoder::modes::ascii::{AsciiDecoder, AsciiEnd};
use crate::decoder::modes::base256::Base256Decoder;
use crate::decoder::modes::edifact::EdifactDecoder;
use crate::decoder::modes::triplet::{C40TextDecoder, X12Decoder};
use crate::decoder::modes::{FNC1, MACRO_05, MACRO_06};
use crate::encoder::Scheme;
use crate::models::Message;

/// `[)>` RS `0`, followed by the macro digit and GS
const MACRO_HEADER: &[u8] = b"[)>\x1e0";
/// RS EOT
const MACRO_TRAILER: &[u8] = b"\x1e\x04";

/// Translate the data codewords of `msg` into `msg.output`.
///
/// Returns `false` when the stream is malformed (a Base256 length overrunning the symbol).
pub fn decode_data_stream(msg: &mut Message) -> bool {
    let data_words = msg.data_words();
    let code = &msg.code[..data_words];
    let output = &mut msg.output;
    output.clear();
    msg.pad_count = 0;

    let mut index = 0;
    let macro_digit = match code.first() {
        Some(&MACRO_05) => Some(b'5'),
        Some(&MACRO_06) => Some(b'6'),
        _ => None,
    };
    if let Some(digit) = macro_digit {
        output.extend_from_slice(MACRO_HEADER);
        output.push(digit);
        output.push(0x1d);
        index += 1;
    }

    // Leading FNC1 flags GS1 data and is not part of the message
    if code.get(index) == Some(&FNC1) {
        index += 1;
    }

    while index < data_words {
        let scheme = Scheme::from_latch(code[index]);
        if scheme != Scheme::Ascii {
            index += 1;
        }

        index = match scheme {
            Scheme::C40 => C40TextDecoder::decode(code, index, false, output),
            Scheme::Text => C40TextDecoder::decode(code, index, true, output),
            Scheme::X12 => X12Decoder::decode(code, index, output),
            Scheme::Edifact => EdifactDecoder::decode(code, index, output),
            Scheme::Base256 => match Base256Decoder::decode(code, index, output) {
                Some(next) => next,
                None => return false,
            },
            _ => match AsciiDecoder::decode(code, index, output) {
                AsciiEnd::Latch(next) => next,
                AsciiEnd::Pad(count) => {
                    msg.pad_count = count;
                    break;
                }
                AsciiEnd::Exhausted => data_words,
            },
        };
    }

    if macro_digit.is_some() {
        output.extend_from_slice(MACRO_TRAILER);
    }

    tracing::trace!(
        bytes = output.len(),
        pad_count = msg.pad_count,
        "data stream decoded"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SymbolSize;

    fn message_with(data: &[u8]) -> Message {
        let size = SymbolSize::all()
            .find(|s| s.data_words() >= data.len())
            .unwrap();
        let mut msg = Message::new(size);
        msg.code[..data.len()].copy_from_slice(data);
        for cw in &mut msg.code[data.len()..size.data_words()] {
            *cw = 129;
        }
        msg
    }

    #[test]
    fn test_ascii_with_pad() {
        // "123456" as three digit pairs, then pad
        let mut msg = message_with(&[142, 164, 186]);
        assert!(decode_data_stream(&mut msg));
        assert_eq!(msg.output, b"123456");
    }

    #[test]
    fn test_macro_05() {
        let mut msg = message_with(&[MACRO_05, 66, 67]);
        assert!(decode_data_stream(&mut msg));
        assert_eq!(msg.output, b"[)>\x1e05\x1dAB\x1e\x04");
    }

    #[test]
    fn test_gs1_leading_fnc1_dropped() {
        // FNC1 "10" "A" FNC1 "12"
        let mut msg = message_with(&[FNC1, 140, 66, FNC1, 142]);
        assert!(decode_data_stream(&mut msg));
        assert_eq!(msg.output, b"10A\x1d12");
    }

    #[test]
    fn test_empty_c40_segment_resumes_ascii() {
        // C40 latch, immediate unlatch, ASCII "C", pad
        let mut msg = message_with(&[230, 254, b'C' + 1]);
        assert!(decode_data_stream(&mut msg));
        assert_eq!(msg.output, b"C");
    }

    #[test]
    fn test_latch_switches_scheme() {
        // "A", latch C40, "BCD", unlatch, "E"
        let packed: u16 = 1600 * 15 + 40 * 16 + 17 + 1;
        let [hi, lo] = packed.to_be_bytes();
        let mut msg = message_with(&[66, 230, hi, lo, 254, 70]);
        assert!(decode_data_stream(&mut msg));
        assert_eq!(msg.output, b"ABCDE");
    }
}
