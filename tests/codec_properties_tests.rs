//! Structural properties of the codec that hold for every symbol size.

use rust_dmtx::decoder::message::decode_data_stream;
use rust_dmtx::decoder::placement::module_placement;
use rust_dmtx::decoder::reed_solomon::decode_check_errors;
use rust_dmtx::detector::scan_grid::ScanGrid;
use rust_dmtx::models::Message;
use rust_dmtx::models::message::{MODULE_ASSIGNED, MODULE_ON_RGB, MODULE_VISITED};
use rust_dmtx::{DmtxError, EncodeOptions, Scheme, SizeRequest, SymbolSize, encode, encode_codewords};
use std::collections::HashSet;

#[test]
fn test_capacity_exceeded() {
    let data = vec![b'x'; 1600];
    assert!(matches!(
        encode(&data, &EncodeOptions::default()),
        Err(DmtxError::CapacityExceeded { .. })
    ));

    let fixed = SizeRequest::Fixed(SymbolSize::SQUARE_10X10);
    assert!(matches!(
        encode_codewords(b"0123456789ABCDEF", Scheme::Ascii, fixed),
        Err(DmtxError::CapacityExceeded { .. })
    ));
}

#[test]
fn test_largest_square_holds_its_capacity() {
    // 3116 digits pack into exactly 1558 codewords
    let digits = vec![b'7'; 3116];
    let (size, codewords) = encode_codewords(&digits, Scheme::Ascii, SizeRequest::SquareAuto)
        .expect("fits 144x144");
    assert_eq!(size.rows(), 144);
    assert_eq!(codewords.len(), size.total_words());

    let more = vec![b'7'; 3118];
    assert!(encode_codewords(&more, Scheme::Ascii, SizeRequest::SquareAuto).is_err());
}

#[test]
fn test_placement_is_a_bijection() {
    for size in SymbolSize::all() {
        let cells = size.mapping_rows() * size.mapping_cols();
        let mut modules = vec![0u8; cells];
        let mut code = vec![0u8; size.total_words()];
        module_placement(&mut modules, &mut code, size, MODULE_ON_RGB).expect("placement");

        let visited = modules.iter().filter(|&&m| m & MODULE_VISITED != 0).count();
        let assigned = modules.iter().filter(|&&m| m & MODULE_ASSIGNED != 0).count();
        assert_eq!(visited, size.total_words() * 8, "{size}");
        assert_eq!(assigned, visited, "{size}");
        // Only the fixed 2x2 corner of some sizes is left out of the walk
        assert!(cells == visited || cells == visited + 4, "{size}");
    }
}

#[test]
fn test_scan_grid_visits_every_pixel_once() {
    for (w, h) in [(37, 23), (64, 64), (5, 90)] {
        let grid = ScanGrid::new(0, w - 1, 0, h - 1, 1).expect("valid area");
        let mut seen = HashSet::new();
        for loc in grid {
            assert!(seen.insert((loc.x, loc.y)), "{w}x{h}: ({}, {}) twice", loc.x, loc.y);
        }
        assert_eq!(seen.len(), (w * h) as usize, "{w}x{h}");
    }
}

#[test]
fn test_reed_solomon_corrects_through_placement() {
    let data = b"error correction survives module damage";
    let (size, codewords) =
        encode_codewords(data, Scheme::Ascii, SizeRequest::SquareAuto).expect("encodes");

    // Lay the codewords into modules, then read them back from a damaged copy
    let mut written = codewords.clone();
    let mut modules = vec![0u8; size.mapping_rows() * size.mapping_cols()];
    module_placement(&mut modules, &mut written, size, MODULE_ON_RGB).expect("placement");

    let mut damaged: Vec<u8> = modules
        .iter()
        .map(|&m| (m & MODULE_ON_RGB) | MODULE_ASSIGNED)
        .collect();
    for cell in damaged.iter_mut().take(8) {
        *cell ^= MODULE_ON_RGB;
    }

    let mut msg = Message::new(size);
    msg.array = damaged;
    module_placement(&mut msg.array, &mut msg.code, size, MODULE_ON_RGB).expect("read back");
    assert_ne!(msg.code, codewords);

    let corrected = decode_check_errors(&mut msg.code, size).expect("within capacity");
    assert!(corrected > 0);
    assert_eq!(msg.code, codewords);
    assert!(decode_data_stream(&mut msg));
    assert_eq!(msg.output, data.to_vec());
}

#[test]
fn test_reed_solomon_rejects_heavy_damage() {
    let (size, mut codewords) =
        encode_codewords(b"12", Scheme::Ascii, SizeRequest::SquareAuto).expect("encodes");
    assert_eq!(size, SymbolSize::SQUARE_10X10);
    for word in codewords.iter_mut() {
        *word ^= 0x5a;
    }
    assert!(decode_check_errors(&mut codewords, size).is_err());
}
