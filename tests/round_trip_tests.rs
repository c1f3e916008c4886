//! Encode, render and decode again through the public API.
//!
//! Images are synthetic, so every test runs without fixtures.

use image::RgbImage;
use rust_dmtx::tools::to_rgb_image;
use rust_dmtx::{
    DecodeOptions, Detector, EncodeOptions, PackOrder, PixelBuffer, PixelLayout, Rgb, Scheme,
    SizeRequest, decode, decode_mosaic, encode, encode_mosaic,
};
use std::time::Duration;

fn options() -> DecodeOptions {
    DecodeOptions::default().with_timeout(Duration::from_secs(3))
}

fn from_rgb_image(img: RgbImage) -> PixelBuffer {
    let (width, height) = img.dimensions();
    PixelBuffer::from_raw(
        img.into_raw(),
        PixelLayout::new(width as usize, height as usize, PackOrder::Rgb24),
    )
    .expect("layout matches the image")
}

fn round_trip(data: &[u8], encode_options: &EncodeOptions) -> Vec<Vec<u8>> {
    let symbol = encode(data, encode_options).expect("encodes");
    decode(&symbol.image.view(), &options()).expect("decode runs")
}

#[test]
fn test_hello_world_round_trip() {
    let encode_options = EncodeOptions::default().with_module_size(8, 4);
    let found = round_trip(b"Hello World!", &encode_options);
    assert_eq!(found, vec![b"Hello World!".to_vec()]);
}

#[test]
fn test_gs1_round_trip() {
    let encode_options = EncodeOptions::default().with_scheme(Scheme::AsciiGs1);
    let found = round_trip(b"10AC3454G3", &encode_options);
    assert_eq!(found, vec![b"10AC3454G3".to_vec()]);
}

#[test]
fn test_every_scheme_round_trips() {
    let cases: [(&[u8], Scheme); 7] = [
        (b"ascii 1234567890", Scheme::Ascii),
        (b"C40 UPPER CASE 123", Scheme::C40),
        (b"text lower case 123", Scheme::Text),
        (b"X12*DATA>123 ", Scheme::X12),
        (b"EDIFACT: A-Z 0-9", Scheme::Edifact),
        (&[0u8, 1, 2, 200, 255, 128, 64], Scheme::Base256),
        (b"Mixed CONTENT 0123456789 abc", Scheme::AutoBest),
    ];
    for (data, scheme) in cases {
        let encode_options = EncodeOptions::default().with_scheme(scheme);
        let found = round_trip(data, &encode_options);
        assert_eq!(found, vec![data.to_vec()], "{scheme}");
    }
}

#[test]
fn test_rectangular_symbol_round_trip() {
    let encode_options = EncodeOptions::default().with_size_request(SizeRequest::RectAuto);
    let found = round_trip(b"RECT 42", &encode_options);
    assert_eq!(found, vec![b"RECT 42".to_vec()]);
}

#[test]
fn test_large_symbol_round_trip() {
    // Enough data for a multi-region symbol with interleaved blocks
    let data: Vec<u8> = (0..400).map(|i| b'A' + (i % 26) as u8).collect();
    let encode_options = EncodeOptions::default().with_module_size(3, 6);
    let found = round_trip(&data, &encode_options);
    assert_eq!(found, vec![data]);
}

#[test]
fn test_rotated_symbol_decodes() {
    let symbol = encode(b"rotated", &EncodeOptions::default()).expect("encodes");
    let rgb = to_rgb_image(&symbol.image).expect("rgb conversion");
    let rotated = from_rgb_image(image::imageops::rotate90(&rgb));

    let found = decode(&rotated.view(), &options()).expect("decode runs");
    assert_eq!(found, vec![b"rotated".to_vec()]);
}

#[test]
fn test_symbol_on_larger_canvas() {
    let symbol = encode(b"offset", &EncodeOptions::default()).expect("encodes");
    let rgb = to_rgb_image(&symbol.image).expect("rgb conversion");
    let mut canvas = RgbImage::from_pixel(300, 220, image::Rgb([255, 255, 255]));
    image::imageops::overlay(&mut canvas, &rgb, 130, 40);
    let buffer = from_rgb_image(canvas);

    let found = decode(&buffer.view(), &options()).expect("decode runs");
    assert_eq!(found, vec![b"offset".to_vec()]);
}

#[test]
fn test_bgr_and_grayscale_packing() {
    for pack in [PackOrder::Bgr24, PackOrder::K8] {
        let encode_options = EncodeOptions::default().with_pack(pack);
        let found = round_trip(b"packing", &encode_options);
        assert_eq!(found, vec![b"packing".to_vec()], "{pack:?}");
    }
}

#[test]
fn test_custom_colors_on_grey() {
    let encode_options =
        EncodeOptions::default().with_colors(Rgb::new(20, 20, 90), Rgb::new(210, 210, 210));
    let found = round_trip(b"colours", &encode_options);
    assert_eq!(found, vec![b"colours".to_vec()]);
}

#[test]
fn test_mosaic_round_trip() {
    let data = b"Data Mosaic carries three layers";
    let symbol = encode_mosaic(data, &EncodeOptions::default()).expect("encodes");
    let found = decode_mosaic(&symbol.image.view(), &options()).expect("decode runs");
    assert_eq!(found, vec![data.to_vec()]);
}

#[test]
fn test_max_results_caps_output() {
    let symbol = encode(b"one", &EncodeOptions::default()).expect("encodes");
    let decode_options = options().with_max_results(1);
    let found = decode(&symbol.image.view(), &decode_options).expect("decode runs");
    assert_eq!(found.len(), 1);
}

#[test]
fn test_batch_decoding() {
    let first = encode(b"first", &EncodeOptions::default()).expect("encodes");
    let second = encode(b"second", &EncodeOptions::default()).expect("encodes");
    let views = [first.image.view(), second.image.view()];

    let detector = Detector::new().with_options(options());
    let results = detector.decode_batch(&views);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().expect("first"), &vec![b"first".to_vec()]);
    assert_eq!(results[1].as_ref().expect("second"), &vec![b"second".to_vec()]);
}

#[test]
fn test_blank_image_finds_nothing() {
    let buffer = PixelBuffer::filled(PixelLayout::new(120, 90, PackOrder::Rgb24), 255)
        .expect("valid layout");
    let found = decode(&buffer.view(), &options()).expect("decode runs");
    assert!(found.is_empty());
}
