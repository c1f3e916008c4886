use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_dmtx::{
    DecodeOptions, Detector, EncodeOptions, Scheme, SizeRequest, decode, encode, encode_codewords,
};

const MESSAGE: &[u8] = b"Data Matrix benchmark payload 0123456789";

fn bench_encode_schemes(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_codewords");
    for scheme in [Scheme::Ascii, Scheme::C40, Scheme::Base256, Scheme::AutoBest] {
        group.bench_with_input(BenchmarkId::from_parameter(scheme), &scheme, |b, &scheme| {
            b.iter(|| encode_codewords(black_box(MESSAGE), scheme, SizeRequest::SquareAuto))
        });
    }
    group.finish();
}

fn bench_encode_render(c: &mut Criterion) {
    let options = EncodeOptions::default();
    c.bench_function("encode_render_default", |b| {
        b.iter(|| encode(black_box(MESSAGE), &options))
    });
}

fn bench_decode(c: &mut Criterion) {
    let symbol = match encode(MESSAGE, &EncodeOptions::default()) {
        Ok(symbol) => symbol,
        Err(e) => panic!("benchmark symbol failed to encode: {e}"),
    };
    let view = symbol.image.view();
    let options = DecodeOptions::default();
    c.bench_function("decode_rendered_symbol", |b| {
        b.iter(|| decode(black_box(&view), &options))
    });

    let mut detector = Detector::with_pool();
    c.bench_function("decode_rendered_symbol_pooled", |b| {
        b.iter(|| detector.decode(black_box(&view)))
    });
}

criterion_group!(benches, bench_encode_schemes, bench_encode_render, bench_decode);
criterion_main!(benches);
