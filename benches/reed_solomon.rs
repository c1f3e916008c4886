use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_dmtx::SymbolSize;
use rust_dmtx::decoder::reed_solomon::{decode_check_errors, generate_ecc};

fn codewords(size: SymbolSize) -> Vec<u8> {
    let mut code: Vec<u8> = (0..size.total_words()).map(|i| (i * 31 + 7) as u8).collect();
    if let Err(e) = generate_ecc(&mut code, size) {
        panic!("ecc generation failed: {e}");
    }
    code
}

fn bench_generate(c: &mut Criterion) {
    let size = SymbolSize::SQUARE_144X144;
    let code = codewords(size);
    c.bench_function("rs_generate_144x144", |b| {
        b.iter(|| {
            let mut code = code.clone();
            generate_ecc(black_box(&mut code), size)
        })
    });
}

fn bench_check_clean(c: &mut Criterion) {
    let size = SymbolSize::SQUARE_144X144;
    let code = codewords(size);
    c.bench_function("rs_check_clean_144x144", |b| {
        b.iter(|| {
            let mut code = code.clone();
            decode_check_errors(black_box(&mut code), size)
        })
    });
}

fn bench_correct(c: &mut Criterion) {
    let size = SymbolSize::SQUARE_144X144;
    let mut damaged = codewords(size);
    // One error per interleaved block
    for word in damaged.iter_mut().take(size.interleaved_blocks()) {
        *word ^= 0xa5;
    }
    c.bench_function("rs_correct_144x144", |b| {
        b.iter(|| {
            let mut code = damaged.clone();
            decode_check_errors(black_box(&mut code), size)
        })
    });
}

criterion_group!(benches, bench_generate, bench_check_clean, bench_correct);
criterion_main!(benches);
