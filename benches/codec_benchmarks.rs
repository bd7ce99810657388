//! Codec benchmarks
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stlcodec::{decode, encode, CodecConfig, Flavor, Mesh, Triangle};

const TRIANGLES: usize = 50_000;

fn bench_mesh() -> Mesh {
    (0..TRIANGLES)
        .map(|i| {
            let base = (i % 4096) as f32 * 0.01;
            Triangle::from_floats(std::array::from_fn(|k| base + k as f32))
        })
        .collect()
}

fn codec_benchmark(c: &mut Criterion) {
    let mesh = bench_mesh();
    let config = CodecConfig::default();

    for flavor in [Flavor::Binary, Flavor::Ascii] {
        let bytes = encode(&mesh, flavor, &config).unwrap();

        c.bench_function(&format!("encode_{}", flavor), |b| {
            b.iter(|| encode(black_box(&mesh), flavor, &config).unwrap())
        });
        c.bench_function(&format!("decode_{}", flavor), |b| {
            b.iter(|| decode(black_box(&bytes), flavor, &config).unwrap())
        });
    }
}

fn batch_size_benchmark(c: &mut Criterion) {
    let mesh = bench_mesh();
    let bytes = encode(&mesh, Flavor::Binary, &CodecConfig::default()).unwrap();

    for batch_size in [1_000, 10_000, 100_000] {
        let config = CodecConfig::new().with_batch_size(batch_size);
        c.bench_function(&format!("decode_binary_batch_{}", batch_size), |b| {
            b.iter(|| decode(black_box(&bytes), Flavor::Binary, &config).unwrap())
        });
    }
}

criterion_group!(benches, codec_benchmark, batch_size_benchmark);
criterion_main!(benches);
