use astc_encoder_codec::block::endpoints::ColourEndpointMode;
use astc_encoder_codec::block::{
    decode_block, BlockEncoder, ColourSpace, EncoderEffort, MAX_TEXELS_PER_BLOCK,
};
use astc_encoder_codec::BlockFootprint;
use core::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
use pprof::criterion::{Output, PProfProfiler};

const BLOCK_COUNT: usize = 256;

/// Texels along a ramp with a little per block variation, so blocks are not constant.
fn test_blocks(footprint: BlockFootprint) -> Vec<Vec<[f32; 4]>> {
    (0..BLOCK_COUNT)
        .map(|block| {
            (0..footprint.texel_count())
                .map(|texel| {
                    let t = texel as f32 / footprint.texel_count() as f32;
                    let shift = (block % 17) as f32 / 17.0;
                    [t, (t + shift) % 1.0, 1.0 - t, 1.0]
                })
                .collect()
        })
        .collect()
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ASTC Block Codec");
    group.throughput(Throughput::Elements(BLOCK_COUNT as u64));

    for footprint in [
        BlockFootprint::Block4x4,
        BlockFootprint::Block6x6,
        BlockFootprint::Block8x8,
    ] {
        let blocks = test_blocks(footprint);
        let name = format!("{}x{}", footprint.width(), footprint.height());

        for (label, quality) in [("fast", 0.1), ("thorough", 0.98)] {
            let encoder = BlockEncoder::new(
                footprint,
                ColourEndpointMode::Rgba,
                ColourSpace::Srgb,
                EncoderEffort::from_quality(quality),
            );
            group.bench_function(format!("encode_{name}_{label}"), |b| {
                b.iter(|| {
                    for block in &blocks {
                        black_box(encoder.encode(black_box(block)));
                    }
                })
            });
        }

        let encoder = BlockEncoder::new(
            footprint,
            ColourEndpointMode::Rgba,
            ColourSpace::Srgb,
            EncoderEffort::from_quality(0.6),
        );
        let encoded: Vec<[u8; 16]> = blocks.iter().map(|block| encoder.encode(block)).collect();
        let mut texels = [[0u16; 4]; MAX_TEXELS_PER_BLOCK];
        group.bench_function(format!("decode_{name}"), |b| {
            b.iter(|| {
                for block in &encoded {
                    let _ = decode_block(black_box(block), footprint, ColourSpace::Srgb, &mut texels);
                }
                black_box(&texels);
            })
        });
    }

    group.finish();
}

#[cfg(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
))]
criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}

#[cfg(not(all(
    any(target_os = "linux", target_os = "macos"),
    any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
)))]
criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
