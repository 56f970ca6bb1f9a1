//! Spectral estimator and filter chain benchmarks
//!
//! Compares the direct DFT against the FFT path across the sample counts
//! around the interactive ceiling, and times a typical cleanup chain.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sigchain_processing::{
    DirectDft, FastFourier, FilterChain, FilterKind, FilterStage, SpectralEstimator,
};
use std::f64::consts::PI;

fn test_signal(n: usize, sampling_rate: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / sampling_rate;
            (2.0 * PI * 10.0 * t).sin() + 0.3 * (2.0 * PI * 50.0 * t).sin()
        })
        .collect()
}

fn bench_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectrum");
    group.sample_size(10);

    for &size in &[256usize, 1024, 4096] {
        let signal = test_signal(size, 250.0);

        group.bench_with_input(BenchmarkId::new("direct", size), &signal, |b, signal| {
            b.iter(|| black_box(DirectDft.spectrum(black_box(signal), 250.0)))
        });

        group.bench_with_input(BenchmarkId::new("fft", size), &signal, |b, signal| {
            b.iter(|| black_box(FastFourier.spectrum(black_box(signal), 250.0)))
        });
    }

    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut chain = FilterChain::new();
    chain.append(FilterKind::Detrend);
    chain.append_stage(FilterStage::bandpass(1.0, 40.0, 4.0));
    chain.append(FilterKind::Notch);
    chain.append(FilterKind::Median);

    let signal = test_signal(20_000, 250.0);
    c.bench_function("chain_cleanup_20k", |b| {
        b.iter(|| black_box(chain.apply(black_box(&signal), 250.0)))
    });
}

criterion_group!(benches, bench_estimators, bench_chain);
criterion_main!(benches);
