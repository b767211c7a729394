//! Performance benchmarks for the DSP module
//!
//! Run with: cargo bench -p snapeq_dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use snapeq_dsp::{split, Equalizer, DEFAULT_UPDATE_CAPACITY};

fn test_buffer(frames: usize) -> Vec<i16> {
    (0..frames * 2)
        .map(|i| ((i as f32 * 0.001).sin() * 20000.0) as i16)
        .collect()
}

fn benchmark_eq_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("equalizer");

    // Common buffer sizes in audio applications
    let buffer_sizes = [64, 128, 256, 512, 1024, 2048];

    for frames in buffer_sizes {
        group.throughput(Throughput::Elements(frames as u64));

        group.bench_function(format!("process_{}_frames", frames), |b| {
            let mut eq = Equalizer::new();
            let mut buffer = test_buffer(frames);

            b.iter(|| {
                eq.process(black_box(&mut buffer), frames);
            });
        });

        group.bench_function(format!("processor_{}_frames", frames), |b| {
            let (_ctl, mut processor) = split(Equalizer::new(), DEFAULT_UPDATE_CAPACITY);
            let mut buffer = test_buffer(frames);

            b.iter(|| {
                processor.process(black_box(&mut buffer), frames);
            });
        });
    }

    group.finish();
}

fn benchmark_bypass(c: &mut Criterion) {
    c.bench_function("eq_disabled_2048_frames", |b| {
        let mut eq = Equalizer::new();
        eq.set_enabled(false);
        let mut buffer = test_buffer(2048);

        b.iter(|| {
            eq.process(black_box(&mut buffer), 2048);
        });
    });
}

fn benchmark_eq_coefficient_update(c: &mut Criterion) {
    c.bench_function("eq_set_band_gain", |b| {
        let mut eq = Equalizer::new();
        let mut band = 0;
        let mut gain = -15.0_f32;

        b.iter(|| {
            // Simulate dragging a slider
            eq.set_band_gain(band, gain).unwrap();
            band = (band + 1) % 10;
            gain = if gain >= 15.0 { -15.0 } else { gain + 1.0 };
        });
    });

    c.bench_function("eq_reinitialize", |b| {
        let mut eq = Equalizer::new();
        b.iter(|| {
            eq.reinitialize(black_box(48000)).unwrap();
        });
    });
}

fn benchmark_eq_frame_single(c: &mut Criterion) {
    c.bench_function("eq_process_single_frame", |b| {
        let mut eq = Equalizer::new();

        b.iter(|| {
            black_box(eq.process_frame(black_box(0.5), black_box(-0.5)));
        });
    });
}

criterion_group!(
    benches,
    benchmark_eq_processing,
    benchmark_bypass,
    benchmark_eq_coefficient_update,
    benchmark_eq_frame_single
);

criterion_main!(benches);
