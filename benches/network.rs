//! Criterion benchmarks for the counting network.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use critter::prelude::*;
use critter::perception::REFERENCE_RGB;

fn make_critter(dimensions: usize, mode: SelectionMode) -> Critter {
    let cfg = CritterConfig::default()
        .with_dimensions(dimensions)
        .with_selection_mode(mode);
    match Critter::new(cfg) {
        Ok(c) => c,
        Err(e) => panic!("bench config rejected: {e}"),
    }
}

/// Benchmark step() with varying vocabulary dimensions.
fn bench_step_dimensions(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_dimensions");
    let input = SensoryInput::current(REFERENCE_RGB[Colour::Red.index()]);

    for dims in [64usize, 128, 256, 512] {
        group.throughput(Throughput::Elements(dims as u64));
        group.bench_with_input(BenchmarkId::new("soft", dims), &dims, |b, &dims| {
            let mut critter = make_critter(dims, SelectionMode::Soft { sharpness: 40.0 });
            b.iter(|| {
                critter.step(black_box(&input));
                black_box(critter.count(Colour::Red))
            });
        });
    }

    group.finish();
}

/// Soft blending vs. one-hot selection at the default dimension.
fn bench_step_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_mode");
    let input = SensoryInput::current(REFERENCE_RGB[Colour::Background.index()]);

    for (name, mode) in [
        ("soft", SelectionMode::Soft { sharpness: 40.0 }),
        ("winner_take_all", SelectionMode::WinnerTakeAll),
    ] {
        group.bench_function(name, |b| {
            let mut critter = make_critter(64, mode);
            b.iter(|| {
                critter.step(black_box(&input));
                black_box(critter.diagnostics().steps)
            });
        });
    }

    group.finish();
}

/// The full red/white/green scenario, 3.5 simulated seconds.
fn bench_scenario(c: &mut Criterion) {
    let scenario = ColourScenario::red_white_green();
    c.bench_function("scenario_red_white_green", |b| {
        b.iter(|| {
            let mut critter = make_critter(64, SelectionMode::Soft { sharpness: 40.0 });
            black_box(scenario.run(&mut critter).total_pulses())
        });
    });
}

/// Vocabulary construction (rejection sampling) cost.
fn bench_vocabulary(c: &mut Criterion) {
    let mut group = c.benchmark_group("vocabulary");
    for dims in [32usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(dims), &dims, |b, &dims| {
            let cfg = VocabularyConfig {
                dimensions: dims,
                ..Default::default()
            };
            b.iter(|| black_box(Vocabulary::new(black_box(&cfg)).is_ok()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_step_dimensions,
    bench_step_modes,
    bench_scenario,
    bench_vocabulary
);
criterion_main!(benches);
