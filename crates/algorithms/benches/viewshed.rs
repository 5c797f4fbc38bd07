//! Benchmarks for viewshed algorithms

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vantage_algorithms::viewshed::{cumulative_viewshed, viewshed, CvaParams, SweepParams};
use vantage_core::sites::Viewpoint;
use vantage_core::{GeoTransform, Raster};

fn create_dem(size: usize) -> Raster<f64> {
    let mut dem = Raster::new(size, size);
    dem.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));

    // Varied surface: sloping plane with a deterministic rough pattern
    for row in 0..size {
        for col in 0..size {
            let base = (row + col) as f64 * 0.1;
            let variation = ((row * 7 + col * 13) % 100) as f64 / 10.0;
            dem.set(row, col, base + variation).unwrap();
        }
    }
    dem
}

fn bench_viewshed(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewshed");

    for size in [128, 256, 512].iter() {
        let dem = create_dem(*size);
        let center = size / 2;

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                viewshed(
                    black_box(&dem),
                    center,
                    center,
                    &SweepParams::default(),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_cumulative(c: &mut Criterion) {
    let mut group = c.benchmark_group("cumulative_viewshed");
    group.sample_size(10);

    let dem = create_dem(256);
    let viewpoints: Vec<Viewpoint> = [(64, 64), (64, 192), (192, 64), (192, 192), (128, 128)]
        .iter()
        .map(|&(row, col)| Viewpoint { row, col, value: 1 })
        .collect();

    group.bench_function("5_viewpoints_256", |b| {
        b.iter(|| {
            cumulative_viewshed(
                black_box(&dem),
                black_box(&viewpoints),
                None,
                &CvaParams::default(),
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_viewshed, bench_cumulative);
criterion_main!(benches);
