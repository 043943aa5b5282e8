//! Physics engine benchmarks (criterion - wall-clock time).
//!
//! Run all:    cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//! Filter:     cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use quanta2d::ecs::components::body::Body;
use quanta2d::ecs::components::shape::CircleShape;
use quanta2d::ecs::resources::BroadphasePairs;
use quanta2d::fixed::{Fx, FxVec2};
use quanta2d::physics::narrowphase::circle_circle;
use quanta2d::physics::{broadphase, geometry};
use quanta2d_bench::*;

// ---------------------------------------------------------------------------
// Broadphase
// ---------------------------------------------------------------------------

fn bench_broadphase(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("broadphase/uniform_circles");
        for &n in &[100, 500, 1000, 2000] {
            let mut world = setup_circle_world(n);
            geometry::sync_all(&mut world, Fx::ONE / Fx::from_int(60), 0);
            let mut pairs = BroadphasePairs::default();
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| broadphase::find_pairs(&world, &mut pairs));
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("broadphase/mixed_shapes");
        for &n in &[100, 500, 1000, 2000] {
            let mut world = setup_mixed_world(n);
            geometry::sync_all(&mut world, Fx::ONE / Fx::from_int(60), 0);
            let mut pairs = BroadphasePairs::default();
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| broadphase::find_pairs(&world, &mut pairs));
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("broadphase/sparse");
        for &n in &[100, 500, 1000, 2000] {
            let mut world = setup_sparse_world(n);
            geometry::sync_all(&mut world, Fx::ONE / Fx::from_int(60), 0);
            let mut pairs = BroadphasePairs::default();
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| broadphase::find_pairs(&world, &mut pairs));
            });
        }
        group.finish();
    }
}

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

fn bench_narrowphase(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrowphase/circle_circle");
    let a = Body::new_dynamic(FxVec2::ZERO, Fx::ONE, Fx::ONE);
    let shape = CircleShape::new(Fx::ONE, Fx::ZERO).unwrap();

    let b_hit = Body::new_dynamic(FxVec2::new(Fx::from_f64(1.5), Fx::ZERO), Fx::ONE, Fx::ONE);
    group.bench_function("intersecting", |bencher| {
        bencher.iter(|| circle_circle::detect(&a, &shape, &b_hit, &shape));
    });

    let b_miss = Body::new_dynamic(FxVec2::new(Fx::from_int(5), Fx::ZERO), Fx::ONE, Fx::ONE);
    group.bench_function("separated", |bencher| {
        bencher.iter(|| circle_circle::detect(&a, &shape, &b_miss, &shape));
    });
    group.finish();

    let mut group = c.benchmark_group("narrowphase/batch");
    for &n in &[100, 500, 1000] {
        let pairs: Vec<_> = (0..n)
            .map(|i| {
                let x = Fx::from_f64((i as f64) * 3.0);
                let body_a = Body::new_dynamic(FxVec2::new(x, Fx::ZERO), Fx::ONE, Fx::ONE);
                let body_b = Body::new_dynamic(FxVec2::new(x + Fx::from_f64(1.5), Fx::ZERO), Fx::ONE, Fx::ONE);
                (body_a, body_b)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &pairs, |bencher, pairs| {
            bencher.iter(|| {
                for (body_a, body_b) in pairs {
                    circle_circle::detect(body_a, &shape, body_b, &shape);
                }
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver/contact_chain");
    for &n in &[10, 50, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
            bencher.iter_batched(
                || setup_contact_chain(n),
                |(mut world, mut physics)| {
                    physics.step(&mut world, physics.config.fixed_timestep);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();

    let mut group = c.benchmark_group("solver/iterations");
    for &iters in &[1, 4, 8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(iters), &iters, |bencher, &iters| {
            bencher.iter_batched(
                || {
                    let (world, mut physics) = setup_contact_chain(100);
                    physics.config.solver_iterations = iters;
                    (world, physics)
                },
                |(mut world, mut physics)| {
                    physics.step(&mut world, physics.config.fixed_timestep);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("pipeline/step");
        group.sample_size(30);
        for &n in &[50, 100, 500, 1000] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
                bencher.iter_batched(
                    || setup_scene(n),
                    |(mut world, mut physics)| {
                        physics.step(&mut world, physics.config.fixed_timestep);
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/sustained_10steps");
        group.sample_size(20);
        for &n in &[100, 500] {
            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bencher, &n| {
                bencher.iter_batched(
                    || setup_scene(n),
                    |(mut world, mut physics)| {
                        for _ in 0..10 {
                            physics.step(&mut world, physics.config.fixed_timestep);
                        }
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("pipeline/stages");
        let n = 500;
        let (mut world, _) = setup_scene(n);
        let dt = Fx::ONE / Fx::from_int(60);
        geometry::sync_all(&mut world, dt, 0);

        group.bench_function("broadphase_500", |bencher| {
            let mut pairs = BroadphasePairs::default();
            bencher.iter(|| broadphase::find_pairs(&world, &mut pairs));
        });

        group.bench_function("sync_geometry_500", |bencher| {
            bencher.iter_batched(
                || setup_scene(n).0,
                |mut w| geometry::sync_all(&mut w, dt, 0),
                criterion::BatchSize::LargeInput,
            );
        });
        group.finish();
    }
}

criterion_group!(benches, bench_broadphase, bench_narrowphase, bench_solver, bench_pipeline);
criterion_main!(benches);
