use criterion::*;
use std::hint::black_box;

use substrate::World;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    let mut world = World::new();
    populate(&mut world, AGENTS_MED, 97);

    group.bench_function("match1_position_100k", |b| {
        b.iter(|| {
            let mut total = 0.0f32;
            world.match1::<Position, _>(|position| total += position.x);
            black_box(total);
        });
    });

    group.bench_function("match2_position_velocity_100k", |b| {
        b.iter(|| {
            world.match2::<Position, Velocity, _>(|position, velocity| {
                position.x += velocity.dx;
                position.y += velocity.dy;
            });
        });
    });

    group.bench_function("match2_rare_pivot_100k", |b| {
        b.iter(|| {
            let mut hits = 0u32;
            world.match2::<Position, Flagged, _>(|_, flagged| hits += flagged.0 & 1);
            black_box(hits);
        });
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
