use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use zappy_core::{GameState, WorldState};

fn map_content(size: u32) -> Vec<String> {
    let mut lines = vec![format!("msz {} {}", size, size), "tna red".to_string()];
    for y in 0..size {
        for x in 0..size {
            lines.push(format!("bct {} {} {} 1 0 2 0 0 1", x, y, (x + y) % 5));
        }
    }
    for id in 0..size {
        lines.push(format!("pnw #{} {} {} 1 1 red", id, id, id));
        lines.push(format!("ppo #{} {} {} 2", id, (id + 1) % size, id));
        lines.push(format!("pbc #{} hello", id));
    }
    lines
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for size in [8u32, 32, 64] {
        let lines = map_content(size);
        group.bench_with_input(BenchmarkId::new("world", size), &lines, |b, lines| {
            b.iter_batched(
                WorldState::default,
                |mut world| {
                    for line in lines {
                        zappy_core::dispatch_line(&mut world, line);
                    }
                    world
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("locked", size), &lines, |b, lines| {
            b.iter_batched(
                GameState::new,
                |state| {
                    for line in lines {
                        state.dispatch_line(line);
                    }
                    state
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(dispatch_benches, bench_dispatch);
criterion_main!(dispatch_benches);
