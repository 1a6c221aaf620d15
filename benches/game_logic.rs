use criterion::{black_box, criterion_group, criterion_main, Criterion};
use blockrise::core::{AvalancheEngine, GameState, Grid, SimpleRng};
use blockrise::types::{Command, GARBAGE_CELL, TICK_SECS};

fn bench_tick(c: &mut Criterion) {
    let mut state = GameState::new(12345);

    c.bench_function("game_update_tick", |b| {
        b.iter(|| {
            state.update(black_box(TICK_SECS));
        })
    });
}

fn bench_resolve_clear(c: &mut Criterion) {
    let mut template = Grid::new();
    let rows = template.rows() as i32;
    for row in rows - 4..rows {
        for col in 0..template.cols() as i32 {
            template.set(col, row, GARBAGE_CELL);
        }
    }
    let mut engine = AvalancheEngine::for_grid(&template);

    c.bench_function("resolve_4_lines", |b| {
        b.iter(|| {
            let mut grid = template.clone();
            engine.resolve(&mut grid, 1)
        })
    });
}

fn bench_resolve_garbage_stack(c: &mut Criterion) {
    let mut template = Grid::new();
    let mut rng = SimpleRng::new(7);
    for _ in 0..40 {
        template.rise_with_garbage(&mut rng);
    }
    let mut engine = AvalancheEngine::for_grid(&template);

    c.bench_function("resolve_40_garbage_rows", |b| {
        b.iter(|| {
            let mut grid = template.clone();
            engine.resolve(&mut grid, 1)
        })
    });
}

fn bench_spawn(c: &mut Criterion) {
    c.bench_function("new_game_spawn", |b| {
        b.iter(|| GameState::new(black_box(99)))
    });
}

fn bench_commands(c: &mut Criterion) {
    let mut state = GameState::new(12345);

    c.bench_function("move_and_rotate", |b| {
        b.iter(|| {
            state.apply_command(Command::MoveLeft);
            state.apply_command(Command::RotateCw);
            state.apply_command(Command::MoveRight);
        })
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_resolve_clear,
    bench_resolve_garbage_stack,
    bench_spawn,
    bench_commands
);
criterion_main!(benches);
