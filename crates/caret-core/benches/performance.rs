use caret_core::{MonoShaper, PieceTable, TextLayout, TextParams};
use criterion::{criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn large_document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("fn line_{i}() {{ let value = {i}; }}\n"))
        .collect()
}

fn bench_piece_table(c: &mut Criterion) {
    c.bench_function("insert_sequential_1k", |b| {
        b.iter(|| {
            let mut table = PieceTable::empty();
            for i in 0..1000 {
                table.insert(i, "x");
            }
            table
        })
    });

    c.bench_function("insert_random_1k", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            let mut table = PieceTable::new(&large_document(100));
            for _ in 0..1000 {
                let at = rng.gen_range(0..=table.len());
                table.insert(at, "y");
            }
            table
        })
    });

    c.bench_function("undo_redo_500", |b| {
        let mut table = PieceTable::empty();
        for i in 0..500 {
            table.insert(i * 2, "ab");
        }
        b.iter(|| {
            while table.undo().is_some() {}
            while table.redo().is_some() {}
        })
    });
}

fn bench_layout(c: &mut Criterion) {
    let text = large_document(1000);
    let params = TextParams {
        px_per_em: 14.0,
        max_width: 560.0,
        ..TextParams::default()
    };

    c.bench_function("layout_1k_lines_wrapped", |b| {
        let mut layout = TextLayout::new();
        let mut shaper = MonoShaper::new();
        b.iter(|| layout.layout(&text, &mut shaper, &params))
    });

    c.bench_function("closest_to_rune_queries", |b| {
        let mut layout = TextLayout::new();
        let mut shaper = MonoShaper::new();
        layout.layout(&text, &mut shaper, &params);
        let total = layout.total_runes();
        b.iter(|| {
            let mut acc = 0usize;
            for i in (0..total).step_by(97) {
                acc += layout.closest_to_rune(i).line;
            }
            acc
        })
    });
}

criterion_group!(benches, bench_piece_table, bench_layout);
criterion_main!(benches);
