//! Benchmarks for layout building and hit resolution.
//!
//! Run with: cargo bench -p tapboard-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::fmt::Write as _;
use std::hint::black_box;
use tapboard_layout::{HitResolver, Keyboard, LayoutParams, LayoutSource};

/// A `rows × columns` letter grid sized for a 1080px display.
fn grid_document(rows: usize, columns: usize) -> String {
    let mut doc = String::from("[keyboard]\nkey_width = \"9%p\"\nkey_height = 120\nhorizontal_gap = \"1%p\"\n");
    for row in 0..rows {
        doc.push_str("[[row]]\n");
        for column in 0..columns {
            let letter = char::from(b'a' + ((row * columns + column) % 26) as u8);
            let _ = writeln!(doc, "[[row.key]]\nlabel = \"{letter}\"");
        }
    }
    doc
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/build");
    let params = LayoutParams::new(1080, 720);
    for rows in [3, 4, 6] {
        let source = LayoutSource::from_toml_str(&grid_document(rows, 10)).expect("bench layout");
        group.bench_with_input(BenchmarkId::new("rows", rows), &source, |b, source| {
            b.iter(|| black_box(Keyboard::from_source(source, &params)))
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/resolve");
    let kb = Keyboard::parse(&grid_document(4, 10), &LayoutParams::new(1080, 720))
        .expect("bench layout");
    let points: Vec<(i32, i32)> = (0..64)
        .map(|i| ((i * 97) % kb.min_width(), (i * 53) % kb.height()))
        .collect();

    for (name, resolver) in [
        ("proximity", HitResolver::new(true)),
        ("exact", HitResolver::new(false)),
    ] {
        group.bench_function(BenchmarkId::new("alternatives", name), |b| {
            b.iter(|| {
                for &(x, y) in &points {
                    black_box(resolver.resolve(&kb, x, y, true));
                }
            })
        });
        group.bench_function(BenchmarkId::new("primary_only", name), |b| {
            b.iter(|| {
                for &(x, y) in &points {
                    black_box(resolver.key_at(&kb, x, y));
                }
            })
        });
    }
    group.finish();
}

fn bench_resize(c: &mut Criterion) {
    let kb = Keyboard::parse(&grid_document(4, 10), &LayoutParams::new(1080, 720))
        .expect("bench layout");
    c.bench_function("layout/resize", |b| {
        b.iter(|| {
            let mut kb = kb.clone();
            kb.resize(black_box(720), 480);
            black_box(kb)
        })
    });
}

criterion_group!(benches, bench_build, bench_resolve, bench_resize);
criterion_main!(benches);
