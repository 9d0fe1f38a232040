//! Benchmarks for connect/emit/disconnect throughput.

use std::cell::Cell;
use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use synapse_signal::Signal;

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for &n in &[1usize, 8, 64] {
        group.bench_function(format!("slots/{n}"), |b| {
            let sig = Signal::new();
            let sink = Rc::new(Cell::new(0u64));
            let _conns: Vec<_> = (0..n)
                .map(|_| {
                    let sink = Rc::clone(&sink);
                    sig.connect(move |v: &u64| sink.set(sink.get().wrapping_add(*v)))
                })
                .collect();

            b.iter(|| sig.emit(black_box(&1)));
        });
    }

    group.finish();
}

fn bench_connect_disconnect(c: &mut Criterion) {
    c.bench_function("connect_disconnect", |b| {
        let sig = Signal::new();
        b.iter(|| {
            let conn = sig.connect(|_: &u64| {});
            drop(black_box(conn));
        });
    });
}

fn bench_churn_populated(c: &mut Criterion) {
    // Connect/disconnect cost must not depend on how many other slots are
    // registered.
    c.bench_function("connect_disconnect/populated_64", |b| {
        let sig = Signal::new();
        let _resident: Vec<_> = (0..64).map(|_| sig.connect(|_: &u64| {})).collect();

        b.iter(|| {
            let conn = sig.connect(|_: &u64| {});
            drop(black_box(conn));
        });
    });
}

criterion_group!(
    benches,
    bench_emit,
    bench_connect_disconnect,
    bench_churn_populated
);
criterion_main!(benches);
