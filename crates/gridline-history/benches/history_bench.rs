//! Benchmarks for command replay and edit batching.
//!
//! Measures the cost of identity-based replay on grids of increasing size
//! (a fresh `RowIndex` is built on every undo/redo) and of coalescing a burst
//! of keystroke-level edits into one batch.
//!
//! Run with: cargo bench -p gridline-history --bench history_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use gridline_core::{ColumnId, Record, RowId};
use gridline_history::{CellEdit, Command, EditBatcher, HistoryStore, RowIndex, remove_rows};
use web_time::{Duration, Instant};

// ============================================================================
// Setup helpers
// ============================================================================

fn id_of(r: &Record) -> RowId {
    r.id.clone()
}

fn rows(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new(format!("r{i}"))
                .with("name", format!("name-{i}"))
                .with("qty", i as i64)
        })
        .collect()
}

/// Every tenth row id.
fn sparse_ids(n: usize) -> Vec<RowId> {
    (0..n).step_by(10).map(|i| RowId::new(format!("r{i}"))).collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_row_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_index/build");
    for n in [1_000usize, 10_000, 100_000] {
        let data = rows(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| black_box(RowIndex::build(data, &id_of)));
        });
    }
    group.finish();
}

fn bench_rows_delete_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay/rows_delete");
    for n in [1_000usize, 10_000] {
        let data = rows(n);
        let ids = sparse_ids(n);
        let after = remove_rows(&data, &ids, &id_of);
        let deleted: Vec<Record> = data
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect();
        let cmd = Command::rows_delete(deleted, &id_of, Instant::now());
        group.bench_with_input(BenchmarkId::new("undo", n), &after, |b, after| {
            b.iter(|| black_box(cmd.undo(after, &id_of)));
        });
        group.bench_with_input(BenchmarkId::new("redo", n), &data, |b, data| {
            b.iter(|| black_box(cmd.redo(data, &id_of)));
        });
    }
    group.finish();
}

fn bench_cells_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay/cells_update");
    for n in [1_000usize, 10_000] {
        let data = rows(n);
        let edits = (0..n)
            .step_by(10)
            .map(|i| CellEdit::new(format!("r{i}"), "qty", i as i64, -(i as i64)))
            .collect();
        let cmd: Command<Record> = Command::cells_update(edits, Instant::now());
        group.bench_with_input(BenchmarkId::from_parameter(n), &data, |b, data| {
            b.iter(|| black_box(cmd.redo(data, &id_of)));
        });
    }
    group.finish();
}

fn bench_batching(c: &mut Criterion) {
    c.bench_function("batcher/typing_burst_100", |b| {
        let column = ColumnId::new("name");
        b.iter(|| {
            let store: HistoryStore<Record> = HistoryStore::new(100);
            let mut batcher = EditBatcher::new(store, Duration::from_millis(300));
            let t0 = Instant::now();
            let mut text = String::new();
            for i in 0..100u64 {
                let previous = text.clone();
                text.push('x');
                batcher.track_cells_update(
                    [CellEdit::new("r1", column.clone(), previous, text.clone())],
                    t0 + Duration::from_millis(i * 20),
                );
            }
            black_box(batcher.flush(t0 + Duration::from_secs(3)))
        });
    });
}

fn bench_push_evict(c: &mut Criterion) {
    c.bench_function("store/push_1000_bounded_100", |b| {
        let now = Instant::now();
        let cmd = std::rc::Rc::new(Command::<Record>::cells_update(
            vec![CellEdit::new("r1", "name", "a", "b")],
            now,
        ));
        b.iter(|| {
            let store = HistoryStore::new(100);
            for _ in 0..1_000 {
                store.push(std::rc::Rc::clone(&cmd));
            }
            black_box(store.undo_depth())
        });
    });
}

criterion_group!(
    benches,
    bench_row_index,
    bench_rows_delete_replay,
    bench_cells_replay,
    bench_batching,
    bench_push_evict
);
criterion_main!(benches);
