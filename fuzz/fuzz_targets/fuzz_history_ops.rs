#![no_main]

use std::collections::{BTreeMap, BTreeSet};

use arbitrary::Arbitrary;
use gridline_core::{
    ColumnId, FocusTarget, GridRow, KeyCode, KeyEvent, KeymapConfig, Modifiers, Platform, Record,
    RowId,
};
use gridline_history::{CellEdit, GridHost, HistoryConfig, InputDispatcher, MemoryGrid, UndoRedo};
use libfuzzer_sys::fuzz_target;
use web_time::{Duration, Instant};

#[derive(Debug, Arbitrary)]
enum Op {
    Edit { row: u8, column: u8, value: i16 },
    Add { count: u8 },
    Delete { row: u8, count: u8 },
    Reverse,
    Rotate(u8),
    Wait(u16),
    Key { key: u8, shift: bool, focus: u8 },
    Undo,
    Redo,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_history: u8,
    debounce_ms: u16,
    ops: Vec<Op>,
}

type Grid = MemoryGrid<Record, fn(&Record) -> RowId>;

fn id_of(r: &Record) -> RowId {
    r.id.clone()
}

fn snapshot(grid: &Grid) -> BTreeMap<RowId, Record> {
    grid.data().iter().map(|r| (r.id.clone(), r.clone())).collect()
}

fn row(n: usize) -> Record {
    Record::new(format!("r{n}"))
        .with("c0", 0_i64)
        .with("c1", 0_i64)
}

fuzz_target!(|input: Input| {
    let config = HistoryConfig::default()
        .with_max_history(usize::from(input.max_history))
        .with_debounce(Duration::from_millis(u64::from(input.debounce_ms)));
    let mut history = UndoRedo::new(config);
    let max_history = history.config().max_history;
    let dispatcher = InputDispatcher::new(KeymapConfig::for_platform(Platform::Other));
    let mut grid: Grid = MemoryGrid::new((0..8).map(row).collect(), id_of as fn(&Record) -> RowId);
    let mut next_row = 8;
    let mut now = Instant::now();
    let mut cleared = false;
    let mut saturated = false;
    let initial = snapshot(&grid);

    for op in input.ops.iter().take(256) {
        now += Duration::from_millis(10);
        match *op {
            Op::Edit { row, column, value } => {
                let len = grid.data().len();
                if len == 0 {
                    continue;
                }
                let col = ColumnId::new(format!("c{}", column % 2));
                let target = &mut grid.rows_mut()[usize::from(row) % len];
                let previous = target.cell(&col);
                target.set_cell(&col, i64::from(value).into());
                let edit = CellEdit::new(target.id.clone(), col, previous, i64::from(value));
                history.track_cells_update([edit], now);
            }
            Op::Add { count } => {
                let added: Vec<Record> = (0..usize::from(count % 4))
                    .map(|i| row(next_row + i))
                    .collect();
                next_row += added.len();
                grid.rows_mut().extend(added.iter().cloned());
                history.track_rows_add(&grid, added, now);
            }
            Op::Delete { row, count } => {
                let len = grid.data().len();
                if len == 0 {
                    continue;
                }
                let start = usize::from(row) % len;
                let end = (start + usize::from(count % 4)).min(len);
                let removed: Vec<Record> = grid.rows_mut().drain(start..end).collect();
                history.track_rows_delete(&grid, removed, now);
            }
            Op::Reverse => grid.rows_mut().reverse(),
            Op::Rotate(n) => {
                let len = grid.data().len();
                if len > 0 {
                    grid.rows_mut().rotate_left(usize::from(n) % len);
                }
            }
            Op::Wait(ms) => {
                now += Duration::from_millis(u64::from(ms));
                history.tick(now);
            }
            Op::Key { key, shift, focus } => {
                let code = match key % 3 {
                    0 => KeyCode::Char('z'),
                    1 => KeyCode::Char('y'),
                    _ => KeyCode::Other,
                };
                let mut mods = Modifiers::CTRL;
                if shift {
                    mods |= Modifiers::SHIFT;
                }
                let focus = match focus % 3 {
                    0 => FocusTarget::Grid,
                    1 => FocusTarget::TextInput,
                    _ => FocusTarget::Overlay,
                };
                let event = KeyEvent::new(code).with_modifiers(mods);
                let out = dispatcher.dispatch(&mut history, &mut grid, &event, focus, now);
                if focus.suppresses_history() {
                    assert!(!out.accepted(), "suppressed chord consumed");
                }
            }
            Op::Undo => {
                history.on_undo(&mut grid, now);
            }
            Op::Redo => {
                history.on_redo(&mut grid);
            }
            Op::Clear => {
                history.on_clear();
                cleared = true;
            }
        }

        // Row ids stay unique.
        let ids: BTreeSet<RowId> = grid.data().iter().map(id_of).collect();
        assert_eq!(ids.len(), grid.data().len(), "duplicate row id");
        assert!(history.store().undo_depth() <= max_history, "history bound exceeded");
        saturated |= history.store().undo_depth() == max_history;
    }

    // Without eviction or clearing, a full unwind reaches the initial rows.
    history.flush(now);
    saturated |= history.store().undo_depth() == max_history;
    if !cleared && !saturated {
        while history.on_undo(&mut grid, now).is_some() {}
        assert_eq!(snapshot(&grid), initial, "unwind did not restore initial rows");
    }
});
