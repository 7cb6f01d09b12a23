#![forbid(unsafe_code)]

//! Tracing contract for the history engine.
//!
//! Verifies the `gridline.replay` span and its fields, the notice event that
//! follows a replay, and the debug/trace events around push, eviction, and
//! batch flush.
//!
//! Run:
//!   cargo test -p gridline-history --test tracing_replay_spans

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use gridline_core::{Record, RowId};
use gridline_history::{CellEdit, HistoryConfig, MemoryGrid, UndoRedo};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use web_time::{Duration, Instant};

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    span_index: Arc<Mutex<HashMap<u64, usize>>>,
}

#[derive(Clone)]
struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans_named(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    fn events_with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        for field in attrs.metadata().fields() {
            fields.entry(field.name().to_string()).or_default();
        }
        let mut spans = self.spans.lock().unwrap();
        self.span_index
            .lock()
            .unwrap()
            .insert(id.into_u64(), spans.len());
        spans.push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields,
        });
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        values.record(&mut visitor);
        let index = self.span_index.lock().unwrap();
        if let Some(&idx) = index.get(&id.into_u64())
            && let Some(span) = self.spans.lock().unwrap().get_mut(idx)
        {
            span.fields.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span| span.name().to_string());
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn with_captured<F: FnOnce()>(f: F) -> CaptureHandle {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let handle = CaptureHandle {
        spans: Arc::clone(&spans),
        events: Arc::clone(&events),
    };
    let layer = Capture {
        spans,
        events,
        span_index: Arc::new(Mutex::new(HashMap::new())),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

fn id_of(r: &Record) -> RowId {
    r.id.clone()
}

fn grid(ids: &[&str]) -> MemoryGrid<Record, fn(&Record) -> RowId> {
    MemoryGrid::new(
        ids.iter().map(|id| Record::new(*id)).collect(),
        id_of as fn(&Record) -> RowId,
    )
}

// ============================================================================
// Replay span
// ============================================================================

#[test]
fn replay_span_carries_direction_kind_count_and_duration() {
    let handle = with_captured(|| {
        let mut g = grid(&["a", "b", "c"]);
        let mut h = UndoRedo::new(HistoryConfig::default());
        let now = Instant::now();
        let removed = g.rows_mut().drain(0..2).collect::<Vec<_>>();
        h.track_rows_delete(&g, removed, now);
        h.on_undo(&mut g, now);
        h.on_redo(&mut g);
    });

    let spans = handle.spans_named("gridline.replay");
    assert_eq!(spans.len(), 2);
    let undo = &spans[0];
    assert_eq!(undo.fields.get("direction").map(String::as_str), Some("Undo"));
    assert_eq!(undo.fields.get("kind").map(String::as_str), Some("rows_delete"));
    assert_eq!(undo.fields.get("count").map(String::as_str), Some("2"));
    let duration = undo.fields.get("duration_us").expect("declared");
    assert!(duration.parse::<u64>().is_ok(), "duration_us recorded: {duration:?}");
    assert_eq!(spans[1].fields.get("direction").map(String::as_str), Some("Redo"));
}

#[test]
fn notice_event_is_emitted_inside_replay_span() {
    let handle = with_captured(|| {
        let mut g = grid(&["a"]);
        let mut h = UndoRedo::new(HistoryConfig::default());
        let now = Instant::now();
        h.track_cells_update([CellEdit::new("a", "x", "", "1")], now);
        h.on_undo(&mut g, now);
    });

    let events = handle.events_with_message("history replayed");
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.level, tracing::Level::INFO);
    assert_eq!(event.parent_span_name.as_deref(), Some("gridline.replay"));
    assert_eq!(
        event.fields.get("notice").map(String::as_str),
        Some("Undo: 1 cell")
    );
}

#[test]
fn empty_stack_emits_no_replay_span() {
    let handle = with_captured(|| {
        let mut g = grid(&["a"]);
        let mut h: UndoRedo<Record> = UndoRedo::new(HistoryConfig::default());
        h.on_undo(&mut g, Instant::now());
        h.on_redo(&mut g);
    });
    assert!(handle.spans_named("gridline.replay").is_empty());
}

// ============================================================================
// Push / evict / flush events
// ============================================================================

#[test]
fn push_flush_and_evict_are_logged() {
    let handle = with_captured(|| {
        let mut h: UndoRedo<Record> =
            UndoRedo::new(HistoryConfig::default().with_max_history(1));
        let t0 = Instant::now();
        h.track_cells_update([CellEdit::new("a", "x", "", "1")], t0);
        h.tick(t0 + Duration::from_secs(1));
        h.track_cells_update([CellEdit::new("a", "x", "1", "2")], t0 + Duration::from_secs(2));
        h.flush(t0 + Duration::from_secs(2));
    });

    let pushes = handle.events_with_message("history push");
    assert_eq!(pushes.len(), 2);
    assert!(pushes.iter().all(|e| e.level == tracing::Level::DEBUG));

    let flushes = handle.events_with_message("batch flush");
    assert_eq!(flushes.len(), 2);
    assert_eq!(flushes[0].fields.get("cells").map(String::as_str), Some("1"));

    let evictions = handle.events_with_message("history evict oldest");
    assert_eq!(evictions.len(), 1);
    assert_eq!(evictions[0].level, tracing::Level::TRACE);
}

#[test]
fn dispose_logs_discarded_cells() {
    let handle = with_captured(|| {
        let mut h: UndoRedo<Record> = UndoRedo::new(HistoryConfig::default());
        h.track_cells_update(
            [CellEdit::new("a", "x", "", "1"), CellEdit::new("b", "x", "", "2")],
            Instant::now(),
        );
        h.dispose();
    });
    let events = handle.events_with_message("batch discarded on dispose");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].fields.get("cells").map(String::as_str), Some("2"));
}
