//! Dispatch tracing infrastructure.
//!
//! Floor division reports the decisions it takes (fast path chosen, slots
//! tried, coercion attempts, the final unsupported-operand failure) to a
//! [`DispatchTracer`] installed on the [`Runtime`](crate::Runtime).
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (default) |
//! | [`StderrTracer`] | Human-readable dispatch log to stderr |
//! | [`ProfilingTracer`] | Counters per dispatch path |
//! | [`RecordingTracer`] | Full event recording for post-mortem |
//!
//! # Usage
//!
//! ```
//! use pyfloordiv::{Runtime, RuntimeConfig, RecordingTracer, Value, floordiv::modern};
//!
//! let mut rt = Runtime::with_tracer(RuntimeConfig::modern(), RecordingTracer::new());
//! let result = modern::object_object(&mut rt, &Value::Int(7), &Value::Int(2)).unwrap();
//! assert!(matches!(result, Value::Int(3)));
//! let tracer = rt.tracer::<RecordingTracer>().unwrap();
//! assert!(!tracer.events().is_empty());
//! ```

use std::{any::Any, fmt};

use ahash::AHashMap;
use strum::{Display, IntoStaticStr};

use crate::floordiv::BuiltinKind;

/// Which operand's slot an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SlotSide {
    Left,
    Right,
}

/// Trace event emitted during dispatch.
///
/// Used by [`RecordingTracer`] to capture a full trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A floor division started.
    Dispatch {
        /// Static shape of the left operand (`"object"` when unknown).
        lhs: &'static str,
        /// Static shape of the right operand.
        rhs: &'static str,
        /// Nesting depth of the dispatch (1 for a top-level call).
        depth: usize,
    },
    /// A native kernel handled the operation.
    FastPath { kind: BuiltinKind },
    /// The native integer kernel overflowed and escalated to the long kernel.
    Escalate,
    /// A type slot was called.
    SlotCall { side: SlotSide },
    /// A type slot returned `NotImplemented`.
    SlotDeclined { side: SlotSide },
    /// A legacy coercion slot ran.
    Coerce { side: SlotSide, accepted: bool },
    /// Every option was exhausted.
    Unsupported { lhs_type: String, rhs_type: String },
}

/// Trait for dispatch tracing.
///
/// All methods have default no-op implementations. Implementations only
/// override the hooks they care about.
pub trait DispatchTracer: Any + fmt::Debug {
    /// Called when a floor division begins, before any fast path or slot.
    #[inline(always)]
    fn on_dispatch(&mut self, _lhs: &'static str, _rhs: &'static str, _depth: usize) {}

    /// Called when a native kernel is selected.
    #[inline(always)]
    fn on_fast_path(&mut self, _kind: BuiltinKind) {}

    /// Called when `MIN // -1` leaves the native integer range.
    #[inline(always)]
    fn on_escalate(&mut self) {}

    /// Called before a type's `floor_divide` slot runs.
    #[inline(always)]
    fn on_slot_call(&mut self, _side: SlotSide) {}

    /// Called when a slot answered `NotImplemented`.
    #[inline(always)]
    fn on_slot_declined(&mut self, _side: SlotSide) {}

    /// Called after a legacy coercion slot ran.
    #[inline(always)]
    fn on_coerce(&mut self, _side: SlotSide, _accepted: bool) {}

    /// Called right before the unsupported-operand TypeError is raised.
    #[inline(always)]
    fn on_unsupported(&mut self, _lhs_type: &str, _rhs_type: &str) {}
}

// ============================================================================
// NoopTracer: production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl DispatchTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable dispatch log
// ============================================================================

/// Tracer that prints a human-readable dispatch log to stderr.
///
/// Output format:
/// ```text
/// >>> FLOORDIV object // int   depth=1
///   ... slot left
///   ... slot left declined
///   ... coerce right: declined
///   !!! UNSUPPORTED 'str' and 'int'
/// ```
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of lines to print before stopping. None = unlimited.
    limit: Option<usize>,
    /// Number of lines printed so far.
    count: usize,
    /// Whether we've stopped tracing (hit the limit).
    stopped: bool,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no line limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: None,
            count: 0,
            stopped: false,
        }
    }

    /// Creates a new stderr tracer that stops after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
            stopped: false,
        }
    }

    fn emit(&mut self, line: fmt::Arguments<'_>) {
        if self.stopped {
            return;
        }
        eprintln!("{line}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count >= limit
        {
            eprintln!("--- trace limit reached ({limit} lines) ---");
            self.stopped = true;
        }
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTracer for StderrTracer {
    fn on_dispatch(&mut self, lhs: &'static str, rhs: &'static str, depth: usize) {
        self.emit(format_args!(">>> FLOORDIV {lhs} // {rhs}   depth={depth}"));
    }

    fn on_fast_path(&mut self, kind: BuiltinKind) {
        self.emit(format_args!("  +++ fast path {kind}"));
    }

    fn on_escalate(&mut self) {
        self.emit(format_args!("  +++ int overflow, escalating to long"));
    }

    fn on_slot_call(&mut self, side: SlotSide) {
        self.emit(format_args!("  ... slot {side}"));
    }

    fn on_slot_declined(&mut self, side: SlotSide) {
        self.emit(format_args!("  ... slot {side} declined"));
    }

    fn on_coerce(&mut self, side: SlotSide, accepted: bool) {
        let outcome = if accepted { "coerced" } else { "declined" };
        self.emit(format_args!("  ... coerce {side}: {outcome}"));
    }

    fn on_unsupported(&mut self, lhs_type: &str, rhs_type: &str) {
        self.emit(format_args!("  !!! UNSUPPORTED '{lhs_type}' and '{rhs_type}'"));
    }
}

// ============================================================================
// ProfilingTracer: dispatch path counters
// ============================================================================

/// Tracer that counts how often each dispatch path is taken.
///
/// Retrieve results via [`ProfilingTracer::report`].
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    dispatches: u64,
    max_depth: usize,
    fast_paths: AHashMap<BuiltinKind, u64>,
    escalations: u64,
    slot_calls: u64,
    slot_declines: u64,
    coercions_tried: u64,
    coercions_accepted: u64,
    unsupported: u64,
}

/// Summary report from a profiling trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilingReport {
    /// Total floor divisions dispatched, nested ones included.
    pub dispatches: u64,
    /// Deepest nesting observed.
    pub max_depth: usize,
    /// Fast-path hits per kernel, most frequent first.
    pub fast_paths: Vec<(BuiltinKind, u64)>,
    pub escalations: u64,
    pub slot_calls: u64,
    pub slot_declines: u64,
    pub coercions_tried: u64,
    pub coercions_accepted: u64,
    pub unsupported: u64,
}

impl ProfilingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a profiling report from the collected counters.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let mut fast_paths: Vec<_> = self.fast_paths.iter().map(|(&k, &v)| (k, v)).collect();
        fast_paths.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ProfilingReport {
            dispatches: self.dispatches,
            max_depth: self.max_depth,
            fast_paths,
            escalations: self.escalations,
            slot_calls: self.slot_calls,
            slot_declines: self.slot_declines,
            coercions_tried: self.coercions_tried,
            coercions_accepted: self.coercions_accepted,
            unsupported: self.unsupported,
        }
    }
}

impl DispatchTracer for ProfilingTracer {
    #[inline]
    fn on_dispatch(&mut self, _lhs: &'static str, _rhs: &'static str, depth: usize) {
        self.dispatches += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    fn on_fast_path(&mut self, kind: BuiltinKind) {
        *self.fast_paths.entry(kind).or_insert(0) += 1;
    }

    fn on_escalate(&mut self) {
        self.escalations += 1;
    }

    fn on_slot_call(&mut self, _side: SlotSide) {
        self.slot_calls += 1;
    }

    fn on_slot_declined(&mut self, _side: SlotSide) {
        self.slot_declines += 1;
    }

    fn on_coerce(&mut self, _side: SlotSide, accepted: bool) {
        self.coercions_tried += 1;
        if accepted {
            self.coercions_accepted += 1;
        }
    }

    fn on_unsupported(&mut self, _lhs_type: &str, _rhs_type: &str) {
        self.unsupported += 1;
    }
}

impl fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Floor Division Profile ===")?;
        writeln!(f, "Dispatches:         {}", self.dispatches)?;
        writeln!(f, "Max depth:          {}", self.max_depth)?;
        writeln!(f, "Slot calls:         {}", self.slot_calls)?;
        writeln!(f, "Slot declines:      {}", self.slot_declines)?;
        writeln!(
            f,
            "Coercions:          {} ({} accepted)",
            self.coercions_tried, self.coercions_accepted
        )?;
        writeln!(f, "Int escalations:    {}", self.escalations)?;
        writeln!(f, "Unsupported:        {}", self.unsupported)?;
        writeln!(f)?;
        writeln!(f, "--- Fast Paths ---")?;
        for (kind, count) in &self.fast_paths {
            let pct = (*count as f64 / self.dispatches.max(1) as f64) * 100.0;
            writeln!(f, "  {kind:<8} {count:>10}  ({pct:>5.1}%)")?;
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records all events in chronological order.
///
/// Allocates per event, so use it for tests and short debugging sessions.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl DispatchTracer for RecordingTracer {
    fn on_dispatch(&mut self, lhs: &'static str, rhs: &'static str, depth: usize) {
        self.record(TraceEvent::Dispatch { lhs, rhs, depth });
    }

    fn on_fast_path(&mut self, kind: BuiltinKind) {
        self.record(TraceEvent::FastPath { kind });
    }

    fn on_escalate(&mut self) {
        self.record(TraceEvent::Escalate);
    }

    fn on_slot_call(&mut self, side: SlotSide) {
        self.record(TraceEvent::SlotCall { side });
    }

    fn on_slot_declined(&mut self, side: SlotSide) {
        self.record(TraceEvent::SlotDeclined { side });
    }

    fn on_coerce(&mut self, side: SlotSide, accepted: bool) {
        self.record(TraceEvent::Coerce { side, accepted });
    }

    fn on_unsupported(&mut self, lhs_type: &str, rhs_type: &str) {
        self.record(TraceEvent::Unsupported {
            lhs_type: lhs_type.to_owned(),
            rhs_type: rhs_type.to_owned(),
        });
    }
}
