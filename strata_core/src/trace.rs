// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the frame pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`PipelineOwner::run_frame`](crate::pipeline::PipelineOwner::run_frame) and
//! [`PipelineOwner::composite_frame`](crate::pipeline::PipelineOwner::composite_frame)
//! call at each phase. All method bodies default to no-ops, so implementing
//! only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] collects phase timestamps and per-phase counts
//! during a frame and produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`NodeChange`] events and the
//!   corresponding `TraceSink` method.

use std::time::Instant;

use crate::diagnostics::Diagnostic;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of the frame pipeline is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Layout of dirty relayout boundaries.
    Layout,
    /// Recomputation of `needs_compositing`.
    CompositingBits,
    /// Repainting of dirty repaint boundaries.
    Paint,
    /// Building a scene from the layer tree.
    Composite,
}

impl PhaseKind {
    /// All phases in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::Layout,
        Self::CompositingBits,
        Self::Paint,
        Self::Composite,
    ];

    /// Lower-case name used in logs and diagnostics.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::CompositingBits => "compositing bits",
            Self::Paint => "paint",
            Self::Composite => "composite",
        }
    }
}

/// What happened to a node during a phase.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeChangeKind {
    /// The node ran its layout callbacks.
    Layout,
    /// The node's `needs_compositing` was recomputed and changed.
    Compositing,
    /// The repaint boundary was repainted into its layer.
    Repaint,
    /// The repaint boundary was dirty but its layer was detached.
    SkippedPaint,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Number of nodes queued for the phase (zero for composite).
    pub queued: u32,
    /// Time at the start of the phase.
    pub timestamp: Instant,
}

/// Marks the end of a pipeline phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Number of nodes the phase processed.
    pub processed: u32,
    /// Time at the end of the phase.
    pub timestamp: Instant,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Nodes that ran their layout callbacks.
    pub laid_out: u32,
    /// Nodes whose compositing bits were recomputed.
    pub compositing_updated: u32,
    /// Repaint boundaries repainted into their layers.
    pub repainted: u32,
    /// Dirty repaint boundaries skipped because their layer was detached.
    pub skipped_paints: u32,
    /// Runtime faults reported during the frame.
    pub errors: u32,
    /// Layout phase duration in microseconds (0 if not measured).
    pub layout_micros: u64,
    /// Compositing-bits phase duration in microseconds (0 if not measured).
    pub compositing_micros: u64,
    /// Paint phase duration in microseconds (0 if not measured).
    pub paint_micros: u64,
    /// Composite phase duration in microseconds (0 if not measured).
    pub composite_micros: u64,
}

/// A per-node change record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeChange {
    /// Slot index of the node.
    pub node_index: u32,
    /// What happened.
    pub kind: NodeChangeKind,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the frame pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a pipeline phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a pipeline phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called for each runtime fault reported during a frame.
    fn on_diagnostic(&mut self, frame_index: u64, d: &Diagnostic) {
        _ = (frame_index, d);
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with per-phase node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        _ = (frame_index, changes);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: std::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl std::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: std::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: std::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`Diagnostic`].
    #[inline]
    pub fn diagnostic(&mut self, frame_index: u64, d: &Diagnostic) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_diagnostic(frame_index, d);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (frame_index, d);
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits node changes (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        if let Some(s) = &mut self.sink {
            s.on_node_changes(frame_index, changes);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps and counts during a frame and produces a
/// [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    frame_index: u64,
    phase_starts: [Option<Instant>; 4],
    phase_ends: [Option<Instant>; 4],
    processed: [u32; 4],
    skipped_paints: u32,
    errors: u32,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for the given frame.
    #[must_use]
    pub fn new(frame_index: u64) -> Self {
        Self {
            frame_index,
            phase_starts: [None; 4],
            phase_ends: [None; 4],
            processed: [0; 4],
            skipped_paints: 0,
            errors: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: Instant) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase and how many nodes it processed.
    pub fn phase_end(&mut self, phase: PhaseKind, t: Instant, processed: u32) {
        let idx = phase_index(phase);
        self.phase_ends[idx] = Some(t);
        self.processed[idx] += processed;
    }

    /// Adds skipped repaint boundaries.
    pub fn add_skipped_paints(&mut self, n: u32) {
        self.skipped_paints += n;
    }

    /// Adds reported runtime faults.
    pub fn add_errors(&mut self, n: u32) {
        self.errors += n;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        FrameSummary {
            frame_index: self.frame_index,
            laid_out: self.processed[phase_index(PhaseKind::Layout)],
            compositing_updated: self.processed[phase_index(PhaseKind::CompositingBits)],
            repainted: self.processed[phase_index(PhaseKind::Paint)],
            skipped_paints: self.skipped_paints,
            errors: self.errors,
            layout_micros: self.phase_duration(PhaseKind::Layout),
            compositing_micros: self.phase_duration(PhaseKind::CompositingBits),
            paint_micros: self.phase_duration(PhaseKind::Paint),
            composite_micros: self.phase_duration(PhaseKind::Composite),
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => {
                u64::try_from(end.saturating_duration_since(start).as_micros()).unwrap_or(u64::MAX)
            }
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Layout => 0,
        PhaseKind::CompositingBits => 1,
        PhaseKind::Paint => 2,
        PhaseKind::Composite => 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
