// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds since the first event the sink received.

use std::io::Write;
use std::time::Instant;

use strata_core::diagnostics::Diagnostic;
use strata_core::trace::{
    FrameSummary, NodeChange, NodeChangeKind, PhaseBeginEvent, PhaseEndEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    origin: Option<Instant>,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            origin: None,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            origin: None,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            origin: None,
        }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn micros(&mut self, t: Instant) -> f64 {
        let origin = *self.origin.get_or_insert(t);
        t.saturating_duration_since(origin).as_nanos() as f64 / 1000.0
    }
}

fn change_name(kind: NodeChangeKind) -> &'static str {
    match kind {
        NodeChangeKind::Layout => "layout",
        NodeChangeKind::Compositing => "compositing",
        NodeChangeKind::Repaint => "repaint",
        NodeChangeKind::SkippedPaint => "skipped-paint",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let at = self.micros(e.timestamp);
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} queued={} at {at:.1}µs",
            e.frame_index,
            e.phase.label(),
            e.queued,
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let at = self.micros(e.timestamp);
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} processed={} at {at:.1}µs",
            e.frame_index,
            e.phase.label(),
            e.processed,
        );
    }

    fn on_diagnostic(&mut self, frame_index: u64, d: &Diagnostic) {
        let _ = writeln!(
            self.writer,
            "[error] frame={frame_index} {} {}#{}: {}",
            d.phase.label(),
            d.type_name,
            d.node.index(),
            d.error,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} laid_out={} compositing={} repainted={} skipped={} \
             errors={} layout={}µs bits={}µs paint={}µs",
            s.frame_index,
            s.laid_out,
            s.compositing_updated,
            s.repainted,
            s.skipped_paints,
            s.errors,
            s.layout_micros,
            s.compositing_micros,
            s.paint_micros,
        );
    }

    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        let _ = write!(self.writer, "[nodes] frame={frame_index} count={}", changes.len());
        for change in changes {
            let _ = write!(self.writer, " {}#{}", change_name(change.kind), change.node_index);
        }
        let _ = writeln!(self.writer);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_core::trace::PhaseKind;

    use super::*;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn phase_lines_are_relative_to_the_first_event() {
        let start = Instant::now();
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 3,
            phase: PhaseKind::Layout,
            queued: 2,
            timestamp: start,
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 3,
            phase: PhaseKind::Layout,
            processed: 2,
            timestamp: start + Duration::from_micros(250),
        });

        let out = output(sink);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "[phase:begin] frame=3 layout queued=2 at 0.0µs");
        assert_eq!(lines[1], "[phase:end] frame=3 layout processed=2 at 250.0µs");
    }

    #[test]
    fn node_changes_are_listed_on_one_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_node_changes(
            1,
            &[
                NodeChange {
                    node_index: 4,
                    kind: NodeChangeKind::Layout,
                },
                NodeChange {
                    node_index: 2,
                    kind: NodeChangeKind::Repaint,
                },
            ],
        );
        assert_eq!(output(sink), "[nodes] frame=1 count=2 layout#4 repaint#2\n");
    }

    #[test]
    fn summary_line_has_counts() {
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        sink.on_frame_summary(&FrameSummary {
            frame_index: 7,
            laid_out: 5,
            repainted: 1,
            ..FrameSummary::default()
        });
        let out = output(sink);
        assert!(out.starts_with("[summary] frame=7 laid_out=5 compositing=0 repainted=1"), "{out}");
    }
}
