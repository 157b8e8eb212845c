// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format export.
//!
//! [`ChromeTraceSink`] collects pipeline events and [`write`](ChromeTraceSink::write)s
//! them as [Chrome Trace Event Format][format] JSON.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};
use std::time::Instant;

use serde_json::{Value, json};

use strata_core::diagnostics::Diagnostic;
use strata_core::trace::{FrameSummary, NodeChange, PhaseBeginEvent, PhaseEndEvent, TraceSink};

/// Collects trace events for `chrome://tracing` or
/// [Perfetto](https://ui.perfetto.dev/).
///
/// Timestamps are microseconds since the first event received.
#[derive(Debug, Default)]
pub struct ChromeTraceSink {
    origin: Option<Instant>,
    last: Option<Instant>,
    events: Vec<Value>,
}

impl ChromeTraceSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The events collected so far.
    #[must_use]
    pub fn events(&self) -> &[Value] {
        &self.events
    }

    /// Writes the collected events as a JSON array.
    pub fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(writer, &self.events)?;
        Ok(())
    }

    fn micros(&mut self, t: Instant) -> f64 {
        let origin = *self.origin.get_or_insert(t);
        self.last = Some(t);
        t.saturating_duration_since(origin).as_nanos() as f64 / 1000.0
    }

    /// Instant events carry no timestamp of their own; they are placed at the
    /// latest phase boundary seen.
    fn now(&self) -> f64 {
        match (self.origin, self.last) {
            (Some(origin), Some(last)) => last.saturating_duration_since(origin).as_nanos() as f64 / 1000.0,
            _ => 0.0,
        }
    }
}

impl TraceSink for ChromeTraceSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let ts = self.micros(e.timestamp);
        self.events.push(json!({
            "ph": "B",
            "name": e.phase.label(),
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": e.frame_index,
                "queued": e.queued,
            }
        }));
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let ts = self.micros(e.timestamp);
        self.events.push(json!({
            "ph": "E",
            "name": e.phase.label(),
            "cat": "Frame",
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "args": {
                "frame_index": e.frame_index,
                "processed": e.processed,
            }
        }));
    }

    fn on_diagnostic(&mut self, frame_index: u64, d: &Diagnostic) {
        self.events.push(json!({
            "ph": "i",
            "name": "Error",
            "cat": "Diagnostic",
            "ts": self.now(),
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": {
                "frame_index": frame_index,
                "phase": d.phase.label(),
                "node": d.node.index(),
                "type": d.type_name,
                "error": d.error.to_string(),
            }
        }));
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.events.push(json!({
            "ph": "i",
            "name": "FrameSummary",
            "cat": "Summary",
            "ts": self.now(),
            "pid": 0,
            "tid": 0,
            "s": "g",
            "args": {
                "frame_index": s.frame_index,
                "laid_out": s.laid_out,
                "compositing_updated": s.compositing_updated,
                "repainted": s.repainted,
                "skipped_paints": s.skipped_paints,
                "errors": s.errors,
                "layout_us": s.layout_micros,
                "compositing_us": s.compositing_micros,
                "paint_us": s.paint_micros,
            }
        }));
    }

    fn on_node_changes(&mut self, frame_index: u64, changes: &[NodeChange]) {
        self.events.push(json!({
            "ph": "i",
            "name": "NodeChanges",
            "cat": "Rich",
            "ts": self.now(),
            "pid": 0,
            "tid": 0,
            "s": "p",
            "args": {
                "frame_index": frame_index,
                "count": changes.len(),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_core::trace::PhaseKind;

    use super::*;

    #[test]
    fn export_produces_valid_json() {
        let start = Instant::now();
        let mut sink = ChromeTraceSink::new();
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 0,
            phase: PhaseKind::Paint,
            queued: 1,
            timestamp: start,
        });
        sink.on_phase_end(&PhaseEndEvent {
            frame_index: 0,
            phase: PhaseKind::Paint,
            processed: 1,
            timestamp: start + Duration::from_micros(100),
        });
        sink.on_frame_summary(&FrameSummary::default());

        let mut out = Vec::new();
        sink.write(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "paint");
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["ts"], 100.0);
        assert_eq!(parsed[2]["name"], "FrameSummary");
        assert_eq!(parsed[2]["ts"], 100.0);
    }

    #[test]
    fn export_empty_sink() {
        let mut out = Vec::new();
        ChromeTraceSink::new().write(&mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }
}
