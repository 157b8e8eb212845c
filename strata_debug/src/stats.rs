// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Aggregated frame statistics.

use std::fmt;
use std::time::{Duration, Instant};

use strata_core::diagnostics::Diagnostic;
use strata_core::trace::{
    FrameSummary, NodeChange, PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink,
};

/// Timing of one phase across all frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Number of times the phase ran.
    pub runs: u64,
    /// Nodes processed, summed over runs.
    pub processed: u64,
    /// Total time spent in the phase.
    pub total: Duration,
    /// Longest single run.
    pub max: Duration,
}

impl PhaseStats {
    /// Mean duration of a run, or zero if the phase never ran.
    #[must_use]
    pub fn mean(&self) -> Duration {
        match u32::try_from(self.runs) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(runs) => self.total / runs,
        }
    }
}

/// A [`TraceSink`] that accumulates counts and phase timings.
#[derive(Clone, Debug, Default)]
pub struct StatsSink {
    frames: u64,
    laid_out: u64,
    compositing_updated: u64,
    repainted: u64,
    skipped_paints: u64,
    errors: u64,
    node_changes: u64,
    phases: [PhaseStats; 4],
    open: [Option<Instant>; 4],
    last: Option<FrameSummary>,
}

fn slot(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Layout => 0,
        PhaseKind::CompositingBits => 1,
        PhaseKind::Paint => 2,
        PhaseKind::Composite => 3,
    }
}

impl StatsSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frame summaries received.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Nodes laid out over all frames.
    #[must_use]
    pub fn laid_out(&self) -> u64 {
        self.laid_out
    }

    /// Compositing bits recomputed over all frames.
    #[must_use]
    pub fn compositing_updated(&self) -> u64 {
        self.compositing_updated
    }

    /// Repaint boundaries repainted over all frames.
    #[must_use]
    pub fn repainted(&self) -> u64 {
        self.repainted
    }

    /// Dirty repaint boundaries skipped over all frames.
    #[must_use]
    pub fn skipped_paints(&self) -> u64 {
        self.skipped_paints
    }

    /// Diagnostics received.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors
    }

    /// Per-node change records received.
    #[must_use]
    pub fn node_changes(&self) -> u64 {
        self.node_changes
    }

    /// Timing of `phase`.
    #[must_use]
    pub fn phase(&self, phase: PhaseKind) -> PhaseStats {
        self.phases[slot(phase)]
    }

    /// The most recent frame summary.
    #[must_use]
    pub fn last_frame(&self) -> Option<&FrameSummary> {
        self.last.as_ref()
    }
}

impl TraceSink for StatsSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.open[slot(e.phase)] = Some(e.timestamp);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let i = slot(e.phase);
        let stats = &mut self.phases[i];
        stats.runs += 1;
        stats.processed += u64::from(e.processed);
        if let Some(begin) = self.open[i].take() {
            let elapsed = e.timestamp.saturating_duration_since(begin);
            stats.total += elapsed;
            stats.max = stats.max.max(elapsed);
        }
    }

    fn on_diagnostic(&mut self, _frame_index: u64, _d: &Diagnostic) {
        self.errors += 1;
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.frames += 1;
        self.laid_out += u64::from(s.laid_out);
        self.compositing_updated += u64::from(s.compositing_updated);
        self.repainted += u64::from(s.repainted);
        self.skipped_paints += u64::from(s.skipped_paints);
        self.last = Some(*s);
    }

    fn on_node_changes(&mut self, _frame_index: u64, changes: &[NodeChange]) {
        self.node_changes += changes.len() as u64;
    }
}

impl fmt::Display for StatsSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} frames: {} laid out, {} compositing updates, {} repainted, {} skipped, {} errors",
            self.frames,
            self.laid_out,
            self.compositing_updated,
            self.repainted,
            self.skipped_paints,
            self.errors,
        )?;
        for phase in PhaseKind::ALL {
            let stats = self.phase(phase);
            writeln!(
                f,
                "  {:<16} runs={} processed={} mean={:?} max={:?}",
                phase.label(),
                stats.runs,
                stats.processed,
                stats.mean(),
                stats.max,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Size, Vec2};
    use strata_core::diagnostics::{NodeError, StrataResult};
    use strata_core::node::{LayoutCx, RenderBox};
    use strata_core::pipeline::PipelineOwner;
    use strata_core::trace::Tracer;
    use strata_core::view::RenderView;

    use super::*;

    #[derive(Debug)]
    struct Fixed(Size);

    impl RenderBox for Fixed {
        fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
            let size = cx.constraints().constrain(self.0);
            cx.set_size(size);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl RenderBox for Broken {
        fn perform_layout(&mut self, _cx: &mut LayoutCx<'_>) -> StrataResult<()> {
            Err(NodeError::msg("no layout today"))
        }
    }

    #[derive(Debug)]
    struct Pair;

    impl RenderBox for Pair {
        fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
            let loose = cx.constraints().loosen();
            for child in cx.children() {
                cx.layout_child(child, loose, false);
                cx.set_child_offset(child, Vec2::ZERO);
            }
            let size = cx.constraints().biggest();
            cx.set_size(size);
            Ok(())
        }
    }

    #[test]
    fn accumulates_over_frames() {
        let mut owner = PipelineOwner::new();
        let root = owner.create_node(RenderView::new(Size::new(50.0, 50.0)));
        owner.set_root(Some(root));
        owner.prepare_initial_frame();
        let pair = owner.create_node(Pair);
        let leaf = owner.create_node(Fixed(Size::new(10.0, 10.0)));
        let broken = owner.create_node(Broken);
        owner.add_child(root, pair);
        owner.add_child(pair, leaf);
        owner.add_child(pair, broken);

        let mut stats = StatsSink::new();
        owner.run_frame(&mut Tracer::new(&mut stats));
        owner.run_frame(&mut Tracer::new(&mut stats));

        assert_eq!(stats.frames(), 2);
        assert_eq!(stats.laid_out(), 4);
        assert_eq!(stats.errors(), 1);
        assert_eq!(stats.phase(PhaseKind::Layout).runs, 2);
        assert_eq!(stats.phase(PhaseKind::Composite).runs, 0);
        assert_eq!(stats.last_frame().map(|s| s.laid_out), Some(0));
        assert!(stats.node_changes() >= 4, "rich events are enabled");
        assert!(stats.to_string().starts_with("2 frames: 4 laid out"));
    }

    #[test]
    fn mean_of_no_runs_is_zero() {
        assert_eq!(PhaseStats::default().mean(), Duration::ZERO);
    }
}
