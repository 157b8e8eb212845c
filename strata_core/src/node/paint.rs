// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint and compositing-bits invalidation.

use super::NodeId;
use crate::diagnostics::ContractViolation;
use crate::dirty;
use crate::id::INVALID;
use crate::pipeline::PipelineOwner;
use crate::trace::PhaseKind;

impl PipelineOwner {
    /// Marks the node as needing paint.
    ///
    /// The mark climbs to the nearest repaint boundary, which is queued for
    /// the next [`flush_paint`](Self::flush_paint). Nodes above that
    /// boundary are not touched.
    ///
    /// # Panics
    ///
    /// In debug builds, panics when called while the paint phase is running.
    pub fn mark_needs_paint(&mut self, id: NodeId) {
        self.nodes.validate(id);
        if cfg!(debug_assertions) && self.phase == Some(PhaseKind::Paint) {
            panic!(
                "{}",
                ContractViolation::PaintDuringPaint {
                    node: self.describe_node(id),
                }
            );
        }
        let mut idx = id.idx;
        loop {
            let i = idx as usize;
            let flags = &mut self.nodes.flags[i];
            if flags.needs_paint {
                return;
            }
            flags.needs_paint = true;
            let attached = flags.attached;
            if flags.is_repaint_boundary {
                if attached {
                    self.dirty.mark(idx, dirty::PAINT);
                    self.request_visual_update();
                }
                return;
            }
            let parent = self.nodes.parent[i];
            if parent == INVALID {
                // A root that is not a boundary has no layer to queue.
                if attached {
                    self.request_visual_update();
                }
                return;
            }
            idx = parent;
        }
    }

    /// Marks the node's compositing bits as stale.
    ///
    /// Call this when [`always_needs_compositing`] changes. The mark climbs
    /// through ancestors until either side of an edge is a repaint boundary;
    /// that node is queued for the next
    /// [`flush_compositing_bits`](Self::flush_compositing_bits).
    ///
    /// [`always_needs_compositing`]: super::RenderBox::always_needs_compositing
    pub fn mark_needs_compositing_bits_update(&mut self, id: NodeId) {
        self.nodes.validate(id);
        let mut idx = id.idx;
        loop {
            let i = idx as usize;
            if self.nodes.flags[i].needs_compositing_bits_update {
                return;
            }
            self.nodes.flags[i].needs_compositing_bits_update = true;
            let parent = self.nodes.parent[i];
            if parent != INVALID {
                let p = parent as usize;
                if self.nodes.flags[p].needs_compositing_bits_update {
                    return;
                }
                if !self.nodes.flags[i].is_repaint_boundary && !self.nodes.flags[p].is_repaint_boundary {
                    idx = parent;
                    continue;
                }
            }
            if self.nodes.flags[i].attached {
                self.dirty.mark(idx, dirty::COMPOSITING_BITS);
            }
            return;
        }
    }

    /// Recomputes `needs_compositing` for a node and its stale descendants.
    /// A node whose answer changes is marked as needing paint.
    pub(crate) fn update_compositing_bits(&mut self, idx: u32) {
        let i = idx as usize;
        if !self.nodes.flags[i].needs_compositing_bits_update {
            return;
        }
        let old = self.nodes.flags[i].needs_compositing;
        let mut needs_compositing = false;
        let mut child = self.nodes.first_child[i];
        while child != INVALID {
            self.update_compositing_bits(child);
            needs_compositing |= self.nodes.flags[child as usize].needs_compositing;
            child = self.nodes.next_sibling[child as usize];
        }
        let always = self.nodes.behavior[i]
            .as_deref()
            .is_some_and(|b| b.always_needs_compositing());
        needs_compositing |= self.nodes.flags[i].is_repaint_boundary || always;
        self.nodes.flags[i].needs_compositing = needs_compositing;
        self.stats.compositing_updated += 1;
        if old != needs_compositing {
            tracing::trace!(node = idx, needs_compositing, "compositing bits changed");
            #[cfg(feature = "trace-rich")]
            self.changes.push(crate::trace::NodeChange {
                node_index: idx,
                kind: crate::trace::NodeChangeKind::Compositing,
            });
            let id = self.nodes.id_at(idx);
            self.mark_needs_paint(id);
        }
        self.nodes.flags[i].needs_compositing_bits_update = false;
    }

    /// A dirty repaint boundary whose layer is detached is not painted. Its
    /// ancestors up to the next boundary with an attached layer are flagged
    /// so that they repaint, and repaint it, once they are attached again.
    pub(crate) fn skipped_painting_on_layer(&mut self, id: NodeId) {
        let mut idx = self.nodes.parent[id.idx as usize];
        while idx != INVALID {
            let i = idx as usize;
            if self.nodes.flags[i].is_repaint_boundary {
                let Some(layer) = self.nodes.layer[i] else {
                    break;
                };
                if self.layers.is_alive(layer) && self.layers.is_attached(layer) {
                    break;
                }
                self.nodes.flags[i].needs_paint = true;
            }
            idx = self.nodes.parent[i];
        }
        self.stats.skipped_paints += 1;
        #[cfg(feature = "trace-rich")]
        self.changes.push(crate::trace::NodeChange {
            node_index: id.idx,
            kind: crate::trace::NodeChangeKind::SkippedPaint,
        });
    }
}
