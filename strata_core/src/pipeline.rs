// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The pipeline owner: node and layer storage, dirty queues, and the three
//! flush passes of a frame.

use std::any::Any;
use std::time::Instant;

use kurbo::Vec2;
use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use crate::constraints::BoxConstraints;
use crate::diagnostics::{ContractViolation, Diagnostic, NodeError};
use crate::dirty;
use crate::id::{INVALID, LayerId, NodeId};
use crate::layer::{LayerKind, LayerTree, SceneBuilder, SceneOptions};
use crate::node::{NodeStore, RenderBox};
use crate::options::PipelineOptions;
use crate::painting::PaintingContext;
use crate::trace::{FrameSummary, FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind, Tracer};

/// Work counters, reset at the start of every [`run_frame`](PipelineOwner::run_frame).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FlushStats {
    pub(crate) laid_out: u32,
    pub(crate) compositing_updated: u32,
    pub(crate) repainted: u32,
    pub(crate) skipped_paints: u32,
    pub(crate) errors: u32,
}

/// Owns a render tree and drives its frames.
///
/// Nodes mark themselves dirty through the `mark_needs_*` methods; the owner
/// keeps one queue per kind of work and processes them in
/// [`flush_layout`](Self::flush_layout),
/// [`flush_compositing_bits`](Self::flush_compositing_bits) and
/// [`flush_paint`](Self::flush_paint), in that order, parents before
/// children. [`run_frame`](Self::run_frame) runs all three with tracing;
/// [`composite_frame`](Self::composite_frame) then turns the layer tree into
/// a scene.
///
/// ```
/// use kurbo::Size;
/// use strata_core::pipeline::PipelineOwner;
/// use strata_core::view::RenderView;
///
/// let mut owner = PipelineOwner::new();
/// let root = owner.create_node(RenderView::new(Size::new(800.0, 600.0)));
/// owner.set_root(Some(root));
/// owner.prepare_initial_frame();
/// owner.flush_layout();
/// owner.flush_compositing_bits();
/// owner.flush_paint();
/// assert_eq!(owner.nodes().size(root), Some(Size::new(800.0, 600.0)));
/// assert!(owner.root_layer().is_some());
/// ```
pub struct PipelineOwner {
    pub(crate) nodes: NodeStore,
    pub(crate) layers: LayerTree,
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) root: Option<NodeId>,
    pub(crate) root_constraints: BoxConstraints,
    pub(crate) options: PipelineOptions,
    /// The flush in progress, if any.
    pub(crate) phase: Option<PhaseKind>,
    /// Root of the subtree a running layout callback may mutate, or
    /// [`INVALID`].
    pub(crate) allow_mutations_root: u32,
    pub(crate) debug_checking_intrinsics: bool,
    pub(crate) stats: FlushStats,
    #[cfg(feature = "trace-rich")]
    pub(crate) changes: Vec<crate::trace::NodeChange>,
    diagnostics: Vec<Diagnostic>,
    frame_index: u64,
    on_need_visual_update: Option<Box<dyn FnMut()>>,
    visual_update_requested: bool,
    /// Unattached layers the host keeps alive across paint flushes.
    retained_layers: Vec<LayerId>,
}

impl std::fmt::Debug for PipelineOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOwner")
            .field("node_count", &self.nodes.node_count())
            .field("layer_count", &self.layers.layer_count())
            .field("root", &self.root)
            .field("root_constraints", &self.root_constraints)
            .field("phase", &self.phase)
            .field("frame_index", &self.frame_index)
            .field("diagnostics", &self.diagnostics.len())
            .finish_non_exhaustive()
    }
}

impl Default for PipelineOwner {
    fn default() -> Self {
        Self::new()
    }
}

fn scene_options(options: &PipelineOptions) -> SceneOptions {
    SceneOptions {
        disable_clip_layers: options.disable_clip_layers,
        disable_opacity_layers: options.disable_opacity_layers,
        disable_physical_shape_layers: options.disable_physical_shape_layers,
    }
}

impl PipelineOwner {
    /// Creates an owner with default options and no root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PipelineOptions::default())
    }

    /// Creates an owner with the given options.
    #[must_use]
    pub fn with_options(options: PipelineOptions) -> Self {
        let mut layers = LayerTree::new();
        layers.set_scene_options(scene_options(&options));
        Self {
            nodes: NodeStore::new(),
            layers,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            root: None,
            root_constraints: BoxConstraints::default(),
            options,
            phase: None,
            allow_mutations_root: INVALID,
            debug_checking_intrinsics: false,
            stats: FlushStats::default(),
            #[cfg(feature = "trace-rich")]
            changes: Vec::new(),
            diagnostics: Vec::new(),
            frame_index: 0,
            on_need_visual_update: None,
            visual_update_requested: false,
            retained_layers: Vec::new(),
        }
    }

    /// The debug switches in effect.
    #[must_use]
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Replaces the debug switches. When a scene-building switch changes,
    /// every layer under the root is re-added on the next composite.
    pub fn set_options(&mut self, options: PipelineOptions) {
        if self.options == options {
            return;
        }
        let scene = scene_options(&options);
        let scene_changed = scene != self.layers.scene_options();
        self.options = options;
        self.layers.set_scene_options(scene);
        if scene_changed {
            if let Some(root) = self.root_layer() {
                self.layers.mark_needs_add_to_scene(root);
                for layer in self.layers.depth_first_children(root) {
                    self.layers.mark_needs_add_to_scene(layer);
                }
            }
        }
    }

    /// The node tree.
    #[must_use]
    pub fn nodes(&self) -> &NodeStore {
        &self.nodes
    }

    /// The layer tree.
    #[must_use]
    pub fn layers(&self) -> &LayerTree {
        &self.layers
    }

    /// Mutable access to the layer tree, for layers that are not owned by
    /// nodes.
    ///
    /// [`flush_paint`](Self::flush_paint) destroys layers that are neither
    /// attached, held by a node, nor [retained](Self::retain_layer), so a
    /// layer built here must be attached or retained before the next paint
    /// flush or its id goes stale.
    pub fn layers_mut(&mut self) -> &mut LayerTree {
        &mut self.layers
    }

    /// Keeps `layer` and its subtree alive across paint flushes while it is
    /// unattached, until [`release_layer`](Self::release_layer).
    pub fn retain_layer(&mut self, layer: LayerId) {
        self.layers.validate(layer);
        if !self.retained_layers.contains(&layer) {
            self.retained_layers.push(layer);
        }
    }

    /// Undoes [`retain_layer`](Self::retain_layer). An unattached layer is
    /// destroyed by the next paint flush.
    pub fn release_layer(&mut self, layer: LayerId) {
        self.retained_layers.retain(|l| *l != layer);
    }

    /// The node's behavior downcast to `T`, for updating its properties.
    ///
    /// Follow a change with the matching `mark_needs_*` call.
    pub fn behavior_mut<T: RenderBox>(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.validate(id);
        let behavior: &mut dyn Any = self.nodes.behavior[id.idx as usize].as_deref_mut()?;
        behavior.downcast_mut::<T>()
    }

    // -- Root --

    /// The root node.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The root node's layer, which is the root of the layer tree.
    #[must_use]
    pub fn root_layer(&self) -> Option<LayerId> {
        self.root
            .and_then(|r| self.nodes.layer[r.idx as usize])
            .filter(|l| self.layers.is_alive(*l))
    }

    /// Replaces the root node. The old root is detached, the new one
    /// attached.
    ///
    /// # Panics
    ///
    /// Panics if the new root has a parent.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        if self.root == root {
            return;
        }
        if let Some(old) = self.root.take() {
            if self.nodes.is_alive(old) {
                if let Some(layer) = self.nodes.layer[old.idx as usize] {
                    if self.layers.is_alive(layer) && self.layers.is_attached(layer) {
                        self.layers.detach(layer);
                    }
                }
                if self.nodes.flags[old.idx as usize].attached {
                    self.detach(old);
                }
            }
        }
        if let Some(new) = root {
            self.nodes.validate(new);
            assert!(
                self.nodes.parent[new.idx as usize] == INVALID,
                "{} has a parent and cannot be the root",
                self.describe_node(new)
            );
            self.root = Some(new);
            self.attach(new);
            if let Some(layer) = self.nodes.layer[new.idx as usize] {
                if self.layers.is_alive(layer) && !self.layers.is_attached(layer) {
                    self.layers.attach(layer);
                }
            }
        }
        tracing::debug!(root = ?self.root, "root replaced");
    }

    /// Queues the root for its first layout and paint, and gives it its
    /// layer.
    ///
    /// # Panics
    ///
    /// Panics if there is no root, or the root is not a repaint boundary.
    pub fn prepare_initial_frame(&mut self) {
        let Some(root) = self.root else {
            panic!("prepare_initial_frame requires a root node");
        };
        let i = root.idx as usize;
        if !self.nodes.flags[i].is_repaint_boundary {
            panic!(
                "{}",
                ContractViolation::RootNotRepaintBoundary {
                    node: self.describe_node(root),
                }
            );
        }
        self.nodes.relayout_boundary[i] = root.idx;
        self.nodes.flags[i].needs_layout = true;
        self.dirty.mark(root.idx, dirty::LAYOUT);

        let layer = match self.nodes.layer[i].filter(|l| self.layers.is_alive(*l)) {
            Some(layer) => layer,
            None => {
                let layer = self.layers.create_layer(LayerKind::offset(Vec2::ZERO));
                self.nodes.layer[i] = Some(layer);
                layer
            }
        };
        if !self.layers.is_attached(layer) {
            self.layers.attach(layer);
        }
        self.nodes.flags[i].needs_paint = true;
        self.dirty.mark(root.idx, dirty::PAINT);
        self.request_visual_update();
    }

    /// Gives the root a new layer, detaching the old one, and schedules a
    /// repaint.
    ///
    /// # Panics
    ///
    /// Panics if there is no root or `layer` is not a parentless container.
    pub fn replace_root_layer(&mut self, layer: LayerId) {
        let Some(root) = self.root else {
            panic!("replace_root_layer requires a root node");
        };
        assert!(
            self.layers.kind(layer).is_container() && self.layers.parent(layer).is_none(),
            "the root layer must be a parentless container"
        );
        let i = root.idx as usize;
        if let Some(old) = self.nodes.layer[i] {
            if old != layer && self.layers.is_alive(old) && self.layers.is_attached(old) {
                self.layers.detach(old);
            }
        }
        if !self.layers.is_attached(layer) {
            self.layers.attach(layer);
        }
        self.nodes.layer[i] = Some(layer);
        self.nodes.flags[i].needs_paint = false;
        self.mark_needs_paint(root);
    }

    /// The constraints the root is laid out with.
    #[must_use]
    pub fn root_constraints(&self) -> BoxConstraints {
        self.root_constraints
    }

    /// Sets the constraints the root is laid out with, scheduling a layout
    /// when they change.
    pub fn set_root_constraints(&mut self, constraints: BoxConstraints) {
        if self.root_constraints == constraints {
            return;
        }
        self.root_constraints = constraints;
        if let Some(root) = self.root {
            self.mark_needs_layout(root);
        }
    }

    // -- Flushes --

    fn drain_sorted(&mut self, channel: Channel) -> Vec<NodeId> {
        let drained: Vec<u32> = self.dirty.drain(channel).deterministic().run().collect();
        let mut ids: Vec<NodeId> = drained
            .into_iter()
            .filter(|&idx| idx < self.nodes.len && self.nodes.flags[idx as usize].alive)
            .map(|idx| self.nodes.id_at(idx))
            .collect();
        ids.sort_by_key(|id| self.nodes.depth[id.idx as usize]);
        ids
    }

    /// Lays out every dirty relayout boundary, shallowest first, until none
    /// are left. Returns how many boundaries were processed.
    pub fn flush_layout(&mut self) -> u32 {
        let first = self.drain_sorted(dirty::LAYOUT);
        self.flush_layout_from(first)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(frame = self.frame_index))]
    fn flush_layout_from(&mut self, mut batch: Vec<NodeId>) -> u32 {
        let previous = self.phase.replace(PhaseKind::Layout);
        let mut processed = 0;
        while !batch.is_empty() {
            for id in batch {
                if !self.nodes.is_alive(id) {
                    continue;
                }
                let flags = self.nodes.flags[id.idx as usize];
                if flags.needs_layout && flags.attached {
                    self.layout_without_resize(id);
                    processed += 1;
                }
            }
            // Layout callbacks may have dirtied new boundaries.
            batch = self.drain_sorted(dirty::LAYOUT);
        }
        self.phase = previous;
        tracing::debug!(processed, "layout flushed");
        processed
    }

    /// Recomputes stale compositing bits. Returns how many nodes were
    /// updated.
    pub fn flush_compositing_bits(&mut self) -> u32 {
        let batch = self.drain_sorted(dirty::COMPOSITING_BITS);
        self.flush_compositing_bits_from(batch)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(frame = self.frame_index))]
    fn flush_compositing_bits_from(&mut self, batch: Vec<NodeId>) -> u32 {
        let previous = self.phase.replace(PhaseKind::CompositingBits);
        let before = self.stats.compositing_updated;
        for id in batch {
            if !self.nodes.is_alive(id) {
                continue;
            }
            let flags = self.nodes.flags[id.idx as usize];
            if flags.needs_compositing_bits_update && flags.attached {
                self.update_compositing_bits(id.idx);
            }
        }
        self.phase = previous;
        let processed = self.stats.compositing_updated - before;
        tracing::debug!(processed, "compositing bits flushed");
        processed
    }

    /// Repaints every dirty repaint boundary whose layer is attached, then
    /// destroys layers that are neither reachable from an attached layer,
    /// held by a node, nor [retained](Self::retain_layer). Returns how many
    /// boundaries were repainted.
    ///
    /// Ids of destroyed layers are stale afterwards; using one panics.
    pub fn flush_paint(&mut self) -> u32 {
        let batch = self.drain_sorted(dirty::PAINT);
        self.flush_paint_from(batch)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(frame = self.frame_index))]
    fn flush_paint_from(&mut self, batch: Vec<NodeId>) -> u32 {
        let previous = self.phase.replace(PhaseKind::Paint);
        let before = self.stats.repainted;
        for id in batch {
            if !self.nodes.is_alive(id) {
                continue;
            }
            let i = id.idx as usize;
            let flags = self.nodes.flags[i];
            if !flags.needs_paint || !flags.attached {
                continue;
            }
            let layer_attached = self.nodes.layer[i]
                .is_some_and(|l| self.layers.is_alive(l) && self.layers.is_attached(l));
            if layer_attached {
                PaintingContext::repaint_composited_child(self, id);
            } else {
                tracing::trace!(node = id.idx, "layer detached, paint skipped");
                self.skipped_painting_on_layer(id);
            }
        }
        self.phase = previous;

        self.retained_layers.retain(|l| self.layers.is_alive(*l));
        let held: Vec<LayerId> = self
            .nodes
            .layer
            .iter()
            .flatten()
            .chain(&self.retained_layers)
            .copied()
            .collect();
        let freed = self.layers.collect_garbage(held);
        let processed = self.stats.repainted - before;
        tracing::debug!(processed, freed_layers = freed, "paint flushed");
        processed
    }

    /// Runs layout, compositing bits and paint, reporting each phase and a
    /// summary to `tracer`.
    pub fn run_frame(&mut self, tracer: &mut Tracer<'_>) -> FrameSummary {
        self.frame_index += 1;
        let frame_index = self.frame_index;
        let _span = tracing::debug_span!("frame", frame = frame_index).entered();
        let mut summary = FrameSummaryBuilder::new(frame_index);
        let diagnostics_start = self.diagnostics.len();
        self.stats = FlushStats::default();

        for phase in [PhaseKind::Layout, PhaseKind::CompositingBits, PhaseKind::Paint] {
            let channel = match phase {
                PhaseKind::Layout => dirty::LAYOUT,
                PhaseKind::CompositingBits => dirty::COMPOSITING_BITS,
                _ => dirty::PAINT,
            };
            let batch = self.drain_sorted(channel);
            let begin = Instant::now();
            tracer.phase_begin(&PhaseBeginEvent {
                frame_index,
                phase,
                queued: u32::try_from(batch.len()).unwrap_or(u32::MAX),
                timestamp: begin,
            });
            summary.phase_begin(phase, begin);
            let processed = match phase {
                PhaseKind::Layout => {
                    self.flush_layout_from(batch);
                    self.stats.laid_out
                }
                PhaseKind::CompositingBits => self.flush_compositing_bits_from(batch),
                _ => self.flush_paint_from(batch),
            };
            let end = Instant::now();
            summary.phase_end(phase, end, processed);
            tracer.phase_end(&PhaseEndEvent {
                frame_index,
                phase,
                processed,
                timestamp: end,
            });
            #[cfg(feature = "trace-rich")]
            {
                tracer.node_changes(frame_index, &self.changes);
                self.changes.clear();
            }
        }

        for diagnostic in &self.diagnostics[diagnostics_start..] {
            tracer.diagnostic(frame_index, diagnostic);
        }
        summary.add_skipped_paints(self.stats.skipped_paints);
        summary.add_errors(self.stats.errors);
        let summary = summary.finish();
        tracer.frame_summary(&summary);
        self.visual_update_requested = false;
        summary
    }

    /// Builds a scene from the root layer. Returns `None` when there is no
    /// root layer yet.
    pub fn composite_frame<B: SceneBuilder + ?Sized>(
        &mut self,
        builder: &mut B,
        tracer: &mut Tracer<'_>,
    ) -> Option<B::Scene> {
        let root = self.root_layer()?;
        let frame_index = self.frame_index;
        let begin = Instant::now();
        tracer.phase_begin(&PhaseBeginEvent {
            frame_index,
            phase: PhaseKind::Composite,
            queued: 1,
            timestamp: begin,
        });
        let scene = self.layers.build_scene(root, builder);
        tracer.phase_end(&PhaseEndEvent {
            frame_index,
            phase: PhaseKind::Composite,
            processed: 1,
            timestamp: Instant::now(),
        });
        Some(scene)
    }

    /// Number of frames run so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    // -- Faults --

    /// Records a fault raised by a node callback.
    pub(crate) fn report_error(&mut self, phase: PhaseKind, id: NodeId, error: NodeError) {
        let type_name = self.nodes.type_name(id);
        tracing::error!(
            phase = phase.label(),
            node = id.idx,
            type_name,
            %error,
            "node callback failed"
        );
        let subtree = self.dump_subtree(id);
        self.diagnostics.push(Diagnostic {
            phase,
            node: id,
            type_name,
            error,
            subtree,
        });
        self.stats.errors += 1;
    }

    /// Faults reported since the last [`take_diagnostics`](Self::take_diagnostics).
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Removes and returns the reported faults.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    // -- Visual updates --

    /// Installs the callback run whenever new work is queued.
    pub fn set_on_need_visual_update(&mut self, callback: impl FnMut() + 'static) {
        self.on_need_visual_update = Some(Box::new(callback));
    }

    /// Notes that a frame is needed and runs the visual update callback.
    pub fn request_visual_update(&mut self) {
        self.visual_update_requested = true;
        if let Some(callback) = self.on_need_visual_update.as_mut() {
            callback();
        }
    }

    /// Whether work was queued since the last [`run_frame`](Self::run_frame).
    #[must_use]
    pub fn visual_update_requested(&self) -> bool {
        self.visual_update_requested
    }
}
