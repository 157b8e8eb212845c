// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays layer storage with allocation, topology, attachment, and
//! retained-rendering state.

use std::fmt::Write as _;

use kurbo::Vec2;

use super::kind::LayerKind;
use super::scene::EngineLayer;
use crate::id::{INVALID, LayerId, LayerLink};
use crate::painting::Picture;
use crate::transform::Transform3d;

/// Debug switches consulted while building a scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneOptions {
    /// Skip pushing clip layers.
    pub disable_clip_layers: bool,
    /// Skip pushing opacity layers.
    pub disable_opacity_layers: bool,
    /// Skip pushing physical-shape layers.
    pub disable_physical_shape_layers: bool,
}

/// Values a layer computed the last time it was added to a scene.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct SceneState {
    /// Effective transform of a transform layer, or the follower transform.
    pub(crate) last_transform: Option<Transform3d>,
    /// Offset a leader or follower was last added at.
    pub(crate) last_offset: Option<Vec2>,
}

/// Struct-of-arrays storage for the retained layer tree.
///
/// Layers are addressed by [`LayerId`] handles. Each layer is exclusively
/// owned by its parent; a layer must be [removed](Self::remove) before it can
/// be [appended](Self::append) elsewhere. A layer is *attached* when it is
/// reachable from a root passed to [`attach`](Self::attach).
#[derive(Debug)]
pub struct LayerTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Properties --
    pub(crate) kind: Vec<LayerKind>,
    pub(crate) scene_state: Vec<SceneState>,

    // -- Retained rendering --
    pub(crate) needs_add_to_scene: Vec<bool>,
    pub(crate) engine_layer: Vec<Option<EngineLayer>>,

    // -- Lifecycle --
    pub(crate) attached: Vec<bool>,
    pub(crate) alive: Vec<bool>,
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Leader registry, indexed by link --
    pub(crate) link_leaders: Vec<u32>,

    pub(crate) options: SceneOptions,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerTree {
    /// Creates an empty layer tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            scene_state: Vec::new(),
            needs_add_to_scene: Vec::new(),
            engine_layer: Vec::new(),
            attached: Vec::new(),
            alive: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            link_leaders: Vec::new(),
            options: SceneOptions::default(),
        }
    }

    // -- Allocation API --

    /// Creates a detached, parentless layer. New layers need to be added to
    /// the next scene.
    pub fn create_layer(&mut self, kind: LayerKind) -> LayerId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.scene_state[i] = SceneState::default();
            self.needs_add_to_scene[i] = true;
            self.engine_layer[i] = None;
            self.attached[i] = false;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.scene_state.push(SceneState::default());
            self.needs_add_to_scene.push(true);
            self.engine_layer.push(None);
            self.attached.push(false);
            self.alive.push(true);
            self.generation.push(0);
            idx
        };
        self.id_at(idx)
    }

    /// Destroys a parentless, childless layer.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, the layer has children, or it is still
    /// attached to a parent.
    pub fn destroy_layer(&mut self, id: LayerId) {
        self.validate(id);
        let idx = id.idx as usize;
        assert!(
            self.first_child[idx] == INVALID,
            "cannot destroy layer with children"
        );
        assert!(
            self.parent[idx] == INVALID,
            "cannot destroy layer that has a parent"
        );
        if self.attached[idx] {
            self.detach(id);
        }
        self.free_slot(id.idx);
    }

    /// Returns whether the given handle refers to a live layer.
    #[must_use]
    pub fn is_alive(&self, id: LayerId) -> bool {
        id.idx < self.len && self.generation[id.idx as usize] == id.generation && self.alive[id.idx as usize]
    }

    /// Returns the number of live layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Topology API --

    /// Appends `child` as the last child of `parent`.
    ///
    /// The child is attached if the parent is, and the parent is marked as
    /// needing to be added to the scene.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `parent` cannot have children,
    /// `child` already has a parent, or `child` is `parent` or one of its
    /// ancestors.
    pub fn append(&mut self, parent: LayerId, child: LayerId) {
        self.validate(parent);
        self.validate(child);
        let (p, c) = (parent.idx, child.idx);
        assert!(
            self.kind[p as usize].is_container(),
            "{} cannot have children",
            self.kind[p as usize].name()
        );
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(
            !self.is_self_or_ancestor(c, p),
            "cannot append a layer to itself or its descendant"
        );

        let last = self.last_child[p as usize];
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = last;
        self.next_sibling[c as usize] = INVALID;
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
        }
        self.last_child[p as usize] = c;

        self.adopt(p, c);
    }

    /// Removes `child` from its parent. Detaches it if it was attached.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the layer has no parent.
    pub fn remove(&mut self, child: LayerId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "layer has no parent");
        self.unlink_from_parent(c);
        self.drop_child(p, c);
    }

    /// Removes every child of `parent`.
    pub fn remove_all_children(&mut self, parent: LayerId) {
        self.validate(parent);
        let p = parent.idx;
        let mut child = self.first_child[p as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.parent[child as usize] = INVALID;
            self.prev_sibling[child as usize] = INVALID;
            self.next_sibling[child as usize] = INVALID;
            self.drop_child(p, child);
            child = next;
        }
        self.first_child[p as usize] = INVALID;
        self.last_child[p as usize] = INVALID;
    }

    /// Puts `replacement` in `old`'s position under `old`'s parent and removes
    /// `old`.
    ///
    /// # Panics
    ///
    /// Panics if `old` has no parent or `replacement` already has one.
    pub fn replace_with(&mut self, old: LayerId, replacement: LayerId) {
        self.validate(old);
        self.validate(replacement);
        let (o, r) = (old.idx as usize, replacement.idx);
        let p = self.parent[o];
        assert!(p != INVALID, "layer has no parent");
        assert!(
            self.parent[r as usize] == INVALID,
            "replacement already has a parent"
        );
        assert!(
            !self.is_self_or_ancestor(r, p),
            "cannot replace a layer with its ancestor"
        );

        let prev = self.prev_sibling[o];
        let next = self.next_sibling[o];
        self.parent[r as usize] = p;
        self.prev_sibling[r as usize] = prev;
        self.next_sibling[r as usize] = next;
        if prev == INVALID {
            self.first_child[p as usize] = r;
        } else {
            self.next_sibling[prev as usize] = r;
        }
        if next == INVALID {
            self.last_child[p as usize] = r;
        } else {
            self.prev_sibling[next as usize] = r;
        }
        self.parent[o] = INVALID;
        self.prev_sibling[o] = INVALID;
        self.next_sibling[o] = INVALID;

        self.drop_child(p, old.idx);
        self.adopt(p, r);
    }

    /// Marks `root` and its subtree as attached. Leaders register with their
    /// links.
    ///
    /// # Panics
    ///
    /// Panics if `root` has a parent (attachment follows the parent), or if a
    /// leader's link already has an attached leader.
    pub fn attach(&mut self, root: LayerId) {
        self.validate(root);
        assert!(
            self.parent[root.idx as usize] == INVALID,
            "only parentless layers can be attached directly"
        );
        self.attach_subtree(root.idx);
    }

    /// Marks `root` and its subtree as detached. Leaders unregister from their
    /// links.
    pub fn detach(&mut self, root: LayerId) {
        self.validate(root);
        assert!(
            self.parent[root.idx as usize] == INVALID,
            "only parentless layers can be detached directly"
        );
        self.detach_subtree(root.idx);
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.parent[id.idx as usize])
    }

    /// Returns the first child of `id`.
    #[must_use]
    pub fn first_child(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.first_child[id.idx as usize])
    }

    /// Returns the last child of `id`.
    #[must_use]
    pub fn last_child(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.last_child[id.idx as usize])
    }

    /// Returns the sibling after `id`.
    #[must_use]
    pub fn next_sibling(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.next_sibling[id.idx as usize])
    }

    /// Returns the sibling before `id`.
    #[must_use]
    pub fn prev_sibling(&self, id: LayerId) -> Option<LayerId> {
        self.validate(id);
        self.opt_id(self.prev_sibling[id.idx as usize])
    }

    /// Returns the children of `id`, first to last.
    #[must_use]
    pub fn children(&self, id: LayerId) -> Vec<LayerId> {
        self.validate(id);
        let mut out = Vec::new();
        let mut child = self.first_child[id.idx as usize];
        while child != INVALID {
            out.push(self.id_at(child));
            child = self.next_sibling[child as usize];
        }
        out
    }

    /// Returns every descendant of `id` in depth-first pre-order, excluding
    /// `id` itself.
    #[must_use]
    pub fn depth_first_children(&self, id: LayerId) -> Vec<LayerId> {
        self.validate(id);
        let mut out = Vec::new();
        self.collect_descendants(id.idx, &mut out);
        out
    }

    fn collect_descendants(&self, idx: u32, out: &mut Vec<LayerId>) {
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            out.push(self.id_at(child));
            self.collect_descendants(child, out);
            child = self.next_sibling[child as usize];
        }
    }

    /// Whether `id` is reachable from an attached root.
    #[must_use]
    pub fn is_attached(&self, id: LayerId) -> bool {
        self.validate(id);
        self.attached[id.idx as usize]
    }

    // -- Properties --

    /// Returns the layer's kind and properties.
    #[must_use]
    pub fn kind(&self, id: LayerId) -> &LayerKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Replaces the layer's properties, marking it as needing to be added to
    /// the scene when they changed.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is a different variant from the layer's current kind.
    pub fn set_kind(&mut self, id: LayerId, kind: LayerKind) {
        self.validate(id);
        let slot = &mut self.kind[id.idx as usize];
        assert!(
            slot.same_variant(&kind),
            "cannot turn a {} into a {}",
            slot.name(),
            kind.name()
        );
        if *slot != kind {
            *slot = kind;
            self.mark_needs_add_to_scene(id);
        }
    }

    /// Sets the offset of an offset, transform, opacity or leader layer.
    ///
    /// # Panics
    ///
    /// Panics if the layer has no offset property.
    pub fn set_offset(&mut self, id: LayerId, new_offset: Vec2) {
        self.validate(id);
        let slot = match &mut self.kind[id.idx as usize] {
            LayerKind::Offset { offset }
            | LayerKind::Transform { offset, .. }
            | LayerKind::Opacity { offset, .. }
            | LayerKind::Leader { offset, .. } => offset,
            other => panic!("{} has no offset", other.name()),
        };
        if *slot != new_offset {
            *slot = new_offset;
            self.mark_needs_add_to_scene(id);
        }
    }

    /// Returns the offset of a layer that has one.
    #[must_use]
    pub fn offset(&self, id: LayerId) -> Option<Vec2> {
        match self.kind(id) {
            LayerKind::Offset { offset }
            | LayerKind::Transform { offset, .. }
            | LayerKind::Opacity { offset, .. }
            | LayerKind::Leader { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Stores the finished recording of a picture layer.
    pub(crate) fn set_picture(&mut self, id: LayerId, recorded: Picture) {
        self.validate(id);
        if let LayerKind::Picture { picture, .. } = &mut self.kind[id.idx as usize] {
            *picture = Some(recorded);
        }
        self.mark_needs_add_to_scene(id);
    }

    /// Updates the rasterization hints of a picture layer.
    pub(crate) fn set_picture_hints(&mut self, id: LayerId, complex: Option<bool>, will_change: Option<bool>) {
        self.validate(id);
        if let LayerKind::Picture {
            is_complex_hint,
            will_change_hint,
            ..
        } = &mut self.kind[id.idx as usize]
        {
            if let Some(c) = complex {
                *is_complex_hint = c;
            }
            if let Some(w) = will_change {
                *will_change_hint = w;
            }
        }
    }

    /// Scene-build switches.
    #[must_use]
    pub fn scene_options(&self) -> SceneOptions {
        self.options
    }

    /// Replaces the scene-build switches.
    pub fn set_scene_options(&mut self, options: SceneOptions) {
        self.options = options;
    }

    // -- Retained rendering --

    /// Whether the layer's last engine layer cannot be reused.
    #[must_use]
    pub fn needs_add_to_scene(&self, id: LayerId) -> bool {
        self.validate(id);
        self.needs_add_to_scene[id.idx as usize]
    }

    /// The engine layer produced the last time this layer was added to a
    /// scene.
    #[must_use]
    pub fn engine_layer(&self, id: LayerId) -> Option<EngineLayer> {
        self.validate(id);
        self.engine_layer[id.idx as usize]
    }

    /// Marks the layer as changed since the last scene, so it cannot be
    /// retained, and marks its parent too unless the parent is re-added every
    /// frame anyway.
    pub fn mark_needs_add_to_scene(&mut self, id: LayerId) {
        self.validate(id);
        self.mark_needs_add_to_scene_at(id.idx);
    }

    pub(crate) fn mark_needs_add_to_scene_at(&mut self, idx: u32) {
        if self.needs_add_to_scene[idx as usize] {
            return;
        }
        self.needs_add_to_scene[idx as usize] = true;
        let p = self.parent[idx as usize];
        if p != INVALID && !self.kind[p as usize].always_needs_add_to_scene() {
            self.needs_add_to_scene[p as usize] = true;
        }
    }

    /// Propagates `needs_add_to_scene` from descendants to ancestors, so a
    /// container is retained only if its whole subtree is unchanged.
    pub fn update_subtree_needs_add_to_scene(&mut self, id: LayerId) {
        self.validate(id);
        self.update_subtree_at(id.idx);
    }

    fn update_subtree_at(&mut self, idx: u32) {
        let i = idx as usize;
        let mut needs = self.needs_add_to_scene[i] || self.kind[i].always_needs_add_to_scene();
        let mut child = self.first_child[i];
        while child != INVALID {
            self.update_subtree_at(child);
            needs |= self.needs_add_to_scene[child as usize];
            child = self.next_sibling[child as usize];
        }
        self.needs_add_to_scene[i] = needs;
    }

    /// Records the engine layer a container produced. A change marks the
    /// parent as needing to be re-added unless either layer is re-added every
    /// frame anyway.
    pub(crate) fn set_engine_layer(&mut self, idx: u32, layer: Option<EngineLayer>) {
        let i = idx as usize;
        if self.engine_layer[i] == layer {
            return;
        }
        self.engine_layer[i] = layer;
        if self.kind[i].always_needs_add_to_scene() {
            return;
        }
        let p = self.parent[i];
        if p != INVALID && !self.kind[p as usize].always_needs_add_to_scene() {
            self.needs_add_to_scene[p as usize] = true;
        }
    }

    // -- Leader/follower links --

    /// Allocates a new link with no leader.
    pub fn create_link(&mut self) -> LayerLink {
        let link = LayerLink(u32::try_from(self.link_leaders.len()).unwrap_or(INVALID));
        self.link_leaders.push(INVALID);
        link
    }

    /// Returns the attached leader of `link`, if any.
    #[must_use]
    pub fn link_leader(&self, link: LayerLink) -> Option<LayerId> {
        let idx = *self.link_leaders.get(link.0 as usize)?;
        self.opt_id(idx)
    }

    // -- Garbage collection --

    /// Destroys every layer that is neither reachable from an attached root
    /// nor from one of `keep`. Returns the number of layers freed.
    ///
    /// Kept layers whose parent is freed become parentless. Ids of freed
    /// layers are stale; using one panics.
    pub fn collect_garbage(&mut self, keep: impl IntoIterator<Item = LayerId>) -> usize {
        let mut reachable = vec![false; self.len as usize];
        let mut stack: Vec<u32> = (0..self.len)
            .filter(|&i| self.alive[i as usize] && self.attached[i as usize])
            .collect();
        stack.extend(
            keep.into_iter()
                .filter(|id| self.is_alive(*id))
                .map(|id| id.idx),
        );
        while let Some(idx) = stack.pop() {
            if std::mem::replace(&mut reachable[idx as usize], true) {
                continue;
            }
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
        }

        let mut freed = 0;
        for idx in 0..self.len {
            let i = idx as usize;
            if !self.alive[i] || reachable[i] {
                continue;
            }
            // Orphan kept children; their parent is going away.
            let mut child = self.first_child[i];
            while child != INVALID {
                let next = self.next_sibling[child as usize];
                if reachable[child as usize] {
                    self.parent[child as usize] = INVALID;
                    self.prev_sibling[child as usize] = INVALID;
                    self.next_sibling[child as usize] = INVALID;
                }
                child = next;
            }
            self.free_slot(idx);
            freed += 1;
        }
        freed
    }

    // -- Diagnostics --

    /// Indented dump of `id` and its descendants.
    #[must_use]
    pub fn dump(&self, id: LayerId) -> String {
        self.validate(id);
        let mut out = String::new();
        self.dump_into(&mut out, id.idx, 0);
        out
    }

    fn dump_into(&self, out: &mut String, idx: u32, indent: usize) {
        let i = idx as usize;
        let pad = "  ".repeat(indent);
        _ = write!(out, "{pad}{}#{}", self.kind[i].name(), idx);
        match &self.kind[i] {
            LayerKind::Offset { offset } => {
                _ = write!(out, " offset=({}, {})", offset.x, offset.y);
            }
            LayerKind::Opacity { alpha, .. } => {
                _ = write!(out, " alpha={alpha}");
            }
            LayerKind::ClipRect { rect, .. } => {
                _ = write!(out, " clip={rect:?}");
            }
            LayerKind::Picture { picture, .. } => {
                _ = write!(out, " ops={}", picture.as_ref().map_or(0, Picture::len));
            }
            _ => {}
        }
        if self.needs_add_to_scene[i] {
            out.push_str(" NEEDS-ADD-TO-SCENE");
        }
        if !self.attached[i] {
            out.push_str(" DETACHED");
        }
        out.push('\n');
        let mut child = self.first_child[i];
        while child != INVALID {
            self.dump_into(out, child, indent + 1);
            child = self.next_sibling[child as usize];
        }
    }

    // -- Internal helpers --

    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> LayerId {
        LayerId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    #[inline]
    pub(crate) fn opt_id(&self, idx: u32) -> Option<LayerId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Panics if `id` is stale.
    #[inline]
    pub(crate) fn validate(&self, id: LayerId) {
        assert!(
            self.is_alive(id),
            "stale LayerId: {id:?} (current gen: {})",
            self.generation.get(id.idx as usize).copied().unwrap_or(0)
        );
    }

    fn is_self_or_ancestor(&self, ancestor: u32, node: u32) -> bool {
        let mut cursor = node;
        while cursor != INVALID {
            if cursor == ancestor {
                return true;
            }
            cursor = self.parent[cursor as usize];
        }
        false
    }

    fn adopt(&mut self, parent: u32, child: u32) {
        if !self.kind[parent as usize].always_needs_add_to_scene() {
            self.mark_needs_add_to_scene_at(parent);
        }
        if self.attached[parent as usize] {
            self.attach_subtree(child);
        }
    }

    fn drop_child(&mut self, parent: u32, child: u32) {
        if !self.kind[parent as usize].always_needs_add_to_scene() {
            self.mark_needs_add_to_scene_at(parent);
        }
        if self.attached[child as usize] {
            self.detach_subtree(child);
        }
    }

    fn unlink_from_parent(&mut self, idx: u32) {
        let i = idx as usize;
        let p = self.parent[i];
        let prev = self.prev_sibling[i];
        let next = self.next_sibling[i];
        if prev == INVALID {
            self.first_child[p as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next == INVALID {
            self.last_child[p as usize] = prev;
        } else {
            self.prev_sibling[next as usize] = prev;
        }
        self.parent[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.next_sibling[i] = INVALID;
    }

    fn attach_subtree(&mut self, idx: u32) {
        let i = idx as usize;
        self.attached[i] = true;
        if let LayerKind::Leader { link, .. } = self.kind[i] {
            let slot = &mut self.link_leaders[link.0 as usize];
            assert!(
                *slot == INVALID || *slot == idx,
                "{link:?} already has an attached leader"
            );
            *slot = idx;
        }
        let mut child = self.first_child[i];
        while child != INVALID {
            self.attach_subtree(child);
            child = self.next_sibling[child as usize];
        }
    }

    fn detach_subtree(&mut self, idx: u32) {
        let i = idx as usize;
        self.attached[i] = false;
        if let LayerKind::Leader { link, .. } = self.kind[i] {
            if self.link_leaders[link.0 as usize] == idx {
                self.link_leaders[link.0 as usize] = INVALID;
            }
            self.scene_state[i].last_offset = None;
        }
        let mut child = self.first_child[i];
        while child != INVALID {
            self.detach_subtree(child);
            child = self.next_sibling[child as usize];
        }
    }

    fn free_slot(&mut self, idx: u32) {
        let i = idx as usize;
        if let LayerKind::Leader { link, .. } = self.kind[i] {
            if self.link_leaders[link.0 as usize] == idx {
                self.link_leaders[link.0 as usize] = INVALID;
            }
        }
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.last_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.kind[i] = LayerKind::Container;
        self.engine_layer[i] = None;
        self.attached[i] = false;
        self.alive[i] = false;
        self.generation[i] += 1;
        self.free_list.push(idx);
    }
}
