// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hit testing and coordinate conversion between nodes.
//!
//! A hit test walks the tree from the root, converting the position into
//! each child's coordinate space. [`BoxHitTestResult`] keeps the stack of
//! transforms in effect, so every recorded [`HitTestEntry`] carries the
//! global-to-local transform of its node.

use kurbo::{Point, Vec2};

use crate::id::{INVALID, NodeId};
use crate::node::hit_test::hit_test_node;
use crate::pipeline::PipelineOwner;
use crate::transform::Transform3d;

/// A node that was hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitTestEntry {
    /// The node.
    pub node: NodeId,
    /// The position in the node's coordinates.
    pub local_position: Point,
    /// Transform from global to the node's coordinates, or `None` when they
    /// coincide.
    pub transform: Option<Transform3d>,
}

/// The nodes under a position, deepest first.
#[derive(Clone, Debug, Default)]
pub struct BoxHitTestResult {
    path: Vec<HitTestEntry>,
    transforms: Vec<Transform3d>,
}

impl BoxHitTestResult {
    /// An empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The hit nodes, deepest first.
    #[must_use]
    pub fn path(&self) -> &[HitTestEntry] {
        &self.path
    }

    /// Records a hit on `node`, with the transform currently in effect.
    pub fn add(&mut self, node: NodeId, local_position: Point) {
        self.path.push(HitTestEntry {
            node,
            local_position,
            transform: self.transforms.last().copied(),
        });
    }

    fn push_transform(&mut self, transform: Transform3d) {
        let combined = match self.transforms.last() {
            Some(last) => transform * *last,
            None => transform,
        };
        self.transforms.push(combined);
    }

    /// Runs `hit_test` in the coordinate space of a child painted with
    /// `transform`.
    ///
    /// The paint transform is inverted (after dropping its perspective
    /// component). Returns `false` without calling `hit_test` when it cannot
    /// be inverted.
    pub fn add_with_paint_transform(
        &mut self,
        transform: Option<Transform3d>,
        position: Point,
        hit_test: impl FnOnce(&mut Self, Point) -> bool,
    ) -> bool {
        let inverse = match transform {
            Some(t) => match t.remove_perspective().try_inverse() {
                Some(inverse) => Some(inverse),
                None => return false,
            },
            None => None,
        };
        self.add_with_raw_transform(inverse, position, hit_test)
    }

    /// Runs `hit_test` with `position` mapped through `transform`, which
    /// goes from this node's coordinates into the child's.
    pub fn add_with_raw_transform(
        &mut self,
        transform: Option<Transform3d>,
        position: Point,
        hit_test: impl FnOnce(&mut Self, Point) -> bool,
    ) -> bool {
        let transformed = transform.map_or(position, |t| t.transform_point(position));
        self.scoped(transform, transformed, hit_test)
    }

    /// Runs `hit_test` in the coordinate space of a child painted at
    /// `offset`.
    pub fn add_with_paint_offset(
        &mut self,
        offset: Option<Vec2>,
        position: Point,
        hit_test: impl FnOnce(&mut Self, Point) -> bool,
    ) -> bool {
        let transform = offset.map(|offset| Transform3d::from_offset(-offset));
        let transformed = offset.map_or(position, |offset| position - offset);
        self.scoped(transform, transformed, hit_test)
    }

    /// Pushes `transform`, runs `hit_test` and pops it again, also when
    /// `hit_test` unwinds.
    fn scoped(
        &mut self,
        transform: Option<Transform3d>,
        position: Point,
        hit_test: impl FnOnce(&mut Self, Point) -> bool,
    ) -> bool {
        let mut scope = TransformScope {
            depth: self.transforms.len(),
            result: self,
        };
        if let Some(t) = transform {
            scope.result.push_transform(t);
        }
        hit_test(&mut *scope.result, position)
    }

    /// Depth of the transform stack. Zero outside any `add_with_*` call.
    #[must_use]
    pub fn transform_depth(&self) -> usize {
        self.transforms.len()
    }
}

/// Truncates the transform stack back to `depth` when dropped.
struct TransformScope<'a> {
    result: &'a mut BoxHitTestResult,
    depth: usize,
}

impl Drop for TransformScope<'_> {
    fn drop(&mut self) {
        self.result.transforms.truncate(self.depth);
    }
}

impl PipelineOwner {
    /// Hit tests the tree at `position`, in the root's coordinates. Returns
    /// whether anything was hit.
    pub fn hit_test(&self, result: &mut BoxHitTestResult, position: Point) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        hit_test_node(&self.nodes, root, result, position)
    }

    /// Transform from `id`'s coordinates to those of `ancestor`, or of the
    /// topmost ancestor when `None`.
    ///
    /// # Panics
    ///
    /// Panics if `ancestor` is not an ancestor of `id` (or `id` itself).
    #[must_use]
    pub fn get_transform_to(&self, id: NodeId, ancestor: Option<NodeId>) -> Transform3d {
        self.nodes.validate(id);
        let stop = match ancestor {
            Some(a) => {
                self.nodes.validate(a);
                assert!(
                    self.nodes.is_self_or_ancestor(a.idx, id.idx),
                    "{} is not an ancestor of {}",
                    self.describe_node(a),
                    self.describe_node(id)
                );
                a.idx
            }
            None => INVALID,
        };
        let mut chain = vec![id.idx];
        let mut cursor = id.idx;
        while cursor != stop {
            let parent = self.nodes.parent[cursor as usize];
            if parent == INVALID {
                break;
            }
            chain.push(parent);
            cursor = parent;
        }
        let mut transform = Transform3d::IDENTITY;
        for pair in chain.windows(2).rev() {
            let (child, parent) = (self.nodes.id_at(pair[0]), self.nodes.id_at(pair[1]));
            let offset = self.nodes.offset(child);
            match self.nodes.behavior(parent) {
                Some(b) => b.apply_paint_transform(child, offset, &mut transform),
                None => transform = transform.pre_translate(offset),
            }
        }
        transform
    }

    /// Converts a point in the root's coordinates into `id`'s. Returns the
    /// origin when the transform is not invertible.
    #[must_use]
    pub fn global_to_local(&self, id: NodeId, point: Point) -> Point {
        self.get_transform_to(id, None)
            .try_inverse()
            .map_or(Point::ZERO, |inverse| inverse.transform_point(point))
    }

    /// Converts a point in `id`'s coordinates into the root's.
    #[must_use]
    pub fn local_to_global(&self, id: NodeId, point: Point) -> Point {
        self.get_transform_to(id, None).transform_point(point)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Size, Vec2};

    use super::*;
    use crate::testing::{self, Column, Leaf};

    #[test]
    fn paint_offset_translates_and_pops() {
        let mut result = BoxHitTestResult::new();
        let node = NodeId { idx: 0, generation: 0 };
        let hit = result.add_with_paint_offset(Some(Vec2::new(10.0, 5.0)), Point::new(15.0, 15.0), |r, p| {
            assert_eq!(p, Point::new(5.0, 10.0), "position is in child space");
            assert_eq!(r.transform_depth(), 1, "one transform pushed");
            r.add(node, p);
            true
        });
        assert!(hit);
        assert_eq!(result.transform_depth(), 0);
        let entry = result.path()[0];
        let t = entry.transform.expect("transform recorded");
        assert_eq!(t.transform_point(Point::new(15.0, 15.0)), Point::new(5.0, 10.0));
    }

    #[test]
    fn stack_is_balanced_on_miss() {
        let mut result = BoxHitTestResult::new();
        let hit = result.add_with_raw_transform(
            Some(Transform3d::from_scale(2.0, 2.0, 1.0)),
            Point::new(1.0, 1.0),
            |r, _| r.add_with_paint_offset(Some(Vec2::new(1.0, 1.0)), Point::ZERO, |_, _| false),
        );
        assert!(!hit);
        assert_eq!(result.transform_depth(), 0);
        assert!(result.path().is_empty());
    }

    #[test]
    fn stack_is_balanced_when_the_callback_panics() {
        let mut result = BoxHitTestResult::new();
        let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            result.add_with_paint_offset(Some(Vec2::new(3.0, 4.0)), Point::ZERO, |r, p| {
                r.add_with_raw_transform(Some(Transform3d::from_scale(2.0, 2.0, 1.0)), p, |_, _| {
                    panic!("hit test exploded")
                })
            })
        }));
        assert!(unwound.is_err());
        assert_eq!(result.transform_depth(), 0);

        let node = NodeId { idx: 0, generation: 0 };
        result.add(node, Point::ZERO);
        assert_eq!(result.path()[0].transform, None, "no stale transform is recorded");
    }

    #[test]
    fn singular_paint_transform_is_a_miss() {
        let mut result = BoxHitTestResult::new();
        let called = std::cell::Cell::new(false);
        let hit = result.add_with_paint_transform(
            Some(Transform3d::from_scale(0.0, 1.0, 1.0)),
            Point::new(1.0, 1.0),
            |_, _| {
                called.set(true);
                true
            },
        );
        assert!(!hit);
        assert!(!called.get(), "callback is not run");
    }

    #[test]
    fn nested_transforms_compose() {
        let mut result = BoxHitTestResult::new();
        let node = NodeId { idx: 0, generation: 0 };
        result.add_with_paint_offset(Some(Vec2::new(10.0, 0.0)), Point::new(30.0, 0.0), |r, p| {
            r.add_with_paint_transform(Some(Transform3d::from_scale(2.0, 2.0, 1.0)), p, |r, p| {
                assert_eq!(p, Point::new(10.0, 0.0), "offset then scale");
                r.add(node, p);
                true
            })
        });
        let t = result.path()[0].transform.expect("transform recorded");
        assert_eq!(t.transform_point(Point::new(30.0, 0.0)), Point::new(10.0, 0.0));
    }

    #[test]
    fn hit_test_finds_topmost_child_path() {
        let mut owner = PipelineOwner::new();
        let root = testing::view(&mut owner, Size::new(100.0, 100.0));
        let column = owner.create_node(Column::new());
        let a = owner.create_node(Leaf::new(Size::new(50.0, 10.0)));
        let b = owner.create_node(Leaf::new(Size::new(50.0, 10.0)));
        owner.add_child(root, column);
        owner.add_child(column, a);
        owner.add_child(column, b);
        owner.flush_layout();

        let mut result = BoxHitTestResult::new();
        assert!(owner.hit_test(&mut result, Point::new(5.0, 15.0)));
        let path: Vec<NodeId> = result.path().iter().map(|e| e.node).collect();
        assert_eq!(path, vec![b, column, root]);
        assert_eq!(result.path()[0].local_position, Point::new(5.0, 5.0));

        // Column is hit but none of its children; it does not claim the hit
        // itself, so only the view is recorded.
        let mut result = BoxHitTestResult::new();
        assert!(owner.hit_test(&mut result, Point::new(80.0, 50.0)));
        let path: Vec<NodeId> = result.path().iter().map(|e| e.node).collect();
        assert_eq!(path, vec![root]);
    }

    #[test]
    fn coordinates_convert_through_offsets() {
        let mut owner = PipelineOwner::new();
        let root = testing::view(&mut owner, Size::new(100.0, 100.0));
        let column = owner.create_node(Column::new());
        let a = owner.create_node(Leaf::new(Size::new(50.0, 10.0)));
        let b = owner.create_node(Leaf::new(Size::new(50.0, 10.0)));
        owner.add_child(root, column);
        owner.add_child(column, a);
        owner.add_child(column, b);
        owner.flush_layout();

        assert_eq!(owner.local_to_global(b, Point::new(1.0, 1.0)), Point::new(1.0, 11.0));
        assert_eq!(owner.global_to_local(b, Point::new(1.0, 11.0)), Point::new(1.0, 1.0));
        let t = owner.get_transform_to(b, Some(column));
        assert_eq!(t.as_translation(), Some(Vec2::new(0.0, 10.0)));
        assert!(owner.get_transform_to(b, Some(b)).is_identity());
    }
}
