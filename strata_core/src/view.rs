// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The root node of a render tree.

use kurbo::{Point, Size};

use crate::constraints::BoxConstraints;
use crate::diagnostics::StrataResult;
use crate::hit_test::BoxHitTestResult;
use crate::node::{HitTestCx, LayoutCx, RenderBox};

/// Root behavior that sizes itself to a configured size, within the root
/// constraints, and gives each child tight constraints of that size.
///
/// It is a repaint boundary, so the root always owns a layer, and it claims
/// every hit inside its bounds.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderView {
    /// The requested size, usually the window's logical size.
    pub size: Size,
}

impl RenderView {
    /// A view of the given size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self { size }
    }
}

impl RenderBox for RenderView {
    fn is_repaint_boundary(&self) -> bool {
        true
    }

    fn perform_layout(&mut self, cx: &mut LayoutCx<'_>) -> StrataResult<()> {
        let size = cx.constraints().constrain(self.size);
        cx.set_size(size);
        for child in cx.children() {
            cx.layout_child(child, BoxConstraints::tight(size), false);
        }
        Ok(())
    }

    fn hit_test_self(&self, _position: Point) -> bool {
        true
    }

    fn hit_test_children(&self, cx: &HitTestCx<'_>, result: &mut BoxHitTestResult, position: Point) -> bool {
        let mut child = cx.last_child();
        while let Some(c) = child {
            if cx.hit_test_child(c, result, position) {
                return true;
            }
            child = cx.child_before(c);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use super::*;
    use crate::pipeline::PipelineOwner;
    use crate::testing::Leaf;

    #[test]
    fn view_sizes_itself_within_root_constraints() {
        let mut owner = PipelineOwner::new();
        let root = owner.create_node(RenderView::new(Size::new(800.0, 600.0)));
        owner.set_root(Some(root));
        owner.set_root_constraints(BoxConstraints::loose(Size::new(400.0, 1000.0)));
        owner.prepare_initial_frame();
        let child = owner.create_node(Leaf::new(Size::new(1.0, 1.0)));
        owner.add_child(root, child);
        owner.flush_layout();

        assert_eq!(owner.nodes().size(root), Some(Size::new(400.0, 600.0)));
        assert_eq!(owner.nodes().size(child), Some(Size::new(400.0, 600.0)));
        assert_eq!(owner.nodes().relayout_boundary(child), Some(child));
    }
}
