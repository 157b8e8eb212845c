// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types, contract violations, and per-node fault reports.
//!
//! Failures fall into two groups:
//!
//! - **Runtime faults** raised by node callbacks are returned as
//!   [`NodeError`]. The pipeline catches them per node, logs them with
//!   `tracing::error!`, and records a [`Diagnostic`]; the frame continues.
//! - **Contract violations** are API misuse (a size outside the constraints,
//!   marking a node dirty in the wrong phase, a re-entrant layout). They are
//!   described by [`ContractViolation`] and raised with `panic!`, in debug
//!   builds for checks that are costly and unconditionally for structural ones.

use std::error::Error;
use std::fmt::{self, Write as _};

use kurbo::Size;

use crate::constraints::{BoxConstraints, ConstraintsError};
use crate::id::{INVALID, NodeId};
use crate::pipeline::PipelineOwner;
use crate::trace::PhaseKind;

/// Result type returned by node callbacks.
pub type StrataResult<T> = Result<T, NodeError>;

/// A runtime fault raised by a node's layout, resize, or paint callback.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// A free-form failure description.
    #[error("{0}")]
    Message(String),
    /// The node produced or received invalid constraints.
    #[error(transparent)]
    Constraints(#[from] ConstraintsError),
    /// Any other error.
    #[error(transparent)]
    Other(Box<dyn Error + Send + Sync>),
}

impl NodeError {
    /// Creates a [`NodeError::Message`].
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Misuse of the pipeline API. Raised with `panic!("{violation}")`.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    /// A node was laid out or painted while one of its own callbacks was
    /// running.
    #[error(
        "re-entrant {phase} of {node}\n\
         A node's {phase} callback caused the same node to be processed again. \
         Nodes must not lay out or paint themselves."
    )]
    Reentrant {
        /// Description of the node.
        node: String,
        /// The phase being re-entered.
        phase: &'static str,
    },
    /// Layout was invoked with constraints that fail validation.
    #[error("invalid constraints passed to {node}\n{error}")]
    InvalidConstraints {
        /// Description of the node.
        node: String,
        /// The validation failure, including the offending constraints.
        error: String,
    },
    /// A node finished layout without setting its size.
    #[error(
        "{node} did not set a size during layout\n\
         Every node must call set_size from perform_layout (or perform_resize \
         when it is sized by its parent)."
    )]
    SizeNotSet {
        /// Description of the node.
        node: String,
    },
    /// A node chose a size that does not satisfy its constraints.
    #[error(
        "{node} does not meet its constraints\n\
         Constraints: {constraints}\n\
         Size: {size:?}\n\
         A node's size must satisfy the constraints it was laid out with."
    )]
    SizeViolatesConstraints {
        /// Description of the node.
        node: String,
        /// The constraints it was given.
        constraints: BoxConstraints,
        /// The size it chose.
        size: Size,
    },
    /// `set_size` was called from the wrong callback.
    #[error(
        "{node} set its size outside the callback that owns it\n\
         {detail}"
    )]
    SizeSetOutsidePhase {
        /// Description of the node.
        node: String,
        /// Which rule was broken.
        detail: &'static str,
    },
    /// A parent read a child's size or baseline without declaring that it
    /// uses the child's size.
    #[error(
        "{parent} read the size of {child} without parent_uses_size\n\
         Pass parent_uses_size = true to layout_child when the parent's own \
         layout depends on the child's size."
    )]
    ChildSizeNotUsable {
        /// Description of the parent.
        parent: String,
        /// Description of the child.
        child: String,
    },
    /// A node was marked dirty for layout while the owner was flushing,
    /// outside a layout callback window covering it.
    #[error(
        "{node} was marked as needing layout during {phase}\n\
         Nodes may only be dirtied for layout while the pipeline is idle, or \
         from within invoke_layout_callback for the subtree being built."
    )]
    MutationDuringFlush {
        /// Description of the node.
        node: String,
        /// The phase in progress.
        phase: &'static str,
    },
    /// A node was marked as needing paint during the paint phase.
    #[error(
        "{node} was marked as needing paint during paint\n\
         Painting must not dirty the tree it is painting."
    )]
    PaintDuringPaint {
        /// Description of the node.
        node: String,
    },
    /// An intrinsic dimension query was given a negative argument.
    #[error("{node}: {dimension} was queried with the negative argument {argument}")]
    NegativeIntrinsicArgument {
        /// Description of the node.
        node: String,
        /// The queried dimension.
        dimension: &'static str,
        /// The argument.
        argument: f64,
    },
    /// An intrinsic dimension came back negative or non-finite.
    #[error("{node}: {dimension} returned {value}, which is not a non-negative finite value")]
    InvalidIntrinsic {
        /// Description of the node.
        node: String,
        /// The queried dimension.
        dimension: &'static str,
        /// The returned value.
        value: f64,
    },
    /// A minimum intrinsic dimension exceeded the matching maximum.
    #[error("{node}: intrinsic {axis} minimum {min} exceeds maximum {max}")]
    IntrinsicOrder {
        /// Description of the node.
        node: String,
        /// `"width"` or `"height"`.
        axis: &'static str,
        /// The minimum.
        min: f64,
        /// The maximum.
        max: f64,
    },
    /// A paint callback left the canvas with a different save count than it
    /// found it.
    #[error(
        "{node} left the canvas with a mismatched save count\n\
         Save count before painting: {before}\n\
         Save count after painting: {after}\n\
         Every save and save_layer must be balanced by a restore."
    )]
    SaveCountMismatch {
        /// Description of the node.
        node: String,
        /// Save count before the paint callback.
        before: usize,
        /// Save count after the paint callback.
        after: usize,
    },
    /// The root node must own a layer.
    #[error("the root node {node} must be a repaint boundary")]
    RootNotRepaintBoundary {
        /// Description of the node.
        node: String,
    },
}

/// Structured report of a runtime fault caught while flushing a node.
#[derive(Debug)]
pub struct Diagnostic {
    /// The phase that was running.
    pub phase: PhaseKind,
    /// The node whose callback failed.
    pub node: NodeId,
    /// Short type name of the node's behavior.
    pub type_name: &'static str,
    /// The error returned by the callback.
    pub error: NodeError,
    /// Indented dump of the node's subtree at the time of the failure.
    pub subtree: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} failed for {}#{}: {}",
            self.phase.label(),
            self.type_name,
            self.node.index(),
            self.error
        )?;
        let mut source = self.error.source();
        while let Some(cause) = source {
            writeln!(f, "  caused by: {cause}")?;
            source = cause.source();
        }
        write!(f, "The node's subtree was:\n{}", self.subtree)
    }
}

impl PipelineOwner {
    /// One-line description of a node: its type, index, distance to its
    /// relayout boundary, and pending dirty flags.
    ///
    /// ```text
    /// Padding#4 relayoutBoundary=up2 NEEDS-LAYOUT NEEDS-PAINT
    /// ```
    #[must_use]
    pub fn describe_node(&self, id: NodeId) -> String {
        let nodes = self.nodes();
        let mut out = format!("{}#{}", nodes.type_name(id), id.index());
        let boundary = nodes.relayout_boundary[id.idx as usize];
        if boundary != INVALID && boundary != id.idx {
            let mut count = 1;
            let mut target = nodes.parent[id.idx as usize];
            while target != INVALID && target != boundary {
                target = nodes.parent[target as usize];
                count += 1;
            }
            _ = write!(out, " relayoutBoundary=up{count}");
        }
        let flags = nodes.flags[id.idx as usize];
        if flags.needs_layout {
            out.push_str(" NEEDS-LAYOUT");
        }
        if flags.needs_paint {
            out.push_str(" NEEDS-PAINT");
        }
        if flags.needs_compositing_bits_update {
            out.push_str(" NEEDS-COMPOSITING-BITS-UPDATE");
        }
        if !flags.attached {
            out.push_str(" DETACHED");
        }
        out
    }

    /// Indented dump of `id` and its descendants with their constraints and
    /// sizes.
    #[must_use]
    pub fn dump_subtree(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, id, 0);
        out
    }

    fn dump_into(&self, out: &mut String, id: NodeId, indent: usize) {
        let nodes = self.nodes();
        let pad = "  ".repeat(indent);
        _ = writeln!(out, "{pad}{}", self.describe_node(id));
        match nodes.constraints(id) {
            Some(c) => {
                _ = writeln!(out, "{pad}  constraints: {c}");
            }
            None => out.push_str(&format!("{pad}  constraints: MISSING\n")),
        }
        match nodes.size(id) {
            Some(s) => {
                _ = writeln!(out, "{pad}  size: ({}, {})", s.width, s.height);
            }
            None => out.push_str(&format!("{pad}  size: MISSING\n")),
        }
        let offset = nodes.offset(id);
        if offset != kurbo::Vec2::ZERO {
            _ = writeln!(out, "{pad}  offset: ({}, {})", offset.x, offset.y);
        }
        for child in nodes.children(id) {
            self.dump_into(out, child, indent + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintsViolation;

    #[test]
    fn node_error_wraps_constraints_error() {
        let err: NodeError = ConstraintsError {
            violation: ConstraintsViolation::NegativeMinWidth,
            constraints: BoxConstraints::UNCONSTRAINED,
        }
        .into();
        assert!(matches!(err, NodeError::Constraints(_)));
        assert_eq!(NodeError::msg("boom").to_string(), "boom");
    }

    #[test]
    fn violation_messages_name_the_node() {
        let v = ContractViolation::SizeViolatesConstraints {
            node: "Leaf#3".into(),
            constraints: BoxConstraints::tight(Size::new(10.0, 10.0)),
            size: Size::new(20.0, 10.0),
        };
        let text = v.to_string();
        assert!(text.starts_with("Leaf#3 does not meet its constraints"));
        assert!(text.contains("Size: "));
    }

    #[test]
    fn diagnostic_display_includes_phase_and_subtree() {
        let d = Diagnostic {
            phase: PhaseKind::Layout,
            node: NodeId {
                idx: 2,
                generation: 0,
            },
            type_name: "Broken",
            error: NodeError::msg("no room"),
            subtree: "Broken#2 NEEDS-PAINT\n".into(),
        };
        let text = d.to_string();
        assert!(text.starts_with("layout failed for Broken#2: no room"));
        assert!(text.ends_with("Broken#2 NEEDS-PAINT\n"));
    }
}
