// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by scene construction and mutation.

use crate::types::NodeId;

/// Errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The id refers to a removed node.
    #[error("{0:?} does not refer to a live node")]
    StaleNode(NodeId),
    /// The child already has a parent; remove it from that parent first.
    #[error("{0:?} already has a parent")]
    AlreadyParented(NodeId),
    /// Worlds are always roots.
    #[error("world {0:?} cannot be added as a child")]
    WorldAsChild(NodeId),
    /// The child is the parent itself or one of its ancestors.
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: NodeId,
        /// The would-be child.
        child: NodeId,
    },
    /// Only groups can have children.
    #[error("{0:?} is a leaf and cannot have children")]
    NotAGroup(NodeId),
    /// The operation needs a world.
    #[error("{0:?} is not a world")]
    NotAWorld(NodeId),
    /// The operation needs a transform group.
    #[error("{0:?} is not a transform group")]
    NotATransformGroup(NodeId),
    /// `child` is not a child of `parent`.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent that was searched.
        parent: NodeId,
        /// The node that was not found.
        child: NodeId,
    },
    /// Selection was changed on a node without [`NodeFlags::SELECTABLE`](crate::NodeFlags::SELECTABLE).
    #[error("{0:?} is not selectable")]
    NotSelectable(NodeId),
    /// Per-vertex or index arrays do not agree in length.
    #[error("array lengths disagree: {0}")]
    LengthMismatch(String),
    /// A primitive refers to a vertex that does not exist.
    #[error("vertex index {index} out of range for {vertices} vertices")]
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices available.
        vertices: usize,
    },
    /// The spatial index rejected its configuration.
    #[error(transparent)]
    Index(#[from] arbor_index::Error),
}

/// Shorthand for results carrying [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
