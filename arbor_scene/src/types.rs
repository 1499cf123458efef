// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, flags, and primitive kinds.

/// Identifier for a node in a [`Scene`](crate::Scene).
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Use [`Scene::is_alive`](crate::Scene::is_alive) to check whether a `NodeId` still refers to a
/// live node. Stale `NodeId`s never alias a different live node because the generation must match.
///
/// Ids are ordered by slot and then generation, which gives world selection sets a
/// deterministic iteration order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility, picking, and selection.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (participates in culling and drawing).
        const VISIBLE    = 0b0000_0001;
        /// Node is pickable (participates in pick traversals).
        const PICKABLE   = 0b0000_0010;
        /// Node may be selected and tracked in its world's selected set.
        const SELECTABLE = 0b0000_0100;
        /// Node is currently selected. Only meaningful with `SELECTABLE`.
        const SELECTED   = 0b0000_1000;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// The primitive a mesh is made of.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// Three vertices per primitive.
    Triangles,
    /// Four vertices per primitive, in winding order.
    Quads,
}

impl PrimitiveKind {
    /// Number of vertices per primitive.
    pub const fn arity(self) -> usize {
        match self {
            Self::Triangles => 3,
            Self::Quads => 4,
        }
    }
}

/// How polygons are rasterized.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Filled polygons.
    #[default]
    Fill,
    /// Polygon outlines.
    Line,
    /// Polygon vertices only.
    Point,
}

/// An RGB color with components in `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rgb {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Pure black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    /// The light gray used for meshes without explicit colors (`192/255`).
    pub const LIGHT_GRAY: Self = Self::new(192.0 / 255.0, 192.0 / 255.0, 192.0 / 255.0);

    /// Create a color from its components.
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}
