// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, bounding spheres, selection.

use std::collections::BTreeSet;

use arbor_index::BoundingSphere;
use glam::DMat4;

use crate::batch::LeafBatch;
use crate::error::{Error, Result};
use crate::state::StateSet;
use crate::types::{NodeFlags, NodeId};

/// What a node is.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A plain group of children.
    Group,
    /// A group whose children are positioned by a local-to-parent transform.
    Transform(DMat4),
    /// A root group that tracks the selected nodes beneath it.
    World(WorldData),
    /// A leaf holding renderable primitives.
    Batch(LeafBatch),
}

impl NodeKind {
    /// Returns true for kinds that may have children.
    pub const fn is_group(&self) -> bool {
        !matches!(self, Self::Batch(_))
    }
}

/// State owned by a world node.
#[derive(Clone, Debug, Default)]
pub struct WorldData {
    selected: BTreeSet<NodeId>,
}

impl WorldData {
    /// Selected nodes beneath the world, in id order.
    pub fn selected(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.selected.iter().copied()
    }

    /// Number of selected nodes beneath the world.
    pub fn count_selected(&self) -> usize {
        self.selected.len()
    }
}

/// Number of batches and primitives beneath a node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Leaf batches in the subtree.
    pub batches: usize,
    /// Primitives across those batches.
    pub primitives: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) flags: NodeFlags,
    pub(crate) states: Option<StateSet>,
    // `None` while dirty.
    bounds: Option<BoundingSphere>,
}

impl Node {
    fn new(generation: u32, kind: NodeKind) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            kind,
            flags: NodeFlags::default(),
            states: None,
            bounds: None,
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// An arena of scene nodes forming one or more trees.
///
/// Every node has at most one parent. Worlds are always roots. Each node
/// caches its bounding sphere, expressed in its parent's coordinates; the
/// cache is invalidated for a node and all of its ancestors whenever the
/// node's contents change, and recomputed on demand.
pub struct Scene {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    bounds_computations: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("bounds_computations", &self.bounds_computations)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            bounds_computations: 0,
        }
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, kind));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, kind)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Insert a new world. Worlds are roots and cannot be added as children.
    pub fn insert_world(&mut self) -> NodeId {
        self.insert(NodeKind::World(WorldData::default()))
    }

    /// Insert a new, empty, parentless group.
    pub fn insert_group(&mut self) -> NodeId {
        self.insert(NodeKind::Group)
    }

    /// Insert a new, empty, parentless transform group.
    pub fn insert_transform_group(&mut self, local_to_parent: DMat4) -> NodeId {
        self.insert(NodeKind::Transform(local_to_parent))
    }

    /// Insert a new parentless leaf batch.
    pub fn insert_batch(&mut self, batch: LeafBatch) -> NodeId {
        self.insert(NodeKind::Batch(batch))
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.generation()).then_some(n)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        (n.generation == id.generation()).then_some(n)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(Error::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or(Error::StaleNode(id))
    }

    /// Add `child` as the last child of `parent`.
    ///
    /// The parent's bounding sphere (and its ancestors') becomes dirty, and if
    /// the parent is in a world, the world's selected set is updated for the
    /// child's subtree.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let p = self.node(parent)?;
        let c = self.node(child)?;
        if !p.kind.is_group() {
            return Err(Error::NotAGroup(parent));
        }
        if matches!(c.kind, NodeKind::World(_)) {
            return Err(Error::WorldAsChild(child));
        }
        if c.parent.is_some() {
            return Err(Error::AlreadyParented(child));
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(Error::Cycle { parent, child });
        }

        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.mark_bounds_dirty(parent);
        if let Some(world) = self.world_of(parent) {
            self.update_selected_set(world, child);
        }
        Ok(())
    }

    /// Detach `child` from `parent`. The child and its subtree stay alive as
    /// a separate root.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(Error::NotAChild { parent, child });
        }
        let world = self.world_of(parent);

        self.node_mut(parent)?.children.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;
        self.mark_bounds_dirty(parent);
        if let Some(world) = world {
            self.update_selected_set(world, child);
        }
        Ok(())
    }

    /// Remove a node and its whole subtree from the scene.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.node(id)?.parent {
            self.remove_child(parent, id)?;
        }
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
            }
        }
        Ok(())
    }

    /// Children of a node in insertion order; empty for stale ids and leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    /// Number of children of a node.
    pub fn count_children(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// The kind of a node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    /// The leaf batch held by a node, if it is a batch.
    pub fn batch(&self, id: NodeId) -> Option<&LeafBatch> {
        match self.kind(id)? {
            NodeKind::Batch(b) => Some(b),
            _ => None,
        }
    }

    /// Ancestors of a node, starting with the node itself and ending at its root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.is_alive(id).then_some(id);
        core::iter::from_fn(move || {
            let current = next?;
            next = self.parent(current);
            Some(current)
        })
    }

    /// Path from the root to `id` (inclusive).
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path
    }

    /// The world a node belongs to: the root of its tree, if that root is a world.
    pub fn world_of(&self, id: NodeId) -> Option<NodeId> {
        let root = self.ancestors(id).last()?;
        matches!(self.get(root)?.kind, NodeKind::World(_)).then_some(root)
    }

    fn world_data(&self, world: NodeId) -> Result<&WorldData> {
        match &self.node(world)?.kind {
            NodeKind::World(data) => Ok(data),
            _ => Err(Error::NotAWorld(world)),
        }
    }

    fn world_data_mut(&mut self, world: NodeId) -> Option<&mut WorldData> {
        match &mut self.get_mut(world)?.kind {
            NodeKind::World(data) => Some(data),
            _ => None,
        }
    }

    // --- bounding spheres ---

    /// Mark the bounding sphere of a node, and of every ancestor, dirty.
    pub fn dirty_bounding_sphere(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.mark_bounds_dirty(id);
        Ok(())
    }

    fn mark_bounds_dirty(&mut self, id: NodeId) {
        let mut next = Some(id);
        while let Some(n) = next.and_then(|n| self.get_mut(n)) {
            n.bounds = None;
            next = n.parent;
        }
    }

    /// The bounding sphere of a node in its parent's coordinates.
    ///
    /// Computed on first request after the node was dirtied, then cached.
    /// With `finite`, an empty sphere is reported as a zero-radius sphere at
    /// the origin.
    pub fn bounding_sphere(&mut self, id: NodeId, finite: bool) -> Result<BoundingSphere> {
        self.node(id)?;
        let bs = self.compute_bounds(id);
        Ok(if finite && bs.is_empty() {
            BoundingSphere::origin()
        } else {
            bs
        })
    }

    /// The cached bounding sphere, if it is not dirty.
    pub fn cached_bounding_sphere(&self, id: NodeId) -> Option<BoundingSphere> {
        self.get(id)?.bounds
    }

    /// Number of bounding sphere recomputations performed so far.
    pub fn bounds_computations(&self) -> u64 {
        self.bounds_computations
    }

    fn compute_bounds(&mut self, id: NodeId) -> BoundingSphere {
        let Some(node) = self.get(id) else {
            return BoundingSphere::Empty;
        };
        if let Some(bs) = node.bounds {
            return bs;
        }
        let bs = match &node.kind {
            NodeKind::Batch(batch) => *batch.bounding_sphere(),
            NodeKind::Group | NodeKind::World(_) => self.union_of_children(id),
            NodeKind::Transform(m) => {
                let m = *m;
                self.union_of_children(id).transformed(&m)
            }
        };
        self.bounds_computations += 1;
        tracing::trace!(?id, ?bs, "computed bounding sphere");
        if let Some(node) = self.get_mut(id) {
            node.bounds = Some(bs);
        }
        bs
    }

    fn union_of_children(&mut self, id: NodeId) -> BoundingSphere {
        let children = self.children(id).to_vec();
        let mut bs = BoundingSphere::Empty;
        for child in children {
            bs.expand_by_sphere(&self.compute_bounds(child));
        }
        bs
    }

    // --- selection ---

    /// Flags of a node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.get(id).map(|n| n.flags)
    }

    /// Replace the flags of a node.
    ///
    /// Changes to [`NodeFlags::SELECTED`] or [`NodeFlags::SELECTABLE`] are
    /// reflected in the world's selected set.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<()> {
        self.node_mut(id)?.flags = flags;
        if let Some(world) = self.world_of(id) {
            self.update_selected_set(world, id);
        }
        Ok(())
    }

    /// Returns true if the node is selectable.
    pub fn is_selectable(&self, id: NodeId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(NodeFlags::SELECTABLE))
    }

    /// Returns true if the node is selectable and selected.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.flags(id)
            .is_some_and(|f| f.contains(NodeFlags::SELECTABLE | NodeFlags::SELECTED))
    }

    /// Select or deselect a selectable node.
    pub fn set_selected(&mut self, id: NodeId, selected: bool) -> Result<()> {
        let node = self.node_mut(id)?;
        if !node.flags.contains(NodeFlags::SELECTABLE) {
            return Err(Error::NotSelectable(id));
        }
        if node.flags.contains(NodeFlags::SELECTED) == selected {
            return Ok(());
        }
        node.flags.set(NodeFlags::SELECTED, selected);
        tracing::trace!(?id, selected, "selection changed");
        if let Some(world) = self.world_of(id) {
            self.update_selected_set(world, id);
        }
        Ok(())
    }

    /// Selected nodes in a world, in id order.
    pub fn selected(&self, world: NodeId) -> Result<impl Iterator<Item = NodeId> + '_> {
        Ok(self.world_data(world)?.selected())
    }

    /// Number of selected nodes in a world.
    pub fn count_selected(&self, world: NodeId) -> Result<usize> {
        Ok(self.world_data(world)?.count_selected())
    }

    /// Deselect every selected node in a world.
    pub fn clear_selected(&mut self, world: NodeId) -> Result<()> {
        self.clear_selected_except(world, None)
    }

    /// Deselect every selected node in a world except `keep`.
    pub fn clear_selected_except(&mut self, world: NodeId, keep: Option<NodeId>) -> Result<()> {
        let selected: Vec<NodeId> = self.world_data(world)?.selected().collect();
        for id in selected {
            if Some(id) != keep && self.is_selected(id) {
                self.set_selected(id, false)?;
            }
        }
        Ok(())
    }

    /// Bring `world`'s selected set up to date for `root` and every node
    /// reachable from it through groups.
    ///
    /// A node belongs in the set when it is selectable, selected, and in `world`.
    fn update_selected_set(&mut self, world: NodeId, root: NodeId) {
        let in_world = self.world_of(root) == Some(world);
        let mut stack = vec![root];
        let mut changes = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            let member = in_world && node.flags.contains(NodeFlags::SELECTABLE | NodeFlags::SELECTED);
            changes.push((id, member));
            if node.kind.is_group() {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        let Some(data) = self.world_data_mut(world) else {
            return;
        };
        for (id, member) in changes {
            if member {
                data.selected.insert(id);
            } else {
                data.selected.remove(&id);
            }
        }
        tracing::trace!(?world, ?root, selected = data.selected.len(), "updated selected set");
    }

    // --- attributes ---

    /// The local-to-parent transform of a transform group.
    pub fn transform(&self, id: NodeId) -> Option<DMat4> {
        match self.get(id)?.kind {
            NodeKind::Transform(m) => Some(m),
            _ => None,
        }
    }

    /// Replace the transform of a transform group; its bounds become dirty.
    pub fn set_transform(&mut self, id: NodeId, local_to_parent: DMat4) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Transform(m) => *m = local_to_parent,
            _ => return Err(Error::NotATransformGroup(id)),
        }
        self.mark_bounds_dirty(id);
        Ok(())
    }

    /// Render states attached to a node.
    pub fn states(&self, id: NodeId) -> Option<&StateSet> {
        self.get(id)?.states.as_ref()
    }

    /// Attach render states to a node, replacing any previous ones.
    pub fn set_states(&mut self, id: NodeId, states: StateSet) -> Result<()> {
        self.node_mut(id)?.states = Some(states);
        Ok(())
    }

    /// Batch and primitive counts for the subtree rooted at a node.
    pub fn mesh_stats(&self, id: NodeId) -> Result<MeshStats> {
        self.node(id)?;
        let mut stats = MeshStats::default();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            let Some(node) = self.get(n) else {
                continue;
            };
            if let NodeKind::Batch(batch) = &node.kind {
                stats.batches += 1;
                stats.primitives += batch.count();
            }
            stack.extend_from_slice(&node.children);
        }
        Ok(stats)
    }
}
