// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=arbor_scene --heading-base-level=0

//! Arbor Scene: a 3D scene graph with cached bounding spheres and cull, draw, and pick traversals.
//!
//! Arbor Scene is the retained scene layer of a mesh viewer.
//!
//! - Represents a hierarchy of groups, transform groups, worlds, and leaf batches in one arena.
//! - Caches each node's bounding sphere and recomputes only the dirty path to the root.
//! - Tracks the selected nodes of each world.
//! - Partitions triangle and quad meshes into spatially coherent leaf batches.
//! - Culls against a view frustum, replays the result into a [`Renderer`], and picks under a pixel.
//!
//! ## Three passes over one tree
//!
//! The same structure is walked three ways. Each pass keeps a [`TransformContext`]
//! so that it always knows how the current node's coordinates relate to the world,
//! the view, and the viewport.
//!
//! - Cull ([`CullContext`]): tests bounding spheres against the frustum planes and
//!   collects the root-to-leaf paths of visible batches in a [`DrawList`].
//! - Draw ([`DrawContext`]): walks a draw list, inheriting [`StateSet`]s and issuing
//!   renderer calls; selected batches get an outline pass.
//! - Pick ([`PickContext`]): carries a near-to-far segment through the pixel down the
//!   tree and reports every primitive hit.
//!
//! ## Integration with Arbor Index
//!
//! Bounding volumes, planes, segments, and the median-split [`BoundingBoxTree`](arbor_index::BoundingBoxTree)
//! used by [`MeshBuilder`] all come from [`arbor_index`].
//!
//! ## API overview
//!
//! - [`Scene`]: arena of nodes, structure edits, bounding spheres, selection.
//! - [`NodeId`]: generational handle of a node.
//! - [`NodeFlags`]: visibility, picking, and selection controls.
//! - [`MeshBuilder`]: builds a selectable mesh group out of [`LeafBatch`]es.
//! - [`View`]: world-to-view and projection transforms plus a viewport size.
//! - [`Renderer`]: the backend interface; [`Recorder`] is a headless implementation.
//!
//! # Example
//!
//! ```rust
//! use arbor_scene::{
//!     CullContext, DrawContext, MeshBuilder, PickContext, Recorder, Scene, View,
//! };
//! use glam::{DMat4, DVec3};
//! use kurbo::{Point, Size};
//!
//! let mut scene = Scene::new();
//! let world = scene.insert_world();
//!
//! // One unit quad in the z = 0 plane.
//! let xyz = [
//!     0.0, 0.0, 0.0, //
//!     0.0, 1.0, 0.0, //
//!     1.0, 1.0, 0.0, //
//!     1.0, 0.0, 0.0, //
//! ];
//! let mesh = MeshBuilder::quads(&xyz).insert(&mut scene).unwrap();
//! scene.add_child(world, mesh).unwrap();
//!
//! // Look down -z at the quad's center.
//! let view = View::new(
//!     DMat4::look_at_rh(DVec3::new(0.5, 0.5, 5.0), DVec3::new(0.5, 0.5, 0.0), DVec3::Y),
//!     DMat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, 0.1, 10.0),
//!     Size::new(200.0, 200.0),
//! );
//!
//! let mut cull = CullContext::new(view);
//! cull.traverse(&mut scene, world).unwrap();
//! let list = cull.into_draw_list();
//! assert_eq!(list.len(), 1);
//!
//! let mut recorder = Recorder::new();
//! DrawContext::new(view, &mut recorder).draw(&scene, &list).unwrap();
//! assert_eq!(recorder.primitives_drawn(), 1);
//!
//! let mut pick = PickContext::new(view, Point::new(100.0, 100.0));
//! pick.pick(&mut scene, world).unwrap();
//! let hit = pick.closest().unwrap();
//! assert!(hit.world_point.distance(DVec3::new(0.5, 0.5, 0.0)) < 1e-9);
//! ```
//!
//! ### Float semantics
//!
//! Vertex data is `f32`; transforms, bounds, and intersections are computed in `f64`.
//! Coordinates are assumed to be finite.

pub mod batch;
pub mod cull;
pub mod draw;
pub mod error;
pub mod mesh;
pub mod pick;
pub mod render;
pub mod scene;
pub mod state;
pub mod types;
pub mod view;

pub use batch::{DEFAULT_MIN_PER_LEAF, LeafBatch, MeshBuilder};
pub use cull::{CullContext, DrawList};
pub use draw::DrawContext;
pub use error::{Error, Result};
pub use mesh::Grid;
pub use pick::{PickContext, PickResult};
pub use render::{Command, Recorder, Renderer};
pub use scene::{MeshStats, NodeKind, Scene, WorldData};
pub use state::{Material, RenderState, StateSet};
pub use types::{NodeFlags, NodeId, PolygonMode, PrimitiveKind, Rgb};
pub use view::{TransformContext, View};
