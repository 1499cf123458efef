// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The renderer interface driven by draw traversals, and a recording renderer.

use glam::DMat4;

use crate::state::Material;
use crate::types::{PolygonMode, PrimitiveKind, Rgb};

/// A graphics backend that draws leaf batches.
///
/// The draw traversal calls into the renderer explicitly; there is no ambient
/// current context. Implementations translate these calls to a native API.
pub trait Renderer {
    /// Replace the current model-view transform.
    fn load_transform(&mut self, local_to_view: &DMat4);
    /// Set the current color.
    fn set_color(&mut self, color: Rgb);
    /// Set the polygon rasterization mode.
    fn set_polygon_mode(&mut self, mode: PolygonMode);
    /// Enable a depth offset `(factor, units)` for filled polygons, or disable it.
    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>);
    /// Enable or disable lighting.
    fn set_lighting(&mut self, enabled: bool);
    /// Enable or disable two-sided lighting.
    fn set_two_sided(&mut self, enabled: bool);
    /// Set the surface material.
    fn set_material(&mut self, material: &Material);
    /// Bind packed per-vertex arrays for the following draw calls.
    fn begin_batch(&mut self, vertices: &[f32], normals: Option<&[f32]>, colors: Option<&[f32]>);
    /// Draw `count` primitives from the bound arrays.
    fn draw_batch(&mut self, kind: PrimitiveKind, count: usize);
    /// Unbind the arrays bound by [`Renderer::begin_batch`].
    fn end_batch(&mut self);
}

/// One renderer call, as captured by [`Recorder`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// [`Renderer::load_transform`].
    LoadTransform(DMat4),
    /// [`Renderer::set_color`].
    SetColor(Rgb),
    /// [`Renderer::set_polygon_mode`].
    SetPolygonMode(PolygonMode),
    /// [`Renderer::set_polygon_offset`].
    SetPolygonOffset(Option<(f32, f32)>),
    /// [`Renderer::set_lighting`].
    SetLighting(bool),
    /// [`Renderer::set_two_sided`].
    SetTwoSided(bool),
    /// [`Renderer::set_material`].
    SetMaterial(Material),
    /// [`Renderer::begin_batch`], with array lengths instead of contents.
    BeginBatch {
        /// Number of vertex coordinates bound.
        vertices: usize,
        /// Whether normals were bound.
        normals: bool,
        /// Whether colors were bound.
        colors: bool,
    },
    /// [`Renderer::draw_batch`].
    DrawBatch(PrimitiveKind, usize),
    /// [`Renderer::end_batch`].
    EndBatch,
}

/// A headless [`Renderer`] that records every call.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    commands: Vec<Command>,
}

impl Recorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The calls recorded so far.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Take the recorded calls, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<Command> {
        core::mem::take(&mut self.commands)
    }

    /// Number of [`Command::DrawBatch`] calls recorded.
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawBatch(..)))
            .count()
    }

    /// Total primitives drawn across all draw calls.
    pub fn primitives_drawn(&self) -> usize {
        self.commands
            .iter()
            .map(|c| match c {
                Command::DrawBatch(_, n) => *n,
                _ => 0,
            })
            .sum()
    }
}

impl Renderer for Recorder {
    fn load_transform(&mut self, local_to_view: &DMat4) {
        self.commands.push(Command::LoadTransform(*local_to_view));
    }

    fn set_color(&mut self, color: Rgb) {
        self.commands.push(Command::SetColor(color));
    }

    fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.commands.push(Command::SetPolygonMode(mode));
    }

    fn set_polygon_offset(&mut self, offset: Option<(f32, f32)>) {
        self.commands.push(Command::SetPolygonOffset(offset));
    }

    fn set_lighting(&mut self, enabled: bool) {
        self.commands.push(Command::SetLighting(enabled));
    }

    fn set_two_sided(&mut self, enabled: bool) {
        self.commands.push(Command::SetTwoSided(enabled));
    }

    fn set_material(&mut self, material: &Material) {
        self.commands.push(Command::SetMaterial(*material));
    }

    fn begin_batch(&mut self, vertices: &[f32], normals: Option<&[f32]>, colors: Option<&[f32]>) {
        self.commands.push(Command::BeginBatch {
            vertices: vertices.len(),
            normals: normals.is_some(),
            colors: colors.is_some(),
        });
    }

    fn draw_batch(&mut self, kind: PrimitiveKind, count: usize) {
        self.commands.push(Command::DrawBatch(kind, count));
    }

    fn end_batch(&mut self) {
        self.commands.push(Command::EndBatch);
    }
}
