// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Views and the transform stack shared by all traversals.
//!
//! Four coordinate systems are involved:
//!
//! - *world*: the coordinates of a world's direct children;
//! - *view*: the camera frame;
//! - *cube*: the normalized device cube `[-1, 1]^3`;
//! - *pixel*: `x` right and `y` down in the viewport, depth `z` in `[0, 1]`.

use glam::{DMat4, DVec3};
use kurbo::Size;

/// A camera: how the world is viewed and projected onto a viewport.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct View {
    /// Transform from world to view coordinates.
    pub world_to_view: DMat4,
    /// Projection from view to cube coordinates.
    pub view_to_cube: DMat4,
    /// Viewport size in pixels.
    pub viewport: Size,
}

impl View {
    /// Create a view.
    pub const fn new(world_to_view: DMat4, view_to_cube: DMat4, viewport: Size) -> Self {
        Self {
            world_to_view,
            view_to_cube,
            viewport,
        }
    }

    /// Map the normalized device cube onto the viewport.
    pub fn cube_to_pixel(&self) -> DMat4 {
        let (w, h) = (self.viewport.width, self.viewport.height);
        DMat4::from_translation(DVec3::new(0.5 * w, 0.5 * h, 0.5))
            * DMat4::from_scale(DVec3::new(0.5 * w, -0.5 * h, 0.5))
    }

    /// World to cube coordinates.
    pub fn world_to_cube(&self) -> DMat4 {
        self.view_to_cube * self.world_to_view
    }

    /// World to pixel coordinates.
    pub fn world_to_pixel(&self) -> DMat4 {
        self.cube_to_pixel() * self.world_to_cube()
    }

    /// Pixel to world coordinates.
    pub fn pixel_to_world(&self) -> DMat4 {
        self.world_to_pixel().inverse()
    }

    /// Project a world point to pixel coordinates (with depth in `z`).
    pub fn project(&self, world: DVec3) -> DVec3 {
        self.world_to_pixel().project_point3(world)
    }
}

/// The local-to-world transform stack, plus the view transforms.
///
/// Traversals push a transform group's local-to-parent transform on entry
/// and pop it on exit, so that at any node the context knows how local
/// coordinates map to world, view, cube, and pixel coordinates.
#[derive(Clone, Debug)]
pub struct TransformContext {
    view: View,
    local_to_world: DMat4,
    stack: Vec<DMat4>,
}

impl TransformContext {
    /// A context at world level for `view`.
    pub fn new(view: View) -> Self {
        Self {
            view,
            local_to_world: DMat4::IDENTITY,
            stack: Vec::new(),
        }
    }

    /// The view.
    pub const fn view(&self) -> &View {
        &self.view
    }

    /// Current local-to-world transform.
    pub const fn local_to_world(&self) -> DMat4 {
        self.local_to_world
    }

    /// Current world-to-local transform.
    pub fn world_to_local(&self) -> DMat4 {
        self.local_to_world.inverse()
    }

    /// Current local-to-view transform.
    pub fn local_to_view(&self) -> DMat4 {
        self.view.world_to_view * self.local_to_world
    }

    /// Current local-to-cube transform.
    pub fn local_to_cube(&self) -> DMat4 {
        self.view.world_to_cube() * self.local_to_world
    }

    /// Current local-to-pixel transform.
    pub fn local_to_pixel(&self) -> DMat4 {
        self.view.world_to_pixel() * self.local_to_world
    }

    /// Current pixel-to-local transform.
    pub fn pixel_to_local(&self) -> DMat4 {
        self.local_to_pixel().inverse()
    }

    /// Number of transforms currently pushed.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Enter a frame: `local_to_world` becomes `local_to_world * transform`.
    pub fn push_local_to_world(&mut self, transform: &DMat4) {
        self.stack.push(self.local_to_world);
        self.local_to_world *= *transform;
    }

    /// Leave the most recently pushed frame.
    pub fn pop_local_to_world(&mut self) {
        if let Some(m) = self.stack.pop() {
            self.local_to_world = m;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn cube_corners_map_to_viewport_corners() {
        let view = View::new(DMat4::IDENTITY, DMat4::IDENTITY, Size::new(200.0, 100.0));
        let m = view.cube_to_pixel();
        assert!(close(m.transform_point3(DVec3::new(-1.0, 1.0, -1.0)), DVec3::ZERO));
        assert!(close(
            m.transform_point3(DVec3::new(1.0, -1.0, 1.0)),
            DVec3::new(200.0, 100.0, 1.0)
        ));
        assert!(close(
            m.transform_point3(DVec3::ZERO),
            DVec3::new(100.0, 50.0, 0.5)
        ));
    }

    #[test]
    fn pixel_round_trip_through_projection() {
        let view = View::new(
            DMat4::look_at_rh(DVec3::new(0.0, 0.0, 5.0), DVec3::ZERO, DVec3::Y),
            DMat4::perspective_rh_gl(1.0, 1.5, 1.0, 20.0),
            Size::new(300.0, 200.0),
        );
        let p = DVec3::new(0.3, -0.2, 1.0);
        let pixel = view.project(p);
        assert!((0.0..=1.0).contains(&pixel.z));
        assert!(close(view.pixel_to_world().project_point3(pixel), p));
    }

    #[test]
    fn push_and_pop_compose_transforms() {
        let view = View::new(DMat4::IDENTITY, DMat4::IDENTITY, Size::new(1.0, 1.0));
        let mut tc = TransformContext::new(view);
        tc.push_local_to_world(&DMat4::from_translation(DVec3::X));
        tc.push_local_to_world(&DMat4::from_scale(DVec3::splat(2.0)));
        assert_eq!(tc.depth(), 2);
        assert!(close(
            tc.local_to_world().transform_point3(DVec3::ONE),
            DVec3::new(3.0, 2.0, 2.0)
        ));
        assert!(close(tc.world_to_local().transform_point3(DVec3::new(3.0, 2.0, 2.0)), DVec3::ONE));
        tc.pop_local_to_world();
        tc.pop_local_to_world();
        tc.pop_local_to_world();
        assert_eq!(tc.local_to_world(), DMat4::IDENTITY);
    }
}
