// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render attributes attached to nodes and inherited down the hierarchy.

use crate::render::Renderer;
use crate::types::{PolygonMode, Rgb};

/// Material parameters for lit surfaces.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    /// Specular reflectance.
    pub specular: Rgb,
    /// Specular exponent.
    pub shininess: f32,
    /// Whether the current color drives ambient and diffuse reflectance.
    pub color_material: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            specular: Rgb::BLACK,
            shininess: 0.0,
            color_material: false,
        }
    }
}

/// A set of optional render attribute overrides attached to a node.
///
/// Unset attributes are inherited from the enclosing nodes; see
/// [`RenderState::merged`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSet {
    /// Base color, used when a batch has no per-vertex colors.
    pub color: Option<Rgb>,
    /// Whether lighting is enabled.
    pub lighting: Option<bool>,
    /// Whether back faces are lit as well as front faces.
    pub two_sided: Option<bool>,
    /// Polygon rasterization mode.
    pub polygon_mode: Option<PolygonMode>,
    /// Surface material.
    pub material: Option<Material>,
}

impl StateSet {
    /// The states mesh groups start with: a light gray color, two-sided
    /// lighting, and a shiny white specular material tracking the color.
    pub fn mesh_default() -> Self {
        Self {
            color: Some(Rgb::LIGHT_GRAY),
            lighting: None,
            two_sided: Some(true),
            polygon_mode: None,
            material: Some(Material {
                specular: Rgb::WHITE,
                shininess: 100.0,
                color_material: true,
            }),
        }
    }

    /// Set the base color.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    /// Returns true if no attribute is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fully resolved render attributes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderState {
    /// Base color.
    pub color: Rgb,
    /// Whether lighting is enabled.
    pub lighting: bool,
    /// Whether back faces are lit.
    pub two_sided: bool,
    /// Polygon rasterization mode.
    pub polygon_mode: PolygonMode,
    /// Surface material.
    pub material: Material,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            lighting: true,
            two_sided: false,
            polygon_mode: PolygonMode::Fill,
            material: Material::default(),
        }
    }
}

impl RenderState {
    /// This state with every attribute set in `states` overridden.
    pub fn merged(&self, states: &StateSet) -> Self {
        Self {
            color: states.color.unwrap_or(self.color),
            lighting: states.lighting.unwrap_or(self.lighting),
            two_sided: states.two_sided.unwrap_or(self.two_sided),
            polygon_mode: states.polygon_mode.unwrap_or(self.polygon_mode),
            material: states.material.unwrap_or(self.material),
        }
    }

    /// Send every attribute to the renderer.
    pub fn apply<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        renderer.set_color(self.color);
        renderer.set_lighting(self.lighting);
        renderer.set_two_sided(self.two_sided);
        renderer.set_polygon_mode(self.polygon_mode);
        renderer.set_material(&self.material);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_only_set_attributes() {
        let base = RenderState::default();
        let merged = base.merged(&StateSet::mesh_default());
        assert_eq!(merged.color, Rgb::LIGHT_GRAY);
        assert!(merged.two_sided);
        assert!(merged.lighting, "lighting is inherited");
        assert_eq!(merged.polygon_mode, PolygonMode::Fill);
        assert_eq!(merged.material.shininess, 100.0);

        let lines = StateSet {
            polygon_mode: Some(PolygonMode::Line),
            ..Default::default()
        };
        let nested = merged.merged(&lines);
        assert_eq!(nested.polygon_mode, PolygonMode::Line);
        assert_eq!(nested.color, Rgb::LIGHT_GRAY);
    }

    #[test]
    fn empty_state_set() {
        assert!(StateSet::default().is_empty());
        assert!(!StateSet::default().with_color(Rgb::BLACK).is_empty());
    }
}
