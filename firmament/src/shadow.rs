use derivative::Derivative;
use glam::{Mat4, UVec2, Vec3};

use crate::{gpu, Error, Result};

/// Sun's shadow map, as rasterized by whoever draws the scene.
///
/// Depths are normalized (`0.0` = light's near plane, `1.0` = its far plane)
/// and laid out row by row, with the first row being the top one.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ShadowMap {
    size: UVec2,

    #[derivative(Debug = "ignore")]
    depth: Vec<f32>,

    view_proj: Mat4,
}

impl ShadowMap {
    /// Distance from the scene's origin at which the light gets placed.
    const LIGHT_DISTANCE: f32 = 20.0;

    /// Half of the extent covered by the shadow map, in world units.
    const HALF_EXTENT: f32 = 10.0;

    const NEAR: f32 = 0.1;
    const FAR: f32 = 80.0;

    pub fn new(size: UVec2, depth: Vec<f32>, view_proj: Mat4) -> Result<Self> {
        if size.cmpeq(UVec2::ZERO).any() {
            return Err(Error::EmptyShadowMap { size });
        }

        let expected = size.x as usize * size.y as usize;

        if depth.len() != expected {
            return Err(Error::DispatchSize {
                label: "shadow_map",
                expected,
                actual: depth.len(),
            });
        }

        Ok(Self {
            size,
            depth,
            view_proj,
        })
    }

    /// Creates a shadow map with nothing occluding the sun; `size` gets
    /// clamped to at least one texel.
    pub fn empty(size: UVec2, view_proj: Mat4) -> Self {
        let size = size.max(UVec2::ONE);

        Self {
            size,
            depth: vec![1.0; size.x as usize * size.y as usize],
            view_proj,
        }
    }

    /// Returns view-projection matrix of a directional light shining along
    /// `sun_direction` onto the area around the scene's origin.
    pub fn light_view_proj(sun_direction: Vec3) -> Mat4 {
        let dir = sun_direction.normalize();

        // Looking straight up or down would make `Y` a degenerate up vector
        let up = if dir.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };

        let view =
            Mat4::look_at_rh(-dir * Self::LIGHT_DISTANCE, Vec3::ZERO, up);

        let proj = Mat4::orthographic_rh(
            -Self::HALF_EXTENT,
            Self::HALF_EXTENT,
            -Self::HALF_EXTENT,
            Self::HALF_EXTENT,
            Self::NEAR,
            Self::FAR,
        );

        proj * view
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    pub fn view(&self) -> gpu::ShadowMapView<'_> {
        gpu::ShadowMapView::new(&self.depth, self.size, self.view_proj)
    }
}
