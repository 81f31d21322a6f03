use glam::{Mat4, Vec3};

use crate::gpu;

/// Camera looking at the scene, in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    position: Vec3,
    view: Mat4,
    proj: Mat4,
}

impl Camera {
    const NEAR: f32 = 0.1;
    const FAR: f32 = 100.0;

    pub fn new(position: Vec3, view: Mat4, proj: Mat4) -> Self {
        Self {
            position,
            view,
            proj,
        }
    }

    /// Creates a perspective camera at `position`, looking towards
    /// `direction` (with `+Y` being up).
    pub fn perspective(
        position: Vec3,
        direction: Vec3,
        fov_y_deg: f32,
        aspect_ratio: f32,
    ) -> Self {
        let view = Mat4::look_to_rh(position, direction.normalize(), Vec3::Y);

        let proj = Mat4::perspective_rh(
            fov_y_deg.to_radians(),
            aspect_ratio,
            Self::NEAR,
            Self::FAR,
        );

        Self::new(position, view, proj)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    pub fn frustum(&self) -> gpu::FrustumDirections {
        gpu::FrustumDirections::from_inv_view_proj(self.view_proj().inverse())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 1.0, 0.0), -Vec3::Z, 60.0, 1.0)
    }
}
