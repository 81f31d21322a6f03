use bytemuck::{Pod, Zeroable};
use glam::{vec3, Mat4, Vec2, Vec3};

/// View directions passing through the four corners of camera's frustum.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FrustumDirections {
    pub top_left: Vec3,
    pub top_right: Vec3,
    pub bottom_left: Vec3,
    pub bottom_right: Vec3,
}

impl FrustumDirections {
    /// Reconstructs frustum's corner directions from an inverted
    /// view-projection matrix.
    pub fn from_inv_view_proj(inv_view_proj: Mat4) -> Self {
        let corner = |x: f32, y: f32| {
            let near = inv_view_proj.project_point3(vec3(x, y, 0.2));
            let far = inv_view_proj.project_point3(vec3(x, y, 0.5));

            (far - near).normalize()
        };

        Self {
            top_left: corner(-1.0, 1.0),
            top_right: corner(1.0, 1.0),
            bottom_left: corner(-1.0, -1.0),
            bottom_right: corner(1.0, -1.0),
        }
    }

    /// Returns direction of the ray passing through given point on the screen
    /// (`<0.0, 1.0>`, `y` going down).
    pub fn ray(&self, screen_uv: Vec2) -> Vec3 {
        let top = self.top_left.lerp(self.top_right, screen_uv.x);
        let bottom = self.bottom_left.lerp(self.bottom_right, screen_uv.x);

        top.lerp(bottom, screen_uv.y).normalize()
    }
}
