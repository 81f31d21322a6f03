use glam::{vec2, Mat4, UVec2, Vec3};

/// Read-only view into sun's shadow map.
#[derive(Clone, Copy, Debug)]
pub struct ShadowMapView<'a> {
    depth: &'a [f32],
    size: UVec2,
    view_proj: Mat4,
}

impl<'a> ShadowMapView<'a> {
    /// Tolerance for depth comparisons, in normalized depth units.
    pub const BIAS: f32 = 0.002;

    pub fn new(depth: &'a [f32], size: UVec2, view_proj: Mat4) -> Self {
        debug_assert_eq!(depth.len(), (size.x * size.y) as usize);

        Self {
            depth,
            size,
            view_proj,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Returns whether given world-space point is reached by sunlight.
    ///
    /// Points outside of the shadow map's frustum are considered lit, and so
    /// is everything when the map has no texels.
    pub fn is_lit(&self, pos: Vec3) -> bool {
        if self.size.cmpeq(UVec2::ZERO).any() || self.depth.is_empty() {
            return true;
        }

        let ndc = self.view_proj.project_point3(pos);

        if !ndc.is_finite()
            || ndc.x.abs() > 1.0
            || ndc.y.abs() > 1.0
            || ndc.z < 0.0
            || ndc.z > 1.0
        {
            return true;
        }

        let uv = ndc.truncate() * vec2(0.5, -0.5) + 0.5;
        let texel = (uv * self.size.as_vec2()).as_uvec2().min(self.size - 1);

        let depth = self.depth[(texel.y * self.size.x + texel.x) as usize];

        ndc.z <= depth + Self::BIAS
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn is_lit() {
        // Light looking down the -Z axis, covering `<-1, 1>` on X and Y
        let view_proj = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);

        // Left half of the map has an occluder at `z = -2`, right half is
        // empty
        let depth = [0.2, 1.0, 0.2, 1.0];
        let target = ShadowMapView::new(&depth, UVec2::splat(2), view_proj);

        assert!(target.is_lit(vec3(-0.5, 0.5, -1.0)));
        assert!(!target.is_lit(vec3(-0.5, 0.5, -5.0)));
        assert!(target.is_lit(vec3(0.5, 0.5, -5.0)));
        assert!(target.is_lit(vec3(5.0, 0.5, -5.0)));
    }

    #[test]
    fn is_lit_without_texels() {
        let view_proj = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0);

        for size in [UVec2::ZERO, UVec2::new(0, 2), UVec2::new(2, 0)] {
            let target = ShadowMapView::new(&[], size, view_proj);

            assert!(target.is_lit(vec3(0.0, 0.0, -5.0)));
        }
    }
}
