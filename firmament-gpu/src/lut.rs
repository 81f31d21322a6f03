use glam::{uvec2, uvec3, UVec2, UVec3, Vec2, Vec3, Vec4};

use crate::lerp;

/// Converts texel's index into a coordinate within `<0.0, 1.0>` such that the
/// first texel lands at `0.0` and the last one lands at `1.0`.
///
/// Lookup tables are generated and sampled through this mapping so that their
/// edges hold exact boundary values (e.g. the zenith or the top of the
/// atmosphere) instead of values half a texel away from them.
pub fn texel_to_unit(idx: u32, len: u32) -> f32 {
    if len <= 1 {
        0.5
    } else {
        idx as f32 / (len - 1) as f32
    }
}

/// Read-only view into a two-dimensional lookup table.
///
/// Texel `(x, y)` is stored at `data[y * size.x + x]`.
#[derive(Clone, Copy, Debug)]
pub struct Lut2dView<'a> {
    data: &'a [Vec4],
    size: UVec2,
}

impl<'a> Lut2dView<'a> {
    pub fn new(data: &'a [Vec4], size: UVec2) -> Self {
        debug_assert_eq!(data.len(), (size.x * size.y) as usize);

        Self { data, size }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn data(&self) -> &'a [Vec4] {
        self.data
    }

    pub fn get(&self, pos: UVec2) -> Vec4 {
        self.data[(pos.y * self.size.x + pos.x) as usize]
    }

    /// Samples this table with bilinear filtering, using coordinates where
    /// `0.0` and `1.0` correspond to centers of the edge texels (see
    /// [`texel_to_unit()`]); out-of-range coordinates are clamped.
    pub fn sample(&self, unit: Vec2) -> Vec4 {
        let unit = unit.clamp(Vec2::ZERO, Vec2::ONE);

        self.sample_texel(unit * (self.size - 1).as_vec2())
    }

    /// Samples this table with bilinear filtering, using coordinates expressed
    /// in texels (so that `(0.0, 0.0)` is the center of the first texel).
    pub fn sample_texel(&self, pos: Vec2) -> Vec4 {
        let max = self.size - 1;
        let pos = pos.clamp(Vec2::ZERO, max.as_vec2());
        let p0 = pos.floor();
        let weight = pos - p0;
        let p0 = p0.as_uvec2().min(max);
        let p1 = (p0 + 1).min(max);

        let s00 = self.get(p0);
        let s10 = self.get(uvec2(p1.x, p0.y));
        let s01 = self.get(uvec2(p0.x, p1.y));
        let s11 = self.get(p1);

        lerp(lerp(s00, s10, weight.x), lerp(s01, s11, weight.x), weight.y)
    }
}

/// Read-only view into a three-dimensional lookup table.
///
/// Texel `(x, y, z)` is stored at `data[(z * size.y + y) * size.x + x]`, i.e.
/// the same way a 3D texture is laid out.
#[derive(Clone, Copy, Debug)]
pub struct Lut3dView<'a> {
    data: &'a [Vec4],
    size: UVec3,
}

impl<'a> Lut3dView<'a> {
    pub fn new(data: &'a [Vec4], size: UVec3) -> Self {
        debug_assert_eq!(data.len(), (size.x * size.y * size.z) as usize);

        Self { data, size }
    }

    pub fn size(&self) -> UVec3 {
        self.size
    }

    pub fn data(&self) -> &'a [Vec4] {
        self.data
    }

    pub fn get(&self, pos: UVec3) -> Vec4 {
        let idx = (pos.z * self.size.y + pos.y) * self.size.x + pos.x;

        self.data[idx as usize]
    }

    /// Samples this table with trilinear filtering, using coordinates
    /// expressed in texels; out-of-range coordinates are clamped.
    pub fn sample_texel(&self, pos: Vec3) -> Vec4 {
        let max = self.size - 1;
        let pos = pos.clamp(Vec3::ZERO, max.as_vec3());
        let p0 = pos.floor();
        let weight = pos - p0;
        let p0 = p0.as_uvec3().min(max);
        let p1 = (p0 + 1).min(max);

        let slice = |z| {
            let s00 = self.get(uvec3(p0.x, p0.y, z));
            let s10 = self.get(uvec3(p1.x, p0.y, z));
            let s01 = self.get(uvec3(p0.x, p1.y, z));
            let s11 = self.get(uvec3(p1.x, p1.y, z));

            lerp(lerp(s00, s10, weight.x), lerp(s01, s11, weight.x), weight.y)
        };

        lerp(slice(p0.z), slice(p1.z), weight.z)
    }
}
