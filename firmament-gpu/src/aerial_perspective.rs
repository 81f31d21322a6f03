use glam::{vec3, Vec2, Vec3, Vec4, Vec4Swizzles};
use serde::{Deserialize, Serialize};

use crate::Lut3dView;

/// How depth slices of the aerial-perspective volume are spread between the
/// camera and the maximum distance.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceDistribution {
    /// Slices are spread evenly.
    #[default]
    Linear = 0,

    /// Slices get thicker the farther they are from the camera.
    Exponential = 1,
}

impl SliceDistribution {
    /// Steepness of the exponential distribution.
    const EXPONENTIAL_BIAS: f32 = 4.0;

    pub fn from_u32(val: u32) -> Self {
        if val == Self::Exponential as u32 {
            Self::Exponential
        } else {
            Self::Linear
        }
    }

    /// Maps slice coordinate (`0.0` = camera, `1.0` = the last slice's far
    /// boundary) into distance relative to the maximum distance.
    pub fn slice_to_depth(self, slice: f32) -> f32 {
        match self {
            Self::Linear => slice,

            Self::Exponential => {
                let k = Self::EXPONENTIAL_BIAS;

                ((k * slice).exp() - 1.0) / (k.exp() - 1.0)
            }
        }
    }

    /// Inverse of [`Self::slice_to_depth()`].
    pub fn depth_to_slice(self, depth: f32) -> f32 {
        match self {
            Self::Linear => depth,

            Self::Exponential => {
                let k = Self::EXPONENTIAL_BIAS;

                (1.0 + depth.max(0.0) * (k.exp() - 1.0)).ln() / k
            }
        }
    }
}

/// Read-only view into the aerial-perspective volume.
///
/// Each texel keeps radiance in-scattered between the camera and its slice's
/// far boundary (`xyz`) together with average transmittance over the same
/// path (`w`).
#[derive(Clone, Copy, Debug)]
pub struct AerialPerspectiveLutView<'a> {
    lut: Lut3dView<'a>,
    max_distance: f32,
    distribution: SliceDistribution,
}

impl<'a> AerialPerspectiveLutView<'a> {
    pub fn new(
        lut: Lut3dView<'a>,
        max_distance: f32,
        distribution: SliceDistribution,
    ) -> Self {
        Self {
            lut,
            max_distance,
            distribution,
        }
    }

    pub fn lut(&self) -> Lut3dView<'a> {
        self.lut
    }

    /// Returns in-scattered radiance and transmittance between the camera and
    /// a surface visible at given screen coordinates (`<0.0, 1.0>`, `y` going
    /// down), lying `distance` meters away from it.
    pub fn sample(&self, screen_uv: Vec2, distance: f32) -> Vec4 {
        self.sample_jittered(screen_uv, distance, 0.0)
    }

    /// Same as [`Self::sample()`], but offsets the looked-up slice by `jitter`
    /// slices; used to dither banding between slices.
    pub fn sample_jittered(
        &self,
        screen_uv: Vec2,
        distance: f32,
        jitter: f32,
    ) -> Vec4 {
        let size = self.lut.size();
        let xy = screen_uv * size.truncate().as_vec2() - 0.5;

        // Slice `n` describes the path up to `(n + 1) / len`, so the camera
        // itself sits at slice `-1`
        let slice = self.distribution.depth_to_slice(
            (distance / self.max_distance).max(0.0),
        ) * size.z as f32
            - 1.0
            + jitter;

        if slice >= 0.0 {
            self.lut.sample_texel(vec3(xy.x, xy.y, slice))
        } else {
            let first = self.lut.sample_texel(vec3(xy.x, xy.y, 0.0));
            let weight = (slice + 1.0).max(0.0);

            Vec4::new(0.0, 0.0, 0.0, 1.0).lerp(first, weight)
        }
    }

    /// Composes surface's color with a sample returned from
    /// [`Self::sample()`].
    pub fn apply(color: Vec3, sample: Vec4) -> Vec3 {
        color * sample.w + sample.xyz()
    }
}
