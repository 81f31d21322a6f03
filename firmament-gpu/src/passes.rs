use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::{FrustumDirections, SliceDistribution};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct TransmittancePassParams {
    /// Number of ray-marching steps per texel.
    pub steps: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct MultiScatteringPassParams {
    pub ground_albedo: Vec3,

    /// Number of ray-marching steps per each sampled direction.
    pub steps: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct SkyViewPassParams {
    /// Observer's height above the ground, in meters.
    pub eye_height: f32,

    /// Direction sunlight travels in (i.e. pointing away from the sun).
    pub sun_direction: Vec3,
    pub sun_radiance: Vec3,

    /// Number of ray-marching steps for rays far from the horizon.
    pub low_res_steps: u32,

    /// Number of ray-marching steps for rays close to the horizon.
    pub high_res_steps: u32,

    /// Angular distance from the horizon (in radians) below which rays are
    /// considered close to it.
    pub high_res_band: f32,

    pub multi_scattering_enabled: u32,
}

impl SkyViewPassParams {
    pub fn is_multi_scattering_enabled(&self) -> bool {
        self.multi_scattering_enabled != 0
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct AerialPerspectivePassParams {
    pub frustum: FrustumDirections,

    /// Camera's position, in world units.
    pub camera_position: Vec3,

    /// How many atmosphere meters make up a single world unit.
    pub world_scale: f32,

    /// Direction sunlight travels in (i.e. pointing away from the sun).
    pub sun_direction: Vec3,
    pub sun_radiance: Vec3,

    /// Distance covered by the volume's last slice, in meters.
    pub max_distance: f32,

    pub steps_per_slice: u32,
    pub distribution: u32,
    pub multi_scattering_enabled: u32,
    pub shadow_enabled: u32,
}

impl AerialPerspectivePassParams {
    pub fn distribution(&self) -> SliceDistribution {
        SliceDistribution::from_u32(self.distribution)
    }

    pub fn is_multi_scattering_enabled(&self) -> bool {
        self.multi_scattering_enabled != 0
    }

    pub fn is_shadow_enabled(&self) -> bool {
        self.shadow_enabled != 0
    }

    /// Observer's height above the ground, in meters.
    pub fn eye_height(&self) -> f32 {
        self.camera_position.y * self.world_scale
    }
}
