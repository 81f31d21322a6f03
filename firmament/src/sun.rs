use glam::{vec3, Vec3};

use crate::{gpu, SunSettings};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sun {
    direction: Vec3,
    radiance: Vec3,
}

impl Sun {
    /// Angular radius of sun's disk, in radians.
    pub const ANGULAR_RADIUS: f32 = 0.004_65;

    /// Creates sun hanging `angle_deg` degrees above the horizon, on the `+X`
    /// side of the sky.
    pub fn new(angle_deg: f32, intensity: f32) -> Self {
        let angle = -angle_deg.to_radians();

        Self {
            direction: vec3(angle.cos(), angle.sin(), 0.0).normalize(),
            radiance: Vec3::splat(intensity),
        }
    }

    pub fn from_settings(settings: &SunSettings) -> Self {
        Self::new(settings.angle_deg, settings.intensity)
    }

    /// Direction sunlight travels in (i.e. pointing away from the sun).
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Direction pointing towards the sun.
    pub fn to_sun(&self) -> Vec3 {
        -self.direction
    }

    pub fn radiance(&self) -> Vec3 {
        self.radiance
    }

    /// Returns whether given view direction hits sun's disk.
    pub fn is_disk_visible(&self, view_dir: Vec3) -> bool {
        view_dir.normalize().dot(self.to_sun()) >= Self::ANGULAR_RADIUS.cos()
    }

    /// Returns radiance of sun's disk, as seen by an observer standing
    /// `eye_height` meters above the ground.
    ///
    /// This is the light that reaches the observer directly, so it doesn't
    /// depend on the scattering coefficients other than through transmittance.
    pub fn disk_radiance(
        &self,
        atmosphere: &gpu::AtmosphereProperties,
        transmittance: gpu::TransmittanceLutView,
        eye_height: f32,
    ) -> Vec3 {
        let r = atmosphere.clamp_radius(atmosphere.planet_radius + eye_height);

        self.radiance
            * transmittance.sample_sun(atmosphere, r, self.to_sun().y)
    }
}

impl Default for Sun {
    fn default() -> Self {
        Self::from_settings(&Default::default())
    }
}
