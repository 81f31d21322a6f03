use core::f32::consts::PI;

use glam::{vec2, vec3, Vec2, Vec3, Vec4Swizzles};

use crate::{AtmosphereProperties, F32Ext, Lut2dView};

/// Maps a point (at radius `r`, lit by sun whose zenith cosine is `mu_sun`)
/// into multiple-scattering lookup table's coordinates.
pub fn multi_scattering_lut_params_to_unit(
    atmosphere: &AtmosphereProperties,
    r: f32,
    mu_sun: f32,
) -> Vec2 {
    vec2(
        (0.5 + 0.5 * mu_sun).saturate(),
        ((r - atmosphere.planet_radius) / atmosphere.thickness()).saturate(),
    )
}

/// Inverse of [`multi_scattering_lut_params_to_unit()`]; returns `(r,
/// mu_sun)`.
pub fn multi_scattering_lut_unit_to_params(
    atmosphere: &AtmosphereProperties,
    unit: Vec2,
) -> (f32, f32) {
    let r = atmosphere.planet_radius + unit.y * atmosphere.thickness();
    let mu_sun = (2.0 * unit.x - 1.0).clamp(-1.0, 1.0);

    (atmosphere.clamp_radius(r), mu_sun)
}

/// Maps a point from the unit square onto the unit sphere, preserving area
/// (so that uniformly distributed points stay uniformly distributed).
pub fn spherical_direction(uv: Vec2) -> Vec3 {
    let cos_theta = 1.0 - 2.0 * uv.x;
    let sin_theta = (1.0 - cos_theta.sqr()).safe_sqrt();
    let phi = 2.0 * PI * uv.y;

    vec3(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin())
}

#[derive(Clone, Copy, Debug)]
pub struct MultiScatteringLutView<'a> {
    lut: Lut2dView<'a>,
}

impl<'a> MultiScatteringLutView<'a> {
    pub fn new(lut: Lut2dView<'a>) -> Self {
        Self { lut }
    }

    pub fn lut(&self) -> Lut2dView<'a> {
        self.lut
    }

    /// Returns radiance of second and higher scattering orders arriving at
    /// given point, per unit of sun's illuminance.
    pub fn sample(
        &self,
        atmosphere: &AtmosphereProperties,
        r: f32,
        mu_sun: f32,
    ) -> Vec3 {
        self.lut
            .sample(multi_scattering_lut_params_to_unit(atmosphere, r, mu_sun))
            .xyz()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn params_round_trip() {
        let atmosphere = AtmosphereProperties::EARTH.to_std_unit();
        let unit = vec2(0.25, 0.75);

        let (r, mu_sun) =
            multi_scattering_lut_unit_to_params(&atmosphere, unit);

        assert_relative_eq!(mu_sun, -0.5);
        assert_relative_eq!(r, 6_435_000.0, max_relative = 1e-6);

        let actual =
            multi_scattering_lut_params_to_unit(&atmosphere, r, mu_sun);

        assert_relative_eq!(actual.x, unit.x, epsilon = 1e-5);
        assert_relative_eq!(actual.y, unit.y, epsilon = 1e-4);
    }

    #[test]
    fn directions_are_normalized() {
        for uv in [vec2(0.0, 0.0), vec2(0.5, 0.25), vec2(0.9, 0.6)] {
            assert_relative_eq!(
                spherical_direction(uv).length(),
                1.0,
                epsilon = 1e-5
            );
        }

        assert_eq!(spherical_direction(vec2(0.0, 0.3)).y, 1.0);
        assert_eq!(spherical_direction(vec2(1.0, 0.3)).y, -1.0);
    }
}
