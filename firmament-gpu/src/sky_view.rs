use core::f32::consts::PI;

use glam::{vec2, vec3, Vec2, Vec3, Vec4Swizzles};

use crate::{AtmosphereProperties, F32Ext, Lut2dView};

/// Returns the zenith angle of the geometric horizon, as seen from radius `r`
/// (`π/2` at the ground, more when looking from above), together with the
/// angle between the horizon and the nadir.
pub fn sky_view_horizon(
    atmosphere: &AtmosphereProperties,
    r: f32,
) -> (f32, f32) {
    let v_horizon = (r.sqr() - atmosphere.planet_radius.sqr()).safe_sqrt();
    let beta = (v_horizon / r).clamp(-1.0, 1.0).acos();

    (PI - beta, beta)
}

/// Maps a view direction (given as its zenith angle and azimuth, both in
/// radians) into sky-view lookup table's coordinates, as seen from radius
/// `r`.
///
/// The zenith angle is remapped so that half of the table covers the sky
/// above the horizon and the other half covers what's below it, both halves
/// getting denser towards the horizon itself.
pub fn sky_view_lut_params_to_unit(
    atmosphere: &AtmosphereProperties,
    r: f32,
    zenith: f32,
    azimuth: f32,
) -> Vec2 {
    let (zenith_horizon, beta) = sky_view_horizon(atmosphere, r);

    let v = if zenith < zenith_horizon {
        0.5 * (1.0 - (1.0 - zenith / zenith_horizon).safe_sqrt())
    } else {
        0.5 + 0.5 * ((zenith - zenith_horizon) / beta).safe_sqrt()
    };

    let u = azimuth.rem_euclid(2.0 * PI) / (2.0 * PI);

    vec2(u.saturate(), v.saturate())
}

/// Inverse of [`sky_view_lut_params_to_unit()`]; returns `(zenith, azimuth)`.
pub fn sky_view_lut_unit_to_params(
    atmosphere: &AtmosphereProperties,
    r: f32,
    unit: Vec2,
) -> (f32, f32) {
    let (zenith_horizon, beta) = sky_view_horizon(atmosphere, r);

    let zenith = if unit.y < 0.5 {
        zenith_horizon * (1.0 - (1.0 - 2.0 * unit.y).sqr())
    } else {
        zenith_horizon + beta * (2.0 * unit.y - 1.0).sqr()
    };

    (zenith, unit.x * 2.0 * PI)
}

/// Converts zenith angle and azimuth into a direction in a frame where `+Y`
/// points up.
pub fn direction_from_angles(zenith: f32, azimuth: f32) -> Vec3 {
    let sin_zenith = zenith.sin();

    vec3(
        sin_zenith * azimuth.cos(),
        zenith.cos(),
        sin_zenith * azimuth.sin(),
    )
}

/// Inverse of [`direction_from_angles()`]; returns `(zenith, azimuth)`.
pub fn angles_from_direction(dir: Vec3) -> (f32, f32) {
    let zenith = dir.y.clamp(-1.0, 1.0).acos();
    let azimuth = dir.z.atan2(dir.x).rem_euclid(2.0 * PI);

    (zenith, azimuth)
}

#[derive(Clone, Copy, Debug)]
pub struct SkyViewLutView<'a> {
    lut: Lut2dView<'a>,
}

impl<'a> SkyViewLutView<'a> {
    pub fn new(lut: Lut2dView<'a>) -> Self {
        Self { lut }
    }

    pub fn lut(&self) -> Lut2dView<'a> {
        self.lut
    }

    /// Returns sky radiance seen when looking at given (`+Y` up)
    /// direction by an observer at given height above the ground.
    pub fn sample_direction(
        &self,
        atmosphere: &AtmosphereProperties,
        view_dir: Vec3,
        eye_height: f32,
    ) -> Vec3 {
        let r = atmosphere.clamp_radius(atmosphere.planet_radius + eye_height);
        let (zenith, azimuth) = angles_from_direction(view_dir.normalize());

        self.lut
            .sample(sky_view_lut_params_to_unit(atmosphere, r, zenith, azimuth))
            .xyz()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn horizon_at_ground() {
        let atmosphere = AtmosphereProperties::EARTH.to_std_unit();

        let (zenith_horizon, beta) =
            sky_view_horizon(&atmosphere, atmosphere.planet_radius);

        assert_relative_eq!(zenith_horizon, 0.5 * PI, epsilon = 1e-3);
        assert_relative_eq!(beta, 0.5 * PI, epsilon = 1e-3);
    }

    #[test]
    fn params_round_trip() {
        let atmosphere = AtmosphereProperties::EARTH.to_std_unit();
        let r = atmosphere.planet_radius + 1500.0;

        for unit in [
            vec2(0.0, 0.0),
            vec2(0.1, 0.25),
            vec2(0.5, 0.49),
            vec2(0.7, 0.51),
            vec2(0.9, 0.8),
        ] {
            let (zenith, azimuth) =
                sky_view_lut_unit_to_params(&atmosphere, r, unit);

            let actual =
                sky_view_lut_params_to_unit(&atmosphere, r, zenith, azimuth);

            assert_relative_eq!(actual.x, unit.x, epsilon = 1e-4);
            assert_relative_eq!(actual.y, unit.y, epsilon = 1e-3);
        }
    }

    #[test]
    fn horizon_lands_in_the_middle() {
        let atmosphere = AtmosphereProperties::EARTH.to_std_unit();
        let r = atmosphere.planet_radius + 1500.0;
        let (zenith_horizon, _) = sky_view_horizon(&atmosphere, r);

        let unit =
            sky_view_lut_params_to_unit(&atmosphere, r, zenith_horizon, 0.0);

        assert_relative_eq!(unit.y, 0.5, epsilon = 1e-4);
    }

    #[test]
    fn angles_round_trip() {
        let dir = direction_from_angles(1.2, 4.0);
        let (zenith, azimuth) = angles_from_direction(dir);

        assert_relative_eq!(zenith, 1.2, epsilon = 1e-5);
        assert_relative_eq!(azimuth, 4.0, epsilon = 1e-5);
    }
}
