use glam::{vec2, Vec2, Vec3, Vec4Swizzles};

use crate::{
    distance_to_top, intersects_ground, AtmosphereProperties, F32Ext,
    Lut2dView,
};

/// Maps a point (at radius `r`, looking at direction whose zenith cosine is
/// `mu`) into transmittance lookup table's coordinates.
///
/// The `y` coordinate follows the distance to the horizon, which concentrates
/// precision near the ground; the `x` coordinate follows the distance to the
/// top of the atmosphere, relative to its minimum and maximum possible value
/// for given height.
pub fn transmittance_lut_params_to_unit(
    atmosphere: &AtmosphereProperties,
    r: f32,
    mu: f32,
) -> Vec2 {
    let bottom = atmosphere.planet_radius;
    let top = atmosphere.atmosphere_radius;

    let h = (top.sqr() - bottom.sqr()).safe_sqrt();
    let rho = (r.sqr() - bottom.sqr()).safe_sqrt();

    let d = distance_to_top(r, mu, top);
    let d_min = top - r;
    let d_max = rho + h;

    let x_mu = if d_max > d_min {
        (d - d_min) / (d_max - d_min)
    } else {
        0.0
    };

    vec2(x_mu.saturate(), (rho / h).saturate())
}

/// Inverse of [`transmittance_lut_params_to_unit()`]; returns `(r, mu)`.
pub fn transmittance_lut_unit_to_params(
    atmosphere: &AtmosphereProperties,
    unit: Vec2,
) -> (f32, f32) {
    let bottom = atmosphere.planet_radius;
    let top = atmosphere.atmosphere_radius;

    let h = (top.sqr() - bottom.sqr()).safe_sqrt();
    let rho = h * unit.y;
    let r = (rho.sqr() + bottom.sqr()).sqrt().min(top);

    let d_min = top - r;
    let d_max = rho + h;
    let d = d_min + unit.x * (d_max - d_min);

    // `top² - r²` is expressed as `d_min * (top + r)`, which doesn't suffer
    // from cancellation near the top of the atmosphere
    let mu = if d == 0.0 {
        1.0
    } else {
        (d_min * (top + r) - d.sqr()) / (2.0 * r * d)
    };

    (r, mu.clamp(-1.0, 1.0))
}

#[derive(Clone, Copy, Debug)]
pub struct TransmittanceLutView<'a> {
    lut: Lut2dView<'a>,
}

impl<'a> TransmittanceLutView<'a> {
    pub fn new(lut: Lut2dView<'a>) -> Self {
        Self { lut }
    }

    pub fn lut(&self) -> Lut2dView<'a> {
        self.lut
    }

    /// Returns transmittance from given point to the top of the atmosphere.
    pub fn sample(
        &self,
        atmosphere: &AtmosphereProperties,
        r: f32,
        mu: f32,
    ) -> Vec3 {
        self.lut
            .sample(transmittance_lut_params_to_unit(atmosphere, r, mu))
            .xyz()
    }

    /// Returns transmittance of sunlight arriving at given point, taking into
    /// account that the planet itself might be in the way.
    pub fn sample_sun(
        &self,
        atmosphere: &AtmosphereProperties,
        r: f32,
        mu_sun: f32,
    ) -> Vec3 {
        if intersects_ground(r, mu_sun, atmosphere.planet_radius) {
            Vec3::ZERO
        } else {
            self.sample(atmosphere, r, mu_sun)
        }
    }
}
