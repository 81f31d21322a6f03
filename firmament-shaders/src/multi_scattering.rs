//! Approximates light scattered two and more times.
//!
//! For each texel we gather, from a fixed set of directions, light scattered
//! (once) towards the texel's point, as if every point of the atmosphere
//! scattered light isotropically; the same pass measures which fraction of
//! light gets scattered back towards that point (`f_ms`). Assuming each
//! higher order behaves the same way, all orders sum up into a geometric
//! series, yielding `psi_ms = L_2 / (1 - f_ms)`.

use core::f32::consts::PI;

use firmament_gpu::prelude::*;

use crate::utils::*;

const ISOTROPIC_PHASE: f32 = 1.0 / (4.0 * PI);

pub fn main(
    global_id: UVec2,
    size: UVec2,
    atmosphere: &AtmosphereProperties,
    params: &MultiScatteringPassParams,
    transmittance: TransmittanceLutView,
    directions: &[Vec3],
) -> Vec4 {
    let unit = vec2(
        texel_to_unit(global_id.x, size.x),
        texel_to_unit(global_id.y, size.y),
    );

    let (r, mu_sun) = multi_scattering_lut_unit_to_params(atmosphere, unit);
    let pos = vec3(0.0, r, 0.0);
    let to_sun = vec3((1.0 - mu_sun * mu_sun).safe_sqrt(), mu_sun, 0.0);

    let mut lum = Vec3::ZERO;
    let mut f_ms = Vec3::ZERO;

    for &dir in directions {
        let (dir_lum, dir_f_ms) = eval(
            atmosphere,
            transmittance,
            params,
            Ray::new(pos, dir),
            to_sun,
        );

        lum += dir_lum;
        f_ms += dir_f_ms;
    }

    let count = directions.len().max(1) as f32;
    let lum = lum / count;
    let f_ms = f_ms / count;

    (lum / (Vec3::ONE - f_ms)).extend(1.0)
}

/// Marches along given ray, returning radiance scattered (once, isotropically)
/// towards ray's origin together with the fraction of energy that'd get
/// scattered back towards it.
pub fn eval(
    atmosphere: &AtmosphereProperties,
    transmittance: TransmittanceLutView,
    params: &MultiScatteringPassParams,
    ray: Ray,
    to_sun: Vec3,
) -> (Vec3, Vec3) {
    let ground_distance = ray.distance_to_ground(atmosphere.planet_radius);

    let t_max = ground_distance
        .unwrap_or_else(|| ray.distance_to_top(atmosphere.atmosphere_radius));

    let steps = params.steps.max(1);
    let dt = t_max / steps as f32;
    let mut lum = Integrator::default();
    let mut f_ms = Integrator::default();

    for i in 0..steps {
        let pos = ray.at((i as f32 + SAMPLE_OFFSET) * dt);
        let r = pos.length();
        let mu_sun = pos.dot(to_sun) / r;
        let medium = atmosphere.eval_medium(r - atmosphere.planet_radius);
        let scattering = medium.scattering();

        let sun_transmittance =
            transmittance.sample_sun(atmosphere, r, mu_sun);

        lum.step(
            &medium,
            scattering * sun_transmittance * ISOTROPIC_PHASE,
            dt,
        );

        f_ms.step(&medium, scattering, dt);
    }

    // Light bouncing off the ground
    if ground_distance.is_some() {
        let pos = ray.at(t_max);
        let r = pos.length();
        let mu_sun = pos.dot(to_sun) / r;

        let sun_transmittance =
            transmittance.sample_sun(atmosphere, r, mu_sun);

        lum.luminance += sun_transmittance
            * lum.transmittance
            * mu_sun.saturate()
            * params.ground_albedo
            / PI;
    }

    (lum.luminance, f_ms.luminance)
}
