use firmament_gpu::prelude::*;

pub fn main(
    global_id: UVec2,
    size: UVec2,
    atmosphere: &AtmosphereProperties,
    params: &TransmittancePassParams,
) -> Vec4 {
    let unit = vec2(
        texel_to_unit(global_id.x, size.x),
        texel_to_unit(global_id.y, size.y),
    );

    let (r, mu) = transmittance_lut_unit_to_params(atmosphere, unit);

    eval(atmosphere, r, mu, params.steps).extend(1.0)
}

/// Integrates extinction along the ray going from radius `r` towards the top
/// of the atmosphere and returns the resulting transmittance.
pub fn eval(
    atmosphere: &AtmosphereProperties,
    r: f32,
    mu: f32,
    steps: u32,
) -> Vec3 {
    let steps = steps.max(1);
    let t_max = distance_to_top(r, mu, atmosphere.atmosphere_radius);
    let dt = t_max / steps as f32;
    let mut optical_depth = Vec3::ZERO;

    for i in 0..steps {
        let t = (i as f32 + 0.5) * dt;
        let h = radius_at(r, mu, t) - atmosphere.planet_radius;

        optical_depth += atmosphere.sigma_t(h) * dt;
    }

    (-optical_depth).exp()
}
