use firmament_gpu::prelude::*;

use crate::utils::*;

pub fn main(
    global_id: UVec2,
    size: UVec2,
    atmosphere: &AtmosphereProperties,
    params: &SkyViewPassParams,
    transmittance: TransmittanceLutView,
    multi_scattering: MultiScatteringLutView,
) -> Vec4 {
    let unit = vec2(
        texel_to_unit(global_id.x, size.x),
        texel_to_unit(global_id.y, size.y),
    );

    let r =
        atmosphere.clamp_radius(atmosphere.planet_radius + params.eye_height);
    let (zenith, azimuth) = sky_view_lut_unit_to_params(atmosphere, r, unit);
    let (zenith_horizon, _) = sky_view_horizon(atmosphere, r);

    let steps = if (zenith - zenith_horizon).abs() <= params.high_res_band {
        params.high_res_steps
    } else {
        params.low_res_steps
    };

    let multi_scattering = params
        .is_multi_scattering_enabled()
        .then_some(multi_scattering);

    let lum = eval(
        atmosphere,
        transmittance,
        multi_scattering,
        Ray::new(vec3(0.0, r, 0.0), direction_from_angles(zenith, azimuth)),
        -params.sun_direction,
        steps,
    );

    (lum * params.sun_radiance).extend(1.0)
}

/// Returns radiance (per unit of sun's illuminance) arriving at ray's origin
/// from its direction.
///
/// Rays hitting the ground stop there, so the planet occludes the sky behind
/// it.
pub fn eval(
    atmosphere: &AtmosphereProperties,
    transmittance: TransmittanceLutView,
    multi_scattering: Option<MultiScatteringLutView>,
    ray: Ray,
    to_sun: Vec3,
    steps: u32,
) -> Vec3 {
    let t_max = ray
        .distance_to_ground(atmosphere.planet_radius)
        .unwrap_or_else(|| ray.distance_to_top(atmosphere.atmosphere_radius));

    if t_max <= 0.0 {
        return Vec3::ZERO;
    }

    let in_scattering = InScattering::new(
        atmosphere,
        transmittance,
        multi_scattering,
        ray.direction(),
        to_sun,
    );

    let steps = steps.max(1);
    let dt = t_max / steps as f32;
    let mut integrator = Integrator::default();

    for i in 0..steps {
        let pos = ray.at((i as f32 + SAMPLE_OFFSET) * dt);
        let (medium, light) = in_scattering.eval(pos, 1.0);

        integrator.step(&medium, light, dt);
    }

    integrator.luminance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transmittance;

    fn luts(atmosphere: &AtmosphereProperties) -> (Vec<Vec4>, Vec<Vec4>) {
        let size = uvec2(16, 16);
        let params = TransmittancePassParams { steps: 40 };

        let transmittance = (0..size.y)
            .flat_map(|y| (0..size.x).map(move |x| uvec2(x, y)))
            .map(|id| transmittance::main(id, size, atmosphere, &params))
            .collect();

        // Multiple scattering's magnitude doesn't matter here, only that it's
        // non-zero
        let multi_scattering = vec![Vec4::splat(0.01); 16 * 16];

        (transmittance, multi_scattering)
    }

    fn params(sun_altitude: f32) -> SkyViewPassParams {
        SkyViewPassParams {
            eye_height: 200.0,
            sun_direction: -vec3(sun_altitude.cos(), sun_altitude.sin(), 0.0),
            sun_radiance: Vec3::splat(10.0),
            low_res_steps: 16,
            high_res_steps: 32,
            high_res_band: 0.1,
            multi_scattering_enabled: 1,
        }
    }

    fn render(
        atmosphere: &AtmosphereProperties,
        params: &SkyViewPassParams,
    ) -> Vec<Vec4> {
        let (t_lut, ms_lut) = luts(atmosphere);
        let size = uvec2(16, 16);
        let transmittance =
            TransmittanceLutView::new(Lut2dView::new(&t_lut, size));

        let multi_scattering =
            MultiScatteringLutView::new(Lut2dView::new(&ms_lut, size));

        (0..size.y)
            .flat_map(|y| (0..size.x).map(move |x| uvec2(x, y)))
            .map(|id| {
                main(
                    id,
                    size,
                    atmosphere,
                    params,
                    transmittance,
                    multi_scattering,
                )
            })
            .collect()
    }

    #[test]
    fn daylight_sky_is_blue() {
        let atmosphere = AtmosphereProperties::EARTH.to_std_unit();
        let sky = render(&atmosphere, &params(1.0));

        // Row 4 is well above the horizon
        let texel = sky[4 * 16 + 8];

        assert!(texel.z > texel.x);
        assert!(texel.x > 0.0);
    }

    #[test]
    fn no_scattering() {
        let atmosphere = AtmosphereProperties {
            scatter_rayleigh: Vec3::ZERO,
            scatter_mie: 0.0,
            ..AtmosphereProperties::EARTH
        }
        .to_std_unit();

        for texel in render(&atmosphere, &params(0.3)) {
            assert_eq!(texel.truncate(), Vec3::ZERO);
        }
    }

    #[test]
    fn ground_occludes_sky() {
        let atmosphere = AtmosphereProperties::EARTH.to_std_unit();
        let (t_lut, _) = luts(&atmosphere);
        let size = uvec2(16, 16);
        let transmittance =
            TransmittanceLutView::new(Lut2dView::new(&t_lut, size));
        let pos = vec3(0.0, atmosphere.planet_radius + 200.0, 0.0);

        let down = eval(
            &atmosphere,
            transmittance,
            None,
            Ray::new(pos, -Vec3::Y),
            Vec3::Y,
            32,
        );

        let up = eval(
            &atmosphere,
            transmittance,
            None,
            Ray::new(pos, Vec3::Y),
            Vec3::Y,
            32,
        );

        // Looking down we only see the 200 meters of air between us and the
        // ground, which is way dimmer than the whole atmosphere above us
        assert!(down.z < 0.1 * up.z);
    }
}
