use firmament_gpu::prelude::*;

use crate::utils::*;

/// Fills a single column (i.e. all slices for given screen texel) of the
/// aerial-perspective volume.
///
/// Slices are marched front-to-back, each continuing where the previous one
/// stopped, so that `out[z]` ends up describing the whole path between the
/// camera and slice's far boundary.
#[allow(clippy::too_many_arguments)]
pub fn main(
    column: UVec2,
    size: UVec3,
    atmosphere: &AtmosphereProperties,
    params: &AerialPerspectivePassParams,
    transmittance: TransmittanceLutView,
    multi_scattering: MultiScatteringLutView,
    shadow: Option<ShadowMapView>,
    out: &mut [Vec4],
) {
    debug_assert_eq!(out.len(), size.z as usize);

    let screen_uv = (column.as_vec2() + 0.5) / size.truncate().as_vec2();
    let dir = params.frustum.ray(screen_uv);

    let r = atmosphere
        .clamp_radius(atmosphere.planet_radius + params.eye_height());

    let ray = Ray::new(vec3(0.0, r, 0.0), dir);

    let t_max = ray
        .distance_to_ground(atmosphere.planet_radius)
        .unwrap_or_else(|| ray.distance_to_top(atmosphere.atmosphere_radius));

    let multi_scattering = params
        .is_multi_scattering_enabled()
        .then_some(multi_scattering);

    let shadow = shadow.filter(|_| params.is_shadow_enabled());

    let in_scattering = InScattering::new(
        atmosphere,
        transmittance,
        multi_scattering,
        dir,
        -params.sun_direction,
    );

    let distribution = params.distribution();
    let steps = params.steps_per_slice.max(1);
    let mut integrator = Integrator::default();
    let mut t0 = 0.0;

    for (z, out) in out.iter_mut().enumerate() {
        let slice = (z + 1) as f32 / size.z as f32;

        let t1 = (distribution.slice_to_depth(slice) * params.max_distance)
            .min(t_max);

        if t1 > t0 {
            let dt = (t1 - t0) / steps as f32;

            for i in 0..steps {
                let t = t0 + (i as f32 + SAMPLE_OFFSET) * dt;

                let visibility = match shadow {
                    Some(shadow) => {
                        let pos = params.camera_position
                            + dir * (t / params.world_scale);

                        if shadow.is_lit(pos) {
                            1.0
                        } else {
                            0.0
                        }
                    }

                    None => 1.0,
                };

                let (medium, light) = in_scattering.eval(ray.at(t), visibility);

                integrator.step(&medium, light, dt);
            }

            t0 = t1;
        }

        let transmittance = integrator.transmittance;

        *out = (integrator.luminance * params.sun_radiance).extend(
            (transmittance.x + transmittance.y + transmittance.z) / 3.0,
        );
    }
}
