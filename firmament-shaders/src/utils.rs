use firmament_gpu::prelude::*;

/// Where, within each ray-marching segment, the medium gets sampled.
pub const SAMPLE_OFFSET: f32 = 0.3;

/// Evaluates light scattered towards the observer by points along a single
/// view ray.
pub struct InScattering<'a> {
    atmosphere: &'a AtmosphereProperties,
    transmittance: TransmittanceLutView<'a>,
    multi_scattering: Option<MultiScatteringLutView<'a>>,
    to_sun: Vec3,
    rayleigh_phase: f32,
    mie_phase: f32,
}

impl<'a> InScattering<'a> {
    pub fn new(
        atmosphere: &'a AtmosphereProperties,
        transmittance: TransmittanceLutView<'a>,
        multi_scattering: Option<MultiScatteringLutView<'a>>,
        ray_dir: Vec3,
        to_sun: Vec3,
    ) -> Self {
        let cos_theta = ray_dir.dot(to_sun);

        Self {
            atmosphere,
            transmittance,
            multi_scattering,
            to_sun,
            rayleigh_phase: eval_rayleigh_phase(cos_theta),
            mie_phase: eval_mie_phase(atmosphere.asymmetry_mie, cos_theta),
        }
    }

    /// Returns medium at given point (relative to the planet's center)
    /// together with radiance it scatters towards the observer, per unit of
    /// sun's illuminance.
    ///
    /// `sun_visibility` scales the single-scattering term only, since that's
    /// the only one a shadow can meaningfully block.
    pub fn eval(&self, pos: Vec3, sun_visibility: f32) -> (Medium, Vec3) {
        let r = pos.length();
        let mu_sun = pos.dot(self.to_sun) / r;
        let h = r - self.atmosphere.planet_radius;
        let medium = self.atmosphere.eval_medium(h);

        let sun_transmittance =
            self.transmittance.sample_sun(self.atmosphere, r, mu_sun);

        let phase = medium.phase(self.rayleigh_phase, self.mie_phase);
        let single = sun_transmittance * phase * sun_visibility;

        let multi = self
            .multi_scattering
            .map(|lut| lut.sample(self.atmosphere, r, mu_sun))
            .unwrap_or_default();

        (medium, medium.scattering() * (single + multi))
    }
}

/// Accumulates radiance and transmittance along a ray-marched path.
#[derive(Clone, Copy, Debug)]
pub struct Integrator {
    pub luminance: Vec3,
    pub transmittance: Vec3,
}

impl Integrator {
    pub fn step(&mut self, medium: &Medium, in_scattering: Vec3, dt: f32) {
        let segment_transmittance = (-medium.extinction * dt).exp();

        self.luminance += integrate_segment(
            in_scattering,
            medium.extinction,
            segment_transmittance,
            dt,
        ) * self.transmittance;

        self.transmittance *= segment_transmittance;
    }
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            luminance: Vec3::ZERO,
            transmittance: Vec3::ONE,
        }
    }
}
