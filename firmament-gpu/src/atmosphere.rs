use core::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{vec3, Vec3};
use serde::{Deserialize, Serialize};

/// Factor converting lengths from editor units (kilometers) into standard
/// units (meters).
pub const LENGTH_TO_STD_UNIT: f32 = 1e3;

/// Factor converting coefficients from editor units (inverse megameters) into
/// standard units (inverse meters).
pub const COEFFICIENT_TO_STD_UNIT: f32 = 1e-6;

/// Physical description of a planet's atmosphere.
///
/// The same struct is used for two unit systems:
///
/// - editor units, in which lengths are expressed in kilometers and
///   coefficients in inverse megameters (that's what's convenient to type in
///   and what [`Self::EARTH`] uses),
///
/// - standard units, in which lengths are expressed in meters and
///   coefficients in inverse meters (that's what all lookup tables are
///   computed with).
///
/// Use [`Self::to_std_unit()`] and [`Self::to_editor_unit()`] to move between
/// them.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereProperties {
    /// Rayleigh scattering coefficient at the ground, per color channel.
    pub scatter_rayleigh: Vec3,

    /// Height at which Rayleigh density falls to `1 / e`.
    pub rayleigh_height: f32,

    /// Mie scattering coefficient at the ground.
    pub scatter_mie: f32,

    /// Mie asymmetry parameter (`g`).
    pub asymmetry_mie: f32,

    /// Mie absorption coefficient at the ground.
    pub absorb_mie: f32,

    /// Height at which Mie density falls to `1 / e`.
    pub mie_height: f32,

    /// Ozone absorption coefficient at the peak of the ozone layer.
    pub absorb_ozone: Vec3,

    /// Height of the ozone layer's peak.
    pub ozone_center_height: f32,

    /// Half-width of the ozone layer's tent profile.
    pub ozone_thickness: f32,

    pub planet_radius: f32,
    pub atmosphere_radius: f32,
}

impl AtmosphereProperties {
    /// Earth-like atmosphere, in editor units.
    pub const EARTH: Self = Self {
        scatter_rayleigh: vec3(5.802, 13.558, 33.1),
        rayleigh_height: 8.0,
        scatter_mie: 3.996,
        asymmetry_mie: 0.8,
        absorb_mie: 4.4,
        mie_height: 1.2,
        absorb_ozone: vec3(0.650, 1.881, 0.085),
        ozone_center_height: 25.0,
        ozone_thickness: 30.0,
        planet_radius: 6360.0,
        atmosphere_radius: 6460.0,
    };

    /// Converts these properties from editor units into standard units.
    pub fn to_std_unit(&self) -> Self {
        self.scaled(LENGTH_TO_STD_UNIT, COEFFICIENT_TO_STD_UNIT)
    }

    /// Converts these properties from standard units into editor units.
    pub fn to_editor_unit(&self) -> Self {
        self.scaled(1.0 / LENGTH_TO_STD_UNIT, 1.0 / COEFFICIENT_TO_STD_UNIT)
    }

    fn scaled(&self, length: f32, coefficient: f32) -> Self {
        Self {
            scatter_rayleigh: self.scatter_rayleigh * coefficient,
            rayleigh_height: self.rayleigh_height * length,
            scatter_mie: self.scatter_mie * coefficient,
            asymmetry_mie: self.asymmetry_mie,
            absorb_mie: self.absorb_mie * coefficient,
            mie_height: self.mie_height * length,
            absorb_ozone: self.absorb_ozone * coefficient,
            ozone_center_height: self.ozone_center_height * length,
            ozone_thickness: self.ozone_thickness * length,
            planet_radius: self.planet_radius * length,
            atmosphere_radius: self.atmosphere_radius * length,
        }
    }

    /// Distance between the planet's surface and the atmosphere's outer
    /// boundary.
    pub fn thickness(&self) -> f32 {
        self.atmosphere_radius - self.planet_radius
    }

    /// Clamps distance from the planet's center into the range where lookup
    /// tables are defined.
    ///
    /// Points right at the ground make for degenerate horizon rays, so we keep
    /// them slightly above it.
    pub fn clamp_radius(&self, r: f32) -> f32 {
        let min = self.planet_radius + PLANET_RADIUS_OFFSET;

        r.clamp(min, self.atmosphere_radius)
    }

    /// Evaluates the participating medium at given height above the ground.
    pub fn eval_medium(&self, h: f32) -> Medium {
        let rayleigh_density = (-h / self.rayleigh_height).exp();
        let mie_density = (-h / self.mie_height).exp();

        let ozone_density = (1.0
            - 0.5 * (h - self.ozone_center_height).abs() / self.ozone_thickness)
            .max(0.0);

        let rayleigh_scattering = self.scatter_rayleigh * rayleigh_density;
        let mie_scattering = self.scatter_mie * mie_density;

        let extinction = rayleigh_scattering
            + Vec3::splat((self.scatter_mie + self.absorb_mie) * mie_density)
            + self.absorb_ozone * ozone_density;

        Medium {
            rayleigh_scattering,
            mie_scattering,
            extinction,
        }
    }

    /// Returns the scattering coefficient at given height.
    pub fn sigma_s(&self, h: f32) -> Vec3 {
        self.eval_medium(h).scattering()
    }

    /// Returns the extinction coefficient at given height.
    pub fn sigma_t(&self, h: f32) -> Vec3 {
        self.eval_medium(h).extinction
    }

    /// Evaluates the combined phase function at given height, for light
    /// deflected by an angle whose cosine is `cos_theta`.
    pub fn phase(&self, h: f32, cos_theta: f32) -> Vec3 {
        self.eval_medium(h).phase(
            eval_rayleigh_phase(cos_theta),
            eval_mie_phase(self.asymmetry_mie, cos_theta),
        )
    }
}

impl Default for AtmosphereProperties {
    fn default() -> Self {
        Self::EARTH
    }
}

/// Minimum height (in meters) of points used to evaluate lookup tables.
pub const PLANET_RADIUS_OFFSET: f32 = 10.0;

/// Participating medium at a single point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Medium {
    pub rayleigh_scattering: Vec3,
    pub mie_scattering: f32,
    pub extinction: Vec3,
}

impl Medium {
    pub fn scattering(&self) -> Vec3 {
        self.rayleigh_scattering + Vec3::splat(self.mie_scattering)
    }

    /// Blends given phase function values, weighting them by how much each
    /// component scatters; channels that don't scatter at all yield zero.
    pub fn phase(&self, rayleigh_phase: f32, mie_phase: f32) -> Vec3 {
        let scattering = self.scattering();

        let weighted = self.rayleigh_scattering * rayleigh_phase
            + Vec3::splat(self.mie_scattering * mie_phase);

        Vec3::select(
            scattering.cmpgt(Vec3::ZERO),
            weighted / scattering,
            Vec3::ZERO,
        )
    }
}

pub fn eval_rayleigh_phase(cos_theta: f32) -> f32 {
    const K: f32 = 3.0 / (16.0 * PI);

    K * (1.0 + cos_theta * cos_theta)
}

/// Cornette-Shanks flavor of the Henyey-Greenstein phase function.
pub fn eval_mie_phase(g: f32, cos_theta: f32) -> f32 {
    const SCALE: f32 = 3.0 / (8.0 * PI);

    let g2 = g * g;
    let m = 1.0 + g2 - 2.0 * g * cos_theta;
    let num = (1.0 - g2) * (1.0 + cos_theta * cos_theta);
    let denom = (2.0 + g2) * m * m.sqrt();

    SCALE * num / denom
}
