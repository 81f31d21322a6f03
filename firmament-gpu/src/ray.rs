use glam::Vec3;

use crate::F32Ext;

/// Ray travelling through the atmosphere, in a frame whose origin is the
/// planet's center.
#[derive(Copy, Clone, Debug, Default)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance from the planet's center to ray's origin.
    pub fn radius(&self) -> f32 {
        self.origin.length()
    }

    /// Cosine of the angle between ray's direction and the local zenith.
    pub fn cos_zenith(&self) -> f32 {
        self.direction.dot(self.origin / self.radius())
    }

    /// Returns distance along this ray at which it escapes a concentric sphere
    /// of given radius; assumes the origin lies inside of that sphere.
    pub fn distance_to_top(&self, radius: f32) -> f32 {
        distance_to_top(self.radius(), self.cos_zenith(), radius)
    }

    /// Returns distance along this ray at which it hits the planet, or `None`
    /// if it passes it by.
    pub fn distance_to_ground(&self, planet_radius: f32) -> Option<f32> {
        let r = self.radius();
        let mu = self.cos_zenith();

        intersects_ground(r, mu, planet_radius)
            .then(|| distance_to_ground(r, mu, planet_radius))
    }
}

/// Distance from a point at radius `r`, looking at direction whose zenith
/// cosine is `mu`, to a concentric sphere of given radius surrounding it.
pub fn distance_to_top(r: f32, mu: f32, radius: f32) -> f32 {
    let discriminant = r.sqr() * (mu.sqr() - 1.0) + radius.sqr();

    (-r * mu + discriminant.safe_sqrt()).max(0.0)
}

/// Distance from a point at radius `r`, looking at direction whose zenith
/// cosine is `mu`, to the planet's surface; meaningful only when
/// [`intersects_ground()`] holds.
pub fn distance_to_ground(r: f32, mu: f32, planet_radius: f32) -> f32 {
    let discriminant = r.sqr() * (mu.sqr() - 1.0) + planet_radius.sqr();

    (-r * mu - discriminant.safe_sqrt()).max(0.0)
}

pub fn intersects_ground(r: f32, mu: f32, planet_radius: f32) -> bool {
    mu < 0.0 && r.sqr() * (mu.sqr() - 1.0) + planet_radius.sqr() >= 0.0
}

/// Distance from the planet's center after travelling `t` from a point at
/// radius `r` along a direction whose zenith cosine is `mu`.
pub fn radius_at(r: f32, mu: f32, t: f32) -> f32 {
    (t.sqr() + 2.0 * r * mu * t + r.sqr()).safe_sqrt()
}
