mod f32_ext;

use core::ops;

use glam::Vec3;

pub use self::f32_ext::*;

pub fn lerp<T>(a: T, b: T, t: f32) -> T
where
    T: ops::Add<Output = T>,
    T: ops::Sub<Output = T>,
    T: ops::Mul<f32, Output = T>,
    T: Copy,
{
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Integrates in-scattered light over a single homogeneous ray-marching
/// segment whose transmittance is `segment_transmittance`.
///
/// Channels that don't attenuate at all fall back to `scattering * dt`, which
/// is the limit of the analytic formula.
pub fn integrate_segment(
    scattering: Vec3,
    extinction: Vec3,
    segment_transmittance: Vec3,
    dt: f32,
) -> Vec3 {
    Vec3::select(
        extinction.cmpgt(Vec3::ZERO),
        (scattering - scattering * segment_transmittance) / extinction,
        scattering * dt,
    )
}
