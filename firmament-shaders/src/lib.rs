//! Kernels generating Firmament's lookup tables.
//!
//! Each kernel computes a single texel (or, for the aerial-perspective volume,
//! a single column of texels) and is a pure function of its inputs, so that
//! whichever execution context runs it is free to schedule texels in any
//! order.
//!
//! Thanks to:
//!
//! - https://github.com/sebh/UnrealEngineSkyAtmosphere
//!   (A Scalable and Production Ready Sky and Atmosphere Rendering Technique
//!   by Sébastien Hillaire)
//!
//! - https://ebruneton.github.io/precomputed_atmospheric_scattering/
//!   (transmittance parameterization)

pub mod aerial_perspective;
pub mod multi_scattering;
pub mod sky_view;
pub mod transmittance;
mod utils;
