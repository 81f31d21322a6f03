//! Common structs, parameterizations and algorithms used by Firmament's
//! kernels and by the renderers consuming its lookup tables.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod aerial_perspective;
mod atmosphere;
mod camera;
mod lut;
mod multi_scattering;
mod passes;
mod ray;
mod shadow;
mod sky_view;
mod transmittance;
mod utils;

pub use self::aerial_perspective::*;
pub use self::atmosphere::*;
pub use self::camera::*;
pub use self::lut::*;
pub use self::multi_scattering::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::shadow::*;
pub use self::sky_view::*;
pub use self::transmittance::*;
pub use self::utils::*;

pub mod prelude {
    pub use core::f32::consts::PI;

    pub use glam::*;

    pub use crate::*;
}
