use derivative::Derivative;
use glam::{uvec2, vec2, UVec2, Vec2, Vec3};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{gpu, SampleElimination};

/// Directions along which the multiple-scattering stage gathers light.
///
/// Directions are picked out of a seeded pool through sample elimination, so
/// the same `(count, seed)` pair always yields exactly the same set.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct DirectionSet {
    count: u32,
    seed: u64,

    #[derivative(Debug = "ignore")]
    points: Vec<Vec2>,

    #[derivative(Debug = "ignore")]
    directions: Vec<Vec3>,
}

impl DirectionSet {
    /// How many more candidates than requested directions the pool contains.
    const OVERSAMPLING: usize = 10;

    pub fn generate(count: u32, seed: u64) -> Self {
        debug!("Generating direction set; count={count}, seed={seed}");

        let count = count.max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        let pool: Vec<_> = (0..count as usize * Self::OVERSAMPLING)
            .map(|_| vec2(rng.gen(), rng.gen()))
            .collect();

        let points = SampleElimination::new()
            .tiled(true)
            .eliminate(&pool, count as usize);

        let directions = points
            .iter()
            .map(|&point| gpu::spherical_direction(point))
            .collect();

        Self {
            count,
            seed,
            points,
            directions,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns points (within the unit square) the directions were mapped
    /// from.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }
}

/// Tileable blue-noise texture used to dither lookups into the
/// aerial-perspective volume.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct BlueNoise {
    size: u32,

    #[derivative(Debug = "ignore")]
    values: Vec<f32>,
}

impl BlueNoise {
    pub const SIZE: u32 = 32;

    /// Generates the texture by ranking its (slightly jittered) texels with
    /// sample elimination; texels ranked higher get lower values, so every
    /// threshold of the texture yields a well-spread set of texels.
    pub fn generate(seed: u64) -> Self {
        let size = Self::SIZE;
        let mut rng = StdRng::seed_from_u64(seed);

        let pool: Vec<_> = (0..size * size)
            .map(|idx| {
                let texel = uvec2(idx % size, idx / size).as_vec2();

                let jitter =
                    vec2(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1));

                (texel + 0.5 + jitter) / size as f32
            })
            .collect();

        let ranking = SampleElimination::new().tiled(true).rank(&pool);
        let mut values = vec![0.0; pool.len()];

        for (rank, idx) in ranking.into_iter().enumerate() {
            values[idx] = (rank as f32 + 0.5) / pool.len() as f32;
        }

        Self { size, values }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns value within `(0.0, 1.0)` for given pixel, repeating the texture
    /// over the whole screen.
    pub fn get(&self, pixel: UVec2) -> f32 {
        let pos = pixel % self.size;

        self.values[(pos.y * self.size + pos.x) as usize]
    }

    /// Returns offset within `<-radius, radius>` for given pixel of a
    /// `output_size`-sized screen.
    pub fn jitter(&self, pixel: UVec2, output_size: UVec2, radius: f32) -> f32 {
        let pixel = pixel.min(output_size.max(UVec2::ONE) - 1);

        (2.0 * self.get(pixel) - 1.0) * radius
    }
}
