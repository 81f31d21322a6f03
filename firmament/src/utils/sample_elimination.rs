//! Weighted sample elimination, as described by Cem Yuksel in "Sample
//! Elimination for Generating Poisson Disk Sample Sets" (2015).
//!
//! Starting from a large pool of random points, we keep removing the point
//! that's most crowded by its neighbours until the desired number of points is
//! left; what remains is a blue-noise-like set.

use glam::Vec2;

const ALPHA: f32 = 8.0;
const BETA: f32 = 0.65;
const GAMMA: f32 = 1.5;

/// Eliminates samples from a pool of points lying within `<0.0, 1.0)²`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleElimination {
    tiled: bool,
}

impl SampleElimination {
    pub fn new() -> Self {
        Default::default()
    }

    /// Treats the domain as a torus, so that the resulting set can be tiled
    /// without visible seams.
    pub fn tiled(mut self, tiled: bool) -> Self {
        self.tiled = tiled;
        self
    }

    /// Picks `count` well-spread points out of `pool`.
    pub fn eliminate(&self, pool: &[Vec2], count: usize) -> Vec<Vec2> {
        let mut alive: Vec<_> = (0..pool.len()).collect();

        self.eliminate_into(pool, &mut alive, count, &mut Vec::new());

        alive.into_iter().map(|idx| pool[idx]).collect()
    }

    /// Orders all points of `pool` so that each prefix of the returned indices
    /// is well spread.
    pub fn rank(&self, pool: &[Vec2]) -> Vec<usize> {
        let mut alive: Vec<_> = (0..pool.len()).collect();
        let mut removed = Vec::with_capacity(pool.len());

        // Eliminating down to a single point in one go would use the radius
        // tailored for that single point, so instead we halve the set in
        // phases, each with its own radius
        while alive.len() > 1 {
            let target = alive.len() / 2;

            self.eliminate_into(pool, &mut alive, target, &mut removed);
        }

        removed.extend(alive);
        removed.reverse();
        removed
    }

    fn eliminate_into(
        &self,
        pool: &[Vec2],
        alive: &mut Vec<usize>,
        target: usize,
        removed: &mut Vec<usize>,
    ) {
        if alive.len() <= target {
            return;
        }

        let d_max = 2.0 * max_poisson_disk_radius(target.max(1));
        let d_min = d_max * weight_limit_fraction(alive.len(), target);

        let neighbours: Vec<Vec<(usize, f32)>> = alive
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                alive
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .filter_map(|(j, &b)| {
                        let d = self.distance(pool[a], pool[b]);

                        (d < d_max).then(|| {
                            let d = d.max(d_min);

                            (j, (1.0 - d / d_max).powf(ALPHA))
                        })
                    })
                    .collect()
            })
            .collect();

        let mut weights: Vec<f32> = neighbours
            .iter()
            .map(|ns| ns.iter().map(|(_, w)| w).sum())
            .collect();

        let mut is_alive = vec![true; alive.len()];
        let mut remaining = alive.len();

        while remaining > target {
            // Ties are broken by index, which keeps the result deterministic
            let Some(victim) = (0..alive.len())
                .filter(|&i| is_alive[i])
                .reduce(|a, b| if weights[b] > weights[a] { b } else { a })
            else {
                break;
            };

            is_alive[victim] = false;
            remaining -= 1;
            removed.push(alive[victim]);

            for &(j, w) in &neighbours[victim] {
                weights[j] -= w;
            }
        }

        let mut idx = 0;

        alive.retain(|_| {
            idx += 1;
            is_alive[idx - 1]
        });
    }

    fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        let d = (a - b).abs();

        if self.tiled {
            d.min(Vec2::ONE - d).length()
        } else {
            d.length()
        }
    }
}

/// Radius of the largest disks that `count` non-overlapping samples could have
/// within the unit square (when packed hexagonally).
fn max_poisson_disk_radius(count: usize) -> f32 {
    (1.0 / (2.0 * 3.0f32.sqrt() * count as f32)).sqrt()
}

fn weight_limit_fraction(input: usize, output: usize) -> f32 {
    let ratio = output as f32 / input as f32;

    (1.0 - ratio.powf(GAMMA)) * BETA
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec2;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn pool(len: usize) -> Vec<Vec2> {
        let mut rng = StdRng::seed_from_u64(1234);

        (0..len).map(|_| vec2(rng.gen(), rng.gen())).collect()
    }

    fn min_distance(target: &SampleElimination, points: &[Vec2]) -> f32 {
        let mut min = f32::MAX;

        for (i, &a) in points.iter().enumerate() {
            for &b in &points[i + 1..] {
                min = min.min(target.distance(a, b));
            }
        }

        min
    }

    #[test]
    fn eliminate() {
        let target = SampleElimination::new().tiled(true);
        let pool = pool(640);
        let points = target.eliminate(&pool, 64);

        assert_eq!(64, points.len());

        // Picking 64 points at random from the pool would yield a way smaller
        // minimum distance
        let random = min_distance(&target, &pool[..64]);
        let eliminated = min_distance(&target, &points);

        assert!(eliminated > 2.0 * random);
        assert_eq!(points, target.eliminate(&pool, 64));
    }

    #[test]
    fn rank() {
        let target = SampleElimination::new().tiled(true);
        let pool = pool(256);
        let ranking = target.rank(&pool);

        let mut sorted = ranking.clone();

        sorted.sort_unstable();

        assert_eq!((0..256).collect::<Vec<_>>(), sorted);

        let prefix: Vec<_> = ranking[..16].iter().map(|&i| pool[i]).collect();

        assert!(min_distance(&target, &prefix) > 0.1);
    }

    #[test]
    fn distance() {
        let a = vec2(0.05, 0.5);
        let b = vec2(0.95, 0.5);
        let target = SampleElimination::new();

        assert_relative_eq!(target.distance(a, b), 0.9, epsilon = 1e-6);

        let target = target.tiled(true);

        assert_relative_eq!(target.distance(a, b), 0.1, epsilon = 1e-6);
    }
}
