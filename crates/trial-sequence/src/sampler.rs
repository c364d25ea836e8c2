//! Position sampling under the configured depth and planar policies.
//!
//! Coordinates are emitted as fixed 3-decimal strings so that a seeded run
//! reproduces its output byte for byte. Distance-band sampling is rejection
//! sampling with an explicit retry budget; exhausting it is surfaced as
//! [`SampleError::ConstraintUnreachable`] instead of looping forever.

use rand::Rng;
use thiserror::Error;

use crate::config::{DepthPolicy, PlanarPolicy, Region};

/// Rejection sampling gave up.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("no sample satisfied {category} within {attempts} attempts")]
    ConstraintUnreachable { category: String, attempts: usize },
}

/// Fixed-precision rendering used for every serialized coordinate.
pub fn format_coord(value: f64) -> String {
    format!("{:.3}", value)
}

/// Planar Euclidean distance.
pub fn planar_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

impl DepthPolicy {
    /// Materialize the depth value for a category, already formatted.
    ///
    /// Plane categories ignore the RNG entirely.
    pub fn sample(&self, index: usize, rng: &mut impl Rng) -> String {
        match self {
            DepthPolicy::Planes(planes) => format_coord(planes[index].value),
            DepthPolicy::Bands(bands) => {
                let band = &bands[index];
                format_coord(rng.random_range(band.min..=band.max))
            }
        }
    }
}

impl PlanarPolicy {
    /// Draw a (start, target) coordinate pair for the given category.
    pub fn sample(
        &self,
        index: usize,
        rng: &mut impl Rng,
        max_attempts: usize,
    ) -> Result<([f64; 2], [f64; 2]), SampleError> {
        match self {
            PlanarPolicy::Regions { inner_half_width, outer_limit, pairs } => {
                let (start_region, target_region) = pairs[index];
                let start = sample_region(start_region, *inner_half_width, *outer_limit, rng);
                let target = sample_region(target_region, *inner_half_width, *outer_limit, rng);
                Ok((start, target))
            }
            PlanarPolicy::DistanceBands { step, tolerance, domain, .. } => {
                let center = (index + 1) as f64 * step;
                for _ in 0..max_attempts {
                    let start = [
                        rng.random_range(domain.0..=domain.1),
                        rng.random_range(domain.0..=domain.1),
                    ];
                    let target = [
                        rng.random_range(domain.0..=domain.1),
                        rng.random_range(domain.0..=domain.1),
                    ];
                    let dist = planar_distance(start, target);
                    if center - tolerance < dist && dist < center + tolerance {
                        return Ok((start, target));
                    }
                }
                Err(SampleError::ConstraintUnreachable {
                    category: self.label(index),
                    attempts: max_attempts,
                })
            }
        }
    }
}

fn sample_region(region: Region, inner: f64, outer: f64, rng: &mut impl Rng) -> [f64; 2] {
    match region {
        Region::Inner => [
            rng.random_range(-inner..=inner),
            rng.random_range(-inner..=inner),
        ],
        // Each coordinate independently lands in the negative or positive
        // sub-range with equal probability.
        Region::Outer => std::array::from_fn(|_| {
            if rng.random_range(0..2) == 0 {
                rng.random_range(-outer..=-inner)
            } else {
                rng.random_range(inner..=outer)
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::config::StudyConfig;

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(9.0), "9.000");
        assert_eq!(format_coord(-0.75), "-0.750");
        assert_eq!(format_coord(0.12349), "0.123");
    }

    #[test]
    fn test_plane_sample_ignores_seed() {
        let policy = DepthPolicy::evenly_spaced(&["S", "M", "F"], 3.0);
        for seed in [0u64, 1, 42, u64::MAX] {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert_eq!(policy.sample(2, &mut rng), "9.000");
        }
    }

    #[test]
    fn test_band_sample_within_range() {
        let config = StudyConfig::adaptive_depth();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            // Category M: [4, 6].
            let value: f64 = config.depth.sample(1, &mut rng).parse().unwrap();
            assert!((4.0..=6.0).contains(&value), "out of band: {}", value);
        }
    }

    #[test]
    fn test_distance_band_sample_satisfies_band() {
        let config = StudyConfig::distance_band();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for index in 0..config.planar.category_count() {
            let (start, target) = config
                .planar
                .sample(index, &mut rng, config.max_sample_attempts)
                .unwrap();
            let dist = planar_distance(start, target);
            let center = 0.5 * (index + 1) as f64;
            assert!(
                center - 0.01 < dist && dist < center + 0.01,
                "D{}: distance {} outside band",
                index + 1,
                dist
            );
        }
    }

    #[test]
    fn test_region_sample_respects_bounds() {
        let config = StudyConfig::adaptive_depth();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        // Category O2O: both endpoints outside the inner square.
        for _ in 0..50 {
            let (start, target) = config.planar.sample(3, &mut rng, 1).unwrap();
            for point in [start, target] {
                for coord in point {
                    assert!(
                        (0.75..=1.5).contains(&coord.abs()),
                        "outer coordinate {} out of range",
                        coord
                    );
                }
            }
        }
        // Category I2I: both endpoints inside it.
        for _ in 0..50 {
            let (start, target) = config.planar.sample(0, &mut rng, 1).unwrap();
            for point in [start, target] {
                for coord in point {
                    assert!(coord.abs() <= 0.75, "inner coordinate {} out of range", coord);
                }
            }
        }
    }

    #[test]
    fn test_exhausted_budget_is_constraint_unreachable() {
        // A band centered at 20.0 can never be satisfied in [-1, 1].
        let policy = PlanarPolicy::DistanceBands {
            step: 20.0,
            tolerance: 0.01,
            bands: 1,
            domain: (-1.0, 1.0),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = policy.sample(0, &mut rng, 25).unwrap_err();
        match err {
            SampleError::ConstraintUnreachable { category, attempts } => {
                assert_eq!(category, "D1");
                assert_eq!(attempts, 25);
            }
        }
    }
}
