//! Study configuration: methods, counter-balancing, and sampling policies.
//!
//! One generator serves every study variant; the variants differ only in the
//! data carried here. Presets reproduce the three fielded designs.

use anyhow::{bail, Result};

use crate::counterbalance;

/// Default retry budget for rejection sampling.
pub const DEFAULT_MAX_SAMPLE_ATTEMPTS: usize = 100_000;

/// A fixed depth plane: the category always resolves to this value.
#[derive(Debug, Clone)]
pub struct DepthPlane {
    pub label: String,
    pub value: f64,
}

/// A depth range: the category resolves to a uniform draw within it.
#[derive(Debug, Clone)]
pub struct DepthBand {
    pub label: String,
    pub min: f64,
    pub max: f64,
}

/// How trial depth (z) is materialized from a category index.
#[derive(Debug, Clone)]
pub enum DepthPolicy {
    /// Deterministic: each category is a fixed plane.
    Planes(Vec<DepthPlane>),
    /// Stochastic: each category is a uniform draw within its band.
    Bands(Vec<DepthBand>),
}

impl DepthPolicy {
    /// Planes at `(i + 1) * spacing` for each label, in order.
    pub fn evenly_spaced(labels: &[&str], spacing: f64) -> Self {
        DepthPolicy::Planes(
            labels
                .iter()
                .enumerate()
                .map(|(i, label)| DepthPlane {
                    label: (*label).to_string(),
                    value: (i + 1) as f64 * spacing,
                })
                .collect(),
        )
    }

    pub fn category_count(&self) -> usize {
        match self {
            DepthPolicy::Planes(planes) => planes.len(),
            DepthPolicy::Bands(bands) => bands.len(),
        }
    }

    pub fn label(&self, index: usize) -> &str {
        match self {
            DepthPolicy::Planes(planes) => &planes[index].label,
            DepthPolicy::Bands(bands) => &bands[index].label,
        }
    }

    /// Label for a start -> target depth transition, e.g. "S2M".
    pub fn transition_label(&self, from: usize, to: usize) -> String {
        format!("{}2{}", self.label(from), self.label(to))
    }
}

/// Planar region of the interaction space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Inner,
    Outer,
}

impl Region {
    pub fn code(self) -> &'static str {
        match self {
            Region::Inner => "I",
            Region::Outer => "O",
        }
    }
}

/// How the planar (x, y) displacement class is sampled.
#[derive(Debug, Clone)]
pub enum PlanarPolicy {
    /// Start and target each drawn from a named region. Inner draws each
    /// coordinate uniform in `[-inner_half_width, inner_half_width]`; Outer
    /// picks one of the two disjoint ranges `[-outer_limit, -inner_half_width]`
    /// and `[inner_half_width, outer_limit]` independently per coordinate,
    /// then draws uniform within it.
    Regions {
        inner_half_width: f64,
        outer_limit: f64,
        pairs: Vec<(Region, Region)>,
    },
    /// Start and target drawn over `domain` per coordinate, accepted iff the
    /// planar distance lies strictly inside `(i+1)*step ± tolerance` for
    /// band index `i`.
    DistanceBands {
        step: f64,
        tolerance: f64,
        bands: usize,
        domain: (f64, f64),
    },
}

impl PlanarPolicy {
    pub fn category_count(&self) -> usize {
        match self {
            PlanarPolicy::Regions { pairs, .. } => pairs.len(),
            PlanarPolicy::DistanceBands { bands, .. } => *bands,
        }
    }

    /// Category label, e.g. "I2O" for region pairs or "D2" for bands.
    pub fn label(&self, index: usize) -> String {
        match self {
            PlanarPolicy::Regions { pairs, .. } => {
                let (start, target) = pairs[index];
                format!("{}2{}", start.code(), target.code())
            }
            PlanarPolicy::DistanceBands { .. } => format!("D{}", index + 1),
        }
    }

    /// Longest planar distance expressible in the sampling domain.
    pub fn max_reachable_distance(&self) -> f64 {
        match self {
            PlanarPolicy::Regions { outer_limit, .. } => {
                (2.0 * outer_limit) * std::f64::consts::SQRT_2
            }
            PlanarPolicy::DistanceBands { domain, .. } => {
                (domain.1 - domain.0) * std::f64::consts::SQRT_2
            }
        }
    }
}

/// Full description of one study variant.
#[derive(Debug, Clone)]
pub struct StudyConfig {
    /// Number of participant IDs to generate, `0..participants`.
    pub participants: usize,
    /// Interaction method labels, indexed by the counter-balancing table.
    pub methods: Vec<String>,
    /// Counter-balancing table: one method permutation per participant.
    pub method_sequence: Vec<Vec<usize>>,
    /// Depth sampling policy.
    pub depth: DepthPolicy,
    /// Ordered start -> target depth category pairs, off-diagonal.
    pub depth_transitions: Vec<(usize, usize)>,
    /// Planar sampling policy.
    pub planar: PlanarPolicy,
    /// Rejection-sampling retry budget per trial.
    pub max_sample_attempts: usize,
}

impl StudyConfig {
    /// Six methods, stochastic depth bands, inner/outer region pairs.
    pub fn adaptive_depth() -> Self {
        Self {
            participants: 12,
            methods: labels(&[
                "CONST_N", "DIST_N", "ADAPT_N", "CONST_W", "DIST_W", "ADAPT_W",
            ]),
            method_sequence: counterbalance::to_rows(counterbalance::SIX_METHOD),
            depth: DepthPolicy::Bands(vec![
                DepthBand { label: "S".into(), min: 1.0, max: 3.0 },
                DepthBand { label: "M".into(), min: 4.0, max: 6.0 },
                DepthBand { label: "F".into(), min: 7.0, max: 9.0 },
            ]),
            depth_transitions: vec![(0, 1), (0, 2), (1, 2), (1, 0), (2, 0), (2, 1)],
            planar: PlanarPolicy::Regions {
                inner_half_width: 0.75,
                outer_limit: 1.5,
                pairs: vec![
                    (Region::Inner, Region::Inner),
                    (Region::Inner, Region::Outer),
                    (Region::Outer, Region::Inner),
                    (Region::Outer, Region::Outer),
                ],
            },
            max_sample_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
        }
    }

    /// Four methods, fixed depth planes, distance bands D1-D4.
    pub fn distance_band() -> Self {
        Self {
            participants: 12,
            methods: labels(&["DIST_N", "ADAPT_N", "DIST_W", "ADAPT_W"]),
            method_sequence: counterbalance::to_rows(counterbalance::FOUR_METHOD),
            depth: DepthPolicy::evenly_spaced(&["S", "M", "F"], 3.0),
            depth_transitions: vec![(0, 1), (0, 2), (1, 2), (1, 0), (2, 0), (2, 1)],
            planar: PlanarPolicy::DistanceBands {
                step: 0.5,
                tolerance: 0.01,
                bands: 4,
                domain: (-1.0, 1.0),
            },
            max_sample_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
        }
    }

    /// Two methods (wall vs. no wall), close/far depth planes, bands D1-D4.
    pub fn wall_comparison() -> Self {
        Self {
            participants: 12,
            methods: labels(&["WALL", "NO_WALL"]),
            method_sequence: counterbalance::to_rows(counterbalance::TWO_METHOD),
            depth: DepthPolicy::Planes(vec![
                DepthPlane { label: "C".into(), value: 3.0 },
                DepthPlane { label: "F".into(), value: 9.0 },
            ]),
            depth_transitions: vec![(0, 1), (1, 0)],
            planar: PlanarPolicy::DistanceBands {
                step: 0.5,
                tolerance: 0.01,
                bands: 4,
                domain: (-1.0, 1.0),
            },
            max_sample_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
        }
    }

    /// Number of trials in every block: the full cross-product of depth
    /// transitions and planar categories.
    pub fn trials_per_block(&self) -> usize {
        self.depth_transitions.len() * self.planar.category_count()
    }

    /// Reject malformed configurations before any assembly work starts.
    pub fn validate(&self) -> Result<()> {
        if self.participants == 0 {
            bail!("participant count must be at least 1");
        }
        if self.methods.is_empty() {
            bail!("method list is empty");
        }
        if self.participants > self.method_sequence.len() {
            bail!(
                "counter-balancing table has {} rows, {} participants requested",
                self.method_sequence.len(),
                self.participants
            );
        }
        for (row_idx, row) in self.method_sequence.iter().enumerate() {
            if row.len() != self.methods.len() {
                bail!(
                    "counter-balancing row {} has {} entries, expected {}",
                    row_idx,
                    row.len(),
                    self.methods.len()
                );
            }
            let mut seen = vec![false; self.methods.len()];
            for &m in row {
                if m >= self.methods.len() || seen[m] {
                    bail!("counter-balancing row {} is not a permutation: {:?}", row_idx, row);
                }
                seen[m] = true;
            }
        }

        let depth_categories = self.depth.category_count();
        if depth_categories == 0 {
            bail!("depth policy has no categories");
        }
        if let DepthPolicy::Bands(bands) = &self.depth {
            for band in bands {
                if band.min >= band.max {
                    bail!("depth band {} has empty range [{}, {}]", band.label, band.min, band.max);
                }
            }
        }
        if self.depth_transitions.is_empty() {
            bail!("depth transition list is empty");
        }
        for &(from, to) in &self.depth_transitions {
            if from >= depth_categories || to >= depth_categories {
                bail!(
                    "depth transition ({}, {}) out of range for {} categories",
                    from,
                    to,
                    depth_categories
                );
            }
            if from == to {
                bail!("depth transition ({}, {}) is not off-diagonal", from, to);
            }
        }

        if self.planar.category_count() == 0 {
            bail!("planar policy has no categories");
        }
        match &self.planar {
            PlanarPolicy::Regions { inner_half_width, outer_limit, .. } => {
                if *inner_half_width <= 0.0 || *outer_limit <= *inner_half_width {
                    bail!(
                        "region bounds must satisfy 0 < inner ({}) < outer ({})",
                        inner_half_width,
                        outer_limit
                    );
                }
            }
            PlanarPolicy::DistanceBands { step, tolerance, bands, domain } => {
                if *step <= 0.0 || *tolerance <= 0.0 {
                    bail!("distance bands need positive step and tolerance");
                }
                if domain.0 >= domain.1 {
                    bail!("sampling domain [{}, {}] is empty", domain.0, domain.1);
                }
                // Every band interval must be reachable within the domain,
                // otherwise rejection sampling cannot terminate.
                let max_dist = self.planar.max_reachable_distance();
                let farthest_band_floor = *bands as f64 * step - tolerance;
                if farthest_band_floor >= max_dist {
                    bail!(
                        "band D{} starts at {:.3} but the domain only reaches {:.3}",
                        bands,
                        farthest_band_floor,
                        max_dist
                    );
                }
            }
        }

        if self.max_sample_attempts == 0 {
            bail!("sample attempt budget must be at least 1");
        }

        Ok(())
    }
}

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}
