//! Constrained randomized trial sequences for a spatial-interaction study.
//!
//! This crate produces, for each participant, an ordered list of experimental
//! blocks (one per interaction method, counter-balanced across participants),
//! each holding a shuffled list of trials. A trial pairs a start and a target
//! position in 3D space: x/y drawn under the planar category's constraint,
//! z drawn from the depth category, all emitted as fixed-precision strings.

pub mod config;
pub mod counterbalance;
pub mod generator;
pub mod sampler;
pub mod sequence;
