//! # Breeding
//!
//! Offspring production for the generational step. Parents are chosen by
//! [`crate::selection`]; this module turns a pair of parent chromosomes into
//! one child.
pub mod blend;

pub use blend::BlendCrossover;
