//! # Selection
//!
//! Ranking, elitism and roulette-wheel parent selection used by
//! [`Population::generate_next_generation`](crate::population::Population::generate_next_generation).
pub mod elitist;
pub mod roulette;

pub use elitist::{copy_elites, rank_by_fitness};
pub use roulette::RouletteWheel;
