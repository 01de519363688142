//! # gannet
//!
//! Genetic-algorithm weight search for small feed-forward networks.
//!
//! A [`Network`] evaluates one candidate weight vector; a [`Population`]
//! holds many such vectors, takes one fitness value per candidate and breeds
//! the next generation through elitism, roulette selection and blended
//! crossover. The [`persistence`] module stores either of them in a compact
//! native-endian format.

pub mod breeding;
pub mod error;
pub mod network;
pub mod numeric;
pub mod persistence;
pub mod population;
pub mod rng;
pub mod selection;

// Re-export commonly used types for convenience
pub use error::{GeneticError, OptionExt, Result, ResultExt};
pub use network::{ActivationFunction, Network, NetworkBuilder, Topology};
pub use numeric::Scalar;
pub use population::{Population, PopulationOptions};
pub use rng::RandomNumberGenerator;
