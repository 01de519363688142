//! # PopulationOptions
//!
//! The `PopulationOptions` struct holds the shape and bounds of a population:
//! how many candidates it holds, how long each chromosome is, the inclusive
//! gene bounds, how many elites survive each step unchanged, the starting
//! generation and the size at which fitness evaluation goes parallel.
//!
//! ## Example
//!
//! ```rust
//! use gannet::population::PopulationOptions;
//!
//! // Positional constructor
//! let options = PopulationOptions::new(20, 9, -9, 9, 1);
//! assert_eq!(options.generation(), 1);
//!
//! // Builder
//! let options = PopulationOptions::builder()
//!     .population_size(20)
//!     .chromosome_length(9)
//!     .gene_bounds(-9, 9)
//!     .elite_count(1)
//!     .parallel_threshold(500)
//!     .build()?;
//! assert_eq!(options.parallel_threshold(), 500);
//! # Ok::<(), gannet::error::GeneticError>(())
//! ```

use crate::error::{GeneticError, Result};
use crate::numeric::Scalar;

const DEFAULT_POPULATION_SIZE: usize = 100;
const DEFAULT_PARALLEL_THRESHOLD: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopulationOptions<G> {
    population_size: usize,
    chromosome_length: usize,
    gene_min: G,
    gene_max: G,
    elite_count: usize,
    generation: usize,
    /// Population size at or above which `evaluate_with` runs on rayon
    parallel_threshold: usize,
}

impl<G: Scalar> PopulationOptions<G> {
    pub fn new(
        population_size: usize,
        chromosome_length: usize,
        gene_min: G,
        gene_max: G,
        elite_count: usize,
    ) -> Self {
        Self {
            population_size,
            chromosome_length,
            gene_min,
            gene_max,
            elite_count,
            generation: 1,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Starts counting generations at `generation` instead of 1.
    pub fn with_generation(mut self, generation: usize) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn population_size(&self) -> usize {
        self.population_size
    }

    pub fn chromosome_length(&self) -> usize {
        self.chromosome_length
    }

    pub fn gene_min(&self) -> G {
        self.gene_min
    }

    pub fn gene_max(&self) -> G {
        self.gene_max
    }

    pub fn elite_count(&self) -> usize {
        self.elite_count
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    /// Checks that the options describe a usable population.
    ///
    /// # Errors
    ///
    /// Returns `GeneticError::Configuration` when a size is zero, when no
    /// candidate would be left for selection after elitism, when the
    /// generation counter starts at zero, or when the gene bounds are
    /// inverted or span a real width that is not finite.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(GeneticError::Configuration(
                "Population size cannot be zero".to_string(),
            ));
        }
        if self.chromosome_length == 0 {
            return Err(GeneticError::Configuration(
                "Chromosome length cannot be zero".to_string(),
            ));
        }
        if self.elite_count >= self.population_size {
            return Err(GeneticError::Configuration(format!(
                "Elite count {} must be smaller than the population size {}",
                self.elite_count, self.population_size
            )));
        }
        if self.generation == 0 {
            return Err(GeneticError::Configuration(
                "Generation counter starts at 1".to_string(),
            ));
        }
        if !G::is_sampleable(self.gene_min, self.gene_max) {
            return Err(GeneticError::Configuration(format!(
                "Gene bounds [{}, {}] must be ordered with a finite width",
                self.gene_min, self.gene_max
            )));
        }
        Ok(())
    }

    /// Returns a builder for creating a `PopulationOptions` instance.
    pub fn builder() -> PopulationOptionsBuilder<G> {
        PopulationOptionsBuilder::default()
    }
}

/// Builder for `PopulationOptions`.
///
/// Chromosome length and gene bounds have no sensible default and must be
/// supplied; everything else falls back to the defaults of
/// [`PopulationOptions::new`] and a population of 100.
#[derive(Debug, Clone)]
pub struct PopulationOptionsBuilder<G> {
    population_size: Option<usize>,
    chromosome_length: Option<usize>,
    gene_bounds: Option<(G, G)>,
    elite_count: Option<usize>,
    generation: Option<usize>,
    parallel_threshold: Option<usize>,
}

impl<G> Default for PopulationOptionsBuilder<G> {
    fn default() -> Self {
        Self {
            population_size: None,
            chromosome_length: None,
            gene_bounds: None,
            elite_count: None,
            generation: None,
            parallel_threshold: None,
        }
    }
}

impl<G: Scalar> PopulationOptionsBuilder<G> {
    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn chromosome_length(mut self, value: usize) -> Self {
        self.chromosome_length = Some(value);
        self
    }

    /// Sets the inclusive gene bounds.
    pub fn gene_bounds(mut self, min: G, max: G) -> Self {
        self.gene_bounds = Some((min, max));
        self
    }

    pub fn elite_count(mut self, value: usize) -> Self {
        self.elite_count = Some(value);
        self
    }

    pub fn generation(mut self, value: usize) -> Self {
        self.generation = Some(value);
        self
    }

    pub fn parallel_threshold(mut self, value: usize) -> Self {
        self.parallel_threshold = Some(value);
        self
    }

    /// Builds and validates the options.
    ///
    /// # Errors
    ///
    /// Returns `GeneticError::Configuration` if the chromosome length or the
    /// gene bounds were never set, or if [`PopulationOptions::validate`] fails.
    pub fn build(self) -> Result<PopulationOptions<G>> {
        let chromosome_length = self.chromosome_length.ok_or_else(|| {
            GeneticError::Configuration("Chromosome length must be specified".to_string())
        })?;
        let (gene_min, gene_max) = self.gene_bounds.ok_or_else(|| {
            GeneticError::Configuration("Gene bounds must be specified".to_string())
        })?;

        let options = PopulationOptions {
            population_size: self.population_size.unwrap_or(DEFAULT_POPULATION_SIZE),
            chromosome_length,
            gene_min,
            gene_max,
            elite_count: self.elite_count.unwrap_or(0),
            generation: self.generation.unwrap_or(1),
            parallel_threshold: self
                .parallel_threshold
                .unwrap_or(DEFAULT_PARALLEL_THRESHOLD),
        };
        options.validate()?;
        Ok(options)
    }
}
