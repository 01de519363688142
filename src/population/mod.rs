//! # Population
//!
//! The generational genetic-algorithm engine. A `Population` owns a
//! `population_size × chromosome_length` matrix of genes, one fitness value
//! per row, and the random generator that drives breeding.
//!
//! The caller drives the loop: randomize the individuals, score them, hand
//! the scores to [`Population::evaluate`] (or let
//! [`Population::evaluate_with`] run a network over every row), then call
//! [`Population::generate_next_generation`]. Each step keeps the best
//! `elite_count` rows unchanged and fills the rest with BLX children of
//! roulette-selected parents.
//!
//! ## Example
//!
//! ```rust
//! use gannet::population::{Population, PopulationOptions};
//! use gannet::rng::RandomNumberGenerator;
//!
//! let mut population: Population<i32, i32> =
//!     Population::with_rng(RandomNumberGenerator::from_seed(1));
//! population.reset(PopulationOptions::new(10, 4, -9, 9, 1))?;
//! population.set_individuals_random(-9, 9)?;
//!
//! // Fitness: the sum of the genes.
//! let scores: Vec<i32> = population
//!     .individuals()
//!     .chunks(4)
//!     .map(|chromosome| chromosome.iter().sum())
//!     .collect();
//! population.evaluate(&scores)?;
//! population.generate_next_generation()?;
//! assert_eq!(population.generation(), 2);
//! # Ok::<(), gannet::error::GeneticError>(())
//! ```

pub mod options;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::breeding::BlendCrossover;
use crate::error::{try_filled, GeneticError, Result};
use crate::network::Network;
use crate::numeric::Scalar;
use crate::rng::RandomNumberGenerator;
use crate::selection::{copy_elites, rank_by_fitness, RouletteWheel};

pub use options::{PopulationOptions, PopulationOptionsBuilder};

/// A population of candidate chromosomes with genes of type `G` and
/// fitness values of type `F`.
#[derive(Debug, Clone)]
pub struct Population<G: Scalar, F: Scalar> {
    options: Option<PopulationOptions<G>>,
    generation: usize,
    /// Row-major, one chromosome per row.
    individuals: Vec<G>,
    /// Scratch buffer for the next generation, swapped in after each step.
    next_individuals: Vec<G>,
    fitnesses: Vec<F>,
    ranking: Vec<usize>,
    individuals_set: bool,
    evaluated: bool,
    rng: RandomNumberGenerator,
}

impl<G: Scalar, F: Scalar> Population<G, F> {
    /// Creates an empty population whose generator is seeded from entropy.
    pub fn new() -> Self {
        Self::with_rng(RandomNumberGenerator::new())
    }

    /// Creates an empty population driven by `rng`. Two populations built
    /// from equally seeded generators and fed the same inputs breed
    /// identical generations.
    pub fn with_rng(rng: RandomNumberGenerator) -> Self {
        Self {
            options: None,
            generation: 0,
            individuals: Vec::new(),
            next_individuals: Vec::new(),
            fitnesses: Vec::new(),
            ranking: Vec::new(),
            individuals_set: false,
            evaluated: false,
            rng,
        }
    }

    /// Validates `options` and (re)allocates every buffer.
    ///
    /// Genes start at `gene_min` but count as unset until
    /// [`set_individuals`](Self::set_individuals) or
    /// [`set_individuals_random`](Self::set_individuals_random) is called.
    ///
    /// # Errors
    ///
    /// - `GeneticError::Configuration` if the options are invalid.
    /// - `GeneticError::Allocation` if the buffers cannot be allocated.
    ///
    /// On error the population keeps its previous state.
    pub fn reset(&mut self, options: PopulationOptions<G>) -> Result<()> {
        options.validate()?;

        let population_size = options.population_size();
        let genes = population_size
            .checked_mul(options.chromosome_length())
            .ok_or_else(|| {
                GeneticError::Allocation(format!(
                    "{} × {} genes overflow the address space",
                    population_size,
                    options.chromosome_length()
                ))
            })?;

        let individuals = try_filled(genes, options.gene_min())?;
        let next_individuals = try_filled(genes, options.gene_min())?;
        let fitnesses = try_filled(population_size, F::ZERO)?;
        let mut ranking = Vec::new();
        ranking.try_reserve_exact(population_size)?;
        ranking.extend(0..population_size);

        self.options = Some(options);
        self.generation = options.generation();
        self.individuals = individuals;
        self.next_individuals = next_individuals;
        self.fitnesses = fitnesses;
        self.ranking = ranking;
        self.individuals_set = false;
        self.evaluated = false;

        debug!(
            population_size,
            chromosome_length = options.chromosome_length(),
            elite_count = options.elite_count(),
            generation = self.generation,
            "population reset"
        );
        Ok(())
    }

    /// Replaces the whole state with a stored snapshot, which counts as set
    /// and evaluated. Everything is validated before anything is replaced.
    pub(crate) fn restore(
        &mut self,
        options: PopulationOptions<G>,
        individuals: &[G],
        fitnesses: &[F],
    ) -> Result<()> {
        let mut staged = Self::with_rng(self.rng.clone());
        staged.reset(options)?;
        staged.set_individuals(individuals)?;
        staged.evaluate(fitnesses)?;
        // Staging never draws from the generator, so the clone continues the same stream.
        *self = staged;
        Ok(())
    }

    /// Releases every buffer. The population must be reset before further use.
    pub fn clear(&mut self) {
        self.options = None;
        self.generation = 0;
        self.individuals = Vec::new();
        self.next_individuals = Vec::new();
        self.fitnesses = Vec::new();
        self.ranking = Vec::new();
        self.individuals_set = false;
        self.evaluated = false;
    }

    /// Copies `genes` verbatim into the individual matrix.
    ///
    /// # Errors
    ///
    /// - `GeneticError::Configuration` before [`reset`](Self::reset).
    /// - `GeneticError::ShapeMismatch` unless `genes` holds exactly
    ///   `population_size × chromosome_length` values.
    /// - `GeneticError::OutOfBounds` if any gene lies outside the gene bounds.
    pub fn set_individuals(&mut self, genes: &[G]) -> Result<()> {
        let options = *self.configured()?;
        if genes.len() != self.individuals.len() {
            return Err(GeneticError::ShapeMismatch {
                what: "individual matrix",
                expected: self.individuals.len(),
                actual: genes.len(),
            });
        }
        let (min, max) = (options.gene_min(), options.gene_max());
        if let Some(position) = genes.iter().position(|&gene| !(min <= gene && gene <= max)) {
            return Err(GeneticError::OutOfBounds(format!(
                "Gene {} at position {} lies outside [{}, {}]",
                genes[position], position, min, max
            )));
        }

        self.individuals.copy_from_slice(genes);
        self.individuals_set = true;
        self.evaluated = false;
        Ok(())
    }

    /// Draws every gene independently and uniformly from `[min, max]`.
    ///
    /// # Errors
    ///
    /// - `GeneticError::Configuration` before [`reset`](Self::reset).
    /// - `GeneticError::OutOfBounds` if the range is inverted, not finite, or
    ///   not contained in the gene bounds.
    pub fn set_individuals_random(&mut self, min: G, max: G) -> Result<()> {
        let options = *self.configured()?;
        if !G::is_sampleable(min, max) {
            return Err(GeneticError::OutOfBounds(format!(
                "Gene range [{}, {}] is not an ordered interval of finite width",
                min, max
            )));
        }
        if min < options.gene_min() || max > options.gene_max() {
            return Err(GeneticError::OutOfBounds(format!(
                "Gene range [{}, {}] exceeds the gene bounds [{}, {}]",
                min,
                max,
                options.gene_min(),
                options.gene_max()
            )));
        }

        self.rng.fill_uniform(&mut self.individuals, min, max);
        self.individuals_set = true;
        self.evaluated = false;
        Ok(())
    }

    /// Records one fitness value per candidate, row-aligned with the
    /// individual matrix. Neither ranks nor touches the individuals.
    ///
    /// # Errors
    ///
    /// - `GeneticError::Configuration` before the individuals are set.
    /// - `GeneticError::ShapeMismatch` unless there is exactly one value per
    ///   candidate.
    /// - `GeneticError::FitnessCalculation` if any value is not finite.
    pub fn evaluate(&mut self, fitnesses: &[F]) -> Result<()> {
        self.require_individuals()?;
        if fitnesses.len() != self.fitnesses.len() {
            return Err(GeneticError::ShapeMismatch {
                what: "fitness vector",
                expected: self.fitnesses.len(),
                actual: fitnesses.len(),
            });
        }
        if let Some(index) = fitnesses.iter().position(|fitness| !fitness.is_finite()) {
            return Err(GeneticError::FitnessCalculation(format!(
                "Non-finite fitness score encountered for candidate {}: {}",
                index, fitnesses[index]
            )));
        }

        self.fitnesses.copy_from_slice(fitnesses);
        self.evaluated = true;
        Ok(())
    }

    /// Scores every chromosome by loading it as the weights of a copy of
    /// `network` and passing that copy to `score`, then records the results
    /// through [`evaluate`](Self::evaluate).
    ///
    /// Populations at or above the parallel threshold are scored on the rayon
    /// pool, with one network clone per worker; smaller ones reuse a single
    /// clone sequentially. Nothing is recorded unless every score succeeds.
    ///
    /// # Errors
    ///
    /// - `GeneticError::ShapeMismatch` if the network's weight size differs
    ///   from the chromosome length.
    /// - Any error returned by `score`, or by [`evaluate`](Self::evaluate).
    pub fn evaluate_with<S>(&mut self, network: &Network<G>, score: S) -> Result<()>
    where
        S: Fn(&mut Network<G>) -> Result<F> + Sync,
    {
        let options = *self.configured()?;
        self.require_individuals()?;
        let length = options.chromosome_length();
        if network.weight_size() != length {
            return Err(GeneticError::ShapeMismatch {
                what: "network weight buffer",
                expected: length,
                actual: network.weight_size(),
            });
        }

        let scores: Vec<F> = if options.population_size() >= options.parallel_threshold() {
            self.individuals
                .par_chunks(length)
                .map_init(
                    || network.clone(),
                    |evaluator, chromosome| {
                        evaluator.set_weight(chromosome)?;
                        score(evaluator)
                    },
                )
                .collect::<Result<Vec<F>>>()?
        } else {
            let mut evaluator = network.clone();
            self.individuals
                .chunks(length)
                .map(|chromosome| {
                    evaluator.set_weight(chromosome)?;
                    score(&mut evaluator)
                })
                .collect::<Result<Vec<F>>>()?
        };

        self.evaluate(&scores)
    }

    /// Breeds the next generation in place.
    ///
    /// Candidates are ranked by descending fitness (ties by ascending index).
    /// The top `elite_count` chromosomes are copied unchanged into the first
    /// rows; every remaining row is the BLX child of two roulette picks from
    /// the non-elite candidates. Afterwards the generation counter grows by
    /// one and the population must be evaluated again.
    ///
    /// # Errors
    ///
    /// - `GeneticError::Configuration` if the individuals are unset or have
    ///   not been evaluated since the last step.
    /// - `GeneticError::FitnessCalculation` if the selection weights overflow
    ///   the fitness type. Nothing is modified in that case.
    #[instrument(level = "debug", skip(self), fields(generation = self.generation))]
    pub fn generate_next_generation(&mut self) -> Result<()> {
        let options = *self.configured()?;
        self.require_individuals()?;
        if !self.evaluated {
            return Err(GeneticError::Configuration(
                "Population must be evaluated before breeding the next generation".to_string(),
            ));
        }

        let length = options.chromosome_length();
        let elite_count = options.elite_count();

        rank_by_fitness(&self.fitnesses, &mut self.ranking);
        let wheel = RouletteWheel::new(&self.fitnesses, &self.ranking[elite_count..])?;
        let crossover = BlendCrossover::new(options.gene_min(), options.gene_max());

        copy_elites(
            &self.ranking,
            elite_count,
            length,
            &self.individuals,
            &mut self.next_individuals,
        );

        for child in self
            .next_individuals
            .chunks_exact_mut(length)
            .skip(elite_count)
        {
            let first = wheel.select(&mut self.rng) * length;
            let second = wheel.select(&mut self.rng) * length;
            crossover.crossover(
                &self.individuals[first..first + length],
                &self.individuals[second..second + length],
                child,
                &mut self.rng,
            );
        }

        let best = self.fitnesses[self.ranking[0]];
        let worst = self.fitnesses[self.ranking[self.ranking.len() - 1]];

        std::mem::swap(&mut self.individuals, &mut self.next_individuals);
        self.generation += 1;
        self.evaluated = false;

        debug!(
            generation = self.generation,
            best = %best,
            worst = %worst,
            "generation bred"
        );
        Ok(())
    }

    /// Index and fitness of the best evaluated candidate; the lowest index
    /// wins ties.
    ///
    /// # Errors
    ///
    /// Returns `GeneticError::Configuration` unless the current generation
    /// has been evaluated.
    pub fn best(&self) -> Result<(usize, F)> {
        if !self.evaluated {
            return Err(GeneticError::Configuration(
                "Population has not been evaluated".to_string(),
            ));
        }
        let mut best = (0, self.fitnesses[0]);
        for (index, &fitness) in self.fitnesses.iter().enumerate().skip(1) {
            if fitness > best.1 {
                best = (index, fitness);
            }
        }
        Ok(best)
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population_size(&self) -> usize {
        self.options.map_or(0, |options| options.population_size())
    }

    pub fn chromosome_length(&self) -> usize {
        self.options.map_or(0, |options| options.chromosome_length())
    }

    pub fn gene_min(&self) -> G {
        self.options.map_or(G::ZERO, |options| options.gene_min())
    }

    pub fn gene_max(&self) -> G {
        self.options.map_or(G::ZERO, |options| options.gene_max())
    }

    pub fn elite_count(&self) -> usize {
        self.options.map_or(0, |options| options.elite_count())
    }

    /// The options of the last successful reset, with the generation counter
    /// as it was at that reset.
    pub fn options(&self) -> Result<&PopulationOptions<G>> {
        self.configured()
    }

    /// The whole individual matrix, row-major.
    pub fn individuals(&self) -> &[G] {
        &self.individuals
    }

    /// The chromosome in row `index`.
    pub fn individual(&self, index: usize) -> Result<&[G]> {
        let population_size = self.population_size();
        if index >= population_size {
            return Err(GeneticError::OutOfBounds(format!(
                "Individual index {} out of range for population of {}",
                index, population_size
            )));
        }
        let length = self.chromosome_length();
        Ok(&self.individuals[index * length..(index + 1) * length])
    }

    /// Fitness values as last recorded; stale unless [`is_evaluated`](Self::is_evaluated).
    pub fn fitnesses(&self) -> &[F] {
        &self.fitnesses
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn has_individuals(&self) -> bool {
        self.individuals_set
    }

    fn configured(&self) -> Result<&PopulationOptions<G>> {
        self.options.as_ref().ok_or_else(|| {
            GeneticError::Configuration("Population must be reset before use".to_string())
        })
    }

    fn require_individuals(&self) -> Result<()> {
        self.configured()?;
        if !self.individuals_set {
            return Err(GeneticError::Configuration(
                "Individuals must be set before evaluation or breeding".to_string(),
            ));
        }
        Ok(())
    }
}

impl<G: Scalar, F: Scalar> Default for Population<G, F> {
    fn default() -> Self {
        Self::new()
    }
}
