use tracing::trace;

use crate::error::{GeneticError, OptionExt, Result};
use crate::numeric::Scalar;
use crate::rng::RandomNumberGenerator;

/// Fitness-proportionate selection over the non-elite ranked candidates.
///
/// Fitness values may be zero or negative, so every candidate's weight is
/// shifted by `base = 1 - worst`, which makes the worst candidate weigh
/// exactly 1 and every other candidate more.
///
/// # Examples
///
/// ```
/// use gannet::rng::RandomNumberGenerator;
/// use gannet::selection::RouletteWheel;
///
/// let fitnesses = [-3, 0, 4];
/// // ranked by descending fitness, no elites
/// let candidates = [2, 1, 0];
/// let wheel = RouletteWheel::new(&fitnesses, &candidates)?;
/// assert_eq!(wheel.base(), 4);
/// assert_eq!(wheel.sum(), 8 + 4 + 1);
///
/// let mut rng = RandomNumberGenerator::from_seed(9);
/// assert!(candidates.contains(&wheel.select(&mut rng)));
/// # Ok::<(), gannet::error::GeneticError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RouletteWheel<'a, F: Scalar> {
    fitnesses: &'a [F],
    /// Candidate indices in rank order; the last one is the worst.
    candidates: &'a [usize],
    base: F,
    sum: F,
}

impl<'a, F: Scalar> RouletteWheel<'a, F> {
    /// # Errors
    ///
    /// - `GeneticError::EmptyPopulation` if there are no candidates.
    /// - `GeneticError::FitnessCalculation` if the shifted weights or their sum
    ///   overflow `F` (or stop being finite for reals).
    pub fn new(fitnesses: &'a [F], candidates: &'a [usize]) -> Result<Self> {
        let &worst_index = candidates
            .last()
            .ok_or_else_genetic(|| GeneticError::EmptyPopulation)?;
        let worst = fitnesses[worst_index];
        let base = F::ONE.checked_sub(worst).ok_or_else(|| {
            GeneticError::FitnessCalculation(format!(
                "Fitness {} is too low to shift into a positive selection weight",
                worst
            ))
        })?;

        let mut sum = F::ZERO;
        for &index in candidates {
            sum = fitnesses[index]
                .checked_add(base)
                .and_then(|weight| sum.checked_add(weight))
                .ok_or_else(|| {
                    GeneticError::FitnessCalculation(
                        "Sum of selection weights overflows the fitness type".to_string(),
                    )
                })?;
        }

        Ok(Self {
            fitnesses,
            candidates,
            base,
            sum,
        })
    }

    pub fn base(&self) -> F {
        self.base
    }

    pub fn sum(&self) -> F {
        self.sum
    }

    /// Selection weight of candidate `index`.
    pub fn weight(&self, index: usize) -> F {
        self.fitnesses[index].saturating_add(self.base)
    }

    /// Spins the wheel once and returns the chosen candidate index.
    pub fn select(&self, rng: &mut RandomNumberGenerator) -> usize {
        let r = rng.uniform(F::ZERO, self.sum);
        let chosen = self.pick(r);
        trace!(r = %r, chosen, "roulette pick");
        chosen
    }

    /// Walks the candidates, subtracting each weight from `r`, and returns the
    /// first candidate at which `r` drops to zero or below.
    pub(crate) fn pick(&self, mut r: F) -> usize {
        for &index in self.candidates {
            r = r.saturating_sub(self.weight(index));
            if r <= F::ZERO {
                return index;
            }
        }
        // Only reachable through real rounding; the worst candidate absorbs it.
        self.candidates[self.candidates.len() - 1]
    }
}
