//! # BlendCrossover
//!
//! BLX-α crossover with α fixed by the half-difference rule: for every gene
//! position the child is drawn uniformly from the parents' interval widened by
//! half their distance on each side, clamped to the configured gene bounds.
//! The half-width never drops below [`Scalar::min_spread`], so identical
//! parents still produce a small jitter instead of an exact copy.

use crate::numeric::{max_of, min_of, Scalar};
use crate::rng::RandomNumberGenerator;

#[derive(Debug, Clone, Copy)]
pub struct BlendCrossover<G: Scalar> {
    gene_min: G,
    gene_max: G,
}

impl<G: Scalar> BlendCrossover<G> {
    /// Both bounds are inclusive; callers guarantee `gene_min <= gene_max`.
    pub fn new(gene_min: G, gene_max: G) -> Self {
        Self { gene_min, gene_max }
    }

    /// Closed interval the child gene is drawn from.
    pub fn interval(&self, a: G, b: G) -> (G, G) {
        let mut diff = G::half_distance(a, b);
        if diff < G::min_spread() {
            diff = G::min_spread();
        }
        let low = max_of(self.gene_min, min_of(a, b).saturating_sub(diff));
        let high = min_of(self.gene_max, max_of(a, b).saturating_add(diff));
        (low, high)
    }

    /// Writes one child into `child`, gene by gene.
    ///
    /// Parent genes must lie within the bounds, which keeps every interval
    /// non-empty.
    pub fn crossover(
        &self,
        first: &[G],
        second: &[G],
        child: &mut [G],
        rng: &mut RandomNumberGenerator,
    ) {
        for ((gene, &a), &b) in child.iter_mut().zip(first).zip(second) {
            let (low, high) = self.interval(a, b);
            *gene = rng.uniform(low, high);
        }
    }
}
