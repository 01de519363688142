use std::cmp::Ordering;

use crate::numeric::Scalar;

/// Fills `ranking` with candidate indices ordered by descending fitness.
///
/// The sort is stable: candidates with equal fitness keep ascending index
/// order, so ranking the same fitness vector twice yields the same
/// permutation. NaN values, which `evaluate` normally rejects, rank last.
pub fn rank_by_fitness<F: Scalar>(fitnesses: &[F], ranking: &mut Vec<usize>) {
    ranking.clear();
    ranking.extend(0..fitnesses.len());
    ranking.sort_by(|&a, &b| {
        let (fa, fb) = (fitnesses[a], fitnesses[b]);
        fb.partial_cmp(&fa).unwrap_or_else(|| {
            // Handle NaN values by considering them less than any other value
            if fa.partial_cmp(&fa).is_none() {
                Ordering::Greater
            } else if fb.partial_cmp(&fb).is_none() {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        })
    });
}

/// Copies the chromosomes of the first `elite_count` ranked candidates,
/// unchanged and in rank order, into the first rows of `next`.
pub fn copy_elites<G: Copy>(
    ranking: &[usize],
    elite_count: usize,
    chromosome_length: usize,
    current: &[G],
    next: &mut [G],
) {
    for (row, &index) in ranking.iter().take(elite_count).enumerate() {
        let source = index * chromosome_length;
        let target = row * chromosome_length;
        next[target..target + chromosome_length]
            .copy_from_slice(&current[source..source + chromosome_length]);
    }
}
