//! Inver-Over operator on depot-bounded tours.
//!
//! A city `c` is picked in the working tour and a second city `c'` is taken
//! either as the successor of `c` in a reference tour or at random. The
//! segment between the two is reversed, pulling the working tour toward the
//! edges of the reference.

use rand::prelude::*;

/// Chance of following the reference tour used by the local search
pub const DEFAULT_REF_PROB: f64 = 0.85;

/// One Inver-Over move.
///
/// `tour` starts and ends at the depot; tours with fewer than four entries
/// are returned unchanged.
pub fn inver_over<R: Rng + ?Sized>(
    tour: &[usize],
    reference: Option<&[usize]>,
    prob_ref: f64,
    rng: &mut R,
) -> Vec<usize> {
    if tour.len() < 4 {
        return tour.to_vec();
    }

    let last = tour.len() - 1;
    let mut interior = tour[1..last].to_vec();
    let n = interior.len();

    let c_idx = rng.gen_range(0..n);
    let c = interior[c_idx];
    let random_other = |rng: &mut R| interior[(c_idx + rng.gen_range(1..n)) % n];

    let c_prime = match reference {
        Some(reference) if reference.len() > 2 && rng.gen::<f64>() < prob_ref => {
            let ref_cities = &reference[1..reference.len() - 1];
            match ref_cities.iter().position(|&x| x == c) {
                Some(pos) => ref_cities[(pos + 1) % ref_cities.len()],
                None => random_other(rng),
            }
        }
        _ => random_other(rng),
    };

    let c_prime_idx = match interior.iter().position(|&x| x == c_prime) {
        Some(idx) if idx != c_idx => idx,
        _ => return tour.to_vec(),
    };

    let (start, end) = (c_idx.min(c_prime_idx), c_idx.max(c_prime_idx));
    interior[start..=end].reverse();

    let mut result = Vec::with_capacity(tour.len());
    result.push(tour[0]);
    result.extend(interior);
    result.push(tour[last]);
    result
}

/// Apply Inver-Over `iterations` times, each against a population tour that
/// differs from the current one (no reference with fewer than two tours)
pub fn inver_over_local_search<R: Rng + ?Sized>(
    tour: &[usize],
    population: &[Vec<usize>],
    iterations: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut current = tour.to_vec();

    for _ in 0..iterations {
        let reference = if population.len() > 1 {
            let others: Vec<&Vec<usize>> = population.iter().filter(|t| **t != current).collect();
            others.choose(rng).map(|t| t.as_slice())
        } else {
            None
        };

        current = inver_over(&current, reference, DEFAULT_REF_PROB, rng);
    }

    current
}
