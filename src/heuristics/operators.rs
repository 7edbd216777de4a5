//! Genetic operators over city permutations.
//!
//! Every operator returns a fresh [`Individual`]; parents are never touched.

use crate::heuristics::individual::Individual;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand::seq::index;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Mutation operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Swap two random positions
    Swap,
    /// Reverse a random segment
    Inversion,
    /// Move a random city to a random position
    Insert,
}

/// Relative probability of each mutation operator
#[derive(Debug, Clone, Copy)]
pub struct MutationWeights {
    pub inversion: f64,
    pub swap: f64,
    pub insert: f64,
}

impl Default for MutationWeights {
    fn default() -> Self {
        MutationWeights { inversion: 0.6, swap: 0.4, insert: 0.0 }
    }
}

impl MutationWeights {
    /// Roulette pick among the operators; inversion if all weights are zero
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> MutationKind {
        let weighted = [
            (MutationKind::Inversion, self.inversion.max(0.0)),
            (MutationKind::Swap, self.swap.max(0.0)),
            (MutationKind::Insert, self.insert.max(0.0)),
        ];
        let total: f64 = weighted.iter().map(|&(_, w)| w).sum();
        if total <= 0.0 {
            return MutationKind::Inversion;
        }

        let mut pick = rng.gen::<f64>() * total;
        for &(kind, weight) in &weighted {
            if weight <= 0.0 {
                continue;
            }
            pick -= weight;
            if pick <= 0.0 {
                return kind;
            }
        }

        weighted.iter()
            .rev()
            .find(|&&(_, w)| w > 0.0)
            .map_or(MutationKind::Inversion, |&(k, _)| k)
    }
}

/// Two distinct positions in `0..n`, sorted
fn two_positions<R: Rng + ?Sized>(n: usize, rng: &mut R) -> (usize, usize) {
    let picked = index::sample(rng, n, 2);
    let (a, b) = (picked.index(0), picked.index(1));
    (a.min(b), a.max(b))
}

/// Order crossover (OX) with explicit cut points.
///
/// The child keeps `a[start..end]` in place. The remaining positions are
/// filled from `end` onward, wrapping around, with the cities of `b` read
/// from `end` onward in the same wrapping order, skipping those already kept.
///
/// Callers must pass parents of equal length and cuts with
/// `start <= end <= a.len()`. Debug builds panic otherwise; release builds
/// return a copy of `a`, as they do for parents shorter than two cities.
pub fn order_crossover_with_cuts(a: &[usize], b: &[usize], start: usize, end: usize) -> Vec<usize> {
    let n = a.len();
    if n < 2 {
        return a.to_vec();
    }

    debug_assert!(b.len() == n, "parents differ in length: {} and {}", n, b.len());
    debug_assert!(start <= end && end <= n, "invalid cut points ({}, {}) for length {}", start, end, n);
    if b.len() != n || start > end || end > n {
        return a.to_vec();
    }

    let mut child = vec![0; n];
    child[start..end].copy_from_slice(&a[start..end]);
    let kept: HashSet<usize> = a[start..end].iter().copied().collect();

    let mut pos = end % n;
    for k in 0..n {
        let city = b[(end + k) % n];
        if !kept.contains(&city) {
            child[pos] = city;
            pos = (pos + 1) % n;
        }
    }

    child
}

/// Order crossover with two random distinct cut points
pub fn order_crossover<R: Rng + ?Sized>(a: &Individual, b: &Individual, rng: &mut R) -> Individual {
    let n = a.len();
    if n < 2 {
        return Individual::new(a.route().to_vec());
    }

    let (start, end) = two_positions(n, rng);
    Individual::new(order_crossover_with_cuts(a.route(), b.route(), start, end))
}

/// Apply one mutation operator unconditionally
pub fn apply_mutation<R: Rng + ?Sized>(ind: &Individual, kind: MutationKind, rng: &mut R) -> Individual {
    if ind.len() < 2 {
        return ind.clone();
    }

    let (i, j) = two_positions(ind.len(), rng);
    match kind {
        MutationKind::Swap => ind.mutated(|route| route.swap(i, j)),
        MutationKind::Inversion => ind.mutated(|route| route[i..=j].reverse()),
        MutationKind::Insert => {
            // Direction of the move is random too
            let (from, to) = if rng.gen::<bool>() { (i, j) } else { (j, i) };
            ind.mutated(|route| {
                let city = route.remove(from);
                route.insert(to, city);
            })
        }
    }
}

fn gated<R: Rng + ?Sized>(ind: &Individual, rate: f64, kind: MutationKind, rng: &mut R) -> Individual {
    if rng.gen::<f64>() > rate {
        return ind.clone();
    }
    apply_mutation(ind, kind, rng)
}

/// Swap two random cities with probability `rate`
pub fn swap_mutation<R: Rng + ?Sized>(ind: &Individual, rate: f64, rng: &mut R) -> Individual {
    gated(ind, rate, MutationKind::Swap, rng)
}

/// Reverse a random segment with probability `rate`
pub fn inversion_mutation<R: Rng + ?Sized>(ind: &Individual, rate: f64, rng: &mut R) -> Individual {
    gated(ind, rate, MutationKind::Inversion, rng)
}

/// Move one random city elsewhere with probability `rate`
pub fn insert_mutation<R: Rng + ?Sized>(ind: &Individual, rate: f64, rng: &mut R) -> Individual {
    gated(ind, rate, MutationKind::Insert, rng)
}

/// Tournament selection over `k` distinct contestants.
///
/// Ties keep the first contestant drawn. Returns `None` on an empty population.
pub fn tournament_selection<'a, R: Rng + ?Sized>(
    population: &'a [Individual],
    k: usize,
    rng: &mut R,
) -> Option<&'a Individual> {
    if population.is_empty() {
        return None;
    }

    let size = k.clamp(1, population.len());
    let mut best: Option<&Individual> = None;
    for idx in index::sample(rng, population.len(), size).iter() {
        let candidate = &population[idx];
        match best {
            Some(current) if candidate.fitness() <= current.fitness() => {}
            _ => best = Some(candidate),
        }
    }

    best
}

/// The `e` fittest individuals, ties in population order
pub fn elitism_selection(population: &[Individual], e: usize) -> Vec<Individual> {
    let mut ranked: Vec<&Individual> = population.iter().collect();
    ranked.sort_by_key(|ind| Reverse(OrderedFloat(ind.fitness())));
    ranked.into_iter().take(e).cloned().collect()
}
