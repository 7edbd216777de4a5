//! Seed routes for the initial GA population.

use crate::instance::Problem;
use crate::precompute::DistanceCache;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand::seq::index;

pub trait ConstructionHeuristic {
    /// Permutation of the target cities `1..N`
    fn construct(&self, problem: &Problem, cache: &DistanceCache) -> Vec<usize>;
    fn name(&self) -> &str;
}

/// Nearest Neighbor Heuristic
///
/// Chains cities greedily from the depot by shortest-path distance.
pub struct NearestNeighborHeuristic;

impl NearestNeighborHeuristic {
    pub fn new() -> Self {
        NearestNeighborHeuristic
    }
}

impl Default for NearestNeighborHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for NearestNeighborHeuristic {
    fn construct(&self, _problem: &Problem, cache: &DistanceCache) -> Vec<usize> {
        let n = cache.num_cities();
        let mut route = Vec::with_capacity(n.saturating_sub(1));
        let mut visited = vec![false; n];
        let mut current = 0;
        if n > 0 {
            visited[0] = true;
        }

        while route.len() + 1 < n {
            let nearest = (1..n)
                .filter(|&c| !visited[c])
                .min_by_key(|&c| OrderedFloat(cache.distance(current, c)));

            match nearest {
                Some(next) => {
                    visited[next] = true;
                    route.push(next);
                    current = next;
                }
                None => break,
            }
        }

        route
    }

    fn name(&self) -> &str {
        "NearestNeighbor"
    }
}

/// Sweep Algorithm
///
/// Sorts cities by polar angle around the depot position.
pub struct SweepHeuristic {
    /// Starting angle for the sweep
    pub start_angle: f64,
}

impl SweepHeuristic {
    pub fn new() -> Self {
        SweepHeuristic { start_angle: 0.0 }
    }

    pub fn with_start_angle(angle: f64) -> Self {
        SweepHeuristic { start_angle: angle }
    }

    /// Polar angle from the depot, shifted by the start angle into [0, 2π)
    fn polar_angle(&self, problem: &Problem, city: usize) -> f64 {
        let (x0, y0) = problem.position(0);
        let (x, y) = problem.position(city);
        let normalized = (y - y0).atan2(x - x0) - self.start_angle;
        normalized.rem_euclid(2.0 * std::f64::consts::PI)
    }
}

impl Default for SweepHeuristic {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstructionHeuristic for SweepHeuristic {
    fn construct(&self, problem: &Problem, _cache: &DistanceCache) -> Vec<usize> {
        let mut cities: Vec<usize> = (1..problem.num_cities()).collect();
        cities.sort_by_key(|&c| OrderedFloat(self.polar_angle(problem, c)));
        cities
    }

    fn name(&self) -> &str {
        "Sweep"
    }
}

/// Copy of `route` with `len / 3` swaps of distinct random positions
pub fn perturb<R: Rng + ?Sized>(route: &[usize], rng: &mut R) -> Vec<usize> {
    let mut perturbed = route.to_vec();
    if perturbed.len() < 2 {
        return perturbed;
    }

    for _ in 0..perturbed.len() / 3 {
        let picked = index::sample(rng, perturbed.len(), 2);
        perturbed.swap(picked.index(0), picked.index(1));
    }

    perturbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{City, Edge};
    use rand_chacha::ChaCha8Rng;

    fn create_test_instance() -> Problem {
        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, 0.0, 1.0, 5.0),
            City::new(2, 1.0, 0.0, 5.0),
            City::new(3, -1.0, 0.0, 5.0),
            City::new(4, 2.0, 0.0, 5.0),
        ];
        let edges = vec![
            Edge::new(0, 1, 1.0),
            Edge::new(0, 2, 1.0),
            Edge::new(0, 3, 1.0),
            Edge::new(2, 4, 1.0),
            Edge::new(1, 4, 3.0),
        ];
        Problem::new("cross", 1.0, 1.0, cities, edges).unwrap()
    }

    #[test]
    fn test_sweep_orders_by_angle() {
        let problem = create_test_instance();
        let cache = DistanceCache::new(&problem).unwrap();

        // Angles: 2 and 4 at 0, 1 at π/2, 3 at π
        let route = SweepHeuristic::new().construct(&problem, &cache);
        assert_eq!(route, vec![2, 4, 1, 3]);

        let shifted = SweepHeuristic::with_start_angle(std::f64::consts::FRAC_PI_4)
            .construct(&problem, &cache);
        assert_eq!(shifted, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_nearest_neighbor() {
        let problem = create_test_instance();
        let cache = DistanceCache::new(&problem).unwrap();

        let route = NearestNeighborHeuristic::new().construct(&problem, &cache);
        assert_eq!(route.len(), 4);
        assert_eq!(route[0], 1);
        // From 1: 4 is at 3.0 via the direct edge, 2 and 3 at 2.0 via the depot
        assert_eq!(route[1], 2);
        assert_eq!(route[2], 4);
        assert_eq!(route[3], 3);
    }

    #[test]
    fn test_perturb_keeps_cities() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let base: Vec<usize> = (1..=9).collect();
        let perturbed = perturb(&base, &mut rng);

        let mut sorted = perturbed.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, base);
        assert_eq!(perturb(&[5], &mut rng), vec![5]);
    }
}
