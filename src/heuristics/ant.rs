//! Ant tour construction.
//!
//! [`Ant`] is the plain colony's explorer: pure roulette selection and a
//! threshold rule for going home to unload. [`FastAnt`] follows the ACS
//! pseudo-random-proportional rule and applies the local pheromone update
//! right after every move.

use crate::heuristics::pheromone::PheromoneMatrix;
use crate::precompute::DistanceCache;
use crate::solution::Step;
use rand::prelude::*;

/// Route built by a plain ant
#[derive(Debug, Clone, Default)]
pub struct AntSolution {
    /// Visited cities with their gold; `(0, 0)` marks a depot return
    pub visits: Vec<Step>,
    /// Node sequence used for pheromone deposits, starting and ending at 0
    pub visited_order: Vec<usize>,
}

/// Roulette wheel over `(city, weight)`; `None` when the mass is unusable
fn roulette<R: Rng + ?Sized>(candidates: &[(usize, f64)], total: f64, rng: &mut R) -> Option<usize> {
    let mut pick = rng.gen::<f64>() * total;
    for &(city, weight) in candidates {
        pick -= weight;
        if pick <= 0.0 {
            return Some(city);
        }
    }
    candidates.last().map(|&(city, _)| city)
}

fn uniform<R: Rng + ?Sized>(candidates: &[(usize, f64)], rng: &mut R) -> Option<usize> {
    candidates.choose(rng).map(|&(city, _)| city)
}

/// Plain ACO ant
pub struct Ant<'a> {
    cache: &'a DistanceCache,
    /// Pheromone importance
    pub alpha: f64,
    /// Heuristic importance
    pub beta: f64,
    /// Numerator of the depot-return threshold
    pub return_threshold: f64,
    /// Exponent applied to the instance beta in the return threshold
    pub return_exponent: f64,
}

impl<'a> Ant<'a> {
    pub fn new(cache: &'a DistanceCache, alpha: f64, beta: f64) -> Self {
        Ant { cache, alpha, beta, return_threshold: 100.0, return_exponent: 1.2 }
    }

    pub fn with_return_rule(mut self, threshold: f64, exponent: f64) -> Self {
        self.return_threshold = threshold;
        self.return_exponent = exponent;
        self
    }

    /// Attractiveness of `city`: gold over distance, damped by the load
    pub fn heuristic(&self, current: usize, city: usize, load: f64) -> f64 {
        let distance = self.cache.distance(current, city);
        if distance == 0.0 {
            return 0.0;
        }
        self.cache.gold(city) / (distance * (1.0 + load / 1000.0))
    }

    /// Roulette choice among unvisited cities, uniform if the mass degenerates
    pub fn select_next_city<R: Rng + ?Sized>(
        &self,
        current: usize,
        visited: &[bool],
        load: f64,
        pheromone: &PheromoneMatrix,
        rng: &mut R,
    ) -> Option<usize> {
        let candidates: Vec<(usize, f64)> = (1..self.cache.num_cities())
            .filter(|&c| !visited[c])
            .map(|c| {
                let tau = pheromone.get(current, c).powf(self.alpha);
                let eta = self.heuristic(current, c, load);
                let weight = if eta > 0.0 { tau * eta.powf(self.beta) } else { tau };
                (c, weight)
            })
            .collect();

        if candidates.is_empty() {
            return None;
        }

        let total: f64 = candidates.iter().map(|&(_, w)| w).sum();
        if total > 0.0 && total.is_finite() {
            roulette(&candidates, total, rng)
        } else {
            uniform(&candidates, rng)
        }
    }

    /// Go home first when carrying the load to `next` costs more than
    /// `return_threshold / beta^return_exponent`
    pub fn should_return_to_depot(&self, current: usize, next: usize, load: f64) -> bool {
        if load == 0.0 {
            return false;
        }
        let threshold = self.return_threshold / self.cache.beta().powf(self.return_exponent);
        self.cache.load_penalty(current, next, load) > threshold
    }

    /// Build a complete route collecting all gold
    pub fn construct<R: Rng + ?Sized>(&self, pheromone: &PheromoneMatrix, rng: &mut R) -> AntSolution {
        let n = self.cache.num_cities();
        let mut visited = vec![false; n];
        let mut solution = AntSolution {
            visits: Vec::with_capacity(n),
            visited_order: vec![0],
        };

        let mut current = 0;
        let mut load = 0.0;

        while let Some(next) = self.select_next_city(current, &visited, load, pheromone, rng) {
            if self.should_return_to_depot(current, next, load) {
                solution.visits.push(Step::depot());
                solution.visited_order.push(0);
                current = 0;
                load = 0.0;
            }

            let gold = self.cache.gold(next);
            solution.visits.push(Step::new(next, gold));
            solution.visited_order.push(next);
            visited[next] = true;
            load += gold;
            current = next;
        }

        solution.visited_order.push(0);
        solution
    }
}

/// ACS ant for the hybrid colony
pub struct FastAnt<'a> {
    cache: &'a DistanceCache,
    pub alpha: f64,
    pub beta: f64,
    /// Probability of exploiting the best candidate
    pub q0: f64,
}

impl<'a> FastAnt<'a> {
    pub fn new(cache: &'a DistanceCache, alpha: f64, beta: f64, q0: f64) -> Self {
        FastAnt { cache, alpha, beta, q0 }
    }

    /// `tau^alpha * eta^beta` for every unvisited city
    fn candidate_values(&self, current: usize, visited: &[bool], load: f64, pheromone: &PheromoneMatrix) -> Vec<(usize, f64)> {
        let n = self.cache.num_cities();
        let weight_factor = 1.0 + load / (n as f64 + 1e-6);

        (1..n)
            .filter(|&c| !visited[c])
            .map(|c| {
                let eta = (self.cache.gold(c) + 1.0) / (self.cache.distance(current, c) * weight_factor + 1e-6);
                let tau = pheromone.get(current, c);
                (c, tau.powf(self.alpha) * eta.powf(self.beta))
            })
            .collect()
    }

    pub fn select_next_city<R: Rng + ?Sized>(
        &self,
        current: usize,
        visited: &[bool],
        load: f64,
        pheromone: &PheromoneMatrix,
        rng: &mut R,
    ) -> Option<usize> {
        let candidates = self.candidate_values(current, visited, load, pheromone);
        if candidates.is_empty() {
            return None;
        }

        if rng.gen::<f64>() < self.q0 {
            // Exploitation, first maximum wins
            let mut best = candidates[0];
            for &(city, value) in &candidates[1..] {
                if value > best.1 {
                    best = (city, value);
                }
            }
            return Some(best.0);
        }

        let total: f64 = candidates.iter().map(|&(_, v)| v).sum();
        if total < 1e-10 || !total.is_finite() {
            uniform(&candidates, rng)
        } else {
            roulette(&candidates, total, rng)
        }
    }

    /// Single-trip tour `[0, ..., 0]` and the gold collected per city
    pub fn construct<R: Rng + ?Sized>(&self, pheromone: &mut PheromoneMatrix, rho_local: f64, rng: &mut R) -> (Vec<usize>, Vec<f64>) {
        let n = self.cache.num_cities();
        let mut visited = vec![false; n];
        let mut gold = vec![0.0; n];
        let mut tour = Vec::with_capacity(n + 1);
        tour.push(0);

        let mut current = 0;
        let mut load = 0.0;

        while let Some(next) = self.select_next_city(current, &visited, load, pheromone, rng) {
            pheromone.local_update(current, next, rho_local);

            gold[next] = self.cache.gold(next);
            load += gold[next];
            visited[next] = true;
            tour.push(next);
            current = next;
        }

        tour.push(0);
        (tour, gold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{City, Edge, Problem};
    use rand_chacha::ChaCha8Rng;

    fn create_test_instance(beta: f64) -> Problem {
        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, 1.0, 0.0, 10.0),
            City::new(2, 2.0, 0.0, 500.0),
            City::new(3, 0.0, 1.0, 20.0),
        ];
        let edges = vec![
            Edge::new(0, 1, 1.0),
            Edge::new(1, 2, 1.0),
            Edge::new(0, 3, 1.0),
        ];
        Problem::new("ants", 1.0, beta, cities, edges).unwrap()
    }

    fn check_permutation(order: &[usize], n: usize) {
        let mut cities: Vec<usize> = order.iter().cloned().filter(|&c| c != 0).collect();
        cities.sort_unstable();
        assert_eq!(cities, (1..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_plain_ant_collects_everything() {
        let cache = DistanceCache::new(&create_test_instance(2.0)).unwrap();
        let pheromone = PheromoneMatrix::new_plain(4, 1.0, 0.01);
        let ant = Ant::new(&cache, 1.0, 2.0);

        for seed in 0..10 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let solution = ant.construct(&pheromone, &mut rng);

            assert_eq!(solution.visited_order.first(), Some(&0));
            assert_eq!(solution.visited_order.last(), Some(&0));
            check_permutation(&solution.visited_order, 4);

            let gold: f64 = solution.visits.iter().map(|s| s.gold).sum();
            assert_eq!(gold, cache.total_gold());
        }
    }

    #[test]
    fn test_return_rule() {
        let cache = DistanceCache::new(&create_test_instance(2.0)).unwrap();
        let ant = Ant::new(&cache, 1.0, 2.0);

        // Threshold 100 / 2^1.2 ≈ 43.5
        assert!(!ant.should_return_to_depot(1, 2, 0.0));
        assert!(!ant.should_return_to_depot(1, 2, 5.0));
        assert!(ant.should_return_to_depot(1, 2, 10.0));
        assert!(ant.should_return_to_depot(2, 3, 5.0));
    }

    #[test]
    fn test_heuristic_values() {
        let cache = DistanceCache::new(&create_test_instance(1.0)).unwrap();
        let ant = Ant::new(&cache, 1.0, 2.0);

        assert_eq!(ant.heuristic(0, 1, 0.0), 10.0);
        assert_eq!(ant.heuristic(0, 2, 1000.0), 500.0 / (2.0 * 2.0));
        assert_eq!(ant.heuristic(2, 2, 0.0), 0.0);
    }

    #[test]
    fn test_zero_pheromone_falls_back_to_uniform() {
        let cache = DistanceCache::new(&create_test_instance(1.0)).unwrap();
        let pheromone = PheromoneMatrix::new_plain(4, 0.0, 0.0);
        let ant = Ant::new(&cache, 1.0, 2.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let solution = ant.construct(&pheromone, &mut rng);
        check_permutation(&solution.visited_order, 4);
    }

    #[test]
    fn test_fast_ant_greedy_choice() {
        let cache = DistanceCache::new(&create_test_instance(1.0)).unwrap();
        let mut pheromone = PheromoneMatrix::new_acs(4, 0.1, 0.01, 10.0);
        // q0 = 1 always exploits; city 2 has by far the most gold
        let ant = FastAnt::new(&cache, 1.0, 2.5, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let (tour, gold) = ant.construct(&mut pheromone, 0.1, &mut rng);
        assert_eq!(tour.len(), 5);
        assert_eq!(tour[0], 0);
        assert_eq!(tour[1], 2);
        assert_eq!(tour[4], 0);
        check_permutation(&tour, 4);
        assert_eq!(gold, vec![0.0, 10.0, 500.0, 20.0]);
    }

    #[test]
    fn test_fast_ant_local_update() {
        let cache = DistanceCache::new(&create_test_instance(1.0)).unwrap();
        let mut pheromone = PheromoneMatrix::new_acs(4, 0.1, 0.01, 10.0);
        pheromone.global_update(&[0, 1, 2, 3, 0], 0.2, 0.1);
        let before = pheromone.clone();

        let ant = FastAnt::new(&cache, 1.0, 2.5, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let (tour, _) = ant.construct(&mut pheromone, 0.1, &mut rng);

        for pair in tour[..tour.len() - 1].windows(2) {
            let (i, j) = (pair[0], pair[1]);
            let expected = 0.9 * before.get(i, j) + 0.01;
            assert!((pheromone.get(i, j) - expected).abs() < 1e-12);
        }
    }
}
