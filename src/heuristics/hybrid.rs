//! Hybrid ACS with Inver-Over refinement and trip-count optimization.
//!
//! Fast ants build single-trip tours under the ACS rule and are costed
//! without path expansion. The best tour of each iteration may be refined by
//! Inver-Over moves against recent iteration bests, then reinforces the
//! matrix. Once the colony is done, the best tour is cut into trips when the
//! load exponent makes that worthwhile.

use crate::heuristics::ant::FastAnt;
use crate::heuristics::inver_over::inver_over;
use crate::heuristics::pheromone::PheromoneMatrix;
use crate::heuristics::trip_optimizer::{TripOptimizer, TripPlan};
use crate::precompute::DistanceCache;
use crate::solution::Solution;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Hybrid ACO configuration parameters
#[derive(Debug, Clone)]
pub struct HybridConfig {
    /// Number of ants
    pub num_ants: usize,
    /// Number of iterations
    pub max_iterations: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Exploitation probability (q0 in ACS)
    pub q0: f64,
    /// Local pheromone decay
    pub rho_local: f64,
    /// Global evaporation rate
    pub rho_global: f64,
    /// Initial pheromone level, also the local update target
    pub initial_pheromone: f64,
    pub tau_min: f64,
    pub tau_max: f64,
    /// Chance of refining the iteration best with Inver-Over
    pub inver_over_prob: f64,
    /// Inver-Over moves per refinement
    pub inver_over_moves: usize,
    /// Chance that a move follows its reference tour
    pub inver_over_ref_prob: f64,
    /// Recent iteration bests kept as Inver-Over references
    pub population_capacity: usize,
    /// Cut the final tour into trips when beta > 1
    pub optimize_trips: bool,
    /// Largest trip count tried by the optimizer
    pub max_trips: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for HybridConfig {
    fn default() -> Self {
        HybridConfig {
            num_ants: 20,
            max_iterations: 50,
            alpha: 1.0,
            beta: 2.5,
            q0: 0.9,
            rho_local: 0.1,
            rho_global: 0.1,
            initial_pheromone: 0.1,
            tau_min: 0.01,
            tau_max: 10.0,
            inver_over_prob: 0.5,
            inver_over_moves: 15,
            inver_over_ref_prob: 0.85,
            population_capacity: 20,
            optimize_trips: true,
            max_trips: 15,
            seed: 42,
        }
    }
}

/// Cost of a tour served as one trip, depot entries skipped
pub fn evaluate_tour_fast(tour: &[usize], gold: &[f64], cache: &DistanceCache) -> f64 {
    let mut total_cost = 0.0;
    let mut current = 0;
    let mut load = 0.0;

    for &city in tour.iter().filter(|&&c| c != 0) {
        total_cost += cache.cost(current, city, load);
        load += gold[city];
        current = city;
    }

    total_cost + cache.cost(current, 0, load)
}

/// Keep the refined tour unless it costs more than the current one
fn accept_refinement(
    tour: Vec<usize>,
    cost: f64,
    refined: Vec<usize>,
    gold: &[f64],
    cache: &DistanceCache,
) -> (Vec<usize>, f64) {
    let refined_cost = evaluate_tour_fast(&refined, gold, cache);
    if refined_cost <= cost {
        (refined, refined_cost)
    } else {
        (tour, cost)
    }
}

/// Hybrid ACS solver
pub struct HybridACO<'a> {
    config: HybridConfig,
    cache: &'a DistanceCache,
    pheromone: PheromoneMatrix,
    population: VecDeque<Vec<usize>>,
    best_tour: Vec<usize>,
    best_gold: Vec<f64>,
    best_cost: f64,
    rng: ChaCha8Rng,
}

impl<'a> HybridACO<'a> {
    pub fn new(cache: &'a DistanceCache, config: HybridConfig) -> Self {
        let pheromone = PheromoneMatrix::new_acs(
            cache.num_cities(),
            config.initial_pheromone,
            config.tau_min,
            config.tau_max,
        );
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut best_tour = vec![0];
        best_tour.extend(cache.cities());
        best_tour.push(0);

        HybridACO {
            config,
            cache,
            pheromone,
            population: VecDeque::new(),
            best_tour,
            best_gold: cache.gold_table().to_vec(),
            best_cost: f64::INFINITY,
            rng,
        }
    }

    pub fn pheromone(&self) -> &PheromoneMatrix {
        &self.pheromone
    }

    /// Inver-Over moves against random members of the recent-best population
    fn refine(&mut self, tour: &[usize]) -> Vec<usize> {
        let mut refined = tour.to_vec();
        for _ in 0..self.config.inver_over_moves {
            let idx = self.rng.gen_range(0..self.population.len());
            refined = inver_over(
                &refined,
                Some(self.population[idx].as_slice()),
                self.config.inver_over_ref_prob,
                &mut self.rng,
            );
        }
        refined
    }

    fn run_iteration(&mut self, iteration: usize) {
        let ant = FastAnt::new(self.cache, self.config.alpha, self.config.beta, self.config.q0);
        let mut iteration_best: Option<(Vec<usize>, Vec<f64>, f64)> = None;

        for _ in 0..self.config.num_ants {
            let (tour, gold) = ant.construct(&mut self.pheromone, self.config.rho_local, &mut self.rng);
            let cost = evaluate_tour_fast(&tour, &gold, self.cache);

            if iteration_best.as_ref().map_or(true, |(_, _, best)| cost < *best) {
                iteration_best = Some((tour, gold, cost));
            }
        }

        let (mut tour, gold, mut cost) = match iteration_best {
            Some(best) => best,
            None => return,
        };

        if self.rng.gen::<f64>() < self.config.inver_over_prob && !self.population.is_empty() {
            let refined = self.refine(&tour);
            let previous = cost;
            (tour, cost) = accept_refinement(tour, cost, refined, &gold, self.cache);
            if cost < previous {
                log::debug!("Hybrid iteration {}: Inver-Over {:.2} -> {:.2}", iteration, previous, cost);
            }
        }

        self.population.push_back(tour.clone());
        while self.population.len() > self.config.population_capacity {
            self.population.pop_front();
        }

        self.pheromone.global_update(&tour, cost, self.config.rho_global);

        if cost < self.best_cost {
            self.best_cost = cost;
            self.best_tour = tour;
            self.best_gold = gold;
            log::info!("Hybrid iteration {}: new best {:.2}", iteration, cost);
        }
    }

    /// Final answer for the best tour: the trip-optimized plan when beta > 1
    /// and it walks cheaper, otherwise all cities in one trip
    fn final_solution(&self) -> Solution {
        let cities: Vec<usize> = self.best_tour.iter().cloned().filter(|&c| c != 0).collect();
        let single = TripPlan::single_trip(&cities, &self.best_gold, self.cache);
        let mut solution = Solution::from_trace(single.steps(self.cache, &self.best_gold), self.cache, "HybridACO");

        if self.config.optimize_trips && self.cache.beta() > 1.0 {
            let optimized = TripOptimizer::new(self.config.max_trips)
                .optimize(&cities, &self.best_gold, self.cache);
            let candidate = Solution::from_trace(optimized.steps(self.cache, &self.best_gold), self.cache, "HybridACO");
            log::info!("Trip optimization: {} trips, cost {:.2}", optimized.num_trips(), candidate.cost);
            if candidate.cost < solution.cost {
                solution = candidate;
            }
        }

        solution
    }

    /// Run the hybrid algorithm
    pub fn run(&mut self) -> Solution {
        let start = std::time::Instant::now();
        log::info!("Hybrid ACO: {} ants, {} iterations", self.config.num_ants, self.config.max_iterations);

        for iteration in 0..self.config.max_iterations {
            self.run_iteration(iteration);
            if iteration % 10 == 0 && iteration > 0 {
                log::debug!("Hybrid iteration {}: best {:.2}", iteration, self.best_cost);
            }
        }

        let mut solution = self.final_solution();
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.config.max_iterations);
        log::info!("Hybrid ACO finished: cost {:.2}", solution.cost);

        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{City, Edge, Problem};

    fn create_star_instance(beta: f64) -> Problem {
        let mut cities = vec![City::new(0, 0.0, 0.0, 0.0)];
        let mut edges = Vec::new();
        for i in 1..=5 {
            let angle = i as f64 * 2.0 * std::f64::consts::PI / 5.0;
            cities.push(City::new(i, angle.cos(), angle.sin(), 10.0));
            edges.push(Edge::new(0, i, 1.0));
        }
        Problem::new("star", 1.0, beta, cities, edges).unwrap()
    }

    /// Star with a rim, so no shortest path between two cities crosses the depot
    fn create_wheel_instance(beta: f64) -> Problem {
        let mut cities = vec![City::new(0, 0.0, 0.0, 0.0)];
        let mut edges = Vec::new();
        for i in 1..=5 {
            let angle = i as f64 * 2.0 * std::f64::consts::PI / 5.0;
            cities.push(City::new(i, angle.cos(), angle.sin(), 10.0));
            edges.push(Edge::new(0, i, 1.0));
            edges.push(Edge::new(i, i % 5 + 1, 0.9));
        }
        Problem::new("wheel", 1.0, beta, cities, edges).unwrap()
    }

    fn small_config() -> HybridConfig {
        HybridConfig { num_ants: 5, max_iterations: 10, ..Default::default() }
    }

    #[test]
    fn test_evaluate_tour_fast() {
        let cache = DistanceCache::new(&create_star_instance(1.0)).unwrap();
        // 1 + (2 + 20) + (1 + 20) with linear cost
        let cost = evaluate_tour_fast(&[0, 1, 2, 0], cache.gold_table(), &cache);
        assert!((cost - 44.0).abs() < 1e-9);
        assert_eq!(evaluate_tour_fast(&[0, 0], cache.gold_table(), &cache), 0.0);
    }

    #[test]
    fn test_hybrid_linear_cost() {
        let problem = Problem::generate(15, 0.3, 1.0, 1.0, 5).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let solution = HybridACO::new(&cache, small_config()).run();
        assert!(solution.verify(&cache).is_ok());
        assert!((solution.walk_cost(&problem) - solution.cost).abs() < 1e-6 * solution.cost);
    }

    #[test]
    fn test_accept_refinement() {
        let cache = DistanceCache::new(&create_star_instance(1.0)).unwrap();
        let gold = vec![0.0, 10.0, 1.0, 0.0, 0.0, 0.0];

        // 1 + (2 + 20) + (1 + 11) against 1 + (2 + 2) + (1 + 11)
        let heavy_first = vec![0, 1, 2, 0];
        let light_first = vec![0, 2, 1, 0];

        let (tour, cost) = accept_refinement(heavy_first.clone(), 35.0, light_first.clone(), &gold, &cache);
        assert_eq!(tour, light_first);
        assert!((cost - 17.0).abs() < 1e-9);

        let (tour, cost) = accept_refinement(light_first.clone(), 17.0, heavy_first.clone(), &gold, &cache);
        assert_eq!(tour, light_first);
        assert_eq!(cost, 17.0);

        // Ties go to the refined tour
        let (tour, _) = accept_refinement(heavy_first, 17.0, light_first.clone(), &gold, &cache);
        assert_eq!(tour, light_first);
    }

    #[test]
    fn test_hybrid_cost_is_trace_cost() {
        // At beta = 1 the best tour of seed 5 crosses the depot inside its trip
        for beta in [1.0, 2.5] {
            let problem = Problem::generate(15, 0.3, 1.0, beta, 5).unwrap();
            let cache = DistanceCache::new(&problem).unwrap();

            let solution = HybridACO::new(&cache, small_config()).run();
            assert!(solution.verify(&cache).is_ok());
            assert!((solution.trace_cost(&cache) - solution.cost).abs() < 1e-9 * solution.cost.max(1.0));
        }
    }

    #[test]
    fn test_hybrid_heavy_beta_optimizes_trips() {
        let cache = DistanceCache::new(&create_wheel_instance(3.0)).unwrap();
        let solution = HybridACO::new(&cache, small_config()).run();

        assert!(solution.verify(&cache).is_ok());

        // Same colony, only the final plan differs
        let single = HybridACO::new(&cache, HybridConfig { optimize_trips: false, ..small_config() }).run();
        assert!(single.verify(&cache).is_ok());
        assert!(solution.cost < single.cost);
    }

    #[test]
    fn test_hybrid_is_reproducible() {
        let problem = Problem::generate(12, 0.3, 1.0, 2.0, 8).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let mut first = HybridACO::new(&cache, small_config());
        let a = first.run();
        let b = HybridACO::new(&cache, small_config()).run();
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.steps, b.steps);

        let pheromone = first.pheromone();
        for i in 0..pheromone.size() {
            assert_eq!(pheromone.get(i, i), 0.0);
            for j in 0..pheromone.size() {
                if i != j {
                    assert!(pheromone.get(i, j) >= 0.01 && pheromone.get(i, j) <= 10.0);
                }
            }
        }
    }

    #[test]
    fn test_zero_iterations_still_valid() {
        let cache = DistanceCache::new(&create_star_instance(2.0)).unwrap();
        let config = HybridConfig { max_iterations: 0, ..Default::default() };
        let solution = HybridACO::new(&cache, config).run();
        assert!(solution.verify(&cache).is_ok());
    }
}
