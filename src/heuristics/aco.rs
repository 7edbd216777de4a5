//! Ant Colony Optimization for the TTP.
//!
//! Plain Ant System: every ant builds a full route with roulette selection,
//! routes are costed by expanding every leg through the shortest paths, then
//! the whole matrix evaporates and each route deposits `Q / cost`. The best
//! route of the run gets an extra elite deposit.

use crate::heuristics::ant::{Ant, AntSolution};
use crate::heuristics::pheromone::{PheromoneMatrix, MIN_COST};
use crate::precompute::DistanceCache;
use crate::solution::{Solution, Step};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// ACO configuration parameters
#[derive(Debug, Clone)]
pub struct ACOConfig {
    /// Number of ants
    pub num_ants: usize,
    /// Number of iterations
    pub max_iterations: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Heuristic importance (beta)
    pub beta: f64,
    /// Evaporation rate (rho)
    pub evaporation_rate: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Lowest pheromone level after evaporation
    pub pheromone_floor: f64,
    /// Pheromone deposit factor
    pub q: f64,
    /// Extra deposit multiplier for the best route
    pub elite_weight: f64,
    /// Numerator of the depot-return threshold
    pub return_threshold: f64,
    /// Exponent on the instance beta in the depot-return threshold
    pub return_exponent: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for ACOConfig {
    fn default() -> Self {
        ACOConfig {
            num_ants: 50,
            max_iterations: 100,
            alpha: 1.0,
            beta: 2.0,
            evaporation_rate: 0.1,
            initial_pheromone: 1.0,
            pheromone_floor: 0.01,
            q: 100.0,
            elite_weight: 2.0,
            return_threshold: 100.0,
            return_exponent: 1.2,
            seed: 42,
        }
    }
}

/// Cost an ant route by walking every leg along its shortest path.
///
/// Depot visits unload; the final return home is added if the route does
/// not already end at the depot.
pub fn evaluate_ant_solution(solution: &AntSolution, cache: &DistanceCache) -> (f64, Vec<Step>) {
    let mut total_cost = 0.0;
    let mut steps = Vec::new();
    let mut current = 0;
    let mut load = 0.0;

    for visit in &solution.visits {
        if visit.is_depot() {
            if current != 0 {
                total_cost += cache.cost(current, 0, load);
                steps.extend(cache.path(current, 0).into_iter().skip(1).map(|node| Step::new(node, 0.0)));
                current = 0;
                load = 0.0;
            }
            continue;
        }

        total_cost += cache.cost(current, visit.city, load);
        for node in cache.path(current, visit.city).into_iter().skip(1) {
            let gold = if node == visit.city { visit.gold } else { 0.0 };
            steps.push(Step::new(node, gold));
        }
        current = visit.city;
        load += visit.gold;
    }

    if current != 0 {
        total_cost += cache.cost(current, 0, load);
        steps.extend(cache.path(current, 0).into_iter().skip(1).map(|node| Step::new(node, 0.0)));
    }

    (total_cost, steps)
}

/// Ant Colony Optimization solver
pub struct AntColonyOptimization<'a> {
    config: ACOConfig,
    cache: &'a DistanceCache,
    pheromone: PheromoneMatrix,
    best_order: Vec<usize>,
    best_steps: Vec<Step>,
    best_cost: f64,
    rng: ChaCha8Rng,
}

impl<'a> AntColonyOptimization<'a> {
    pub fn new(cache: &'a DistanceCache, config: ACOConfig) -> Self {
        let pheromone = PheromoneMatrix::new_plain(
            cache.num_cities(),
            config.initial_pheromone,
            config.pheromone_floor,
        );
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        AntColonyOptimization {
            config,
            cache,
            pheromone,
            best_order: Vec::new(),
            best_steps: Vec::new(),
            best_cost: f64::INFINITY,
            rng,
        }
    }

    pub fn pheromone(&self) -> &PheromoneMatrix {
        &self.pheromone
    }

    /// Evaporate, then let every route and the best-ever route deposit
    fn update_pheromone(&mut self, routes: &[(Vec<usize>, f64)]) {
        self.pheromone.evaporate(self.config.evaporation_rate);

        for (order, cost) in routes {
            self.pheromone.deposit(order, self.config.q / cost.max(MIN_COST));
        }

        if !self.best_order.is_empty() {
            let elite = self.config.elite_weight * self.config.q / self.best_cost.max(MIN_COST);
            self.pheromone.deposit(&self.best_order, elite);
        }
    }

    /// Run ACO algorithm
    pub fn run(&mut self) -> Solution {
        let start = std::time::Instant::now();
        log::info!("ACO: {} ants, {} iterations", self.config.num_ants, self.config.max_iterations);

        let ant = Ant::new(self.cache, self.config.alpha, self.config.beta)
            .with_return_rule(self.config.return_threshold, self.config.return_exponent);

        for iteration in 0..self.config.max_iterations {
            let mut routes = Vec::with_capacity(self.config.num_ants);

            for _ in 0..self.config.num_ants {
                let solution = ant.construct(&self.pheromone, &mut self.rng);
                let (cost, steps) = evaluate_ant_solution(&solution, self.cache);

                if cost < self.best_cost {
                    self.best_cost = cost;
                    self.best_steps = steps;
                    self.best_order = solution.visited_order.clone();
                    log::info!("ACO iteration {}: new best {:.2}", iteration, cost);
                }

                routes.push((solution.visited_order, cost));
            }

            self.update_pheromone(&routes);
            log::debug!("ACO iteration {}: best {:.2}", iteration, self.best_cost);
        }

        let mut solution = self.best_solution();
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.config.max_iterations);
        log::info!("ACO finished: cost {:.2}", solution.cost);

        solution
    }

    /// Get best solution found
    pub fn best_solution(&self) -> Solution {
        Solution::from_trace(self.best_steps.clone(), self.cache, "ACO")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{City, Edge, Problem};

    fn create_test_instance() -> Problem {
        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, 1.0, 0.0, 5.0),
            City::new(2, 2.0, 0.0, 3.0),
            City::new(3, 1.0, 1.0, 2.0),
        ];
        let edges = vec![
            Edge::new(0, 1, 1.0),
            Edge::new(1, 2, 1.0),
            Edge::new(1, 3, 1.0),
        ];
        Problem::new("test", 1.0, 1.5, cities, edges).unwrap()
    }

    #[test]
    fn test_evaluate_ant_solution() {
        let problem = create_test_instance();
        let cache = DistanceCache::new(&problem).unwrap();
        let solution = AntSolution {
            visits: vec![Step::new(2, 3.0), Step::depot(), Step::new(3, 2.0), Step::new(1, 5.0)],
            visited_order: vec![0, 2, 0, 3, 1, 0],
        };

        let (cost, steps) = evaluate_ant_solution(&solution, &cache);
        let expected: Vec<Step> = [(1, 0.0), (2, 3.0), (1, 0.0), (0, 0.0), (1, 0.0), (3, 2.0), (1, 5.0), (0, 0.0)]
            .iter()
            .map(|&s| Step::from(s))
            .collect();
        assert_eq!(steps, expected);

        // 0->2 empty, 2->0 with 3, 0->3 empty, 3->1 with 2, 1->0 with 7
        let expected_cost = 2.0 + (2.0 + 6f64.powf(1.5)) + 2.0 + (1.0 + 2f64.powf(1.5)) + (1.0 + 7f64.powf(1.5));
        assert!((cost - expected_cost).abs() < 1e-9);

        let sol = Solution::from_steps(steps, cost, "manual");
        assert!(sol.verify(&cache).is_ok());
    }

    #[test]
    fn test_pheromone_update_with_elite_deposit() {
        let problem = create_test_instance();
        let cache = DistanceCache::new(&problem).unwrap();
        let mut aco = AntColonyOptimization::new(&cache, ACOConfig::default());

        // Before any best route exists only the colony deposits
        aco.update_pheromone(&[(vec![0, 1, 2, 0], 50.0)]);
        assert!((aco.pheromone().get(0, 1) - 2.9).abs() < 1e-9);
        assert!((aco.pheromone().get(0, 3) - 0.9).abs() < 1e-9);

        let mut aco = AntColonyOptimization::new(&cache, ACOConfig::default());
        aco.best_order = vec![0, 3, 1, 0];
        aco.best_cost = 25.0;
        aco.update_pheromone(&[(vec![0, 1, 2, 0], 50.0)]);

        // 0.9 after evaporation, Q / 50 = 2 per route, 2 * Q / 25 = 8 elite
        let pheromone = aco.pheromone();
        assert!((pheromone.get(0, 1) - 10.9).abs() < 1e-9);
        assert!((pheromone.get(1, 0) - 10.9).abs() < 1e-9);
        assert!((pheromone.get(1, 2) - 2.9).abs() < 1e-9);
        assert!((pheromone.get(0, 3) - 8.9).abs() < 1e-9);
        assert!((pheromone.get(3, 1) - 8.9).abs() < 1e-9);
        assert!((pheromone.get(2, 3) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_aco() {
        let problem = create_test_instance();
        let cache = DistanceCache::new(&problem).unwrap();
        let config = ACOConfig {
            num_ants: 5,
            max_iterations: 10,
            ..Default::default()
        };

        let mut aco = AntColonyOptimization::new(&cache, config.clone());
        let solution = aco.run();

        assert!(solution.verify(&cache).is_ok());
        assert!(solution.cost.is_finite());
        assert_eq!(solution.iterations, Some(10));

        let again = AntColonyOptimization::new(&cache, config).run();
        assert_eq!(again.cost, solution.cost);
        assert_eq!(again.steps, solution.steps);

        let pheromone = aco.pheromone();
        for i in 0..4 {
            assert_eq!(pheromone.get(i, i), 0.0);
        }
    }

    #[test]
    fn test_aco_on_generated_instance() {
        // Linear cost, so per-edge and per-path costing agree
        let problem = Problem::generate(20, 0.2, 1.0, 1.0, 17).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();
        let config = ACOConfig { num_ants: 8, max_iterations: 5, ..Default::default() };

        let solution = AntColonyOptimization::new(&cache, config).run();
        assert!(solution.verify(&cache).is_ok());
        assert!((solution.walk_cost(&problem) - solution.cost).abs() < 1e-6 * solution.cost);
    }
}
