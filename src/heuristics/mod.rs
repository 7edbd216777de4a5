//! Heuristics module for the TTP.
//!
//! This module exports the GA building blocks, both ant colonies, the
//! Inver-Over operator and the trip-count optimizer, plus a single
//! [`solve`] entry point that dispatches on [`Algorithm`].

pub mod individual;
pub mod operators;
pub mod construction;
pub mod local_search;
pub mod genetic;
pub mod pheromone;
pub mod ant;
pub mod aco;
pub mod inver_over;
pub mod trip_optimizer;
pub mod hybrid;

pub use individual::{EvalState, Individual};
pub use genetic::{GAConfig, GaEvaluation, GeneticAlgorithm};
pub use aco::{ACOConfig, AntColonyOptimization};
pub use hybrid::{HybridACO, HybridConfig};
pub use pheromone::{PheromoneMatrix, PheromonePolicy};
pub use trip_optimizer::{TripOptimizer, TripPlan};

use crate::error::Result;
use crate::instance::Problem;
use crate::precompute::DistanceCache;
use crate::solution::Solution;

/// Solver selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Genetic algorithm with Split decoding
    Genetic,
    /// Plain ant colony
    Aco,
    /// ACS colony with Inver-Over and trip optimization
    Hybrid,
}

impl Algorithm {
    pub fn all() -> [Algorithm; 3] {
        [Algorithm::Genetic, Algorithm::Aco, Algorithm::Hybrid]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Genetic => "GeneticAlgorithm",
            Algorithm::Aco => "ACO",
            Algorithm::Hybrid => "HybridACO",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings of every solver, one is picked by [`solve`]
#[derive(Debug, Clone, Default)]
pub struct SolverConfig {
    pub ga: GAConfig,
    pub aco: ACOConfig,
    pub hybrid: HybridConfig,
}

impl SolverConfig {
    /// Same seed for every solver
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ga.seed = seed;
        self.aco.seed = seed;
        self.hybrid.seed = seed;
        self
    }
}

/// Run one solver on a prepared cache
pub fn solve(problem: &Problem, cache: &DistanceCache, algorithm: Algorithm, config: &SolverConfig) -> Solution {
    match algorithm {
        Algorithm::Genetic => GeneticAlgorithm::new(problem, cache, config.ga.clone()).run(),
        Algorithm::Aco => AntColonyOptimization::new(cache, config.aco.clone()).run(),
        Algorithm::Hybrid => HybridACO::new(cache, config.hybrid.clone()).run(),
    }
}

/// Build the distance cache, then run one solver
pub fn solve_problem(problem: &Problem, algorithm: Algorithm, config: &SolverConfig) -> Result<Solution> {
    let cache = DistanceCache::new(problem)?;
    Ok(solve(problem, &cache, algorithm, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_algorithm_returns_valid_trace() {
        let problem = Problem::generate(10, 0.3, 1.0, 2.0, 21).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let mut config = SolverConfig::default().with_seed(5);
        config.ga.population_size = 10;
        config.ga.max_generations = 5;
        config.aco.num_ants = 5;
        config.aco.max_iterations = 5;
        config.hybrid.num_ants = 5;
        config.hybrid.max_iterations = 5;

        for algorithm in Algorithm::all() {
            let solution = solve(&problem, &cache, algorithm, &config);
            assert!(solution.verify(&cache).is_ok(), "{} produced an invalid trace", algorithm);
            assert_eq!(solution.algorithm, algorithm.name());
            assert!(solution.cost.is_finite());
        }
    }

    #[test]
    fn test_solve_problem_rejects_disconnected_graph() {
        use crate::instance::{City, Edge};

        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, 1.0, 0.0, 1.0),
            City::new(2, 5.0, 5.0, 1.0),
        ];
        let problem = Problem::new("islands", 1.0, 1.0, cities, vec![Edge::new(0, 1, 1.0)]).unwrap();
        assert!(solve_problem(&problem, Algorithm::Hybrid, &SolverConfig::default()).is_err());
    }
}
