//! Genetic Algorithm for the TTP.
//!
//! Individuals are permutations of the target cities, decoded into depot
//! round trips by an [`Evaluator`] (the Split DP by default). The algorithm
//! combines:
//! - Sweep, nearest-neighbour and perturbed-sweep seeding
//! - Tournament selection with elitism
//! - Order crossover and weighted inversion/swap/insert mutation
//! - A periodic stochastic 2-opt pass on the current best (memetic step)

use crate::heuristics::construction::{perturb, ConstructionHeuristic, NearestNeighborHeuristic, SweepHeuristic};
use crate::heuristics::individual::Individual;
use crate::heuristics::local_search::{LocalSearch, StochasticTwoOpt};
use crate::heuristics::operators::{
    apply_mutation, elitism_selection, order_crossover, tournament_selection, MutationWeights,
};
use crate::heuristics::trip_optimizer::TripOptimizer;
use crate::instance::Problem;
use crate::precompute::DistanceCache;
use crate::solution::Solution;
use crate::split::{Evaluator, GreedyReturnEvaluator, SplitEvaluator, DEFAULT_SPLIT_WINDOW};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// How routes are decoded into trips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaEvaluation {
    /// Split dynamic program
    Split,
    /// Greedy return-or-continue decision per city
    GreedyReturn,
}

/// Genetic Algorithm configuration
#[derive(Debug, Clone)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Crossover probability
    pub crossover_rate: f64,
    /// Mutation probability
    pub mutation_rate: f64,
    /// Tournament size for selection
    pub tournament_size: usize,
    /// Elite count (best individuals preserved)
    pub elite_size: usize,
    /// Generations between two local search passes
    pub local_search_interval: usize,
    /// Random 2-opt moves per local search pass
    pub local_search_steps: usize,
    /// Relative probability of each mutation operator
    pub mutation_weights: MutationWeights,
    /// Split window; `None` for the unbounded DP
    pub split_window: Option<usize>,
    /// Route decoder
    pub evaluation: GaEvaluation,
    /// Try an equal-partition trip plan on the final best when beta > 1
    pub optimize_trips: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 100,
            max_generations: 200,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            tournament_size: 3,
            elite_size: 2,
            local_search_interval: 10,
            local_search_steps: 200,
            mutation_weights: MutationWeights::default(),
            split_window: Some(DEFAULT_SPLIT_WINDOW),
            evaluation: GaEvaluation::Split,
            optimize_trips: false,
            seed: 42,
        }
    }
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<'a> {
    config: GAConfig,
    problem: &'a Problem,
    cache: &'a DistanceCache,
    evaluator: Box<dyn Evaluator>,
    population: Vec<Individual>,
    best_individual: Option<Individual>,
    rng: ChaCha8Rng,
    generation: usize,
}

impl<'a> GeneticAlgorithm<'a> {
    pub fn new(problem: &'a Problem, cache: &'a DistanceCache, config: GAConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let evaluator: Box<dyn Evaluator> = match config.evaluation {
            GaEvaluation::Split => Box::new(SplitEvaluator { window: config.split_window }),
            GaEvaluation::GreedyReturn => Box::new(GreedyReturnEvaluator),
        };

        GeneticAlgorithm {
            config,
            problem,
            cache,
            evaluator,
            population: Vec::new(),
            best_individual: None,
            rng,
            generation: 0,
        }
    }

    /// Sweep route, nearest-neighbour route, then perturbed sweeps
    fn initialize_population(&mut self) {
        let size = self.config.population_size.max(1);
        self.population.clear();

        let sweep = SweepHeuristic::new().construct(self.problem, self.cache);
        let nearest = NearestNeighborHeuristic::new().construct(self.problem, self.cache);

        self.population.push(Individual::new(sweep.clone()));
        if size > 1 {
            self.population.push(Individual::new(nearest));
        }
        while self.population.len() < size {
            let route = perturb(&sweep, &mut self.rng);
            self.population.push(Individual::new(route));
        }

        for individual in &mut self.population {
            individual.evaluate(self.evaluator.as_ref(), self.cache);
        }
    }

    /// Index of the fittest individual, first one on ties
    fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, individual) in self.population.iter().enumerate() {
            match best {
                Some(b) if individual.fitness() <= self.population[b].fitness() => {}
                _ => best = Some(idx),
            }
        }
        best
    }

    fn breed(&mut self, count: usize) -> Vec<Individual> {
        let mut offspring = Vec::with_capacity(count);

        while offspring.len() < count {
            let parents = (
                tournament_selection(&self.population, self.config.tournament_size, &mut self.rng),
                tournament_selection(&self.population, self.config.tournament_size, &mut self.rng),
            );
            let (parent1, parent2) = match parents {
                (Some(p1), Some(p2)) => (p1, p2),
                _ => break,
            };

            let mut child = if self.rng.gen::<f64>() < self.config.crossover_rate {
                order_crossover(parent1, parent2, &mut self.rng)
            } else {
                parent1.clone()
            };

            if self.rng.gen::<f64>() < self.config.mutation_rate {
                let kind = self.config.mutation_weights.choose(&mut self.rng);
                child = apply_mutation(&child, kind, &mut self.rng);
            }

            offspring.push(child);
        }

        offspring
    }

    /// Stochastic 2-opt on the current best; an improvement on the best-ever
    /// replaces the last population slot
    fn local_search(&mut self) {
        let idx = match self.best_index() {
            Some(idx) => idx,
            None => return,
        };

        let two_opt = StochasticTwoOpt::new(self.config.local_search_steps);
        let improved = two_opt.improve(&self.population[idx], self.evaluator.as_ref(), self.cache, &mut self.rng);

        let best_fitness = self.best_individual.as_ref().map_or(f64::NEG_INFINITY, |b| b.fitness());
        if improved.fitness() > best_fitness {
            log::debug!("Gen {}: 2-opt improved best to {:.2}", self.generation, improved.cost());
            self.best_individual = Some(improved.clone());
            if let Some(last) = self.population.last_mut() {
                *last = improved;
            }
        }
    }

    fn evolve(&mut self) {
        let elites = elitism_selection(&self.population, self.config.elite_size);
        let count = self.config.population_size.max(1).saturating_sub(elites.len());
        let mut offspring = self.breed(count);

        for child in &mut offspring {
            child.evaluate(self.evaluator.as_ref(), self.cache);
        }

        self.population = elites;
        self.population.extend(offspring);

        let interval = self.config.local_search_interval;
        if interval > 0 && self.generation % interval == 0 {
            self.local_search();
        }

        if let Some(idx) = self.best_index() {
            let best_fitness = self.best_individual.as_ref().map_or(f64::NEG_INFINITY, |b| b.fitness());
            if self.population[idx].fitness() > best_fitness {
                self.best_individual = Some(self.population[idx].clone());
                log::info!("Gen {}: new best cost {:.2}", self.generation, self.population[idx].cost());
            }
        }

        self.generation += 1;
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> Solution {
        let start = std::time::Instant::now();
        log::info!(
            "GA: population {}, {} generations, evaluator {}",
            self.config.population_size,
            self.config.max_generations,
            self.evaluator.name()
        );

        self.initialize_population();
        self.generation = 0;
        self.best_individual = self.best_index().map(|idx| self.population[idx].clone());
        if let Some(ref best) = self.best_individual {
            log::info!("Initial best cost: {:.2}", best.cost());
        }

        while self.generation < self.config.max_generations {
            self.evolve();

            if let Some(ref best) = self.best_individual {
                log::debug!(
                    "[GA] Gen {}  Best cost {:.3}  Diversity {:.2}  Elapsed {:.2}s",
                    self.generation,
                    best.cost(),
                    self.population_diversity(),
                    start.elapsed().as_secs_f64()
                );
            }
        }

        let mut solution = self.best_solution().unwrap_or_default();
        if self.config.optimize_trips && self.cache.beta() > 1.0 {
            self.apply_trip_optimizer(&mut solution);
        }

        solution.computation_time = start.elapsed().as_secs_f64();
        solution.iterations = Some(self.generation);
        log::info!("GA finished: cost {:.2}", solution.cost);

        solution
    }

    /// Replace the decoded plan by an equal-partition plan when cheaper
    fn apply_trip_optimizer(&self, solution: &mut Solution) {
        let best = match self.best_individual {
            Some(ref best) => best,
            None => return,
        };

        let plan = TripOptimizer::default().optimize_route(best.route(), self.cache);
        let candidate = Solution::from_trace(plan.steps(self.cache, self.cache.gold_table()), self.cache, "");
        if candidate.cost < solution.cost {
            log::info!("Trip optimizer: {} trips, cost {:.2} -> {:.2}", plan.num_trips(), solution.cost, candidate.cost);
            solution.steps = candidate.steps;
            solution.cost = candidate.cost;
        }
    }

    /// Get current best solution
    pub fn best_solution(&self) -> Option<Solution> {
        let eval = self.best_individual.as_ref()?.evaluation()?;
        Some(Solution::from_trace(eval.steps.clone(), self.cache, "GeneticAlgorithm"))
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    /// Get population diversity (average number of differing positions)
    pub fn population_diversity(&self) -> f64 {
        if self.population.len() < 2 {
            return 0.0;
        }

        let mut total_diff = 0.0;
        let mut count = 0;

        for i in 0..self.population.len().min(20) {
            for j in i + 1..self.population.len().min(20) {
                let diff = self.population[i].route().iter()
                    .zip(self.population[j].route().iter())
                    .filter(|(a, b)| a != b)
                    .count();
                total_diff += diff as f64;
                count += 1;
            }
        }

        if count > 0 {
            total_diff / count as f64
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GAConfig {
        GAConfig {
            population_size: 20,
            max_generations: 15,
            local_search_steps: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_genetic_algorithm() {
        let problem = Problem::generate(15, 0.3, 1.0, 2.0, 3).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let mut ga = GeneticAlgorithm::new(&problem, &cache, small_config());
        let solution = ga.run();

        assert!(solution.verify(&cache).is_ok());
        assert_eq!(solution.iterations, Some(15));
        assert_eq!(ga.current_generation(), 15);

        // Best-ever never regresses below the sweep seed
        let sweep = SweepHeuristic::new().construct(&problem, &cache);
        let seed_cost = SplitEvaluator::default().evaluate(&sweep, &cache).cost;
        assert!(solution.cost <= seed_cost + 1e-9);
    }

    #[test]
    fn test_genetic_algorithm_is_reproducible() {
        let problem = Problem::generate(12, 0.4, 1.5, 1.5, 9).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let a = GeneticAlgorithm::new(&problem, &cache, small_config()).run();
        let b = GeneticAlgorithm::new(&problem, &cache, small_config()).run();
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.steps, b.steps);
    }

    #[test]
    fn test_greedy_return_and_unbounded_split() {
        let problem = Problem::generate(10, 0.3, 1.0, 1.8, 4).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let greedy = GAConfig { evaluation: GaEvaluation::GreedyReturn, ..small_config() };
        let solution = GeneticAlgorithm::new(&problem, &cache, greedy).run();
        assert!(solution.verify(&cache).is_ok());

        let unbounded = GAConfig { split_window: None, ..small_config() };
        let solution = GeneticAlgorithm::new(&problem, &cache, unbounded).run();
        assert!(solution.verify(&cache).is_ok());
    }

    #[test]
    fn test_trip_optimizer_never_worsens() {
        let problem = Problem::generate(12, 0.3, 1.0, 2.5, 6).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let plain = GeneticAlgorithm::new(&problem, &cache, small_config()).run();
        let with_trips = GAConfig { optimize_trips: true, ..small_config() };
        let optimized = GeneticAlgorithm::new(&problem, &cache, with_trips).run();

        assert!(optimized.verify(&cache).is_ok());
        assert!(optimized.cost <= plain.cost);
        assert!((optimized.trace_cost(&cache) - optimized.cost).abs() < 1e-9 * optimized.cost.max(1.0));
        assert!((plain.trace_cost(&cache) - plain.cost).abs() < 1e-9 * plain.cost.max(1.0));
    }

    #[test]
    fn test_tiny_population() {
        let problem = Problem::generate(6, 0.5, 1.0, 1.0, 2).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();
        let config = GAConfig { population_size: 1, elite_size: 2, max_generations: 3, ..Default::default() };

        let solution = GeneticAlgorithm::new(&problem, &cache, config).run();
        assert!(solution.verify(&cache).is_ok());
    }
}
