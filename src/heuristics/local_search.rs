//! Local search improvement for GA individuals.

use crate::heuristics::individual::Individual;
use crate::precompute::DistanceCache;
use crate::split::Evaluator;
use rand::prelude::*;
use rand::seq::index;

/// Trait for local search improvement methods
pub trait LocalSearch {
    /// Return an individual at least as good as `individual`, evaluated
    fn improve<R: Rng + ?Sized>(
        &self,
        individual: &Individual,
        evaluator: &dyn Evaluator,
        cache: &DistanceCache,
        rng: &mut R,
    ) -> Individual;
    fn name(&self) -> &str;
}

/// Stochastic 2-opt hill climber
///
/// Reverses a random segment per step and keeps the move only if the
/// decoded cost strictly drops.
pub struct StochasticTwoOpt {
    /// Number of random moves tried
    pub max_steps: usize,
}

impl StochasticTwoOpt {
    pub fn new(max_steps: usize) -> Self {
        StochasticTwoOpt { max_steps }
    }
}

impl Default for StochasticTwoOpt {
    fn default() -> Self {
        Self::new(200)
    }
}

impl LocalSearch for StochasticTwoOpt {
    fn improve<R: Rng + ?Sized>(
        &self,
        individual: &Individual,
        evaluator: &dyn Evaluator,
        cache: &DistanceCache,
        rng: &mut R,
    ) -> Individual {
        let mut current = individual.clone();
        current.evaluate(evaluator, cache);

        let n = current.len();
        if n < 2 {
            return current;
        }

        for _ in 0..self.max_steps {
            let picked = index::sample(rng, n, 2);
            let (i, j) = (picked.index(0).min(picked.index(1)), picked.index(0).max(picked.index(1)));

            let mut candidate = current.mutated(|route| route[i..=j].reverse());
            if candidate.evaluate(evaluator, cache) < current.cost() {
                current = candidate;
            }
        }

        current
    }

    fn name(&self) -> &str {
        "Stochastic-2-Opt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Problem;
    use crate::split::SplitEvaluator;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_two_opt_never_worsens() {
        let problem = Problem::generate(15, 0.3, 1.0, 1.5, 13).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();
        let evaluator = SplitEvaluator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let mut route = cache.cities();
        route.shuffle(&mut rng);
        let mut start = Individual::new(route);
        let start_cost = start.evaluate(&evaluator, &cache);

        let improved = StochasticTwoOpt::new(300).improve(&start, &evaluator, &cache, &mut rng);
        assert!(improved.is_evaluated());
        assert!(improved.cost() <= start_cost);

        let mut sorted = improved.route().to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, cache.cities());
    }

    #[test]
    fn test_zero_steps_returns_evaluated_copy() {
        let problem = Problem::generate(5, 0.5, 1.0, 1.0, 1).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let start = Individual::new(cache.cities());
        let result = StochasticTwoOpt::new(0).improve(&start, &SplitEvaluator::default(), &cache, &mut rng);
        assert_eq!(result.route(), start.route());
        assert!(result.is_evaluated());
    }
}
