//! Solution representation and verification.
//!
//! Every solver returns its answer as a step trace: the ordered list of nodes
//! walked after leaving the depot, each with the gold picked up there. Cities
//! crossed on the way to somewhere else appear with zero gold. The trace ends
//! with a `(0, 0)` return to the depot.

use crate::error::{Result, TtpError};
use crate::instance::Problem;
use crate::precompute::DistanceCache;
use serde::{Deserialize, Serialize};

/// One node of a walked path and the gold collected on arrival
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub city: usize,
    pub gold: f64,
}

impl Step {
    pub fn new(city: usize, gold: f64) -> Self {
        Step { city, gold }
    }

    /// The `(0, 0)` depot return
    pub fn depot() -> Self {
        Step { city: 0, gold: 0.0 }
    }

    pub fn is_depot(&self) -> bool {
        self.city == 0
    }
}

impl From<(usize, f64)> for Step {
    fn from((city, gold): (usize, f64)) -> Self {
        Step::new(city, gold)
    }
}

/// Represents a solution to the TTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Walked nodes after the depot, ending with `(0, 0)`
    pub steps: Vec<Step>,
    /// Cost of walking the trace, see [`Solution::trace_cost`]
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations or generations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            steps: Vec::new(),
            cost: f64::INFINITY,
            algorithm: String::new(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    pub fn from_steps(steps: Vec<Step>, cost: f64, algorithm: &str) -> Self {
        Solution {
            steps,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        }
    }

    /// Number of depot visits in the trace, at least one per trip
    pub fn num_trips(&self) -> usize {
        self.steps.iter().filter(|s| s.is_depot()).count()
    }

    /// Total gold carried back to the depot
    pub fn total_gold(&self) -> f64 {
        self.steps.iter().map(|s| s.gold).sum()
    }

    /// Check the output contract against the instance data.
    ///
    /// Every target city must be visited, its gold must be collected in a
    /// single step and in full, the depot never yields gold, and a non-empty
    /// trace must end with `(0, 0)`.
    pub fn verify(&self, cache: &DistanceCache) -> Result<()> {
        let n = cache.num_cities();
        let mut visited = vec![false; n];
        let mut pickups = vec![0usize; n];
        let mut collected = vec![0.0; n];

        for step in &self.steps {
            if step.city >= n {
                return Err(TtpError::InvalidSolution(format!("unknown city {}", step.city)));
            }
            if step.gold < 0.0 || !step.gold.is_finite() {
                return Err(TtpError::InvalidSolution(
                    format!("invalid gold {} at city {}", step.gold, step.city)));
            }
            visited[step.city] = true;
            if step.gold > 0.0 {
                pickups[step.city] += 1;
                collected[step.city] += step.gold;
            }
        }

        if collected[0] > 0.0 {
            return Err(TtpError::InvalidSolution("gold collected at the depot".to_string()));
        }

        for city in 1..n {
            if !visited[city] {
                return Err(TtpError::InvalidSolution(format!("city {} never visited", city)));
            }
            if pickups[city] > 1 {
                return Err(TtpError::InvalidSolution(
                    format!("gold of city {} collected {} times", city, pickups[city])));
            }
            let expected = cache.gold(city);
            if (collected[city] - expected).abs() > 1e-9 * expected.max(1.0) {
                return Err(TtpError::InvalidSolution(
                    format!("city {}: collected {} of {}", city, collected[city], expected)));
            }
        }

        if let Some(last) = self.steps.last() {
            if *last != Step::depot() {
                return Err(TtpError::InvalidSolution("trace does not end at the depot".to_string()));
            }
        }

        Ok(())
    }

    /// Build a solution whose cost is the walked cost of `steps`
    pub fn from_trace(steps: Vec<Step>, cache: &DistanceCache, algorithm: &str) -> Self {
        let mut solution = Solution::from_steps(steps, 0.0, algorithm);
        solution.cost = solution.trace_cost(cache);
        solution
    }

    /// Cost of walking the trace under the path cost model.
    ///
    /// Consecutive hops carrying the same load form one stretch costed as
    /// `D + (alpha * D * load)^beta`. A stretch ends at every pickup and at
    /// every depot visit, where the load is dropped. A shortest path that
    /// crosses the depot therefore unloads there, so this never exceeds the
    /// planned cost of the trips that produced the trace.
    pub fn trace_cost(&self, cache: &DistanceCache) -> f64 {
        let mut total_cost = 0.0;
        let mut current = 0;
        let mut load = 0.0;
        let mut stretch = 0.0;

        for step in &self.steps {
            stretch += cache.distance(current, step.city);
            current = step.city;

            if step.is_depot() || step.gold > 0.0 {
                total_cost += cache.travel_cost(stretch, load);
                stretch = 0.0;
                load = if step.is_depot() { 0.0 } else { load + step.gold };
            }
        }

        total_cost + cache.travel_cost(stretch, load)
    }

    /// Re-walk the trace from the depot, costing every hop separately.
    ///
    /// The load resets at each depot visit. Hops between non-adjacent nodes
    /// make the result infinite.
    pub fn walk_cost(&self, problem: &Problem) -> f64 {
        let mut total_cost = 0.0;
        let mut current = 0;
        let mut load = 0.0;

        for step in &self.steps {
            total_cost += problem.cost(&[current, step.city], load);
            current = step.city;
            if current == 0 {
                load = 0.0;
            } else {
                load += step.gold;
            }
        }

        total_cost
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Trips: {}", self.num_trips())?;
        writeln!(f, "  Steps: {}", self.steps.len())?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        let preview: Vec<(usize, f64)> = self.steps.iter()
            .take(10)
            .map(|s| (s.city, s.gold))
            .collect();
        writeln!(f, "  First steps: {:?}", preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{City, Edge};

    fn create_test_instance() -> Problem {
        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, 1.0, 0.0, 10.0),
            City::new(2, 2.0, 0.0, 5.0),
        ];
        let edges = vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 1.0)];
        Problem::new("line", 1.0, 1.0, cities, edges).unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.steps.is_empty());
        assert_eq!(sol.cost, f64::INFINITY);
        assert_eq!(sol.num_trips(), 0);
    }

    #[test]
    fn test_verify_accepts_valid_trace() {
        let problem = create_test_instance();
        let cache = DistanceCache::new(&problem).unwrap();
        // Pass through 1 empty-handed, pick up 2, collect 1 on the way back
        let steps = vec![
            Step::new(1, 0.0), Step::new(2, 5.0), Step::new(1, 10.0), Step::depot(),
        ];
        let sol = Solution::from_steps(steps, 0.0, "manual");

        assert!(sol.verify(&cache).is_ok());
        assert_eq!(sol.num_trips(), 1);
        assert_eq!(sol.total_gold(), 15.0);
    }

    #[test]
    fn test_verify_rejects_split_pickup() {
        let cache = DistanceCache::new(&create_test_instance()).unwrap();
        let steps = vec![
            Step::new(1, 4.0), Step::new(2, 5.0), Step::new(1, 6.0), Step::depot(),
        ];
        let sol = Solution::from_steps(steps, 0.0, "manual");
        assert!(sol.verify(&cache).is_err());
    }

    #[test]
    fn test_verify_rejects_missing_city_and_open_end() {
        let cache = DistanceCache::new(&create_test_instance()).unwrap();

        let missing = Solution::from_steps(vec![Step::new(1, 10.0), Step::depot()], 0.0, "manual");
        assert!(missing.verify(&cache).is_err());

        let open = Solution::from_steps(vec![Step::new(1, 10.0), Step::new(2, 5.0)], 0.0, "manual");
        assert!(open.verify(&cache).is_err());
    }

    #[test]
    fn test_trace_cost_merges_stretches() {
        let mut problem = create_test_instance();
        problem.beta = 2.0;
        let cache = DistanceCache::new(&problem).unwrap();

        // Out to 2 empty through 1, back home with 5 then 15
        let steps = vec![Step::new(1, 0.0), Step::new(2, 5.0), Step::new(1, 10.0), Step::depot()];
        let sol = Solution::from_trace(steps, &cache, "manual");
        let expected = 2.0 + (1.0 + 25.0) + (1.0 + 225.0);
        assert!((sol.cost - expected).abs() < 1e-9);

        // Linear cost agrees with the hop-by-hop walk
        let linear = DistanceCache::new(&create_test_instance()).unwrap();
        let sol = Solution::from_trace(sol.steps, &linear, "manual");
        assert!((sol.cost - sol.walk_cost(&create_test_instance())).abs() < 1e-9);
    }

    #[test]
    fn test_trace_cost_unloads_when_crossing_depot() {
        // 1 - 0 - 2: the leg from 1 to 2 crosses the depot
        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, -1.0, 0.0, 10.0),
            City::new(2, 1.0, 0.0, 5.0),
        ];
        let edges = vec![Edge::new(0, 1, 1.0), Edge::new(0, 2, 1.0)];
        let problem = Problem::new("crossing", 1.0, 2.0, cities, edges).unwrap();
        let cache = DistanceCache::new(&problem).unwrap();

        let trips = vec![vec![1, 2]];
        let planned = crate::split::trip_cost(&trips[0], &cache, cache.gold_table());
        let steps = crate::split::expand_trips(&trips, &cache, cache.gold_table());
        assert_eq!(steps[1], Step::depot());

        let sol = Solution::from_trace(steps, &cache, "manual");
        // 1 + (1 + 100) + 1 + (1 + 25) against 1 + (2 + 400) + (1 + 225)
        assert!((sol.cost - 129.0).abs() < 1e-9);
        assert!((planned - 629.0).abs() < 1e-9);
        assert!(sol.verify(&cache).is_ok());
    }

    #[test]
    fn test_walk_cost() {
        let problem = create_test_instance();
        let steps = vec![Step::new(1, 10.0), Step::depot(), Step::new(1, 0.0), Step::new(2, 5.0),
            Step::new(1, 0.0), Step::depot()];
        let sol = Solution::from_steps(steps, 0.0, "manual");
        // 1 + (1 + 10) + 1 + 1 + (1 + 5) + (1 + 5)
        assert!((sol.walk_cost(&problem) - 26.0).abs() < 1e-12);
    }
}
