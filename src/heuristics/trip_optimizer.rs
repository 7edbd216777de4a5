//! Trip-count optimizer.
//!
//! A cheap alternative to the Split DP: for `k = 1, 2, ...` the route is cut
//! into `k` contiguous groups of near-equal size and each group is costed as
//! an independent depot-to-depot trip. The search stops early once extra
//! trips stop paying off.

use crate::precompute::DistanceCache;
use crate::solution::Step;
use crate::split::{expand_trips, trip_cost};

/// A costed partition of a route into depot round trips
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlan {
    pub cost: f64,
    pub trips: Vec<Vec<usize>>,
}

impl TripPlan {
    pub fn empty() -> Self {
        TripPlan { cost: 0.0, trips: Vec::new() }
    }

    /// All cities in order, one return home at the end
    pub fn single_trip(cities: &[usize], gold: &[f64], cache: &DistanceCache) -> Self {
        if cities.is_empty() {
            return Self::empty();
        }
        TripPlan {
            cost: trip_cost(cities, cache, gold),
            trips: vec![cities.to_vec()],
        }
    }

    pub fn num_trips(&self) -> usize {
        self.trips.len()
    }

    /// Step trace of the plan through shortest paths, ending at the depot
    pub fn steps(&self, cache: &DistanceCache, gold: &[f64]) -> Vec<Step> {
        expand_trips(&self.trips, cache, gold)
    }
}

/// Equal-partition trip-count search with early stopping
#[derive(Debug, Clone, Copy)]
pub struct TripOptimizer {
    /// Largest number of trips tried
    pub max_trips: usize,
    /// Consecutive non-improving `k` before giving up
    pub patience: usize,
    /// An improving `k > 1` that gains less than this ends the search
    pub min_gain: f64,
}

impl Default for TripOptimizer {
    fn default() -> Self {
        TripOptimizer { max_trips: 15, patience: 3, min_gain: 1.0 }
    }
}

impl TripOptimizer {
    pub fn new(max_trips: usize) -> Self {
        TripOptimizer { max_trips, ..Default::default() }
    }

    /// Cost of cutting `cities` into `k` contiguous groups; the first
    /// `n mod k` groups get one extra city. `None` unless `1 <= k <= n`.
    pub fn evaluate_k_trips(&self, cities: &[usize], gold: &[f64], k: usize, cache: &DistanceCache) -> Option<TripPlan> {
        let n = cities.len();
        if k == 0 || k > n {
            return None;
        }

        let group_size = n / k;
        let remainder = n % k;
        let mut trips = Vec::with_capacity(k);
        let mut cost = 0.0;
        let mut start = 0;

        for i in 0..k {
            let end = start + group_size + usize::from(i < remainder);
            let trip = &cities[start..end];
            cost += trip_cost(trip, cache, gold);
            trips.push(trip.to_vec());
            start = end;
        }

        Some(TripPlan { cost, trips })
    }

    /// Best equal partition found for `k` from 1 up to `max_trips`
    pub fn optimize(&self, cities: &[usize], gold: &[f64], cache: &DistanceCache) -> TripPlan {
        self.search(cities, gold, cache).0
    }

    /// Best plan and the number of trip counts tried before stopping
    fn search(&self, cities: &[usize], gold: &[f64], cache: &DistanceCache) -> (TripPlan, usize) {
        if cities.is_empty() {
            return (TripPlan::empty(), 0);
        }

        let max_k = self.max_trips.max(1).min(cities.len());
        let mut best: Option<TripPlan> = None;
        let mut no_improve = 0;
        let mut tried = 0;

        for k in 1..=max_k {
            tried = k;
            let plan = match self.evaluate_k_trips(cities, gold, k, cache) {
                Some(plan) => plan,
                None => continue,
            };
            let best_cost = best.as_ref().map_or(f64::INFINITY, |b| b.cost);

            if plan.cost < best_cost {
                let gain = best_cost - plan.cost;
                best = Some(plan);
                no_improve = 0;

                if k > 1 && gain < self.min_gain {
                    log::debug!("Trip optimizer: gain {:.4} at k={} below threshold, stopping", gain, k);
                    break;
                }
            } else {
                no_improve += 1;
                if no_improve >= self.patience {
                    log::debug!("Trip optimizer: no improvement for {} values of k, stopping at k={}", no_improve, k);
                    break;
                }
            }
        }

        let plan = best.unwrap_or_else(|| TripPlan::single_trip(cities, gold, cache));
        log::debug!("Trip optimizer: {} trips, cost {:.2}", plan.num_trips(), plan.cost);
        (plan, tried)
    }

    /// Optimize a permutation of target cities using the instance gold
    pub fn optimize_route(&self, route: &[usize], cache: &DistanceCache) -> TripPlan {
        self.optimize(route, cache.gold_table(), cache)
    }
}
