//! Decoding a city permutation into depot round trips.
//!
//! The Split dynamic program finds the cheapest way to cut a permutation into
//! contiguous trips, each leaving the depot empty and returning loaded. Node
//! `i` of the auxiliary graph is the boundary after the first `i` cities; arc
//! `(i, i + k)` serves `route[i..i + k]` in one trip:
//!
//! ```text
//! V[0] = 0
//! V[i + k] = min(V[i] + trip(route[i..i + k]))   for k = 1..=W
//! ```
//!
//! Inside a trip the load only grows, so each leg is costed at the load
//! carried when it starts. The window `W` bounds the trip length: with no
//! window the result is the optimal partition in O(n²), with a window of 15
//! it is usually optimal in O(15·n).

use crate::precompute::DistanceCache;
use crate::solution::Step;

/// Default trip length window of the Split DP
pub const DEFAULT_SPLIT_WINDOW: usize = 15;

/// Cost, trip partition and expanded trace of one permutation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub cost: f64,
    pub trips: Vec<Vec<usize>>,
    pub steps: Vec<Step>,
}

impl Evaluation {
    /// The zero-cost evaluation of an empty permutation
    pub fn empty() -> Self {
        Evaluation { cost: 0.0, trips: Vec::new(), steps: Vec::new() }
    }
}

/// Turns a permutation of target cities into a costed trip plan
pub trait Evaluator {
    fn evaluate(&self, route: &[usize], cache: &DistanceCache) -> Evaluation;
    fn name(&self) -> &str;
}

/// Cost of one trip leaving the depot empty, serving `cities` in order and
/// returning home with everything collected
pub fn trip_cost(cities: &[usize], cache: &DistanceCache, gold: &[f64]) -> f64 {
    let mut cost = 0.0;
    let mut current = 0;
    let mut load = 0.0;

    for &city in cities {
        cost += cache.cost(current, city, load);
        load += gold[city];
        current = city;
    }

    cost + cache.cost(current, 0, load)
}

/// Expand trips through the shortest-path cache into a step trace.
///
/// Gold is recorded only when a leg reaches its target city; nodes crossed
/// on the way and the whole way home carry zero.
pub fn expand_trips(trips: &[Vec<usize>], cache: &DistanceCache, gold: &[f64]) -> Vec<Step> {
    let mut steps = Vec::new();

    for trip in trips {
        let mut current = 0;
        for &target in trip {
            for node in cache.path(current, target).into_iter().skip(1) {
                let g = if node == target { gold[target] } else { 0.0 };
                steps.push(Step::new(node, g));
            }
            current = target;
        }
        if current != 0 {
            for node in cache.path(current, 0).into_iter().skip(1) {
                steps.push(Step::new(node, 0.0));
            }
        }
    }

    steps
}

/// Split DP: optimal (or window-bounded) partition cost and trips
pub fn split_route(route: &[usize], cache: &DistanceCache, window: Option<usize>) -> (f64, Vec<Vec<usize>>) {
    let n = route.len();
    if n == 0 {
        return (0.0, Vec::new());
    }

    let window = window.unwrap_or(n).max(1);

    // value[i] = cheapest cost of serving route[..i]
    // pred[i] = start of the last trip ending at i
    let mut value = vec![f64::INFINITY; n + 1];
    let mut pred = vec![0usize; n + 1];
    value[0] = 0.0;

    for i in 0..n {
        if value[i].is_infinite() {
            continue;
        }

        let mut current = 0;
        let mut load = 0.0;
        let mut travel = 0.0;

        for k in 1..=window.min(n - i) {
            let city = route[i + k - 1];
            travel += cache.cost(current, city, load);
            load += cache.gold(city);
            current = city;

            let candidate = value[i] + travel + cache.cost(city, 0, load);
            if candidate < value[i + k] {
                value[i + k] = candidate;
                pred[i + k] = i;
            }
        }
    }

    let mut trips = Vec::new();
    let mut end = n;
    while end > 0 {
        let start = pred[end];
        trips.push(route[start..end].to_vec());
        end = start;
    }
    trips.reverse();

    (value[n], trips)
}

/// Split dynamic program evaluator
#[derive(Debug, Clone, Copy)]
pub struct SplitEvaluator {
    /// Longest trip considered; `None` for the unbounded O(n²) variant
    pub window: Option<usize>,
}

impl SplitEvaluator {
    pub fn bounded(window: usize) -> Self {
        SplitEvaluator { window: Some(window) }
    }

    pub fn unbounded() -> Self {
        SplitEvaluator { window: None }
    }
}

impl Default for SplitEvaluator {
    fn default() -> Self {
        Self::bounded(DEFAULT_SPLIT_WINDOW)
    }
}

impl Evaluator for SplitEvaluator {
    fn evaluate(&self, route: &[usize], cache: &DistanceCache) -> Evaluation {
        if route.is_empty() {
            return Evaluation::empty();
        }

        let (cost, trips) = split_route(route, cache, self.window);
        let steps = expand_trips(&trips, cache, cache.gold_table());

        Evaluation { cost, trips, steps }
    }

    fn name(&self) -> &str {
        match self.window {
            Some(_) => "Split-Bounded",
            None => "Split",
        }
    }
}

/// Greedy decoder: before each city, either continue directly at the current
/// load or go home to unload and come back empty, whichever is cheaper
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyReturnEvaluator;

impl Evaluator for GreedyReturnEvaluator {
    fn evaluate(&self, route: &[usize], cache: &DistanceCache) -> Evaluation {
        if route.is_empty() {
            return Evaluation::empty();
        }

        let mut trips: Vec<Vec<usize>> = vec![Vec::new()];
        let mut cost = 0.0;
        let mut current = 0;
        let mut load = 0.0;

        for &city in route {
            let direct = cache.cost(current, city, load);
            let detour = cache.cost(current, 0, load) + cache.cost(0, city, 0.0);

            if current != 0 && detour < direct {
                cost += detour;
                load = 0.0;
                trips.push(Vec::new());
            } else {
                cost += direct;
            }

            if let Some(trip) = trips.last_mut() {
                trip.push(city);
            }
            load += cache.gold(city);
            current = city;
        }

        cost += cache.cost(current, 0, load);
        let steps = expand_trips(&trips, cache, cache.gold_table());

        Evaluation { cost, trips, steps }
    }

    fn name(&self) -> &str {
        "GreedyReturn"
    }
}
