//! All-pairs shortest paths and the closed-form travel cost.
//!
//! The cache is built once per instance and then only read. Every algorithm
//! receives it by reference, so nothing is shared between independent runs.

use crate::error::{Result, TtpError};
use crate::instance::Problem;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Single-source Dijkstra over edge lengths.
///
/// Returns the distance to every node (infinite when unreachable) and the
/// predecessor of every node on its shortest path from `source`.
pub fn shortest_paths_from(problem: &Problem, source: usize) -> (Vec<f64>, Vec<Option<usize>>) {
    let n = problem.num_cities();
    let mut distances = vec![f64::INFINITY; n];
    let mut predecessors = vec![None; n];
    let mut heap = BinaryHeap::new();

    distances[source] = 0.0;
    heap.push(Reverse((OrderedFloat(0.0), source)));

    while let Some(Reverse((OrderedFloat(dist), node))) = heap.pop() {
        if dist > distances[node] {
            continue;
        }
        for &(next, weight) in problem.neighbors(node) {
            let candidate = dist + weight;
            if candidate < distances[next] {
                distances[next] = candidate;
                predecessors[next] = Some(node);
                heap.push(Reverse((OrderedFloat(candidate), next)));
            }
        }
    }

    (distances, predecessors)
}

/// Walk a predecessor table back from `to` to `from`.
pub(crate) fn rebuild_path(predecessors: &[Option<usize>], from: usize, to: usize) -> Option<Vec<usize>> {
    let mut path = vec![to];
    let mut node = to;
    while node != from {
        node = predecessors[node]?;
        path.push(node);
        if path.len() > predecessors.len() {
            return None;
        }
    }
    path.reverse();
    Some(path)
}

/// Precomputed distances, paths and gold for one instance
#[derive(Debug, Clone)]
pub struct DistanceCache {
    num_cities: usize,
    alpha: f64,
    beta: f64,
    /// Row-major N×N shortest distances
    distances: Vec<f64>,
    /// Row `i` holds the predecessor table of the Dijkstra run from `i`
    predecessors: Vec<Option<usize>>,
    gold: Vec<f64>,
}

impl DistanceCache {
    /// Run Dijkstra from every node.
    ///
    /// Fails with [`TtpError::Disconnected`] if any pair of nodes has no path.
    pub fn new(problem: &Problem) -> Result<Self> {
        let n = problem.num_cities();
        log::info!("Precomputing shortest paths for {} cities...", n);

        let mut distances = vec![0.0; n * n];
        let mut predecessors = vec![None; n * n];

        for source in 0..n {
            let (dist, pred) = shortest_paths_from(problem, source);
            if let Some(to) = dist.iter().position(|d| d.is_infinite()) {
                return Err(TtpError::Disconnected { from: source, to });
            }
            distances[source * n..(source + 1) * n].copy_from_slice(&dist);
            predecessors[source * n..(source + 1) * n].copy_from_slice(&pred);
        }

        // Force exact symmetry, Dijkstra sums can differ in the last bits
        for i in 0..n {
            for j in i + 1..n {
                let d = distances[i * n + j].min(distances[j * n + i]);
                distances[i * n + j] = d;
                distances[j * n + i] = d;
            }
        }

        log::info!("Precomputation complete");

        Ok(DistanceCache {
            num_cities: n,
            alpha: problem.alpha,
            beta: problem.beta,
            distances,
            predecessors,
            gold: problem.cities().iter().map(|c| c.gold).collect(),
        })
    }

    /// Number of nodes, depot included
    #[inline]
    pub fn num_cities(&self) -> usize {
        self.num_cities
    }

    /// Target cities `1..N`
    pub fn cities(&self) -> Vec<usize> {
        (1..self.num_cities).collect()
    }

    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[inline]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[i * self.num_cities + j]
    }

    /// Shortest node sequence from `i` to `j`, both endpoints included
    pub fn path(&self, i: usize, j: usize) -> Vec<usize> {
        let row = &self.predecessors[i * self.num_cities..(i + 1) * self.num_cities];
        match rebuild_path(row, i, j) {
            Some(path) => path,
            None => {
                log::warn!("no stored path from {} to {}, using a direct hop", i, j);
                vec![i, j]
            }
        }
    }

    #[inline]
    pub fn gold(&self, city: usize) -> f64 {
        self.gold[city]
    }

    /// Gold indexed by city
    pub fn gold_table(&self) -> &[f64] {
        &self.gold
    }

    /// Total gold over all cities
    pub fn total_gold(&self) -> f64 {
        self.gold.iter().sum()
    }

    /// `distance + (alpha * distance * load)^beta`
    #[inline]
    pub fn cost(&self, i: usize, j: usize, load: f64) -> f64 {
        self.travel_cost(self.distance(i, j), load)
    }

    /// Cost of walking `dist` with a constant `load`
    #[inline]
    pub fn travel_cost(&self, dist: f64, load: f64) -> f64 {
        dist + (self.alpha * dist * load).powf(self.beta)
    }

    /// Load-dependent part of [`DistanceCache::cost`]
    #[inline]
    pub fn load_penalty(&self, i: usize, j: usize, load: f64) -> f64 {
        (self.alpha * self.distance(i, j) * load).powf(self.beta)
    }
}
