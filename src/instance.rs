//! Module for representing TTP problem instances.
//!
//! An instance is an undirected, connected graph whose node 0 is the depot and
//! every other node holds some gold. Moving along a path of length `d` while
//! carrying `w` gold costs `d + (alpha * d * w)^beta`.
//!
//! Instances are either generated from a seed (uniform cities in the unit
//! square, random extra edges on top of a connecting chain) or loaded from JSON.

use crate::error::{Result, TtpError};
use crate::precompute::{rebuild_path, shortest_paths_from};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Represents a city (graph node) of the instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    /// Node identifier, equal to its index (0 is the depot)
    pub id: usize,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Gold available at this city (0 at the depot)
    pub gold: f64,
}

impl City {
    pub fn new(id: usize, x: f64, y: f64, gold: f64) -> Self {
        City { id, x, y, gold }
    }

    /// Check if this city is the depot
    pub fn is_depot(&self) -> bool {
        self.id == 0
    }
}

/// Undirected weighted edge
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    /// Edge length, strictly positive
    pub dist: f64,
}

impl Edge {
    pub fn new(from: usize, to: usize, dist: f64) -> Self {
        Edge { from, to, dist }
    }
}

/// Represents a complete TTP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    /// Name of the instance
    pub name: String,
    /// Load scale in the cost model
    pub alpha: f64,
    /// Load exponent in the cost model
    pub beta: f64,
    cities: Vec<City>,
    edges: Vec<Edge>,
    #[serde(skip)]
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl Problem {
    /// Build an instance from explicit cities and edges.
    ///
    /// City `i` must have id `i`, the depot must hold no gold, gold must be
    /// non-negative and every edge must join two distinct cities with a
    /// positive length. Connectivity is checked later by the distance cache.
    pub fn new(name: &str, alpha: f64, beta: f64, cities: Vec<City>, edges: Vec<Edge>) -> Result<Self> {
        let mut problem = Problem {
            name: name.to_string(),
            alpha,
            beta,
            cities,
            edges,
            adjacency: Vec::new(),
        };
        problem.validate()?;
        problem.build_adjacency();
        Ok(problem)
    }

    /// Generate a random instance.
    ///
    /// The depot sits at (0.5, 0.5), the other cities are uniform in the unit
    /// square with gold in [1, 1000). Consecutive cities are always linked so
    /// the graph is connected; every other pair gets an edge with probability
    /// `density`. Edge lengths are Euclidean.
    pub fn generate(num_cities: usize, density: f64, alpha: f64, beta: f64, seed: u64) -> Result<Self> {
        if num_cities == 0 {
            return Err(TtpError::InvalidInstance("an instance needs at least the depot".to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut cities = Vec::with_capacity(num_cities);
        cities.push(City::new(0, 0.5, 0.5, 0.0));
        for id in 1..num_cities {
            let x = rng.gen::<f64>();
            let y = rng.gen::<f64>();
            let gold = 1.0 + 999.0 * rng.gen::<f64>();
            cities.push(City::new(id, x, y, gold));
        }

        let mut edges = Vec::new();
        for i in 0..num_cities {
            for j in i + 1..num_cities {
                if j == i + 1 || rng.gen::<f64>() < density {
                    let dx = cities[i].x - cities[j].x;
                    let dy = cities[i].y - cities[j].y;
                    // Coincident points would give a zero-length edge
                    let dist = (dx * dx + dy * dy).sqrt().max(1e-9);
                    edges.push(Edge::new(i, j, dist));
                }
            }
        }

        let name = format!("ttp-n{}-d{}-a{}-b{}-s{}", num_cities, density, alpha, beta, seed);
        Problem::new(&name, alpha, beta, cities, edges)
    }

    /// Load an instance from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let mut problem: Problem = serde_json::from_reader(BufReader::new(file))?;
        problem.validate()?;
        problem.build_adjacency();
        Ok(problem)
    }

    /// Save the instance as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(TtpError::InvalidInstance("missing depot".to_string()));
        }
        if !self.alpha.is_finite() || !self.beta.is_finite() {
            return Err(TtpError::InvalidInstance("alpha and beta must be finite".to_string()));
        }
        for (index, city) in self.cities.iter().enumerate() {
            if city.id != index {
                return Err(TtpError::InvalidInstance(
                    format!("city at index {} has id {}", index, city.id)));
            }
            if !city.gold.is_finite() || city.gold < 0.0 {
                return Err(TtpError::InvalidInstance(
                    format!("city {} has invalid gold {}", index, city.gold)));
            }
        }
        if self.cities[0].gold != 0.0 {
            return Err(TtpError::InvalidInstance("the depot cannot hold gold".to_string()));
        }

        let n = self.cities.len();
        for edge in &self.edges {
            if edge.from >= n || edge.to >= n || edge.from == edge.to {
                return Err(TtpError::InvalidInstance(
                    format!("invalid edge ({}, {})", edge.from, edge.to)));
            }
            if !edge.dist.is_finite() || edge.dist <= 0.0 {
                return Err(TtpError::InvalidInstance(
                    format!("edge ({}, {}) has non-positive length {}", edge.from, edge.to, edge.dist)));
            }
        }
        Ok(())
    }

    fn build_adjacency(&mut self) {
        let mut adjacency = vec![Vec::new(); self.cities.len()];
        for edge in &self.edges {
            adjacency[edge.from].push((edge.to, edge.dist));
            adjacency[edge.to].push((edge.from, edge.dist));
        }
        self.adjacency = adjacency;
    }

    /// Number of nodes, depot included
    #[inline]
    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Neighbours of a node with the connecting edge length
    #[inline]
    pub fn neighbors(&self, city: usize) -> &[(usize, f64)] {
        &self.adjacency[city]
    }

    #[inline]
    pub fn gold(&self, city: usize) -> f64 {
        self.cities[city].gold
    }

    /// Position of a city
    #[inline]
    pub fn position(&self, city: usize) -> (f64, f64) {
        (self.cities[city].x, self.cities[city].y)
    }

    /// Length of the shortest direct edge between two nodes, if any
    pub fn edge_dist(&self, a: usize, b: usize) -> Option<f64> {
        self.adjacency[a].iter()
            .filter(|&&(to, _)| to == b)
            .map(|&(_, dist)| dist)
            .fold(None, |best, d| Some(best.map_or(d, |b: f64| b.min(d))))
    }

    /// Cost of walking `path` while carrying a constant `load`.
    ///
    /// `D + (alpha * D * load)^beta` where `D` is the summed edge length.
    /// Returns infinity when two consecutive nodes are not adjacent.
    pub fn cost(&self, path: &[usize], load: f64) -> f64 {
        if path.len() < 2 {
            return 0.0;
        }

        let mut dist = 0.0;
        for pair in path.windows(2) {
            match self.edge_dist(pair[0], pair[1]) {
                Some(d) => dist += d,
                None => return f64::INFINITY,
            }
        }

        dist + (self.alpha * dist * load).powf(self.beta)
    }

    /// Reference cost of the naive strategy: one round trip per city.
    ///
    /// Each city is reached along its shortest path from the depot empty and
    /// left carrying its gold, costing every edge separately.
    pub fn baseline(&self) -> Result<f64> {
        let (_, predecessors) = shortest_paths_from(self, 0);
        let mut total_cost = 0.0;

        for dest in 1..self.num_cities() {
            let path = rebuild_path(&predecessors, 0, dest)
                .ok_or(TtpError::Disconnected { from: 0, to: dest })?;
            let gold = self.gold(dest);

            for pair in path.windows(2) {
                total_cost += self.cost(pair, 0.0);
                total_cost += self.cost(pair, gold);
            }
        }

        Ok(total_cost)
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.num_cities();
        let (distances, _) = shortest_paths_from(self, 0);

        let reachable: Vec<f64> = distances.iter()
            .skip(1)
            .cloned()
            .filter(|d| d.is_finite())
            .collect();
        let avg_depot_distance = if reachable.is_empty() {
            0.0
        } else {
            reachable.iter().sum::<f64>() / reachable.len() as f64
        };
        let max_depot_distance = reachable.iter().cloned().fold(0.0, f64::max);

        let pairs = n * n.saturating_sub(1) / 2;
        let density = if pairs > 0 { self.edges.len() as f64 / pairs as f64 } else { 0.0 };

        InstanceStatistics {
            name: self.name.clone(),
            num_cities: n,
            num_edges: self.edges.len(),
            density,
            alpha: self.alpha,
            beta: self.beta,
            total_gold: self.cities.iter().map(|c| c.gold).sum(),
            avg_depot_distance,
            max_depot_distance,
        }
    }
}

/// Statistics about a TTP instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_cities: usize,
    pub num_edges: usize,
    pub density: f64,
    pub alpha: f64,
    pub beta: f64,
    pub total_gold: f64,
    pub avg_depot_distance: f64,
    pub max_depot_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {} (1 depot + {} targets)", self.num_cities, self.num_cities.saturating_sub(1))?;
        writeln!(f, "  Edges: {} (density {:.3})", self.num_edges, self.density)?;
        writeln!(f, "  Alpha: {}, Beta: {}", self.alpha, self.beta)?;
        writeln!(f, "  Total gold: {:.2}", self.total_gold)?;
        writeln!(f, "  Avg distance from depot: {:.4}", self.avg_depot_distance)?;
        writeln!(f, "  Max distance from depot: {:.4}", self.max_depot_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_chain_instance() -> Problem {
        let cities = vec![
            City::new(0, 0.0, 0.0, 0.0),
            City::new(1, 1.0, 0.0, 10.0),
            City::new(2, 2.0, 0.0, 5.0),
        ];
        let edges = vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 1.0)];
        Problem::new("chain", 1.0, 1.0, cities, edges).unwrap()
    }

    #[test]
    fn test_generate_is_reproducible() {
        let a = Problem::generate(30, 0.2, 1.0, 2.0, 7).unwrap();
        let b = Problem::generate(30, 0.2, 1.0, 2.0, 7).unwrap();

        assert_eq!(a.num_cities(), 30);
        assert_eq!(a.edges().len(), b.edges().len());
        for (ca, cb) in a.cities().iter().zip(b.cities()) {
            assert_eq!(ca.gold, cb.gold);
            assert_eq!(ca.x, cb.x);
        }
        assert_eq!(a.gold(0), 0.0);
        assert_eq!(a.position(0), (0.5, 0.5));
    }

    #[test]
    fn test_generated_chain_keeps_graph_connected() {
        let problem = Problem::generate(25, 0.0, 1.0, 1.0, 3).unwrap();
        assert_eq!(problem.edges().len(), 24);
        let (distances, _) = shortest_paths_from(&problem, 0);
        assert!(distances.iter().all(|d| d.is_finite()));
    }

    #[test]
    fn test_cost_formula() {
        let problem = create_chain_instance();
        // D = 2, load 3 -> 2 + (1 * 2 * 3)^1
        assert!((problem.cost(&[0, 1, 2], 3.0) - 8.0).abs() < 1e-12);
        assert_eq!(problem.cost(&[1], 100.0), 0.0);
        assert!(problem.cost(&[0, 2], 1.0).is_infinite());
    }

    #[test]
    fn test_baseline() {
        let problem = create_chain_instance();
        // city 1: 1 + (1 + 10) = 12
        // city 2: edge (0,1): 1 + (1 + 5), edge (1,2): 1 + (1 + 5) = 14
        assert!((problem.baseline().unwrap() - 26.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_instances_rejected() {
        let cities = vec![City::new(0, 0.0, 0.0, 0.0), City::new(1, 1.0, 0.0, 1.0)];
        assert!(Problem::new("bad", 1.0, 1.0, cities.clone(), vec![Edge::new(0, 1, 0.0)]).is_err());
        assert!(Problem::new("bad", 1.0, 1.0, cities.clone(), vec![Edge::new(0, 5, 1.0)]).is_err());

        let gold_depot = vec![City::new(0, 0.0, 0.0, 3.0), City::new(1, 1.0, 0.0, 1.0)];
        assert!(Problem::new("bad", 1.0, 1.0, gold_depot, vec![Edge::new(0, 1, 1.0)]).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let problem = Problem::generate(12, 0.3, 2.0, 1.5, 11).unwrap();
        let path = std::env::temp_dir().join("ttp_solver_instance_test.json");
        problem.save(&path).unwrap();

        let loaded = Problem::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.num_cities(), problem.num_cities());
        assert_eq!(loaded.neighbors(3).len(), problem.neighbors(3).len());
        assert!((loaded.baseline().unwrap() - problem.baseline().unwrap()).abs() < 1e-9);
    }
}
