//! TTP Solver Library
//!
//! Solvers for a gold-collecting variant of the Traveling Thief Problem: a
//! courier leaves depot 0, visits every city of a connected weighted graph,
//! collects all its gold and brings it home. Walking a path of length `d`
//! with load `w` costs `d + (alpha * d * w)^beta`, so heavy loads make it
//! worthwhile to split the tour into several depot round trips.
//!
//! # Features
//!
//! - All-pairs shortest paths cache with the closed-form travel cost
//! - Split dynamic program decoding permutations into optimal trips
//! - Genetic algorithm with order crossover and a memetic 2-opt step
//! - Plain Ant System and a hybrid ACS with Inver-Over refinement
//! - Trip-count optimizer for high load exponents
//! - Benchmarking with CSV export
//!
//! # Example
//!
//! ```no_run
//! use ttp_solver::instance::Problem;
//! use ttp_solver::precompute::DistanceCache;
//! use ttp_solver::heuristics::{solve, Algorithm, SolverConfig};
//!
//! let problem = Problem::generate(50, 0.2, 1.0, 2.0, 42).unwrap();
//! let cache = DistanceCache::new(&problem).unwrap();
//!
//! let solution = solve(&problem, &cache, Algorithm::Hybrid, &SolverConfig::default());
//! solution.verify(&cache).unwrap();
//!
//! println!("Solution cost: {:.2}", solution.cost);
//! ```

pub mod error;
pub mod instance;
pub mod precompute;
pub mod solution;
pub mod split;
pub mod heuristics;
pub mod benchmark;

pub use error::{Result, TtpError};
pub use instance::Problem;
pub use precompute::DistanceCache;
pub use solution::{Solution, Step};
