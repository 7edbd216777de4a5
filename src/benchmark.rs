//! Benchmarking and experimentation module for the TTP.
//!
//! Runs the solvers over several seeds, collects statistics against the
//! naive one-round-trip-per-city baseline, and exports everything to CSV.

use crate::error::Result;
use crate::heuristics::{solve, Algorithm, SolverConfig};
use crate::instance::Problem;
use crate::precompute::DistanceCache;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution, Max, Median, Min};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    pub num_cities: usize,
    pub alpha: f64,
    pub beta: f64,
    /// Seed of this run
    pub seed: u64,
    /// Solution cost
    pub cost: f64,
    /// One round trip per city
    pub baseline: f64,
    /// Percentage saved over the baseline
    pub improvement_over_baseline: f64,
    /// Depot visits in the trace
    pub trips: usize,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Average cost
    pub avg_cost: f64,
    /// Median cost
    pub median_cost: f64,
    /// Best cost
    pub best_cost: f64,
    /// Worst cost
    pub worst_cost: f64,
    /// Standard deviation of cost
    pub std_cost: f64,
    /// Average improvement over the baseline, in percent
    pub avg_improvement: f64,
    /// Average time
    pub avg_time: f64,
    /// Total time
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs per algorithm
    pub num_runs: usize,
    /// Seed of the first run, later runs count up from it
    pub base_seed: u64,
    /// Algorithms to run
    pub algorithms: Vec<Algorithm>,
    /// Solver settings, the seed is overridden per run
    pub solver: SolverConfig,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 0,
            algorithms: Algorithm::all().to_vec(),
            solver: SolverConfig::default(),
            show_progress: false,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    /// Run every configured algorithm `num_runs` times on one instance
    pub fn run(&mut self, problem: &Problem) -> Result<()> {
        log::info!("Running benchmark on instance: {}", problem.name);

        let cache = DistanceCache::new(problem)?;
        let baseline = problem.baseline()?;
        log::info!("Baseline cost: {:.2}", baseline);

        let total = (self.config.algorithms.len() * self.config.num_runs) as u64;
        let pb = self.progress_bar(total);

        let algorithms = self.config.algorithms.clone();
        for algorithm in algorithms {
            for run in 0..self.config.num_runs {
                let seed = self.config.base_seed + run as u64;
                pb.set_message(format!("{} seed {}", algorithm, seed));

                let solver = self.config.solver.clone().with_seed(seed);
                let solution = solve(problem, &cache, algorithm, &solver);

                if let Err(e) = solution.verify(&cache) {
                    log::warn!("{} (seed {}) returned an invalid trace: {}", algorithm, seed, e);
                }

                self.record_result(problem, baseline, seed, &solution);
                pb.inc(1);
            }
        }

        pb.finish_and_clear();
        Ok(())
    }

    /// Record a result
    pub fn record_result(&mut self, problem: &Problem, baseline: f64, seed: u64, solution: &Solution) {
        let improvement_over_baseline = if baseline > 0.0 {
            (baseline - solution.cost) / baseline * 100.0
        } else {
            0.0
        };

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: problem.name.clone(),
            num_cities: problem.num_cities(),
            alpha: problem.alpha,
            beta: problem.beta,
            seed,
            cost: solution.cost,
            baseline,
            improvement_over_baseline,
            trips: solution.num_trips(),
            time: solution.computation_time,
            iterations: solution.iterations,
        });
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map.entry(result.algorithm.clone())
                .or_insert_with(Vec::new)
                .push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = stats_map
            .into_iter()
            .map(|(algo, results)| {
                let costs = Data::new(results.iter().map(|r| r.cost).collect::<Vec<f64>>());
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let improvements: Vec<f64> = results.iter().map(|r| r.improvement_over_baseline).collect();

                let avg_cost = costs.mean().unwrap_or(f64::NAN);
                // Sample deviation is undefined for a single run
                let std_cost = costs.std_dev().filter(|s| s.is_finite()).unwrap_or(0.0);
                let total_time = times.iter().sum::<f64>();

                AlgorithmStatistics {
                    algorithm: algo,
                    num_runs: results.len(),
                    avg_cost,
                    median_cost: costs.median(),
                    best_cost: costs.min(),
                    worst_cost: costs.max(),
                    std_cost,
                    avg_improvement: improvements.iter().sum::<f64>() / improvements.len() as f64,
                    avg_time: total_time / times.len() as f64,
                    total_time,
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.avg_cost.total_cmp(&b.avg_cost));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("         TTP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(88).as_str());
        report.push('\n');
        report.push_str(&format!("{:<20} {:>6} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Avg Cost", "Best Cost", "Std Dev", "Improv%", "Avg Time"));
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!("{:<20} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>9.2}% {:>10.4}\n",
                stat.algorithm,
                stat.num_runs,
                stat.avg_cost,
                stat.best_cost,
                stat.std_cost,
                stat.avg_improvement,
                stat.avg_time));
        }

        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        let mut best: Vec<_> = instance_best.into_iter().collect();
        best.sort_by(|a, b| a.0.cmp(b.0));
        for (instance, result) in best {
            report.push_str(&format!("  {}: {:.2} ({}, seed {}, baseline {:.2})\n",
                instance, result.cost, result.algorithm, result.seed, result.baseline));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }
}

/// Helper function to load JSON instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Vec<Problem> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match Problem::from_file(&path) {
                    Ok(problem) => instances.push(problem),
                    Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
                }
            }
        }
    }

    // Sort by size
    instances.sort_by_key(|p| p.num_cities());

    instances
}
