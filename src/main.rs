//! TTP Solver - Command Line Interface
//!
//! Solves, benchmarks, analyzes and generates gold-collecting TTP instances.

use clap::{Parser, Subcommand, ValueEnum};
use ttp_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use ttp_solver::heuristics::construction::{ConstructionHeuristic, NearestNeighborHeuristic, SweepHeuristic};
use ttp_solver::heuristics::{solve, Algorithm, GaEvaluation, SolverConfig};
use ttp_solver::instance::Problem;
use ttp_solver::precompute::DistanceCache;
use ttp_solver::split::{Evaluator, GreedyReturnEvaluator, SplitEvaluator};
use ttp_solver::Result;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ttp-solver")]
#[command(version = "0.1")]
#[command(about = "Genetic and ant colony solvers for the gold-collecting Traveling Thief Problem")]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve one instance
    Solve {
        /// JSON instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "hybrid")]
        algorithm: AlgorithmArg,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        tuning: Tuning,

        /// Output solution to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full step trace
        #[arg(long)]
        show_steps: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing JSON instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Seed of the first run
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Algorithms to compare
        #[arg(short, long, value_enum, value_delimiter = ',', default_value = "ga,aco,hybrid")]
        algorithms: Vec<AlgorithmArg>,

        #[command(flatten)]
        tuning: Tuning,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,

        /// Show a progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Analyze an instance
    Analyze {
        /// JSON instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Generate a random connected instance
    Generate {
        /// Number of cities including the depot
        #[arg(short = 'n', long, default_value = "100")]
        cities: usize,

        /// Probability of an extra edge between two cities
        #[arg(short, long, default_value = "0.2")]
        density: f64,

        #[arg(long, default_value = "1.0")]
        alpha: f64,

        #[arg(long, default_value = "1.0")]
        beta: f64,

        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Where to write the JSON instance
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum AlgorithmArg {
    /// Genetic Algorithm with Split decoding
    Ga,
    /// Ant Colony Optimization
    Aco,
    /// ACS with Inver-Over and trip optimization
    Hybrid,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Ga => Algorithm::Genetic,
            AlgorithmArg::Aco => Algorithm::Aco,
            AlgorithmArg::Hybrid => Algorithm::Hybrid,
        }
    }
}

/// Solver knobs shared by `solve` and `benchmark`
#[derive(clap::Args, Debug)]
struct Tuning {
    /// GA population size
    #[arg(long)]
    population: Option<usize>,

    /// GA generations
    #[arg(long)]
    generations: Option<usize>,

    /// Split window, 0 for the unbounded DP
    #[arg(long)]
    split_window: Option<usize>,

    /// Decode GA routes with the greedy-return rule instead of Split
    #[arg(long)]
    greedy_return: bool,

    /// Ants per iteration (ACO and hybrid)
    #[arg(long)]
    ants: Option<usize>,

    /// Colony iterations (ACO and hybrid)
    #[arg(long)]
    iterations: Option<usize>,

    /// Keep the hybrid's single-trip plan
    #[arg(long)]
    no_trip_opt: bool,

    /// Largest trip count tried by the trip optimizer
    #[arg(long)]
    max_trips: Option<usize>,
}

impl Tuning {
    fn solver_config(&self, seed: u64) -> SolverConfig {
        let mut config = SolverConfig::default().with_seed(seed);

        if let Some(population) = self.population {
            config.ga.population_size = population;
        }
        if let Some(generations) = self.generations {
            config.ga.max_generations = generations;
        }
        if let Some(window) = self.split_window {
            config.ga.split_window = if window == 0 { None } else { Some(window) };
        }
        if self.greedy_return {
            config.ga.evaluation = GaEvaluation::GreedyReturn;
        }
        if let Some(ants) = self.ants {
            config.aco.num_ants = ants;
            config.hybrid.num_ants = ants;
        }
        if let Some(iterations) = self.iterations {
            config.aco.max_iterations = iterations;
            config.hybrid.max_iterations = iterations;
        }
        if self.no_trip_opt {
            config.hybrid.optimize_trips = false;
        }
        if let Some(max_trips) = self.max_trips {
            config.hybrid.max_trips = max_trips;
        }

        config
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let outcome = match cli.command {
        Commands::Solve { instance, algorithm, seed, tuning, output, show_steps } => {
            solve_instance(&instance, algorithm.into(), &tuning.solver_config(seed), output, show_steps)
        }

        Commands::Benchmark { dir, output, runs, seed, algorithms, tuning, max_size, progress } => {
            let config = BenchmarkConfig {
                num_runs: runs,
                base_seed: seed,
                algorithms: algorithms.into_iter().map(Algorithm::from).collect(),
                solver: tuning.solver_config(seed),
                show_progress: progress,
            };
            run_benchmark(&dir, &output, config, max_size)
        }

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Generate { cities, density, alpha, beta, seed, output } => {
            generate_instance(cities, density, alpha, beta, seed, &output)
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve_instance(
    path: &Path,
    algorithm: Algorithm,
    config: &SolverConfig,
    output: Option<PathBuf>,
    show_steps: bool,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let problem = Problem::from_file(path)?;
    println!("{}", problem.statistics());

    let cache = DistanceCache::new(&problem)?;
    let baseline = problem.baseline()?;

    let solution = solve(&problem, &cache, algorithm, config);
    solution.verify(&cache)?;

    println!("\n========== Results ==========");
    println!("{}", solution);
    println!("Baseline: {:.2}", baseline);
    if baseline > 0.0 {
        println!("Improvement over baseline: {:.2}%", (baseline - solution.cost) / baseline * 100.0);
    }

    if show_steps {
        let trace: Vec<(usize, f64)> = solution.steps.iter().map(|s| (s.city, s.gold)).collect();
        println!("\nSteps: {:?}", trace);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&out_path, json)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    Ok(())
}

fn run_benchmark(dir: &Path, output: &Path, config: BenchmarkConfig, max_size: Option<usize>) -> Result<()> {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir);

    if let Some(max) = max_size {
        instances.retain(|p| p.num_cities() <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }

    std::fs::create_dir_all(output)?;

    let mut benchmark = Benchmark::new(config);

    for (i, problem) in instances.iter().enumerate() {
        println!("\n[{}/{}] Processing {} (n={})...",
            i + 1, instances.len(), problem.name, problem.num_cities());

        if let Err(e) = benchmark.run(problem) {
            log::error!("Skipping {}: {}", problem.name, e);
        }
    }

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<()> {
    let problem = Problem::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", problem.statistics());

    let cache = DistanceCache::new(&problem)?;

    let golds: Vec<f64> = cache.cities().into_iter().map(|c| cache.gold(c)).collect();
    if !golds.is_empty() {
        let avg_gold = golds.iter().sum::<f64>() / golds.len() as f64;
        let min_gold = golds.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_gold = golds.iter().cloned().fold(0.0, f64::max);

        println!("Gold Statistics:");
        println!("  Average: {:.2}", avg_gold);
        println!("  Min: {:.2}", min_gold);
        println!("  Max: {:.2}", max_gold);
    }

    let baseline = problem.baseline()?;
    let nn_route = NearestNeighborHeuristic::new().construct(&problem, &cache);
    let sweep_route = SweepHeuristic::new().construct(&problem, &cache);
    let split = SplitEvaluator::default();

    println!("\nQuick Solution Estimates:");
    println!("  Baseline (one trip per city): {:.2}", baseline);
    println!("  Nearest Neighbor + Split: {:.2}", split.evaluate(&nn_route, &cache).cost);
    println!("  Sweep + Split: {:.2}", split.evaluate(&sweep_route, &cache).cost);
    println!("  Sweep + GreedyReturn: {:.2}", GreedyReturnEvaluator.evaluate(&sweep_route, &cache).cost);

    Ok(())
}

fn generate_instance(cities: usize, density: f64, alpha: f64, beta: f64, seed: u64, output: &Path) -> Result<()> {
    let problem = Problem::generate(cities, density, alpha, beta, seed)?;
    problem.save(output)?;

    println!("{}", problem.statistics());
    println!("Instance saved to {:?}", output);
    Ok(())
}
