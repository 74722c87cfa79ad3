//! Weighted Tardiness Solver - Command Line Interface
//!
//! Heuristic solver for single-machine total weighted tardiness scheduling.

use clap::{Parser, Subcommand, ValueEnum};
use smwt_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use smwt_solver::cancel::CancellationToken;
use smwt_solver::error::Result;
use smwt_solver::heuristics::construction::*;
use smwt_solver::heuristics::ils::{AcceptBest, IteratedLocalSearch, StopNWorse};
use smwt_solver::heuristics::local_search::*;
use smwt_solver::heuristics::neighborhood::NeighborhoodKind;
use smwt_solver::heuristics::perturbation::{AdaptiveDistance, FixedDistance, Perturbation};
use smwt_solver::heuristics::portfolio::Portfolio;
use smwt_solver::heuristics::selection::*;
use smwt_solver::instance::Instance;
use smwt_solver::solution::{make_rng, random_schedule, read_schedule, write_schedule, Solution};

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "smwt-solver")]
#[command(version = "1.0")]
#[command(about = "Heuristic solver for single-machine weighted tardiness scheduling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Improve a schedule with one algorithm
    Solve {
        #[arg(short, long)]
        instance: PathBuf,

        /// Initial schedule file; the best construction heuristic otherwise
        #[arg(long)]
        schedule: Option<PathBuf>,

        /// Algorithm to use
        #[arg(short, long, value_enum, default_value = "ils")]
        algorithm: Algorithm,

        /// Neighborhood short name: cssn, rn, srn{k}, prefixed by b for backward
        #[arg(short, long, default_value = "srn10")]
        neighborhood: NeighborhoodKind,

        /// Selection policy of the hill climbing
        #[arg(short, long, value_enum, default_value = "best")]
        policy: Policy,

        /// Candidates examined by the best-of-first policy
        #[arg(long, default_value = "10")]
        first_n: usize,

        /// Perturbation of the iterated local search
        #[arg(long, value_enum, default_value = "fixed")]
        perturbation: PerturbationKind,

        /// Random moves per perturbation (initial step when adaptive)
        #[arg(long, default_value = "10")]
        distance: usize,

        /// Stop after this many non-improving iterations
        #[arg(long, default_value = "20")]
        stop_after: usize,

        #[arg(long)]
        max_iterations: Option<usize>,

        /// Random seed, drawn from the OS when absent
        #[arg(short, long)]
        seed: Option<u64>,

        /// Write the schedule, one job per line
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the solution as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum instance size
        #[arg(long)]
        max_size: Option<usize>,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Run the standard search portfolio in parallel on an instance
    Compare {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Initial schedule file; the best construction heuristic otherwise
        #[arg(long)]
        schedule: Option<PathBuf>,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory receiving one gen_sol_{cost}_{name}.txt per search
        #[arg(short, long, default_value = "sols")]
        output_dir: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Best construction heuristic only
    Construct,
    /// Hill climbing
    Hc,
    /// Variable Neighborhood Descent
    Vnd,
    /// Iterated Local Search
    Ils,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Policy {
    Best,
    Worst,
    First,
    BestOfFirst,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum PerturbationKind {
    Fixed,
    Adaptive,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("Interrupted, finishing with the best schedule found so far...");
        handler_token.cancel();
    }) {
        log::warn!("Cannot install Ctrl-C handler: {}", e);
    }

    let outcome = match cli.command {
        Commands::Solve {
            instance,
            schedule,
            algorithm,
            neighborhood,
            policy,
            first_n,
            perturbation,
            distance,
            stop_after,
            max_iterations,
            seed,
            output,
            json,
            verbose,
        } => {
            let options = SolveOptions {
                algorithm,
                neighborhood,
                policy,
                first_n,
                perturbation,
                distance,
                stop_after,
                max_iterations,
                seed,
            };
            solve_instance(&instance, schedule.as_deref(), &options, output, json, verbose, &cancel)
        }

        Commands::Benchmark {
            dir,
            output,
            runs,
            seed,
            max_size,
        } => run_benchmark(&dir, &output, runs, seed, max_size, &cancel),

        Commands::Analyze { instance } => analyze_instance(&instance, &cancel),

        Commands::Compare {
            instance,
            schedule,
            seed,
            output_dir,
        } => compare_algorithms(&instance, schedule.as_deref(), seed, &output_dir, &cancel),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct SolveOptions {
    algorithm: Algorithm,
    neighborhood: NeighborhoodKind,
    policy: Policy,
    first_n: usize,
    perturbation: PerturbationKind,
    distance: usize,
    stop_after: usize,
    max_iterations: Option<usize>,
    seed: Option<u64>,
}

fn build_policy(policy: Policy, first_n: usize) -> Result<Box<dyn SelectionPolicy + Send + Sync>> {
    Ok(match policy {
        Policy::Best => Box::new(Best),
        Policy::Worst => Box::new(Worst),
        Policy::First => Box::new(First),
        Policy::BestOfFirst => Box::new(BestOfFirst::new(first_n)?),
    })
}

fn build_search(options: &SolveOptions) -> Result<Option<Box<dyn LocalSearch + Send + Sync>>> {
    let hill_climbing = || -> Result<HillClimbing> {
        Ok(HillClimbing {
            neighborhood: options.neighborhood.clone(),
            policy: build_policy(options.policy, options.first_n)?,
        })
    };

    let search: Box<dyn LocalSearch + Send + Sync> = match options.algorithm {
        Algorithm::Construct => return Ok(None),
        Algorithm::Hc => Box::new(hill_climbing()?),
        Algorithm::Vnd => Box::new(VND::new()),
        Algorithm::Ils => {
            let perturbation: Box<dyn Perturbation + Send + Sync> = match options.perturbation {
                PerturbationKind::Fixed => Box::new(FixedDistance::new(
                    options.neighborhood.clone(),
                    options.distance,
                )?),
                PerturbationKind::Adaptive => Box::new(AdaptiveDistance::with_params(
                    options.neighborhood.clone(),
                    1.05,
                    options.distance,
                    options.distance.max(100),
                )?),
            };
            Box::new(IteratedLocalSearch {
                local_search: Box::new(hill_climbing()?),
                perturbation,
                acceptance: Box::new(AcceptBest),
                stop: Box::new(StopNWorse::new(options.stop_after)),
                max_iterations: options.max_iterations,
                seed: options.seed,
            })
        }
    };
    Ok(Some(search))
}

/// The user schedule when given, otherwise the cheapest of a random
/// schedule and every construction heuristic.
fn initial_solution(instance: &Instance, schedule: Option<&Path>, seed: Option<u64>) -> Result<Solution> {
    if let Some(path) = schedule {
        let schedule = read_schedule(path, instance.num_jobs())?;
        let solution = Solution::from_schedule(instance, schedule, "user")?;
        println!("{:<35} {}", "user schedule", solution.cost);
        return Ok(solution);
    }

    let mut rng = make_rng(seed)?;
    let mut best = Solution::from_schedule(instance, random_schedule(instance.num_jobs(), &mut rng), "random")?;
    println!("{:<35} {}", best.algorithm, best.cost);

    for solution in MultiStartConstruction::with_all_heuristics().construct_all(instance)? {
        println!("{:<35} {}", solution.algorithm, solution.cost);
        if solution.cost < best.cost {
            best = solution;
        }
    }
    println!("Starting from {} (cost {})", best.algorithm, best.cost);
    Ok(best)
}

fn solve_instance(
    path: &Path,
    schedule: Option<&Path>,
    options: &SolveOptions,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    verbose: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    println!("Loading instance from {:?}...", path);
    let instance = Instance::from_file(path)?;

    if verbose {
        println!("{}\n", instance.statistics());
    }

    let mut solution = initial_solution(&instance, schedule, options.seed)?;
    let initial_cost = solution.cost;

    let start = Instant::now();
    if let Some(search) = build_search(options)? {
        println!("Solving with {}...", search.name());
        let outcome = search.improve(&instance, &mut solution, cancel)?;
        solution.algorithm = search.name();
        solution.iterations = Some(outcome.iterations);
        if outcome.termination == Termination::Cancelled {
            println!("Search cancelled, keeping the best schedule found");
        }
    }
    solution.computation_time = start.elapsed().as_secs_f64();

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Initial cost: {}", initial_cost);
    println!("Cost: {}", solution.cost);
    println!("Time: {:.4}s", solution.computation_time);
    if let Some(iter) = solution.iterations {
        println!("Iterations: {}", iter);
    }

    if verbose {
        println!("\nSchedule: {:?}", solution.schedule);
        println!("Completion times: {:?}", instance.completion_times(&solution.schedule));
    }

    if let Some(out_path) = output {
        write_schedule(&out_path, &solution.schedule)?;
        println!("\nSchedule saved to {:?}", out_path);
    }

    if let Some(json_path) = json {
        let content = serde_json::to_string_pretty(&solution).map_err(std::io::Error::from)?;
        std::fs::write(&json_path, content)?;
        println!("Solution saved to {:?}", json_path);
    }

    Ok(())
}

fn run_benchmark(
    dir: &Path,
    output: &Path,
    runs: usize,
    seed: Option<u64>,
    max_size: Option<usize>,
    cancel: &CancellationToken,
) -> Result<()> {
    println!("Loading instances from {:?}...", dir);

    let mut instances = load_instances_from_dir(dir)?;

    if let Some(max) = max_size {
        instances.retain(|i| i.num_jobs() <= max);
    }

    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return Ok(());
    }

    std::fs::create_dir_all(output)?;

    let config = BenchmarkConfig {
        num_runs: runs,
        seed,
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_on_instances(&instances, cancel)?;

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

fn analyze_instance(path: &Path, cancel: &CancellationToken) -> Result<()> {
    let instance = Instance::from_file(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    println!("\nConstruction Heuristics:");
    for solution in MultiStartConstruction::with_all_heuristics().construct_all(&instance)? {
        println!("  {:<35} {}", solution.algorithm, solution.cost);
    }

    let multi = MultiStartConstruction::with_all_heuristics();
    let mut multi_sol = multi.construct(&instance)?;
    let multi_cost = multi_sol.cost;
    VND::new().improve(&instance, &mut multi_sol, cancel)?;

    println!("\nQuick Solution Estimates:");
    println!("  Multi-Start: {}", multi_cost);
    println!("  Multi-Start + VND: {}", multi_sol.cost);

    Ok(())
}

/// File-name-safe form of an algorithm name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

fn compare_algorithms(
    path: &Path,
    schedule: Option<&Path>,
    seed: Option<u64>,
    output_dir: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let instance = Instance::from_file(path)?;
    println!("Comparing searches on {} (n={})...\n", instance.name, instance.num_jobs());

    let initial = initial_solution(&instance, schedule, seed)?;
    let portfolio = Portfolio::standard(seed);
    let result = portfolio.run(&instance, &initial, cancel)?;

    std::fs::create_dir_all(output_dir)?;

    println!("\n========== Summary ==========");
    println!("{:<65} {:>10} {:>10}", "Algorithm", "Cost", "Time");
    println!("{}", "-".repeat(87));
    for solution in &result.solutions {
        println!(
            "{:<65} {:>10} {:>9.3}s",
            solution.algorithm, solution.cost, solution.computation_time
        );
        let file = output_dir.join(format!(
            "gen_sol_{}_{}.txt",
            solution.cost,
            file_stem(&solution.algorithm)
        ));
        write_schedule(&file, &solution.schedule)?;
    }

    let best = result.best();
    println!("\nBest: {} (cost {})", best.algorithm, best.cost);
    println!("Solutions written to {:?}", output_dir);

    Ok(())
}
