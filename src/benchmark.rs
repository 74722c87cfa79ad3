//! Benchmarking and experimentation module.
//!
//! Provides tools for running the construction heuristics and the search
//! portfolio over sets of instances, collecting statistics, and comparing
//! algorithm performance.

use crate::cancel::CancellationToken;
use crate::error::{Result, SchedError};
use crate::heuristics::construction::MultiStartConstruction;
use crate::heuristics::portfolio::Portfolio;
use crate::instance::{Cost, Instance};
use crate::solution::Solution;

use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    pub num_jobs: usize,
    /// Repetition index
    pub run: usize,
    /// Total weighted tardiness
    pub cost: Cost,
    /// Computation time in seconds
    pub time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
    /// Gap to best known in percent (if available)
    pub gap_to_best: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    /// Number of recorded runs
    pub num_runs: usize,
    pub avg_cost: f64,
    pub best_cost: Cost,
    pub worst_cost: Cost,
    /// Sample standard deviation of cost
    pub std_cost: f64,
    pub avg_time: f64,
    pub total_time: f64,
    /// Average gap to best known
    pub avg_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of portfolio runs per instance
    pub num_runs: usize,
    /// Base seed; run `r` uses `seed + r`
    pub seed: Option<u64>,
    /// Display a progress bar
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            seed: None,
            show_progress: true,
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    best_known: HashMap<String, Cost>,
    started: DateTime<Local>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            best_known: HashMap::new(),
            started: Local::now(),
        }
    }

    /// Set best known solution for an instance
    pub fn set_best_known(&mut self, instance_name: &str, cost: Cost) {
        self.best_known.insert(instance_name.to_string(), cost);
    }

    /// Run all construction heuristics on an instance, returning the cheapest.
    pub fn run_construction_heuristics(&mut self, instance: &Instance) -> Result<Solution> {
        let multi = MultiStartConstruction::with_all_heuristics();
        let solutions = multi.construct_all(instance)?;
        for solution in &solutions {
            self.record_result(instance, solution, 0);
        }
        solutions
            .into_iter()
            .min_by_key(|s| s.cost)
            .ok_or_else(|| SchedError::InvalidParameter("no construction heuristic".to_string()))
    }

    /// Run the standard portfolio `num_runs` times from `initial`.
    pub fn run_portfolio(
        &mut self,
        instance: &Instance,
        initial: &Solution,
        cancel: &CancellationToken,
    ) -> Result<()> {
        for run in 0..self.config.num_runs {
            if cancel.is_cancelled() {
                log::warn!("Benchmark cancelled on {} at run {}", instance.name, run);
                break;
            }
            let portfolio = Portfolio::standard(self.config.seed.map(|s| s + run as u64));
            let result = portfolio.run(instance, initial, cancel)?;
            for solution in &result.solutions {
                self.record_result(instance, solution, run);
            }
        }
        Ok(())
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(&mut self, instance: &Instance, cancel: &CancellationToken) -> Result<()> {
        log::info!("Running benchmark on instance: {}", instance.name);

        let initial = self.run_construction_heuristics(instance)?;
        self.run_portfolio(instance, &initial, cancel)
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[Instance], cancel: &CancellationToken) -> Result<()> {
        let progress = if self.config.show_progress {
            let bar = ProgressBar::new(instances.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        for instance in instances {
            if cancel.is_cancelled() {
                break;
            }
            progress.set_message(instance.name.clone());
            self.run_full_benchmark(instance, cancel)?;
            progress.inc(1);
        }
        progress.finish_and_clear();

        self.update_gaps();
        Ok(())
    }

    /// Record a result
    fn record_result(&mut self, instance: &Instance, solution: &Solution, run: usize) {
        let best = self
            .best_known
            .entry(instance.name.clone())
            .or_insert(solution.cost);
        if solution.cost < *best {
            *best = solution.cost;
        }

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            num_jobs: instance.num_jobs(),
            run,
            cost: solution.cost,
            time: solution.computation_time,
            iterations: solution.iterations,
            gap_to_best: None,
        });
    }

    /// Recompute every gap against the current best known costs.
    pub fn update_gaps(&mut self) {
        for result in &mut self.results {
            result.gap_to_best = self.best_known.get(&result.instance).and_then(|&best| {
                if best > 0 {
                    Some((result.cost - best) as f64 / best as f64 * 100.0)
                } else if result.cost == 0 {
                    Some(0.0)
                } else {
                    None
                }
            });
        }
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<&str, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map
                .entry(result.algorithm.as_str())
                .or_default()
                .push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = stats_map
            .into_iter()
            .map(|(algo, results)| {
                let costs: Vec<f64> = results.iter().map(|r| r.cost as f64).collect();
                let times: Vec<f64> = results.iter().map(|r| r.time).collect();
                let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_best).collect();

                let (avg_cost, std_cost) = mean_std(&costs);

                AlgorithmStatistics {
                    algorithm: algo.to_string(),
                    num_runs: results.len(),
                    avg_cost,
                    best_cost: results.iter().map(|r| r.cost).min().unwrap_or(0),
                    worst_cost: results.iter().map(|r| r.cost).max().unwrap_or(0),
                    std_cost,
                    avg_time: mean_std(&times).0,
                    total_time: times.iter().sum(),
                    avg_gap: if gaps.is_empty() {
                        None
                    } else {
                        Some(mean_std(&gaps).0)
                    },
                }
            })
            .collect();

        statistics.sort_by(|a, b| {
            a.avg_cost
                .total_cmp(&b.avg_cost)
                .then_with(|| a.algorithm.cmp(&b.algorithm))
        });

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result).map_err(io::Error::from)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat).map_err(io::Error::from)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("   Weighted Tardiness Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Started: {}\n\n",
            self.started.format("%Y-%m-%d %H:%M:%S")
        ));

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(96).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<45} {:>6} {:>12} {:>10} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Avg Cost", "Std", "Avg Gap%", "Avg Time"
        ));
        report.push_str("-".repeat(96).as_str());
        report.push('\n');

        for stat in &stats {
            let gap_str = stat
                .avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!(
                "{:<45} {:>6} {:>12.1} {:>10.1} {:>10} {:>10.4}\n",
                stat.algorithm, stat.num_runs, stat.avg_cost, stat.std_cost, gap_str, stat.avg_time
            ));
        }

        report.push_str("-".repeat(96).as_str());
        report.push('\n');

        report.push_str("\nBest Solutions per Instance:\n");

        let mut instance_best: HashMap<&str, &AlgorithmResult> = HashMap::new();
        for result in &self.results {
            let entry = instance_best.entry(result.instance.as_str()).or_insert(result);
            if result.cost < entry.cost {
                *entry = result;
            }
        }

        let mut names: Vec<_> = instance_best.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            let best = instance_best[name];
            report.push_str(&format!("  {}: {} ({})\n", name, best.cost, best.algorithm));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Get best known values
    pub fn best_known(&self) -> &HashMap<String, Cost> {
        &self.best_known
    }
}

/// Mean and sample standard deviation (0 for fewer than two values).
fn mean_std(values: &[f64]) -> (f64, f64) {
    use statrs::statistics::Statistics;

    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().mean();
    let std = if values.len() > 1 {
        values.iter().std_dev()
    } else {
        0.0
    };
    (mean, std)
}

/// Load every `.txt` / `.dat` instance of a directory, skipping unreadable
/// files, sorted by job count.
pub fn load_instances_from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Instance>> {
    let mut instances = Vec::new();

    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        let is_instance = path
            .extension()
            .map(|e| e == "txt" || e == "dat")
            .unwrap_or(false);
        if !is_instance {
            continue;
        }
        match Instance::from_file(&path) {
            Ok(instance) => instances.push(instance),
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    instances.sort_by(|a, b| a.num_jobs().cmp(&b.num_jobs()).then_with(|| a.name.cmp(&b.name)));

    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::testing::random_instance;
    use crate::solution::identity_schedule;

    fn quiet_config(num_runs: usize) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs,
            seed: Some(1),
            show_progress: false,
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
    }

    #[test]
    fn test_statistics_and_gaps() {
        let instance = random_instance(10, 1);
        let mut bench = Benchmark::new(quiet_config(1));
        for cost in [10, 20, 30] {
            let mut solution = Solution::from_schedule(&instance, identity_schedule(10), "algo").unwrap();
            solution.cost = cost;
            bench.record_result(&instance, &solution, 0);
        }
        bench.update_gaps();

        assert_eq!(bench.best_known()[&instance.name], 10);
        let stats = bench.compute_statistics();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].num_runs, 3);
        assert_eq!(stats[0].best_cost, 10);
        assert_eq!(stats[0].worst_cost, 30);
        assert!((stats[0].avg_cost - 20.0).abs() < 1e-9);
        assert!((stats[0].std_cost - 10.0).abs() < 1e-9);
        assert!((stats[0].avg_gap.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_construction_returns_cheapest_recorded() {
        let instance = random_instance(20, 4);
        let mut bench = Benchmark::new(quiet_config(1));
        let best = bench.run_construction_heuristics(&instance).unwrap();

        assert_eq!(bench.results().len(), 8);
        let min = bench.results().iter().map(|r| r.cost).min().unwrap();
        assert_eq!(best.cost, min);
        assert_eq!(best.cost, instance.evaluate(&best.schedule).unwrap());
    }

    #[test]
    fn test_full_benchmark() {
        let instances = vec![random_instance(15, 2), random_instance(12, 3)];
        let mut bench = Benchmark::new(quiet_config(1));
        bench
            .run_on_instances(&instances, &CancellationToken::new())
            .unwrap();

        // 8 constructions and 6 searches per instance
        assert_eq!(bench.results().len(), 2 * (8 + 6));
        let report = bench.generate_report();
        assert!(report.contains("random_15_2"));
        assert!(report.contains("HC-best-cssn"));
    }

    #[test]
    fn test_export_csv() {
        let instance = random_instance(8, 4);
        let mut bench = Benchmark::new(quiet_config(1));
        bench.run_construction_heuristics(&instance).unwrap();

        let path = std::env::temp_dir().join(format!("smwt_bench_{}.csv", std::process::id()));
        bench.export_to_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("algorithm,instance,num_jobs,run,cost"));
        assert_eq!(content.lines().count(), 1 + 8);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_instances_from_dir() {
        let dir = std::env::temp_dir().join(format!("smwt_instances_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.txt"), "2\n1 1 1\n2 1 2\n").unwrap();
        std::fs::write(dir.join("a.dat"), "3\n1 1 1\n2 1 2\n3 1 3\n").unwrap();
        std::fs::write(dir.join("broken.txt"), "2\n1 1\n").unwrap();
        std::fs::write(dir.join("notes.md"), "ignored").unwrap();

        let instances = load_instances_from_dir(&dir).unwrap();
        let names: Vec<_> = instances.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
