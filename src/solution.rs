//! Solution representation and initial-schedule suppliers.
//!
//! A schedule is a permutation of job identities giving the processing
//! order. Solution files hold one job identity per line, in schedule order.

use crate::error::{Result, SchedError};
use crate::instance::{Cost, Instance};
use rand::prelude::*;
use rand::rngs::OsRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// A processing order: a permutation of `0..n`.
pub type Schedule = Vec<usize>;

/// Represents a solution to the scheduling problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Processing order of the jobs
    pub schedule: Schedule,
    /// Total weighted tardiness
    pub cost: Cost,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of iterations (if applicable)
    pub iterations: Option<usize>,
}

impl Solution {
    /// Create a solution from a schedule, evaluating it.
    pub fn from_schedule(instance: &Instance, schedule: Schedule, algorithm: &str) -> Result<Self> {
        let cost = instance.evaluate(&schedule)?;
        Ok(Solution {
            schedule,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            iterations: None,
        })
    }

    /// Re-evaluate the cost of the current schedule.
    pub fn validate(&mut self, instance: &Instance) -> Result<()> {
        self.cost = instance.evaluate(&self.schedule)?;
        Ok(())
    }

    /// Position of a job in the schedule
    pub fn position(&self, job: usize) -> Option<usize> {
        self.schedule.iter().position(|&j| j == job)
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(iter) = self.iterations {
            writeln!(f, "  Iterations: {}", iter)?;
        }
        writeln!(f, "  Schedule: {:?}", self.schedule)
    }
}

/// Jobs in input order.
pub fn identity_schedule(n: usize) -> Schedule {
    (0..n).collect()
}

/// A uniformly shuffled permutation of `0..n`.
pub fn random_schedule(n: usize, rng: &mut ChaCha8Rng) -> Schedule {
    let mut schedule = identity_schedule(n);
    schedule.shuffle(rng);
    schedule
}

/// Seeded generator when `seed` is given, otherwise one seeded from the OS.
pub fn make_rng(seed: Option<u64>) -> Result<ChaCha8Rng> {
    match seed {
        Some(seed) => Ok(ChaCha8Rng::seed_from_u64(seed)),
        None => ChaCha8Rng::from_rng(OsRng).map_err(|e| SchedError::Entropy(e.to_string())),
    }
}

/// Parse a schedule from text, reading exactly `num_jobs` identities.
pub fn parse_schedule(content: &str, num_jobs: usize) -> Result<Schedule> {
    let mut schedule = Vec::with_capacity(num_jobs);
    for (line_no, line) in content.lines().enumerate() {
        for tok in line.split_whitespace() {
            if schedule.len() == num_jobs {
                return Ok(schedule);
            }
            let no = tok.parse::<usize>().map_err(|_| SchedError::Parse {
                line: line_no + 1,
                message: format!("invalid job identity '{}'", tok),
            })?;
            schedule.push(no);
        }
    }

    if schedule.len() < num_jobs {
        return Err(SchedError::Parse {
            line: content.lines().count(),
            message: format!("expected {} job identities, found {}", num_jobs, schedule.len()),
        });
    }
    Ok(schedule)
}

/// Read a solution file.
pub fn read_schedule<P: AsRef<Path>>(path: P, num_jobs: usize) -> Result<Schedule> {
    let content = fs::read_to_string(path)?;
    parse_schedule(&content, num_jobs)
}

/// Write a schedule, one job identity per line.
pub fn write_schedule<P: AsRef<Path>>(path: P, schedule: &[usize]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    for no in schedule {
        writeln!(file, "{}", no)?;
    }
    Ok(())
}
