//! Module for parsing and representing single-machine scheduling instances.
//!
//! An instance file starts with the number of jobs, followed by one
//! `processing_time weight due_time` record per job. Jobs are numbered by
//! their position in the file, starting at 0.

use crate::error::{Result, SchedError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Time unit of the machine.
pub type SchedTime = i64;
/// Weighted tardiness.
pub type Cost = i64;

/// A job to be processed on the single machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Position of the job in the input order
    pub no: usize,
    /// Processing time (non-negative)
    pub processing_time: SchedTime,
    /// Tardiness weight (non-negative)
    pub weight: i64,
    /// Due time, may be exceeded
    pub due_time: SchedTime,
}

impl Default for Job {
    fn default() -> Self {
        Job {
            no: 0,
            processing_time: 0,
            weight: 1,
            due_time: 0,
        }
    }
}

impl Job {
    pub fn new(processing_time: SchedTime, weight: i64, due_time: SchedTime) -> Self {
        Job {
            no: 0,
            processing_time,
            weight,
            due_time,
        }
    }

    /// Signed lateness when the job starts at `start_time` (negative when early).
    #[inline]
    pub fn get_sdelay(&self, start_time: SchedTime) -> SchedTime {
        start_time + self.processing_time - self.due_time
    }

    /// Tardiness when the job starts at `start_time`.
    #[inline]
    pub fn get_delay(&self, start_time: SchedTime) -> SchedTime {
        self.get_sdelay(start_time).max(0)
    }

    #[inline]
    pub fn get_cost(&self, start_time: SchedTime) -> Cost {
        self.weight * self.get_delay(start_time)
    }
}

/// A complete set of jobs, shared read-only by every search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the instance (file stem when loaded from disk)
    pub name: String,
    /// Jobs in input order; `jobs[i].no == i`
    pub jobs: Vec<Job>,
}

impl Instance {
    /// Build an instance from jobs in input order, renumbering them.
    pub fn new(name: &str, jobs: Vec<Job>) -> Self {
        let jobs = jobs
            .into_iter()
            .enumerate()
            .map(|(no, job)| Job { no, ..job })
            .collect();
        Instance {
            name: name.to_string(),
            jobs,
        }
    }

    /// Parse an instance file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let name = path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::parse(&name, &content)
    }

    /// Parse the textual instance format.
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let mut tokens = content.lines().enumerate().flat_map(|(line_no, line)| {
            line.split_whitespace().map(move |tok| (line_no + 1, tok))
        });

        let (line, count_tok) = tokens.next().ok_or(SchedError::Parse {
            line: 1,
            message: "missing job count".to_string(),
        })?;
        let count: usize = count_tok.parse().map_err(|_| SchedError::Parse {
            line,
            message: format!("invalid job count '{}'", count_tok),
        })?;

        let mut jobs = Vec::with_capacity(count);
        let mut last_line = line;
        for no in 0..count {
            let mut field = |what: &str| -> Result<i64> {
                let (line, tok) = tokens.next().ok_or_else(|| SchedError::Parse {
                    line: last_line,
                    message: format!("job {}: missing {}", no, what),
                })?;
                last_line = line;
                tok.parse::<i64>().map_err(|_| SchedError::Parse {
                    line,
                    message: format!("job {}: invalid {} '{}'", no, what, tok),
                })
            };

            let processing_time = field("processing time")?;
            let weight = field("weight")?;
            let due_time = field("due time")?;

            if processing_time < 0 || weight < 0 {
                return Err(SchedError::Parse {
                    line: last_line,
                    message: format!("job {}: processing time and weight must be non-negative", no),
                });
            }

            jobs.push(Job {
                no,
                processing_time,
                weight,
                due_time,
            });
        }

        log::debug!("Parsed instance {} with {} jobs", name, jobs.len());

        Ok(Instance {
            name: name.to_string(),
            jobs,
        })
    }

    #[inline]
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Total weighted tardiness of `schedule`.
    ///
    /// Fails with [`SchedError::InvalidSchedule`] unless `schedule` is a
    /// permutation of `0..num_jobs()`.
    pub fn evaluate(&self, schedule: &[usize]) -> Result<Cost> {
        let n = self.jobs.len();
        let mut seen = vec![false; n];
        let mut unique = 0;
        for &no in schedule {
            if no < n && !seen[no] {
                seen[no] = true;
                unique += 1;
            }
        }
        if schedule.len() != n || unique != n {
            return Err(SchedError::InvalidSchedule {
                jobs: n,
                unique,
                len: schedule.len(),
            });
        }

        Ok(self.evaluate_unchecked(schedule))
    }

    /// Same walk as [`Instance::evaluate`] without the permutation check.
    ///
    /// Callers must guarantee `schedule` is a permutation, which every
    /// neighbor produced from a valid schedule is.
    pub fn evaluate_unchecked(&self, schedule: &[usize]) -> Cost {
        let mut cost: Cost = 0;
        let mut curr_time: SchedTime = 0;
        for &no in schedule {
            let job = &self.jobs[no];
            cost += job.get_cost(curr_time);
            curr_time += job.processing_time;
        }
        cost
    }

    /// Completion time of every position of `schedule`.
    pub fn completion_times(&self, schedule: &[usize]) -> Vec<SchedTime> {
        schedule
            .iter()
            .scan(0, |time, &no| {
                *time += self.jobs[no].processing_time;
                Some(*time)
            })
            .collect()
    }

    pub fn total_processing_time(&self) -> SchedTime {
        self.jobs.iter().map(|j| j.processing_time).sum()
    }

    /// Get descriptive statistics of the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.jobs.len();
        let total_processing_time = self.total_processing_time();
        let total_weight = self.jobs.iter().map(|j| j.weight).sum();
        let min_due = self.jobs.iter().map(|j| j.due_time).min().unwrap_or(0);
        let max_due = self.jobs.iter().map(|j| j.due_time).max().unwrap_or(0);
        let avg_processing_time = if n > 0 {
            total_processing_time as f64 / n as f64
        } else {
            0.0
        };
        let always_late = self.jobs.iter().filter(|j| j.get_sdelay(0) > 0).count();
        let late_at_end = self
            .jobs
            .iter()
            .filter(|j| j.due_time < total_processing_time)
            .count();

        InstanceStatistics {
            name: self.name.clone(),
            num_jobs: n,
            total_processing_time,
            avg_processing_time,
            total_weight,
            min_due,
            max_due,
            always_late,
            late_at_end,
        }
    }
}

/// Descriptive statistics for an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_jobs: usize,
    pub total_processing_time: SchedTime,
    pub avg_processing_time: f64,
    pub total_weight: i64,
    pub min_due: SchedTime,
    pub max_due: SchedTime,
    /// Jobs late even when scheduled first
    pub always_late: usize,
    /// Jobs whose due time is before the makespan
    pub late_at_end: usize,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Jobs: {}", self.num_jobs)?;
        writeln!(f, "  Makespan: {}", self.total_processing_time)?;
        writeln!(f, "  Avg processing time: {:.2}", self.avg_processing_time)?;
        writeln!(f, "  Total weight: {}", self.total_weight)?;
        writeln!(f, "  Due times: [{}, {}]", self.min_due, self.max_due)?;
        writeln!(f, "  Late even if first: {}", self.always_late)?;
        write!(f, "  Due before makespan: {}", self.late_at_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_instance() -> Instance {
        Instance::new(
            "small",
            vec![Job::new(2, 1, 2), Job::new(1, 2, 1), Job::new(3, 1, 10)],
        )
    }

    #[test]
    fn test_job_delay_and_cost() {
        let job = Job::new(3, 2, 5);
        assert_eq!(job.get_sdelay(0), -2);
        assert_eq!(job.get_delay(0), 0);
        assert_eq!(job.get_delay(4), 2);
        assert_eq!(job.get_cost(4), 4);
    }

    #[test]
    fn test_default_weight_is_one() {
        assert_eq!(Job::default().weight, 1);
    }

    #[test]
    fn test_evaluate_example() {
        let instance = small_instance();
        assert_eq!(instance.evaluate(&[0, 1, 2]).unwrap(), 4);
        assert_eq!(instance.completion_times(&[0, 1, 2]), vec![2, 3, 6]);
    }

    #[test]
    fn test_evaluate_other_order() {
        let instance = small_instance();
        // 1 completes at 1 (on time), 0 at 3 (late 1), 2 at 6 (on time)
        assert_eq!(instance.evaluate(&[1, 0, 2]).unwrap(), 1);
    }

    #[test]
    fn test_evaluate_rejects_duplicates() {
        let instance = small_instance();
        let err = instance.evaluate(&[0, 0, 2]).unwrap_err();
        assert!(matches!(
            err,
            SchedError::InvalidSchedule { jobs: 3, unique: 2, len: 3 }
        ));
    }

    #[test]
    fn test_evaluate_rejects_size_mismatch() {
        let instance = small_instance();
        assert!(instance.evaluate(&[0, 1]).is_err());
        assert!(instance.evaluate(&[0, 1, 2, 0]).is_err());
        assert!(instance.evaluate(&[0, 1, 7]).is_err());
    }

    #[test]
    fn test_parse_instance() {
        let content = "3\n2 1 2\n1 2 1\n3 1 10\n";
        let instance = Instance::parse("test", content).unwrap();
        assert_eq!(instance.num_jobs(), 3);
        assert_eq!(instance.jobs[1], Job { no: 1, processing_time: 1, weight: 2, due_time: 1 });
        assert_eq!(instance.evaluate(&[0, 1, 2]).unwrap(), 4);
    }

    #[test]
    fn test_parse_tolerates_layout() {
        let content = "2 4 1\n 7\n\n5 3 -2";
        let instance = Instance::parse("test", content).unwrap();
        assert_eq!(instance.jobs[0].due_time, 7);
        assert_eq!(instance.jobs[1].due_time, -2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Instance::parse("empty", "").is_err());
        assert!(Instance::parse("short", "2\n1 1 1\n").is_err());
        assert!(Instance::parse("garbage", "1\n1 x 1\n").is_err());
        assert!(Instance::parse("negative", "1\n-1 1 1\n").is_err());
    }

    #[test]
    fn test_parse_error_lines() {
        let line_of = |content: &str| match Instance::parse("bad", content) {
            Err(SchedError::Parse { line, .. }) => line,
            other => panic!("expected parse error, got {:?}", other),
        };
        assert_eq!(line_of("2\n1 1 1\n"), 2);
        assert_eq!(line_of("2\n1 1 1\n4 2\n"), 3);
        assert_eq!(line_of("2\n1 1 1\n\n2 -3 1\n"), 4);
        assert_eq!(line_of("1\n1 x 1\n"), 2);
    }

    #[test]
    fn test_statistics() {
        let stats = small_instance().statistics();
        assert_eq!(stats.num_jobs, 3);
        assert_eq!(stats.total_processing_time, 6);
        assert_eq!(stats.always_late, 0);
        assert_eq!(stats.late_at_end, 2);
    }
}
