//! Construction heuristics producing an initial schedule.
//!
//! The priority heuristics build the schedule front to back: at each step
//! the remaining job with the highest score at the current completion time
//! is appended. Ties go to the job that comes first in input order.

use crate::error::{Result, SchedError};
use crate::instance::{Instance, Job, SchedTime};
use crate::solution::{identity_schedule, make_rng, random_schedule, Solution};
use ordered_float::OrderedFloat;
use std::time::Instant;

pub trait ConstructionHeuristic {
    fn construct(&self, instance: &Instance) -> Result<Solution>;
    fn name(&self) -> &str;
}

/// Priority of a job when the machine becomes free at the given time.
pub type ScoreFn = fn(&Job, SchedTime) -> f64;

/// Late jobs by weighted lateness, early jobs by lead divided by weight.
pub fn sdelay_divmul_weight(job: &Job, time: SchedTime) -> f64 {
    let sdelay = job.get_sdelay(time) as f64;
    if sdelay < 0.0 {
        sdelay / job.weight as f64
    } else {
        sdelay * job.weight as f64
    }
}

pub fn sdelay_div_weight(job: &Job, time: SchedTime) -> f64 {
    job.get_sdelay(time) as f64 / job.weight as f64
}

pub fn static_sdelay_div_weight(job: &Job, _time: SchedTime) -> f64 {
    job.get_sdelay(0) as f64 / job.weight as f64
}

pub fn static_sdelay_mul_weight(job: &Job, _time: SchedTime) -> f64 {
    job.get_sdelay(0) as f64 * job.weight as f64
}

pub fn static_sdelay(job: &Job, _time: SchedTime) -> f64 {
    job.get_sdelay(0) as f64
}

/// Earliest due date first.
pub fn static_due(job: &Job, _time: SchedTime) -> f64 {
    -(job.due_time as f64)
}

pub fn static_due_div_weight_mul_time(job: &Job, _time: SchedTime) -> f64 {
    -(job.due_time as f64) * job.processing_time as f64 / job.weight as f64
}

/// Greedy list scheduling driven by a score function.
#[derive(Debug, Clone, Copy)]
pub struct PriorityHeuristic {
    pub name: &'static str,
    pub score: ScoreFn,
}

impl PriorityHeuristic {
    pub fn new(name: &'static str, score: ScoreFn) -> Self {
        PriorityHeuristic { name, score }
    }

    /// Every built-in scoring rule.
    pub fn all() -> Vec<PriorityHeuristic> {
        vec![
            Self::new("sdelay_divmul_weight", sdelay_divmul_weight),
            Self::new("sdelay_div_weight", sdelay_div_weight),
            Self::new("static_sdelay_div_weight", static_sdelay_div_weight),
            Self::new("static_sdelay_mul_weight", static_sdelay_mul_weight),
            Self::new("static_sdelay", static_sdelay),
            Self::new("static_due", static_due),
            Self::new("static_due_div_weight_mul_time", static_due_div_weight_mul_time),
        ]
    }

    /// Build the schedule without evaluating it.
    pub fn schedule(&self, instance: &Instance) -> Vec<usize> {
        let mut remaining = instance.jobs.clone();
        let mut schedule = Vec::with_capacity(remaining.len());
        let mut time: SchedTime = 0;

        while !remaining.is_empty() {
            let mut best = 0;
            let mut best_score = OrderedFloat((self.score)(&remaining[0], time));
            for (i, job) in remaining.iter().enumerate().skip(1) {
                let score = OrderedFloat((self.score)(job, time));
                if score > best_score {
                    best = i;
                    best_score = score;
                }
            }

            let job = remaining.remove(best);
            schedule.push(job.no);
            time += job.processing_time;
        }

        schedule
    }
}

impl ConstructionHeuristic for PriorityHeuristic {
    fn construct(&self, instance: &Instance) -> Result<Solution> {
        let start = Instant::now();
        let mut solution = Solution::from_schedule(instance, self.schedule(instance), self.name)?;
        solution.computation_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Jobs in input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct GivenOrderHeuristic;

impl ConstructionHeuristic for GivenOrderHeuristic {
    fn construct(&self, instance: &Instance) -> Result<Solution> {
        Solution::from_schedule(instance, identity_schedule(instance.num_jobs()), self.name())
    }

    fn name(&self) -> &str {
        "given_order"
    }
}

/// Uniformly shuffled schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomHeuristic {
    /// Random seed, drawn from the OS when absent
    pub seed: Option<u64>,
}

impl RandomHeuristic {
    pub fn new(seed: Option<u64>) -> Self {
        RandomHeuristic { seed }
    }
}

impl ConstructionHeuristic for RandomHeuristic {
    fn construct(&self, instance: &Instance) -> Result<Solution> {
        let mut rng = make_rng(self.seed)?;
        let schedule = random_schedule(instance.num_jobs(), &mut rng);
        Solution::from_schedule(instance, schedule, self.name())
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Runs several heuristics and keeps the cheapest schedule.
pub struct MultiStartConstruction {
    heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>>,
}

impl MultiStartConstruction {
    pub fn new() -> Self {
        MultiStartConstruction {
            heuristics: Vec::new(),
        }
    }

    /// The given order followed by every priority rule.
    pub fn with_all_heuristics() -> Self {
        let mut heuristics: Vec<Box<dyn ConstructionHeuristic + Send + Sync>> =
            vec![Box::new(GivenOrderHeuristic)];
        for heuristic in PriorityHeuristic::all() {
            heuristics.push(Box::new(heuristic));
        }

        MultiStartConstruction { heuristics }
    }

    pub fn add_heuristic<H: ConstructionHeuristic + Send + Sync + 'static>(&mut self, h: H) {
        self.heuristics.push(Box::new(h));
    }

    /// Every heuristic's solution, in registration order.
    pub fn construct_all(&self, instance: &Instance) -> Result<Vec<Solution>> {
        self.heuristics
            .iter()
            .map(|h| h.construct(instance))
            .collect()
    }
}

impl Default for MultiStartConstruction {
    fn default() -> Self {
        Self::with_all_heuristics()
    }
}

impl ConstructionHeuristic for MultiStartConstruction {
    fn construct(&self, instance: &Instance) -> Result<Solution> {
        let start = Instant::now();
        let mut best: Option<Solution> = None;

        for solution in self.construct_all(instance)? {
            log::debug!("{}: cost {}", solution.algorithm, solution.cost);
            if best.as_ref().map_or(true, |b| solution.cost < b.cost) {
                best = Some(solution);
            }
        }

        let mut best = best.ok_or_else(|| {
            SchedError::InvalidParameter("multi-start needs at least one heuristic".to_string())
        })?;
        log::info!("Best construction: {} (cost {})", best.algorithm, best.cost);
        best.computation_time = start.elapsed().as_secs_f64();
        Ok(best)
    }

    fn name(&self) -> &str {
        "multi_start"
    }
}
