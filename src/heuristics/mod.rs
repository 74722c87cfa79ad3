//! Heuristics module for single-machine weighted tardiness.
//!
//! This module exports the construction heuristics, the neighborhoods and
//! the improvement heuristics built on them.

pub mod construction;
pub mod ils;
pub mod local_search;
pub mod neighborhood;
pub mod perturbation;
pub mod portfolio;
pub mod selection;

pub use construction::*;
pub use ils::*;
pub use local_search::*;
pub use neighborhood::*;
pub use perturbation::*;
pub use portfolio::*;
pub use selection::*;

#[cfg(test)]
pub(crate) mod testing {
    use crate::instance::{Instance, Job};
    use crate::solution::make_rng;
    use rand::Rng;

    /// Reproducible instance whose due dates spread over the makespan.
    pub fn random_instance(n: usize, seed: u64) -> Instance {
        let mut rng = make_rng(Some(seed)).unwrap();
        let jobs: Vec<Job> = (0..n)
            .map(|_| Job::new(rng.gen_range(1..=10), rng.gen_range(1..=5), 0))
            .collect();
        let makespan: i64 = jobs.iter().map(|j| j.processing_time).sum();
        let jobs = jobs
            .into_iter()
            .map(|job| Job {
                due_time: rng.gen_range(0..=makespan),
                ..job
            })
            .collect();
        Instance::new(&format!("random_{}_{}", n, seed), jobs)
    }
}
