//! Independent searches run in parallel from the same starting schedule.
//!
//! Every search works on its own copy of the schedule and only shares the
//! read-only instance and the cancellation token. The caller waits for all
//! of them before the best result is picked.

use crate::cancel::CancellationToken;
use crate::error::{Result, SchedError};
use crate::heuristics::ils::IteratedLocalSearch;
use crate::heuristics::local_search::{HillClimbing, LocalSearch};
use crate::heuristics::neighborhood::NeighborhoodKind;
use crate::instance::Instance;
use crate::solution::Solution;
use rayon::prelude::*;
use std::time::Instant;

/// Solutions of every search, in registration order.
#[derive(Debug, Clone)]
pub struct PortfolioResult {
    pub solutions: Vec<Solution>,
    /// Index of the cheapest solution (first on ties)
    pub best: usize,
}

impl PortfolioResult {
    pub fn best(&self) -> &Solution {
        &self.solutions[self.best]
    }
}

pub struct Portfolio {
    searches: Vec<Box<dyn LocalSearch + Send + Sync>>,
}

impl Portfolio {
    pub fn new() -> Self {
        Portfolio {
            searches: Vec::new(),
        }
    }

    /// Best-improvement hill climbing on consecutive swap and full reverse
    /// in both directions and on sliding reverse<10>, plus an iterated local
    /// search on sliding reverse<10>.
    pub fn standard(seed: Option<u64>) -> Self {
        let mut portfolio = Portfolio::new();
        for kind in [
            NeighborhoodKind::ConsecutiveSwap,
            NeighborhoodKind::ConsecutiveSwap.backward(),
            NeighborhoodKind::Reverse,
            NeighborhoodKind::Reverse.backward(),
            NeighborhoodKind::sliding(10),
        ] {
            portfolio.add_search(HillClimbing::best_improvement(kind));
        }
        portfolio.add_search(IteratedLocalSearch::new().seed(seed));
        portfolio
    }

    pub fn add_search<L: LocalSearch + Send + Sync + 'static>(&mut self, search: L) {
        self.searches.push(Box::new(search));
    }

    pub fn len(&self) -> usize {
        self.searches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.searches.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.searches.iter().map(|s| s.name()).collect()
    }

    /// Run every search from `initial` and wait for all of them.
    pub fn run(
        &self,
        instance: &Instance,
        initial: &Solution,
        cancel: &CancellationToken,
    ) -> Result<PortfolioResult> {
        if self.searches.is_empty() {
            return Err(SchedError::InvalidParameter(
                "portfolio has no search".to_string(),
            ));
        }
        log::info!(
            "Running {} searches on {} from cost {}",
            self.searches.len(),
            instance.name,
            initial.cost
        );

        let solutions = self
            .searches
            .par_iter()
            .map(|search| {
                let start = Instant::now();
                let mut solution = initial.clone();
                let outcome = search.improve(instance, &mut solution, cancel)?;
                solution.algorithm = search.name();
                solution.computation_time = start.elapsed().as_secs_f64();
                solution.iterations = Some(outcome.iterations);
                log::info!(
                    "{}: cost {} ({:?}, {:.3}s)",
                    solution.algorithm,
                    solution.cost,
                    outcome.termination,
                    solution.computation_time
                );
                Ok(solution)
            })
            .collect::<Result<Vec<Solution>>>()?;

        let best = solutions
            .iter()
            .enumerate()
            .min_by_key(|(i, s)| (s.cost, *i))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Ok(PortfolioResult { solutions, best })
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::standard(None)
    }
}
