//! Iterated local search.
//!
//! The loop alternates a perturbation of the incumbent with a local search
//! from the perturbed schedule. Every local optimum it reaches is appended
//! to a [`History`]; an [`Acceptance`] rule decides whether it replaces the
//! incumbent and a [`StopRule`] inspects the history to end the run. The
//! result is the cheapest schedule of the whole history, so a cancelled run
//! still returns everything it found.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::heuristics::local_search::{HillClimbing, LocalSearch, SearchOutcome, Termination};
use crate::heuristics::neighborhood::NeighborhoodKind;
use crate::heuristics::perturbation::{FixedDistance, Perturbation};
use crate::instance::{Cost, Instance};
use crate::solution::{make_rng, Schedule, Solution};
use rand_chacha::ChaCha8Rng;

/// A local optimum reached during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub schedule: Schedule,
    pub cost: Cost,
}

/// Append-only record of the local optima of one run, oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        History {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Index of the oldest entry of minimum cost.
    pub fn best_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(i, entry)| (entry.cost, *i))
            .map(|(i, _)| i)
    }

    pub fn best(&self) -> Option<&HistoryEntry> {
        self.best_index().map(|i| &self.entries[i])
    }

    /// Number of entries recorded after the oldest minimum.
    pub fn since_best(&self) -> usize {
        self.best_index()
            .map(|i| self.entries.len() - 1 - i)
            .unwrap_or(0)
    }
}

/// Decides what happens to a new local optimum.
pub trait Acceptance {
    /// Record `candidate` in `history`, replacing `incumbent` if accepted.
    fn accept(&self, incumbent: &mut HistoryEntry, candidate: HistoryEntry, history: &mut History);

    fn name(&self) -> String;
}

/// Elitist acceptance: the incumbent only changes for a strictly cheaper
/// schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptBest;

impl Acceptance for AcceptBest {
    fn accept(&self, incumbent: &mut HistoryEntry, candidate: HistoryEntry, history: &mut History) {
        let better = candidate.cost < incumbent.cost;
        if better {
            *incumbent = candidate.clone();
        }
        history.push(candidate);
    }

    fn name(&self) -> String {
        "accept-best".to_string()
    }
}

pub trait StopRule {
    fn should_stop(&self, history: &History) -> bool;

    fn name(&self) -> String;
}

/// Stop after `n` local optima in a row failed to beat the best one.
#[derive(Debug, Clone, Copy)]
pub struct StopNWorse {
    pub n: usize,
}

impl StopNWorse {
    pub fn new(n: usize) -> Self {
        StopNWorse { n }
    }
}

impl Default for StopNWorse {
    fn default() -> Self {
        StopNWorse { n: 20 }
    }
}

impl StopRule for StopNWorse {
    fn should_stop(&self, history: &History) -> bool {
        let dist = history.since_best();
        log::debug!("stop_{}_worse: dist: {}", self.n, dist);
        dist >= self.n
    }

    fn name(&self) -> String {
        format!("stop-{}-worse", self.n)
    }
}

/// Result of one ILS run.
#[derive(Debug, Clone)]
pub struct IlsOutcome {
    /// Cheapest schedule of the history
    pub best: Schedule,
    pub best_cost: Cost,
    /// Perturb and re-optimize rounds completed
    pub iterations: usize,
    pub history_len: usize,
    pub termination: Termination,
}

impl IlsOutcome {
    pub fn cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }
}

/// Iterated Local Search
///
/// Applies local search, then perturbation, then local search again.
pub struct IteratedLocalSearch {
    pub local_search: Box<dyn LocalSearch + Send + Sync>,
    pub perturbation: Box<dyn Perturbation + Send + Sync>,
    pub acceptance: Box<dyn Acceptance + Send + Sync>,
    pub stop: Box<dyn StopRule + Send + Sync>,
    /// Optional cap on the number of rounds
    pub max_iterations: Option<usize>,
    /// Random seed, drawn from the OS when absent
    pub seed: Option<u64>,
}

impl IteratedLocalSearch {
    /// Best-improvement hill climbing on sliding reverse<10>, perturbed by
    /// 10 random moves of the same neighborhood, stopping after 20
    /// non-improving rounds.
    pub fn new() -> Self {
        IteratedLocalSearch {
            local_search: Box::new(HillClimbing::best_improvement(NeighborhoodKind::sliding(10))),
            perturbation: Box::new(FixedDistance::default()),
            acceptance: Box::new(AcceptBest),
            stop: Box::new(StopNWorse::default()),
            max_iterations: None,
            seed: None,
        }
    }

    pub fn with_params<L, P>(local_search: L, perturbation: P, stop_after: usize) -> Self
    where
        L: LocalSearch + Send + Sync + 'static,
        P: Perturbation + Send + Sync + 'static,
    {
        IteratedLocalSearch {
            local_search: Box::new(local_search),
            perturbation: Box::new(perturbation),
            acceptance: Box::new(AcceptBest),
            stop: Box::new(StopNWorse::new(stop_after)),
            max_iterations: None,
            seed: None,
        }
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Run the search from `initial`.
    pub fn run(
        &self,
        instance: &Instance,
        initial: Schedule,
        cancel: &CancellationToken,
        rng: &mut ChaCha8Rng,
    ) -> Result<IlsOutcome> {
        let name = self.name();
        let mut start = Solution::from_schedule(instance, initial, &name)?;
        if start.schedule.len() < 2 {
            return Ok(IlsOutcome {
                best_cost: start.cost,
                best: start.schedule,
                iterations: 0,
                history_len: 1,
                termination: Termination::LocalOptimum,
            });
        }

        self.local_search.improve(instance, &mut start, cancel)?;
        let mut incumbent = HistoryEntry {
            schedule: start.schedule,
            cost: start.cost,
        };
        let mut history = History::new();
        history.push(incumbent.clone());
        log::debug!("{}: initial local optimum cost {}", name, incumbent.cost);

        let mut perturbation = self.perturbation.fresh();
        let mut iterations = 0;
        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if self.max_iterations.is_some_and(|max| iterations >= max) {
                break Termination::IterationLimit;
            }

            let perturbed = perturbation.perturb(&incumbent.schedule, &history, rng)?;
            let mut candidate = Solution::from_schedule(instance, perturbed, &name)?;
            let outcome = self.local_search.improve(instance, &mut candidate, cancel)?;
            iterations += 1;

            log::debug!(
                "{}: iteration {} candidate cost {} (incumbent {})",
                name,
                iterations,
                candidate.cost,
                incumbent.cost
            );

            self.acceptance.accept(
                &mut incumbent,
                HistoryEntry {
                    schedule: candidate.schedule,
                    cost: candidate.cost,
                },
                &mut history,
            );

            if outcome.termination == Termination::Cancelled {
                break Termination::Cancelled;
            }
            if self.stop.should_stop(&history) {
                break Termination::Stopped;
            }
        };

        let best = history.best().cloned().unwrap_or(incumbent);
        log::info!(
            "{}: {:?} after {} iterations, best cost {}",
            name,
            termination,
            iterations,
            best.cost
        );

        Ok(IlsOutcome {
            best: best.schedule,
            best_cost: best.cost,
            iterations,
            history_len: history.len(),
            termination,
        })
    }
}

impl Default for IteratedLocalSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for IteratedLocalSearch {
    fn improve(
        &self,
        instance: &Instance,
        solution: &mut Solution,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let initial_cost = instance.evaluate(&solution.schedule)?;
        let mut rng = make_rng(self.seed)?;
        let outcome = self.run(instance, solution.schedule.clone(), cancel, &mut rng)?;

        solution.schedule = outcome.best;
        solution.cost = outcome.best_cost;
        solution.iterations = Some(outcome.iterations);

        Ok(SearchOutcome {
            improved: outcome.best_cost < initial_cost,
            iterations: outcome.iterations,
            termination: outcome.termination,
        })
    }

    fn name(&self) -> String {
        format!(
            "ILS({}, {}, {}, {})",
            self.local_search.name(),
            self.perturbation.name(),
            self.acceptance.name(),
            self.stop.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::local_search::VND;
    use crate::heuristics::perturbation::AdaptiveDistance;
    use crate::heuristics::testing::random_instance;
    use crate::instance::Job;
    use crate::solution::{identity_schedule, random_schedule};
    use std::time::Duration;

    fn entry(cost: Cost) -> HistoryEntry {
        HistoryEntry {
            schedule: Vec::new(),
            cost,
        }
    }

    fn history_of(costs: &[Cost]) -> History {
        let mut history = History::new();
        for &cost in costs {
            history.push(entry(cost));
        }
        history
    }

    #[test]
    fn test_stop_n_worse_counts_after_best() {
        let stop = StopNWorse::new(3);
        // best at position 2
        assert!(!stop.should_stop(&history_of(&[5, 4, 2])));
        assert!(!stop.should_stop(&history_of(&[5, 4, 2, 3])));
        assert!(!stop.should_stop(&history_of(&[5, 4, 2, 3, 3])));
        assert!(stop.should_stop(&history_of(&[5, 4, 2, 3, 3, 4])));
    }

    #[test]
    fn test_stop_n_worse_ties_do_not_reset() {
        let history = history_of(&[5, 2, 2, 2]);
        assert_eq!(history.best_index(), Some(1));
        assert_eq!(history.since_best(), 2);
        assert!(StopNWorse::new(2).should_stop(&history));
    }

    #[test]
    fn test_accept_best() {
        let mut history = history_of(&[10]);
        let mut incumbent = entry(10);

        AcceptBest.accept(&mut incumbent, entry(12), &mut history);
        assert_eq!(incumbent.cost, 10);
        AcceptBest.accept(&mut incumbent, entry(10), &mut history);
        assert_eq!(incumbent.cost, 10);
        AcceptBest.accept(&mut incumbent, entry(7), &mut history);
        assert_eq!(incumbent.cost, 7);

        assert_eq!(history.len(), 4);
        assert_eq!(history.last().map(|e| e.cost), Some(7));
    }

    #[test]
    fn test_ils_not_worse_than_first_local_optimum() {
        let instance = random_instance(40, 21);
        let initial = random_schedule(40, &mut make_rng(Some(1)).unwrap());

        let mut local = Solution::from_schedule(&instance, initial.clone(), "hc").unwrap();
        HillClimbing::best_improvement(NeighborhoodKind::sliding(10))
            .improve(&instance, &mut local, &CancellationToken::new())
            .unwrap();

        let ils = IteratedLocalSearch::new().seed(Some(8));
        let outcome = ils
            .run(&instance, initial, &CancellationToken::new(), &mut make_rng(Some(8)).unwrap())
            .unwrap();

        assert!(outcome.best_cost <= local.cost);
        assert_eq!(outcome.best_cost, instance.evaluate(&outcome.best).unwrap());
        assert_eq!(outcome.termination, Termination::Stopped);
        assert_eq!(outcome.history_len, outcome.iterations + 1);
        assert!(outcome.iterations >= 20);
    }

    #[test]
    fn test_ils_is_reproducible() {
        let instance = random_instance(30, 4);
        let ils = IteratedLocalSearch::with_params(
            VND::new(),
            AdaptiveDistance::default(),
            5,
        )
        .seed(Some(17));

        let mut a = Solution::from_schedule(&instance, identity_schedule(30), "a").unwrap();
        let mut b = Solution::from_schedule(&instance, identity_schedule(30), "b").unwrap();
        ils.improve(&instance, &mut a, &CancellationToken::new()).unwrap();
        ils.improve(&instance, &mut b, &CancellationToken::new()).unwrap();

        assert_eq!(a.schedule, b.schedule);
        assert_eq!(a.cost, b.cost);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_ils_iteration_limit() {
        let instance = random_instance(20, 2);
        let ils = IteratedLocalSearch::with_params(
            VND::new(),
            FixedDistance::new(NeighborhoodKind::Reverse, 3).unwrap(),
            usize::MAX,
        )
        .max_iterations(Some(7));

        let outcome = ils
            .run(&instance, identity_schedule(20), &CancellationToken::new(), &mut make_rng(Some(3)).unwrap())
            .unwrap();

        assert_eq!(outcome.iterations, 7);
        assert_eq!(outcome.history_len, 8);
        assert_eq!(outcome.termination, Termination::IterationLimit);
    }

    #[test]
    fn test_ils_cancelled_before_start() {
        let instance = random_instance(20, 6);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = IteratedLocalSearch::new()
            .run(&instance, identity_schedule(20), &cancel, &mut make_rng(Some(1)).unwrap())
            .unwrap();

        assert!(outcome.cancelled());
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.best, identity_schedule(20));
    }

    #[test]
    fn test_ils_cancelled_from_another_thread() {
        let instance = random_instance(40, 9);
        let ils = IteratedLocalSearch::with_params(
            HillClimbing::first_improvement(NeighborhoodKind::ConsecutiveSwap),
            FixedDistance::new(NeighborhoodKind::Reverse, 5).unwrap(),
            usize::MAX,
        );
        let cancel = CancellationToken::new();
        let remote = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });

        let outcome = ils
            .run(&instance, identity_schedule(40), &cancel, &mut make_rng(Some(2)).unwrap())
            .unwrap();
        handle.join().unwrap();

        assert!(outcome.cancelled());
        assert_eq!(outcome.best_cost, instance.evaluate(&outcome.best).unwrap());
        assert!(outcome.best_cost <= instance.evaluate(&identity_schedule(40)).unwrap());
    }

    #[test]
    fn test_ils_single_job() {
        let instance = Instance::new("one", vec![Job::new(3, 1, 1)]);
        let outcome = IteratedLocalSearch::new()
            .run(&instance, vec![0], &CancellationToken::new(), &mut make_rng(Some(1)).unwrap())
            .unwrap();
        assert_eq!(outcome.best, vec![0]);
        assert_eq!(outcome.best_cost, 2);
    }

    #[test]
    fn test_ils_name() {
        let name = IteratedLocalSearch::new().name();
        assert_eq!(
            name,
            "ILS(HC-best-srn10, fixed-10xsrn10, accept-best, stop-20-worse)"
        );
    }
}
