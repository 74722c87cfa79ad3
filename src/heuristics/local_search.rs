//! Local search improvement heuristics.
//!
//! This module implements the descent algorithms built on the neighborhoods:
//! - Hill climbing over any neighborhood, with a pluggable selection policy
//! - Variable neighborhood descent, reduced to a single consecutive-swap
//!   neighborhood

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::heuristics::neighborhood::{Move, Neighborhood, NeighborhoodKind};
use crate::heuristics::selection::{Best, First, SelectionPolicy};
use crate::instance::{Cost, Instance};
use crate::solution::Solution;

/// Why a search returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No move of the neighborhood lowers the cost.
    LocalOptimum,
    /// The cancellation token was set; the result is the best found so far.
    Cancelled,
    /// An iteration budget ran out.
    IterationLimit,
    /// A stopping rule fired.
    Stopped,
}

/// Summary of a call to [`LocalSearch::improve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    /// The cost went down
    pub improved: bool,
    /// Moves adopted, or iterations for a metaheuristic
    pub iterations: usize,
    pub termination: Termination,
}

/// Trait for local search improvement methods
pub trait LocalSearch {
    /// Improve `solution` in place, keeping its schedule and cost in sync.
    ///
    /// Fails when the schedule of `solution` is not a permutation of the jobs
    /// of `instance`. Cancellation is a normal outcome, not an error.
    fn improve(
        &self,
        instance: &Instance,
        solution: &mut Solution,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome>;

    fn name(&self) -> String;
}

/// Result of scanning one neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scan {
    /// Selected improving move, relative to the base schedule, and its cost
    pub selected: Option<(Move, Cost)>,
    /// Neighbors evaluated
    pub evaluated: usize,
    pub cancelled: bool,
}

/// Scan `neighborhood` for an improving neighbor according to `policy`.
///
/// Only neighbors strictly cheaper than `base_cost` are candidates. The scan
/// checks `cancel` before each evaluation and keeps whatever it selected
/// before noticing it.
pub fn scan_neighborhood(
    instance: &Instance,
    neighborhood: &Neighborhood,
    base_cost: Cost,
    policy: &dyn SelectionPolicy,
    cancel: &CancellationToken,
) -> Scan {
    let mut cursor = neighborhood.cursor();
    let mut selected: Option<(Move, Cost)> = None;
    let mut improving_seen = 0;
    let mut evaluated = 0;

    while let (Some(candidate), Some(mv)) = (cursor.current(), cursor.current_move()) {
        if cancel.is_cancelled() {
            return Scan {
                selected,
                evaluated,
                cancelled: true,
            };
        }

        let cost = instance.evaluate_unchecked(candidate);
        evaluated += 1;

        if cost < base_cost {
            improving_seen += 1;
            match selected {
                Some((_, kept)) if !policy.prefers(kept, cost) => {}
                _ => selected = Some((mv, cost)),
            }
            if policy.should_stop(improving_seen) {
                break;
            }
        }

        cursor.advance();
    }

    Scan {
        selected,
        evaluated,
        cancelled: false,
    }
}

/// Hill climbing over one neighborhood.
///
/// Rebuilds the neighborhood of the current schedule at every iteration and
/// adopts the neighbor picked by the selection policy, until none improves.
pub struct HillClimbing {
    pub neighborhood: NeighborhoodKind,
    pub policy: Box<dyn SelectionPolicy + Send + Sync>,
}

impl HillClimbing {
    pub fn new<P: SelectionPolicy + Send + Sync + 'static>(
        neighborhood: NeighborhoodKind,
        policy: P,
    ) -> Self {
        HillClimbing {
            neighborhood,
            policy: Box::new(policy),
        }
    }

    pub fn best_improvement(neighborhood: NeighborhoodKind) -> Self {
        Self::new(neighborhood, Best)
    }

    pub fn first_improvement(neighborhood: NeighborhoodKind) -> Self {
        Self::new(neighborhood, First)
    }
}

impl Default for HillClimbing {
    fn default() -> Self {
        Self::best_improvement(NeighborhoodKind::sliding(10))
    }
}

impl LocalSearch for HillClimbing {
    fn improve(
        &self,
        instance: &Instance,
        solution: &mut Solution,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let initial_cost = instance.evaluate(&solution.schedule)?;
        solution.cost = initial_cost;

        // a single job has no neighbor and is trivially optimal
        if solution.schedule.len() < 2 {
            return Ok(SearchOutcome {
                improved: false,
                iterations: 0,
                termination: Termination::LocalOptimum,
            });
        }

        let mut cost = initial_cost;
        let mut iterations = 0;
        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }

            let neighborhood =
                Neighborhood::new(self.neighborhood.clone(), solution.schedule.clone())?;
            let scan =
                scan_neighborhood(instance, &neighborhood, cost, self.policy.as_ref(), cancel);

            if let Some((mv, new_cost)) = scan.selected {
                mv.apply(&mut solution.schedule);
                cost = new_cost;
                iterations += 1;
                log::trace!(
                    "{}: iteration {} cost {} ({} neighbors evaluated)",
                    self.name(),
                    iterations,
                    cost,
                    scan.evaluated
                );
            }

            if scan.cancelled {
                break Termination::Cancelled;
            }
            if scan.selected.is_none() {
                break Termination::LocalOptimum;
            }
        };

        solution.cost = cost;
        log::debug!(
            "{}: {:?} after {} moves, cost {} -> {}",
            self.name(),
            termination,
            iterations,
            initial_cost,
            cost
        );

        Ok(SearchOutcome {
            improved: cost < initial_cost,
            iterations,
            termination,
        })
    }

    fn name(&self) -> String {
        format!("HC-{}-{}", self.policy.name(), self.neighborhood.short_name())
    }
}

/// Variable Neighborhood Descent (VND)
///
/// Descends with best improvement over the consecutive-swap neighborhood.
/// Switching to further neighborhoods on stagnation is left out: the
/// descent stops at the first local optimum.
pub struct VND {
    descent: HillClimbing,
}

impl VND {
    pub fn new() -> Self {
        VND {
            descent: HillClimbing::best_improvement(NeighborhoodKind::ConsecutiveSwap),
        }
    }
}

impl Default for VND {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for VND {
    fn improve(
        &self,
        instance: &Instance,
        solution: &mut Solution,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        self.descent.improve(instance, solution, cancel)
    }

    fn name(&self) -> String {
        "VND".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::selection::{BestOfFirst, Worst};
    use crate::heuristics::testing::random_instance;
    use crate::instance::Job;
    use crate::solution::{identity_schedule, make_rng, random_schedule};

    fn small_instance() -> Instance {
        Instance::new(
            "small",
            vec![Job::new(2, 1, 2), Job::new(1, 2, 1), Job::new(3, 1, 10)],
        )
    }

    fn is_local_optimum(instance: &Instance, solution: &Solution, kind: &NeighborhoodKind) -> bool {
        Neighborhood::new(kind.clone(), solution.schedule.clone())
            .unwrap()
            .iter()
            .all(|neighbor| instance.evaluate(&neighbor).unwrap() >= solution.cost)
    }

    fn kinds() -> Vec<NeighborhoodKind> {
        vec![
            NeighborhoodKind::ConsecutiveSwap,
            NeighborhoodKind::ConsecutiveSwap.backward(),
            NeighborhoodKind::Reverse,
            NeighborhoodKind::Reverse.backward(),
            NeighborhoodKind::sliding(10),
            NeighborhoodKind::sliding(3).backward(),
        ]
    }

    #[test]
    fn test_hill_climbing_small() {
        let instance = small_instance();
        let mut solution = Solution::from_schedule(&instance, vec![0, 1, 2], "test").unwrap();
        let hc = HillClimbing::best_improvement(NeighborhoodKind::ConsecutiveSwap);

        let outcome = hc.improve(&instance, &mut solution, &CancellationToken::new()).unwrap();

        assert_eq!(solution.schedule, vec![1, 0, 2]);
        assert_eq!(solution.cost, 1);
        assert!(outcome.improved);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.termination, Termination::LocalOptimum);
    }

    #[test]
    fn test_first_improvement_reaches_local_optimum() {
        for seed in 0..5 {
            let instance = random_instance(25, seed);
            for kind in kinds() {
                let schedule = random_schedule(25, &mut make_rng(Some(seed)).unwrap());
                let mut solution = Solution::from_schedule(&instance, schedule, "random").unwrap();
                let before = solution.cost;

                let hc = HillClimbing::first_improvement(kind.clone());
                let outcome = hc.improve(&instance, &mut solution, &CancellationToken::new()).unwrap();

                assert_eq!(outcome.termination, Termination::LocalOptimum);
                assert!(solution.cost <= before);
                assert_eq!(solution.cost, instance.evaluate(&solution.schedule).unwrap());
                assert!(is_local_optimum(&instance, &solution, &kind));
            }
        }
    }

    #[test]
    fn test_all_policies_reach_local_optimum() {
        let instance = random_instance(20, 11);
        let kind = NeighborhoodKind::sliding(5);
        let searches = vec![
            HillClimbing::new(kind.clone(), Best),
            HillClimbing::new(kind.clone(), Worst),
            HillClimbing::new(kind.clone(), First),
            HillClimbing::new(kind.clone(), BestOfFirst::new(4).unwrap()),
        ];
        for hc in searches {
            let mut solution =
                Solution::from_schedule(&instance, identity_schedule(20), "given").unwrap();
            hc.improve(&instance, &mut solution, &CancellationToken::new()).unwrap();
            assert!(is_local_optimum(&instance, &solution, &kind), "{}", hc.name());
        }
    }

    #[test]
    fn test_scan_policies() {
        let instance = small_instance();
        let neighborhood = Neighborhood::new(NeighborhoodKind::Reverse, vec![0, 1, 2]).unwrap();
        let cancel = CancellationToken::new();
        // neighbors: [1,0,2]=1, [2,1,0]=10, [0,2,1]=10; base costs 4

        let best = scan_neighborhood(&instance, &neighborhood, 4, &Best, &cancel);
        assert_eq!(best.selected, Some((Move::Reverse { start: 0, end: 2 }, 1)));
        assert_eq!(best.evaluated, 3);

        let first = scan_neighborhood(&instance, &neighborhood, 4, &First, &cancel);
        assert_eq!(first.selected.map(|(_, c)| c), Some(1));
        assert_eq!(first.evaluated, 1);

        let none = scan_neighborhood(&instance, &neighborhood, 1, &Best, &cancel);
        assert!(none.selected.is_none());
        assert!(!none.cancelled);
    }

    #[test]
    fn test_cancelled_before_start() {
        let instance = random_instance(15, 3);
        let mut solution = Solution::from_schedule(&instance, identity_schedule(15), "given").unwrap();
        let before = solution.schedule.clone();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = HillClimbing::default()
            .improve(&instance, &mut solution, &cancel)
            .unwrap();

        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(solution.schedule, before);
    }

    /// Best improvement that raises the token once it has seen a candidate.
    struct CancelAfterFirst {
        token: CancellationToken,
    }

    impl SelectionPolicy for CancelAfterFirst {
        fn prefers(&self, kept: Cost, candidate: Cost) -> bool {
            candidate < kept
        }

        fn should_stop(&self, _improving_seen: usize) -> bool {
            self.token.cancel();
            false
        }

        fn name(&self) -> String {
            "cancel-after-first".to_string()
        }
    }

    #[test]
    fn test_cancelled_mid_scan_keeps_candidate() {
        // due dates decrease and weights increase along the identity order
        let jobs = (0..5).map(|i| Job::new(1, i + 1, 5 - i)).collect();
        let instance = Instance::new("late_tail", jobs);
        let mut solution = Solution::from_schedule(&instance, identity_schedule(5), "given").unwrap();
        let before = solution.cost;
        let cancel = CancellationToken::new();
        let hc = HillClimbing {
            neighborhood: NeighborhoodKind::ConsecutiveSwap,
            policy: Box::new(CancelAfterFirst {
                token: cancel.clone(),
            }),
        };

        let outcome = hc.improve(&instance, &mut solution, &cancel).unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(outcome.termination, Termination::Cancelled);
        assert_eq!(outcome.iterations, 1);
        assert!(solution.cost < before);
        assert_eq!(solution.cost, instance.evaluate(&solution.schedule).unwrap());
    }

    #[test]
    fn test_single_job_is_optimal() {
        let instance = Instance::new("one", vec![Job::new(4, 2, 1)]);
        let mut solution = Solution::from_schedule(&instance, vec![0], "given").unwrap();
        let outcome = VND::new()
            .improve(&instance, &mut solution, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.termination, Termination::LocalOptimum);
        assert_eq!(solution.cost, 6);
    }

    #[test]
    fn test_invalid_schedule_is_rejected() {
        let instance = small_instance();
        let mut solution = Solution {
            schedule: vec![0, 0, 1],
            cost: 0,
            algorithm: "broken".to_string(),
            computation_time: 0.0,
            iterations: None,
        };
        assert!(VND::new()
            .improve(&instance, &mut solution, &CancellationToken::new())
            .is_err());
    }

    #[test]
    fn test_vnd_is_consecutive_swap_descent() {
        let instance = random_instance(30, 5);
        let mut solution = Solution::from_schedule(&instance, identity_schedule(30), "given").unwrap();
        VND::new()
            .improve(&instance, &mut solution, &CancellationToken::new())
            .unwrap();
        assert!(is_local_optimum(&instance, &solution, &NeighborhoodKind::ConsecutiveSwap));
    }
}
