//! Single-Machine Weighted Tardiness Solver Library
//!
//! Heuristic solver for scheduling jobs on one machine so as to minimize the
//! total weighted tardiness `Σ w_j · max(0, C_j − d_j)`.
//!
//! # Features
//!
//! - Priority-rule construction heuristics (EDD, weighted slack, ...)
//! - Incremental neighborhoods (consecutive swap, reverse, sliding reverse,
//!   and their backward walks) with random access
//! - Hill climbing with best / worst / first / best-of-first-N selection
//! - Iterated local search with fixed or adaptive perturbation
//! - Parallel portfolio runs with cooperative cancellation
//! - Benchmarking tools
//!
//! # Example
//!
//! ```no_run
//! use smwt_solver::cancel::CancellationToken;
//! use smwt_solver::heuristics::construction::{ConstructionHeuristic, MultiStartConstruction};
//! use smwt_solver::heuristics::ils::IteratedLocalSearch;
//! use smwt_solver::heuristics::local_search::LocalSearch;
//! use smwt_solver::instance::Instance;
//!
//! // Load instance
//! let instance = Instance::from_file("instance.txt").unwrap();
//!
//! // Construct initial solution
//! let multi_start = MultiStartConstruction::with_all_heuristics();
//! let mut solution = multi_start.construct(&instance).unwrap();
//!
//! // Improve with ILS
//! let ils = IteratedLocalSearch::new().seed(Some(42));
//! ils.improve(&instance, &mut solution, &CancellationToken::new()).unwrap();
//!
//! println!("Solution cost: {}", solution.cost);
//! ```

pub mod benchmark;
pub mod cancel;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use cancel::CancellationToken;
pub use error::{Result, SchedError};
pub use instance::Instance;
pub use solution::Solution;
