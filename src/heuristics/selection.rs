//! Selection policies used while scanning a neighborhood.
//!
//! A scan only ever hands improving neighbors to a policy, i.e. neighbors
//! strictly cheaper than the schedule the neighborhood was built from. The
//! policy decides which of two such candidates to keep and when the scan
//! may stop early.

use crate::error::{Result, SchedError};
use crate::instance::Cost;

pub trait SelectionPolicy {
    /// Whether `candidate` replaces the currently kept improving neighbor.
    fn prefers(&self, kept: Cost, candidate: Cost) -> bool;

    /// Whether the scan stops after `improving_seen` improving neighbors.
    fn should_stop(&self, improving_seen: usize) -> bool;

    fn name(&self) -> String;
}

/// Steepest descent: the cheapest improving neighbor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Best;

impl SelectionPolicy for Best {
    fn prefers(&self, kept: Cost, candidate: Cost) -> bool {
        candidate < kept
    }

    fn should_stop(&self, _improving_seen: usize) -> bool {
        false
    }

    fn name(&self) -> String {
        "best".to_string()
    }
}

/// The least improving neighbor, to diversify the descent path.
#[derive(Debug, Clone, Copy, Default)]
pub struct Worst;

impl SelectionPolicy for Worst {
    fn prefers(&self, kept: Cost, candidate: Cost) -> bool {
        candidate > kept
    }

    fn should_stop(&self, _improving_seen: usize) -> bool {
        false
    }

    fn name(&self) -> String {
        "worst".to_string()
    }
}

/// Classic first improvement.
#[derive(Debug, Clone, Copy, Default)]
pub struct First;

impl SelectionPolicy for First {
    fn prefers(&self, _kept: Cost, _candidate: Cost) -> bool {
        false
    }

    fn should_stop(&self, improving_seen: usize) -> bool {
        improving_seen >= 1
    }

    fn name(&self) -> String {
        "first".to_string()
    }
}

/// Best improvement among the first `n` improving neighbors.
#[derive(Debug, Clone, Copy)]
pub struct BestOfFirst {
    pub n: usize,
}

impl BestOfFirst {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(SchedError::InvalidParameter(
                "best-of-first needs at least one candidate".to_string(),
            ));
        }
        Ok(BestOfFirst { n })
    }
}

impl SelectionPolicy for BestOfFirst {
    fn prefers(&self, kept: Cost, candidate: Cost) -> bool {
        candidate < kept
    }

    fn should_stop(&self, improving_seen: usize) -> bool {
        improving_seen >= self.n
    }

    fn name(&self) -> String {
        format!("best-of-first-{}", self.n)
    }
}
