//! Random-walk perturbations used by the iterated local search to leave a
//! local optimum.

use crate::error::{Result, SchedError};
use crate::heuristics::ils::History;
use crate::heuristics::neighborhood::{Neighborhood, NeighborhoodKind};
use crate::solution::Schedule;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// A uniformly drawn neighbor of `schedule`.
pub fn random_neighbor(
    schedule: Schedule,
    kind: &NeighborhoodKind,
    rng: &mut ChaCha8Rng,
) -> Result<Schedule> {
    let neighborhood = Neighborhood::new(kind.clone(), schedule)?;
    let index = rng.gen_range(0..neighborhood.size());
    neighborhood
        .into_neighbor(index)
        .ok_or_else(|| SchedError::InvalidParameter(format!("neighbor {} out of range", index)))
}

/// A random walk of `distance` moves, each drawn from the neighborhood of
/// the previous step.
pub fn random_distant_neighbor(
    mut schedule: Schedule,
    kind: &NeighborhoodKind,
    distance: usize,
    rng: &mut ChaCha8Rng,
) -> Result<Schedule> {
    for _ in 0..distance {
        schedule = random_neighbor(schedule, kind, rng)?;
    }
    Ok(schedule)
}

/// Builds the starting point of the next local search from the incumbent.
pub trait Perturbation {
    fn perturb(
        &mut self,
        incumbent: &[usize],
        history: &History,
        rng: &mut ChaCha8Rng,
    ) -> Result<Schedule>;

    fn name(&self) -> String;

    /// A copy of this perturbation in its initial state, for a new run.
    fn fresh(&self) -> Box<dyn Perturbation + Send + Sync>;
}

/// Random walk of constant length.
#[derive(Debug, Clone)]
pub struct FixedDistance {
    pub neighborhood: NeighborhoodKind,
    pub distance: usize,
}

impl FixedDistance {
    pub fn new(neighborhood: NeighborhoodKind, distance: usize) -> Result<Self> {
        if distance == 0 {
            return Err(SchedError::InvalidParameter(
                "perturbation distance must be positive".to_string(),
            ));
        }
        Ok(FixedDistance {
            neighborhood,
            distance,
        })
    }
}

impl Default for FixedDistance {
    fn default() -> Self {
        FixedDistance {
            neighborhood: NeighborhoodKind::sliding(10),
            distance: 10,
        }
    }
}

impl Perturbation for FixedDistance {
    fn perturb(
        &mut self,
        incumbent: &[usize],
        _history: &History,
        rng: &mut ChaCha8Rng,
    ) -> Result<Schedule> {
        random_distant_neighbor(incumbent.to_vec(), &self.neighborhood, self.distance, rng)
    }

    fn name(&self) -> String {
        format!("fixed-{}x{}", self.distance, self.neighborhood.short_name())
    }

    fn fresh(&self) -> Box<dyn Perturbation + Send + Sync> {
        Box::new(self.clone())
    }
}

/// Random walk whose length grows by `augmentation` after every call, up to
/// `max_step`.
#[derive(Debug, Clone)]
pub struct AdaptiveDistance {
    pub neighborhood: NeighborhoodKind,
    /// Growth factor, strictly greater than 1
    pub augmentation: f64,
    pub initial_step: f64,
    pub max_step: f64,
    step: f64,
}

impl AdaptiveDistance {
    pub fn new(neighborhood: NeighborhoodKind) -> Self {
        AdaptiveDistance {
            neighborhood,
            augmentation: 1.05,
            initial_step: 10.0,
            max_step: 100.0,
            step: 10.0,
        }
    }

    pub fn with_params(
        neighborhood: NeighborhoodKind,
        augmentation: f64,
        initial_step: usize,
        max_step: usize,
    ) -> Result<Self> {
        if !(augmentation > 1.0) {
            return Err(SchedError::InvalidParameter(format!(
                "augmentation factor must exceed 1, got {}",
                augmentation
            )));
        }
        if initial_step == 0 || max_step < initial_step {
            return Err(SchedError::InvalidParameter(format!(
                "invalid step range [{}, {}]",
                initial_step, max_step
            )));
        }
        Ok(AdaptiveDistance {
            neighborhood,
            augmentation,
            initial_step: initial_step as f64,
            max_step: max_step as f64,
            step: initial_step as f64,
        })
    }

    /// Walk length of the next call.
    pub fn current_distance(&self) -> usize {
        self.step as usize
    }
}

impl Default for AdaptiveDistance {
    fn default() -> Self {
        Self::new(NeighborhoodKind::sliding(10))
    }
}

impl Perturbation for AdaptiveDistance {
    fn perturb(
        &mut self,
        incumbent: &[usize],
        _history: &History,
        rng: &mut ChaCha8Rng,
    ) -> Result<Schedule> {
        let distance = self.current_distance();
        let perturbed =
            random_distant_neighbor(incumbent.to_vec(), &self.neighborhood, distance, rng)?;
        self.step = (self.step * self.augmentation).min(self.max_step);
        Ok(perturbed)
    }

    fn name(&self) -> String {
        format!(
            "adaptive-{}x{}-{}x{}",
            self.initial_step,
            self.augmentation,
            self.max_step,
            self.neighborhood.short_name()
        )
    }

    fn fresh(&self) -> Box<dyn Perturbation + Send + Sync> {
        Box::new(AdaptiveDistance {
            step: self.initial_step,
            ..self.clone()
        })
    }
}
