use crate::{BoundingBox, CellState, HashLifeAlgorithm, NaiveAlgorithm, Rule, StepError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag for cooperative cancellation of long-running steps.
///
/// Clones observe the same flag, so one clone can be handed to a worker thread
/// while another stays with the caller.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn check(&self) -> Result<(), StepError> {
        if self.is_cancelled() {
            Err(StepError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Simulation strategy for Life-like rules on the unbounded plane.
///
/// Implementations are interchangeable: for the same input every implementation
/// must return the same state, and none of them mutates its input.
pub trait GameOfLifeAlgorithm {
    /// Advances the state by `generations` generations, checking `cancel`
    /// regularly.
    ///
    /// # Errors
    ///
    /// * [`StepError::Cancelled`] - The token was cancelled before the step finished.
    ///   No partial result is ever returned.
    /// * [`StepError::CoordinateOverflow`] - An alive cell would leave the `i64` plane.
    fn step_cancellable(
        &self,
        cell_state: &CellState,
        rule: &Rule,
        generations: u64,
        cancel: &CancelToken,
    ) -> Result<CellState, StepError>;

    /// Advances the state by `generations` generations. Zero generations is the identity.
    fn step(
        &self,
        cell_state: &CellState,
        rule: &Rule,
        generations: u64,
    ) -> Result<CellState, StepError> {
        self.step_cancellable(cell_state, rule, generations, &CancelToken::new())
    }

    /// Frees accumulated caches.
    ///
    /// The default implementation does nothing. Algorithms should override this
    /// if they keep memoized data between calls.
    fn run_gc(&self) {}

    /// Returns the approximate heap memory usage of the algorithm's caches in bytes.
    fn bytes_total(&self) -> usize {
        0
    }
}

/// Which algorithm to run, e.g. as selected by a command-line flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    Naive,
    #[default]
    HashLife,
}

/// Statically dispatched choice between the available algorithms.
#[derive(Clone, Debug)]
pub enum Algorithm {
    Naive(NaiveAlgorithm),
    HashLife(HashLifeAlgorithm),
}

impl Algorithm {
    pub fn new(kind: AlgorithmKind, mem_limit_mib: u32) -> Self {
        match kind {
            AlgorithmKind::Naive => Algorithm::Naive(NaiveAlgorithm::new()),
            AlgorithmKind::HashLife => Algorithm::HashLife(HashLifeAlgorithm::new(mem_limit_mib)),
        }
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Algorithm::Naive(_) => AlgorithmKind::Naive,
            Algorithm::HashLife(_) => AlgorithmKind::HashLife,
        }
    }
}

impl GameOfLifeAlgorithm for Algorithm {
    fn step_cancellable(
        &self,
        cell_state: &CellState,
        rule: &Rule,
        generations: u64,
        cancel: &CancelToken,
    ) -> Result<CellState, StepError> {
        match self {
            Algorithm::Naive(x) => x.step_cancellable(cell_state, rule, generations, cancel),
            Algorithm::HashLife(x) => x.step_cancellable(cell_state, rule, generations, cancel),
        }
    }

    fn run_gc(&self) {
        match self {
            Algorithm::Naive(x) => x.run_gc(),
            Algorithm::HashLife(x) => x.run_gc(),
        }
    }

    fn bytes_total(&self) -> usize {
        match self {
            Algorithm::Naive(x) => x.bytes_total(),
            Algorithm::HashLife(x) => x.bytes_total(),
        }
    }
}

/// Summary of an evolved state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Statistics {
    pub generations: u64,
    pub population: usize,
    pub bounding_box: Option<BoundingBox>,
}

/// Result of [`evolve`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evolution {
    pub cell_state: CellState,
    pub statistics: Statistics,
}

/// Steps `cell_state` and summarizes the result.
pub fn evolve<A: GameOfLifeAlgorithm + ?Sized>(
    algorithm: &A,
    cell_state: &CellState,
    rule: &Rule,
    generations: u64,
    cancel: &CancelToken,
) -> Result<Evolution, StepError> {
    let cell_state = algorithm.step_cancellable(cell_state, rule, generations, cancel)?;
    let statistics = Statistics {
        generations,
        population: cell_state.population(),
        bounding_box: cell_state.bounding_box(),
    };
    Ok(Evolution {
        cell_state,
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellCoordinate;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(StepError::Cancelled));
    }

    #[test]
    fn test_algorithm_kind() {
        for kind in [AlgorithmKind::Naive, AlgorithmKind::HashLife] {
            assert_eq!(Algorithm::new(kind, 16).kind(), kind);
        }
    }

    #[test]
    fn test_evolve_blinker() {
        let blinker: CellState = (0..3).map(|x| CellCoordinate::new(x, 0)).collect();
        let algorithm = Algorithm::new(AlgorithmKind::Naive, 16);
        let evolution = evolve(&algorithm, &blinker, &Rule::CONWAY, 1, &CancelToken::new()).unwrap();
        let expected: CellState = (-1..2).map(|y| CellCoordinate::new(1, y)).collect();
        assert_eq!(evolution.cell_state, expected);
        assert_eq!(evolution.statistics.generations, 1);
        assert_eq!(evolution.statistics.population, 3);
        assert_eq!(evolution.statistics.bounding_box, expected.bounding_box());
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let state = CellState::random(8, 8, 0.5, Some(1));
        let algorithm = Algorithm::new(AlgorithmKind::Naive, 16);
        assert_eq!(
            evolve(&algorithm, &state, &Rule::CONWAY, 10, &token),
            Err(StepError::Cancelled)
        );
    }
}
