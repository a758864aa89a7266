//! Implementation of the [HashLife algorithm](https://conwaylife.com/wiki/HashLife).
//!
//! Nodes and their results are kept in a process-wide cache between calls, so
//! repeated steps of similar patterns get cheaper over time. The cache can be
//! cleared at any moment; this only costs recomputation, never correctness.

mod cache;
mod universe;

use crate::{CancelToken, CellState, GameOfLifeAlgorithm, Rule, StepError};

/// Default soft limit of the node cache.
pub const DEFAULT_MEM_LIMIT_MIB: u32 = 256;

/// Memoized quadtree simulation.
///
/// Advances huge or highly regular patterns by enormous generation counts in
/// time roughly logarithmic in the count. Each power of two of the generation
/// count is applied separately, with results for every step size memoized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashLifeAlgorithm {
    mem_limit_mib: u32,
}

impl HashLifeAlgorithm {
    /// Creates the algorithm with a soft memory limit for the shared node cache.
    ///
    /// # Parameters
    /// * `mem_limit_mib` - When a step finishes with a cache larger than this,
    ///   in MiB, the cache is dropped instead of being kept for the next step.
    ///   A single step may exceed the limit while it runs.
    pub fn new(mem_limit_mib: u32) -> Self {
        Self { mem_limit_mib }
    }

    pub fn mem_limit_mib(&self) -> u32 {
        self.mem_limit_mib
    }
}

impl Default for HashLifeAlgorithm {
    fn default() -> Self {
        Self::new(DEFAULT_MEM_LIMIT_MIB)
    }
}

impl GameOfLifeAlgorithm for HashLifeAlgorithm {
    fn step_cancellable(
        &self,
        cell_state: &CellState,
        rule: &Rule,
        generations: u64,
        cancel: &CancelToken,
    ) -> Result<CellState, StepError> {
        cancel.check()?;
        if generations == 0 || cell_state.is_empty() {
            return Ok(cell_state.clone());
        }
        let (mut universe, epoch) = cache::checkout(*rule);
        let result = universe.step(cell_state.alive_cells(), generations, cancel);
        cache::checkin(universe, epoch, (self.mem_limit_mib as usize) << 20);
        Ok(CellState::new(result?))
    }

    fn run_gc(&self) {
        clear_node_cache();
    }

    fn bytes_total(&self) -> usize {
        node_cache_bytes()
    }
}

/// Drops every cached node and result. Steps running concurrently finish
/// normally and discard their caches afterwards.
pub fn clear_node_cache() {
    cache::clear();
}

/// Approximate heap usage of the shared node cache in bytes.
pub fn node_cache_bytes() -> usize {
    cache::bytes_total()
}
