use crate::{CancelToken, CellCoordinate, CellState, CoordinateSet, GameOfLifeAlgorithm, Rule, StepError};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};

/// Cells are tracked in `i128`, so intermediate generations may leave the
/// `i64` plane as long as the final one is back inside it.
type Cell = (i128, i128);

/// Direct neighbor counting over the alive cells and their neighborhood.
///
/// Work per generation is proportional to the population, independently of
/// how far apart the cells are, which makes it a good fit for small or
/// short-lived patterns and the reference the other algorithms are tested
/// against.
#[derive(Clone, Copy, Debug, Default)]
pub struct NaiveAlgorithm;

impl NaiveAlgorithm {
    pub fn new() -> Self {
        Self
    }

    /// Computes one generation as a pure function of `cells`.
    fn next_generation(cells: &HashSet<Cell>, rule: &Rule) -> HashSet<Cell> {
        let mut counts = HashMap::<Cell, u8>::with_capacity(cells.len() * 4);
        for &(x, y) in cells {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx, dy) != (0, 0) {
                        *counts.entry((x + dx, y + dy)).or_default() += 1;
                    }
                }
            }
        }

        let mut next = HashSet::with_capacity(cells.len());
        for (&c, &n) in &counts {
            if rule.next_state(cells.contains(&c), n) {
                next.insert(c);
            }
        }
        if rule.is_survival(0) {
            // isolated cells never show up in `counts`
            next.extend(cells.iter().copied().filter(|c| !counts.contains_key(c)));
        }
        next
    }
}

impl GameOfLifeAlgorithm for NaiveAlgorithm {
    fn step_cancellable(
        &self,
        cell_state: &CellState,
        rule: &Rule,
        generations: u64,
        cancel: &CancelToken,
    ) -> Result<CellState, StepError> {
        cancel.check()?;
        let mut current: HashSet<Cell> = cell_state
            .alive_cells()
            .iter()
            .map(|c| (c.x as i128, c.y as i128))
            .collect();
        for generation in 0..generations {
            if current.is_empty() {
                break;
            }
            cancel.check()?;
            let next = Self::next_generation(&current, rule);
            if next == current {
                log::trace!("Still life reached after {} generations", generation);
                break;
            }
            current = next;
        }

        let cells = current
            .into_iter()
            .map(|(x, y)| Some(CellCoordinate::new(x.try_into().ok()?, y.try_into().ok()?)))
            .collect::<Option<CoordinateSet>>()
            .ok_or(StepError::CoordinateOverflow)?;
        Ok(CellState::new(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(i64, i64)]) -> CellState {
        coords.iter().map(|&c| CellCoordinate::from(c)).collect()
    }

    #[test]
    fn test_blinker_oscillates() {
        let horizontal = cells(&[(-1, 0), (0, 0), (1, 0)]);
        let vertical = cells(&[(0, -1), (0, 0), (0, 1)]);
        let algorithm = NaiveAlgorithm::new();
        assert_eq!(algorithm.step(&horizontal, &Rule::CONWAY, 1).unwrap(), vertical);
        assert_eq!(algorithm.step(&horizontal, &Rule::CONWAY, 2).unwrap(), horizontal);
        assert_eq!(algorithm.step(&horizontal, &Rule::CONWAY, 1001).unwrap(), vertical);
    }

    #[test]
    fn test_glider_moves() {
        let glider = cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let result = NaiveAlgorithm::new().step(&glider, &Rule::CONWAY, 4).unwrap();
        assert_eq!(result, glider.translated(1, 1).unwrap());
    }

    #[test]
    fn test_zero_generations_is_identity() {
        let state = CellState::random(10, 10, 0.5, Some(7));
        assert_eq!(NaiveAlgorithm::new().step(&state, &Rule::CONWAY, 0).unwrap(), state);
    }

    #[test]
    fn test_isolated_cells_under_s0() {
        let rule: Rule = "B3/S0".parse().unwrap();
        let state = cells(&[(0, 0), (10, 10)]);
        assert_eq!(NaiveAlgorithm::new().step(&state, &rule, 5).unwrap(), state);
        assert!(NaiveAlgorithm::new()
            .step(&state, &Rule::CONWAY, 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_b0_never_fills_the_plane() {
        let rule: Rule = "B0/S8".parse().unwrap();
        let state = cells(&[(0, 0)]);
        let result = NaiveAlgorithm::new().step(&state, &rule, 1).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_coordinate_overflow() {
        // a blinker at the edge of the plane has a cell beyond i64::MAX every other generation
        let state = cells(&[(i64::MAX, 0), (i64::MAX, 1), (i64::MAX, 2)]);
        assert_eq!(
            NaiveAlgorithm::new().step(&state, &Rule::CONWAY, 1),
            Err(StepError::CoordinateOverflow)
        );
        assert_eq!(NaiveAlgorithm::new().step(&state, &Rule::CONWAY, 2).unwrap(), state);
        // dying cells at the edge are fine
        let state = cells(&[(i64::MIN, i64::MIN)]);
        assert!(NaiveAlgorithm::new()
            .step(&state, &Rule::CONWAY, 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let state = cells(&[(0, 0)]);
        assert_eq!(
            NaiveAlgorithm::new().step_cancellable(&state, &Rule::CONWAY, 1, &token),
            Err(StepError::Cancelled)
        );
    }
}
