use crate::quadtree::{NodeIdx, QuadTree, Root, LEAF_LEVEL};
use crate::{CancelToken, CoordinateSet, Rule, StepError};
use ahash::AHashMap as HashMap;

/// Interned quadtree together with everything memoized about it under one rule.
///
/// A node's full-speed result (`2^(level-2)` generations) is stored in the node
/// itself; results for smaller steps live in `slow_results`.
#[derive(Clone)]
pub(super) struct Universe {
    tree: QuadTree,
    rule: Rule,
    birth_mask: u16,
    survival_mask: u16,
    slow_results: HashMap<(NodeIdx, u32), NodeIdx>,
}

impl Universe {
    pub(super) fn new(rule: Rule) -> Self {
        Self {
            tree: QuadTree::new(),
            rule,
            birth_mask: rule.effective_birth_mask(),
            survival_mask: rule.survival_mask(),
            slow_results: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(super) fn rule(&self) -> Rule {
        self.rule
    }

    /// Switches to another rule, forgetting every result computed under the
    /// previous one. The nodes themselves stay interned.
    pub(super) fn set_rule(&mut self, rule: Rule) {
        if rule == self.rule {
            return;
        }
        log::debug!("Rule changed from {} to {}, forgetting results", self.rule, rule);
        self.tree.mem.clear_results();
        self.slow_results.clear();
        self.rule = rule;
        self.birth_mask = rule.effective_birth_mask();
        self.survival_mask = rule.survival_mask();
    }

    pub(super) fn bytes_total(&self) -> usize {
        self.tree.mem.bytes_total()
            + self.slow_results.capacity()
                * std::mem::size_of::<((NodeIdx, u32), NodeIdx)>()
    }

    /// Bit-sliced single-generation update of one row of 16 cells.
    ///
    /// The two border columns are meaningless in the result.
    fn update_row(row_prev: u16, row_curr: u16, row_next: u16, birth: u16, survival: u16) -> u16 {
        let neighbors = [
            row_prev << 1,
            row_prev,
            row_prev >> 1,
            row_curr << 1,
            row_curr >> 1,
            row_next << 1,
            row_next,
            row_next >> 1,
        ];
        // four bit planes of the neighbor count
        let mut count = [0u16; 4];
        for x in neighbors {
            let mut carry = x;
            for plane in count.iter_mut() {
                let next_carry = *plane & carry;
                *plane ^= carry;
                carry = next_carry;
            }
        }

        let (mut born, mut survives) = (0u16, 0u16);
        for n in 0..=8u32 {
            if (birth | survival) >> n & 1 == 0 {
                continue;
            }
            let equal = count
                .iter()
                .enumerate()
                .fold(!0u16, |acc, (bit, &plane)| {
                    acc & if n >> bit & 1 != 0 { plane } else { !plane }
                });
            if birth >> n & 1 != 0 {
                born |= equal;
            }
            if survival >> n & 1 != 0 {
                survives |= equal;
            }
        }
        (row_curr & survives) | (!row_curr & born)
    }

    /// `idx` must be a node of four leaves; `steps` must be at most 4.
    fn update_leaves(&mut self, idx: NodeIdx, steps: usize) -> NodeIdx {
        let [nw, ne, sw, se] = self
            .tree
            .mem
            .get(idx)
            .parts()
            .map(|x| self.tree.mem.get(x).leaf_cells());

        let mut src = [0; 16];
        for i in 0..8 {
            src[i] = u16::from_le_bytes([nw[i], ne[i]]);
            src[i + 8] = u16::from_le_bytes([sw[i], se[i]]);
        }
        let mut dst = [0; 16];

        for t in 1..=steps {
            for y in t..16 - t {
                dst[y] = Self::update_row(
                    src[y - 1],
                    src[y],
                    src[y + 1],
                    self.birth_mask,
                    self.survival_mask,
                );
            }
            std::mem::swap(&mut src, &mut dst);
        }

        let rows: [u8; 8] = std::array::from_fn(|i| (src[i + 4] >> 4) as u8);
        self.tree.mem.find_or_create_leaf(u64::from_le_bytes(rows))
    }

    /// Returns the 9 overlapping half-size nodes of a node at least two levels
    /// above the leaves, row by row.
    fn nine_children_overlapping(&mut self, idx: NodeIdx) -> [NodeIdx; 9] {
        let mem = &mut self.tree.mem;
        let [nw, ne, sw, se] = mem.get(idx).parts();
        let [[_, nwne, nwsw, nwse], [nenw, _, nesw, nese], [swnw, swne, _, swse], [senw, sene, sesw, _]] =
            [nw, ne, sw, se].map(|x| mem.get(x).parts());
        [
            nw,
            mem.find_or_create_node(nwne, nenw, nwse, nesw),
            ne,
            mem.find_or_create_node(nwsw, nwse, swnw, swne),
            mem.find_or_create_node(nwse, nesw, swne, senw),
            mem.find_or_create_node(nesw, nese, senw, sene),
            sw,
            mem.find_or_create_node(swne, senw, swse, sesw),
            se,
        ]
    }

    fn four_children_overlapping(&mut self, arr: &[NodeIdx; 9]) -> [NodeIdx; 4] {
        let mem = &mut self.tree.mem;
        [
            mem.find_or_create_node(arr[0], arr[1], arr[3], arr[4]),
            mem.find_or_create_node(arr[1], arr[2], arr[4], arr[5]),
            mem.find_or_create_node(arr[3], arr[4], arr[6], arr[7]),
            mem.find_or_create_node(arr[4], arr[5], arr[7], arr[8]),
        ]
    }

    /// Returns the centered half-size node `2^generations_log2` generations ahead.
    ///
    /// `generations_log2 + 2` must not exceed the level of the node, which must
    /// be above the leaves.
    fn advance(
        &mut self,
        idx: NodeIdx,
        generations_log2: u32,
        cancel: &CancelToken,
    ) -> Result<NodeIdx, StepError> {
        let n = self.tree.mem.get(idx);
        let level = n.level;
        debug_assert!(level > LEAF_LEVEL && generations_log2 + 2 <= level);
        if n.is_blank {
            return Ok(self.tree.blank(level - 1));
        }
        let full_speed = generations_log2 + 2 == level;
        let cached = if full_speed {
            n.result
        } else {
            self.slow_results.get(&(idx, generations_log2)).copied()
        };
        if let Some(result) = cached {
            return Ok(result);
        }
        cancel.check()?;

        let result = if level == LEAF_LEVEL + 1 {
            self.update_leaves(idx, 1 << generations_log2)
        } else {
            let mut arr9 = self.nine_children_overlapping(idx);
            let child_generations_log2 = if full_speed {
                for x in arr9.iter_mut() {
                    *x = self.advance(*x, level - 3, cancel)?;
                }
                level - 3
            } else {
                for x in arr9.iter_mut() {
                    *x = self.tree.centered(*x);
                }
                generations_log2
            };
            let mut arr4 = self.four_children_overlapping(&arr9);
            for x in arr4.iter_mut() {
                *x = self.advance(*x, child_generations_log2, cancel)?;
            }
            let [nw, ne, sw, se] = arr4;
            self.tree.mem.find_or_create_node(nw, ne, sw, se)
        };

        if full_speed {
            self.tree.mem.get_mut(idx).result = Some(result);
        } else {
            self.slow_results.insert((idx, generations_log2), result);
        }
        Ok(result)
    }

    /// Advances the root by `2^generations_log2` generations, first adding
    /// enough blank space that no cell can leave the shrunk result.
    fn advance_root(
        &mut self,
        mut root: Root,
        generations_log2: u32,
        cancel: &CancelToken,
    ) -> Result<Root, StepError> {
        let overflow = |_| StepError::CoordinateOverflow;
        while root.level < generations_log2 + 2 || !self.tree.has_blank_frame(&root) {
            root = self.tree.with_frame(&root).map_err(overflow)?;
        }
        root = self.tree.with_frame(&root).map_err(overflow)?;
        log::trace!(
            "Advancing root of level {} by 2^{} generations",
            root.level,
            generations_log2
        );

        let quarter = 1i128 << (root.level - 2);
        Ok(Root {
            idx: self.advance(root.idx, generations_log2, cancel)?,
            level: root.level - 1,
            x: root.x + quarter,
            y: root.y + quarter,
        })
    }

    /// Advances `cells` by `generations`, one power of two at a time.
    pub(super) fn step(
        &mut self,
        cells: &CoordinateSet,
        generations: u64,
        cancel: &CancelToken,
    ) -> Result<CoordinateSet, StepError> {
        let Some(mut root) = self.tree.build(cells, LEAF_LEVEL + 1) else {
            return Ok(CoordinateSet::new());
        };
        for generations_log2 in 0..u64::BITS {
            if generations >> generations_log2 & 1 == 0 {
                continue;
            }
            root = self.advance_root(root, generations_log2, cancel)?;
            if self.tree.mem.get(root.idx).is_blank {
                break;
            }
        }
        while self.tree.has_blank_frame(&root) {
            root = self.tree.without_frame(&root);
        }

        let mut result = CoordinateSet::with_capacity(cells.len());
        self.tree
            .flatten(&root, &mut result)
            .map_err(|_| StepError::CoordinateOverflow)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellCoordinate, CellState, GameOfLifeAlgorithm, NaiveAlgorithm};

    const SEED: u64 = 42;

    fn step(universe: &mut Universe, state: &CellState, generations: u64) -> CellState {
        CellState::new(
            universe
                .step(state.alive_cells(), generations, &CancelToken::new())
                .unwrap(),
        )
    }

    #[test]
    fn test_update_row_blinker() {
        let (birth, survival) = (Rule::CONWAY.effective_birth_mask(), Rule::CONWAY.survival_mask());
        // vertical blinker in column 5 becomes horizontal in the middle row
        let column = 1 << 5;
        assert_eq!(Universe::update_row(column, column, column, birth, survival), 0b111 << 4);
        assert_eq!(Universe::update_row(0, column, column, birth, survival), 0);
    }

    #[test]
    fn test_matches_naive_on_random_soups() {
        let rules = ["B3/S23", "B36/S23", "B2/S", "B3678/S34678", "B1/S012345678"];
        for (i, rule) in rules.iter().enumerate() {
            let rule: Rule = rule.parse().unwrap();
            let mut universe = Universe::new(rule);
            let state = CellState::random(24, 20, 0.35, Some(SEED + i as u64));
            for generations in [1, 2, 3, 5, 8, 13, 30] {
                let expected = NaiveAlgorithm::new().step(&state, &rule, generations).unwrap();
                assert_eq!(
                    step(&mut universe, &state, generations),
                    expected,
                    "rule {}, {} generations",
                    rule,
                    generations
                );
            }
        }
    }

    #[test]
    fn test_glider_far_ahead() {
        let glider: CellState = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
            .into_iter()
            .map(CellCoordinate::from)
            .collect();
        let mut universe = Universe::new(Rule::CONWAY);
        let generations = 4 << 40;
        let shift = 1 << 40;
        assert_eq!(
            step(&mut universe, &glider, generations),
            glider.translated(shift, shift).unwrap()
        );
    }

    #[test]
    fn test_rule_change_forgets_results() {
        let state = CellState::random(16, 16, 0.5, Some(SEED));
        let mut universe = Universe::new(Rule::CONWAY);
        step(&mut universe, &state, 16);
        let highlife: Rule = "B36/S23".parse().unwrap();
        universe.set_rule(highlife);
        assert_eq!(universe.rule(), highlife);
        assert_eq!(
            step(&mut universe, &state, 16),
            NaiveAlgorithm::new().step(&state, &highlife, 16).unwrap()
        );
    }

    #[test]
    fn test_cancelled() {
        let state = CellState::random(16, 16, 0.5, Some(SEED));
        let mut universe = Universe::new(Rule::CONWAY);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            universe.step(state.alive_cells(), 100, &cancel),
            Err(StepError::Cancelled)
        );
        // memoized results stay consistent after an interrupted step
        assert_eq!(
            step(&mut universe, &state, 100),
            NaiveAlgorithm::new().step(&state, &Rule::CONWAY, 100).unwrap()
        );
    }

    #[test]
    fn test_coordinate_overflow() {
        let glider: CellState = [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
            .into_iter()
            .map(|(x, y)| CellCoordinate::new(i64::MAX - 10 + x, y))
            .collect();
        let mut universe = Universe::new(Rule::CONWAY);
        assert_eq!(
            universe.step(glider.alive_cells(), 100, &CancelToken::new()),
            Err(StepError::CoordinateOverflow)
        );
    }
}
