//! Canonicalized quadtree shared by the Macrocell codec and the HashLife algorithm.

mod blank;
mod memory;
mod node;

pub(crate) const LEAF_SIZE: u64 = 8;
pub(crate) const LEAF_LEVEL: u32 = LEAF_SIZE.ilog2();
/// Roots above this level have corners that cannot be addressed with `i128`
/// arithmetic without overflow risk.
pub(crate) const MAX_LEVEL: u32 = 120;

pub(crate) use blank::BlankNodes;
pub(crate) use memory::MemoryManager;
pub(crate) use node::{leaf_from_quadrants, leaf_quadrant, NodeIdx, NodeKey, QuadTreeNode};

use crate::{CellCoordinate, CoordinateSet};
use ahash::AHashMap as HashMap;

/// A node placed on the plane: `(x, y)` is its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Root {
    pub(crate) idx: NodeIdx,
    pub(crate) level: u32,
    pub(crate) x: i128,
    pub(crate) y: i128,
}

/// The root level is larger than [`MAX_LEVEL`] or a cell lies outside of `i64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct OutOfRange;

/// Interned node storage together with its blank-node cache.
#[derive(Clone, Default)]
pub(crate) struct QuadTree {
    pub(crate) mem: MemoryManager,
    blank_nodes: BlankNodes,
}

impl QuadTree {
    pub(crate) fn new() -> Self {
        Self {
            mem: MemoryManager::new(),
            blank_nodes: BlankNodes::new(),
        }
    }

    pub(crate) fn blank(&mut self, level: u32) -> NodeIdx {
        self.blank_nodes.get(level, &mut self.mem)
    }

    /// Builds a tree with the top-left corner at the top-left of the bounding box
    /// of `cells`, padded with blank space to a power-of-two square of at least
    /// `min_level`. Returns `None` for an empty set.
    pub(crate) fn build(&mut self, cells: &CoordinateSet, min_level: u32) -> Option<Root> {
        let bbox = cells.bounding_box()?;
        let side = bbox.width().max(bbox.height());
        let level = side
            .next_power_of_two()
            .trailing_zeros()
            .max(min_level)
            .max(LEAF_LEVEL);

        let mut leaves = HashMap::<(u64, u64), u64>::new();
        for c in cells {
            let dx = c.x.abs_diff(bbox.min.x);
            let dy = c.y.abs_diff(bbox.min.y);
            *leaves.entry((dx >> 3, dy >> 3)).or_default() |= 1 << ((dx & 7) + (dy & 7) * 8);
        }

        let mut nodes_curr: HashMap<(u64, u64), NodeIdx> = leaves
            .into_iter()
            .map(|(k, cells)| (k, self.mem.find_or_create_leaf(cells)))
            .collect();
        for child_level in LEAF_LEVEL..level {
            let blank = self.blank(child_level);
            let mut parts = HashMap::<(u64, u64), [NodeIdx; 4]>::new();
            for ((x, y), idx) in nodes_curr.drain() {
                let slot = ((x & 1) + (y & 1) * 2) as usize;
                parts.entry((x >> 1, y >> 1)).or_insert([blank; 4])[slot] = idx;
            }
            nodes_curr = parts
                .into_iter()
                .map(|(k, [nw, ne, sw, se])| (k, self.mem.find_or_create_node(nw, ne, sw, se)))
                .collect();
        }
        debug_assert_eq!(nodes_curr.len(), 1);

        Some(Root {
            idx: nodes_curr[&(0, 0)],
            level,
            x: bbox.min.x as i128,
            y: bbox.min.y as i128,
        })
    }

    /// Appends the absolute coordinates of every alive cell under `root` to `out`.
    pub(crate) fn flatten(&self, root: &Root, out: &mut CoordinateSet) -> Result<(), OutOfRange> {
        fn inner(
            this: &QuadTree,
            idx: NodeIdx,
            x: i128,
            y: i128,
            out: &mut CoordinateSet,
        ) -> Result<(), OutOfRange> {
            let n = this.mem.get(idx);
            if n.is_blank {
                return Ok(());
            }
            match n.key {
                NodeKey::Leaf(mut cells) => {
                    while cells != 0 {
                        let bit = cells.trailing_zeros() as i128;
                        cells &= cells - 1;
                        let cx = i64::try_from(x + bit % 8).map_err(|_| OutOfRange)?;
                        let cy = i64::try_from(y + bit / 8).map_err(|_| OutOfRange)?;
                        out.insert(CellCoordinate::new(cx, cy));
                    }
                }
                NodeKey::Node { nw, ne, sw, se } => {
                    let half = 1i128 << (n.level - 1);
                    inner(this, nw, x, y, out)?;
                    inner(this, ne, x + half, y, out)?;
                    inner(this, sw, x, y + half, out)?;
                    inner(this, se, x + half, y + half, out)?;
                }
            }
            Ok(())
        }

        if root.level > MAX_LEVEL {
            return Err(OutOfRange);
        }
        inner(self, root.idx, root.x, root.y, out)
    }

    /// Returns the centered node of half the size; `idx` must be at least one
    /// level above the leaves.
    pub(crate) fn centered(&mut self, idx: NodeIdx) -> NodeIdx {
        let n = self.mem.get(idx);
        let [nw, ne, sw, se] = n.parts().map(|x| self.mem.get(x));
        if n.level == LEAF_LEVEL + 1 {
            let [nw, ne, sw, se] = [nw, ne, sw, se].map(|x| u64::from_le_bytes(x.leaf_cells()));
            let cells = leaf_from_quadrants(
                leaf_quadrant(nw, 1, 1),
                leaf_quadrant(ne, 0, 1),
                leaf_quadrant(sw, 1, 0),
                leaf_quadrant(se, 0, 0),
            );
            self.mem.find_or_create_leaf(cells)
        } else {
            let (a, b, c, d) = (nw.parts()[3], ne.parts()[2], sw.parts()[1], se.parts()[0]);
            self.mem.find_or_create_node(a, b, c, d)
        }
    }

    /// Adds a blank frame around the root, making it two times bigger while
    /// keeping its content at the same place on the plane.
    pub(crate) fn with_frame(&mut self, root: &Root) -> Result<Root, OutOfRange> {
        if root.level >= MAX_LEVEL {
            return Err(OutOfRange);
        }
        let [nw, ne, sw, se] = self.mem.get(root.idx).parts();
        let b = self.blank(root.level - 1);
        let nw = self.mem.find_or_create_node(b, b, b, nw);
        let ne = self.mem.find_or_create_node(b, b, ne, b);
        let sw = self.mem.find_or_create_node(b, sw, b, b);
        let se = self.mem.find_or_create_node(se, b, b, b);
        let half = 1i128 << (root.level - 1);
        Ok(Root {
            idx: self.mem.find_or_create_node(nw, ne, sw, se),
            level: root.level + 1,
            x: root.x - half,
            y: root.y - half,
        })
    }

    /// Remove the frame around the root, making it two times smaller.
    pub(crate) fn without_frame(&mut self, root: &Root) -> Root {
        let quarter = 1i128 << (root.level - 2);
        Root {
            idx: self.centered(root.idx),
            level: root.level - 1,
            x: root.x + quarter,
            y: root.y + quarter,
        }
    }

    /// Checks that every alive cell lies in the centered half-size square of the root.
    pub(crate) fn has_blank_frame(&self, root: &Root) -> bool {
        if root.level <= LEAF_LEVEL + 1 {
            return false;
        }
        let [nw, ne, sw, se] = self.mem.get(root.idx).parts().map(|x| self.mem.get(x).parts());
        let frame_parts = [
            nw[0], nw[1], nw[2], ne[0], ne[1], ne[3], sw[0], sw[2], sw[3], se[1], se[2], se[3],
        ];
        frame_parts.iter().all(|&x| self.mem.get(x).is_blank)
    }
}
