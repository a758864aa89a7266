/// Location of a node in the [`MemoryManager`](super::MemoryManager) arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(pub(crate) usize);

/// Content of a node, which is also its interning key: two nodes with equal
/// keys are always the same node.
///
/// A leaf is an 8x8 block stored row by row, bit `x + 8 * y` being the cell `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum NodeKey {
    Leaf(u64),
    Node {
        nw: NodeIdx,
        ne: NodeIdx,
        sw: NodeIdx,
        se: NodeIdx,
    },
}

/// A node of the quadtree.
#[derive(Clone, Debug)]
pub(crate) struct QuadTreeNode {
    pub(crate) key: NodeKey,
    /// log2 of the side length: 3 for leaves
    pub(crate) level: u32,
    /// true if no cell inside the node is alive
    pub(crate) is_blank: bool,
    /// HashLife result: the centered half-size node `2^(level-2)` generations ahead
    pub(crate) result: Option<NodeIdx>,
}

impl QuadTreeNode {
    /// Returns the four children; panics on leaves, which have no child nodes.
    pub(crate) fn parts(&self) -> [NodeIdx; 4] {
        match self.key {
            NodeKey::Node { nw, ne, sw, se } => [nw, ne, sw, se],
            NodeKey::Leaf(_) => unreachable!("leaves have no children"),
        }
    }

    /// Returns the cells of a leaf row by row; panics on non-leaves.
    pub(crate) fn leaf_cells(&self) -> [u8; 8] {
        match self.key {
            NodeKey::Leaf(cells) => cells.to_le_bytes(),
            NodeKey::Node { .. } => unreachable!("only leaves store cells"),
        }
    }
}

/// Extracts one 4x4 quadrant of a leaf, 4 bits per row.
///
/// `qx` and `qy` select the quadrant: `(0, 0)` is nw and `(1, 1)` is se.
pub(crate) fn leaf_quadrant(cells: u64, qx: u32, qy: u32) -> u16 {
    let mut result = 0;
    for row in 0..4 {
        let bits = (cells >> ((qy * 4 + row) * 8 + qx * 4)) & 0xF;
        result |= (bits as u16) << (row * 4);
    }
    result
}

/// Inverse of [`leaf_quadrant`]: assembles a leaf from four 4x4 quadrants.
pub(crate) fn leaf_from_quadrants(nw: u16, ne: u16, sw: u16, se: u16) -> u64 {
    let mut cells = 0u64;
    for row in 0..4 {
        let take = |q: u16| ((q >> (row * 4)) & 0xF) as u64;
        cells |= (take(nw) | take(ne) << 4) << (row * 8);
        cells |= (take(sw) | take(se) << 4) << ((row + 4) * 8);
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrants_roundtrip() {
        let cells = 0x8142_2418_0F0F_F00Fu64;
        let parts = [(0, 0), (1, 0), (0, 1), (1, 1)].map(|(qx, qy)| leaf_quadrant(cells, qx, qy));
        assert_eq!(leaf_from_quadrants(parts[0], parts[1], parts[2], parts[3]), cells);
    }

    #[test]
    fn test_quadrant_positions() {
        // single cell at (5, 6) belongs to the se quadrant at (1, 2)
        let cells = 1u64 << (5 + 8 * 6);
        assert_eq!(leaf_quadrant(cells, 1, 1), 1 << (1 + 4 * 2));
        assert_eq!(leaf_quadrant(cells, 0, 0), 0);
    }
}
