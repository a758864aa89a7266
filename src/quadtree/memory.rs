use super::{NodeIdx, NodeKey, QuadTreeNode, LEAF_LEVEL};
use ahash::AHashMap as HashMap;

/// Arena of interned quadtree nodes.
///
/// Nodes are addressed by index and never move or disappear while the arena
/// lives, so a `NodeIdx` stays valid for as long as its manager. Dropping the
/// manager is the only way to reclaim nodes.
#[derive(Clone, Default)]
pub(crate) struct MemoryManager {
    nodes: Vec<QuadTreeNode>,
    index: HashMap<NodeKey, NodeIdx>,
}

impl MemoryManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Get a const reference to the node at the given index.
    #[inline]
    pub(crate) fn get(&self, idx: NodeIdx) -> &QuadTreeNode {
        &self.nodes[idx.0]
    }

    /// Get a mutable reference to the node at the given index.
    #[inline]
    pub(crate) fn get_mut(&mut self, idx: NodeIdx) -> &mut QuadTreeNode {
        &mut self.nodes[idx.0]
    }

    pub(crate) fn find_or_create_leaf(&mut self, cells: u64) -> NodeIdx {
        self.find_or_create(NodeKey::Leaf(cells), LEAF_LEVEL, cells == 0)
    }

    /// Find a node with the given parts.
    /// If the node is not found, it is created.
    ///
    /// All parts must have the same level.
    pub(crate) fn find_or_create_node(
        &mut self,
        nw: NodeIdx,
        ne: NodeIdx,
        sw: NodeIdx,
        se: NodeIdx,
    ) -> NodeIdx {
        let level = self.get(nw).level;
        debug_assert!(
            [ne, sw, se].iter().all(|&x| self.get(x).level == level),
            "children of different levels"
        );
        let is_blank = [nw, ne, sw, se].iter().all(|&x| self.get(x).is_blank);
        self.find_or_create(NodeKey::Node { nw, ne, sw, se }, level + 1, is_blank)
    }

    fn find_or_create(&mut self, key: NodeKey, level: u32, is_blank: bool) -> NodeIdx {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = NodeIdx(self.nodes.len());
        self.nodes.push(QuadTreeNode {
            key,
            level,
            is_blank,
            result: None,
        });
        self.index.insert(key, idx);
        idx
    }

    /// Forgets every memoized HashLife result while keeping the nodes themselves.
    pub(crate) fn clear_results(&mut self) {
        for node in self.nodes.iter_mut() {
            node.result = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap usage of the arena in bytes.
    pub(crate) fn bytes_total(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<QuadTreeNode>()
            + self.index.capacity()
                * (std::mem::size_of::<NodeKey>() + std::mem::size_of::<NodeIdx>())
    }
}
