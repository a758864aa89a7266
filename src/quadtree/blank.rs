use super::{MemoryManager, NodeIdx, LEAF_LEVEL};

/// Caches the blank node of every level for faster lookups.
#[derive(Clone, Default)]
pub(crate) struct BlankNodes {
    data: Vec<NodeIdx>,
}

impl BlankNodes {
    pub(crate) fn new() -> Self {
        Self { data: vec![] }
    }

    pub(crate) fn get(&mut self, level: u32, mem: &mut MemoryManager) -> NodeIdx {
        let i = (level - LEAF_LEVEL) as usize;
        let v = &mut self.data;
        while v.len() <= i {
            if let Some(&b) = v.last() {
                v.push(mem.find_or_create_node(b, b, b, b));
            } else {
                v.push(mem.find_or_create_leaf(0));
            };
        }
        v[i]
    }
}
