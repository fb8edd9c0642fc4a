/*
    Completion table: the `(node, end)` facts proven so far
*/

use std::collections::HashSet;

use super::gss::NodeId;

#[derive(Debug)]
pub struct CompletionTable {
    seen: HashSet<(NodeId, usize)>,
    // End positions per node, in the order they were proven
    ends: Vec<Vec<usize>>,
}

impl CompletionTable {
    pub fn new(input_len: usize) -> Self {
        CompletionTable {
            seen: HashSet::with_capacity(input_len + 1),
            ends: Vec::new(),
        }
    }

    pub fn record(&mut self, node: NodeId, end: usize) -> bool {
        if !self.seen.insert((node, end)) {
            return false;
        }
        if self.ends.len() <= node.index() {
            self.ends.resize_with(node.index() + 1, Vec::new);
        }
        self.ends[node.index()].push(end);
        true
    }

    pub fn has(&self, node: NodeId, end: usize) -> bool {
        self.seen.contains(&(node, end))
    }

    pub fn completions_for(&self, node: NodeId) -> &[usize] {
        self.ends.get(node.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
