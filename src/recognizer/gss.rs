/*
    This module holds the graph-structured stack.

    Nodes live in one arena keyed by `(nonterminal, start position)`, so a
    nonterminal instance is created at most once per input position. Edges
    are stored on the callee as `(waiting node, resume slot)` pairs and refer
    to other nodes by index only.
*/

use indexmap::{IndexMap, IndexSet};

use crate::grammar::{NontermId, SlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A call site blocked on a node. When the node completes at some position,
/// matching continues in `waiting` from `resume` at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Continuation {
    pub waiting: NodeId,
    pub resume: SlotId,
}

#[derive(Debug, Default)]
pub struct Gss {
    nodes: IndexMap<(NontermId, usize), IndexSet<Continuation>>,
    edge_count: usize,
}

impl Gss {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, label: NontermId, position: usize) -> NodeId {
        let key = (label, position);
        let index = match self.nodes.get_index_of(&key) {
            Some(index) => index,
            None => self.nodes.insert_full(key, IndexSet::new()).0,
        };
        NodeId(index as u32)
    }

    pub fn find(&self, label: NontermId, position: usize) -> Option<NodeId> {
        self.nodes.get_index_of(&(label, position)).map(|index| NodeId(index as u32))
    }

    /// Records that `waiting` resumes at `resume` once `node` completes.
    /// Returns false if the edge was already present.
    pub fn add_continuation(&mut self, node: NodeId, waiting: NodeId, resume: SlotId) -> bool {
        let added = self.nodes[node.index()].insert(Continuation { waiting, resume });
        if added {
            self.edge_count += 1;
        }
        added
    }

    pub fn continuations(&self, node: NodeId) -> &IndexSet<Continuation> {
        &self.nodes[node.index()]
    }

    pub fn label(&self, node: NodeId) -> NontermId {
        self.key(node).0
    }

    pub fn position(&self, node: NodeId) -> usize {
        self.key(node).1
    }

    fn key(&self, node: NodeId) -> (NontermId, usize) {
        self.nodes.get_index(node.index()).map(|(key, _)| *key).unwrap_or_else(|| {
            panic!("GSS node {} does not exist", node.index())
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
