/*
    Descriptors, the worklist that drains them, and the step function that
    turns one descriptor into its follow-ups
*/

use std::collections::{HashSet, VecDeque};
use std::fmt::Display;

use itertools::Itertools;

use crate::grammar::{Grammar, Resolved, SlotId};
use super::bitset::BitSet;
use super::completion::CompletionTable;
use super::gss::{Gss, NodeId};
use super::Token;

/// One unit of pending work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// Enumerate every alternative of the node's nonterminal at the node's
    /// start position.
    Expand { node: NodeId },
    /// Resume matching at `slot` from input position `pos`; reaching the end
    /// of the alternative completes `node` at `pos`.
    Continue { node: NodeId, pos: usize, slot: SlotId },
}

/// The order descriptors are taken off the worklist. The answer does not
/// depend on it, only the amount of work done before quiescence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WorklistOrder {
    #[default]
    Fifo,
    Lifo,
}

impl Display for WorklistOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorklistOrder::Fifo => write!(f, "fifo"),
            WorklistOrder::Lifo => write!(f, "lifo"),
        }
    }
}

/// Owns the worklist and the sets that make every distinct descriptor run at
/// most once.
#[derive(Debug)]
pub struct Scheduler {
    order: WorklistOrder,
    worklist: VecDeque<Descriptor>,
    // One bit per GSS node
    expanded: BitSet,
    // Continuations queued so far
    visited: HashSet<(NodeId, usize, SlotId)>,
    processed: u64,
}

impl Scheduler {
    pub fn new(order: WorklistOrder, grammar: &Grammar, input_len: usize) -> Self {
        Scheduler {
            order,
            worklist: VecDeque::new(),
            // Node ids are dense and there is at most one node per
            // (nonterminal, position)
            expanded: BitSet::new(grammar.nonterminal_count() * (input_len + 1)),
            visited: HashSet::new(),
            processed: 0,
        }
    }

    /// Queues `descriptor` unless an identical one was queued before.
    pub fn push(&mut self, descriptor: Descriptor) -> bool {
        let fresh = match descriptor {
            Descriptor::Expand { node } => self.expanded.insert(node.index()),
            Descriptor::Continue { node, pos, slot } => self.visited.insert((node, pos, slot)),
        };
        if fresh {
            self.worklist.push_back(descriptor);
        }
        fresh
    }

    pub fn pop(&mut self) -> Option<Descriptor> {
        let next = match self.order {
            WorklistOrder::Fifo => self.worklist.pop_front(),
            WorklistOrder::Lifo => self.worklist.pop_back(),
        };
        if next.is_some() {
            self.processed += 1;
        }
        next
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn pending(&self) -> usize {
        self.worklist.len()
    }
}

/// Processes one descriptor against the GSS and completion table and
/// returns the descriptors it gives rise to. Deduplication is left to the
/// scheduler.
pub fn step<T: Token>(
    grammar: &Grammar,
    input: &[T],
    gss: &mut Gss,
    completions: &mut CompletionTable,
    descriptor: Descriptor,
) -> Vec<Descriptor> {
    match descriptor {
        Descriptor::Expand { node } => {
            let pos = gss.position(node);
            grammar.entry_slots(gss.label(node)).iter()
                .map(|&slot| Descriptor::Continue { node, pos, slot })
                .collect()
        }
        Descriptor::Continue { node, pos, slot } => match grammar.symbol_at(slot) {
            None => {
                if !completions.record(node, pos) {
                    return Vec::new();
                }
                gss.continuations(node).iter()
                    .map(|edge| Descriptor::Continue { node: edge.waiting, pos, slot: edge.resume })
                    .collect()
            }
            Some(Resolved::Terminal(terminal)) => {
                match input.get(pos) {
                    Some(token) if token.matches(terminal) => {
                        vec![Descriptor::Continue { node, pos: pos + 1, slot: slot.advance() }]
                    }
                    _ => Vec::new(),
                }
            }
            Some(Resolved::Nonterminal(callee)) => {
                let child = gss.get_or_create(*callee, pos);
                let resume = slot.advance();
                gss.add_continuation(child, node, resume);

                // The child may already have completed before this call site
                // existed
                let mut next = completions.completions_for(child).iter()
                    .map(|&end| Descriptor::Continue { node, pos: end, slot: resume })
                    .collect_vec();
                next.push(Descriptor::Expand { node: child });
                next
            }
        },
    }
}
