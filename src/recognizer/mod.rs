/*
    This module decides whether a word belongs to the language of a grammar.

    Work is split into descriptors drained from a worklist. Calling a
    nonterminal never recurses: the caller leaves a continuation edge on the
    callee's GSS node and stops, and every completion of the callee resumes
    all of its waiting callers. Together with descriptor deduplication this
    handles ambiguous and left-recursive grammars in polynomial time.
*/

mod bitset;
pub mod completion;
pub mod gss;
pub mod scheduler;

use std::fmt::Display;

use log::{debug, trace, warn};

use crate::grammar::{Grammar, GrammarError, NontermId};
use completion::CompletionTable;
use gss::Gss;
use scheduler::{step, Descriptor, Scheduler};
pub use scheduler::WorklistOrder;

/// An input token that can be compared against terminal text.
pub trait Token {
    fn matches(&self, terminal: &str) -> bool;
}

impl Token for char {
    fn matches(&self, terminal: &str) -> bool {
        let mut chars = terminal.chars();
        chars.next() == Some(*self) && chars.next().is_none()
    }
}

impl Token for str {
    fn matches(&self, terminal: &str) -> bool {
        self == terminal
    }
}

impl Token for String {
    fn matches(&self, terminal: &str) -> bool {
        self == terminal
    }
}

impl<T: Token + ?Sized> Token for &T {
    fn matches(&self, terminal: &str) -> bool {
        (**self).matches(terminal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecognizerConfig {
    pub order: WorklistOrder,
    /// Give up with [`Outcome::Inconclusive`] after processing this many
    /// descriptors.
    pub step_budget: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Recognized,
    Rejected,
    // The step budget ran out before the worklist was empty
    Inconclusive,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Recognized => write!(f, "recognized"),
            Outcome::Rejected => write!(f, "rejected"),
            Outcome::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// Counters for one recognition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    pub descriptors: u64,
    pub expansions: u64,
    pub gss_nodes: usize,
    pub gss_edges: usize,
    pub completions: usize,
}

impl Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} descriptors, {} expansions, {} GSS nodes, {} GSS edges, {} completions",
            self.descriptors, self.expansions, self.gss_nodes, self.gss_edges, self.completions
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub outcome: Outcome,
    pub stats: RunStats,
}

/// Recognizer for one grammar and start symbol. Every call runs with fresh
/// state; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Recognizer<'g> {
    grammar: &'g Grammar,
    start: NontermId,
    config: RecognizerConfig,
}

impl<'g> Recognizer<'g> {
    pub fn new(grammar: &'g Grammar, start: &str) -> Result<Self, GrammarError> {
        let start = grammar
            .id_of(start)
            .ok_or_else(|| GrammarError::InvalidStartSymbol(start.to_string()))?;
        Ok(Recognizer {
            grammar,
            start,
            config: RecognizerConfig::default(),
        })
    }

    pub fn with_config(mut self, config: RecognizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    /// Whether `input` is in the language. Always runs to completion; the
    /// step budget does not apply.
    pub fn recognize<T: Token>(&self, input: &[T]) -> bool {
        self.execute(input, None).outcome == Outcome::Recognized
    }

    /// Like [`Recognizer::recognize`] with one token per character.
    pub fn recognize_str(&self, word: &str) -> bool {
        self.recognize(&word.chars().collect::<Vec<_>>())
    }

    /// Runs under the configured step budget and reports statistics.
    pub fn run<T: Token>(&self, input: &[T]) -> Report {
        self.execute(input, self.config.step_budget)
    }

    pub fn run_str(&self, word: &str) -> Report {
        self.run(&word.chars().collect::<Vec<_>>())
    }

    fn execute<T: Token>(&self, input: &[T], budget: Option<u64>) -> Report {
        let grammar = self.grammar;
        let mut gss = Gss::new();
        let mut completions = CompletionTable::new(input.len());
        let mut scheduler = Scheduler::new(self.config.order, grammar, input.len());
        let mut expansions = 0;

        debug!(
            "recognizing {} tokens from `{}` ({} order)",
            input.len(),
            grammar.name_of(self.start),
            self.config.order
        );

        let root = gss.get_or_create(self.start, 0);
        scheduler.push(Descriptor::Expand { node: root });

        let mut exhausted = false;
        while let Some(descriptor) = scheduler.pop() {
            if budget.is_some_and(|budget| scheduler.processed() > budget) {
                warn!(
                    "step budget of {} descriptors exhausted with {} still pending",
                    scheduler.processed() - 1,
                    scheduler.pending() + 1
                );
                exhausted = true;
                break;
            }

            match descriptor {
                Descriptor::Expand { node } => {
                    expansions += 1;
                    trace!(
                        "expand {}@{}",
                        grammar.name_of(gss.label(node)),
                        gss.position(node)
                    );
                }
                Descriptor::Continue { node, pos, slot } => {
                    trace!(
                        "continue [{}] at {} for {}@{}",
                        grammar.describe_slot(slot),
                        pos,
                        grammar.name_of(gss.label(node)),
                        gss.position(node)
                    );
                }
            }

            for next in step(grammar, input, &mut gss, &mut completions, descriptor) {
                scheduler.push(next);
            }
        }

        let stats = RunStats {
            descriptors: scheduler.processed().min(budget.unwrap_or(u64::MAX)),
            expansions,
            gss_nodes: gss.node_count(),
            gss_edges: gss.edge_count(),
            completions: completions.len(),
        };
        let outcome = if completions.has(root, input.len()) {
            Outcome::Recognized
        } else if exhausted {
            Outcome::Inconclusive
        } else {
            Outcome::Rejected
        };
        debug!("{} after {}", outcome, stats);

        Report { outcome, stats }
    }
}

/// Whether `input` is derivable from `start` in `grammar`.
pub fn recognize<T: Token>(grammar: &Grammar, start: &str, input: &[T]) -> Result<bool, GrammarError> {
    Ok(Recognizer::new(grammar, start)?.recognize(input))
}
