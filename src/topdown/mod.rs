/*
    This module holds grammar analyses and the memoized top-down recognizer.

    Top-down recognition asks "where can A end when started at i" for each
    call it makes. It is only sound when no nonterminal can call itself
    without consuming input, so `TopDown::new` proves that first and refuses
    left-recursive grammars.
*/

use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::grammar::{Grammar, GrammarError, NontermId, Resolved};
use crate::recognizer::Token;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TopDownError {
    #[error("`{0}` is left-recursive; top-down recognition would not terminate")]
    LeftRecursive(String),
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Which nonterminals derive the empty word, indexed by `NontermId`.
pub fn nullable(grammar: &Grammar) -> Vec<bool> {
    let count = grammar.nonterminal_count();
    let mut nullable = vec![false; count];

    loop {
        let mut changed = false;
        for nt in 0..count {
            if nullable[nt] {
                continue;
            }
            let alternatives = grammar.alternatives(NontermId(nt as u32));
            if alternatives.iter().any(|alt| alt.iter().all(|sym| is_nullable(&nullable, sym))) {
                nullable[nt] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    nullable
}

fn is_nullable(nullable: &[bool], sym: &Resolved) -> bool {
    match sym {
        Resolved::Terminal(_) => false,
        Resolved::Nonterminal(id) => nullable[id.index()],
    }
}

// For every nonterminal, the nonterminals it may call before consuming input
fn left_calls(grammar: &Grammar, nullable: &[bool]) -> Vec<Vec<NontermId>> {
    (0..grammar.nonterminal_count())
        .map(|nt| {
            let mut calls = Vec::new();
            for alternative in grammar.alternatives(NontermId(nt as u32)) {
                for sym in alternative {
                    match sym {
                        Resolved::Terminal(_) => break,
                        Resolved::Nonterminal(id) => {
                            calls.push(*id);
                            if !nullable[id.index()] {
                                break;
                            }
                        }
                    }
                }
            }
            calls
        })
        .collect()
}

/// A nonterminal that can re-invoke itself without consuming input, directly
/// or through other nonterminals and nullable prefixes, if there is one.
pub fn left_recursive(grammar: &Grammar) -> Option<&str> {
    let nullable = nullable(grammar);
    let calls = left_calls(grammar, &nullable);

    for start in 0..calls.len() {
        let mut seen = vec![false; calls.len()];
        let mut stack = calls[start].clone();
        while let Some(id) = stack.pop() {
            if id.index() == start {
                return Some(grammar.name_of(id));
            }
            if !std::mem::replace(&mut seen[id.index()], true) {
                stack.extend(calls[id.index()].iter().copied());
            }
        }
    }
    None
}

/// Memoized top-down recognizer for grammars without left recursion.
#[derive(Debug, Clone)]
pub struct TopDown<'g> {
    grammar: &'g Grammar,
    start: NontermId,
}

impl<'g> TopDown<'g> {
    pub fn new(grammar: &'g Grammar, start: &str) -> Result<Self, TopDownError> {
        let start = grammar
            .id_of(start)
            .ok_or_else(|| GrammarError::InvalidStartSymbol(start.to_string()))?;
        if let Some(name) = left_recursive(grammar) {
            return Err(TopDownError::LeftRecursive(name.to_string()));
        }
        Ok(TopDown { grammar, start })
    }

    pub fn recognize<T: Token>(&self, input: &[T]) -> bool {
        let mut memo = Memo::new(self.grammar, input);
        let recognized = memo.ends(self.start, 0).binary_search(&input.len()).is_ok();
        debug!(
            "top-down {} {} tokens from `{}` ({} memo entries)",
            if recognized { "recognized" } else { "rejected" },
            input.len(),
            self.grammar.name_of(self.start),
            memo.ends.len()
        );
        recognized
    }

    pub fn recognize_str(&self, word: &str) -> bool {
        self.recognize(&word.chars().collect::<Vec<_>>())
    }
}

// The sorted end positions of every (nonterminal, start) asked about so far.
// Only calls that are actually made get an entry.
struct Memo<'a, T> {
    grammar: &'a Grammar,
    input: &'a [T],
    ends: IndexMap<(NontermId, usize), Vec<usize>>,
}

impl<'a, T: Token> Memo<'a, T> {
    fn new(grammar: &'a Grammar, input: &'a [T]) -> Self {
        Memo {
            grammar,
            input,
            ends: IndexMap::new(),
        }
    }

    // Calls are resolved on an explicit stack, so deep nesting in the input
    // does not deepen the Rust call stack. Without left recursion every call
    // either consumes input or moves along the acyclic left-call graph, so
    // the stack never revisits an entry it is still waiting on.
    fn ends(&mut self, nt: NontermId, start: usize) -> &[usize] {
        let mut pending = vec![(nt, start)];
        while let Some(&key) = pending.last() {
            if self.ends.contains_key(&key) {
                pending.pop();
                continue;
            }
            match self.try_ends(key.0, key.1) {
                Ok(ends) => {
                    self.ends.insert(key, ends);
                    pending.pop();
                }
                Err(missing) => pending.push(missing),
            }
        }
        self.ends.get(&(nt, start)).map(Vec::as_slice).unwrap_or(&[])
    }

    // Every end position of `nt` from `start`, or the first call whose
    // answer is not known yet
    fn try_ends(&self, nt: NontermId, start: usize) -> Result<Vec<usize>, (NontermId, usize)> {
        let mut ends = BTreeSet::new();
        for alternative in self.grammar.alternatives(nt) {
            let mut frontier = BTreeSet::from([start]);
            for symbol in alternative {
                let mut next = BTreeSet::new();
                for &pos in &frontier {
                    match symbol {
                        Resolved::Terminal(terminal) => {
                            if self.input.get(pos).is_some_and(|token| token.matches(terminal)) {
                                next.insert(pos + 1);
                            }
                        }
                        Resolved::Nonterminal(callee) => {
                            let known = self.ends.get(&(*callee, pos)).ok_or((*callee, pos))?;
                            next.extend(known.iter().copied());
                        }
                    }
                }
                frontier = next;
                if frontier.is_empty() {
                    break;
                }
            }
            ends.extend(frontier);
        }
        Ok(ends.into_iter().collect())
    }
}
