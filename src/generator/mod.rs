/*
    This module generates random sentences of a grammar
*/

use log::trace;
use rand::prelude::*;
use thiserror::Error;

use crate::grammar::{Grammar, NontermId, Resolved};

pub const DEFAULT_MAX_DEPTH: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    // An undefined nonterminal was used
    #[error("No definition for nonterminal `{0}`")]
    UndefinedNonterminal(String),
    // Every derivation of the nonterminal is infinite
    #[error("`{0}` derives no finite sentence")]
    Unproductive(String),
}

pub type GenResult = Result<Vec<String>, GenerateError>;

pub struct Generator<'g> {
    grammar: &'g Grammar,
    // Height of the shortest derivation tree per nonterminal; None if there is no finite one
    heights: Vec<Option<usize>>,
    max_depth: usize,
}

impl<'g> Generator<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Generator {
            grammar,
            heights: min_heights(grammar),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Past this depth only alternatives that end the derivation soonest are
    /// chosen.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn generate(&self, start: &str) -> GenResult {
        self.generate_with(start, &mut thread_rng())
    }

    // Generates a sentence from the given start symbol
    pub fn generate_with<R: Rng + ?Sized>(&self, start: &str, rng: &mut R) -> GenResult {
        let id = self.grammar
            .id_of(start)
            .ok_or_else(|| GenerateError::UndefinedNonterminal(start.to_string()))?;
        if self.heights[id.index()].is_none() {
            return Err(GenerateError::Unproductive(start.to_string()));
        }

        let mut sentence = Vec::new();
        self.generate_nonterminal(id, 0, rng, &mut sentence);
        trace!("generated {:?} from `{}`", sentence, start);
        Ok(sentence)
    }

    fn generate_nonterminal<R: Rng + ?Sized>(&self, id: NontermId, depth: usize, rng: &mut R, sentence: &mut Vec<String>) {
        let best = self.heights[id.index()];
        let candidates = self.grammar.alternatives(id).iter()
            .filter(|alternative| match alternative_height(&self.heights, alternative) {
                None => false,
                Some(_) if depth < self.max_depth => true,
                height => height == best,
            })
            .collect::<Vec<_>>();

        // Only reached for productive nonterminals, so there is a candidate
        let Some(alternative) = candidates.choose(rng) else {
            return;
        };
        for symbol in alternative.iter() {
            match symbol {
                Resolved::Terminal(t) => sentence.push(t.clone()),
                Resolved::Nonterminal(child) => self.generate_nonterminal(*child, depth + 1, rng, sentence),
            }
        }
    }
}

fn alternative_height(heights: &[Option<usize>], alternative: &[Resolved]) -> Option<usize> {
    alternative.iter()
        .map(|symbol| match symbol {
            Resolved::Terminal(_) => Some(0),
            Resolved::Nonterminal(id) => heights[id.index()],
        })
        .try_fold(0, |highest, height| height.map(|h| highest.max(h)))
        .map(|highest| highest + 1)
}

fn min_heights(grammar: &Grammar) -> Vec<Option<usize>> {
    let mut heights = vec![None; grammar.nonterminal_count()];

    loop {
        let mut changed = false;
        for nt in 0..heights.len() {
            let best = grammar.alternatives(NontermId(nt as u32)).iter()
                .filter_map(|alternative| alternative_height(&heights, alternative))
                .min();
            if best.is_some() && (heights[nt].is_none() || best < heights[nt]) {
                heights[nt] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    heights
}
