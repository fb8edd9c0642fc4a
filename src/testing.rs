/*
    Test support: an independent brute-force membership oracle and input
    strategies
*/

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

use crate::grammar::{Grammar, Symbol};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Words of length `0..=max_len` over `alphabet`.
pub fn words_over(alphabet: &[char], max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(alphabet.to_vec()), 0..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Least fixpoint of "`A` derives `word[i..j]`" over every span, computed by
/// re-matching every alternative against every start position until nothing
/// changes. Slow but obviously correct.
pub fn brute_force_derives(grammar: &Grammar, start: &str, word: &str) -> bool {
    let input = word.chars().collect::<Vec<_>>();
    let n = input.len();
    let mut spans: HashSet<(&str, usize, usize)> = HashSet::new();

    loop {
        let mut changed = false;
        for (lhs, rewrite) in grammar.rules() {
            for alternative in rewrite {
                for i in 0..=n {
                    for j in span_ends(alternative, i, &input, &spans) {
                        changed |= spans.insert((lhs.as_str(), i, j));
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    spans.contains(&(start, 0, n))
}

fn span_ends(alternative: &[Symbol], i: usize, input: &[char], spans: &HashSet<(&str, usize, usize)>) -> BTreeSet<usize> {
    let mut frontier = BTreeSet::from([i]);
    for symbol in alternative {
        frontier = frontier.iter()
            .flat_map(|&p| match symbol {
                Symbol::Terminal(t) => input.get(p)
                    .filter(|c| c.to_string() == *t)
                    .map(|_| p + 1)
                    .into_iter()
                    .collect::<Vec<_>>(),
                Symbol::Nonterminal(name) => (p..=input.len())
                    .filter(|&q| spans.contains(&(name.as_str(), p, q)))
                    .collect(),
            })
            .collect();
    }
    frontier
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_str;
    use super::*;

    #[test]
    fn oracle_on_known_words() {
        let grammar = parse_str("S -> a S b | ε").unwrap();
        assert!(brute_force_derives(&grammar, "S", ""));
        assert!(brute_force_derives(&grammar, "S", "aabb"));
        assert!(!brute_force_derives(&grammar, "S", "aab"));

        let grammar = parse_str("S -> S S | b").unwrap();
        assert!(brute_force_derives(&grammar, "S", "bbb"));
        assert!(!brute_force_derives(&grammar, "S", ""));
    }
}
