/*
    This module stores and validates grammars
*/

use std::fmt::Display;

use indexmap::IndexMap;
use itertools::Itertools;
use thiserror::Error;

// The base unit in a grammar rule
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum Symbol {
    Terminal(String),
    Nonterminal(String),
}

// The symbols in a single alternative. An empty alternative is epsilon.
pub type Alternative = Vec<Symbol>;

// The alternatives of a rewrite rule
pub type Rewrite = Vec<Alternative>;

// Rewrite rules in definition order
pub type Ruleset = IndexMap<String, Rewrite>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GrammarError {
    #[error("Could not find definition for `{name}` (used by `{referenced_by}`)")]
    UndefinedNonterminal { name: String, referenced_by: String },
    #[error("Start symbol `{0}` has no rule")]
    InvalidStartSymbol(String),
    // Epsilon is written as an empty alternative, never as a terminal
    #[error("Empty terminal in a rule for `{nonterminal}`")]
    EmptyTerminal { nonterminal: String },
    #[error("Grammar has no rules")]
    NoRules,
}

/// Dense index of a nonterminal, in rule definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NontermId(pub(crate) u32);

impl NontermId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense index of a grammar slot, a dotted position `A -> x . y` inside one
/// alternative. The slots of one alternative are numbered consecutively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    // The slot one symbol further along the same alternative
    pub(crate) fn advance(self) -> SlotId {
        SlotId(self.0 + 1)
    }
}

// A symbol with its nonterminal reference resolved to an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolved {
    Terminal(String),
    Nonterminal(NontermId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) nonterm: NontermId,
    pub(crate) alt: u32,
    pub(crate) dot: u32,
}

#[derive(Debug, Clone)]
pub struct Grammar {
    start_symbol: String,
    rules: Ruleset,
    resolved: Vec<Vec<Vec<Resolved>>>,
    slots: Vec<Slot>,
    // Slot at the start of every alternative, per nonterminal
    entry_slots: Vec<Vec<SlotId>>,
}

impl PartialEq for Grammar {
    fn eq(&self, other: &Self) -> bool {
        self.start_symbol == other.start_symbol && self.rules == other.rules
    }
}

impl Grammar {
    /// Validates `rules` and builds the grammar. Fails if any alternative
    /// references a nonterminal without a rule, contains an empty terminal,
    /// or if `start_symbol` has no rule.
    pub fn new(start_symbol: impl Into<String>, rules: Ruleset) -> Result<Self, GrammarError> {
        let start_symbol = start_symbol.into();
        if rules.is_empty() {
            return Err(GrammarError::NoRules);
        }
        if let Some(error) = validate(&rules).into_iter().next() {
            return Err(error);
        }
        if !rules.contains_key(&start_symbol) {
            return Err(GrammarError::InvalidStartSymbol(start_symbol));
        }

        let resolved = rules.values()
            .map(|rewrite| rewrite.iter()
                .map(|alternative| alternative.iter()
                    .map(|symbol| resolve(&rules, symbol))
                    .collect())
                .collect())
            .collect::<Vec<Vec<Vec<Resolved>>>>();

        let mut slots = Vec::new();
        let mut entry_slots = Vec::with_capacity(resolved.len());
        for (nt, alternatives) in resolved.iter().enumerate() {
            let mut entries = Vec::with_capacity(alternatives.len());
            for (alt, symbols) in alternatives.iter().enumerate() {
                entries.push(SlotId(slots.len() as u32));
                for dot in 0..=symbols.len() {
                    slots.push(Slot {
                        nonterm: NontermId(nt as u32),
                        alt: alt as u32,
                        dot: dot as u32,
                    });
                }
            }
            entry_slots.push(entries);
        }

        Ok(Grammar {
            start_symbol,
            rules,
            resolved,
            slots,
            entry_slots,
        })
    }

    /// Builds a grammar whose start symbol is the first rule.
    pub fn from_rules(rules: Ruleset) -> Result<Self, GrammarError> {
        let start_symbol = rules.keys().next().cloned().ok_or(GrammarError::NoRules)?;
        Grammar::new(start_symbol, rules)
    }

    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }

    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    pub fn rewrite(&self, nonterminal: &str) -> Option<&Rewrite> {
        self.rules.get(nonterminal)
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Every distinct terminal, in order of first appearance.
    pub fn terminals(&self) -> Vec<&str> {
        self.rules.values()
            .flatten()
            .flatten()
            .filter_map(|symbol| match symbol {
                Symbol::Terminal(t) => Some(t.as_str()),
                Symbol::Nonterminal(_) => None,
            })
            .unique()
            .collect()
    }

    pub fn id_of(&self, nonterminal: &str) -> Option<NontermId> {
        self.rules.get_index_of(nonterminal).map(|i| NontermId(i as u32))
    }

    pub fn name_of(&self, id: NontermId) -> &str {
        self.rules.get_index(id.index()).map(|(name, _)| name.as_str()).unwrap_or("?")
    }

    pub fn nonterminal_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn alternatives(&self, id: NontermId) -> &[Vec<Resolved>] {
        &self.resolved[id.index()]
    }

    // Slots at the start of each alternative of `id`
    pub(crate) fn entry_slots(&self, id: NontermId) -> &[SlotId] {
        &self.entry_slots[id.index()]
    }

    pub(crate) fn slot(&self, id: SlotId) -> Slot {
        self.slots[id.index()]
    }

    // The symbol right after the dot, or None when the slot is at the end
    pub(crate) fn symbol_at(&self, id: SlotId) -> Option<&Resolved> {
        let slot = self.slot(id);
        self.resolved[slot.nonterm.index()][slot.alt as usize].get(slot.dot as usize)
    }

    /// Renders a slot as `A -> x . y` for logs.
    pub fn describe_slot(&self, id: SlotId) -> String {
        let slot = self.slot(id);
        let symbols = &self.resolved[slot.nonterm.index()][slot.alt as usize];
        let mut parts = symbols.iter()
            .map(|symbol| match symbol {
                Resolved::Terminal(t) => format!("{:?}", t),
                Resolved::Nonterminal(nt) => self.name_of(*nt).to_string(),
            })
            .collect_vec();
        parts.insert(slot.dot as usize, ".".to_string());
        format!("{} -> {}", self.name_of(slot.nonterm), parts.join(" "))
    }
}

fn resolve(rules: &Ruleset, symbol: &Symbol) -> Resolved {
    match symbol {
        Symbol::Terminal(t) => Resolved::Terminal(t.clone()),
        // Validation has already rejected undefined names
        Symbol::Nonterminal(name) => Resolved::Nonterminal(NontermId(
            rules.get_index_of(name).unwrap_or_default() as u32,
        )),
    }
}

/// Every problem with `rules`, in rule order.
pub fn validate(rules: &Ruleset) -> Vec<GrammarError> {
    rules.iter()
        .flat_map(|(lhs, rewrite)| rewrite.iter()
            .flatten()
            .filter_map(move |symbol| match symbol {
                Symbol::Terminal(t) if t.is_empty() => Some(GrammarError::EmptyTerminal {
                    nonterminal: lhs.clone(),
                }),
                Symbol::Nonterminal(name) if !rules.contains_key(name) => {
                    Some(GrammarError::UndefinedNonterminal {
                        name: name.clone(),
                        referenced_by: lhs.clone(),
                    })
                }
                _ => None,
            }))
        .collect()
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Nonterminal(name) => write!(f, "{}", name),
            Symbol::Terminal(t) if t == "ε" || t.contains("->") || t.chars().any(|c| c.is_whitespace() || c.is_uppercase() || c == '|') => {
                write!(f, "{:?}", t)
            }
            Symbol::Terminal(t) => write!(f, "{}", t),
        }
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (lhs, rewrite) in &self.rules {
            let alternatives = rewrite.iter()
                .map(|alternative| match alternative.is_empty() {
                    true => "ε".to_string(),
                    false => alternative.iter().join(" "),
                })
                .join(" | ");
            writeln!(f, "{} -> {}", lhs, alternatives)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn t(text: &str) -> Symbol {
        Symbol::Terminal(text.to_string())
    }

    fn n(text: &str) -> Symbol {
        Symbol::Nonterminal(text.to_string())
    }

    fn balanced() -> Ruleset {
        let mut rules = Ruleset::new();
        rules.insert("S".to_string(), vec![vec![t("a"), n("S"), t("b")], vec![]]);
        rules
    }

    #[test]
    fn build_valid_grammar() {
        let grammar = Grammar::from_rules(balanced()).unwrap();

        assert_eq!(grammar.start_symbol(), "S");
        assert!(grammar.is_nonterminal("S"));
        assert!(!grammar.is_nonterminal("a"));
        assert_eq!(grammar.terminals(), vec!["a", "b"]);
        assert_eq!(grammar.rewrite("S").map(Vec::len), Some(2));
        // "a S b" has four slots, epsilon has one
        assert_eq!(grammar.slot_count(), 5);
    }

    #[test]
    fn reject_undefined_nonterminal() {
        let mut rules = balanced();
        rules.insert("T".to_string(), vec![vec![n("U")]]);

        assert_eq!(Grammar::from_rules(rules), Err(GrammarError::UndefinedNonterminal {
            name: "U".to_string(),
            referenced_by: "T".to_string(),
        }));
    }

    #[test]
    fn reject_invalid_start_symbol() {
        assert_eq!(
            Grammar::new("X", balanced()),
            Err(GrammarError::InvalidStartSymbol("X".to_string()))
        );
        assert_eq!(Grammar::from_rules(Ruleset::new()), Err(GrammarError::NoRules));
    }

    #[test]
    fn reject_empty_terminal() {
        let mut rules = Ruleset::new();
        rules.insert("S".to_string(), vec![vec![t("a"), t("")]]);

        assert_eq!(Grammar::from_rules(rules), Err(GrammarError::EmptyTerminal {
            nonterminal: "S".to_string(),
        }));
    }

    #[test]
    fn slots_walk_alternatives() {
        let grammar = Grammar::from_rules(balanced()).unwrap();
        let s = grammar.id_of("S").unwrap();
        let entries = grammar.entry_slots(s).to_vec();

        assert_eq!(entries, vec![SlotId(0), SlotId(4)]);
        assert_eq!(grammar.symbol_at(entries[0]), Some(&Resolved::Terminal("a".to_string())));
        assert_eq!(grammar.symbol_at(entries[0].advance()), Some(&Resolved::Nonterminal(s)));
        assert_eq!(grammar.symbol_at(entries[1]), None);
        assert_eq!(grammar.describe_slot(entries[0].advance()), "S -> \"a\" . S \"b\"");
    }

    #[test]
    fn display_round_trips_notation() {
        let grammar = Grammar::from_rules(balanced()).unwrap();
        assert_eq!(grammar.to_string(), "S -> a S b | ε\n");
    }
}
