use indexmap::IndexMap;

use crate::grammar::Symbol::Nonterminal;
use super::CompileErrorType::UndefinedNonterminal;
use super::{Alternative, CompileError, CompileErrors, FileResult, Location};

// Every alternative of a nonterminal, with the line it was defined on
pub type IntermediateRuleset = IndexMap<String, Vec<(Alternative, Location)>>;

fn get_alternative_undefined_symbols(alternative: &Alternative, location: &Location, rules: &IntermediateRuleset) -> CompileErrors {
    // Filter out everything but nonterminals and unwrap the text from the
    // nonterminals. Then filter out all the undefined nonterminals.
    alternative.iter()
        .filter_map(|symbol| match symbol {
            Nonterminal(symbol) => Some(symbol),
            _ => None
        })
        .filter(|symbol| !rules.contains_key(*symbol))
        .map(|symbol_text| CompileError {
            location: location.to_owned(),
            error: UndefinedNonterminal(symbol_text.to_owned())
        })
        .collect()
}

fn get_undefined_symbols(rules: &IntermediateRuleset) -> CompileErrors {
    rules.values()
        .flatten()
        .flat_map(|(alternative, location)| get_alternative_undefined_symbols(alternative, location, rules))
        .collect()
}

pub fn verify_rules(rules: &IntermediateRuleset) -> FileResult<()> {
    let errors = get_undefined_symbols(rules);

    if errors.len() > 0 {
        Err(errors)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::Symbol;
    use super::*;

    #[test]
    fn report_each_undefined_use() {
        let mut rules = IntermediateRuleset::new();
        rules.insert("S".to_string(), vec![
            (vec![Symbol::Nonterminal("A".to_string())], Location::new("g", 1)),
            (vec![Symbol::Terminal("a".to_string())], Location::new("g", 1)),
        ]);
        rules.insert("T".to_string(), vec![
            (vec![Symbol::Nonterminal("S".to_string()), Symbol::Nonterminal("B".to_string())], Location::new("g", 2)),
        ]);

        let errors = verify_rules(&rules).unwrap_err();
        assert_eq!(errors, vec![
            CompileError { location: Location::new("g", 1), error: UndefinedNonterminal("A".to_string()) },
            CompileError { location: Location::new("g", 2), error: UndefinedNonterminal("B".to_string()) },
        ]);
    }
}
