/*
    This module parses grammar files of the form

        S -> A S d | B S | ε
        A -> a | c
*/

mod lexer;
mod verifier;

use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::grammar::*;
use crate::error_handling::*;
pub use lexer::{is_nonterminal_name, EPSILON};
use lexer::*;
use verifier::verify_rules;
use verifier::IntermediateRuleset;

#[derive(Debug, thiserror::Error)]
pub enum CompileErrorType {
    // A line which should contain a rule does not
    #[error("Expected `->` after nonterminal")]
    MissingArrow,
    // A rule has multiple arrows
    #[error("Unexpected `->` encountered")]
    UnexpectedArrow,
    // The user starts a rule line with something other than a nonterminal
    #[error("Tried to define something other than a nonterminal")]
    MissingNonterminal,
    // There is an unclosed quote
    #[error("Unmatched quotes")]
    UnmatchedQuote,
    // `ε` written next to other symbols
    #[error("`ε` must be the only symbol of its alternative")]
    MisplacedEpsilon,
    // `""` used as a terminal
    #[error("Empty terminal; write epsilon as an empty alternative or `ε`")]
    EmptyTerminal,
    // An undefined nonterminal was used
    #[error("Could not find definition for `{0}`")]
    UndefinedNonterminal(String),
    // The file defines no rules at all
    #[error("No rules defined")]
    NoRules,
    // The rules are well formed but do not make a valid grammar
    #[error("{0}")]
    Grammar(GrammarError),
    // Somehow a full rewrite was parsed as a base alternative
    // This is a problem with the loader, not the grammar
    #[error("Rewrite was not fully split (this is a problem with the loader, not the grammar)")]
    UnsplitRewrite,
    // A blank line got too deep into the parser
    // This is a problem with the loader, not the grammar
    #[error("Blank line encountered in rule parser (this is a problem with the loader, not the grammar)")]
    UnexpectedBlankLine,
    // There was an issue with reading a file
    #[error("File error: {0}")]
    FileError(std::io::Error),
}

impl ErrorType for CompileErrorType {}

impl PartialEq for CompileErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CompileErrorType::FileError(a), CompileErrorType::FileError(b)) => a.kind() == b.kind(),
            (CompileErrorType::UndefinedNonterminal(a), CompileErrorType::UndefinedNonterminal(b)) => a == b,
            (CompileErrorType::Grammar(a), CompileErrorType::Grammar(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

pub type CompileError = Error<CompileErrorType>;
pub type CompileErrors = Errors<CompileErrorType>;

fn io_error(error: std::io::Error, file: &Path) -> CompileError {
    CompileError {
        location: Location::whole_file(file),
        error: CompileErrorType::FileError(error)
    }
}

pub type Result<T> = std::result::Result<T, CompileErrorType>;
pub type LineResult<T> = std::result::Result<T, CompileError>;
pub type FileResult<T> = std::result::Result<T, CompileErrors>;

#[derive(PartialEq, Debug)]
struct Rule {
    symbol: String,
    rewrite: Rewrite,
    location: Location
}

fn parse_alternative(tokens: &[Token]) -> Result<Alternative> {
    if tokens == [Token::Epsilon] {
        return Ok(Vec::new());
    }

    tokens.iter().map(|t| match t {
        Token::Arrow => Err(CompileErrorType::UnexpectedArrow),
        Token::Or => Err(CompileErrorType::UnsplitRewrite),
        Token::Epsilon => Err(CompileErrorType::MisplacedEpsilon),
        Token::Terminal(s) if s.is_empty() => Err(CompileErrorType::EmptyTerminal),
        Token::Nonterminal(s) => Ok(Symbol::Nonterminal(s.clone())),
        Token::Terminal(s) => Ok(Symbol::Terminal(s.clone()))
    }).collect()
}

fn parse_rewrite(tokens: &[Token]) -> Result<Rewrite> {
    tokens.split(|t| *t == Token::Or).map(parse_alternative).collect()
}

fn parse_line(tokens: &[Token], location: Location) -> Result<Rule> {
    let symbol = match tokens.get(0) {
        Some(Token::Nonterminal(s)) => Ok(s.clone()),
        Some(_) => Err(CompileErrorType::MissingNonterminal),
        None => Err(CompileErrorType::UnexpectedBlankLine)
    }?;

    if tokens.get(1) != Some(&Token::Arrow) {
        return Err(CompileErrorType::MissingArrow)
    }

    let rewrite = parse_rewrite(&tokens[2..])?;

    return Ok(Rule {
        symbol,
        rewrite,
        location
    });
}

fn parse_lex_line(line: &str, location: Location) -> LineResult<Rule> {
    lexer::lex_line(line)
        .and_then(|lexed_line| parse_line(&lexed_line, location.clone()))
        .map_err(|error| CompileError { location: location, error })
}

pub fn is_rule_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(';')
}

// Returns an iterator over the lines of a file, with the io errors wrapped
// in CompileError and enumerated
fn file_line_nums<'a>(file: File, path: &'a Path) -> impl Iterator<Item = (usize, LineResult<String>)> + 'a {
    std::io::BufReader::new(file)
        .lines()
        .map(move |line| line.map_err(|e| io_error(e, path)))
        .enumerate()
        .filter(|(_, line)| line.as_ref().is_ok_and(|l| is_rule_line(l)) || line.is_err())
        .map(|(num, line)| (num + 1, line))
}

// Collects rules by nonterminal, appending alternatives of repeated rules
fn ruleset_from_rules(rules: Vec<Rule>) -> FileResult<Ruleset> {
    let mut test_ruleset = IntermediateRuleset::with_capacity(rules.len());
    for rule in rules {
        let entry = test_ruleset.entry(rule.symbol).or_insert_with(Vec::new);
        entry.extend(rule.rewrite.into_iter().map(|alternative| (alternative, rule.location.clone())));
    }

    verify_rules(&test_ruleset)?;

    let ruleset = test_ruleset.into_iter()
        .map(|(symbol, alternatives)| {
            let rewrite = alternatives.into_iter().map(|(alternative, _)| alternative).collect_vec();
            (symbol, rewrite)
        })
        .collect::<IndexMap<_, _>>();

    return Ok(ruleset);
}

fn grammar_from_rules(rule_list: Vec<Rule>, path: &Path) -> FileResult<Grammar> {
    let rules = ruleset_from_rules(rule_list)?;

    Grammar::from_rules(rules).map_err(|error| {
        let error = match error {
            GrammarError::NoRules => CompileErrorType::NoRules,
            other => CompileErrorType::Grammar(other),
        };
        vec![CompileError { location: Location::whole_file(path), error }]
    })
}

fn parse_numbered_lines(lines: impl Iterator<Item = (usize, LineResult<String>)>, path: &Path) -> FileResult<Grammar> {
    let parsed_lines = lines.map(|(num, line_res)| {
        line_res.and_then(|line| parse_lex_line(&line, Location::new(path, num)))
    });

    let (rules, errors): (Vec<_>, Vec<_>) = parsed_lines.partition_result();
    if errors.len() > 0 {
        return Err(errors);
    }

    let grammar = grammar_from_rules(rules, path)?;
    debug!(
        "loaded grammar from {} with {} nonterminals, start symbol `{}`",
        path.display(),
        grammar.nonterminal_count(),
        grammar.start_symbol()
    );
    Ok(grammar)
}

/// Parses grammar text whose first line is line `first_line` of `path`.
pub fn parse_lines_at(text: &str, path: &Path, first_line: usize) -> FileResult<Grammar> {
    let lines = text.lines()
        .enumerate()
        .filter(|(_, line)| is_rule_line(line))
        .map(|(num, line)| (num + first_line, Ok(line.to_string())));

    parse_numbered_lines(lines, path)
}

pub fn parse_str(text: &str) -> FileResult<Grammar> {
    parse_lines_at(text, Path::new("<string>"), 1)
}

pub fn parse_file(path: &Path) -> FileResult<Grammar> {
    let file = File::open(path).map_err(|e| vec![io_error(e, path)])?;
    parse_numbered_lines(file_line_nums(file, path), path)
}
