/*
    This module reads test-case files and runs their words through a
    recognizer. A test-case file is a grammar, a blank line, then one case
    per line:

        S -> a S b | ε

        aabb 1
        aab 0
        1
*/

use std::fmt::Display;
use std::path::Path;

use itertools::Itertools;
use log::{debug, info};

use crate::error_handling::{Error, ErrorType, Errors, Location};
use crate::grammar::{Grammar, GrammarError};
use crate::parser::{self, CompileErrorType, EPSILON};
use crate::recognizer::{Outcome, Recognizer, RecognizerConfig};
use crate::topdown::{TopDown, TopDownError};

#[derive(Debug, thiserror::Error)]
pub enum CaseErrorType {
    // No blank line between the grammar and the cases
    #[error("Need a blank line separating grammar and test cases")]
    MissingSeparator,
    // A case line without a word and a label
    #[error("Expected `word label`, found `{0}`")]
    MalformedCase(String),
    // The label is neither 0 nor 1
    #[error("Label must be 0 or 1, found `{0}`")]
    InvalidLabel(String),
    // The grammar block failed to compile
    #[error("{0}")]
    Grammar(CompileErrorType),
    #[error("File error: {0}")]
    FileError(std::io::Error),
}

impl ErrorType for CaseErrorType {}

impl PartialEq for CaseErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CaseErrorType::MalformedCase(a), CaseErrorType::MalformedCase(b)) => a == b,
            (CaseErrorType::InvalidLabel(a), CaseErrorType::InvalidLabel(b)) => a == b,
            (CaseErrorType::Grammar(a), CaseErrorType::Grammar(b)) => a == b,
            (CaseErrorType::FileError(a), CaseErrorType::FileError(b)) => a.kind() == b.kind(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

pub type CaseError = Error<CaseErrorType>;
pub type CaseErrors = Errors<CaseErrorType>;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    TopDown(#[from] TopDownError),
}

/// Which recognizer runs the cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Engine {
    #[default]
    Gss,
    // Only for grammars without left recursion
    TopDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub word: String,
    pub expected: bool,
    pub location: Location,
}

#[derive(Debug)]
pub struct CaseFile {
    pub grammar: Grammar,
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub case: TestCase,
    pub outcome: Outcome,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        match self.outcome {
            Outcome::Recognized => self.case.expected,
            Outcome::Rejected => !self.case.expected,
            Outcome::Inconclusive => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub results: Vec<CaseResult>,
}

impl Summary {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|result| result.passed()).count()
    }

    pub fn inconclusive(&self) -> usize {
        self.results.iter().filter(|result| result.outcome == Outcome::Inconclusive).count()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.results.len()
    }
}

fn parse_case(line: &str, location: &Location) -> Result<TestCase, CaseError> {
    let fail = |error| CaseError { location: location.clone(), error };
    let line = line.trim();

    let (word, label) = match line.rsplit_once(char::is_whitespace) {
        Some((word, label)) => (word.trim(), label),
        // A lone label tests the empty word
        None if line == "0" || line == "1" => ("", line),
        None => return Err(fail(CaseErrorType::MalformedCase(line.to_string()))),
    };

    let expected = match label {
        "0" => false,
        "1" => true,
        other => return Err(fail(CaseErrorType::InvalidLabel(other.to_string()))),
    };
    let word = if word == EPSILON { "" } else { word };

    Ok(TestCase {
        word: word.to_string(),
        expected,
        location: location.clone(),
    })
}

/// Splits `text` at its first blank line into a grammar and test cases.
pub fn parse_cases(text: &str, path: &Path) -> Result<CaseFile, CaseErrors> {
    let lines = text.lines().collect_vec();
    let separator = lines.iter()
        .position(|line| line.trim().is_empty())
        .ok_or_else(|| vec![CaseError {
            location: Location::whole_file(path),
            error: CaseErrorType::MissingSeparator,
        }])?;

    let grammar = parser::parse_lines_at(&lines[..separator].join("\n"), path, 1)
        .map_err(|errors| errors.into_iter()
            .map(|e| CaseError { location: e.location, error: CaseErrorType::Grammar(e.error) })
            .collect_vec());

    let (cases, mut errors): (Vec<_>, Vec<_>) = lines.iter()
        .enumerate()
        .skip(separator + 1)
        // No comment syntax here: `;` is a valid terminal
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(num, line)| parse_case(line, &Location::new(path, num + 1)))
        .partition_result();

    match grammar {
        Ok(grammar) if errors.is_empty() => Ok(CaseFile { grammar, cases }),
        Ok(_) => Err(errors),
        Err(mut grammar_errors) => {
            grammar_errors.append(&mut errors);
            Err(grammar_errors)
        }
    }
}

pub fn read_case_file(path: &Path) -> Result<CaseFile, CaseErrors> {
    let text = std::fs::read_to_string(path).map_err(|e| vec![CaseError {
        location: Location::whole_file(path),
        error: CaseErrorType::FileError(e),
    }])?;
    parse_cases(&text, path)
}

/// Runs every case with a fresh recognition.
pub fn run_cases(
    grammar: &Grammar,
    start: &str,
    cases: &[TestCase],
    engine: Engine,
    config: RecognizerConfig,
) -> Result<Summary, HarnessError> {
    let results = match engine {
        Engine::Gss => {
            let recognizer = Recognizer::new(grammar, start)?.with_config(config);
            cases.iter()
                .map(|case| CaseResult { case: case.clone(), outcome: recognizer.run_str(&case.word).outcome })
                .collect_vec()
        }
        Engine::TopDown => {
            let top_down = TopDown::new(grammar, start)?;
            cases.iter()
                .map(|case| {
                    let outcome = if top_down.recognize_str(&case.word) {
                        Outcome::Recognized
                    } else {
                        Outcome::Rejected
                    };
                    CaseResult { case: case.clone(), outcome }
                })
                .collect_vec()
        }
    };

    for result in &results {
        debug!("[{}] {:?}: {}", result.case.location, result.case.word, result.outcome);
    }
    let summary = Summary { results };
    info!("passed {}/{} cases", summary.passed(), summary.results.len());
    Ok(summary)
}

fn label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Recognized => "1",
        Outcome::Rejected => "0",
        Outcome::Inconclusive => "?",
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=============== Test Cases ===============")?;
        writeln!(f, "{:<20} {:<8} {:<6} {}", "  WORD", "EXPECTED", "ACTUAL", "OK?")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for result in &self.results {
            let word = if result.case.word.is_empty() { EPSILON } else { result.case.word.as_str() };
            writeln!(
                f,
                "{:<20} {:<8} {:<6} {}",
                word,
                if result.case.expected { "1" } else { "0" },
                label(result.outcome),
                if result.passed() { "Y" } else { "N" }
            )?;
        }

        writeln!(f, "\n=============== Summary ===============")?;
        write!(f, "Passed {}/{} tests", self.passed(), self.results.len())?;
        if self.inconclusive() > 0 {
            write!(f, " ({} inconclusive)", self.inconclusive())?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::recognizer::WorklistOrder;
    use super::*;

    const CASES: &str = "\
S -> A S d | B S | ε
A -> a | c
B -> a | b

aad 1

cabd 1
ε 1
dd 0
0
";

    fn path() -> &'static Path {
        Path::new("cases.txt")
    }

    #[test]
    fn parse_case_lines() {
        let location = Location::new("cases.txt", 3);
        assert_eq!(parse_case("abb 1", &location).unwrap().word, "abb");
        assert_eq!(parse_case("a b  0", &location).unwrap().word, "a b");
        assert_eq!(parse_case("1", &location).unwrap(), TestCase {
            word: String::new(),
            expected: true,
            location: location.clone(),
        });
        assert_eq!(
            parse_case("abb", &location).unwrap_err().error,
            CaseErrorType::MalformedCase("abb".to_string())
        );
        assert_eq!(
            parse_case("abb yes", &location).unwrap_err().error,
            CaseErrorType::InvalidLabel("yes".to_string())
        );
    }

    #[test]
    fn parse_case_file() {
        let file = parse_cases(CASES, path()).unwrap();

        assert_eq!(file.grammar.start_symbol(), "S");
        assert_eq!(
            file.cases.iter().map(|case| (case.word.as_str(), case.expected)).collect_vec(),
            vec![("aad", true), ("cabd", true), ("", true), ("dd", false), ("", false)]
        );
        assert_eq!(file.cases[1].location, Location::new("cases.txt", 7));
    }

    #[test]
    fn semicolon_words_are_cases() {
        let file = parse_cases("S -> ; a\n\n;a 1\n; 0\n", path()).unwrap();

        assert_eq!(
            file.cases.iter().map(|case| (case.word.as_str(), case.expected)).collect_vec(),
            vec![(";a", true), (";", false)]
        );
        let summary = run_cases(&file.grammar, "S", &file.cases, Engine::Gss, RecognizerConfig::default()).unwrap();
        assert!(summary.all_passed());
        assert!(summary.to_string().contains("Passed 2/2 tests"));
    }

    #[test]
    fn sample_case_files_pass() {
        let data = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");

        for name in ["nested.txt", "expressions.txt", "hidden_left_recursion.txt"] {
            let file = read_case_file(&data.join(name)).unwrap();
            let start = file.grammar.start_symbol();
            let summary = run_cases(&file.grammar, start, &file.cases, Engine::Gss, RecognizerConfig::default()).unwrap();

            assert!(!file.cases.is_empty(), "{}", name);
            assert!(summary.all_passed(), "{}{}", name, summary);
        }
    }

    #[test]
    fn parse_errors_are_collected() {
        let errors = parse_cases("S -> a T\n\na 1\nb 2\n", path()).unwrap_err();
        assert_eq!(errors, vec![
            CaseError {
                location: Location::new("cases.txt", 1),
                error: CaseErrorType::Grammar(CompileErrorType::UndefinedNonterminal("T".to_string())),
            },
            CaseError {
                location: Location::new("cases.txt", 4),
                error: CaseErrorType::InvalidLabel("2".to_string()),
            },
        ]);

        let errors = parse_cases("S -> a\n", path()).unwrap_err();
        assert_eq!(errors[0].error, CaseErrorType::MissingSeparator);
    }

    #[test]
    fn run_case_file() {
        let file = parse_cases(CASES, path()).unwrap();
        let summary = run_cases(&file.grammar, "S", &file.cases, Engine::Gss, RecognizerConfig::default()).unwrap();

        // The last case expects the empty word to be rejected, which is wrong
        assert_eq!(summary.passed(), 4);
        assert!(!summary.all_passed());
        assert!(!summary.results[4].passed());

        let report = summary.to_string();
        assert!(report.contains("Passed 4/5 tests"));
        assert!(report.contains("aad"));
    }

    #[test]
    fn engines_agree() {
        let file = parse_cases(CASES, path()).unwrap();
        let config = RecognizerConfig { order: WorklistOrder::Lifo, step_budget: None };
        let gss = run_cases(&file.grammar, "S", &file.cases, Engine::Gss, config).unwrap();
        let top_down = run_cases(&file.grammar, "S", &file.cases, Engine::TopDown, config).unwrap();

        assert_eq!(gss, top_down);
    }

    #[test]
    fn top_down_refuses_left_recursion() {
        let file = parse_cases("S -> S a | a\n\naa 1\n", path()).unwrap();
        let error = run_cases(&file.grammar, "S", &file.cases, Engine::TopDown, RecognizerConfig::default()).unwrap_err();

        assert!(matches!(error, HarnessError::TopDown(TopDownError::LeftRecursive(_))));
        assert!(run_cases(&file.grammar, "S", &file.cases, Engine::Gss, RecognizerConfig::default()).unwrap().all_passed());
    }

    #[test]
    fn inconclusive_cases_fail() {
        let file = parse_cases("S -> b | S S | S S S\n\nbbbbbbbbbbbbbbbbbbbb 1\n", path()).unwrap();
        let config = RecognizerConfig { order: WorklistOrder::Fifo, step_budget: Some(5) };
        let summary = run_cases(&file.grammar, "S", &file.cases, Engine::Gss, config).unwrap();

        assert_eq!(summary.inconclusive(), 1);
        assert_eq!(summary.passed(), 0);
        assert!(summary.to_string().contains("(1 inconclusive)"));
    }
}
