mod cli;

use std::fmt::Display;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use itertools::Itertools;

use cli::{Cli, Command, RunOptions};
use gll_recognizer::generator::Generator;
use gll_recognizer::harness::{self, Engine};
use gll_recognizer::parser;
use gll_recognizer::topdown::TopDown;
use gll_recognizer::{Grammar, Outcome, Recognizer};

fn report_errors<E: Display>(errors: impl IntoIterator<Item = E>) -> ExitCode {
    for error in errors {
        eprintln!("{}", error);
    }
    ExitCode::FAILURE
}

fn load_grammar(path: &Path) -> Result<Grammar, ExitCode> {
    parser::parse_file(path).map_err(|errors| report_errors(errors))
}

fn check(file: &Path, options: &RunOptions) -> ExitCode {
    let case_file = match harness::read_case_file(file) {
        Ok(case_file) => case_file,
        Err(errors) => return report_errors(errors),
    };
    let start = options.start.as_deref().unwrap_or(case_file.grammar.start_symbol());

    match harness::run_cases(&case_file.grammar, start, &case_file.cases, options.engine, options.config()) {
        Ok(summary) => {
            print!("{}", summary);
            if summary.all_passed() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
        }
        Err(error) => report_errors([error]),
    }
}

fn recognize(grammar: &Path, word: &str, tokens: bool, options: &RunOptions) -> ExitCode {
    let grammar = match load_grammar(grammar) {
        Ok(grammar) => grammar,
        Err(code) => return code,
    };
    let start = options.start.as_deref().unwrap_or(grammar.start_symbol());
    let input = if tokens {
        word.split_whitespace().map(str::to_string).collect_vec()
    } else {
        word.chars().map(String::from).collect_vec()
    };

    match options.engine {
        Engine::Gss => {
            let recognizer = match Recognizer::new(&grammar, start) {
                Ok(recognizer) => recognizer.with_config(options.config()),
                Err(error) => return report_errors([error]),
            };
            let report = recognizer.run(&input);
            println!("{}", report.outcome);
            println!("{}", report.stats);
            match report.outcome {
                Outcome::Recognized => ExitCode::SUCCESS,
                Outcome::Rejected | Outcome::Inconclusive => ExitCode::FAILURE,
            }
        }
        Engine::TopDown => {
            let top_down = match TopDown::new(&grammar, start) {
                Ok(top_down) => top_down,
                Err(error) => return report_errors([error]),
            };
            if top_down.recognize(&input) {
                println!("{}", Outcome::Recognized);
                ExitCode::SUCCESS
            } else {
                println!("{}", Outcome::Rejected);
                ExitCode::FAILURE
            }
        }
    }
}

fn generate(grammar: &Path, start: Option<&str>, amount: u32, max_depth: usize, separator: &str) -> ExitCode {
    let grammar = match load_grammar(grammar) {
        Ok(grammar) => grammar,
        Err(code) => return code,
    };
    let start = start.unwrap_or(grammar.start_symbol());
    let generator = Generator::new(&grammar).with_max_depth(max_depth);

    for _ in 0..amount {
        match generator.generate(start) {
            Ok(sentence) => println!("{}", sentence.join(separator)),
            Err(error) => return report_errors([error]),
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Check { file, options } => check(file, options),
        Command::Recognize { grammar, word, tokens, options } => recognize(grammar, word, *tokens, options),
        Command::Generate { grammar, start, amount, max_depth, separator } => {
            generate(grammar, start.as_deref(), *amount, *max_depth, separator)
        }
    }
}
