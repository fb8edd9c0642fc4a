pub mod error_handling;
pub mod grammar;
pub mod parser;
pub mod recognizer;
pub mod topdown;
pub mod generator;
pub mod harness;

#[cfg(test)]
mod testing;

pub use grammar::{Grammar, GrammarError, Symbol};
pub use recognizer::{recognize, Outcome, Recognizer, RecognizerConfig, Report, RunStats, Token, WorklistOrder};
