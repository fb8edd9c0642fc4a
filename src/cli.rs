use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use gll_recognizer::generator::DEFAULT_MAX_DEPTH;
use gll_recognizer::harness::Engine;
use gll_recognizer::{RecognizerConfig, WorklistOrder};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a test-case file: a grammar, a blank line, then `word label` lines
    Check {
        /// File containing the grammar and test cases
        file: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Decide whether a single word is in the language
    Recognize {
        /// File containing the grammar
        grammar: PathBuf,

        /// The word to test (one token per character)
        word: String,

        /// Split WORD on whitespace instead, for multi-character terminals
        #[arg(long)]
        tokens: bool,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Print random sentences of a grammar
    Generate {
        /// File containing the grammar
        grammar: PathBuf,

        /// Start symbol (default: first in the file)
        #[arg(short, long, value_name = "SYMBOL")]
        start: Option<String>,

        /// Amount to generate
        #[arg(short = 'n', long, value_name = "AMOUNT", default_value_t = 1)]
        amount: u32,

        /// Depth after which derivations are closed off as fast as possible
        #[arg(long, value_name = "DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Text placed between generated terminals
        #[arg(long, default_value = "")]
        separator: String,
    },
}

#[derive(Args)]
pub struct RunOptions {
    /// Start symbol (default: first in the file)
    #[arg(short, long, value_name = "SYMBOL")]
    pub start: Option<String>,

    /// Recognition engine; top-down refuses left-recursive grammars
    #[arg(long, value_enum, default_value_t = Engine::Gss)]
    pub engine: Engine,

    /// Order in which pending descriptors are processed
    #[arg(long, value_enum, default_value_t = WorklistOrder::Fifo)]
    pub order: WorklistOrder,

    /// Give up after processing this many descriptors and report the word as inconclusive
    #[arg(long, env = "GLL_STEP_BUDGET", value_name = "STEPS")]
    pub step_budget: Option<u64>,
}

impl RunOptions {
    pub fn config(&self) -> RecognizerConfig {
        RecognizerConfig {
            order: self.order,
            step_budget: self.step_budget,
        }
    }
}
