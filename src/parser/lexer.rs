use itertools::{Itertools, PeekingNext};

use super::{CompileErrorType, Result};

pub const EPSILON: &str = "ε";

#[derive(PartialEq, Debug)]
pub enum Token {
    Arrow,
    Or,
    Epsilon,
    Nonterminal(String),
    Terminal(String)
}

// Nonterminals are bare words starting with an uppercase letter
pub fn is_nonterminal_name(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

pub fn lex_terminal(line: &mut impl PeekingNext<Item = char>) -> Result<Token> {
    line.next(); // Consume open quote
    let token_text = line.peeking_take_while(|&c| c != '\"').collect();

    // Check if there is a close quote and consume it if there is
    if line.next() != Some('\"') {
        return Err(CompileErrorType::UnmatchedQuote);
    }

    Ok(Token::Terminal(token_text))
}

fn classify_word(word: &str) -> Token {
    if word == EPSILON {
        Token::Epsilon
    } else if is_nonterminal_name(word) {
        Token::Nonterminal(word.to_string())
    } else {
        Token::Terminal(word.to_string())
    }
}

// Reads one bare word. An arrow glued to the word (`S->a`) still separates it.
pub fn lex_word(line: &mut impl PeekingNext<Item = char>) -> Vec<Token> {
    let word: String = line
        .peeking_take_while(|&c| !c.is_whitespace() && c != '|' && c != '\"')
        .collect();

    Itertools::intersperse(word.split("->").map(Some), None)
        .filter_map(|part| match part {
            None => Some(Token::Arrow),
            Some("") => None,
            Some(text) => Some(classify_word(text)),
        })
        .collect()
}

pub fn lex_line(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    let mut line_chars = line.chars().peekable();

    while let Some(c) = line_chars.peek() {
        if *c == '|' {
            line_chars.next();
            tokens.push(Token::Or);
        } else if *c == '\"' {
            tokens.push(lex_terminal(&mut line_chars)?);
        } else if !c.is_whitespace() {
            tokens.extend(lex_word(&mut line_chars));
        } else {
            line_chars.next();
        }
    }

    return Ok(tokens);
}
