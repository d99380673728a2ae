//! This module provides the parser for rule text, utilizing the `pest` crate to tokenize
//! each line. It turns raw text into the ordered sequence of [`Transition`]s that the
//! transition table is built from.
//!
//! One transition per line:
//!
//! ```text
//! // currentState currentSymbol newState newSymbol moveDirection
//! INIT | FIND | R
//! FIND | FIND | R   // keep walking right
//! FIND _ HALT | R
//! ```

use crate::{
    config::Config,
    types::{Direction, MachineError, Transition, TransitionError},
};
use pest::Parser as PestParser;
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the rule-line grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct RuleParser;

/// Parses rule text into an ordered sequence of transitions.
///
/// Lines are trimmed; empty lines and lines starting with the comment prefix are skipped,
/// and anything from the first comment prefix to the end of a line is ignored. The
/// remaining tokens map positionally to
/// `(current_state, current_symbol, new_state, new_symbol, direction)`.
///
/// # Arguments
///
/// * `input` - The rule text.
/// * `config` - Supplies the comment prefix, the move markers and the size ceiling.
///
/// # Returns
///
/// * `Ok(Vec<Transition>)` in input order.
/// * `Err(MachineError::Transition)` for oversized text, a wrong token count or an
///   unrecognized move marker.
/// * `Err(MachineError::Symbol)` if a symbol token is not exactly one character.
pub fn parse(input: &str, config: &Config) -> Result<Vec<Transition>, MachineError> {
    let size = input.chars().count();
    if size > config.max_rules_size {
        return Err(TransitionError::TooLarge {
            size,
            max: config.max_rules_size,
        }
        .into());
    }

    let mut transitions = Vec::new();

    for (index, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(config.comment_prefix.as_str()) {
            continue;
        }

        let line = strip_comment(line, &config.comment_prefix);
        let tokens = tokenize(line)?;
        transitions.push(parse_transition(&tokens, index + 1, config)?);
    }

    Ok(transitions)
}

/// Removes everything from the first occurrence of `prefix` to the end of the line.
fn strip_comment<'a>(line: &'a str, prefix: &str) -> &'a str {
    match line.find(prefix) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Splits a comment-free line into whitespace-separated tokens.
fn tokenize(line: &str) -> Result<Vec<&str>, MachineError> {
    let root = RuleParser::parse(Rule::line, line)
        .map_err(|e| MachineError::Parse(Box::new(e)))?
        .next();

    Ok(root
        .map(|pair| {
            pair.into_inner()
                .filter(|p| p.as_rule() == Rule::token)
                .map(|p| p.as_str())
                .collect()
        })
        .unwrap_or_default())
}

/// Builds a transition from the tokens of one line.
fn parse_transition(
    tokens: &[&str],
    line: usize,
    config: &Config,
) -> Result<Transition, MachineError> {
    let [current_state, current_symbol, new_state, new_symbol, direction] = tokens else {
        return Err(TransitionError::TokenCount {
            line,
            found: tokens.len(),
        }
        .into());
    };

    let direction = parse_direction(direction, line, config)?;
    let current_symbol = parse_symbol(current_symbol, "current", line)?;
    let new_symbol = parse_symbol(new_symbol, "new", line)?;

    Ok(Transition {
        current_state: current_state.to_string(),
        current_symbol,
        new_state: new_state.to_string(),
        new_symbol,
        direction,
    })
}

/// Maps a move marker onto a [`Direction`].
fn parse_direction(token: &str, line: usize, config: &Config) -> Result<Direction, MachineError> {
    if token == config.left {
        Ok(Direction::Left)
    } else if token == config.right {
        Ok(Direction::Right)
    } else {
        Err(TransitionError::Direction {
            line,
            token: token.to_string(),
            left: config.left.clone(),
            right: config.right.clone(),
        }
        .into())
    }
}

/// Parses a symbol token, which must be exactly one character.
fn parse_symbol(token: &str, field: &'static str, line: usize) -> Result<char, MachineError> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Ok(symbol),
        _ => Err(MachineError::Symbol {
            line,
            field,
            symbol: token.to_string(),
        }),
    }
}
