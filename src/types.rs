//! This module defines the core data structures shared by the parser, the transition table
//! and the execution engine: transitions, move directions, step outcomes, run reports and
//! the error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// Returns the head offset produced by this move.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// A single rule of a machine: in `current_state` reading `current_symbol`, write
/// `new_symbol`, move in `direction` and continue in `new_state`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transition {
    pub current_state: String,
    pub current_symbol: char,
    pub new_state: String,
    pub new_symbol: char,
    pub direction: Direction,
}

impl Transition {
    pub fn new(
        current_state: impl Into<String>,
        current_symbol: char,
        new_state: impl Into<String>,
        new_symbol: char,
        direction: Direction,
    ) -> Self {
        Self {
            current_state: current_state.into(),
            current_symbol,
            new_state: new_state.into(),
            new_symbol,
            direction,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            Direction::Left => "L",
            Direction::Right => "R",
        };
        write!(
            f,
            "{} {} {} {} {}",
            self.current_state, self.current_symbol, self.new_state, self.new_symbol, direction
        )
    }
}

/// The right-hand side of a transition, as stored in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub new_state: String,
    pub new_symbol: char,
    pub direction: Direction,
}

/// Represents the outcome of a successful call to `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition was applied and the machine has not reached the halt state.
    Continue,
    /// The machine is in the halt state.
    Halted,
}

/// Coarse execution status of a loaded machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// A transition exists for the current state and symbol.
    Running,
    /// The current state is the halt state.
    Halted,
    /// No transition exists for the current state and symbol.
    Stuck,
}

/// Summary returned by a run: the trimmed tape, the steps executed since the tape was
/// loaded, and the number of rules in the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub tape: String,
    pub steps: usize,
    pub rules: usize,
    /// `false` when the run stopped at the step ceiling.
    pub halted: bool,
}

/// Structural problems with rule text or a transition sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Line {line}: expected 5 elements (currentState currentSymbol newState newSymbol moveDirection), got {found}")]
    TokenCount { line: usize, found: usize },
    #[error("Line {line}: invalid move direction {token:?}, must be {left:?} or {right:?}")]
    Direction {
        line: usize,
        token: String,
        left: String,
        right: String,
    },
    #[error("Duplicate transition for state {state} and symbol '{symbol}'")]
    Duplicate { state: String, symbol: char },
    #[error("Too many states: {count}. Maximum is {max}")]
    TooManyStates { count: usize, max: usize },
    #[error("Initial state {0} not found in the transitions")]
    MissingInitialState(String),
    #[error("Halt state {0} not found in the transitions")]
    HaltUnreachable(String),
    #[error("Transition rules are {size} characters. Maximum is {max}")]
    TooLarge { size: usize, max: usize },
}

/// Problems with an input tape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TapeError {
    #[error("Input tape must not contain spaces (found one at position {position})")]
    Space { position: usize },
    #[error("Input tape has {len} cells. Maximum is {max}")]
    TooLong { len: usize, max: usize },
}

/// Represents the errors that can occur while parsing, building or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// A symbol field is not exactly one character.
    #[error("Line {line}: invalid {field} symbol {symbol:?}, must be a single character")]
    Symbol {
        line: usize,
        field: &'static str,
        symbol: String,
    },
    /// A state name exceeds the length ceiling.
    #[error("Invalid state {state:?}: {len} characters, must be at most {max}")]
    State { state: String, len: usize, max: usize },
    /// The rule text or transition sequence is structurally invalid.
    #[error(transparent)]
    Transition(#[from] TransitionError),
    /// The machine is stuck: no rule matches the current state and symbol.
    #[error("No transition for symbol '{symbol}' in state {state} at position {head} with input tape {tape:?}")]
    MissingTransition {
        state: String,
        symbol: char,
        head: i64,
        tape: String,
    },
    /// The input tape is malformed.
    #[error(transparent)]
    Tape(#[from] TapeError),
    /// The configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The rule tokenizer rejected a line.
    #[error("Rule parsing error: {0}")]
    Parse(#[from] Box<pest::error::Error<Rule>>),
    /// Reading a rule or configuration file failed.
    #[error("File error: {0}")]
    File(String),
}

impl MachineError {
    /// Returns `true` for the runtime "no matching transition" outcome.
    pub fn is_stuck(&self) -> bool {
        matches!(self, MachineError::MissingTransition { .. })
    }
}
