//! This module defines the `Machine` struct, which executes a transition table against a
//! sparse, unbounded tape. It owns the tape, the head position and the current state, and
//! exposes single-step execution, bounded runs and read-only renderings of the tape.

use crate::config::Config;
use crate::history::Snapshot;
use crate::table::TransitionTable;
use crate::types::{MachineError, RunReport, Status, Step, TapeError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// The number of blank cells shown around the tape and head by [`Machine::render`]
/// when the caller has no preference.
pub const DEFAULT_WINDOW: usize = 10;

/// A single-tape deterministic Turing machine.
///
/// The tape only stores non-blank cells, keyed by signed address, so the head may wander
/// arbitrarily far in either direction. Writing the blank symbol removes a cell.
#[derive(Debug, Clone)]
pub struct Machine {
    table: Arc<TransitionTable>,
    tape: BTreeMap<i64, char>,
    head: i64,
    state: String,
    input: String,
    init_state: String,
    halt_state: String,
    blank: char,
    max_tape_len: usize,
    step_count: usize,
}

impl Machine {
    /// Creates a machine with an empty tape, positioned at cell 0 in the initial state.
    pub fn new(table: Arc<TransitionTable>, config: &Config) -> Self {
        Self {
            table,
            tape: BTreeMap::new(),
            head: 0,
            state: config.init_state.clone(),
            input: String::new(),
            init_state: config.init_state.clone(),
            halt_state: config.halt_state.clone(),
            blank: config.blank,
            max_tape_len: config.max_tape_len,
            step_count: 0,
        }
    }

    /// Creates a machine and loads `tape` onto it.
    pub fn with_tape(
        table: Arc<TransitionTable>,
        config: &Config,
        tape: &str,
    ) -> Result<Self, MachineError> {
        let mut machine = Self::new(table, config);
        machine.load(tape)?;
        Ok(machine)
    }

    /// Replaces the tape with `input`, moves the head to cell 0 and enters the initial state.
    ///
    /// Blank characters in `input` are not stored. On error the machine is left untouched.
    ///
    /// # Returns
    ///
    /// * `Err(MachineError::Tape)` if `input` contains a space or exceeds the tape ceiling.
    pub fn load(&mut self, input: &str) -> Result<(), MachineError> {
        if let Some(position) = input.chars().position(|c| c == ' ') {
            return Err(TapeError::Space { position }.into());
        }

        let len = input.chars().count();
        if len > self.max_tape_len {
            return Err(TapeError::TooLong {
                len,
                max: self.max_tape_len,
            }
            .into());
        }

        self.tape = (0i64..)
            .zip(input.chars())
            .filter(|&(_, symbol)| symbol != self.blank)
            .collect();
        self.head = 0;
        self.state.clone_from(&self.init_state);
        self.input = input.to_string();
        self.step_count = 0;

        Ok(())
    }

    /// Reloads the most recently loaded input.
    pub fn reset(&mut self) {
        self.tape = (0i64..)
            .zip(self.input.chars())
            .filter(|&(_, symbol)| symbol != self.blank)
            .collect();
        self.head = 0;
        self.state.clone_from(&self.init_state);
        self.step_count = 0;
    }

    /// Executes a single transition.
    ///
    /// A step either applies completely or not at all: when no transition matches, the
    /// tape, head and state are left exactly as they were.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if a transition was applied and the machine is still running.
    /// * `Ok(Step::Halted)` if the machine is in the halt state, either because this step
    ///   entered it or because it was already there (in which case nothing happens).
    /// * `Err(MachineError::MissingTransition)` if the machine is stuck.
    pub fn step(&mut self) -> Result<Step, MachineError> {
        if self.is_halted() {
            return Ok(Step::Halted);
        }

        let symbol = self.symbol();
        let Some(action) = self.table.get(&self.state, symbol) else {
            return Err(self.missing_transition(symbol));
        };

        if action.new_symbol == self.blank {
            self.tape.remove(&self.head);
        } else {
            self.tape.insert(self.head, action.new_symbol);
        }

        self.head += action.direction.offset();
        self.state.clone_from(&action.new_state);
        self.step_count += 1;

        trace!(
            step = self.step_count,
            state = %self.state,
            head = self.head,
            "applied transition"
        );

        Ok(if self.is_halted() {
            Step::Halted
        } else {
            Step::Continue
        })
    }

    /// Executes up to `n` steps, stopping early once the machine halts.
    pub fn step_n(&mut self, n: usize) -> Result<Step, MachineError> {
        let mut step = if self.is_halted() {
            Step::Halted
        } else {
            Step::Continue
        };

        for _ in 0..n {
            step = self.step()?;
            if step == Step::Halted {
                break;
            }
        }

        Ok(step)
    }

    /// Steps until the machine halts or `max_steps` steps have been executed since the
    /// tape was loaded.
    ///
    /// Hitting the ceiling is not an error: the returned report has `halted == false`.
    /// A stuck machine is reported as `Err(MachineError::MissingTransition)`; the machine
    /// keeps the configuration it was stuck in.
    pub fn run(&mut self, max_steps: usize) -> Result<RunReport, MachineError> {
        while !self.is_halted() && self.step_count < max_steps {
            self.step()?;
        }

        let report = self.report();
        debug!(
            steps = report.steps,
            halted = report.halted,
            "run finished"
        );

        Ok(report)
    }

    /// The tape, step count and rule count as they stand.
    pub fn report(&self) -> RunReport {
        RunReport {
            tape: self.tape_text(),
            steps: self.step_count,
            rules: self.table.len(),
            halted: self.is_halted(),
        }
    }

    /// Renders the tape around the head, padded by at least `window` blank cells beyond
    /// both the written cells and the head, with a caret under the head and the current
    /// state on the last line. The window is capped at the tape length ceiling.
    ///
    /// ```text
    /// __________||||__________
    ///           ^
    /// INIT
    /// ```
    pub fn render(&self, window: usize) -> String {
        let (lo, hi) = self.bounds(window);
        let cells: String = (lo..=hi).map(|i| self.cell(i)).collect();
        let offset = usize::try_from(self.head - lo).unwrap_or_default();

        format!("{cells}\n{}^\n{}", " ".repeat(offset), self.state)
    }

    /// The written part of the tape, with blank runs stripped from both ends.
    pub fn tape_text(&self) -> String {
        match (self.tape.keys().next(), self.tape.keys().next_back()) {
            (Some(&lo), Some(&hi)) => (lo..=hi).map(|i| self.cell(i)).collect(),
            _ => String::new(),
        }
    }

    fn bounds(&self, window: usize) -> (i64, i64) {
        let window = i64::try_from(window.min(self.max_tape_len)).unwrap_or(i64::MAX / 4);
        let (lo, hi) = match (self.tape.keys().next(), self.tape.keys().next_back()) {
            (Some(&lo), Some(&hi)) => (lo.min(self.head), hi.max(self.head)),
            _ => (self.head, self.head),
        };

        (lo - window, hi + window)
    }

    /// Captures the tape, head, state and step count.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            step: self.step_count,
            tape: self.tape.clone(),
            head: self.head,
            state: self.state.clone(),
        }
    }

    /// Rewinds (or fast-forwards) the machine to a previously captured snapshot.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.tape = snapshot
            .tape
            .iter()
            .filter(|&(_, &symbol)| symbol != self.blank)
            .map(|(&i, &symbol)| (i, symbol))
            .collect();
        self.head = snapshot.head;
        self.state.clone_from(&snapshot.state);
        self.step_count = snapshot.step;
    }

    /// Derives the execution status without changing anything.
    pub fn status(&self) -> Status {
        if self.is_halted() {
            Status::Halted
        } else if self.table.get(&self.state, self.symbol()).is_none() {
            Status::Stuck
        } else {
            Status::Running
        }
    }

    /// Returns `true` if the current state is the halt state.
    pub fn is_halted(&self) -> bool {
        self.state == self.halt_state
    }

    /// The symbol under the head.
    pub fn symbol(&self) -> char {
        self.cell(self.head)
    }

    fn cell(&self, index: i64) -> char {
        self.tape.get(&index).copied().unwrap_or(self.blank)
    }

    fn missing_transition(&self, symbol: char) -> MachineError {
        MachineError::MissingTransition {
            state: self.state.clone(),
            symbol,
            head: self.head,
            tape: self.input.clone(),
        }
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn halt_state(&self) -> &str {
        &self.halt_state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// The number of steps executed since the tape was loaded.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn blank(&self) -> char {
        self.blank
    }

    /// The non-blank cells of the tape.
    pub fn cells(&self) -> &BTreeMap<i64, char> {
        &self.tape
    }

    /// The tape text most recently passed to [`Machine::load`].
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn table(&self) -> &Arc<TransitionTable> {
        &self.table
    }
}
