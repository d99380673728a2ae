//! The entry point for external drivers. A [`Program`] parses and validates rule text
//! once; it then runs tapes to completion in one call, or hands out [`Session`]s for
//! drivers that pace execution themselves (interactive prompts, timers, GUIs).

use crate::config::Config;
use crate::history::{History, Snapshot};
use crate::machine::Machine;
use crate::parser::parse;
use crate::table::TransitionTable;
use crate::types::{MachineError, RunReport, Step, Transition};
use std::sync::Arc;

/// A parsed and validated machine definition.
#[derive(Debug, Clone)]
pub struct Program {
    config: Config,
    transitions: Vec<Transition>,
    table: Arc<TransitionTable>,
}

impl Program {
    /// Parses `rules` and builds the transition table using the symbols, state names and
    /// ceilings of `config`.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the configuration is consistent and the rules are valid.
    /// * `Err(MachineError)` describing the first problem found otherwise.
    pub fn new(rules: &str, config: Config) -> Result<Self, MachineError> {
        config.validate()?;

        let transitions = parse(rules, &config)?;
        let table =
            TransitionTable::build(&transitions, &config.init_state, &config.halt_state, &config)?;

        Ok(Self {
            config,
            transitions,
            table: Arc::new(table),
        })
    }

    /// Parses `rules` with the default configuration.
    pub fn from_rules(rules: &str) -> Result<Self, MachineError> {
        Self::new(rules, Config::default())
    }

    /// Loads `tape` onto a fresh machine that shares this program's table.
    pub fn machine(&self, tape: &str) -> Result<Machine, MachineError> {
        Machine::with_tape(Arc::clone(&self.table), &self.config, tape)
    }

    /// Runs `tape` until the machine halts or the step ceiling is reached.
    ///
    /// `max_steps` falls back to the configured ceiling.
    pub fn run(&self, tape: &str, max_steps: Option<usize>) -> Result<RunReport, MachineError> {
        self.machine(tape)?
            .run(max_steps.unwrap_or(self.config.max_steps))
    }

    /// Starts a session for step-by-step execution, optionally recording history.
    pub fn session(&self, tape: &str, record_history: bool) -> Result<Session, MachineError> {
        Ok(Session {
            machine: self.machine(tape)?,
            history: record_history.then(History::new),
            max_steps: self.config.max_steps,
        })
    }

    /// The number of rules in the program.
    pub fn rule_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn state_count(&self) -> usize {
        self.table.state_count()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn table(&self) -> &Arc<TransitionTable> {
        &self.table
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Parses `rules` with the default configuration and runs `tape` on them.
///
/// # Returns
///
/// * `Ok(RunReport)` with the trimmed final tape, the steps executed and the rule count.
/// * `Err(MachineError)` if the rules or tape are invalid, or the machine gets stuck.
pub fn simulate(
    rules: &str,
    tape: &str,
    max_steps: Option<usize>,
) -> Result<RunReport, MachineError> {
    Program::from_rules(rules)?.run(tape, max_steps)
}

/// A machine driven one step at a time by an external driver.
///
/// Every step is bounded by the program's step ceiling. When history is enabled a
/// snapshot is recorded before each step, which makes the run seekable.
#[derive(Debug, Clone)]
pub struct Session {
    machine: Machine,
    history: Option<History>,
    max_steps: usize,
}

impl Session {
    /// Executes one step unless the step ceiling has been reached.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(step))` if the machine was stepped (or is halted).
    /// * `Ok(None)` if the step ceiling has been reached.
    /// * `Err(MachineError::MissingTransition)` if the machine is stuck.
    pub fn step(&mut self) -> Result<Option<Step>, MachineError> {
        if self.machine.is_halted() {
            return Ok(Some(Step::Halted));
        }
        if self.at_ceiling() {
            return Ok(None);
        }

        let snapshot = self.history.is_some().then(|| self.machine.snapshot());
        let step = self.machine.step()?;

        if let (Some(history), Some(snapshot)) = (self.history.as_mut(), snapshot) {
            history.record(snapshot);
        }

        Ok(Some(step))
    }

    /// Executes up to `n` steps, stopping early at halt or the step ceiling.
    pub fn step_n(&mut self, n: usize) -> Result<Option<Step>, MachineError> {
        let mut last = Some(Step::Continue);

        for _ in 0..n {
            last = self.step()?;
            if last != Some(Step::Continue) {
                break;
            }
        }

        Ok(last)
    }

    /// Runs to halt or to the step ceiling.
    pub fn run(&mut self) -> Result<RunReport, MachineError> {
        while self.step()? == Some(Step::Continue) {}
        Ok(self.machine.report())
    }

    /// Returns `true` once the step ceiling has been reached without halting.
    pub fn at_ceiling(&self) -> bool {
        !self.machine.is_halted() && self.machine.step_count() >= self.max_steps
    }

    /// The snapshot recorded before step `index`, if history is enabled.
    pub fn seek(&self, index: usize) -> Option<&Snapshot> {
        self.history.as_ref()?.get(index)
    }

    /// Rewinds the machine to the configuration it had before step `index`.
    ///
    /// Returns `false` when there is no such snapshot.
    pub fn rewind(&mut self, index: usize) -> bool {
        match self.history.as_ref().and_then(|h| h.get(index)).cloned() {
            Some(snapshot) => {
                self.machine.restore(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Reloads the initial tape and forgets any recorded history.
    pub fn reset(&mut self) {
        self.machine.reset();
        if let Some(history) = self.history.as_mut() {
            history.clear();
        }
    }

    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Status, TapeError, TransitionError};

    const FIND_END: &str = "
        INIT | FIND | R
        FIND | FIND | R
        FIND _ HALT | R
        ";

    #[test]
    fn test_simulate_find_end() {
        let report = simulate(FIND_END, "||||", None).unwrap();

        assert_eq!(report.tape, "|||||");
        assert_eq!(report.steps, 5);
        assert_eq!(report.rules, 3);
        assert!(report.halted);
    }

    #[test]
    fn test_simulate_rejects_short_rule() {
        let result = simulate("INIT | FIND R", "||||", None);

        assert_eq!(
            result,
            Err(TransitionError::TokenCount { line: 1, found: 4 }.into())
        );
    }

    #[test]
    fn test_simulate_stuck() {
        let result = simulate(FIND_END, "||||+||", None);

        match result {
            Err(MachineError::MissingTransition {
                state,
                symbol,
                head,
                ..
            }) => {
                assert_eq!(state, "FIND");
                assert_eq!(symbol, '+');
                assert_eq!(head, 4);
            }
            other => panic!("Expected a stuck machine, got {:?}", other),
        }
    }

    #[test]
    fn test_simulate_rejects_space_in_tape() {
        let result = simulate(FIND_END, "|| ||", None);
        assert_eq!(result, Err(TapeError::Space { position: 2 }.into()));
    }

    #[test]
    fn test_run_uses_configured_ceiling() {
        let rules = "INIT _ INIT _ R\nINIT 1 HALT 1 R";
        let config = Config {
            max_steps: 7,
            ..Config::default()
        };
        let program = Program::new(rules, config).unwrap();

        assert_eq!(program.run("", None).unwrap().steps, 7);
        assert_eq!(program.run("", Some(3)).unwrap().steps, 3);
    }

    #[test]
    fn test_program_rejects_invalid_config() {
        let config = Config {
            comment_prefix: String::new(),
            ..Config::default()
        };

        assert!(matches!(
            Program::new(FIND_END, config),
            Err(MachineError::Config(_))
        ));
    }

    #[test]
    fn test_program_with_custom_states() {
        let config = Config {
            init_state: "q0".to_string(),
            halt_state: "qf".to_string(),
            blank: '0',
            ..Config::default()
        };
        let program = Program::new("q0 1 q0 1 R\nq0 0 qf 1 R", config).unwrap();

        let report = program.run("11", None).unwrap();
        assert_eq!(report.tape, "111");
        assert_eq!(report.steps, 3);
        assert_eq!(program.state_count(), 1);
        assert_eq!(program.rule_count(), 2);
    }

    #[test]
    fn test_session_records_history() {
        let program = Program::from_rules(FIND_END).unwrap();
        let mut session = program.session("||", true).unwrap();

        let report = session.run().unwrap();
        assert_eq!(report.steps, 3);

        let history = session.history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(session.seek(0).unwrap().state, "INIT");
        assert_eq!(session.seek(2).unwrap().head, 2);
        assert!(session.seek(3).is_none());
    }

    #[test]
    fn test_session_rewind_and_replay() {
        let program = Program::from_rules(FIND_END).unwrap();
        let mut session = program.session("||", true).unwrap();
        let first = session.run().unwrap();

        assert!(session.rewind(1));
        assert_eq!(session.machine().state(), "FIND");
        assert_eq!(session.machine().step_count(), 1);
        assert_eq!(session.machine().status(), Status::Running);

        let second = session.run().unwrap();
        assert_eq!(first, second);
        assert_eq!(session.history().unwrap().len(), 3);

        assert!(!session.rewind(10));
    }

    #[test]
    fn test_session_long_recorded_run() {
        let program = Program::from_rules("INIT _ INIT _ R\nINIT x HALT x R").unwrap();
        let mut session = program.session("", true).unwrap();
        session.set_max_steps(50_000);

        session.run().unwrap();
        assert!(session.at_ceiling());
        assert_eq!(session.history().unwrap().len(), 50_000);
        assert_eq!(session.seek(49_999).unwrap().head, 49_999);

        assert!(session.rewind(100));
        session.step_n(5).unwrap();
        let history = session.history().unwrap();
        assert_eq!(history.len(), 105);
        assert!(history.iter().enumerate().all(|(index, s)| s.step == index));
    }

    #[test]
    fn test_session_without_history() {
        let program = Program::from_rules(FIND_END).unwrap();
        let mut session = program.session("||", false).unwrap();

        assert_eq!(session.step().unwrap(), Some(Step::Continue));
        assert!(session.history().is_none());
        assert!(session.seek(0).is_none());
        assert!(!session.rewind(0));
    }

    #[test]
    fn test_session_ceiling() {
        let program = Program::from_rules("INIT _ INIT _ R\nINIT 1 HALT 1 R").unwrap();
        let mut session = program.session("", false).unwrap();
        session.set_max_steps(4);

        assert_eq!(session.step_n(10).unwrap(), None);
        assert_eq!(session.machine().step_count(), 4);
        assert!(session.at_ceiling());

        let report = session.run().unwrap();
        assert_eq!(report.steps, 4);
        assert!(!report.halted);
    }

    #[test]
    fn test_session_reset() {
        let program = Program::from_rules(FIND_END).unwrap();
        let mut session = program.session("|", true).unwrap();
        session.run().unwrap();

        session.reset();

        assert_eq!(session.machine().step_count(), 0);
        assert_eq!(session.machine().tape_text(), "|");
        assert!(session.history().unwrap().is_empty());
    }
}
