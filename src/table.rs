//! The validated lookup structure from `(state, symbol)` to the action a machine takes.

use crate::config::Config;
use crate::types::{Action, MachineError, Transition, TransitionError};
use std::collections::{hash_map::Entry, BTreeSet, HashMap};
use tracing::{debug, warn};

/// A deterministic transition table.
///
/// Built once from a transition sequence and immutable afterwards, so a single table can
/// be shared read-only between any number of machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    rules: HashMap<String, HashMap<char, Action>>,
    len: usize,
}

impl TransitionTable {
    /// Builds a table from `transitions`.
    ///
    /// The build is fail-fast: the first duplicate `(state, symbol)` pair or over-long
    /// state name aborts it. After the pass the state-count ceiling, the presence of
    /// `init_state` and the reachability of `halt_state` are checked, in that order.
    ///
    /// # Arguments
    ///
    /// * `transitions` - The parsed transition sequence.
    /// * `init_state` - The state the machine starts in; must have outgoing transitions.
    /// * `halt_state` - At least one transition must lead here.
    /// * `config` - Supplies the state-count and state-name ceilings.
    pub fn build(
        transitions: &[Transition],
        init_state: &str,
        halt_state: &str,
        config: &Config,
    ) -> Result<Self, MachineError> {
        let mut rules: HashMap<String, HashMap<char, Action>> = HashMap::new();
        let mut reaches_halt = false;

        for transition in transitions {
            check_state_len(&transition.current_state, config)?;
            check_state_len(&transition.new_state, config)?;

            let actions = rules.entry(transition.current_state.clone()).or_default();
            match actions.entry(transition.current_symbol) {
                Entry::Occupied(_) => {
                    return Err(TransitionError::Duplicate {
                        state: transition.current_state.clone(),
                        symbol: transition.current_symbol,
                    }
                    .into());
                }
                Entry::Vacant(slot) => {
                    slot.insert(Action {
                        new_state: transition.new_state.clone(),
                        new_symbol: transition.new_symbol,
                        direction: transition.direction,
                    });
                }
            }

            reaches_halt |= transition.new_state == halt_state;
        }

        if rules.len() > config.max_states {
            return Err(TransitionError::TooManyStates {
                count: rules.len(),
                max: config.max_states,
            }
            .into());
        }

        if !rules.contains_key(init_state) {
            return Err(TransitionError::MissingInitialState(init_state.to_string()).into());
        }

        if !reaches_halt {
            return Err(TransitionError::HaltUnreachable(halt_state.to_string()).into());
        }

        let table = Self {
            rules,
            len: transitions.len(),
        };

        for state in table.dangling_targets(halt_state) {
            warn!(state, "transition targets a state with no outgoing transitions");
        }
        debug!(
            states = table.state_count(),
            rules = table.len(),
            "built transition table"
        );

        Ok(table)
    }

    /// Looks up the action for `state` reading `symbol`.
    pub fn get(&self, state: &str, symbol: char) -> Option<&Action> {
        self.rules.get(state)?.get(&symbol)
    }

    /// Returns `true` if `state` has at least one outgoing transition.
    pub fn contains_state(&self, state: &str) -> bool {
        self.rules.contains_key(state)
    }

    /// The number of transitions in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of states with outgoing transitions.
    pub fn state_count(&self) -> usize {
        self.rules.len()
    }

    /// States with outgoing transitions, sorted by name.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        states.sort_unstable();
        states
    }

    /// Target states, other than `halt_state`, that have no outgoing transitions.
    ///
    /// Entering one of these always leaves the machine stuck.
    pub fn dangling_targets(&self, halt_state: &str) -> Vec<&str> {
        self.rules
            .values()
            .flat_map(HashMap::values)
            .map(|action| action.new_state.as_str())
            .filter(|state| *state != halt_state && !self.rules.contains_key(*state))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn check_state_len(state: &str, config: &Config) -> Result<(), MachineError> {
    let len = state.chars().count();
    if len > config.max_state_len {
        return Err(MachineError::State {
            state: state.to_string(),
            len,
            max: config.max_state_len,
        });
    }

    Ok(())
}
