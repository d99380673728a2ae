//! Recognized symbols and structural limits of a machine definition.
//!
//! A [`Config`] is an ordinary value handed to the parser, the table builder and the
//! engine. Hosts start from [`Config::default`] and override individual fields, either in
//! code or from a partial JSON document.

use crate::types::MachineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The default blank symbol.
pub const DEFAULT_BLANK: char = '_';
/// The default marker for a left move.
pub const DEFAULT_LEFT: &str = "L";
/// The default marker for a right move.
pub const DEFAULT_RIGHT: &str = "R";
/// The default comment prefix in rule text.
pub const DEFAULT_COMMENT_PREFIX: &str = "//";
/// The default initial state name.
pub const DEFAULT_INIT_STATE: &str = "INIT";
/// The default halt state name.
pub const DEFAULT_HALT_STATE: &str = "HALT";

/// The maximum number of distinct states in a table.
pub const MAX_STATES: usize = 1 << 10; // 1024
/// The maximum number of cells in an input tape.
pub const MAX_TAPE_LEN: usize = 1 << 20; // 1 048 576 cells
/// The maximum length of a state name in characters.
pub const MAX_STATE_LEN: usize = 32;
/// The maximum size of rule text in characters.
pub const MAX_RULES_SIZE: usize = 710_000;
/// The default step ceiling for a single run.
pub const MAX_STEPS: usize = 1_000_000;

/// Symbols, reserved state names and size ceilings used by a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content of every cell that was never written.
    pub blank: char,
    /// Token selecting a left move in rule text.
    pub left: String,
    /// Token selecting a right move in rule text.
    pub right: String,
    /// Everything from this prefix to the end of a rule line is ignored.
    pub comment_prefix: String,
    /// State the machine starts in.
    pub init_state: String,
    /// State that ends execution successfully.
    pub halt_state: String,
    pub max_states: usize,
    pub max_tape_len: usize,
    pub max_state_len: usize,
    /// Ceiling on the length of rule text, in characters.
    pub max_rules_size: usize,
    /// Step ceiling applied by runs that do not specify their own.
    pub max_steps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blank: DEFAULT_BLANK,
            left: DEFAULT_LEFT.to_string(),
            right: DEFAULT_RIGHT.to_string(),
            comment_prefix: DEFAULT_COMMENT_PREFIX.to_string(),
            init_state: DEFAULT_INIT_STATE.to_string(),
            halt_state: DEFAULT_HALT_STATE.to_string(),
            max_states: MAX_STATES,
            max_tape_len: MAX_TAPE_LEN,
            max_state_len: MAX_STATE_LEN,
            max_rules_size: MAX_RULES_SIZE,
            max_steps: MAX_STEPS,
        }
    }
}

impl Config {
    /// Parses a (possibly partial) JSON configuration. Missing fields keep their defaults.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` if the document parses and the resulting configuration is consistent.
    /// * `Err(MachineError::Config)` otherwise.
    pub fn from_json(input: &str) -> Result<Self, MachineError> {
        let config: Config = serde_json::from_str(input)
            .map_err(|e| MachineError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, MachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::File(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Checks that the symbols and ceilings can describe a working machine.
    pub fn validate(&self) -> Result<(), MachineError> {
        let fail = |msg: String| Err(MachineError::Config(msg));

        for (label, marker) in [("left", &self.left), ("right", &self.right)] {
            if marker.is_empty() || marker.chars().any(char::is_whitespace) {
                return fail(format!("Invalid {label} move marker: {marker:?}"));
            }
        }
        if self.left == self.right {
            return fail(format!("Move markers must differ, both are {:?}", self.left));
        }
        if self.comment_prefix.trim().is_empty() {
            return fail("Comment prefix must not be empty".to_string());
        }
        if self.blank.is_whitespace() {
            return fail(format!("Blank symbol must not be whitespace: {:?}", self.blank));
        }
        for (label, state) in [("initial", &self.init_state), ("halt", &self.halt_state)] {
            if state.is_empty() || state.chars().any(char::is_whitespace) {
                return fail(format!("Invalid {label} state name: {state:?}"));
            }
        }
        if self.max_states == 0 || self.max_state_len == 0 || self.max_rules_size == 0 {
            return fail("Structural ceilings must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.blank, '_');
        assert_eq!(config.left, "L");
        assert_eq!(config.right, "R");
        assert_eq!(config.comment_prefix, "//");
        assert_eq!(config.init_state, "INIT");
        assert_eq!(config.halt_state, "HALT");
        assert_eq!(config.max_states, 1024);
        assert_eq!(config.max_tape_len, 1_048_576);
        assert_eq!(config.max_state_len, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "blank": "0", "halt_state": "DONE" }"#).unwrap();

        assert_eq!(config.blank, '0');
        assert_eq!(config.halt_state, "DONE");
        assert_eq!(config.init_state, "INIT");
        assert_eq!(config.max_steps, MAX_STEPS);
    }

    #[test]
    fn test_invalid_json() {
        let result = Config::from_json("{ not json");
        assert!(matches!(result, Err(MachineError::Config(_))));
    }

    #[test]
    fn test_rejects_identical_markers() {
        let config = Config {
            right: "L".to_string(),
            ..Config::default()
        };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_rejects_whitespace_blank() {
        let result = Config::from_json(r#"{ "blank": " " }"#);
        assert!(matches!(result, Err(MachineError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mill.json");
        fs::write(&path, r#"{ "max_steps": 42 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_steps, 42);

        let missing = Config::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(MachineError::File(_))));
    }
}
