//! A small catalogue of sample machines embedded in the library.

use crate::simulator::Program;
use lazy_static::lazy_static;
use serde::Serialize;

/// An embedded sample machine.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub description: &'static str,
    /// A tape the program is meant to be run on.
    pub tape: &'static str,
    pub rules: &'static str,
}

const BUILTINS: [Builtin; 4] = [
    Builtin {
        name: "find-end",
        description: "Walk right over a run of bars and append one more",
        tape: "||||",
        rules: include_str!("../programs/find-end.tm"),
    },
    Builtin {
        name: "unary-addition",
        description: "Add two unary numbers separated by '+'",
        tape: "||+|||",
        rules: include_str!("../programs/unary-addition.tm"),
    },
    Builtin {
        name: "binary-increment",
        description: "Add one to a binary number",
        tape: "1011",
        rules: include_str!("../programs/binary-increment.tm"),
    },
    Builtin {
        name: "busy-beaver-2",
        description: "Two-state busy beaver",
        tape: "",
        rules: include_str!("../programs/busy-beaver-2.tm"),
    },
];

lazy_static! {
    /// The embedded programs, parsed once with the default configuration.
    ///
    /// Embedded programs that fail to parse are left out.
    pub static ref PROGRAMS: Vec<(Builtin, Program)> = BUILTINS
        .iter()
        .filter_map(|builtin| match Program::from_rules(builtin.rules) {
            Ok(program) => Some((*builtin, program)),
            Err(e) => {
                tracing::error!(name = builtin.name, error = %e, "failed to parse embedded program");
                None
            }
        })
        .collect();
}

/// Summary of an embedded program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub description: String,
    pub initial_tape: String,
    pub state_count: usize,
    pub transition_count: usize,
}

pub struct ProgramManager;

impl ProgramManager {
    /// The number of available programs.
    pub fn count() -> usize {
        PROGRAMS.len()
    }

    pub fn get_program_by_name(name: &str) -> Option<&'static Program> {
        Self::find(name).map(|(_, program)| program)
    }

    /// The embedded definition of the program called `name`.
    pub fn get_builtin_by_name(name: &str) -> Option<&'static Builtin> {
        Self::find(name).map(|(builtin, _)| builtin)
    }

    /// The rule text of the program at `index`.
    pub fn get_program_text_by_index(index: usize) -> Option<&'static str> {
        PROGRAMS.get(index).map(|(builtin, _)| builtin.rules)
    }

    pub fn list_program_names() -> Vec<&'static str> {
        PROGRAMS.iter().map(|(builtin, _)| builtin.name).collect()
    }

    pub fn get_program_info(index: usize) -> Option<ProgramInfo> {
        let (builtin, program) = PROGRAMS.get(index)?;

        Some(ProgramInfo {
            index,
            name: builtin.name.to_string(),
            description: builtin.description.to_string(),
            initial_tape: builtin.tape.to_string(),
            state_count: program.state_count(),
            transition_count: program.rule_count(),
        })
    }

    fn find(name: &str) -> Option<&'static (Builtin, Program)> {
        PROGRAMS.iter().find(|(builtin, _)| builtin.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_builtin(name: &str) -> crate::RunReport {
        let builtin = ProgramManager::get_builtin_by_name(name).unwrap();
        let program = ProgramManager::get_program_by_name(name).unwrap();
        program.run(builtin.tape, None).unwrap()
    }

    #[test]
    fn test_all_builtins_parse() {
        assert_eq!(ProgramManager::count(), BUILTINS.len());
        assert_eq!(
            ProgramManager::list_program_names(),
            vec!["find-end", "unary-addition", "binary-increment", "busy-beaver-2"]
        );
    }

    #[test]
    fn test_find_end() {
        let report = run_builtin("find-end");
        assert_eq!(report.tape, "|||||");
        assert_eq!(report.steps, 5);
    }

    #[test]
    fn test_unary_addition() {
        let report = run_builtin("unary-addition");
        assert_eq!(report.tape, "|||||");
        assert_eq!(report.steps, 8);
        assert_eq!(report.rules, 5);
    }

    #[test]
    fn test_binary_increment() {
        let report = run_builtin("binary-increment");
        assert_eq!(report.tape, "1100");
        assert_eq!(report.steps, 8);

        let program = ProgramManager::get_program_by_name("binary-increment").unwrap();
        assert_eq!(program.run("111", None).unwrap().tape, "1000");
    }

    #[test]
    fn test_busy_beaver() {
        let report = run_builtin("busy-beaver-2");
        assert_eq!(report.tape, "1111");
        assert_eq!(report.steps, 6);
    }

    #[test]
    fn test_program_info() {
        let info = ProgramManager::get_program_info(2).unwrap();

        assert_eq!(info.name, "binary-increment");
        assert_eq!(info.initial_tape, "1011");
        assert_eq!(info.state_count, 2);
        assert_eq!(info.transition_count, 6);

        assert!(ProgramManager::get_program_info(99).is_none());
        assert!(ProgramManager::get_program_text_by_index(0)
            .unwrap()
            .contains("FIND _ HALT | R"));
    }

    #[test]
    fn test_unknown_name() {
        assert!(ProgramManager::get_program_by_name("missing").is_none());
    }
}
