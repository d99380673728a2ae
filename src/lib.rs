//! This crate provides the core logic for a single-tape, deterministic Turing machine
//! simulator. It includes modules for parsing rule text, building and validating the
//! transition table, executing machines on a sparse unbounded tape, recording execution
//! history, and a small catalogue of predefined programs.

pub mod config;
pub mod history;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod simulator;
pub mod table;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `Config` struct from the config module.
pub use config::Config;
/// Re-exports the history types used by seekable drivers.
pub use history::{History, Snapshot};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `Machine` struct from the machine module.
pub use machine::Machine;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the facade from the simulator module.
pub use simulator::{simulate, Program, Session};
/// Re-exports the `TransitionTable` struct from the table module.
pub use table::TransitionTable;
/// Re-exports various types related to machine definition and execution from the types module.
pub use types::{
    Action, Direction, MachineError, RunReport, Status, Step, TapeError, Transition,
    TransitionError,
};
