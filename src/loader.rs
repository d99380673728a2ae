//! This module provides the `ProgramLoader` struct, responsible for loading rule text
//! from files, strings and directories and turning it into validated [`Program`]s.

use crate::config::Config;
use crate::simulator::Program;
use crate::types::MachineError;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of rule files discovered by [`ProgramLoader::load_programs`].
pub const RULES_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading machine definitions.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is read and its rules are valid.
    /// * `Err(MachineError::File)` if the file cannot be read, or is too many bytes to hold
    ///   `max_rules_size` characters. The exact character ceiling is checked by the parser.
    /// * Any parse or build error for invalid rules.
    pub fn load_program(path: &Path, config: &Config) -> Result<Program, MachineError> {
        let metadata = fs::metadata(path).map_err(|e| {
            MachineError::File(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        // A UTF-8 character takes at most 4 bytes.
        let max_bytes = (config.max_rules_size as u64).saturating_mul(4);
        if metadata.len() > max_bytes {
            return Err(MachineError::File(format!(
                "File {} is {} bytes. Maximum is {} characters",
                path.display(),
                metadata.len(),
                config.max_rules_size
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            MachineError::File(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Program::new(&content, config.clone())
    }

    /// Loads a single program from the provided string content.
    pub fn load_program_from_string(
        content: &str,
        config: &Config,
    ) -> Result<Program, MachineError> {
        Program::new(content, config.clone())
    }

    /// Loads every rule file (`.tm` extension) in `directory`.
    ///
    /// Directories and files with other extensions are skipped. Each element of the
    /// result is either the path and program, or the error that file produced.
    pub fn load_programs(
        directory: &Path,
        config: &Config,
    ) -> Vec<Result<(PathBuf, Program), MachineError>> {
        if !directory.exists() {
            return vec![Err(MachineError::File(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(MachineError::File(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(MachineError::File(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir() || path.extension().is_none_or(|ext| ext != RULES_EXTENSION) {
                    return None;
                }

                Some(Self::load_program(&path, config).map(|program| (path, program)))
            })
            .collect();

        results.sort_by(|a, b| match (a, b) {
            (Ok((a, _)), Ok((b, _))) => a.cmp(b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => std::cmp::Ordering::Equal,
        });

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransitionError;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const VALID: &str = "// walk right over ones\nINIT 1 INIT 1 R\nINIT _ HALT 1 R\n";

    fn write(path: &Path, content: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_valid_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("append.tm");
        write(&file_path, VALID);

        let program = ProgramLoader::load_program(&file_path, &Config::default()).unwrap();

        assert_eq!(program.rule_count(), 2);
        assert_eq!(program.run("11", None).unwrap().tape, "111");
    }

    #[test]
    fn test_load_invalid_program() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("invalid.tm");
        write(&file_path, "This is not a valid program");

        let result = ProgramLoader::load_program(&file_path, &Config::default());
        assert!(matches!(
            result,
            Err(MachineError::Transition(TransitionError::TokenCount { .. }))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = ProgramLoader::load_program(&dir.path().join("nope.tm"), &Config::default());

        assert!(matches!(result, Err(MachineError::File(_))));
    }

    #[test]
    fn test_load_oversized_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("big.tm");
        write(&file_path, VALID);

        let config = Config {
            max_rules_size: 10,
            ..Config::default()
        };

        let result = ProgramLoader::load_program(&file_path, &config);
        assert!(matches!(result, Err(MachineError::File(msg)) if msg.contains("Maximum is 10")));
    }

    #[test]
    fn test_load_size_in_characters() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("accents.tm");
        // 31 characters, 34 bytes.
        write(&file_path, "INIT é INIT é R\nINIT _ HALT è R");

        let config = Config {
            max_rules_size: 31,
            ..Config::default()
        };
        let program = ProgramLoader::load_program(&file_path, &config).unwrap();
        assert_eq!(program.run("éé", None).unwrap().tape, "ééè");

        let config = Config {
            max_rules_size: 30,
            ..Config::default()
        };
        assert!(matches!(
            ProgramLoader::load_program(&file_path, &config),
            Err(MachineError::Transition(TransitionError::TooLarge { size: 31, max: 30 }))
        ));
    }

    #[test]
    fn test_load_from_string() {
        let program =
            ProgramLoader::load_program_from_string(VALID, &Config::default()).unwrap();
        assert_eq!(program.state_count(), 1);
    }

    #[test]
    fn test_load_programs_from_directory() {
        let dir = tempdir().unwrap();

        write(&dir.path().join("valid.tm"), VALID);
        write(&dir.path().join("invalid.tm"), "INIT 1 INIT 1 R");
        write(&dir.path().join("ignored.txt"), "This file should be ignored");
        fs::create_dir(dir.path().join("nested.tm")).unwrap();

        let results = ProgramLoader::load_programs(dir.path(), &Config::default());

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(MachineError::Transition(TransitionError::HaltUnreachable(_)))
        ));
    }

    #[test]
    fn test_load_programs_missing_directory() {
        let dir = tempdir().unwrap();
        let results = ProgramLoader::load_programs(&dir.path().join("missing"), &Config::default());

        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
