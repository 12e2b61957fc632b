//! This module provides the `ProgramLoader` struct, responsible for loading pushdown
//! automaton programs from various sources, including files and strings.

use crate::parser::parse;
use crate::types::{PdaError, Program, MAX_PROGRAM_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// The file extension of program files.
pub const PROGRAM_EXTENSION: &str = "pda";

/// `ProgramLoader` is a utility struct for loading programs.
/// It provides methods to load programs from individual files, from string content,
/// and to discover and load all `.pda` files within a specified directory.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a single program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file is successfully read and parsed into a `Program`.
    /// * `Err(PdaError::FileError)` if the file cannot be read or is too large.
    /// * `Err(PdaError::ParseError)` if the file content is not a valid program.
    pub fn load_program(path: &Path) -> Result<Program, PdaError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PdaError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::load_program_from_string(&content)
    }

    /// Loads a single program from the provided string content.
    ///
    /// This is useful for parsing programs that are not stored in files, e.g., from stdin.
    pub fn load_program_from_string(content: &str) -> Result<Program, PdaError> {
        if content.len() > MAX_PROGRAM_SIZE {
            return Err(PdaError::FileError(format!(
                "Program is {} bytes, the limit is {}",
                content.len(),
                MAX_PROGRAM_SIZE
            )));
        }

        parse(content)
    }

    /// Loads all program files (`.pda` extension) from a given directory.
    ///
    /// Directories and files with other extensions are skipped. Each remaining file yields
    /// either its path and program or the error that prevented loading it. Results are
    /// sorted by path.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), PdaError>> {
        if !directory.exists() {
            return vec![Err(PdaError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(PdaError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut paths = Vec::new();
        let mut results = Vec::new();

        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(e) => results.push(Err(PdaError::FileError(format!(
                    "Failed to read directory entry: {}",
                    e
                )))),
            }
        }

        paths.sort();

        results.extend(
            paths
                .into_iter()
                // Skip directories and non-.pda files
                .filter(|path| {
                    !path.is_dir() && path.extension().is_some_and(|ext| ext == PROGRAM_EXTENSION)
                })
                .map(|path| match Self::load_program(&path) {
                    Ok(program) => Ok((path, program)),
                    Err(e) => Err(PdaError::FileError(format!(
                        "Failed to load program from {}: {}",
                        path.display(),
                        e
                    ))),
                }),
        );

        results
    }
}
