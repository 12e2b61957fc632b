use crate::types::{PdaError, Program};

use std::sync::RwLock;
use tracing::warn;

// Default embedded programs
const PROGRAM_TEXTS: [&str; 5] = [
    include_str!("../programs/anbn.pda"),
    include_str!("../programs/anbn-final-state.pda"),
    include_str!("../programs/brackets.pda"),
    include_str!("../programs/marked-palindrome.pda"),
    include_str!("../programs/anb2n.pda"),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Program>> = RwLock::new(Vec::new());
}

pub struct ProgramManager;

impl ProgramManager {
    /// Parses the embedded programs into the shared registry
    pub fn load() -> Result<(), PdaError> {
        Self::load_into(&PROGRAMS)
    }

    /// Parses the embedded programs into `registry`, replacing its contents.
    fn load_into(registry: &RwLock<Vec<Program>>) -> Result<(), PdaError> {
        let mut programs = Vec::new();

        for program_text in PROGRAM_TEXTS {
            match crate::parser::parse(program_text) {
                Ok(program) => programs.push(program),
                Err(e) => warn!(error = %e, "failed to parse embedded program"),
            }
        }

        if let Ok(mut write_guard) = registry.write() {
            *write_guard = programs;
        } else {
            return Err(PdaError::FileError(
                "Failed to acquire write lock".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        Self::ensure_loaded();

        PROGRAMS.read().map(|programs| programs.len()).unwrap_or(0)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, PdaError> {
        Self::ensure_loaded();

        PROGRAMS
            .read()
            .map_err(|_| PdaError::FileError("Failed to acquire read lock".to_string()))?
            .get(index)
            .cloned()
            .ok_or_else(|| {
                PdaError::ValidationError(format!("Program index {} out of range", index))
            })
    }

    /// Get a program by its name
    pub fn get_program_by_name(name: &str) -> Result<Program, PdaError> {
        Self::ensure_loaded();

        PROGRAMS
            .read()
            .map_err(|_| PdaError::FileError("Failed to acquire read lock".to_string()))?
            .iter()
            .find(|program| program.name == name)
            .cloned()
            .ok_or_else(|| PdaError::ValidationError(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        Self::ensure_loaded();

        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .map(|program| program.name.clone())
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, PdaError> {
        let program = Self::get_program_by_index(index)?;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            initial_state: program.initial_state.clone(),
            alphabet: program.alphabet.iter().collect(),
            state_count: program.states.len(),
            transition_count: program.transitions.len(),
        })
    }

    /// Search for programs by name
    pub fn search_programs(query: &str) -> Vec<usize> {
        Self::ensure_loaded();

        let query = query.to_lowercase();
        PROGRAMS
            .read()
            .map(|programs| {
                programs
                    .iter()
                    .enumerate()
                    .filter(|(_, program)| program.name.to_lowercase().contains(&query))
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_else(|_| Vec::new())
    }

    /// Get the original text of a program by its index
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, PdaError> {
        PROGRAM_TEXTS.get(index).copied().ok_or_else(|| {
            PdaError::ValidationError(format!("Program text index {} out of range", index))
        })
    }

    /// Fills the registry on first use.
    fn ensure_loaded() {
        if let Err(e) = Self::fill(&PROGRAMS) {
            warn!(error = %e, "failed to load embedded programs");
        }
    }

    /// Loads the embedded programs into `registry` if it is still empty.
    fn fill(registry: &RwLock<Vec<Program>>) -> Result<(), PdaError> {
        let empty = registry.read().map(|p| p.is_empty()).unwrap_or(true);
        if empty {
            Self::load_into(registry)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub initial_state: String,
    pub alphabet: String,
    pub state_count: usize,
    pub transition_count: usize,
}
