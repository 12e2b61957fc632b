//! This crate provides the core logic for a deterministic pushdown automaton simulator.
//! It includes modules for parsing automaton programs, building per-state transition tables,
//! running and tracing words, enumerating bounded word spaces, and searching them for
//! accepted words under a time budget.

pub mod analyzer;
pub mod enumerator;
pub mod fuzz;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod table;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the `WordEnumerator` iterator.
pub use enumerator::WordEnumerator;
/// Re-exports the fuzz driver and its results.
pub use fuzz::{FuzzDriver, FuzzReport, FuzzStatus, FuzzSummary};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the automaton configuration and the machine that runs it.
pub use machine::{Automaton, PushdownMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the `TransitionTable` lookup structure.
pub use table::TransitionTable;
/// Re-exports various types related to program definition and execution from the types module.
pub use types::{
    Acceptance, Annotation, Input, Next, PdaError, Program, Symbol, TraceStep, Transition,
    MAX_PROGRAM_SIZE,
};
