//! This module provides functions for analyzing pushdown automaton programs to detect
//! configuration errors before an automaton is built. This includes checks for declared
//! states, known symbols, and the reserved markers.

use crate::types::{Input, PdaError, Program, Symbol, CELL_SEPARATOR, EPSILON};
use std::collections::HashSet;

/// Represents various errors that can be found during the analysis of a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// A state is referenced by the initial state, the final states, or a transition,
    /// but never declared.
    UndefinedState(String),
    /// A transition reads an input outside the alphabet, or matches or pushes a stack
    /// symbol outside the stack alphabet.
    UndefinedSymbol(Symbol),
    /// The epsilon marker, the bottom marker or the cell separator is used where it is
    /// reserved.
    ReservedSymbol(Symbol, &'static str),
    /// Indicates structural problems with the program (no states, duplicate declarations).
    StructuralError(String),
}

impl From<AnalysisError> for PdaError {
    /// Converts an `AnalysisError` into the matching `PdaError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::UndefinedState(state) => PdaError::UndefinedState(state),
            AnalysisError::UndefinedSymbol(symbol) => PdaError::UndefinedSymbol(symbol),
            AnalysisError::ReservedSymbol(symbol, place) => {
                PdaError::ValidationError(format!("Reserved symbol '{symbol}' used in {place}"))
            }
            AnalysisError::StructuralError(msg) => PdaError::ValidationError(msg),
        }
    }
}

/// Analyzes a given `Program` for structural and referential errors.
///
/// # Arguments
///
/// * `program` - A reference to the `Program` to be analyzed.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(PdaError)` for the first violated check.
pub fn analyze(program: &Program) -> Result<(), PdaError> {
    let first_error = [
        check_structure,
        check_reserved_symbols,
        check_initial_state,
        check_final_states,
        check_transition_states,
        check_transition_symbols,
    ]
    .iter()
    .find_map(|f| f(program).err());

    match first_error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Returns the declared states no run can reach from the initial state, sorted.
///
/// Reachability only follows transition targets; stack contents are not considered, so a
/// state reported here is certainly dead while a state not reported may still be.
pub fn unreachable_states(program: &Program) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut queue = vec![program.initial_state.as_str()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for transition in program.transitions_from(state) {
            if !visited.contains(transition.next.state.as_str()) {
                queue.push(&transition.next.state);
            }
        }
    }

    let mut unreachable: Vec<String> = program
        .states
        .iter()
        .filter(|state| !visited.contains(state.as_str()))
        .cloned()
        .collect();

    unreachable.sort(); // Sort for deterministic output
    unreachable
}

/// Checks that at least one state exists and that no state or symbol is declared twice.
fn check_structure(program: &Program) -> Result<(), AnalysisError> {
    if program.states.is_empty() {
        return Err(AnalysisError::StructuralError(
            "No states defined".to_string(),
        ));
    }

    if let Some(state) = first_duplicate(&program.states) {
        return Err(AnalysisError::StructuralError(format!(
            "State '{state}' declared more than once"
        )));
    }

    for (symbols, place) in [
        (&program.alphabet, "alphabet"),
        (&program.stack_alphabet, "stack alphabet"),
    ] {
        if let Some(symbol) = first_duplicate(symbols) {
            return Err(AnalysisError::StructuralError(format!(
                "Symbol '{symbol}' declared more than once in the {place}"
            )));
        }
    }

    Ok(())
}

/// Checks that the epsilon marker appears in neither alphabet, that the bottom marker
/// is not an input symbol, and that no stack symbol is the cell separator.
fn check_reserved_symbols(program: &Program) -> Result<(), AnalysisError> {
    if program.alphabet.contains(&EPSILON) || program.bottom == EPSILON {
        return Err(AnalysisError::ReservedSymbol(EPSILON, "the alphabet"));
    }

    if program.stack_alphabet.contains(&EPSILON) {
        return Err(AnalysisError::ReservedSymbol(EPSILON, "the stack alphabet"));
    }

    if program.alphabet.contains(&program.bottom) {
        return Err(AnalysisError::ReservedSymbol(program.bottom, "the alphabet"));
    }

    // A pushed separator could not be written in a cell
    if program.stack_symbols().contains(&CELL_SEPARATOR) {
        return Err(AnalysisError::ReservedSymbol(
            CELL_SEPARATOR,
            "the stack alphabet",
        ));
    }

    Ok(())
}

/// Checks that the initial state is declared.
fn check_initial_state(program: &Program) -> Result<(), AnalysisError> {
    if !program.states.contains(&program.initial_state) {
        return Err(AnalysisError::UndefinedState(
            program.initial_state.clone(),
        ));
    }

    Ok(())
}

/// Checks that every final state is declared.
fn check_final_states(program: &Program) -> Result<(), AnalysisError> {
    program
        .final_states
        .iter()
        .find(|state| !program.states.contains(state))
        .map_or(Ok(()), |state| {
            Err(AnalysisError::UndefinedState(state.clone()))
        })
}

/// Checks that every transition starts from and leads to a declared state.
fn check_transition_states(program: &Program) -> Result<(), AnalysisError> {
    program
        .transitions
        .iter()
        .flat_map(|t| [&t.state, &t.next.state])
        .find(|state| !program.states.contains(state))
        .map_or(Ok(()), |state| {
            Err(AnalysisError::UndefinedState(state.clone()))
        })
}

/// Checks that every transition only reads, matches, and pushes declared symbols.
fn check_transition_symbols(program: &Program) -> Result<(), AnalysisError> {
    let stack_symbols = program.stack_symbols();

    for transition in &program.transitions {
        if let Input::Symbol(symbol) = transition.input {
            if !program.alphabet.contains(&symbol) {
                return Err(AnalysisError::UndefinedSymbol(symbol));
            }
        }

        if let Some(symbol) = std::iter::once(&transition.top)
            .chain(&transition.next.push)
            .find(|symbol| !stack_symbols.contains(symbol))
        {
            return Err(AnalysisError::UndefinedSymbol(*symbol));
        }
    }

    Ok(())
}

fn first_duplicate<T: Eq + std::hash::Hash>(items: &[T]) -> Option<&T> {
    let mut seen = HashSet::new();
    items.iter().find(|item| !seen.insert(*item))
}
