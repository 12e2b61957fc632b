//! This module defines the core data structures and types used throughout the pushdown
//! automaton engine, including program representation, transitions, trace entries, and error types.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// A single input or stack token.
pub type Symbol = char;

/// The marker used in program definitions for a move that consumes no input.
pub const EPSILON: Symbol = 'ε';
/// The default bottom-of-stack marker seeded into every fresh stack.
pub const DEFAULT_BOTTOM_SYMBOL: Symbol = 'Z';
/// Splits a transition cell into its next state and push string.
pub const CELL_SEPARATOR: Symbol = '/';
/// The maximum allowed size for a program definition in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The maximum number of consecutive epsilon moves a single closure run may take.
pub const MAX_EPSILON_STEPS: usize = 10000;

/// Represents a pushdown automaton program as authored.
///
/// A program is the plain configuration consumed by the engine: both alphabets, the
/// declared states, and the flat list of transition records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    /// The name of the program.
    pub name: String,
    /// The ordered input alphabet. Its order defines the word enumeration order.
    pub alphabet: Vec<Symbol>,
    /// The ordered stack alphabet, not including the bottom marker.
    pub stack_alphabet: Vec<Symbol>,
    /// The bottom marker that seeds the initial stack.
    pub bottom: Symbol,
    /// All declared states, in declaration order.
    pub states: Vec<String>,
    /// The state every run starts in.
    pub initial_state: String,
    /// The subset of states that accept.
    pub final_states: Vec<String>,
    /// How a run that consumed its whole word is judged.
    pub acceptance: Acceptance,
    /// Every transition record, in declaration order.
    pub transitions: Vec<Transition>,
}

impl Program {
    /// Returns the stack alphabet with the bottom marker included.
    pub fn stack_symbols(&self) -> Vec<Symbol> {
        let mut symbols = self.stack_alphabet.clone();
        if !symbols.contains(&self.bottom) {
            symbols.push(self.bottom);
        }
        symbols
    }

    /// Returns the transitions whose source is `state`, in declaration order.
    pub fn transitions_from<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| t.state == state)
    }
}

/// The acceptance condition applied once the input word is exhausted.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Acceptance {
    /// The run must end in a final state with only the bottom marker left on the stack.
    #[default]
    FinalAndBottom,
    /// The run must end in a final state; leftover stack content is ignored.
    Final,
}

/// The input selector of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Input {
    /// Taken without consuming input.
    Epsilon,
    /// Consumes this input symbol.
    Symbol(Symbol),
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Epsilon => write!(f, "{EPSILON}"),
            Input::Symbol(c) => write!(f, "{c}"),
        }
    }
}

/// The target of a transition: the next state and what to push after popping the matched top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Next {
    /// The state the machine moves to.
    pub state: String,
    /// Symbols to push, listed top-of-stack-first. Empty means a pure pop.
    pub push: Vec<Symbol>,
}

impl Next {
    pub fn new(state: impl Into<String>, push: &str) -> Self {
        Self {
            state: state.into(),
            push: push.chars().collect(),
        }
    }
}

/// Represents a single transition rule: `(state, input, top) -> next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The source state.
    pub state: String,
    /// The consumed input symbol, or epsilon.
    pub input: Input,
    /// The stack-top symbol this transition matches (and pops).
    pub top: Symbol,
    /// Where the machine goes and what it pushes.
    pub next: Next,
}

/// The label attached to each entry of a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    Initial,
    Epsilon,
    /// The given input symbol was just consumed.
    Consumed(Symbol),
    Accept,
    Reject,
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Initial => write!(f, "initial"),
            Annotation::Epsilon => write!(f, "{EPSILON}"),
            Annotation::Consumed(c) => write!(f, "->{c}"),
            Annotation::Accept => write!(f, "accept"),
            Annotation::Reject => write!(f, "reject"),
        }
    }
}

impl Serialize for Annotation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One snapshot of a traced run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    /// The current state after the micro-step.
    pub state: String,
    /// The input not yet consumed.
    pub remaining: String,
    /// The stack contents, bottom first.
    pub stack: String,
    pub annotation: Annotation,
}

/// Represents various errors that can occur while building or running a pushdown automaton.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PdaError {
    /// A state has both an epsilon move and an input move (or two moves) on the same stack top.
    #[error("Non-deterministic transitions in state {state} on stack top '{top}'")]
    NonDeterministicTransition { state: String, top: Symbol },
    /// The input word contains a symbol outside the configured alphabet.
    #[error("Unexpected symbol '{0}' in input")]
    UnexpectedSymbol(Symbol),
    /// A state is referenced but never declared.
    #[error("Undefined state: {0}")]
    UndefinedState(String),
    /// A symbol is referenced but belongs to neither alphabet.
    #[error("Undefined symbol: '{0}'")]
    UndefinedSymbol(Symbol),
    /// A transition cell does not follow `<nextState>/<pushString>`.
    #[error("Malformed transition: {0}")]
    MalformedTransition(String),
    /// The epsilon closure kept moving past the step limit.
    #[error("Epsilon closure in state {state} exceeded {limit} steps")]
    EpsilonLoop { state: String, limit: usize },
    /// Indicates an error during the parsing of a program definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error during the validation of a program's structure.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

impl PdaError {
    /// Returns true for errors raised while building a configuration, as opposed to running one.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            PdaError::UnexpectedSymbol(_) | PdaError::EpsilonLoop { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_display() {
        assert_eq!(Annotation::Initial.to_string(), "initial");
        assert_eq!(Annotation::Epsilon.to_string(), "ε");
        assert_eq!(Annotation::Consumed('a').to_string(), "->a");
        assert_eq!(Annotation::Accept.to_string(), "accept");
        assert_eq!(Annotation::Reject.to_string(), "reject");
    }

    #[test]
    fn test_trace_step_serialization() {
        let step = TraceStep {
            state: "S1".to_string(),
            remaining: "b".to_string(),
            stack: "ZA".to_string(),
            annotation: Annotation::Consumed('a'),
        };

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["annotation"], "->a");
        assert_eq!(json["stack"], "ZA");
    }

    #[test]
    fn test_next_push_order() {
        let next = Next::new("S0", "AZ");

        assert_eq!(next.state, "S0");
        assert_eq!(next.push, vec!['A', 'Z']);
    }

    #[test]
    fn test_stack_symbols_include_bottom() {
        let program = Program {
            name: "p".to_string(),
            alphabet: vec!['a'],
            stack_alphabet: vec!['A'],
            bottom: DEFAULT_BOTTOM_SYMBOL,
            states: vec!["q".to_string()],
            initial_state: "q".to_string(),
            final_states: vec![],
            acceptance: Acceptance::default(),
            transitions: vec![],
        };

        assert_eq!(program.stack_symbols(), vec!['A', 'Z']);
    }

    #[test]
    fn test_error_display() {
        let error = PdaError::NonDeterministicTransition {
            state: "S1".to_string(),
            top: 'Z',
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Non-deterministic"));
        assert!(error_msg.contains("S1"));
        assert!(error.is_configuration_error());
        assert!(!PdaError::UnexpectedSymbol('x').is_configuration_error());
    }
}
