//! This module defines the `TransitionTable`, the per-state deterministic lookup structure
//! the engine consults on every move.

use crate::types::{Input, Next, PdaError, Symbol, Transition};
use std::collections::HashMap;
use tracing::debug;

/// The moves available from one state, keyed by stack top.
///
/// A stack top is either a key of the epsilon map or a key of the input map, never both.
/// This keeps closure resolution and input lookup free of any ordering ambiguity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionTable {
    epsilon: HashMap<Symbol, Next>,
    on_input: HashMap<Symbol, HashMap<Symbol, Next>>,
}

impl TransitionTable {
    /// Builds a table from the transitions of a single state.
    ///
    /// # Returns
    ///
    /// * `Ok(TransitionTable)` if no two transitions compete for the same move.
    /// * `Err(PdaError::NonDeterministicTransition)` if a stack top carries both an epsilon
    ///   move and an input move, or the same `(input, top)` pair is defined twice.
    pub fn build<'a, I>(transitions: I) -> Result<Self, PdaError>
    where
        I: IntoIterator<Item = &'a Transition>,
    {
        let mut table = Self::default();
        let mut state: Option<&str> = None;

        for transition in transitions {
            if state.is_none() {
                state = Some(transition.state.as_str());
            }

            let duplicate = match transition.input {
                Input::Epsilon => table
                    .epsilon
                    .insert(transition.top, transition.next.clone())
                    .is_some(),
                Input::Symbol(symbol) => table
                    .on_input
                    .entry(transition.top)
                    .or_default()
                    .insert(symbol, transition.next.clone())
                    .is_some(),
            };

            if duplicate {
                return Err(PdaError::NonDeterministicTransition {
                    state: transition.state.clone(),
                    top: transition.top,
                });
            }
        }

        // An epsilon move and an input move may not share a stack top.
        let mut conflicts: Vec<Symbol> = table
            .epsilon
            .keys()
            .filter(|top| table.on_input.contains_key(*top))
            .copied()
            .collect();

        if !conflicts.is_empty() {
            conflicts.sort_unstable(); // Report the same symbol on every run
            return Err(PdaError::NonDeterministicTransition {
                state: state.unwrap_or_default().to_string(),
                top: conflicts[0],
            });
        }

        debug!(
            state = state.unwrap_or_default(),
            epsilon = table.epsilon.len(),
            input = table.on_input.values().map(HashMap::len).sum::<usize>(),
            "built transition table"
        );

        Ok(table)
    }

    /// Returns the epsilon move for `top`, if any.
    pub fn lookup_epsilon(&self, top: Symbol) -> Option<&Next> {
        self.epsilon.get(&top)
    }

    /// Returns the move consuming `input` with `top` on the stack, if any.
    pub fn lookup_input(&self, input: Symbol, top: Symbol) -> Option<&Next> {
        self.on_input.get(&top).and_then(|moves| moves.get(&input))
    }

    pub fn is_empty(&self) -> bool {
        self.epsilon.is_empty() && self.on_input.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(input: Input, top: Symbol, next: &str, push: &str) -> Transition {
        Transition {
            state: "q".to_string(),
            input,
            top,
            next: Next::new(next, push),
        }
    }

    #[test]
    fn test_build_and_lookup() {
        let transitions = vec![
            transition(Input::Symbol('a'), 'Z', "q", "AZ"),
            transition(Input::Symbol('b'), 'A', "p", ""),
            transition(Input::Epsilon, 'B', "p", "B"),
        ];

        let table = TransitionTable::build(&transitions).unwrap();

        assert_eq!(table.lookup_input('a', 'Z'), Some(&Next::new("q", "AZ")));
        assert_eq!(table.lookup_input('b', 'A'), Some(&Next::new("p", "")));
        assert_eq!(table.lookup_epsilon('B'), Some(&Next::new("p", "B")));
        assert_eq!(table.lookup_input('a', 'A'), None);
        assert_eq!(table.lookup_epsilon('Z'), None);
    }

    #[test]
    fn test_epsilon_and_input_on_same_top_conflict() {
        let transitions = vec![
            transition(Input::Symbol('a'), 'Z', "q", "AZ"),
            transition(Input::Epsilon, 'Z', "q", "Z"),
        ];

        let result = TransitionTable::build(&transitions);

        assert_eq!(
            result,
            Err(PdaError::NonDeterministicTransition {
                state: "q".to_string(),
                top: 'Z',
            })
        );
    }

    #[test]
    fn test_conflict_regardless_of_input_letter() {
        for letter in ['a', 'b', 'c'] {
            let transitions = vec![
                transition(Input::Epsilon, 'A', "q", ""),
                transition(Input::Symbol(letter), 'A', "q", ""),
            ];

            assert!(matches!(
                TransitionTable::build(&transitions),
                Err(PdaError::NonDeterministicTransition { top: 'A', .. })
            ));
        }
    }

    #[test]
    fn test_duplicate_input_move_conflict() {
        let transitions = vec![
            transition(Input::Symbol('a'), 'Z', "q", "AZ"),
            transition(Input::Symbol('a'), 'Z', "p", "Z"),
        ];

        assert!(matches!(
            TransitionTable::build(&transitions),
            Err(PdaError::NonDeterministicTransition { top: 'Z', .. })
        ));
    }

    #[test]
    fn test_duplicate_epsilon_move_conflict() {
        let transitions = vec![
            transition(Input::Epsilon, 'Z', "q", "Z"),
            transition(Input::Epsilon, 'Z', "p", ""),
        ];

        assert!(TransitionTable::build(&transitions).is_err());
    }

    #[test]
    fn test_epsilon_and_input_on_different_tops() {
        let transitions = vec![
            transition(Input::Epsilon, 'Z', "q", "Z"),
            transition(Input::Symbol('a'), 'A', "q", ""),
        ];

        assert!(TransitionTable::build(&transitions).is_ok());
    }

    #[test]
    fn test_empty_table() {
        let transitions: Vec<Transition> = Vec::new();
        let table = TransitionTable::build(&transitions).unwrap();

        assert!(table.is_empty());
        assert_eq!(table.lookup_epsilon('Z'), None);
    }
}
