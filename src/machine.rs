//! This module defines the immutable `Automaton` configuration and the `PushdownMachine`,
//! which runs one simulation session against it. The machine owns its current state and
//! stack, resolves epsilon closures, consumes words symbol by symbol, and decides acceptance.

use crate::analyzer::analyze;
use crate::table::TransitionTable;
use crate::types::{
    Acceptance, Annotation, Next, PdaError, Program, Symbol, TraceStep, MAX_EPSILON_STEPS,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// A validated pushdown automaton configuration.
///
/// Built once from a `Program` and never mutated afterwards, so a single `Arc<Automaton>`
/// can back any number of machines at the same time.
#[derive(Debug, Clone)]
pub struct Automaton {
    name: String,
    alphabet: Vec<Symbol>,
    bottom: Symbol,
    initial_state: String,
    final_states: HashSet<String>,
    acceptance: Acceptance,
    tables: HashMap<String, TransitionTable>,
}

impl Automaton {
    /// Validates `program` and builds one `TransitionTable` per declared state.
    ///
    /// # Returns
    ///
    /// * `Ok(Automaton)` if the program is well formed and deterministic.
    /// * `Err(PdaError)` with the first validation or determinism failure otherwise.
    pub fn new(program: &Program) -> Result<Self, PdaError> {
        analyze(program)?;

        let tables = program
            .states
            .iter()
            .map(|state| {
                TransitionTable::build(program.transitions_from(state))
                    .map(|table| (state.clone(), table))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(Self {
            name: program.name.clone(),
            alphabet: program.alphabet.clone(),
            bottom: program.bottom,
            initial_state: program.initial_state.clone(),
            final_states: program.final_states.iter().cloned().collect(),
            acceptance: program.acceptance,
            tables,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the input alphabet in declaration order.
    pub fn alphabet(&self) -> &[Symbol] {
        &self.alphabet
    }

    pub fn bottom(&self) -> Symbol {
        self.bottom
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn acceptance(&self) -> Acceptance {
        self.acceptance
    }

    pub fn is_final(&self, state: &str) -> bool {
        self.final_states.contains(state)
    }

    /// Returns the transition table of `state`, if the state is declared.
    pub fn table(&self, state: &str) -> Option<&TransitionTable> {
        self.tables.get(state)
    }

    fn contains(&self, symbol: Symbol) -> bool {
        self.alphabet.contains(&symbol)
    }
}

/// Runs words against an `Automaton`.
///
/// A machine starts in the initial state with only the bottom marker on its stack. It is
/// mutated by `apply_step` and the run methods, and is either discarded after one run or
/// put back to its initial configuration with `reset`.
#[derive(Debug, Clone)]
pub struct PushdownMachine {
    automaton: Arc<Automaton>,
    state: String,
    stack: Vec<Symbol>,
}

impl PushdownMachine {
    /// Creates a machine in the initial configuration of `automaton`.
    pub fn new(automaton: Arc<Automaton>) -> Self {
        Self {
            state: automaton.initial_state.clone(),
            stack: vec![automaton.bottom],
            automaton,
        }
    }

    /// Builds the automaton for `program` and wraps it in a fresh machine.
    pub fn from_program(program: &Program) -> Result<Self, PdaError> {
        Ok(Self::new(Arc::new(Automaton::new(program)?)))
    }

    /// Puts the machine back in the initial state with a fresh bottom-only stack.
    pub fn reset(&mut self) {
        self.state = self.automaton.initial_state.clone();
        self.stack.clear();
        self.stack.push(self.automaton.bottom);
    }

    /// Moves to `next.state` and pushes `next.push` so that its first symbol ends on top.
    ///
    /// Returns `false` without touching the machine when `next` is `None`.
    pub fn apply_step(&mut self, next: Option<&Next>) -> bool {
        let Some(next) = next else {
            return false;
        };

        self.state.clone_from(&next.state);
        self.stack.extend(next.push.iter().rev());

        true
    }

    /// Applies epsilon moves until none matches the current stack top.
    ///
    /// A move that leaves both state and stack unchanged is the fixpoint itself and ends
    /// the closure.
    ///
    /// # Returns
    ///
    /// * `Ok(())` once no further epsilon move applies.
    /// * `Err(PdaError::EpsilonLoop)` if more than `MAX_EPSILON_STEPS` moves were taken.
    pub fn resolve_epsilon_closure(&mut self) -> Result<(), PdaError> {
        self.close(|_| {})
    }

    /// Decides whether the automaton accepts `word`.
    ///
    /// Every symbol is checked against the alphabet before the machine is touched. Running
    /// out of stack or finding no move for the next symbol is a rejection, not an error.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the word is accepted, `Ok(false)` if it is rejected.
    /// * `Err(PdaError::UnexpectedSymbol)` if `word` leaves the alphabet.
    /// * `Err(PdaError::EpsilonLoop)` if a closure does not settle.
    pub fn accepts(&mut self, word: &str) -> Result<bool, PdaError> {
        let symbols = self.check_word(word)?;
        let automaton = Arc::clone(&self.automaton);

        for symbol in symbols {
            self.resolve_epsilon_closure()?;

            let Some(top) = self.stack.pop() else {
                return Ok(false);
            };

            let next = automaton
                .table(&self.state)
                .and_then(|table| table.lookup_input(symbol, top));

            if !self.apply_step(next) {
                self.stack.push(top);
                return Ok(false);
            }
        }

        self.resolve_epsilon_closure()?;

        Ok(self.is_accepting())
    }

    /// Runs `word` like `accepts` and records every micro-step.
    ///
    /// The trace opens with an `initial` entry, adds one `ε` entry per epsilon move and one
    /// `->x` entry per consumed symbol, and ends with exactly one `accept` or `reject` entry.
    /// A run that gets stuck ends with `reject` immediately.
    pub fn step_through(&mut self, word: &str) -> Result<Vec<TraceStep>, PdaError> {
        let symbols = self.check_word(word)?;
        let automaton = Arc::clone(&self.automaton);
        let mut steps = vec![self.snapshot(&symbols, Annotation::Initial)];

        for (i, &symbol) in symbols.iter().enumerate() {
            self.close(|machine| {
                steps.push(machine.snapshot(&symbols[i..], Annotation::Epsilon))
            })?;

            let Some(top) = self.stack.pop() else {
                steps.push(self.snapshot(&symbols[i..], Annotation::Reject));
                return Ok(steps);
            };

            let next = automaton
                .table(&self.state)
                .and_then(|table| table.lookup_input(symbol, top));

            if !self.apply_step(next) {
                self.stack.push(top);
                steps.push(self.snapshot(&symbols[i..], Annotation::Reject));
                return Ok(steps);
            }

            trace!(state = %self.state, %symbol, "consumed input");
            steps.push(self.snapshot(&symbols[i + 1..], Annotation::Consumed(symbol)));
        }

        self.close(|machine| steps.push(machine.snapshot(&[], Annotation::Epsilon)))?;

        let verdict = if self.is_accepting() {
            Annotation::Accept
        } else {
            Annotation::Reject
        };
        steps.push(self.snapshot(&[], verdict));

        Ok(steps)
    }

    /// Returns the current state of the machine.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Returns the stack, bottom first.
    pub fn stack(&self) -> &[Symbol] {
        &self.stack
    }

    pub fn automaton(&self) -> &Arc<Automaton> {
        &self.automaton
    }

    /// Checks the current configuration against the acceptance condition.
    pub fn is_accepting(&self) -> bool {
        if !self.automaton.is_final(&self.state) {
            return false;
        }

        match self.automaton.acceptance {
            Acceptance::Final => true,
            Acceptance::FinalAndBottom => self.stack == [self.automaton.bottom],
        }
    }

    /// The closure loop shared by `resolve_epsilon_closure` and `step_through`.
    /// `on_move` sees the machine after every applied epsilon move.
    fn close<F>(&mut self, mut on_move: F) -> Result<(), PdaError>
    where
        F: FnMut(&Self),
    {
        let automaton = Arc::clone(&self.automaton);
        let mut moves = 0;

        while let Some(top) = self.stack.pop() {
            let next = automaton
                .table(&self.state)
                .and_then(|table| table.lookup_epsilon(top));

            let Some(next) = next else {
                self.stack.push(top);
                return Ok(());
            };

            if next.state == self.state && next.push == [top] {
                self.stack.push(top);
                return Ok(());
            }

            if moves == MAX_EPSILON_STEPS {
                self.stack.push(top);
                return Err(PdaError::EpsilonLoop {
                    state: self.state.clone(),
                    limit: MAX_EPSILON_STEPS,
                });
            }

            self.apply_step(Some(next));
            moves += 1;

            trace!(state = %self.state, %top, "applied epsilon move");
            on_move(self);
        }

        Ok(())
    }

    /// Validates `word` against the alphabet without touching the machine.
    fn check_word(&self, word: &str) -> Result<Vec<Symbol>, PdaError> {
        word.chars()
            .map(|c| {
                if self.automaton.contains(c) {
                    Ok(c)
                } else {
                    Err(PdaError::UnexpectedSymbol(c))
                }
            })
            .collect()
    }

    fn snapshot(&self, remaining: &[Symbol], annotation: Annotation) -> TraceStep {
        TraceStep {
            state: self.state.clone(),
            remaining: remaining.iter().collect(),
            stack: self.stack.iter().collect(),
            annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enumerator::WordEnumerator;
    use crate::types::{Input, Transition, DEFAULT_BOTTOM_SYMBOL};

    fn rule(state: &str, input: Option<char>, top: char, next: &str, push: &str) -> Transition {
        Transition {
            state: state.to_string(),
            input: input.map_or(Input::Epsilon, Input::Symbol),
            top,
            next: Next::new(next, push),
        }
    }

    /// aⁿbⁿ for n ≥ 1.
    fn create_anbn_program() -> Program {
        Program {
            name: "anbn".to_string(),
            alphabet: vec!['a', 'b'],
            stack_alphabet: vec!['A'],
            bottom: DEFAULT_BOTTOM_SYMBOL,
            states: vec!["S0".to_string(), "S1".to_string()],
            initial_state: "S0".to_string(),
            final_states: vec!["S1".to_string()],
            acceptance: Acceptance::default(),
            transitions: vec![
                rule("S0", Some('a'), 'Z', "S0", "AZ"),
                rule("S0", Some('a'), 'A', "S0", "AA"),
                rule("S0", Some('b'), 'A', "S1", ""),
                rule("S1", Some('b'), 'A', "S1", ""),
                rule("S1", None, 'Z', "S1", "Z"),
            ],
        }
    }

    /// Accepts a*: every `a` pushes an `X` that an epsilon chain later unwinds.
    fn create_unwinding_program() -> Program {
        Program {
            name: "unwind".to_string(),
            alphabet: vec!['a'],
            stack_alphabet: vec!['X'],
            bottom: DEFAULT_BOTTOM_SYMBOL,
            states: vec!["read".to_string(), "drain".to_string()],
            initial_state: "read".to_string(),
            final_states: vec!["read".to_string(), "drain".to_string()],
            acceptance: Acceptance::default(),
            transitions: vec![
                rule("read", Some('a'), 'Z', "drain", "XXZ"),
                rule("drain", None, 'X', "drain", ""),
                rule("drain", Some('a'), 'Z', "drain", "XZ"),
            ],
        }
    }

    fn machine(program: &Program) -> PushdownMachine {
        PushdownMachine::from_program(program).unwrap()
    }

    fn accepts(program: &Program, word: &str) -> bool {
        machine(program).accepts(word).unwrap()
    }

    #[test]
    fn test_machine_creation() {
        let machine = machine(&create_anbn_program());

        assert_eq!(machine.state(), "S0");
        assert_eq!(machine.stack(), &['Z']);
        assert_eq!(machine.automaton().name(), "anbn");
    }

    #[test]
    fn test_anbn_scenario() {
        let program = create_anbn_program();

        assert!(accepts(&program, "ab"));
        assert!(accepts(&program, "aabb"));
        assert!(accepts(&program, "aaabbb"));
        assert!(!accepts(&program, "aab"));
        assert!(!accepts(&program, "abb"));
        assert!(!accepts(&program, ""));
        assert!(!accepts(&program, "ba"));
    }

    #[test]
    fn test_final_acceptance_ignores_leftover_stack() {
        let mut program = create_anbn_program();
        program.acceptance = Acceptance::Final;

        assert!(accepts(&program, "ab"));
        assert!(accepts(&program, "aab"));
        assert!(!accepts(&program, "a"));
    }

    #[test]
    fn test_apply_step() {
        let mut machine = machine(&create_anbn_program());

        assert!(!machine.apply_step(None));
        assert_eq!(machine.state(), "S0");
        assert_eq!(machine.stack(), &['Z']);

        assert!(machine.apply_step(Some(&Next::new("S1", "AB"))));
        assert_eq!(machine.state(), "S1");
        // First pushed symbol ends on top
        assert_eq!(machine.stack(), &['Z', 'B', 'A']);
    }

    #[test]
    fn test_reset() {
        let program = create_anbn_program();
        let mut machine = machine(&program);

        machine.accepts("aab").unwrap();
        assert_eq!(machine.state(), "S1");

        machine.reset();
        assert_eq!(machine.state(), "S0");
        assert_eq!(machine.stack(), &['Z']);
    }

    #[test]
    fn test_reset_matches_fresh_machine() {
        let program = create_anbn_program();
        let mut reused = machine(&program);
        reused.accepts("aabb").unwrap();

        reused.reset();
        assert_eq!(
            reused.accepts("").unwrap(),
            machine(&program).accepts("").unwrap()
        );
    }

    #[test]
    fn test_resolve_epsilon_closure() {
        let program = create_unwinding_program();
        let mut machine = machine(&program);

        machine.apply_step(Some(&Next::new("drain", "XXZ")));
        machine.resolve_epsilon_closure().unwrap();

        assert_eq!(machine.state(), "drain");
        assert_eq!(machine.stack(), &['Z', 'Z']);
    }

    #[test]
    fn test_closure_stops_at_identity_move() {
        let program = create_anbn_program();
        let mut machine = machine(&program);

        machine.apply_step(Some(&Next::new("S1", "")));
        machine.resolve_epsilon_closure().unwrap();

        assert_eq!(machine.state(), "S1");
        assert_eq!(machine.stack(), &['Z']);
    }

    #[test]
    fn test_epsilon_cycle_is_reported() {
        let program = Program {
            name: "cycle".to_string(),
            alphabet: vec!['a'],
            stack_alphabet: vec![],
            bottom: DEFAULT_BOTTOM_SYMBOL,
            states: vec!["p".to_string(), "q".to_string()],
            initial_state: "p".to_string(),
            final_states: vec![],
            acceptance: Acceptance::default(),
            transitions: vec![
                rule("p", None, 'Z', "q", "Z"),
                rule("q", None, 'Z', "p", "Z"),
            ],
        };

        let result = machine(&program).accepts("");

        assert_eq!(
            result,
            Err(PdaError::EpsilonLoop {
                state: "p".to_string(),
                limit: MAX_EPSILON_STEPS,
            })
        );
    }

    #[test]
    fn test_growing_epsilon_loop_is_reported() {
        let program = Program {
            name: "grow".to_string(),
            alphabet: vec!['a'],
            stack_alphabet: vec![],
            bottom: DEFAULT_BOTTOM_SYMBOL,
            states: vec!["p".to_string()],
            initial_state: "p".to_string(),
            final_states: vec![],
            acceptance: Acceptance::default(),
            transitions: vec![rule("p", None, 'Z', "p", "ZZ")],
        };

        assert!(matches!(
            machine(&program).accepts("a"),
            Err(PdaError::EpsilonLoop { .. })
        ));
    }

    #[test]
    fn test_unexpected_symbol_leaves_machine_untouched() {
        let program = create_anbn_program();
        let mut machine = machine(&program);
        machine.apply_step(Some(&Next::new("S0", "A")));

        assert_eq!(machine.accepts("abx"), Err(PdaError::UnexpectedSymbol('x')));
        assert_eq!(machine.step_through("xab"), Err(PdaError::UnexpectedSymbol('x')));
        assert_eq!(machine.state(), "S0");
        assert_eq!(machine.stack(), &['Z', 'A']);
    }

    #[test]
    fn test_empty_stack_rejects() {
        let program = Program {
            name: "pop".to_string(),
            alphabet: vec!['a'],
            stack_alphabet: vec![],
            bottom: DEFAULT_BOTTOM_SYMBOL,
            states: vec!["q".to_string()],
            initial_state: "q".to_string(),
            final_states: vec!["q".to_string()],
            acceptance: Acceptance::Final,
            transitions: vec![rule("q", Some('a'), 'Z', "q", "")],
        };

        assert!(accepts(&program, "a"));
        assert!(!accepts(&program, "aa"));

        let steps = machine(&program).step_through("aa").unwrap();
        let last = steps.last().unwrap();
        assert_eq!(last.annotation, Annotation::Reject);
        assert_eq!(last.remaining, "a");
        assert_eq!(last.stack, "");
    }

    #[test]
    fn test_step_through_trace() {
        let program = create_anbn_program();
        let steps = machine(&program).step_through("ab").unwrap();

        let rows: Vec<(&str, &str, &str, String)> = steps
            .iter()
            .map(|s| {
                (
                    s.state.as_str(),
                    s.remaining.as_str(),
                    s.stack.as_str(),
                    s.annotation.to_string(),
                )
            })
            .collect();

        assert_eq!(
            rows,
            vec![
                ("S0", "ab", "Z", "initial".to_string()),
                ("S0", "b", "ZA", "->a".to_string()),
                ("S1", "", "Z", "->b".to_string()),
                ("S1", "", "Z", "accept".to_string()),
            ]
        );
    }

    #[test]
    fn test_step_through_records_epsilon_moves() {
        let program = create_unwinding_program();
        let steps = machine(&program).step_through("a").unwrap();

        let annotations: Vec<Annotation> = steps.iter().map(|s| s.annotation).collect();
        assert_eq!(
            annotations,
            vec![
                Annotation::Initial,
                Annotation::Consumed('a'),
                Annotation::Epsilon,
                Annotation::Epsilon,
                Annotation::Accept,
            ]
        );
        assert_eq!(steps[3].stack, "Z");
    }

    #[test]
    fn test_step_through_stops_on_missing_move() {
        let program = create_anbn_program();
        let steps = machine(&program).step_through("ba").unwrap();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].annotation, Annotation::Reject);
        assert_eq!(steps[1].remaining, "ba");
        assert_eq!(steps[1].stack, "Z");
    }

    #[test]
    fn test_accepts_agrees_with_trace() {
        for program in [create_anbn_program(), create_unwinding_program()] {
            let alphabet = program.alphabet.clone();

            for word in WordEnumerator::new(&alphabet, 5) {
                let accepted = machine(&program).accepts(&word).unwrap();
                let steps = machine(&program).step_through(&word).unwrap();
                let last = steps.last().map(|s| s.annotation);

                assert_eq!(
                    accepted,
                    last == Some(Annotation::Accept),
                    "'{}' disagrees for {}",
                    word,
                    program.name
                );
            }
        }
    }

    #[test]
    fn test_automaton_shared_between_machines() {
        let automaton = Arc::new(Automaton::new(&create_anbn_program()).unwrap());
        let mut first = PushdownMachine::new(Arc::clone(&automaton));
        let mut second = PushdownMachine::new(Arc::clone(&automaton));

        assert!(first.accepts("aabb").unwrap());
        assert!(!second.accepts("abab").unwrap());
        assert_eq!(Arc::strong_count(&automaton), 3);
    }

    #[test]
    fn test_non_deterministic_program_fails_to_build() {
        let mut program = create_anbn_program();
        program.transitions.push(rule("S1", Some('a'), 'Z', "S1", ""));

        assert!(matches!(
            PushdownMachine::from_program(&program),
            Err(PdaError::NonDeterministicTransition { .. })
        ));
    }
}
