//! This module provides the `FuzzDriver`, which searches a bounded word space for words the
//! automaton accepts within a wall-clock budget.

use crate::machine::PushdownMachine;
use crate::types::PdaError;
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How a fuzz pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzStatus {
    /// Every word was tested.
    Exhausted,
    /// The budget ran out before the word space did.
    TimedOut,
}

impl fmt::Display for FuzzStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuzzStatus::Exhausted => write!(f, "exhausted"),
            FuzzStatus::TimedOut => write!(f, "timed out"),
        }
    }
}

impl Serialize for FuzzStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counters of a finished pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FuzzSummary {
    pub status: FuzzStatus,
    /// Number of words run through the machine.
    pub tested: usize,
    /// Number of those words that were accepted.
    pub accepted: usize,
}

/// The accepted words of a pass, in enumeration order, with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzReport {
    pub accepted: Vec<String>,
    pub tested: usize,
    pub status: FuzzStatus,
}

/// Runs candidate words through a machine until they run out or the budget does.
///
/// The clock is checked between words, never while a word is running. A zero budget
/// therefore stops before the first word is tested.
pub struct FuzzDriver<'a> {
    budget: Duration,
    yield_every: usize,
    on_yield: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> FuzzDriver<'a> {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            yield_every: 0,
            on_yield: None,
        }
    }

    /// Calls `hook` after every `every` tested words, giving an interactive host a chance to
    /// run. The hook has no influence on the result.
    pub fn with_yield(mut self, every: usize, hook: impl FnMut() + 'a) -> Self {
        self.yield_every = every;
        self.on_yield = Some(Box::new(hook));
        self
    }

    /// Tests each word from `words` and hands the accepted ones to `on_accepted`.
    ///
    /// The machine is reset before every word.
    ///
    /// # Returns
    ///
    /// * `Ok(FuzzSummary)` with `FuzzStatus::Exhausted` if every word was tested, or
    ///   `FuzzStatus::TimedOut` if the budget ran out first.
    /// * `Err(PdaError)` if a word could not be evaluated.
    pub fn run<I, F>(
        &mut self,
        machine: &mut PushdownMachine,
        words: I,
        mut on_accepted: F,
    ) -> Result<FuzzSummary, PdaError>
    where
        I: IntoIterator<Item = String>,
        F: FnMut(&str),
    {
        let start = Instant::now();
        let mut tested = 0;
        let mut accepted = 0;

        for word in words {
            if start.elapsed() >= self.budget {
                warn!(
                    tested,
                    accepted,
                    budget_ms = self.budget.as_millis() as u64,
                    "fuzz budget exhausted before the word space"
                );
                return Ok(FuzzSummary {
                    status: FuzzStatus::TimedOut,
                    tested,
                    accepted,
                });
            }

            machine.reset();
            if machine.accepts(&word)? {
                accepted += 1;
                on_accepted(&word);
            }
            tested += 1;

            if let Some(hook) = self.on_yield.as_mut() {
                if self.yield_every > 0 && tested % self.yield_every == 0 {
                    hook();
                }
            }
        }

        debug!(
            tested,
            accepted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fuzz pass covered the whole word space"
        );

        Ok(FuzzSummary {
            status: FuzzStatus::Exhausted,
            tested,
            accepted,
        })
    }

    /// Runs a pass and gathers the accepted words.
    pub fn collect<I>(
        &mut self,
        machine: &mut PushdownMachine,
        words: I,
    ) -> Result<FuzzReport, PdaError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut accepted = Vec::new();
        let summary = self.run(machine, words, |word| accepted.push(word.to_string()))?;

        Ok(FuzzReport {
            accepted,
            tested: summary.tested,
            status: summary.status,
        })
    }
}
