//! This module provides `WordEnumerator`, a lazy iterator over every word of an alphabet
//! up to a maximum length.

use crate::types::Symbol;
use std::iter::FusedIterator;

/// Enumerates all words over an ordered alphabet, shortest first.
///
/// Words of one length are produced by an odometer over alphabet indices: the first
/// position turns fastest and carries into the next one when it wraps. For `[a, b]` and a
/// maximum length of 2 the sequence is `"", "a", "b", "aa", "ba", "ab", "bb"`.
///
/// The enumerator is exhausted after `Σ |alphabet|^k` words for `k` in `0..=max_len`.
/// Create a new one to start over.
#[derive(Debug, Clone)]
pub struct WordEnumerator {
    alphabet: Vec<Symbol>,
    max_len: usize,
    /// Alphabet index per position, or `None` once exhausted.
    digits: Option<Vec<usize>>,
}

impl WordEnumerator {
    pub fn new(alphabet: &[Symbol], max_len: usize) -> Self {
        Self {
            alphabet: alphabet.to_vec(),
            max_len,
            digits: Some(Vec::new()),
        }
    }

    /// Returns the total number of words this enumerator yields from the start,
    /// or `None` if that count does not fit in a `u64`.
    pub fn total(&self) -> Option<u64> {
        let base = self.alphabet.len() as u64;
        let mut total: u64 = 0;
        let mut power: u64 = 1;

        for length in 0..=self.max_len {
            total = total.checked_add(power)?;
            if length < self.max_len {
                power = power.checked_mul(base)?;
            }
        }

        Some(total)
    }

    /// Advances the odometer, growing the word by one position when every digit wraps.
    fn advance(&mut self) {
        let Some(digits) = self.digits.as_mut() else {
            return;
        };

        for digit in digits.iter_mut() {
            *digit += 1;
            if *digit < self.alphabet.len() {
                return;
            }
            *digit = 0;
        }

        // Every position wrapped (or the word was empty): move to the next length.
        let length = digits.len() + 1;
        if length > self.max_len || self.alphabet.is_empty() {
            self.digits = None;
        } else {
            *digits = vec![0; length];
        }
    }
}

impl Iterator for WordEnumerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let word = self
            .digits
            .as_ref()?
            .iter()
            .map(|&digit| self.alphabet[digit])
            .collect();

        self.advance();

        Some(word)
    }
}

impl FusedIterator for WordEnumerator {}
