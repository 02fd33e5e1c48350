//! Learns an alphabet from the corpus.
//!
//! One pass over the training set counting per-symbol frequency, then the
//! K most common symbols become the alphabet. Ties break on first-seen
//! order so the result is deterministic for a given corpus.

use std::collections::HashMap;

use omen_model::Alphabet;

use crate::error::{Result, TrainError};

/// Alphabets smaller than this are rejected up front; they are almost
/// always a mistyped command line rather than a real request.
pub const MIN_ALPHABET_SIZE: usize = 10;

pub struct AlphabetGenerator {
    size: usize,
    counts: HashMap<char, (u64, u64)>, // symbol -> (count, first-seen rank)
    next_rank: u64,
}

impl AlphabetGenerator {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            counts: HashMap::new(),
            next_rank: 0,
        }
    }

    pub fn observe(&mut self, password: &str) {
        for symbol in password.chars() {
            let rank = self.next_rank;
            let entry = self.counts.entry(symbol).or_insert_with(|| {
                (0, rank)
            });
            entry.0 += 1;
            if entry.1 == rank {
                self.next_rank += 1;
            }
        }
    }

    /// Finishes the pass: top-K symbols by (count desc, first-seen asc).
    pub fn into_alphabet(self) -> Result<Alphabet> {
        if self.counts.is_empty() {
            return Err(TrainError::NothingToLearn);
        }
        let mut ranked: Vec<(char, u64, u64)> = self
            .counts
            .into_iter()
            .map(|(symbol, (count, rank))| (symbol, count, rank))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(self.size);
        Ok(Alphabet::new(ranked.into_iter().map(|(symbol, _, _)| symbol))?)
    }
}
