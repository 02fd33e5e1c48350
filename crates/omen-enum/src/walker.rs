//! The guess structure: enumerates every continuation of one initial
//! prefix whose transition levels sum to an exact budget.
//!
//! The parse tree is a linear array of slots, one per conditional
//! transition. Each slot records the level it is spending and an index
//! into that level's bucket for its context; the chosen symbols are
//! materialised in `text`, and slot i's context is always the n-1
//! symbols ending just before its position. Enumeration order is fixed:
//! the rightmost slot advances fastest, and within a slot (level, index)
//! grows lexicographically. Because every emitted string spends the
//! budget exactly, distinct budgets can never produce the same string
//! twice.
//!
//! Feasibility of a partial assignment depends on data (future contexts
//! depend on future symbols), so a cheap upper-bound check gates a
//! depth-first refill of the suffix.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::optimizer::CpView;

/// One parse-tree slot: the level being spent and the index into that
/// level's bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub level: u8,
    pub index: u32,
}

/// The serialisable part of a walker, captured into sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkerState {
    pub slots: Vec<Slot>,
    pub first_guess: bool,
    pub exhausted: bool,
}

#[derive(Debug)]
pub struct GuessStructure {
    /// Number of conditional transitions to apply.
    k: usize,
    /// Exact level sum the k transitions must spend. Negative budgets
    /// arise transiently while the enumerator advances its pointers; such
    /// a walker is born exhausted.
    budget: i64,
    context_len: usize,
    max_level: u8,
    slots: Vec<Slot>,
    /// Prefix symbols followed by the k chosen symbols.
    text: Vec<char>,
    first_guess: bool,
    exhausted: bool,
    /// Reusable context-key buffer for table lookups.
    scratch: String,
}

impl GuessStructure {
    pub fn new(prefix: &str, k: usize, budget: i64, max_level: u8) -> Self {
        let mut text: Vec<char> = prefix.chars().collect();
        let context_len = text.len();
        text.resize(context_len + k, '\0');
        Self {
            k,
            budget,
            context_len,
            max_level,
            slots: Vec::with_capacity(k),
            text,
            first_guess: true,
            exhausted: false,
            scratch: String::new(),
        }
    }

    /// Produces the next satisfying guess, or `None` once exhausted.
    pub fn next_guess(&mut self, cp: &CpView<'_>) -> Option<String> {
        if self.exhausted {
            return None;
        }
        if self.first_guess {
            self.first_guess = false;
            if self.budget < 0 {
                self.exhausted = true;
                return None;
            }
            if self.k == 0 {
                // The guess is the bare prefix; it spends nothing.
                if self.budget == 0 {
                    return Some(self.render());
                }
                self.exhausted = true;
                return None;
            }
            if self.fill_suffix(cp, 0) {
                return Some(self.render());
            }
            self.exhausted = true;
            return None;
        }
        if self.k == 0 {
            self.exhausted = true;
            return None;
        }
        if self.advance(cp, self.k - 1) {
            return Some(self.render());
        }
        self.exhausted = true;
        None
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Captures the resumable state.
    pub fn state(&self) -> WalkerState {
        WalkerState {
            slots: self.slots.clone(),
            first_guess: self.first_guess,
            exhausted: self.exhausted,
        }
    }

    /// Rebuilds a walker from a saved state, replaying the slot choices
    /// against the loaded model to recover the symbol text.
    pub fn restore(
        prefix: &str,
        k: usize,
        budget: i64,
        max_level: u8,
        state: WalkerState,
        cp: &CpView<'_>,
    ) -> Result<Self, SessionError> {
        let mut walker = Self::new(prefix, k, budget, max_level);
        if state.slots.len() > k {
            return Err(SessionError::Corrupt(format!(
                "saved walker has {} slots for {} transitions",
                state.slots.len(),
                k
            )));
        }
        for (i, slot) in state.slots.iter().enumerate() {
            walker.load_context(i);
            let symbol = cp
                .symbol_at(&walker.scratch, slot.level, slot.index as usize)
                .ok_or_else(|| {
                    SessionError::Corrupt(format!(
                        "slot {i} (level {}, index {}) does not resolve",
                        slot.level, slot.index
                    ))
                })?;
            walker.set_slot(i, slot.level, slot.index, symbol);
        }
        walker.first_guess = state.first_guess;
        walker.exhausted = state.exhausted;
        Ok(walker)
    }

    fn render(&self) -> String {
        self.text.iter().collect()
    }

    /// Budget still unspent when slot `i` chooses.
    fn remaining(&self, i: usize) -> i64 {
        self.budget
            - self.slots[..i]
                .iter()
                .map(|slot| i64::from(slot.level))
                .sum::<i64>()
    }

    /// Loads slot `i`'s context (the n-1 symbols before its position)
    /// into the scratch key.
    fn load_context(&mut self, i: usize) {
        self.scratch.clear();
        self.scratch.extend(&self.text[i..i + self.context_len]);
    }

    fn set_slot(&mut self, i: usize, level: u8, index: u32, symbol: char) {
        let slot = Slot { level, index };
        if self.slots.len() == i {
            self.slots.push(slot);
        } else {
            self.slots[i] = slot;
        }
        self.text[self.context_len + i] = symbol;
    }

    /// First-fit fills slots `i..k` with the lexicographically smallest
    /// assignment spending exactly the remaining budget.
    fn fill_suffix(&mut self, cp: &CpView<'_>, i: usize) -> bool {
        let budget = self.remaining(i);
        if budget < 0 {
            return false;
        }
        if budget > (self.k - i) as i64 * i64::from(self.max_level) {
            return false;
        }
        if i == self.k - 1 {
            // The last slot must spend the whole remainder.
            let level = budget as u8;
            self.load_context(i);
            if let Some(symbol) = cp.symbol_at(&self.scratch, level, 0) {
                self.set_slot(i, level, 0, symbol);
                return true;
            }
            return false;
        }
        let cap = budget.min(i64::from(self.max_level)) as u8;
        for level in 0..=cap {
            let mut index: u32 = 0;
            loop {
                self.load_context(i);
                let Some(symbol) = cp.symbol_at(&self.scratch, level, index as usize) else {
                    break;
                };
                self.set_slot(i, level, index, symbol);
                if self.fill_suffix(cp, i + 1) {
                    return true;
                }
                index += 1;
            }
        }
        false
    }

    /// Advances slot `i` to its next admissible state, refilling the
    /// suffix; on failure backtracks to the slot on its left.
    fn advance(&mut self, cp: &CpView<'_>, slot: usize) -> bool {
        let mut i = slot;
        loop {
            if self.advance_slot(cp, i) {
                return true;
            }
            if i == 0 {
                return false;
            }
            i -= 1;
        }
    }

    fn advance_slot(&mut self, cp: &CpView<'_>, i: usize) -> bool {
        let budget = self.remaining(i);
        if budget < 0 {
            return false;
        }
        if i == self.k - 1 {
            if budget > i64::from(self.max_level) {
                return false;
            }
            // Level is pinned to the remainder here; only the index moves.
            let level = budget as u8;
            let index = self.slots[i].index + 1;
            self.load_context(i);
            if let Some(symbol) = cp.symbol_at(&self.scratch, level, index as usize) {
                self.set_slot(i, level, index, symbol);
                return true;
            }
            return false;
        }
        let cap = budget.min(i64::from(self.max_level)) as u8;
        let mut level = self.slots[i].level;
        let mut index = self.slots[i].index + 1;
        loop {
            if level > cap {
                return false;
            }
            self.load_context(i);
            match cp.symbol_at(&self.scratch, level, index as usize) {
                Some(symbol) => {
                    self.set_slot(i, level, index, symbol);
                    if self.fill_suffix(cp, i + 1) {
                        return true;
                    }
                    index += 1;
                }
                None => {
                    if level == cap {
                        return false;
                    }
                    level += 1;
                    index = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::{CpView, Optimizer, DEFAULT_OPTIMIZER_DEPTH};
    use omen_model::{
        Alphabet, ContextTable, Model, ProgramDetails, RuleConfig, TrainingSettings,
    };
    use std::collections::HashMap;

    fn config(ngram: usize, max_level: u8) -> RuleConfig {
        RuleConfig {
            program_details: ProgramDetails {
                name: "omen-train".into(),
                version: "0.1.0".into(),
                author: "test".into(),
                contact: "".into(),
            },
            training_settings: TrainingSettings {
                training_file: "corpus".into(),
                alphabet_encoding: "utf-8".into(),
                ngram,
                max_level,
                uuid: "test-uuid".into(),
            },
        }
    }

    /// n=2 model over {a, b}: from "a" both symbols at level 0, from "b"
    /// only "a" at level 0 and "b" at level 2.
    fn two_symbol_model() -> Model {
        let mut cp = HashMap::new();
        let mut from_a = ContextTable::default();
        from_a.push('a', 0);
        from_a.push('b', 0);
        cp.insert("a".to_string(), from_a);
        let mut from_b = ContextTable::default();
        from_b.push('a', 0);
        from_b.push('b', 2);
        cp.insert("b".to_string(), from_b);
        Model {
            config: config(2, 2),
            alphabet: Alphabet::new("ab".chars()).unwrap(),
            ip: vec![vec!["a".into()], vec!["b".into()], vec![]],
            ep: HashMap::new(),
            cp,
            ln: vec![vec![1], vec![], vec![0]],
        }
    }

    fn collect(walker: &mut GuessStructure, cp: &CpView<'_>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(guess) = walker.next_guess(cp) {
            out.push(guess);
        }
        out
    }

    #[test]
    fn exact_budget_zero_enumerates_level_zero_chains() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);
        let mut walker = GuessStructure::new("a", 2, 0, 2);
        // aaa, aab, aba (abb would cost 2 at the last step)
        assert_eq!(collect(&mut walker, &view), vec!["aaa", "aab", "aba"]);
    }

    #[test]
    fn exact_budget_two_spends_exactly_two() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);
        let mut walker = GuessStructure::new("a", 2, 2, 2);
        // Only b->b costs 2; the other slot must spend 0: abb only.
        assert_eq!(collect(&mut walker, &view), vec!["abb"]);
    }

    #[test]
    fn infeasible_budget_yields_nothing() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);
        let mut walker = GuessStructure::new("a", 2, 1, 2);
        assert_eq!(collect(&mut walker, &view), Vec::<String>::new());
        assert!(walker.is_exhausted());
        let mut negative = GuessStructure::new("a", 2, -1, 2);
        assert_eq!(negative.next_guess(&view), None);
    }

    #[test]
    fn zero_transitions_emits_bare_prefix_once() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);
        let mut walker = GuessStructure::new("b", 0, 0, 2);
        assert_eq!(walker.next_guess(&view), Some("b".to_string()));
        assert_eq!(walker.next_guess(&view), None);
        let mut costly = GuessStructure::new("b", 0, 1, 2);
        assert_eq!(costly.next_guess(&view), None);
    }

    #[test]
    fn emitted_levels_sum_to_budget() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);
        for budget in 0..=6i64 {
            let mut walker = GuessStructure::new("b", 3, budget, 2);
            for guess in collect(&mut walker, &view) {
                let symbols: Vec<char> = guess.chars().collect();
                let spent: i64 = symbols
                    .windows(2)
                    .map(|w| {
                        let context: String = w[..1].iter().collect();
                        i64::from(model.cp[&context].level_of(w[1]).unwrap())
                    })
                    .sum();
                assert_eq!(spent, budget, "guess {guess} at budget {budget}");
            }
        }
    }

    #[test]
    fn state_round_trip_resumes_mid_stream() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);

        // Budget 0 over three transitions: every path avoiding the costly
        // b->b edge, five in all.
        let mut reference = GuessStructure::new("a", 3, 0, 2);
        let all = collect(&mut reference, &view);
        assert_eq!(all.len(), 5);

        let mut walker = GuessStructure::new("a", 3, 0, 2);
        let first = walker.next_guess(&view).unwrap();
        assert_eq!(first, all[0]);
        let state = walker.state();
        drop(walker);

        let mut resumed = GuessStructure::restore("a", 3, 0, 2, state, &view).unwrap();
        let rest = collect(&mut resumed, &view);
        assert_eq!(rest, all[1..].to_vec());
    }

    #[test]
    fn restore_rejects_unresolvable_slots() {
        let model = two_symbol_model();
        let optimizer = Optimizer::build(&model, DEFAULT_OPTIMIZER_DEPTH);
        let view = CpView::new(&model, &optimizer);
        let state = WalkerState {
            slots: vec![Slot { level: 1, index: 5 }],
            first_guess: false,
            exhausted: false,
        };
        let err = GuessStructure::restore("a", 2, 1, 2, state, &view).unwrap_err();
        assert!(matches!(err, SessionError::Corrupt(_)));
    }
}
