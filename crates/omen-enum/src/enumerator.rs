//! The top-level guess driver.
//!
//! For each target total level T the enumerator walks every (length,
//! initial prefix) decomposition: length buckets outermost, initial-prefix
//! buckets inside them, and for each pair a guess-structure walk over the
//! remaining transition budget `S = T - LN_level - IP_level`. That nesting
//! fixes the tie-break order between guesses sharing a total. When a
//! decomposition is exhausted T is incremented and the pointers reset, so
//! totals never decrease across one session.

use std::fmt;

use serde::{Deserialize, Serialize};

use omen_model::Model;

use crate::error::{EnumError, SessionError};
use crate::optimizer::{CpView, Optimizer, DEFAULT_OPTIMIZER_DEPTH};
use crate::walker::{GuessStructure, WalkerState};

/// Position inside a level-bucketed table: which level, which entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pointer {
    pub level: u8,
    pub index: usize,
}

/// Everything needed to resume an enumeration, minus the model itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratorState {
    pub target_level: u32,
    pub auto_increment: bool,
    pub started: bool,
    pub done: bool,
    pub cur_ip: Pointer,
    pub cur_len: Pointer,
    pub walker: Option<WalkerState>,
}

/// Ordered guess generation over a loaded model.
pub struct MarkovEnumerator<'m> {
    model: &'m Model,
    optimizer: Optimizer,
    start_ip: u8,
    start_ln: u8,
    /// Highest total any guess can reach; auto mode stops past it.
    max_target: u32,
    target: u32,
    auto_increment: bool,
    started: bool,
    done: bool,
    cur_ip: Pointer,
    cur_len: Pointer,
    walker: Option<GuessStructure>,
}

impl<'m> MarkovEnumerator<'m> {
    /// Enumerates every total level in ascending order.
    pub fn new(model: &'m Model) -> Result<Self, EnumError> {
        Self::build(model, true, None)
    }

    /// Enumerates the single total `level`, then stops.
    pub fn for_level(model: &'m Model, level: u32) -> Result<Self, EnumError> {
        Self::build(model, false, Some(level))
    }

    fn build(model: &'m Model, auto_increment: bool, level: Option<u32>) -> Result<Self, EnumError> {
        model.validate()?;
        let start_ip = first_nonempty(&model.ip).ok_or(omen_model::ModelError::EmptyTable {
            table: "IP",
        })?;
        let start_ln = first_nonempty(&model.ln).ok_or(omen_model::ModelError::EmptyTable {
            table: "LN",
        })?;
        let top_ip = last_nonempty(&model.ip).unwrap_or(start_ip);
        let top_ln = last_nonempty(&model.ln).unwrap_or(start_ln);
        let max_k = model.ln.iter().flatten().copied().max().unwrap_or(0);
        let max_target = u32::from(top_ip)
            + u32::from(top_ln)
            + max_k as u32 * u32::from(model.max_level());

        let floor = u32::from(start_ip) + u32::from(start_ln);
        let (target, done) = match level {
            None => (floor, false),
            // A fixed target below the cheapest decomposition yields nothing.
            Some(t) => (t, t < floor),
        };

        Ok(Self {
            model,
            optimizer: Optimizer::build(model, DEFAULT_OPTIMIZER_DEPTH),
            start_ip,
            start_ln,
            max_target,
            target,
            auto_increment,
            started: false,
            done,
            cur_ip: Pointer { level: start_ip, index: 0 },
            cur_len: Pointer { level: start_ln, index: 0 },
            walker: None,
        })
    }

    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// The next guess and the total level it was emitted at, or `None`
    /// once the model is exhausted.
    pub fn next_guess(&mut self) -> Option<(String, u32)> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            self.cur_len = Pointer { level: self.start_ln, index: 0 };
            self.cur_ip = Pointer { level: self.start_ip, index: 0 };
            self.walker = Some(self.make_walker());
        }
        loop {
            if let Some(walker) = self.walker.as_mut() {
                let view = CpView::new(self.model, &self.optimizer);
                if let Some(guess) = walker.next_guess(&view) {
                    return Some((guess, self.target));
                }
            }
            if self.increase_ip_for_target() {
                continue;
            }
            if self.increase_len_for_target() {
                continue;
            }
            if self.auto_increment && self.target < self.max_target {
                self.target += 1;
                self.cur_len = Pointer { level: self.start_ln, index: 0 };
                self.cur_ip = Pointer { level: self.start_ip, index: 0 };
                self.walker = Some(self.make_walker());
                continue;
            }
            self.done = true;
            self.walker = None;
            return None;
        }
    }

    /// Builds the walker for the current pointers. The budget can come
    /// out negative while pointers sweep past expensive combinations;
    /// such walkers simply yield nothing.
    fn make_walker(&self) -> GuessStructure {
        let prefix = &self.model.ip[usize::from(self.cur_ip.level)][self.cur_ip.index];
        let k = self.model.ln[usize::from(self.cur_len.level)][self.cur_len.index];
        let budget =
            i64::from(self.target) - i64::from(self.cur_len.level) - i64::from(self.cur_ip.level);
        GuessStructure::new(prefix, k, budget, self.model.max_level())
    }

    /// Advances the IP pointer to the next prefix affordable at the
    /// current target and length. Resets the walker on success.
    fn increase_ip_for_target(&mut self) -> bool {
        let working = i64::from(self.target) - i64::from(self.cur_len.level);
        let max_level = i64::from(self.model.max_level());
        let mut level = i64::from(self.cur_ip.level);
        let mut index = self.cur_ip.index + 1;
        while level <= max_level {
            if self.model.ip[level as usize].len() > index {
                self.cur_ip = Pointer { level: level as u8, index };
                self.walker = Some(self.make_walker());
                return true;
            }
            level += 1;
            index = 0;
            if level > max_level || level > working {
                return false;
            }
        }
        false
    }

    /// Advances the LN pointer to the next length affordable at the
    /// current target, resetting the IP pointer and walker on success.
    fn increase_len_for_target(&mut self) -> bool {
        let max_level = i64::from(self.model.max_level());
        let mut level = i64::from(self.cur_len.level);
        let mut index = self.cur_len.index + 1;
        while level <= max_level {
            if self.model.ln[level as usize].len() > index {
                self.cur_len = Pointer { level: level as u8, index };
                self.cur_ip = Pointer { level: self.start_ip, index: 0 };
                self.walker = Some(self.make_walker());
                return true;
            }
            level += 1;
            index = 0;
            if level > max_level || level > i64::from(self.target) {
                return false;
            }
        }
        false
    }

    /// Captures the resumable state.
    pub fn state(&self) -> EnumeratorState {
        EnumeratorState {
            target_level: self.target,
            auto_increment: self.auto_increment,
            started: self.started,
            done: self.done,
            cur_ip: self.cur_ip,
            cur_len: self.cur_len,
            walker: self.walker.as_ref().map(GuessStructure::state),
        }
    }

    /// Rebuilds an enumerator from a saved state against the same model.
    ///
    /// Model identity (uuid, version, rule name) is the session store's
    /// responsibility; this checks the state still resolves structurally.
    pub fn restore(model: &'m Model, state: EnumeratorState) -> Result<Self, EnumError> {
        let mut enumerator = Self::build(model, state.auto_increment, None)?;
        let ip_bucket = model
            .ip
            .get(usize::from(state.cur_ip.level))
            .ok_or_else(|| bad_pointer("IP", state.cur_ip))?;
        let ln_bucket = model
            .ln
            .get(usize::from(state.cur_len.level))
            .ok_or_else(|| bad_pointer("LN", state.cur_len))?;
        if state.walker.is_some() {
            if state.cur_ip.index >= ip_bucket.len() {
                return Err(bad_pointer("IP", state.cur_ip).into());
            }
            if state.cur_len.index >= ln_bucket.len() {
                return Err(bad_pointer("LN", state.cur_len).into());
            }
        }

        enumerator.target = state.target_level;
        enumerator.started = state.started;
        enumerator.done = state.done;
        enumerator.cur_ip = state.cur_ip;
        enumerator.cur_len = state.cur_len;
        enumerator.walker = match state.walker {
            None => None,
            Some(walker_state) => {
                let prefix =
                    &model.ip[usize::from(state.cur_ip.level)][state.cur_ip.index];
                let k = model.ln[usize::from(state.cur_len.level)][state.cur_len.index];
                let budget = i64::from(state.target_level)
                    - i64::from(state.cur_len.level)
                    - i64::from(state.cur_ip.level);
                let view = CpView::new(model, &enumerator.optimizer);
                Some(GuessStructure::restore(
                    prefix,
                    k,
                    budget,
                    model.max_level(),
                    walker_state,
                    &view,
                )?)
            }
        };
        Ok(enumerator)
    }

    /// Diagnostic: the levels the model assigns to each piece of a
    /// candidate string. Does not affect enumeration.
    pub fn parse(&self, candidate: &str) -> ParseBreakdown {
        let prefix_len = self.model.prefix_len();
        let symbols: Vec<char> = candidate.chars().collect();
        let length = symbols.len();

        let length_level = length.checked_sub(prefix_len).and_then(|k| {
            self.model
                .ln
                .iter()
                .position(|bucket| bucket.contains(&k))
                .map(|level| level as u8)
        });

        let initial: String = symbols.iter().take(prefix_len).collect();
        let initial_level = (length >= prefix_len)
            .then(|| {
                self.model
                    .ip
                    .iter()
                    .position(|bucket| bucket.iter().any(|p| *p == initial))
                    .map(|level| level as u8)
            })
            .flatten();

        let mut transitions = Vec::new();
        for window in symbols.windows(prefix_len + 1) {
            let context: String = window[..prefix_len].iter().collect();
            let symbol = window[prefix_len];
            let level = self
                .model
                .cp
                .get(&context)
                .and_then(|table| table.level_of(symbol));
            transitions.push(TransitionLevel {
                context,
                symbol,
                level,
            });
        }

        let end: String = if length >= prefix_len {
            symbols[length - prefix_len..].iter().collect()
        } else {
            String::new()
        };
        let end_level = self.model.ep.get(&end).copied();

        let total = match (length_level, initial_level) {
            (Some(ln), Some(ip)) => transitions
                .iter()
                .try_fold(u32::from(ln) + u32::from(ip), |sum, t| {
                    t.level.map(|l| sum + u32::from(l))
                }),
            _ => None,
        };

        ParseBreakdown {
            candidate: candidate.to_string(),
            length,
            length_level,
            initial,
            initial_level,
            transitions,
            end,
            end_level,
            total,
        }
    }
}

fn first_nonempty<T>(buckets: &[Vec<T>]) -> Option<u8> {
    buckets.iter().position(|b| !b.is_empty()).map(|i| i as u8)
}

fn last_nonempty<T>(buckets: &[Vec<T>]) -> Option<u8> {
    buckets.iter().rposition(|b| !b.is_empty()).map(|i| i as u8)
}

fn bad_pointer(table: &str, pointer: Pointer) -> SessionError {
    SessionError::Corrupt(format!(
        "{table} pointer (level {}, index {}) does not resolve",
        pointer.level, pointer.index
    ))
}

/// One conditional transition of a parsed candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionLevel {
    pub context: String,
    pub symbol: char,
    pub level: Option<u8>,
}

/// `parse` output: per-table levels for one candidate string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBreakdown {
    pub candidate: String,
    pub length: usize,
    pub length_level: Option<u8>,
    pub initial: String,
    pub initial_level: Option<u8>,
    pub transitions: Vec<TransitionLevel>,
    pub end: String,
    pub end_level: Option<u8>,
    /// IP + LN + the CP sum when every component is known; EP is informational
    /// and not part of the total.
    pub total: Option<u32>,
}

impl fmt::Display for ParseBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn level(value: Option<u8>) -> String {
            value.map_or_else(|| "unknown".to_string(), |l| l.to_string())
        }
        writeln!(
            f,
            "Length: {} Level: {}",
            self.length,
            level(self.length_level)
        )?;
        writeln!(
            f,
            "IP: {} Level: {}",
            self.initial,
            level(self.initial_level)
        )?;
        for t in &self.transitions {
            writeln!(f, "{} -> {} Level: {}", t.context, t.symbol, level(t.level))?;
        }
        writeln!(f, "EP: {} Level: {}", self.end, level(self.end_level))?;
        match self.total {
            Some(total) => write!(f, "Total level: {total}"),
            None => write!(f, "Total level: unknown (not enumerable)"),
        }
    }
}
