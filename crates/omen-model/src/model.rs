//! The in-memory ruleset model and the table abstraction shared with the
//! trainer.
//!
//! A [`Model`] is immutable once constructed. The enumerator walks it
//! through shared references; the only mutable state during guess
//! generation lives in the enumerator itself.

use std::collections::HashMap;

use crate::alphabet::Alphabet;
use crate::config::RuleConfig;
use crate::error::{ModelError, Result};

/// One context's transitions, kept in rule-file order.
///
/// Transitions are stored as a flat `(symbol, level)` list rather than
/// nested per-level maps; level-bucket access scans the list. The
/// enumerator's optimizer builds the packed O(1) form for hot contexts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextTable {
    entries: Vec<(char, u8)>,
}

impl ContextTable {
    pub fn push(&mut self, symbol: char, level: u8) {
        self.entries.push((symbol, level));
    }

    pub fn entries(&self) -> &[(char, u8)] {
        &self.entries
    }

    /// Number of next-symbols at exactly `level`.
    pub fn bucket_len(&self, level: u8) -> usize {
        self.entries.iter().filter(|&&(_, l)| l == level).count()
    }

    /// The `index`-th next-symbol at exactly `level`, in file order.
    pub fn symbol_at(&self, level: u8, index: usize) -> Option<char> {
        self.entries
            .iter()
            .filter(|&&(_, l)| l == level)
            .nth(index)
            .map(|&(s, _)| s)
    }

    /// Level of the first transition to `symbol`, if present.
    pub fn level_of(&self, symbol: char) -> Option<u8> {
        self.entries
            .iter()
            .find(|&&(s, _)| s == symbol)
            .map(|&(_, l)| l)
    }
}

/// The discretised model: four level tables plus configuration.
///
/// - `ip[level]` lists initial prefixes in trainer write order.
/// - `ep` maps end prefixes to their level (query-by-key only).
/// - `cp` maps each (n-1)-symbol context to its transitions.
/// - `ln[level]` lists CP-application counts `k = length - (n-1)`.
#[derive(Debug, Clone)]
pub struct Model {
    pub config: RuleConfig,
    pub alphabet: Alphabet,
    pub ip: Vec<Vec<String>>,
    pub ep: HashMap<String, u8>,
    pub cp: HashMap<String, ContextTable>,
    pub ln: Vec<Vec<usize>>,
}

impl Model {
    pub fn ngram(&self) -> usize {
        self.config.training_settings.ngram
    }

    /// Length of IP/EP/CP-context strings: n - 1.
    pub fn prefix_len(&self) -> usize {
        self.config.training_settings.ngram - 1
    }

    pub fn max_level(&self) -> u8 {
        self.config.training_settings.max_level
    }

    pub fn uuid(&self) -> &str {
        &self.config.training_settings.uuid
    }

    pub fn version(&self) -> &str {
        &self.config.program_details.version
    }

    /// Checks the invariants a usable model must satisfy: bucket vectors
    /// sized to `max_level + 1`, and at least one non-empty IP and LN
    /// bucket (a model failing that can never yield a guess).
    pub fn validate(&self) -> Result<()> {
        let levels = usize::from(self.max_level()) + 1;
        if self.ip.len() != levels || self.ln.len() != levels {
            return Err(ModelError::Config(format!(
                "table buckets not sized to max_level {}",
                self.max_level()
            )));
        }
        if self.ip.iter().all(Vec::is_empty) {
            return Err(ModelError::EmptyTable { table: "IP" });
        }
        if self.ln.iter().all(Vec::is_empty) {
            return Err(ModelError::EmptyTable { table: "LN" });
        }
        Ok(())
    }

    /// Materialises a model directly from trained tables, bypassing disk.
    ///
    /// Produces exactly what [`crate::write_rules`] followed by
    /// [`crate::load_rules`] would: the full smoothed key grid in
    /// alphabet-product order. Useful for embedding the enumerator in
    /// other programs; note the grid is `A^(n-1)` contexts, so this is
    /// meant for modest alphabets.
    pub fn from_tables(config: RuleConfig, tables: &impl RuleTables) -> Result<Self> {
        config.validate()?;
        let alphabet = tables.alphabet().clone();
        let ngram = config.training_settings.ngram;
        let max_level = config.training_settings.max_level;
        let levels = usize::from(max_level) + 1;

        let mut ip: Vec<Vec<String>> = vec![Vec::new(); levels];
        let mut ep = HashMap::new();
        let mut cp = HashMap::new();
        for prefix in alphabet.prefixes(ngram - 1) {
            ip[usize::from(tables.initial_level(&prefix))].push(prefix.clone());
            ep.insert(prefix.clone(), tables.end_level(&prefix));
            let mut table = ContextTable::default();
            for (symbol, level) in alphabet
                .symbols()
                .iter()
                .zip(tables.transition_levels(&prefix))
            {
                table.push(*symbol, level);
            }
            cp.insert(prefix, table);
        }

        let mut ln: Vec<Vec<usize>> = vec![Vec::new(); levels];
        for length in 1..=tables.max_length() {
            let level = tables.length_level(length);
            if length >= ngram - 1 {
                ln[usize::from(level)].push(length - (ngram - 1));
            }
        }

        let model = Model {
            config,
            alphabet,
            ip,
            ep,
            cp,
            ln,
        };
        model.validate()?;
        Ok(model)
    }
}

/// Discretised level tables as produced by training.
///
/// The writer and [`Model::from_tables`] drive this to materialise the
/// full smoothed key grid; implementations answer for *every* key, not
/// just observed ones.
pub trait RuleTables {
    fn alphabet(&self) -> &Alphabet;

    fn ngram(&self) -> usize;

    /// Longest password length trained on.
    fn max_length(&self) -> usize;

    /// Level of an (n-1)-symbol initial prefix.
    fn initial_level(&self, prefix: &str) -> u8;

    /// Level of an (n-1)-symbol end prefix.
    fn end_level(&self, prefix: &str) -> u8;

    /// Levels of all transitions out of `context`, one per alphabet
    /// symbol in alphabet order.
    fn transition_levels(&self, context: &str) -> Vec<u8>;

    /// Level of a password length in `1..=max_length`.
    fn length_level(&self, length: usize) -> u8;
}
