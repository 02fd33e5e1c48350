//! Time-memory trade-off cache for conditional-transition lookups.
//!
//! The model stores each context's transitions as a flat list in rule-file
//! order; answering "the j-th next-symbol at exactly this level" from that
//! list is a scan. The walker asks that question constantly, so for
//! shallow contexts the optimizer pre-groups every context's next-symbols
//! by level into packed arrays with per-level offsets, making both the
//! bucket length and indexed access O(1). Deeper contexts keep the scan
//! path. The cache is built once per enumerator and read-only afterwards;
//! it never changes results, only their cost.

use std::collections::HashMap;

use omen_model::Model;

/// Deepest context (in symbols) the cache is built for.
pub const DEFAULT_OPTIMIZER_DEPTH: usize = 4;

struct PackedRow {
    /// `starts[l]..starts[l + 1]` indexes the symbols at level `l`.
    starts: Box<[u32]>,
    symbols: Box<[char]>,
}

pub struct Optimizer {
    rows: HashMap<String, PackedRow>,
    enabled: bool,
}

const NO_SYMBOLS: &[char] = &[];

impl Optimizer {
    /// Packs the model's transitions, or disables itself when contexts are
    /// deeper than `max_depth`.
    pub fn build(model: &Model, max_depth: usize) -> Self {
        if model.prefix_len() > max_depth {
            return Self {
                rows: HashMap::new(),
                enabled: false,
            };
        }
        let levels = usize::from(model.max_level()) + 1;
        let mut rows = HashMap::with_capacity(model.cp.len());
        for (context, table) in &model.cp {
            let entries = table.entries();
            // Stable counting sort by level keeps file order inside buckets.
            let mut starts = vec![0u32; levels + 1];
            for &(_, level) in entries {
                starts[usize::from(level) + 1] += 1;
            }
            for l in 1..=levels {
                starts[l] += starts[l - 1];
            }
            let mut cursor = starts.clone();
            let mut symbols = vec!['\0'; entries.len()];
            for &(symbol, level) in entries {
                let at = &mut cursor[usize::from(level)];
                symbols[*at as usize] = symbol;
                *at += 1;
            }
            rows.insert(
                context.clone(),
                PackedRow {
                    starts: starts.into_boxed_slice(),
                    symbols: symbols.into_boxed_slice(),
                },
            );
        }
        Self {
            rows,
            enabled: true,
        }
    }

    /// The level bucket for `context`, or `None` when the cache is
    /// disabled and the caller must scan the model.
    fn bucket(&self, context: &str, level: u8) -> Option<&[char]> {
        if !self.enabled {
            return None;
        }
        match self.rows.get(context) {
            Some(row) => {
                let lo = row.starts[usize::from(level)] as usize;
                let hi = row.starts[usize::from(level) + 1] as usize;
                Some(&row.symbols[lo..hi])
            }
            None => Some(NO_SYMBOLS),
        }
    }
}

/// Uniform view over conditional transitions: optimizer hit when cached,
/// flat scan of the model otherwise. Identical answers either way.
#[derive(Clone, Copy)]
pub struct CpView<'a> {
    model: &'a Model,
    optimizer: &'a Optimizer,
}

impl<'a> CpView<'a> {
    pub fn new(model: &'a Model, optimizer: &'a Optimizer) -> Self {
        Self { model, optimizer }
    }

    pub fn max_level(&self) -> u8 {
        self.model.max_level()
    }

    pub fn bucket_len(&self, context: &str, level: u8) -> usize {
        match self.optimizer.bucket(context, level) {
            Some(bucket) => bucket.len(),
            None => self
                .model
                .cp
                .get(context)
                .map_or(0, |table| table.bucket_len(level)),
        }
    }

    pub fn symbol_at(&self, context: &str, level: u8, index: usize) -> Option<char> {
        match self.optimizer.bucket(context, level) {
            Some(bucket) => bucket.get(index).copied(),
            None => self
                .model
                .cp
                .get(context)
                .and_then(|table| table.symbol_at(level, index)),
        }
    }
}
