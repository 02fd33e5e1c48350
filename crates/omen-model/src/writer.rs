//! Writes a trained ruleset to a rule directory.
//!
//! All four level tables cover the full smoothed key grid, walked in
//! alphabet-product order; that write order is what the loader preserves
//! and the enumerator observes as tie-break order, so it must stay
//! deterministic. Output is streamed: nothing proportional to the grid is
//! held in memory.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::RuleConfig;
use crate::error::{ModelError, Result};
use crate::model::RuleTables;
use crate::reader::{ALPHABET_FILE, CONFIG_FILE, CP_FILE, EP_FILE, IP_FILE, LN_FILE};

/// Writes config, alphabet, and the IP/EP/CP/LN tables under `dir`.
///
/// The directory is created if missing. Writes are not atomic; a failure
/// part-way leaves a ruleset the loader will reject.
pub fn write_rules(dir: &Path, config: &RuleConfig, tables: &impl RuleTables) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ModelError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    config.save(&dir.join(CONFIG_FILE))?;
    write_alphabet(&dir.join(ALPHABET_FILE), tables)?;
    write_initial(&dir.join(IP_FILE), tables)?;
    write_end(&dir.join(EP_FILE), tables)?;
    write_transitions(&dir.join(CP_FILE), tables)?;
    write_lengths(&dir.join(LN_FILE), tables)?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> ModelError + '_ {
    move |source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_alphabet(path: &Path, tables: &impl RuleTables) -> Result<()> {
    let mut out = create(path)?;
    for &symbol in tables.alphabet().symbols() {
        writeln!(out, "{symbol}").map_err(io_err(path))?;
    }
    out.flush().map_err(io_err(path))
}

fn write_initial(path: &Path, tables: &impl RuleTables) -> Result<()> {
    let mut out = create(path)?;
    for prefix in tables.alphabet().prefixes(tables.ngram() - 1) {
        writeln!(out, "{}\t{}", tables.initial_level(&prefix), prefix).map_err(io_err(path))?;
    }
    out.flush().map_err(io_err(path))
}

fn write_end(path: &Path, tables: &impl RuleTables) -> Result<()> {
    let mut out = create(path)?;
    for prefix in tables.alphabet().prefixes(tables.ngram() - 1) {
        writeln!(out, "{}\t{}", tables.end_level(&prefix), prefix).map_err(io_err(path))?;
    }
    out.flush().map_err(io_err(path))
}

fn write_transitions(path: &Path, tables: &impl RuleTables) -> Result<()> {
    let mut out = create(path)?;
    for context in tables.alphabet().prefixes(tables.ngram() - 1) {
        let levels = tables.transition_levels(&context);
        for (&symbol, level) in tables.alphabet().symbols().iter().zip(levels) {
            writeln!(out, "{level}\t{context}{symbol}").map_err(io_err(path))?;
        }
    }
    out.flush().map_err(io_err(path))
}

fn write_lengths(path: &Path, tables: &impl RuleTables) -> Result<()> {
    let mut out = create(path)?;
    for length in 1..=tables.max_length() {
        writeln!(out, "{}", tables.length_level(length)).map_err(io_err(path))?;
    }
    out.flush().map_err(io_err(path))
}
