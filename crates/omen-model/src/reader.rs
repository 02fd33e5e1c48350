//! Loads a ruleset directory into a [`Model`].
//!
//! Load order matters: `config.txt` first (it names the encoding, n-gram
//! order, and level count the other files are interpreted with), then the
//! alphabet, then the four level tables. Every structural problem is
//! fatal; a ruleset that does not parse cleanly was either corrupted or
//! written by a broken trainer.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::alphabet::Alphabet;
use crate::config::{version_older_than, RuleConfig};
use crate::error::{ModelError, Result};
use crate::model::{ContextTable, Model};

pub const CONFIG_FILE: &str = "config.txt";
pub const ALPHABET_FILE: &str = "alphabet.txt";
pub const IP_FILE: &str = "IP.level";
pub const EP_FILE: &str = "EP.level";
pub const CP_FILE: &str = "CP.level";
pub const LN_FILE: &str = "LN.level";

/// Reads a rule directory and returns the validated, immutable model.
///
/// When `min_version` is given, rulesets recorded with an older trainer
/// version are rejected.
pub fn load_rules(dir: &Path, min_version: Option<&str>) -> Result<Model> {
    let config = RuleConfig::load(&dir.join(CONFIG_FILE))?;
    if let Some(minimum) = min_version {
        let found = &config.program_details.version;
        if version_older_than(found, minimum) {
            return Err(ModelError::VersionTooOld {
                found: found.clone(),
                required: minimum.to_string(),
            });
        }
    }

    let alphabet = load_alphabet(&dir.join(ALPHABET_FILE))?;
    let ngram = config.training_settings.ngram;
    let max_level = config.training_settings.max_level;

    let ip = load_ip(&dir.join(IP_FILE), ngram - 1, max_level)?;
    let ep = load_ep(&dir.join(EP_FILE), ngram - 1, max_level)?;
    let cp = load_cp(&dir.join(CP_FILE), ngram, max_level)?;
    let ln = load_ln(&dir.join(LN_FILE), ngram, max_level)?;

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

fn open_lines(path: &Path) -> Result<impl Iterator<Item = std::io::Result<String>>> {
    let file = File::open(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file).lines())
}

fn load_alphabet(path: &Path) -> Result<Alphabet> {
    let mut symbols = Vec::new();
    for (number, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => symbols.push(symbol),
            _ => {
                return Err(ModelError::Malformed {
                    file: path.to_path_buf(),
                    line: number + 1,
                    reason: format!("alphabet entries are single symbols, got {line:?}"),
                })
            }
        }
    }
    Alphabet::new(symbols)
}

/// Splits a `LEVEL<TAB>GRAM` line, range-checking the level.
fn split_level_line<'a>(
    line: &'a str,
    path: &Path,
    number: usize,
    max_level: u8,
) -> Result<(u8, &'a str)> {
    let (level, gram) = line.split_once('\t').ok_or_else(|| ModelError::Malformed {
        file: path.to_path_buf(),
        line: number,
        reason: "expected LEVEL<TAB>GRAM".into(),
    })?;
    let level: i64 = level.parse().map_err(|_| ModelError::Malformed {
        file: path.to_path_buf(),
        line: number,
        reason: format!("level {level:?} is not an integer"),
    })?;
    if level < 0 || level > i64::from(max_level) {
        return Err(ModelError::LevelOutOfRange {
            file: path.to_path_buf(),
            level,
            max_level,
        });
    }
    Ok((level as u8, gram))
}

fn check_gram_len(gram: &str, want: usize, path: &Path, number: usize) -> Result<()> {
    if gram.chars().count() != want {
        return Err(ModelError::Malformed {
            file: path.to_path_buf(),
            line: number,
            reason: format!("expected a {want}-symbol gram, got {gram:?}"),
        });
    }
    Ok(())
}

fn load_ip(path: &Path, prefix_len: usize, max_level: u8) -> Result<Vec<Vec<String>>> {
    let mut buckets: Vec<Vec<String>> = vec![Vec::new(); usize::from(max_level) + 1];
    for (number, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (level, gram) = split_level_line(&line, path, number + 1, max_level)?;
        check_gram_len(gram, prefix_len, path, number + 1)?;
        buckets[usize::from(level)].push(gram.to_string());
    }
    Ok(buckets)
}

fn load_ep(path: &Path, prefix_len: usize, max_level: u8) -> Result<HashMap<String, u8>> {
    let mut map = HashMap::new();
    for (number, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (level, gram) = split_level_line(&line, path, number + 1, max_level)?;
        check_gram_len(gram, prefix_len, path, number + 1)?;
        map.insert(gram.to_string(), level);
    }
    Ok(map)
}

fn load_cp(path: &Path, ngram: usize, max_level: u8) -> Result<HashMap<String, ContextTable>> {
    let mut map: HashMap<String, ContextTable> = HashMap::new();
    for (number, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (level, gram) = split_level_line(&line, path, number + 1, max_level)?;
        check_gram_len(gram, ngram, path, number + 1)?;
        // The transition target is the last symbol; the context is the rest.
        let (boundary, symbol) = gram
            .char_indices()
            .last()
            .expect("gram length checked above");
        let context = &gram[..boundary];
        map.entry(context.to_string())
            .or_default()
            .push(symbol, level);
    }
    Ok(map)
}

/// `LN.level` has one level per line, for lengths 1 upward. Only lengths
/// of at least n-1 symbols are enumerable; they are stored as the number
/// of CP applications `k = length - (n-1)`.
fn load_ln(path: &Path, ngram: usize, max_level: u8) -> Result<Vec<Vec<usize>>> {
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); usize::from(max_level) + 1];
    for (number, line) in open_lines(path)?.enumerate() {
        let line = line.map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let length = number + 1;
        let level: i64 = line.trim().parse().map_err(|_| ModelError::Malformed {
            file: path.to_path_buf(),
            line: length,
            reason: format!("level {line:?} is not an integer"),
        })?;
        if level < 0 || level > i64::from(max_level) {
            return Err(ModelError::LevelOutOfRange {
                file: path.to_path_buf(),
                level,
                max_level,
            });
        }
        if length >= ngram - 1 {
            buckets[level as usize].push(length - (ngram - 1));
        }
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn write_minimal_rules(dir: &Path) {
        write(
            dir,
            CONFIG_FILE,
            r#"
[program_details]
name = "omen-train"
version = "0.1.0"
author = "test"
contact = ""

[training_settings]
training_file = "corpus.txt"
alphabet_encoding = "utf-8"
ngram = 2
max_level = 2
uuid = "fixed-uuid"
"#,
        );
        write(dir, ALPHABET_FILE, "a\nb\n");
        write(dir, IP_FILE, "0\ta\n1\tb\n");
        write(dir, EP_FILE, "0\ta\n0\tb\n");
        write(dir, CP_FILE, "0\taa\n0\tab\n0\tba\n2\tbb\n");
        write(dir, LN_FILE, "2\n0\n");
    }

    #[test]
    fn loads_minimal_ruleset() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        let model = load_rules(tmp.path(), Some("0.1")).unwrap();
        assert_eq!(model.ngram(), 2);
        assert_eq!(model.ip[0], vec!["a"]);
        assert_eq!(model.ip[1], vec!["b"]);
        assert_eq!(model.ep["b"], 0);
        assert_eq!(model.cp["a"].bucket_len(0), 2);
        assert_eq!(model.cp["b"].symbol_at(2, 0), Some('b'));
        // length 1 -> k=0 at level 2, length 2 -> k=1 at level 0
        assert_eq!(model.ln[0], vec![1]);
        assert_eq!(model.ln[2], vec![0]);
    }

    #[test]
    fn rejects_old_trainer_version() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        let err = load_rules(tmp.path(), Some("0.2")).unwrap_err();
        assert!(matches!(err, ModelError::VersionTooOld { .. }));
    }

    #[test]
    fn rejects_out_of_range_level() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        write(tmp.path(), IP_FILE, "5\ta\n");
        let err = load_rules(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ModelError::LevelOutOfRange { level: 5, .. }));
    }

    #[test]
    fn rejects_missing_tab() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        write(tmp.path(), CP_FILE, "0 aa\n");
        let err = load_rules(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }

    #[test]
    fn rejects_empty_ip_table() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        write(tmp.path(), IP_FILE, "");
        let err = load_rules(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ModelError::EmptyTable { table: "IP" }));
    }

    #[test]
    fn rejects_length_below_minimum() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        // All lengths shorter than n-1 leave LN empty.
        write(tmp.path(), LN_FILE, "");
        let err = load_rules(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ModelError::EmptyTable { table: "LN" }));
    }

    #[test]
    fn rejects_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_rules(&tmp.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn rejects_multi_char_alphabet_entry() {
        let tmp = tempfile::tempdir().unwrap();
        write_minimal_rules(tmp.path());
        write(tmp.path(), ALPHABET_FILE, "ab\n");
        let err = load_rules(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ModelError::Malformed { .. }));
    }
}
