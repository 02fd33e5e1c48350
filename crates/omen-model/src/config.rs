//! Ruleset configuration, persisted as `config.txt` in the rule directory.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Default number of levels used by the trainer (levels run 0..=10).
pub const DEFAULT_MAX_LEVEL: u8 = 10;

/// Smallest and largest supported n-gram orders.
pub const NGRAM_RANGE: (usize, usize) = (2, 5);

/// Full ruleset configuration: tool provenance plus training settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub program_details: ProgramDetails,
    pub training_settings: TrainingSettings,
}

/// Which tool produced the ruleset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDetails {
    pub name: String,
    pub version: String,
    pub author: String,
    pub contact: String,
}

/// Settings the enumerator needs to interpret the level tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSettings {
    pub training_file: String,
    pub alphabet_encoding: String,
    pub ngram: usize,
    pub max_level: u8,
    pub uuid: String,
}

impl RuleConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RuleConfig = toml::from_str(&text)
            .map_err(|e| ModelError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| ModelError::Config(format!("serialising config: {e}")))?;
        fs::write(path, text).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = NGRAM_RANGE;
        let n = self.training_settings.ngram;
        if n < lo || n > hi {
            return Err(ModelError::Config(format!(
                "ngram order {n} outside supported range {lo}..={hi}"
            )));
        }
        if self.training_settings.max_level == 0 {
            return Err(ModelError::Config("max_level must be at least 1".into()));
        }
        Ok(())
    }
}

/// Componentwise comparison of dotted version strings.
///
/// `"0.2"` is older than `"0.10"`; missing components count as zero, so
/// `"1.0"` and `"1.0.0"` compare equal. Non-numeric components count as zero.
pub fn version_older_than(found: &str, minimum: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|c| c.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(found), parse(minimum));
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        if x != y {
            return x < y;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RuleConfig {
        RuleConfig {
            program_details: ProgramDetails {
                name: "omen-train".into(),
                version: "0.1.0".into(),
                author: "omen-rs contributors".into(),
                contact: "".into(),
            },
            training_settings: TrainingSettings {
                training_file: "corpus.txt".into(),
                alphabet_encoding: "utf-8".into(),
                ngram: 4,
                max_level: DEFAULT_MAX_LEVEL,
                uuid: "00000000-0000-0000-0000-000000000000".into(),
            },
        }
    }

    #[test]
    fn toml_round_trip() {
        let config = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        config.save(&path).unwrap();
        let loaded = RuleConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn config_file_has_both_sections() {
        let config = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        config.save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[program_details]"));
        assert!(text.contains("[training_settings]"));
    }

    #[test]
    fn rejects_bad_ngram_and_zero_levels() {
        let mut config = sample();
        config.training_settings.ngram = 7;
        assert!(config.validate().is_err());
        let mut config = sample();
        config.training_settings.max_level = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn version_comparison_is_numeric() {
        assert!(version_older_than("0.2", "0.10"));
        assert!(!version_older_than("0.10", "0.2"));
        assert!(!version_older_than("1.0", "1.0.0"));
        assert!(version_older_than("0.9.9", "1.0"));
        assert!(!version_older_than("1.0.1", "1.0"));
    }
}
