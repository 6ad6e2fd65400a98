//! Cache configuration, loaded from `<data_dir>/cache.json`.

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// What to do with a flat record whose field count is not a multiple of
/// the record width.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordWidthPolicy {
    /// Decode every complete record, report the trailing leftovers.
    #[default]
    Truncate,
    /// Reject the whole set before any mutation is applied.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LenderIdRules {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for LenderIdRules {
    fn default() -> Self {
        Self { min_len: 3, max_len: 24 }
    }
}

impl LenderIdRules {
    /// Lender ids are 3 to 24 ASCII alphanumerics by default.
    pub fn accepts(&self, id: &str) -> bool {
        (self.min_len..=self.max_len).contains(&id.len())
            && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_code_separator")]
    pub code_separator: String,
    #[serde(default)]
    pub record_width_policy: RecordWidthPolicy,
    #[serde(default)]
    pub lender_id: LenderIdRules,
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

fn default_delimiter() -> char {
    '|'
}

fn default_code_separator() -> String {
    ",".to_string()
}

fn default_outbox_capacity() -> usize {
    8
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            delimiter:           default_delimiter(),
            code_separator:      default_code_separator(),
            record_width_policy: RecordWidthPolicy::default(),
            lender_id:           LenderIdRules::default(),
            outbox_capacity:     default_outbox_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/cache.json");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {path}"))?;
        let config: CacheConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {path}"))?;
        if config.outbox_capacity == 0 {
            anyhow::bail!("{path}: outbox_capacity must be at least 1");
        }
        if config.lender_id.min_len == 0 || config.lender_id.min_len > config.lender_id.max_len {
            anyhow::bail!(
                "{path}: invalid lender_id length range {}..={}",
                config.lender_id.min_len,
                config.lender_id.max_len
            );
        }
        log::debug!("Loaded cache config from {path}");
        Ok(config)
    }

    /// Configuration used by tests: defaults, strict nowhere.
    pub fn default_test() -> Self {
        Self::default()
    }

    /// Same as `default_test` but rejecting malformed record widths.
    pub fn strict_test() -> Self {
        Self {
            record_width_policy: RecordWidthPolicy::Strict,
            ..Self::default()
        }
    }
}
