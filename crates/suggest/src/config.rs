//! Loading a [`RuleTable`] from a YAML rule file.
//!
//! The file is a list of single-key mappings from a source account to a list
//! of single-key mappings from a destination account to its patterns:
//!
//! ```yaml
//! - Imbalance-GBP:
//!     - Expenses:Groceries:
//!         - "CASH *"
//!     - Income:Salary:
//!         - MYEMPLOYER
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use thiserror::Error;

use crate::rules::{MatchRule, RuleTable};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid rule file: {0}")]
    Format(String),
    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A YAML mapping read as its key/value pairs in document order. Repeated
/// keys are kept, so they count against the single-key rule instead of
/// overwriting each other.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

type PatternGroup = Entries<Vec<String>>;
type SourceGroup = Entries<Vec<PatternGroup>>;

impl RuleTable {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_yaml_str(&yaml)?;
        tracing::info!(
            "Loaded rules for {} source account(s) from {}",
            table.uncategorized_account_names().len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses and validates a rule file. Nothing is returned unless every
    /// group is well formed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut table = RuleTable::new();
        if yaml.trim().is_empty() {
            return Ok(table);
        }
        let groups: Option<Vec<SourceGroup>> = serde_yaml::from_str(yaml)?;

        for (index, group) in groups.unwrap_or_default().into_iter().enumerate() {
            let (source, pattern_groups) = single_entry(group, || {
                format!("rule group {} must name exactly one source account", index + 1)
            })?;

            let mut rules = Vec::new();
            for pattern_group in pattern_groups {
                let (destination, patterns) = single_entry(pattern_group, || {
                    format!("each rule under '{source}' must name exactly one destination account")
                })?;
                for pattern in patterns {
                    let rule = MatchRule::new(&pattern, &destination)
                        .map_err(|source| ConfigError::Pattern { pattern, source })?;
                    rules.push(rule);
                }
            }

            tracing::debug!("{} rule(s) for {}", rules.len(), source);
            table.add_group(&source, rules);
        }

        Ok(table)
    }
}

fn single_entry<V>(
    map: Entries<V>,
    message: impl FnOnce() -> String,
) -> Result<(String, V), ConfigError> {
    let Entries(mut entries) = map;
    match entries.pop() {
        Some(entry) if entries.is_empty() => Ok(entry),
        _ => Err(ConfigError::Format(message())),
    }
}
