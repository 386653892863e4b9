use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Separator between the segments of a fully qualified account name,
/// e.g. `Expenses:Groceries`.
pub const ACCOUNT_SEPARATOR: char = ':';

/// Identity of a single ledger entry (a GnuCash split guid, or any other
/// backend-defined key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        EntryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Joins account name segments from the top of the tree down.
pub fn join_account_path<S: AsRef<str>>(segments: &[S]) -> String {
    let mut full_name = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            full_name.push(ACCOUNT_SEPARATOR);
        }
        full_name.push_str(segment.as_ref());
    }
    full_name
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    UnknownAccount(String),
    #[error("Entry not found: {0}")]
    UnknownEntry(EntryId),
    #[error("Book is locked by {0}")]
    Locked(String),
    #[error("Storage error: {0}")]
    Storage(String),
}
