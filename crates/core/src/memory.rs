use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use super::account::LedgerError;
use super::entry::LedgerEntry;
use super::ledger::Ledger;

/// A ledger held entirely in memory. Entries keep their insertion order.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: BTreeSet<String>,
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new<I, S>(account_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryLedger {
            accounts: account_names.into_iter().map(Into::into).collect(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Adds an entry, registering its account if it is new.
    pub fn insert(&mut self, entry: LedgerEntry) {
        self.accounts.insert(entry.account_name.clone());
        self.entries
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    pub fn has_account(&self, name: &str) -> bool {
        self.accounts.contains(name)
    }

    /// Snapshot of every entry, in insertion order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LedgerEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Ledger for MemoryLedger {
    async fn get_uncategorized_entries(
        &self,
        account_names: &[String],
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = self.lock();
        let mut found = Vec::new();
        for name in account_names {
            if !self.has_account(name) {
                return Err(LedgerError::UnknownAccount(name.clone()));
            }
            found.extend(entries.iter().filter(|e| &e.account_name == name).cloned());
        }
        Ok(found)
    }

    async fn update_account(
        &self,
        entry: &LedgerEntry,
        new_account_name: &str,
    ) -> Result<(), LedgerError> {
        if !self.has_account(new_account_name) {
            return Err(LedgerError::UnknownAccount(new_account_name.to_string()));
        }
        let mut entries = self.lock();
        let stored = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| LedgerError::UnknownEntry(entry.id.clone()))?;
        tracing::debug!(
            "Moving entry {} from {} to {}",
            stored.id,
            stored.account_name,
            new_account_name
        );
        stored.account_name = new_account_name.to_string();
        Ok(())
    }
}
