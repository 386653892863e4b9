use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::account::EntryId;
use super::money::Money;

/// One side of a balanced transaction, as it currently sits in the ledger.
///
/// Entries are snapshots: changing which account an entry belongs to goes
/// through [`crate::Ledger::update_account`], never through this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub account_name: String,
}

impl LedgerEntry {
    pub fn new(
        id: EntryId,
        date: NaiveDate,
        description: &str,
        amount: Money,
        account_name: &str,
    ) -> Self {
        LedgerEntry {
            id,
            date,
            description: description.to_string(),
            amount,
            account_name: account_name.to_string(),
        }
    }
}
