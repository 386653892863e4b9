use categorizer_core::{Ledger, LedgerEntry, LedgerError, Money};
use chrono::NaiveDate;
use thiserror::Error;

use crate::rules::RuleTable;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestError {
    #[error("No suggestion run has completed yet")]
    NotYetRun,
}

/// A proposed move of one entry to a new account. Nothing changes in the
/// ledger until [`Suggestion::apply`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Suggestion {
    entry: LedgerEntry,
    new_account_name: String,
}

impl Suggestion {
    pub fn new(entry: LedgerEntry, new_account_name: &str) -> Self {
        Suggestion {
            entry,
            new_account_name: new_account_name.to_string(),
        }
    }

    pub fn entry(&self) -> &LedgerEntry {
        &self.entry
    }

    pub fn date(&self) -> NaiveDate {
        self.entry.date
    }

    pub fn description(&self) -> &str {
        &self.entry.description
    }

    pub fn amount(&self) -> &Money {
        &self.entry.amount
    }

    pub fn old_account(&self) -> &str {
        &self.entry.account_name
    }

    pub fn new_account_name(&self) -> &str {
        &self.new_account_name
    }

    /// Writes the move to `ledger`. Whether the destination exists is for
    /// the ledger to decide.
    pub async fn apply<L: Ledger>(&self, ledger: &L) -> Result<(), LedgerError> {
        ledger
            .update_account(&self.entry, &self.new_account_name)
            .await?;
        tracing::info!(
            "Moved '{}' ({}) from {} to {}",
            self.entry.description,
            self.entry.id,
            self.entry.account_name,
            self.new_account_name
        );
        Ok(())
    }
}

/// Matches uncategorized entries against a [`RuleTable`].
///
/// Entries are only ever checked against the rules of the account they
/// currently sit in, and the first matching rule wins. Entries no rule
/// matches are kept aside and can be read with
/// [`Suggester::unresolved_entries`] once a run has finished.
#[derive(Debug)]
pub struct Suggester<'a> {
    rules: &'a RuleTable,
    unresolved: Option<Vec<LedgerEntry>>,
}

impl<'a> Suggester<'a> {
    pub fn new(rules: &'a RuleTable) -> Self {
        Suggester {
            rules,
            unresolved: None,
        }
    }

    /// Suggestions for `entries`, in the order given. Replaces the unresolved
    /// entries of any previous run.
    pub fn run<I>(&mut self, entries: I) -> Vec<Suggestion>
    where
        I: IntoIterator<Item = LedgerEntry>,
    {
        let mut suggestions = Vec::new();
        let mut unresolved = Vec::new();

        for entry in entries {
            match self
                .rules
                .find_matching_rule(&entry.account_name, &entry.description)
            {
                Some(rule) => {
                    tracing::debug!(
                        "'{}' matched '{}' -> {}",
                        entry.description,
                        rule.pattern(),
                        rule.destination_account_name()
                    );
                    let destination = rule.destination_account_name();
                    suggestions.push(Suggestion::new(entry, destination));
                }
                None => {
                    tracing::debug!(
                        "No rule in {} matched '{}'",
                        entry.account_name,
                        entry.description
                    );
                    unresolved.push(entry);
                }
            }
        }

        tracing::info!(
            "{} suggestion(s), {} unresolved",
            suggestions.len(),
            unresolved.len()
        );
        self.unresolved = Some(unresolved);
        suggestions
    }

    /// Fetches the entries of every uncategorized account in the rule table
    /// from `ledger` and runs over them. A ledger failure leaves the previous
    /// run's unresolved entries in place.
    pub async fn suggest_from<L: Ledger>(
        &mut self,
        ledger: &L,
    ) -> Result<Vec<Suggestion>, LedgerError> {
        let entries = ledger
            .get_uncategorized_entries(self.rules.uncategorized_account_names())
            .await?;
        Ok(self.run(entries))
    }

    /// Entries the most recent run found no rule for.
    pub fn unresolved_entries(&self) -> Result<&[LedgerEntry], SuggestError> {
        self.unresolved
            .as_deref()
            .ok_or(SuggestError::NotYetRun)
    }
}
