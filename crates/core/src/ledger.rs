use super::account::LedgerError;
use super::entry::LedgerEntry;

/// The storage side of categorization: where uncategorized entries come from
/// and where accepted re-categorizations are written.
///
/// Each `update_account` call is its own commit. Implementations do not
/// batch or roll back across calls.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    /// All entries currently in any of `account_names`, grouped by account in
    /// the order the names are given. Fails with
    /// [`LedgerError::UnknownAccount`] if a name does not resolve.
    async fn get_uncategorized_entries(
        &self,
        account_names: &[String],
    ) -> Result<Vec<LedgerEntry>, LedgerError>;

    /// Moves `entry` to the account named `new_account_name`.
    async fn update_account(
        &self,
        entry: &LedgerEntry,
        new_account_name: &str,
    ) -> Result<(), LedgerError>;
}
