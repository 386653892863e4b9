pub mod account;
pub mod entry;
pub mod ledger;
pub mod memory;
pub mod money;

pub use account::{join_account_path, EntryId, LedgerError, ACCOUNT_SEPARATOR};
pub use entry::LedgerEntry;
pub use ledger::Ledger;
pub use memory::MemoryLedger;
pub use money::{Money, MoneyFormat};
