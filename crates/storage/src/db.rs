use categorizer_core::{
    join_account_path, EntryId, Ledger, LedgerEntry, LedgerError, Money,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::collections::HashMap;
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Open the book even if GnuCash (or another tool) holds its lock.
    pub open_if_locked: bool,
}

/// A GnuCash book stored with the SQLite backend.
#[derive(Debug)]
pub struct GnuCashBook {
    pool: DbPool,
    accounts: AccountIndex,
}

/// Full colon-separated account names and their guids.
#[derive(Debug, Default)]
struct AccountIndex {
    by_name: HashMap<String, String>,
}

fn storage_error(e: sqlx::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

pub async fn open_book(path: &Path, options: OpenOptions) -> Result<GnuCashBook, LedgerError> {
    if !path.is_file() {
        return Err(LedgerError::Storage(format!(
            "No GnuCash book at {}",
            path.display()
        )));
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}", path.display()))
        .await
        .map_err(storage_error)?;

    if let Some(holder) = lock_holder(&pool).await.map_err(storage_error)? {
        if !options.open_if_locked {
            pool.close().await;
            return Err(LedgerError::Locked(holder));
        }
        tracing::warn!("Opening {} despite lock held by {}", path.display(), holder);
    }

    let accounts = load_accounts(&pool).await?;
    tracing::info!(
        "Opened {} with {} account(s)",
        path.display(),
        accounts.by_name.len()
    );

    Ok(GnuCashBook { pool, accounts })
}

async fn lock_holder(pool: &DbPool) -> Result<Option<String>, sqlx::Error> {
    let lock_tables = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'gnclock'",
    )
    .fetch_one(pool)
    .await?;
    if lock_tables == 0 {
        return Ok(None);
    }

    let row = sqlx::query_as::<_, (Option<String>, Option<i64>)>(
        "SELECT hostname, pid FROM gnclock LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(hostname, pid)| {
        format!(
            "{} (pid {})",
            hostname.unwrap_or_else(|| "unknown host".to_string()),
            pid.map_or_else(|| "?".to_string(), |p| p.to_string())
        )
    }))
}

async fn load_accounts(pool: &DbPool) -> Result<AccountIndex, LedgerError> {
    let root_guid = sqlx::query_scalar::<_, String>("SELECT root_account_guid FROM books LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| LedgerError::Storage("Book has no root account".to_string()))?;

    let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
        "SELECT guid, name, parent_guid FROM accounts",
    )
    .fetch_all(pool)
    .await
    .map_err(storage_error)?;

    Ok(AccountIndex::build(&root_guid, rows))
}

impl AccountIndex {
    /// Names every account below `root_guid`. Accounts in other trees (the
    /// scheduled-transaction template root) and the root itself are left out.
    fn build(root_guid: &str, rows: Vec<(String, String, Option<String>)>) -> Self {
        let nodes: HashMap<&str, (&str, Option<&str>)> = rows
            .iter()
            .map(|(guid, name, parent)| (guid.as_str(), (name.as_str(), parent.as_deref())))
            .collect();

        let mut by_name = HashMap::new();
        for (guid, _, _) in &rows {
            if guid == root_guid {
                continue;
            }
            if let Some(segments) = path_to_root(&nodes, guid, root_guid) {
                by_name.insert(join_account_path(&segments), guid.clone());
            }
        }

        AccountIndex { by_name }
    }

    fn guid_for(&self, full_name: &str) -> Result<&str, LedgerError> {
        self.by_name
            .get(full_name)
            .map(String::as_str)
            .ok_or_else(|| LedgerError::UnknownAccount(full_name.to_string()))
    }
}

fn path_to_root<'a>(
    nodes: &HashMap<&'a str, (&'a str, Option<&'a str>)>,
    guid: &'a str,
    root_guid: &str,
) -> Option<Vec<&'a str>> {
    let mut segments = Vec::new();
    let mut current = guid;
    // Bounded by the account count so a corrupt parent cycle cannot spin.
    for _ in 0..nodes.len() {
        let (name, parent) = nodes.get(current)?;
        segments.push(*name);
        match parent {
            Some(parent) if *parent == root_guid => {
                segments.reverse();
                return Some(segments);
            }
            Some(parent) => current = *parent,
            None => return None,
        }
    }
    None
}

/// GnuCash has written post dates both as `2017-03-01 10:59:00` and
/// `20170301105900`.
fn parse_post_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() >= 10 && raw.as_bytes()[4] == b'-' {
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    } else {
        NaiveDate::parse_from_str(raw.get(..8)?, "%Y%m%d").ok()
    }
}

fn split_value(num: i64, denom: i64) -> Result<Decimal, LedgerError> {
    if denom == 0 {
        return Err(LedgerError::Storage("Split value has zero denominator".to_string()));
    }
    Ok(Decimal::from(num) / Decimal::from(denom))
}

type SplitRow = (String, i64, i64, Option<String>, Option<String>, Option<String>);

impl GnuCashBook {
    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn entries_for_account(&self, full_name: &str) -> Result<Vec<LedgerEntry>, LedgerError> {
        let guid = self.accounts.guid_for(full_name)?;

        let rows = sqlx::query_as::<_, SplitRow>(
            r#"
            SELECT s.guid, s.value_num, s.value_denom, t.post_date, t.description, c.mnemonic
            FROM splits s
            JOIN transactions t ON t.guid = s.tx_guid
            LEFT JOIN commodities c ON c.guid = t.currency_guid
            WHERE s.account_guid = ?
            ORDER BY t.post_date, t.guid, s.guid
            "#,
        )
        .bind(guid)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(|row| entry_from_row(row, full_name))
            .collect()
    }
}

fn entry_from_row(row: SplitRow, account_name: &str) -> Result<LedgerEntry, LedgerError> {
    let (split_guid, num, denom, post_date, description, currency) = row;
    let date = post_date
        .as_deref()
        .and_then(parse_post_date)
        .ok_or_else(|| LedgerError::Storage(format!("Split {split_guid} has no valid post date")))?;
    let amount = Money::new(
        split_value(num, denom)?,
        currency.as_deref().unwrap_or_default(),
    );
    Ok(LedgerEntry::new(
        EntryId(split_guid),
        date,
        description.as_deref().unwrap_or_default(),
        amount,
        account_name,
    ))
}

impl Ledger for GnuCashBook {
    async fn get_uncategorized_entries(
        &self,
        account_names: &[String],
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut entries = Vec::new();
        for name in account_names {
            let found = self.entries_for_account(name).await?;
            tracing::debug!("{} entries in {}", found.len(), name);
            entries.extend(found);
        }
        Ok(entries)
    }

    async fn update_account(
        &self,
        entry: &LedgerEntry,
        new_account_name: &str,
    ) -> Result<(), LedgerError> {
        let guid = self.accounts.guid_for(new_account_name)?;

        let affected = sqlx::query("UPDATE splits SET account_guid = ? WHERE guid = ?")
            .bind(guid)
            .bind(entry.id.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?
            .rows_affected();

        if affected == 0 {
            return Err(LedgerError::UnknownEntry(entry.id.clone()));
        }
        Ok(())
    }
}
