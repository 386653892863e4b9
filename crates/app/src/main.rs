use std::io;
use std::path::PathBuf;

use anyhow::Context;
use categorizer_core::MoneyFormat;
use categorizer_storage::OpenOptions;
use categorizer_suggest::RuleTable;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod categorize;
mod console;

use categorize::{categorize, Outcome};
use console::Console;

/// Moves uncategorized GnuCash transactions into the right accounts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The .yml file that contains the matching rules.
    config: PathBuf,

    /// The GnuCash SQLite file that contains the accounts.
    book: PathBuf,

    /// Open the book even if another program holds its lock.
    #[arg(long)]
    open_if_locked: bool,
}

fn init_tracing() {
    // stdout carries the report, so logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let rules = RuleTable::load(&args.config)
        .with_context(|| format!("Could not load rules from {}", args.config.display()))?;

    let book = categorizer_storage::open_book(
        &args.book,
        OpenOptions {
            open_if_locked: args.open_if_locked,
        },
    )
    .await
    .with_context(|| format!("Could not open {}", args.book.display()))?;

    let mut console = Console::new(io::stdin().lock(), io::stdout().lock(), MoneyFormat::en_gb());
    let outcome = categorize(&book, &rules, &mut console).await;
    book.close().await;

    match outcome? {
        Outcome::Saved { applied } => tracing::info!("Applied {applied} suggestion(s)"),
        Outcome::Aborted => tracing::info!("Suggestions declined"),
        Outcome::NothingToSuggest => tracing::info!("Nothing to suggest"),
    }
    Ok(())
}
