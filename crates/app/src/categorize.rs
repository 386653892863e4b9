use std::io::{BufRead, Write};

use anyhow::Context;
use categorizer_core::Ledger;
use categorizer_suggest::{RuleTable, Suggester};

use crate::console::Console;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NothingToSuggest,
    Saved { applied: usize },
    Aborted,
}

/// Previews suggestions for `ledger`, asks for confirmation, and applies them
/// one by one if accepted. An apply failure stops the batch; suggestions
/// applied before it stay applied.
pub async fn categorize<L, R, W>(
    ledger: &L,
    rules: &RuleTable,
    console: &mut Console<R, W>,
) -> anyhow::Result<Outcome>
where
    L: Ledger,
    R: BufRead,
    W: Write,
{
    let mut suggester = Suggester::new(rules);
    let suggestions = suggester
        .suggest_from(ledger)
        .await
        .context("Could not read uncategorized transactions")?;

    if !suggestions.is_empty() {
        console.render_suggestions(&suggestions)?;
    }
    let unresolved = suggester.unresolved_entries()?;
    if !unresolved.is_empty() {
        console.render_unresolved(unresolved)?;
    }

    if suggestions.is_empty() {
        console.message("No suggestions.")?;
        return Ok(Outcome::NothingToSuggest);
    }

    if !console.user_accepts()? {
        console.message("Aborted.")?;
        return Ok(Outcome::Aborted);
    }

    for suggestion in &suggestions {
        suggestion.apply(ledger).await.with_context(|| {
            format!(
                "Could not move '{}' to {}",
                suggestion.description(),
                suggestion.new_account_name()
            )
        })?;
    }
    console.message("Saved.")?;

    Ok(Outcome::Saved {
        applied: suggestions.len(),
    })
}
