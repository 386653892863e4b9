use std::io::{self, BufRead, Write};

use categorizer_core::{LedgerEntry, Money, MoneyFormat};
use categorizer_suggest::Suggestion;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%d/%m/%Y";
const HEADER: &str = "Date\tDescription\tAmount\tAccount";
const PROMPT: &str = "Accept these suggestions? (y/n): ";
const YES: &str = "y";
const NO: &str = "n";

/// Line-oriented user interaction over any reader/writer pair.
pub struct Console<R, W> {
    input: R,
    output: W,
    money_format: MoneyFormat,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, money_format: MoneyFormat) -> Self {
        Console {
            input,
            output,
            money_format,
        }
    }

    pub fn message(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    pub fn render_suggestions(&mut self, suggestions: &[Suggestion]) -> io::Result<()> {
        self.message("Suggestions for uncategorized transactions:")?;
        self.message(HEADER)?;
        for suggestion in suggestions {
            let row = self.row(
                suggestion.date(),
                suggestion.description(),
                suggestion.amount(),
                suggestion.new_account_name(),
            );
            self.message(&row)?;
        }
        Ok(())
    }

    /// Lists entries left where they are, showing their current account.
    pub fn render_unresolved(&mut self, entries: &[LedgerEntry]) -> io::Result<()> {
        self.message("No matching rule for these transactions:")?;
        self.message(HEADER)?;
        for entry in entries {
            let row = self.row(
                entry.date,
                &entry.description,
                &entry.amount,
                &entry.account_name,
            );
            self.message(&row)?;
        }
        Ok(())
    }

    /// Asks until the user answers y or n. End of input counts as n.
    pub fn user_accepts(&mut self) -> io::Result<bool> {
        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                self.message("")?;
                return Ok(false);
            }

            match answer.trim().to_lowercase().as_str() {
                YES => return Ok(true),
                NO => return Ok(false),
                _ => self.message(&format!("Please enter {YES} or {NO}."))?,
            }
        }
    }

    fn row(&self, date: NaiveDate, description: &str, amount: &Money, account: &str) -> String {
        [
            date.format(DATE_FORMAT).to_string(),
            description.to_string(),
            self.money_format.format(amount),
            account.to_string(),
        ]
        .join("\t")
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use categorizer_core::EntryId;

    fn make_console(input: &str) -> Console<&[u8], Vec<u8>> {
        Console::new(input.as_bytes(), Vec::new(), MoneyFormat::en_gb())
    }

    fn output_of(console: Console<&[u8], Vec<u8>>) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }

    fn make_entry(id: &str, day: u32, desc: &str, cents: i64) -> LedgerEntry {
        LedgerEntry::new(
            EntryId::new(id),
            NaiveDate::from_ymd_opt(2017, 3, day).unwrap(),
            desc,
            Money::from_cents(cents, "GBP"),
            "Imbalance-GBP",
        )
    }

    #[test]
    fn renders_suggestions_as_tab_separated_rows() {
        let suggestions = vec![
            Suggestion::new(make_entry("1", 19, "CASH 19 MAR", 3000), "Expenses:Groceries"),
            Suggestion::new(make_entry("2", 21, "Monthly Salary", 150_000), "Income:Salary"),
        ];
        let mut console = make_console("");

        console.render_suggestions(&suggestions).unwrap();

        assert_eq!(
            output_of(console),
            "Suggestions for uncategorized transactions:\n\
             Date\tDescription\tAmount\tAccount\n\
             19/03/2017\tCASH 19 MAR\t£30.00\tExpenses:Groceries\n\
             21/03/2017\tMonthly Salary\t£1,500.00\tIncome:Salary\n"
        );
    }

    #[test]
    fn renders_unresolved_with_current_account() {
        let mut console = make_console("");

        console
            .render_unresolved(&[make_entry("3", 22, "UNKNOWN TXN", -1250)])
            .unwrap();

        assert_eq!(
            output_of(console),
            "No matching rule for these transactions:\n\
             Date\tDescription\tAmount\tAccount\n\
             22/03/2017\tUNKNOWN TXN\t-£12.50\tImbalance-GBP\n"
        );
    }

    #[test]
    fn yes_accepts() {
        let mut console = make_console("y\n");
        assert!(console.user_accepts().unwrap());
        assert_eq!(output_of(console), PROMPT);
    }

    #[test]
    fn no_declines() {
        let mut console = make_console("n\n");
        assert!(!console.user_accepts().unwrap());
    }

    #[test]
    fn answer_is_case_insensitive() {
        let mut console = make_console("Y\n");
        assert!(console.user_accepts().unwrap());
    }

    #[test]
    fn invalid_answer_asks_again() {
        let mut console = make_console("f\ny\n");
        assert!(console.user_accepts().unwrap());
        assert_eq!(
            output_of(console),
            format!("{PROMPT}Please enter y or n.\n{PROMPT}")
        );
    }

    #[test]
    fn end_of_input_declines() {
        let mut console = make_console("");
        assert!(!console.user_accepts().unwrap());
    }
}
