use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A signed amount in a named currency (ISO 4217 mnemonic, e.g. `GBP`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Money {
            amount,
            currency: currency.to_string(),
        }
    }

    pub fn from_cents(cents: i64, currency: &str) -> Self {
        Money::new(Decimal::new(cents, 2), currency)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

/// Locale rules for rendering [`Money`] to users.
///
/// Passed explicitly to whatever needs to format amounts; there is no
/// process-wide default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    /// Currency mnemonic to prefix symbol. Unlisted currencies are prefixed
    /// with their mnemonic and a space.
    pub symbols: BTreeMap<String, String>,
    /// Digits per group in the integer part; `0` disables grouping.
    pub group_size: usize,
    pub group_separator: String,
    pub decimal_point: String,
    pub negative_sign: String,
    pub decimal_places: u32,
}

impl MoneyFormat {
    /// British English: `£1,500.00`, `-£30.00`, half-up rounding.
    pub fn en_gb() -> Self {
        let mut symbols = BTreeMap::new();
        symbols.insert("GBP".to_string(), "£".to_string());
        MoneyFormat {
            symbols,
            group_size: 3,
            group_separator: ",".to_string(),
            decimal_point: ".".to_string(),
            negative_sign: "-".to_string(),
            decimal_places: 2,
        }
    }

    pub fn with_symbol(mut self, currency: &str, symbol: &str) -> Self {
        self.symbols.insert(currency.to_string(), symbol.to_string());
        self
    }

    pub fn format(&self, money: &Money) -> String {
        let rounded = money
            .amount
            .round_dp_with_strategy(self.decimal_places, RoundingStrategy::MidpointAwayFromZero);
        let digits = format!("{:.*}", self.decimal_places as usize, rounded.abs());
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits.as_str(), None),
        };

        let mut out = String::new();
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push_str(&self.negative_sign);
        }
        match self.symbols.get(&money.currency) {
            Some(symbol) => out.push_str(symbol),
            None => {
                out.push_str(&money.currency);
                out.push(' ');
            }
        }
        out.push_str(&self.group_digits(int_part));
        if let Some(frac_part) = frac_part {
            out.push_str(&self.decimal_point);
            out.push_str(frac_part);
        }
        out
    }

    fn group_digits(&self, int_part: &str) -> String {
        if self.group_size == 0 {
            return int_part.to_string();
        }
        let len = int_part.len();
        let mut grouped = String::with_capacity(len + len / self.group_size);
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (len - i) % self.group_size == 0 {
                grouped.push_str(&self.group_separator);
            }
            grouped.push(c);
        }
        grouped
    }
}

impl Default for MoneyFormat {
    fn default() -> Self {
        MoneyFormat::en_gb()
    }
}
