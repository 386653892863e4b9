use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use regex::Regex;

/// A glob pattern for entry descriptions and the account that matching
/// entries should move to.
///
/// `*` matches any run of characters, `?` exactly one, and `[seq]` / `[!seq]`
/// one character in / not in `seq`. Matching is case-sensitive and covers
/// the whole description.
#[derive(Debug, Clone)]
pub struct MatchRule {
    pattern: String,
    destination_account_name: String,
    compiled: Regex,
}

impl MatchRule {
    pub fn new(pattern: &str, destination_account_name: &str) -> Result<Self, regex::Error> {
        let compiled = Regex::new(&glob_to_regex(pattern))?;
        Ok(MatchRule {
            pattern: pattern.to_string(),
            destination_account_name: destination_account_name.to_string(),
            compiled,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn destination_account_name(&self) -> &str {
        &self.destination_account_name
    }

    pub fn is_match(&self, description: &str) -> bool {
        self.compiled.is_match(description)
    }
}

// The compiled regex is derived from `pattern`, so it takes no part in identity.
impl PartialEq for MatchRule {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.destination_account_name == other.destination_account_name
    }
}

impl Eq for MatchRule {}

impl Hash for MatchRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
        self.destination_account_name.hash(state);
    }
}

/// Translates a glob into an anchored regex. Regex metacharacters in the glob
/// are literals.
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("(?s)^");
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end + 1;
                }
                None => {
                    out.push_str(r"\[");
                    i += 1;
                }
            },
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                i += 1;
            }
        }
    }

    out.push('$');
    out
}

/// Index of the `]` closing the class opened at `start`. A `]` directly after
/// the opening `[` (or `[!`) is part of the class.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() && chars[j] != ']' {
        j += 1;
    }
    (j < chars.len()).then_some(j)
}

fn push_class(out: &mut String, body: &[char]) {
    out.push('[');
    let body = match body.split_first() {
        Some((&'!', rest)) => {
            out.push('^');
            rest
        }
        Some((&'^', rest)) => {
            out.push_str(r"\^");
            rest
        }
        _ => body,
    };
    for &c in body {
        if matches!(c, '\\' | '[' | ']' | '&' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(']');
}

/// Per-source-account rule lists, plus the order in which source accounts
/// should be scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    account_names: Vec<String>,
    rules: HashMap<String, Vec<MatchRule>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rules` to the list for `source_account_name`. The name is
    /// recorded for scanning every time, so repeated groups repeat the name.
    pub fn add_group(&mut self, source_account_name: &str, rules: Vec<MatchRule>) {
        self.account_names.push(source_account_name.to_string());
        self.rules
            .entry(source_account_name.to_string())
            .or_default()
            .extend(rules);
    }

    /// Rules for `source_account_name` in configured order; empty if the
    /// account has none.
    pub fn rules_for(&self, source_account_name: &str) -> &[MatchRule] {
        self.rules
            .get(source_account_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn uncategorized_account_names(&self) -> &[String] {
        &self.account_names
    }

    /// First rule for `source_account_name` whose pattern matches `description`.
    pub fn find_matching_rule(
        &self,
        source_account_name: &str,
        description: &str,
    ) -> Option<&MatchRule> {
        self.rules_for(source_account_name)
            .iter()
            .find(|rule| rule.is_match(description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_rule(pattern: &str, account: &str) -> MatchRule {
        MatchRule::new(pattern, account).unwrap()
    }

    #[test]
    fn exact_text_matches() {
        let rule = make_rule("CASH * FOO", "Bar");
        assert!(rule.is_match("CASH * FOO"));
    }

    #[test]
    fn star_matches_any_run() {
        let rule = make_rule("CASH * FOO", "Bar");
        assert!(rule.is_match("CASH store FOO"));
        assert!(!rule.is_match("CASH something"));
    }

    #[test]
    fn star_matches_empty_run() {
        let rule = make_rule("CASH*", "Bar");
        assert!(rule.is_match("CASH"));
    }

    #[test]
    fn match_is_case_sensitive() {
        let rule = make_rule("CASH *", "Bar");
        assert!(rule.is_match("CASH STORE"));
        assert!(!rule.is_match("cash store"));
    }

    #[test]
    fn match_is_anchored_at_both_ends() {
        let rule = make_rule("CASH *", "Bar");
        assert!(!rule.is_match("PRE CASH STORE"));
        let rule = make_rule("CASH", "Bar");
        assert!(!rule.is_match("CASH STORE"));
    }

    #[test]
    fn question_mark_matches_exactly_one() {
        let rule = make_rule("CARD ?", "Bar");
        assert!(rule.is_match("CARD 1"));
        assert!(!rule.is_match("CARD "));
        assert!(!rule.is_match("CARD 12"));
    }

    #[test]
    fn wildcards_span_newlines() {
        let rule = make_rule("A*B", "Bar");
        assert!(rule.is_match("A\nB"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let rule = make_rule("AMZN.CO.UK (1)+", "Bar");
        assert!(rule.is_match("AMZN.CO.UK (1)+"));
        assert!(!rule.is_match("AMZNxCOxUK 1"));
        let rule = make_rule("$5 ^OFF|", "Bar");
        assert!(rule.is_match("$5 ^OFF|"));
    }

    #[test]
    fn character_class() {
        let rule = make_rule("TFL [AB]", "Bar");
        assert!(rule.is_match("TFL A"));
        assert!(rule.is_match("TFL B"));
        assert!(!rule.is_match("TFL C"));
    }

    #[test]
    fn character_class_range_and_negation() {
        let rule = make_rule("REF [0-9]", "Bar");
        assert!(rule.is_match("REF 7"));
        assert!(!rule.is_match("REF x"));
        let rule = make_rule("REF [!0-9]", "Bar");
        assert!(rule.is_match("REF x"));
        assert!(!rule.is_match("REF 7"));
    }

    #[test]
    fn leading_bracket_in_class_is_literal() {
        let rule = make_rule("[]]", "Bar");
        assert!(rule.is_match("]"));
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        let rule = make_rule("SHOP [1", "Bar");
        assert!(rule.is_match("SHOP [1"));
    }

    #[test]
    fn invalid_class_range_is_an_error() {
        assert!(MatchRule::new("[z-a]", "Bar").is_err());
    }

    #[test]
    fn equality_ignores_compilation() {
        assert_eq!(make_rule("FOO", "A"), make_rule("FOO", "A"));
        assert_ne!(make_rule("FOO", "A"), make_rule("FOO", "B"));
        assert_ne!(make_rule("FOO", "A"), make_rule("BAR", "A"));
    }

    #[test]
    fn duplicates_collapse_in_sets() {
        let set: HashSet<MatchRule> = [
            make_rule("FOO", "A"),
            make_rule("FOO", "A"),
            make_rule("BAR", "A"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn rules_for_unknown_account_is_empty() {
        let table = RuleTable::new();
        assert!(table.rules_for("Imbalance-GBP").is_empty());
    }

    #[test]
    fn rules_keep_configured_order() {
        let mut table = RuleTable::new();
        table.add_group(
            "Imbalance-GBP",
            vec![make_rule("FOO", "A"), make_rule("FOO", "B")],
        );
        table.add_group("Imbalance-GBP", vec![make_rule("BAR", "C")]);

        let destinations: Vec<&str> = table
            .rules_for("Imbalance-GBP")
            .iter()
            .map(MatchRule::destination_account_name)
            .collect();
        assert_eq!(destinations, vec!["A", "B", "C"]);
        assert_eq!(
            table.uncategorized_account_names(),
            &["Imbalance-GBP".to_string(), "Imbalance-GBP".to_string()]
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut table = RuleTable::new();
        table.add_group(
            "Imbalance-GBP",
            vec![make_rule("FOO", "A"), make_rule("FOO", "B")],
        );
        let rule = table.find_matching_rule("Imbalance-GBP", "FOO").unwrap();
        assert_eq!(rule.destination_account_name(), "A");
    }

    #[test]
    fn lookup_is_scoped_to_source_account() {
        let mut table = RuleTable::new();
        table.add_group(
            "Assets:Checking:Uncategorized",
            vec![make_rule("FOO", "A")],
        );
        assert!(table.find_matching_rule("Imbalance-GBP", "FOO").is_none());
    }
}
