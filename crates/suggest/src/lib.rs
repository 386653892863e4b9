pub mod config;
pub mod engine;
pub mod rules;

pub use config::ConfigError;
pub use engine::{SuggestError, Suggester, Suggestion};
pub use rules::{MatchRule, RuleTable};
