pub mod categorize;
pub mod csv;

pub use categorize::{categorize, CategoryEngine};
pub use crate::csv::ParseError;

pub mod import {
    use spendsort_core::{RuleSet, Transaction};

    /// Parses a statement and categorizes it against `rules` in one step.
    pub fn import_statement(data: &[u8], rules: &RuleSet) -> Result<Vec<Transaction>, crate::csv::ParseError> {
        let transactions = crate::csv::parse_bytes(data)?;
        Ok(crate::categorize::categorize(transactions, rules))
    }
}
